//! Account identifiers and the human readable Emberline address format.

use serde::{Deserialize, Serialize};

/// Errors that can occur when parsing an Emberline address string.
#[derive(Debug, thiserror::Error)]
pub enum AddressError {
    #[error("address must start with 'e'")]
    InvalidPrefix,
    #[error("address must be {expected} characters, got {actual}")]
    InvalidLength { expected: usize, actual: usize },
    #[error("address payload is not valid hexadecimal")]
    InvalidHex(#[from] hex::FromHexError),
    #[error("address payload must be exactly 32 bytes")]
    InvalidPayloadLength,
}

/// Raw account identifier. The all-zero id is the null address and is
/// rejected wherever a recipient is required.
pub type AccountId = [u8; 32];

/// Number of raw bytes contained in an address.
pub const ACCOUNT_BYTES: usize = 32;
/// Expected string length of an encoded address (prefix + 64 hex chars).
pub const ADDRESS_STRING_LENGTH: usize = 1 + ACCOUNT_BYTES * 2;

/// The null account id.
pub const ZERO_ACCOUNT: AccountId = [0u8; ACCOUNT_BYTES];

/// Whether an account id is the null address.
#[inline]
pub fn is_zero_account(account: &AccountId) -> bool {
    *account == ZERO_ACCOUNT
}

/// Encode a 32-byte account identifier into the human readable Emberline
/// format: the character `e` followed by the hex representation of the
/// raw bytes.
pub fn encode_address(bytes: &AccountId) -> String {
    let mut encoded = String::with_capacity(ADDRESS_STRING_LENGTH);
    encoded.push('e');
    encoded.push_str(&hex::encode(bytes));
    encoded
}

/// Attempt to decode a human readable Emberline address string into the
/// raw account bytes.
pub fn decode_address(address: &str) -> Result<AccountId, AddressError> {
    if !address.starts_with('e') {
        return Err(AddressError::InvalidPrefix);
    }

    if address.len() != ADDRESS_STRING_LENGTH {
        return Err(AddressError::InvalidLength {
            expected: ADDRESS_STRING_LENGTH,
            actual: address.len(),
        });
    }

    let payload = &address[1..];
    let decoded = hex::decode(payload)?;

    let bytes: AccountId = decoded
        .try_into()
        .map_err(|_| AddressError::InvalidPayloadLength)?;

    Ok(bytes)
}

/// Check whether the provided string is a valid Emberline address.
pub fn is_valid_address(address: &str) -> bool {
    decode_address(address).is_ok()
}

/// Convenience wrapper for serialising/deserialising account ids as
/// address strings in JSON.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Address(pub AccountId);

impl From<Address> for String {
    fn from(address: Address) -> Self {
        encode_address(&address.0)
    }
}

impl TryFrom<String> for Address {
    type Error = AddressError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        decode_address(&value).map(Address)
    }
}
