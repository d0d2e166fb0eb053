//! Verifiable randomness provider seam.
//!
//! Requesting randomness returns the fee charged and a sequence number.
//! The provider later resolves the request by invoking the engine's
//! settle entry point with that sequence number and the random value —
//! after an arbitrary, unbounded delay, and with no ordering guarantee
//! between requests. There is no cancellation: a request that never
//! resolves sinks its fee permanently.

use anyhow::Result;
use emberline_types::{AccountId, Amount, SequenceNumber};
use tracing::debug;

/// Interface to the external randomness provider.
pub trait RandomnessProvider: Send + Sync {
    /// Fee currently quoted for one request, in payment-token units.
    fn request_fee(&self) -> Amount;

    /// Account the request fee is forwarded to.
    fn fee_account(&self) -> AccountId;

    /// Issue a new request. Returns `(fee_charged, sequence_number)`;
    /// the eventual callback carries the sequence number.
    fn request_randomness(&mut self) -> Result<(Amount, SequenceNumber)>;
}

/// Deterministic provider for node runtime tests and simulation.
///
/// Hands out consecutive sequence numbers and records every request so
/// tests can drive settlement callbacks in any order they choose.
#[derive(Debug, Clone)]
pub struct MockRandomnessProvider {
    fee: Amount,
    fee_account: AccountId,
    next_sequence: SequenceNumber,
    requests: Vec<SequenceNumber>,
}

impl MockRandomnessProvider {
    pub fn new(fee: Amount, fee_account: AccountId) -> Self {
        Self {
            fee,
            fee_account,
            next_sequence: 1,
            requests: Vec::new(),
        }
    }

    /// Sequence numbers issued so far, in request order.
    pub fn issued(&self) -> &[SequenceNumber] {
        &self.requests
    }
}

impl RandomnessProvider for MockRandomnessProvider {
    fn request_fee(&self) -> Amount {
        self.fee
    }

    fn fee_account(&self) -> AccountId {
        self.fee_account
    }

    fn request_randomness(&mut self) -> Result<(Amount, SequenceNumber)> {
        let sequence = self.next_sequence;
        self.next_sequence += 1;
        self.requests.push(sequence);

        debug!(target: "ledger", "randomness request issued, sequence {}", sequence);
        Ok((self.fee, sequence))
    }
}
