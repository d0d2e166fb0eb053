//! Exact basis-point fee splitting.
//!
//! Splits an amount across an ordered recipient list by floor-divided
//! basis-point shares and returns the remainder explicitly so the caller
//! routes it to the designated sink. Rounding never destroys value: the
//! paid shares plus the remainder always equal the amount.

use crate::errors::EngineError;
use emberline_types::{is_zero_account, mul_div, AccountId, Amount, Bps, BPS_DENOM};
use serde::{Deserialize, Serialize};

/// One configured fee recipient. An unset (or zero) account contributes
/// zero paid shares; its cut folds into the remainder automatically.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeeRecipient {
    pub account: Option<AccountId>,
    pub weight_bps: Bps,
}

impl FeeRecipient {
    fn payable(&self) -> Option<AccountId> {
        self.account.filter(|account| !is_zero_account(account))
    }
}

/// Ordered basis-point fee distribution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeeSplit {
    pub recipients: Vec<FeeRecipient>,
}

impl FeeSplit {
    pub fn new(recipients: Vec<FeeRecipient>) -> Self {
        Self { recipients }
    }

    /// Total configured weight must not exceed 100%.
    pub fn validate(&self) -> Result<(), EngineError> {
        let total: u32 = self
            .recipients
            .iter()
            .map(|recipient| recipient.weight_bps as u32)
            .sum();
        if total as u128 > BPS_DENOM {
            return Err(EngineError::InvalidConfig(format!(
                "fee weights sum to {total} bps, above 10000"
            )));
        }
        Ok(())
    }

    /// Split `amount` across the recipients.
    ///
    /// Returns one `(recipient, paid_share)` entry per configured
    /// recipient in order, plus the remainder
    /// `amount - sum(paid shares)`. Shares of unset recipients are zero
    /// and land in the remainder.
    pub fn split(&self, amount: Amount) -> (Vec<(FeeRecipient, Amount)>, Amount) {
        let mut shares = Vec::with_capacity(self.recipients.len());
        let mut distributed: Amount = 0;

        for recipient in &self.recipients {
            let share = mul_div(amount, recipient.weight_bps as u128, BPS_DENOM).unwrap_or(0);
            let paid = match recipient.payable() {
                Some(_) => {
                    distributed = distributed.saturating_add(share);
                    share
                }
                None => 0,
            };
            shares.push((recipient.clone(), paid));
        }

        (shares, amount.saturating_sub(distributed))
    }
}
