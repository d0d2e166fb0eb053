//! Reverse Dutch-auction pricing clock.
//!
//! Price starts at the epoch's init price and decays linearly to zero
//! over `epoch_period`. A successful purchase at clearing price `P`
//! advances the epoch and resets the init price to
//! `clamp(P * multiplier, [min_init_price, max_init_price])`.

use crate::errors::EngineError;
use emberline_types::{mul_div, Amount, EpochId, Timestamp, BPS_DENOM};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Fixed auction configuration, validated once at engine construction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuctionParams {
    /// Seconds for a full decay from init price to zero.
    pub epoch_period: u64,
    /// Init price of the very first epoch (and of freshly appended slots).
    pub initial_price: Amount,
    /// Applied to the clearing price on purchase; 20000 = 2x.
    pub price_multiplier_bps: u32,
    /// Lower clamp for the next epoch's init price.
    pub min_init_price: Amount,
    /// Upper clamp for the next epoch's init price.
    pub max_init_price: Amount,
}

impl AuctionParams {
    pub fn validate(&self) -> Result<(), EngineError> {
        if self.epoch_period == 0 {
            return Err(EngineError::InvalidConfig(
                "auction epoch period must be positive".into(),
            ));
        }
        if self.min_init_price == 0 {
            return Err(EngineError::InvalidConfig(
                "min init price must be positive".into(),
            ));
        }
        if self.min_init_price > self.max_init_price {
            return Err(EngineError::InvalidConfig(
                "min init price exceeds max init price".into(),
            ));
        }
        if self.price_multiplier_bps == 0 {
            return Err(EngineError::InvalidConfig(
                "price multiplier must be positive".into(),
            ));
        }
        if self.initial_price > self.max_init_price {
            return Err(EngineError::InvalidConfig(
                "initial price exceeds max init price".into(),
            ));
        }
        Ok(())
    }
}

impl Default for AuctionParams {
    fn default() -> Self {
        Self {
            epoch_period: 3600,
            initial_price: 100 * emberline_types::SPARKS_PER_EMBER,
            price_multiplier_bps: 20_000,
            min_init_price: 1,
            max_init_price: u128::MAX / BPS_DENOM,
        }
    }
}

/// Live state of one auction (a slot's, or the global spin auction's).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuctionState {
    /// Strictly increases on each successful purchase.
    pub epoch_id: EpochId,
    /// Price at the start of the current epoch.
    pub init_price: Amount,
    /// When the current epoch started.
    pub started_at: Timestamp,
}

impl AuctionState {
    /// Fresh auction in epoch 0.
    pub fn new(init_price: Amount, started_at: Timestamp) -> Self {
        Self {
            epoch_id: 0,
            init_price,
            started_at,
        }
    }

    /// Current price: linear decay from `init_price` to zero across the
    /// epoch period, zero once the epoch has fully decayed. Always in
    /// `[0, init_price]`.
    pub fn price_at(&self, now: Timestamp, params: &AuctionParams) -> Amount {
        let elapsed = now.saturating_sub(self.started_at);
        if elapsed >= params.epoch_period {
            return 0;
        }
        let decay = mul_div(self.init_price, elapsed as u128, params.epoch_period as u128)
            .unwrap_or(self.init_price);
        self.init_price.saturating_sub(decay)
    }

    /// Advance after a successful purchase at `clearing_price`.
    pub fn advance(&mut self, clearing_price: Amount, now: Timestamp, params: &AuctionParams) {
        let raised = mul_div(
            clearing_price,
            params.price_multiplier_bps as u128,
            BPS_DENOM,
        )
        .unwrap_or(params.max_init_price);

        self.init_price = raised.clamp(params.min_init_price, params.max_init_price);
        self.epoch_id += 1;
        self.started_at = now;

        debug!(
            target: "economics",
            "auction advanced to epoch {} at init price {}", self.epoch_id, self.init_price
        );
    }
}
