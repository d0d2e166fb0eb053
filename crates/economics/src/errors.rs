//! Validation errors shared by the Emberline engines.
//!
//! Every variant is fail-fast: the engine rejects the call before any
//! state changes, so callers never observe a partial effect. Settlement
//! callbacks for unknown sequence numbers are deliberately NOT errors
//! (they are idempotent no-ops against provider retries).

use emberline_types::{Amount, EpochId, Timestamp};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("recipient must not be the zero address")]
    ZeroAddress,

    #[error("action expired: now={now}, deadline={deadline}")]
    Expired { now: Timestamp, deadline: Timestamp },

    #[error("epoch mismatch: expected={expected}, current={current}")]
    EpochMismatch { expected: EpochId, current: EpochId },

    #[error("price {price} exceeds max price {max_price}")]
    MaxPriceExceeded { price: Amount, max_price: Amount },

    #[error("attached fee {attached} below required randomness fee {required}")]
    InsufficientFee { attached: Amount, required: Amount },

    #[error("invalid odds configuration: {0}")]
    InvalidOddsConfiguration(String),

    #[error("capacity must strictly increase: current={current}, requested={requested}")]
    CapacityMustIncrease { current: u32, requested: u32 },

    #[error("no claimable balance")]
    NoClaimableBalance,

    #[error("unknown slot index {0}")]
    UnknownSlot(u32),

    #[error("caller is not the engine admin")]
    Unauthorized,

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// Failure at the token or randomness-provider boundary. A
    /// misconfigured external dependency makes every dependent action
    /// fail deterministically until reconfigured; there is no pause or
    /// circuit breaker.
    #[error("external dependency failed: {0}")]
    Token(#[from] anyhow::Error),
}
