//! Token scalars and basis-point arithmetic.

/// Token amount in smallest units. Both the payment token and the EMBER
/// reward token are denominated in `u128` units.
pub type Amount = u128;

/// Basis points. 10000 bps = 100%.
pub type Bps = u16;

/// Pricing-cycle identifier; strictly increases per slot / per global
/// auction on each successful action.
pub type EpochId = u64;

/// Unix timestamp in whole seconds.
pub type Timestamp = u64;

/// Correlation id handed out by the randomness provider; the settlement
/// callback is keyed by it.
pub type SequenceNumber = u64;

/// Sparks per EMBER (10^8).
pub const SPARKS_PER_EMBER: u128 = 100_000_000;

/// Basis-point denominator.
pub const BPS_DENOM: u128 = 10_000;

/// Checked multiply-then-divide on u128. Returns `None` on division by
/// zero or multiplication overflow.
pub fn mul_div(n: u128, mul: u128, div: u128) -> Option<u128> {
    if div == 0 {
        return None;
    }
    n.checked_mul(mul).map(|product| product / div)
}

/// Floor share of `amount` at `weight_bps`. Overflow folds to zero so the
/// unpaid share lands in the caller's remainder instead of vanishing.
#[inline]
pub fn bps_share(amount: Amount, weight_bps: Bps) -> Amount {
    mul_div(amount, weight_bps as u128, BPS_DENOM).unwrap_or(0)
}

/// Current wall-clock unix time in seconds, for embedders that drive the
/// engines off the system clock. Engine entry points always take an
/// explicit timestamp so callers stay in charge of ordering.
pub fn unix_now() -> Timestamp {
    chrono::Utc::now().timestamp().max(0) as Timestamp
}
