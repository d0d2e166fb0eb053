//! Halving emission curve with a floor rate.
//!
//! The rate is a discrete step function: it drops by exactly half at
//! each halving-period boundary and never goes below `floor_rate`.
//!
//! Accrual is point-in-time: an elapsed interval is priced entirely at
//! the rate in effect at the END of the interval. An interval spanning a
//! halving boundary is therefore valued at the post-halving (lower)
//! rate, under-minting relative to a time-integrated curve. This is the
//! platform's documented behavior and must not be "fixed" into a
//! continuous integral.

use crate::errors::EngineError;
use emberline_types::{Amount, Timestamp};
use serde::{Deserialize, Serialize};

/// Cap on the halving shift; beyond this the decayed rate is zero (the
/// floor still applies).
const MAX_HALVINGS: u64 = 127;

/// Emission schedule shared by both engines.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmissionSchedule {
    /// Curve origin.
    pub started_at: Timestamp,
    /// Seconds between halvings.
    pub halving_period: u64,
    /// Sparks per second at the curve origin.
    pub initial_rate: Amount,
    /// The rate never decays below this.
    pub floor_rate: Amount,
}

impl EmissionSchedule {
    pub fn validate(&self) -> Result<(), EngineError> {
        if self.halving_period == 0 {
            return Err(EngineError::InvalidConfig(
                "halving period must be positive".into(),
            ));
        }
        if self.initial_rate < self.floor_rate {
            return Err(EngineError::InvalidConfig(
                "initial rate below floor rate".into(),
            ));
        }
        Ok(())
    }

    /// Emission rate at `now`: `max(floor_rate, initial_rate >> halvings)`.
    pub fn rate_at(&self, now: Timestamp) -> Amount {
        let halvings = now.saturating_sub(self.started_at) / self.halving_period;
        let decayed = if halvings > MAX_HALVINGS {
            0
        } else {
            self.initial_rate >> halvings
        };
        decayed.max(self.floor_rate)
    }

    /// Sparks accrued over `[last, now]`, priced at the end-of-interval
    /// rate (point-in-time integration).
    pub fn accrued(&self, last: Timestamp, now: Timestamp) -> Amount {
        let elapsed = now.saturating_sub(last);
        (elapsed as u128).saturating_mul(self.rate_at(now))
    }
}

impl Default for EmissionSchedule {
    fn default() -> Self {
        Self {
            started_at: 0,
            // Halving every ~2 years.
            halving_period: 63_072_000,
            initial_rate: emberline_types::SPARKS_PER_EMBER,
            floor_rate: 1,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn schedule() -> EmissionSchedule {
        EmissionSchedule {
            started_at: 0,
            halving_period: 100,
            initial_rate: 1000,
            floor_rate: 10,
        }
    }

    #[test]
    fn test_rate_halves_at_period_boundaries() {
        let s = schedule();
        assert_eq!(s.rate_at(0), 1000);
        assert_eq!(s.rate_at(99), 1000);
        assert_eq!(s.rate_at(100), 500);
        assert_eq!(s.rate_at(199), 500);
        assert_eq!(s.rate_at(200), 250);
    }

    #[test]
    fn test_rate_floors() {
        let s = schedule();
        // After 7 halvings 1000 >> 7 = 7 < floor 10.
        assert_eq!(s.rate_at(700), 10);
        assert_eq!(s.rate_at(1_000_000), 10);
    }

    #[test]
    fn test_rate_before_start_is_initial() {
        let mut s = schedule();
        s.started_at = 500;
        assert_eq!(s.rate_at(100), 1000);
    }

    #[test]
    fn test_accrual_within_one_epoch() {
        let s = schedule();
        assert_eq!(s.accrued(0, 50), 50 * 1000);
        assert_eq!(s.accrued(50, 50), 0);
    }

    #[test]
    fn test_accrual_across_halving_prices_whole_interval_low() {
        let s = schedule();
        // Interval [50, 150] spans the halving at t=100. The whole 100
        // seconds are priced at the post-halving rate of 500: 50_000,
        // not the integrated 50*1000 + 50*500 = 75_000.
        assert_eq!(s.accrued(50, 150), 100 * 500);
    }

    #[test]
    fn test_deep_halving_does_not_shift_overflow() {
        let mut s = schedule();
        s.halving_period = 1;
        s.floor_rate = 3;
        assert_eq!(s.rate_at(10_000), 3);
    }

    #[test]
    fn test_validation() {
        let mut s = schedule();
        s.halving_period = 0;
        assert!(s.validate().is_err());

        let mut s = schedule();
        s.floor_rate = s.initial_rate + 1;
        assert!(s.validate().is_err());

        assert!(schedule().validate().is_ok());
    }
}
