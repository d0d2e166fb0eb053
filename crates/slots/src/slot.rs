//! Slot state.

use emberline_economics::AuctionState;
use emberline_types::{mul_div, AccountId, Amount, Bps, EpochId, Timestamp, BPS_DENOM};
use serde::{Deserialize, Serialize};

/// Time-boxed emission multiplier won through a randomness draw.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RateBoost {
    pub multiplier_bps: Bps,
    pub expires_at: Timestamp,
}

impl RateBoost {
    pub fn is_active(&self, now: Timestamp) -> bool {
        now < self.expires_at
    }
}

/// One mining position.
///
/// The pricing epoch and the occupancy coincide: the auction advances
/// exactly when the occupant changes, so `auction.epoch_id` is the slot
/// epoch and `auction.started_at` is the occupancy start.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Slot {
    pub index: u32,
    pub occupant: Option<AccountId>,
    pub auction: AuctionState,
    /// Sparks per second, fixed at the occupant's mine action. Stale
    /// relative to the global curve until the slot is next mined.
    pub emission_rate: Amount,
    pub metadata_uri: String,
    pub boost: Option<RateBoost>,
}

impl Slot {
    /// Fresh, unoccupied slot.
    pub fn empty(index: u32, init_price: Amount, now: Timestamp) -> Self {
        Self {
            index,
            occupant: None,
            auction: AuctionState::new(init_price, now),
            emission_rate: 0,
            metadata_uri: String::new(),
            boost: None,
        }
    }

    pub fn epoch_id(&self) -> EpochId {
        self.auction.epoch_id
    }

    /// When the current occupancy (and pricing epoch) started.
    pub fn started_at(&self) -> Timestamp {
        self.auction.started_at
    }

    /// Emission accrued by the current occupant but not yet minted,
    /// including an active boost. Zero for an empty slot.
    pub fn pending_emission(&self, now: Timestamp) -> Amount {
        if self.occupant.is_none() {
            return 0;
        }
        let elapsed = now.saturating_sub(self.started_at());
        let base = (elapsed as u128).saturating_mul(self.emission_rate);
        match &self.boost {
            Some(boost) if boost.is_active(now) => {
                mul_div(base, boost.multiplier_bps as u128, BPS_DENOM).unwrap_or(base)
            }
            _ => base,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_slot_has_no_pending_emission() {
        let slot = Slot::empty(0, 100, 0);
        assert_eq!(slot.pending_emission(1000), 0);
    }

    #[test]
    fn test_pending_emission_accrues_per_second() {
        let mut slot = Slot::empty(0, 100, 0);
        slot.occupant = Some([1u8; 32]);
        slot.emission_rate = 10;
        assert_eq!(slot.pending_emission(100), 1000);
    }

    #[test]
    fn test_active_boost_scales_pending_emission() {
        let mut slot = Slot::empty(0, 100, 0);
        slot.occupant = Some([1u8; 32]);
        slot.emission_rate = 10;
        slot.boost = Some(RateBoost {
            multiplier_bps: 15_000,
            expires_at: 200,
        });
        assert_eq!(slot.pending_emission(100), 1500);
        // Expired boost no longer applies.
        assert_eq!(slot.pending_emission(200), 2000);
    }
}
