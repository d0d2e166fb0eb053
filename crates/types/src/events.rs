//! Structured engine events.
//!
//! One event is recorded per observable state transition (mine, claim,
//! fee payment, spin, settlement, admin change). Engines accumulate them
//! in an outbox drained by the embedder; delivery and history
//! reconstruction are external concerns.

use crate::address::AccountId;
use crate::scalars::{Amount, Bps, EpochId, SequenceNumber, Timestamp};
use serde::{Deserialize, Serialize};

/// Event emitted by the mining and chance-game engines.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum EngineEvent {
    /// A slot was mined (occupied or displaced).
    SlotMined {
        slot_index: u32,
        epoch_id: EpochId,
        miner: AccountId,
        displaced: Option<AccountId>,
        price: Amount,
        minted: Amount,
        metadata_uri: String,
        timestamp: Timestamp,
    },
    /// A fee share was paid out of a purchase price.
    FeePaid {
        payer: AccountId,
        recipient: AccountId,
        amount: Amount,
        timestamp: Timestamp,
    },
    /// A pull-payment balance was withdrawn.
    Claimed {
        account: AccountId,
        amount: Amount,
        timestamp: Timestamp,
    },
    /// Slot capacity was raised by the admin.
    CapacityRaised {
        previous: u32,
        current: u32,
        timestamp: Timestamp,
    },
    /// A rate-boost randomness draw was issued for a freshly mined slot.
    BoostDrawRequested {
        slot_index: u32,
        epoch_id: EpochId,
        sequence_number: SequenceNumber,
        timestamp: Timestamp,
    },
    /// A rate-boost draw settled and the multiplier was applied.
    BoostDrawSettled {
        slot_index: u32,
        multiplier_bps: Bps,
        expires_at: Timestamp,
        timestamp: Timestamp,
    },
    /// A chance-game spin was purchased and a randomness request issued.
    SpinStarted {
        player: AccountId,
        recipient: AccountId,
        epoch_id: EpochId,
        price: Amount,
        sequence_number: SequenceNumber,
        metadata_uri: String,
        timestamp: Timestamp,
    },
    /// A pending spin settled against the live prize pool.
    SpinSettled {
        sequence_number: SequenceNumber,
        recipient: AccountId,
        payout_bps: Bps,
        amount: Amount,
        pool_after: Amount,
        timestamp: Timestamp,
    },
    /// The odds table was replaced.
    OddsUpdated {
        entries: Vec<Bps>,
        version: u64,
        timestamp: Timestamp,
    },
    /// An engine configuration field changed.
    ConfigUpdated {
        field: String,
        version: u64,
        timestamp: Timestamp,
    },
}
