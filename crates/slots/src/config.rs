//! Mining engine configuration.

use emberline_economics::{AuctionParams, EmissionSchedule, EngineError};
use emberline_types::{is_zero_account, AccountId, Bps, BPS_DENOM};
use serde::{Deserialize, Serialize};

/// Fee routing for the mine price.
///
/// The miner share goes to the displaced occupant's claimable balance;
/// the other shares are transferred out immediately. The rounding
/// remainder (plus the share of any unset recipient) always goes to the
/// treasury.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlotFeeConfig {
    /// Credited to the displaced occupant (the largest share).
    pub miner_share_bps: Bps,
    pub treasury_bps: Bps,
    pub team_bps: Bps,
    pub protocol_bps: Bps,
    /// Remainder sink; must be set.
    pub treasury: AccountId,
    pub team: Option<AccountId>,
    pub protocol: Option<AccountId>,
}

impl SlotFeeConfig {
    pub fn validate(&self) -> Result<(), EngineError> {
        if is_zero_account(&self.treasury) {
            return Err(EngineError::InvalidConfig(
                "treasury address must be set".into(),
            ));
        }
        let total = self.miner_share_bps as u128
            + self.treasury_bps as u128
            + self.team_bps as u128
            + self.protocol_bps as u128;
        if total > BPS_DENOM {
            return Err(EngineError::InvalidConfig(format!(
                "fee weights sum to {total} bps, above 10000"
            )));
        }
        Ok(())
    }
}

impl Default for SlotFeeConfig {
    fn default() -> Self {
        Self {
            miner_share_bps: 8000,
            treasury_bps: 1000,
            team_bps: 500,
            protocol_bps: 500,
            treasury: [0xffu8; 32],
            team: None,
            protocol: None,
        }
    }
}

/// Async rate-boost draw settings. When enabled, every mine charges the
/// miner the randomness fee and issues a draw; the settled multiplier
/// scales the slot's emission until it expires or the slot is re-mined.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoostConfig {
    pub enabled: bool,
    /// Drawn uniformly; 10000 = no boost.
    pub multipliers_bps: Vec<Bps>,
    /// Seconds a settled boost stays active.
    pub duration: u64,
}

impl BoostConfig {
    pub fn validate(&self) -> Result<(), EngineError> {
        if !self.enabled {
            return Ok(());
        }
        if self.multipliers_bps.is_empty() {
            return Err(EngineError::InvalidConfig(
                "boost multiplier table must not be empty".into(),
            ));
        }
        if self.multipliers_bps.iter().any(|&bps| bps == 0) {
            return Err(EngineError::InvalidConfig(
                "boost multipliers must be positive".into(),
            ));
        }
        if self.duration == 0 {
            return Err(EngineError::InvalidConfig(
                "boost duration must be positive".into(),
            ));
        }
        Ok(())
    }
}

impl Default for BoostConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            multipliers_bps: vec![10_000, 12_500, 15_000, 20_000],
            duration: 86_400,
        }
    }
}

/// Versioned mining engine configuration. The version bumps on every
/// admin change so external observers can reconcile state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlotEngineConfig {
    pub version: u64,
    /// Number of slots; increase-only after construction.
    pub capacity: u32,
    pub auction: AuctionParams,
    pub emission: EmissionSchedule,
    pub fees: SlotFeeConfig,
    pub boost: BoostConfig,
    pub metadata_base_uri: String,
}

impl SlotEngineConfig {
    pub fn validate(&self) -> Result<(), EngineError> {
        if self.capacity == 0 {
            return Err(EngineError::InvalidConfig(
                "capacity must be positive".into(),
            ));
        }
        self.auction.validate()?;
        self.emission.validate()?;
        self.fees.validate()?;
        self.boost.validate()?;
        Ok(())
    }
}

impl Default for SlotEngineConfig {
    fn default() -> Self {
        Self {
            version: 0,
            capacity: 64,
            auction: AuctionParams::default(),
            emission: EmissionSchedule::default(),
            fees: SlotFeeConfig::default(),
            boost: BoostConfig::default(),
            metadata_base_uri: String::new(),
        }
    }
}
