//! Chance-game engine configuration.

use emberline_economics::{AuctionParams, EmissionSchedule, EngineError};
use emberline_types::{is_zero_account, AccountId, Bps, BPS_DENOM};
use serde::{Deserialize, Serialize};

/// Upper bound on the odds table length.
pub const MAX_ODDS_ENTRIES: usize = 64;

/// Fee routing for the spin price. Unlike mining there is no previous
/// participant: every share leaves the engine, remainder to treasury.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpinFeeConfig {
    pub treasury_bps: Bps,
    pub team_bps: Bps,
    pub protocol_bps: Bps,
    /// Remainder sink; must be set.
    pub treasury: AccountId,
    pub team: Option<AccountId>,
    pub protocol: Option<AccountId>,
}

impl SpinFeeConfig {
    pub fn validate(&self) -> Result<(), EngineError> {
        if is_zero_account(&self.treasury) {
            return Err(EngineError::InvalidConfig(
                "treasury address must be set".into(),
            ));
        }
        let total =
            self.treasury_bps as u128 + self.team_bps as u128 + self.protocol_bps as u128;
        if total > BPS_DENOM {
            return Err(EngineError::InvalidConfig(format!(
                "fee weights sum to {total} bps, above 10000"
            )));
        }
        Ok(())
    }
}

impl Default for SpinFeeConfig {
    fn default() -> Self {
        Self {
            treasury_bps: 9000,
            team_bps: 500,
            protocol_bps: 500,
            treasury: [0xffu8; 32],
            team: None,
            protocol: None,
        }
    }
}

/// Versioned chance-game configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpinEngineConfig {
    pub version: u64,
    pub auction: AuctionParams,
    pub emission: EmissionSchedule,
    pub fees: SpinFeeConfig,
    /// Basis-point payout fractions; one entry drawn uniformly per
    /// settlement.
    pub odds: Vec<Bps>,
    /// Inclusive bounds every odds entry must respect. The max stays
    /// below 10000 so no single settlement can empty the pool.
    pub min_odds_bps: Bps,
    pub max_odds_bps: Bps,
    pub metadata_uri: String,
}

impl SpinEngineConfig {
    pub fn validate(&self) -> Result<(), EngineError> {
        self.auction.validate()?;
        self.emission.validate()?;
        self.fees.validate()?;
        if self.min_odds_bps == 0 || self.max_odds_bps as u128 >= BPS_DENOM {
            return Err(EngineError::InvalidConfig(
                "odds bounds must lie in (0, 10000)".into(),
            ));
        }
        if self.min_odds_bps > self.max_odds_bps {
            return Err(EngineError::InvalidConfig(
                "min odds bound exceeds max odds bound".into(),
            ));
        }
        validate_odds(&self.odds, self.min_odds_bps, self.max_odds_bps)
    }
}

impl Default for SpinEngineConfig {
    fn default() -> Self {
        Self {
            version: 0,
            auction: AuctionParams::default(),
            emission: EmissionSchedule::default(),
            fees: SpinFeeConfig::default(),
            odds: vec![100, 250, 500, 1000, 2500, 8000],
            min_odds_bps: 1,
            max_odds_bps: 9000,
            metadata_uri: String::new(),
        }
    }
}

/// The odds table must be non-empty, bounded in length, and every entry
/// within the configured bounds.
pub fn validate_odds(table: &[Bps], min_bps: Bps, max_bps: Bps) -> Result<(), EngineError> {
    if table.is_empty() {
        return Err(EngineError::InvalidOddsConfiguration(
            "odds table must not be empty".into(),
        ));
    }
    if table.len() > MAX_ODDS_ENTRIES {
        return Err(EngineError::InvalidOddsConfiguration(format!(
            "odds table has {} entries, max {}",
            table.len(),
            MAX_ODDS_ENTRIES
        )));
    }
    for &entry in table {
        if entry < min_bps || entry > max_bps {
            return Err(EngineError::InvalidOddsConfiguration(format!(
                "odds entry {entry} outside [{min_bps}, {max_bps}]"
            )));
        }
    }
    Ok(())
}
