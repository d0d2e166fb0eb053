//! The chance-game engine.
//!
//! Settlement intentionally reads the pool balance LIVE, at settlement
//! time, never a spin-time snapshot. The payout fraction is capped well
//! below 100%, so concurrent settlements against an overlapping pool
//! can never claim more than the balance covers — temporal fairness is
//! traded for solvency. Pending requests are single-use and deleted
//! before the payout transfer; retries and unknown sequence numbers are
//! silent no-ops.

use crate::config::{validate_odds, SpinEngineConfig};
use anyhow::anyhow;
use emberline_economics::{AuctionState, EngineError, FeeRecipient, FeeSplit};
use emberline_ledger::{RandomnessProvider, TokenLedger};
use emberline_types::{
    bps_share, is_zero_account, AccountId, Amount, Bps, EngineEvent, EpochId, SequenceNumber,
    Timestamp,
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::{debug, info, warn};

/// Spin awaiting its randomness callback.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingSpin {
    pub recipient: AccountId,
    /// Epoch the spin consumed (informational; the payout base is the
    /// live pool, never an epoch snapshot).
    pub epoch_id: EpochId,
}

/// Result of a successful spin purchase.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpinReceipt {
    pub sequence_number: SequenceNumber,
    /// Epoch id after the action.
    pub epoch_id: EpochId,
    pub price: Amount,
    /// Emission minted into the pool by this spin.
    pub minted_to_pool: Amount,
    pub pool_balance: Amount,
}

/// Result of a settled spin.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SettlementReceipt {
    pub sequence_number: SequenceNumber,
    pub recipient: AccountId,
    pub payout_bps: Bps,
    pub amount: Amount,
    pub pool_after: Amount,
}

/// Pay-to-play chance-game engine over a shared prize pool.
pub struct SpinEngine {
    config: SpinEngineConfig,
    admin: AccountId,
    engine_account: AccountId,
    auction: AuctionState,
    /// Monotonic non-decreasing emission accrual cursor.
    last_accrual_at: Timestamp,
    pending: HashMap<SequenceNumber, PendingSpin>,
    payment: Box<dyn TokenLedger>,
    reward: Box<dyn TokenLedger>,
    randomness: Box<dyn RandomnessProvider>,
    events: Vec<EngineEvent>,
}

impl SpinEngine {
    pub fn new(
        config: SpinEngineConfig,
        admin: AccountId,
        engine_account: AccountId,
        payment: Box<dyn TokenLedger>,
        reward: Box<dyn TokenLedger>,
        randomness: Box<dyn RandomnessProvider>,
        now: Timestamp,
    ) -> Result<Self, EngineError> {
        config.validate()?;
        if is_zero_account(&admin) || is_zero_account(&engine_account) {
            return Err(EngineError::ZeroAddress);
        }

        let auction = AuctionState::new(config.auction.initial_price, now);
        info!(target: "spin", "chance-game engine initialized");

        Ok(Self {
            config,
            admin,
            engine_account,
            auction,
            last_accrual_at: now,
            pending: HashMap::new(),
            payment,
            reward,
            randomness,
            events: Vec::new(),
        })
    }

    /// Buy a spin: pay the current price plus the attached randomness
    /// fee, mint the accrued emission into the pool, and issue a
    /// randomness request.
    ///
    /// Any attached fee beyond the provider's quote is retained by the
    /// engine permanently — there is no refund path.
    #[allow(clippy::too_many_arguments)]
    pub fn spin(
        &mut self,
        caller: &AccountId,
        expected_epoch_id: EpochId,
        deadline: Timestamp,
        max_price: Amount,
        recipient: AccountId,
        metadata_uri: &str,
        attached_fee: Amount,
        now: Timestamp,
    ) -> Result<SpinReceipt, EngineError> {
        if is_zero_account(&recipient) {
            return Err(EngineError::ZeroAddress);
        }
        if now > deadline {
            return Err(EngineError::Expired { now, deadline });
        }
        let current = self.auction.epoch_id;
        if expected_epoch_id != current {
            return Err(EngineError::EpochMismatch {
                expected: expected_epoch_id,
                current,
            });
        }
        let price = self.auction.price_at(now, &self.config.auction);
        if price > max_price {
            return Err(EngineError::MaxPriceExceeded { price, max_price });
        }
        let required = self.randomness.request_fee();
        if attached_fee < required {
            return Err(EngineError::InsufficientFee {
                attached: attached_fee,
                required,
            });
        }

        // Checked up front so the action stays atomic.
        let needed = price.saturating_add(attached_fee);
        if needed > 0 && self.payment.balance_of(caller) < needed {
            return Err(EngineError::Token(anyhow!(
                "caller balance below price {} plus attached fee {}",
                price,
                attached_fee
            )));
        }

        // Collect the attached fee, forward exactly the quote to the
        // provider, retain the rest for good.
        self.payment
            .transfer(caller, &self.engine_account, attached_fee)?;
        let (fee, sequence_number) = self.randomness.request_randomness()?;
        let fee_account = self.randomness.fee_account();
        self.payment
            .transfer(&self.engine_account, &fee_account, fee)?;
        if attached_fee > fee {
            warn!(
                target: "spin",
                "retaining {} overpaid randomness fee (no refund path)",
                attached_fee - fee
            );
        }

        // Collect and distribute the price: treasury/team/protocol only,
        // remainder to treasury. Nothing of the price stays here.
        if price > 0 {
            self.payment.transfer(caller, &self.engine_account, price)?;
            self.distribute_price(caller, price, now)?;
        }

        // The pool grows on every spin, win or lose.
        let minted_to_pool = self
            .config
            .emission
            .accrued(self.last_accrual_at, now);
        if minted_to_pool > 0 {
            self.reward.mint(&self.engine_account, minted_to_pool)?;
        }
        self.last_accrual_at = self.last_accrual_at.max(now);

        self.auction.advance(price, now, &self.config.auction);
        let epoch_id = self.auction.epoch_id;

        self.pending.insert(
            sequence_number,
            PendingSpin {
                recipient,
                epoch_id: current,
            },
        );

        let pool_balance = self.reward.balance_of(&self.engine_account);
        debug!(
            target: "spin",
            "spin {} purchased at price {} (epoch {} -> {}), pool {}",
            sequence_number, price, current, epoch_id, pool_balance
        );
        self.events.push(EngineEvent::SpinStarted {
            player: *caller,
            recipient,
            epoch_id: current,
            price,
            sequence_number,
            metadata_uri: metadata_uri.to_string(),
            timestamp: now,
        });

        Ok(SpinReceipt {
            sequence_number,
            epoch_id,
            price,
            minted_to_pool,
            pool_balance,
        })
    }

    /// Settlement callback from the randomness provider. May arrive
    /// after arbitrary delay and in any order across pending requests.
    ///
    /// Returns `Ok(None)` for unknown or already-settled sequence
    /// numbers: the handler is idempotent against provider retries.
    pub fn settle(
        &mut self,
        sequence_number: SequenceNumber,
        random_value: u64,
        now: Timestamp,
    ) -> Result<Option<SettlementReceipt>, EngineError> {
        // Deleted before the payout transfer (single-use).
        let Some(pending) = self.pending.remove(&sequence_number) else {
            debug!(target: "spin", "ignoring settlement for unknown sequence {}", sequence_number);
            return Ok(None);
        };

        let table = &self.config.odds;
        let index = (random_value % table.len() as u64) as usize;
        let payout_bps = table[index];

        // The payout base is the pool as it stands NOW.
        let live = self.reward.balance_of(&self.engine_account);
        let amount = bps_share(live, payout_bps);
        if amount > 0 {
            self.reward
                .transfer(&self.engine_account, &pending.recipient, amount)?;
        }
        let pool_after = self.reward.balance_of(&self.engine_account);

        info!(
            target: "spin",
            "spin {} settled at {} bps: paid {} of {} (pool now {})",
            sequence_number, payout_bps, amount, live, pool_after
        );
        self.events.push(EngineEvent::SpinSettled {
            sequence_number,
            recipient: pending.recipient,
            payout_bps,
            amount,
            pool_after,
            timestamp: now,
        });

        Ok(Some(SettlementReceipt {
            sequence_number,
            recipient: pending.recipient,
            payout_bps,
            amount,
            pool_after,
        }))
    }

    /// Replace the odds table wholesale.
    pub fn set_odds(
        &mut self,
        caller: &AccountId,
        odds: Vec<Bps>,
        now: Timestamp,
    ) -> Result<(), EngineError> {
        self.ensure_admin(caller)?;
        validate_odds(&odds, self.config.min_odds_bps, self.config.max_odds_bps)?;
        self.config.odds = odds.clone();
        self.config.version += 1;

        info!(target: "spin", "odds table replaced ({} entries)", odds.len());
        self.events.push(EngineEvent::OddsUpdated {
            entries: odds,
            version: self.config.version,
            timestamp: now,
        });
        Ok(())
    }

    /// Replace the treasury (fee remainder sink).
    pub fn set_treasury(
        &mut self,
        caller: &AccountId,
        treasury: AccountId,
        now: Timestamp,
    ) -> Result<(), EngineError> {
        self.ensure_admin(caller)?;
        if is_zero_account(&treasury) {
            return Err(EngineError::ZeroAddress);
        }
        self.config.fees.treasury = treasury;
        self.bump_config("fees.treasury", now);
        Ok(())
    }

    /// Set or clear the team fee recipient.
    pub fn set_team(
        &mut self,
        caller: &AccountId,
        team: Option<AccountId>,
        now: Timestamp,
    ) -> Result<(), EngineError> {
        self.ensure_admin(caller)?;
        self.config.fees.team = team;
        self.bump_config("fees.team", now);
        Ok(())
    }

    /// Set or clear the protocol fee recipient.
    pub fn set_protocol(
        &mut self,
        caller: &AccountId,
        protocol: Option<AccountId>,
        now: Timestamp,
    ) -> Result<(), EngineError> {
        self.ensure_admin(caller)?;
        self.config.fees.protocol = protocol;
        self.bump_config("fees.protocol", now);
        Ok(())
    }

    /// Replace the metadata URI.
    pub fn set_metadata_uri(
        &mut self,
        caller: &AccountId,
        metadata_uri: String,
        now: Timestamp,
    ) -> Result<(), EngineError> {
        self.ensure_admin(caller)?;
        self.config.metadata_uri = metadata_uri;
        self.bump_config("metadata_uri", now);
        Ok(())
    }

    // ---- read-only queries ----

    /// Current spin price.
    pub fn price(&self, now: Timestamp) -> Amount {
        self.auction.price_at(now, &self.config.auction)
    }

    pub fn epoch(&self) -> &AuctionState {
        &self.auction
    }

    /// The prize pool: the engine's own reward-token balance.
    pub fn pool_balance(&self) -> Amount {
        self.reward.balance_of(&self.engine_account)
    }

    /// Emission accrued since the last spin but not yet minted.
    pub fn pending_accrual(&self, now: Timestamp) -> Amount {
        self.config.emission.accrued(self.last_accrual_at, now)
    }

    pub fn odds(&self) -> &[Bps] {
        &self.config.odds
    }

    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }

    pub fn has_pending(&self, sequence_number: SequenceNumber) -> bool {
        self.pending.contains_key(&sequence_number)
    }

    pub fn config(&self) -> &SpinEngineConfig {
        &self.config
    }

    pub fn engine_account(&self) -> AccountId {
        self.engine_account
    }

    pub fn payment_ledger(&self) -> &dyn TokenLedger {
        self.payment.as_ref()
    }

    pub fn reward_ledger(&self) -> &dyn TokenLedger {
        self.reward.as_ref()
    }

    /// Drain accumulated events for external delivery.
    pub fn take_events(&mut self) -> Vec<EngineEvent> {
        std::mem::take(&mut self.events)
    }

    // ---- internals ----

    fn ensure_admin(&self, caller: &AccountId) -> Result<(), EngineError> {
        if caller != &self.admin {
            return Err(EngineError::Unauthorized);
        }
        Ok(())
    }

    fn bump_config(&mut self, field: &str, now: Timestamp) {
        self.config.version += 1;
        info!(target: "spin", "config updated: {} (version {})", field, self.config.version);
        self.events.push(EngineEvent::ConfigUpdated {
            field: field.to_string(),
            version: self.config.version,
            timestamp: now,
        });
    }

    fn distribute_price(
        &mut self,
        payer: &AccountId,
        price: Amount,
        now: Timestamp,
    ) -> Result<(), EngineError> {
        let fees = self.config.fees.clone();
        let split = FeeSplit::new(vec![
            FeeRecipient {
                account: Some(fees.treasury),
                weight_bps: fees.treasury_bps,
            },
            FeeRecipient {
                account: fees.team,
                weight_bps: fees.team_bps,
            },
            FeeRecipient {
                account: fees.protocol,
                weight_bps: fees.protocol_bps,
            },
        ]);
        let (shares, remainder) = split.split(price);

        for (recipient, amount) in &shares {
            if *amount == 0 {
                continue;
            }
            let Some(account) = recipient.account else {
                continue;
            };
            self.payment
                .transfer(&self.engine_account, &account, *amount)?;
            self.events.push(EngineEvent::FeePaid {
                payer: *payer,
                recipient: account,
                amount: *amount,
                timestamp: now,
            });
        }

        if remainder > 0 {
            self.payment
                .transfer(&self.engine_account, &fees.treasury, remainder)?;
            self.events.push(EngineEvent::FeePaid {
                payer: *payer,
                recipient: fees.treasury,
                amount: remainder,
                timestamp: now,
            });
        }

        Ok(())
    }
}
