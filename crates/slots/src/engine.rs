//! The mining engine.
//!
//! Every entry point validates fully before touching state, and every
//! outward token movement happens after the bookkeeping it belongs to
//! (checks-effects-interactions). Claimable balances are zeroed before
//! the withdrawal transfer.

use crate::config::SlotEngineConfig;
use crate::slot::Slot;
use anyhow::anyhow;
use emberline_economics::{EngineError, FeeRecipient, FeeSplit};
use emberline_ledger::{RandomnessProvider, TokenLedger};
use emberline_types::{
    is_zero_account, AccountId, Amount, Bps, EngineEvent, EpochId, SequenceNumber, Timestamp,
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::{debug, info, warn};

/// Boost draw awaiting its randomness callback.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingDraw {
    pub slot_index: u32,
    /// Epoch the draw was issued for; a draw settling after the slot
    /// was re-mined is discarded.
    pub epoch_id: EpochId,
}

/// Result of a successful mine action.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MineReceipt {
    pub slot_index: u32,
    /// Epoch id after the action.
    pub epoch_id: EpochId,
    pub price: Amount,
    pub displaced: Option<AccountId>,
    /// Sparks minted to the displaced occupant.
    pub minted: Amount,
    pub draw_sequence: Option<SequenceNumber>,
}

/// Slot-occupancy mining engine.
pub struct SlotEngine {
    config: SlotEngineConfig,
    admin: AccountId,
    engine_account: AccountId,
    slots: Vec<Slot>,
    claimable: HashMap<AccountId, Amount>,
    total_claimable: Amount,
    pending_draws: HashMap<SequenceNumber, PendingDraw>,
    payment: Box<dyn TokenLedger>,
    reward: Box<dyn TokenLedger>,
    randomness: Box<dyn RandomnessProvider>,
    events: Vec<EngineEvent>,
}

impl SlotEngine {
    pub fn new(
        config: SlotEngineConfig,
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

        let slots = (0..config.capacity)
            .map(|index| Slot::empty(index, config.auction.initial_price, now))
            .collect();

        info!(target: "slots", "mining engine initialized with {} slots", config.capacity);

        Ok(Self {
            config,
            admin,
            engine_account,
            slots,
            claimable: HashMap::new(),
            total_claimable: 0,
            pending_draws: HashMap::new(),
            payment,
            reward,
            randomness,
            events: Vec::new(),
        })
    }

    /// Mine a slot: pay the current Dutch-auction price, displace the
    /// occupant, and take over emission from `now`.
    ///
    /// Self-displacement is permitted: an occupant re-mining their own
    /// slot gets their own miner share back through the claimable
    /// ledger, so their net cost at a non-zero price is the non-occupant
    /// fee shares; at zero price only the accrued emission is minted.
    #[allow(clippy::too_many_arguments)]
    pub fn mine(
        &mut self,
        caller: &AccountId,
        slot_index: u32,
        expected_epoch_id: EpochId,
        deadline: Timestamp,
        max_price: Amount,
        recipient: AccountId,
        metadata_uri: &str,
        now: Timestamp,
    ) -> Result<MineReceipt, EngineError> {
        if is_zero_account(&recipient) {
            return Err(EngineError::ZeroAddress);
        }
        if now > deadline {
            return Err(EngineError::Expired { now, deadline });
        }
        let slot = self
            .slots
            .get(slot_index as usize)
            .ok_or(EngineError::UnknownSlot(slot_index))?;
        let current = slot.epoch_id();
        if expected_epoch_id != current {
            return Err(EngineError::EpochMismatch {
                expected: expected_epoch_id,
                current,
            });
        }
        let price = slot.auction.price_at(now, &self.config.auction);
        if price > max_price {
            return Err(EngineError::MaxPriceExceeded { price, max_price });
        }

        // The miner funds the price and, when boost draws are on, the
        // randomness fee. Checked up front so the action stays atomic.
        let draw_fee = if self.config.boost.enabled {
            self.randomness.request_fee()
        } else {
            0
        };
        let needed = price.saturating_add(draw_fee);
        if needed > 0 && self.payment.balance_of(caller) < needed {
            return Err(EngineError::Token(anyhow!(
                "caller balance below price {} plus draw fee {}",
                price,
                draw_fee
            )));
        }

        let displaced = slot.occupant;
        let minted = slot.pending_emission(now);

        // Collect and distribute the price. An expired epoch clears at
        // zero: no transfer, no fee.
        if price > 0 {
            self.payment.transfer(caller, &self.engine_account, price)?;
            self.distribute_price(caller, displaced, price, now)?;
        }

        // Emission accrued over the elapsed occupancy goes to whoever
        // held the slot through it, never to the new occupant.
        if let Some(previous) = displaced {
            if minted > 0 {
                self.reward.mint(&previous, minted)?;
            }
        }

        let capacity = self.slots.len() as u128;
        let fresh_rate = self.config.emission.rate_at(now) / capacity;

        let slot = &mut self.slots[slot_index as usize];
        slot.auction.advance(price, now, &self.config.auction);
        slot.occupant = Some(recipient);
        slot.emission_rate = fresh_rate;
        slot.metadata_uri = metadata_uri.to_string();
        slot.boost = None;
        let epoch_id = slot.epoch_id();

        debug!(
            target: "slots",
            "slot {} mined at price {} (epoch {}), displaced occupant minted {}",
            slot_index, price, epoch_id, minted
        );

        self.events.push(EngineEvent::SlotMined {
            slot_index,
            epoch_id,
            miner: recipient,
            displaced,
            price,
            minted,
            metadata_uri: metadata_uri.to_string(),
            timestamp: now,
        });

        let draw_sequence = if self.config.boost.enabled {
            Some(self.request_boost_draw(caller, slot_index, epoch_id, now)?)
        } else {
            None
        };

        Ok(MineReceipt {
            slot_index,
            epoch_id,
            price,
            displaced,
            minted,
            draw_sequence,
        })
    }

    /// Withdraw the caller's entire claimable balance (pull-payment).
    pub fn claim(&mut self, account: &AccountId, now: Timestamp) -> Result<Amount, EngineError> {
        let amount = self.claimable.get(account).copied().unwrap_or(0);
        if amount == 0 {
            return Err(EngineError::NoClaimableBalance);
        }

        // Zeroed before the outward transfer.
        self.claimable.remove(account);
        self.total_claimable = self.total_claimable.saturating_sub(amount);

        self.payment.transfer(&self.engine_account, account, amount)?;

        info!(target: "slots", "claimed {} payment units", amount);
        self.events.push(EngineEvent::Claimed {
            account: *account,
            amount,
            timestamp: now,
        });

        Ok(amount)
    }

    /// Settlement callback for a rate-boost draw. Unknown or repeated
    /// sequence numbers are a silent no-op (idempotent against provider
    /// retries); a draw whose slot epoch has moved on is discarded.
    pub fn settle_boost_draw(
        &mut self,
        sequence_number: SequenceNumber,
        random_value: u64,
        now: Timestamp,
    ) -> Result<(), EngineError> {
        let Some(draw) = self.pending_draws.remove(&sequence_number) else {
            debug!(target: "slots", "ignoring settlement for unknown sequence {}", sequence_number);
            return Ok(());
        };

        let table = &self.config.boost.multipliers_bps;
        if table.is_empty() {
            warn!(target: "slots", "boost table emptied while draw {} was pending", sequence_number);
            return Ok(());
        }

        let Some(slot) = self.slots.get_mut(draw.slot_index as usize) else {
            return Ok(());
        };
        if slot.epoch_id() != draw.epoch_id {
            warn!(
                target: "slots",
                "discarding stale boost draw for slot {}: epoch moved on", draw.slot_index
            );
            return Ok(());
        }

        let index = (random_value % table.len() as u64) as usize;
        let multiplier_bps = table[index];
        let expires_at = now.saturating_add(self.config.boost.duration);
        slot.boost = Some(crate::slot::RateBoost {
            multiplier_bps,
            expires_at,
        });

        info!(
            target: "slots",
            "slot {} boosted to {} bps until {}", draw.slot_index, multiplier_bps, expires_at
        );
        self.events.push(EngineEvent::BoostDrawSettled {
            slot_index: draw.slot_index,
            multiplier_bps,
            expires_at,
            timestamp: now,
        });

        Ok(())
    }

    /// Raise the slot count. Appended slots start empty at the configured
    /// initial price. Existing slots keep their stored emission rate
    /// until next mined — the global rate is NOT retroactively rescaled.
    pub fn set_capacity(
        &mut self,
        caller: &AccountId,
        new_capacity: u32,
        now: Timestamp,
    ) -> Result<(), EngineError> {
        self.ensure_admin(caller)?;
        let current = self.slots.len() as u32;
        if new_capacity <= current {
            return Err(EngineError::CapacityMustIncrease {
                current,
                requested: new_capacity,
            });
        }

        for index in current..new_capacity {
            self.slots
                .push(Slot::empty(index, self.config.auction.initial_price, now));
        }
        self.config.capacity = new_capacity;
        self.config.version += 1;

        warn!(
            target: "slots",
            "capacity raised {} -> {}; active slots keep their stored emission rate until next mined",
            current, new_capacity
        );
        self.events.push(EngineEvent::CapacityRaised {
            previous: current,
            current: new_capacity,
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

    /// Set or clear the team fee recipient. While unset its share folds
    /// into the treasury remainder.
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

    /// Replace the boost multiplier table.
    pub fn set_boost_table(
        &mut self,
        caller: &AccountId,
        multipliers_bps: Vec<Bps>,
        now: Timestamp,
    ) -> Result<(), EngineError> {
        self.ensure_admin(caller)?;
        let mut boost = self.config.boost.clone();
        boost.multipliers_bps = multipliers_bps;
        boost.validate()?;
        self.config.boost = boost;
        self.bump_config("boost.multipliers_bps", now);
        Ok(())
    }

    /// Replace the metadata base URI.
    pub fn set_metadata_base_uri(
        &mut self,
        caller: &AccountId,
        metadata_base_uri: String,
        now: Timestamp,
    ) -> Result<(), EngineError> {
        self.ensure_admin(caller)?;
        self.config.metadata_base_uri = metadata_base_uri;
        self.bump_config("metadata_base_uri", now);
        Ok(())
    }

    // ---- read-only queries ----

    pub fn slot(&self, index: u32) -> Option<&Slot> {
        self.slots.get(index as usize)
    }

    pub fn slots(&self) -> &[Slot] {
        &self.slots
    }

    pub fn capacity(&self) -> u32 {
        self.slots.len() as u32
    }

    /// Current Dutch-auction price of a slot.
    pub fn price_of(&self, index: u32, now: Timestamp) -> Result<Amount, EngineError> {
        let slot = self
            .slots
            .get(index as usize)
            .ok_or(EngineError::UnknownSlot(index))?;
        Ok(slot.auction.price_at(now, &self.config.auction))
    }

    /// The per-slot emission rate a mine executed at `now` would lock in.
    pub fn current_rate(&self, now: Timestamp) -> Amount {
        self.config.emission.rate_at(now) / self.slots.len() as u128
    }

    /// Emission accrued by a slot's occupant but not yet minted.
    pub fn pending_emission(&self, index: u32, now: Timestamp) -> Result<Amount, EngineError> {
        let slot = self
            .slots
            .get(index as usize)
            .ok_or(EngineError::UnknownSlot(index))?;
        Ok(slot.pending_emission(now))
    }

    pub fn claimable_balance(&self, account: &AccountId) -> Amount {
        self.claimable.get(account).copied().unwrap_or(0)
    }

    /// Sum of all claimable balances; equals the engine's payment-token
    /// balance at every observable state.
    pub fn total_claimable(&self) -> Amount {
        self.total_claimable
    }

    pub fn has_pending_draw(&self, sequence_number: SequenceNumber) -> bool {
        self.pending_draws.contains_key(&sequence_number)
    }

    pub fn config(&self) -> &SlotEngineConfig {
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
        info!(target: "slots", "config updated: {} (version {})", field, self.config.version);
        self.events.push(EngineEvent::ConfigUpdated {
            field: field.to_string(),
            version: self.config.version,
            timestamp: now,
        });
    }

    /// Split a collected price: the miner share stays in the engine as
    /// the displaced occupant's claimable balance, the remaining shares
    /// and the rounding remainder are transferred out.
    fn distribute_price(
        &mut self,
        payer: &AccountId,
        displaced: Option<AccountId>,
        price: Amount,
        now: Timestamp,
    ) -> Result<(), EngineError> {
        let fees = self.config.fees.clone();
        let split = FeeSplit::new(vec![
            FeeRecipient {
                account: displaced,
                weight_bps: fees.miner_share_bps,
            },
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

        // Displaced occupant's cut becomes a pull-payment balance.
        let miner_cut = shares[0].1;
        if let Some(previous) = displaced {
            if miner_cut > 0 {
                let entry = self.claimable.entry(previous).or_insert(0);
                *entry = entry.saturating_add(miner_cut);
                self.total_claimable = self.total_claimable.saturating_add(miner_cut);
            }
        }

        // Outward shares leave the engine immediately.
        for (recipient, amount) in &shares[1..] {
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

        // Remainder (rounding plus unset-recipient shares, plus the
        // miner share when the slot had no occupant) to the sink.
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

    fn request_boost_draw(
        &mut self,
        caller: &AccountId,
        slot_index: u32,
        epoch_id: EpochId,
        now: Timestamp,
    ) -> Result<SequenceNumber, EngineError> {
        let (fee, sequence_number) = self.randomness.request_randomness()?;
        let fee_account = self.randomness.fee_account();
        self.payment.transfer(caller, &fee_account, fee)?;

        self.pending_draws
            .insert(sequence_number, PendingDraw { slot_index, epoch_id });

        debug!(
            target: "slots",
            "boost draw {} issued for slot {} epoch {}", sequence_number, slot_index, epoch_id
        );
        self.events.push(EngineEvent::BoostDrawRequested {
            slot_index,
            epoch_id,
            sequence_number,
            timestamp: now,
        });

        Ok(sequence_number)
    }
}
