//! Fungible/mintable token ledger seam.
//!
//! Transfers are assumed all-or-nothing: no fee-on-transfer, no partial
//! transfer. A backend violating that assumption breaks the engines'
//! conservation invariants — a documented limitation, not a handled
//! case.

use anyhow::Result;
use emberline_types::{AccountId, Amount};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;

/// Interface for token ledger operations.
///
/// Mint authorization (only the engine's account may mint the reward
/// token) is enforced by the token, not by this core.
pub trait TokenLedger: Send + Sync {
    /// Move `amount` from `from` to `to`, all or nothing.
    fn transfer(&mut self, from: &AccountId, to: &AccountId, amount: Amount) -> Result<()>;

    /// Create `amount` new units in `to`'s balance.
    fn mint(&mut self, to: &AccountId, amount: Amount) -> Result<()>;

    /// Current balance of an account.
    fn balance_of(&self, account: &AccountId) -> Amount;

    /// Total units in circulation.
    fn total_supply(&self) -> Amount;
}

/// In-memory token ledger for node runtime and testing.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct InMemoryTokenLedger {
    balances: HashMap<AccountId, Amount>,
    total_supply: Amount,
}

impl InMemoryTokenLedger {
    pub fn new() -> Self {
        Self {
            balances: HashMap::new(),
            total_supply: 0,
        }
    }

    /// Ledger pre-seeded with balances (testing convenience).
    pub fn with_balances(seed: &[(AccountId, Amount)]) -> Self {
        let mut ledger = Self::new();
        for (account, amount) in seed {
            ledger.balances.insert(*account, *amount);
            ledger.total_supply = ledger.total_supply.saturating_add(*amount);
        }
        ledger
    }
}

impl TokenLedger for InMemoryTokenLedger {
    fn transfer(&mut self, from: &AccountId, to: &AccountId, amount: Amount) -> Result<()> {
        if amount == 0 {
            return Ok(());
        }
        let from_balance = self.balances.get(from).copied().unwrap_or(0);
        if from_balance < amount {
            return Err(anyhow::anyhow!(
                "insufficient balance: have {from_balance}, need {amount}"
            ));
        }
        self.balances.insert(*from, from_balance - amount);
        let to_balance = self.balances.get(to).copied().unwrap_or(0);
        self.balances.insert(*to, to_balance.saturating_add(amount));

        debug!(target: "ledger", "transferred {} units", amount);
        Ok(())
    }

    fn mint(&mut self, to: &AccountId, amount: Amount) -> Result<()> {
        if amount == 0 {
            return Ok(());
        }
        let balance = self.balances.get(to).copied().unwrap_or(0);
        self.balances.insert(*to, balance.saturating_add(amount));
        self.total_supply = self.total_supply.saturating_add(amount);

        debug!(target: "ledger", "minted {} units", amount);
        Ok(())
    }

    fn balance_of(&self, account: &AccountId) -> Amount {
        self.balances.get(account).copied().unwrap_or(0)
    }

    fn total_supply(&self) -> Amount {
        self.total_supply
    }
}

/// Cheaply clonable handle over one shared in-memory ledger.
///
/// Lets a deployment point both engines (and external observers such as
/// tests or an indexer feed) at the same token state.
#[derive(Debug, Clone, Default)]
pub struct SharedTokenLedger {
    inner: Arc<RwLock<InMemoryTokenLedger>>,
}

impl SharedTokenLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_balances(seed: &[(AccountId, Amount)]) -> Self {
        Self {
            inner: Arc::new(RwLock::new(InMemoryTokenLedger::with_balances(seed))),
        }
    }

    /// Snapshot of an account balance without going through the trait.
    pub fn balance(&self, account: &AccountId) -> Amount {
        self.inner.read().balance_of(account)
    }

    /// Mint through the shared handle (funding test scenarios).
    pub fn mint(&self, to: &AccountId, amount: Amount) -> Result<()> {
        self.inner.write().mint(to, amount)
    }
}

impl TokenLedger for SharedTokenLedger {
    fn transfer(&mut self, from: &AccountId, to: &AccountId, amount: Amount) -> Result<()> {
        self.inner.write().transfer(from, to, amount)
    }

    fn mint(&mut self, to: &AccountId, amount: Amount) -> Result<()> {
        self.inner.write().mint(to, amount)
    }

    fn balance_of(&self, account: &AccountId) -> Amount {
        self.inner.read().balance_of(account)
    }

    fn total_supply(&self) -> Amount {
        self.inner.read().total_supply()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn account(name: &str) -> AccountId {
        *blake3::hash(name.as_bytes()).as_bytes()
    }

    #[test]
    fn test_transfer_moves_balance() {
        let alice = account("alice");
        let bob = account("bob");
        let mut ledger = InMemoryTokenLedger::with_balances(&[(alice, 1000)]);

        ledger.transfer(&alice, &bob, 300).unwrap();
        assert_eq!(ledger.balance_of(&alice), 700);
        assert_eq!(ledger.balance_of(&bob), 300);
        assert_eq!(ledger.total_supply(), 1000);
    }

    #[test]
    fn test_transfer_is_all_or_nothing() {
        let alice = account("alice");
        let bob = account("bob");
        let mut ledger = InMemoryTokenLedger::with_balances(&[(alice, 100)]);

        assert!(ledger.transfer(&alice, &bob, 101).is_err());
        assert_eq!(ledger.balance_of(&alice), 100);
        assert_eq!(ledger.balance_of(&bob), 0);
    }

    #[test]
    fn test_zero_transfer_is_noop() {
        let alice = account("alice");
        let bob = account("bob");
        let mut ledger = InMemoryTokenLedger::new();
        ledger.transfer(&alice, &bob, 0).unwrap();
    }

    #[test]
    fn test_mint_grows_supply() {
        let alice = account("alice");
        let mut ledger = InMemoryTokenLedger::new();
        ledger.mint(&alice, 500).unwrap();
        assert_eq!(ledger.balance_of(&alice), 500);
        assert_eq!(ledger.total_supply(), 500);
    }

    #[test]
    fn test_shared_ledger_aliases_one_state() {
        let alice = account("alice");
        let bob = account("bob");
        let shared = SharedTokenLedger::with_balances(&[(alice, 1000)]);
        let mut engine_handle = shared.clone();

        engine_handle.transfer(&alice, &bob, 400).unwrap();
        assert_eq!(shared.balance(&alice), 600);
        assert_eq!(shared.balance(&bob), 400);
    }
}
