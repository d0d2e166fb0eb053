//! Chance-game engine integration tests.
//!
//! Settlement callbacks are driven by hand, deliberately late and out
//! of order, the way an external randomness provider would deliver
//! them.

use emberline_economics::{AuctionParams, EmissionSchedule, EngineError};
use emberline_ledger::{MockRandomnessProvider, SharedTokenLedger};
use emberline_spin::{SpinEngine, SpinEngineConfig, SpinFeeConfig};
use emberline_types::{AccountId, Amount, EngineEvent};
use proptest::prelude::*;

fn account(name: &str) -> AccountId {
    *blake3::hash(name.as_bytes()).as_bytes()
}

const VRF_FEE: Amount = 10;

struct Harness {
    engine: SpinEngine,
    payment: SharedTokenLedger,
    reward: SharedTokenLedger,
    engine_account: AccountId,
    treasury: AccountId,
    admin: AccountId,
    vrf_account: AccountId,
}

fn harness(config: SpinEngineConfig, balances: &[(AccountId, Amount)]) -> Harness {
    let admin = account("admin");
    let engine_account = account("spin-engine");
    let treasury = config.fees.treasury;
    let vrf_account = account("vrf-provider");

    let payment = SharedTokenLedger::with_balances(balances);
    let reward = SharedTokenLedger::new();
    let randomness = MockRandomnessProvider::new(VRF_FEE, vrf_account);

    let engine = SpinEngine::new(
        config,
        admin,
        engine_account,
        Box::new(payment.clone()),
        Box::new(reward.clone()),
        Box::new(randomness),
        0,
    )
    .unwrap();

    Harness {
        engine,
        payment,
        reward,
        engine_account,
        treasury,
        admin,
        vrf_account,
    }
}

/// Free spins (zero init price), short epochs, 5 sparks/s emission.
fn base_config() -> SpinEngineConfig {
    SpinEngineConfig {
        version: 0,
        auction: AuctionParams {
            epoch_period: 10,
            initial_price: 0,
            price_multiplier_bps: 20_000,
            min_init_price: 1,
            max_init_price: 1_000_000_000,
        },
        emission: EmissionSchedule {
            started_at: 0,
            halving_period: 1_000_000_000,
            initial_rate: 5,
            floor_rate: 1,
        },
        fees: SpinFeeConfig {
            treasury_bps: 9000,
            team_bps: 500,
            protocol_bps: 500,
            treasury: account("treasury"),
            team: None,
            protocol: None,
        },
        odds: vec![8000],
        min_odds_bps: 1,
        max_odds_bps: 9000,
        metadata_uri: String::new(),
    }
}

#[test]
fn scenario_c_settlement_reads_the_live_pool() {
    let x = account("player-x");
    let y = account("player-y");
    let mut h = harness(base_config(), &[(x, 1000), (y, 1000)]);

    // Seed the pool at 1000.
    h.reward.mint(&h.engine_account, 1000).unwrap();

    // X spins at t=0: nothing accrues, pool stays 1000.
    let spin_x = h.engine.spin(&x, 0, 100, 0, x, "", VRF_FEE, 0).unwrap();
    assert_eq!(spin_x.pool_balance, 1000);

    // Y spins at t=100 before X settles: +500 accrued emission.
    let spin_y = h.engine.spin(&y, 1, 200, 0, y, "", VRF_FEE, 100).unwrap();
    assert_eq!(spin_y.minted_to_pool, 500);
    assert_eq!(h.engine.pool_balance(), 1500);

    // X's settlement pays 80% of the LIVE 1500, not of the 1000 seen at
    // spin time.
    let receipt = h.engine.settle(spin_x.sequence_number, 0, 150).unwrap().unwrap();
    assert_eq!(receipt.payout_bps, 8000);
    assert_eq!(receipt.amount, 1200);
    assert_eq!(receipt.pool_after, 300);
    assert_eq!(h.reward.balance(&x), 1200);
}

#[test]
fn scenario_e_overpaid_randomness_fee_is_retained_forever() {
    let x = account("player-x");
    let mut h = harness(base_config(), &[(x, 1000)]);

    // Attach twice the quote: exactly 1x is forwarded, the rest stays.
    h.engine.spin(&x, 0, 100, 0, x, "", 2 * VRF_FEE, 0).unwrap();

    assert_eq!(h.payment.balance(&h.vrf_account), VRF_FEE);
    assert_eq!(h.payment.balance(&h.engine_account), VRF_FEE);
    assert_eq!(h.payment.balance(&x), 1000 - 2 * VRF_FEE);

    // No refund ever happens; the retained excess just sits there.
    let events = h.engine.take_events();
    assert!(!events
        .iter()
        .any(|event| matches!(event, EngineEvent::FeePaid { recipient, .. } if recipient == &x)));
}

#[test]
fn settlements_resolve_out_of_order_against_the_live_pool() {
    let x = account("player-x");
    let y = account("player-y");
    let mut h = harness(base_config(), &[(x, 1000), (y, 1000)]);
    h.reward.mint(&h.engine_account, 1000).unwrap();

    let spin_x = h.engine.spin(&x, 0, 100, 0, x, "", VRF_FEE, 0).unwrap();
    let spin_y = h.engine.spin(&y, 1, 100, 0, y, "", VRF_FEE, 0).unwrap();

    // Y's request resolves first despite being issued second.
    let first = h.engine.settle(spin_y.sequence_number, 0, 50).unwrap().unwrap();
    assert_eq!(first.amount, 800);
    assert_eq!(h.reward.balance(&y), 800);

    let second = h.engine.settle(spin_x.sequence_number, 0, 60).unwrap().unwrap();
    assert_eq!(second.amount, 160);
    assert_eq!(h.reward.balance(&x), 160);
    assert_eq!(h.engine.pool_balance(), 40);
}

#[test]
fn settlement_is_idempotent_against_provider_retries() {
    let x = account("player-x");
    let mut h = harness(base_config(), &[(x, 1000)]);
    h.reward.mint(&h.engine_account, 1000).unwrap();

    let spin = h.engine.spin(&x, 0, 100, 0, x, "", VRF_FEE, 0).unwrap();
    assert!(h.engine.has_pending(spin.sequence_number));

    let receipt = h.engine.settle(spin.sequence_number, 0, 10).unwrap();
    assert!(receipt.is_some());
    assert!(!h.engine.has_pending(spin.sequence_number));
    let paid = h.reward.balance(&x);

    // Retry of the same sequence, and a never-issued one: silent no-ops.
    assert!(h.engine.settle(spin.sequence_number, 0, 20).unwrap().is_none());
    assert!(h.engine.settle(777, 0, 20).unwrap().is_none());
    assert_eq!(h.reward.balance(&x), paid);
}

#[test]
fn spin_price_is_split_without_a_participant_share() {
    let mut config = base_config();
    config.auction.initial_price = 1000;
    config.fees.team = Some(account("team"));
    let x = account("player-x");
    let mut h = harness(config, &[(x, 10_000)]);

    let spin = h
        .engine
        .spin(&x, 0, 100, 1000, x, "", VRF_FEE, 0)
        .unwrap();
    assert_eq!(spin.price, 1000);

    // 900 treasury, 50 team, 50 unset-protocol folded to treasury.
    assert_eq!(h.payment.balance(&account("team")), 50);
    assert_eq!(h.payment.balance(&h.treasury), 950);
    // Only the retained fee excess (zero here) stays with the engine.
    assert_eq!(h.payment.balance(&h.engine_account), 0);
}

#[test]
fn spin_guard_ladder_fails_fast_with_no_state_change() {
    let mut config = base_config();
    config.auction.initial_price = 1000;
    let x = account("player-x");
    let mut h = harness(config, &[(x, 10_000)]);

    assert!(matches!(
        h.engine.spin(&x, 0, 100, 1000, [0u8; 32], "", VRF_FEE, 0),
        Err(EngineError::ZeroAddress)
    ));
    assert!(matches!(
        h.engine.spin(&x, 0, 100, 1000, x, "", VRF_FEE, 101),
        Err(EngineError::Expired { .. })
    ));
    assert!(matches!(
        h.engine.spin(&x, 3, 100, 1000, x, "", VRF_FEE, 0),
        Err(EngineError::EpochMismatch {
            expected: 3,
            current: 0
        })
    ));
    assert!(matches!(
        h.engine.spin(&x, 0, 100, 999, x, "", VRF_FEE, 0),
        Err(EngineError::MaxPriceExceeded { .. })
    ));
    assert!(matches!(
        h.engine.spin(&x, 0, 100, 1000, x, "", VRF_FEE - 1, 0),
        Err(EngineError::InsufficientFee {
            attached: 9,
            required: 10
        })
    ));

    assert_eq!(h.payment.balance(&x), 10_000);
    assert_eq!(h.engine.epoch().epoch_id, 0);
    assert_eq!(h.engine.pending_count(), 0);
}

#[test]
fn set_odds_validates_bounds_and_is_admin_only() {
    let mut h = harness(base_config(), &[]);
    let admin = h.admin;

    assert!(matches!(
        h.engine.set_odds(&account("mallory"), vec![500], 0),
        Err(EngineError::Unauthorized)
    ));
    assert!(matches!(
        h.engine.set_odds(&admin, vec![], 0),
        Err(EngineError::InvalidOddsConfiguration(_))
    ));
    assert!(matches!(
        h.engine.set_odds(&admin, vec![9500], 0),
        Err(EngineError::InvalidOddsConfiguration(_))
    ));

    h.engine.set_odds(&admin, vec![100, 500, 9000], 0).unwrap();
    assert_eq!(h.engine.odds(), &[100, 500, 9000]);
    assert_eq!(h.engine.config().version, 1);

    let events = h.engine.take_events();
    assert!(events
        .iter()
        .any(|event| matches!(event, EngineEvent::OddsUpdated { version: 1, .. })));
}

#[test]
fn pending_accrual_reports_unminted_emission() {
    let x = account("player-x");
    let mut h = harness(base_config(), &[(x, 1000)]);

    assert_eq!(h.engine.pending_accrual(100), 500);
    h.engine.spin(&x, 0, 200, 0, x, "", VRF_FEE, 100).unwrap();
    assert_eq!(h.engine.pending_accrual(100), 0);
    assert_eq!(h.engine.pool_balance(), 500);
}

#[test]
fn a_request_that_never_settles_sinks_its_fee() {
    let x = account("player-x");
    let mut h = harness(base_config(), &[(x, 1000)]);

    let spin = h.engine.spin(&x, 0, 100, 0, x, "", VRF_FEE, 0).unwrap();
    // No cancellation or timeout exists; the request just stays pending
    // and the fee is gone.
    assert!(h.engine.has_pending(spin.sequence_number));
    assert_eq!(h.engine.pending_count(), 1);
    assert_eq!(h.payment.balance(&x), 1000 - VRF_FEE);
}

proptest! {
    // Settlement invariant: the payout is exactly the floored
    // basis-point share of the live pool and never exceeds the cap.
    #[test]
    fn settlement_payout_matches_formula_and_cap(
        pool in 0u128..=1_000_000_000_000,
        odds_entry in 1u16..=9000,
        random_value in any::<u64>(),
    ) {
        let mut config = base_config();
        config.odds = vec![odds_entry];
        let x = account("player-x");
        let mut h = harness(config, &[(x, 1000)]);
        h.reward.mint(&h.engine_account, pool).unwrap();

        let spin = h.engine.spin(&x, 0, 100, 0, x, "", VRF_FEE, 0).unwrap();
        let receipt = h
            .engine
            .settle(spin.sequence_number, random_value, 10)
            .unwrap()
            .unwrap();

        prop_assert_eq!(receipt.amount, pool * odds_entry as u128 / 10_000);
        prop_assert!(receipt.amount <= pool * 9000 / 10_000);
        prop_assert_eq!(h.engine.pool_balance(), pool - receipt.amount);
    }
}
