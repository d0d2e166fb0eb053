//! Benchmarks for the pricing and emission hot path.

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use emberline_economics::{AuctionParams, AuctionState, EmissionSchedule, FeeRecipient, FeeSplit};

fn bench_price_at(c: &mut Criterion) {
    let params = AuctionParams::default();
    let state = AuctionState::new(params.initial_price, 0);

    c.bench_function("price_at", |b| {
        b.iter(|| state.price_at(black_box(1800), &params))
    });
}

fn bench_rate_at(c: &mut Criterion) {
    let schedule = EmissionSchedule::default();

    c.bench_function("rate_at", |b| {
        b.iter(|| schedule.rate_at(black_box(200_000_000)))
    });
}

fn bench_fee_split(c: &mut Criterion) {
    let split = FeeSplit::new(vec![
        FeeRecipient {
            account: Some([1u8; 32]),
            weight_bps: 8000,
        },
        FeeRecipient {
            account: Some([2u8; 32]),
            weight_bps: 1000,
        },
        FeeRecipient {
            account: None,
            weight_bps: 500,
        },
        FeeRecipient {
            account: Some([4u8; 32]),
            weight_bps: 500,
        },
    ]);

    c.bench_function("fee_split", |b| b.iter(|| split.split(black_box(1_000_001))));
}

criterion_group!(benches, bench_price_at, bench_rate_at, bench_fee_split);
criterion_main!(benches);
