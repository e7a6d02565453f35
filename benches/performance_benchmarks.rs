//! Benchmarks for the simulator hot path and a full generation cycle.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use rand::rngs::StdRng;
use rand::SeedableRng;

use evotrade::prelude::*;

fn synthetic_series(symbol: &str, size: usize) -> PriceSeries {
    let start = chrono::NaiveDate::from_ymd_opt(2022, 1, 1).unwrap();
    let bars = (0..size)
        .map(|i| {
            let close = 100.0 + (i as f64 * 0.1).sin() * 5.0 + i as f64 * 0.05;
            PriceBar {
                date: start + chrono::Days::new(i as u64),
                open: close - 0.5,
                high: close + 1.0,
                low: close - 1.0,
                close,
                volume: 1_000.0,
            }
        })
        .collect();
    PriceSeries::new(symbol, bars)
}

fn bench_run_backtest(c: &mut Criterion) {
    let mut group = c.benchmark_group("run_backtest");
    let genome = Genome::new(0.2, 0.6, 0.3, 0.0);
    let config = BacktestConfig::default();

    for size in [100usize, 365, 730, 2_000] {
        let series = synthetic_series("BTC", size);
        group.bench_with_input(BenchmarkId::from_parameter(size), &series, |b, series| {
            b.iter(|| run_backtest(black_box(&genome), black_box(series), &config));
        });
    }
    group.finish();
}

fn bench_generation_cycle(c: &mut Criterion) {
    let engine = EvolutionEngine::with_defaults();
    let mut provider = InMemoryPriceHistory::new();
    for (symbol, _) in engine.symbols().iter() {
        provider.insert(synthetic_series(symbol, 730));
    }

    c.bench_function("generation_cycle_20_agents", |b| {
        b.iter(|| {
            let mut rng = StdRng::seed_from_u64(42);
            let founders = founder_population(20, &mut rng);
            engine
                .run_generation_cycle(black_box(founders), &provider, &mut rng)
                .expect("cycle")
        });
    });
}

criterion_group!(benches, bench_run_backtest, bench_generation_cycle);
criterion_main!(benches);
