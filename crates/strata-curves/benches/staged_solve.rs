//! Benchmarks for staged calibration.
//!
//! Run with: cargo bench -p strata-curves

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};

use strata_curves::prelude::*;

// =============================================================================
// TEST DATA GENERATORS
// =============================================================================

fn d(y: i32, m: u32, day: u32) -> Date {
    Date::from_ymd(y, m, day).unwrap()
}

/// Annual pillars out to `years`, LIBOR in stage 0 and OIS in stage 1.
fn market(years: u32) -> (CurveSet, InstrumentSet) {
    let build = d(2025, 1, 15);
    let pillars: Vec<Date> = (1..=years)
        .map(|y| build.add_months(12 * y as i32).unwrap())
        .collect();

    let curves = CurveSet::new(build)
        .with_curve(IrCurve::flat("USD.LIBOR", build, pillars.clone(), 0.03).unwrap())
        .unwrap()
        .with_curve(
            IrCurve::flat("USD.OIS", build, pillars.clone(), 0.03)
                .unwrap()
                .with_solve_stage(1),
        )
        .unwrap();

    let mut instruments = InstrumentSet::new();
    for (i, &maturity) in pillars.iter().enumerate() {
        let rate = 0.045 + 0.001 * i as f64;
        instruments.add(IrSwap::new("USD.LIBOR", "USD.LIBOR", build, maturity, rate));
    }
    for &maturity in &pillars {
        instruments.add(BasisSwap::new("USD.OIS", "USD.LIBOR", "USD.OIS", build, maturity, 0.0025));
    }
    (curves, instruments)
}

// =============================================================================
// BENCHMARKS
// =============================================================================

fn bench_staged_solve(c: &mut Criterion) {
    let mut group = c.benchmark_group("staged_solve");

    for years in [5u32, 10, 20] {
        let (curves, instruments) = market(years);

        group.bench_with_input(BenchmarkId::new("numerical", years), &years, |b, _| {
            b.iter(|| {
                let mut set = curves.clone();
                let report = MultiCurveSolver::numerical()
                    .solve(&mut set, black_box(&instruments))
                    .unwrap();
                black_box(report)
            });
        });

        group.bench_with_input(BenchmarkId::new("analytic", years), &years, |b, _| {
            b.iter(|| {
                let mut set = curves.clone();
                let report = MultiCurveSolver::analytic()
                    .solve(&mut set, black_box(&instruments))
                    .unwrap();
                black_box(report)
            });
        });
    }

    group.finish();
}

criterion_group!(calibration, bench_staged_solve);
criterion_main!(calibration);
