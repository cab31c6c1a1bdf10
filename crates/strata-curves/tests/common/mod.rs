//! Shared market fixtures for integration tests.

#![allow(dead_code)]

use strata_curves::prelude::*;

/// Routes solver logs to the test harness; set `RUST_LOG=debug` to see Newton iterations.
pub fn init_logging() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

pub fn d(y: i32, m: u32, day: u32) -> Date {
    Date::from_ymd(y, m, day).unwrap()
}

pub fn build_date() -> Date {
    d(2025, 1, 15)
}

pub fn ir_pillars() -> Vec<Date> {
    vec![d(2025, 4, 15), d(2025, 7, 15), d(2026, 1, 15), d(2027, 1, 15), d(2028, 1, 18)]
}

/// LIBOR in stage 0, OIS in stage 1, both flat at 3% as a starting guess.
pub fn two_stage_curves() -> CurveSet {
    let build = build_date();
    CurveSet::new(build)
        .with_curve(IrCurve::flat("USD.LIBOR", build, ir_pillars(), 0.03).unwrap())
        .unwrap()
        .with_curve(
            IrCurve::flat("USD.OIS", build, ir_pillars(), 0.03)
                .unwrap()
                .with_solve_stage(1),
        )
        .unwrap()
}

/// Self-discounted LIBOR deposits, FRAs and swaps, then OIS basis swaps
/// quoted as OIS + 25bp against LIBOR.
pub fn two_stage_instruments() -> InstrumentSet {
    let build = build_date();
    let p = ir_pillars();
    InstrumentSet::new()
        .with(Deposit::new("USD.LIBOR", build, p[0], 0.052))
        .with(Fra::new("USD.LIBOR", "USD.LIBOR", p[0], p[1], 0.054))
        .with(Fra::new("USD.LIBOR", "USD.LIBOR", p[1], p[2], 0.055))
        .with(IrSwap::new("USD.LIBOR", "USD.LIBOR", build, p[3], 0.056))
        .with(IrSwap::new("USD.LIBOR", "USD.LIBOR", build, p[4], 0.057))
        .with(BasisSwap::new("USD.OIS", "USD.LIBOR", "USD.OIS", build, p[0], 0.0025))
        .with(BasisSwap::new("USD.OIS", "USD.LIBOR", "USD.OIS", build, p[1], 0.0025))
        .with(BasisSwap::new("USD.OIS", "USD.LIBOR", "USD.OIS", build, p[2], 0.0025))
        .with(BasisSwap::new("USD.OIS", "USD.LIBOR", "USD.OIS", build, p[3], 0.0025))
        .with(BasisSwap::new("USD.OIS", "USD.LIBOR", "USD.OIS", build, p[4], 0.0025))
}

pub fn rates(curves: &CurveSet, name: &str) -> Vec<f64> {
    curves.curve(name).unwrap().rates().to_vec()
}
