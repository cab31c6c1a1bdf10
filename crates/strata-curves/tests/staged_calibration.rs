//! Integration tests: staged multi-curve calibration.

mod common;

use approx::assert_abs_diff_eq;
use strata_curves::prelude::*;
use strata_curves::repricing::reprice;

use common::*;

#[test]
fn test_single_deposit_reprices() {
    let build = build_date();
    let maturity = build.add_months(3).unwrap();
    let mut curves = CurveSet::new(build)
        .with_curve(IrCurve::new("USD.LIBOR", build, vec![maturity], vec![0.01]).unwrap())
        .unwrap();
    let deposit = Deposit::new("USD.LIBOR", build, maturity, 0.06);
    let instruments = InstrumentSet::new().with(deposit.clone());

    let mut solver = MultiCurveSolver::numerical();
    let report = solver.solve(&mut curves, &instruments).unwrap();

    assert!(report.is_converged());
    assert!(solver.used_iterations() > 0);
    assert!(deposit.pv(&curves).unwrap().abs() < 1e-6);

    // DF at maturity is the simple-rate discount
    let tau = DayCountConvention::Act360.year_fraction(build, maturity);
    let df = curves.discount_factor("USD.LIBOR", maturity).unwrap();
    assert_abs_diff_eq!(df, 1.0 / (1.0 + 0.06 * tau), epsilon = 1e-8);
}

#[test]
fn test_two_stage_solve_reprices_everything() {
    init_logging();
    let mut curves = two_stage_curves();
    let instruments = two_stage_instruments();

    let report = MultiCurveSolver::numerical().solve(&mut curves, &instruments).unwrap();

    assert!(report.is_converged(), "{report}");
    assert_eq!(report.stages.len(), 2);
    assert_eq!(report.stages[0].curves, vec!["USD.LIBOR".to_string()]);
    assert_eq!(report.stages[1].curves, vec!["USD.OIS".to_string()]);
    assert!(report.max_abs_pv() < 1e-8);

    for instrument in instruments.iter() {
        assert!(
            instrument.pv(&curves).unwrap().abs() < 1e-8,
            "{} did not reprice",
            instrument.description()
        );
    }
    assert!(reprice(&curves, &instruments, Some(1e-8)).unwrap().is_valid());

    // OIS sits below LIBOR by roughly the basis
    let libor = rates(&curves, "USD.LIBOR");
    let ois = rates(&curves, "USD.OIS");
    for (l, o) in libor.iter().zip(&ois) {
        assert!(o < l);
    }
}

#[test]
fn test_solving_stage_zero_alone_matches_full_solve() {
    let instruments = two_stage_instruments();

    let mut full = two_stage_curves();
    MultiCurveSolver::numerical().solve(&mut full, &instruments).unwrap();

    let mut partial = two_stage_curves();
    let report = MultiCurveSolver::numerical()
        .solve_up_to(&mut partial, &instruments, 0)
        .unwrap();

    assert_eq!(report.stages.len(), 1);
    assert_eq!(rates(&partial, "USD.LIBOR"), rates(&full, "USD.LIBOR"));
    // Stage 1 untouched
    assert_eq!(rates(&partial, "USD.OIS"), vec![0.03; 5]);
}

#[test]
fn test_numerical_and_analytic_agree() {
    let instruments = two_stage_instruments();

    let mut numerical = two_stage_curves();
    let num_report = MultiCurveSolver::numerical().solve(&mut numerical, &instruments).unwrap();

    let mut analytic = two_stage_curves();
    let ana_report = MultiCurveSolver::analytic().solve(&mut analytic, &instruments).unwrap();

    assert!(num_report.is_converged());
    assert!(ana_report.is_converged());
    for name in ["USD.LIBOR", "USD.OIS"] {
        for (n, a) in rates(&numerical, name).iter().zip(rates(&analytic, name)) {
            assert_abs_diff_eq!(*n, a, epsilon = 1e-6);
        }
    }
}

#[test]
fn test_resolve_is_idempotent() {
    let instruments = two_stage_instruments();
    let mut curves = two_stage_curves();

    let mut solver = MultiCurveSolver::analytic();
    solver.solve(&mut curves, &instruments).unwrap();
    let libor = rates(&curves, "USD.LIBOR");
    let ois = rates(&curves, "USD.OIS");

    let report = solver.solve(&mut curves, &instruments).unwrap();
    assert!(report.is_converged());
    assert_eq!(solver.used_iterations(), 0);
    assert_eq!(rates(&curves, "USD.LIBOR"), libor);
    assert_eq!(rates(&curves, "USD.OIS"), ois);
}

#[test]
fn test_non_square_stage_fails_before_iterating() {
    let build = build_date();
    let p = ir_pillars();
    let mut curves = two_stage_curves();
    let instruments = InstrumentSet::new()
        .with(Deposit::new("USD.LIBOR", build, p[0], 0.052))
        .with(Fra::new("USD.LIBOR", "USD.LIBOR", p[0], p[1], 0.054))
        .with(Fra::new("USD.LIBOR", "USD.LIBOR", p[1], p[2], 0.055))
        .with(IrSwap::new("USD.LIBOR", "USD.LIBOR", build, p[3], 0.056));

    let err = MultiCurveSolver::numerical()
        .solve(&mut curves, &instruments)
        .unwrap_err();

    assert!(matches!(
        err,
        CurveError::StageMismatch { stage: 0, pillars: 5, instruments: 4 }
    ));
    assert!(err.is_configuration_error());
    assert_eq!(rates(&curves, "USD.LIBOR"), vec![0.03; 5]);
}

#[test]
fn test_stage_without_instruments_is_rejected() {
    let build = build_date();
    let p = ir_pillars();
    let mut curves = two_stage_curves();
    // LIBOR instruments only: OIS (stage 1) keeps five unknowns and no equations
    let libor_only = InstrumentSet::new()
        .with(Deposit::new("USD.LIBOR", build, p[0], 0.052))
        .with(Fra::new("USD.LIBOR", "USD.LIBOR", p[0], p[1], 0.054))
        .with(Fra::new("USD.LIBOR", "USD.LIBOR", p[1], p[2], 0.055))
        .with(IrSwap::new("USD.LIBOR", "USD.LIBOR", build, p[3], 0.056))
        .with(IrSwap::new("USD.LIBOR", "USD.LIBOR", build, p[4], 0.057));

    let err = MultiCurveSolver::numerical()
        .solve(&mut curves, &libor_only)
        .unwrap_err();
    assert_eq!(err, CurveError::stage_mismatch(1, 5, 0));
    assert_eq!(rates(&curves, "USD.LIBOR"), vec![0.03; 5]);

    // Marking OIS as a market input makes the LIBOR-only problem square
    curves.fix("USD.OIS").unwrap();
    let report = MultiCurveSolver::numerical().solve(&mut curves, &libor_only).unwrap();
    assert!(report.is_converged());
    assert_eq!(report.stages.len(), 1);
    assert_eq!(rates(&curves, "USD.OIS"), vec![0.03; 5]);
}

#[test]
fn test_untargeted_curve_counts_towards_its_stage() {
    let build = build_date();
    let mut curves = two_stage_curves()
        .with_curve(IrCurve::flat("USD.SOFR", build, ir_pillars(), 0.03).unwrap())
        .unwrap();

    let err = MultiCurveSolver::numerical()
        .solve(&mut curves, &two_stage_instruments())
        .unwrap_err();
    assert_eq!(err, CurveError::stage_mismatch(0, 10, 5));
    assert!(err.is_configuration_error());

    curves.fix("USD.SOFR").unwrap();
    let report = MultiCurveSolver::numerical()
        .solve(&mut curves, &two_stage_instruments())
        .unwrap();
    assert!(report.is_converged());
    assert_eq!(report.stages[0].curves, vec!["USD.LIBOR".to_string()]);
}

#[test]
fn test_reading_a_later_stage_is_rejected() {
    let build = build_date();
    let p = ir_pillars();
    let mut curves = two_stage_curves();
    // LIBOR FRA discounted on OIS, which is only solved in stage 1
    let instruments = InstrumentSet::new()
        .with(Deposit::new("USD.LIBOR", build, p[0], 0.052))
        .with(Fra::new("USD.LIBOR", "USD.OIS", p[0], p[1], 0.054))
        .with(Fra::new("USD.LIBOR", "USD.LIBOR", p[1], p[2], 0.055))
        .with(IrSwap::new("USD.LIBOR", "USD.LIBOR", build, p[3], 0.056))
        .with(IrSwap::new("USD.LIBOR", "USD.LIBOR", build, p[4], 0.057))
        .with(BasisSwap::new("USD.OIS", "USD.LIBOR", "USD.OIS", build, p[0], 0.0025))
        .with(BasisSwap::new("USD.OIS", "USD.LIBOR", "USD.OIS", build, p[1], 0.0025))
        .with(BasisSwap::new("USD.OIS", "USD.LIBOR", "USD.OIS", build, p[2], 0.0025))
        .with(BasisSwap::new("USD.OIS", "USD.LIBOR", "USD.OIS", build, p[3], 0.0025))
        .with(BasisSwap::new("USD.OIS", "USD.LIBOR", "USD.OIS", build, p[4], 0.0025));

    let err = MultiCurveSolver::numerical()
        .solve(&mut curves, &instruments)
        .unwrap_err();
    assert!(matches!(err, CurveError::StageOrderViolation { .. }), "{err}");
}

#[test]
fn test_unknown_curve_is_rejected() {
    let mut curves = two_stage_curves();
    let instruments = InstrumentSet::new().with(Deposit::new("EUR.ESTR", build_date(), d(2025, 4, 15), 0.03));

    let err = MultiCurveSolver::numerical()
        .solve(&mut curves, &instruments)
        .unwrap_err();
    assert!(matches!(err, CurveError::CurveNotFound { .. }));
}

#[test]
fn test_analytic_requires_sensitivities() {
    let build = build_date();
    let p = ir_pillars();
    let mut curves = two_stage_curves()
        .with_curve(HazardCurve::new("ACME", build, vec![p[3]], vec![0.02]).unwrap())
        .unwrap();
    let instruments = InstrumentSet::new().with(Cds::new("ACME", "USD.LIBOR", build, p[3], 0.01));

    let err = MultiCurveSolver::analytic()
        .solve(&mut curves, &instruments)
        .unwrap_err();
    assert!(matches!(err, CurveError::SensitivitiesUnavailable { .. }));
    assert_eq!(rates(&curves, "ACME"), vec![0.02]);
}

#[test]
fn test_exhausted_budget_is_reported_not_raised() {
    init_logging();
    let mut curves = two_stage_curves();
    let instruments = two_stage_instruments();
    let config = CalibrationConfig::numerical().with_max_iterations(1);

    let mut solver = MultiCurveSolver::new(config);
    let report = solver.solve(&mut curves, &instruments).unwrap();

    assert_eq!(report.status, SolveStatus::IterationsExhausted);
    assert_eq!(solver.used_iterations(), 1);
    assert!(matches!(
        report.into_result(),
        Err(CurveError::NotConverged { .. })
    ));
}

#[test]
fn test_config_from_toml_drives_the_solver() {
    let config = CalibrationConfig::from_toml_str(
        r#"
        tolerance = 1e-10
        max_iterations = 50
        jacobian = "analytic"
        "#,
    )
    .unwrap();
    let mut solver = MultiCurveSolver::new(config);
    assert_eq!(solver.jacobian(), JacobianMethod::Analytic);

    let mut curves = two_stage_curves();
    let report = solver.solve(&mut curves, &two_stage_instruments()).unwrap();
    assert!(report.is_converged());
    assert!(report.max_abs_pv() < 1e-10);
}

#[test]
fn test_frozen_snapshot_survives_recalibration() {
    let instruments = two_stage_instruments();
    let mut curves = two_stage_curves();
    MultiCurveSolver::analytic().solve(&mut curves, &instruments).unwrap();

    let frozen = curves.freeze();
    let maturity = ir_pillars()[4];
    let df_before = frozen.discount_factor("USD.OIS", maturity).unwrap();

    // Recalibrate the live set against a wider basis
    let p = ir_pillars();
    let build = build_date();
    let mut wider = InstrumentSet::new();
    wider.add(Deposit::new("USD.LIBOR", build, p[0], 0.052));
    wider.add(Fra::new("USD.LIBOR", "USD.LIBOR", p[0], p[1], 0.054));
    wider.add(Fra::new("USD.LIBOR", "USD.LIBOR", p[1], p[2], 0.055));
    wider.add(IrSwap::new("USD.LIBOR", "USD.LIBOR", build, p[3], 0.056));
    wider.add(IrSwap::new("USD.LIBOR", "USD.LIBOR", build, p[4], 0.057));
    for &maturity in &p {
        wider.add(BasisSwap::new("USD.OIS", "USD.LIBOR", "USD.OIS", build, maturity, 0.0050));
    }
    MultiCurveSolver::analytic().solve(&mut curves, &wider).unwrap();

    // Lower OIS rates, higher discount factors
    assert!(curves.discount_factor("USD.OIS", maturity).unwrap() > df_before);
    assert_eq!(frozen.discount_factor("USD.OIS", maturity).unwrap(), df_before);

    // Thawing gives an independent mutable copy
    let thawed = frozen.thaw();
    assert_eq!(thawed.discount_factor("USD.OIS", maturity).unwrap(), df_before);
}

mod properties {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(32))]

        #[test]
        fn deposit_strip_reprices(
            r0 in 0.001f64..0.12,
            r1 in 0.001f64..0.12,
            r2 in 0.001f64..0.12,
        ) {
            let build = build_date();
            let p = ir_pillars();
            let mut curves = CurveSet::new(build)
                .with_curve(IrCurve::flat("USD", build, p[..3].to_vec(), 0.03).unwrap())
                .unwrap();
            let instruments = InstrumentSet::new()
                .with(Deposit::new("USD", build, p[0], r0))
                .with(Deposit::new("USD", build, p[1], r1))
                .with(Deposit::new("USD", build, p[2], r2));

            let report = MultiCurveSolver::analytic().solve(&mut curves, &instruments).unwrap();
            prop_assert!(report.is_converged());
            for instrument in instruments.iter() {
                prop_assert!(instrument.pv(&curves).unwrap().abs() < 1e-8);
            }
        }
    }
}
