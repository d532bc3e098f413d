use super::*;

fn unit() -> Interval {
    Interval::new(0.0, 1.0).unwrap()
}

fn sampled_max_derivative(tp: &dyn TimeParameterization, t0: f64, t1: f64) -> f64 {
    (0..=200)
        .map(|i| tp.derivative(t0 + (t1 - t0) * f64::from(i) / 200.0).abs())
        .fold(0.0, f64::max)
}

#[test]
fn linear_between_maps_endpoints() {
    let tp = Linear::between(unit(), Interval::new(2.0, 6.0).unwrap()).unwrap();
    assert_eq!(tp.value(0.0), 2.0);
    assert_eq!(tp.value(1.0), 6.0);
    assert_eq!(tp.derivative(0.3), 4.0);
    assert!(Linear::new(-1.0, 0.0).is_err());
}

#[test]
fn polynomial_value_and_derivative() {
    // 1 + 2t + 3t²
    let tp = Polynomial::new(vec![1.0, 2.0, 3.0]).unwrap();
    assert_eq!(tp.value(2.0), 17.0);
    assert_eq!(tp.derivative(2.0), 14.0);
    assert!(tp.derivative_bound(-1.0, 2.0) >= sampled_max_derivative(&tp, -1.0, 2.0));
    assert!(Polynomial::new(vec![]).is_err());
}

#[test]
fn cubic_rest_to_rest_hits_endpoints_with_zero_velocity() {
    let time = Interval::new(1.0, 3.0).unwrap();
    let param = Interval::new(0.0, 10.0).unwrap();
    let tp = Polynomial::cubic_rest_to_rest(time, param).unwrap();
    assert!((tp.value(1.0) - 0.0).abs() < 1e-9);
    assert!((tp.value(3.0) - 10.0).abs() < 1e-9);
    assert!(tp.derivative(1.0).abs() < 1e-9);
    assert!(tp.derivative(3.0).abs() < 1e-9);
    assert!(tp.is_monotonic_on(time));
    assert!(tp.derivative_bound(1.0, 3.0) >= sampled_max_derivative(&tp, 1.0, 3.0));
}

#[test]
fn eased_bound_is_sound() {
    let tp = Eased::new(
        Ease::InOutCubic,
        Interval::new(0.0, 2.0).unwrap(),
        Interval::new(0.0, 1.0).unwrap(),
    )
    .unwrap();
    assert_eq!(tp.value(0.0), 0.0);
    assert!((tp.value(2.0) - 1.0).abs() < 1e-12);
    for (a, b) in [(0.0, 2.0), (0.2, 0.4), (1.5, 1.9)] {
        assert!(tp.derivative_bound(a, b) + 1e-12 >= sampled_max_derivative(&tp, a, b));
    }
}

#[test]
fn reversed_timing_is_increasing_and_mirrors_inner() {
    let time = unit();
    let inner: TimeParameterizationPtr =
        Arc::new(Eased::new(Ease::InQuad, time, Interval::new(0.0, 4.0).unwrap()).unwrap());
    let rev = ReversedTiming::new(inner.clone(), time).unwrap();

    assert_eq!(rev.value(0.0), 0.0);
    assert_eq!(rev.value(1.0), 4.0);
    assert!(rev.is_monotonic_on(time));
    for i in 0..=10 {
        let t = f64::from(i) / 10.0;
        assert!((rev.value(t) - (4.0 - inner.value(1.0 - t))).abs() < 1e-12);
        assert_eq!(rev.derivative(t), inner.derivative(1.0 - t));
    }
    // InQuad is steepest at the end, so the reversal is steepest at the start.
    assert!(rev.derivative_bound(0.0, 0.1) > rev.derivative_bound(0.9, 1.0));
}

#[test]
fn default_monotonic_check_rejects_decreasing_maps() {
    // 1 - t² decreases on [0, 1].
    let tp = Polynomial::new(vec![1.0, 0.0, -1.0]).unwrap();
    assert!(!tp.is_monotonic_on(unit()));
    assert!(ensure_monotonic(&tp, unit()).is_err());
    let ok = Polynomial::new(vec![0.0, 1.0, 1.0]).unwrap();
    assert!(ensure_monotonic(&ok, unit()).is_ok());
}

/// `s'(t) = (t - c)² - eps`, touching or dipping under zero only around `c`.
fn narrow_dip(c: f64, eps: f64) -> Polynomial {
    Polynomial::new(vec![0.0, c * c - eps, -c, 1.0 / 3.0]).unwrap()
}

#[test]
fn polynomial_monotonicity_is_exact_between_samples() {
    // The dip is 2e-3 wide and centered between two of the 64 grid points on [0, 1].
    let c = 0.5 + 1.0 / 128.0;
    let dipping = narrow_dip(c, 1e-6);
    assert!(dipping.derivative(c) < 0.0);
    assert!(dipping.derivative(0.5) > 0.0 && dipping.derivative(0.515625) > 0.0);
    assert!(!dipping.is_monotonic_on(unit()));
    assert!(ensure_monotonic(&dipping, unit()).is_err());
    // Outside the dip the map is increasing.
    assert!(dipping.is_monotonic_on(Interval::new(0.0, 0.5).unwrap()));

    assert!(narrow_dip(c, -1e-6).is_monotonic_on(unit()));
    assert!(narrow_dip(c, 0.0).is_monotonic_on(unit()));
}
