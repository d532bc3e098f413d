use super::*;

const ALL: [Ease; 7] = [
    Ease::Linear,
    Ease::InQuad,
    Ease::OutQuad,
    Ease::InOutQuad,
    Ease::InCubic,
    Ease::OutCubic,
    Ease::InOutCubic,
];

#[test]
fn endpoints_are_fixed() {
    for ease in ALL {
        assert_eq!(ease.apply(0.0), 0.0, "{ease:?}");
        assert!((ease.apply(1.0) - 1.0).abs() < 1e-12, "{ease:?}");
    }
}

#[test]
fn derivative_matches_finite_difference() {
    let h = 1e-6;
    for ease in ALL {
        for i in 1..20 {
            let t = f64::from(i) / 20.0;
            let fd = (ease.apply(t + h) - ease.apply(t - h)) / (2.0 * h);
            assert!(
                (fd - ease.derivative(t)).abs() < 1e-4,
                "{ease:?} at {t}: fd={fd} analytic={}",
                ease.derivative(t)
            );
        }
    }
}

#[test]
fn derivative_bound_dominates_samples() {
    for ease in ALL {
        for (a, b) in [(0.0, 1.0), (0.1, 0.3), (0.4, 0.6), (0.7, 0.95)] {
            let bound = ease.derivative_bound(a, b);
            for i in 0..=50 {
                let t = a + (b - a) * f64::from(i) / 50.0;
                assert!(ease.derivative(t) <= bound + 1e-12, "{ease:?} [{a},{b}] at {t}");
            }
        }
    }
}

#[test]
fn derivative_bound_is_zero_outside_unit_range() {
    assert_eq!(Ease::Linear.derivative_bound(1.5, 2.0), 0.0);
    assert_eq!(Ease::InCubic.derivative_bound(-2.0, -1.0), 0.0);
}
