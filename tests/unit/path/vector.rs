use super::*;
use crate::path::straight::StraightPath;
use crate::time::ease::Ease;
use crate::time::parameterization::Eased;

fn iv(a: f64, b: f64) -> Interval {
    Interval::new(a, b).unwrap()
}

fn seg(a: &[f64], b: &[f64], len: f64) -> PathPtr {
    StraightPath::create(a, b, iv(0.0, len)).unwrap()
}

/// (0,0) -> (1,0) in 1s, then (1,0) -> (1,2) in 2s.
fn elbow() -> Arc<PathVector> {
    PathVector::create(vec![
        seg(&[0.0, 0.0], &[1.0, 0.0], 1.0),
        seg(&[1.0, 0.0], &[1.0, 2.0], 2.0),
    ])
    .unwrap()
}

fn assert_close(a: &[f64], b: &[f64]) {
    for (x, y) in a.iter().zip(b) {
        assert!((x - y).abs() < 1e-9, "{a:?} != {b:?}");
    }
}

#[test]
fn concatenation_spans_total_length() {
    let v = elbow();
    assert_eq!(v.time_range(), iv(0.0, 3.0));
    assert_eq!(v.num_paths(), 2);
    assert_close(&v.evaluate(0.5).0, &[0.5, 0.0]);
    assert_close(&v.evaluate(2.0).0, &[1.0, 1.0]);
    assert_close(&v.end(), &[1.0, 2.0]);
    assert_eq!(v.rank_at_param(0.5).0, 0);
    assert_eq!(v.rank_at_param(2.5), (1, 1.5));
    assert!(v.path_at_rank(2).is_none());
}

#[test]
fn discontinuous_sub_paths_are_rejected() {
    let err = PathVector::create(vec![
        seg(&[0.0], &[1.0], 1.0),
        seg(&[1.5], &[2.0], 1.0),
    ])
    .unwrap_err();
    assert!(matches!(err, KinoError::Validation(_)));
    assert!(PathVector::create(vec![]).is_err());
}

#[test]
fn derivative_and_bound_delegate_to_sub_paths() {
    let v = elbow();
    assert_close(&v.derivative(0.5, 1).unwrap(), &[1.0, 0.0]);
    assert_close(&v.derivative(2.0, 1).unwrap(), &[0.0, 1.0]);
    assert_close(&v.velocity_bound(0.0, 3.0).unwrap(), &[1.0, 1.0]);
    assert_close(&v.velocity_bound(1.5, 3.0).unwrap(), &[0.0, 1.0]);
}

#[test]
fn extraction_across_segments() {
    let v = elbow();
    let sub = v.extract(0.5, 2.0).unwrap();
    assert_eq!(sub.time_range(), iv(0.5, 2.0));
    assert_close(&sub.initial(), &[0.5, 0.0]);
    assert_close(&sub.end(), &[1.0, 1.0]);
    for i in 0..=10 {
        let t = 0.5 + 1.5 * f64::from(i) / 10.0;
        assert_close(&sub.evaluate(t).0, &v.evaluate(t).0);
    }
    let inner = sub.downcast::<PathVector>().unwrap();
    assert_eq!(inner.num_paths(), 2);
}

#[test]
fn reversal_runs_segments_backward() {
    let v = elbow();
    let r = v.reverse().unwrap();
    assert_eq!(r.time_range(), v.time_range());
    for i in 0..=12 {
        let t = 3.0 * f64::from(i) / 12.0;
        assert_close(&r.evaluate(t).0, &v.evaluate(3.0 - t).0);
    }
}

#[test]
fn timed_vector_scales_derivatives() {
    let v = elbow();
    let tp = Arc::new(Eased::new(Ease::Linear, iv(0.0, 1.5), iv(0.0, 3.0)).unwrap());
    let timed = v.with_time_parameterization(tp, iv(0.0, 1.5)).unwrap();
    assert_close(&timed.evaluate(1.0).0, &[1.0, 1.0]);
    assert_close(&timed.derivative(1.0, 1).unwrap(), &[0.0, 2.0]);
    assert_close(&timed.velocity_bound(0.0, 1.5).unwrap(), &[2.0, 2.0]);
}

#[test]
fn append_and_concatenate_build_longer_vectors() {
    let v = elbow();
    let longer = v.append_path(seg(&[1.0, 2.0], &[0.0, 2.0], 1.0)).unwrap();
    assert_eq!(longer.num_paths(), 3);
    assert_eq!(longer.length(), 4.0);

    let back = PathVector::create(vec![seg(&[1.0, 2.0], &[1.0, 3.0], 0.5)]).unwrap();
    let joined = v.concatenate(&back).unwrap();
    assert_eq!(joined.num_paths(), 3);
    assert_close(&joined.end(), &[1.0, 3.0]);
}

/// Keeps `q[1] == 0`.
fn on_x_axis() -> ConstraintProjectorPtr {
    use crate::constraints::function::AffineFunction;
    use crate::constraints::projector::{ConfigProjector, NumericalConstraint, ProjectorSettings};
    use crate::foundation::math::Matrix;

    let f = AffineFunction::new("y", Matrix::from_rows(&[&[0.0, 1.0]]), vec![0.0]).unwrap();
    let mut p = ConfigProjector::new("x-axis", 2, &ProjectorSettings::default()).unwrap();
    p.add(NumericalConstraint::equality(Arc::new(f))).unwrap();
    Arc::new(p)
}

/// (0,0) -> (1,0) -> (2,0) over `[0, 2]`, constrained to the x axis.
fn constrained_rail() -> PathPtr {
    PathVector::create(vec![
        seg(&[0.0, 0.0], &[1.0, 0.0], 1.0),
        seg(&[1.0, 0.0], &[2.0, 0.0], 1.0),
    ])
    .unwrap()
    .copy_with_constraints(on_x_axis())
    .unwrap()
}

#[test]
fn extraction_and_reversal_keep_constraints() {
    let rail = constrained_rail();
    let c = rail.constraints().unwrap();

    let part = rail.extract(0.5, 1.5).unwrap();
    assert!(Arc::ptr_eq(part.constraints().unwrap(), c));
    assert_eq!(part.time_range(), iv(0.5, 1.5));
    assert_close(&part.initial(), &[0.5, 0.0]);
    assert_close(&part.end(), &[1.5, 0.0]);

    let back = rail.reverse().unwrap();
    assert!(Arc::ptr_eq(back.constraints().unwrap(), c));
    assert_close(&back.initial(), &[2.0, 0.0]);

    let reversed_part = rail.extract(1.5, 0.5).unwrap();
    assert!(Arc::ptr_eq(reversed_part.constraints().unwrap(), c));
    assert_close(&reversed_part.initial(), &[1.5, 0.0]);
}

/// Rejects configurations with `q[0]` strictly inside `(0.2, 0.8)`.
#[derive(Debug)]
struct Gap;

impl crate::constraints::projector::ConstraintProjector for Gap {
    fn name(&self) -> &str {
        "gap"
    }

    fn apply(&self, q: &mut [f64]) -> bool {
        self.is_satisfied(q)
    }

    fn is_satisfied(&self, q: &[f64]) -> bool {
        !(0.2 < q[0] && q[0] < 0.8)
    }

    fn max_iterations(&self) -> usize {
        1
    }

    fn set_max_iterations(&self, _iterations: usize) {}

    fn error_threshold(&self) -> f64 {
        0.0
    }

    fn set_error_threshold(&self, _threshold: f64) {}
}

#[test]
fn extraction_with_unprojectable_ends_fails() {
    let v = elbow().copy_with_constraints(Arc::new(Gap)).unwrap();
    let err = v.extract(0.1, 0.5).unwrap_err();
    assert!(err.is_projection());
    assert!(v.extract(0.1, 2.0).is_ok());
}
