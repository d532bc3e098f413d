use kurbo::Rect;

use super::*;
use crate::constraints::function::AffineFunction;
use crate::foundation::math::Matrix;

fn problem() -> Problem {
    Problem::new(
        2,
        PlanarWorld::new(0.0).unwrap(),
        ProblemSettings::default(),
    )
    .unwrap()
}

/// `x + y`.
fn sum() -> DifferentiableFunctionPtr {
    Arc::new(AffineFunction::new("sum", Matrix::from_rows(&[&[1.0, 1.0]]), vec![0.0]).unwrap())
}

#[test]
fn validation_kind_parses_known_names_only() {
    assert_eq!(
        "continuous".parse::<PathValidationKind>().unwrap(),
        PathValidationKind::Continuous
    );
    assert_eq!(
        "Discretized".parse::<PathValidationKind>().unwrap(),
        PathValidationKind::Discretized
    );
    let err = "progressive".parse::<PathValidationKind>().unwrap_err();
    assert!(matches!(err, KinoError::Configuration(_)));
    assert_eq!(PathValidationKind::Discretized.to_string(), "discretized");
}

#[test]
fn unknown_constraint_names_are_configuration_errors() {
    let mut p = problem();
    p.add_numerical_constraint("sum", sum()).unwrap();
    assert!(matches!(
        p.build_projector("proj", &["sum", "missing"]),
        Err(KinoError::Configuration(_))
    ));
    assert!(matches!(
        p.comparison("missing"),
        Err(KinoError::Configuration(_))
    ));
    assert!(matches!(
        p.set_comparison("missing", vec![Comparison::Inferior]),
        Err(KinoError::Configuration(_))
    ));
}

#[test]
fn comparison_defaults_to_equality_and_can_be_changed() {
    let mut p = problem();
    p.add_numerical_constraint("sum", sum()).unwrap();
    p.set_right_hand_side("sum", &[1.0]).unwrap();
    assert_eq!(p.comparison("sum").unwrap(), &[Comparison::Equality]);

    p.set_comparison("sum", vec![Comparison::Inferior]).unwrap();
    assert_eq!(p.comparison("sum").unwrap(), &[Comparison::Inferior]);
    assert_eq!(p.numerical_constraint("sum").unwrap().right_hand_side(), &[1.0]);
}

#[test]
fn projector_uses_constraints_and_locked_joints() {
    let mut p = problem();
    p.add_numerical_constraint("sum", sum()).unwrap();
    p.set_right_hand_side("sum", &[1.0]).unwrap();
    p.add_locked_joint(LockedJoint {
        name: "x".to_string(),
        index: 0,
        value: 0.25,
    })
    .unwrap();
    let proj = p.build_projector("proj", &["sum"]).unwrap();

    let mut q = [3.0, 3.0];
    assert!(proj.apply(&mut q));
    assert_eq!(q[0], 0.25);
    assert!((q[1] - 0.75).abs() < 1e-4);
}

#[test]
fn tunables_propagate_into_the_active_projector() {
    let mut p = problem();
    p.add_numerical_constraint("sum", sum()).unwrap();
    let proj = p.build_projector("proj", &["sum"]).unwrap();
    let path = p.direct_path(&[0.5, -0.5], &[-0.5, 0.5]).unwrap();

    p.set_max_iterations(7).unwrap();
    p.set_error_threshold(1e-9).unwrap();
    assert_eq!(proj.max_iterations(), 7);
    assert_eq!(path.constraints().unwrap().error_threshold(), 1e-9);
    assert_eq!(p.max_iterations(), 7);
    assert!(p.set_error_threshold(0.0).is_err());
}

#[test]
fn settings_apply_to_projectors_built_later() {
    let mut p = problem();
    p.set_max_iterations(3).unwrap();
    p.add_numerical_constraint("sum", sum()).unwrap();
    let proj = p.build_projector("proj", &["sum"]).unwrap();
    assert_eq!(proj.max_iterations(), 3);
}

#[test]
fn direct_path_is_timed_by_length() {
    let p = problem();
    let path = p.direct_path(&[0.0, 0.0], &[3.0, 4.0]).unwrap();
    assert_eq!(path.time_range(), Interval::new(0.0, 5.0).unwrap());
    assert!(path.constraints().is_none());
    assert!(p.direct_path(&[0.0], &[1.0, 1.0]).is_err());
}

#[test]
fn path_validation_follows_the_configured_kind() {
    let mut p = problem();
    p.add_obstacle(
        "wall",
        ObstacleShape::Rect(Rect::new(0.503, -1.0, 0.507, 1.0)),
        true,
        true,
    )
    .unwrap();
    let path = p.direct_path(&[0.0, 0.0], &[1.0, 0.0]).unwrap();

    let continuous = p.path_validation().unwrap();
    assert!(!continuous.validate(&path, false).unwrap().whole_valid);

    p.set_path_validation(PathValidationKind::Discretized, 0.0)
        .unwrap();
    assert_eq!(p.settings().validation.tolerance, 0.0);
    let discretized = p.path_validation().unwrap();
    assert!(discretized.validate(&path, false).unwrap().whole_valid);

    assert!(p.set_path_validation(PathValidationKind::Continuous, -1.0).is_err());
}

#[test]
fn obstacle_registry_filters_by_role() {
    let mut p = problem();
    let shape = ObstacleShape::Rect(Rect::new(0.0, 0.0, 1.0, 1.0));
    p.add_obstacle("a", shape, true, false).unwrap();
    p.add_obstacle("b", shape, false, true).unwrap();
    assert_eq!(p.obstacle_names(true, false), vec!["a"]);
    assert_eq!(p.obstacle_names(false, true), vec!["b"]);
    assert_eq!(p.obstacle_names(true, true), vec!["a", "b"]);
    assert!(p.obstacle("b").is_some());
    assert!(p.obstacle("c").is_none());
}

#[test]
fn rejects_bad_dimensions() {
    assert!(Problem::new(1, PlanarWorld::new(0.0).unwrap(), ProblemSettings::default()).is_err());
    let mut p = problem();
    let wide = Arc::new(
        AffineFunction::new("wide", Matrix::from_rows(&[&[1.0, 1.0, 1.0]]), vec![0.0]).unwrap(),
    );
    assert!(p.add_numerical_constraint("wide", wide).is_err());
    assert!(
        p.add_locked_joint(LockedJoint {
            name: "far".to_string(),
            index: 2,
            value: 0.0,
        })
        .is_err()
    );
}
