use std::sync::Arc;

use kurbo::Rect;

use super::*;
use crate::collision::planar::{ObstacleShape, PlanarWorld};
use crate::foundation::core::Interval;
use crate::path::straight::StraightPath;
use crate::validation::ValidationSettings;
use crate::validation::continuous::ContinuousValidation;

fn horizontal(y: f64) -> PathPtr {
    StraightPath::create(&[0.0, y], &[1.0, y], Interval::new(0.0, 1.0).unwrap()).unwrap()
}

#[test]
fn reports_keep_input_order() {
    let mut world = PlanarWorld::new(0.0).unwrap();
    world
        .add_obstacle(
            "wall",
            ObstacleShape::Rect(Rect::new(0.4, -1.0, 0.6, 1.0)),
            true,
            true,
        )
        .unwrap();
    let validation =
        ContinuousValidation::new(Arc::new(world), ValidationSettings::default()).unwrap();
    let paths: Vec<PathPtr> = (0..8)
        .map(|i| horizontal(if i % 2 == 0 { 0.0 } else { 3.0 }))
        .collect();

    let reports = validate_all(
        &validation,
        &paths,
        false,
        &BatchThreading { threads: Some(2) },
    )
    .unwrap();
    assert_eq!(reports.len(), 8);
    for (i, report) in reports.iter().enumerate() {
        assert_eq!(report.whole_valid, i % 2 == 1, "path {i}");
    }
}

#[test]
fn zero_threads_is_rejected() {
    let validation = ContinuousValidation::new(
        Arc::new(PlanarWorld::new(0.0).unwrap()),
        ValidationSettings::default(),
    )
    .unwrap();
    let err = validate_all(&validation, &[], false, &BatchThreading { threads: Some(0) });
    assert!(matches!(err, Err(KinoError::Validation(_))));
}
