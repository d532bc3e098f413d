use std::sync::Arc;

use kurbo::Rect;

use super::*;
use crate::collision::planar::{ObstacleShape, PlanarWorld};
use crate::foundation::core::Interval;
use crate::path::straight::StraightPath;

fn iv(a: f64, b: f64) -> Interval {
    Interval::new(a, b).unwrap()
}

fn world_with(rect: Rect) -> Arc<PlanarWorld> {
    let mut world = PlanarWorld::new(0.0).unwrap();
    world
        .add_obstacle("wall", ObstacleShape::Rect(rect), true, true)
        .unwrap();
    Arc::new(world)
}

fn crossing() -> PathPtr {
    StraightPath::create(&[0.0, 0.0], &[1.0, 0.0], iv(0.0, 1.0)).unwrap()
}

#[test]
fn reports_first_colliding_sample() {
    let validation = DiscretizedValidation::new(
        world_with(Rect::new(0.4, -1.0, 0.6, 1.0)),
        ValidationSettings::default(),
    )
    .unwrap();

    let forward = validation.validate(&crossing(), false).unwrap();
    assert!(!forward.whole_valid);
    let hit = forward.collision_at.unwrap();
    assert!((0.4..=0.41).contains(&hit));
    assert!(forward.certified.end < 0.4);
    assert_eq!(forward.valid_part.unwrap().time_range(), forward.certified);

    let backward = validation.validate(&crossing(), true).unwrap();
    assert!(backward.certified.start > 0.6);
    assert_eq!(backward.certified.end, 1.0);
}

#[test]
fn samples_every_step_including_the_end() {
    let settings = ValidationSettings {
        step: 0.25,
        ..ValidationSettings::default()
    };
    let validation =
        DiscretizedValidation::new(world_with(Rect::new(5.0, 5.0, 6.0, 6.0)), settings).unwrap();
    let report = validation.validate(&crossing(), false).unwrap();
    assert!(report.whole_valid);
    assert_eq!(report.checks, 5);
}

#[test]
fn thin_obstacles_between_samples_are_missed() {
    let validation = DiscretizedValidation::new(
        world_with(Rect::new(0.503, -1.0, 0.507, 1.0)),
        ValidationSettings::default(),
    )
    .unwrap();
    assert!(validation.validate(&crossing(), false).unwrap().whole_valid);
}

#[test]
fn cancellation_interrupts_sampling() {
    let token = CancelToken::new();
    token.cancel();
    let validation = DiscretizedValidation::new(
        world_with(Rect::new(5.0, 5.0, 6.0, 6.0)),
        ValidationSettings::default(),
    )
    .unwrap()
    .with_cancel_token(token);
    let report = validation.validate(&crossing(), false).unwrap();
    assert!(report.interrupted);
    assert!(report.valid_part.is_none());
}
