//! kinopath is a motion-planning kernel: continuous paths through a robot configuration space,
//! their timing, their projection onto constraint manifolds, and their certified validation
//! against obstacles.
//!
//! # Overview
//!
//! 1. **Paths**: [`Path`] maps a time interval onto configurations. Shapes ([`StraightPath`],
//!    [`PathVector`], or your own) implement a few geometric hooks; evaluation, derivatives,
//!    velocity bounds, extraction and reversal are provided on top of them.
//! 2. **Timing**: a [`TimeParameterization`] reshapes how fast a path is traversed without
//!    changing its geometry.
//! 3. **Constraints**: a [`ConstraintProjector`] pulls raw configurations back onto the set
//!    where numerical constraints hold.
//! 4. **Validation**: [`ContinuousValidation`] certifies the longest collision-free prefix (or
//!    suffix) of a path using clearance and velocity bounds.
//!
//! The key design constraints:
//!
//! - **No unsafe**: `unsafe` is forbidden in this crate.
//! - **Immutable paths**: a registered path never changes; every transformation returns a new
//!   shared handle.
//! - **Reentrant kernels**: projectors, time parameterizations and validators keep per-call
//!   state on the stack and can be shared across threads.
#![forbid(unsafe_code)]

mod collision;
mod constraints;
mod foundation;
mod path;
mod problem;
mod time;
mod validation;

pub use collision::planar::{Obstacle, ObstacleShape, PlanarWorld};
pub use collision::{CollisionChecker, CollisionCheckerPtr, CollisionQuery};
pub use constraints::frame::{RightTimesFrame, wrap_angle};
pub use constraints::function::{
    AffineFunction, DifferentiableFunction, DifferentiableFunctionPtr,
};
pub use constraints::projector::{
    Comparison, ConfigProjector, ConstraintProjector, ConstraintProjectorPtr, LockedJoint,
    NumericalConstraint, ProjectorSettings,
};
pub use foundation::core::{
    Configuration, Interval, Vector, distance, lerp_into, norm, norm_inf, zeros,
};
pub use foundation::error::{KinoError, KinoResult};
pub use foundation::math::Matrix;
pub use path::straight::StraightPath;
pub use path::vector::{CONTINUITY_TOLERANCE, PathVector};
pub use path::{DOMAIN_EPS, Path, PathCore, PathPtr, register};
pub use problem::solver::{PathValidationKind, Problem, ProblemSettings};
pub use time::ease::Ease;
pub use time::parameterization::{
    Eased, Linear, Polynomial, ReversedTiming, TimeParameterization, TimeParameterizationPtr,
    ensure_monotonic, param_range,
};
pub use validation::batch::{BatchThreading, validate_all};
pub use validation::continuous::ContinuousValidation;
pub use validation::discretized::DiscretizedValidation;
pub use validation::{
    CancelToken, PathValidation, PathValidationPtr, ValidationReport, ValidationSettings,
};
