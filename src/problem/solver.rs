use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use crate::collision::planar::{Obstacle, ObstacleShape, PlanarWorld};
use crate::constraints::function::DifferentiableFunctionPtr;
use crate::constraints::projector::{
    Comparison, ConfigProjector, ConstraintProjector, ConstraintProjectorPtr, LockedJoint,
    NumericalConstraint, ProjectorSettings,
};
use crate::foundation::core::{Interval, distance};
use crate::foundation::error::{KinoError, KinoResult};
use crate::path::PathPtr;
use crate::path::straight::StraightPath;
use crate::validation::continuous::ContinuousValidation;
use crate::validation::discretized::DiscretizedValidation;
use crate::validation::{PathValidationPtr, ValidationSettings};

/// Registered path validation strategies.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PathValidationKind {
    #[default]
    Continuous,
    Discretized,
}

impl FromStr for PathValidationKind {
    type Err = KinoError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "continuous" => Ok(Self::Continuous),
            "discretized" => Ok(Self::Discretized),
            other => Err(KinoError::configuration(format!(
                "unknown path validation type '{other}' (expected 'continuous' or 'discretized')"
            ))),
        }
    }
}

impl fmt::Display for PathValidationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Continuous => "continuous",
            Self::Discretized => "discretized",
        })
    }
}

#[derive(Clone, Debug, Default, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct ProblemSettings {
    pub path_validation: PathValidationKind,
    pub validation: ValidationSettings,
    pub projector: ProjectorSettings,
}

impl ProblemSettings {
    pub fn validate(&self) -> KinoResult<()> {
        self.validation.validate()?;
        self.projector.validate()
    }
}

/// Configuration surface tying a robot, its environment, its constraints and the validation
/// strategy together.
pub struct Problem {
    dimension: usize,
    world: PlanarWorld,
    settings: ProblemSettings,
    constraints: BTreeMap<String, NumericalConstraint>,
    locked_joints: Vec<LockedJoint>,
    projector: Option<Arc<ConfigProjector>>,
}

impl Problem {
    /// Problem for a robot with `dimension` configuration entries, the first two being its
    /// planar position.
    pub fn new(
        dimension: usize,
        world: PlanarWorld,
        settings: ProblemSettings,
    ) -> KinoResult<Self> {
        if dimension < 2 {
            return Err(KinoError::validation(
                "planar robots need at least 2 configuration entries",
            ));
        }
        world.validate()?;
        settings.validate()?;
        Ok(Self {
            dimension,
            world,
            settings,
            constraints: BTreeMap::new(),
            locked_joints: Vec::new(),
            projector: None,
        })
    }

    pub fn dimension(&self) -> usize {
        self.dimension
    }

    pub fn settings(&self) -> &ProblemSettings {
        &self.settings
    }

    pub fn world(&self) -> &PlanarWorld {
        &self.world
    }

    pub fn add_obstacle(
        &mut self,
        name: impl Into<String>,
        shape: ObstacleShape,
        collision: bool,
        distance: bool,
    ) -> KinoResult<()> {
        self.world.add_obstacle(name, shape, collision, distance)
    }

    pub fn obstacle(&self, name: &str) -> Option<&Obstacle> {
        self.world.obstacles.iter().find(|o| o.name == name)
    }

    /// Names of obstacles taking part in collision checking and/or distance computation.
    pub fn obstacle_names(&self, collision: bool, distance: bool) -> Vec<&str> {
        self.world
            .obstacles
            .iter()
            .filter(|o| (collision && o.collision) || (distance && o.distance))
            .map(|o| o.name.as_str())
            .collect()
    }

    /// Register `function` under `name` as an equality constraint. Replaces any previous entry.
    pub fn add_numerical_constraint(
        &mut self,
        name: impl Into<String>,
        function: DifferentiableFunctionPtr,
    ) -> KinoResult<()> {
        if function.input_size() != self.dimension {
            return Err(KinoError::validation(format!(
                "function '{}' reads configurations of size {}, robot has {}",
                function.name(),
                function.input_size(),
                self.dimension
            )));
        }
        self.constraints
            .insert(name.into(), NumericalConstraint::equality(function));
        Ok(())
    }

    pub fn numerical_constraint(&self, name: &str) -> Option<&NumericalConstraint> {
        self.constraints.get(name)
    }

    fn registered(&self, name: &str) -> KinoResult<&NumericalConstraint> {
        self.constraints.get(name).ok_or_else(|| {
            KinoError::configuration(format!("numerical constraint '{name}' is not defined"))
        })
    }

    /// Set per-row comparisons of a registered constraint, keeping its right-hand side.
    pub fn set_comparison(&mut self, name: &str, comparison: Vec<Comparison>) -> KinoResult<()> {
        let current = self.registered(name)?;
        let updated =
            NumericalConstraint::with_comparisons(current.function().clone(), comparison)?
                .rhs(current.right_hand_side())?;
        self.constraints.insert(name.to_string(), updated);
        Ok(())
    }

    pub fn comparison(&self, name: &str) -> KinoResult<&[Comparison]> {
        Ok(self.registered(name)?.comparison())
    }

    pub fn set_right_hand_side(&mut self, name: &str, rhs: &[f64]) -> KinoResult<()> {
        let updated = self.registered(name)?.clone().rhs(rhs)?;
        self.constraints.insert(name.to_string(), updated);
        Ok(())
    }

    pub fn add_locked_joint(&mut self, joint: LockedJoint) -> KinoResult<()> {
        if joint.index >= self.dimension {
            return Err(KinoError::validation(format!(
                "locked joint '{}' index {} is out of range for dimension {}",
                joint.name, joint.index, self.dimension
            )));
        }
        self.locked_joints.retain(|j| j.index != joint.index);
        self.locked_joints.push(joint);
        Ok(())
    }

    pub fn locked_joints(&self) -> &[LockedJoint] {
        &self.locked_joints
    }

    /// Build the active projector from registered constraints `names` and every locked joint.
    pub fn build_projector(
        &mut self,
        projector_name: &str,
        names: &[&str],
    ) -> KinoResult<ConstraintProjectorPtr> {
        let mut projector =
            ConfigProjector::new(projector_name, self.dimension, &self.settings.projector)?;
        for name in names {
            projector.add(self.registered(name)?.clone())?;
        }
        for joint in &self.locked_joints {
            projector.lock(joint.clone())?;
        }
        tracing::debug!(
            projector = projector_name,
            constraints = names.len(),
            locked = self.locked_joints.len(),
            "built config projector"
        );
        let projector = Arc::new(projector);
        self.projector = Some(projector.clone());
        Ok(projector)
    }

    pub fn projector(&self) -> Option<ConstraintProjectorPtr> {
        self.projector.clone().map(|p| p as ConstraintProjectorPtr)
    }

    /// Drop the active projector and the locked joints.
    pub fn reset_constraints(&mut self) {
        self.projector = None;
        self.locked_joints.clear();
    }

    pub fn max_iterations(&self) -> usize {
        self.settings.projector.max_iterations
    }

    /// Also applied to the active projector, including paths already sharing it.
    pub fn set_max_iterations(&mut self, iterations: usize) -> KinoResult<()> {
        if iterations == 0 {
            return Err(KinoError::validation("max iterations must be >= 1"));
        }
        self.settings.projector.max_iterations = iterations;
        if let Some(p) = &self.projector {
            p.set_max_iterations(iterations);
        }
        Ok(())
    }

    pub fn error_threshold(&self) -> f64 {
        self.settings.projector.error_threshold
    }

    /// Also applied to the active projector, including paths already sharing it.
    pub fn set_error_threshold(&mut self, threshold: f64) -> KinoResult<()> {
        if !threshold.is_finite() || threshold <= 0.0 {
            return Err(KinoError::validation("error threshold must be > 0"));
        }
        self.settings.projector.error_threshold = threshold;
        if let Some(p) = &self.projector {
            p.set_error_threshold(threshold);
        }
        Ok(())
    }

    pub fn set_path_validation(
        &mut self,
        kind: PathValidationKind,
        tolerance: f64,
    ) -> KinoResult<()> {
        let validation = ValidationSettings {
            tolerance,
            ..self.settings.validation.clone()
        };
        validation.validate()?;
        self.settings.path_validation = kind;
        self.settings.validation = validation;
        Ok(())
    }

    /// Instantiate the configured validation strategy over the problem's world.
    pub fn path_validation(&self) -> KinoResult<PathValidationPtr> {
        let checker = Arc::new(self.world.clone());
        let settings = self.settings.validation.clone();
        let validation: PathValidationPtr = match self.settings.path_validation {
            PathValidationKind::Continuous => {
                Arc::new(ContinuousValidation::new(checker, settings)?)
            }
            PathValidationKind::Discretized => {
                Arc::new(DiscretizedValidation::new(checker, settings)?)
            }
        };
        Ok(validation)
    }

    /// Straight path from `q0` to `q1`, timed by its length and projected onto the active
    /// constraints.
    pub fn direct_path(&self, q0: &[f64], q1: &[f64]) -> KinoResult<PathPtr> {
        for q in [q0, q1] {
            if q.len() != self.dimension {
                return Err(KinoError::validation(format!(
                    "configuration of size {} given to a robot of dimension {}",
                    q.len(),
                    self.dimension
                )));
            }
        }
        let range = Interval::new(0.0, distance(q0, q1))?;
        let path: PathPtr = match self.projector() {
            Some(c) => StraightPath::create_with_constraints(q0, q1, range, c)?,
            None => StraightPath::create(q0, q1, range)?,
        };
        Ok(path)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/problem/solver.rs"]
mod tests;
