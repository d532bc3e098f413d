//! Path validation: deciding which initial (or final) portion of a path is collision free.

pub mod batch;
pub mod continuous;
pub mod discretized;

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use crate::collision::{CollisionChecker, CollisionQuery};
use crate::foundation::core::Interval;
use crate::foundation::error::{KinoError, KinoResult};
use crate::path::{Path, PathPtr};

/// Cooperative cancellation flag, checked between steps of a scan.
#[derive(Clone, Debug, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

/// Tunables shared by the validation strategies.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct ValidationSettings {
    /// Workspace penetration accepted between two tested configurations. Zero keeps the
    /// continuous certificate exact; a positive value trades soundness for fewer checks.
    pub tolerance: f64,
    /// Longest time step a single look-ahead may cover.
    pub max_step: f64,
    /// Sampling step used once the certified step collapses (near contact). Such steps are
    /// never certified.
    pub min_step: f64,
    /// Time resolution of collision localization.
    pub refinement: f64,
    /// Budget of configuration tests per scan.
    pub max_checks: usize,
    /// Per-DOF Lipschitz weights mapping configuration speed to workspace speed. Empty means
    /// all ones.
    pub dof_weights: Vec<f64>,
    /// Sampling step of the discretized strategy.
    pub step: f64,
}

impl Default for ValidationSettings {
    fn default() -> Self {
        Self {
            tolerance: 0.0,
            max_step: 0.1,
            min_step: 1e-4,
            refinement: 1e-6,
            max_checks: 100_000,
            dof_weights: Vec::new(),
            step: 0.01,
        }
    }
}

impl ValidationSettings {
    pub fn validate(&self) -> KinoResult<()> {
        if !self.tolerance.is_finite() || self.tolerance < 0.0 {
            return Err(KinoError::validation("validation 'tolerance' must be >= 0"));
        }
        for (name, v) in [
            ("max_step", self.max_step),
            ("min_step", self.min_step),
            ("refinement", self.refinement),
            ("step", self.step),
        ] {
            if !v.is_finite() || v <= 0.0 {
                return Err(KinoError::validation(format!(
                    "validation '{name}' must be > 0"
                )));
            }
        }
        if self.min_step > self.max_step {
            return Err(KinoError::validation(
                "validation 'min_step' must not exceed 'max_step'",
            ));
        }
        if self.max_checks == 0 {
            return Err(KinoError::validation("validation 'max_checks' must be >= 1"));
        }
        if self.dof_weights.iter().any(|w| !w.is_finite() || *w < 0.0) {
            return Err(KinoError::validation(
                "validation 'dof_weights' must be finite and >= 0",
            ));
        }
        Ok(())
    }

    /// `Σ λ_i v_i` for a per-DOF velocity bound `v`.
    pub(crate) fn workspace_speed(&self, v: &[f64]) -> KinoResult<f64> {
        if self.dof_weights.is_empty() {
            return Ok(v.iter().sum());
        }
        if self.dof_weights.len() != v.len() {
            return Err(KinoError::validation(format!(
                "{} dof weights given for a path with {} velocity components",
                self.dof_weights.len(),
                v.len()
            )));
        }
        Ok(self.dof_weights.iter().zip(v).map(|(w, x)| w * x).sum())
    }
}

/// Result of validating one path.
#[derive(Clone, Debug)]
pub struct ValidationReport {
    /// The whole path was certified.
    pub whole_valid: bool,
    /// Path restricted to the certified interval. `None` when nothing was certified or the
    /// restriction could not be projected onto the path's constraints.
    pub valid_part: Option<PathPtr>,
    /// Certified interval: `[start, c]` forward, `[c', end]` in reverse.
    pub certified: Interval,
    /// First time found in collision, if any.
    pub collision_at: Option<f64>,
    /// Number of configurations tested.
    pub checks: usize,
    /// The scan stopped on the check budget or on cancellation.
    pub interrupted: bool,
    /// A continuous scan could not certify a step and sampled past `certified`.
    pub uncertified: bool,
}

/// Strategy validating paths against a collision checker.
pub trait PathValidation: Send + Sync {
    /// Validate `path` from its start, or from its end when `reverse` is set.
    fn validate(&self, path: &PathPtr, reverse: bool) -> KinoResult<ValidationReport>;
}

pub type PathValidationPtr = Arc<dyn PathValidation>;

/// Test the projected configuration at `t`. A projector failure counts as a collision.
pub(crate) fn probe(
    checker: &dyn CollisionChecker,
    path: &dyn Path,
    t: f64,
    q: &mut [f64],
) -> CollisionQuery {
    if path.evaluate_into(t, q) {
        checker.check(q)
    } else {
        CollisionQuery::Collision
    }
}

/// Where a scan stopped.
#[derive(Clone, Copy, Debug)]
pub(crate) struct ScanOutcome {
    /// Time up to which the path is valid, `None` if the boundary itself is invalid.
    pub reached: Option<f64>,
    pub collision_at: Option<f64>,
    pub checks: usize,
    pub interrupted: bool,
    pub uncertified: bool,
}

/// Build the report of a scan started at the path start (or end when `reverse`).
pub(crate) fn finish(
    path: &PathPtr,
    reverse: bool,
    outcome: ScanOutcome,
) -> KinoResult<ValidationReport> {
    let range = path.time_range();
    let from = if reverse { range.end } else { range.start };
    let to = if reverse { range.start } else { range.end };

    let Some(reached) = outcome.reached else {
        return Ok(ValidationReport {
            whole_valid: false,
            valid_part: None,
            certified: Interval::point(from)?,
            collision_at: outcome.collision_at,
            checks: outcome.checks,
            interrupted: outcome.interrupted,
            uncertified: outcome.uncertified,
        });
    };

    let certified = if reverse {
        Interval::new(reached, from)?
    } else {
        Interval::new(from, reached)?
    };
    let whole_valid = reached == to && outcome.collision_at.is_none() && !outcome.uncertified;
    let valid_part = if whole_valid {
        Some(path.clone())
    } else {
        match path.extract(certified.start, certified.end) {
            Ok(part) => Some(part),
            Err(e) if e.is_projection() => {
                tracing::debug!(error = %e, "valid part could not be projected");
                None
            }
            Err(e) => return Err(e),
        }
    };

    Ok(ValidationReport {
        whole_valid,
        valid_part,
        certified,
        collision_at: outcome.collision_at,
        checks: outcome.checks,
        interrupted: outcome.interrupted,
        uncertified: outcome.uncertified,
    })
}

#[cfg(test)]
#[path = "../../tests/unit/validation/settings.rs"]
mod tests;
