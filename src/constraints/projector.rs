use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};

use crate::constraints::function::DifferentiableFunctionPtr;
use crate::foundation::core::{Vector, norm};
use crate::foundation::error::{KinoError, KinoResult};
use crate::foundation::math::{Matrix, damped_least_squares_step};

/// Projects raw configurations onto a constraint manifold.
///
/// Shared by `Arc` between every path that lives on the same manifold, so `apply` must keep all
/// iteration state on the stack. A `false` return is a normal outcome, not an error; on failure
/// the content of `q` is unspecified.
pub trait ConstraintProjector: fmt::Debug + Send + Sync {
    fn name(&self) -> &str;

    fn apply(&self, q: &mut [f64]) -> bool;

    fn is_satisfied(&self, q: &[f64]) -> bool;

    fn max_iterations(&self) -> usize;

    fn set_max_iterations(&self, iterations: usize);

    fn error_threshold(&self) -> f64;

    fn set_error_threshold(&self, threshold: f64);
}

/// Shared handle on a constraint projector.
pub type ConstraintProjectorPtr = Arc<dyn ConstraintProjector>;

/// How one residual row is compared against its right-hand side.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum Comparison {
    /// `f(q) = rhs`.
    Equality,
    /// `f(q) = 0`, ignoring the right-hand side.
    EqualToZero,
    /// `f(q) <= rhs`.
    Inferior,
    /// `f(q) >= rhs`.
    Superior,
}

impl Comparison {
    /// Residual actually driven to zero for a raw difference `r`.
    fn active_residual(self, r: f64) -> f64 {
        match self {
            Self::Equality | Self::EqualToZero => r,
            Self::Inferior => r.max(0.0),
            Self::Superior => r.min(0.0),
        }
    }
}

/// A differentiable function with per-row comparison and right-hand side.
#[derive(Clone, Debug)]
pub struct NumericalConstraint {
    function: DifferentiableFunctionPtr,
    comparison: Vec<Comparison>,
    rhs: Vector,
}

impl NumericalConstraint {
    /// `f(q) = 0` on every row.
    pub fn equality(function: DifferentiableFunctionPtr) -> Self {
        let rows = function.output_derivative_size();
        let rhs = Vector::from_elem(0.0, function.output_size());
        Self {
            function,
            comparison: vec![Comparison::Equality; rows],
            rhs,
        }
    }

    /// Same comparison on every row.
    pub fn with_comparison(function: DifferentiableFunctionPtr, comparison: Comparison) -> Self {
        let mut c = Self::equality(function);
        c.comparison.fill(comparison);
        c
    }

    /// Per-row comparisons; must match the function's output derivative size.
    pub fn with_comparisons(
        function: DifferentiableFunctionPtr,
        comparison: Vec<Comparison>,
    ) -> KinoResult<Self> {
        if comparison.len() != function.output_derivative_size() {
            return Err(KinoError::validation(format!(
                "constraint '{}' expects {} comparison entries, got {}",
                function.name(),
                function.output_derivative_size(),
                comparison.len()
            )));
        }
        let mut c = Self::equality(function);
        c.comparison = comparison;
        Ok(c)
    }

    pub fn rhs(mut self, rhs: &[f64]) -> KinoResult<Self> {
        if rhs.len() != self.function.output_size() {
            return Err(KinoError::validation(format!(
                "constraint '{}' expects a right-hand side of size {}, got {}",
                self.function.name(),
                self.function.output_size(),
                rhs.len()
            )));
        }
        self.rhs = rhs.iter().copied().collect();
        Ok(self)
    }

    pub fn function(&self) -> &DifferentiableFunctionPtr {
        &self.function
    }

    pub fn comparison(&self) -> &[Comparison] {
        &self.comparison
    }

    pub fn right_hand_side(&self) -> &[f64] {
        &self.rhs
    }

    fn rows(&self) -> usize {
        self.function.output_derivative_size()
    }
}

/// Configuration entry held at a fixed value.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct LockedJoint {
    pub name: String,
    pub index: usize,
    pub value: f64,
}

/// Solver tunables for [`ConfigProjector`].
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct ProjectorSettings {
    pub max_iterations: usize,
    pub error_threshold: f64,
    /// Initial Levenberg-Marquardt damping. `0.0` gives plain Gauss-Newton.
    pub damping: f64,
    /// Factor applied to the damping after a rejected (divide) or accepted (multiply) step.
    pub damping_factor: f64,
}

impl Default for ProjectorSettings {
    fn default() -> Self {
        Self {
            max_iterations: 40,
            error_threshold: 1e-4,
            damping: 1e-6,
            damping_factor: 10.0,
        }
    }
}

impl ProjectorSettings {
    pub fn validate(&self) -> KinoResult<()> {
        if self.max_iterations == 0 {
            return Err(KinoError::validation("projector max_iterations must be >= 1"));
        }
        if !self.error_threshold.is_finite() || self.error_threshold <= 0.0 {
            return Err(KinoError::validation(
                "projector error_threshold must be finite and > 0",
            ));
        }
        if !self.damping.is_finite() || self.damping < 0.0 {
            return Err(KinoError::validation("projector damping must be finite and >= 0"));
        }
        if !self.damping_factor.is_finite() || self.damping_factor <= 1.0 {
            return Err(KinoError::validation("projector damping_factor must be > 1"));
        }
        Ok(())
    }
}

/// Damped Gauss-Newton projector over a stack of numerical constraints.
pub struct ConfigProjector {
    name: String,
    dimension: usize,
    constraints: Vec<NumericalConstraint>,
    locked: Vec<LockedJoint>,
    max_iterations: AtomicUsize,
    error_threshold: AtomicU64,
    damping: f64,
    damping_factor: f64,
}

impl fmt::Debug for ConfigProjector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConfigProjector")
            .field("name", &self.name)
            .field("dimension", &self.dimension)
            .field(
                "constraints",
                &self
                    .constraints
                    .iter()
                    .map(|c| c.function.name())
                    .collect::<Vec<_>>(),
            )
            .field("locked", &self.locked)
            .field("max_iterations", &self.max_iterations())
            .field("error_threshold", &self.error_threshold())
            .finish()
    }
}

impl ConfigProjector {
    pub fn new(
        name: impl Into<String>,
        dimension: usize,
        settings: &ProjectorSettings,
    ) -> KinoResult<Self> {
        settings.validate()?;
        Ok(Self {
            name: name.into(),
            dimension,
            constraints: Vec::new(),
            locked: Vec::new(),
            max_iterations: AtomicUsize::new(settings.max_iterations),
            error_threshold: AtomicU64::new(settings.error_threshold.to_bits()),
            damping: settings.damping,
            damping_factor: settings.damping_factor,
        })
    }

    pub fn add(&mut self, constraint: NumericalConstraint) -> KinoResult<()> {
        let f = &constraint.function;
        if f.input_size() != self.dimension || f.input_derivative_size() != self.dimension {
            return Err(KinoError::validation(format!(
                "constraint '{}' reads configurations of size {} but projector '{}' has dimension {}",
                f.name(),
                f.input_size(),
                self.name,
                self.dimension
            )));
        }
        self.constraints.push(constraint);
        Ok(())
    }

    pub fn lock(&mut self, joint: LockedJoint) -> KinoResult<()> {
        if joint.index >= self.dimension {
            return Err(KinoError::validation(format!(
                "locked joint '{}' index {} is out of range for dimension {}",
                joint.name, joint.index, self.dimension
            )));
        }
        self.locked.retain(|j| j.index != joint.index);
        self.locked.push(joint);
        Ok(())
    }

    pub fn dimension(&self) -> usize {
        self.dimension
    }

    pub fn constraints(&self) -> &[NumericalConstraint] {
        &self.constraints
    }

    pub fn locked_joints(&self) -> &[LockedJoint] {
        &self.locked
    }

    fn total_rows(&self) -> usize {
        self.constraints.iter().map(NumericalConstraint::rows).sum()
    }

    fn active_columns(&self) -> Vec<usize> {
        (0..self.dimension)
            .filter(|c| !self.locked.iter().any(|j| j.index == *c))
            .collect()
    }

    fn apply_locked(&self, q: &mut [f64]) {
        for j in &self.locked {
            q[j.index] = j.value;
        }
    }

    /// Stacked active residual; returns its norm.
    fn residual(&self, q: &[f64], e: &mut [f64]) -> f64 {
        let mut row = 0;
        let mut value = Vector::new();
        let mut rhs = Vector::new();
        for c in &self.constraints {
            let f = &c.function;
            value.resize(f.output_size(), 0.0);
            f.compute(q, &mut value);
            rhs.clear();
            rhs.extend(c.rhs.iter().enumerate().map(|(i, r)| {
                match c.comparison.get(i) {
                    Some(Comparison::EqualToZero) => 0.0,
                    _ => *r,
                }
            }));
            let rows = c.rows();
            let out = &mut e[row..row + rows];
            f.difference(&value, &rhs, out);
            for (r, k) in out.iter_mut().zip(&c.comparison) {
                *r = k.active_residual(*r);
            }
            row += rows;
        }
        norm(e)
    }

    /// Stacked Jacobian with inactive inequality rows zeroed.
    fn jacobian(&self, q: &[f64], e: &[f64], j: &mut Matrix) {
        let mut row = 0;
        for c in &self.constraints {
            let rows = c.rows();
            let mut block = Matrix::zeros(rows, self.dimension);
            c.function.jacobian(q, &mut block);
            for (r, k) in c.comparison.iter().enumerate() {
                let inactive = matches!(k, Comparison::Inferior | Comparison::Superior)
                    && e[row + r] == 0.0;
                if inactive {
                    block.row_mut(r).fill(0.0);
                }
            }
            j.set_block(row, 0, &block);
            row += rows;
        }
    }
}

impl ConstraintProjector for ConfigProjector {
    fn name(&self) -> &str {
        &self.name
    }

    #[tracing::instrument(level = "trace", skip_all, fields(projector = %self.name))]
    fn apply(&self, q: &mut [f64]) -> bool {
        if q.len() != self.dimension {
            return false;
        }
        self.apply_locked(q);
        if self.constraints.is_empty() {
            return true;
        }

        let threshold = self.error_threshold();
        let max_iterations = self.max_iterations();
        let rows = self.total_rows();
        let active = self.active_columns();
        let mut e = vec![0.0; rows];
        let mut trial_e = vec![0.0; rows];
        let mut trial = q.to_vec();
        let mut j = Matrix::zeros(rows, self.dimension);
        let mut lambda = self.damping;

        let mut err = self.residual(q, &mut e);
        for iteration in 0..max_iterations {
            if err < threshold {
                tracing::trace!(iteration, err, "projection converged");
                return true;
            }
            self.jacobian(q, &e, &mut j);
            let Some(dx) = damped_least_squares_step(&j, &e, lambda, &active) else {
                tracing::trace!(iteration, err, "singular projection step");
                return false;
            };
            for ((t, qi), d) in trial.iter_mut().zip(q.iter()).zip(&dx) {
                *t = qi + d;
            }
            let trial_err = self.residual(&trial, &mut trial_e);
            if trial_err <= err || lambda == 0.0 {
                q.copy_from_slice(&trial);
                std::mem::swap(&mut e, &mut trial_e);
                err = trial_err;
                lambda /= self.damping_factor;
            } else {
                lambda = (lambda * self.damping_factor).max(1e-9);
            }
        }

        let ok = err < threshold;
        tracing::trace!(max_iterations, err, ok, "projection stopped");
        ok
    }

    fn is_satisfied(&self, q: &[f64]) -> bool {
        if q.len() != self.dimension {
            return false;
        }
        if self.locked.iter().any(|j| (q[j.index] - j.value).abs() > self.error_threshold()) {
            return false;
        }
        let mut e = vec![0.0; self.total_rows()];
        self.residual(q, &mut e) < self.error_threshold()
    }

    fn max_iterations(&self) -> usize {
        self.max_iterations.load(Ordering::Relaxed)
    }

    fn set_max_iterations(&self, iterations: usize) {
        self.max_iterations.store(iterations, Ordering::Relaxed);
    }

    fn error_threshold(&self) -> f64 {
        f64::from_bits(self.error_threshold.load(Ordering::Relaxed))
    }

    fn set_error_threshold(&self, threshold: f64) {
        self.error_threshold
            .store(threshold.to_bits(), Ordering::Relaxed);
    }
}

#[cfg(test)]
#[path = "../../tests/unit/constraints/projector.rs"]
mod tests;
