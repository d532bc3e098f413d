//! Continuous paths through configuration space.
//!
//! A path maps a closed time interval onto configurations. Shapes implement a handful of
//! geometric hooks (`impl_*`, `rebuild`); everything a caller uses (evaluation under
//! constraints, chain-rule derivatives through a time parameterization, sound velocity bounds,
//! extraction and reversal) is provided by [`Path`] on top of them.
//!
//! Paths are immutable once [`register`]ed: every "modifying" operation returns a new
//! [`PathPtr`].

pub mod straight;
pub mod vector;

use std::any::Any;
use std::fmt;
use std::sync::{Arc, OnceLock, Weak};

use crate::constraints::projector::ConstraintProjectorPtr;
use crate::foundation::core::{Configuration, Interval, Vector, zeros};
use crate::foundation::error::{KinoError, KinoResult};
use crate::time::parameterization::{
    ReversedTiming, TimeParameterizationPtr, ensure_monotonic, param_range,
};

/// Slack allowed when checking that a sub-interval lies inside a path's domain.
pub const DOMAIN_EPS: f64 = 1e-9;

/// Shared handle on a registered path.
pub type PathPtr = Arc<dyn Path>;

#[derive(Debug)]
struct SelfRef {
    path: Weak<dyn Path>,
    any: Weak<dyn Any + Send + Sync>,
}

/// State shared by every path shape.
#[derive(Debug)]
pub struct PathCore {
    time_range: Interval,
    param_range: Interval,
    output_size: usize,
    output_derivative_size: usize,
    constraints: Option<ConstraintProjectorPtr>,
    time_parameterization: Option<TimeParameterizationPtr>,
    self_ref: OnceLock<SelfRef>,
}

impl Clone for PathCore {
    /// Clones the geometric state; the clone is not registered.
    fn clone(&self) -> Self {
        Self {
            time_range: self.time_range,
            param_range: self.param_range,
            output_size: self.output_size,
            output_derivative_size: self.output_derivative_size,
            constraints: self.constraints.clone(),
            time_parameterization: self.time_parameterization.clone(),
            self_ref: OnceLock::new(),
        }
    }
}

impl PathCore {
    pub fn new(time_range: Interval, output_size: usize, output_derivative_size: usize) -> Self {
        Self {
            time_range,
            param_range: time_range,
            output_size,
            output_derivative_size,
            constraints: None,
            time_parameterization: None,
            self_ref: OnceLock::new(),
        }
    }

    pub fn time_range(&self) -> Interval {
        self.time_range
    }

    pub fn param_range(&self) -> Interval {
        self.param_range
    }

    pub fn output_size(&self) -> usize {
        self.output_size
    }

    pub fn output_derivative_size(&self) -> usize {
        self.output_derivative_size
    }

    pub fn constraints(&self) -> Option<&ConstraintProjectorPtr> {
        self.constraints.as_ref()
    }

    pub fn time_parameterization(&self) -> Option<&TimeParameterizationPtr> {
        self.time_parameterization.as_ref()
    }

    pub fn param_at_time(&self, t: f64) -> f64 {
        match &self.time_parameterization {
            Some(tp) => tp.value(t),
            None => t,
        }
    }

    /// Attach constraints. Fails if some are already attached.
    pub fn set_constraints(&mut self, constraints: ConstraintProjectorPtr) -> KinoResult<()> {
        if let Some(existing) = &self.constraints {
            return Err(KinoError::precondition(format!(
                "path already owns constraints '{}'",
                existing.name()
            )));
        }
        self.constraints = Some(constraints);
        Ok(())
    }

    /// Reset the time range; the parameter range follows.
    pub fn set_time_range(&mut self, time_range: Interval) -> KinoResult<()> {
        self.param_range = match &self.time_parameterization {
            Some(tp) => param_range(tp.as_ref(), time_range)?,
            None => time_range,
        };
        self.time_range = time_range;
        Ok(())
    }

    pub fn set_time_parameterization(
        &mut self,
        tp: Option<TimeParameterizationPtr>,
        time_range: Interval,
    ) -> KinoResult<()> {
        if let Some(tp) = &tp {
            ensure_monotonic(tp.as_ref(), time_range)?;
        }
        self.time_parameterization = tp;
        self.set_time_range(time_range)
    }

    fn init(&self, self_ref: SelfRef) -> KinoResult<()> {
        self.self_ref
            .set(self_ref)
            .map_err(|_| KinoError::precondition("path registered twice"))
    }
}

impl fmt::Display for PathCore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "time range {}", self.time_range)?;
        if self.time_parameterization.is_some() {
            write!(f, ", param range {}", self.param_range)?;
        }
        if let Some(c) = &self.constraints {
            write!(f, ", constrained by '{}'", c.name())?;
        }
        Ok(())
    }
}

/// Move a fully built shape into shared ownership, install its self handle, and check its
/// endpoints against its constraints.
///
/// Every shape constructor must finish through this function.
pub fn register<T: Path>(path: T) -> KinoResult<Arc<T>> {
    let arc = Arc::new(path);
    let weak: Weak<T> = Arc::downgrade(&arc);
    arc.core().init(SelfRef {
        path: weak.clone(),
        any: weak,
    })?;
    arc.check_path()?;
    Ok(arc)
}

/// Mapping from time to configuration.
pub trait Path: Any + Send + Sync + fmt::Debug {
    fn core(&self) -> &PathCore;

    /// Raw geometry at an internal parameter. Returns `false` when the shape cannot produce a
    /// configuration there.
    fn impl_compute(&self, param: f64, out: &mut [f64]) -> bool;

    /// Geometric derivative with respect to the internal parameter.
    fn impl_derivative(&self, _param: f64, _order: usize, _out: &mut [f64]) -> KinoResult<()> {
        Err(KinoError::not_implemented(format!(
            "derivative of {}",
            self.kind()
        )))
    }

    /// Per-DOF bound of the geometric velocity on `[param0, param1]`.
    fn impl_velocity_bound(&self, _param0: f64, _param1: f64, _out: &mut [f64]) -> KinoResult<()> {
        Err(KinoError::not_implemented(format!(
            "velocity bound of {}",
            self.kind()
        )))
    }

    /// Geometry restricted to `param`, as a new path without time parameterization whose time
    /// range is `param`. New endpoints are projected onto the constraints.
    fn impl_extract(&self, param: Interval) -> KinoResult<PathPtr>;

    /// Geometry run backward (`g'(s) = g(p0 + p1 - s)`), without time parameterization, over the
    /// current parameter range.
    fn impl_reverse(&self) -> KinoResult<PathPtr>;

    /// Same geometry with a different core.
    fn rebuild(&self, core: PathCore) -> KinoResult<PathPtr>;

    /// Short shape name used in messages.
    fn kind(&self) -> &'static str;

    fn time_range(&self) -> Interval {
        self.core().time_range()
    }

    fn param_range(&self) -> Interval {
        self.core().param_range()
    }

    fn length(&self) -> f64 {
        self.time_range().length()
    }

    fn param_length(&self) -> f64 {
        self.param_range().length()
    }

    fn output_size(&self) -> usize {
        self.core().output_size()
    }

    fn output_derivative_size(&self) -> usize {
        self.core().output_derivative_size()
    }

    fn constraints(&self) -> Option<&ConstraintProjectorPtr> {
        self.core().constraints()
    }

    fn time_parameterization(&self) -> Option<&TimeParameterizationPtr> {
        self.core().time_parameterization()
    }

    /// Shared handle on this path, available once registered.
    fn shared(&self) -> Option<PathPtr> {
        self.core().self_ref.get()?.path.upgrade()
    }

    /// Configuration at `t` with constraints applied. `false` means the projector did not
    /// converge and `out` is not meaningful.
    fn evaluate_into(&self, t: f64, out: &mut [f64]) -> bool {
        if !self.impl_compute(self.core().param_at_time(t), out) {
            return false;
        }
        match self.constraints() {
            Some(c) => c.apply(out),
            None => true,
        }
    }

    fn evaluate(&self, t: f64) -> (Configuration, bool) {
        let mut q = zeros(self.output_size());
        let ok = self.evaluate_into(t, &mut q);
        (q, ok)
    }

    /// Raw configuration at `t`, constraints not applied.
    fn at(&self, t: f64, out: &mut [f64]) -> bool {
        self.impl_compute(self.core().param_at_time(t), out)
    }

    fn initial(&self) -> Configuration {
        self.evaluate(self.time_range().start).0
    }

    fn end(&self) -> Configuration {
        self.evaluate(self.time_range().end).0
    }

    /// Derivative of the unconstrained path with respect to time.
    fn derivative_into(&self, t: f64, order: usize, out: &mut [f64]) -> KinoResult<()> {
        if order == 0 {
            return Err(KinoError::precondition("derivative order must be >= 1"));
        }
        match self.time_parameterization() {
            Some(tp) => {
                if order != 1 {
                    return Err(KinoError::precondition(format!(
                        "only first order derivatives are available through a time \
                         parameterization (requested order {order})"
                    )));
                }
                self.impl_derivative(tp.value(t), 1, out)?;
                let k = tp.derivative(t);
                out.iter_mut().for_each(|v| *v *= k);
                Ok(())
            }
            None => self.impl_derivative(t, order, out),
        }
    }

    fn derivative(&self, t: f64, order: usize) -> KinoResult<Vector> {
        let mut v = zeros(self.output_derivative_size());
        self.derivative_into(t, order, &mut v)?;
        Ok(v)
    }

    /// Per-DOF upper bound of `|derivative|` over `[t0, t1] ∩ time_range`.
    fn velocity_bound_into(&self, t0: f64, t1: f64, out: &mut [f64]) -> KinoResult<()> {
        if t0 > t1 {
            return Err(KinoError::precondition(format!(
                "velocity bound needs t0 <= t1 (got [{t0}, {t1}])"
            )));
        }
        let range = self.time_range();
        let (a, b) = (range.clamp(t0), range.clamp(t1));
        let core = self.core();
        self.impl_velocity_bound(core.param_at_time(a), core.param_at_time(b), out)?;
        if let Some(tp) = self.time_parameterization() {
            let k = tp.derivative_bound(a, b);
            out.iter_mut().for_each(|v| *v *= k);
        }
        Ok(())
    }

    fn velocity_bound(&self, t0: f64, t1: f64) -> KinoResult<Vector> {
        let mut v = zeros(self.output_derivative_size());
        self.velocity_bound_into(t0, t1, &mut v)?;
        Ok(v)
    }

    /// Sub-path over `[a, b]`; reversed when `b < a`.
    fn extract(&self, a: f64, b: f64) -> KinoResult<PathPtr> {
        if b < a {
            return self.extract(b, a)?.reverse();
        }
        let range = self.time_range();
        let sub = Interval::new(a, b)?;
        if !range.contains_interval(sub, DOMAIN_EPS) {
            return Err(KinoError::validation(format!(
                "cannot extract {sub} from a path defined on {range}"
            )));
        }
        let sub = Interval::new(range.clamp(a), range.clamp(b))?;
        match self.time_parameterization() {
            None => self.impl_extract(sub),
            Some(tp) => {
                let geometry = self.impl_extract(param_range(tp.as_ref(), sub)?)?;
                geometry.with_time_parameterization(tp.clone(), sub)
            }
        }
    }

    /// Same domain, time running backward.
    fn reverse(&self) -> KinoResult<PathPtr> {
        match self.time_parameterization() {
            None => self.impl_reverse(),
            Some(tp) => {
                let geometry = self.impl_reverse()?;
                let range = self.time_range();
                let reversed = ReversedTiming::new(tp.clone(), range)?;
                geometry.with_time_parameterization(Arc::new(reversed), range)
            }
        }
    }

    fn copy(&self) -> KinoResult<PathPtr> {
        self.rebuild(self.core().clone())
    }

    /// Copy carrying `constraints`. The receiver must not own constraints yet.
    fn copy_with_constraints(&self, constraints: ConstraintProjectorPtr) -> KinoResult<PathPtr> {
        let mut core = self.core().clone();
        core.set_constraints(constraints)?;
        self.rebuild(core)
    }

    /// Copy with `tp` attached and the time range reset to `time_range`.
    fn with_time_parameterization(
        &self,
        tp: TimeParameterizationPtr,
        time_range: Interval,
    ) -> KinoResult<PathPtr> {
        let mut core = self.core().clone();
        core.set_time_parameterization(Some(tp), time_range)?;
        self.rebuild(core)
    }

    /// Verify that both endpoints satisfy the constraints. Run by [`register`].
    fn check_path(&self) -> KinoResult<()> {
        let Some(c) = self.constraints() else {
            return Ok(());
        };
        let mut q = zeros(self.output_size());
        let range = self.time_range();
        for (label, t) in [("initial", range.start), ("end", range.end)] {
            if !self.at(t, &mut q) || !c.is_satisfied(&q) {
                return Err(KinoError::projection(format!(
                    "{label} configuration of {} does not satisfy constraints '{}'",
                    self.kind(),
                    c.name()
                )));
            }
        }
        Ok(())
    }
}

impl dyn Path {
    /// Recover the concrete shape behind a base handle.
    pub fn downcast<T: Path>(&self) -> Option<Arc<T>> {
        let any = self.core().self_ref.get()?.any.upgrade()?;
        any.downcast::<T>().ok()
    }
}

/// Project `q` onto `constraints`, reporting failure as a projection error.
pub(crate) fn project_endpoint(
    constraints: Option<&ConstraintProjectorPtr>,
    q: &mut [f64],
    what: &str,
) -> KinoResult<()> {
    match constraints {
        Some(c) if !c.apply(q) => Err(KinoError::projection(format!(
            "failed to project {what} onto constraints '{}'",
            c.name()
        ))),
        _ => Ok(()),
    }
}

#[cfg(test)]
#[path = "../../tests/unit/path/path.rs"]
mod tests;
