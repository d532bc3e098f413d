use std::sync::Arc;

use crate::constraints::projector::ConstraintProjectorPtr;
use crate::foundation::core::{Configuration, Interval, lerp_into};
use crate::foundation::error::{KinoError, KinoResult};
use crate::path::{Path, PathCore, PathPtr, project_endpoint, register};

/// Linear interpolation between two configurations.
#[derive(Debug)]
pub struct StraightPath {
    core: PathCore,
    initial: Configuration,
    end: Configuration,
}

impl StraightPath {
    pub fn create(initial: &[f64], end: &[f64], time_range: Interval) -> KinoResult<Arc<Self>> {
        Self::build(initial, end, time_range, None)
    }

    /// Straight path whose evaluations are projected onto `constraints`. Both endpoints must
    /// already satisfy them.
    pub fn create_with_constraints(
        initial: &[f64],
        end: &[f64],
        time_range: Interval,
        constraints: ConstraintProjectorPtr,
    ) -> KinoResult<Arc<Self>> {
        Self::build(initial, end, time_range, Some(constraints))
    }

    fn build(
        initial: &[f64],
        end: &[f64],
        time_range: Interval,
        constraints: Option<ConstraintProjectorPtr>,
    ) -> KinoResult<Arc<Self>> {
        if initial.len() != end.len() {
            return Err(KinoError::validation(format!(
                "straight path endpoints differ in size ({} vs {})",
                initial.len(),
                end.len()
            )));
        }
        if initial.iter().chain(end).any(|v| !v.is_finite()) {
            return Err(KinoError::validation("straight path endpoints must be finite"));
        }
        let mut core = PathCore::new(time_range, initial.len(), initial.len());
        if let Some(c) = constraints {
            core.set_constraints(c)?;
        }
        register(Self {
            core,
            initial: initial.into(),
            end: end.into(),
        })
    }

    /// Raw start point of the segment.
    pub fn start_point(&self) -> &[f64] {
        &self.initial
    }

    /// Raw end point of the segment.
    pub fn end_point(&self) -> &[f64] {
        &self.end
    }

    fn ratio(&self, param: f64) -> f64 {
        let range = self.core.param_range();
        if range.is_degenerate() {
            0.0
        } else {
            (param - range.start) / range.length()
        }
    }

    fn slope(&self) -> impl Iterator<Item = f64> + '_ {
        let len = self.core.param_range().length();
        self.initial.iter().zip(&self.end).map(move |(a, b)| {
            if len == 0.0 { 0.0 } else { (b - a) / len }
        })
    }
}

impl Path for StraightPath {
    fn core(&self) -> &PathCore {
        &self.core
    }

    fn kind(&self) -> &'static str {
        "straight path"
    }

    fn impl_compute(&self, param: f64, out: &mut [f64]) -> bool {
        if out.len() != self.initial.len() {
            return false;
        }
        lerp_into(&self.initial, &self.end, self.ratio(param), out);
        true
    }

    fn impl_derivative(&self, _param: f64, order: usize, out: &mut [f64]) -> KinoResult<()> {
        if order == 1 {
            for (o, v) in out.iter_mut().zip(self.slope()) {
                *o = v;
            }
        } else {
            out.fill(0.0);
        }
        Ok(())
    }

    fn impl_velocity_bound(&self, _param0: f64, _param1: f64, out: &mut [f64]) -> KinoResult<()> {
        for (o, v) in out.iter_mut().zip(self.slope()) {
            *o = v.abs();
        }
        Ok(())
    }

    fn impl_extract(&self, param: Interval) -> KinoResult<PathPtr> {
        let constraints = self.core.constraints();
        let mut q0 = Configuration::from_elem(0.0, self.initial.len());
        let mut q1 = q0.clone();
        self.impl_compute(param.start, &mut q0);
        self.impl_compute(param.end, &mut q1);
        project_endpoint(constraints, &mut q0, "extracted start")?;
        project_endpoint(constraints, &mut q1, "extracted end")?;
        let path = Self::build(&q0, &q1, param, constraints.cloned())?;
        Ok(path)
    }

    fn impl_reverse(&self) -> KinoResult<PathPtr> {
        let path = Self::build(
            &self.end,
            &self.initial,
            self.core.param_range(),
            self.core.constraints().cloned(),
        )?;
        Ok(path)
    }

    fn rebuild(&self, core: PathCore) -> KinoResult<PathPtr> {
        let path = register(Self {
            core,
            initial: self.initial.clone(),
            end: self.end.clone(),
        })?;
        Ok(path)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/path/straight.rs"]
mod tests;
