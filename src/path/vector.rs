use std::sync::Arc;

use smallvec::SmallVec;

use crate::constraints::projector::ConstraintProjectorPtr;
use crate::foundation::core::{Interval, Vector, distance};
use crate::foundation::error::{KinoError, KinoResult};
use crate::path::{Path, PathCore, PathPtr, register};

/// Largest gap tolerated between consecutive sub-paths.
pub const CONTINUITY_TOLERANCE: f64 = 1e-6;

/// Concatenation of paths, traversed one after the other.
///
/// Sub-path `i` occupies `[ends[i] - length_i, ends[i]]` of the concatenated local time, which
/// is mapped linearly onto the vector's parameter range.
#[derive(Debug)]
pub struct PathVector {
    core: PathCore,
    paths: Vec<PathPtr>,
    ends: Vec<f64>,
}

impl PathVector {
    /// Concatenate `paths` over `[0, Σ lengths]`.
    pub fn create(paths: Vec<PathPtr>) -> KinoResult<Arc<Self>> {
        let total = paths.iter().map(|p| p.length()).sum::<f64>();
        Self::assemble(paths, Interval::new(0.0, total)?, None)
    }

    /// Constrained vectors have their outer endpoints projected by [`register`].
    fn assemble(
        paths: Vec<PathPtr>,
        time_range: Interval,
        constraints: Option<&ConstraintProjectorPtr>,
    ) -> KinoResult<Arc<Self>> {
        let Some(first) = paths.first() else {
            return Err(KinoError::validation("path vector needs at least one path"));
        };
        let (size, dsize) = (first.output_size(), first.output_derivative_size());
        let mut ends = Vec::with_capacity(paths.len());
        let mut acc = 0.0;
        for (i, p) in paths.iter().enumerate() {
            if p.output_size() != size || p.output_derivative_size() != dsize {
                return Err(KinoError::validation(format!(
                    "sub-path {i} has output size {}/{}, expected {size}/{dsize}",
                    p.output_size(),
                    p.output_derivative_size()
                )));
            }
            if i > 0 {
                let gap = distance(&paths[i - 1].end(), &p.initial());
                if gap > CONTINUITY_TOLERANCE {
                    return Err(KinoError::validation(format!(
                        "sub-path {i} starts {gap} away from the end of sub-path {}",
                        i - 1
                    )));
                }
            }
            acc += p.length();
            ends.push(acc);
        }
        let mut core = PathCore::new(time_range, size, dsize);
        if let Some(c) = constraints {
            core.set_constraints(c.clone())?;
        }
        register(Self { core, paths, ends })
    }

    /// New vector with `path` appended. Time starts at zero; timing of `self` is dropped.
    pub fn append_path(&self, path: PathPtr) -> KinoResult<Arc<Self>> {
        let mut paths = self.paths.clone();
        paths.push(path);
        Self::create(paths)
    }

    /// New vector traversing `self` then `other`.
    pub fn concatenate(&self, other: &PathVector) -> KinoResult<Arc<Self>> {
        let mut paths = self.paths.clone();
        paths.extend(other.paths.iter().cloned());
        Self::create(paths)
    }

    pub fn num_paths(&self) -> usize {
        self.paths.len()
    }

    pub fn path_at_rank(&self, rank: usize) -> Option<&PathPtr> {
        self.paths.get(rank)
    }

    /// Sub-path rank and its local time at internal parameter `param`.
    pub fn rank_at_param(&self, param: f64) -> (usize, f64) {
        self.locate(self.local(param))
    }

    fn total(&self) -> f64 {
        self.ends.last().copied().unwrap_or(0.0)
    }

    /// d(local time) / d(param).
    fn scale(&self) -> f64 {
        let len = self.core.param_range().length();
        if len == 0.0 { 1.0 } else { self.total() / len }
    }

    fn local(&self, param: f64) -> f64 {
        let range = self.core.param_range();
        ((param - range.start) * self.scale()).clamp(0.0, self.total())
    }

    fn start_of(&self, rank: usize) -> f64 {
        self.ends[rank] - self.paths[rank].length()
    }

    fn locate(&self, local: f64) -> (usize, f64) {
        let rank = self
            .ends
            .partition_point(|&e| e < local)
            .min(self.paths.len() - 1);
        let t = self.paths[rank].time_range().start + (local - self.start_of(rank));
        (rank, self.paths[rank].time_range().clamp(t))
    }

    /// Sub-path pieces covering local times `[x0, x1]`, as `(rank, t0, t1)` in sub-path time.
    fn pieces(&self, x0: f64, x1: f64) -> SmallVec<[(usize, f64, f64); 4]> {
        let (r0, t0) = self.locate(x0);
        let (r1, t1) = self.locate(x1);
        let mut out = SmallVec::new();
        for rank in r0..=r1 {
            let range = self.paths[rank].time_range();
            let a = if rank == r0 { t0 } else { range.start };
            let b = if rank == r1 { t1 } else { range.end };
            out.push((rank, a, b.max(a)));
        }
        out
    }
}

impl Path for PathVector {
    fn core(&self) -> &PathCore {
        &self.core
    }

    fn kind(&self) -> &'static str {
        "path vector"
    }

    fn impl_compute(&self, param: f64, out: &mut [f64]) -> bool {
        let (rank, t) = self.rank_at_param(param);
        self.paths[rank].evaluate_into(t, out)
    }

    fn impl_derivative(&self, param: f64, order: usize, out: &mut [f64]) -> KinoResult<()> {
        let (rank, t) = self.rank_at_param(param);
        self.paths[rank].derivative_into(t, order, out)?;
        let k = self.scale().powi(order as i32);
        out.iter_mut().for_each(|v| *v *= k);
        Ok(())
    }

    fn impl_velocity_bound(&self, param0: f64, param1: f64, out: &mut [f64]) -> KinoResult<()> {
        out.fill(0.0);
        let mut bound = Vector::from_elem(0.0, out.len());
        for (rank, a, b) in self.pieces(self.local(param0), self.local(param1)) {
            self.paths[rank].velocity_bound_into(a, b, &mut bound)?;
            for (o, v) in out.iter_mut().zip(&bound) {
                *o = o.max(*v);
            }
        }
        let k = self.scale();
        out.iter_mut().for_each(|v| *v *= k);
        Ok(())
    }

    fn impl_extract(&self, param: Interval) -> KinoResult<PathPtr> {
        let (x0, x1) = (self.local(param.start), self.local(param.end));
        let pieces = self.pieces(x0, x1);
        let keep_all = x0 == x1;
        let mut paths = Vec::with_capacity(pieces.len());
        for (rank, a, b) in pieces {
            if a < b || keep_all {
                paths.push(self.paths[rank].extract(a, b)?);
            }
            if keep_all {
                break;
            }
        }
        if paths.is_empty() {
            let (rank, t) = self.locate(x0);
            paths.push(self.paths[rank].extract(t, t)?);
        }
        let path = Self::assemble(paths, param, self.core.constraints())?;
        Ok(path)
    }

    fn impl_reverse(&self) -> KinoResult<PathPtr> {
        let paths = self
            .paths
            .iter()
            .rev()
            .map(|p| p.reverse())
            .collect::<KinoResult<Vec<_>>>()?;
        let path = Self::assemble(paths, self.core.param_range(), self.core.constraints())?;
        Ok(path)
    }

    fn rebuild(&self, core: PathCore) -> KinoResult<PathPtr> {
        let path = register(Self {
            core,
            paths: self.paths.clone(),
            ends: self.ends.clone(),
        })?;
        Ok(path)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/path/vector.rs"]
mod tests;
