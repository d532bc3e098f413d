use std::fmt;

use smallvec::SmallVec;

use crate::foundation::error::{KinoError, KinoResult};

/// Point of a robot configuration space.
///
/// Inline storage covers robots up to 8 DOF, so evaluating small robots never allocates.
pub type Configuration = SmallVec<[f64; 8]>;

/// Tangent vector (velocity, derivative, velocity bound) of a configuration space.
pub type Vector = SmallVec<[f64; 8]>;

/// Closed interval `[start, end]` of time or path parameter.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Interval {
    pub start: f64,
    pub end: f64,
}

impl Interval {
    pub fn new(start: f64, end: f64) -> KinoResult<Self> {
        if !start.is_finite() || !end.is_finite() {
            return Err(KinoError::validation("interval bounds must be finite"));
        }
        if start > end {
            return Err(KinoError::validation(format!(
                "interval start must be <= end (got [{start}, {end}])"
            )));
        }
        Ok(Self { start, end })
    }

    /// Degenerate interval `[t, t]`.
    pub fn point(t: f64) -> KinoResult<Self> {
        Self::new(t, t)
    }

    pub fn length(self) -> f64 {
        self.end - self.start
    }

    pub fn is_degenerate(self) -> bool {
        self.start == self.end
    }

    pub fn contains(self, t: f64) -> bool {
        self.start <= t && t <= self.end
    }

    /// True when `other` lies inside `self`, allowing `eps` of slack on each side.
    pub fn contains_interval(self, other: Interval, eps: f64) -> bool {
        other.start >= self.start - eps && other.end <= self.end + eps
    }

    pub fn clamp(self, t: f64) -> f64 {
        t.clamp(self.start, self.end)
    }
}

impl fmt::Display for Interval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {}]", self.start, self.end)
    }
}

/// Zero-filled configuration of dimension `n`.
pub fn zeros(n: usize) -> Configuration {
    SmallVec::from_elem(0.0, n)
}

/// Euclidean norm.
pub fn norm(v: &[f64]) -> f64 {
    v.iter().map(|x| x * x).sum::<f64>().sqrt()
}

/// Largest absolute component.
pub fn norm_inf(v: &[f64]) -> f64 {
    v.iter().fold(0.0_f64, |m, x| m.max(x.abs()))
}

/// Euclidean distance between two configurations of equal size.
pub fn distance(a: &[f64], b: &[f64]) -> f64 {
    a.iter()
        .zip(b)
        .map(|(x, y)| (x - y) * (x - y))
        .sum::<f64>()
        .sqrt()
}

/// `out = a + u * (b - a)`.
pub fn lerp_into(a: &[f64], b: &[f64], u: f64, out: &mut [f64]) {
    for ((o, x), y) in out.iter_mut().zip(a).zip(b) {
        *o = x + (y - x) * u;
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/core.rs"]
mod tests;
