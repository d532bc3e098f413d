use std::fmt;
use std::sync::Arc;

use crate::foundation::core::Interval;
use crate::foundation::error::{KinoError, KinoResult};
use crate::time::ease::Ease;

/// Samples used by the default monotonicity check.
const MONOTONIC_SAMPLES: usize = 64;

/// Monotone, once-differentiable map from a path's time domain onto its internal parameter.
///
/// Implementations are shared between paths through `Arc` and must be reentrant.
pub trait TimeParameterization: fmt::Debug + Send + Sync {
    fn value(&self, t: f64) -> f64;

    fn derivative(&self, t: f64) -> f64;

    /// Certified supremum of `|derivative|` on `[t0, t1]`. May overestimate, never
    /// underestimate.
    fn derivative_bound(&self, t0: f64, t1: f64) -> f64;

    /// Whether the map is non-decreasing on `range`.
    ///
    /// The default samples the derivative and the value; shapes with a closed form override it.
    fn is_monotonic_on(&self, range: Interval) -> bool {
        let mut prev = self.value(range.start);
        for i in 0..=MONOTONIC_SAMPLES {
            let t = range.start + range.length() * (i as f64) / (MONOTONIC_SAMPLES as f64);
            let v = self.value(t);
            if !v.is_finite() || v < prev - 1e-12 || self.derivative(t) < -1e-12 {
                return false;
            }
            prev = v;
        }
        true
    }
}

/// Shared handle on a time parameterization.
pub type TimeParameterizationPtr = Arc<dyn TimeParameterization>;

/// Image of `range` through `tp`.
pub fn param_range(tp: &dyn TimeParameterization, range: Interval) -> KinoResult<Interval> {
    Interval::new(tp.value(range.start), tp.value(range.end))
}

/// Fail with a precondition error unless `tp` is monotonic on `range`.
pub fn ensure_monotonic(tp: &dyn TimeParameterization, range: Interval) -> KinoResult<()> {
    if tp.is_monotonic_on(range) {
        Ok(())
    } else {
        Err(KinoError::precondition(format!(
            "time parameterization {tp:?} is not monotonic on {range}"
        )))
    }
}

/// `s = scale * t + offset`.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Linear {
    scale: f64,
    offset: f64,
}

impl Linear {
    pub fn new(scale: f64, offset: f64) -> KinoResult<Self> {
        if !scale.is_finite() || !offset.is_finite() {
            return Err(KinoError::validation("linear timing coefficients must be finite"));
        }
        if scale < 0.0 {
            return Err(KinoError::validation("linear timing scale must be >= 0"));
        }
        Ok(Self { scale, offset })
    }

    /// Affine map sending `from` onto `to`.
    pub fn between(from: Interval, to: Interval) -> KinoResult<Self> {
        if from.is_degenerate() {
            return Err(KinoError::validation(
                "cannot build a linear timing from a degenerate interval",
            ));
        }
        let scale = to.length() / from.length();
        Self::new(scale, to.start - scale * from.start)
    }
}

impl TimeParameterization for Linear {
    fn value(&self, t: f64) -> f64 {
        self.scale * t + self.offset
    }

    fn derivative(&self, _t: f64) -> f64 {
        self.scale
    }

    fn derivative_bound(&self, _t0: f64, _t1: f64) -> f64 {
        self.scale
    }

    fn is_monotonic_on(&self, _range: Interval) -> bool {
        self.scale >= 0.0
    }
}

/// `s = a0 + a1 t + a2 t² + ...`.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Polynomial {
    coefficients: Vec<f64>,
}

impl Polynomial {
    /// Coefficients in increasing degree order.
    pub fn new(coefficients: Vec<f64>) -> KinoResult<Self> {
        if coefficients.is_empty() {
            return Err(KinoError::validation("polynomial needs at least one coefficient"));
        }
        if coefficients.iter().any(|c| !c.is_finite()) {
            return Err(KinoError::validation("polynomial coefficients must be finite"));
        }
        Ok(Self { coefficients })
    }

    /// Cubic with zero end velocities mapping `time` onto `param` (rest-to-rest timing).
    pub fn cubic_rest_to_rest(time: Interval, param: Interval) -> KinoResult<Self> {
        if time.is_degenerate() {
            return Err(KinoError::validation("rest-to-rest timing needs a non-empty time range"));
        }
        // s(u) = p0 + d (3u² - 2u³) with u = (t - t0) / T, expanded in t.
        let (t0, tt) = (time.start, time.length());
        let (p0, d) = (param.start, param.length());
        let a = 3.0 * d / (tt * tt);
        let b = -2.0 * d / (tt * tt * tt);
        // Expand a (t - t0)² + b (t - t0)³.
        let c0 = p0 + a * t0 * t0 - b * t0 * t0 * t0;
        let c1 = -2.0 * a * t0 + 3.0 * b * t0 * t0;
        let c2 = a - 3.0 * b * t0;
        let c3 = b;
        Self::new(vec![c0, c1, c2, c3])
    }

    pub fn coefficients(&self) -> &[f64] {
        &self.coefficients
    }
}

/// Horner evaluation, coefficients in increasing degree order.
fn horner(coefficients: &[f64], t: f64) -> f64 {
    coefficients.iter().rev().fold(0.0, |acc, c| acc * t + c)
}

fn differentiate(coefficients: &[f64]) -> Vec<f64> {
    coefficients
        .iter()
        .enumerate()
        .skip(1)
        .map(|(k, c)| (k as f64) * c)
        .collect()
}

/// Real roots of a polynomial inside `[a, b]`.
///
/// The roots of the derivative split `[a, b]` into monotone pieces, each holding at most one
/// root, which is then bracketed by bisection.
fn roots_in(coefficients: &[f64], a: f64, b: f64) -> Vec<f64> {
    let degree = coefficients.iter().rposition(|c| *c != 0.0).unwrap_or(0);
    if degree == 0 {
        return Vec::new();
    }
    let mut knots = vec![a];
    knots.extend(roots_in(&differentiate(&coefficients[..=degree]), a, b));
    knots.push(b);

    let mut roots = Vec::new();
    for w in knots.windows(2) {
        let (mut lo, mut hi) = (w[0], w[1]);
        let (flo, fhi) = (horner(coefficients, lo), horner(coefficients, hi));
        if flo == 0.0 {
            roots.push(lo);
            continue;
        }
        if flo.signum() == fhi.signum() {
            continue;
        }
        for _ in 0..80 {
            let mid = 0.5 * (lo + hi);
            if horner(coefficients, mid).signum() == flo.signum() {
                lo = mid;
            } else {
                hi = mid;
            }
        }
        roots.push(0.5 * (lo + hi));
    }
    roots
}

impl TimeParameterization for Polynomial {
    fn value(&self, t: f64) -> f64 {
        horner(&self.coefficients, t)
    }

    fn derivative(&self, t: f64) -> f64 {
        self.coefficients
            .iter()
            .enumerate()
            .skip(1)
            .rev()
            .fold(0.0, |acc, (k, c)| acc * t + (k as f64) * c)
    }

    /// Exact: the derivative is smallest at an end of `range` or at one of its critical points.
    fn is_monotonic_on(&self, range: Interval) -> bool {
        let slope = differentiate(&self.coefficients);
        let curvature = differentiate(&slope);
        roots_in(&curvature, range.start, range.end)
            .into_iter()
            .chain([range.start, range.end])
            .all(|t| horner(&slope, t) >= -1e-12)
    }

    fn derivative_bound(&self, t0: f64, t1: f64) -> f64 {
        let m = t0.abs().max(t1.abs());
        self.coefficients
            .iter()
            .enumerate()
            .skip(1)
            .map(|(k, c)| (k as f64) * c.abs() * m.powi(k as i32 - 1))
            .sum()
    }
}

/// Maps `time` onto `param` through an easing curve.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Eased {
    ease: Ease,
    time: Interval,
    param: Interval,
}

impl Eased {
    pub fn new(ease: Ease, time: Interval, param: Interval) -> KinoResult<Self> {
        if time.is_degenerate() {
            return Err(KinoError::validation("eased timing needs a non-empty time range"));
        }
        Ok(Self { ease, time, param })
    }

    fn normalized(&self, t: f64) -> f64 {
        (t - self.time.start) / self.time.length()
    }

    fn gain(&self) -> f64 {
        self.param.length() / self.time.length()
    }
}

impl TimeParameterization for Eased {
    fn value(&self, t: f64) -> f64 {
        self.param.start + self.param.length() * self.ease.apply(self.normalized(t))
    }

    fn derivative(&self, t: f64) -> f64 {
        self.gain() * self.ease.derivative(self.normalized(t))
    }

    fn derivative_bound(&self, t0: f64, t1: f64) -> f64 {
        self.gain() * self.ease.derivative_bound(self.normalized(t0), self.normalized(t1))
    }

    fn is_monotonic_on(&self, _range: Interval) -> bool {
        true
    }
}

/// Timing of a reversed path: `s(t) = p0 + p1 - inner(t0 + t1 - t)`.
///
/// Increasing whenever `inner` is, so the reversed path keeps a valid parameter interval.
#[derive(Clone, Debug)]
pub struct ReversedTiming {
    inner: TimeParameterizationPtr,
    time: Interval,
    param: Interval,
}

impl ReversedTiming {
    pub fn new(inner: TimeParameterizationPtr, time: Interval) -> KinoResult<Self> {
        let param = param_range(inner.as_ref(), time)?;
        Ok(Self { inner, time, param })
    }

    fn mirror(&self, t: f64) -> f64 {
        self.time.start + self.time.end - t
    }
}

impl TimeParameterization for ReversedTiming {
    fn value(&self, t: f64) -> f64 {
        self.param.start + self.param.end - self.inner.value(self.mirror(t))
    }

    fn derivative(&self, t: f64) -> f64 {
        self.inner.derivative(self.mirror(t))
    }

    fn derivative_bound(&self, t0: f64, t1: f64) -> f64 {
        self.inner.derivative_bound(self.mirror(t1), self.mirror(t0))
    }

    fn is_monotonic_on(&self, range: Interval) -> bool {
        match Interval::new(self.mirror(range.end), self.mirror(range.start)) {
            Ok(mirrored) => self.inner.is_monotonic_on(mirrored),
            Err(_) => false,
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/time/parameterization.rs"]
mod tests;
