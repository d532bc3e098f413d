//! Planar rigid-frame constraints.

use std::f64::consts::{PI, TAU};

use kurbo::{Affine, Vec2};

use crate::constraints::function::DifferentiableFunction;
use crate::foundation::error::{KinoError, KinoResult};
use crate::foundation::math::Matrix;

/// Wrap an angle into `(-π, π]`.
pub fn wrap_angle(a: f64) -> f64 {
    let w = (a + PI).rem_euclid(TAU) - PI;
    if w <= -PI { w + TAU } else { w }
}

/// Right multiplication of a planar pose by a constant rigid transform.
///
/// Reads the pose `(x, y, θ)` stored at `offset` in the configuration and returns
/// `pose(x, y, θ) · M`, again as `(x, y, θ)`. Paired with an equality comparison this states
/// "the frame offset by `M` sits at a constant pose".
#[derive(Clone, Debug)]
pub struct RightTimesFrame {
    name: String,
    input_size: usize,
    offset: usize,
    translation: Vec2,
    rotation: f64,
}

impl RightTimesFrame {
    pub fn new(
        name: impl Into<String>,
        input_size: usize,
        offset: usize,
        m: Affine,
    ) -> KinoResult<Self> {
        if offset + 3 > input_size {
            return Err(KinoError::validation(format!(
                "pose at offset {offset} does not fit a configuration of size {input_size}"
            )));
        }
        let [a, b, c, d, e, f] = m.as_coeffs();
        let rigid = (a - d).abs() < 1e-9
            && (b + c).abs() < 1e-9
            && (a * d - b * c - 1.0).abs() < 1e-9;
        if !rigid {
            return Err(KinoError::validation(
                "frame transform must be a rigid motion (rotation + translation)",
            ));
        }
        Ok(Self {
            name: name.into(),
            input_size,
            offset,
            translation: Vec2::new(e, f),
            rotation: b.atan2(a),
        })
    }

    /// Convenience constructor from a translation and an angle.
    pub fn from_pose(
        name: impl Into<String>,
        input_size: usize,
        offset: usize,
        tx: f64,
        ty: f64,
        angle: f64,
    ) -> KinoResult<Self> {
        let m = Affine::translate((tx, ty)) * Affine::rotate(angle);
        Self::new(name, input_size, offset, m)
    }

    pub fn transform(&self) -> Affine {
        Affine::translate(self.translation) * Affine::rotate(self.rotation)
    }
}

impl DifferentiableFunction for RightTimesFrame {
    fn name(&self) -> &str {
        &self.name
    }

    fn input_size(&self) -> usize {
        self.input_size
    }

    fn output_size(&self) -> usize {
        3
    }

    fn compute(&self, q: &[f64], out: &mut [f64]) {
        let (x, y, th) = (q[self.offset], q[self.offset + 1], q[self.offset + 2]);
        let (s, c) = th.sin_cos();
        let t = self.translation;
        out[0] = x + c * t.x - s * t.y;
        out[1] = y + s * t.x + c * t.y;
        out[2] = wrap_angle(th + self.rotation);
    }

    fn jacobian(&self, q: &[f64], out: &mut Matrix) {
        let th = q[self.offset + 2];
        let (s, c) = th.sin_cos();
        let t = self.translation;
        for r in 0..3 {
            out.row_mut(r).fill(0.0);
        }
        let o = self.offset;
        out[(0, o)] = 1.0;
        out[(0, o + 2)] = -s * t.x - c * t.y;
        out[(1, o + 1)] = 1.0;
        out[(1, o + 2)] = c * t.x - s * t.y;
        out[(2, o + 2)] = 1.0;
    }

    fn difference(&self, value: &[f64], rhs: &[f64], out: &mut [f64]) {
        out[0] = value[0] - rhs[0];
        out[1] = value[1] - rhs[1];
        out[2] = wrap_angle(value[2] - rhs[2]);
    }
}

#[cfg(test)]
#[path = "../../tests/unit/constraints/frame.rs"]
mod tests;
