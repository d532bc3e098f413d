use std::fmt;
use std::sync::Arc;

use crate::foundation::error::{KinoError, KinoResult};
use crate::foundation::math::Matrix;

/// Vector-valued function of a configuration with a Jacobian, driving constraint projection.
pub trait DifferentiableFunction: fmt::Debug + Send + Sync {
    fn name(&self) -> &str;

    /// Size of the configuration vector the function reads.
    fn input_size(&self) -> usize;

    /// Number of Jacobian columns (robot DOF).
    fn input_derivative_size(&self) -> usize {
        self.input_size()
    }

    /// Size of the value written by [`DifferentiableFunction::compute`].
    fn output_size(&self) -> usize;

    /// Size of the tangent space of the output (Jacobian rows).
    fn output_derivative_size(&self) -> usize {
        self.output_size()
    }

    fn compute(&self, q: &[f64], out: &mut [f64]);

    /// Jacobian, `output_derivative_size × input_derivative_size`.
    fn jacobian(&self, q: &[f64], out: &mut Matrix);

    /// `out = value ⊖ rhs` in the output tangent space. Plain subtraction by default.
    fn difference(&self, value: &[f64], rhs: &[f64], out: &mut [f64]) {
        for ((o, v), r) in out.iter_mut().zip(value).zip(rhs) {
            *o = v - r;
        }
    }
}

/// Shared handle on a differentiable function.
pub type DifferentiableFunctionPtr = Arc<dyn DifferentiableFunction>;

/// `f(q) = A q + b`, with a constant Jacobian `A`.
#[derive(Clone, Debug)]
pub struct AffineFunction {
    name: String,
    a: Matrix,
    b: Vec<f64>,
}

impl AffineFunction {
    pub fn new(name: impl Into<String>, a: Matrix, b: Vec<f64>) -> KinoResult<Self> {
        if a.rows() != b.len() {
            return Err(KinoError::validation(format!(
                "affine function: matrix has {} rows but offset has {} entries",
                a.rows(),
                b.len()
            )));
        }
        Ok(Self {
            name: name.into(),
            a,
            b,
        })
    }
}

impl DifferentiableFunction for AffineFunction {
    fn name(&self) -> &str {
        &self.name
    }

    fn input_size(&self) -> usize {
        self.a.cols()
    }

    fn output_size(&self) -> usize {
        self.a.rows()
    }

    fn compute(&self, q: &[f64], out: &mut [f64]) {
        self.a.mul_vec_into(q, out);
        for (o, b) in out.iter_mut().zip(&self.b) {
            *o += b;
        }
    }

    fn jacobian(&self, _q: &[f64], out: &mut Matrix) {
        out.set_block(0, 0, &self.a);
    }
}

#[cfg(test)]
#[path = "../../tests/unit/constraints/function.rs"]
mod tests;
