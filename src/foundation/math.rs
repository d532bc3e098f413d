//! Small dense linear algebra for constraint projection.
//!
//! Projection problems have a handful of rows and at most a few dozen columns, so a row-major
//! `Vec<f64>` with Gaussian elimination is all the kernel needs.

use std::ops::{Index, IndexMut};

/// Row-major dense matrix.
#[derive(Clone, Debug, PartialEq)]
pub struct Matrix {
    rows: usize,
    cols: usize,
    data: Vec<f64>,
}

impl Matrix {
    pub fn zeros(rows: usize, cols: usize) -> Self {
        Self {
            rows,
            cols,
            data: vec![0.0; rows * cols],
        }
    }

    pub fn identity(n: usize) -> Self {
        let mut m = Self::zeros(n, n);
        for i in 0..n {
            m[(i, i)] = 1.0;
        }
        m
    }

    /// Build from row slices; every row must have the same length.
    pub fn from_rows(rows: &[&[f64]]) -> Self {
        let cols = rows.first().map_or(0, |r| r.len());
        let mut m = Self::zeros(rows.len(), cols);
        for (i, row) in rows.iter().enumerate() {
            debug_assert_eq!(row.len(), cols);
            m.row_mut(i).copy_from_slice(row);
        }
        m
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    pub fn row(&self, i: usize) -> &[f64] {
        &self.data[i * self.cols..(i + 1) * self.cols]
    }

    pub fn row_mut(&mut self, i: usize) -> &mut [f64] {
        &mut self.data[i * self.cols..(i + 1) * self.cols]
    }

    /// `out = self * x`.
    pub fn mul_vec_into(&self, x: &[f64], out: &mut [f64]) {
        for (i, o) in out.iter_mut().enumerate().take(self.rows) {
            *o = self.row(i).iter().zip(x).map(|(a, b)| a * b).sum();
        }
    }

    /// Copy `block` into `self` with its top-left corner at `(row, col)`.
    pub fn set_block(&mut self, row: usize, col: usize, block: &Matrix) {
        for i in 0..block.rows {
            let dst = &mut self.row_mut(row + i)[col..col + block.cols];
            dst.copy_from_slice(block.row(i));
        }
    }
}

impl Index<(usize, usize)> for Matrix {
    type Output = f64;

    fn index(&self, (r, c): (usize, usize)) -> &f64 {
        &self.data[r * self.cols + c]
    }
}

impl IndexMut<(usize, usize)> for Matrix {
    fn index_mut(&mut self, (r, c): (usize, usize)) -> &mut f64 {
        &mut self.data[r * self.cols + c]
    }
}

/// Solve `(JᵀJ + λI) dx = -Jᵀe` for the damped Gauss-Newton step.
///
/// Only the columns listed in `active` take part; `dx` entries for the other columns are left
/// at zero. Returns `None` when the normal matrix is numerically singular.
pub fn damped_least_squares_step(
    j: &Matrix,
    e: &[f64],
    lambda: f64,
    active: &[usize],
) -> Option<Vec<f64>> {
    let n = active.len();
    let mut a = Matrix::zeros(n, n);
    let mut b = vec![0.0; n];

    for (p, &cp) in active.iter().enumerate() {
        for (q, &cq) in active.iter().enumerate().skip(p) {
            let mut s = 0.0;
            for r in 0..j.rows() {
                s += j[(r, cp)] * j[(r, cq)];
            }
            a[(p, q)] = s;
            a[(q, p)] = s;
        }
        a[(p, p)] += lambda;
        let mut s = 0.0;
        for r in 0..j.rows() {
            s += j[(r, cp)] * e[r];
        }
        b[p] = -s;
    }

    let reduced = solve_in_place(&mut a, &mut b)?;
    let mut dx = vec![0.0; j.cols()];
    for (p, &c) in active.iter().enumerate() {
        dx[c] = reduced[p];
    }
    Some(dx)
}

/// Gaussian elimination with partial pivoting. Consumes `a` and `b`.
pub fn solve_in_place(a: &mut Matrix, b: &mut [f64]) -> Option<Vec<f64>> {
    let n = a.rows();
    if a.cols() != n || b.len() != n {
        return None;
    }

    for k in 0..n {
        let mut pivot = k;
        let mut best = a[(k, k)].abs();
        for i in (k + 1)..n {
            let v = a[(i, k)].abs();
            if v > best {
                best = v;
                pivot = i;
            }
        }
        if best < 1e-12 {
            return None;
        }
        if pivot != k {
            for c in 0..n {
                let tmp = a[(k, c)];
                a[(k, c)] = a[(pivot, c)];
                a[(pivot, c)] = tmp;
            }
            b.swap(k, pivot);
        }

        for i in (k + 1)..n {
            let f = a[(i, k)] / a[(k, k)];
            if f == 0.0 {
                continue;
            }
            for c in k..n {
                a[(i, c)] -= f * a[(k, c)];
            }
            b[i] -= f * b[k];
        }
    }

    let mut x = vec![0.0; n];
    for i in (0..n).rev() {
        let mut s = b[i];
        for c in (i + 1)..n {
            s -= a[(i, c)] * x[c];
        }
        x[i] = s / a[(i, i)];
    }
    Some(x)
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/math.rs"]
mod tests;
