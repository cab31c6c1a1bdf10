//! Dense linear algebra.
//!
//! Calibration systems are small and dense. [`solve_linear_system`] solves
//! them by LU decomposition with partial pivoting; explicit inversion is kept
//! for diagnostics.

use nalgebra::{DMatrix, DVector};

use crate::error::{MathError, MathResult};

/// Solves `A x = b` by LU decomposition.
///
/// # Errors
///
/// `DimensionMismatch` for non-square `A` or a right-hand side of the wrong
/// length, `SingularMatrix` if `A` is singular or the solution is not finite.
pub fn solve_linear_system(a: &DMatrix<f64>, b: &DVector<f64>) -> MathResult<DVector<f64>> {
    if a.nrows() != a.ncols() || a.nrows() != b.len() {
        return Err(MathError::dimension_mismatch(a.nrows(), a.ncols(), b.len(), 1));
    }
    if a.iter().chain(b.iter()).any(|v| !v.is_finite()) {
        return Err(MathError::SingularMatrix);
    }

    let lu = a.clone().lu();
    if !lu.is_invertible() {
        return Err(MathError::SingularMatrix);
    }
    let x = lu.solve(b).ok_or(MathError::SingularMatrix)?;
    if x.iter().any(|v| !v.is_finite()) {
        return Err(MathError::SingularMatrix);
    }
    Ok(x)
}

/// Inverts a square matrix.
pub fn invert(a: &DMatrix<f64>) -> MathResult<DMatrix<f64>> {
    if a.nrows() != a.ncols() {
        return Err(MathError::dimension_mismatch(a.nrows(), a.ncols(), a.ncols(), a.nrows()));
    }
    let inverse = a.clone().try_inverse().ok_or(MathError::SingularMatrix)?;
    if inverse.iter().any(|v| !v.is_finite()) {
        return Err(MathError::SingularMatrix);
    }
    Ok(inverse)
}

/// Row vector times matrix: `out[j] = sum_i v[i] * m[i][j]`.
pub fn matrix_product(v: &[f64], m: &DMatrix<f64>) -> MathResult<Vec<f64>> {
    if v.len() != m.nrows() {
        return Err(MathError::dimension_mismatch(1, v.len(), m.nrows(), m.ncols()));
    }
    Ok((0..m.ncols())
        .map(|j| v.iter().enumerate().map(|(i, vi)| vi * m[(i, j)]).sum())
        .collect())
}

/// Solves a tridiagonal system with the Thomas algorithm.
///
/// ```text
/// | b[0]  c[0]                 | | x[0]   |   | d[0]   |
/// | a[0]  b[1]  c[1]           | | x[1]   |   | d[1]   |
/// |       a[1]  b[2]  ...      | | ...    | = | ...    |
/// |             a[n-2] b[n-1]  | | x[n-1] |   | d[n-1] |
/// ```
///
/// `a` and `c` have length `n - 1`; `b` and `d` have length `n`.
pub fn solve_tridiagonal(a: &[f64], b: &[f64], c: &[f64], d: &[f64]) -> MathResult<Vec<f64>> {
    let n = b.len();
    if n == 0 {
        return Ok(vec![]);
    }
    if a.len() != n - 1 || c.len() != n - 1 || d.len() != n {
        return Err(MathError::invalid_input(
            "Tridiagonal system has inconsistent dimensions",
        ));
    }

    let mut c_prime = vec![0.0; n];
    let mut d_prime = vec![0.0; n];

    if b[0].abs() < 1e-300 {
        return Err(MathError::SingularMatrix);
    }
    if n > 1 {
        c_prime[0] = c[0] / b[0];
    }
    d_prime[0] = d[0] / b[0];

    for i in 1..n {
        let denom = b[i] - a[i - 1] * c_prime[i - 1];
        if denom.abs() < 1e-300 {
            return Err(MathError::SingularMatrix);
        }
        if i < n - 1 {
            c_prime[i] = c[i] / denom;
        }
        d_prime[i] = (d[i] - a[i - 1] * d_prime[i - 1]) / denom;
    }

    let mut x = vec![0.0; n];
    x[n - 1] = d_prime[n - 1];
    for i in (0..n - 1).rev() {
        x[i] = d_prime[i] - c_prime[i] * x[i + 1];
    }
    Ok(x)
}
