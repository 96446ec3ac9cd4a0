/////////////////////////////////////////////////////////////////////////////////////////////
//
// Reconstructs a surface from its gradient field by solving a rank deficient Sylvester equation.
//
// Created on: 15 Nov 2025     Author: Daniel Owen
//
// Copyright (c) 2025, Maptek Pty Ltd. All rights reserved. Licensed under the MIT License.
//
/////////////////////////////////////////////////////////////////////////////////////////////

//! # sylvester
//!
//! Global least-squares surface reconstruction, following `1`.
//!
//! Given derivative operators `A` (rows, `y`) and `B` (columns, `x`), the
//! surface `Φ` minimising
//!
//! `‖A Φ − Zy‖²_F + ‖Φ Bᵗ − Zx‖²_F`
//!
//! satisfies the normal equations `AᵗA Φ + Φ BᵗB = Aᵗ Zy + Zx B`. Both normal
//! matrices share the constant null vector, so the equation is singular.
//! Householder reflections rotate the null vectors onto the first coordinate
//! axes, leaving a decoupled first row, first column and a regular
//! `(m − 1) x (n − 1)` Sylvester block.
//!
//! # References
//! 1. M. Harker and P. O'Leary. Least squares surface reconstruction from
//!    measured gradient fields. IEEE CVPR, 2008.

use crate::{
    diff_local::diff_local,
    error::{G2sError, G2sResult},
    linalg::{solve_normal_sylvester, FullRankSvd},
    progress::ProgressSink,
};
use faer::Mat;
use std::sync::Arc;

/// Default window length for the operators built by [`g2s`].
pub const DEFAULT_SUPPORT_LENGTH: usize = 3;

/// Scaled Householder vector `w` for the null vector `u`.
///
/// `I − w wᵗ` reflects `u` onto a multiple of `e1`. The sign of the shift
/// follows `u[0]` so the vector never cancels.
fn householder_vector(u: &[f64], label: &'static str) -> G2sResult<Mat<f64>> {
    let norm = u.iter().map(|x| x * x).sum::<f64>().sqrt();
    if !(norm > 0.0) || !norm.is_finite() {
        return Err(G2sError::invalid(format!(
            "the {} null vector must be finite and non-zero",
            label
        )));
    }

    let mut w = Mat::<f64>::from_fn(u.len(), 1, |i, _| u[i]);
    let shift = if u[0] < 0.0 { -norm } else { norm };
    w[(0, 0)] += shift;

    let w_norm = w.norm_l2();
    let scale = std::f64::consts::SQRT_2 / w_norm;
    w.col_mut(0).iter_mut().for_each(|x| *x *= scale);

    Ok(w)
}

fn check_shape(
    what: &'static str,
    mat: &Mat<f64>,
    expected: (usize, usize),
) -> G2sResult<()> {
    if mat.shape() != expected {
        return Err(G2sError::DimensionMismatch {
            what,
            expected,
            found: mat.shape(),
        });
    }
    Ok(())
}

fn check_finite(what: &'static str, mat: &Mat<f64>) -> G2sResult<()> {
    for j in 0..mat.ncols() {
        for i in 0..mat.nrows() {
            if !mat[(i, j)].is_finite() {
                return Err(G2sError::invalid(format!(
                    "{} has a non-finite entry at ({}, {})",
                    what, i, j
                )));
            }
        }
    }
    Ok(())
}

/// Solves the semi-definite Sylvester equation
///
/// `AᵗA Φ + Φ BᵗB − Aᵗ F − G B = 0`
///
/// where `A u = 0` and `B v = 0`.
///
/// # Arguments
/// * `a` - `m x m` operator acting on the rows of `Φ`.
/// * `b` - `n x n` operator acting on the columns of `Φ`.
/// * `f` - `m x n` target for `A Φ` (the `y` gradient).
/// * `g` - `m x n` target for `Φ Bᵗ` (the `x` gradient).
/// * `u` - Null vector of `a`, length `m`.
/// * `v` - Null vector of `b`, length `n`.
///
/// # Returns
/// The solution `Φ`. Any multiple of `u vᵗ` may be added to it.
pub fn g2s_sylvester(
    a: &Mat<f64>,
    b: &Mat<f64>,
    f: &Mat<f64>,
    g: &Mat<f64>,
    u: &[f64],
    v: &[f64],
) -> G2sResult<Mat<f64>> {
    let m = u.len();
    let n = v.len();

    if m < 2 || n < 2 {
        return Err(G2sError::invalid(format!(
            "surfaces need at least 2 samples along each axis, got {}x{}",
            m, n
        )));
    }

    check_shape("row operator", a, (m, m))?;
    check_shape("column operator", b, (n, n))?;
    check_shape("y gradient", f, (m, n))?;
    check_shape("x gradient", g, (m, n))?;
    check_finite("y gradient", f)?;
    check_finite("x gradient", g)?;

    let u = householder_vector(u, "row")?;
    let v = householder_vector(v, "column")?;

    // Apply the reflections
    let a = a - (a * &u) * u.transpose();
    let b = b - (b * &v) * v.transpose();
    let f = f - (f * &v) * v.transpose();
    let g = g - &u * (u.transpose() * g);

    // The first column of each deflated operator is (numerically) zero
    let a1 = a.subcols(1, m - 1).to_owned();
    let b1 = b.subcols(1, n - 1).to_owned();
    let svd_a = FullRankSvd::try_new(&a1, "deflated row operator")?;
    let svd_b = FullRankSvd::try_new(&b1, "deflated column operator")?;

    let mut phi = Mat::<f64>::zeros(m, n);

    // First row: Φ[0, 1:] B1ᵗ = G[0, :]
    let g0 = Mat::<f64>::from_fn(n, 1, |j, _| g[(0, j)]);
    let row = svd_b.solve_lstsq(&g0);
    for j in 0..n - 1 {
        phi[(0, j + 1)] = row[(j, 0)];
    }

    // First column: A1 Φ[1:, 0] = F[:, 0]
    let f0 = Mat::<f64>::from_fn(m, 1, |i, _| f[(i, 0)]);
    let col = svd_a.solve_lstsq(&f0);
    for i in 0..m - 1 {
        phi[(i + 1, 0)] = col[(i, 0)];
    }

    // Regular block
    let rhs = a1.transpose() * f.subcols(1, n - 1) + g.subrows(1, m - 1) * &b1;
    let block = solve_normal_sylvester(&svd_a, &svd_b, &rhs)?;
    for j in 0..n - 1 {
        for i in 0..m - 1 {
            phi[(i + 1, j + 1)] = block[(i, j)];
        }
    }

    // Undo the reflections
    let phi = &phi - &u * (u.transpose() * &phi);
    let phi = &phi - (&phi * &v) * v.transpose();

    Ok(phi)
}

/// Computes the global least-squares reconstruction of a surface from its
/// gradient field.
///
/// # Arguments
/// * `x` - Column support, length `n`.
/// * `y` - Row support, length `m`.
/// * `zx` - `m x n` gradient along `x`.
/// * `zy` - `m x n` gradient along `y`.
/// * `support_length` - Window length of the local derivative operators.
///   [`DEFAULT_SUPPORT_LENGTH`] is the usual choice.
/// * `progress` - Optional sink for operator warnings.
///
/// # Returns
/// An `m x n` surface, unique up to an additive constant.
///
/// # Example
/// ```
/// use faer::Mat;
/// use ferreus_g2s::{g2s, linspace};
///
/// let x = linspace(0.0, 1.0, 8);
/// let y = linspace(0.0, 2.0, 6);
/// let zx = Mat::<f64>::from_fn(6, 8, |_, _| 1.0);
/// let zy = Mat::<f64>::zeros(6, 8);
///
/// let z = g2s(&x, &y, &zx, &zy, 3, &None).unwrap();
/// assert!(((z[(0, 7)] - z[(0, 0)]) - 1.0).abs() < 1e-10);
/// ```
pub fn g2s(
    x: &[f64],
    y: &[f64],
    zx: &Mat<f64>,
    zy: &Mat<f64>,
    support_length: usize,
    progress: &Option<Arc<dyn ProgressSink>>,
) -> G2sResult<Mat<f64>> {
    if zx.shape() != zy.shape() {
        return Err(G2sError::DimensionMismatch {
            what: "gradient components",
            expected: zx.shape(),
            found: zy.shape(),
        });
    }
    let (m, n) = zx.shape();
    if (m, n) != (y.len(), x.len()) {
        return Err(G2sError::DimensionMismatch {
            what: "support vectors",
            expected: (m, n),
            found: (y.len(), x.len()),
        });
    }
    if m < 2 || n < 2 {
        return Err(G2sError::invalid(format!(
            "surfaces need at least 2 samples along each axis, got {}x{}",
            m, n
        )));
    }

    let dx = diff_local(x, support_length, support_length, progress)?;
    let dy = diff_local(y, support_length, support_length, progress)?;

    g2s_sylvester(&dy, &dx, zy, zx, &vec![1.0; m], &vec![1.0; n])
}
