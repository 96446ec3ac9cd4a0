/////////////////////////////////////////////////////////////////////////////////////////////
//
// Adds helper linear algebra routines: numerical rank, SVD-based least squares and Sylvester solves.
//
// Created on: 15 Nov 2025     Author: Daniel Owen
//
// Copyright (c) 2025, Maptek Pty Ltd. All rights reserved. Licensed under the MIT License.
//
/////////////////////////////////////////////////////////////////////////////////////////////

//! # linalg
//!
//! Helper linear algebra functionality.
//!
//! The deflated gradient operators are tall, full column rank matrices. A
//! single singular value decomposition of each one supplies both the
//! least-squares solves for the first row and column of the surface and the
//! diagonalisation of the normal matrices `AᵗA` needed by the Sylvester solve
//! (the symmetric special case of Bartels-Stewart, where the Schur form is
//! diagonal).
//!
//! # References
//! 1. R. H. Bartels and G. W. Stewart. Solution of the matrix equation AX + XB = C.
//!    Comm. ACM, 15(9):820–826, 1972.

use crate::error::{G2sError, G2sResult};
use faer::Mat;

/// Relative tolerance used to decide whether a singular value is zero,
/// matching the usual `max(m, n) * eps * sigma_max` convention.
#[inline]
fn rank_tolerance(nrows: usize, ncols: usize, sigma_max: f64) -> f64 {
    (nrows.max(ncols) as f64) * f64::EPSILON * sigma_max
}

/// Singular values of `a` in non-increasing order.
pub fn singular_values(a: &Mat<f64>) -> G2sResult<Vec<f64>> {
    if a.nrows() == 0 || a.ncols() == 0 {
        return Ok(Vec::new());
    }
    let svd = a
        .svd()
        .map_err(|e| G2sError::singular(format!("SVD failed to converge: {:?}", e)))?;

    Ok(svd.S().column_vector().iter().cloned().collect())
}

/// Numerical rank of `a`: the number of singular values above
/// `max(m, n) * eps * sigma_max`.
pub fn numerical_rank(a: &Mat<f64>) -> G2sResult<usize> {
    let sigma = singular_values(a)?;
    let sigma_max = sigma.iter().cloned().fold(0.0_f64, f64::max);
    if sigma_max == 0.0 {
        return Ok(0);
    }
    let tol = rank_tolerance(a.nrows(), a.ncols(), sigma_max);

    Ok(sigma.iter().filter(|s| **s > tol).count())
}

/// Thin SVD of a tall matrix with full column rank, `A = U Σ Vᵗ`.
///
/// Construction fails with [`G2sError::SingularConfiguration`] when the matrix
/// is wider than it is tall or any singular value falls below the rank
/// tolerance.
#[allow(non_snake_case)]
pub struct FullRankSvd {
    U: Mat<f64>,
    sigma: Vec<f64>,
    V: Mat<f64>,
}

#[allow(non_snake_case)]
impl FullRankSvd {
    pub fn try_new(a: &Mat<f64>, label: &str) -> G2sResult<Self> {
        let (m, n) = a.shape();
        if n == 0 || m < n {
            return Err(G2sError::singular(format!(
                "{} is {}x{}; expected a tall matrix with at least one column",
                label, m, n
            )));
        }

        let svd = a
            .svd()
            .map_err(|e| G2sError::singular(format!("SVD of {} failed: {:?}", label, e)))?;

        let sigma: Vec<f64> = svd.S().column_vector().iter().cloned().collect();
        let sigma_max = sigma.iter().cloned().fold(0.0_f64, f64::max);
        let tol = rank_tolerance(m, n, sigma_max);

        if let Some(k) = sigma.iter().position(|s| !(*s > tol)) {
            return Err(G2sError::singular(format!(
                "{} is rank deficient: singular value {} is {:e} (tolerance {:e})",
                label, k, sigma[k], tol
            )));
        }

        Ok(Self {
            U: svd.U().subcols(0, n).to_owned(),
            sigma,
            V: svd.V().to_owned(),
        })
    }

    /// Minimum-residual solution of `A X = B`, i.e. `X = V Σ⁻¹ Uᵗ B`.
    pub fn solve_lstsq(&self, rhs: &Mat<f64>) -> Mat<f64> {
        let mut projected = self.U.transpose() * rhs;
        for (i, s) in self.sigma.iter().enumerate() {
            projected.row_mut(i).iter_mut().for_each(|x| *x /= s);
        }
        &self.V * &projected
    }

    /// Right singular vectors, which are also the eigenvectors of `AᵗA`.
    pub fn V(&self) -> &Mat<f64> {
        &self.V
    }

    /// Eigenvalues of `AᵗA`, the squared singular values.
    pub fn gram_eigenvalues(&self) -> Vec<f64> {
        self.sigma.iter().map(|s| s * s).collect()
    }
}

/// Solves the symmetric positive definite Sylvester equation
///
/// `(AᵗA) X + X (BᵗB) = C`
///
/// given the SVDs of `A` and `B`. Both normal matrices are diagonalised by
/// their right singular vectors, so the transformed equation decouples into
/// `X̂_ij (λ_i + μ_j) = Ĉ_ij`.
pub fn solve_normal_sylvester(
    a: &FullRankSvd,
    b: &FullRankSvd,
    c: &Mat<f64>,
) -> G2sResult<Mat<f64>> {
    let va = a.V();
    let vb = b.V();

    if c.nrows() != va.nrows() || c.ncols() != vb.nrows() {
        return Err(G2sError::DimensionMismatch {
            what: "Sylvester right-hand side",
            expected: (va.nrows(), vb.nrows()),
            found: c.shape(),
        });
    }

    let lambda = a.gram_eigenvalues();
    let mu = b.gram_eigenvalues();

    let c_hat = va.transpose() * c * vb;

    let mut x_hat = Mat::<f64>::zeros(c.nrows(), c.ncols());
    for j in 0..c.ncols() {
        for i in 0..c.nrows() {
            let denom = lambda[i] + mu[j];
            if !(denom > 0.0) {
                return Err(G2sError::singular(format!(
                    "Sylvester eigenvalue sum at ({}, {}) is {:e}",
                    i, j, denom
                )));
            }
            x_hat[(i, j)] = c_hat[(i, j)] / denom;
        }
    }

    Ok(va * &x_hat * vb.transpose())
}

#[cfg(test)]
mod tests {
    use super::*;
    use equator::assert;
    use faer::{utils::approx::*, Mat};

    /// Deterministic tall matrix with full column rank.
    fn make_tall(m: usize, n: usize) -> Mat<f64> {
        Mat::from_fn(m, n, |i, j| {
            let x = (i as f64 + 1.0) * (j as f64 + 2.0);
            (x.sin() + 2.0 * x.cos()) / (1.0 + (i + j + 1) as f64) + if i == j { 2.0 } else { 0.0 }
        })
    }

    #[test]
    fn rank_of_identity_and_rank_one() {
        let eye = Mat::<f64>::identity(5, 5);
        assert_eq!(numerical_rank(&eye).unwrap(), 5);

        let outer = Mat::<f64>::from_fn(4, 6, |i, j| (i as f64 + 1.0) * (j as f64 - 2.5));
        assert_eq!(numerical_rank(&outer).unwrap(), 1);

        let zeros = Mat::<f64>::zeros(3, 3);
        assert_eq!(numerical_rank(&zeros).unwrap(), 0);
    }

    #[test]
    fn lstsq_matches_consistent_system() {
        let a = make_tall(7, 4);
        let x_true = Mat::<f64>::from_fn(4, 2, |i, j| (i + 2 * j) as f64 - 1.5);
        let b = &a * &x_true;

        let svd = FullRankSvd::try_new(&a, "a").unwrap();
        let x = svd.solve_lstsq(&b);

        let approx_eq = CwiseMat(ApproxEq::eps() * 1024.0);
        assert!(&x ~ &x_true);
    }

    #[test]
    fn lstsq_residual_is_orthogonal_to_range() {
        let a = make_tall(9, 3);
        let b = Mat::<f64>::from_fn(9, 1, |i, _| ((i * i) as f64).cos());

        let svd = FullRankSvd::try_new(&a, "a").unwrap();
        let x = svd.solve_lstsq(&b);
        let residual = &b - &a * &x;
        let normal = a.transpose() * &residual;

        assert!(normal.norm_max() < 1e-10);
    }

    #[test]
    fn rank_deficient_matrix_is_rejected() {
        let mut a = make_tall(6, 3);
        let first = a.col(0).to_owned();
        a.col_mut(2).copy_from(&first);

        let err = FullRankSvd::try_new(&a, "dup").err().unwrap();
        assert!(matches!(err, G2sError::SingularConfiguration { .. }));
    }

    #[test]
    fn wide_matrix_is_rejected() {
        let a = make_tall(3, 5);
        assert!(FullRankSvd::try_new(&a, "wide").is_err());
    }

    #[test]
    fn sylvester_solution_satisfies_equation() {
        let a = make_tall(8, 5);
        let b = make_tall(6, 4);
        let c = Mat::<f64>::from_fn(5, 4, |i, j| (i as f64 - j as f64) * 0.25 + 1.0);

        let sa = FullRankSvd::try_new(&a, "a").unwrap();
        let sb = FullRankSvd::try_new(&b, "b").unwrap();
        let x = solve_normal_sylvester(&sa, &sb, &c).unwrap();

        let ata = a.transpose() * &a;
        let btb = b.transpose() * &b;
        let lhs = &ata * &x + &x * &btb;

        let approx_eq = CwiseMat(ApproxEq::eps() * 4096.0);
        assert!(&lhs ~ &c);
    }

    #[test]
    fn sylvester_rejects_mismatched_rhs() {
        let sa = FullRankSvd::try_new(&make_tall(5, 3), "a").unwrap();
        let sb = FullRankSvd::try_new(&make_tall(5, 2), "b").unwrap();
        let c = Mat::<f64>::zeros(2, 3);
        let err = solve_normal_sylvester(&sa, &sb, &c).err().unwrap();
        assert!(matches!(err, G2sError::DimensionMismatch { .. }));
    }
}
