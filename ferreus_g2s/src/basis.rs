/////////////////////////////////////////////////////////////////////////////////////////////
//
// Generates discrete orthonormal polynomial bases, and their derivatives, over arbitrary 1D supports.
//
// Created on: 15 Nov 2025     Author: Daniel Owen
//
// Copyright (c) 2025, Maptek Pty Ltd. All rights reserved. Licensed under the MIT License.
//
/////////////////////////////////////////////////////////////////////////////////////////////

//! # basis
//!
//! Discrete orthonormal polynomials built by a three-term recurrence with
//! complete reorthogonalisation, following `1`. The derivative of every basis
//! column is propagated through the same recurrence, so `dP` is the exact
//! derivative of the polynomial that `P` samples.
//!
//! # References
//! 1. P. O'Leary and M. Harker. An Algebraic Framework for Discrete Basis
//!    Functions in Computer Vision. IEEE ICVGIP, 2008.

use crate::error::{G2sError, G2sResult};
use faer::Mat;

/// Candidates with a norm at or below this value are treated as zero.
pub const DEGENERACY_TOLERANCE: f64 = 1e-10;

/// The nodes over which a basis is generated.
#[derive(Debug, Clone, PartialEq)]
pub enum Support {
    /// `m` evenly spaced nodes on `[-1, 1]`.
    Count(usize),

    /// Explicit, possibly irregularly spaced nodes.
    Points(Vec<f64>),
}

impl Support {
    /// Number of nodes in the support.
    pub fn len(&self) -> usize {
        match self {
            Support::Count(m) => *m,
            Support::Points(x) => x.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The node coordinates.
    pub fn points(&self) -> Vec<f64> {
        match self {
            Support::Count(m) => linspace(-1.0, 1.0, *m),
            Support::Points(x) => x.clone(),
        }
    }
}

impl From<Vec<f64>> for Support {
    fn from(x: Vec<f64>) -> Self {
        Support::Points(x)
    }
}

impl From<&[f64]> for Support {
    fn from(x: &[f64]) -> Self {
        Support::Points(x.to_vec())
    }
}

/// `num` evenly spaced values over `[start, stop]`, both ends included.
pub fn linspace(start: f64, stop: f64, num: usize) -> Vec<f64> {
    match num {
        0 => Vec::new(),
        1 => vec![start],
        _ => {
            let step = (stop - start) / (num - 1) as f64;
            (0..num)
                .map(|i| match i == num - 1 {
                    true => stop,
                    false => start + step * i as f64,
                })
                .collect()
        }
    }
}

/// Coefficients of the three-term recurrence.
///
/// `alphas[k]` is the normalisation applied to column `k`. `betas[1]` is the
/// support mean used to centre the first-order polynomial and `betas[k]`
/// (`k >= 2`) is the projection onto column `k - 2` removed by the recurrence.
#[derive(Debug, Clone, PartialEq)]
pub struct RecurrenceCoefficients {
    pub alphas: Vec<f64>,
    pub betas: Vec<f64>,
}

/// An orthonormal discrete polynomial basis and its derivative.
#[derive(Debug, Clone)]
pub struct DiscreteBasis {
    /// `m x n` matrix whose columns are orthonormal polynomials of
    /// increasing degree sampled on the support.
    pub p: Mat<f64>,

    /// `m x n` matrix of first derivatives of each column of `p`.
    pub dp: Mat<f64>,

    pub recurrence: RecurrenceCoefficients,
}

impl DiscreteBasis {
    /// Number of support nodes.
    pub fn nrows(&self) -> usize {
        self.p.nrows()
    }

    /// Number of basis functions.
    pub fn order(&self) -> usize {
        self.p.ncols()
    }

    /// The `m x m` operator `dP · Pᵗ` that differentiates the least-squares
    /// projection of sampled data onto the basis.
    pub fn differentiation_matrix(&self) -> Mat<f64> {
        &self.dp * self.p.transpose()
    }
}

#[inline]
fn dot(a: &[f64], b: &[f64]) -> f64 {
    a.iter().zip(b.iter()).map(|(x, y)| x * y).sum()
}

#[inline]
fn sum_of_differences(x: &[f64]) -> f64 {
    x.windows(2).map(|w| w[1] - w[0]).sum()
}

/// Generates a set of discrete orthonormal polynomials and their derivatives.
///
/// # Arguments
/// * `support` - The nodes, either an evenly spaced count or explicit points.
/// * `order` - Number of basis functions. Defaults to the support length.
///
/// # Errors
/// * [`G2sError::InvalidConfiguration`] for an empty support, a zero order or
///   an order exceeding the support length.
/// * [`G2sError::NumericalDegeneracy`] when a basis candidate has zero norm,
///   which happens when the support contains duplicate nodes.
///
/// # Example
/// ```
/// use ferreus_g2s::{dop, Support};
///
/// let basis = dop(&Support::Count(7), None).unwrap();
/// assert_eq!(basis.order(), 7);
/// ```
pub fn dop(support: &Support, order: Option<usize>) -> G2sResult<DiscreteBasis> {
    let x = support.points();
    let m = x.len();

    if m == 0 {
        return Err(G2sError::invalid("the support is empty"));
    }

    let n = order.unwrap_or(m);
    if n == 0 {
        return Err(G2sError::invalid("at least one basis function is required"));
    }
    if n > m {
        return Err(G2sError::invalid(format!(
            "{} basis functions requested for a support of {} points",
            n, m
        )));
    }

    let mut p = Mat::<f64>::zeros(m, n);
    let mut dp = Mat::<f64>::zeros(m, n);
    let mut alphas = vec![0.0; n];
    let mut betas = vec![0.0; n];

    // Constant column
    let p0 = 1.0 / (m as f64).sqrt();
    p.col_mut(0).fill(p0);
    alphas[0] = p0;

    if n == 1 {
        return Ok(DiscreteBasis {
            p,
            dp,
            recurrence: RecurrenceCoefficients { alphas, betas },
        });
    }

    // Degree-1 column
    let mean = x.iter().sum::<f64>() / m as f64;
    let mut p1: Vec<f64> = x.iter().map(|xi| xi - mean).collect();
    let np1 = dot(&p1, &p1).sqrt();
    if !(np1 > DEGENERACY_TOLERANCE) {
        return Err(G2sError::NumericalDegeneracy { column: 1, norm: np1 });
    }
    p1.iter_mut().for_each(|v| *v /= np1);

    // The derivative of p1 is constant. Taking the ratio of summed differences
    // keeps it valid for irregular spacing.
    let hm = sum_of_differences(&x);
    if hm == 0.0 {
        return Err(G2sError::NumericalDegeneracy { column: 1, norm: 0.0 });
    }
    let dp1 = sum_of_differences(&p1) / hm;

    for i in 0..m {
        p[(i, 1)] = p1[i];
        dp[(i, 1)] = dp1;
    }
    alphas[1] = 1.0 / np1;
    betas[1] = mean;

    let mut pt = vec![0.0; m];
    let mut beta = vec![0.0; n];

    for k in 2..n {
        // Augment the previous polynomial
        for i in 0..m {
            pt[i] = p[(i, k - 1)] * p1[i];
        }

        // Three-term recurrence
        let beta0 = (0..m).map(|i| p[(i, k - 2)] * pt[i]).sum::<f64>();
        for i in 0..m {
            pt[i] -= p[(i, k - 2)] * beta0;
        }
        betas[k] = beta0;

        // Complete reorthogonalisation against every previous column
        for j in 0..k {
            beta[j] = (0..m).map(|i| p[(i, j)] * pt[i]).sum::<f64>();
        }
        for i in 0..m {
            let correction = (0..k).map(|j| p[(i, j)] * beta[j]).sum::<f64>();
            pt[i] -= correction;
        }

        let norm = dot(&pt, &pt).sqrt();
        if !(norm > DEGENERACY_TOLERANCE) {
            return Err(G2sError::NumericalDegeneracy { column: k, norm });
        }
        let alpha = 1.0 / norm;
        alphas[k] = alpha;

        for i in 0..m {
            p[(i, k)] = alpha * pt[i];
        }

        // Same linear combination, differentiated with the product rule
        for i in 0..m {
            let reorth = (0..k).map(|j| dp[(i, j)] * beta[j]).sum::<f64>();
            dp[(i, k)] = alpha
                * (dp[(i, k - 1)] * p1[i] + p[(i, k - 1)] * dp1
                    - dp[(i, k - 2)] * beta0
                    - reorth);
        }
    }

    Ok(DiscreteBasis {
        p,
        dp,
        recurrence: RecurrenceCoefficients { alphas, betas },
    })
}
