/////////////////////////////////////////////////////////////////////////////////////////////
//
// Builds full or banded differentiation operators from local discrete polynomial fits.
//
// Created on: 15 Nov 2025     Author: Daniel Owen
//
// Copyright (c) 2025, Maptek Pty Ltd. All rights reserved. Licensed under the MIT License.
//
/////////////////////////////////////////////////////////////////////////////////////////////

//! # diff_local
//!
//! A square operator `S` with `S · f ≈ f'` for data `f` sampled on a support
//! `x`. Each row is the derivative of a least-squares polynomial fit over a
//! window of `ls` neighbouring nodes, so the operator is banded with
//! bandwidth `ls` (or dense when the window covers the whole support).

use crate::{
    basis::{dop, Support},
    error::{G2sError, G2sResult},
    linalg::numerical_rank,
    progress::{emit, ProgressMsg, ProgressSink},
};
use faer::Mat;
use std::sync::Arc;

/// Windows longer than this risk the Runge phenomenon.
pub const RUNGE_WARNING_LENGTH: usize = 13;

/// Derivative operator over the window `x`, `dP · Pᵗ`.
fn local_operator(x: &[f64], no_bfs: usize) -> G2sResult<Mat<f64>> {
    let basis = dop(&Support::Points(x.to_vec()), Some(no_bfs))?;
    Ok(basis.differentiation_matrix())
}

fn check_rank(
    s: &Mat<f64>,
    num_points: usize,
    progress: &Option<Arc<dyn ProgressSink>>,
) -> G2sResult<()> {
    let rank = numerical_rank(s)?;
    if rank + 1 < num_points {
        emit(progress, ProgressMsg::RankDeficient { rank, num_points });
    }
    Ok(())
}

/// Generates a global matrix operator that computes local derivatives.
///
/// # Arguments
/// * `x` - Nodes at which to evaluate the derivative. May be irregularly spaced.
/// * `ls` - Window (support) length. Must be odd unless it equals `x.len()`,
///   in which case a single dense operator is built from one global fit.
/// * `no_bfs` - Number of basis functions in each local fit, `no_bfs <= ls`.
/// * `progress` - Optional sink that receives [`ProgressMsg::RungeRisk`] and
///   [`ProgressMsg::RankDeficient`] warnings.
///
/// # Returns
/// An `x.len() x x.len()` operator. Rows outside a row's window are zero.
///
/// # Errors
/// [`G2sError::InvalidConfiguration`] for `no_bfs == 0`, `no_bfs > ls`, an even
/// `ls` or `ls > x.len()`. Basis failures on a window propagate unchanged.
pub fn diff_local(
    x: &[f64],
    ls: usize,
    no_bfs: usize,
    progress: &Option<Arc<dyn ProgressSink>>,
) -> G2sResult<Mat<f64>> {
    let num_points = x.len();

    if no_bfs == 0 {
        return Err(G2sError::invalid("at least one basis function is required"));
    }
    if no_bfs > ls {
        return Err(G2sError::invalid(format!(
            "the number of basis functions ({}) must be <= the support length ({})",
            no_bfs, ls
        )));
    }

    if ls > RUNGE_WARNING_LENGTH {
        emit(progress, ProgressMsg::RungeRisk { support_length: ls });
    }

    if ls == num_points {
        let s = local_operator(x, no_bfs)?;
        check_rank(&s, num_points, progress)?;
        return Ok(s);
    }

    if num_points < ls {
        return Err(G2sError::invalid(format!(
            "the number of nodes ({}) must be at least the support length ({})",
            num_points, ls
        )));
    }
    if ls % 2 == 0 {
        return Err(G2sError::invalid(format!(
            "banded operators need an odd support length, got {}",
            ls
        )));
    }

    let half = (ls + 1) / 2;
    let mut vals = Mat::<f64>::zeros(num_points, num_points);

    // Top rows from the first window
    let dt = local_operator(&x[..ls], no_bfs)?;
    for i in 0..half {
        for j in 0..ls {
            vals[(i, j)] = dt[(i, j)];
        }
    }

    // Interior rows take the midpoint row of a centred window
    for k in 0..num_points - 2 * half {
        let window = &x[k + 1..k + 1 + ls];
        let basis = dop(&Support::Points(window.to_vec()), Some(no_bfs))?;
        let row = basis.dp.subrows(half - 1, 1) * basis.p.transpose();
        for j in 0..ls {
            vals[(k + half, k + 1 + j)] = row[(0, j)];
        }
    }

    // Bottom rows from the last window
    let dt = local_operator(&x[num_points - ls..], no_bfs)?;
    let row_offset = num_points - half;
    let col_offset = num_points - ls;
    for i in 0..half {
        for j in 0..ls {
            vals[(row_offset + i, col_offset + j)] = dt[(ls - half + i, j)];
        }
    }

    check_rank(&vals, num_points, progress)?;

    Ok(vals)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::basis::linspace;
    use std::sync::Mutex;

    #[derive(Debug, Default)]
    struct Collect(Mutex<Vec<ProgressMsg>>);

    impl ProgressSink for Collect {
        fn emit(&self, msg: ProgressMsg) {
            self.0.lock().unwrap().push(msg);
        }
    }

    fn irregular(n: usize) -> Vec<f64> {
        (0..n)
            .map(|i| {
                let t = i as f64 / (n - 1) as f64;
                3.0 * t + 0.1 * (5.0 * t).sin()
            })
            .collect()
    }

    fn apply(s: &Mat<f64>, f: &[f64]) -> Vec<f64> {
        let col = Mat::<f64>::from_fn(f.len(), 1, |i, _| f[i]);
        let out = s * &col;
        (0..f.len()).map(|i| out[(i, 0)]).collect()
    }

    #[test]
    fn constants_differentiate_to_zero() {
        let x = irregular(17);
        for (ls, no_bfs) in [(3, 3), (5, 3), (5, 5), (7, 4), (17, 6)] {
            let s = diff_local(&x, ls, no_bfs, &None).unwrap();
            let df = apply(&s, &vec![4.2; x.len()]);
            for v in df {
                assert!(v.abs() < 1e-10, "ls {} no_bfs {} gave {}", ls, no_bfs, v);
            }
        }
    }

    #[test]
    fn low_degree_polynomials_are_exact() {
        let x = irregular(21);
        let f: Vec<f64> = x.iter().map(|t| 1.0 - 2.0 * t + 0.5 * t.powi(3)).collect();
        let df: Vec<f64> = x.iter().map(|t| -2.0 + 1.5 * t * t).collect();

        for (ls, no_bfs) in [(5, 4), (7, 5), (21, 4)] {
            let s = diff_local(&x, ls, no_bfs, &None).unwrap();
            let est = apply(&s, &f);
            for (a, b) in est.iter().zip(df.iter()) {
                assert!((a - b).abs() < 1e-9, "ls {}: {} vs {}", ls, a, b);
            }
        }
    }

    #[test]
    fn three_point_operator_is_central_difference_inside() {
        let x = linspace(0.0, 1.0, 11);
        let h = 0.1;
        let s = diff_local(&x, 3, 3, &None).unwrap();

        for i in 2..9 {
            assert!((s[(i, i - 1)] + 0.5 / h).abs() < 1e-9);
            assert!(s[(i, i)].abs() < 1e-9);
            assert!((s[(i, i + 1)] - 0.5 / h).abs() < 1e-9);
        }

        // One-sided second order formula at the ends
        assert!((s[(0, 0)] + 1.5 / h).abs() < 1e-9);
        assert!((s[(0, 1)] - 2.0 / h).abs() < 1e-9);
        assert!((s[(0, 2)] + 0.5 / h).abs() < 1e-9);
    }

    #[test]
    fn operator_is_banded() {
        let x = irregular(15);
        let ls = 5;
        let s = diff_local(&x, ls, 3, &None).unwrap();
        for i in 0..15 {
            for j in 0..15 {
                let in_top = i < 3 && j < ls;
                let in_bottom = i >= 12 && j >= 15 - ls;
                let in_band = (i as isize - j as isize).abs() <= 2;
                if !(in_top || in_bottom || in_band) {
                    assert!(s[(i, j)] == 0.0, "entry ({}, {}) is {}", i, j, s[(i, j)]);
                }
            }
        }
    }

    #[test]
    fn invalid_configurations_are_rejected() {
        let x = irregular(9);
        let is_invalid = |r: G2sResult<Mat<f64>>| matches!(r, Err(G2sError::InvalidConfiguration { .. }));

        assert!(is_invalid(diff_local(&x, 3, 4, &None)));
        assert!(is_invalid(diff_local(&x, 4, 3, &None)));
        assert!(is_invalid(diff_local(&x, 11, 3, &None)));
        assert!(is_invalid(diff_local(&x, 3, 0, &None)));
    }

    #[test]
    fn duplicate_nodes_propagate_degeneracy() {
        let x = vec![0.0, 1.0, 1.0, 2.0, 3.0];
        let err = diff_local(&x, 5, 5, &None).err().unwrap();
        assert!(matches!(err, G2sError::NumericalDegeneracy { .. }));
    }

    #[test]
    fn warnings_are_emitted() {
        let sink = Arc::new(Collect::default());
        let progress: Option<Arc<dyn ProgressSink>> = Some(sink.clone());

        // Long window
        let x = linspace(-1.0, 1.0, 15);
        diff_local(&x, 15, 5, &progress).unwrap();

        // A two-function global fit on six points has rank one
        let x = linspace(0.0, 1.0, 6);
        diff_local(&x, 6, 2, &progress).unwrap();

        let msgs = sink.0.lock().unwrap();
        assert!(msgs.iter().any(|m| matches!(m, ProgressMsg::RungeRisk { support_length: 15 })));
        assert!(msgs.iter().any(|m| matches!(
            m,
            ProgressMsg::RankDeficient { rank: 1, num_points: 6 }
        )));
    }

    #[test]
    fn well_posed_operator_stays_quiet() {
        let sink = Arc::new(Collect::default());
        let progress: Option<Arc<dyn ProgressSink>> = Some(sink.clone());
        let x = irregular(12);
        diff_local(&x, 3, 3, &progress).unwrap();
        diff_local(&x, 12, 12, &progress).unwrap();
        assert!(sink.0.lock().unwrap().is_empty());
    }
}
