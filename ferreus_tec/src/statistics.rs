/////////////////////////////////////////////////////////////////////////////////////////////
//
// Computes summary statistics of source shifts and of the reconstructed TEC field.
//
// Created on: 15 Nov 2025     Author: Daniel Owen
//
// Copyright (c) 2025, Maptek Pty Ltd. All rights reserved. Licensed under the MIT License.
//
/////////////////////////////////////////////////////////////////////////////////////////////

//! # statistics
//!
//! Moments use population normalisation. Finite differences assume unit grid
//! spacing, so curvature statistics are in field units per grid cell squared.

use crate::{
    beam::BeamSelection,
    common::{matrix_values, mean},
    reconstruct::TecField,
    spectrum::non_dc_power_ratio,
};
use faer::Mat;
use serde::{Deserialize, Serialize};

/// Relative variance below which skewness and kurtosis are undefined.
pub const MOMENT_RESOLUTION: f64 = 1e-15;

/// Median, averaging the two middle values for even counts. `NaN` when
/// empty.
pub fn median(values: &[f64]) -> f64 {
    if values.is_empty() {
        return f64::NAN;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));

    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 1 {
        sorted[mid]
    } else {
        0.5 * (sorted[mid - 1] + sorted[mid])
    }
}

fn central_moment(values: &[f64], centre: f64, order: i32) -> f64 {
    values.iter().map(|v| (v - centre).powi(order)).sum::<f64>() / values.len() as f64
}

/// Population standard deviation.
pub fn std_dev(values: &[f64]) -> f64 {
    let m = mean(values);
    central_moment(values, m, 2).sqrt()
}

/// Mean and second moment, or `None` when the spread is too small for
/// higher moments to mean anything.
fn spread(values: &[f64]) -> Option<(f64, f64)> {
    if values.is_empty() {
        return None;
    }
    let m = mean(values);
    let m2 = central_moment(values, m, 2);
    if m2 <= (MOMENT_RESOLUTION * m).powi(2) {
        None
    } else {
        Some((m, m2))
    }
}

/// Skewness `m3 / m2^1.5`.
pub fn skewness(values: &[f64]) -> f64 {
    match spread(values) {
        Some((m, m2)) => central_moment(values, m, 3) / m2.powf(1.5),
        None => f64::NAN,
    }
}

/// Excess kurtosis `m4 / m2^2 - 3`.
pub fn kurtosis(values: &[f64]) -> f64 {
    match spread(values) {
        Some((m, m2)) => central_moment(values, m, 4) / (m2 * m2) - 3.0,
        None => f64::NAN,
    }
}

/// Discrete Laplacian: the `[1, -2, 1]` stencil along each axis, summed.
/// Samples beyond an edge repeat the edge sample.
pub fn laplacian(m: &Mat<f64>) -> Mat<f64> {
    let (rows, cols) = m.shape();
    let at = |i: isize, j: isize| {
        let i = i.clamp(0, rows as isize - 1) as usize;
        let j = j.clamp(0, cols as isize - 1) as usize;
        m[(i, j)]
    };

    Mat::from_fn(rows, cols, |i, j| {
        let (i, j) = (i as isize, j as isize);
        at(i - 1, j) + at(i + 1, j) + at(i, j - 1) + at(i, j + 1) - 4.0 * at(i, j)
    })
}

fn gradient_along(len: usize, get: impl Fn(usize) -> f64) -> Vec<f64> {
    if len < 2 {
        return vec![0.0; len];
    }
    (0..len)
        .map(|k| match k {
            0 => get(1) - get(0),
            k if k == len - 1 => get(k) - get(k - 1),
            k => 0.5 * (get(k + 1) - get(k - 1)),
        })
        .collect()
}

/// First differences along rows and along columns, `(∂/∂row, ∂/∂col)`.
/// Interior points use central differences and edges one-sided ones.
pub fn gradient(m: &Mat<f64>) -> (Mat<f64>, Mat<f64>) {
    let (rows, cols) = m.shape();
    let mut d_row = Mat::<f64>::zeros(rows, cols);
    let mut d_col = Mat::<f64>::zeros(rows, cols);

    for j in 0..cols {
        for (i, v) in gradient_along(rows, |k| m[(k, j)]).into_iter().enumerate() {
            d_row[(i, j)] = v;
        }
    }
    for i in 0..rows {
        for (j, v) in gradient_along(cols, |k| m[(i, k)]).into_iter().enumerate() {
            d_col[(i, j)] = v;
        }
    }
    (d_row, d_col)
}

/// Standard deviation of `|H_rr| + |H_rc| + |H_cc|`, with the Hessian built
/// from repeated [`gradient`] calls.
pub fn hessian_std(m: &Mat<f64>) -> f64 {
    let (g_row, g_col) = gradient(m);
    let (h_rr, h_rc) = gradient(&g_row);
    let (_, h_cc) = gradient(&g_col);

    let (rows, cols) = m.shape();
    let total = Mat::<f64>::from_fn(rows, cols, |i, j| {
        h_rr[(i, j)].abs() + h_rc[(i, j)].abs() + h_cc[(i, j)].abs()
    });
    std_dev(&matrix_values(&total))
}

/// Summary statistics of one observation.
///
/// Shift statistics cover the sources inside the beam. Field statistics
/// cover the reconstructed (and possibly cropped) field.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TecStatistics {
    pub median_abs_ra_shift: f64,
    pub median_abs_dec_shift: f64,
    pub ra_shift_std: f64,
    pub dec_shift_std: f64,
    pub ra_shift_skewness: f64,
    pub dec_shift_skewness: f64,
    pub ra_shift_kurtosis: f64,
    pub dec_shift_kurtosis: f64,
    pub tec_std: f64,
    pub tec_skewness: f64,
    pub tec_kurtosis: f64,

    /// Std of the discrete Laplacian of the field.
    pub laplacian_std: f64,

    /// See [`hessian_std`].
    pub hessian_std: f64,

    /// See [`non_dc_power_ratio`].
    pub power_ratio: f64,
}

impl TecField {
    /// Computes every statistic of the field and the beam's shifts.
    pub fn statistics(&self, selection: &BeamSelection) -> TecStatistics {
        let abs = |v: &[f64]| v.iter().map(|x| x.abs()).collect::<Vec<f64>>();
        let ra = &selection.ra_shifts;
        let dec = &selection.dec_shifts;
        let tec = matrix_values(&self.tec);

        TecStatistics {
            median_abs_ra_shift: median(&abs(ra)),
            median_abs_dec_shift: median(&abs(dec)),
            ra_shift_std: std_dev(ra),
            dec_shift_std: std_dev(dec),
            ra_shift_skewness: skewness(ra),
            dec_shift_skewness: skewness(dec),
            ra_shift_kurtosis: kurtosis(ra),
            dec_shift_kurtosis: kurtosis(dec),
            tec_std: std_dev(&tec),
            tec_skewness: skewness(&tec),
            tec_kurtosis: kurtosis(&tec),
            laplacian_std: std_dev(&matrix_values(&laplacian(&self.tec))),
            hessian_std: hessian_std(&self.tec),
            power_ratio: non_dc_power_ratio(&self.tec),
        }
    }
}
