/////////////////////////////////////////////////////////////////////////////////////////////
//
// Provides shared utilities for grid construction, matrix flips and crops, and random point generation.
//
// Created on: 15 Nov 2025     Author: Daniel Owen
//
// Copyright (c) 2025, Maptek Pty Ltd. All rights reserved. Licensed under the MIT License.
//
/////////////////////////////////////////////////////////////////////////////////////////////

use faer::Mat;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

pub use ferreus_g2s::linspace;

/// Generates `n` random points in the unit square, one point per row.
///
/// Passing a seed makes the points reproducible.
pub fn generate_random_points(n: usize, seed: Option<u64>) -> Mat<f64> {
    let mut rng = match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_os_rng(),
    };

    Mat::from_fn(n, 2, |_, _| rng.random_range(0.0..1.0))
}

/// Grid node coordinates `linspace(-radius, radius, n) + centre`.
pub fn centred_axis(centre: f64, radius: f64, n: usize) -> Vec<f64> {
    linspace(-radius, radius, n)
        .into_iter()
        .map(|v| v + centre)
        .collect()
}

/// Reverses the row order.
pub fn flip_rows(m: &Mat<f64>) -> Mat<f64> {
    let rows = m.nrows();
    Mat::from_fn(rows, m.ncols(), |i, j| m[(rows - 1 - i, j)])
}

/// Reverses the column order.
pub fn flip_cols(m: &Mat<f64>) -> Mat<f64> {
    let cols = m.ncols();
    Mat::from_fn(m.nrows(), cols, |i, j| m[(i, cols - 1 - j)])
}

/// Half-open index window `[start, len - start)` keeping `floor(len * factor)`
/// centred samples.
pub fn centred_window(len: usize, factor: f64) -> (usize, usize) {
    let kept = ((len as f64) * factor).floor() as usize;
    let start = (len - kept.min(len)) / 2;
    (start, len - start)
}

/// Centred sub-matrix keeping a `factor` fraction of each axis.
pub fn crop_centred(m: &Mat<f64>, factor: f64) -> Mat<f64> {
    let (r0, r1) = centred_window(m.nrows(), factor);
    let (c0, c1) = centred_window(m.ncols(), factor);
    m.submatrix(r0, c0, r1 - r0, c1 - c0).to_owned()
}

/// Column-major copy of every entry.
pub fn matrix_values(m: &Mat<f64>) -> Vec<f64> {
    let mut values = Vec::with_capacity(m.nrows() * m.ncols());
    for j in 0..m.ncols() {
        for i in 0..m.nrows() {
            values.push(m[(i, j)]);
        }
    }
    values
}

/// Arithmetic mean, `NaN` for an empty slice.
pub fn mean(values: &[f64]) -> f64 {
    values.iter().sum::<f64>() / values.len() as f64
}
