/////////////////////////////////////////////////////////////////////////////////////////////
//
// Computes the windowed power spectrum of a TEC field and its concentric annulus power ratio.
//
// Created on: 15 Nov 2025     Author: Daniel Owen
//
// Copyright (c) 2025, Maptek Pty Ltd. All rights reserved. Licensed under the MIT License.
//
/////////////////////////////////////////////////////////////////////////////////////////////

//! # spectrum
//!
//! Small scale structure in a TEC field shows up as power away from the
//! centre of its spectrum. The field is tapered with a separable Blackman
//! window, transformed, and the centred power spectrum is summed over
//! concentric annuli one frequency bin wide.

use faer::Mat;
use rustfft::{FftPlanner, num_complex::Complex};
use std::f64::consts::PI;

/// Number of innermost annuli treated as low frequency power.
pub const LOW_FREQUENCY_ANNULI: usize = 3;

/// Symmetric Blackman window of length `m`.
///
/// <div>
/// $$
/// w_k = 0.42 - 0.5\cos\frac{2\pi k}{m-1} + 0.08\cos\frac{4\pi k}{m-1}
/// $$
/// </div>
pub fn blackman(m: usize) -> Vec<f64> {
    match m {
        0 => Vec::new(),
        1 => vec![1.0],
        _ => {
            let denom = (m - 1) as f64;
            (0..m)
                .map(|k| {
                    let t = k as f64 / denom;
                    0.42 - 0.5 * (2.0 * PI * t).cos() + 0.08 * (4.0 * PI * t).cos()
                })
                .collect()
        }
    }
}

/// `|FFT2(field * w)|^2` where `w` is the outer product of Blackman windows
/// along each axis.
pub fn power_spectrum(field: &Mat<f64>) -> Mat<f64> {
    let (rows, cols) = field.shape();
    if rows == 0 || cols == 0 {
        return Mat::zeros(rows, cols);
    }

    let w_rows = blackman(rows);
    let w_cols = blackman(cols);
    let mut spectrum: Vec<Vec<Complex<f64>>> = (0..rows)
        .map(|i| {
            (0..cols)
                .map(|j| Complex::new(field[(i, j)] * w_rows[i] * w_cols[j], 0.0))
                .collect()
        })
        .collect();

    let mut planner = FftPlanner::<f64>::new();
    let row_fft = planner.plan_fft_forward(cols);
    spectrum.iter_mut().for_each(|row| row_fft.process(row));

    let col_fft = planner.plan_fft_forward(rows);
    let mut column = vec![Complex::new(0.0, 0.0); rows];
    for j in 0..cols {
        for i in 0..rows {
            column[i] = spectrum[i][j];
        }
        col_fft.process(&mut column);
        for i in 0..rows {
            spectrum[i][j] = column[i];
        }
    }

    Mat::from_fn(rows, cols, |i, j| spectrum[i][j].norm_sqr())
}

/// Moves the zero frequency bin to `(rows / 2, cols / 2)`.
pub fn fftshift(m: &Mat<f64>) -> Mat<f64> {
    let (rows, cols) = m.shape();
    Mat::from_fn(rows, cols, |i, j| {
        m[((i + rows - rows / 2) % rows, (j + cols - cols / 2) % cols)]
    })
}

/// Power in successive annuli of a centred spectrum.
///
/// Entry `r - 1` holds the power at squared distance `d` from the centre
/// with `(r - 1)^2 <= d < r^2`, for `r = 1, 2, ...` while
/// `r < min(rows, cols) / 4`.
pub fn annulus_powers(shifted: &Mat<f64>) -> Vec<f64> {
    let (rows, cols) = shifted.shape();
    let (cr, cc) = ((rows / 2) as i64, (cols / 2) as i64);
    let limit = rows.min(cols) / 4;

    let mut powers = Vec::with_capacity(limit);
    let mut enclosed = 0.0;
    for r in 1..limit {
        let r2 = (r * r) as i64;
        let mut disk = 0.0;
        for i in 0..rows {
            for j in 0..cols {
                let (dy, dx) = (i as i64 - cr, j as i64 - cc);
                if dx * dx + dy * dy < r2 {
                    disk += shifted[(i, j)];
                }
            }
        }
        powers.push(disk - enclosed);
        enclosed = disk;
    }
    powers
}

/// Ratio of the power outside the innermost [`LOW_FREQUENCY_ANNULI`] annuli
/// to the power inside them. `NaN` when the low frequency power is zero and
/// nothing lies outside it.
pub fn non_dc_power_ratio(field: &Mat<f64>) -> f64 {
    let powers = annulus_powers(&fftshift(&power_spectrum(field)));
    let split = LOW_FREQUENCY_ANNULI.min(powers.len());
    let low: f64 = powers[..split].iter().sum();
    let high: f64 = powers[split..].iter().sum();
    high / low
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::{generate_random_points, matrix_values};

    #[test]
    fn blackman_window_shape() {
        assert!(blackman(0).is_empty());
        assert_eq!(blackman(1), vec![1.0]);

        let w = blackman(9);
        assert!((w[4] - 1.0).abs() < 1e-15);
        assert!(w[0].abs() < 1e-15 && w[8].abs() < 1e-15);
        for k in 0..9 {
            assert!((w[k] - w[8 - k]).abs() < 1e-15);
        }
    }

    #[test]
    fn fftshift_centres_the_zero_bin() {
        let even = Mat::<f64>::from_fn(1, 4, |_, j| j as f64);
        let s = fftshift(&even);
        assert_eq!(matrix_values(&s), vec![2.0, 3.0, 0.0, 1.0]);

        let odd = Mat::<f64>::from_fn(5, 1, |i, _| i as f64);
        let s = fftshift(&odd);
        assert_eq!(matrix_values(&s), vec![3.0, 4.0, 0.0, 1.0, 2.0]);
        assert_eq!(s[(2, 0)], 0.0);
    }

    #[test]
    fn spectrum_satisfies_parseval() {
        let noise = generate_random_points(24, Some(5));
        let field = Mat::<f64>::from_fn(12, 16, |i, j| noise[((i + j) % 24, (i * j) % 2)] - 0.5);
        let ps = power_spectrum(&field);

        let w_r = blackman(12);
        let w_c = blackman(16);
        let energy: f64 = (0..12)
            .flat_map(|i| (0..16).map(move |j| (i, j)))
            .map(|(i, j)| (field[(i, j)] * w_r[i] * w_c[j]).powi(2))
            .sum();
        let total: f64 = matrix_values(&ps).iter().sum();
        assert!((total - 12.0 * 16.0 * energy).abs() < 1e-9 * total);
    }

    #[test]
    fn constant_field_puts_window_mass_at_dc() {
        let field = Mat::<f64>::from_fn(10, 10, |_, _| 2.0);
        let ps = power_spectrum(&field);
        let s: f64 = blackman(10).iter().sum();
        let expected = (2.0 * s * s).powi(2);
        assert!((ps[(0, 0)] - expected).abs() < 1e-10 * expected);
    }

    #[test]
    fn annuli_of_a_flat_spectrum_count_bins() {
        let flat = Mat::<f64>::from_fn(16, 16, |_, _| 1.0);
        assert_eq!(annulus_powers(&flat), vec![1.0, 8.0, 16.0]);
    }

    #[test]
    fn rough_fields_carry_more_high_frequency_power() {
        let n = 64;
        let c = n as f64 / 2.0;
        let smooth = Mat::<f64>::from_fn(n, n, |i, j| {
            let d2 = (i as f64 - c).powi(2) + (j as f64 - c).powi(2);
            (-d2 / (2.0 * 16.0 * 16.0)).exp()
        });
        let u = generate_random_points(n * n, Some(17));
        let rough = Mat::<f64>::from_fn(n, n, |i, j| u[(i * n + j, 0)] - 0.5);

        let smooth_ratio = non_dc_power_ratio(&smooth);
        let rough_ratio = non_dc_power_ratio(&rough);
        assert!(smooth_ratio >= 0.0);
        assert!(rough_ratio > 10.0 * smooth_ratio, "{} vs {}", rough_ratio, smooth_ratio);
    }
}
