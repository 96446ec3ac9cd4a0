/////////////////////////////////////////////////////////////////////////////////////////////
//
// Provides synthetic observations for validating and demonstrating the scoring pipeline.
//
// Created on: 15 Nov 2025     Author: Daniel Owen
//
// Copyright (c) 2025, Maptek Pty Ltd. All rights reserved. Licensed under the MIT License.
//
/////////////////////////////////////////////////////////////////////////////////////////////

//! Synthetic observations with known displacement fields. Positions are in
//! degrees around the EoR0 field centre unless stated otherwise.
use crate::{common::generate_random_points, observation::Observation};
use std::f64::consts::PI;

/// Struct that implements synthetic observations for testing the pipeline.
pub struct TecTestFunctions;

impl TecTestFunctions {
    /// Centre of the synthetic fields, `[ra, dec]`.
    pub const FIELD_CENTRE: [f64; 2] = [0.0, -27.0];

    /// Gaussian TEC bump of width `sigma` and height `amplitude`:
    /// <div>
    /// $$
    /// T(x,y) = a \exp\!\left[-\frac{(x-x_0)^2 + (y-y_0)^2}{2\sigma^2}\right]
    /// $$
    /// </div>
    ///
    /// Returns the value and the gradient `[∂T/∂x, ∂T/∂y]`.
    pub fn gaussian_bump(p: [f64; 2], centre: [f64; 2], sigma: f64, amplitude: f64) -> (f64, [f64; 2]) {
        let dx = p[0] - centre[0];
        let dy = p[1] - centre[1];
        let s2 = sigma * sigma;
        let value = amplitude * (-(dx * dx + dy * dy) / (2.0 * s2)).exp();
        (value, [-dx / s2 * value, -dy / s2 * value])
    }

    /// `n` points uniformly distributed over a disk.
    pub fn uniform_disk(n: usize, centre: [f64; 2], radius: f64, seed: Option<u64>) -> Vec<[f64; 2]> {
        let u = generate_random_points(n, seed);
        (0..n)
            .map(|i| {
                let r = radius * u[(i, 0)].sqrt();
                let theta = 2.0 * PI * u[(i, 1)];
                [centre[0] + r * theta.cos(), centre[1] + r * theta.sin()]
            })
            .collect()
    }

    /// Sources scattered over a disk of `radius` degrees, displaced by the
    /// gradient of a Gaussian TEC bump offset from the centre.
    pub fn gaussian_blob_observation(n: usize, radius: f64, seed: Option<u64>) -> Observation {
        let centre = Self::FIELD_CENTRE;
        let bump_centre = [centre[0] + 0.2 * radius, centre[1] - 0.1 * radius];
        let sigma = radius / 3.0;
        let amplitude = 0.05 * sigma;

        let points = Self::uniform_disk(n, centre, radius, seed);
        let shifts: Vec<[f64; 2]> = points
            .iter()
            .map(|&p| Self::gaussian_bump(p, bump_centre, sigma, amplitude).1)
            .collect();

        Self::from_points(&points, &shifts, "gaussian_blob")
    }

    /// A bright main lobe of `n_main` sources within 10 degrees of the
    /// centre, plus `n_side` sidelobe sources on a ring 40 to 60 degrees out.
    pub fn sidelobe_observation(n_main: usize, n_side: usize, seed: Option<u64>) -> Observation {
        let centre = Self::FIELD_CENTRE;
        let mut points = Self::uniform_disk(n_main, centre, 10.0, seed);

        // Evenly spread angles keep the bulk centroid on the main lobe
        let radii = generate_random_points(n_side, seed.map(|s| s.wrapping_add(1)));
        for k in 0..n_side {
            let theta = 2.0 * PI * (k as f64 + 0.5) / n_side as f64;
            let r = 40.0 + 20.0 * radii[(k, 0)];
            points.push([centre[0] + r * theta.cos(), centre[1] + r * theta.sin()]);
        }

        let shifts: Vec<[f64; 2]> = points
            .iter()
            .map(|&p| Self::gaussian_bump(p, centre, 4.0, 0.2).1)
            .collect();

        Self::from_points(&points, &shifts, "sidelobes")
    }

    /// Sources on concentric rings about the origin, mirror symmetric about
    /// both axes, all displaced by the same `shift`.
    pub fn uniform_shift_observation(shift: [f64; 2]) -> Observation {
        let per_ring = 16;
        let mut points = Vec::new();
        for radius in [1.0, 2.0, 3.0, 4.0, 6.0] {
            for k in 0..per_ring {
                let theta = 2.0 * PI * (k as f64 + 0.5) / per_ring as f64;
                points.push([radius * theta.cos(), radius * theta.sin()]);
            }
        }
        let shifts = vec![shift; points.len()];

        Self::from_points(&points, &shifts, "uniform_shift")
    }

    /// Four sources on the corners of a square about the origin, displaced
    /// by the rotational field `(-y, x)`.
    pub fn rotational_square() -> Observation {
        let points = [[1.0, 1.0], [-1.0, 1.0], [-1.0, -1.0], [1.0, -1.0]];
        let shifts: Vec<[f64; 2]> = points.iter().map(|p| [-p[1], p[0]]).collect();

        Self::from_points(&points, &shifts, "rotation")
    }

    fn from_points(points: &[[f64; 2]], shifts: &[[f64; 2]], label: &str) -> Observation {
        let column = |v: &[[f64; 2]], k: usize| v.iter().map(|p| p[k]).collect::<Vec<f64>>();
        Observation::from_lists(
            column(points, 0),
            column(points, 1),
            column(shifts, 0),
            column(shifts, 1),
            label,
        )
        .unwrap_or_else(|e| panic!("synthetic observation '{}' is invalid: {}", label, e))
    }
}
