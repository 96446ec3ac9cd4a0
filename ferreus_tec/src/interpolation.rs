/////////////////////////////////////////////////////////////////////////////////////////////
//
// Interpolates scattered source displacements onto a regular grid with piecewise linear triangles.
//
// Created on: 15 Nov 2025     Author: Daniel Owen
//
// Copyright (c) 2025, Maptek Pty Ltd. All rights reserved. Licensed under the MIT License.
//
/////////////////////////////////////////////////////////////////////////////////////////////

//! # interpolation
//!
//! Piecewise linear interpolation over a Delaunay triangulation. Query points
//! are located through an R-tree of triangle bounding boxes. Points outside
//! the convex hull of the data receive a fill value.

use crate::{
    beam::BeamSelection,
    common::{centred_axis, flip_cols, flip_rows},
    error::{PipelineError, PipelineResult},
    rtree::ExtentRTree,
    triangulation::Triangulation,
};
use faer::Mat;

/// Minimum number of sources needed to interpolate a beam.
pub const MIN_INTERPOLATION_POINTS: usize = 4;

/// Where a query point falls in the triangulation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Location {
    pub vertices: [usize; 3],
    pub weights: [f64; 3],
}

impl Location {
    /// Weighted sum of `values` at the triangle corners.
    #[inline]
    pub fn interpolate(&self, values: &[f64]) -> f64 {
        self.weights
            .iter()
            .zip(self.vertices.iter())
            .map(|(w, &v)| w * values[v])
            .sum()
    }
}

/// Linear interpolator over scattered 2D points.
pub struct LinearInterpolator {
    triangulation: Triangulation,
    index: ExtentRTree,
}

impl LinearInterpolator {
    /// Triangulates `points` and indexes the triangles.
    ///
    /// # Errors
    /// [`PipelineError::InsufficientData`] when the points span no triangle,
    /// for example when they are all collinear.
    pub fn new(points: &[[f64; 2]]) -> PipelineResult<Self> {
        let triangulation = Triangulation::new(points);
        if triangulation.is_empty() {
            return Err(PipelineError::insufficient(
                "interpolation",
                format!("{} points span no triangle", points.len()),
            ));
        }

        let index = ExtentRTree::from_extents(
            (0..triangulation.len()).map(|t| (t, triangulation.extents(t))),
        );

        Ok(Self {
            triangulation,
            index,
        })
    }

    pub fn triangulation(&self) -> &Triangulation {
        &self.triangulation
    }

    /// Locates `p`, or `None` when it lies outside the convex hull. Points on
    /// a shared edge resolve to the lowest numbered triangle.
    pub fn locate(&self, p: [f64; 2]) -> Option<Location> {
        let mut candidates = self.index.containing(p);
        candidates.sort_unstable();

        candidates.into_iter().find_map(|t| {
            self.triangulation.barycentric(t, p).map(|weights| Location {
                vertices: self.triangulation.triangles()[t],
                weights,
            })
        })
    }

    /// Interpolates `values` (one per input point) at `p`.
    pub fn interpolate(&self, values: &[f64], p: [f64; 2], fill: f64) -> f64 {
        match self.locate(p) {
            Some(loc) => loc.interpolate(values),
            None => fill,
        }
    }
}

/// Both displacement components on a regular grid around the beam.
#[derive(Debug, Clone)]
pub struct InterpolatedGrids {
    /// Column support, increasing RA.
    pub x: Vec<f64>,

    /// Row support, increasing Dec.
    pub y: Vec<f64>,

    /// RA shifts. Both axes are reversed relative to `x` and `y`, so
    /// `grid_dra[(0, 0)]` is the value at the largest RA and Dec.
    pub grid_dra: Mat<f64>,

    /// Dec shifts, with the same orientation as `grid_dra`.
    pub grid_ddec: Mat<f64>,

    pub centre: [f64; 2],
    pub radius: f64,
}

impl BeamSelection {
    /// Interpolates the beam's shifts onto a `grid_size x grid_size` grid
    /// spanning `centre ± radius`. Nodes outside the convex hull of the
    /// sources are zero.
    ///
    /// # Errors
    /// [`PipelineError::InsufficientData`] for fewer than
    /// [`MIN_INTERPOLATION_POINTS`] sources or sources that span no triangle.
    pub fn interpolate(&self, grid_size: usize) -> PipelineResult<InterpolatedGrids> {
        if self.len() < MIN_INTERPOLATION_POINTS {
            return Err(PipelineError::insufficient(
                "interpolation",
                format!(
                    "{} sources inside the beam; at least {} are needed",
                    self.len(),
                    MIN_INTERPOLATION_POINTS
                ),
            ));
        }

        let interpolator = LinearInterpolator::new(&self.positions())?;

        let x = centred_axis(self.centre[0], self.radius, grid_size);
        let y = centred_axis(self.centre[1], self.radius, grid_size);

        let mut dra = Mat::<f64>::zeros(grid_size, grid_size);
        let mut ddec = Mat::<f64>::zeros(grid_size, grid_size);
        for i in 0..grid_size {
            for j in 0..grid_size {
                if let Some(loc) = interpolator.locate([x[j], y[i]]) {
                    dra[(i, j)] = loc.interpolate(&self.ra_shifts);
                    ddec[(i, j)] = loc.interpolate(&self.dec_shifts);
                }
            }
        }

        // Reverse both axes: RA increases right to left on the sky
        Ok(InterpolatedGrids {
            x,
            y,
            grid_dra: flip_rows(&flip_cols(&dra)),
            grid_ddec: flip_rows(&flip_cols(&ddec)),
            centre: self.centre,
            radius: self.radius,
        })
    }
}
