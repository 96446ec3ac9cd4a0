/////////////////////////////////////////////////////////////////////////////////////////////
//
// Reconstructs the TEC field from interpolated displacement grids and crops it to the well sampled centre.
//
// Created on: 15 Nov 2025     Author: Daniel Owen
//
// Copyright (c) 2025, Maptek Pty Ltd. All rights reserved. Licensed under the MIT License.
//
/////////////////////////////////////////////////////////////////////////////////////////////

use crate::{
    common::{crop_centred, flip_rows, matrix_values, mean},
    error::{PipelineError, PipelineResult},
    interpolation::InterpolatedGrids,
};
use faer::Mat;
use ferreus_g2s::{g2s, progress::ProgressSink};
use std::sync::Arc;

/// A reconstructed, zero-mean TEC field and the grids it came from.
#[derive(Debug, Clone)]
pub struct TecField {
    /// The field. Row 0 is the lowest Dec, column 0 the highest RA.
    pub tec: Mat<f64>,

    pub grid_dra: Mat<f64>,
    pub grid_ddec: Mat<f64>,

    /// `[ra_max, ra_min, dec_min, dec_max]` covered by the field.
    pub extent: [f64; 4],

    pub centre: [f64; 2],

    /// Half width of the uncropped field.
    pub radius: f64,

    /// Fraction of the full grid kept, `1.0` when uncropped.
    pub crop_factor: f64,
}

fn extent(centre: [f64; 2], half_width: f64) -> [f64; 4] {
    [
        centre[0] + half_width,
        centre[0] - half_width,
        centre[1] - half_width,
        centre[1] + half_width,
    ]
}

impl InterpolatedGrids {
    /// Reconstructs the field whose gradient best matches the grids, then
    /// removes its mean.
    ///
    /// # Arguments
    /// * `support_length` - Window length of the derivative operators.
    /// * `progress` - Optional sink for operator warnings.
    pub fn reconstruct(
        &self,
        support_length: usize,
        progress: &Option<Arc<dyn ProgressSink>>,
    ) -> PipelineResult<TecField> {
        let phi = g2s(
            &self.x,
            &self.y,
            &self.grid_dra,
            &self.grid_ddec,
            support_length,
            progress,
        )?;

        let mut tec = flip_rows(&phi);
        let offset = mean(&matrix_values(&tec));
        tec.col_iter_mut().for_each(|col| {
            col.iter_mut().for_each(|v| *v -= offset);
        });

        Ok(TecField {
            tec,
            grid_dra: self.grid_dra.clone(),
            grid_ddec: self.grid_ddec.clone(),
            extent: extent(self.centre, self.radius),
            centre: self.centre,
            radius: self.radius,
            crop_factor: 1.0,
        })
    }
}

impl TecField {
    /// Keeps the centred `factor` fraction of each axis of the field and both
    /// grids. Edges of the field are poorly constrained by sources.
    ///
    /// # Errors
    /// * [`PipelineError::InvalidParameter`] unless `0 < factor <= 1`.
    /// * [`PipelineError::InsufficientData`] if nothing would remain.
    pub fn crop(&self, factor: f64) -> PipelineResult<TecField> {
        if !(factor > 0.0 && factor <= 1.0) {
            return Err(PipelineError::parameter(
                "crop_factor",
                format!("must lie in (0, 1], got {}", factor),
            ));
        }

        let kept = |len: usize| ((len as f64) * factor).floor() as usize;
        if kept(self.tec.nrows()) == 0 || kept(self.tec.ncols()) == 0 {
            return Err(PipelineError::insufficient(
                "crop",
                format!(
                    "a {}x{} field cropped by {} is empty",
                    self.tec.nrows(),
                    self.tec.ncols(),
                    factor
                ),
            ));
        }

        let crop_factor = self.crop_factor * factor;
        Ok(TecField {
            tec: crop_centred(&self.tec, factor),
            grid_dra: crop_centred(&self.grid_dra, factor),
            grid_ddec: crop_centred(&self.grid_ddec, factor),
            extent: extent(self.centre, self.radius * crop_factor),
            centre: self.centre,
            radius: self.radius,
            crop_factor,
        })
    }
}
