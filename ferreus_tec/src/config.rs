/////////////////////////////////////////////////////////////////////////////////////////////
//
// Declares configuration types for beam selection, reconstruction, metric weighting and batch screening.
//
// Created on: 15 Nov 2025     Author: Daniel Owen
//
// Copyright (c) 2025, Maptek Pty Ltd. All rights reserved. Licensed under the MIT License.
//
/////////////////////////////////////////////////////////////////////////////////////////////

//! Declares configuration types for beam selection, reconstruction, metric weighting and batch screening.
use crate::error::{PipelineError, PipelineResult};
use serde::{Deserialize, Serialize};

/// Parameters controlling the **primary beam radius** search.
///
/// Distances from the bulk centroid are histogrammed into `bins` equal-width
/// bins over `range`. Bins are accumulated outward until adding the next bin
/// grows the running count by no more than `increase_threshold`, and the
/// left edge of that bin becomes the beam radius.
///
/// ### Default Values
/// - `bins`: `50`
/// - `range`: `(0.0, 125.0)`
/// - `increase_threshold`: `0.05`
#[derive(Clone, Copy, Serialize, Deserialize, Debug, PartialEq)]
pub struct BeamParams {
    /// Number of histogram bins.
    pub bins: usize,

    /// Lower and upper edge of the histogram, in the units of the positions.
    pub range: (f64, f64),

    /// Fractional increase of the cumulative count that ends the search.
    pub increase_threshold: f64,
}

impl Default for BeamParams {
    fn default() -> Self {
        BeamParams {
            bins: 50,
            range: (0.0, 125.0),
            increase_threshold: 0.05,
        }
    }
}

impl BeamParams {
    pub fn validate(&self) -> PipelineResult<()> {
        if self.bins < 2 {
            return Err(PipelineError::parameter(
                "bins",
                format!("at least 2 bins are needed, got {}", self.bins),
            ));
        }
        let (lo, hi) = self.range;
        if !(lo.is_finite() && hi.is_finite() && hi > lo) {
            return Err(PipelineError::parameter(
                "range",
                format!("expected a finite, increasing range, got ({}, {})", lo, hi),
            ));
        }
        if !(self.increase_threshold >= 0.0) {
            return Err(PipelineError::parameter(
                "increase_threshold",
                format!("must be non-negative, got {}", self.increase_threshold),
            ));
        }
        Ok(())
    }
}

/// Weights of the four terms of the composite quality metric.
///
/// `metric = median_ra * median|RA shift| + median_dec * median|Dec shift|
///         + tec_std * std(TEC) + laplacian_std * std(∇²TEC)`
///
/// The defaults are calibration constants fitted against visually graded
/// observations.
#[derive(Clone, Copy, Serialize, Deserialize, Debug, PartialEq)]
pub struct MetricWeights {
    pub median_ra: f64,
    pub median_dec: f64,
    pub tec_std: f64,
    pub laplacian_std: f64,
}

impl Default for MetricWeights {
    fn default() -> Self {
        MetricWeights {
            median_ra: 16.7395,
            median_dec: 8.8566,
            tec_std: 6.0798,
            laplacian_std: 10.0,
        }
    }
}

/// Parameters for scoring a single observation.
#[derive(Clone, Serialize, Deserialize, Debug, PartialEq)]
pub struct PipelineParams {
    /// Beam radius search.
    pub beam: BeamParams,

    /// Number of grid nodes along each axis of the interpolation grid.
    pub grid_size: usize,

    /// Window length of the local derivative operators. Must be odd.
    pub support_length: usize,

    /// Fraction of the grid kept by the centred crop, or `None` to skip
    /// cropping.
    pub crop_factor: Option<f64>,

    /// Metric weights.
    pub weights: MetricWeights,
}

impl Default for PipelineParams {
    fn default() -> Self {
        PipelineParams {
            beam: BeamParams::default(),
            grid_size: 101,
            support_length: 3,
            crop_factor: Some(std::f64::consts::FRAC_1_SQRT_2),
            weights: MetricWeights::default(),
        }
    }
}

impl PipelineParams {
    /// Returns a new [`PipelineParamsBuilder`] populated with the defaults.
    pub fn builder() -> PipelineParamsBuilder {
        PipelineParamsBuilder::new()
    }

    /// Checks every value before any computation starts.
    pub fn validate(&self) -> PipelineResult<()> {
        self.beam.validate()?;
        if self.grid_size < self.support_length.max(2) {
            return Err(PipelineError::parameter(
                "grid_size",
                format!(
                    "grid of {} nodes is smaller than the derivative window {}",
                    self.grid_size, self.support_length
                ),
            ));
        }
        if self.support_length == 0 || self.support_length % 2 == 0 {
            return Err(PipelineError::parameter(
                "support_length",
                format!("must be odd, got {}", self.support_length),
            ));
        }
        if let Some(factor) = self.crop_factor {
            if !(factor > 0.0 && factor <= 1.0) {
                return Err(PipelineError::parameter(
                    "crop_factor",
                    format!("must lie in (0, 1], got {}", factor),
                ));
            }
        }
        Ok(())
    }
}

/// A convenience builder for constructing a [`PipelineParams`] instance.
///
/// The builder should be called via the [`PipelineParams::builder`] method.
///
/// See [`PipelineParams`] for details on each field.
#[derive(Debug, Clone)]
pub struct PipelineParamsBuilder {
    pub beam: BeamParams,
    pub grid_size: usize,
    pub support_length: usize,
    pub crop_factor: Option<f64>,
    pub weights: MetricWeights,
}

impl PipelineParamsBuilder {
    fn new() -> Self {
        let defaults = PipelineParams::default();
        Self {
            beam: defaults.beam,
            grid_size: defaults.grid_size,
            support_length: defaults.support_length,
            crop_factor: defaults.crop_factor,
            weights: defaults.weights,
        }
    }

    /// Sets the beam radius search parameters.
    pub fn beam(mut self, beam: BeamParams) -> Self {
        self.beam = beam;
        self
    }

    /// Sets the number of interpolation grid nodes per axis.
    pub fn grid_size(mut self, grid_size: usize) -> Self {
        self.grid_size = grid_size;
        self
    }

    /// Sets the derivative window length.
    pub fn support_length(mut self, support_length: usize) -> Self {
        self.support_length = support_length;
        self
    }

    /// Sets the crop fraction, or disables cropping with `None`.
    pub fn crop_factor(mut self, crop_factor: Option<f64>) -> Self {
        self.crop_factor = crop_factor;
        self
    }

    /// Sets the metric weights.
    pub fn weights(mut self, weights: MetricWeights) -> Self {
        self.weights = weights;
        self
    }

    /// Builds and returns a [`PipelineParams`] instance.
    pub fn build(self) -> PipelineParams {
        PipelineParams {
            beam: self.beam,
            grid_size: self.grid_size,
            support_length: self.support_length,
            crop_factor: self.crop_factor,
            weights: self.weights,
        }
    }
}

/// Parameters for scoring a batch of observations.
///
/// ### Default Values
/// - `min_sources`: `500`
/// - `max_abs_mean_ra`: `Some(10.0)` (keeps the EoR0 field only)
#[derive(Clone, Serialize, Deserialize, Debug, PartialEq)]
pub struct BatchParams {
    /// Records with fewer sources are skipped.
    pub min_sources: usize,

    /// Records whose mean RA magnitude exceeds this value are skipped.
    /// `None` disables the field screen.
    pub max_abs_mean_ra: Option<f64>,

    /// Parameters applied to every record that passes the screen.
    pub pipeline: PipelineParams,
}

impl Default for BatchParams {
    fn default() -> Self {
        BatchParams {
            min_sources: 500,
            max_abs_mean_ra: Some(10.0),
            pipeline: PipelineParams::default(),
        }
    }
}

impl BatchParams {
    /// Checks the screen and the pipeline parameters.
    pub fn validate(&self) -> PipelineResult<()> {
        if let Some(limit) = self.max_abs_mean_ra {
            if !(limit >= 0.0) {
                return Err(PipelineError::parameter(
                    "max_abs_mean_ra",
                    format!("must be non-negative, got {}", limit),
                ));
            }
        }
        self.pipeline.validate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        assert!(PipelineParams::default().validate().is_ok());
        let p = PipelineParams::default();
        assert_eq!(p.grid_size, 101);
        assert_eq!(p.beam.bins, 50);
        assert_eq!(p.weights.laplacian_std, 10.0);
    }

    #[test]
    fn builder_overrides_defaults() {
        let p = PipelineParams::builder()
            .grid_size(51)
            .support_length(5)
            .crop_factor(None)
            .build();
        assert_eq!(p.grid_size, 51);
        assert_eq!(p.support_length, 5);
        assert!(p.crop_factor.is_none());
        assert_eq!(p.beam, BeamParams::default());
    }

    #[test]
    fn out_of_range_values_are_rejected() {
        let even = PipelineParams::builder().support_length(4).build();
        assert!(matches!(
            even.validate(),
            Err(PipelineError::InvalidParameter { name: "support_length", .. })
        ));

        let crop = PipelineParams::builder().crop_factor(Some(1.5)).build();
        assert!(matches!(
            crop.validate(),
            Err(PipelineError::InvalidParameter { name: "crop_factor", .. })
        ));

        let beam = BeamParams {
            range: (10.0, 0.0),
            ..BeamParams::default()
        };
        let p = PipelineParams::builder().beam(beam).build();
        assert!(matches!(
            p.validate(),
            Err(PipelineError::InvalidParameter { name: "range", .. })
        ));

        let tiny = PipelineParams::builder().grid_size(1).build();
        assert!(matches!(
            tiny.validate(),
            Err(PipelineError::InvalidParameter { name: "grid_size", .. })
        ));
    }

    #[test]
    fn batch_screen_is_validated() {
        assert!(BatchParams::default().validate().is_ok());
        let params = BatchParams {
            max_abs_mean_ra: Some(f64::NAN),
            ..BatchParams::default()
        };
        assert!(matches!(
            params.validate(),
            Err(PipelineError::InvalidParameter { name: "max_abs_mean_ra", .. })
        ));
    }

    #[test]
    fn params_round_trip_through_json() {
        let params = BatchParams::default();
        let text = serde_json::to_string(&params).unwrap();
        let back: BatchParams = serde_json::from_str(&text).unwrap();
        assert_eq!(back, params);
    }
}
