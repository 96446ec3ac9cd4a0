/////////////////////////////////////////////////////////////////////////////////////////////
//
// Defines observation records and drives the staged scoring pipeline for a single observation.
//
// Created on: 15 Nov 2025     Author: Daniel Owen
//
// Copyright (c) 2025, Maptek Pty Ltd. All rights reserved. Licensed under the MIT License.
//
/////////////////////////////////////////////////////////////////////////////////////////////

//! # observation
//!
//! An observation is a set of radio sources, each with a position and the
//! apparent offset of that position caused by the ionosphere. Scoring runs as
//! a chain of stages, each consuming the previous stage's output by
//! reference and returning a new immutable value:
//!
//! [`Observation`] → [`BeamSelection`] → [`InterpolatedGrids`] → [`TecField`]
//! → [`TecStatistics`] → [`ObsidMetric`]
//!
//! [`Observation::obsid_metric`] runs the whole chain.

use crate::{
    beam::BeamSelection,
    config::PipelineParams,
    error::{PipelineError, PipelineResult},
    interpolation::InterpolatedGrids,
    metric::ObsidMetric,
    reconstruct::TecField,
    statistics::TecStatistics,
};
use ferreus_g2s::progress::{emit, ProgressMsg, ProgressSink};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Optional descriptive fields carried with a record. Unknown fields are
/// ignored when decoding.
#[derive(Clone, Serialize, Deserialize, Debug, Default, PartialEq)]
pub struct ObservationMetadata {
    /// Observation identifier, typically a GPS time in seconds.
    #[serde(default)]
    pub obsid: Option<u64>,
}

/// A decoded observation record: four equal-length lists.
///
/// ```
/// use ferreus_tec::ObservationData;
///
/// let json = r#"{
///     "ra": [0.0, 1.0], "dec": [-27.0, -26.5],
///     "ra_shifts": [0.01, -0.02], "dec_shifts": [0.0, 0.03],
///     "metadata": {"obsid": 1065880128}
/// }"#;
/// let data: ObservationData = serde_json::from_str(json).unwrap();
/// assert_eq!(data.metadata.unwrap().obsid, Some(1065880128));
/// ```
#[derive(Clone, Serialize, Deserialize, Debug, PartialEq)]
pub struct ObservationData {
    pub ra: Vec<f64>,
    pub dec: Vec<f64>,
    pub ra_shifts: Vec<f64>,
    pub dec_shifts: Vec<f64>,
    #[serde(default)]
    pub metadata: Option<ObservationMetadata>,
}

/// A validated observation.
#[derive(Clone, Debug, PartialEq)]
pub struct Observation {
    label: String,
    ra: Vec<f64>,
    dec: Vec<f64>,
    ra_shifts: Vec<f64>,
    dec_shifts: Vec<f64>,
}

impl Observation {
    /// Validates a decoded record.
    ///
    /// The label is `metadata.obsid` when present, otherwise `fallback_label`
    /// (for example the stem of the file the record came from).
    pub fn new(data: ObservationData, fallback_label: &str) -> PipelineResult<Self> {
        let label = match data.metadata.as_ref().and_then(|m| m.obsid) {
            Some(obsid) => obsid.to_string(),
            None => fallback_label.to_string(),
        };
        Self::from_lists(data.ra, data.dec, data.ra_shifts, data.dec_shifts, label)
    }

    /// Builds an observation from four parallel lists.
    ///
    /// # Errors
    /// [`PipelineError::InvalidRecord`] if the lists differ in length, are
    /// empty, or hold non-finite values.
    pub fn from_lists(
        ra: Vec<f64>,
        dec: Vec<f64>,
        ra_shifts: Vec<f64>,
        dec_shifts: Vec<f64>,
        label: impl Into<String>,
    ) -> PipelineResult<Self> {
        let n = ra.len();
        if dec.len() != n || ra_shifts.len() != n || dec_shifts.len() != n {
            return Err(PipelineError::InvalidRecord {
                reason: format!(
                    "lists differ in length: ra {}, dec {}, ra_shifts {}, dec_shifts {}",
                    n,
                    dec.len(),
                    ra_shifts.len(),
                    dec_shifts.len()
                ),
            });
        }
        if n == 0 {
            return Err(PipelineError::InvalidRecord {
                reason: "the record holds no sources".into(),
            });
        }

        for (name, list) in [
            ("ra", &ra),
            ("dec", &dec),
            ("ra_shifts", &ra_shifts),
            ("dec_shifts", &dec_shifts),
        ] {
            if let Some(i) = list.iter().position(|v| !v.is_finite()) {
                return Err(PipelineError::InvalidRecord {
                    reason: format!("{}[{}] is not finite", name, i),
                });
            }
        }

        Ok(Self {
            label: label.into(),
            ra,
            dec,
            ra_shifts,
            dec_shifts,
        })
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    /// Number of sources.
    pub fn len(&self) -> usize {
        self.ra.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ra.is_empty()
    }

    pub fn ra(&self) -> &[f64] {
        &self.ra
    }

    pub fn dec(&self) -> &[f64] {
        &self.dec
    }

    pub fn ra_shifts(&self) -> &[f64] {
        &self.ra_shifts
    }

    pub fn dec_shifts(&self) -> &[f64] {
        &self.dec_shifts
    }

    /// Runs every stage and returns the composite quality metric.
    ///
    /// The observation is not modified, so repeated calls return identical
    /// results.
    ///
    /// # Arguments
    /// * `params` - Pipeline configuration, validated before any work starts.
    /// * `progress` - Optional sink receiving a [`ProgressMsg::StageComplete`]
    ///   event per stage, plus any operator warnings.
    pub fn obsid_metric(
        &self,
        params: &PipelineParams,
        progress: &Option<Arc<dyn ProgressSink>>,
    ) -> PipelineResult<ObsidMetric> {
        params.validate()?;

        let stage_done = |stage: &'static str| {
            emit(
                progress,
                ProgressMsg::StageComplete {
                    label: self.label.clone(),
                    stage,
                },
            )
        };

        let selection: BeamSelection = self.select_beam(&params.beam)?;
        stage_done("beam selection");

        let grids: InterpolatedGrids = selection.interpolate(params.grid_size)?;
        stage_done("interpolation");

        let mut field: TecField = grids.reconstruct(params.support_length, progress)?;
        if let Some(factor) = params.crop_factor {
            field = field.crop(factor)?;
        }
        stage_done("reconstruction");

        let stats: TecStatistics = field.statistics(&selection);
        stage_done("statistics");

        Ok(stats.metric(&params.weights, &self.label))
    }
}
