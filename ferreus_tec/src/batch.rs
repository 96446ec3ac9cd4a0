/////////////////////////////////////////////////////////////////////////////////////////////
//
// Screens and scores batches of observation records in parallel.
//
// Created on: 15 Nov 2025     Author: Daniel Owen
//
// Copyright (c) 2025, Maptek Pty Ltd. All rights reserved. Licensed under the MIT License.
//
/////////////////////////////////////////////////////////////////////////////////////////////

//! # batch
//!
//! Every record is an independent job. Records are decoded, screened and
//! scored on the rayon thread pool; a failure is reported for its own record
//! and never stops the others. Outcomes come back in input order.

use crate::{
    common::mean,
    config::BatchParams,
    error::{PipelineError, PipelineResult},
    metric::ObsidMetric,
    observation::{Observation, ObservationData},
};
use ferreus_g2s::progress::{ProgressMsg, ProgressSink, batch_fraction, emit};
use rayon::prelude::*;
use std::sync::{
    Arc,
    atomic::{AtomicUsize, Ordering},
};

/// A decoded record awaiting scoring.
#[derive(Debug, Clone, PartialEq)]
pub struct BatchRecord {
    /// Label used when the record carries no obsid, typically the file stem.
    pub fallback_label: String,
    pub data: ObservationData,
}

impl BatchRecord {
    pub fn new(fallback_label: impl Into<String>, data: ObservationData) -> Self {
        Self {
            fallback_label: fallback_label.into(),
            data,
        }
    }

    /// The obsid when present, otherwise the fallback label.
    pub fn label(&self) -> String {
        match self.data.metadata.as_ref().and_then(|m| m.obsid) {
            Some(obsid) => obsid.to_string(),
            None => self.fallback_label.clone(),
        }
    }
}

/// Result of one record.
#[derive(Debug, Clone, PartialEq)]
pub enum BatchOutcome {
    Scored(ObsidMetric),
    Skipped { label: String, reason: String },
    Failed { label: String, error: PipelineError },
}

impl BatchOutcome {
    pub fn label(&self) -> &str {
        match self {
            BatchOutcome::Scored(metric) => &metric.label,
            BatchOutcome::Skipped { label, .. } | BatchOutcome::Failed { label, .. } => label,
        }
    }

    /// The metric of a scored record.
    pub fn metric(&self) -> Option<&ObsidMetric> {
        match self {
            BatchOutcome::Scored(metric) => Some(metric),
            _ => None,
        }
    }
}

/// Reason to leave `obs` out of the batch, if any.
pub fn screen(obs: &Observation, params: &BatchParams) -> Option<String> {
    if obs.len() < params.min_sources {
        return Some(format!(
            "{} sources, fewer than the minimum of {}",
            obs.len(),
            params.min_sources
        ));
    }
    if let Some(limit) = params.max_abs_mean_ra {
        let mean_ra = mean(obs.ra());
        if mean_ra.abs() > limit {
            return Some(format!(
                "mean RA {:.3} lies outside ±{} of the field centre",
                mean_ra, limit
            ));
        }
    }
    None
}

fn score_record(
    record: BatchRecord,
    params: &BatchParams,
    progress: &Option<Arc<dyn ProgressSink>>,
) -> BatchOutcome {
    let label = record.label();
    let failed = |error: PipelineError| {
        emit(
            progress,
            ProgressMsg::RecordFailed {
                label: label.clone(),
                error: error.to_string(),
            },
        );
        BatchOutcome::Failed {
            label: label.clone(),
            error,
        }
    };

    let obs = match Observation::new(record.data, &record.fallback_label) {
        Ok(obs) => obs,
        Err(e) => return failed(e),
    };

    if let Some(reason) = screen(&obs, params) {
        emit(
            progress,
            ProgressMsg::RecordSkipped {
                label: label.clone(),
                reason: reason.clone(),
            },
        );
        return BatchOutcome::Skipped {
            label: label.clone(),
            reason,
        };
    }

    match obs.obsid_metric(&params.pipeline, progress) {
        Ok(metric) => BatchOutcome::Scored(metric),
        Err(e) => failed(e),
    }
}

/// Scores every record in parallel.
///
/// # Errors
/// [`PipelineError::InvalidParameter`] if `params` is invalid. Problems with
/// individual records are reported in their [`BatchOutcome`].
pub fn score_batch(
    records: Vec<BatchRecord>,
    params: &BatchParams,
    progress: &Option<Arc<dyn ProgressSink>>,
) -> PipelineResult<Vec<BatchOutcome>> {
    params.validate()?;

    let total = records.len();
    let completed = AtomicUsize::new(0);

    let outcomes = records
        .into_par_iter()
        .map(|record| {
            let outcome = score_record(record, params, progress);
            let done = completed.fetch_add(1, Ordering::Relaxed) + 1;
            emit(
                progress,
                ProgressMsg::BatchProgress {
                    completed: done,
                    total,
                    progress: batch_fraction(done, total),
                },
            );
            outcome
        })
        .collect();

    Ok(outcomes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        common::linspace, config::PipelineParams, observation::ObservationMetadata,
        tec_test_functions::TecTestFunctions,
    };
    use std::sync::Mutex;

    #[derive(Debug, Default)]
    struct Collect(Mutex<Vec<ProgressMsg>>);

    impl ProgressSink for Collect {
        fn emit(&self, msg: ProgressMsg) {
            self.0.lock().unwrap().push(msg);
        }
    }

    fn data_of(obs: &Observation, obsid: Option<u64>) -> ObservationData {
        ObservationData {
            ra: obs.ra().to_vec(),
            dec: obs.dec().to_vec(),
            ra_shifts: obs.ra_shifts().to_vec(),
            dec_shifts: obs.dec_shifts().to_vec(),
            metadata: obsid.map(|obsid| ObservationMetadata { obsid: Some(obsid) }),
        }
    }

    fn mixed_batch() -> Vec<BatchRecord> {
        let good = TecTestFunctions::gaussian_blob_observation(600, 8.0, Some(2));
        let small = TecTestFunctions::gaussian_blob_observation(100, 8.0, Some(3));

        let mut off_field = data_of(&good, None);
        off_field.ra.iter_mut().for_each(|r| *r += 60.0);

        let mut malformed = data_of(&good, None);
        malformed.dec.pop();

        let n = 600;
        let collinear = ObservationData {
            ra: linspace(-5.0, 5.0, n),
            dec: vec![-27.0; n],
            ra_shifts: vec![0.01; n],
            dec_shifts: vec![0.0; n],
            metadata: None,
        };

        vec![
            BatchRecord::new("good", data_of(&good, Some(1065880128))),
            BatchRecord::new("small", data_of(&small, None)),
            BatchRecord::new("off_field", off_field),
            BatchRecord::new("malformed", malformed),
            BatchRecord::new("collinear", collinear),
        ]
    }

    #[test]
    fn outcomes_follow_input_order() {
        let outcomes = score_batch(mixed_batch(), &BatchParams::default(), &None).unwrap();
        let labels: Vec<&str> = outcomes.iter().map(|o| o.label()).collect();
        assert_eq!(
            labels,
            vec!["1065880128", "small", "off_field", "malformed", "collinear"]
        );

        assert!(outcomes[0].metric().is_some_and(|m| m.value.is_finite()));
        assert!(matches!(outcomes[1], BatchOutcome::Skipped { .. }));
        assert!(matches!(outcomes[2], BatchOutcome::Skipped { .. }));
        assert!(matches!(
            outcomes[3],
            BatchOutcome::Failed {
                error: PipelineError::InvalidRecord { .. },
                ..
            }
        ));
        assert!(matches!(
            outcomes[4],
            BatchOutcome::Failed {
                error: PipelineError::InsufficientData { .. },
                ..
            }
        ));
    }

    #[test]
    fn field_screen_can_be_disabled() {
        let obs = TecTestFunctions::gaussian_blob_observation(50, 8.0, Some(4));
        let mut data = data_of(&obs, None);
        data.ra.iter_mut().for_each(|r| *r += 60.0);
        let moved = Observation::new(data, "moved").unwrap();

        let params = BatchParams {
            min_sources: 10,
            ..BatchParams::default()
        };
        assert!(screen(&moved, &params).is_some());

        let open = BatchParams {
            max_abs_mean_ra: None,
            ..params
        };
        assert!(screen(&moved, &open).is_none());
    }

    #[test]
    fn progress_reports_every_record() {
        let sink = Arc::new(Collect::default());
        let progress: Option<Arc<dyn ProgressSink>> = Some(sink.clone());
        let params = BatchParams {
            pipeline: PipelineParams::builder().grid_size(41).build(),
            ..BatchParams::default()
        };

        score_batch(mixed_batch(), &params, &progress).unwrap();

        let msgs = sink.0.lock().unwrap();
        let mut done: Vec<usize> = msgs
            .iter()
            .filter_map(|m| match m {
                ProgressMsg::BatchProgress { completed, total, .. } => {
                    assert_eq!(*total, 5);
                    Some(*completed)
                }
                _ => None,
            })
            .collect();
        done.sort_unstable();
        assert_eq!(done, vec![1, 2, 3, 4, 5]);

        let skipped = msgs
            .iter()
            .filter(|m| matches!(m, ProgressMsg::RecordSkipped { .. }))
            .count();
        let failed = msgs
            .iter()
            .filter(|m| matches!(m, ProgressMsg::RecordFailed { .. }))
            .count();
        assert_eq!((skipped, failed), (2, 2));
    }

    #[test]
    fn invalid_params_are_rejected_up_front() {
        let params = BatchParams {
            pipeline: PipelineParams::builder().support_length(4).build(),
            ..BatchParams::default()
        };
        assert!(matches!(
            score_batch(mixed_batch(), &params, &None),
            Err(PipelineError::InvalidParameter { .. })
        ));
    }
}
