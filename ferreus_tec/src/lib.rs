/////////////////////////////////////////////////////////////////////////////////////////////
//
// Exposes the public API and high-level documentation for ionospheric quality scoring.
//
// Created on: 15 Nov 2025     Author: Daniel Owen
//
// Copyright (c) 2025, Maptek Pty Ltd. All rights reserved. Licensed under the MIT License.
//
/////////////////////////////////////////////////////////////////////////////////////////////

//! # Ionospheric quality scoring from radio source position shifts.
//!
//! The ionosphere bends incoming radio waves, so every source in a wide-field
//! observation appears slightly away from its catalogued position. The
//! shifts trace the gradient of the total electron content (TEC) across the
//! field. This crate turns a list of shifted sources into a single quality
//! number per observation:
//!
//! - **Beam selection** ([`beam`]) - a cumulative distance histogram picks the
//!   primary beam radius and drops sidelobe sources.
//! - **Interpolation** ([`interpolation`]) - both shift components are
//!   interpolated onto a regular grid with piecewise linear triangles.
//! - **Reconstruction** ([`reconstruct`]) - the grids are integrated into a TEC
//!   field with [`ferreus_g2s::g2s`] and cropped to the well sampled centre.
//! - **Statistics and metric** ([`statistics`], [`metric`]) - shift and field
//!   statistics are combined into a weighted composite metric.
//!
//! [`batch::score_batch`] scores many records in parallel.
//!
//! # Examples
//!
//! ```
//! use ferreus_tec::{PipelineParams, TecTestFunctions};
//!
//! let obs = TecTestFunctions::gaussian_blob_observation(400, 8.0, Some(42));
//! let params = PipelineParams::builder().grid_size(51).build();
//!
//! let metric = obs.obsid_metric(&params, &None).unwrap();
//! assert!(metric.value.is_finite() && metric.value > 0.0);
//! assert_eq!(metric.terms.len(), 4);
//! ```
pub mod observation;

pub mod beam;

pub mod triangulation;

mod rtree;

pub mod interpolation;

pub mod reconstruct;

pub mod statistics;

pub mod spectrum;

pub mod metric;

pub mod config;

pub mod batch;

mod common;

pub mod error;

mod tec_test_functions;

pub use {
    batch::{BatchOutcome, BatchRecord, score_batch},
    beam::BeamSelection,
    common::generate_random_points,
    config::{BatchParams, BeamParams, MetricWeights, PipelineParams, PipelineParamsBuilder},
    error::{PipelineError, PipelineResult},
    interpolation::InterpolatedGrids,
    metric::{MetricTerm, ObsidMetric},
    observation::{Observation, ObservationData, ObservationMetadata},
    reconstruct::TecField,
    statistics::TecStatistics,
    tec_test_functions::TecTestFunctions,
};

pub use ferreus_g2s::progress;
