/////////////////////////////////////////////////////////////////////////////////////////////
//
// Combines observation statistics into the weighted composite quality metric.
//
// Created on: 15 Nov 2025     Author: Daniel Owen
//
// Copyright (c) 2025, Maptek Pty Ltd. All rights reserved. Licensed under the MIT License.
//
/////////////////////////////////////////////////////////////////////////////////////////////

use crate::{config::MetricWeights, statistics::TecStatistics};
use serde::Serialize;

/// One weighted term of the metric.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct MetricTerm {
    pub name: &'static str,
    pub statistic: f64,
    pub weight: f64,
}

impl MetricTerm {
    #[inline]
    pub fn contribution(&self) -> f64 {
        self.statistic * self.weight
    }
}

/// Composite quality metric of one observation. Larger values indicate
/// stronger ionospheric activity.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ObsidMetric {
    pub label: String,
    pub value: f64,
    pub terms: Vec<MetricTerm>,
    pub statistics: TecStatistics,
}

impl TecStatistics {
    /// Weighted sum of median |RA shift|, median |Dec shift|, field std and
    /// Laplacian std.
    pub fn metric(&self, weights: &MetricWeights, label: &str) -> ObsidMetric {
        let terms = vec![
            MetricTerm {
                name: "median(|ra_shifts|)",
                statistic: self.median_abs_ra_shift,
                weight: weights.median_ra,
            },
            MetricTerm {
                name: "median(|dec_shifts|)",
                statistic: self.median_abs_dec_shift,
                weight: weights.median_dec,
            },
            MetricTerm {
                name: "std(tec)",
                statistic: self.tec_std,
                weight: weights.tec_std,
            },
            MetricTerm {
                name: "std(laplacian(tec))",
                statistic: self.laplacian_std,
                weight: weights.laplacian_std,
            },
        ];

        ObsidMetric {
            label: label.to_string(),
            value: terms.iter().map(MetricTerm::contribution).sum(),
            terms,
            statistics: *self,
        }
    }
}
