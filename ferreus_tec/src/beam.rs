/////////////////////////////////////////////////////////////////////////////////////////////
//
// Estimates the primary beam radius from a cumulative distance histogram and filters sources to the beam.
//
// Created on: 15 Nov 2025     Author: Daniel Owen
//
// Copyright (c) 2025, Maptek Pty Ltd. All rights reserved. Licensed under the MIT License.
//
/////////////////////////////////////////////////////////////////////////////////////////////

//! # beam
//!
//! Many sources in a wide-field observation lie in sidelobes, far from the
//! main lobe of the primary beam. Distances from the bulk centroid are
//! histogrammed and bins are accumulated outward until one more bin adds
//! only a small fraction to the running count. Sources inside that radius
//! form the beam selection used by every later stage.

use crate::{
    common::{linspace, mean},
    config::BeamParams,
    error::{PipelineError, PipelineResult},
    observation::Observation,
};

/// Equal-width histogram.
#[derive(Debug, Clone, PartialEq)]
pub struct Histogram {
    /// Count per bin.
    pub counts: Vec<usize>,

    /// `counts.len() + 1` bin edges.
    pub edges: Vec<f64>,
}

/// Histograms `values` into `bins` equal-width bins over `range`.
///
/// Every bin is half open except the last, which also holds values equal to
/// the upper edge. Values outside the range are ignored.
pub fn histogram(values: &[f64], bins: usize, range: (f64, f64)) -> Histogram {
    let (lo, hi) = range;
    let edges = linspace(lo, hi, bins + 1);
    let mut counts = vec![0usize; bins];
    if bins == 0 {
        return Histogram { counts, edges };
    }

    let norm = bins as f64 / (hi - lo);
    for &v in values {
        if !(v >= lo && v <= hi) {
            continue;
        }
        let mut idx = (((v - lo) * norm) as usize).min(bins - 1);

        // Compare against the stored edges to settle rounding at bin boundaries
        if v < edges[idx] {
            idx -= 1;
        } else if idx + 1 < bins && v >= edges[idx + 1] {
            idx += 1;
        }
        counts[idx] += 1;
    }

    Histogram { counts, edges }
}

/// Index of the bin whose left edge is the beam radius.
///
/// Starting from the first two bins, bins are added while each one grows the
/// cumulative count by more than `threshold`. A zero running count followed
/// by a positive one counts as an unbounded increase; two zeros stop the
/// search.
///
/// # Errors
/// [`PipelineError::InsufficientData`] if the growth never drops to the
/// threshold before the last bin.
pub fn stopping_bin(counts: &[usize], threshold: f64) -> PipelineResult<usize> {
    if counts.len() < 2 {
        return Err(PipelineError::insufficient(
            "beam radius",
            "the histogram needs at least two bins",
        ));
    }

    let mut old = counts[0] as f64;
    let mut new = old + counts[1] as f64;
    let mut index = 1;

    loop {
        let growth = if old > 0.0 {
            (new - old) / old
        } else if new > old {
            f64::INFINITY
        } else {
            0.0
        };
        if !(growth > threshold) {
            return Ok(index);
        }

        index += 1;
        if index >= counts.len() {
            return Err(PipelineError::insufficient(
                "beam radius",
                format!(
                    "the cumulative count was still growing by more than {} at the last bin",
                    threshold
                ),
            ));
        }
        old = new;
        new += counts[index] as f64;
    }
}

/// Sources inside the primary beam.
#[derive(Debug, Clone, PartialEq)]
pub struct BeamSelection {
    /// Centroid of every source, `[ra, dec]`.
    pub bulk_centre: [f64; 2],

    /// Beam radius, in the units of the positions.
    pub radius: f64,

    /// Centroid of the sources inside the beam, `[ra, dec]`.
    pub centre: [f64; 2],

    /// Distance histogram used to pick the radius.
    pub histogram: Histogram,

    /// Bin whose left edge is the radius.
    pub bin_index: usize,

    pub ra: Vec<f64>,
    pub dec: Vec<f64>,
    pub ra_shifts: Vec<f64>,
    pub dec_shifts: Vec<f64>,
}

impl BeamSelection {
    /// Number of sources inside the beam.
    pub fn len(&self) -> usize {
        self.ra.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ra.is_empty()
    }

    /// Positions as `[ra, dec]` pairs.
    pub fn positions(&self) -> Vec<[f64; 2]> {
        self.ra
            .iter()
            .zip(self.dec.iter())
            .map(|(&r, &d)| [r, d])
            .collect()
    }
}

impl Observation {
    /// Finds the primary beam and keeps the sources strictly inside it.
    ///
    /// # Errors
    /// * [`PipelineError::InvalidParameter`] for invalid `params`.
    /// * [`PipelineError::InsufficientData`] if the radius search does not
    ///   terminate or no source falls inside the beam.
    pub fn select_beam(&self, params: &BeamParams) -> PipelineResult<BeamSelection> {
        params.validate()?;

        let bulk_centre = [mean(self.ra()), mean(self.dec())];
        let distances: Vec<f64> = self
            .ra()
            .iter()
            .zip(self.dec().iter())
            .map(|(r, d)| (r - bulk_centre[0]).hypot(d - bulk_centre[1]))
            .collect();

        let histogram = histogram(&distances, params.bins, params.range);
        let bin_index = stopping_bin(&histogram.counts, params.increase_threshold)?;
        let radius = histogram.edges[bin_index];

        let keep: Vec<usize> = (0..distances.len())
            .filter(|&i| distances[i] < radius)
            .collect();
        if keep.is_empty() {
            return Err(PipelineError::insufficient(
                "beam selection",
                format!("no sources lie within {} of the centre", radius),
            ));
        }

        let pick = |values: &[f64]| keep.iter().map(|&i| values[i]).collect::<Vec<f64>>();
        let ra = pick(self.ra());
        let dec = pick(self.dec());
        let ra_shifts = pick(self.ra_shifts());
        let dec_shifts = pick(self.dec_shifts());

        Ok(BeamSelection {
            bulk_centre,
            radius,
            centre: [mean(&ra), mean(&dec)],
            histogram,
            bin_index,
            ra,
            dec,
            ra_shifts,
            dec_shifts,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tec_test_functions::TecTestFunctions;

    #[test]
    fn histogram_edges_and_closure() {
        let h = histogram(&[0.0, 2.5, 4.99, 5.0, 125.0, 130.0, -1.0], 50, (0.0, 125.0));
        assert_eq!(h.edges.len(), 51);
        assert_eq!(h.edges[1], 2.5);
        assert_eq!(h.counts[0], 1);
        assert_eq!(h.counts[1], 2);
        assert_eq!(h.counts[2], 1);
        assert_eq!(h.counts[49], 1, "upper edge is in the last bin");
        assert_eq!(h.counts.iter().sum::<usize>(), 5);
    }

    #[test]
    fn stopping_rule_follows_cumulative_growth() {
        // 10 -> 30 (+200%) -> 40 (+33%) -> 41 (+2.5%) stops at index 3
        assert_eq!(stopping_bin(&[10, 20, 10, 1, 0, 0], 0.05).unwrap(), 3);

        // Growth stays above the threshold into the last bin
        assert!(matches!(
            stopping_bin(&[1, 5, 10, 20], 0.05),
            Err(PipelineError::InsufficientData { .. })
        ));

        // Empty leading bin counts as unbounded growth
        assert_eq!(stopping_bin(&[0, 4, 0, 0], 0.05).unwrap(), 2);

        // Nothing at all stops immediately
        assert_eq!(stopping_bin(&[0, 0, 0], 0.05).unwrap(), 1);
    }

    #[test]
    fn sidelobe_sources_are_excluded() {
        let obs = TecTestFunctions::sidelobe_observation(800, 200, Some(4));
        let selection = obs.select_beam(&BeamParams::default()).unwrap();

        assert!(selection.radius < 25.0, "radius {}", selection.radius);
        assert!(selection.len() >= 700 && selection.len() < 1000);
        assert!(selection.centre[0].abs() < 1.5 && (selection.centre[1] + 27.0).abs() < 1.5);
    }

    #[test]
    fn radius_is_deterministic() {
        let obs = TecTestFunctions::sidelobe_observation(500, 100, Some(12));
        let a = obs.select_beam(&BeamParams::default()).unwrap();
        let b = obs.select_beam(&BeamParams::default()).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn radius_scales_with_positions_and_range() {
        let obs = TecTestFunctions::sidelobe_observation(500, 100, Some(21));
        let base = obs.select_beam(&BeamParams::default()).unwrap();

        for s in [0.25, 2.0, 8.0] {
            let scaled = Observation::from_lists(
                obs.ra().iter().map(|v| v * s).collect(),
                obs.dec().iter().map(|v| v * s).collect(),
                obs.ra_shifts().to_vec(),
                obs.dec_shifts().to_vec(),
                "scaled",
            )
            .unwrap();
            let params = BeamParams {
                range: (0.0, 125.0 * s),
                ..BeamParams::default()
            };
            let sel = scaled.select_beam(&params).unwrap();

            assert_eq!(sel.bin_index, base.bin_index);
            assert_eq!(sel.radius, base.radius * s);
            assert_eq!(sel.len(), base.len());
        }
    }

    #[test]
    fn far_away_sources_leave_an_empty_beam() {
        // Two clusters 400 apart: every distance exceeds the histogram range
        let obs = Observation::from_lists(
            vec![-200.0, -200.0, 200.0, 200.0],
            vec![0.0, 1.0, 0.0, 1.0],
            vec![0.0; 4],
            vec![0.0; 4],
            "split",
        )
        .unwrap();
        assert!(matches!(
            obs.select_beam(&BeamParams::default()),
            Err(PipelineError::InsufficientData { .. })
        ));
    }
}
