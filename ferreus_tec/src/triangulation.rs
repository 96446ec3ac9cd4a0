/////////////////////////////////////////////////////////////////////////////////////////////
//
// Builds Delaunay triangulations of scattered 2D points with the Bowyer-Watson algorithm.
//
// Created on: 15 Nov 2025     Author: Daniel Owen
//
// Copyright (c) 2025, Maptek Pty Ltd. All rights reserved. Licensed under the MIT License.
//
/////////////////////////////////////////////////////////////////////////////////////////////

//! # triangulation
//!
//! Incremental Delaunay triangulation, following `1` and `2`.
//!
//! Points are inserted one at a time into a large enclosing triangle. Every
//! triangle whose circumcircle contains the new point is removed and the
//! resulting cavity is re-triangulated by joining its boundary to the point.
//! Work is done in coordinates normalised to the unit box around the data so
//! the predicates behave the same for any input scale.
//!
//! # References
//! 1. A. Bowyer. Computing Dirichlet tessellations. The Computer Journal,
//!    24(2):162–166, 1981.
//! 2. D. F. Watson. Computing the n-dimensional Delaunay tessellation with
//!    application to Voronoi polytopes. The Computer Journal, 24(2):167–172, 1981.

use std::collections::HashSet;

/// Triangles with a normalised doubled area below this are discarded.
const AREA_TOLERANCE: f64 = 1e-13;

/// Slack on the orientation test when locating the triangle holding a point.
const LOCATE_TOLERANCE: f64 = 1e-13;

/// Size of the enclosing triangle relative to the normalised data box. Far
/// enough out that its circumcircles barely bulge past the convex hull.
const SUPER_SCALE: f64 = 1000.0;

/// Relative margin that keeps cocircular points out of the cavity.
const INCIRCLE_MARGIN: f64 = 1e-12;

/// A Delaunay triangulation of a 2D point set.
#[derive(Debug, Clone)]
pub struct Triangulation {
    points: Vec<[f64; 2]>,
    triangles: Vec<[usize; 3]>,
}

#[derive(Debug, Clone, Copy)]
struct Triangle {
    v: [usize; 3],
    centre: [f64; 2],
    radius_sq: f64,
}

#[inline]
fn orient(a: [f64; 2], b: [f64; 2], c: [f64; 2]) -> f64 {
    (b[0] - a[0]) * (c[1] - a[1]) - (b[1] - a[1]) * (c[0] - a[0])
}

/// Circumcentre and squared circumradius. Collinear triangles get a `NaN`
/// radius, which no in-circle test accepts.
fn circumcircle(a: [f64; 2], b: [f64; 2], c: [f64; 2]) -> ([f64; 2], f64) {
    let d = 2.0 * (a[0] * (b[1] - c[1]) + b[0] * (c[1] - a[1]) + c[0] * (a[1] - b[1]));
    if d == 0.0 {
        return ([f64::NAN, f64::NAN], f64::NAN);
    }

    let a2 = a[0] * a[0] + a[1] * a[1];
    let b2 = b[0] * b[0] + b[1] * b[1];
    let c2 = c[0] * c[0] + c[1] * c[1];

    let ux = (a2 * (b[1] - c[1]) + b2 * (c[1] - a[1]) + c2 * (a[1] - b[1])) / d;
    let uy = (a2 * (c[0] - b[0]) + b2 * (a[0] - c[0]) + c2 * (b[0] - a[0])) / d;
    let radius_sq = (a[0] - ux).powi(2) + (a[1] - uy).powi(2);

    ([ux, uy], radius_sq)
}

impl Triangle {
    fn new(v: [usize; 3], verts: &[[f64; 2]]) -> Self {
        let (centre, radius_sq) = circumcircle(verts[v[0]], verts[v[1]], verts[v[2]]);
        Self { v, centre, radius_sq }
    }

    #[inline]
    fn circumcircle_contains(&self, p: [f64; 2]) -> bool {
        let d2 = (p[0] - self.centre[0]).powi(2) + (p[1] - self.centre[1]).powi(2);
        d2 < self.radius_sq * (1.0 - INCIRCLE_MARGIN)
    }

    #[inline]
    fn contains(&self, p: [f64; 2], verts: &[[f64; 2]]) -> bool {
        let [a, b, c] = self.v;
        orient(verts[a], verts[b], p) >= -LOCATE_TOLERANCE
            && orient(verts[b], verts[c], p) >= -LOCATE_TOLERANCE
            && orient(verts[c], verts[a], p) >= -LOCATE_TOLERANCE
    }

    #[inline]
    fn edges(&self) -> [(usize, usize); 3] {
        let [a, b, c] = self.v;
        [(a, b), (b, c), (c, a)]
    }
}

/// Grows the cavity from the triangle holding the point through bad
/// triangles that share an edge with it.
fn connected_cavity(seed: usize, bad: &[usize], triangles: &[Triangle]) -> Vec<usize> {
    let mut cavity = vec![seed];
    let mut edges: HashSet<(usize, usize)> = triangles[seed].edges().into_iter().collect();
    let mut remaining: Vec<usize> = bad.iter().cloned().filter(|&t| t != seed).collect();

    loop {
        let before = remaining.len();
        remaining.retain(|&t| {
            let touches = triangles[t]
                .edges()
                .iter()
                .any(|&(a, b)| edges.contains(&(b, a)));
            if touches {
                cavity.push(t);
                edges.extend(triangles[t].edges());
            }
            !touches
        });
        if remaining.len() == before {
            break;
        }
    }

    cavity
}

impl Triangulation {
    /// Triangulates `points`. Exact duplicates are inserted once.
    ///
    /// Fewer than three distinct points, or points that are all collinear,
    /// give an empty triangulation.
    pub fn new(points: &[[f64; 2]]) -> Self {
        let n = points.len();
        let empty = Self {
            points: points.to_vec(),
            triangles: Vec::new(),
        };
        if n < 3 {
            return empty;
        }

        let (mut min_x, mut min_y) = (f64::INFINITY, f64::INFINITY);
        let (mut max_x, mut max_y) = (f64::NEG_INFINITY, f64::NEG_INFINITY);
        for p in points {
            min_x = min_x.min(p[0]);
            min_y = min_y.min(p[1]);
            max_x = max_x.max(p[0]);
            max_y = max_y.max(p[1]);
        }
        let delta = (max_x - min_x).max(max_y - min_y);
        if !(delta > 0.0) || !delta.is_finite() {
            return empty;
        }
        let mid = [0.5 * (min_x + max_x), 0.5 * (min_y + max_y)];

        // Normalised points followed by the enclosing triangle
        let mut verts: Vec<[f64; 2]> = points
            .iter()
            .map(|p| [(p[0] - mid[0]) / delta, (p[1] - mid[1]) / delta])
            .collect();
        verts.push([-SUPER_SCALE, -0.5 * SUPER_SCALE]);
        verts.push([SUPER_SCALE, -0.5 * SUPER_SCALE]);
        verts.push([0.0, SUPER_SCALE]);

        let mut triangles = vec![Triangle::new([n, n + 1, n + 2], &verts)];
        let mut seen: HashSet<(u64, u64)> = HashSet::with_capacity(n);

        for (i, p) in points.iter().enumerate() {
            // Adding 0.0 folds -0.0 into 0.0
            if !seen.insert(((p[0] + 0.0).to_bits(), (p[1] + 0.0).to_bits())) {
                continue;
            }
            let q = verts[i];

            let mut bad: Vec<usize> = (0..triangles.len())
                .filter(|&t| triangles[t].circumcircle_contains(q))
                .collect();

            let seed = match bad.iter().cloned().find(|&t| triangles[t].contains(q, &verts)) {
                Some(t) => t,
                None => match (0..triangles.len()).find(|&t| triangles[t].contains(q, &verts)) {
                    Some(t) => {
                        bad.push(t);
                        t
                    }
                    None => continue,
                },
            };

            let cavity = connected_cavity(seed, &bad, &triangles);

            let cavity_edges: HashSet<(usize, usize)> = cavity
                .iter()
                .flat_map(|&t| triangles[t].edges())
                .collect();
            let boundary: Vec<(usize, usize)> = cavity_edges
                .iter()
                .cloned()
                .filter(|&(a, b)| !cavity_edges.contains(&(b, a)))
                .collect();

            let mut remove = vec![false; triangles.len()];
            cavity.iter().for_each(|&t| remove[t] = true);
            let mut idx = 0;
            triangles.retain(|_| {
                let keep = !remove[idx];
                idx += 1;
                keep
            });

            for (a, b) in boundary {
                triangles.push(Triangle::new([a, b, i], &verts));
            }
        }

        // Deterministic output order regardless of hash iteration order
        let mut triangles: Vec<[usize; 3]> = triangles
            .into_iter()
            .filter(|t| t.v.iter().all(|&v| v < n))
            .filter(|t| orient(verts[t.v[0]], verts[t.v[1]], verts[t.v[2]]) > AREA_TOLERANCE)
            .map(|t| {
                let v = t.v;
                let k = (0..3).min_by_key(|&k| v[k]).unwrap_or(0);
                [v[k], v[(k + 1) % 3], v[(k + 2) % 3]]
            })
            .collect();
        triangles.sort_unstable();

        Self {
            points: points.to_vec(),
            triangles,
        }
    }

    /// The input points, unnormalised.
    pub fn points(&self) -> &[[f64; 2]] {
        &self.points
    }

    /// Vertex indices of each counter-clockwise triangle.
    pub fn triangles(&self) -> &[[usize; 3]] {
        &self.triangles
    }

    pub fn len(&self) -> usize {
        self.triangles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.triangles.is_empty()
    }

    /// Corner coordinates of triangle `t`.
    pub fn corners(&self, t: usize) -> [[f64; 2]; 3] {
        let [a, b, c] = self.triangles[t];
        [self.points[a], self.points[b], self.points[c]]
    }

    /// Bounding box `[min_x, min_y, max_x, max_y]` of triangle `t`.
    pub fn extents(&self, t: usize) -> [f64; 4] {
        let c = self.corners(t);
        [
            c[0][0].min(c[1][0]).min(c[2][0]),
            c[0][1].min(c[1][1]).min(c[2][1]),
            c[0][0].max(c[1][0]).max(c[2][0]),
            c[0][1].max(c[1][1]).max(c[2][1]),
        ]
    }

    /// Barycentric weights of `p` in triangle `t`, or `None` if `p` falls
    /// outside it (a small relative slack admits points on the edges).
    pub fn barycentric(&self, t: usize, p: [f64; 2]) -> Option<[f64; 3]> {
        let [a, b, c] = self.corners(t);
        let area = orient(a, b, c);
        if !(area > 0.0) {
            return None;
        }
        let l0 = orient(b, c, p) / area;
        let l1 = orient(c, a, p) / area;
        let l2 = 1.0 - l0 - l1;

        let slack = -1e-10;
        match l0 >= slack && l1 >= slack && l2 >= slack {
            true => Some([l0, l1, l2]),
            false => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::generate_random_points;

    fn area(tri: &Triangulation, t: usize) -> f64 {
        let [a, b, c] = tri.corners(t);
        0.5 * orient(a, b, c)
    }

    fn total_area(tri: &Triangulation) -> f64 {
        (0..tri.len()).map(|t| area(tri, t)).sum()
    }

    fn square_with_interior(n: usize, seed: u64) -> Vec<[f64; 2]> {
        let pts = generate_random_points(n, Some(seed));
        let mut out = vec![[0.0, 0.0], [1.0, 0.0], [1.0, 1.0], [0.0, 1.0]];
        for i in 0..n {
            out.push([0.02 + 0.96 * pts[(i, 0)], 0.02 + 0.96 * pts[(i, 1)]]);
        }
        out
    }

    #[test]
    fn unit_square_gives_two_triangles() {
        let tri = Triangulation::new(&[[0.0, 0.0], [1.0, 0.0], [1.0, 1.0], [0.0, 1.0]]);
        assert_eq!(tri.len(), 2);
        assert!((total_area(&tri) - 1.0).abs() < 1e-12);
        for t in 0..tri.len() {
            assert!(area(&tri, t) > 0.0);
        }
    }

    #[test]
    fn random_points_cover_the_hull() {
        let pts = square_with_interior(200, 3);
        let tri = Triangulation::new(&pts);

        // 2n - 2 - h triangles for n points with h on the hull
        assert_eq!(tri.len(), 2 * pts.len() - 2 - 4);
        assert!((total_area(&tri) - 1.0).abs() < 1e-9);
    }

    #[test]
    fn empty_circumcircle_property() {
        let pts = square_with_interior(120, 11);
        let tri = Triangulation::new(&pts);
        for t in tri.triangles() {
            let (centre, r2) = circumcircle(pts[t[0]], pts[t[1]], pts[t[2]]);
            for (k, p) in pts.iter().enumerate() {
                if t.contains(&k) {
                    continue;
                }
                let d2 = (p[0] - centre[0]).powi(2) + (p[1] - centre[1]).powi(2);
                assert!(d2 >= r2 * (1.0 - 1e-9), "point {} inside circumcircle of {:?}", k, t);
            }
        }
    }

    #[test]
    fn lattice_points_triangulate_cleanly() {
        let mut pts = Vec::new();
        for i in 0..6 {
            for j in 0..5 {
                pts.push([i as f64 * 0.5, j as f64 * 0.5]);
            }
        }
        let tri = Triangulation::new(&pts);
        assert_eq!(tri.len(), 2 * 5 * 4);
        assert!((total_area(&tri) - 2.5 * 2.0).abs() < 1e-9);
    }

    #[test]
    fn degenerate_inputs_are_empty() {
        assert!(Triangulation::new(&[[0.0, 0.0], [1.0, 1.0]]).is_empty());
        assert!(Triangulation::new(&[[0.0, 0.0], [1.0, 1.0], [2.0, 2.0], [3.0, 3.0]]).is_empty());
        assert!(Triangulation::new(&[[1.0, 1.0]; 5]).is_empty());
    }

    #[test]
    fn duplicates_are_ignored() {
        let pts = vec![
            [0.0, 0.0],
            [1.0, 0.0],
            [0.0, 1.0],
            [1.0, 0.0],
            [1.0, 1.0],
            [-0.0, 0.0],
        ];
        let tri = Triangulation::new(&pts);
        assert_eq!(tri.len(), 2);
        assert!((total_area(&tri) - 1.0).abs() < 1e-12);
    }

    #[test]
    fn barycentric_weights_reproduce_the_point() {
        let tri = Triangulation::new(&[[0.0, 0.0], [2.0, 0.0], [0.0, 2.0]]);
        assert_eq!(tri.len(), 1);
        let w = tri.barycentric(0, [0.5, 0.5]).unwrap();
        let c = tri.corners(0);
        let x = w[0] * c[0][0] + w[1] * c[1][0] + w[2] * c[2][0];
        let y = w[0] * c[0][1] + w[1] * c[1][1] + w[2] * c[2][1];
        assert!((x - 0.5).abs() < 1e-14 && (y - 0.5).abs() < 1e-14);
        assert!((w.iter().sum::<f64>() - 1.0).abs() < 1e-14);

        assert!(tri.barycentric(0, [1.0, 1.0]).is_some(), "hypotenuse is inside");
        assert!(tri.barycentric(0, [1.5, 1.5]).is_none());
    }
}
