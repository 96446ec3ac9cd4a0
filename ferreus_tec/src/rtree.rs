/////////////////////////////////////////////////////////////////////////////////////////////
//
// Wraps the `rstar` crate to index triangle bounding boxes for point location queries.
//
// Created on: 15 Nov 2025     Author: Daniel Owen
//
// Copyright (c) 2025, Maptek Pty Ltd. All rights reserved. Licensed under the MIT License.
//
/////////////////////////////////////////////////////////////////////////////////////////////

//! # rtree
//!
//! Wrapper module for the rstar crate.
//!
//! Builds an R-tree of axis aligned extent rectangles, each tagged with the
//! index of the item it bounds, and answers "which rectangles contain this
//! point" queries.

use rstar::primitives::{GeomWithData, Rectangle};
use rstar::{AABB, RTree};

/// A wrapper that holds an AABB rectangle and usize index.
type IndexedRect = GeomWithData<Rectangle<[f64; 2]>, usize>;

/// R-tree over 2D extents `[min_x, min_y, max_x, max_y]`.
pub struct ExtentRTree {
    tree: RTree<IndexedRect>,
}

fn rectangle_from_extents(extents: &[f64; 4]) -> Rectangle<[f64; 2]> {
    Rectangle::from_corners([extents[0], extents[1]], [extents[2], extents[3]])
}

impl ExtentRTree {
    /// Bulk loads the tree from `(index, extents)` pairs.
    pub fn from_extents<I>(items: I) -> Self
    where
        I: IntoIterator<Item = (usize, [f64; 4])>,
    {
        let rects = items
            .into_iter()
            .map(|(idx, ext)| GeomWithData::new(rectangle_from_extents(&ext), idx))
            .collect::<Vec<_>>();

        Self {
            tree: RTree::bulk_load(rects),
        }
    }

    /// Indices of every rectangle containing `point`, boundary included.
    pub fn containing(&self, point: [f64; 2]) -> Vec<usize> {
        let envelope = AABB::from_point(point);
        self.tree
            .locate_in_envelope_intersecting(&envelope)
            .map(|item| item.data)
            .collect()
    }

    pub fn len(&self) -> usize {
        self.tree.size()
    }

    pub fn is_empty(&self) -> bool {
        self.tree.size() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rtree_point_queries() {
        // squares: [0,0]-[1,1], [1,0]-[2,1], [3,3]-[4,4]
        let tree = ExtentRTree::from_extents(vec![
            (0, [0.0, 0.0, 1.0, 1.0]),
            (1, [1.0, 0.0, 2.0, 1.0]),
            (2, [3.0, 3.0, 4.0, 4.0]),
        ]);
        assert_eq!(tree.len(), 3);

        let mut n = tree.containing([1.0, 0.5]);
        n.sort();
        assert_eq!(n, vec![0, 1], "shared edge belongs to both squares");

        assert_eq!(tree.containing([3.5, 3.5]), vec![2]);
        assert!(tree.containing([10.0, 10.0]).is_empty());
    }

    #[test]
    fn empty_tree_finds_nothing() {
        let tree = ExtentRTree::from_extents(Vec::new());
        assert!(tree.is_empty());
        assert!(tree.containing([0.0, 0.0]).is_empty());
    }
}
