/////////////////////////////////////////////////////////////////////////////////////////////
//
// Wraps the `rstar` crate to find coincident control points with radius queries.
//
// Created on: 15 Nov 2025     Author: Daniel Owen 
//
// Copyright (c) 2025, Maptek Pty Ltd. All rights reserved. Licensed under the MIT License. 
//
/////////////////////////////////////////////////////////////////////////////////////////////

//! # spatial
//!
//! Wrapper module for the rstar crate.
//!
//! Bulk loads the control positions into an R-tree of indexed points and
//! radius-queries each one to find pairs that would make the Gram matrix
//! singular.

use faer::MatRef;
use rstar::RTree;
use rstar::primitives::GeomWithData;

/// A 3D point tagged with its row index.
type IndexedPoint = GeomWithData<[f64; 3], usize>;

/// A pair of control points found within the coincidence tolerance.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct CoincidentPair {
    pub first: usize,
    pub second: usize,
    pub distance: f64,
}

/// Builds an R-tree over the rows of an `N × 3` point matrix.
fn bulk_load_indexed(points: MatRef<'_, f64>) -> RTree<IndexedPoint> {
    let items = (0..points.nrows())
        .map(|i| GeomWithData::new(row_as_array(points, i), i))
        .collect();
    RTree::bulk_load(items)
}

#[inline]
fn row_as_array(points: MatRef<'_, f64>, i: usize) -> [f64; 3] {
    [points[(i, 0)], points[(i, 1)], points[(i, 2)]]
}

/// Returns the first pair `(i, j)`, `i < j`, in row order whose Euclidean
/// separation is at most `tolerance`, or `None` when all points are distinct.
///
/// `points` must have exactly three columns.
pub(crate) fn find_coincident_pair(
    points: MatRef<'_, f64>,
    tolerance: f64,
) -> Option<CoincidentPair> {
    debug_assert_eq!(points.ncols(), 3);

    if points.nrows() < 2 {
        return None;
    }

    let tree = bulk_load_indexed(points);
    let max_squared_radius = tolerance * tolerance;

    for i in 0..points.nrows() {
        let query = row_as_array(points, i);

        // Pairs with j < i were already reported from row j.
        let nearest_later = tree
            .locate_within_distance(query, max_squared_radius)
            .filter(|item| item.data > i)
            .min_by_key(|item| item.data);

        if let Some(item) = nearest_later {
            let other = item.geom();
            let distance = query
                .iter()
                .zip(other.iter())
                .map(|(a, b)| (a - b) * (a - b))
                .sum::<f64>()
                .sqrt();

            return Some(CoincidentPair {
                first: i,
                second: item.data,
                distance,
            });
        }
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use equator::assert;
    use faer::{Mat, mat};

    #[test]
    fn distinct_points_have_no_coincident_pair() {
        let points = mat![
            [0.0, 0.0, 0.0],
            [1.0, 0.0, 0.0],
            [0.0, 1.0, 0.0],
            [0.0, 0.0, 1.0f64],
        ];
        assert!(find_coincident_pair(points.as_ref(), 1e-10).is_none());
    }

    #[test]
    fn exact_duplicates_are_found_in_row_order() {
        let points = mat![
            [0.0, 0.0, 0.0],
            [1.0, 2.0, 3.0],
            [5.0, 5.0, 5.0],
            [1.0, 2.0, 3.0f64],
        ];
        let pair = find_coincident_pair(points.as_ref(), 1e-10).unwrap();
        assert!(pair.first == 1);
        assert!(pair.second == 3);
        assert!(pair.distance == 0.0);
    }

    #[test]
    fn near_duplicates_respect_the_tolerance() {
        let points = mat![[0.0, 0.0, 0.0], [0.0, 0.0, 1e-6f64]];

        assert!(find_coincident_pair(points.as_ref(), 1e-10).is_none());

        let pair = find_coincident_pair(points.as_ref(), 1e-5).unwrap();
        assert!((pair.distance - 1e-6).abs() < 1e-18);
    }

    #[test]
    fn single_point_and_empty_sets_are_trivially_distinct() {
        let one = mat![[0.5, 0.5, 0.5f64]];
        assert!(find_coincident_pair(one.as_ref(), 1.0).is_none());

        let empty = Mat::<f64>::zeros(0, 3);
        assert!(find_coincident_pair(empty.as_ref(), 1.0).is_none());
    }
}
