/////////////////////////////////////////////////////////////////////////////////////////////
//
// Holds control positions with their prescribed displacements and validates array shapes.
//
// Created on: 15 Nov 2025     Author: Daniel Owen 
//
// Copyright (c) 2025, Maptek Pty Ltd. All rights reserved. Licensed under the MIT License. 
//
/////////////////////////////////////////////////////////////////////////////////////////////

use crate::{
    error::{MorphError, MorphResult},
    spatial,
};
use faer::{Mat, MatRef};

/// Number of spatial dimensions handled by the morph.
pub const DIMENSIONS: usize = 3;

/// Control positions paired row-for-row with their prescribed displacements.
///
/// Both matrices are `N × 3`, `N >= 1`, with finite entries. Row `i` of
/// `displacements` is the displacement prescribed at row `i` of `positions`.
#[derive(Debug, Clone, PartialEq)]
pub struct ControlPoints {
    positions: Mat<f64>,
    displacements: Mat<f64>,
}

impl ControlPoints {
    /// Validates and pairs control positions with displacements.
    ///
    /// # Examples
    ///
    /// ```
    /// use faer::mat;
    /// use morph_rbf::{ControlPoints, ErrorKind};
    ///
    /// let positions = mat![[0.0, 0.0, 0.0], [1.0, 0.0, 0.0f64]];
    /// let displacements = mat![[0.0, 0.0, 0.0], [0.0, 0.0, 1.0f64]];
    /// let control_points = ControlPoints::new(positions.clone(), displacements).unwrap();
    /// assert_eq!(control_points.len(), 2);
    ///
    /// let err = ControlPoints::new(positions, mat![[0.0, 0.0, 0.0f64]]).unwrap_err();
    /// assert_eq!(err.kind(), ErrorKind::Shape);
    /// ```
    pub fn new(positions: Mat<f64>, displacements: Mat<f64>) -> MorphResult<Self> {
        if positions.nrows() == 0 {
            return Err(MorphError::EmptyControlSet);
        }

        if positions.nrows() != displacements.nrows() {
            return Err(MorphError::CountMismatch {
                control_points: positions.nrows(),
                displacements: displacements.nrows(),
            });
        }

        check_point_array(positions.as_ref(), "control positions")?;
        check_point_array(displacements.as_ref(), "displacements")?;

        Ok(Self {
            positions,
            displacements,
        })
    }

    /// Number of control points.
    pub fn len(&self) -> usize {
        self.positions.nrows()
    }

    /// Always `false`; an empty control set is rejected on construction.
    pub fn is_empty(&self) -> bool {
        self.positions.nrows() == 0
    }

    pub fn positions(&self) -> MatRef<'_, f64> {
        self.positions.as_ref()
    }

    pub fn displacements(&self) -> MatRef<'_, f64> {
        self.displacements.as_ref()
    }

    /// Rejects any two positions within `tolerance` of each other.
    pub fn ensure_distinct(&self, tolerance: f64) -> MorphResult<()> {
        match spatial::find_coincident_pair(self.positions.as_ref(), tolerance) {
            Some(pair) => Err(MorphError::CoincidentControlPoints {
                first: pair.first,
                second: pair.second,
                distance: pair.distance,
            }),
            None => Ok(()),
        }
    }
}

/// Checks that `points` has three columns and only finite entries.
pub(crate) fn check_point_array(points: MatRef<'_, f64>, what: &'static str) -> MorphResult<()> {
    if points.ncols() != DIMENSIONS {
        return Err(MorphError::WrongDimension {
            what,
            expected: DIMENSIONS,
            found: points.ncols(),
        });
    }

    for i in 0..points.nrows() {
        for j in 0..DIMENSIONS {
            if !points[(i, j)].is_finite() {
                return Err(MorphError::NonFiniteCoordinate { what, row: i, col: j });
            }
        }
    }

    Ok(())
}
