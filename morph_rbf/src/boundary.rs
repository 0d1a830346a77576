/////////////////////////////////////////////////////////////////////////////////////////////
//
// Provides boundary selection helpers and displacement profiles for building control sets.
//
// Created on: 15 Nov 2025     Author: Daniel Owen 
//
// Copyright (c) 2025, Maptek Pty Ltd. All rights reserved. Licensed under the MIT License. 
//
/////////////////////////////////////////////////////////////////////////////////////////////

//! Boundary selection helpers.
//!
//! These sit outside the morph itself: they pick nodes off a mesh and attach
//! displacements to them, producing the [`ControlPoints`] the morph consumes.

use crate::{
    control_points::{ControlPoints, check_point_array},
    error::{MorphError, MorphResult},
};
use faer::{Mat, MatRef};
use morph_rbf_utils::select_mat_rows;
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;

/// Coordinate axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Axis {
    X,
    Y,
    Z,
}

impl Axis {
    /// Column index of the axis in an `M × 3` node matrix.
    pub fn index(self) -> usize {
        match self {
            Axis::X => 0,
            Axis::Y => 1,
            Axis::Z => 2,
        }
    }
}

/// Indices, ascending, of nodes with `|node[axis] - value| <= tolerance`.
///
/// # Examples
///
/// ```
/// use faer::mat;
/// use morph_rbf::boundary::{Axis, select_nodes_on_plane};
///
/// let nodes = mat![
///     [0.0, 0.0, 1.0],
///     [1.0, 0.0, 0.3],
///     [0.0, 1.0, 1.0 + 1e-9f64],
/// ];
/// assert_eq!(select_nodes_on_plane(nodes.as_ref(), Axis::Z, 1.0, 1e-6), vec![0, 2]);
/// ```
pub fn select_nodes_on_plane(
    nodes: MatRef<'_, f64>,
    axis: Axis,
    value: f64,
    tolerance: f64,
) -> Vec<usize> {
    let col = axis.index();
    if col >= nodes.ncols() {
        return Vec::new();
    }

    (0..nodes.nrows())
        .filter(|&i| (nodes[(i, col)] - value).abs() <= tolerance)
        .collect()
}

/// Vertical paraboloid profile `(0, 0, amplitude (1 - (rho / radius)^2))`,
/// `rho = sqrt(x^2 + y^2)`.
///
/// Peaks at the z axis and vanishes on the cylinder `rho = radius`.
pub fn paraboloid_bulge(amplitude: f64, radius: f64) -> impl Fn([f64; 3]) -> [f64; 3] + Copy {
    move |p: [f64; 3]| {
        let rho2 = p[0] * p[0] + p[1] * p[1];
        [0.0, 0.0, amplitude * (1.0 - rho2 / (radius * radius))]
    }
}

/// Sine profile displacing along `axis` by `-amplitude sin(pi x_along)`.
///
/// With `axis = Y` and `along = X` this pushes the edge of a unit plate
/// inward with its maximum at `x = 0.5`.
pub fn sine_wave_offset(
    amplitude: f64,
    axis: Axis,
    along: Axis,
) -> impl Fn([f64; 3]) -> [f64; 3] + Copy {
    move |p: [f64; 3]| {
        let mut d = [0.0; 3];
        d[axis.index()] = -amplitude * (PI * p[along.index()]).sin();
        d
    }
}

/// Accumulates groups of fixed and displaced nodes into a [`ControlPoints`] set.
///
/// Rows appear in the order groups were added, and within a group in the
/// order of the given indices. The first bad input is remembered and
/// reported by [`ControlPointsBuilder::build`].
#[derive(Debug, Clone, Default)]
pub struct ControlPointsBuilder {
    positions: Vec<[f64; 3]>,
    displacements: Vec<[f64; 3]>,
    error: Option<MorphError>,
}

impl ControlPointsBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds `nodes[indices]` with zero displacement.
    pub fn fixed(self, nodes: MatRef<'_, f64>, indices: &[usize]) -> Self {
        self.displaced(nodes, indices, |_| [0.0; 3])
    }

    /// Adds `nodes[indices]`, each displaced by `displacement(position)`.
    pub fn displaced<F>(
        mut self,
        nodes: MatRef<'_, f64>,
        indices: &[usize],
        displacement: F,
    ) -> Self
    where
        F: Fn([f64; 3]) -> [f64; 3],
    {
        if self.error.is_some() {
            return self;
        }

        if let Err(err) = check_point_array(nodes, "boundary nodes") {
            self.error = Some(err);
            return self;
        }

        if let Some(&idx) = indices.iter().find(|&&idx| idx >= nodes.nrows()) {
            self.error = Some(MorphError::InvalidMesh {
                reason: format!(
                    "boundary node index {idx} is out of range for {} nodes",
                    nodes.nrows()
                ),
            });
            return self;
        }

        let selected = select_mat_rows(nodes, indices);
        for row in 0..selected.nrows() {
            let position = [selected[(row, 0)], selected[(row, 1)], selected[(row, 2)]];
            self.positions.push(position);
            self.displacements.push(displacement(position));
        }

        self
    }

    /// Number of control points collected so far.
    pub fn len(&self) -> usize {
        self.positions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    /// Returns the validated control set. Fails if any group was invalid or
    /// no nodes were added.
    pub fn build(self) -> MorphResult<ControlPoints> {
        if let Some(err) = self.error {
            return Err(err);
        }

        let n = self.positions.len();
        let positions = Mat::from_fn(n, 3, |i, j| self.positions[i][j]);
        let displacements = Mat::from_fn(n, 3, |i, j| self.displacements[i][j]);

        ControlPoints::new(positions, displacements)
    }
}
