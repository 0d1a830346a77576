/////////////////////////////////////////////////////////////////////////////////////////////
//
// Exposes the public API and high-level documentation for RBF mesh morphing.
//
// Created on: 15 Nov 2025     Author: Daniel Owen 
//
// Copyright (c) 2025, Maptek Pty Ltd. All rights reserved. Licensed under the MIT License. 
//
/////////////////////////////////////////////////////////////////////////////////////////////

//! # Volumetric mesh morphing with Radial Basis Functions (RBF).
//!
//! Given a set of control points on a mesh (typically boundary nodes) and the
//! displacement each one should undergo, this crate builds a smooth 3D
//! displacement field that reproduces those displacements exactly and applies
//! it to every node of the mesh. Connectivity is never touched, so the morphed
//! mesh keeps its topology while its interior follows the boundary.
//!
//! The field is
//!
//! ```text
//! d(x) = sum_i W_i phi(|x - c_i|),    phi(r) = exp(-(r / coef)^2)
//! ```
//!
//! where the weights `W` solve the dense symmetric system `G W = D`,
//! `G_ij = phi(|c_i - c_j|)`. The system is factorised directly (Cholesky,
//! with a partial pivoting LU fallback) and rejected when its estimated
//! condition number is too large to trust.
//!
//! Direct factorisation costs **O(N³)** in the number of control points, which
//! is the intended regime: a few thousand boundary nodes driving meshes of
//! arbitrary size. Evaluation at the mesh nodes is **O(M N)** and runs in
//! parallel chunks with results independent of the thread count.
//!
//! # Features
//! - Gaussian kernel with a user supplied shape coefficient, the same
//!   Gaussian parameterised by its exponent (`gaussian_shape`), plus inverse
//!   multiquadric and spheroidal kernels for experimentation
//! - Coincident control point detection before factorisation
//! - Condition number estimation and rejection of ill-conditioned systems
//! - Progress reporting through [`progress::ProgressSink`]
//! - JSON persistence of morph settings, CSV node I/O, and boundary
//!   selection helpers for building control sets
//! - Built on [`faer`](https://docs.rs/faer/latest/faer/) for linear algebra, avoiding complex
//!   build dependencies
//!
//! # Examples
//!
//! ```
//! use faer::Mat;
//! use morph_rbf::{
//!     ControlPointsBuilder, KernelSpec, RbfMorpher, create_evaluation_grid,
//!     boundary::{Axis, select_nodes_on_plane, sine_wave_offset},
//! };
//!
//! // An 11 x 11 plate in the z = 0 plane
//! let grid = create_evaluation_grid(&[(0.0, 1.0), (0.0, 1.0), (0.0, 0.0)], &[11, 11, 1]).unwrap();
//!
//! // Push the top edge down with a sine profile and hold the bottom edge
//! let top = select_nodes_on_plane(grid.as_ref(), Axis::Y, 1.0, 1e-9);
//! let bottom = select_nodes_on_plane(grid.as_ref(), Axis::Y, 0.0, 1e-9);
//! let control_points = ControlPointsBuilder::new()
//!     .displaced(grid.as_ref(), &top, sine_wave_offset(0.2, Axis::Y, Axis::X))
//!     .fixed(grid.as_ref(), &bottom)
//!     .build()
//!     .unwrap();
//!
//! // Fit once, then move every node of the plate
//! let morpher = RbfMorpher::builder(control_points, KernelSpec::gaussian(0.5).unwrap())
//!     .build()
//!     .unwrap();
//! let morphed: Mat<f64> = morpher.apply(grid.as_ref()).unwrap();
//!
//! // Bottom edge is held in place
//! for &i in &bottom {
//!     assert!((morphed[(i, 1)] - grid[(i, 1)]).abs() < 1e-8);
//! }
//! ```
//!
//! # References
//! 1.  A. de Boer, M. S. van der Schoot, H. Bijl. Mesh deformation based on radial
//!     basis function interpolation. Computers & Structures, 85(11):784–795, 2007.
//! 2.  Fasshauer, G., 2007. Meshfree Approximation Methods with Matlab. World Scientific Publishing Co.
//! 3.  N. J. Higham, F. Tisseur. A block algorithm for matrix 1-norm estimation, with an
//!     application to 1-norm pseudospectra. SIAM J. Matrix Anal. Appl., 21(4):1185–1201, 2000.
pub mod boundary;

mod common;

mod control_points;

mod error;

mod gram;

mod interpolator;

mod kernel_spec;

mod linalg;

mod mesh;

mod morph;

mod spatial;

pub mod progress;

pub mod config;

pub use {
    boundary::{
        Axis, ControlPointsBuilder, paraboloid_bulge, select_nodes_on_plane, sine_wave_offset,
    },
    common::{
        PointIOError, create_evaluation_grid, csv_to_control_points, csv_to_nodes,
        generate_random_points, nodes_to_csv,
    },
    config::{ConfigIOError, MorphParams, MorphParamsBuilder, MorphSettings, SolverType},
    control_points::{ControlPoints, DIMENSIONS},
    error::{ErrorKind, MorphError, MorphResult},
    gram::GramSystem,
    interpolator::Interpolator,
    kernel_spec::KernelSpec,
    linalg::{GramFactor, GramSolver, SolvedWeights, solve_weights},
    mesh::{MeshArrays, morph_mesh},
    morph::{RbfMorpher, RbfMorpherBuilder, morph, morph_with_params},
};

pub use morph_rbf_utils::KernelType;
