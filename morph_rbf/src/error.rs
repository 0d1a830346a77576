/////////////////////////////////////////////////////////////////////////////////////////////
//
// Declares the error taxonomy shared by every fallible morphing operation.
//
// Created on: 15 Nov 2025     Author: Daniel Owen 
//
// Copyright (c) 2025, Maptek Pty Ltd. All rights reserved. Licensed under the MIT License. 
//
/////////////////////////////////////////////////////////////////////////////////////////////

//! Error types returned by the morphing pipeline.
//!
//! Every variant of [`MorphError`] belongs to exactly one [`ErrorKind`], so
//! callers can branch on the broad failure class without matching each
//! variant.

use morph_rbf_utils::KernelConfigError;
use thiserror::Error;

/// Broad class of a [`MorphError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Unknown kernel, invalid coefficient or invalid solver parameters.
    Configuration,

    /// Array dimensions or counts that do not fit together.
    Shape,

    /// Singular or ill-conditioned Gram system.
    Numerical,
}

/// Errors raised while configuring, fitting or evaluating a morph.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum MorphError {
    #[error(transparent)]
    Kernel(#[from] KernelConfigError),

    #[error("invalid parameter `{name}`: {reason}")]
    InvalidParameter { name: &'static str, reason: String },

    #[error("at least one control point is required")]
    EmptyControlSet,

    #[error("{control_points} control points but {displacements} displacement rows")]
    CountMismatch {
        control_points: usize,
        displacements: usize,
    },

    #[error("{what} must have {expected} columns, found {found}")]
    WrongDimension {
        what: &'static str,
        expected: usize,
        found: usize,
    },

    #[error("{what} has a non-finite value at row {row}, column {col}")]
    NonFiniteCoordinate {
        what: &'static str,
        row: usize,
        col: usize,
    },

    #[error("invalid mesh arrays: {reason}")]
    InvalidMesh { reason: String },

    #[error(
        "control points {first} and {second} are {distance:e} apart, closer than the coincidence tolerance"
    )]
    CoincidentControlPoints {
        first: usize,
        second: usize,
        distance: f64,
    },

    #[error("Cholesky factorisation hit a non-positive pivot at index {index}")]
    NonPositivePivot { index: usize },

    #[error("Gram matrix is singular ({detail})")]
    SingularMatrix { detail: String },

    #[error("Gram matrix condition estimate {estimate:e} exceeds threshold {threshold:e}")]
    IllConditioned { estimate: f64, threshold: f64 },

    #[error(
        "fitted field misses control point {index} by {residual:e}, above the exactness tolerance {tolerance:e}"
    )]
    InexactFit {
        index: usize,
        residual: f64,
        tolerance: f64,
    },
}

impl MorphError {
    /// Returns the broad failure class of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            MorphError::Kernel(_) | MorphError::InvalidParameter { .. } => ErrorKind::Configuration,
            MorphError::EmptyControlSet
            | MorphError::CountMismatch { .. }
            | MorphError::WrongDimension { .. }
            | MorphError::NonFiniteCoordinate { .. }
            | MorphError::InvalidMesh { .. } => ErrorKind::Shape,
            MorphError::CoincidentControlPoints { .. }
            | MorphError::NonPositivePivot { .. }
            | MorphError::SingularMatrix { .. }
            | MorphError::IllConditioned { .. }
            | MorphError::InexactFit { .. } => ErrorKind::Numerical,
        }
    }
}

pub type MorphResult<T> = std::result::Result<T, MorphError>;

#[cfg(test)]
mod tests {
    use super::*;
    use equator::assert;

    #[test]
    fn kernel_errors_are_configuration_kind() {
        let err: MorphError = KernelConfigError::InvalidCoefficient { coef: -1.0 }.into();
        assert!(err.kind() == ErrorKind::Configuration);
    }

    #[test]
    fn display_carries_diagnostic_context() {
        let err = MorphError::IllConditioned {
            estimate: 3.5e13,
            threshold: 1e12,
        };
        let text = err.to_string();
        assert!(text.contains("3.5e13"));
        assert!(err.kind() == ErrorKind::Numerical);

        let err = MorphError::CountMismatch {
            control_points: 4,
            displacements: 3,
        };
        assert!(err.to_string().contains('4'));
        assert!(err.kind() == ErrorKind::Shape);
    }
}
