/////////////////////////////////////////////////////////////////////////////////////////////
//
// Declares the errors raised while resolving a kernel configuration.
//
// Created on: 15 Nov 2025     Author: Daniel Owen 
//
// Copyright (c) 2025, Maptek Pty Ltd. All rights reserved. Licensed under the MIT License. 
//
/////////////////////////////////////////////////////////////////////////////////////////////

use thiserror::Error;

/// Errors raised when a kernel name or scale coefficient cannot be resolved.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum KernelConfigError {
    #[error("unknown RBF kernel type {name:?} (expected one of: {expected})")]
    UnknownKernel { name: String, expected: String },

    #[error("kernel scale coefficient must be finite and greater than zero, got {coef}")]
    InvalidCoefficient { coef: f64 },
}
