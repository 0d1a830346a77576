/////////////////////////////////////////////////////////////////////////////////////////////
//
// Re-exports kernel utilities, constants, and helper functions used by the morph_rbf crate.
//
// Created on: 15 Nov 2025     Author: Daniel Owen 
//
// Copyright (c) 2025, Maptek Pty Ltd. All rights reserved. Licensed under the MIT License. 
//
/////////////////////////////////////////////////////////////////////////////////////////////

//! # Kernel utilities for the `morph_rbf` crate
//!
//! Holds the radial kernel registry, the validated [`KernelParams`] that select
//! a kernel at configuration time, and the dense kernel matrix builders.
mod constants;
mod error;
mod kernel_helpers;
mod rbf_kernels;
mod traits;
mod utils;

/// Implemented kernels for use in the `morph_rbf` crate.
pub mod kernels {
    pub use super::constants::*;
    pub use super::rbf_kernels::*;
}

pub use {
    error::KernelConfigError,
    kernel_helpers::{KernelParams, KernelParamsBuilder},
    traits::{KernelFromParams, KernelFunction},
    utils::{
        KernelType, get_a_matrix, get_a_matrix_symmetric, get_a_matrix_symmetric_typed,
        get_a_matrix_typed, get_distance, get_distance_sq, kernel_phi, select_mat_rows,
    },
};
