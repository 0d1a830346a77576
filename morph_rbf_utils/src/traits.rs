/////////////////////////////////////////////////////////////////////////////////////////////
//
// Declares the kernel evaluation traits shared by the morphing crates.
//
// Created on: 15 Nov 2025     Author: Daniel Owen 
//
// Copyright (c) 2025, Maptek Pty Ltd. All rights reserved. Licensed under the MIT License. 
//
/////////////////////////////////////////////////////////////////////////////////////////////

use crate::kernel_helpers::KernelParams;
use faer::RowRef;

/// Evaluates a radial kernel between a target and source point.
///
/// Implementors only need to provide [`KernelFunction::phi`]; kernels that are
/// cheaper to evaluate from the squared distance override
/// [`KernelFunction::evaluate`] to skip the square root.
pub trait KernelFunction {
    /// Kernel value at separation distance `r`.
    fn phi(&self, r: f64) -> f64;

    /// Kernel value between two points given as
    /// [`faer::RowRef<f64>`](https://docs.rs/faer/latest/faer/row/type.RowRef.html).
    #[inline(always)]
    fn evaluate(&self, target: RowRef<f64>, source: RowRef<f64>) -> f64 {
        self.phi(crate::get_distance(target, source))
    }
}

/// Converts a shared [`KernelParams`] configuration into a concrete kernel type.
pub trait KernelFromParams: Sized {
    /// Constructs `Self` from a validated set of kernel parameters.
    fn from_params(p: &KernelParams) -> Self;
}
