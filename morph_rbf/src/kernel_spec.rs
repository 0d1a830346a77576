/////////////////////////////////////////////////////////////////////////////////////////////
//
// Specifies the radial kernel and scale coefficient used to fit a morph.
//
// Created on: 15 Nov 2025     Author: Daniel Owen 
//
// Copyright (c) 2025, Maptek Pty Ltd. All rights reserved. Licensed under the MIT License. 
//
/////////////////////////////////////////////////////////////////////////////////////////////

//! Specifies the radial kernel and scale coefficient used to fit a morph.
use crate::error::MorphResult;
use morph_rbf_utils::{KernelParams, KernelType, kernel_phi};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A named kernel variant paired with its positive scale coefficient.
///
/// The name is resolved to a [`KernelType`] once, when the spec is built, so
/// assembly and evaluation never look the kernel up again.
///
/// # Examples
///
/// ```
/// use morph_rbf::{ErrorKind, KernelSpec};
///
/// let spec = KernelSpec::from_name("gaussian", 0.5).unwrap();
/// assert_eq!(spec.coef(), 0.5);
///
/// let err = KernelSpec::from_name("thin_plate", 0.5).unwrap_err();
/// assert_eq!(err.kind(), ErrorKind::Configuration);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct KernelSpec {
    params: KernelParams,
}

impl KernelSpec {
    /// Creates a spec for `kernel_type`, rejecting a non-positive or
    /// non-finite `coef`.
    pub fn new(kernel_type: KernelType, coef: f64) -> MorphResult<Self> {
        Ok(Self {
            params: KernelParams::new(kernel_type, coef)?,
        })
    }

    /// Resolves `name` (case-insensitive) into a kernel and validates `coef`.
    pub fn from_name(name: &str, coef: f64) -> MorphResult<Self> {
        Ok(Self {
            params: KernelParams::from_name(name, coef)?,
        })
    }

    /// Gaussian kernel `exp(-(r / coef)^2)`.
    pub fn gaussian(coef: f64) -> MorphResult<Self> {
        Self::new(KernelType::Gaussian, coef)
    }

    /// The resolved kernel variant.
    pub fn kernel_type(&self) -> KernelType {
        self.params.kernel_type
    }

    /// The scale coefficient.
    pub fn coef(&self) -> f64 {
        self.params.coef
    }

    /// Validated parameters as consumed by the kernel matrix builders.
    pub fn params(&self) -> &KernelParams {
        &self.params
    }

    /// Kernel value at separation distance `r`.
    #[inline]
    pub fn phi(&self, r: f64) -> f64 {
        kernel_phi(r, &self.params)
    }
}

impl From<KernelParams> for KernelSpec {
    fn from(params: KernelParams) -> Self {
        Self { params }
    }
}

impl fmt::Display for KernelSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}(coef = {})", self.params.kernel_type, self.params.coef)
    }
}
