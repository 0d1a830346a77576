/////////////////////////////////////////////////////////////////////////////////////////////
//
// Provides parameter and builder types for configuring RBF kernels.
//
// Created on: 15 Nov 2025     Author: Daniel Owen 
//
// Copyright (c) 2025, Maptek Pty Ltd. All rights reserved. Licensed under the MIT License. 
//
/////////////////////////////////////////////////////////////////////////////////////////////

use crate::{error::KernelConfigError, utils::KernelType};
use serde::{Deserialize, Serialize};

/// Defines the [`KernelType`] to use, along with its scale coefficient.
///
/// A `KernelParams` value can only be obtained through validation, so
/// downstream code may assume `coef` is finite and strictly positive.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawKernelParams")]
pub struct KernelParams {
    /// KernelType enum variant to use.
    pub kernel_type: KernelType,

    /// Scale coefficient of the kernel. For the distance-scaled kernels this
    /// is the radius of influence of each control point; for
    /// [`KernelType::GaussianShape`] it is the exponent multiplier.
    pub coef: f64,
}

impl KernelParams {
    /// Validates `coef` and pairs it with `kernel_type`.
    pub fn new(kernel_type: KernelType, coef: f64) -> Result<Self, KernelConfigError> {
        if !(coef.is_finite() && coef > 0.0) {
            return Err(KernelConfigError::InvalidCoefficient { coef });
        }
        Ok(Self { kernel_type, coef })
    }

    /// Resolves a kernel by name (case-insensitive) and validates `coef`.
    ///
    /// # Examples
    ///
    /// ```
    /// use morph_rbf_utils::{KernelParams, KernelType};
    ///
    /// let params = KernelParams::from_name("Gaussian", 0.5).unwrap();
    /// assert_eq!(params.kernel_type, KernelType::Gaussian);
    ///
    /// assert!(KernelParams::from_name("multiquadric", 0.5).is_err());
    /// assert!(KernelParams::from_name("gaussian", 0.0).is_err());
    /// ```
    pub fn from_name(name: &str, coef: f64) -> Result<Self, KernelConfigError> {
        let kernel_type: KernelType = name.parse()?;
        Self::new(kernel_type, coef)
    }

    /// Begins building a [`KernelParams`] instance for the given kernel type.
    pub fn builder(kernel_type: KernelType) -> KernelParamsBuilder {
        KernelParamsBuilder {
            kernel_type,
            coef: 1.0,
        }
    }
}

/// Builder for [`KernelParams`] with a default coefficient of `1.0`.
#[derive(Debug, Clone, Copy)]
pub struct KernelParamsBuilder {
    kernel_type: KernelType,
    coef: f64,
}

impl KernelParamsBuilder {
    /// Sets the `coef` parameter on the builder.
    pub fn coef(mut self, v: f64) -> Self {
        self.coef = v;
        self
    }

    /// Finalises the builder, validating the coefficient.
    pub fn build(self) -> Result<KernelParams, KernelConfigError> {
        KernelParams::new(self.kernel_type, self.coef)
    }
}

// Unvalidated mirror used so deserialised parameters pass through `KernelParams::new`.
#[derive(Deserialize)]
struct RawKernelParams {
    kernel_type: KernelType,
    coef: f64,
}

impl TryFrom<RawKernelParams> for KernelParams {
    type Error = KernelConfigError;

    fn try_from(raw: RawKernelParams) -> Result<Self, Self::Error> {
        KernelParams::new(raw.kernel_type, raw.coef)
    }
}
