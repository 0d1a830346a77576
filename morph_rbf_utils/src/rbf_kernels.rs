/////////////////////////////////////////////////////////////////////////////////////////////
//
// Implements the concrete RBF kernel functions and their faer-compatible evaluations.
//
// Created on: 15 Nov 2025     Author: Daniel Owen 
//
// Copyright (c) 2025, Maptek Pty Ltd. All rights reserved. Licensed under the MIT License. 
//
/////////////////////////////////////////////////////////////////////////////////////////////

use crate::{
    KernelFromParams, KernelFunction, KernelParams,
    constants::{SPHEROIDAL_CONSTANTS_THREE, SpheroidalConstants},
    get_distance_sq,
};
use faer::RowRef;

/// Gaussian RBF kernel with `phi(r) = exp(-(r / coef)^2)`.
///
/// `coef` is the scale at which the kernel has decayed to `1/e`. Larger values
/// spread each control point's influence further and give smoother fields.
#[derive(Clone, Debug, Copy)]
pub struct GaussianRbfKernel {
    pub coef: f64,

    // derived (computed once)
    inv_coef2: f64, // 1 / coef^2
}

impl GaussianRbfKernel {
    #[inline(always)]
    pub fn new(coef: f64) -> Self {
        Self {
            coef,
            inv_coef2: 1.0 / (coef * coef),
        }
    }

    #[inline(always)]
    pub fn eval_r2(&self, r2: f64) -> f64 {
        (-r2 * self.inv_coef2).exp()
    }
}

impl KernelFunction for GaussianRbfKernel {
    #[inline(always)]
    fn phi(&self, r: f64) -> f64 {
        self.eval_r2(r * r)
    }

    #[inline(always)]
    fn evaluate(&self, target: RowRef<f64>, source: RowRef<f64>) -> f64 {
        self.eval_r2(get_distance_sq(target, source))
    }
}

impl KernelFromParams for GaussianRbfKernel {
    #[inline(always)]
    fn from_params(p: &KernelParams) -> Self {
        Self::new(p.coef)
    }
}

/// Gaussian RBF kernel parameterised by its exponent, `phi(r) = exp(-coef * r^2)`.
///
/// Equivalent to [`GaussianRbfKernel`] with scale `1 / sqrt(coef)`, so here a
/// larger `coef` gives a *narrower* kernel.
#[derive(Clone, Debug, Copy)]
pub struct GaussianShapeRbfKernel {
    pub coef: f64,
}

impl GaussianShapeRbfKernel {
    #[inline(always)]
    pub fn eval_r2(&self, r2: f64) -> f64 {
        (-self.coef * r2).exp()
    }
}

impl KernelFunction for GaussianShapeRbfKernel {
    #[inline(always)]
    fn phi(&self, r: f64) -> f64 {
        self.eval_r2(r * r)
    }

    #[inline(always)]
    fn evaluate(&self, target: RowRef<f64>, source: RowRef<f64>) -> f64 {
        self.eval_r2(get_distance_sq(target, source))
    }
}

impl KernelFromParams for GaussianShapeRbfKernel {
    #[inline(always)]
    fn from_params(p: &KernelParams) -> Self {
        GaussianShapeRbfKernel { coef: p.coef }
    }
}

/// Inverse multiquadric RBF kernel with `phi(r) = 1 / sqrt(1 + (r / coef)^2)`.
#[derive(Clone, Debug, Copy)]
pub struct InverseMultiquadricRbfKernel {
    pub coef: f64,
    inv_coef2: f64,
}

impl InverseMultiquadricRbfKernel {
    #[inline(always)]
    pub fn new(coef: f64) -> Self {
        Self {
            coef,
            inv_coef2: 1.0 / (coef * coef),
        }
    }

    #[inline(always)]
    pub fn eval_r2(&self, r2: f64) -> f64 {
        1.0 / (1.0 + r2 * self.inv_coef2).sqrt()
    }
}

impl KernelFunction for InverseMultiquadricRbfKernel {
    #[inline(always)]
    fn phi(&self, r: f64) -> f64 {
        self.eval_r2(r * r)
    }

    #[inline(always)]
    fn evaluate(&self, target: RowRef<f64>, source: RowRef<f64>) -> f64 {
        self.eval_r2(get_distance_sq(target, source))
    }
}

impl KernelFromParams for InverseMultiquadricRbfKernel {
    #[inline(always)]
    fn from_params(p: &KernelParams) -> Self {
        Self::new(p.coef)
    }
}

/// Order-3 spheroidal RBF kernel with range `coef` and a unit sill.
///
/// Linear near the origin and decaying as `t^(-3/2)` in the far field, where
/// `t = 1 + (s r)^2`. Strictly positive definite, so no polynomial drift is
/// needed to make the Gram system solvable.
#[derive(Clone, Debug, Copy)]
pub struct SpheroidalRbfKernel {
    pub base_range: f64,

    // derived (computed once)
    s2: f64,         // s^2
    ip2: f64,        // (inflexion_point)^2
    near_slope: f64, // linear_slope * s
    far_coef: f64,   // inv_y_intercept
}

impl SpheroidalRbfKernel {
    #[inline(always)]
    pub fn new(base_range: f64) -> Self {
        let c: &SpheroidalConstants = &SPHEROIDAL_CONSTANTS_THREE;
        let s = c.range_scaling / base_range;
        Self {
            base_range,
            s2: s * s,
            ip2: c.inflexion_point * c.inflexion_point,
            near_slope: c.linear_slope * s,
            far_coef: c.inv_y_intercept,
        }
    }

    #[inline(always)]
    pub fn eval_r2(&self, r2: f64) -> f64 {
        let sr2 = self.s2 * r2;
        if sr2 <= self.ip2 {
            // near: 1 - near_slope * r
            1.0 - self.near_slope * r2.sqrt()
        } else {
            // far: far_coef / (t * sqrt(t)),  t = 1 + (s r)^2
            let t = 1.0 + sr2;
            self.far_coef / (t * t.sqrt())
        }
    }
}

impl KernelFunction for SpheroidalRbfKernel {
    #[inline(always)]
    fn phi(&self, r: f64) -> f64 {
        self.eval_r2(r * r)
    }

    #[inline(always)]
    fn evaluate(&self, target: RowRef<f64>, source: RowRef<f64>) -> f64 {
        self.eval_r2(get_distance_sq(target, source))
    }
}

impl KernelFromParams for SpheroidalRbfKernel {
    #[inline(always)]
    fn from_params(p: &KernelParams) -> Self {
        Self::new(p.coef)
    }
}
