/////////////////////////////////////////////////////////////////////////////////////////////
//
// Defines constants for the spheroidal RBF kernel.
//
// Created on: 15 Nov 2025     Author: Daniel Owen 
//
// Copyright (c) 2025, Maptek Pty Ltd. All rights reserved. Licensed under the MIT License. 
//
/////////////////////////////////////////////////////////////////////////////////////////////

/// Tunable parameters that define a particular spheroidal RBF kernel family.
#[derive(Clone, Debug, Copy)]
pub struct SpheroidalConstants {
    pub inflexion_point: f64,
    pub linear_slope: f64,
    pub range_scaling: f64,
    pub inv_y_intercept: f64,
}

/// Calibrated constants for the order-3 spheroidal RBF kernel.
pub const SPHEROIDAL_CONSTANTS_THREE: SpheroidalConstants = SpheroidalConstants {
    inflexion_point: 0.5000000000,
    linear_slope: 0.7500000000,
    range_scaling: 2.6798340586,
    inv_y_intercept: 0.8734640537,
};
