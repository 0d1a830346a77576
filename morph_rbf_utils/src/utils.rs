/////////////////////////////////////////////////////////////////////////////////////////////
//
// Supplies general-purpose utilities for matrices, distances, and the kernel registry.
//
// Created on: 15 Nov 2025     Author: Daniel Owen 
//
// Copyright (c) 2025, Maptek Pty Ltd. All rights reserved. Licensed under the MIT License. 
//
/////////////////////////////////////////////////////////////////////////////////////////////

use crate::{KernelFromParams, KernelFunction, KernelParams, error::KernelConfigError};
use faer::{Mat, MatRef, RowRef};
use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};

/// Returns an owned `Mat<T>` from a subset of row indices.
///
/// # Examples
///
/// ```
/// use faer::mat;
/// use morph_rbf_utils::select_mat_rows;
///
/// let matrix = mat![
///     [0.0, 1.0],
///     [1.0, 1.0],
///     [2.0, 2.0],
///     [3.0, 3.0f64],
/// ];
///
/// let sub_matrix = select_mat_rows(matrix.as_ref(), &[0usize, 2]);
///
/// assert_eq!(
///     sub_matrix,
///     mat![
///         [0.0, 1.0],
///         [2.0, 2.0f64],
///     ]
/// );
/// ```
#[inline(always)]
pub fn select_mat_rows<T>(existing_mat: MatRef<'_, T>, row_indices: &[usize]) -> Mat<T>
where
    T: Clone,
{
    Mat::from_fn(row_indices.len(), existing_mat.ncols(), |i, j| {
        existing_mat.get(row_indices[i], j).clone()
    })
}

/// Calculates the euclidean distance between two points.
///
/// # Examples
///
/// ```
/// use faer::mat;
/// use morph_rbf_utils::get_distance;
///
/// let points = mat![
///     [1.0, 2.0, 0.0],
///     [4.0, 6.0, 0.0],
/// ];
///
/// let dist = get_distance(points.row(0), points.row(1));
///
/// assert_eq!(dist, 5.0);
/// ```
#[inline(always)]
pub fn get_distance(target: RowRef<f64>, source: RowRef<f64>) -> f64 {
    get_distance_sq(target, source).sqrt()
}

/// Returns the squared Euclidean distance between two points.
///
/// The difference is squared per coordinate, so swapping `target` and
/// `source` gives a bit-identical result.
#[inline(always)]
pub fn get_distance_sq(target: RowRef<f64>, source: RowRef<f64>) -> f64 {
    let mut dist = 0.0;
    for (t, s) in target.iter().zip(source.iter()) {
        let diff = t - s;
        dist += diff * diff;
    }
    dist
}

/// Builds a dense `(targets × sources)` kernel matrix using a typed kernel function.
#[inline(always)]
pub fn get_a_matrix_typed<K>(
    target_points: MatRef<'_, f64>,
    source_points: MatRef<'_, f64>,
    kernel_function: &K,
) -> Mat<f64>
where
    K: KernelFunction,
{
    let m = target_points.nrows();
    let n = source_points.nrows();

    let mut a_matrix = Mat::<f64>::zeros(m, n);

    for j in 0..n {
        let source = source_points.row(j);

        for i in 0..m {
            let target = target_points.row(i);

            a_matrix[(i, j)] = kernel_function.evaluate(target, source);
        }
    }

    a_matrix
}

/// Builds the symmetric kernel matrix of a point set with itself.
///
/// Each unordered pair is evaluated once and written to both `(i, j)` and
/// `(j, i)`, so the result is exactly symmetric.
#[inline(always)]
pub fn get_a_matrix_symmetric_typed<K>(points: MatRef<'_, f64>, kernel_function: &K) -> Mat<f64>
where
    K: KernelFunction,
{
    let n = points.nrows();

    let mut a_matrix = Mat::<f64>::zeros(n, n);

    for j in 0..n {
        let source_row = points.row(j);

        for i in j..n {
            let target_row = points.row(i);
            let k_val = kernel_function.evaluate(target_row, source_row);

            // Write both symmetric entries
            a_matrix[(i, j)] = k_val;
            a_matrix[(j, i)] = k_val;
        }
    }

    a_matrix
}

// K-free dispatcher generated from the kernel registry below.
// Assumes each kernel type implements `KernelFromParams::from_params(&KernelParams) -> K`.
macro_rules! for_each_kernel {
    ( registry = [ $( ($V:ident, $name:literal, [$($alias:literal),*], $Kty:path) ),* $(,)? ] ) => {

        /// Runtime kernel selector built from the kernel registry.
        ///
        /// Parsed from a case-insensitive name with [`str::parse`]; unknown
        /// names are rejected with [`KernelConfigError::UnknownKernel`].
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(rename_all = "snake_case")]
        pub enum KernelType {
            $( $V, )*
        }

        impl KernelType {
            /// Every registered kernel, in registry order.
            pub const ALL: &'static [KernelType] = &[ $( KernelType::$V, )* ];

            /// Canonical lower-case name of the kernel.
            pub fn name(&self) -> &'static str {
                match self {
                    $( KernelType::$V => $name, )*
                }
            }
        }

        impl FromStr for KernelType {
            type Err = KernelConfigError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                let key = s.trim().to_ascii_lowercase();
                $(
                    if key == $name $( || key == $alias )* {
                        return Ok(KernelType::$V);
                    }
                )*
                Err(KernelConfigError::UnknownKernel {
                    name: s.to_string(),
                    expected: [ $( $name, )* ].join(", "),
                })
            }
        }

        /// Builds a dense kernel matrix for the selected [`KernelType`].
        ///
        /// The kernel is resolved once per call; the inner loops are
        /// monomorphised for the concrete kernel.
        #[inline(always)]
        pub fn get_a_matrix(
            target_points: MatRef<'_, f64>,
            source_points: MatRef<'_, f64>,
            params: &KernelParams,
        ) -> Mat<f64> {
            match params.kernel_type {
                $(
                    KernelType::$V => {
                        // Convert uniform params -> concrete kernel type
                        let k = <$Kty as KernelFromParams>::from_params(params);
                        get_a_matrix_typed(target_points, source_points, &k)
                    }
                ),*
            }
        }

        /// Builds the symmetric kernel (Gram) matrix of `points` for the selected [`KernelType`].
        #[inline(always)]
        pub fn get_a_matrix_symmetric(
            points: MatRef<'_, f64>,
            params: &KernelParams,
        ) -> Mat<f64> {
            match params.kernel_type {
                $(
                    KernelType::$V => {
                        let k = <$Kty as KernelFromParams>::from_params(params);
                        get_a_matrix_symmetric_typed(points, &k)
                    }
                ),*
            }
        }

        /// Evaluates the selected kernel function at distance `r`.
        #[inline(always)]
        pub fn kernel_phi(r: f64, params: &KernelParams) -> f64 {
            match params.kernel_type {
                $(
                    KernelType::$V => {
                        let k = <$Kty as KernelFromParams>::from_params(params);
                        k.phi(r)
                    }
                ),*
            }
        }
    };
}

for_each_kernel! {
    registry = [
        (Gaussian,            "gaussian",             [],                      crate::kernels::GaussianRbfKernel),
        (InverseMultiquadric, "inverse_multiquadric", ["imq"],                 crate::kernels::InverseMultiquadricRbfKernel),
        (Spheroidal,          "spheroidal",           ["spheroidal3"],         crate::kernels::SpheroidalRbfKernel),
        (GaussianShape,       "gaussian_shape",       ["gaussian_exponent"],   crate::kernels::GaussianShapeRbfKernel),
    ]
}

impl fmt::Display for KernelType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use equator::assert;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    fn random_points(n: usize, seed: u64) -> Mat<f64> {
        let mut rng = StdRng::seed_from_u64(seed);
        Mat::from_fn(n, 3, |_, _| rng.random_range(-1.0..1.0))
    }

    #[test]
    fn kernel_names_round_trip_through_parse() {
        for kernel_type in KernelType::ALL {
            let parsed: KernelType = kernel_type.name().parse().unwrap();
            assert!(parsed == *kernel_type);
        }
    }

    #[test]
    fn parse_is_case_insensitive_and_accepts_aliases() {
        assert!("  GAUSSIAN ".parse::<KernelType>() == Ok(KernelType::Gaussian));
        assert!("IMQ".parse::<KernelType>() == Ok(KernelType::InverseMultiquadric));
        assert!("gaussian_exponent".parse::<KernelType>() == Ok(KernelType::GaussianShape));
        assert!("cubic".parse::<KernelType>().is_err());
    }

    #[test]
    fn symmetric_matrix_is_exactly_symmetric_with_unit_diagonal() {
        let points = random_points(40, 7);

        for kernel_type in KernelType::ALL {
            let params = KernelParams::new(*kernel_type, 0.4).unwrap();
            let g = get_a_matrix_symmetric(points.as_ref(), &params);

            for i in 0..g.nrows() {
                assert!(g[(i, i)] == 1.0);
                for j in 0..g.ncols() {
                    assert!(g[(i, j)].to_bits() == g[(j, i)].to_bits());
                }
            }
        }
    }

    #[test]
    fn symmetric_and_general_assembly_agree() {
        let points = random_points(25, 11);
        let params = KernelParams::new(KernelType::Gaussian, 0.7).unwrap();

        let sym = get_a_matrix_symmetric(points.as_ref(), &params);
        let full = get_a_matrix(points.as_ref(), points.as_ref(), &params);

        for i in 0..sym.nrows() {
            for j in 0..sym.ncols() {
                assert!(sym[(i, j)] == full[(i, j)] || sym[(i, j)] == full[(j, i)]);
            }
        }
    }

    #[test]
    fn rectangular_matrix_has_target_rows_and_source_columns() {
        let targets = random_points(7, 1);
        let sources = random_points(3, 2);
        let params = KernelParams::new(KernelType::InverseMultiquadric, 1.0).unwrap();

        let a = get_a_matrix(targets.as_ref(), sources.as_ref(), &params);

        assert!(a.nrows() == 7);
        assert!(a.ncols() == 3);
        let expected = kernel_phi(get_distance(targets.row(4), sources.row(2)), &params);
        assert!((a[(4, 2)] - expected).abs() < 1e-15);
    }
}
