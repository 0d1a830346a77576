/////////////////////////////////////////////////////////////////////////////////////////////
//
// Factorises the Gram matrix, estimates its conditioning, and solves for the morph weights.
//
// Created on: 15 Nov 2025     Author: Daniel Owen 
//
// Copyright (c) 2025, Maptek Pty Ltd. All rights reserved. Licensed under the MIT License. 
//
/////////////////////////////////////////////////////////////////////////////////////////////

//! Direct solution of the Gram system.
//!
//! The matrix is factorised once and the factorisation is reused for all
//! three displacement columns and for the condition estimate. No inverse is
//! ever formed.

use crate::{
    config::SolverType,
    error::{MorphError, MorphResult},
};
use faer::{
    Mat, MatRef, Side,
    linalg::solvers::{Llt, LltError, PartialPivLu, Solve},
};
use log::{debug, warn};

/// Maximum number of power-like iterations in the 1-norm estimator.
const MAX_ESTIMATOR_ITERATIONS: usize = 5;

/// Factorisation of a square Gram matrix.
pub enum GramFactor {
    Llt(Llt<f64>),
    Lu(PartialPivLu<f64>),
}

impl GramFactor {
    /// Name of the factorisation actually in use.
    pub fn kind(&self) -> &'static str {
        match self {
            GramFactor::Llt(_) => "cholesky",
            GramFactor::Lu(_) => "lu",
        }
    }

    fn solve(&self, rhs: MatRef<'_, f64>) -> Mat<f64> {
        match self {
            GramFactor::Llt(s) => s.solve(rhs),
            GramFactor::Lu(s) => s.solve(rhs),
        }
    }

    fn solve_transpose(&self, rhs: MatRef<'_, f64>) -> Mat<f64> {
        match self {
            GramFactor::Llt(s) => s.solve_transpose(rhs),
            GramFactor::Lu(s) => s.solve_transpose(rhs),
        }
    }
}

/// A factorised Gram matrix ready to solve right-hand sides.
pub struct GramSolver {
    factor: GramFactor,
    norm_one: f64,
    dim: usize,
}

impl GramSolver {
    /// Factorises `gram` with the requested strategy.
    ///
    /// With [`SolverType::Auto`], Cholesky is tried first and partially pivoted
    /// LU is used if a non-positive pivot is met. A zero or non-finite LU
    /// pivot means the matrix is singular.
    pub fn factorise(gram: MatRef<'_, f64>, solver_type: SolverType) -> MorphResult<Self> {
        debug_assert_eq!(gram.nrows(), gram.ncols());

        let factor = match solver_type {
            SolverType::Cholesky => match gram.llt(Side::Lower) {
                Ok(llt) => GramFactor::Llt(llt),
                Err(LltError::NonPositivePivot { index }) => {
                    return Err(MorphError::NonPositivePivot { index });
                }
            },
            SolverType::Lu => GramFactor::Lu(factorise_lu(gram)?),
            SolverType::Auto => match gram.llt(Side::Lower) {
                Ok(llt) => GramFactor::Llt(llt),
                Err(LltError::NonPositivePivot { index }) => {
                    warn!(
                        "Cholesky factorisation of the {n}x{n} Gram matrix failed at pivot {index}, falling back to LU",
                        n = gram.nrows()
                    );
                    GramFactor::Lu(factorise_lu(gram)?)
                }
            },
        };

        debug!("factorised {}x{} Gram matrix using {}", gram.nrows(), gram.ncols(), factor.kind());

        Ok(Self {
            factor,
            norm_one: norm_one(gram),
            dim: gram.nrows(),
        })
    }

    pub fn factor(&self) -> &GramFactor {
        &self.factor
    }

    /// Solves `G X = rhs` for every column of `rhs`.
    pub fn solve(&self, rhs: MatRef<'_, f64>) -> Mat<f64> {
        self.factor.solve(rhs)
    }

    /// Estimates the 1-norm condition number `|G|_1 |G^-1|_1`.
    ///
    /// Uses Hager's estimator with Higham's extra test vector, so the result
    /// is a lower bound on the exact value that is almost always within a
    /// small factor of it. A non-finite result means `G` is numerically
    /// singular.
    pub fn condition_estimate(&self) -> f64 {
        self.norm_one * self.inverse_norm_one_estimate()
    }

    fn inverse_norm_one_estimate(&self) -> f64 {
        let n = self.dim;
        if n == 0 {
            return 0.0;
        }

        let mut x = Mat::<f64>::from_fn(n, 1, |_, _| 1.0 / n as f64);
        let mut estimate = 0.0;
        let mut last_index = usize::MAX;

        for iter in 0..MAX_ESTIMATOR_ITERATIONS {
            let y = self.factor.solve(x.as_ref());
            let y_norm = column_abs_sum(y.as_ref());

            if !y_norm.is_finite() {
                return f64::INFINITY;
            }
            if iter > 0 && y_norm <= estimate {
                break;
            }
            estimate = y_norm;

            let signs = Mat::<f64>::from_fn(n, 1, |i, _| if y[(i, 0)] >= 0.0 { 1.0 } else { -1.0 });
            let z = self.factor.solve_transpose(signs.as_ref());

            let mut index = 0;
            let mut z_max = f64::NEG_INFINITY;
            let mut z_dot_x = 0.0;
            for i in 0..n {
                let zi = z[(i, 0)];
                if zi.abs() > z_max {
                    z_max = zi.abs();
                    index = i;
                }
                z_dot_x += zi * x[(i, 0)];
            }

            if iter > 0 && (z_max <= z_dot_x || index == last_index) {
                break;
            }
            last_index = index;

            x = Mat::<f64>::zeros(n, 1);
            x[(index, 0)] = 1.0;
        }

        // Alternating test vector guards against the estimator stalling on
        // matrices where the unit vectors miss the dominant column.
        let alternating = Mat::<f64>::from_fn(n, 1, |i, _| {
            let magnitude = if n > 1 {
                1.0 + i as f64 / (n - 1) as f64
            } else {
                1.0
            };
            if i % 2 == 0 { magnitude } else { -magnitude }
        });
        let alt_norm = column_abs_sum(alternating.as_ref());
        let alt_solution = self.factor.solve(alternating.as_ref());
        let alt_estimate = column_abs_sum(alt_solution.as_ref()) / alt_norm;

        if !alt_estimate.is_finite() {
            return f64::INFINITY;
        }

        estimate.max(alt_estimate)
    }
}

fn factorise_lu(gram: MatRef<'_, f64>) -> MorphResult<PartialPivLu<f64>> {
    let lu = gram.partial_piv_lu();

    let u = lu.U();
    for i in 0..u.nrows() {
        let pivot = u[(i, i)];
        if pivot == 0.0 || !pivot.is_finite() {
            return Err(MorphError::SingularMatrix {
                detail: format!("LU pivot {i} is {pivot}"),
            });
        }
    }

    Ok(lu)
}

/// Induced 1-norm: the largest absolute column sum.
pub(crate) fn norm_one(a: MatRef<'_, f64>) -> f64 {
    (0..a.ncols())
        .map(|j| column_abs_sum(a.col(j).as_mat()))
        .fold(0.0, f64::max)
}

#[inline]
fn column_abs_sum(a: MatRef<'_, f64>) -> f64 {
    let mut sum = 0.0;
    for i in 0..a.nrows() {
        for j in 0..a.ncols() {
            sum += a[(i, j)].abs();
        }
    }
    sum
}

/// Outcome of a checked Gram solve.
#[derive(Debug, Clone)]
pub struct SolvedWeights {
    /// `N × 3` interpolation weights.
    pub weights: Mat<f64>,

    /// Estimated 1-norm condition number of the Gram matrix.
    pub condition_estimate: f64,

    /// Factorisation that produced the weights.
    pub factorisation: &'static str,
}

/// Factorises `gram` once, rejects it if singular or worse conditioned than
/// `condition_threshold`, and solves `G W = rhs` for all columns.
pub fn solve_weights(
    gram: MatRef<'_, f64>,
    rhs: MatRef<'_, f64>,
    solver_type: SolverType,
    condition_threshold: f64,
) -> MorphResult<SolvedWeights> {
    let solver = GramSolver::factorise(gram, solver_type)?;

    let condition_estimate = solver.condition_estimate();
    if !condition_estimate.is_finite() {
        return Err(MorphError::SingularMatrix {
            detail: "condition estimate is not finite".to_string(),
        });
    }

    debug!("Gram condition estimate {condition_estimate:e} (threshold {condition_threshold:e})");

    if condition_estimate > condition_threshold {
        return Err(MorphError::IllConditioned {
            estimate: condition_estimate,
            threshold: condition_threshold,
        });
    }
    if condition_estimate * 100.0 > condition_threshold {
        warn!(
            "Gram condition estimate {condition_estimate:e} is within two orders of magnitude of the threshold {condition_threshold:e}"
        );
    }

    let weights = solver.solve(rhs);

    for i in 0..weights.nrows() {
        for j in 0..weights.ncols() {
            if !weights[(i, j)].is_finite() {
                return Err(MorphError::SingularMatrix {
                    detail: format!("weight ({i}, {j}) is not finite"),
                });
            }
        }
    }

    Ok(SolvedWeights {
        weights,
        condition_estimate,
        factorisation: solver.factor().kind(),
    })
}
