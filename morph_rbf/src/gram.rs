/////////////////////////////////////////////////////////////////////////////////////////////
//
// Assembles the dense kernel (Gram) system of the control points.
//
// Created on: 15 Nov 2025     Author: Daniel Owen 
//
// Copyright (c) 2025, Maptek Pty Ltd. All rights reserved. Licensed under the MIT License. 
//
/////////////////////////////////////////////////////////////////////////////////////////////

use crate::{control_points::ControlPoints, error::MorphResult, kernel_spec::KernelSpec};
use faer::{Mat, MatRef};
use morph_rbf_utils::get_a_matrix_symmetric;

/// The `N × N` Gram matrix of the control points together with the `N × 3`
/// right-hand side of prescribed displacements.
///
/// `matrix[(i, j)] = phi(|c_i - c_j|)`. Each pair is evaluated once and
/// stored in both triangles, so the matrix is exactly symmetric.
#[derive(Debug, Clone)]
pub struct GramSystem {
    matrix: Mat<f64>,
    rhs: Mat<f64>,
}

impl GramSystem {
    /// Assembles the system for an already validated control set.
    pub fn assemble(control_points: &ControlPoints, kernel: &KernelSpec) -> Self {
        let matrix = get_a_matrix_symmetric(control_points.positions(), kernel.params());

        Self {
            matrix,
            rhs: control_points.displacements().to_owned(),
        }
    }

    /// Validates raw arrays and assembles the system.
    ///
    /// Fails with a shape error when there are no control points, when the
    /// row counts differ, or when either array is not `N × 3`.
    pub fn from_arrays(
        positions: MatRef<'_, f64>,
        displacements: MatRef<'_, f64>,
        kernel: &KernelSpec,
    ) -> MorphResult<Self> {
        let control_points = ControlPoints::new(positions.to_owned(), displacements.to_owned())?;
        Ok(Self::assemble(&control_points, kernel))
    }

    /// Number of control points `N`.
    pub fn dim(&self) -> usize {
        self.matrix.nrows()
    }

    pub fn matrix(&self) -> MatRef<'_, f64> {
        self.matrix.as_ref()
    }

    pub fn rhs(&self) -> MatRef<'_, f64> {
        self.rhs.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use equator::assert;
    use faer::mat;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    #[test]
    fn gram_is_bit_symmetric_with_unit_diagonal() {
        let mut rng = StdRng::seed_from_u64(3);
        let positions = Mat::from_fn(30, 3, |_, _| rng.random_range(0.0..2.0));
        let kernel = KernelSpec::gaussian(0.7).unwrap();

        let displacements = Mat::<f64>::zeros(30, 3);
        let system =
            GramSystem::from_arrays(positions.as_ref(), displacements.as_ref(), &kernel).unwrap();
        let g = system.matrix();

        assert!(system.dim() == 30);
        for i in 0..30 {
            assert!(g[(i, i)] == 1.0);
            for j in 0..30 {
                assert!(g[(i, j)].to_bits() == g[(j, i)].to_bits());
            }
        }
    }

    #[test]
    fn entries_follow_the_kernel() {
        let positions = mat![[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 2.0, 0.0f64]];
        let kernel = KernelSpec::gaussian(1.0).unwrap();
        let system =
            GramSystem::from_arrays(positions.as_ref(), Mat::zeros(3, 3).as_ref(), &kernel)
                .unwrap();

        let g = system.matrix();
        assert!((g[(0, 1)] - (-1.0f64).exp()).abs() < 1e-15);
        assert!((g[(0, 2)] - (-4.0f64).exp()).abs() < 1e-15);
        assert!((g[(1, 2)] - (-5.0f64).exp()).abs() < 1e-15);
    }

    #[test]
    fn shape_errors_on_empty_or_mismatched_input() {
        let kernel = KernelSpec::gaussian(1.0).unwrap();

        let err = GramSystem::from_arrays(
            Mat::<f64>::zeros(0, 3).as_ref(),
            Mat::<f64>::zeros(0, 3).as_ref(),
            &kernel,
        )
        .unwrap_err();
        assert!(err.kind() == ErrorKind::Shape);

        let err = GramSystem::from_arrays(
            Mat::<f64>::zeros(4, 3).as_ref(),
            Mat::<f64>::zeros(3, 3).as_ref(),
            &kernel,
        )
        .unwrap_err();
        assert!(err.kind() == ErrorKind::Shape);
    }
}
