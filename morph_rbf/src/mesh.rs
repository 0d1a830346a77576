/////////////////////////////////////////////////////////////////////////////////////////////
//
// Passes mesh connectivity and tags through a morph untouched while moving the nodes.
//
// Created on: 15 Nov 2025     Author: Daniel Owen 
//
// Copyright (c) 2025, Maptek Pty Ltd. All rights reserved. Licensed under the MIT License. 
//
/////////////////////////////////////////////////////////////////////////////////////////////

use crate::{
    config::MorphParams,
    control_points::{ControlPoints, check_point_array},
    error::{MorphError, MorphResult},
    kernel_spec::KernelSpec,
    morph::RbfMorpher,
};
use faer::Mat;

/// Plain node, connectivity and tag arrays exchanged with mesh readers and writers.
///
/// Connectivity and tags are opaque to the morph: they are validated for
/// consistency and carried through unchanged.
#[derive(Debug, Clone, PartialEq)]
pub struct MeshArrays {
    /// `M × 3` node coordinates.
    pub nodes: Mat<f64>,

    /// Node indices of each element.
    pub elements: Vec<Vec<usize>>,

    /// One tag per element.
    pub element_tags: Vec<i32>,
}

impl MeshArrays {
    /// Validates and bundles mesh arrays.
    pub fn new(
        nodes: Mat<f64>,
        elements: Vec<Vec<usize>>,
        element_tags: Vec<i32>,
    ) -> MorphResult<Self> {
        let mesh = Self {
            nodes,
            elements,
            element_tags,
        };
        mesh.validate()?;
        Ok(mesh)
    }

    /// Checks node shape, tag count and that every element references an existing node.
    pub fn validate(&self) -> MorphResult<()> {
        check_point_array(self.nodes.as_ref(), "mesh nodes")?;

        if self.elements.len() != self.element_tags.len() {
            return Err(MorphError::InvalidMesh {
                reason: format!(
                    "{} elements but {} element tags",
                    self.elements.len(),
                    self.element_tags.len()
                ),
            });
        }

        let num_nodes = self.nodes.nrows();
        for (e, element) in self.elements.iter().enumerate() {
            if let Some(&bad) = element.iter().find(|&&idx| idx >= num_nodes) {
                return Err(MorphError::InvalidMesh {
                    reason: format!(
                        "element {e} references node {bad} but there are {num_nodes} nodes"
                    ),
                });
            }
        }

        Ok(())
    }

    pub fn num_nodes(&self) -> usize {
        self.nodes.nrows()
    }

    pub fn num_elements(&self) -> usize {
        self.elements.len()
    }
}

/// Morphs the nodes of `mesh`, returning a new mesh with identical
/// connectivity and tags.
pub fn morph_mesh(
    mesh: &MeshArrays,
    control_points: ControlPoints,
    kernel: &KernelSpec,
    params: &MorphParams,
) -> MorphResult<MeshArrays> {
    mesh.validate()?;

    let morpher = RbfMorpher::builder(control_points, *kernel)
        .params(*params)
        .build()?;

    Ok(MeshArrays {
        nodes: morpher.apply(mesh.nodes.as_ref())?,
        elements: mesh.elements.clone(),
        element_tags: mesh.element_tags.clone(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use equator::assert;
    use faer::mat;

    fn unit_tet() -> MeshArrays {
        MeshArrays::new(
            mat![
                [0.0, 0.0, 0.0],
                [1.0, 0.0, 0.0],
                [0.0, 1.0, 0.0],
                [0.0, 0.0, 1.0],
                [0.3, 0.3, 0.3f64],
            ],
            vec![vec![0, 1, 2, 4], vec![0, 1, 3, 4], vec![0, 2, 3, 4]],
            vec![7, 7, 9],
        )
        .unwrap()
    }

    #[test]
    fn connectivity_and_tags_pass_through_untouched() {
        let mesh = unit_tet();
        let control_points = ControlPoints::new(
            mat![[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0], [0.0, 0.0, 1.0f64]],
            mat![[0.0, 0.0, 0.0], [0.1, 0.0, 0.0], [0.0, 0.0, 0.0], [0.0, 0.0, 0.2f64]],
        )
        .unwrap();

        let morphed = morph_mesh(
            &mesh,
            control_points,
            &KernelSpec::gaussian(0.8).unwrap(),
            &MorphParams::default(),
        )
        .unwrap();

        assert!(morphed.elements == mesh.elements);
        assert!(morphed.element_tags == mesh.element_tags);
        assert!(morphed.num_nodes() == mesh.num_nodes());
        assert!((morphed.nodes[(1, 0)] - 1.1).abs() < 1e-8);
        assert!((morphed.nodes[(3, 2)] - 1.2).abs() < 1e-8);
        assert!(morphed.nodes[(4, 0)] != mesh.nodes[(4, 0)]);
    }

    #[test]
    fn inconsistent_arrays_are_shape_errors() {
        let nodes = Mat::<f64>::zeros(3, 3);

        let err = MeshArrays::new(nodes.clone(), vec![vec![0, 1, 2]], vec![]).unwrap_err();
        assert!(err.kind() == ErrorKind::Shape);

        let err = MeshArrays::new(nodes.clone(), vec![vec![0, 1, 3]], vec![1]).unwrap_err();
        assert!(err.kind() == ErrorKind::Shape);

        let err = MeshArrays::new(Mat::zeros(3, 2), vec![], vec![]).unwrap_err();
        assert!(err.kind() == ErrorKind::Shape);
    }
}
