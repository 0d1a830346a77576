/////////////////////////////////////////////////////////////////////////////////////////////
//
// Example 2D plate morph: the top edge of a unit square is pushed in with a sine profile
// while the bottom edge is held fixed.
//
// Created on: 15 Nov 2025     Author: Daniel Owen 
//
// Copyright (c) 2025, Maptek Pty Ltd. All rights reserved. Licensed under the MIT License. 
//
/////////////////////////////////////////////////////////////////////////////////////////////

use morph_rbf::{
    ControlPointsBuilder, KernelSpec, RbfMorpher, create_evaluation_grid, nodes_to_csv,
    boundary::{Axis, select_nodes_on_plane, sine_wave_offset},
};
use std::env;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    // Plate of 11 x 11 nodes covering [0, 1]^2 at z = 0
    let n = 11;
    let plate = create_evaluation_grid(&[(0.0, 1.0), (0.0, 1.0), (0.0, 0.0)], &[n, n, 1])?;

    // Top edge moves by -0.2 sin(pi x) in y, bottom edge stays put
    let top = select_nodes_on_plane(plate.as_ref(), Axis::Y, 1.0, 1e-9);
    let bottom = select_nodes_on_plane(plate.as_ref(), Axis::Y, 0.0, 1e-9);

    let control_points = ControlPointsBuilder::new()
        .displaced(plate.as_ref(), &top, sine_wave_offset(0.2, Axis::Y, Axis::X))
        .fixed(plate.as_ref(), &bottom)
        .build()?;

    // Setup and solve the RBF system
    let morpher = RbfMorpher::builder(control_points, KernelSpec::gaussian(0.5)?).build()?;
    println!(
        "Solved {} control points with {} (condition estimate {:.3e})",
        morpher.control_points().len(),
        morpher.factorisation(),
        morpher.condition_estimate()
    );

    // Move every node of the plate
    let displacements = morpher.displacements_at(plate.as_ref())?;
    let morphed = morpher.apply(plate.as_ref())?;

    let max_dy = (0..plate.nrows())
        .map(|i| displacements[(i, 1)].abs())
        .fold(0.0, f64::max);
    println!("Largest y displacement: {max_dy:.4}");

    let centre = (n / 2) * n + n / 2;
    println!(
        "Plate centre moved from y = {:.4} to y = {:.4}",
        plate[(centre, 1)],
        morphed[(centre, 1)]
    );

    let outpath = env::temp_dir().join("sine_wave_2d_morphed.csv");
    nodes_to_csv(morphed.as_ref(), Some(displacements.as_ref()), &outpath)?;
    println!("Wrote {}", outpath.display());

    Ok(())
}
