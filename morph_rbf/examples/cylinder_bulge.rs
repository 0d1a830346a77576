/////////////////////////////////////////////////////////////////////////////////////////////
//
// Example 3D cylinder morph: a paraboloid bulge is applied to the z = 0.3 cross section
// while the end caps are held fixed, reporting progress through a closure sink.
//
// Created on: 15 Nov 2025     Author: Daniel Owen 
//
// Copyright (c) 2025, Maptek Pty Ltd. All rights reserved. Licensed under the MIT License. 
//
/////////////////////////////////////////////////////////////////////////////////////////////

use faer::Mat;
use morph_rbf::{
    ControlPointsBuilder, KernelSpec, MorphParams, MorphSettings, RbfMorpher, nodes_to_csv,
    boundary::{Axis, paraboloid_bulge, select_nodes_on_plane},
    progress::{ProgressMsg, ProgressSink, closure_sink},
};
use std::{env, f64::consts::PI, sync::Arc, thread};

/// Generates a callback closure_sink
fn get_callback_sink() -> (Arc<dyn ProgressSink>, thread::JoinHandle<()>) {
    closure_sink(256, |msg| match msg {
        ProgressMsg::StageStarted { stage } => {
            println!("Started:  {stage}");
        }
        ProgressMsg::StageFinished { stage, elapsed } => {
            println!("Finished: {stage} in {:.3?}", elapsed);
        }
        ProgressMsg::ConditionEstimate { estimate, threshold } => {
            println!("Condition estimate {estimate:>.3E} (threshold {threshold:>.1E})");
        }
        ProgressMsg::EvaluationProgress {
            completed_chunks,
            total_chunks,
            progress,
        } => {
            println!(
                "Evaluated chunk {:>3} of {:>3}    {:>.1}%",
                completed_chunks,
                total_chunks,
                progress * 100.0
            );
        }
        ProgressMsg::Message { message } => {
            println!("{message}");
        }
    })
}

/// Nodes of a unit radius, unit height cylinder on concentric rings.
///
/// Ring `k` of `rings` has radius `k / rings` and `max(1, 8k)` nodes, and the
/// ring stack repeats on `layers + 1` evenly spaced z levels.
fn cylinder_nodes(rings: usize, layers: usize) -> Mat<f64> {
    let mut coords = Vec::new();
    for layer in 0..=layers {
        let z = layer as f64 / layers as f64;
        for ring in 0..=rings {
            let radius = ring as f64 / rings as f64;
            let count = (8 * ring).max(1);
            for k in 0..count {
                let theta = 2.0 * PI * k as f64 / count as f64;
                coords.push([radius * theta.cos(), radius * theta.sin(), z]);
            }
        }
    }

    Mat::from_fn(coords.len(), 3, |i, j| coords[i][j])
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    let nodes = cylinder_nodes(4, 10);
    println!("Cylinder mesh has {} nodes", nodes.nrows());

    // Hold the end caps, bulge the z = 0.3 cross section upwards
    let tolerance = 1e-9;
    let top = select_nodes_on_plane(nodes.as_ref(), Axis::Z, 1.0, tolerance);
    let bottom = select_nodes_on_plane(nodes.as_ref(), Axis::Z, 0.0, tolerance);
    let section = select_nodes_on_plane(nodes.as_ref(), Axis::Z, 0.3, tolerance);

    let control_points = ControlPointsBuilder::new()
        .fixed(nodes.as_ref(), &top)
        .displaced(nodes.as_ref(), &section, paraboloid_bulge(0.15, 1.05))
        .fixed(nodes.as_ref(), &bottom)
        .build()?;

    // Small evaluation chunks so progress reports are visible
    let params = MorphParams::builder().eval_chunk_size(64).build()?;
    let kernel = KernelSpec::gaussian(0.1)?;

    // Create a callback to receive progress updates from the RbfMorpher
    let (callback, listener) = get_callback_sink();

    let morpher = RbfMorpher::builder(control_points, kernel)
        .params(params)
        .progress_callback(callback.clone())
        .build()?;

    let displacements = morpher.displacements_at(nodes.as_ref())?;
    let morphed = morpher.apply(nodes.as_ref())?;

    let apex = section[0];
    println!(
        "Section centre moved from z = {:.4} to z = {:.4}",
        nodes[(apex, 2)],
        morphed[(apex, 2)]
    );

    // Persist the settings so the same morph can be rerun later
    let cwd = env::temp_dir();
    MorphSettings::from(&morpher).save(cwd.join("cylinder_bulge_settings.json"))?;
    nodes_to_csv(
        morphed.as_ref(),
        Some(displacements.as_ref()),
        cwd.join("cylinder_bulge_morphed.csv"),
    )?;

    drop(morpher);
    drop(callback);
    let _ = listener.join();

    Ok(())
}
