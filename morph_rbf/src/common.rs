/////////////////////////////////////////////////////////////////////////////////////////////
//
// Defines shared helpers for random point generation, evaluation grids, and node CSV I/O.
//
// Created on: 15 Nov 2025     Author: Daniel Owen 
//
// Copyright (c) 2025, Maptek Pty Ltd. All rights reserved. Licensed under the MIT License. 
//
/////////////////////////////////////////////////////////////////////////////////////////////

use crate::{
    control_points::{ControlPoints, DIMENSIONS, check_point_array},
    error::{MorphError, MorphResult},
};
use csv::{ReaderBuilder, Writer};
use faer::{Mat, MatRef};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors raised while reading or writing node CSV files.
#[derive(Debug, Error)]
pub enum PointIOError {
    #[error("failed to read or write CSV file {}: {source}", .path.display())]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    #[error("{}: row {row} has {found} columns, expected {expected}", .path.display())]
    ColumnCount {
        path: PathBuf,
        row: usize,
        expected: usize,
        found: usize,
    },

    #[error("{}: row {row}, column {col}: cannot parse {value:?} as a number", .path.display())]
    Parse {
        path: PathBuf,
        row: usize,
        col: usize,
        value: String,
    },

    #[error("{}: {source}", .path.display())]
    Invalid {
        path: PathBuf,
        #[source]
        source: MorphError,
    },
}

/// Generate a matrix of random points in the unit hypercube.
///
/// # Parameters
/// - `n`: Number of points to generate (rows in the output matrix).
/// - `d`: Number of spatial dimensions per point (columns in the output matrix).
/// - `seed`: Optional random seed.
///   - If `Some(seed)` is provided, the same sequence of points will be generated
///     deterministically across runs and platforms (useful for reproducible tests).
///   - If `None`, the generator is seeded from the operating system's randomness source.
///
/// # Returns
/// A `Mat<f64>` of shape `(n, d)` where each element lies in `[0.0, 1.0)`.
///
/// # Example
/// ```
/// use morph_rbf::generate_random_points;
///
/// // Generate 100 reproducible 3D points
/// let pts = generate_random_points(100, 3, Some(42));
/// assert_eq!(pts.ncols(), 3);
/// ```
pub fn generate_random_points(n: usize, d: usize, seed: Option<u64>) -> Mat<f64> {
    let mut rng = match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_os_rng(),
    };

    Mat::from_fn(n, d, |_, _| rng.random_range(0.0..1.0))
}

/// Create a regular grid from per-dimension ranges and sample counts.
///
/// The first dimension varies fastest. A count of one places the single
/// sample at the range start.
///
/// # Arguments
/// * `ranges` - Inclusive `(min, max)` range for each dimension.
/// * `counts` - Number of grid samples per range; must match `ranges.len()`.
///
/// # Returns
/// A `Mat<f64>` with one row per grid point and one column per dimension.
pub fn create_evaluation_grid(ranges: &[(f64, f64)], counts: &[usize]) -> MorphResult<Mat<f64>> {
    if ranges.len() != counts.len() {
        return Err(MorphError::InvalidParameter {
            name: "counts",
            reason: format!("{} counts given for {} ranges", counts.len(), ranges.len()),
        });
    }
    if counts.contains(&0) {
        return Err(MorphError::InvalidParameter {
            name: "counts",
            reason: "every dimension needs at least one sample".to_string(),
        });
    }

    let total_points: usize = counts.iter().product();

    Ok(Mat::from_fn(total_points, ranges.len(), |row_idx, col_idx| {
        let dim_points = counts[col_idx];
        let (start, end) = ranges[col_idx];
        let step = match dim_points {
            1 => 0.0,
            _ => (end - start) / (dim_points as f64 - 1.0),
        };

        let stride = counts[..col_idx].iter().product::<usize>();
        let index_in_dim = (row_idx / stride) % dim_points;
        start + step * index_in_dim as f64
    }))
}

/// Reads every record as `num_cols` floats, row-major.
fn read_rows(
    path: &Path,
    has_headers: bool,
    num_cols: usize,
) -> Result<(Vec<f64>, usize), PointIOError> {
    let csv_err = |source| PointIOError::Csv {
        path: path.to_path_buf(),
        source,
    };

    let mut reader = ReaderBuilder::new()
        .has_headers(has_headers)
        .trim(csv::Trim::All)
        .from_path(path)
        .map_err(csv_err)?;

    let mut data = Vec::new();
    let mut num_rows = 0;

    for (row, result) in reader.records().enumerate() {
        let record = result.map_err(csv_err)?;
        if record.len() != num_cols {
            return Err(PointIOError::ColumnCount {
                path: path.to_path_buf(),
                row,
                expected: num_cols,
                found: record.len(),
            });
        }

        for (col, value) in record.iter().enumerate() {
            let parsed: f64 = value.parse().map_err(|_| PointIOError::Parse {
                path: path.to_path_buf(),
                row,
                col,
                value: value.to_string(),
            })?;
            data.push(parsed);
        }

        num_rows += 1;
    }

    Ok((data, num_rows))
}

/// Load an `M × 3` node matrix from a CSV file with `X, Y, Z` columns.
pub fn csv_to_nodes(
    file_path: impl AsRef<Path>,
    has_headers: bool,
) -> Result<Mat<f64>, PointIOError> {
    let path = file_path.as_ref();
    let (data, num_rows) = read_rows(path, has_headers, DIMENSIONS)?;

    Ok(MatRef::from_row_major_slice(data.as_slice(), num_rows, DIMENSIONS).to_owned())
}

/// Load control points from a CSV file with `X, Y, Z, DX, DY, DZ` columns.
pub fn csv_to_control_points(
    file_path: impl AsRef<Path>,
    has_headers: bool,
) -> Result<ControlPoints, PointIOError> {
    let path = file_path.as_ref();
    let (data, num_rows) = read_rows(path, has_headers, 2 * DIMENSIONS)?;
    let table = MatRef::from_row_major_slice(data.as_slice(), num_rows, 2 * DIMENSIONS);

    ControlPoints::new(
        table.subcols(0, DIMENSIONS).to_owned(),
        table.subcols(DIMENSIONS, DIMENSIONS).to_owned(),
    )
    .map_err(|source| PointIOError::Invalid {
        path: path.to_path_buf(),
        source,
    })
}

/// Write node coordinates to a CSV file with headers `X, Y, Z`.
///
/// When `displacements` is given its rows are appended as `DX, DY, DZ`; it
/// must have the same number of rows as `nodes`.
pub fn nodes_to_csv(
    nodes: MatRef<'_, f64>,
    displacements: Option<MatRef<'_, f64>>,
    file_path: impl AsRef<Path>,
) -> Result<(), PointIOError> {
    let path = file_path.as_ref();
    let invalid = |source| PointIOError::Invalid {
        path: path.to_path_buf(),
        source,
    };
    let csv_err = |source| PointIOError::Csv {
        path: path.to_path_buf(),
        source,
    };

    check_point_array(nodes, "nodes").map_err(invalid)?;
    if let Some(disp) = displacements {
        check_point_array(disp, "displacements").map_err(invalid)?;
        if disp.nrows() != nodes.nrows() {
            return Err(invalid(MorphError::CountMismatch {
                control_points: nodes.nrows(),
                displacements: disp.nrows(),
            }));
        }
    }

    let mut wtr = Writer::from_path(path).map_err(csv_err)?;

    let headers: &[&str] = match displacements {
        Some(_) => &["X", "Y", "Z", "DX", "DY", "DZ"],
        None => &["X", "Y", "Z"],
    };
    wtr.write_record(headers).map_err(csv_err)?;

    for i in 0..nodes.nrows() {
        let mut record: Vec<String> = nodes.row(i).iter().map(|c| c.to_string()).collect();
        if let Some(disp) = displacements {
            record.extend(disp.row(i).iter().map(|c| c.to_string()));
        }
        wtr.write_record(&record).map_err(csv_err)?;
    }

    wtr.flush().map_err(|err| csv_err(err.into()))?;
    Ok(())
}
