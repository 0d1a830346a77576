/////////////////////////////////////////////////////////////////////////////////////////////
//
// Declares solver, evaluation, and persisted settings types for configuring a morph.
//
// Created on: 15 Nov 2025     Author: Daniel Owen 
//
// Copyright (c) 2025, Maptek Pty Ltd. All rights reserved. Licensed under the MIT License. 
//
/////////////////////////////////////////////////////////////////////////////////////////////

//! Declares solver, evaluation, and persisted settings types for configuring a morph.
use crate::{
    error::{MorphError, MorphResult},
    kernel_spec::KernelSpec,
};
use serde::{Deserialize, Serialize};
use std::{
    fs::File,
    io::{self, BufReader, BufWriter, Write},
    path::{Path, PathBuf},
};
use thiserror::Error;

/// Direct factorisation used to solve the Gram system.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub enum SolverType {
    /// Cholesky (LLᵀ) first, falling back to partially pivoted LU when a
    /// non-positive pivot is met.
    #[default]
    Auto,

    /// Cholesky (LLᵀ) only. A non-positive pivot is a numerical error.
    Cholesky,

    /// Partially pivoted LU only.
    Lu,
}

/// Solver and evaluation parameters for a morph.
///
/// ### Default Values
/// - `solver_type`: [`SolverType::Auto`]
/// - `condition_threshold`: `1e12`
/// - `coincidence_tolerance`: `1e-10`
/// - `exactness_tolerance`: `1e-8`
/// - `eval_chunk_size`: `1024`
/// - `parallel_evaluation`: `true`
#[derive(Clone, Copy, Serialize, Deserialize, Debug, PartialEq)]
pub struct MorphParams {
    /// Factorisation used for the Gram system.
    pub solver_type: SolverType,

    /// Largest accepted 1-norm condition number estimate of the Gram matrix.
    pub condition_threshold: f64,

    /// Control points closer than this (Euclidean) are rejected as coincident.
    pub coincidence_tolerance: f64,

    /// Largest accepted absolute error between the fitted field at a control
    /// point and its prescribed displacement. Fits above it are rejected.
    #[serde(default = "default_exactness_tolerance")]
    pub exactness_tolerance: f64,

    /// Number of query rows evaluated in each kernel block.
    pub eval_chunk_size: usize,

    /// Whether query chunks are evaluated on the rayon thread pool.
    pub parallel_evaluation: bool,
}

fn default_exactness_tolerance() -> f64 {
    1e-8
}

impl Default for MorphParams {
    fn default() -> Self {
        MorphParams {
            solver_type: SolverType::Auto,
            condition_threshold: 1e12,
            coincidence_tolerance: 1e-10,
            exactness_tolerance: default_exactness_tolerance(),
            eval_chunk_size: 1024,
            parallel_evaluation: true,
        }
    }
}

impl MorphParams {
    /// Returns a new [`MorphParamsBuilder`] populated with the default values.
    pub fn builder() -> MorphParamsBuilder {
        MorphParamsBuilder {
            params: MorphParams::default(),
        }
    }

    /// Checks every parameter is usable, returning a configuration error otherwise.
    pub fn validate(&self) -> MorphResult<()> {
        if !(self.condition_threshold.is_finite() && self.condition_threshold > 0.0) {
            return Err(MorphError::InvalidParameter {
                name: "condition_threshold",
                reason: format!("must be finite and positive, got {}", self.condition_threshold),
            });
        }

        if !(self.coincidence_tolerance.is_finite() && self.coincidence_tolerance >= 0.0) {
            return Err(MorphError::InvalidParameter {
                name: "coincidence_tolerance",
                reason: format!(
                    "must be finite and non-negative, got {}",
                    self.coincidence_tolerance
                ),
            });
        }

        if !(self.exactness_tolerance.is_finite() && self.exactness_tolerance > 0.0) {
            return Err(MorphError::InvalidParameter {
                name: "exactness_tolerance",
                reason: format!("must be finite and positive, got {}", self.exactness_tolerance),
            });
        }

        if self.eval_chunk_size == 0 {
            return Err(MorphError::InvalidParameter {
                name: "eval_chunk_size",
                reason: "must be at least 1".to_string(),
            });
        }

        Ok(())
    }
}

/// A convenience builder for constructing a [`MorphParams`] instance.
///
/// The builder should be called via the [`MorphParams::builder`] method.
///
/// See [`MorphParams`] for details on each field.
#[derive(Debug, Clone, Copy)]
pub struct MorphParamsBuilder {
    params: MorphParams,
}

impl MorphParamsBuilder {
    /// Sets the solver type.
    pub fn solver_type(mut self, solver_type: SolverType) -> Self {
        self.params.solver_type = solver_type;
        self
    }

    /// Sets the largest accepted condition number estimate.
    pub fn condition_threshold(mut self, condition_threshold: f64) -> Self {
        self.params.condition_threshold = condition_threshold;
        self
    }

    /// Sets the coincident control-point tolerance.
    pub fn coincidence_tolerance(mut self, coincidence_tolerance: f64) -> Self {
        self.params.coincidence_tolerance = coincidence_tolerance;
        self
    }

    /// Sets the largest accepted control-point residual.
    pub fn exactness_tolerance(mut self, exactness_tolerance: f64) -> Self {
        self.params.exactness_tolerance = exactness_tolerance;
        self
    }

    /// Sets the number of query rows per evaluation chunk.
    pub fn eval_chunk_size(mut self, eval_chunk_size: usize) -> Self {
        self.params.eval_chunk_size = eval_chunk_size;
        self
    }

    /// Enables or disables parallel chunk evaluation.
    pub fn parallel_evaluation(mut self, parallel_evaluation: bool) -> Self {
        self.params.parallel_evaluation = parallel_evaluation;
        self
    }

    /// Validates and returns the [`MorphParams`].
    pub fn build(self) -> MorphResult<MorphParams> {
        self.params.validate()?;
        Ok(self.params)
    }
}

/// Kernel choice and solver parameters persisted together.
#[derive(Clone, Copy, Serialize, Deserialize, Debug, PartialEq)]
pub struct MorphSettings {
    /// Radial kernel and scale coefficient.
    pub kernel: KernelSpec,

    /// Solver and evaluation parameters.
    #[serde(default)]
    pub params: MorphParams,
}

impl MorphSettings {
    /// Pairs a kernel with default parameters.
    pub fn new(kernel: KernelSpec) -> Self {
        Self {
            kernel,
            params: MorphParams::default(),
        }
    }

    /// Save these settings to a **JSON envelope** `{ format, version, kernel, params }`.
    ///
    /// ### Errors
    /// - Returns `ConfigIOError::{Create, Serialize, Flush}` on I/O or serialization
    ///   failures.
    ///
    /// ### Example
    /// ```no_run
    /// # use morph_rbf::{KernelSpec, MorphSettings};
    /// let settings = MorphSettings::new(KernelSpec::gaussian(0.3)?);
    /// settings.save("morph_settings.json")?;
    /// # Ok::<(), Box<dyn std::error::Error>>(())
    /// ```
    pub fn save<P: AsRef<Path>>(&self, path: P) -> ConfigIOResult<()> {
        let path_ref = path.as_ref();
        let file = File::create(path_ref).map_err(|e| ConfigIOError::Create {
            path: path_ref.to_path_buf(),
            source: e,
        })?;
        let mut w = BufWriter::new(file);

        let env = JsonEnvelopeRef {
            format: JSON_FORMAT_NAME,
            version: JSON_VERSION,
            settings: self,
        };

        serde_json::to_writer_pretty(&mut w, &env).map_err(|e| ConfigIOError::Serialize {
            path: path_ref.to_path_buf(),
            source: e,
        })?;
        w.flush().map_err(|e| ConfigIOError::Flush {
            path: path_ref.to_path_buf(),
            source: e,
        })?;
        Ok(())
    }

    /// Load settings from a versioned **JSON envelope**, validating format, version
    /// and parameters.
    ///
    /// ### Errors
    /// - Returns `ConfigIOError::{Open, Parse, FormatMismatch, VersionMismatch, Invalid}`
    ///   as appropriate.
    pub fn load<P: AsRef<Path>>(path: P) -> ConfigIOResult<Self> {
        let path_ref = path.as_ref();

        let file = File::open(path_ref).map_err(|e| ConfigIOError::Open {
            path: path_ref.to_path_buf(),
            source: e,
        })?;
        let reader = BufReader::new(file);

        let env: JsonEnvelopeOwned<Self> =
            serde_json::from_reader(reader).map_err(|e| ConfigIOError::Parse {
                path: path_ref.to_path_buf(),
                source: e,
            })?;

        // Validate envelope
        if env.format != JSON_FORMAT_NAME {
            return Err(ConfigIOError::FormatMismatch {
                path: path_ref.to_path_buf(),
                found: env.format,
                expected: JSON_FORMAT_NAME,
            });
        }

        if env.version != JSON_VERSION {
            return Err(ConfigIOError::VersionMismatch {
                path: path_ref.to_path_buf(),
                found: env.version,
                expected: JSON_VERSION,
            });
        }

        env.settings
            .params
            .validate()
            .map_err(|e| ConfigIOError::Invalid {
                path: path_ref.to_path_buf(),
                source: e,
            })?;

        Ok(env.settings)
    }
}

const JSON_FORMAT_NAME: &str = "morph_rbf.settings.json";
const JSON_VERSION: u32 = 1;

/// Borrowing envelope for SAVE.
#[derive(Serialize)]
struct JsonEnvelopeRef<'a, T: ?Sized> {
    format: &'static str,
    version: u32,
    #[serde(flatten)]
    settings: &'a T,
}

/// Owning envelope for LOAD.
#[derive(Deserialize)]
struct JsonEnvelopeOwned<T> {
    format: String,
    version: u32,
    #[serde(flatten)]
    settings: T,
}

type ConfigIOResult<T> = std::result::Result<T, ConfigIOError>;

/// Errors that can occur when saving or loading [`MorphSettings`].
#[derive(Debug, Error)]
pub enum ConfigIOError {
    /// Failed to create the target file before writing settings.
    #[error("creating {}: {source}", .path.display())]
    Create { path: PathBuf, source: io::Error },

    /// Failed to open an existing settings file for reading.
    #[error("opening {}: {source}", .path.display())]
    Open { path: PathBuf, source: io::Error },

    /// Failed to flush buffered output when finishing a write.
    #[error("flushing {}: {source}", .path.display())]
    Flush { path: PathBuf, source: io::Error },

    /// Error serializing the settings to JSON.
    #[error("serializing JSON to {}: {source}", .path.display())]
    Serialize {
        path: PathBuf,
        source: serde_json::Error,
    },

    /// Error parsing JSON when reading settings from disk.
    #[error("parsing JSON in {}: {source}", .path.display())]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },

    /// The JSON `format` field does not match the expected settings format.
    #[error("unsupported format {found:?} (expected {expected:?}) in {}", .path.display())]
    FormatMismatch {
        path: PathBuf,
        found: String,
        expected: &'static str,
    },

    /// The JSON `version` field does not match the supported version.
    #[error("unsupported version {found} (expected {expected}) in {}", .path.display())]
    VersionMismatch {
        path: PathBuf,
        found: u32,
        expected: u32,
    },

    /// The stored parameters parsed but failed validation.
    #[error("invalid settings in {}: {source}", .path.display())]
    Invalid { path: PathBuf, source: MorphError },
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use equator::assert;
    use std::env;

    fn temp_path(name: &str) -> PathBuf {
        env::temp_dir().join(format!("morph_rbf_{}_{}.json", name, std::process::id()))
    }

    #[test]
    fn defaults_are_valid() {
        let params = MorphParams::default();
        assert!(params.validate().is_ok());
        assert!(params.solver_type == SolverType::Auto);
        assert!(params.condition_threshold == 1e12);
        assert!(params.exactness_tolerance == 1e-8);
        assert!(params.eval_chunk_size == 1024);
    }

    #[test]
    fn builder_rejects_unusable_values() {
        let err = MorphParams::builder().eval_chunk_size(0).build().unwrap_err();
        assert!(err.kind() == ErrorKind::Configuration);

        let err = MorphParams::builder()
            .condition_threshold(-1.0)
            .build()
            .unwrap_err();
        assert!(err.kind() == ErrorKind::Configuration);

        let err = MorphParams::builder()
            .coincidence_tolerance(f64::NAN)
            .build()
            .unwrap_err();
        assert!(err.kind() == ErrorKind::Configuration);

        let err = MorphParams::builder()
            .exactness_tolerance(0.0)
            .build()
            .unwrap_err();
        assert!(err.kind() == ErrorKind::Configuration);
    }

    #[test]
    fn settings_round_trip_through_json_envelope() {
        let path = temp_path("round_trip");
        let settings = MorphSettings {
            kernel: KernelSpec::from_name("spheroidal", 2.5).unwrap(),
            params: MorphParams::builder()
                .solver_type(SolverType::Lu)
                .eval_chunk_size(64)
                .parallel_evaluation(false)
                .build()
                .unwrap(),
        };

        settings.save(&path).unwrap();
        let text = std::fs::read_to_string(&path).unwrap();
        assert!(text.contains("morph_rbf.settings.json"));

        let loaded = MorphSettings::load(&path).unwrap();
        std::fs::remove_file(&path).ok();

        assert!(loaded == settings);
    }

    #[test]
    fn load_rejects_wrong_format_and_version() {
        let kernel = r#""kernel": {"kernel_type": "gaussian", "coef": 0.5}"#;

        let path = temp_path("bad_format");
        std::fs::write(
            &path,
            format!(r#"{{"format": "something_else", "version": 1, {kernel}}}"#),
        )
        .unwrap();
        let err = MorphSettings::load(&path).unwrap_err();
        std::fs::remove_file(&path).ok();
        assert!(matches!(err, ConfigIOError::FormatMismatch { .. }));

        let path = temp_path("bad_version");
        std::fs::write(
            &path,
            format!(r#"{{"format": "morph_rbf.settings.json", "version": 7, {kernel}}}"#),
        )
        .unwrap();
        let err = MorphSettings::load(&path).unwrap_err();
        std::fs::remove_file(&path).ok();
        assert!(matches!(err, ConfigIOError::VersionMismatch { found: 7, .. }));
    }

    #[test]
    fn load_fills_missing_params_with_defaults() {
        let path = temp_path("defaults");
        std::fs::write(
            &path,
            r#"{"format": "morph_rbf.settings.json", "version": 1,
                "kernel": {"kernel_type": "gaussian", "coef": 0.5}}"#,
        )
        .unwrap();
        let loaded = MorphSettings::load(&path).unwrap();
        std::fs::remove_file(&path).ok();

        assert!(loaded.params == MorphParams::default());
        assert!(loaded.kernel.coef() == 0.5);
    }
}
