//! Error types for configuration, evaluation, persistence and the run driver.

use std::path::PathBuf;

use thiserror::Error;

/// Boxed error returned by user phase functions.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Invalid run parameters, detected before any evaluation starts.
#[derive(Debug, Error)]
pub enum ConfigError {
  /// No limits were given.
  #[error("limits must have at least one dimension")]
  EmptyLimits,

  /// A limit interval is empty, inverted or not finite.
  #[error("invalid limits on axis {axis}: ({low}, {high})")]
  InvalidLimits {
    /// Axis of the offending interval.
    axis: usize,
    /// Lower bound.
    low: f64,
    /// Upper bound.
    high: f64,
  },

  /// Mesh and limits disagree on the number of dimensions.
  #[error("inconsistent dimensions for mesh ({mesh}) and limits ({limits})")]
  MeshDimension {
    /// Number of mesh entries.
    mesh: usize,
    /// Number of limit intervals.
    limits: usize,
  },

  /// A mesh entry below 2.
  #[error("mesh size must be at least 2 in each direction, got {value} on axis {axis}")]
  MeshTooSmall {
    /// Axis of the offending entry.
    axis: usize,
    /// The offending entry.
    value: usize,
  },

  /// The finest box size is not representable exactly.
  #[error("mesh {mesh} with {num_steps} steps exceeds the exact coordinate range")]
  TooFine {
    /// Largest mesh entry.
    mesh: usize,
    /// Requested number of refinement steps.
    num_steps: u32,
  },

  /// The checkpoint interval is negative or not finite.
  #[error("save interval must be a finite, non-negative number of seconds, got {0}")]
  InvalidSaveInterval(f64),

  /// Both `load` and an explicit initial result were requested.
  #[error("cannot combine 'load' with an explicit initial result")]
  LoadConflict,

  /// `load` was requested without a save file.
  #[error("'load' requires 'save_file' to be set")]
  LoadWithoutFile,

  /// The resumed result was computed for different limits.
  #[error("initial result limits {found:?} do not match limits {expected:?}")]
  LimitsMismatch {
    /// Limits passed to the run.
    expected: Vec<(f64, f64)>,
    /// Limits stored in the initial result.
    found: Vec<(f64, f64)>,
  },

  /// The resumed result does not fit the requested mesh.
  #[error("initial result is incompatible with the mesh: {0}")]
  IncompatibleResult(String),

  /// The configuration file could not be read.
  #[error("failed to read config file {path}")]
  Read {
    /// Path of the config file.
    path: PathBuf,
    /// Underlying I/O error.
    #[source]
    source: std::io::Error,
  },

  /// The configuration file is not valid TOML for [`RunConfig`](crate::RunConfig).
  #[error("failed to parse config TOML")]
  Toml(#[from] toml::de::Error),
}

/// The user phase function failed for a position.
#[derive(Debug, Error)]
pub enum EvaluationError {
  /// The function returned an error.
  #[error("phase function failed at {position:?}")]
  Failed {
    /// Position in user coordinates.
    position: Vec<f64>,
    /// Error returned by the function.
    #[source]
    source: BoxError,
  },

  /// The function panicked.
  #[error("phase function panicked at {position:?}: {message}")]
  Panicked {
    /// Position in user coordinates.
    position: Vec<f64>,
    /// Panic payload, if it was a string.
    message: String,
  },
}

impl EvaluationError {
  /// Position at which the evaluation failed.
  pub fn position(&self) -> &[f64] {
    match self {
      Self::Failed { position, .. } | Self::Panicked { position, .. } => position,
    }
  }
}

/// Saving or loading a result failed.
#[derive(Debug, Error)]
pub enum PersistError {
  /// File system failure.
  #[error("I/O error on {path}")]
  Io {
    /// File that was being read or written.
    path: PathBuf,
    /// Underlying I/O error.
    #[source]
    source: std::io::Error,
  },

  /// Encoding or decoding failure.
  #[error("encoding error")]
  Encoding(#[from] serde_json::Error),

  /// The document decoded but does not describe a valid result.
  #[error("invalid result document: {0}")]
  Invalid(String),
}

/// Any failure of [`run`](crate::run).
#[derive(Debug, Error)]
pub enum RunError {
  /// Invalid parameters.
  #[error(transparent)]
  Config(#[from] ConfigError),

  /// The phase function failed.
  #[error(transparent)]
  Evaluation(#[from] EvaluationError),

  /// A checkpoint could not be written, or a result could not be loaded.
  #[error(transparent)]
  Persist(#[from] PersistError),

  /// Split tasks were pending with no evaluation in flight.
  #[error("scheduler stalled with {pending} pending split tasks")]
  Stalled {
    /// Number of tasks left waiting.
    pending: usize,
  },
}
