//! RunConfig - parameters of one mapping run.
//!
//! Built in code (`RunConfig { num_steps: 3, ..Default::default() }`) or read
//! from a TOML file:
//!
//! ```toml
//! mesh = [3, 5]
//! num_steps = 4
//! all_corners = false
//! save_file = "phase_map.json"
//! save_interval_secs = 2.5
//! load = true
//! ```

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::coordinate::MAX_EXACT_DENOM;
use crate::error::ConfigError;
use crate::io::Format;

/// Initial grid resolution: points per axis, including both ends.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Mesh {
  /// Same count on every axis.
  Uniform(usize),
  /// One count per axis.
  PerAxis(Vec<usize>),
}

impl Mesh {
  /// Per-axis counts for a domain of `dim` axes.
  ///
  /// Every count must be at least 2 (one cell).
  pub fn resolve(&self, dim: usize) -> Result<Vec<usize>, ConfigError> {
    let mesh = match self {
      Self::Uniform(m) => vec![*m; dim],
      Self::PerAxis(values) => {
        if values.len() != dim {
          return Err(ConfigError::MeshDimension {
            mesh: values.len(),
            limits: dim,
          });
        }
        values.clone()
      }
    };
    if let Some((axis, &value)) = mesh.iter().enumerate().find(|(_, m)| **m < 2) {
      return Err(ConfigError::MeshTooSmall { axis, value });
    }
    Ok(mesh)
  }
}

impl Default for Mesh {
  fn default() -> Self {
    RunConfig::DEFAULT.mesh
  }
}

impl From<usize> for Mesh {
  fn from(m: usize) -> Self {
    Self::Uniform(m)
  }
}

impl From<Vec<usize>> for Mesh {
  fn from(values: Vec<usize>) -> Self {
    Self::PerAxis(values)
  }
}

impl<const N: usize> From<[usize; N]> for Mesh {
  fn from(values: [usize; N]) -> Self {
    Self::PerAxis(values.to_vec())
  }
}

/// Parameters of one run.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunConfig {
  /// Initial grid resolution.
  pub mesh: Mesh,
  /// Number of halvings below the initial box size.
  pub num_steps: u32,
  /// Sample all `3^dim` points of a split box instead of its midpoint and
  /// corners.
  pub all_corners: bool,
  /// Checkpoint file. No checkpoints are written when unset.
  pub save_file: Option<PathBuf>,
  /// Minimum time between checkpoints, in seconds.
  pub save_interval_secs: f64,
  /// Resume from `save_file` if it exists.
  pub load: bool,
  /// Start from scratch instead of failing when `load` cannot read the file.
  pub load_quiet: bool,
  /// Checkpoint encoding.
  pub format: Format,
}

impl RunConfig {
  /// Default run: mesh 5, five refinement steps, no checkpoints.
  pub const DEFAULT: Self = Self {
    mesh: Mesh::Uniform(5),
    num_steps: 5,
    all_corners: false,
    save_file: None,
    save_interval_secs: 1.0,
    load: false,
    load_quiet: true,
    format: Format::Json,
  };

  /// Coarse preview: mesh 3, two refinement steps.
  pub const PREVIEW: Self = Self {
    mesh: Mesh::Uniform(3),
    num_steps: 2,
    all_corners: false,
    save_file: None,
    save_interval_secs: 1.0,
    load: false,
    load_quiet: true,
    format: Format::Json,
  };

  /// Load a configuration from a TOML file. Missing keys keep their
  /// defaults.
  pub fn load(path: &Path) -> Result<Self, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
      path: path.to_path_buf(),
      source,
    })?;
    let config: RunConfig = toml::from_str(&content)?;
    config.save_interval()?;
    Ok(config)
  }

  /// Check the parameters against a domain of `dim` axes and return the
  /// per-axis mesh.
  pub fn validate(&self, dim: usize) -> Result<Vec<usize>, ConfigError> {
    let mesh = self.mesh.resolve(dim)?;
    let widest = mesh.iter().copied().max().unwrap_or(2);
    if !fits_exactly(widest, self.num_steps) {
      return Err(ConfigError::TooFine {
        mesh: widest,
        num_steps: self.num_steps,
      });
    }
    if self.load && self.save_file.is_none() {
      return Err(ConfigError::LoadWithoutFile);
    }
    self.save_interval()?;
    Ok(mesh)
  }

  /// Checkpoint interval as a duration.
  pub fn save_interval(&self) -> Result<Duration, ConfigError> {
    Duration::try_from_secs_f64(self.save_interval_secs)
      .map_err(|_| ConfigError::InvalidSaveInterval(self.save_interval_secs))
  }
}

impl Default for RunConfig {
  fn default() -> Self {
    Self::DEFAULT
  }
}

/// True if stencil points of the finest boxes stay exactly representable.
///
/// The finest midpoint has denominator `(mesh - 1) * 2^(num_steps + 1)`.
fn fits_exactly(mesh: usize, num_steps: u32) -> bool {
  if num_steps >= 53 {
    return false;
  }
  ((mesh as u128 - 1) << (num_steps + 1)) <= MAX_EXACT_DENOM
}

#[cfg(test)]
#[path = "config_test.rs"]
mod config_test;
