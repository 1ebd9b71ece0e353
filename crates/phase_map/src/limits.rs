//! Per-axis user limits and the unit-cube → user-space mapping.

use crate::coordinate::{rational_to_f64, Coordinate};
use crate::error::ConfigError;

/// Relative tolerance when comparing limits of a resumed result.
const LIMITS_RTOL: f64 = 1e-9;

/// Per-axis `(low, high)` bounds of the mapped domain.
#[derive(Clone, Debug, PartialEq)]
pub struct Limits {
  bounds: Vec<(f64, f64)>,
}

impl Limits {
  /// Validate and wrap per-axis bounds.
  pub fn new(bounds: &[(f64, f64)]) -> Result<Self, ConfigError> {
    if bounds.is_empty() {
      return Err(ConfigError::EmptyLimits);
    }
    for (axis, &(low, high)) in bounds.iter().enumerate() {
      if !low.is_finite() || !high.is_finite() || low >= high {
        return Err(ConfigError::InvalidLimits { axis, low, high });
      }
    }
    Ok(Self {
      bounds: bounds.to_vec(),
    })
  }

  /// Number of dimensions.
  #[inline]
  pub fn dim(&self) -> usize {
    self.bounds.len()
  }

  /// Bounds as a slice.
  pub fn as_slice(&self) -> &[(f64, f64)] {
    &self.bounds
  }

  /// Map a unit-cube coordinate to user space: `low + x * (high - low)`.
  pub fn position(&self, coordinate: &Coordinate) -> Vec<f64> {
    debug_assert_eq!(coordinate.dim(), self.dim(), "coordinate dimension differs");
    coordinate
      .iter()
      .zip(&self.bounds)
      .map(|(x, &(low, high))| {
        let x = rational_to_f64(x);
        low * (1.0 - x) + high * x
      })
      .collect()
  }

  /// True if both limits have the same dimension and agree within a small
  /// relative tolerance.
  pub fn approx_eq(&self, other: &Limits) -> bool {
    self.dim() == other.dim()
      && self
        .bounds
        .iter()
        .zip(&other.bounds)
        .all(|(a, b)| close(a.0, b.0) && close(a.1, b.1))
  }
}

fn close(a: f64, b: f64) -> bool {
  (a - b).abs() <= LIMITS_RTOL * a.abs().max(b.abs()).max(1.0)
}
