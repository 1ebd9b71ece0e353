//! Coordinate - exact rational position inside the unit hypercube.
//!
//! Stencil points computed by different boxes at the same nominal location
//! (a shared corner, a shared face midpoint) must compare and hash equal, so
//! all arithmetic is done on `Rational64` and never on floats. Positions are
//! mapped into user limits only when the phase function is called.

use std::fmt;
use std::ops::{Add, Index, Sub};

use num_rational::Rational64;
use num_traits::{One, ToPrimitive, Zero};
use smallvec::SmallVec;

/// Inline capacity for coordinate components.
const INLINE_DIM: usize = 4;

/// Largest denominator whose rationals convert to `f64` exactly.
pub(crate) const MAX_EXACT_DENOM: u128 = 1 << 53;

/// Immutable vector of exact rationals.
///
/// Ordering is lexicographic by axis, which lets sorted coordinate lists be
/// range-scanned along axis 0.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Coordinate(SmallVec<[Rational64; INLINE_DIM]>);

impl Coordinate {
  /// Create a coordinate from its components.
  pub fn new(values: impl IntoIterator<Item = Rational64>) -> Self {
    Self(values.into_iter().collect())
  }

  /// Coordinate with every component equal to zero.
  pub fn zeros(dim: usize) -> Self {
    Self(SmallVec::from_elem(Rational64::zero(), dim))
  }

  /// Grid point `index[i] / (mesh[i] - 1)` of a uniform mesh.
  ///
  /// `mesh` entries are point counts, so a mesh of 3 has cells of size 1/2.
  pub fn grid_point(index: &[i64], mesh: &[usize]) -> Self {
    debug_assert_eq!(index.len(), mesh.len(), "index and mesh dimension differ");
    Self(
      index
        .iter()
        .zip(mesh)
        .map(|(&i, &m)| Rational64::new(i, m as i64 - 1))
        .collect(),
    )
  }

  /// Size of one cell of a uniform mesh.
  pub fn cell_size(mesh: &[usize]) -> Self {
    Self(mesh.iter().map(|&m| Rational64::new(1, m as i64 - 1)).collect())
  }

  /// Number of dimensions.
  #[inline]
  pub fn dim(&self) -> usize {
    self.0.len()
  }

  /// Components as a slice.
  #[inline]
  pub fn as_slice(&self) -> &[Rational64] {
    &self.0
  }

  /// Iterate over components.
  pub fn iter(&self) -> impl Iterator<Item = &Rational64> {
    self.0.iter()
  }

  /// Every component halved.
  pub fn halved(&self) -> Self {
    self.scaled(Rational64::new(1, 2))
  }

  /// Every component multiplied by `factor`.
  pub fn scaled(&self, factor: Rational64) -> Self {
    Self(self.0.iter().map(|c| c * factor).collect())
  }

  /// `self + size * steps[i] / 2` per axis, with `steps[i]` in `0..=2`.
  ///
  /// Used to address corners (0 or 2) and midpoints (1) of a box.
  pub fn offset_by_halves(&self, size: &Coordinate, steps: &[u8]) -> Self {
    debug_assert_eq!(self.dim(), size.dim(), "corner and size dimension differ");
    debug_assert_eq!(self.dim(), steps.len(), "corner and steps dimension differ");
    Self(
      self
        .0
        .iter()
        .zip(size.iter())
        .zip(steps)
        .map(|((c, s), &k)| c + s * Rational64::new(i64::from(k), 2))
        .collect(),
    )
  }

  /// True if every component is `<=` the matching component of `other`.
  pub fn all_le(&self, other: &Coordinate) -> bool {
    self.0.iter().zip(other.iter()).all(|(a, b)| a <= b)
  }

  /// True if some component is `>` the matching component of `other`.
  pub fn any_gt(&self, other: &Coordinate) -> bool {
    self.0.iter().zip(other.iter()).any(|(a, b)| a > b)
  }

  /// True if every component lies in `[0, 1]`.
  pub fn in_unit_cube(&self) -> bool {
    let zero = Rational64::zero();
    let one = Rational64::one();
    self.0.iter().all(|c| *c >= zero && *c <= one)
  }

  /// Components as floating point, for diagnostics and user-space mapping.
  pub fn to_f64(&self) -> SmallVec<[f64; INLINE_DIM]> {
    self.0.iter().map(rational_to_f64).collect()
  }
}

/// Convert a rational to the nearest `f64`.
pub(crate) fn rational_to_f64(value: &Rational64) -> f64 {
  value
    .to_f64()
    .unwrap_or_else(|| *value.numer() as f64 / *value.denom() as f64)
}

impl Index<usize> for Coordinate {
  type Output = Rational64;

  fn index(&self, axis: usize) -> &Rational64 {
    &self.0[axis]
  }
}

impl Add for &Coordinate {
  type Output = Coordinate;

  fn add(self, rhs: &Coordinate) -> Coordinate {
    debug_assert_eq!(self.dim(), rhs.dim(), "coordinate dimension differs");
    Coordinate(self.0.iter().zip(rhs.iter()).map(|(a, b)| a + b).collect())
  }
}

impl Sub for &Coordinate {
  type Output = Coordinate;

  fn sub(self, rhs: &Coordinate) -> Coordinate {
    debug_assert_eq!(self.dim(), rhs.dim(), "coordinate dimension differs");
    Coordinate(self.0.iter().zip(rhs.iter()).map(|(a, b)| a - b).collect())
  }
}

impl FromIterator<Rational64> for Coordinate {
  fn from_iter<I: IntoIterator<Item = Rational64>>(iter: I) -> Self {
    Self::new(iter)
  }
}

impl fmt::Debug for Coordinate {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{self}")
  }
}

impl fmt::Display for Coordinate {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str("(")?;
    for (axis, c) in self.0.iter().enumerate() {
      if axis > 0 {
        f.write_str(", ")?;
      }
      write!(f, "{c}")?;
    }
    f.write_str(")")
  }
}

#[cfg(test)]
#[path = "coordinate_test.rs"]
mod coordinate_test;
