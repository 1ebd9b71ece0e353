//! PhaseBox - one axis-aligned hyperrectangle of the partition.

use std::collections::HashSet;

use smallvec::SmallVec;

use super::{BoxKey, Phase};
use crate::coordinate::Coordinate;

/// Outcome of [`PhaseBox::add_point`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AddPoint {
  /// The point lies outside the box; nothing changed.
  Outside,
  /// The point was already a member; nothing changed.
  Duplicate,
  /// The point was added and the phase stayed consistent (or was already
  /// undefined).
  Inserted,
  /// The point was added and its label turned the box undefined.
  BecameUndefined,
}

/// Axis-aligned hyperrectangle in the unit cube.
///
/// Boundaries are closed: a point on a shared face belongs to every box that
/// touches it.
#[derive(Clone, Debug)]
pub struct PhaseBox<L> {
  corner: Coordinate,
  size: Coordinate,
  phase: Phase<L>,
  points: HashSet<Coordinate>,
  pub(super) neighbors: HashSet<BoxKey>,
}

impl<L> PhaseBox<L> {
  /// Create an empty box with the given lowest corner and extent.
  pub fn new(corner: Coordinate, size: Coordinate) -> Self {
    debug_assert_eq!(corner.dim(), size.dim(), "corner and size dimension differ");
    Self {
      corner,
      size,
      phase: Phase::Unset,
      points: HashSet::new(),
      neighbors: HashSet::new(),
    }
  }

  /// Lowest corner.
  #[inline]
  pub fn corner(&self) -> &Coordinate {
    &self.corner
  }

  /// Per-axis extent.
  #[inline]
  pub fn size(&self) -> &Coordinate {
    &self.size
  }

  /// Highest corner, `corner + size`.
  pub fn upper(&self) -> Coordinate {
    &self.corner + &self.size
  }

  /// Aggregate phase of the member points.
  #[inline]
  pub fn phase(&self) -> &Phase<L> {
    &self.phase
  }

  /// Member points.
  pub fn points(&self) -> &HashSet<Coordinate> {
    &self.points
  }

  /// Keys of the neighboring boxes.
  pub fn neighbors(&self) -> &HashSet<BoxKey> {
    &self.neighbors
  }

  /// Number of dimensions.
  #[inline]
  pub fn dim(&self) -> usize {
    self.corner.dim()
  }

  /// True if `coordinate` lies in `[corner, corner + size]` on every axis.
  pub fn contains(&self, coordinate: &Coordinate) -> bool {
    // Cheap lower-bound test first; the upper bound needs an addition.
    self.corner.all_le(coordinate)
      && coordinate
        .iter()
        .zip(self.corner.iter().zip(self.size.iter()))
        .all(|(x, (c, s))| *x <= c + s)
  }

  /// True if the closed boxes overlap or touch on every axis.
  ///
  /// Purely geometric; [`BoxGraph`](super::BoxGraph) excludes the box itself.
  pub fn touches(&self, other: &PhaseBox<L>) -> bool {
    self
      .corner
      .iter()
      .zip(self.size.iter())
      .zip(other.corner.iter().zip(other.size.iter()))
      .all(|((c1, s1), (c2, s2))| c1 + s1 >= *c2 && c2 + s2 >= *c1)
  }

  /// True if some axis is longer than `min_size`.
  pub fn exceeds(&self, min_size: &Coordinate) -> bool {
    self.size.any_gt(min_size)
  }

  /// Geometry of the `2^dim` children: halved size, corners at every
  /// combination of `{0, size/2}` offsets.
  ///
  /// Child index bits select the upper half per axis (bit `i` = axis `i`).
  pub fn child_geometry(&self) -> (SmallVec<[Coordinate; 8]>, Coordinate) {
    let half = self.size.halved();
    let dim = self.dim();
    let corners = (0..1usize << dim)
      .map(|child| {
        let steps: SmallVec<[u8; 4]> = (0..dim).map(|axis| ((child >> axis) & 1) as u8).collect();
        self.corner.offset_by_halves(&self.size, &steps)
      })
      .collect();
    (corners, half)
  }
}

impl<L: PartialEq + Clone> PhaseBox<L> {
  /// Add an evaluated point to the box.
  ///
  /// No-op if the point lies outside or is already a member. The first
  /// point sets the phase; a conflicting label turns it undefined, which is
  /// reported as [`AddPoint::BecameUndefined`] so the caller can schedule a
  /// split.
  pub fn add_point(&mut self, coordinate: &Coordinate, label: &L) -> AddPoint {
    if !self.contains(coordinate) {
      return AddPoint::Outside;
    }
    if !self.points.insert(coordinate.clone()) {
      return AddPoint::Duplicate;
    }
    if self.phase.absorb(label) {
      AddPoint::BecameUndefined
    } else {
      AddPoint::Inserted
    }
  }
}

#[cfg(test)]
#[path = "phase_box_test.rs"]
mod phase_box_test;
