//! Point table - evaluated labels keyed by coordinate.
//!
//! The same table backs the evaluation cache (label lookups) and the result
//! (box back-references), so growth is visible to both without copying.

use std::collections::hash_map::{self, HashMap};
use std::collections::HashSet;

use super::BoxKey;
use crate::coordinate::Coordinate;

/// Evaluated label at one coordinate.
#[derive(Clone, Debug)]
pub struct Point<L> {
  label: L,
  boxes: HashSet<BoxKey>,
}

impl<L> Point<L> {
  /// Label returned by the phase function.
  #[inline]
  pub fn label(&self) -> &L {
    &self.label
  }

  /// Live boxes that currently contain this point.
  pub fn boxes(&self) -> &HashSet<BoxKey> {
    &self.boxes
  }
}

/// All points evaluated so far (or preloaded from a prior result).
#[derive(Clone, Debug)]
pub struct PointTable<L> {
  points: HashMap<Coordinate, Point<L>>,
}

impl<L> Default for PointTable<L> {
  fn default() -> Self {
    Self::new()
  }
}

impl<L> PointTable<L> {
  /// Create an empty table.
  pub fn new() -> Self {
    Self {
      points: HashMap::new(),
    }
  }

  /// Number of points.
  pub fn len(&self) -> usize {
    self.points.len()
  }

  /// Check if empty.
  pub fn is_empty(&self) -> bool {
    self.points.is_empty()
  }

  /// Check if a coordinate has been evaluated.
  pub fn contains(&self, coordinate: &Coordinate) -> bool {
    self.points.contains_key(coordinate)
  }

  /// Point at a coordinate.
  pub fn get(&self, coordinate: &Coordinate) -> Option<&Point<L>> {
    self.points.get(coordinate)
  }

  /// Label at a coordinate.
  pub fn label(&self, coordinate: &Coordinate) -> Option<&L> {
    self.points.get(coordinate).map(|p| &p.label)
  }

  /// Record a label. An existing point keeps its label and back-references.
  ///
  /// Returns `true` if the point is new.
  pub fn insert(&mut self, coordinate: Coordinate, label: L) -> bool {
    match self.points.entry(coordinate) {
      hash_map::Entry::Occupied(_) => false,
      hash_map::Entry::Vacant(entry) => {
        entry.insert(Point {
          label,
          boxes: HashSet::new(),
        });
        true
      }
    }
  }

  /// Iterate over `(coordinate, point)` pairs in arbitrary order.
  pub fn iter(&self) -> hash_map::Iter<'_, Coordinate, Point<L>> {
    self.points.iter()
  }

  /// Iterate over `(coordinate, label)` pairs in arbitrary order.
  pub fn labels(&self) -> impl Iterator<Item = (&Coordinate, &L)> {
    self.points.iter().map(|(c, p)| (c, &p.label))
  }

  /// Coordinates sorted lexicographically.
  pub fn sorted_coordinates(&self) -> Vec<&Coordinate> {
    let mut coords: Vec<_> = self.points.keys().collect();
    coords.sort_unstable();
    coords
  }

  pub(crate) fn attach(&mut self, coordinate: &Coordinate, key: BoxKey) {
    if let Some(point) = self.points.get_mut(coordinate) {
      point.boxes.insert(key);
    }
  }

  pub(crate) fn detach(&mut self, coordinate: &Coordinate, key: BoxKey) {
    if let Some(point) = self.points.get_mut(coordinate) {
      point.boxes.remove(&key);
    }
  }
}
