//! BoxGraph - arena of live boxes and their symmetric neighbor relation.
//!
//! Every edge is inserted on both endpoints and every removal unlinks the box
//! from all of its neighbors before it leaves the arena, so
//! `a ∈ b.neighbors ⇔ b ∈ a.neighbors` holds between any two operations.

use slotmap::{new_key_type, SlotMap};

use super::{AddPoint, PhaseBox, PointTable};
use crate::coordinate::Coordinate;

new_key_type! {
  /// Stable key of a box in the [`BoxGraph`] arena.
  ///
  /// Generational: a key of a removed box never aliases a later box.
  pub struct BoxKey;
}

/// Arena of live boxes.
#[derive(Clone, Debug)]
pub struct BoxGraph<L> {
  boxes: SlotMap<BoxKey, PhaseBox<L>>,
}

impl<L> Default for BoxGraph<L> {
  fn default() -> Self {
    Self::new()
  }
}

impl<L> BoxGraph<L> {
  /// Create an empty graph.
  pub fn new() -> Self {
    Self {
      boxes: SlotMap::with_key(),
    }
  }

  /// Number of live boxes.
  pub fn len(&self) -> usize {
    self.boxes.len()
  }

  /// Check if empty.
  pub fn is_empty(&self) -> bool {
    self.boxes.is_empty()
  }

  /// Check if a key refers to a live box.
  pub fn contains(&self, key: BoxKey) -> bool {
    self.boxes.contains_key(key)
  }

  /// Box by key.
  pub fn get(&self, key: BoxKey) -> Option<&PhaseBox<L>> {
    self.boxes.get(key)
  }

  /// Iterate over live boxes with their keys.
  pub fn iter(&self) -> impl Iterator<Item = (BoxKey, &PhaseBox<L>)> {
    self.boxes.iter()
  }

  /// Keys of all live boxes.
  pub fn keys(&self) -> impl Iterator<Item = BoxKey> + '_ {
    self.boxes.keys()
  }

  /// Insert a box without any edges.
  pub fn insert(&mut self, phase_box: PhaseBox<L>) -> BoxKey {
    self.boxes.insert(phase_box)
  }

  /// True if `a` and `b` are distinct live boxes that overlap or touch.
  pub fn is_neighbor(&self, a: BoxKey, b: BoxKey) -> bool {
    if a == b {
      return false;
    }
    match (self.boxes.get(a), self.boxes.get(b)) {
      (Some(box_a), Some(box_b)) => box_a.touches(box_b),
      _ => false,
    }
  }

  /// Link `a` and `b` if they are neighbors. Returns whether they are.
  pub fn process_possible_neighbour(&mut self, a: BoxKey, b: BoxKey) -> bool {
    if self.is_neighbor(a, b) {
      self.link(a, b);
      true
    } else {
      false
    }
  }

  /// Insert the symmetric edge `a ↔ b` for boxes known to be adjacent.
  pub fn link(&mut self, a: BoxKey, b: BoxKey) {
    if a == b || !self.boxes.contains_key(a) || !self.boxes.contains_key(b) {
      return;
    }
    self.boxes[a].neighbors.insert(b);
    self.boxes[b].neighbors.insert(a);
  }

  /// Run [`Self::process_possible_neighbour`] on every unordered pair.
  ///
  /// Quadratic; only meant for the coarse initial grid.
  pub fn link_all_pairs(&mut self, keys: &[BoxKey]) {
    for (i, &a) in keys.iter().enumerate() {
      for &b in &keys[i + 1..] {
        self.process_possible_neighbour(a, b);
      }
    }
  }

  /// Link every adjacent pair among `keys` using a sort-and-sweep on axis 0.
  ///
  /// Same edges as [`Self::link_all_pairs`], but only pairs whose axis-0
  /// intervals touch are tested, which keeps restored fine partitions cheap.
  pub fn link_by_sweep(&mut self, keys: &[BoxKey]) {
    let mut sorted: Vec<(BoxKey, Coordinate)> = keys
      .iter()
      .filter_map(|&key| self.boxes.get(key).map(|b| (key, b.corner().clone())))
      .collect();
    if sorted.first().map_or(true, |(_, c)| c.dim() == 0) {
      return;
    }
    sorted.sort_unstable_by(|a, b| a.1[0].cmp(&b.1[0]));

    for i in 0..sorted.len() {
      let key = sorted[i].0;
      let end = match self.boxes.get(key) {
        Some(b) => b.corner()[0] + b.size()[0],
        None => continue,
      };
      for (other, corner) in &sorted[i + 1..] {
        if corner[0] > end {
          break;
        }
        self.process_possible_neighbour(key, *other);
      }
    }
  }

  /// Remove a box: unlink it from every neighbor and drop its point
  /// back-references, then take it out of the arena.
  pub fn remove(&mut self, key: BoxKey, points: &mut PointTable<L>) -> Option<PhaseBox<L>> {
    self.delete_from_neighbours(key);
    let removed = self.boxes.remove(key)?;
    for coordinate in removed.points() {
      points.detach(coordinate, key);
    }
    Some(removed)
  }

  /// Remove `key` from the neighbor set of each of its neighbors.
  ///
  /// Must run before the key becomes unreachable, or stale edges remain.
  fn delete_from_neighbours(&mut self, key: BoxKey) {
    let neighbors = match self.boxes.get_mut(key) {
      Some(b) => std::mem::take(&mut b.neighbors),
      None => return,
    };
    for neighbor in neighbors {
      if let Some(b) = self.boxes.get_mut(neighbor) {
        b.neighbors.remove(&key);
      }
    }
  }

  /// Check the symmetry of the neighbor relation.
  pub fn is_symmetric(&self) -> bool {
    self.boxes.iter().all(|(key, b)| {
      b.neighbors().iter().all(|&n| {
        self
          .boxes
          .get(n)
          .map_or(false, |other| other.neighbors().contains(&key))
      })
    })
  }
}

impl<L: PartialEq + Clone> BoxGraph<L> {
  /// Add an already evaluated point to a box and record the back-reference.
  ///
  /// Returns [`AddPoint::Outside`] for unknown keys or coordinates missing
  /// from `points`.
  pub fn add_point(
    &mut self,
    points: &mut PointTable<L>,
    key: BoxKey,
    coordinate: &Coordinate,
  ) -> AddPoint {
    let (Some(phase_box), Some(label)) = (self.boxes.get_mut(key), points.label(coordinate)) else {
      return AddPoint::Outside;
    };
    let outcome = phase_box.add_point(coordinate, label);
    if matches!(outcome, AddPoint::Inserted | AddPoint::BecameUndefined) {
      points.attach(coordinate, key);
    }
    outcome
  }
}

#[cfg(test)]
#[path = "graph_test.rs"]
mod graph_test;
