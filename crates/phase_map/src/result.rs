//! PhaseMap - the externally visible result of a run.
//!
//! Holds the user limits, every evaluated point and the current box frontier.
//! The point table is the same instance the evaluation cache reads from, so a
//! checkpoint of a running map always contains every finished evaluation.

use std::collections::HashMap;

use num_rational::Rational64;
use num_traits::CheckedDiv;
use smallvec::SmallVec;

use crate::coordinate::Coordinate;
use crate::error::ConfigError;
use crate::limits::Limits;
use crate::partition::{BoxGraph, Phase, PhaseBox, PointTable};

/// Adaptive partition of a domain into boxes of constant (or undefined)
/// phase.
#[derive(Clone, Debug)]
pub struct PhaseMap<L> {
  limits: Limits,
  points: PointTable<L>,
  boxes: BoxGraph<L>,
}

impl<L> PhaseMap<L> {
  /// User limits of the mapped domain.
  pub fn limits(&self) -> &Limits {
    &self.limits
  }

  /// Every evaluated point.
  pub fn points(&self) -> &PointTable<L> {
    &self.points
  }

  /// The live box frontier with its neighbor graph.
  pub fn boxes(&self) -> &BoxGraph<L> {
    &self.boxes
  }

  /// Number of dimensions.
  #[inline]
  pub fn dim(&self) -> usize {
    self.limits.dim()
  }

  /// Number of live boxes.
  #[inline]
  pub fn num_boxes(&self) -> usize {
    self.boxes.len()
  }

  /// Number of evaluated points.
  #[inline]
  pub fn num_points(&self) -> usize {
    self.points.len()
  }

  /// Number of boxes whose points disagree.
  pub fn num_undefined(&self) -> usize {
    self.boxes.iter().filter(|(_, b)| b.phase().is_undefined()).count()
  }

  /// Label at an evaluated coordinate.
  pub fn label_at(&self, coordinate: &Coordinate) -> Option<&L> {
    self.points.label(coordinate)
  }

  /// Mutable access to the graph and the point table together.
  pub(crate) fn parts_mut(&mut self) -> (&mut BoxGraph<L>, &mut PointTable<L>) {
    (&mut self.boxes, &mut self.points)
  }

  /// Mutable access to the point table.
  pub(crate) fn points_mut(&mut self) -> &mut PointTable<L> {
    &mut self.points
  }

  /// Uniform grid of `∏(mesh[i] - 1)` empty boxes, all adjacent pairs
  /// linked.
  pub(crate) fn with_grid(limits: Limits, mesh: &[usize]) -> Self {
    let _span = tracing::info_span!("build_grid").entered();
    let size = Coordinate::cell_size(mesh);
    let cells: SmallVec<[i64; 4]> = mesh.iter().map(|&m| m as i64 - 1).collect();
    let mut boxes = BoxGraph::new();
    let mut keys = Vec::new();

    // Odometer over all cell indices, axis 0 fastest.
    let mut index: SmallVec<[i64; 4]> = SmallVec::from_elem(0, mesh.len());
    'cells: loop {
      let corner = Coordinate::grid_point(&index, mesh);
      keys.push(boxes.insert(PhaseBox::new(corner, size.clone())));
      for axis in 0..index.len() {
        index[axis] += 1;
        if index[axis] < cells[axis] {
          continue 'cells;
        }
        index[axis] = 0;
      }
      break;
    }

    boxes.link_all_pairs(&keys);
    tracing::debug!(boxes = keys.len(), "built initial grid");
    Self {
      limits,
      points: PointTable::new(),
      boxes,
    }
  }

  /// Check that this map can seed a run over `limits` whose initial boxes
  /// have size `max_size`.
  ///
  /// Limits must agree within a relative tolerance, every box size must be
  /// `max_size / 2^k` with the same `k` on every axis, and every corner must
  /// be a whole multiple of its box size.
  pub(crate) fn check_resumable(&self, limits: &Limits, max_size: &Coordinate) -> Result<(), ConfigError> {
    if !self.limits.approx_eq(limits) {
      return Err(ConfigError::LimitsMismatch {
        expected: limits.as_slice().to_vec(),
        found: self.limits.as_slice().to_vec(),
      });
    }
    for (_, b) in self.boxes.iter() {
      let mut depth = None;
      for ((max, size), corner) in max_size.iter().zip(b.size().iter()).zip(b.corner().iter()) {
        let level = max.checked_div(size).and_then(halvings).ok_or_else(|| {
          ConfigError::IncompatibleResult(format!("box size {} is not the initial size {max_size} halved", b.size()))
        })?;
        if !corner.checked_div(size).is_some_and(|cells| cells.is_integer()) {
          return Err(ConfigError::IncompatibleResult(format!(
            "box at {} is not aligned to its size {}",
            b.corner(),
            b.size()
          )));
        }
        match depth {
          None => depth = Some(level),
          Some(d) if d == level => {}
          Some(_) => {
            return Err(ConfigError::IncompatibleResult(format!(
              "box size {} is halved unevenly across axes",
              b.size()
            )))
          }
        }
      }
    }
    Ok(())
  }
}

/// `k` if `ratio == 2^k`.
fn halvings(ratio: Rational64) -> Option<u32> {
  if !ratio.is_integer() || *ratio.numer() <= 0 {
    return None;
  }
  let n = *ratio.numer() as u64;
  n.is_power_of_two().then(|| n.trailing_zeros())
}

impl<L: PartialEq + Clone + std::fmt::Debug> PhaseMap<L> {
  /// Rebuild a map from stored points and boxes.
  ///
  /// Membership is recomputed by geometric containment and each box phase is
  /// re-derived from its points; a stored phase that disagrees is logged and
  /// replaced. The neighbor graph is rebuilt with a sweep along axis 0.
  pub(crate) fn from_parts(
    limits: Limits,
    points: Vec<(Coordinate, L)>,
    boxes: Vec<(Coordinate, Coordinate, Phase<L>)>,
  ) -> Self {
    let _span = tracing::info_span!("restore_map").entered();
    let mut table = PointTable::new();
    let mut sorted = Vec::with_capacity(points.len());
    for (coordinate, label) in points {
      if table.insert(coordinate.clone(), label) {
        sorted.push(coordinate);
      }
    }
    sorted.sort_unstable();

    let mut graph = BoxGraph::new();
    let mut keys = Vec::with_capacity(boxes.len());
    for (corner, size, stored) in boxes {
      let low = corner[0];
      let high = corner[0] + size[0];
      let key = graph.insert(PhaseBox::new(corner, size));
      let start = sorted.partition_point(|c| c[0] < low);
      for coordinate in sorted[start..].iter().take_while(|c| c[0] <= high) {
        graph.add_point(&mut table, key, coordinate);
      }
      if let Some(restored) = graph.get(key) {
        if restored.phase() != &stored {
          tracing::warn!(
            corner = %restored.corner(),
            stored = ?stored,
            derived = ?restored.phase(),
            "stored phase disagrees with points, using derived phase"
          );
        }
      }
      keys.push(key);
    }
    graph.link_by_sweep(&keys);

    Self {
      limits,
      points: table,
      boxes: graph,
    }
  }
}

impl<L: PartialEq> PartialEq for PhaseMap<L> {
  /// Order-independent equality of limits, point labels and the set of
  /// `(corner, size, phase)` boxes.
  fn eq(&self, other: &Self) -> bool {
    if self.limits != other.limits
      || self.points.len() != other.points.len()
      || self.boxes.len() != other.boxes.len()
    {
      return false;
    }
    let labels_match = self
      .points
      .labels()
      .all(|(coordinate, label)| other.points.label(coordinate) == Some(label));
    if !labels_match {
      return false;
    }
    let frontier: HashMap<(&Coordinate, &Coordinate), &Phase<L>> = other
      .boxes
      .iter()
      .map(|(_, b)| ((b.corner(), b.size()), b.phase()))
      .collect();
    self
      .boxes
      .iter()
      .all(|(_, b)| frontier.get(&(b.corner(), b.size())) == Some(&b.phase()))
  }
}

#[cfg(test)]
#[path = "result_test.rs"]
mod result_test;
