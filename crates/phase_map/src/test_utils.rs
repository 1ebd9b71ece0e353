//! Test utilities shared by the unit tests.
//!
//! Provides reference phase functions, a call-counting wrapper and checks of
//! the structural invariants of a [`PhaseMap`].

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use crate::coordinate::Coordinate;
use crate::error::BoxError;
use crate::partition::Phase;
use crate::result::PhaseMap;
use crate::Label;

// =============================================================================
// Phase functions
// =============================================================================

/// 1 inside or on the unit circle, 0 outside.
pub fn circle(p: &[f64]) -> i32 {
  i32::from(p[0] * p[0] + p[1] * p[1] <= 1.0)
}

/// 1 right of `x = 0.5` or below `y = 0.2`, 0 elsewhere.
pub fn line(p: &[f64]) -> i32 {
  if p[0] > 0.5 || p[1] < 0.2 {
    1
  } else {
    0
  }
}

/// 2 inside the unit circle plus [`line`]: four regions meeting at curved
/// and straight boundaries.
pub fn phase1(p: &[f64]) -> i32 {
  let disk = if p[0] * p[0] + p[1] * p[1] < 1.0 { 2 } else { 0 };
  disk + line(p)
}

/// Piecewise phases with thin strips and a small disk.
pub fn phase2(p: &[f64]) -> i32 {
  strips(p, 0.3, 2)
}

/// Like [`phase2`] with a wider strip and a negative label.
pub fn phase3(p: &[f64]) -> i32 {
  strips(p, 0.398, -2)
}

fn strips(p: &[f64], strip_end: f64, top_label: i32) -> i32 {
  let (x, y) = (p[0], p[1]);
  if (0.0..strip_end).contains(&x) && 0.4 < y && y < 0.6 {
    1
  } else if 0.4 < x && x < 0.6 && (0.0..0.6).contains(&y) {
    1
  } else if 0.4 < x && x < 0.6 && y >= 0.6 {
    top_label
  } else if (0.0..0.1).contains(&x) && (0.0..0.1).contains(&y) {
    1
  } else if (x - 0.5).powi(2) + (y - 0.5).powi(2) < 0.1 {
    3
  } else {
    0
  }
}

/// 1 inside the unit sphere, 0 outside.
pub fn sphere(p: &[f64]) -> i32 {
  i32::from(p.iter().map(|x| x * x).sum::<f64>() < 1.0)
}

// =============================================================================
// Call counting
// =============================================================================

/// Wraps a phase function and records how often each position was evaluated.
#[derive(Clone, Default)]
pub struct CallCounter {
  calls: Arc<Mutex<HashMap<Vec<u64>, usize>>>,
  total: Arc<AtomicUsize>,
}

impl CallCounter {
  pub fn new() -> Self {
    Self::default()
  }

  /// Counting phase function delegating to `f`.
  pub fn wrap<L, F>(&self, f: F) -> impl Fn(&[f64]) -> Result<L, BoxError> + Send + Sync + 'static
  where
    F: Fn(&[f64]) -> L + Send + Sync + 'static,
  {
    let counter = self.clone();
    move |p: &[f64]| {
      counter.total.fetch_add(1, Ordering::SeqCst);
      let key = p.iter().map(|x| x.to_bits()).collect();
      *counter.calls.lock().unwrap().entry(key).or_insert(0) += 1;
      Ok(f(p))
    }
  }

  /// Total number of calls.
  pub fn total(&self) -> usize {
    self.total.load(Ordering::SeqCst)
  }

  /// Largest number of calls for a single position.
  pub fn max_per_position(&self) -> usize {
    self.calls.lock().unwrap().values().copied().max().unwrap_or(0)
  }
}

/// Phase function that fails for every input.
pub fn always_fails(_: &[f64]) -> Result<i32, BoxError> {
  Err("phase function unavailable".into())
}

// =============================================================================
// Invariants
// =============================================================================

/// Check neighbor symmetry, phase aggregation and minimum size.
pub fn assert_invariants<L: Label>(map: &PhaseMap<L>, min_size: &Coordinate) {
  assert!(map.boxes().is_symmetric(), "neighbor relation must be symmetric");

  for (key, phase_box) in map.boxes().iter() {
    let mut expected = Phase::Unset;
    for coordinate in phase_box.points() {
      let label = map
        .points()
        .label(coordinate)
        .unwrap_or_else(|| panic!("box point {coordinate} missing from point table"));
      expected.absorb(label);
      assert!(phase_box.contains(coordinate), "member {coordinate} outside its box");
      assert!(
        map.points().get(coordinate).unwrap().boxes().contains(&key),
        "point {coordinate} lacks back-reference"
      );
    }
    assert_eq!(
      phase_box.phase(),
      &expected,
      "phase of box at {} does not match its points",
      phase_box.corner()
    );
    assert!(
      min_size.all_le(phase_box.size()),
      "box at {} with size {} is below the minimum size {min_size}",
      phase_box.corner(),
      phase_box.size()
    );
  }
}

/// Unique path in the system temp directory.
pub fn temp_path(name: &str) -> PathBuf {
  static NEXT: AtomicUsize = AtomicUsize::new(0);
  let n = NEXT.fetch_add(1, Ordering::SeqCst);
  std::env::temp_dir().join(format!("phase_map_{}_{name}_{n}.json", std::process::id()))
}
