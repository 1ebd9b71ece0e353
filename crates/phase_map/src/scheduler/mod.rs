//! Scheduler - drives box splitting to convergence.
//!
//! # Flow
//!
//! ```text
//! Driver thread                              rayon workers
//! ┌──────────────────────┐
//! │ schedule(box)        │──request stencil──► phase function
//! │  SplitTask{missing}  │                         │
//! └──────────┬───────────┘                         │
//!            │                                     │ crossbeam channel
//!            ▼                                     ▼
//! ┌──────────────────────┐   Completion    ┌──────────────┐
//! │ drive()              │◄────────────────│ cache.wait() │
//! │  missing -= 1        │                 └──────────────┘
//! │  missing == 0 → split│
//! │  checkpoint if due   │
//! └──────────────────────┘
//! ```
//!
//! A split task is a countdown of stencil labels still being evaluated.
//! When it reaches zero the box is split in one uninterrupted step on the
//! driver thread: children are created, the parent's points and the stencil
//! are pushed into the children and the parent's old neighbors, boxes that
//! turned undefined are scheduled, the neighbor graph is rewired and the
//! parent is removed. Workers never touch the graph, so no locking is needed.

pub mod stencil;

use std::collections::{HashMap, VecDeque};
use std::sync::Arc;

use num_rational::Rational64;
use smallvec::SmallVec;
use web_time::Instant;

use crate::cache::{Completion, EvaluationCache, Lookup, PhaseFunction, Wait};
use crate::checkpoint::Checkpointer;
use crate::coordinate::Coordinate;
use crate::error::{PersistError, RunError};
use crate::partition::{AddPoint, BoxKey, PhaseBox};
use crate::result::PhaseMap;
use crate::stats::RunStats;
use crate::Label;

pub use stencil::{stencil, Stencil};

/// Pending split of one box.
#[derive(Debug)]
struct SplitTask {
  /// Coordinates evaluated before the split.
  stencil: Stencil,
  /// Stencil labels not yet known.
  missing: usize,
}

/// Split size limits derived from the initial mesh.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SplitLimits {
  /// Size of the initial grid cells.
  pub max_size: Coordinate,
  /// Smallest size a box may be split down to.
  pub min_size: Coordinate,
}

impl SplitLimits {
  /// `min_size = max_size / 2^num_steps`.
  pub fn new(max_size: Coordinate, num_steps: u32) -> Self {
    let min_size = max_size.scaled(Rational64::new(1, 1i64 << num_steps));
    Self { max_size, min_size }
  }
}

/// Single-writer driver of the split tasks over one [`PhaseMap`].
pub struct Scheduler<L> {
  map: PhaseMap<L>,
  cache: EvaluationCache<L, BoxKey>,
  limits: SplitLimits,
  all_corners: bool,
  tasks: HashMap<BoxKey, SplitTask>,
  ready: VecDeque<BoxKey>,
  checkpoint: Option<Checkpointer>,
  stats: RunStats,
}

impl<L: Label> Scheduler<L> {
  /// Create a scheduler over `map`. Nothing is scheduled yet.
  pub fn new(map: PhaseMap<L>, func: Arc<dyn PhaseFunction<L>>, limits: SplitLimits, all_corners: bool) -> Self {
    let cache = EvaluationCache::from_arc(func, map.limits().clone());
    Self {
      map,
      cache,
      limits,
      all_corners,
      tasks: HashMap::new(),
      ready: VecDeque::new(),
      checkpoint: None,
      stats: RunStats::default(),
    }
  }

  /// Periodically save the map while driving.
  pub fn with_checkpoint(mut self, checkpoint: Checkpointer) -> Self {
    self.checkpoint = Some(checkpoint);
    self
  }

  /// The map in its current state.
  pub fn map(&self) -> &PhaseMap<L> {
    &self.map
  }

  /// Number of split tasks not yet applied.
  pub fn pending(&self) -> usize {
    self.tasks.len()
  }

  /// Schedule every box whose phase is unset or undefined.
  pub fn schedule_pending(&mut self) {
    let keys: Vec<BoxKey> = self
      .map
      .boxes()
      .iter()
      .filter(|(_, b)| b.phase().is_unset() || b.phase().is_undefined())
      .map(|(key, _)| key)
      .collect();
    for key in keys {
      self.schedule(key);
    }
  }

  /// Run until no split task is pending.
  ///
  /// Returns the first evaluation or checkpoint error. Evaluations still in
  /// flight at that point are abandoned.
  #[tracing::instrument(skip_all, name = "scheduler::drive")]
  pub fn drive(&mut self) -> Result<(), RunError> {
    let started = Instant::now();
    let outcome = self.drive_inner();
    self.stats.elapsed_us += started.elapsed().as_micros() as u64;
    self.stats.record_cache(self.cache.stats());
    outcome
  }

  fn drive_inner(&mut self) -> Result<(), RunError> {
    loop {
      while let Some(key) = self.ready.pop_front() {
        self.split(key);
      }
      if self.tasks.is_empty() {
        return Ok(());
      }
      if let Some(checkpoint) = self.checkpoint.as_mut() {
        if checkpoint.flush_if_due(&self.map)? {
          self.stats.checkpoints += 1;
        }
      }

      let deadline = self.checkpoint.as_ref().and_then(Checkpointer::deadline);
      match self.cache.wait(self.map.points_mut(), deadline) {
        Wait::Completed(Completion::Evaluated { waiters, .. }) => {
          self.mark_dirty();
          for waiter in waiters {
            self.resolve(waiter);
          }
        }
        Wait::Completed(Completion::Failed { error, .. }) => {
          tracing::debug!(position = ?error.position(), "evaluation failed, aborting");
          return Err(error.into());
        }
        Wait::TimedOut => {}
        Wait::Idle => {
          return Err(RunError::Stalled {
            pending: self.tasks.len(),
          })
        }
      }
    }
  }

  /// Write a last checkpoint if anything changed since the previous one.
  pub fn flush_checkpoint(&mut self) -> Result<bool, PersistError> {
    let Some(checkpoint) = self.checkpoint.as_mut() else {
      return Ok(false);
    };
    let written = checkpoint.flush(&self.map)?;
    if written {
      self.stats.checkpoints += 1;
    }
    Ok(written)
  }

  /// Hand out the map and the run statistics.
  pub fn finish(mut self) -> (PhaseMap<L>, RunStats) {
    self.stats.record_cache(self.cache.stats());
    (self.map, self.stats)
  }

  /// Create a split task for `key` unless it already has one, it is at the
  /// minimum size, or its phase is a settled value.
  fn schedule(&mut self, key: BoxKey) {
    if self.tasks.contains_key(&key) {
      return;
    }
    let Some(phase_box) = self.map.boxes().get(key) else {
      return;
    };
    if phase_box.phase().value().is_some() || !phase_box.exceeds(&self.limits.min_size) {
      return;
    }

    let stencil = stencil(phase_box, self.all_corners);
    let mut missing = 0;
    for coordinate in &stencil {
      if let Lookup::Pending = self.cache.request(self.map.points(), coordinate, key) {
        missing += 1;
      }
    }
    self.stats.tasks_scheduled += 1;
    self.tasks.insert(key, SplitTask { stencil, missing });
    if missing == 0 {
      self.ready.push_back(key);
    }
  }

  /// Count down a task after one of its stencil labels arrived.
  fn resolve(&mut self, key: BoxKey) {
    let Some(task) = self.tasks.get_mut(&key) else {
      return;
    };
    if task.missing > 0 {
      task.missing -= 1;
      if task.missing == 0 {
        self.ready.push_back(key);
      }
    }
  }

  /// Replace a box by its `2^dim` children.
  fn split(&mut self, key: BoxKey) {
    let Some(task) = self.tasks.remove(&key) else {
      return;
    };
    let (boxes, points) = self.map.parts_mut();
    let Some(parent) = boxes.get(key) else {
      return;
    };

    let (corners, size) = parent.child_geometry();
    let old_neighbors: Vec<BoxKey> = parent.neighbors().iter().copied().collect();
    let mut inherited: Vec<Coordinate> = parent.points().iter().cloned().collect();
    inherited.extend(task.stencil);
    let parent_corner = parent.corner().clone();

    let children: SmallVec<[BoxKey; 8]> = corners
      .into_iter()
      .map(|corner| boxes.insert(PhaseBox::new(corner, size.clone())))
      .collect();

    let mut undefined: SmallVec<[BoxKey; 8]> = SmallVec::new();
    for &target in children.iter().chain(&old_neighbors) {
      for coordinate in &inherited {
        if boxes.add_point(points, target, coordinate) == AddPoint::BecameUndefined {
          undefined.push(target);
        }
      }
    }

    for &child in &children {
      for &neighbor in &old_neighbors {
        boxes.process_possible_neighbour(child, neighbor);
      }
    }
    boxes.link_all_pairs(&children);
    boxes.remove(key, points);

    for target in undefined {
      self.schedule(target);
    }
    self.stats.splits += 1;
    self.mark_dirty();
    tracing::debug!(
      corner = %parent_corner,
      neighbors = old_neighbors.len(),
      pending = self.tasks.len(),
      "split box"
    );
  }

  fn mark_dirty(&mut self) {
    if let Some(checkpoint) = self.checkpoint.as_mut() {
      checkpoint.mark_dirty();
    }
  }
}
