//! Evaluation cache - deduplicating front end of the user phase function.
//!
//! Request → (rayon worker) → Completion
//!
//! ```text
//! request(coord, waiter)
//!   ├─ label in point table ─────────────► Lookup::Ready(label)
//!   ├─ evaluation already in flight ─────► attach waiter, Lookup::Pending
//!   └─ otherwise ─► rayon::spawn(func) ──► attach waiter, Lookup::Pending
//!                          │
//!                          ▼ crossbeam channel
//! wait(points, deadline) ──► Completion { coordinate, label | error, waiters }
//! ```
//!
//! The user function runs at most once per distinct coordinate: a second
//! request for a coordinate that is still being evaluated joins the first
//! call instead of spawning another. Failures are handed to the waiters but
//! never stored, so a later request evaluates again.

use std::collections::HashMap;
use std::convert::Infallible;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

use crossbeam_channel::{self as channel, Receiver, RecvTimeoutError, Sender};
use smallvec::SmallVec;
use web_time::Instant;

use crate::coordinate::Coordinate;
use crate::error::{BoxError, EvaluationError};
use crate::limits::Limits;
use crate::partition::PointTable;

/// User phase function: maps a position in user limits to a label.
///
/// Implemented for every `Fn(&[f64]) -> Result<L, E>` closure whose error
/// converts into [`BoxError`]. The function runs on rayon worker threads and
/// may block.
pub trait PhaseFunction<L>: Send + Sync + 'static {
  /// Evaluate the label at `position`.
  fn phase(&self, position: &[f64]) -> Result<L, BoxError>;
}

impl<L, E, F> PhaseFunction<L> for F
where
  F: Fn(&[f64]) -> Result<L, E> + Send + Sync + 'static,
  E: Into<BoxError>,
{
  fn phase(&self, position: &[f64]) -> Result<L, BoxError> {
    self(position).map_err(Into::into)
  }
}

/// Adapt an infallible `Fn(&[f64]) -> L` into a phase function.
pub fn infallible<L, F>(func: F) -> impl Fn(&[f64]) -> Result<L, Infallible> + Send + Sync + 'static
where
  F: Fn(&[f64]) -> L + Send + Sync + 'static,
{
  move |position: &[f64]| Ok(func(position))
}

/// Result of [`EvaluationCache::request`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Lookup<L> {
  /// Label already known.
  Ready(L),
  /// Evaluation in flight; the waiter will appear in its completion.
  Pending,
}

/// A finished evaluation, with every waiter that requested it.
#[derive(Debug)]
pub enum Completion<L, W> {
  /// Evaluated successfully; the label is now in the point table.
  Evaluated {
    /// Evaluated coordinate.
    coordinate: Coordinate,
    /// Label returned by the phase function.
    label: L,
    /// Waiters attached to this evaluation.
    waiters: SmallVec<[W; 4]>,
  },
  /// The phase function failed; nothing was cached.
  Failed {
    /// Coordinate that failed.
    coordinate: Coordinate,
    /// The failure.
    error: EvaluationError,
    /// Waiters attached to this evaluation.
    waiters: SmallVec<[W; 4]>,
  },
}

/// Result of [`EvaluationCache::wait`].
#[derive(Debug)]
pub enum Wait<L, W> {
  /// An evaluation finished.
  Completed(Completion<L, W>),
  /// The deadline passed first.
  TimedOut,
  /// Nothing is in flight.
  Idle,
}

/// Cache usage counters.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CacheStats {
  /// Requests answered from the point table.
  pub hits: usize,
  /// Requests attached to an evaluation already in flight.
  pub joins: usize,
  /// Calls of the phase function that were spawned.
  pub spawned: usize,
  /// Successful evaluations received.
  pub evaluations: usize,
  /// Failed evaluations received.
  pub failures: usize,
}

impl CacheStats {
  /// Total number of requests.
  #[inline]
  pub fn requests(&self) -> usize {
    self.hits + self.joins + self.spawned
  }
}

/// Message sent by a worker when an evaluation finishes.
struct Finished<L> {
  coordinate: Coordinate,
  outcome: Result<L, EvaluationError>,
}

/// Deduplicating, rayon-backed cache in front of a [`PhaseFunction`].
///
/// `W` identifies whoever waits on an evaluation (split tasks use their box
/// key). The point table is borrowed per call, so the same table instance
/// backs the cache and the result.
pub struct EvaluationCache<L, W> {
  func: Arc<dyn PhaseFunction<L>>,
  limits: Limits,
  in_flight: HashMap<Coordinate, SmallVec<[W; 4]>>,
  sender: Sender<Finished<L>>,
  receiver: Receiver<Finished<L>>,
  stats: CacheStats,
}

impl<L, W> EvaluationCache<L, W>
where
  L: Clone + Send + 'static,
  W: Copy,
{
  /// Wrap a phase function. Coordinates are mapped into `limits` before
  /// each call.
  pub fn new(func: impl PhaseFunction<L>, limits: Limits) -> Self {
    Self::from_arc(Arc::new(func), limits)
  }

  /// Wrap a shared phase function.
  pub fn from_arc(func: Arc<dyn PhaseFunction<L>>, limits: Limits) -> Self {
    let (sender, receiver) = channel::unbounded();
    Self {
      func,
      limits,
      in_flight: HashMap::new(),
      sender,
      receiver,
      stats: CacheStats::default(),
    }
  }

  /// Request the label at `coordinate` on behalf of `waiter`.
  ///
  /// Never blocks. Returns the cached label, or attaches the waiter to the
  /// (possibly new) in-flight evaluation.
  pub fn request(&mut self, points: &PointTable<L>, coordinate: &Coordinate, waiter: W) -> Lookup<L> {
    if let Some(label) = points.label(coordinate) {
      self.stats.hits += 1;
      return Lookup::Ready(label.clone());
    }
    if let Some(waiters) = self.in_flight.get_mut(coordinate) {
      self.stats.joins += 1;
      waiters.push(waiter);
      return Lookup::Pending;
    }

    self.spawn(coordinate.clone());
    let mut waiters = SmallVec::new();
    waiters.push(waiter);
    self.in_flight.insert(coordinate.clone(), waiters);
    Lookup::Pending
  }

  /// Block until an evaluation finishes or `deadline` passes.
  ///
  /// A successful label is stored in `points` before it is returned.
  pub fn wait(&mut self, points: &mut PointTable<L>, deadline: Option<Instant>) -> Wait<L, W> {
    if self.in_flight.is_empty() {
      return Wait::Idle;
    }
    let finished = match deadline {
      Some(deadline) => {
        let timeout = deadline.saturating_duration_since(Instant::now());
        match self.receiver.recv_timeout(timeout) {
          Ok(finished) => finished,
          Err(RecvTimeoutError::Timeout) => return Wait::TimedOut,
          Err(RecvTimeoutError::Disconnected) => return Wait::Idle,
        }
      }
      None => match self.receiver.recv() {
        Ok(finished) => finished,
        Err(_) => return Wait::Idle,
      },
    };
    Wait::Completed(self.settle(points, finished))
  }

  /// Number of coordinates currently being evaluated.
  pub fn in_flight(&self) -> usize {
    self.in_flight.len()
  }

  /// True if the coordinate is currently being evaluated.
  pub fn is_in_flight(&self, coordinate: &Coordinate) -> bool {
    self.in_flight.contains_key(coordinate)
  }

  /// Usage counters.
  pub fn stats(&self) -> CacheStats {
    self.stats
  }

  /// Limits used to map coordinates.
  pub fn limits(&self) -> &Limits {
    &self.limits
  }

  fn settle(&mut self, points: &mut PointTable<L>, finished: Finished<L>) -> Completion<L, W> {
    let Finished { coordinate, outcome } = finished;
    let waiters = self.in_flight.remove(&coordinate).unwrap_or_default();
    match outcome {
      Ok(label) => {
        self.stats.evaluations += 1;
        points.insert(coordinate.clone(), label.clone());
        Completion::Evaluated {
          coordinate,
          label,
          waiters,
        }
      }
      Err(error) => {
        self.stats.failures += 1;
        Completion::Failed {
          coordinate,
          error,
          waiters,
        }
      }
    }
  }

  fn spawn(&mut self, coordinate: Coordinate) {
    self.stats.spawned += 1;
    let func = Arc::clone(&self.func);
    let sender = self.sender.clone();
    let position = self.limits.position(&coordinate);

    rayon::spawn(move || {
      let outcome = call_guarded(func.as_ref(), position);
      // Ignore send error (receiver dropped = run aborted)
      let _ = sender.send(Finished { coordinate, outcome });
    });
  }
}

/// Call the phase function, turning errors and panics into
/// [`EvaluationError`].
fn call_guarded<L: 'static>(func: &dyn PhaseFunction<L>, position: Vec<f64>) -> Result<L, EvaluationError> {
  match panic::catch_unwind(AssertUnwindSafe(|| func.phase(&position))) {
    Ok(Ok(label)) => Ok(label),
    Ok(Err(source)) => Err(EvaluationError::Failed { position, source }),
    Err(payload) => {
      let message = payload
        .downcast_ref::<&str>()
        .map(|s| (*s).to_owned())
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "non-string panic payload".to_owned());
      Err(EvaluationError::Panicked { position, message })
    }
  }
}

#[cfg(test)]
#[path = "cache_test.rs"]
mod cache_test;
