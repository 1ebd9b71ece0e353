//! Checkpointer - periodic snapshots of a running map.
//!
//! The scheduler raises the dirty flag after every stored evaluation and
//! every split, and asks [`Checkpointer::deadline`] how long it may block
//! waiting for the next completion. Flushes only happen between scheduler
//! steps, so a snapshot never shows a box halfway through a split.

use std::path::{Path, PathBuf};
use std::time::Duration;

use web_time::Instant;

use crate::error::PersistError;
use crate::io::{self, Format};
use crate::result::PhaseMap;
use crate::Label;

/// Periodic writer of a [`PhaseMap`] to a file.
#[derive(Debug)]
pub struct Checkpointer {
  path: PathBuf,
  format: Format,
  interval: Duration,
  dirty: bool,
  last_flush: Instant,
  flushes: usize,
}

impl Checkpointer {
  /// Write to `path` at most once per `interval` while dirty.
  pub fn new(path: impl Into<PathBuf>, format: Format, interval: Duration) -> Self {
    Self {
      path: path.into(),
      format,
      interval,
      dirty: false,
      last_flush: Instant::now(),
      flushes: 0,
    }
  }

  /// Target file.
  pub fn path(&self) -> &Path {
    &self.path
  }

  /// Number of files written so far.
  #[inline]
  pub fn flushes(&self) -> usize {
    self.flushes
  }

  /// Record that the map changed since the last flush.
  #[inline]
  pub fn mark_dirty(&mut self) {
    self.dirty = true;
  }

  /// True if the map changed since the last flush.
  #[inline]
  pub fn is_dirty(&self) -> bool {
    self.dirty
  }

  /// When the next flush is due. `None` while clean, so the scheduler can
  /// block indefinitely.
  pub fn deadline(&self) -> Option<Instant> {
    self.dirty.then(|| self.last_flush + self.interval)
  }

  /// True if dirty and the interval has elapsed at `now`.
  pub fn is_due(&self, now: Instant) -> bool {
    self.deadline().map_or(false, |deadline| now >= deadline)
  }

  /// Flush if the interval has elapsed. Returns whether a file was written.
  pub fn flush_if_due<L: Label>(&mut self, map: &PhaseMap<L>) -> Result<bool, PersistError> {
    if self.is_due(Instant::now()) {
      self.flush(map)
    } else {
      Ok(false)
    }
  }

  /// Write the map now if it is dirty. Returns whether a file was written.
  pub fn flush<L: Label>(&mut self, map: &PhaseMap<L>) -> Result<bool, PersistError> {
    if !self.dirty {
      return Ok(false);
    }
    let _span = tracing::info_span!("checkpoint").entered();
    io::save(map, &self.path, self.format)?;
    self.dirty = false;
    self.last_flush = Instant::now();
    self.flushes += 1;
    tracing::debug!(
      path = %self.path.display(),
      flushes = self.flushes,
      boxes = map.num_boxes(),
      points = map.num_points(),
      "checkpoint written"
    );
    Ok(true)
  }
}
