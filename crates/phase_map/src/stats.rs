//! Run statistics.

use crate::cache::CacheStats;

/// Statistics from one run.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RunStats {
  /// Boxes split into children.
  pub splits: usize,
  /// Split tasks scheduled, including ones for boxes of a resumed result.
  pub tasks_scheduled: usize,
  /// Successful calls of the phase function.
  pub evaluations: usize,
  /// Stencil requests answered from known points.
  pub cache_hits: usize,
  /// Stencil requests attached to an evaluation already in flight.
  pub cache_joins: usize,
  /// Checkpoint files written.
  pub checkpoints: usize,
  /// Wall time of the drive loop in microseconds.
  pub elapsed_us: u64,
}

impl RunStats {
  /// Copy cache counters into the run statistics.
  pub fn record_cache(&mut self, cache: CacheStats) {
    self.evaluations = cache.evaluations;
    self.cache_hits = cache.hits;
    self.cache_joins = cache.joins;
  }

  /// Total stencil requests made by split tasks.
  #[inline]
  pub fn total_requests(&self) -> usize {
    self.evaluations + self.cache_hits + self.cache_joins
  }

  /// Fraction of stencil requests that did not call the phase function.
  pub fn reuse_ratio(&self) -> f64 {
    let total = self.total_requests();
    if total == 0 {
      return 0.0;
    }
    (self.cache_hits + self.cache_joins) as f64 / total as f64
  }
}
