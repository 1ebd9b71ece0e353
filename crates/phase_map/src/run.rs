//! Entry points: map a phase function over a domain.

use std::sync::Arc;

use crate::cache::PhaseFunction;
use crate::checkpoint::Checkpointer;
use crate::config::RunConfig;
use crate::coordinate::Coordinate;
use crate::error::{ConfigError, RunError};
use crate::io;
use crate::limits::Limits;
use crate::result::PhaseMap;
use crate::scheduler::{Scheduler, SplitLimits};
use crate::stats::RunStats;
use crate::Label;

/// Map `func` over `limits` starting from a uniform grid (or from
/// `config.save_file` when `config.load` is set).
///
/// # Example
///
/// ```
/// use phase_map::{infallible, run, Mesh, RunConfig};
///
/// let circle = infallible(|p: &[f64]| p[0] * p[0] + p[1] * p[1] < 1.0);
/// let config = RunConfig {
///   mesh: Mesh::Uniform(3),
///   num_steps: 3,
///   ..Default::default()
/// };
/// let map = run(circle, &[(-1.1, 1.1), (-1.1, 1.1)], &config).unwrap();
/// assert!(map.num_undefined() > 0);
/// ```
pub fn run<L: Label>(
  func: impl PhaseFunction<L>,
  limits: &[(f64, f64)],
  config: &RunConfig,
) -> Result<PhaseMap<L>, RunError> {
  run_with_stats(func, limits, config, None).map(|(map, _)| map)
}

/// Continue refining `init_result`, typically a map from an earlier run with
/// fewer steps. Its known points are reused without calling `func` again.
pub fn run_from<L: Label>(
  func: impl PhaseFunction<L>,
  limits: &[(f64, f64)],
  config: &RunConfig,
  init_result: PhaseMap<L>,
) -> Result<PhaseMap<L>, RunError> {
  run_with_stats(func, limits, config, Some(init_result)).map(|(map, _)| map)
}

/// Like [`run`] and [`run_from`], also returning run statistics.
#[tracing::instrument(skip_all, name = "phase_map::run", fields(num_steps = config.num_steps))]
pub fn run_with_stats<L: Label>(
  func: impl PhaseFunction<L>,
  limits: &[(f64, f64)],
  config: &RunConfig,
  init_result: Option<PhaseMap<L>>,
) -> Result<(PhaseMap<L>, RunStats), RunError> {
  let limits = Limits::new(limits)?;
  let mesh = config.validate(limits.dim())?;
  let interval = config.save_interval()?;
  if config.load && init_result.is_some() {
    return Err(ConfigError::LoadConflict.into());
  }

  let init_result = match init_result {
    Some(map) => Some(map),
    None if config.load => load_checkpoint(config)?,
    None => None,
  };

  let split_limits = SplitLimits::new(Coordinate::cell_size(&mesh), config.num_steps);
  let map = match init_result {
    Some(map) => {
      map.check_resumable(&limits, &split_limits.max_size)?;
      tracing::info!(boxes = map.num_boxes(), points = map.num_points(), "resuming");
      map
    }
    None => PhaseMap::with_grid(limits, &mesh),
  };

  let mut scheduler = Scheduler::new(map, Arc::new(func), split_limits, config.all_corners);
  if let Some(path) = &config.save_file {
    scheduler = scheduler.with_checkpoint(Checkpointer::new(path, config.format, interval));
  }

  scheduler.schedule_pending();
  tracing::info!(tasks = scheduler.pending(), "starting");
  let outcome = scheduler.drive();
  let flushed = scheduler.flush_checkpoint();
  match (outcome, flushed) {
    (Err(err), Err(flush_err)) => {
      tracing::warn!(error = %flush_err, "final checkpoint failed after run error");
      Err(err)
    }
    (Err(err), Ok(_)) => Err(err),
    (Ok(()), Err(flush_err)) => Err(flush_err.into()),
    (Ok(()), Ok(_)) => {
      let (map, stats) = scheduler.finish();
      tracing::info!(
        boxes = map.num_boxes(),
        points = map.num_points(),
        undefined = map.num_undefined(),
        splits = stats.splits,
        evaluations = stats.evaluations,
        elapsed_us = stats.elapsed_us,
        "finished"
      );
      Ok((map, stats))
    }
  }
}

/// Read the checkpoint named by `config.save_file`.
///
/// With `load_quiet`, an unreadable file means a cold start.
fn load_checkpoint<L: Label>(config: &RunConfig) -> Result<Option<PhaseMap<L>>, RunError> {
  let Some(path) = &config.save_file else {
    return Err(ConfigError::LoadWithoutFile.into());
  };
  match io::load(path, config.format) {
    Ok(map) => Ok(Some(map)),
    Err(err) if config.load_quiet => {
      tracing::warn!(path = %path.display(), error = %err, "could not load result, starting from scratch");
      Ok(None)
    }
    Err(err) => Err(err.into()),
  }
}

#[cfg(test)]
#[path = "run_test.rs"]
mod run_test;
