//! phase_map - Adaptive boundary mapping of discrete phase functions
//!
//! Given a function that assigns a discrete label ("phase") to every point
//! of an n-dimensional box, this crate finds a piecewise-constant
//! approximation whose resolution is refined only near label boundaries, with
//! as few calls of the function as possible.
//!
//! # Features
//!
//! - **Exact coordinates**: positions are `Rational64` vectors in the unit
//!   cube, so shared corners computed by different boxes hash equal
//! - **Deduplicated evaluation**: the phase function runs on rayon workers
//!   and at most once per distinct coordinate
//! - **Adaptive splitting**: boxes with conflicting labels are split until a
//!   minimum size, propagating samples to their neighbors
//! - **Checkpoint / resume**: results are saved periodically as JSON and can
//!   seed a later run with more refinement steps
//!
//! # Example
//!
//! ```
//! use phase_map::{infallible, run, Mesh, Phase, RunConfig};
//!
//! let line = infallible(|p: &[f64]| if p[0] > 0.5 || p[1] < 0.2 { 1 } else { 0 });
//! let config = RunConfig {
//!   mesh: Mesh::Uniform(3),
//!   num_steps: 4,
//!   ..Default::default()
//! };
//! let map = run(line, &[(0.0, 1.0), (0.0, 1.0)], &config).unwrap();
//!
//! for (_, phase_box) in map.boxes().iter() {
//!   if let Phase::Value(label) = phase_box.phase() {
//!     let _ = (phase_box.corner(), phase_box.size(), label);
//!   }
//! }
//! ```

use std::fmt::Debug;
use std::hash::Hash;

use serde::de::DeserializeOwned;
use serde::Serialize;

pub mod cache;
pub mod checkpoint;
pub mod config;
pub mod coordinate;
pub mod error;
pub mod io;
pub mod limits;
pub mod partition;
pub mod result;
pub mod run;
pub mod scheduler;
pub mod stats;

// Test utilities
#[cfg(test)]
pub mod test_utils;

// Re-exports
pub use cache::{infallible, CacheStats, EvaluationCache, PhaseFunction};
pub use checkpoint::Checkpointer;
pub use config::{Mesh, RunConfig};
pub use coordinate::Coordinate;
pub use error::{BoxError, ConfigError, EvaluationError, PersistError, RunError};
pub use io::Format;
pub use limits::Limits;
pub use partition::{BoxKey, Phase, PhaseBox, Point};
pub use result::PhaseMap;
pub use run::{run, run_from, run_with_stats};
pub use stats::RunStats;

/// Discrete value returned by a phase function.
///
/// Blanket-implemented for every type with the required bounds: equality to
/// compare phases, hashing for lookups, serde for checkpoints.
pub trait Label: Clone + Eq + Hash + Debug + Send + Sync + Serialize + DeserializeOwned + 'static {}

impl<T> Label for T where T: Clone + Eq + Hash + Debug + Send + Sync + Serialize + DeserializeOwned + 'static {}
