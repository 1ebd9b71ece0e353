//! Box partition of the unit cube and its neighbor graph.
//!
//! Boxes live in a generational arena and refer to each other by [`BoxKey`].
//! Box↔point membership is stored as key sets on both sides, so there are no
//! reference cycles and serialization never has to walk an object graph.
//!
//! # Module Structure
//!
//! - [`phase`]: `Phase` - aggregate label of a box
//! - [`phase_box`]: `PhaseBox` - one axis-aligned hyperrectangle
//! - [`point`]: `Point`, `PointTable` - evaluated labels with back-references
//! - [`graph`]: `BoxGraph` - the arena plus neighbor maintenance

pub mod graph;
pub mod phase;
pub mod phase_box;
pub mod point;

// Re-exports
pub use graph::{BoxGraph, BoxKey};
pub use phase::Phase;
pub use phase_box::{AddPoint, PhaseBox};
pub use point::{Point, PointTable};
