//! Tagged document types of the persisted result.
//!
//! Every entity is an explicit sum type with a `"type"` tag, and each
//! variant has one encode and one decode function:
//!
//! ```json
//! { "type": "result",
//!   "limits": [[-1.0, 1.0], [0.0, 2.0]],
//!   "points": [ { "coord": { "type": "coord", "c": [ {"n": 1, "d": 2}, ... ] }, "label": 3 } ],
//!   "boxes":  [ { "type": "box", "corner": {..}, "size": {..},
//!                 "phase": { "kind": "value", "value": 3 } } ] }
//! ```
//!
//! Rationals are stored as numerator/denominator pairs, so coordinates
//! round-trip exactly. Points and boxes are written in sorted order so equal
//! results produce identical files.

use num_rational::Rational64;
use num_traits::{CheckedAdd, Zero};
use serde::{Deserialize, Serialize};

use crate::coordinate::{Coordinate, MAX_EXACT_DENOM};
use crate::error::PersistError;
use crate::limits::Limits;
use crate::partition::Phase;
use crate::result::PhaseMap;
use crate::Label;

/// Exact rational `n / d`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RationalDoc {
  /// Numerator.
  pub n: i64,
  /// Denominator, never zero.
  pub d: i64,
}

/// Coordinate document.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum CoordinateDoc {
  /// Vector of rationals.
  #[serde(rename = "coord")]
  Coord {
    /// Components.
    c: Vec<RationalDoc>,
  },
}

/// Box phase document.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum PhaseDoc<L> {
  /// No points.
  Unset,
  /// Common label of all points.
  Value(L),
  /// Conflicting labels.
  Undefined,
}

/// Box document.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum BoxDoc<L> {
  /// Axis-aligned box.
  #[serde(rename = "box")]
  Box {
    /// Lowest corner.
    corner: CoordinateDoc,
    /// Extent per axis.
    size: CoordinateDoc,
    /// Stored phase. Recomputed on load and compared.
    phase: PhaseDoc<L>,
  },
}

/// Evaluated point.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PointDoc<L> {
  /// Where the function was evaluated.
  pub coord: CoordinateDoc,
  /// What it returned.
  pub label: L,
}

/// Top-level result document.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ResultDoc<L> {
  /// Complete result.
  #[serde(rename = "result")]
  Result {
    /// Per-axis `(low, high)` limits.
    limits: Vec<(f64, f64)>,
    /// Evaluated points, sorted by coordinate.
    points: Vec<PointDoc<L>>,
    /// Box frontier, sorted by corner then size.
    boxes: Vec<BoxDoc<L>>,
  },
}

// =============================================================================
// Rational
// =============================================================================

/// Encode a rational.
pub fn encode_rational(value: &Rational64) -> RationalDoc {
  RationalDoc {
    n: *value.numer(),
    d: *value.denom(),
  }
}

/// Decode a rational.
///
/// Rejects a zero denominator, `i64::MIN` on either side and denominators
/// beyond the exact coordinate range, so that later arithmetic on decoded
/// values cannot overflow unnoticed.
pub fn decode_rational(doc: RationalDoc) -> Result<Rational64, PersistError> {
  let RationalDoc { n, d } = doc;
  if d == 0 {
    return Err(PersistError::Invalid(format!("zero denominator in {n}/{d}")));
  }
  if n == i64::MIN || u128::from(d.unsigned_abs()) > MAX_EXACT_DENOM {
    return Err(PersistError::Invalid(format!("rational {n}/{d} out of range")));
  }
  Ok(Rational64::new(n, d))
}

// =============================================================================
// Coordinate
// =============================================================================

/// Encode a coordinate.
pub fn encode_coordinate(coordinate: &Coordinate) -> CoordinateDoc {
  CoordinateDoc::Coord {
    c: coordinate.iter().map(encode_rational).collect(),
  }
}

/// Decode a coordinate of `dim` components.
pub fn decode_coordinate(doc: CoordinateDoc, dim: usize) -> Result<Coordinate, PersistError> {
  let CoordinateDoc::Coord { c } = doc;
  if c.len() != dim {
    return Err(PersistError::Invalid(format!(
      "coordinate has {} components, expected {dim}",
      c.len()
    )));
  }
  c.into_iter().map(decode_rational).collect()
}

// =============================================================================
// Phase and box
// =============================================================================

/// Encode a phase.
pub fn encode_phase<L: Clone>(phase: &Phase<L>) -> PhaseDoc<L> {
  match phase {
    Phase::Unset => PhaseDoc::Unset,
    Phase::Value(label) => PhaseDoc::Value(label.clone()),
    Phase::Undefined => PhaseDoc::Undefined,
  }
}

/// Decode a phase.
pub fn decode_phase<L>(doc: PhaseDoc<L>) -> Phase<L> {
  match doc {
    PhaseDoc::Unset => Phase::Unset,
    PhaseDoc::Value(label) => Phase::Value(label),
    PhaseDoc::Undefined => Phase::Undefined,
  }
}

/// Encode a box from its geometry and phase.
pub fn encode_box<L: Clone>(corner: &Coordinate, size: &Coordinate, phase: &Phase<L>) -> BoxDoc<L> {
  BoxDoc::Box {
    corner: encode_coordinate(corner),
    size: encode_coordinate(size),
    phase: encode_phase(phase),
  }
}

/// Decode a box into `(corner, size, phase)`, checking that the box lies in
/// the unit cube and has a positive extent.
pub fn decode_box<L>(doc: BoxDoc<L>, dim: usize) -> Result<(Coordinate, Coordinate, Phase<L>), PersistError> {
  let BoxDoc::Box { corner, size, phase } = doc;
  let corner = decode_coordinate(corner, dim)?;
  let size = decode_coordinate(size, dim)?;
  if size.iter().any(|s| *s <= Rational64::zero()) {
    return Err(PersistError::Invalid(format!("box at {corner} has non-positive size {size}")));
  }
  let upper: Option<Coordinate> = corner.iter().zip(size.iter()).map(|(c, s)| c.checked_add(s)).collect();
  match upper {
    Some(upper) if corner.in_unit_cube() && upper.in_unit_cube() => {}
    _ => {
      return Err(PersistError::Invalid(format!("box at {corner} with size {size} leaves the unit cube")));
    }
  }
  Ok((corner, size, decode_phase(phase)))
}

// =============================================================================
// Result
// =============================================================================

/// Encode a complete result.
pub fn encode_result<L: Label>(map: &PhaseMap<L>) -> ResultDoc<L> {
  let points = map
    .points()
    .sorted_coordinates()
    .into_iter()
    .filter_map(|coord| {
      map.points().label(coord).map(|label| PointDoc {
        coord: encode_coordinate(coord),
        label: label.clone(),
      })
    })
    .collect();

  let mut boxes: Vec<_> = map.boxes().iter().map(|(_, b)| b).collect();
  boxes.sort_unstable_by(|a, b| a.corner().cmp(b.corner()).then_with(|| a.size().cmp(b.size())));
  let boxes = boxes
    .into_iter()
    .map(|b| encode_box(b.corner(), b.size(), b.phase()))
    .collect();

  ResultDoc::Result {
    limits: map.limits().as_slice().to_vec(),
    points,
    boxes,
  }
}

/// Decode a complete result, rebuilding box membership and neighbors.
pub fn decode_result<L: Label>(doc: ResultDoc<L>) -> Result<PhaseMap<L>, PersistError> {
  let ResultDoc::Result { limits, points, boxes } = doc;
  let limits = Limits::new(&limits).map_err(|err| PersistError::Invalid(err.to_string()))?;
  let dim = limits.dim();

  let points = points
    .into_iter()
    .map(|point| {
      let coordinate = decode_coordinate(point.coord, dim)?;
      if !coordinate.in_unit_cube() {
        return Err(PersistError::Invalid(format!("point {coordinate} outside the unit cube")));
      }
      Ok((coordinate, point.label))
    })
    .collect::<Result<Vec<_>, PersistError>>()?;
  let boxes = boxes
    .into_iter()
    .map(|b| decode_box(b, dim))
    .collect::<Result<Vec<_>, PersistError>>()?;

  Ok(PhaseMap::from_parts(limits, points, boxes))
}

#[cfg(test)]
#[path = "encoding_test.rs"]
mod encoding_test;
