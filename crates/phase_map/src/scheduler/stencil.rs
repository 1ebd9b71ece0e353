//! Evaluation stencils of a box about to be split.

use smallvec::SmallVec;

use crate::coordinate::Coordinate;
use crate::partition::PhaseBox;

/// Stencil coordinates; inline for the 2D midpoint + corners case.
pub type Stencil = SmallVec<[Coordinate; 9]>;

/// Coordinates to evaluate before splitting `phase_box`.
///
/// Default: the midpoint and the `2^dim` corners. With `all_corners`, all
/// `3^dim` points at offsets `{0, 1/2, 1}` of the size on every axis.
pub fn stencil<L>(phase_box: &PhaseBox<L>, all_corners: bool) -> Stencil {
  let dim = phase_box.dim();
  let corner = phase_box.corner();
  let size = phase_box.size();
  let mut points = Stencil::new();

  if all_corners {
    for_each_digits(dim, 3, |digits| points.push(corner.offset_by_halves(size, digits)));
  } else {
    let midpoint: SmallVec<[u8; 4]> = SmallVec::from_elem(1, dim);
    points.push(corner.offset_by_halves(size, &midpoint));
    // Corner offsets are 0 or a full size, i.e. 0 or 2 halves.
    for_each_digits(dim, 2, |digits| {
      let halves: SmallVec<[u8; 4]> = digits.iter().map(|d| d * 2).collect();
      points.push(corner.offset_by_halves(size, &halves));
    });
  }
  points
}

/// Call `f` with every `dim`-digit number in base `base`, digit 0 fastest.
fn for_each_digits(dim: usize, base: u8, mut f: impl FnMut(&[u8])) {
  let mut digits: SmallVec<[u8; 4]> = SmallVec::from_elem(0, dim);
  'outer: loop {
    f(digits.as_slice());
    for digit in digits.iter_mut() {
      *digit += 1;
      if *digit < base {
        continue 'outer;
      }
      *digit = 0;
    }
    return;
  }
}
