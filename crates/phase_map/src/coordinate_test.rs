use std::collections::HashSet;

use num_rational::Rational64;

use super::*;

fn r(n: i64, d: i64) -> Rational64 {
  Rational64::new(n, d)
}

/// Equal rationals written differently hash to the same bucket.
#[test]
fn test_equal_values_hash_equal() {
  let a = Coordinate::new([r(1, 2), r(2, 4)]);
  let b = Coordinate::new([r(2, 4), r(1, 2)]);
  assert_eq!(a, b);

  let mut set = HashSet::new();
  set.insert(a);
  assert!(set.contains(&b), "normalized rationals must hash equal");
}

/// Midpoints reached by two different halving paths coincide exactly.
#[test]
fn test_shared_midpoint_is_exact() {
  let size = Coordinate::new([r(1, 2), r(1, 2)]);
  let left = Coordinate::zeros(2);
  let right = Coordinate::new([r(1, 2), r(0, 1)]);

  // Right edge midpoint of the left box, left edge midpoint of the right box.
  let from_left = left.offset_by_halves(&size, &[2, 1]);
  let from_right = right.offset_by_halves(&size, &[0, 1]);
  assert_eq!(from_left, from_right);
  assert_eq!(from_left, Coordinate::new([r(1, 2), r(1, 4)]));
}

#[test]
fn test_grid_point_and_cell_size() {
  let mesh = [3, 5];
  assert_eq!(Coordinate::cell_size(&mesh), Coordinate::new([r(1, 2), r(1, 4)]));
  assert_eq!(
    Coordinate::grid_point(&[1, 3], &mesh),
    Coordinate::new([r(1, 2), r(3, 4)])
  );
  assert_eq!(Coordinate::grid_point(&[2, 4], &mesh), Coordinate::new([r(1, 1), r(1, 1)]));
}

#[test]
fn test_ordering_is_lexicographic() {
  let a = Coordinate::new([r(0, 1), r(1, 1)]);
  let b = Coordinate::new([r(1, 2), r(0, 1)]);
  let c = Coordinate::new([r(1, 2), r(1, 4)]);
  let mut coords = vec![c.clone(), a.clone(), b.clone()];
  coords.sort();
  assert_eq!(coords, vec![a, b, c]);
}

#[test]
fn test_comparisons() {
  let low = Coordinate::new([r(0, 1), r(1, 4)]);
  let high = Coordinate::new([r(1, 2), r(1, 4)]);
  assert!(low.all_le(&high));
  assert!(!high.all_le(&low));
  assert!(high.any_gt(&low));
  assert!(!low.any_gt(&high));
  assert!(low.in_unit_cube());
  assert!(!Coordinate::new([r(3, 2)]).in_unit_cube());
}

#[test]
fn test_arithmetic() {
  let a = Coordinate::new([r(1, 4), r(1, 2)]);
  let b = Coordinate::new([r(1, 4), r(1, 4)]);
  assert_eq!(&a + &b, Coordinate::new([r(1, 2), r(3, 4)]));
  assert_eq!(&a - &b, Coordinate::new([r(0, 1), r(1, 4)]));
  assert_eq!(a.halved(), Coordinate::new([r(1, 8), r(1, 4)]));
  assert_eq!(a[1], r(1, 2));
}

#[test]
fn test_display_and_f64() {
  let a = Coordinate::new([r(1, 2), r(0, 1)]);
  assert_eq!(a.to_string(), "(1/2, 0)");
  assert_eq!(format!("{a:?}"), "(1/2, 0)");
  assert_eq!(a.to_f64().as_slice(), &[0.5, 0.0]);
}
