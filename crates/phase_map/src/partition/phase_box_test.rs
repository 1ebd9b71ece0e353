use num_rational::Rational64;

use super::*;

fn c(values: &[(i64, i64)]) -> Coordinate {
  Coordinate::new(values.iter().map(|&(n, d)| Rational64::new(n, d)))
}

fn unit_box() -> PhaseBox<i32> {
  PhaseBox::new(Coordinate::zeros(2), c(&[(1, 1), (1, 1)]))
}

fn half_box(corner: &[(i64, i64)]) -> PhaseBox<i32> {
  PhaseBox::new(c(corner), c(&[(1, 2), (1, 2)]))
}

#[test]
fn test_contains_is_closed() {
  let b = half_box(&[(0, 1), (0, 1)]);
  assert!(b.contains(&c(&[(0, 1), (0, 1)])), "lower corner");
  assert!(b.contains(&c(&[(1, 2), (1, 2)])), "upper corner");
  assert!(b.contains(&c(&[(1, 4), (1, 2)])), "upper face");
  assert!(!b.contains(&c(&[(3, 4), (1, 4)])), "outside on axis 0");
}

#[test]
fn test_add_point_outcomes() {
  let mut b = unit_box();
  let origin = Coordinate::zeros(2);
  let corner = c(&[(1, 1), (1, 1)]);
  let mid = c(&[(1, 2), (1, 2)]);

  assert_eq!(b.add_point(&c(&[(2, 1), (0, 1)]), &1), AddPoint::Outside);
  assert!(b.phase().is_unset(), "outside point must not set the phase");

  assert_eq!(b.add_point(&origin, &1), AddPoint::Inserted);
  assert_eq!(b.phase(), &Phase::Value(1));
  assert_eq!(b.add_point(&origin, &2), AddPoint::Duplicate, "duplicates ignore the label");
  assert_eq!(b.phase(), &Phase::Value(1));

  assert_eq!(b.add_point(&corner, &1), AddPoint::Inserted);
  assert_eq!(b.add_point(&mid, &2), AddPoint::BecameUndefined);
  assert!(b.phase().is_undefined());
  assert_eq!(b.points().len(), 3);
}

#[test]
fn test_undefined_signals_once() {
  let mut b = unit_box();
  b.add_point(&Coordinate::zeros(2), &1);
  assert_eq!(b.add_point(&c(&[(1, 1), (0, 1)]), &2), AddPoint::BecameUndefined);
  assert_eq!(
    b.add_point(&c(&[(0, 1), (1, 1)]), &3),
    AddPoint::Inserted,
    "already undefined box must not signal again"
  );
}

#[test]
fn test_touches() {
  let a = half_box(&[(0, 1), (0, 1)]);
  let face = half_box(&[(1, 2), (0, 1)]);
  let diagonal = half_box(&[(1, 2), (1, 2)]);
  let far = PhaseBox::new(c(&[(3, 4), (0, 1)]), c(&[(1, 4), (1, 4)]));

  assert!(a.touches(&face), "shared face");
  assert!(a.touches(&diagonal), "shared corner");
  assert!(!a.touches(&far), "gap on axis 0");
  assert!(a.touches(&a.clone()), "identical geometry overlaps");
  assert!(unit_box().touches(&a), "containment overlaps");
}

#[test]
fn test_child_geometry() {
  let b = PhaseBox::<i32>::new(c(&[(1, 2), (0, 1)]), c(&[(1, 2), (1, 2)]));
  let (corners, size) = b.child_geometry();
  assert_eq!(size, c(&[(1, 4), (1, 4)]));
  assert_eq!(corners.len(), 4);
  assert_eq!(corners[0], c(&[(1, 2), (0, 1)]));
  assert_eq!(corners[1], c(&[(3, 4), (0, 1)]), "bit 0 selects upper half of axis 0");
  assert_eq!(corners[2], c(&[(1, 2), (1, 4)]), "bit 1 selects upper half of axis 1");
  assert_eq!(corners[3], c(&[(3, 4), (1, 4)]));
}

#[test]
fn test_exceeds() {
  let b = half_box(&[(0, 1), (0, 1)]);
  assert!(b.exceeds(&c(&[(1, 4), (1, 4)])));
  assert!(!b.exceeds(&c(&[(1, 2), (1, 2)])), "equal size does not exceed");
  assert!(b.exceeds(&c(&[(1, 2), (1, 4)])), "one axis is enough");
  assert_eq!(b.upper(), c(&[(1, 2), (1, 2)]));
}
