use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use num_rational::Rational64;

use super::*;

fn unit_limits() -> Limits {
  Limits::new(&[(0.0, 1.0), (0.0, 1.0)]).unwrap()
}

fn c(x: (i64, i64), y: (i64, i64)) -> Coordinate {
  Coordinate::new([Rational64::new(x.0, x.1), Rational64::new(y.0, y.1)])
}

/// Block until the next completion, failing the test on timeout.
fn next(cache: &mut EvaluationCache<i32, u32>, points: &mut PointTable<i32>) -> Completion<i32, u32> {
  let deadline = Instant::now() + Duration::from_secs(10);
  match cache.wait(points, Some(deadline)) {
    Wait::Completed(completion) => completion,
    other => panic!("expected a completion, got {other:?}"),
  }
}

#[test]
fn test_concurrent_requests_share_one_call() {
  let calls = Arc::new(AtomicUsize::new(0));
  let counter = Arc::clone(&calls);
  let func = infallible(move |p: &[f64]| {
    counter.fetch_add(1, Ordering::SeqCst);
    if p[0] > 0.5 {
      1
    } else {
      0
    }
  });
  let mut cache = EvaluationCache::new(func, unit_limits());
  let mut points = PointTable::new();
  let coord = c((3, 4), (0, 1));

  assert_eq!(cache.request(&points, &coord, 1), Lookup::Pending);
  assert_eq!(cache.request(&points, &coord, 2), Lookup::Pending);
  assert_eq!(cache.in_flight(), 1, "second request joins the first");

  match next(&mut cache, &mut points) {
    Completion::Evaluated {
      coordinate,
      label,
      waiters,
    } => {
      assert_eq!(coordinate, coord);
      assert_eq!(label, 1);
      assert_eq!(waiters.as_slice(), &[1, 2], "both waiters are notified");
    }
    other => panic!("unexpected completion {other:?}"),
  }
  assert_eq!(points.label(&coord), Some(&1), "label stored in the point table");

  assert_eq!(cache.request(&points, &coord, 3), Lookup::Ready(1));
  assert_eq!(calls.load(Ordering::SeqCst), 1, "function called once");

  let stats = cache.stats();
  assert_eq!(stats.spawned, 1);
  assert_eq!(stats.joins, 1);
  assert_eq!(stats.hits, 1);
  assert_eq!(stats.requests(), 3);
}

#[test]
fn test_position_is_mapped_into_limits() {
  let limits = Limits::new(&[(-2.0, 2.0), (10.0, 20.0)]).unwrap();
  let func = |p: &[f64]| -> Result<(i64, i64), Infallible> { Ok((p[0] as i64, p[1] as i64)) };
  let mut cache: EvaluationCache<(i64, i64), u32> = EvaluationCache::new(func, limits);
  let mut points = PointTable::new();
  let coord = c((1, 4), (1, 2));
  cache.request(&points, &coord, 0);

  let deadline = Instant::now() + Duration::from_secs(10);
  match cache.wait(&mut points, Some(deadline)) {
    Wait::Completed(Completion::Evaluated { label, .. }) => assert_eq!(label, (-1, 15)),
    other => panic!("unexpected wait result {other:?}"),
  }
}

#[test]
fn test_failures_are_not_cached() {
  let calls = Arc::new(AtomicUsize::new(0));
  let counter = Arc::clone(&calls);
  let func = move |_: &[f64]| -> Result<i32, BoxError> {
    counter.fetch_add(1, Ordering::SeqCst);
    Err("boom".into())
  };
  let mut cache = EvaluationCache::new(func, unit_limits());
  let mut points = PointTable::new();
  let coord = c((0, 1), (0, 1));

  cache.request(&points, &coord, 7);
  match next(&mut cache, &mut points) {
    Completion::Failed { error, waiters, .. } => {
      assert!(matches!(error, EvaluationError::Failed { .. }));
      assert_eq!(error.position(), &[0.0, 0.0]);
      assert_eq!(waiters.as_slice(), &[7]);
    }
    other => panic!("unexpected completion {other:?}"),
  }
  assert!(points.is_empty(), "failed label must not be stored");

  assert_eq!(cache.request(&points, &coord, 8), Lookup::Pending, "failure is retried");
  next(&mut cache, &mut points);
  assert_eq!(calls.load(Ordering::SeqCst), 2);
  assert_eq!(cache.stats().failures, 2);
}

#[test]
fn test_panic_is_contained() {
  let func = infallible(|_: &[f64]| -> i32 { panic!("phase function exploded") });
  let mut cache = EvaluationCache::new(func, unit_limits());
  let mut points = PointTable::new();
  cache.request(&points, &c((1, 2), (1, 2)), 0);

  match next(&mut cache, &mut points) {
    Completion::Failed {
      error: EvaluationError::Panicked { message, position },
      ..
    } => {
      assert_eq!(message, "phase function exploded");
      assert_eq!(position, vec![0.5, 0.5]);
    }
    other => panic!("unexpected completion {other:?}"),
  }
}

#[test]
fn test_wait_times_out_and_idles() {
  let (gate_tx, gate_rx) = crossbeam_channel::bounded::<()>(0);
  let func = infallible(move |_: &[f64]| {
    let _ = gate_rx.recv();
    5
  });
  let mut cache = EvaluationCache::new(func, unit_limits());
  let mut points = PointTable::new();

  assert!(matches!(cache.wait(&mut points, None), Wait::Idle), "nothing in flight");

  let coord = c((1, 2), (0, 1));
  cache.request(&points, &coord, 0);
  assert!(cache.is_in_flight(&coord));
  assert!(
    matches!(cache.wait(&mut points, Some(Instant::now())), Wait::TimedOut),
    "blocked evaluation cannot finish before an expired deadline"
  );

  gate_tx.send(()).unwrap();
  assert!(matches!(next(&mut cache, &mut points), Completion::Evaluated { label: 5, .. }));
  assert!(!cache.is_in_flight(&coord));
  assert!(matches!(cache.wait(&mut points, None), Wait::Idle));
}
