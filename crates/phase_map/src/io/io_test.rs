use super::*;
use crate::cache::infallible;
use crate::config::{Mesh, RunConfig};
use crate::run::run;
use crate::test_utils::{phase1, temp_path};

fn sample_map() -> PhaseMap<i32> {
  let config = RunConfig {
    mesh: Mesh::Uniform(3),
    num_steps: 3,
    ..Default::default()
  };
  run(infallible(phase1), &[(-1.0, 1.0), (-1.0, 1.0)], &config).unwrap()
}

#[test]
fn test_writer_reader_roundtrip() {
  let map = sample_map();
  for format in [Format::Json, Format::JsonPretty] {
    let mut buffer = Vec::new();
    to_writer(&map, &mut buffer, format).unwrap();
    let restored: PhaseMap<i32> = from_reader(buffer.as_slice(), format).unwrap();
    assert_eq!(restored, map, "{format:?} must round-trip");
    assert!(restored.boxes().is_symmetric(), "neighbors rebuilt on load");
  }
}

#[test]
fn test_equal_maps_encode_identically() {
  let map = sample_map();
  let mut first = Vec::new();
  let mut second = Vec::new();
  to_writer(&map, &mut first, Format::Json).unwrap();
  to_writer(&map.clone(), &mut second, Format::Json).unwrap();
  assert_eq!(first, second);
}

#[test]
fn test_save_and_load_file() {
  let path = temp_path("io");
  let map = sample_map();
  save(&map, &path, Format::JsonPretty).unwrap();
  assert!(!temp_path_of(&path).exists(), "temporary file renamed away");

  let loaded: PhaseMap<i32> = load(&path, Format::JsonPretty).unwrap();
  assert_eq!(loaded, map);
  let _ = std::fs::remove_file(&path);
}

#[test]
fn test_load_missing_file() {
  let path = temp_path("missing");
  let err = load::<i32>(&path, Format::Json).unwrap_err();
  assert!(matches!(err, PersistError::Io { .. }), "got {err:?}");
}

#[test]
fn test_load_garbage() {
  let err = from_reader::<i32, _>(&b"{ not json"[..], Format::Json).unwrap_err();
  assert!(matches!(err, PersistError::Encoding(_)), "got {err:?}");
}

fn temp_path_of(path: &Path) -> PathBuf {
  super::temp_path(path)
}
