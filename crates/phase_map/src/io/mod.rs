//! Persistence of [`PhaseMap`] results.
//!
//! Only limits, the point labels and the box frontier (corner, size, phase)
//! are stored. Box membership and the neighbor graph are derived data and are
//! rebuilt on load.
//!
//! # Module Structure
//!
//! - [`encoding`]: tagged document types and one encode/decode pair per entity

pub mod encoding;

use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::PersistError;
use crate::result::PhaseMap;
use crate::Label;

/// Byte encoding of a saved result.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Format {
  /// Compact JSON.
  #[default]
  Json,
  /// Indented JSON, for inspection.
  JsonPretty,
}

/// Encode a result into a writer.
pub fn to_writer<L: Label, W: Write>(map: &PhaseMap<L>, writer: W, format: Format) -> Result<(), PersistError> {
  let document = encoding::encode_result(map);
  match format {
    Format::Json => serde_json::to_writer(writer, &document)?,
    Format::JsonPretty => serde_json::to_writer_pretty(writer, &document)?,
  }
  Ok(())
}

/// Decode a result from a reader.
pub fn from_reader<L: Label, R: Read>(reader: R, format: Format) -> Result<PhaseMap<L>, PersistError> {
  let document = match format {
    Format::Json | Format::JsonPretty => serde_json::from_reader(reader)?,
  };
  encoding::decode_result(document)
}

/// Save a result to `path`.
///
/// The file is written next to `path` first and then renamed into place, so
/// readers never observe a partially written result.
#[tracing::instrument(skip_all, name = "io::save", fields(path = %path.display()))]
pub fn save<L: Label>(map: &PhaseMap<L>, path: &Path, format: Format) -> Result<(), PersistError> {
  let temp = temp_path(path);
  let io_error = |source| PersistError::Io {
    path: temp.clone(),
    source,
  };

  let file = File::create(&temp).map_err(io_error)?;
  let mut writer = BufWriter::new(file);
  to_writer(map, &mut writer, format)?;
  writer.flush().map_err(io_error)?;
  drop(writer);

  fs::rename(&temp, path).map_err(|source| PersistError::Io {
    path: path.to_path_buf(),
    source,
  })?;
  tracing::debug!(boxes = map.num_boxes(), points = map.num_points(), "saved result");
  Ok(())
}

/// Load a result from `path`.
#[tracing::instrument(skip_all, name = "io::load", fields(path = %path.display()))]
pub fn load<L: Label>(path: &Path, format: Format) -> Result<PhaseMap<L>, PersistError> {
  let file = File::open(path).map_err(|source| PersistError::Io {
    path: path.to_path_buf(),
    source,
  })?;
  let map = from_reader(BufReader::new(file), format)?;
  tracing::debug!(boxes = map.num_boxes(), points = map.num_points(), "loaded result");
  Ok(map)
}

/// Sibling path used while writing: `<file name>.tmp`.
fn temp_path(path: &Path) -> PathBuf {
  let mut name = path.file_name().map(|n| n.to_os_string()).unwrap_or_default();
  name.push(".tmp");
  path.with_file_name(name)
}

#[cfg(test)]
#[path = "io_test.rs"]
mod io_test;
