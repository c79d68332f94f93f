//! Loading the webpack-bundle-tracker output file.

use std::fs;
use std::io::ErrorKind;
use std::path::Path;

use indexmap::IndexMap;
use serde::Deserialize;
use serde_json::Value;
use tracing::debug;

use crate::error::{Result, WebpackError};

/// Deserialised contents of the tracker file.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TrackerStats {
  /// Build status as written by the tracker; kept raw so odd values can be reported.
  #[serde(default)]
  pub status: Option<Value>,
  /// Chunk name to bundle list, in the order webpack emitted them.
  #[serde(default)]
  pub chunks: Option<Chunks>,
  /// Source file that failed to compile, present on `error`.
  #[serde(default)]
  pub file: Option<String>,
  /// Error name, present on `error`.
  #[serde(default)]
  pub error: Option<String>,
  /// Error message, present on `error`.
  #[serde(default)]
  pub message: Option<String>,
}

/// A single emitted bundle file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct BundleDescriptor {
  /// Emitted file name.
  #[serde(default)]
  pub name: Option<String>,
  /// Absolute on-disk path of the emitted file.
  #[serde(default)]
  pub path: Option<String>,
  /// Public path webpack would have served the file from.
  #[serde(default, rename = "publicPath")]
  pub public_path: Option<String>,
}

/// Ordered chunk table.
///
/// Script tags must follow the order webpack wrote, so chunks keep their insertion order.
/// A repeated key replaces the earlier value in place.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(transparent)]
pub struct Chunks(IndexMap<String, Vec<BundleDescriptor>>);

impl Chunks {
  /// Bundles emitted for `name`.
  pub fn get(&self, name: &str) -> Option<&[BundleDescriptor]> {
    self.0.get(name).map(Vec::as_slice)
  }

  /// Iterate chunks in manifest order.
  pub fn iter(&self) -> impl Iterator<Item = (&str, &[BundleDescriptor])> {
    self
      .0
      .iter()
      .map(|(chunk, bundles)| (chunk.as_str(), bundles.as_slice()))
  }

  /// Number of chunks.
  pub fn len(&self) -> usize {
    self.0.len()
  }

  /// Whether the table has no chunks.
  pub fn is_empty(&self) -> bool {
    self.0.is_empty()
  }
}

/// Read and parse the tracker file at `path`.
pub fn load_stats(path: &Path) -> Result<TrackerStats> {
  let file = file_name(path);
  let content = match fs::read(path) {
    Ok(content) => content,
    Err(err) if err.kind() == ErrorKind::NotFound => {
      return Err(WebpackError::ManifestNotFound {
        file,
        dir: path
          .parent()
          .map(|dir| dir.to_string_lossy().into_owned())
          .unwrap_or_default(),
      });
    }
    Err(source) => {
      return Err(WebpackError::ManifestRead {
        path: path.to_path_buf(),
        source,
      });
    }
  };

  let stats = serde_json::from_slice(&content)
    .map_err(|source| WebpackError::ManifestParse { file, source })?;
  debug!(path = %path.display(), "loaded webpack stats");
  Ok(stats)
}

fn file_name(path: &Path) -> String {
  path
    .file_name()
    .map(|name| name.to_string_lossy().into_owned())
    .unwrap_or_default()
}
