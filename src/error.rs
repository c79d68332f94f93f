//! Error taxonomy shared by the tracker reader, status checks and path resolution.

use std::path::PathBuf;

use thiserror::Error;

/// Result alias used by every resolution entry point.
pub type Result<T, E = WebpackError> = std::result::Result<T, E>;

/// Everything that can stop a bundle from resolving to a URL.
#[derive(Debug, Error)]
pub enum WebpackError {
  /// The tracker file does not exist.
  #[error(
    "the file \"{file}\" does not exist in the directory \"{dir}\"; webpack may not have \
     run yet, or webpack-bundle-tracker is not set up in the frontend toolchain"
  )]
  ManifestNotFound {
    /// File name of the tracker file.
    file: String,
    /// Directory the tracker file was expected in.
    dir: String,
  },

  /// The tracker file exists but could not be read.
  #[error("failed to read {}: {source}", .path.display())]
  ManifestRead {
    /// Path of the tracker file.
    path: PathBuf,
    /// Underlying I/O error.
    source: std::io::Error,
  },

  /// The tracker file is not valid JSON.
  #[error(
    "the file \"{file}\" is not a valid tracker file ({source}); check that webpack and \
     webpack-bundle-tracker run without error"
  )]
  ManifestParse {
    /// File name of the tracker file.
    file: String,
    /// Parser diagnostic, including line and column.
    source: serde_json::Error,
  },

  /// A required top-level member is missing.
  #[error("\"{file}\" is missing top-level member \"{field}\"")]
  MalformedManifest {
    /// File name of the tracker file.
    file: String,
    /// Name of the missing member.
    field: &'static str,
  },

  /// The tracker reported a status this crate does not understand.
  #[error("unknown webpack-bundle-tracker status in \"{file}\": {status}")]
  UnknownStatus {
    /// File name of the tracker file.
    file: String,
    /// The unexpected status value, rendered as JSON.
    status: String,
  },

  /// Webpack reported a failed compilation.
  #[error("{error}: {message}\nFile: {file}")]
  BuildFailed {
    /// Error name reported by webpack.
    error: String,
    /// Error message reported by webpack.
    message: String,
    /// Source file the error was raised for.
    file: String,
  },

  /// Webpack was still compiling after the allowed wait.
  #[error("webpack is still compiling \"{file}\"; timed out waiting for the build to finish")]
  CompileTimeout {
    /// File name of the tracker file.
    file: String,
  },

  /// The requested chunk is not listed in the tracker file.
  #[error("chunk \"{chunk}\" not found in {file}")]
  ChunkNotFound {
    /// Requested chunk name.
    chunk: String,
    /// File name of the tracker file.
    file: String,
  },

  /// No static directory contains the requested file.
  #[error(
    "the file \"{filename}\" does not exist in any configured static directory or its \
     subdirectories"
  )]
  FileNotFound {
    /// Requested file name.
    filename: String,
  },

  /// A chunk has no bundle, or its first bundle has no path.
  #[error("missing \"path\" attribute for bundle {chunk}")]
  MissingPathAttribute {
    /// Chunk whose bundle is unusable.
    chunk: String,
  },

  /// A bundle path lies outside every configured static directory.
  #[error("bundle path \"{path}\" is not inside any configured static directory")]
  PathRewriteFailed {
    /// The normalised bundle path.
    path: String,
  },
}
