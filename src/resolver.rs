//! Resolve bundles listed in the tracker file to public static URLs.
//!
//! Every call reads the tracker file again; nothing is cached between calls and concurrent
//! callers each wait on a compiling build independently.

use tracing::debug;

use crate::asset_paths::{find_static_file, rewrite_bundle_path};
use crate::error::{Result, WebpackError};
use crate::settings::ResolverSettings;
use crate::tracker::{
  Attempt, BundleDescriptor, CompilePolicy, CompileWaiter, SleepCountdown, StatusInterpreter,
  TrackerStats, load_stats,
};

/// A chunk together with the URL of its first bundle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedBundle {
  /// Chunk name from the tracker file.
  pub chunk: String,
  /// Root-relative URL of the chunk's first bundle.
  pub url: String,
}

/// Resolves chunk names and file names against the tracker file.
#[derive(Debug, Clone)]
pub struct BundleResolver<W: CompileWaiter = SleepCountdown> {
  settings: ResolverSettings,
  waiter: W,
}

impl BundleResolver {
  /// Create a resolver that sleeps while webpack is compiling.
  pub fn new(settings: ResolverSettings) -> Self {
    Self::with_waiter(settings, SleepCountdown)
  }
}

impl<W: CompileWaiter> BundleResolver<W> {
  /// Create a resolver with a custom compile waiter.
  pub fn with_waiter(settings: ResolverSettings, waiter: W) -> Self {
    Self { settings, waiter }
  }

  /// Settings this resolver was built with.
  pub fn settings(&self) -> &ResolverSettings {
    &self.settings
  }

  /// URL of the first bundle emitted for `chunk_name`.
  pub fn resolve_by_chunk(&self, chunk_name: &str) -> Result<String> {
    let stats = self.ready_stats()?;
    let bundles = stats
      .chunks
      .as_ref()
      .and_then(|chunks| chunks.get(chunk_name))
      .ok_or_else(|| WebpackError::ChunkNotFound {
        chunk: chunk_name.to_string(),
        file: self.settings.stats_file_name(),
      })?;

    let url = self.rewrite_first(chunk_name, bundles)?;
    debug!(chunk = chunk_name, url = %url, "resolved bundle by chunk");
    Ok(url)
  }

  /// URL of the first file called `filename` in the configured static directories.
  pub fn resolve_by_filename(&self, filename: &str) -> Result<String> {
    self.ready_stats()?;

    for static_dir in self.settings.staticfiles_dirs() {
      let Some(found) = find_static_file(static_dir, filename) else {
        continue;
      };

      let url = rewrite_bundle_path(
        &found.to_string_lossy(),
        std::slice::from_ref(static_dir),
        self.settings.static_url(),
      )?;
      debug!(filename, url = %url, "resolved bundle by filename");
      return Ok(url);
    }

    Err(WebpackError::FileNotFound {
      filename: filename.to_string(),
    })
  }

  /// URLs of the first bundle of every chunk, in tracker order.
  pub fn resolve_all(&self) -> Result<Vec<String>> {
    Ok(
      self
        .resolve_all_chunks()?
        .into_iter()
        .map(|bundle| bundle.url)
        .collect(),
    )
  }

  /// Like [`BundleResolver::resolve_all`], keeping the chunk name next to each URL.
  ///
  /// Any unusable chunk fails the whole call; a partial list is never returned.
  pub fn resolve_all_chunks(&self) -> Result<Vec<ResolvedBundle>> {
    let stats = self.ready_stats()?;
    let chunks = stats
      .chunks
      .as_ref()
      .ok_or_else(|| WebpackError::MalformedManifest {
        file: self.settings.stats_file_name(),
        field: "chunks",
      })?;

    chunks
      .iter()
      .map(|(chunk, bundles)| {
        Ok(ResolvedBundle {
          chunk: chunk.to_string(),
          url: self.rewrite_first(chunk, bundles)?,
        })
      })
      .collect()
  }

  /// Read the tracker file until its bundles are usable, waiting at most once.
  fn ready_stats(&self) -> Result<TrackerStats> {
    let file_name = self.settings.stats_file_name();
    let policy = CompilePolicy {
      allow_compiling: self.settings.allow_compiling(),
      debug: self.settings.debug(),
    };
    let interpreter = StatusInterpreter::new(&file_name, policy, &self.waiter);

    let stats = load_stats(self.settings.stats_path())?;
    if interpreter.interpret(&stats, Attempt::Initial)? {
      return Ok(stats);
    }

    let stats = load_stats(self.settings.stats_path())?;
    interpreter.interpret(&stats, Attempt::Retry)?;
    Ok(stats)
  }

  fn rewrite_first(&self, chunk: &str, bundles: &[BundleDescriptor]) -> Result<String> {
    let path = bundles
      .first()
      .and_then(|bundle| bundle.path.as_deref())
      .filter(|path| !path.is_empty())
      .ok_or_else(|| WebpackError::MissingPathAttribute {
        chunk: chunk.to_string(),
      })?;

    rewrite_bundle_path(
      path,
      self.settings.staticfiles_dirs(),
      self.settings.static_url(),
    )
  }
}

#[cfg(test)]
mod tests {
  use std::cell::Cell;
  use std::fs;
  use std::path::{Path, PathBuf};

  use super::*;
  use tempfile::{TempDir, tempdir};

  /// Waiter that finishes the "build" by rewriting the tracker file instead of sleeping.
  struct FinishBuildOnWait {
    stats_path: PathBuf,
    finished: String,
    waits: Cell<Vec<u8>>,
  }

  impl CompileWaiter for FinishBuildOnWait {
    fn wait(&self, seconds: u8) {
      let mut waits = self.waits.take();
      waits.push(seconds);
      self.waits.set(waits);
      fs::write(&self.stats_path, &self.finished).unwrap();
    }
  }

  struct Fixture {
    dir: TempDir,
  }

  impl Fixture {
    fn new() -> Self {
      Self { dir: tempdir().unwrap() }
    }

    fn root(&self) -> &Path {
      self.dir.path()
    }

    fn stats_path(&self) -> PathBuf {
      self.root().join("webpack-stats.json")
    }

    fn static_dir(&self) -> PathBuf {
      self.root().join("build/static")
    }

    fn write_stats(&self, json: &str) {
      fs::write(self.stats_path(), json).unwrap();
    }

    fn write_asset(&self, relative: &str) -> String {
      let path = self.static_dir().join(relative);
      fs::create_dir_all(path.parent().unwrap()).unwrap();
      fs::write(&path, "").unwrap();
      path.to_string_lossy().replace('\\', "\\\\")
    }

    fn settings(&self) -> ResolverSettings {
      ResolverSettings::new(self.stats_path(), "/static/", [self.static_dir()])
    }

    fn resolver(&self) -> BundleResolver {
      BundleResolver::new(self.settings())
    }
  }

  fn done_with_chunks(chunks: &str) -> String {
    format!(r#"{{"status": "done", "chunks": {{{chunks}}}}}"#)
  }

  #[test]
  fn resolves_chunk_under_static_dir() {
    let fixture = Fixture::new();
    let main = fixture.write_asset("js/main.js");
    fixture.write_stats(&done_with_chunks(&format!(
      r#""main": [{{"name": "main.js", "path": "{main}"}}]"#
    )));

    let url = fixture.resolver().resolve_by_chunk("main").unwrap();
    assert!(url.starts_with('/'));
    assert_eq!(url, "/static/js/main.js");
  }

  #[test]
  fn unknown_chunk_is_reported_with_file_name() {
    let fixture = Fixture::new();
    fixture.write_stats(&done_with_chunks(r#""main": [{"path": "/build/static/main.js"}]"#));

    let err = fixture.resolver().resolve_by_chunk("admin").unwrap_err();
    match err {
      WebpackError::ChunkNotFound { chunk, file } => {
        assert_eq!(chunk, "admin");
        assert_eq!(file, "webpack-stats.json");
      }
      other => panic!("unexpected error: {other:?}"),
    }
  }

  #[test]
  fn missing_chunks_member_means_chunk_not_found() {
    let fixture = Fixture::new();
    fixture.write_stats(r#"{"status": "done"}"#);

    let err = fixture.resolver().resolve_by_chunk("main").unwrap_err();
    assert!(matches!(err, WebpackError::ChunkNotFound { .. }));
  }

  #[test]
  fn empty_chunk_is_missing_path_attribute() {
    let fixture = Fixture::new();
    fixture.write_stats(&done_with_chunks(r#""main": []"#));

    let err = fixture.resolver().resolve_by_chunk("main").unwrap_err();
    match &err {
      WebpackError::MissingPathAttribute { chunk } => assert_eq!(chunk, "main"),
      other => panic!("unexpected error: {other:?}"),
    }
    assert!(err.to_string().contains("main"));
  }

  #[test]
  fn blank_path_is_missing_path_attribute() {
    let fixture = Fixture::new();
    fixture.write_stats(&done_with_chunks(r#""main": [{"name": "main.js", "path": ""}]"#));

    let err = fixture.resolver().resolve_by_chunk("main").unwrap_err();
    assert!(matches!(err, WebpackError::MissingPathAttribute { .. }));
  }

  #[test]
  fn path_outside_static_dirs_fails_rewrite() {
    let fixture = Fixture::new();
    fixture.write_stats(&done_with_chunks(r#""main": [{"path": "/tmp/elsewhere/main.js"}]"#));

    let err = fixture.resolver().resolve_by_chunk("main").unwrap_err();
    assert!(matches!(err, WebpackError::PathRewriteFailed { .. }));
  }

  #[test]
  fn build_errors_propagate() {
    let fixture = Fixture::new();
    fixture.write_stats(
      r#"{"status": "error", "error": "ModuleNotFoundError", "message": "Can't resolve './app'"}"#,
    );

    let err = fixture.resolver().resolve_by_chunk("main").unwrap_err();
    match err {
      WebpackError::BuildFailed { error, message, .. } => {
        assert_eq!(error, "ModuleNotFoundError");
        assert_eq!(message, "Can't resolve './app'");
      }
      other => panic!("unexpected error: {other:?}"),
    }
  }

  #[test]
  fn missing_status_is_malformed() {
    let fixture = Fixture::new();
    fixture.write_stats(r#"{"chunks": {}}"#);

    let err = fixture.resolver().resolve_all().unwrap_err();
    assert!(matches!(
      err,
      WebpackError::MalformedManifest {
        field: "status",
        ..
      }
    ));
  }

  #[test]
  fn missing_tracker_file_is_reported() {
    let fixture = Fixture::new();
    let err = fixture.resolver().resolve_by_chunk("main").unwrap_err();
    assert!(matches!(err, WebpackError::ManifestNotFound { .. }));
  }

  #[test]
  fn compiling_without_debug_times_out() {
    let fixture = Fixture::new();
    fixture.write_stats(r#"{"status": "compiling"}"#);
    let waiter = FinishBuildOnWait {
      stats_path: fixture.stats_path(),
      finished: done_with_chunks(r#""main": [{"path": "/build/static/main.js"}]"#),
      waits: Cell::new(Vec::new()),
    };
    let resolver =
      BundleResolver::with_waiter(fixture.settings().with_allow_compiling(2), waiter);

    let err = resolver.resolve_by_chunk("main").unwrap_err();
    assert!(matches!(err, WebpackError::CompileTimeout { .. }));
  }

  #[test]
  fn compiling_build_is_retried_once_after_waiting() {
    let fixture = Fixture::new();
    fixture.write_stats(r#"{"status": "compiling"}"#);
    let waiter = FinishBuildOnWait {
      stats_path: fixture.stats_path(),
      finished: done_with_chunks(r#""main": [{"path": "/build/static/main.js"}]"#),
      waits: Cell::new(Vec::new()),
    };
    let settings =
      ResolverSettings::new(fixture.stats_path(), "/static/", ["/build/static"])
        .with_allow_compiling(2)
        .with_debug(true);
    let resolver = BundleResolver::with_waiter(settings, waiter);

    assert_eq!(resolver.resolve_by_chunk("main").unwrap(), "/static/main.js");
    assert_eq!(resolver.waiter.waits.take(), vec![2]);
  }

  #[test]
  fn still_compiling_after_wait_times_out() {
    let fixture = Fixture::new();
    fixture.write_stats(r#"{"status": "compiling"}"#);
    let waiter = FinishBuildOnWait {
      stats_path: fixture.stats_path(),
      finished: r#"{"status": "compiling"}"#.to_string(),
      waits: Cell::new(Vec::new()),
    };
    let settings = fixture.settings().with_allow_compiling(1).with_debug(true);
    let resolver = BundleResolver::with_waiter(settings, waiter);

    let err = resolver.resolve_all().unwrap_err();
    assert!(matches!(err, WebpackError::CompileTimeout { .. }));
    assert_eq!(resolver.waiter.waits.take(), vec![1]);
  }

  #[test]
  fn resolves_by_filename_across_static_dirs() {
    let fixture = Fixture::new();
    fixture.write_stats(r#"{"status": "done", "chunks": {}}"#);
    fixture.write_asset("img/logo.svg");
    let extra = fixture.root().join("assets");
    fs::create_dir_all(extra.join("fonts")).unwrap();
    fs::write(extra.join("fonts/inter.woff2"), "").unwrap();

    let settings = ResolverSettings::new(
      fixture.stats_path(),
      "/static/",
      [fixture.root().join("missing"), fixture.static_dir(), extra],
    );
    let resolver = BundleResolver::new(settings);

    assert_eq!(resolver.resolve_by_filename("logo.svg").unwrap(), "/static/img/logo.svg");
    assert_eq!(
      resolver.resolve_by_filename("inter.woff2").unwrap(),
      "/static/fonts/inter.woff2"
    );
  }

  #[test]
  fn unknown_filename_is_file_not_found() {
    let fixture = Fixture::new();
    fixture.write_stats(r#"{"status": "done", "chunks": {}}"#);
    fixture.write_asset("js/main.js");

    let err = fixture.resolver().resolve_by_filename("missing.js").unwrap_err();
    match err {
      WebpackError::FileNotFound { filename } => assert_eq!(filename, "missing.js"),
      other => panic!("unexpected error: {other:?}"),
    }
  }

  #[test]
  fn filename_lookup_still_checks_build_status() {
    let fixture = Fixture::new();
    fixture.write_stats(r#"{"status": "error"}"#);
    fixture.write_asset("js/main.js");

    let err = fixture.resolver().resolve_by_filename("main.js").unwrap_err();
    assert!(matches!(err, WebpackError::BuildFailed { .. }));
  }

  #[test]
  fn resolves_all_bundles_in_tracker_order() {
    let fixture = Fixture::new();
    fixture.write_stats(&done_with_chunks(
      r#""vendor": [{"path": "/build/static/vendor.js"}],
         "main": [{"path": "/build/static/main.js"}, {"path": "/build/static/main.css"}],
         "styles": [{"path": "/build/static/css/styles.css"}]"#,
    ));
    let settings = ResolverSettings::new(fixture.stats_path(), "/static/", ["/build/static"]);
    let resolver = BundleResolver::new(settings);

    assert_eq!(resolver.resolve_all().unwrap(), vec![
      "/static/vendor.js".to_string(),
      "/static/main.js".to_string(),
      "/static/css/styles.css".to_string(),
    ]);

    let chunks: Vec<String> = resolver
      .resolve_all_chunks()
      .unwrap()
      .into_iter()
      .map(|bundle| bundle.chunk)
      .collect();
    assert_eq!(chunks, vec!["vendor", "main", "styles"]);
  }

  #[test]
  fn resolve_all_aborts_on_empty_chunk() {
    let fixture = Fixture::new();
    fixture.write_stats(&done_with_chunks(
      r#""main": [{"path": "/build/static/main.js"}], "broken": []"#,
    ));
    let settings = ResolverSettings::new(fixture.stats_path(), "/static/", ["/build/static"]);

    let err = BundleResolver::new(settings).resolve_all().unwrap_err();
    match err {
      WebpackError::MissingPathAttribute { chunk } => assert_eq!(chunk, "broken"),
      other => panic!("unexpected error: {other:?}"),
    }
  }

  #[test]
  fn resolve_all_requires_chunks_member() {
    let fixture = Fixture::new();
    fixture.write_stats(r#"{"status": "done"}"#);

    let err = fixture.resolver().resolve_all().unwrap_err();
    assert!(matches!(
      err,
      WebpackError::MalformedManifest {
        field: "chunks",
        ..
      }
    ));
  }
}
