//! Settings loader and startup checks for the bundle resolver.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Deserializer};
use thiserror::Error;

const DEFAULT_SETTINGS_FILE: &str = "simple_webpack.json";

/// Upper bound, in seconds, for waiting on an in-progress compile.
pub const MAX_ALLOW_COMPILING: u8 = 10;

/// Raw settings as written by the operator, before validation.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct WebpackSettings {
  /// Path of the webpack-bundle-tracker output file.
  pub stats_path: Option<PathBuf>,
  /// Seconds to wait for webpack to finish compiling; `0`, `false` or `null` disables waiting.
  ///
  /// `true` reads as one second.
  #[serde(deserialize_with = "deserialize_allow_compiling")]
  pub allow_compiling: Option<i64>,
  /// Public URL prefix static files are served from.
  pub static_url: Option<String>,
  /// Ordered static source directories the bundles live under.
  pub staticfiles_dirs: Option<Vec<PathBuf>>,
  /// Development mode flag; compile waits only happen when set.
  pub debug: bool,
}

impl WebpackSettings {
  /// Look for the settings file in `dir`, falling back to empty settings when it is absent.
  ///
  /// Empty settings still fail [`WebpackSettings::check`], so a missing file surfaces at
  /// startup rather than on the first resolution.
  pub fn discover(dir: &Path) -> Result<Self> {
    let candidate = dir.join(DEFAULT_SETTINGS_FILE);
    if !candidate.exists() {
      return Ok(Self::default());
    }
    Self::from_path(&candidate)
  }

  /// Read settings from a specific JSON file.
  pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
    let path = path.as_ref();
    let content = fs::read_to_string(path)
      .with_context(|| format!("settings not found at {}", path.display()))?;
    serde_json::from_str(&content)
      .with_context(|| format!("failed to parse settings JSON in {}", path.display()))
  }

  /// Collect every configuration problem instead of stopping at the first one.
  pub fn check(&self) -> Vec<SettingsIssue> {
    let mut issues = Vec::new();

    if self.stats_path.is_none() {
      issues.push(SettingsIssue {
        id: "simple_webpack.E001",
        message: "stats_path is not set.",
        hint: "Add \"stats_path\" with the path of your webpack-bundle-tracker file.",
      });
    }

    if !allow_compiling_in_range(self.allow_compiling) {
      issues.push(SettingsIssue {
        id: "simple_webpack.E002",
        message: "Invalid value for allow_compiling.",
        hint: "allow_compiling is an optional development setting that must be falsy \
               (false, null or 0) or an integer between 1 and 10.",
      });
    }

    if self.static_url.is_none() {
      issues.push(SettingsIssue {
        id: "simple_webpack.E003",
        message: "static_url is not set.",
        hint: "Add \"static_url\" with the path static files are served from, \
               usually \"/static/\".",
      });
    }

    if self.staticfiles_dirs.is_none() {
      issues.push(SettingsIssue {
        id: "simple_webpack.E004",
        message: "staticfiles_dirs is not set.",
        hint: "Add \"staticfiles_dirs\" with the directories holding the static assets \
               served from static_url.",
      });
    }

    issues
  }

  /// Validate the settings and convert them into the resolver configuration.
  pub fn validate(self) -> Result<ResolverSettings, SettingsErrors> {
    let issues = self.check();
    match (self.stats_path, self.static_url, self.staticfiles_dirs) {
      (Some(stats_path), Some(static_url), Some(staticfiles_dirs)) if issues.is_empty() => {
        Ok(ResolverSettings {
          stats_path,
          static_url,
          staticfiles_dirs,
          allow_compiling: self.allow_compiling.unwrap_or(0) as u8,
          debug: self.debug,
        })
      }
      _ => Err(SettingsErrors(issues)),
    }
  }
}

fn deserialize_allow_compiling<'de, D>(
  deserializer: D,
) -> std::result::Result<Option<i64>, D::Error>
where
  D: Deserializer<'de>,
{
  #[derive(Deserialize)]
  #[serde(untagged)]
  enum AllowCompiling {
    Flag(bool),
    Seconds(i64),
  }

  Ok(
    Option::<AllowCompiling>::deserialize(deserializer)?.map(|value| match value {
      AllowCompiling::Flag(flag) => i64::from(flag),
      AllowCompiling::Seconds(seconds) => seconds,
    }),
  )
}

fn allow_compiling_in_range(value: Option<i64>) -> bool {
  match value {
    None => true,
    Some(seconds) => (0..=i64::from(MAX_ALLOW_COMPILING)).contains(&seconds),
  }
}

/// A single startup configuration problem.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{id}: {message}\n\tHINT: {hint}")]
pub struct SettingsIssue {
  /// Stable identifier for the check that failed.
  pub id: &'static str,
  /// What is wrong.
  pub message: &'static str,
  /// How to fix it.
  pub hint: &'static str,
}

/// Every issue reported by [`WebpackSettings::check`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("simple_webpack settings have {} issue(s):\n{}", .0.len(), render_issues(.0))]
pub struct SettingsErrors(pub Vec<SettingsIssue>);

impl SettingsErrors {
  /// Issues in the order they were detected.
  pub fn issues(&self) -> &[SettingsIssue] {
    &self.0
  }
}

fn render_issues(issues: &[SettingsIssue]) -> String {
  issues.iter().map(|issue| format!("{issue}\n")).collect()
}

/// Validated configuration consumed by [`crate::BundleResolver`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolverSettings {
  stats_path: PathBuf,
  static_url: String,
  staticfiles_dirs: Vec<PathBuf>,
  allow_compiling: u8,
  debug: bool,
}

impl ResolverSettings {
  /// Build settings directly, with compile waits disabled.
  pub fn new(
    stats_path: impl Into<PathBuf>,
    static_url: impl Into<String>,
    staticfiles_dirs: impl IntoIterator<Item = impl Into<PathBuf>>,
  ) -> Self {
    Self {
      stats_path: stats_path.into(),
      static_url: static_url.into(),
      staticfiles_dirs: staticfiles_dirs.into_iter().map(Into::into).collect(),
      allow_compiling: 0,
      debug: false,
    }
  }

  /// Seconds to wait for an in-progress compile, capped at [`MAX_ALLOW_COMPILING`].
  pub fn with_allow_compiling(mut self, seconds: u8) -> Self {
    self.allow_compiling = seconds.min(MAX_ALLOW_COMPILING);
    self
  }

  /// Toggle development mode.
  pub fn with_debug(mut self, debug: bool) -> Self {
    self.debug = debug;
    self
  }

  /// Path of the tracker file.
  pub fn stats_path(&self) -> &Path {
    &self.stats_path
  }

  /// File name component of the tracker path, used in diagnostics.
  pub fn stats_file_name(&self) -> String {
    self
      .stats_path
      .file_name()
      .map(|name| name.to_string_lossy().into_owned())
      .unwrap_or_default()
  }

  /// Directory component of the tracker path, used in diagnostics.
  pub fn stats_dir(&self) -> String {
    self
      .stats_path
      .parent()
      .map(|dir| dir.to_string_lossy().into_owned())
      .unwrap_or_default()
  }

  /// Public static URL prefix.
  pub fn static_url(&self) -> &str {
    &self.static_url
  }

  /// Static source directories in lookup order.
  pub fn staticfiles_dirs(&self) -> &[PathBuf] {
    &self.staticfiles_dirs
  }

  /// Compile wait allowance in seconds; zero disables waiting.
  pub fn allow_compiling(&self) -> u8 {
    self.allow_compiling
  }

  /// Whether development mode is enabled.
  pub fn debug(&self) -> bool {
    self.debug
  }
}
