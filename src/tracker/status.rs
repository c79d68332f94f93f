//! Interpretation of the tracker's `status` protocol.

use std::thread;
use std::time::Duration;

use serde_json::Value;
use tracing::{info, warn};

use crate::error::{Result, WebpackError};
use crate::tracker::stats::TrackerStats;

/// Which read of the tracker file is being interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Attempt {
  /// First read of a resolution call; may wait for an in-progress compile.
  Initial,
  /// Read after a compile wait; never waits again.
  Retry,
}

/// Build status reported by the tracker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BuildStatus {
  /// Bundles are ready.
  Done,
  /// Webpack is still writing bundles.
  Compiling,
  /// Compilation failed.
  Error,
  /// No usable status member.
  Missing,
  /// Anything else, rendered as JSON.
  Unknown(String),
}

impl BuildStatus {
  /// Classify the raw `status` member.
  pub fn from_value(value: Option<&Value>) -> Self {
    match value {
      None | Some(Value::Null) | Some(Value::Bool(false)) => Self::Missing,
      Some(Value::Number(number)) if number.as_f64() == Some(0.0) => Self::Missing,
      Some(Value::Array(items)) if items.is_empty() => Self::Missing,
      Some(Value::Object(members)) if members.is_empty() => Self::Missing,
      Some(Value::String(status)) => match status.as_str() {
        "" => Self::Missing,
        "done" => Self::Done,
        "compiling" => Self::Compiling,
        "error" => Self::Error,
        other => Self::Unknown(other.to_string()),
      },
      Some(other) => Self::Unknown(other.to_string()),
    }
  }
}

/// Strategy used to wait for webpack while it is compiling.
pub trait CompileWaiter {
  /// Block for roughly `seconds` seconds before the tracker file is read again.
  fn wait(&self, seconds: u8);
}

/// Default waiter: sleeps one second at a time and logs a countdown.
#[derive(Debug, Clone, Copy, Default)]
pub struct SleepCountdown;

impl CompileWaiter for SleepCountdown {
  fn wait(&self, seconds: u8) {
    info!("webpack status: compiling");
    for remaining in (1..=seconds).rev() {
      info!(remaining, "waiting for webpack");
      thread::sleep(Duration::from_secs(1));
    }
    info!("retrying");
  }
}

/// When, and for how long, a compiling build may be waited on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CompilePolicy {
  /// Wait allowance in seconds; zero disables waiting.
  pub allow_compiling: u8,
  /// Development mode; waiting never happens outside it.
  pub debug: bool,
}

impl CompilePolicy {
  fn wait_seconds(&self) -> Option<u8> {
    (self.debug && self.allow_compiling > 0).then_some(self.allow_compiling)
  }
}

/// Decides whether the bundle data in a tracker file can be used.
pub struct StatusInterpreter<'a, W: CompileWaiter> {
  file_name: &'a str,
  policy: CompilePolicy,
  waiter: &'a W,
}

impl<'a, W: CompileWaiter> StatusInterpreter<'a, W> {
  /// Interpreter for the tracker file called `file_name`.
  pub fn new(file_name: &'a str, policy: CompilePolicy, waiter: &'a W) -> Self {
    Self {
      file_name,
      policy,
      waiter,
    }
  }

  /// Returns `Ok(true)` when bundles are ready and `Ok(false)` when the caller should read
  /// the tracker file again after a compile wait.
  pub fn interpret(&self, stats: &TrackerStats, attempt: Attempt) -> Result<bool> {
    match BuildStatus::from_value(stats.status.as_ref()) {
      BuildStatus::Done => Ok(true),
      BuildStatus::Missing => Err(WebpackError::MalformedManifest {
        file: self.file_name.to_string(),
        field: "status",
      }),
      BuildStatus::Error => Err(WebpackError::BuildFailed {
        error: stats
          .error
          .clone()
          .unwrap_or_else(|| "UnknownError".to_string()),
        message: stats.message.clone().unwrap_or_default(),
        file: stats.file.clone().unwrap_or_else(|| "Unknown".to_string()),
      }),
      BuildStatus::Compiling => self.compiling(attempt),
      BuildStatus::Unknown(status) => Err(WebpackError::UnknownStatus {
        file: self.file_name.to_string(),
        status,
      }),
    }
  }

  fn compiling(&self, attempt: Attempt) -> Result<bool> {
    if attempt == Attempt::Initial {
      if let Some(seconds) = self.policy.wait_seconds() {
        self.waiter.wait(seconds);
        return Ok(false);
      }
      if self.policy.allow_compiling > 0 {
        warn!(
          file = self.file_name,
          "allow_compiling is set but debug is off; not waiting for webpack"
        );
      }
    }

    Err(WebpackError::CompileTimeout {
      file: self.file_name.to_string(),
    })
  }
}
