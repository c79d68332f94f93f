#![doc = include_str!("../README.md")]
#![warn(missing_docs)]

pub mod asset_paths;
pub mod error;
pub mod resolver;
pub mod settings;
pub mod tags;
pub mod tracker;

pub use error::{Result, WebpackError};
pub use resolver::{BundleResolver, ResolvedBundle};
pub use settings::{ResolverSettings, SettingsErrors, SettingsIssue, WebpackSettings};
pub use tracker::{CompileWaiter, SleepCountdown};
