//! Reading the webpack-bundle-tracker file and interpreting its build status.
//!
//! The reader never retries on its own. Retrying a compiling build is decided by the status
//! interpreter, and every retry reads the file again from scratch.

mod stats;
mod status;

pub use stats::{BundleDescriptor, Chunks, TrackerStats, load_stats};
pub use status::{
  Attempt, BuildStatus, CompilePolicy, CompileWaiter, SleepCountdown, StatusInterpreter,
};
