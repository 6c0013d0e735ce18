// file: src/pipeline/mod.rs
// description: progress reporting exports
// reference: pipeline orchestration

mod progress;

pub use progress::{LogProgress, ProgressSink, ProgressTracker};

#[cfg(test)]
pub(crate) use progress::testing;
