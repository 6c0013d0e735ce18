// file: src/utils/telemetry.rs
// description: wall-clock timing of index builds and searches, broken down by stage
// reference: tracing-based timing spans

use std::fmt::Write;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// Times one operation and the named stages it passes through.
///
/// Each call to [`stage`](Self::stage) closes the span since the previous mark.
pub struct OperationTimer {
    operation: String,
    start: Instant,
    mark: Instant,
    stages: Vec<(String, Duration)>,
}

impl OperationTimer {
    pub fn new(operation: &str) -> Self {
        debug!("Starting operation: {}", operation);
        let now = Instant::now();
        Self {
            operation: operation.to_string(),
            start: now,
            mark: now,
            stages: Vec::new(),
        }
    }

    pub fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }

    /// Elapsed time in whole milliseconds, as reported in responses.
    pub fn elapsed_ms(&self) -> u64 {
        u64::try_from(self.elapsed().as_millis()).unwrap_or(u64::MAX)
    }

    /// Record the time spent since the last stage (or the start) under `name`.
    pub fn stage(&mut self, name: &str) -> Duration {
        let now = Instant::now();
        let took = now.duration_since(self.mark);
        self.mark = now;

        debug!(
            "[{}] {} took {:.2}s",
            self.operation,
            name,
            took.as_secs_f64()
        );
        self.stages.push((name.to_string(), took));
        took
    }

    pub fn stages(&self) -> &[(String, Duration)] {
        &self.stages
    }

    /// Warn when the most recently closed stage exceeded `threshold`.
    pub fn warn_if_slow(&self, threshold: Duration) {
        if let Some((name, took)) = self.stages.last() {
            if *took > threshold {
                warn!(
                    "Slow stage [{}]: {} took {:.2}s (threshold: {:.2}s)",
                    self.operation,
                    name,
                    took.as_secs_f64(),
                    threshold.as_secs_f64()
                );
            }
        }
    }

    /// `stage 1.23s, other 0.40s` in recording order.
    pub fn summary(&self) -> String {
        let mut out = String::new();
        for (i, (name, took)) in self.stages.iter().enumerate() {
            if i > 0 {
                out.push_str(", ");
            }
            let _ = write!(out, "{} {:.2}s", name, took.as_secs_f64());
        }
        out
    }

    pub fn finish_with_count(self, count: usize) -> Duration {
        let elapsed = self.elapsed();
        info!(
            "Completed {}: {} items in {:.2}s",
            self.operation,
            count,
            elapsed.as_secs_f64()
        );
        elapsed
    }
}
