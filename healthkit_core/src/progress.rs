//! Progress reporting for batch operations.
//!
//! Loading and series building report `(label, completed, total)` events to
//! an injected sink. Sinks only observe; they never influence results.

/// Receiver of progress events, shared across worker threads
pub trait ProgressSink: Send + Sync {
    fn progress(&self, label: &str, completed: usize, total: usize);
}

/// Sink that drops every event
#[derive(Clone, Copy, Debug, Default)]
pub struct NoProgress;

impl ProgressSink for NoProgress {
    fn progress(&self, _label: &str, _completed: usize, _total: usize) {}
}

/// Sink that logs through `tracing` roughly every tenth of a batch
#[derive(Clone, Copy, Debug)]
pub struct LogProgress {
    steps: usize,
}

impl LogProgress {
    pub fn new(steps: usize) -> Self {
        Self {
            steps: steps.max(1),
        }
    }

    fn should_report(&self, completed: usize, total: usize) -> bool {
        if total == 0 || completed == 0 || completed == total {
            return true;
        }
        let stride = (total / self.steps).max(1);
        completed % stride == 0
    }
}

impl Default for LogProgress {
    fn default() -> Self {
        Self::new(10)
    }
}

impl ProgressSink for LogProgress {
    fn progress(&self, label: &str, completed: usize, total: usize) {
        if !self.should_report(completed, total) {
            return;
        }
        if completed == 0 {
            tracing::info!("{}: submitted {} jobs", label, total);
        } else {
            tracing::info!("{}: {}/{} done", label, completed, total);
        }
    }
}
