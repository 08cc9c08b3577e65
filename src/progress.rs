//! Progress reporting for the statistics pass. Purely observational.

use tracing::info;

/// Receives one call per flight processed by the statistics pass.
pub trait Progress {
    fn on_flight(&mut self, done: usize, total: usize);
}

/// Discards all progress updates.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoProgress;

impl Progress for NoProgress {
    fn on_flight(&mut self, _done: usize, _total: usize) {}
}

/// Logs the completed percentage every `every` flights.
#[derive(Debug, Clone, Copy)]
pub struct LogProgress {
    every: usize,
}

impl LogProgress {
    pub const DEFAULT_EVERY: usize = 10_000;

    pub fn new(every: usize) -> Self {
        Self {
            every: every.max(1),
        }
    }
}

impl Default for LogProgress {
    fn default() -> Self {
        Self::new(Self::DEFAULT_EVERY)
    }
}

impl Progress for LogProgress {
    fn on_flight(&mut self, done: usize, total: usize) {
        if done % self.every == 0 {
            info!(percent = percent(done, total), done, total, "Aggregation progress");
        }
    }
}

/// `done / total` as a percentage rounded to one decimal.
pub fn percent(done: usize, total: usize) -> f64 {
    if total == 0 {
        0.0
    } else {
        (done as f64 / total as f64 * 1000.0).round() / 10.0
    }
}
