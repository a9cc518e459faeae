//! Normalized job progress.

use std::time::{Duration, Instant};

use crate::foundation::core::TrimRange;

/// Minimum spacing between two progress reports.
pub const DEFAULT_PROGRESS_INTERVAL: Duration = Duration::from_millis(200);

/// Fraction of the trimmed window covered at source timestamp `position_us`.
///
/// The window defaults to `[0, duration_us]`. A window of zero length counts as complete.
pub fn estimate(position_us: i64, trim: TrimRange, duration_us: i64) -> f64 {
    let start = trim.start_us.unwrap_or(0);
    let end = trim.end_us.unwrap_or(duration_us);
    if end <= start {
        return 1.0;
    }
    ((position_us - start) as f64 / (end - start) as f64).clamp(0.0, 1.0)
}

/// Turns raw progress samples into the reports a job publishes.
///
/// Reports never decrease, are spaced at least `interval` apart and end with exactly one `1.0`.
#[derive(Debug)]
pub struct ProgressTracker {
    interval: Duration,
    reported: f64,
    last_report: Option<Instant>,
    finished: bool,
}

impl ProgressTracker {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            reported: 0.0,
            last_report: None,
            finished: false,
        }
    }

    pub fn reported(&self) -> f64 {
        self.reported
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }

    pub fn update(&mut self, progress: f64) -> Option<f64> {
        self.update_at(progress, Instant::now())
    }

    /// Feed a sample observed at `now`; returns the value to report, if any.
    ///
    /// Samples at or above 1.0 are held back for [`ProgressTracker::finish`].
    pub fn update_at(&mut self, progress: f64, now: Instant) -> Option<f64> {
        if self.finished || !progress.is_finite() {
            return None;
        }
        let progress = progress.clamp(0.0, 1.0);
        if progress >= 1.0 || (progress <= self.reported && self.last_report.is_some()) {
            return None;
        }
        if let Some(last) = self.last_report
            && now.saturating_duration_since(last) < self.interval
        {
            return None;
        }
        self.reported = progress.max(self.reported);
        self.last_report = Some(now);
        Some(self.reported)
    }

    /// Terminal report; `Some(1.0)` the first time, `None` afterwards.
    pub fn finish(&mut self) -> Option<f64> {
        if self.finished {
            return None;
        }
        self.finished = true;
        self.reported = 1.0;
        Some(1.0)
    }
}

impl Default for ProgressTracker {
    fn default() -> Self {
        Self::new(DEFAULT_PROGRESS_INTERVAL)
    }
}

#[cfg(test)]
#[path = "../tests/unit/progress.rs"]
mod tests;
