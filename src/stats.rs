//! Poll statistics
//!
//! Counters describing how often the engine emitted, why, and how often the
//! source failed.

use crate::gate::EmitReason;

/// Counters kept by a [`SamplingEngine`](crate::engine::SamplingEngine)
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EngineStats {
    /// Completed polls (emitted or suppressed)
    pub polls: u64,
    /// Polls that returned a snapshot
    pub emitted: u64,
    /// Polls that returned no update
    pub suppressed: u64,
    /// Emissions where at least one channel crossed the threshold
    pub change_triggers: u64,
    /// Emissions where the maximum interval elapsed
    pub timeout_triggers: u64,
    /// Polls aborted by a source error
    pub hardware_errors: u64,
}

impl EngineStats {
    /// Create empty counters
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a completed poll
    pub fn record_poll(&mut self, reason: Option<EmitReason>) {
        self.polls += 1;
        match reason {
            Some(reason) => {
                self.emitted += 1;
                if matches!(reason, EmitReason::Changed | EmitReason::ChangedAndTimedOut) {
                    self.change_triggers += 1;
                }
                if matches!(reason, EmitReason::TimedOut | EmitReason::ChangedAndTimedOut) {
                    self.timeout_triggers += 1;
                }
            }
            None => self.suppressed += 1,
        }
    }

    /// Record a poll that failed on the source
    pub fn record_error(&mut self) {
        self.hardware_errors += 1;
    }

    /// Fraction of completed polls that emitted (0.0 - 1.0)
    pub fn emission_rate(&self) -> f64 {
        if self.polls == 0 {
            return 0.0;
        }
        self.emitted as f64 / self.polls as f64
    }

    /// Reset all counters
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Generate a human-readable report
    pub fn report(&self) -> String {
        let mut report = String::new();

        report.push_str("=== adcwatch poll statistics ===\n\n");
        report.push_str(&format!("Polls: {}\n", self.polls));
        report.push_str(&format!(
            "Emitted: {} ({:.1}%)\n",
            self.emitted,
            self.emission_rate() * 100.0
        ));
        report.push_str(&format!("Suppressed: {}\n", self.suppressed));
        report.push_str(&format!("  change triggers: {}\n", self.change_triggers));
        report.push_str(&format!("  timeout triggers: {}\n", self.timeout_triggers));
        report.push_str(&format!("Hardware errors: {}\n", self.hardware_errors));

        report
    }
}
