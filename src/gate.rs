// adcwatch - Change-or-timeout analog sampling
// Copyright (c) 2025 David Martin Venti
//
// Dual-licensed under AGPL-3.0 and Commercial License.
// See LICENSE file for details.

//! Dual-trigger emission gate
//!
//! A poll cycle emits when any channel moved by more than the noise
//! threshold since the previous cycle, or when more than the maximum interval
//! has passed since the last emission. Both comparisons are strict.

use std::time::Duration;

/// Why a cycle emitted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EmitReason {
    /// At least one channel crossed the noise threshold
    Changed,
    /// The maximum interval elapsed
    TimedOut,
    /// Both triggers fired in the same cycle
    ChangedAndTimedOut,
}

/// Outcome of evaluating one cycle
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct GateDecision {
    /// Channels whose delta exceeded the threshold
    pub changed_channels: Vec<usize>,
    /// Elapsed time exceeded the maximum interval
    pub timed_out: bool,
}

impl GateDecision {
    /// True if the cycle should emit
    pub fn should_emit(&self) -> bool {
        self.timed_out || !self.changed_channels.is_empty()
    }

    /// True if any channel changed
    pub fn changed(&self) -> bool {
        !self.changed_channels.is_empty()
    }

    /// Trigger that fired, if any
    pub fn reason(&self) -> Option<EmitReason> {
        match (self.changed(), self.timed_out) {
            (true, true) => Some(EmitReason::ChangedAndTimedOut),
            (true, false) => Some(EmitReason::Changed),
            (false, true) => Some(EmitReason::TimedOut),
            (false, false) => None,
        }
    }
}

/// Change-or-timeout decision function
///
/// Holds only the noise threshold; all state is passed in by the caller.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ChangeGate {
    noise_threshold: f64,
}

impl ChangeGate {
    /// Create a gate with the given threshold (source units)
    pub fn new(noise_threshold: f64) -> Self {
        Self { noise_threshold }
    }

    /// The threshold this gate compares against
    pub fn noise_threshold(&self) -> f64 {
        self.noise_threshold
    }

    /// True if `current` differs from `previous` by more than the threshold
    pub fn channel_changed(&self, current: f64, previous: f64) -> bool {
        (current - previous).abs() > self.noise_threshold
    }

    /// Evaluate both triggers over the full channel set
    ///
    /// `current` and `last_emitted` are compared pairwise; extra entries in
    /// the longer slice are ignored.
    pub fn evaluate(
        &self,
        current: &[f64],
        last_emitted: &[f64],
        elapsed: Duration,
        max_interval: Duration,
    ) -> GateDecision {
        let changed_channels = current
            .iter()
            .zip(last_emitted)
            .enumerate()
            .filter(|(_, (cur, prev))| self.channel_changed(**cur, **prev))
            .map(|(channel, _)| channel)
            .collect();

        GateDecision {
            changed_channels,
            timed_out: elapsed > max_interval,
        }
    }

    /// Boolean form of [`evaluate`](Self::evaluate)
    pub fn should_emit(
        &self,
        current: &[f64],
        last_emitted: &[f64],
        elapsed: Duration,
        max_interval: Duration,
    ) -> bool {
        self.evaluate(current, last_emitted, elapsed, max_interval)
            .should_emit()
    }
}
