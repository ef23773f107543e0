// adcwatch - Change-or-timeout analog sampling
// Copyright (c) 2025 David Martin Venti
//
// Dual-licensed under AGPL-3.0 and Commercial License.
// See LICENSE file for details.

//! Sample source abstraction
//!
//! This module provides the [`SampleSource`] trait the engine draws readings
//! from, plus in-memory implementations for testing and local runs. Hardware
//! implementations live in [`crate::hardware`].

use std::collections::VecDeque;

use crate::error::HardwareIoError;

/// A multi-channel converter that returns one reading per call
///
/// Reads are synchronous and may block on the bus. A reading is either volts
/// or a raw code, depending on the device; the engine never interprets it.
pub trait SampleSource {
    /// Take one reading from `channel`
    fn read(&mut self, channel: usize) -> Result<f64, HardwareIoError>;

    /// Number of inputs this source exposes
    fn channel_count(&self) -> usize;
}

impl<S: SampleSource + ?Sized> SampleSource for &mut S {
    fn read(&mut self, channel: usize) -> Result<f64, HardwareIoError> {
        (**self).read(channel)
    }

    fn channel_count(&self) -> usize {
        (**self).channel_count()
    }
}

impl<S: SampleSource + ?Sized> SampleSource for Box<S> {
    fn read(&mut self, channel: usize) -> Result<f64, HardwareIoError> {
        (**self).read(channel)
    }

    fn channel_count(&self) -> usize {
        (**self).channel_count()
    }
}

/// In-memory source holding a settable level per channel
///
/// Every read returns the channel's current level. A channel can be armed to
/// fail its next read, which is how bus errors are simulated in tests.
#[derive(Debug, Clone)]
pub struct MemorySource {
    levels: Vec<f64>,
    fail_next: Vec<bool>,
    reads: Vec<u64>,
}

impl MemorySource {
    /// Create a source with the given initial levels, one per channel
    pub fn new(levels: Vec<f64>) -> Self {
        let n = levels.len();
        Self {
            levels,
            fail_next: vec![false; n],
            reads: vec![0; n],
        }
    }

    /// Create a source with `channels` inputs all at `level`
    pub fn uniform(channels: usize, level: f64) -> Self {
        Self::new(vec![level; channels])
    }

    /// Set a channel's level
    pub fn set(&mut self, channel: usize, level: f64) {
        self.levels[channel] = level;
    }

    /// Set all levels at once
    pub fn set_all(&mut self, levels: &[f64]) {
        self.levels.copy_from_slice(levels);
    }

    /// Make the next read of `channel` fail
    pub fn fail_next_read(&mut self, channel: usize) {
        self.fail_next[channel] = true;
    }

    /// Number of successful reads taken from `channel`
    pub fn reads(&self, channel: usize) -> u64 {
        self.reads[channel]
    }
}

impl SampleSource for MemorySource {
    fn read(&mut self, channel: usize) -> Result<f64, HardwareIoError> {
        if channel >= self.levels.len() {
            return Err(HardwareIoError::ChannelOutOfRange {
                channel,
                max: self.levels.len(),
            });
        }
        if std::mem::take(&mut self.fail_next[channel]) {
            return Err(HardwareIoError::NotResponding(format!(
                "injected failure on channel {}",
                channel
            )));
        }
        self.reads[channel] += 1;
        Ok(self.levels[channel])
    }

    fn channel_count(&self) -> usize {
        self.levels.len()
    }
}

/// Source that replays a fixed sequence of readings per channel
#[derive(Debug, Clone)]
pub struct ScriptedSource {
    queues: Vec<VecDeque<f64>>,
    hold_last: bool,
    last: Vec<Option<f64>>,
}

impl ScriptedSource {
    /// Create an empty script for `channels` inputs
    pub fn new(channels: usize) -> Self {
        Self {
            queues: vec![VecDeque::new(); channels],
            hold_last: false,
            last: vec![None; channels],
        }
    }

    /// Keep returning the last reading once a channel's script runs out
    pub fn holding_last(mut self) -> Self {
        self.hold_last = true;
        self
    }

    /// Append readings to a channel's script
    pub fn push(&mut self, channel: usize, readings: impl IntoIterator<Item = f64>) {
        self.queues[channel].extend(readings);
    }

    /// Builder form of [`push`](Self::push)
    pub fn with_readings(mut self, channel: usize, readings: impl IntoIterator<Item = f64>) -> Self {
        self.push(channel, readings);
        self
    }

    /// Readings not yet consumed on `channel`
    pub fn remaining(&self, channel: usize) -> usize {
        self.queues[channel].len()
    }
}

impl SampleSource for ScriptedSource {
    fn read(&mut self, channel: usize) -> Result<f64, HardwareIoError> {
        let max = self.queues.len();
        let queue = self
            .queues
            .get_mut(channel)
            .ok_or(HardwareIoError::ChannelOutOfRange { channel, max })?;

        match queue.pop_front() {
            Some(value) => {
                self.last[channel] = Some(value);
                Ok(value)
            }
            None => match self.last[channel] {
                Some(value) if self.hold_last => Ok(value),
                _ => Err(HardwareIoError::Exhausted { channel }),
            },
        }
    }

    fn channel_count(&self) -> usize {
        self.queues.len()
    }
}
