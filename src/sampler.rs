// adcwatch - Change-or-timeout analog sampling
// Copyright (c) 2025 David Martin Venti
//
// Dual-licensed under AGPL-3.0 and Commercial License.
// See LICENSE file for details.

//! Per-channel oversampling
//!
//! [`ChannelSampler`] draws a fixed number of readings from a channel, one
//! after the other, and returns their arithmetic mean. There is no outlier
//! rejection; the goal is noise reduction, not robust statistics.

use crate::error::{ConfigError, HardwareIoError};
use crate::source::SampleSource;

/// Oversampling front end over a [`SampleSource`]
#[derive(Debug)]
pub struct ChannelSampler<S> {
    source: S,
    num_samples: usize,
}

impl<S: SampleSource> ChannelSampler<S> {
    /// Create a sampler averaging `num_samples` readings per call
    ///
    /// Fails with [`ConfigError::ZeroSamples`] when `num_samples` is zero.
    pub fn new(source: S, num_samples: usize) -> Result<Self, ConfigError> {
        if num_samples == 0 {
            return Err(ConfigError::ZeroSamples);
        }
        Ok(Self {
            source,
            num_samples,
        })
    }

    /// Average of `num_samples` consecutive readings of `channel`
    pub fn sample(&mut self, channel: usize) -> Result<f64, HardwareIoError> {
        let mut sum = 0.0;
        for _ in 0..self.num_samples {
            sum += self.source.read(channel)?;
        }
        Ok(sum / self.num_samples as f64)
    }

    /// Single un-averaged reading, used to seed baselines
    pub fn read_once(&mut self, channel: usize) -> Result<f64, HardwareIoError> {
        self.source.read(channel)
    }

    /// Oversampling depth
    pub fn num_samples(&self) -> usize {
        self.num_samples
    }

    /// Underlying source
    pub fn source(&self) -> &S {
        &self.source
    }

    /// Underlying source, mutably
    pub fn source_mut(&mut self) -> &mut S {
        &mut self.source
    }

    /// Give back the source
    pub fn into_source(self) -> S {
        self.source
    }
}
