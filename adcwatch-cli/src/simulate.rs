// adcwatch CLI - Change-or-timeout analog sampling
// Copyright (c) 2025 David Martin Venti
//
// Dual-licensed under AGPL-3.0 and Commercial License.
// See LICENSE file for details.

//! Simulated converter for running without hardware.
//!
//! Each channel is a slowly drifting level with gaussian read noise and an
//! occasional step change, which exercises both triggers of the engine.

use adcwatch::{HardwareIoError, SampleSource};
use rand::prelude::*;
use rand::rngs::StdRng;
use rand_distr::Normal;

/// Simulation parameters, in volts
#[derive(Debug, Clone)]
pub struct SimConfig {
    /// Number of channels
    pub channels: usize,
    /// Standard deviation of per-read noise
    pub noise_std: f64,
    /// Level drift per read
    pub drift_per_read: f64,
    /// Probability of a step change on each read
    pub step_probability: f64,
    /// Size of a step change
    pub step_size: f64,
    /// Random seed for reproducibility
    pub seed: Option<u64>,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            channels: 8,
            noise_std: 0.002,
            drift_per_read: 0.000_01,
            step_probability: 0.000_5,
            step_size: 0.25,
            seed: None,
        }
    }
}

/// Random-walk source implementing [`SampleSource`]
#[derive(Debug)]
pub struct SimulatedSource {
    levels: Vec<f64>,
    config: SimConfig,
    noise: Option<Normal<f64>>,
    rng: StdRng,
}

impl SimulatedSource {
    /// Create a simulator; levels start spread across 0.5 - 3.0 V
    pub fn new(config: SimConfig) -> Self {
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        let levels = (0..config.channels)
            .map(|c| 0.5 + 2.5 * c as f64 / config.channels.max(1) as f64)
            .collect();
        // A negative or NaN std gives a noiseless source
        let noise = Normal::new(0.0, config.noise_std).ok();

        Self {
            levels,
            config,
            noise,
            rng,
        }
    }
}

impl SampleSource for SimulatedSource {
    fn read(&mut self, channel: usize) -> Result<f64, HardwareIoError> {
        let max = self.levels.len();
        if channel >= max {
            return Err(HardwareIoError::ChannelOutOfRange { channel, max });
        }

        let step = if self.rng.gen_bool(self.config.step_probability.clamp(0.0, 1.0)) {
            if self.rng.gen_bool(0.5) {
                self.config.step_size
            } else {
                -self.config.step_size
            }
        } else {
            0.0
        };
        let level = &mut self.levels[channel];
        *level = (*level + self.config.drift_per_read + step).clamp(0.0, 3.3);

        let level = *level;
        let noise = match &self.noise {
            Some(dist) => dist.sample(&mut self.rng),
            None => 0.0,
        };
        Ok(level + noise)
    }

    fn channel_count(&self) -> usize {
        self.levels.len()
    }
}
