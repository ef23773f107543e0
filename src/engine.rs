// adcwatch - Change-or-timeout analog sampling
// Copyright (c) 2025 David Martin Venti
//
// Dual-licensed under AGPL-3.0 and Commercial License.
// See LICENSE file for details.

//! SamplingEngine - main orchestrator.
//!
//! Each [`poll`](SamplingEngine::poll) samples every configured channel,
//! asks the [`ChangeGate`] whether the cycle should emit, advances the
//! per-channel baseline, and returns either a full [`Snapshot`] or `None`.
//!
//! ```rust
//! use std::time::Duration;
//! use adcwatch::{EngineConfig, ManualClock, MemorySource, SamplingEngine};
//!
//! let clock = ManualClock::new();
//! let config = EngineConfig::new(2, 0.05, Duration::from_secs(1));
//! let source = MemorySource::new(vec![1.0, 2.0]);
//! let mut engine = SamplingEngine::with_clock(source, config, clock.clone()).unwrap();
//!
//! // Nothing moved and the interval has not elapsed
//! assert!(engine.poll().unwrap().is_none());
//!
//! // Interval elapsed: every channel is reported
//! clock.advance(Duration::from_millis(1100));
//! let snapshot = engine.poll().unwrap().unwrap();
//! assert_eq!(snapshot.get("a0"), Some("1.000"));
//! assert_eq!(snapshot.get("a1"), Some("2.000"));
//! ```

use std::time::Instant;

use log::{debug, info, trace, warn};

use crate::clock::{Clock, SystemClock};
use crate::config::EngineConfig;
use crate::error::{HardwareIoError, Result};
use crate::gate::ChangeGate;
use crate::sampler::ChannelSampler;
use crate::snapshot::Snapshot;
use crate::source::SampleSource;
use crate::stats::EngineStats;

/// Change-or-timeout sampling engine over one device
///
/// Not reentrant: `poll` takes `&mut self`, and a shared engine must be
/// wrapped in a mutex by the caller.
#[derive(Debug)]
pub struct SamplingEngine<S, C = SystemClock> {
    config: EngineConfig,
    sampler: ChannelSampler<S>,
    gate: ChangeGate,
    clock: C,
    /// Comparison baseline per channel; overwritten every completed poll
    last_emitted: Vec<f64>,
    /// Time of the last emission (or construction)
    time0: Instant,
    stats: EngineStats,
}

impl<S: SampleSource> SamplingEngine<S, SystemClock> {
    /// Create an engine on the system clock
    pub fn new(source: S, config: EngineConfig) -> Result<Self> {
        Self::with_clock(source, config, SystemClock)
    }
}

impl<S: SampleSource, C: Clock> SamplingEngine<S, C> {
    /// Create an engine with an explicit clock
    ///
    /// Validates `config` against the source's channel count, then seeds each
    /// channel's baseline with one raw reading.
    pub fn with_clock(source: S, config: EngineConfig, clock: C) -> Result<Self> {
        config.validate(source.channel_count())?;

        let mut sampler = ChannelSampler::new(source, config.num_samples)?;
        let mut last_emitted = Vec::with_capacity(config.num_channels);
        for channel in 0..config.num_channels {
            last_emitted.push(sampler.read_once(channel)?);
        }

        info!(
            "sampling engine ready: {} channel(s), threshold {}, max interval {:?}, {} samples",
            config.num_channels, config.noise_threshold, config.max_interval, config.num_samples
        );

        let time0 = clock.now();
        Ok(Self {
            gate: ChangeGate::new(config.noise_threshold),
            config,
            sampler,
            clock,
            last_emitted,
            time0,
            stats: EngineStats::new(),
        })
    }

    /// Run one polling cycle
    ///
    /// Returns `Ok(Some(snapshot))` when a channel changed or the interval
    /// elapsed, `Ok(None)` otherwise. A source error aborts the cycle with no
    /// state change.
    pub fn poll(&mut self) -> Result<Option<Snapshot>> {
        let now = self.clock.now();

        let averages = match self.sample_all() {
            Ok(averages) => averages,
            Err(e) => {
                self.stats.record_error();
                warn!("poll aborted: {}", e);
                return Err(e.into());
            }
        };

        let elapsed = now.saturating_duration_since(self.time0);
        let decision =
            self.gate
                .evaluate(&averages, &self.last_emitted, elapsed, self.config.max_interval);

        for &channel in &decision.changed_channels {
            debug!(
                "chan {} changed: {:.3} previously {:.3}",
                channel, averages[channel], self.last_emitted[channel]
            );
        }

        self.last_emitted.copy_from_slice(&averages);

        let reason = decision.reason();
        self.stats.record_poll(reason);

        match reason {
            Some(reason) => {
                self.time0 = self.clock.now();
                debug!("emitting snapshot ({:?}, {:?} since last)", reason, elapsed);
                Ok(Some(Snapshot::from_averages(&averages, &self.config, reason)))
            }
            None => {
                trace!("no update");
                Ok(None)
            }
        }
    }

    fn sample_all(&mut self) -> std::result::Result<Vec<f64>, HardwareIoError> {
        (0..self.config.num_channels)
            .map(|channel| self.sampler.sample(channel))
            .collect()
    }

    /// Current comparison baseline, one entry per channel
    pub fn last_emitted(&self) -> &[f64] {
        &self.last_emitted
    }

    /// Time since the last emission (or construction)
    pub fn since_last_emit(&self) -> std::time::Duration {
        self.clock.now().saturating_duration_since(self.time0)
    }

    /// Engine configuration
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Poll counters
    pub fn stats(&self) -> &EngineStats {
        &self.stats
    }

    /// Underlying source
    pub fn source(&self) -> &S {
        self.sampler.source()
    }

    /// Underlying source, mutably
    pub fn source_mut(&mut self) -> &mut S {
        self.sampler.source_mut()
    }

    /// Tear down and give back the source
    pub fn into_source(self) -> S {
        self.sampler.into_source()
    }
}
