//! # adcwatch - Change-or-timeout analog sampling
//!
//! A sampling engine for multi-channel ADCs that only reports when there is
//! something to report.
//!
//! ## Key Features
//!
//! - **Oversampling**: each channel reading is the mean of N raw readings
//! - **Noise gate**: a cycle emits when any channel moved by more than the
//!   noise threshold since the previous cycle
//! - **Drift catch-up**: a cycle also emits when the maximum interval has
//!   passed since the last emission
//! - **All-or-nothing snapshots**: an emission always carries every channel
//!
//! ## Quick Start
//!
//! ```rust
//! use std::time::Duration;
//! use adcwatch::{EngineConfig, MemorySource, SamplingEngine};
//!
//! let config = EngineConfig::new(2, 0.05, Duration::from_secs(1));
//! let mut engine = SamplingEngine::new(MemorySource::new(vec![1.0, 2.0]), config).unwrap();
//!
//! // Channel 1 jumps by more than the threshold
//! engine.source_mut().set(1, 2.5);
//! let snapshot = engine.poll().unwrap().expect("change should emit");
//! assert_eq!(snapshot.to_json(), r#"{"a0":"1.000","a1":"2.500"}"#);
//!
//! // Nothing moved since: no update
//! assert!(engine.poll().unwrap().is_none());
//! ```
//!
//! ## Modules
//!
//! - [`source`]: the [`SampleSource`] trait and in-memory sources
//! - [`sampler`]: per-channel oversampling
//! - [`gate`]: the change-or-timeout decision
//! - [`engine`]: the polling state machine
//! - [`snapshot`]: emitted channel values
//! - [`emit`]: snapshot sinks
//! - [`hardware`]: ADS1115 (I2C) and MCP3008 (SPI) drivers

// Modules
pub mod clock;
pub mod config;
pub mod convert;
pub mod emit;
pub mod engine;
pub mod error;
pub mod gate;
pub mod hardware;
pub mod sampler;
pub mod snapshot;
pub mod source;
pub mod stats;

// Re-exports for convenient access
pub use clock::{Clock, ManualClock, SystemClock};
pub use config::{DeviceConfig, DeviceProfile, EngineConfig, Gain, ThresholdUnit};
pub use convert::{LinearMap, Ntc};
pub use emit::{Emitter, JsonLinesEmitter, MemoryEmitter};
pub use engine::SamplingEngine;
pub use error::{AdcError, ConfigError, HardwareIoError, Result};
pub use gate::{ChangeGate, EmitReason, GateDecision};
pub use sampler::ChannelSampler;
pub use snapshot::{ChannelReading, Snapshot};
pub use source::{MemorySource, SampleSource, ScriptedSource};
pub use stats::EngineStats;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
