// adcwatch - Change-or-timeout analog sampling
// Copyright (c) 2025 David Martin Venti
//
// Dual-licensed under AGPL-3.0 and Commercial License.
// See LICENSE file for details.

//! Snapshot - the full set of channel values returned by an emitting poll.

use log::debug;
use serde::ser::{Serialize, SerializeMap, Serializer};

use crate::config::EngineConfig;
use crate::convert::NTC_PRECISION;
use crate::gate::EmitReason;

/// One channel's entry in a snapshot
#[derive(Debug, Clone, PartialEq)]
pub struct ChannelReading {
    /// Channel index
    pub channel: usize,
    /// Snapshot key (`a0`, `a1`, ...)
    pub key: String,
    /// Averaged reading in source units
    pub average: f64,
    /// Rendered value: scaled, fixed precision; `nan` for a temperature the
    /// divider voltage cannot produce
    pub value: String,
}

/// All configured channels at one emitting poll
///
/// Serializes as a flat object of key to rendered value, in channel order:
/// `{"a0":"1.000","a1":"2.000"}`.
#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot {
    readings: Vec<ChannelReading>,
    reason: EmitReason,
}

impl Snapshot {
    /// Render averages with the engine's key prefix, scale and precision
    pub fn from_averages(averages: &[f64], config: &EngineConfig, reason: EmitReason) -> Self {
        let readings = averages
            .iter()
            .enumerate()
            .map(|(channel, &average)| ChannelReading {
                channel,
                key: config.channel_key(channel),
                average,
                value: render(average, config),
            })
            .collect();

        Self { readings, reason }
    }

    /// Rendered value for a key
    pub fn get(&self, key: &str) -> Option<&str> {
        self.readings
            .iter()
            .find(|r| r.key == key)
            .map(|r| r.value.as_str())
    }

    /// Entry for a channel index
    pub fn channel(&self, channel: usize) -> Option<&ChannelReading> {
        self.readings.get(channel)
    }

    /// Entries in channel order
    pub fn iter(&self) -> impl Iterator<Item = &ChannelReading> {
        self.readings.iter()
    }

    /// Keys in channel order
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.readings.iter().map(|r| r.key.as_str())
    }

    /// Unscaled averages in channel order
    pub fn averages(&self) -> Vec<f64> {
        self.readings.iter().map(|r| r.average).collect()
    }

    /// Number of channels
    pub fn len(&self) -> usize {
        self.readings.len()
    }

    /// True if the snapshot has no channels (never produced by the engine)
    pub fn is_empty(&self) -> bool {
        self.readings.is_empty()
    }

    /// Trigger that produced this snapshot
    pub fn reason(&self) -> EmitReason {
        self.reason
    }

    /// Serialize to a JSON object string
    pub fn to_json(&self) -> String {
        // Map of string to string cannot fail to serialize
        serde_json::to_string(self).unwrap_or_default()
    }
}

fn render(average: f64, config: &EngineConfig) -> String {
    let scaled = match &config.output_scale {
        Some(scale) => scale.apply(average),
        None => average,
    };
    match &config.thermistor {
        Some(ntc) => match ntc.celsius(scaled) {
            Some(celsius) => format!("{:.*}", NTC_PRECISION, celsius),
            None => {
                debug!("{:.3} V outside thermistor divider range", scaled);
                "nan".to_string()
            }
        },
        None => format!("{:.*}", config.precision, scaled),
    }
}

impl Serialize for Snapshot {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.readings.len()))?;
        for reading in &self.readings {
            map.serialize_entry(&reading.key, &reading.value)?;
        }
        map.end()
    }
}
