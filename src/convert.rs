// adcwatch - Change-or-timeout analog sampling
// Copyright (c) 2025 David Martin Venti
//
// Dual-licensed under AGPL-3.0 and Commercial License.
// See LICENSE file for details.

//! Raw-to-unit conversion
//!
//! A [`LinearMap`] maps an input range onto an output range, typically a raw
//! converter code onto volts. An [`Ntc`] turns the voltage across a thermistor
//! divider into degrees Celsius. Both are applied when a snapshot is rendered,
//! never to the values the change gate compares.

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Full-scale code returned by 16-bit raw-code sources
pub const RAW_FULL_SCALE: f64 = 65535.0;

/// Linear mapping `[in_start, in_stop] -> [out_start, out_stop]`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LinearMap {
    /// Input range start
    pub in_start: f64,
    /// Input range stop
    pub in_stop: f64,
    /// Output range start
    pub out_start: f64,
    /// Output range stop
    pub out_stop: f64,
}

impl LinearMap {
    /// Create a new mapping
    pub fn new(in_start: f64, in_stop: f64, out_start: f64, out_stop: f64) -> Self {
        Self {
            in_start,
            in_stop,
            out_start,
            out_stop,
        }
    }

    /// Map a 16-bit raw code onto `[0, vref]` volts
    pub fn raw_to_volts(vref: f64) -> Self {
        Self::new(0.0, RAW_FULL_SCALE, 0.0, vref)
    }

    /// Reject mappings whose input range is empty or not finite
    pub fn validate(&self) -> Result<(), ConfigError> {
        let finite = [self.in_start, self.in_stop, self.out_start, self.out_stop]
            .iter()
            .all(|v| v.is_finite());
        if !finite || self.in_start == self.in_stop {
            return Err(ConfigError::DegenerateScale {
                start: self.in_start,
                stop: self.in_stop,
            });
        }
        Ok(())
    }

    /// Apply the mapping. Values outside the input range extrapolate.
    pub fn apply(&self, value: f64) -> f64 {
        self.out_start
            + (self.out_stop - self.out_start) * ((value - self.in_start) / (self.in_stop - self.in_start))
    }
}

/// Decimal places of rendered thermistor temperatures
pub const NTC_PRECISION: usize = 1;

const KELVIN_OFFSET: f64 = 273.15;

/// NTC thermistor on the low side of a voltage divider, B-parameter model
///
/// The measured voltage is across the thermistor, with `series_ohms` between
/// it and `vcc`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Ntc {
    /// Fixed divider resistor, ohms
    pub series_ohms: f64,
    /// Divider supply voltage
    pub vcc: f64,
    /// B coefficient, kelvin
    pub beta: f64,
    /// Temperature at which the thermistor reads `nominal_ohms`, Celsius
    pub nominal_celsius: f64,
    /// Thermistor resistance at `nominal_celsius`, ohms
    pub nominal_ohms: f64,
}

impl Default for Ntc {
    fn default() -> Self {
        Self {
            series_ohms: 10_000.0,
            vcc: 3.3,
            beta: 3950.0,
            nominal_celsius: 23.0,
            nominal_ohms: 10_000.0,
        }
    }
}

impl Ntc {
    /// Reject parameters that make the model meaningless
    pub fn validate(&self) -> Result<(), ConfigError> {
        let positive = [
            ("series_ohms", self.series_ohms),
            ("vcc", self.vcc),
            ("beta", self.beta),
            ("nominal_ohms", self.nominal_ohms),
        ];
        for (name, value) in positive {
            if !value.is_finite() || value <= 0.0 {
                return Err(ConfigError::Thermistor(format!(
                    "{} must be positive, got {}",
                    name, value
                )));
            }
        }
        if !self.nominal_celsius.is_finite() || self.nominal_celsius <= -KELVIN_OFFSET {
            return Err(ConfigError::Thermistor(format!(
                "nominal temperature {} is below absolute zero",
                self.nominal_celsius
            )));
        }
        Ok(())
    }

    /// Thermistor resistance for a divider voltage
    ///
    /// `None` outside `(0, vcc)`, where the divider equation has no
    /// positive solution.
    pub fn resistance(&self, voltage: f64) -> Option<f64> {
        if !(voltage > 0.0 && voltage < self.vcc) {
            return None;
        }
        Some(voltage * self.series_ohms / (self.vcc - voltage))
    }

    /// Temperature in Celsius for a divider voltage, `None` outside `(0, vcc)`
    pub fn celsius(&self, voltage: f64) -> Option<f64> {
        let ohms = self.resistance(voltage)?;
        let inverse_kelvin = (ohms / self.nominal_ohms).ln() / self.beta
            + 1.0 / (self.nominal_celsius + KELVIN_OFFSET);
        Some(1.0 / inverse_kelvin - KELVIN_OFFSET)
    }
}
