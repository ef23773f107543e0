//! Error types for adcwatch
//!
//! This module defines all error types used throughout the library.

use thiserror::Error;

/// Result type alias for adcwatch operations
pub type Result<T> = std::result::Result<T, AdcError>;

/// Main error type for adcwatch operations
#[derive(Error, Debug, Clone, PartialEq)]
pub enum AdcError {
    /// A bus transaction against the converter failed
    #[error("Hardware I/O error: {0}")]
    Hardware(#[from] HardwareIoError),

    /// Construction-time parameters were rejected
    #[error("Invalid configuration: {0}")]
    Config(#[from] ConfigError),

    /// Emitter failed to deliver a snapshot
    #[error("Emit error: {0}")]
    Emit(String),
}

impl AdcError {
    /// True if the error came from the sample source
    pub fn is_hardware(&self) -> bool {
        matches!(self, Self::Hardware(_))
    }
}

/// Errors reported by a [`SampleSource`](crate::source::SampleSource)
#[derive(Error, Debug, Clone, PartialEq)]
pub enum HardwareIoError {
    /// Channel index is not wired on this device
    #[error("Channel {channel} out of range (device has {max} channels)")]
    ChannelOutOfRange { channel: usize, max: usize },

    /// Device did not acknowledge (not present, wrong address/chip-select)
    #[error("Device not responding: {0}")]
    NotResponding(String),

    /// Bus transfer failed mid-transaction
    #[error("Bus transfer failed: {0}")]
    Bus(String),

    /// Scripted or simulated source has nothing left to return
    #[error("Source exhausted on channel {channel}")]
    Exhausted { channel: usize },
}

/// Errors raised while validating engine or device configuration
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    /// Channel count outside the device range
    #[error("Channel count {requested} outside 1..={max}")]
    ChannelCount { requested: usize, max: usize },

    /// Oversampling depth must be at least one
    #[error("Sample count must be at least 1")]
    ZeroSamples,

    /// Threshold must be a finite, non-negative number
    #[error("Invalid noise threshold: {0}")]
    NoiseThreshold(f64),

    /// Linear map with an empty input range
    #[error("Degenerate scale: input range {start}..{stop} is empty")]
    DegenerateScale { start: f64, stop: f64 },

    /// I2C address not one of the strap-selectable values
    #[error("Unsupported I2C address 0x{0:02x} (expected 0x48-0x4b)")]
    I2cAddress(u16),

    /// Chip-select GPIO not wired to a hardware CE line
    #[error("Unsupported chip select GPIO {0} (expected 8 or 7)")]
    ChipSelect(u8),

    /// PGA gain not in the converter's table
    #[error("Unsupported gain: {0}")]
    Gain(String),

    /// Thermistor parameters out of range
    #[error("Invalid thermistor parameters: {0}")]
    Thermistor(String),

    /// Raw-code device without a scale to render volts
    #[error("Device '{0}' returns raw codes and needs an output scale")]
    MissingScale(String),

    /// No hardware driver exists for this device profile
    #[error("No driver for device '{0}'")]
    NoDriver(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = AdcError::Config(ConfigError::ChannelCount {
            requested: 9,
            max: 8,
        });
        let msg = format!("{}", err);
        assert!(msg.contains("Channel count 9"));
        assert!(msg.contains("1..=8"));

        let err = AdcError::Config(ConfigError::I2cAddress(0x50));
        assert!(format!("{}", err).contains("0x50"));
    }

    #[test]
    fn test_error_conversion() {
        let hw_err = HardwareIoError::NotResponding("no ack".to_string());
        let adc_err: AdcError = hw_err.into();
        assert!(adc_err.is_hardware());

        let cfg_err: AdcError = ConfigError::ZeroSamples.into();
        assert!(!cfg_err.is_hardware());
    }
}
