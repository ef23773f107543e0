// adcwatch CLI - Change-or-timeout analog sampling
// Copyright (c) 2025 David Martin Venti
//
// Dual-licensed under AGPL-3.0 and Commercial License.
// See LICENSE file for details.

//! Error types for the CLI

use thiserror::Error;

/// Errors surfaced by the CLI
#[derive(Error, Debug)]
pub enum CliError {
    /// Library error (configuration or hardware)
    #[error(transparent)]
    Adc(#[from] adcwatch::AdcError),

    /// Config file could not be read
    #[error("Failed to read config '{path}': {source}")]
    ReadConfig {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// Config file is not valid JSON for a device
    #[error("Invalid config file: {0}")]
    ParseConfig(#[from] serde_json::Error),

    /// A hardware device was requested from a build without the `rpi` feature
    #[error("Device '{0}' needs a build with the `rpi` feature")]
    HardwareDisabled(String),
}

impl From<adcwatch::ConfigError> for CliError {
    fn from(err: adcwatch::ConfigError) -> Self {
        Self::Adc(err.into())
    }
}

/// Result type alias for CLI operations
pub type Result<T> = std::result::Result<T, CliError>;
