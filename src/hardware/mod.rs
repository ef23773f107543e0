// adcwatch - Change-or-timeout analog sampling
// Copyright (c) 2025 David Martin Venti
//
// Dual-licensed under AGPL-3.0 and Commercial License.
// See LICENSE file for details.

//! Hardware sample sources
//!
//! Register-level encoding is always compiled; the Raspberry Pi drivers that
//! open real buses need the `rpi` feature.

pub mod ads1115;
pub mod mcp3008;

#[cfg(feature = "rpi")]
pub use ads1115::Ads1115Source;
#[cfg(feature = "rpi")]
pub use mcp3008::Mcp3008Source;

/// Open the converter described by `profile`
///
/// Generic profiles have no driver and are rejected with a config error.
#[cfg(feature = "rpi")]
pub fn open(
    profile: &crate::config::DeviceProfile,
) -> crate::error::Result<Box<dyn crate::source::SampleSource>> {
    use crate::config::DeviceProfile;
    use crate::error::ConfigError;

    profile.validate()?;
    match profile {
        DeviceProfile::Ads1115 { gain, address } => {
            Ok(Box::new(Ads1115Source::new(*gain, *address)?))
        }
        DeviceProfile::Mcp3008 { chip_select, .. } => {
            Ok(Box::new(Mcp3008Source::new(*chip_select)?))
        }
        DeviceProfile::Generic { .. } => {
            Err(ConfigError::NoDriver(profile.name().to_string()).into())
        }
    }
}
