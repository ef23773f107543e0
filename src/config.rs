// adcwatch - Change-or-timeout analog sampling
// Copyright (c) 2025 David Martin Venti
//
// Dual-licensed under AGPL-3.0 and Commercial License.
// See LICENSE file for details.

//! Configuration types for adcwatch
//!
//! [`EngineConfig`] holds the parameters the sampling engine consumes.
//! [`DeviceProfile`] holds the parameters that belong to the sample source
//! (gain, address, chip select, reference voltage) and knows which unit the
//! noise threshold is expressed in for that device family.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::convert::{LinearMap, Ntc};
use crate::error::ConfigError;

/// Default oversampling depth
pub const DEFAULT_NUM_SAMPLES: usize = 10;

/// Default number of decimal places in snapshot values
pub const DEFAULT_PRECISION: usize = 3;

/// Channels on an ADS1115
pub const ADS1115_CHANNELS: usize = 4;

/// Channels on an MCP3008
pub const MCP3008_CHANNELS: usize = 8;

/// Engine-level configuration, immutable once an engine is built
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Number of channels sampled per poll, starting at channel 0
    pub num_channels: usize,

    /// Minimum delta (exclusive) that counts as a change, in source units
    pub noise_threshold: f64,

    /// Maximum time between emissions
    #[serde(rename = "max_interval_ms", with = "duration_ms")]
    pub max_interval: Duration,

    /// Readings averaged per channel per poll
    pub num_samples: usize,

    /// Decimal places in snapshot values
    pub precision: usize,

    /// Mapping applied to averages when rendering a snapshot
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output_scale: Option<LinearMap>,

    /// Prefix of snapshot keys (`a` gives `a0`, `a1`, ...)
    pub key_prefix: String,

    /// Render scaled values as thermistor temperatures
    #[serde(skip_serializing_if = "Option::is_none")]
    pub thermistor: Option<Ntc>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            num_channels: 1,
            noise_threshold: 0.001,
            max_interval: Duration::from_secs(1),
            num_samples: DEFAULT_NUM_SAMPLES,
            precision: DEFAULT_PRECISION,
            output_scale: None,
            key_prefix: "a".to_string(),
            thermistor: None,
        }
    }
}

impl EngineConfig {
    /// Create a configuration with the three required parameters
    pub fn new(num_channels: usize, noise_threshold: f64, max_interval: Duration) -> Self {
        Self {
            num_channels,
            noise_threshold,
            max_interval,
            ..Default::default()
        }
    }

    /// Set the oversampling depth
    pub fn with_num_samples(mut self, num_samples: usize) -> Self {
        self.num_samples = num_samples;
        self
    }

    /// Set the snapshot precision
    pub fn with_precision(mut self, precision: usize) -> Self {
        self.precision = precision;
        self
    }

    /// Set the mapping applied when rendering snapshots
    pub fn with_output_scale(mut self, scale: LinearMap) -> Self {
        self.output_scale = Some(scale);
        self
    }

    /// Set the snapshot key prefix
    pub fn with_key_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.key_prefix = prefix.into();
        self
    }

    /// Render snapshot values as thermistor temperatures
    pub fn with_thermistor(mut self, ntc: Ntc) -> Self {
        self.thermistor = Some(ntc);
        self
    }

    /// Check every field against a device that exposes `max_channels` inputs
    pub fn validate(&self, max_channels: usize) -> Result<(), ConfigError> {
        if self.num_channels == 0 || self.num_channels > max_channels {
            return Err(ConfigError::ChannelCount {
                requested: self.num_channels,
                max: max_channels,
            });
        }
        if self.num_samples == 0 {
            return Err(ConfigError::ZeroSamples);
        }
        if !self.noise_threshold.is_finite() || self.noise_threshold < 0.0 {
            return Err(ConfigError::NoiseThreshold(self.noise_threshold));
        }
        if let Some(scale) = &self.output_scale {
            scale.validate()?;
        }
        if let Some(ntc) = &self.thermistor {
            ntc.validate()?;
        }
        Ok(())
    }

    /// Snapshot key for a channel index; temperatures get an `f` suffix
    pub fn channel_key(&self, channel: usize) -> String {
        match self.thermistor {
            Some(_) => format!("{}{}f", self.key_prefix, channel),
            None => format!("{}{}", self.key_prefix, channel),
        }
    }
}

/// Unit the noise threshold is compared in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ThresholdUnit {
    /// Source returns volts; threshold in volts
    Volts,
    /// Source returns raw codes; threshold in counts
    RawCounts,
}

/// ADS1115 programmable gain amplifier setting
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Gain {
    /// +/- 6.144 V
    #[serde(rename = "2/3")]
    TwoThirds,
    /// +/- 4.096 V
    #[default]
    #[serde(rename = "1")]
    One,
    /// +/- 2.048 V
    #[serde(rename = "2")]
    Two,
    /// +/- 1.024 V
    #[serde(rename = "4")]
    Four,
    /// +/- 0.512 V
    #[serde(rename = "8")]
    Eight,
    /// +/- 0.256 V
    #[serde(rename = "16")]
    Sixteen,
}

impl Gain {
    /// Parse the conventional gain notation (`2/3`, `1`, `2`, `4`, `8`, `16`)
    pub fn parse(value: &str) -> Result<Self, ConfigError> {
        match value.trim() {
            "2/3" | "0.667" => Ok(Self::TwoThirds),
            "1" => Ok(Self::One),
            "2" => Ok(Self::Two),
            "4" => Ok(Self::Four),
            "8" => Ok(Self::Eight),
            "16" => Ok(Self::Sixteen),
            other => Err(ConfigError::Gain(other.to_string())),
        }
    }

    /// Full-scale range in volts
    pub fn full_scale_volts(&self) -> f64 {
        match self {
            Self::TwoThirds => 6.144,
            Self::One => 4.096,
            Self::Two => 2.048,
            Self::Four => 1.024,
            Self::Eight => 0.512,
            Self::Sixteen => 0.256,
        }
    }

    /// PGA field of the config register (bits 11:9)
    pub fn config_bits(&self) -> u16 {
        let pga: u16 = match self {
            Self::TwoThirds => 0b000,
            Self::One => 0b001,
            Self::Two => 0b010,
            Self::Four => 0b011,
            Self::Eight => 0b100,
            Self::Sixteen => 0b101,
        };
        pga << 9
    }
}

/// Strap-selectable ADS1115 addresses
pub const ADS1115_ADDRESSES: [u16; 4] = [0x48, 0x49, 0x4A, 0x4B];

/// Map an MCP3008 chip-select GPIO to its SPI0 CE line (0 or 1)
pub fn chip_select_line(gpio: u8) -> Result<u8, ConfigError> {
    match gpio {
        8 => Ok(0),
        7 => Ok(1),
        other => Err(ConfigError::ChipSelect(other)),
    }
}

/// Device family and its source-side parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "device", rename_all = "lowercase")]
pub enum DeviceProfile {
    /// 4-channel 16-bit I2C converter returning volts
    Ads1115 {
        /// PGA gain
        #[serde(default)]
        gain: Gain,
        /// I2C address
        #[serde(default = "default_ads1115_address")]
        address: u16,
    },
    /// 8-channel 10-bit SPI converter returning raw codes
    Mcp3008 {
        /// Reference voltage (3.3 or 5.0 on a Pi)
        vref: f64,
        /// Chip-select GPIO (8 = CE0, 7 = CE1)
        #[serde(default = "default_chip_select")]
        chip_select: u8,
    },
    /// Any other source; readings are taken as-is
    Generic {
        /// Number of inputs the source exposes
        max_channels: usize,
    },
}

fn default_ads1115_address() -> u16 {
    0x48
}

fn default_chip_select() -> u8 {
    8
}

impl DeviceProfile {
    /// ADS1115 with the given gain and address
    pub fn ads1115(gain: Gain, address: u16) -> Self {
        Self::Ads1115 { gain, address }
    }

    /// MCP3008 with the given reference voltage and chip-select GPIO
    pub fn mcp3008(vref: f64, chip_select: u8) -> Self {
        Self::Mcp3008 { vref, chip_select }
    }

    /// Short device name, used as the emitter tag
    pub fn name(&self) -> &'static str {
        match self {
            Self::Ads1115 { .. } => "ads1115",
            Self::Mcp3008 { .. } => "mcp3008",
            Self::Generic { .. } => "generic",
        }
    }

    /// Number of inputs on the device
    pub fn max_channels(&self) -> usize {
        match self {
            Self::Ads1115 { .. } => ADS1115_CHANNELS,
            Self::Mcp3008 { .. } => MCP3008_CHANNELS,
            Self::Generic { max_channels } => *max_channels,
        }
    }

    /// Unit of readings, and therefore of the noise threshold
    pub fn threshold_unit(&self) -> ThresholdUnit {
        match self {
            Self::Mcp3008 { .. } => ThresholdUnit::RawCounts,
            _ => ThresholdUnit::Volts,
        }
    }

    /// Reject address, chip-select and reference values the hardware cannot take
    pub fn validate(&self) -> Result<(), ConfigError> {
        match self {
            Self::Ads1115 { address, .. } => {
                if !ADS1115_ADDRESSES.contains(address) {
                    return Err(ConfigError::I2cAddress(*address));
                }
            }
            Self::Mcp3008 { vref, chip_select } => {
                chip_select_line(*chip_select)?;
                LinearMap::raw_to_volts(*vref).validate()?;
            }
            Self::Generic { max_channels } => {
                if *max_channels == 0 {
                    return Err(ConfigError::ChannelCount {
                        requested: 0,
                        max: 0,
                    });
                }
            }
        }
        Ok(())
    }

    /// Engine defaults for this device family
    ///
    /// Raw-code devices compare in counts and render volts through
    /// [`LinearMap::raw_to_volts`]; voltage devices compare and render volts.
    pub fn engine_config(&self, num_channels: usize, max_interval: Duration) -> EngineConfig {
        match self {
            Self::Ads1115 { .. } | Self::Generic { .. } => {
                EngineConfig::new(num_channels, 0.001, max_interval)
            }
            Self::Mcp3008 { vref, .. } => EngineConfig::new(num_channels, 350.0, max_interval)
                .with_output_scale(LinearMap::raw_to_volts(*vref)),
        }
    }
}

/// Profile plus engine settings, the shape of a device config file
///
/// Fields missing from the `engine` section take the profile's defaults from
/// [`DeviceProfile::engine_config`], so a raw-code device keeps its count
/// threshold and volt scale unless the file overrides them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "DeviceConfigFile")]
pub struct DeviceConfig {
    /// Source-side parameters
    #[serde(flatten)]
    pub profile: DeviceProfile,
    /// Engine parameters
    pub engine: EngineConfig,
}

impl DeviceConfig {
    /// Parse a JSON device config
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Validate both halves
    ///
    /// A raw-code device must carry an output scale, otherwise snapshots
    /// would show codes instead of volts.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.profile.validate()?;
        if self.profile.threshold_unit() == ThresholdUnit::RawCounts
            && self.engine.output_scale.is_none()
        {
            return Err(ConfigError::MissingScale(self.profile.name().to_string()));
        }
        self.engine.validate(self.profile.max_channels())
    }
}

#[derive(Deserialize)]
struct DeviceConfigFile {
    #[serde(flatten)]
    profile: DeviceProfile,
    #[serde(default)]
    engine: EngineSection,
}

/// `engine` section as written; every field optional
#[derive(Default, Deserialize)]
struct EngineSection {
    num_channels: Option<usize>,
    noise_threshold: Option<f64>,
    max_interval_ms: Option<u64>,
    num_samples: Option<usize>,
    precision: Option<usize>,
    output_scale: Option<LinearMap>,
    key_prefix: Option<String>,
    thermistor: Option<Ntc>,
}

impl From<DeviceConfigFile> for DeviceConfig {
    fn from(file: DeviceConfigFile) -> Self {
        let section = file.engine;
        let defaults = EngineConfig::default();
        let mut engine = file.profile.engine_config(
            section.num_channels.unwrap_or(defaults.num_channels),
            section
                .max_interval_ms
                .map(Duration::from_millis)
                .unwrap_or(defaults.max_interval),
        );
        if let Some(threshold) = section.noise_threshold {
            engine.noise_threshold = threshold;
        }
        if let Some(num_samples) = section.num_samples {
            engine.num_samples = num_samples;
        }
        if let Some(precision) = section.precision {
            engine.precision = precision;
        }
        if let Some(scale) = section.output_scale {
            engine.output_scale = Some(scale);
        }
        if let Some(prefix) = section.key_prefix {
            engine.key_prefix = prefix;
        }
        engine.thermistor = section.thermistor;

        Self {
            profile: file.profile,
            engine,
        }
    }
}

mod duration_ms {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(value.as_millis() as u64)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        u64::deserialize(deserializer).map(Duration::from_millis)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_engine_config_default() {
        let config = EngineConfig::default();
        assert_eq!(config.num_channels, 1);
        assert_eq!(config.num_samples, 10);
        assert_eq!(config.precision, 3);
        assert_eq!(config.max_interval, Duration::from_secs(1));
        assert!(config.output_scale.is_none());
        assert_eq!(config.channel_key(2), "a2");
    }

    #[test]
    fn test_engine_config_validate_channels() {
        assert!(EngineConfig::new(4, 0.01, Duration::from_secs(1))
            .validate(4)
            .is_ok());
        assert!(matches!(
            EngineConfig::new(5, 0.01, Duration::from_secs(1)).validate(4),
            Err(ConfigError::ChannelCount {
                requested: 5,
                max: 4
            })
        ));
        assert!(matches!(
            EngineConfig::new(0, 0.01, Duration::from_secs(1)).validate(8),
            Err(ConfigError::ChannelCount { .. })
        ));
    }

    #[test]
    fn test_engine_config_validate_fields() {
        let base = EngineConfig::new(1, 0.01, Duration::from_secs(1));
        assert_eq!(
            base.clone().with_num_samples(0).validate(4),
            Err(ConfigError::ZeroSamples)
        );

        let mut negative = base.clone();
        negative.noise_threshold = -0.5;
        assert!(matches!(
            negative.validate(4),
            Err(ConfigError::NoiseThreshold(_))
        ));

        let bad_scale = base.with_output_scale(LinearMap::new(2.0, 2.0, 0.0, 1.0));
        assert!(matches!(
            bad_scale.validate(4),
            Err(ConfigError::DegenerateScale { .. })
        ));
    }

    #[test]
    fn test_gain_table() {
        assert_eq!(Gain::parse("2/3").unwrap(), Gain::TwoThirds);
        assert_eq!(Gain::parse("16").unwrap(), Gain::Sixteen);
        assert!(matches!(Gain::parse("3"), Err(ConfigError::Gain(_))));
        assert!((Gain::One.full_scale_volts() - 4.096).abs() < 1e-12);
        assert_eq!(Gain::Two.config_bits(), 0x0400);
    }

    #[test]
    fn test_profile_validation() {
        assert!(DeviceProfile::ads1115(Gain::One, 0x4B).validate().is_ok());
        assert_eq!(
            DeviceProfile::ads1115(Gain::One, 0x50).validate(),
            Err(ConfigError::I2cAddress(0x50))
        );
        assert!(DeviceProfile::mcp3008(3.3, 7).validate().is_ok());
        assert_eq!(
            DeviceProfile::mcp3008(3.3, 9).validate(),
            Err(ConfigError::ChipSelect(9))
        );
    }

    #[test]
    fn test_profile_engine_defaults() {
        let ads = DeviceProfile::ads1115(Gain::One, 0x48);
        assert_eq!(ads.threshold_unit(), ThresholdUnit::Volts);
        assert!(ads
            .engine_config(2, Duration::from_secs(1))
            .output_scale
            .is_none());

        let mcp = DeviceProfile::mcp3008(5.0, 8);
        assert_eq!(mcp.max_channels(), 8);
        assert_eq!(mcp.threshold_unit(), ThresholdUnit::RawCounts);
        let config = mcp.engine_config(2, Duration::from_secs(1));
        assert_eq!(config.output_scale, Some(LinearMap::raw_to_volts(5.0)));
        assert!((config.noise_threshold - 350.0).abs() < 1e-12);
    }

    #[test]
    fn test_device_config_json() {
        let json = r#"{
            "device": "mcp3008",
            "vref": 3.3,
            "chip_select": 7,
            "engine": { "num_channels": 2, "noise_threshold": 400.0, "max_interval_ms": 1500 }
        }"#;
        let config = DeviceConfig::from_json(json).unwrap();
        assert_eq!(config.profile, DeviceProfile::mcp3008(3.3, 7));
        assert_eq!(config.engine.num_channels, 2);
        assert_eq!(config.engine.max_interval, Duration::from_millis(1500));
        assert_eq!(config.engine.num_samples, DEFAULT_NUM_SAMPLES);
        assert!(config.validate().is_ok());

        // Unset engine fields come from the profile, not EngineConfig::default
        assert!((config.engine.noise_threshold - 400.0).abs() < 1e-12);
        assert_eq!(config.engine.output_scale, Some(LinearMap::raw_to_volts(3.3)));

        let json = r#"{ "device": "ads1115", "engine": { "num_channels": 5 } }"#;
        let config = DeviceConfig::from_json(json).unwrap();
        assert_eq!(config.profile, DeviceProfile::ads1115(Gain::One, 0x48));
        assert!(matches!(
            config.validate(),
            Err(ConfigError::ChannelCount { .. })
        ));
    }

    #[test]
    fn test_device_config_profile_defaults() {
        let config =
            DeviceConfig::from_json(r#"{"device":"mcp3008","vref":5.0,"engine":{"num_channels":1}}"#)
                .unwrap();
        assert!((config.engine.noise_threshold - 350.0).abs() < 1e-12);
        assert_eq!(config.engine.output_scale, Some(LinearMap::raw_to_volts(5.0)));
        assert_eq!(config.engine.max_interval, Duration::from_secs(1));

        // No engine section at all
        let config = DeviceConfig::from_json(r#"{"device":"mcp3008","vref":3.3}"#).unwrap();
        assert_eq!(config.engine.num_channels, 1);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_raw_code_profile_requires_scale() {
        let mut config = DeviceConfig {
            profile: DeviceProfile::mcp3008(3.3, 8),
            engine: EngineConfig::new(1, 350.0, Duration::from_secs(1)),
        };
        assert_eq!(
            config.validate(),
            Err(ConfigError::MissingScale("mcp3008".to_string()))
        );

        config.engine.output_scale = Some(LinearMap::raw_to_volts(3.3));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_device_config_serialize_round_trip() {
        let config = DeviceConfig {
            profile: DeviceProfile::mcp3008(3.3, 7),
            engine: DeviceProfile::mcp3008(3.3, 7)
                .engine_config(3, Duration::from_millis(750))
                .with_thermistor(Ntc::default()),
        };
        let json = serde_json::to_string(&config).unwrap();
        assert_eq!(DeviceConfig::from_json(&json).unwrap(), config);
    }

    #[test]
    fn test_thermistor_keys_and_validation() {
        let config =
            EngineConfig::new(2, 0.01, Duration::from_secs(1)).with_thermistor(Ntc::default());
        assert_eq!(config.channel_key(1), "a1f");
        assert!(config.validate(4).is_ok());

        let bad = config.with_thermistor(Ntc {
            beta: -1.0,
            ..Default::default()
        });
        assert!(matches!(bad.validate(4), Err(ConfigError::Thermistor(_))));
    }
}
