// adcwatch CLI - Change-or-timeout analog sampling
// Copyright (c) 2025 David Martin Venti
//
// Dual-licensed under AGPL-3.0 and Commercial License.
// See LICENSE file for details.

//! # adcwatch
//!
//! Poll an ADC and print a JSON line whenever a channel moves past the noise
//! threshold or the maximum interval runs out.
//!
//! ## Usage
//!
//! ```bash
//! # Simulated 4-channel source, stop after 20 snapshots
//! adcwatch --device sim --channels 4 --count 20
//!
//! # ADS1115 at 0x49, gain 2, 5 mV threshold
//! adcwatch --device ads1115 --address 0x49 --gain 2 --threshold 0.005
//!
//! # Everything from a config file
//! adcwatch --config mcp3008.json
//! ```

mod error;
mod simulate;

use std::thread;
use std::time::Duration;

use adcwatch::{
    DeviceConfig, DeviceProfile, Emitter, Gain, JsonLinesEmitter, Ntc, SampleSource,
    SamplingEngine,
};
use chrono::{SecondsFormat, Utc};
use clap::{Parser, ValueEnum};
use tracing::{error, info, warn, Level};
use tracing_subscriber::EnvFilter;

use error::{CliError, Result};
use simulate::{SimConfig, SimulatedSource};

/// Converter to read from
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Device {
    /// 4-channel I2C converter
    Ads1115,
    /// 8-channel SPI converter
    Mcp3008,
    /// Simulated 8-channel source
    Sim,
}

/// Change-or-timeout ADC poller
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Device to read
    #[arg(short, long, value_enum, default_value = "sim")]
    device: Device,

    /// JSON device config; cannot be combined with device or engine flags
    #[arg(
        long,
        conflicts_with_all = [
            "device", "channels", "threshold", "max_interval_ms", "samples", "precision",
            "gain", "address", "vref", "cs", "ntc", "ntc_series_ohms", "ntc_vcc",
            "ntc_beta", "ntc_nominal_celsius", "ntc_nominal_ohms",
        ]
    )]
    config: Option<String>,

    /// Number of channels, starting at channel 0
    #[arg(short = 'n', long, default_value = "1")]
    channels: usize,

    /// Noise threshold in device units (default: device preset)
    #[arg(short, long)]
    threshold: Option<f64>,

    /// Maximum milliseconds between snapshots
    #[arg(long, default_value = "1000")]
    max_interval_ms: u64,

    /// Readings averaged per channel
    #[arg(short, long, default_value = "10")]
    samples: usize,

    /// Decimal places in output values
    #[arg(long, default_value = "3")]
    precision: usize,

    /// ADS1115 PGA gain (2/3, 1, 2, 4, 8, 16)
    #[arg(long, default_value = "1")]
    gain: String,

    /// ADS1115 I2C address
    #[arg(long, default_value = "0x48", value_parser = parse_address)]
    address: u16,

    /// MCP3008 reference voltage
    #[arg(long, default_value = "3.3")]
    vref: f64,

    /// MCP3008 chip-select GPIO (8 = CE0, 7 = CE1)
    #[arg(long, default_value = "8")]
    cs: u8,

    /// Report thermistor temperatures (Celsius, keys `a<n>f`) instead of volts
    #[arg(long)]
    ntc: bool,

    /// Thermistor divider series resistor, ohms
    #[arg(long, default_value = "10000", requires = "ntc")]
    ntc_series_ohms: f64,

    /// Thermistor divider supply voltage
    #[arg(long, default_value = "3.3", requires = "ntc")]
    ntc_vcc: f64,

    /// Thermistor B coefficient
    #[arg(long, default_value = "3950", requires = "ntc")]
    ntc_beta: f64,

    /// Thermistor nominal temperature, Celsius
    #[arg(long, default_value = "23", requires = "ntc")]
    ntc_nominal_celsius: f64,

    /// Thermistor resistance at the nominal temperature, ohms
    #[arg(long, default_value = "10000", requires = "ntc")]
    ntc_nominal_ohms: f64,

    /// Milliseconds to sleep between polls
    #[arg(long, default_value = "50")]
    period_ms: u64,

    /// Stop after this many snapshots
    #[arg(short, long)]
    count: Option<u64>,

    /// Seed for the simulated source
    #[arg(long)]
    seed: Option<u64>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info")]
    log_level: String,
}

fn parse_address(value: &str) -> std::result::Result<u16, String> {
    let parsed = match value.strip_prefix("0x").or_else(|| value.strip_prefix("0X")) {
        Some(hex) => u16::from_str_radix(hex, 16),
        None => value.parse(),
    };
    parsed.map_err(|e| format!("invalid address '{}': {}", value, e))
}

fn main() {
    let args = Args::parse();

    // Logs go to stderr so stdout stays pure JSON lines
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        let level = match args.log_level.to_lowercase().as_str() {
            "trace" => Level::TRACE,
            "debug" => Level::DEBUG,
            "info" => Level::INFO,
            "warn" => Level::WARN,
            "error" => Level::ERROR,
            _ => Level::INFO,
        };
        EnvFilter::from_default_env().add_directive(level.into())
    });
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    info!("adcwatch v{}", env!("CARGO_PKG_VERSION"));

    if let Err(e) = run(&args) {
        error!("{}", e);
        std::process::exit(1);
    }
}

/// Build the device config from a file or from flags
fn resolve_device(args: &Args) -> Result<DeviceConfig> {
    let config = match &args.config {
        Some(path) => {
            let json = std::fs::read_to_string(path).map_err(|source| CliError::ReadConfig {
                path: path.clone(),
                source,
            })?;
            DeviceConfig::from_json(&json)?
        }
        None => {
            let profile = match args.device {
                Device::Ads1115 => DeviceProfile::ads1115(Gain::parse(&args.gain)?, args.address),
                Device::Mcp3008 => DeviceProfile::mcp3008(args.vref, args.cs),
                Device::Sim => DeviceProfile::Generic {
                    max_channels: SimConfig::default().channels,
                },
            };
            let mut engine = profile
                .engine_config(args.channels, Duration::from_millis(args.max_interval_ms))
                .with_num_samples(args.samples)
                .with_precision(args.precision);
            if let Some(threshold) = args.threshold {
                engine.noise_threshold = threshold;
            }
            if args.ntc {
                engine = engine.with_thermistor(Ntc {
                    series_ohms: args.ntc_series_ohms,
                    vcc: args.ntc_vcc,
                    beta: args.ntc_beta,
                    nominal_celsius: args.ntc_nominal_celsius,
                    nominal_ohms: args.ntc_nominal_ohms,
                });
            }
            DeviceConfig { profile, engine }
        }
    };

    config.validate()?;
    Ok(config)
}

/// Open the sample source for a profile
fn open_source(profile: &DeviceProfile, seed: Option<u64>) -> Result<Box<dyn SampleSource>> {
    match profile {
        DeviceProfile::Generic { max_channels } => {
            Ok(Box::new(SimulatedSource::new(SimConfig {
                channels: *max_channels,
                seed,
                ..Default::default()
            })))
        }
        _ => open_hardware(profile),
    }
}

#[cfg(feature = "rpi")]
fn open_hardware(profile: &DeviceProfile) -> Result<Box<dyn SampleSource>> {
    Ok(adcwatch::hardware::open(profile)?)
}

#[cfg(not(feature = "rpi"))]
fn open_hardware(profile: &DeviceProfile) -> Result<Box<dyn SampleSource>> {
    Err(CliError::HardwareDisabled(profile.name().to_string()))
}

fn run(args: &Args) -> Result<()> {
    let device = resolve_device(args)?;
    let source = open_source(&device.profile, args.seed)?;
    let name = device.profile.name();

    info!(
        "Polling {} on {} channel(s), threshold {} ({:?}), max interval {:?}",
        name,
        device.engine.num_channels,
        device.engine.noise_threshold,
        device.profile.threshold_unit(),
        device.engine.max_interval
    );

    let mut engine = SamplingEngine::new(source, device.engine)?;
    let stdout = std::io::stdout();
    let mut emitter = JsonLinesEmitter::new(stdout.lock())
        .with_timestamps(|| Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true));
    let period = Duration::from_millis(args.period_ms);

    let mut emitted = 0u64;
    while args.count.map_or(true, |limit| emitted < limit) {
        match engine.poll() {
            Ok(Some(snapshot)) => {
                emitter.emit(name, &snapshot)?;
                emitter.flush()?;
                emitted += 1;
            }
            Ok(None) => {}
            // The cycle is retried from scratch on the next poll
            Err(e) if e.is_hardware() => warn!("Poll failed: {}", e),
            Err(e) => return Err(e.into()),
        }
        thread::sleep(period);
    }

    eprintln!("{}", engine.stats().report());
    Ok(())
}
