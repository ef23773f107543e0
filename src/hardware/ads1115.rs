// adcwatch - Change-or-timeout analog sampling
// Copyright (c) 2025 David Martin Venti
//
// Dual-licensed under AGPL-3.0 and Commercial License.
// See LICENSE file for details.

//! ADS1115 - 4-channel 16-bit I2C converter, voltage domain.
//!
//! Every read triggers a single-shot conversion on one single-ended input
//! and returns volts scaled by the PGA full-scale range.

use crate::config::Gain;

/// Conversion result register
pub const REG_CONVERSION: u8 = 0x00;
/// Config register
pub const REG_CONFIG: u8 = 0x01;

const OS_START: u16 = 1 << 15;
const MODE_SINGLE_SHOT: u16 = 1 << 8;
const DATA_RATE_128SPS: u16 = 0b100 << 5;
const COMP_DISABLE: u16 = 0b11;

/// Config word for a single-shot, single-ended conversion on `channel`
pub fn config_word(channel: usize, gain: Gain) -> u16 {
    // MUX 100..111 selects AIN0..AIN3 against GND
    let mux = ((0b100 | (channel as u16 & 0b11)) & 0b111) << 12;
    OS_START | mux | gain.config_bits() | MODE_SINGLE_SHOT | DATA_RATE_128SPS | COMP_DISABLE
}

/// True once the OS bit reports the conversion finished
pub fn conversion_ready(config: u16) -> bool {
    config & OS_START != 0
}

/// Convert a conversion register value to volts
pub fn code_to_volts(raw: [u8; 2], gain: Gain) -> f64 {
    let code = i16::from_be_bytes(raw);
    code as f64 * gain.full_scale_volts() / 32768.0
}

#[cfg(feature = "rpi")]
pub use self::device::Ads1115Source;

#[cfg(feature = "rpi")]
mod device {
    use std::thread;
    use std::time::Duration;

    use log::info;
    use rppal::i2c::I2c;

    use super::*;
    use crate::config::{DeviceProfile, ADS1115_CHANNELS};
    use crate::error::{AdcError, HardwareIoError};
    use crate::source::SampleSource;

    // One conversion at 128 SPS
    const CONVERSION_TIME: Duration = Duration::from_micros(7_900);

    /// ADS1115 on the Pi's primary I2C bus
    #[derive(Debug)]
    pub struct Ads1115Source {
        i2c: I2c,
        gain: Gain,
        address: u16,
    }

    impl Ads1115Source {
        /// Open the bus and address the converter
        pub fn new(gain: Gain, address: u16) -> Result<Self, AdcError> {
            DeviceProfile::ads1115(gain, address).validate()?;

            let mut i2c = I2c::new().map_err(|e| HardwareIoError::NotResponding(e.to_string()))?;
            i2c.set_slave_address(address)
                .map_err(|e| HardwareIoError::NotResponding(e.to_string()))?;

            info!(
                "ADS1115 on I2C bus {} address 0x{:02x}, +/-{} V",
                i2c.bus(),
                address,
                gain.full_scale_volts()
            );
            Ok(Self { i2c, gain, address })
        }

        /// Configured I2C address
        pub fn address(&self) -> u16 {
            self.address
        }

        fn read_register(&self, register: u8) -> Result<[u8; 2], HardwareIoError> {
            let mut buf = [0u8; 2];
            self.i2c
                .write_read(&[register], &mut buf)
                .map_err(|e| HardwareIoError::Bus(e.to_string()))?;
            Ok(buf)
        }
    }

    impl SampleSource for Ads1115Source {
        fn read(&mut self, channel: usize) -> Result<f64, HardwareIoError> {
            if channel >= ADS1115_CHANNELS {
                return Err(HardwareIoError::ChannelOutOfRange {
                    channel,
                    max: ADS1115_CHANNELS,
                });
            }

            let [hi, lo] = config_word(channel, self.gain).to_be_bytes();
            self.i2c
                .write(&[REG_CONFIG, hi, lo])
                .map_err(|e| HardwareIoError::Bus(e.to_string()))?;

            thread::sleep(CONVERSION_TIME);
            while !conversion_ready(u16::from_be_bytes(self.read_register(REG_CONFIG)?)) {
                thread::sleep(Duration::from_micros(500));
            }

            let raw = self.read_register(REG_CONVERSION)?;
            Ok(code_to_volts(raw, self.gain))
        }

        fn channel_count(&self) -> usize {
            ADS1115_CHANNELS
        }
    }
}
