// adcwatch - Change-or-timeout analog sampling
// Copyright (c) 2025 David Martin Venti
//
// Dual-licensed under AGPL-3.0 and Commercial License.
// See LICENSE file for details.

//! MCP3008 - 8-channel 10-bit SPI converter, raw-code domain.
//!
//! Readings are returned as 16-bit codes (`[0, 65535]`, the 10-bit result
//! shifted left by 6) so thresholds and scaling match other raw-code
//! sources. Conversion to volts happens when a snapshot is rendered.

/// Command bytes for a single-ended conversion on `channel`
pub fn command(channel: u8) -> [u8; 3] {
    [0x01, (0x08 | (channel & 0x07)) << 4, 0x00]
}

/// Extract the 10-bit result from a 3-byte response, scaled to 16 bits
pub fn decode(rx: [u8; 3]) -> u16 {
    let value = (((rx[1] & 0x03) as u16) << 8) | (rx[2] as u16);
    value << 6
}

#[cfg(feature = "rpi")]
pub use self::device::Mcp3008Source;

#[cfg(feature = "rpi")]
mod device {
    use log::info;
    use rppal::spi::{Bus, Mode, SlaveSelect, Spi};

    use super::*;
    use crate::config::{chip_select_line, MCP3008_CHANNELS};
    use crate::error::{AdcError, HardwareIoError};
    use crate::source::SampleSource;

    const CLOCK_HZ: u32 = 1_000_000;

    /// MCP3008 on SPI0
    #[derive(Debug)]
    pub struct Mcp3008Source {
        spi: Spi,
        chip_select: u8,
    }

    impl Mcp3008Source {
        /// Open SPI0 on the CE line wired to `chip_select` (GPIO 8 or 7)
        pub fn new(chip_select: u8) -> Result<Self, AdcError> {
            let slave = match chip_select_line(chip_select)? {
                0 => SlaveSelect::Ss0,
                _ => SlaveSelect::Ss1,
            };
            let spi = Spi::new(Bus::Spi0, slave, CLOCK_HZ, Mode::Mode0)
                .map_err(|e| HardwareIoError::NotResponding(e.to_string()))?;

            info!("MCP3008 on SPI0 CS GPIO{}", chip_select);
            Ok(Self { spi, chip_select })
        }

        /// Chip-select GPIO in use
        pub fn chip_select(&self) -> u8 {
            self.chip_select
        }
    }

    impl SampleSource for Mcp3008Source {
        fn read(&mut self, channel: usize) -> Result<f64, HardwareIoError> {
            if channel >= MCP3008_CHANNELS {
                return Err(HardwareIoError::ChannelOutOfRange {
                    channel,
                    max: MCP3008_CHANNELS,
                });
            }

            let tx = command(channel as u8);
            let mut rx = [0u8; 3];
            self.spi
                .transfer(&mut rx, &tx)
                .map_err(|e| HardwareIoError::Bus(e.to_string()))?;
            Ok(decode(rx) as f64)
        }

        fn channel_count(&self) -> usize {
            MCP3008_CHANNELS
        }
    }
}
