/*
 *  display/linux.rs
 *
 *  fbtft - small panels, big pixels
 *  (c) 2020-26 Stuart Hunter
 *
 *  Linux spidev and GPIO character device plumbing
 *
 *  This program is free software: you can redistribute it and/or modify
 *  it under the terms of the GNU General Public License as published by
 *  the Free Software Foundation, either version 3 of the License, or
 *  (at your option) any later version.
 *
 *  This program is distributed in the hope that it will be useful,
 *  but WITHOUT ANY WARRANTY; without even the implied warranty of
 *  MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
 *  GNU General Public License for more details.
 *
 *  See <http://www.gnu.org/licenses/> to get a copy of the GNU General
 *  Public License.
 *
 */

use linux_embedded_hal::gpio_cdev::{Chip, LineRequestFlags};
use linux_embedded_hal::spidev::{SpiModeFlags, SpidevOptions};
use linux_embedded_hal::{CdevPin, SpidevDevice};
use log::debug;

use crate::display::error::DisplayError;

pub const DEFAULT_GPIO_CHIP: &str = "/dev/gpiochip0";

/// Open an SPI device node in mode 0, 8 bits per word
pub fn open_spi(path: &str, speed_hz: u32) -> Result<SpidevDevice, DisplayError> {
    let mut spi = SpidevDevice::open(path)
        .map_err(|e| DisplayError::SpiError(format!("Failed to open {}: {:?}", path, e)))?;

    let options = SpidevOptions::new()
        .bits_per_word(8)
        .max_speed_hz(speed_hz)
        .mode(SpiModeFlags::SPI_MODE_0)
        .build();
    spi.0
        .configure(&options)
        .map_err(|e| DisplayError::SpiError(format!("Failed to configure {}: {}", path, e)))?;

    debug!("Opened {} at {} Hz", path, speed_hz);
    Ok(spi)
}

/// Claim a GPIO line as an output, initially high
pub fn request_output(chip_path: &str, line: u32, consumer: &str) -> Result<CdevPin, DisplayError> {
    let gpio_err = |what: &str, e: &dyn std::fmt::Display| {
        DisplayError::GpioError(format!("{} {} line {}: {}", what, chip_path, line, e))
    };

    let mut chip = Chip::new(chip_path).map_err(|e| gpio_err("Failed to open", &e))?;
    let handle = chip
        .get_line(line)
        .and_then(|l| l.request(LineRequestFlags::OUTPUT, 1, consumer))
        .map_err(|e| gpio_err("Failed to request", &e))?;

    debug!("Claimed {} line {} as {}", chip_path, line, consumer);
    CdevPin::new(handle).map_err(|e| gpio_err("Failed to wrap", &e))
}
