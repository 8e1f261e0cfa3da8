/*
 *  display/par.rs
 *
 *  fbtft - small panels, big pixels
 *  (c) 2020-26 Stuart Hunter
 *
 *  Panel context: transport, control lines, delays and debug flags
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

//! The panel context handed to every driver callback.
//!
//! A `Par` owns the data/command transport, the optional reset line and the
//! delay provider. Control lines that are not wired are `None`; callbacks
//! check for presence instead of comparing against a sentinel pin number.

use std::ops::BitOr;

use display_interface::{DataFormat, WriteOnlyDataCommand};
use embedded_graphics::pixelcolor::{IntoStorage, Rgb565};
use embedded_hal::delay::DelayNs;
use embedded_hal::digital::OutputPin;
use log::warn;

use crate::display::error::DisplayError;

/// Per-device debug mask, one bit per traced callback
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DebugFlags(u32);

impl DebugFlags {
    pub const NONE: DebugFlags = DebugFlags(0);
    pub const WRITE_VMEM: DebugFlags = DebugFlags(1 << 20);
    pub const WRITE_REGISTER: DebugFlags = DebugFlags(1 << 21);
    pub const SET_ADDR_WIN: DebugFlags = DebugFlags(1 << 22);
    pub const RESET: DebugFlags = DebugFlags(1 << 23);
    pub const UPDATE_DISPLAY: DebugFlags = DebugFlags(1 << 25);
    pub const INIT_DISPLAY: DebugFlags = DebugFlags(1 << 26);

    pub const fn from_bits(bits: u32) -> Self {
        DebugFlags(bits)
    }

    pub const fn bits(self) -> u32 {
        self.0
    }

    pub const fn contains(self, other: DebugFlags) -> bool {
        other.0 != 0 && self.0 & other.0 == other.0
    }
}

impl BitOr for DebugFlags {
    type Output = DebugFlags;

    fn bitor(self, rhs: DebugFlags) -> DebugFlags {
        DebugFlags(self.0 | rhs.0)
    }
}

/// Debug trace from inside a callback, emitted only when `$flag` is set on the par
macro_rules! par_dbg {
    ($flag:expr, $par:expr, $($arg:tt)+) => {
        if $par.debug().contains($flag) {
            log::debug!($($arg)+);
        }
    };
}
pub(crate) use par_dbg;

/// Register write with 8-bit register framing: `write_reg!(par, REG, v0, v1, ...)`
///
/// Values are truncated to the 8-bit register width.
#[macro_export]
macro_rules! write_reg {
    ($par:expr, $reg:expr $(, $val:expr)* $(,)?) => {
        $par.write_reg($reg, &[$(($val) as u8),*])
    };
}

/// Panel context owned by a driver instance
pub struct Par<DI, RST, D> {
    interface: DI,
    reset: Option<RST>,
    delay: D,
    debug: DebugFlags,
}

impl<DI, RST, D> Par<DI, RST, D>
where
    DI: WriteOnlyDataCommand,
    RST: OutputPin,
    D: DelayNs,
{
    pub fn new(interface: DI, reset: Option<RST>, delay: D) -> Self {
        Self {
            interface,
            reset,
            delay,
            debug: DebugFlags::NONE,
        }
    }

    pub fn with_debug(mut self, debug: DebugFlags) -> Self {
        self.debug = debug;
        self
    }

    pub fn debug(&self) -> DebugFlags {
        self.debug
    }

    pub fn has_reset_line(&self) -> bool {
        self.reset.is_some()
    }

    /// Drive the reset line; a missing line or a failed write is not an error
    pub fn set_reset(&mut self, high: bool) {
        let Some(line) = self.reset.as_mut() else { return };
        let result = if high { line.set_high() } else { line.set_low() };
        if result.is_err() {
            warn!("reset line write ({}) failed, ignoring", if high { "high" } else { "low" });
        }
    }

    /// Blocking millisecond delay
    pub fn mdelay(&mut self, ms: u32) {
        self.delay.delay_ms(ms);
    }

    /// Register byte as a command, then any value bytes as data
    pub fn write_reg(&mut self, reg: u8, data: &[u8]) -> Result<(), DisplayError> {
        par_dbg!(DebugFlags::WRITE_REGISTER, self, "write_reg(0x{:02X}, {:02X?})", reg, data);

        self.interface.send_commands(DataFormat::U8(&[reg]))?;
        if !data.is_empty() {
            self.interface.send_data(DataFormat::U8(data))?;
        }
        Ok(())
    }

    /// Raw data write
    pub fn write(&mut self, data: &[u8]) -> Result<(), DisplayError> {
        self.interface.send_data(DataFormat::U8(data))?;
        Ok(())
    }

    /// Stream 16 bpp video memory to an 8-bit bus, high byte first
    pub fn write_vmem16(&mut self, pixels: &[Rgb565]) -> Result<(), DisplayError> {
        par_dbg!(DebugFlags::WRITE_VMEM, self, "write_vmem16({} pixels)", pixels.len());

        if pixels.is_empty() {
            return Ok(());
        }
        let mut words = pixels.iter().map(|&c| c.into_storage());
        self.interface.send_data(DataFormat::U16BEIter(&mut words))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::display::drivers::mock::{mock_par, BusEvent};

    #[test]
    fn test_write_reg_frames_command_then_data() {
        let (mut par, log) = mock_par(false);

        write_reg!(par, 0x1D, 0x02).unwrap();
        write_reg!(par, 0x08).unwrap();

        assert_eq!(
            log.events(),
            vec![
                BusEvent::Command(vec![0x1D]),
                BusEvent::Data(vec![0x02]),
                BusEvent::Command(vec![0x08]),
            ]
        );
    }

    #[test]
    fn test_write_reg_truncates_to_register_width() {
        let (mut par, log) = mock_par(false);
        let end_x: u16 = 0x1_5F;

        write_reg!(par, 0x35, end_x).unwrap();

        assert_eq!(log.events()[1], BusEvent::Data(vec![0x5F]));
    }

    #[test]
    fn test_write_vmem16_big_endian() {
        let (mut par, log) = mock_par(false);

        par.write_vmem16(&[Rgb565::new(31, 0, 0), Rgb565::new(0, 0, 31)]).unwrap();

        assert_eq!(log.events(), vec![BusEvent::Data(vec![0xF8, 0x00, 0x00, 0x1F])]);
    }

    #[test]
    fn test_set_reset_without_line_is_silent() {
        let (mut par, log) = mock_par(false);

        par.set_reset(false);
        par.set_reset(true);

        assert!(log.events().is_empty());
    }

    #[test]
    fn test_debug_flags() {
        let flags = DebugFlags::INIT_DISPLAY | DebugFlags::RESET;
        assert!(flags.contains(DebugFlags::RESET));
        assert!(!flags.contains(DebugFlags::SET_ADDR_WIN));
        assert!(!flags.contains(DebugFlags::NONE));
        assert_eq!(DebugFlags::from_bits(flags.bits()), flags);
    }
}
