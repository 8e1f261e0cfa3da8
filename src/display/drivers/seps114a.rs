/*
 *  display/drivers/seps114a.rs
 *
 *  fbtft - small panels, big pixels
 *  (c) 2020-26 Stuart Hunter
 *
 *  SEPS114A 96x96 RGB OLED controller driver
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

//! # SEPS114A
//!
//! Syncoam SEPS114A OLED controller on a 96x96 panel, 8-bit registers over
//! a 4-wire SPI interface, 65k colour (two bytes per pixel).
//!
//! Matched by the compatible string `"syncoam,seps114a"` and the module
//! aliases `"spi:fb_seps114a"` / `"spi:seps114a"`.

use display_interface::WriteOnlyDataCommand;
use embedded_graphics::pixelcolor::Rgb565;
use embedded_hal::delay::DelayNs;
use embedded_hal::digital::OutputPin;
use log::info;

use crate::config::{BusConfig, DisplayConfig};
use crate::display::device::FbtftDevice;
use crate::display::error::DisplayError;
use crate::display::factory::BoxedDriver;
use crate::display::linux;
use crate::display::ops::{FbtftDisplay, FbtftOps};
use crate::display::par::{par_dbg, DebugFlags, Par};
use crate::display::registry::DriverRegistration;
use crate::display::transport::spi_transport;
use crate::write_reg;

pub const DRVNAME: &str = "fb_seps114a";
pub const COMPATIBLE: &str = "syncoam,seps114a";
pub const WIDTH: u16 = 96;
pub const HEIGHT: u16 = 96;

const DEFAULT_SPEED_HZ: u32 = 16_000_000;

/// Register map
pub mod reg {
    pub const SOFT_RESET: u8 = 0x01;
    pub const DISPLAY_ON_OFF: u8 = 0x02;
    pub const DDRAM_DATA_ACCESS_PORT: u8 = 0x08;
    pub const ROW_SCAN_DIRECTION: u8 = 0x09;
    pub const CPU_IF: u8 = 0x0D;
    pub const ANALOG_CONTROL: u8 = 0x0F;
    pub const ROW_SCAN_MODE: u8 = 0x13;
    pub const STANDBY_ON_OFF: u8 = 0x14;
    pub const PEAK_PULSE_DELAY: u8 = 0x16;
    pub const ROW_SCAN_ON_OFF: u8 = 0x17;
    pub const DISCHARGE_TIME: u8 = 0x18;
    pub const OSC_ADJUST: u8 = 0x1A;
    pub const MEMORY_WRITE_READ: u8 = 0x1D;
    pub const DISPLAY_X1: u8 = 0x30;
    pub const DISPLAY_X2: u8 = 0x31;
    pub const DISPLAY_Y1: u8 = 0x32;
    pub const DISPLAY_Y2: u8 = 0x33;
    pub const MEM_X1: u8 = 0x34;
    pub const MEM_X2: u8 = 0x35;
    pub const MEM_Y1: u8 = 0x36;
    pub const MEM_Y2: u8 = 0x37;
    pub const DISPLAYSTART_X: u8 = 0x38;
    pub const DISPLAYSTART_Y: u8 = 0x39;
    pub const PEAK_PULSE_WIDTH_R: u8 = 0x3A;
    pub const PEAK_PULSE_WIDTH_G: u8 = 0x3B;
    pub const PEAK_PULSE_WIDTH_B: u8 = 0x3C;
    pub const PRECHARGE_CURRENT_R: u8 = 0x3D;
    pub const PRECHARGE_CURRENT_G: u8 = 0x3E;
    pub const PRECHARGE_CURRENT_B: u8 = 0x3F;
    pub const COLUMN_CURRENT_R: u8 = 0x40;
    pub const COLUMN_CURRENT_G: u8 = 0x41;
    pub const COLUMN_CURRENT_B: u8 = 0x42;
    pub const ROW_OVERLAP: u8 = 0x48;
    pub const SCAN_OFF_LEVEL: u8 = 0x49;
    pub const SCREEN_SAVER_CONTROL: u8 = 0xD0;
    pub const SS_SLEEP_TIMER: u8 = 0xD1;
    pub const SCREEN_SAVER_MODE: u8 = 0xD2;
    pub const SS_UPDATE_TIMER: u8 = 0xD3;
    pub const RGB_IF: u8 = 0xE0;
    pub const RGB_POL: u8 = 0xE1;
    pub const DISPLAY_MODE_CONTROL: u8 = 0xE5;
}

/// MEMORY_WRITE_READ value selecting the write-window addressing mode
const MEMORY_WRITE_MODE: u8 = 0x02;

/// Reset pulse settling time on each edge
const RESET_DELAY_MS: u32 = 10;

/// Standby toggle settling time (datasheet minimum is 1 ms)
const STANDBY_DELAY_MS: u32 = 5;

/// Pixel writes issued by init to blank the panel white
const CLEAR_PIXELS: usize = WIDTH as usize * HEIGHT as usize;

const WHITE: [u8; 2] = [0xFF, 0xFF];

pub static DISPLAY: FbtftDisplay = FbtftDisplay {
    regwidth: 8,
    buswidth: 8,
    width: WIDTH,
    height: HEIGHT,
    bpp: 16,
    fps: 95,
};

pub static DRIVER: DriverRegistration = DriverRegistration {
    name: DRVNAME,
    compatible: COMPATIBLE,
    aliases: &["spi:fb_seps114a", "spi:seps114a"],
    display: &DISPLAY,
    probe,
};

/// SEPS114A callbacks bound to one panel context
pub struct Seps114a<DI, RST, D> {
    par: Par<DI, RST, D>,
}

impl<DI, RST, D> Seps114a<DI, RST, D>
where
    DI: WriteOnlyDataCommand,
    RST: OutputPin,
    D: DelayNs,
{
    pub fn new(par: Par<DI, RST, D>) -> Self {
        Self { par }
    }
}

impl<DI, RST, D> FbtftOps for Seps114a<DI, RST, D>
where
    DI: WriteOnlyDataCommand,
    RST: OutputPin,
    D: DelayNs,
{
    fn display(&self) -> &'static FbtftDisplay {
        &DISPLAY
    }

    fn debug(&self) -> DebugFlags {
        self.par.debug()
    }

    fn reset(&mut self) {
        par_dbg!(DebugFlags::RESET, self.par, "seps114a reset()");

        if !self.par.has_reset_line() {
            return;
        }
        self.par.set_reset(false);
        self.par.mdelay(RESET_DELAY_MS);
        self.par.set_reset(true);
        self.par.mdelay(RESET_DELAY_MS);
    }

    fn init_display(&mut self) -> Result<(), DisplayError> {
        par_dbg!(DebugFlags::INIT_DISPLAY, self.par, "seps114a init_display()");

        self.reset();

        let par = &mut self.par;

        write_reg!(par, reg::SOFT_RESET, 0x00)?;

        // standby on, then off
        write_reg!(par, reg::STANDBY_ON_OFF, 0x01)?;
        par.mdelay(STANDBY_DELAY_MS);
        write_reg!(par, reg::STANDBY_ON_OFF, 0x00)?;
        par.mdelay(STANDBY_DELAY_MS);

        write_reg!(par, reg::DISPLAY_ON_OFF, 0x00)?;

        // external resistor, internal oscillator
        write_reg!(par, reg::ANALOG_CONTROL, 0x00)?;
        // 95 Hz frame rate
        write_reg!(par, reg::OSC_ADJUST, 0x03)?;

        // active area: the whole 96x96 panel
        write_reg!(par, reg::DISPLAY_X1, 0x00)?;
        write_reg!(par, reg::DISPLAY_X2, WIDTH - 1)?;
        write_reg!(par, reg::DISPLAY_Y1, 0x00)?;
        write_reg!(par, reg::DISPLAY_Y2, HEIGHT - 1)?;

        // RGB 8-bit interface, default polarity
        write_reg!(par, reg::RGB_IF, 0x00)?;
        write_reg!(par, reg::RGB_POL, 0x00)?;

        // BGR swap, normal current, normal DC
        write_reg!(par, reg::DISPLAY_MODE_CONTROL, 0x80)?;

        // MPU external interface, 8 bits
        write_reg!(par, reg::CPU_IF, 0x00)?;

        write_reg!(par, reg::MEMORY_WRITE_READ, 0x00)?;

        // column 0 -> max, row 0 -> max, alternate scan
        write_reg!(par, reg::ROW_SCAN_DIRECTION, 0x00)?;
        write_reg!(par, reg::ROW_SCAN_MODE, 0x00)?;

        write_reg!(par, reg::COLUMN_CURRENT_R, 0x6E)?;
        write_reg!(par, reg::COLUMN_CURRENT_G, 0x4F)?;
        write_reg!(par, reg::COLUMN_CURRENT_B, 0x77)?;

        // band gap only
        write_reg!(par, reg::ROW_OVERLAP, 0x00)?;
        // normal discharge
        write_reg!(par, reg::DISCHARGE_TIME, 0x01)?;

        write_reg!(par, reg::PEAK_PULSE_DELAY, 0x00)?;
        write_reg!(par, reg::PEAK_PULSE_WIDTH_R, 0x02)?;
        write_reg!(par, reg::PEAK_PULSE_WIDTH_G, 0x02)?;
        write_reg!(par, reg::PEAK_PULSE_WIDTH_B, 0x02)?;

        write_reg!(par, reg::PRECHARGE_CURRENT_R, 0x14)?;
        write_reg!(par, reg::PRECHARGE_CURRENT_G, 0x50)?;
        write_reg!(par, reg::PRECHARGE_CURRENT_B, 0x19)?;

        // normal row scan
        write_reg!(par, reg::ROW_SCAN_ON_OFF, 0x00)?;
        // VCC_C * 0.75
        write_reg!(par, reg::SCAN_OFF_LEVEL, 0x04)?;

        write_reg!(par, reg::DISPLAYSTART_X, 0x00)?;
        write_reg!(par, reg::DISPLAYSTART_Y, 0x00)?;

        write_reg!(par, reg::DISPLAY_ON_OFF, 0x01)?;

        write_reg!(par, reg::MEMORY_WRITE_READ, MEMORY_WRITE_MODE)?;
        write_reg!(par, reg::DDRAM_DATA_ACCESS_PORT)?;

        for _ in 0..CLEAR_PIXELS {
            par.write(&WHITE)?;
        }

        Ok(())
    }

    fn set_addr_win(&mut self, xs: u16, ys: u16, xe: u16, ye: u16) -> Result<(), DisplayError> {
        par_dbg!(
            DebugFlags::SET_ADDR_WIN,
            self.par,
            "seps114a set_addr_win(xs={}, ys={}, xe={}, ye={})",
            xs, ys, xe, ye
        );

        let par = &mut self.par;
        write_reg!(par, reg::MEMORY_WRITE_READ, MEMORY_WRITE_MODE)?;

        // column address
        write_reg!(par, reg::MEM_X1, xs)?;
        write_reg!(par, reg::MEM_X2, xe)?;

        // row address
        write_reg!(par, reg::MEM_Y1, ys)?;
        write_reg!(par, reg::MEM_Y2, ye)?;
        Ok(())
    }

    fn write_vmem(&mut self, pixels: &[Rgb565]) -> Result<(), DisplayError> {
        write_reg!(self.par, reg::DDRAM_DATA_ACCESS_PORT)?;
        self.par.write_vmem16(pixels)
    }
}

/// Open the SPI device and control lines named in `config` and bind a panel
pub fn probe(config: &DisplayConfig) -> Result<BoxedDriver, DisplayError> {
    let Some(BusConfig::Spi { bus, speed_hz, dc_pin, rst_pin, gpio_chip }) = config.bus.as_ref()
    else {
        return Err(DisplayError::InvalidConfiguration(
            "SEPS114A requires an SPI bus".to_string(),
        ));
    };
    let speed_hz = speed_hz.unwrap_or(DEFAULT_SPEED_HZ);
    let chip = gpio_chip.as_deref().unwrap_or(linux::DEFAULT_GPIO_CHIP);

    info!(
        "Probing SEPS114A on {} at {} Hz (dc={:?}, rst={:?}, {})",
        bus, speed_hz, dc_pin, rst_pin, chip
    );

    let spi = linux::open_spi(bus, speed_hz)?;
    let dc = dc_pin
        .map(|line| linux::request_output(chip, line, "fbtft-dc"))
        .transpose()?;
    let rst = rst_pin
        .map(|line| linux::request_output(chip, line, "fbtft-reset"))
        .transpose()?;

    let debug = DebugFlags::from_bits(config.debug.unwrap_or(0));
    let par = Par::new(spi_transport(spi, dc), rst, linux_embedded_hal::Delay).with_debug(debug);

    Ok(Box::new(FbtftDevice::new(Seps114a::new(par))?))
}
