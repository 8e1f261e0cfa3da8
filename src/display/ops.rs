/*
 *  display/ops.rs
 *
 *  fbtft - small panels, big pixels
 *  (c) 2020-26 Stuart Hunter
 *
 *  Driver callback set and static display descriptor
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

use embedded_graphics::pixelcolor::Rgb565;

use crate::display::error::DisplayError;
use crate::display::par::DebugFlags;
use crate::display::traits::DisplayCapabilities;

/// Static description of a panel, published by each driver
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FbtftDisplay {
    /// Register width in bits
    pub regwidth: u8,

    /// Bus width in bits
    pub buswidth: u8,

    /// Panel width in pixels
    pub width: u16,

    /// Panel height in pixels
    pub height: u16,

    /// Video memory depth
    pub bpp: u8,

    /// Refresh rate the panel is set up for
    pub fps: u32,
}

impl FbtftDisplay {
    pub fn capabilities(&self) -> DisplayCapabilities {
        DisplayCapabilities {
            width: self.width as u32,
            height: self.height as u32,
            bits_per_pixel: self.bpp,
            max_fps: self.fps,
        }
    }

    pub fn pixel_count(&self) -> usize {
        self.width as usize * self.height as usize
    }
}

/// Callbacks a panel driver provides to the host
///
/// The host calls `init_display` once at probe time, `set_addr_win` followed
/// by `write_vmem` for every frame update and `reset` on demand. All calls
/// block until the bus traffic and delays are done.
pub trait FbtftOps {
    /// Descriptor of the panel this driver handles
    fn display(&self) -> &'static FbtftDisplay;

    /// Debug mask of the panel context
    fn debug(&self) -> DebugFlags {
        DebugFlags::NONE
    }

    /// Pulse the reset line; a panel without one is left alone
    fn reset(&mut self);

    /// Full power-up sequence, leaving the panel on and cleared
    fn init_display(&mut self) -> Result<(), DisplayError>;

    /// Confine following pixel writes to the inclusive rectangle
    fn set_addr_win(&mut self, xs: u16, ys: u16, xe: u16, ye: u16) -> Result<(), DisplayError>;

    /// Stream pixels into the current address window
    fn write_vmem(&mut self, pixels: &[Rgb565]) -> Result<(), DisplayError>;
}
