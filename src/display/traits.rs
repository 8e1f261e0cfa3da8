/*
 *  display/traits.rs
 *
 *  fbtft - small panels, big pixels
 *  (c) 2020-26 Stuart Hunter
 *
 *  Core trait definitions for display driver abstraction
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

use crate::display::error::DisplayError;

/// Display capabilities and metadata
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DisplayCapabilities {
    /// Display width in pixels
    pub width: u32,

    /// Display height in pixels
    pub height: u32,

    /// Pixel depth of the video memory (16 for RGB565 panels)
    pub bits_per_pixel: u8,

    /// Maximum recommended frame rate
    pub max_fps: u32,
}

impl DisplayCapabilities {
    /// Size in bytes of one full frame of video memory
    pub fn frame_bytes(&self) -> usize {
        self.width as usize * self.height as usize * (self.bits_per_pixel as usize).div_ceil(8)
    }
}

/// Minimal hardware abstraction - all display drivers must implement this trait
///
/// Built-in panels reach this through `FbtftDevice`, plugins through the
/// plugin adapter; callers only ever see a boxed `DisplayDriver`.
pub trait DisplayDriver: Send {
    /// Returns the capabilities of this display
    fn capabilities(&self) -> &DisplayCapabilities;

    /// Returns the display dimensions as (width, height)
    fn dimensions(&self) -> (u32, u32) {
        let caps = self.capabilities();
        (caps.width, caps.height)
    }

    /// Bring the controller out of reset into an operating state
    fn init(&mut self) -> Result<(), DisplayError>;

    /// Pulse the hardware reset line, if the panel has one
    fn reset(&mut self) -> Result<(), DisplayError>;

    /// Push the dirty part of the framebuffer to the panel
    fn flush(&mut self) -> Result<(), DisplayError>;

    /// Clear the display to blank/off state
    fn clear(&mut self) -> Result<(), DisplayError>;

    /// Replace the whole framebuffer with `buffer` and flush it
    ///
    /// The buffer is raw video memory: for 16 bpp panels that is big-endian
    /// RGB565, row-major, `width * height * 2` bytes.
    fn write_buffer(&mut self, buffer: &[u8]) -> Result<(), DisplayError>;
}
