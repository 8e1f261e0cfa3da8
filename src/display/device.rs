/*
 *  display/device.rs
 *
 *  fbtft - small panels, big pixels
 *  (c) 2020-26 Stuart Hunter
 *
 *  Framebuffer device binding a driver's callbacks to video memory
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
use embedded_graphics::prelude::*;
use embedded_graphics::primitives::Rectangle;
use log::info;

use crate::display::error::DisplayError;
use crate::display::framebuffer::FrameBuffer;
use crate::display::ops::FbtftOps;
use crate::display::par::{par_dbg, DebugFlags};
use crate::display::traits::{DisplayCapabilities, DisplayDriver};

/// A probed panel: driver callbacks plus the video memory they are fed from
///
/// Drawing goes to the framebuffer only; `flush` pushes the rows touched
/// since the last update through `set_addr_win` and `write_vmem`.
pub struct FbtftDevice<O> {
    ops: O,
    framebuffer: FrameBuffer,
    capabilities: DisplayCapabilities,
}

impl<O: FbtftOps> FbtftDevice<O> {
    /// Bind driver callbacks to fresh video memory
    ///
    /// The host frames registers and the bus 8 bits at a time and keeps
    /// video memory as RGB565, so any other descriptor is refused.
    pub fn new(ops: O) -> Result<Self, DisplayError> {
        let display = ops.display();
        if display.regwidth != 8 || display.buswidth != 8 {
            return Err(DisplayError::InvalidConfiguration(format!(
                "unsupported register/bus width {}/{}, only 8/8 is handled",
                display.regwidth, display.buswidth
            )));
        }
        if display.bpp != 16 {
            return Err(DisplayError::InvalidConfiguration(format!(
                "unsupported depth {} bpp, only 16 is handled",
                display.bpp
            )));
        }

        let capabilities = display.capabilities();
        let framebuffer = FrameBuffer::new(capabilities.width, capabilities.height);

        Ok(Self {
            ops,
            framebuffer,
            capabilities,
        })
    }

    pub fn framebuffer(&self) -> &FrameBuffer {
        &self.framebuffer
    }

    /// Push rows `start_row..=end_row` of video memory to the panel
    ///
    /// Rows past the bottom of the panel are clamped; an empty range is a no-op.
    pub fn update_display(&mut self, start_row: u16, end_row: u16) -> Result<(), DisplayError> {
        let last_row = (self.capabilities.height as u16).saturating_sub(1);
        let end_row = end_row.min(last_row);
        if start_row > end_row {
            return Ok(());
        }

        par_dbg!(
            DebugFlags::UPDATE_DISPLAY,
            self.ops,
            "update_display(start_row={}, end_row={})",
            start_row,
            end_row
        );

        let last_col = (self.capabilities.width as u16).saturating_sub(1);
        self.ops.set_addr_win(0, start_row, last_col, end_row)?;
        self.ops.write_vmem(self.framebuffer.rows(start_row, end_row))
    }
}

impl<O: FbtftOps + Send> DisplayDriver for FbtftDevice<O> {
    fn capabilities(&self) -> &DisplayCapabilities {
        &self.capabilities
    }

    fn init(&mut self) -> Result<(), DisplayError> {
        self.ops.init_display()?;

        // first full update, so the panel matches video memory
        self.framebuffer.fill(Rgb565::BLACK);
        self.flush()?;

        info!(
            "{}x{} panel initialized, {} bpp at {} fps",
            self.capabilities.width,
            self.capabilities.height,
            self.capabilities.bits_per_pixel,
            self.capabilities.max_fps
        );
        Ok(())
    }

    fn reset(&mut self) -> Result<(), DisplayError> {
        self.ops.reset();
        Ok(())
    }

    fn flush(&mut self) -> Result<(), DisplayError> {
        match self.framebuffer.take_dirty() {
            Some((start, end)) => self.update_display(start, end),
            None => Ok(()),
        }
    }

    fn clear(&mut self) -> Result<(), DisplayError> {
        self.framebuffer.fill(Rgb565::BLACK);
        self.flush()
    }

    fn write_buffer(&mut self, buffer: &[u8]) -> Result<(), DisplayError> {
        self.framebuffer.load_be_bytes(buffer)?;
        self.flush()
    }
}

impl<O> OriginDimensions for FbtftDevice<O> {
    fn size(&self) -> Size {
        Size::new(self.capabilities.width, self.capabilities.height)
    }
}

// Provide direct DrawTarget access on the device itself
impl<O> DrawTarget for FbtftDevice<O> {
    type Color = Rgb565;
    type Error = core::convert::Infallible;

    fn draw_iter<I>(&mut self, pixels: I) -> Result<(), Self::Error>
    where
        I: IntoIterator<Item = Pixel<Self::Color>>,
    {
        self.framebuffer.draw_iter(pixels)
    }

    fn clear(&mut self, color: Self::Color) -> Result<(), Self::Error> {
        self.framebuffer.clear(color)
    }

    fn fill_contiguous<I>(&mut self, area: &Rectangle, colors: I) -> Result<(), Self::Error>
    where
        I: IntoIterator<Item = Self::Color>,
    {
        self.framebuffer.fill_contiguous(area, colors)
    }
}
