/*
 *  display/framebuffer.rs
 *
 *  fbtft - small panels, big pixels
 *  (c) 2020-26 Stuart Hunter
 *
 *  RGB565 video memory with dirty row tracking
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

use core::convert::Infallible;
use embedded_graphics::geometry::{OriginDimensions, Size};
use embedded_graphics::pixelcolor::raw::RawU16;
use embedded_graphics::pixelcolor::{IntoStorage, Rgb565};
use embedded_graphics::prelude::*;
use embedded_graphics::primitives::Rectangle;

use crate::display::error::DisplayError;

/// A runtime-sized RGB565 framebuffer for embedded-graphics.
///
/// Every write widens the inclusive range of dirty rows; the device drains
/// that range on flush and pushes only those rows to the panel.
#[derive(Debug, Clone)]
pub struct FrameBuffer {
    buf: Vec<Rgb565>,
    w: usize,
    h: usize,
    dirty: Option<(u16, u16)>,
}

impl FrameBuffer {
    pub fn new(width: u32, height: u32) -> Self {
        let (w, h) = (width as usize, height as usize);
        Self { buf: vec![Rgb565::BLACK; w * h], w, h, dirty: None }
    }

    pub fn width(&self) -> usize { self.w }
    pub fn height(&self) -> usize { self.h }

    /// Immutable raw access
    pub fn as_slice(&self) -> &[Rgb565] { &self.buf }

    /// Pixels of rows `start..=end`
    pub fn rows(&self, start: u16, end: u16) -> &[Rgb565] {
        let from = start as usize * self.w;
        let to = ((end as usize + 1) * self.w).min(self.buf.len());
        &self.buf[from.min(to)..to]
    }

    pub fn pixel(&self, x: u32, y: u32) -> Option<Rgb565> {
        self.idx(Point::new(x as i32, y as i32)).map(|i| self.buf[i])
    }

    /// Fill every pixel and mark the whole buffer dirty
    pub fn fill(&mut self, color: Rgb565) {
        self.buf.fill(color);
        self.mark_all_dirty();
    }

    pub fn mark_all_dirty(&mut self) {
        if self.h > 0 {
            self.mark_dirty(0, (self.h - 1) as u16);
        }
    }

    /// Widen the dirty range to include rows `start..=end`
    pub fn mark_dirty(&mut self, start: u16, end: u16) {
        self.dirty = Some(match self.dirty {
            Some((s, e)) => (s.min(start), e.max(end)),
            None => (start, end),
        });
    }

    pub fn dirty_rows(&self) -> Option<(u16, u16)> {
        self.dirty
    }

    /// Hand out and reset the dirty range
    pub fn take_dirty(&mut self) -> Option<(u16, u16)> {
        self.dirty.take()
    }

    /// Load big-endian RGB565 video memory, replacing the whole buffer
    pub fn load_be_bytes(&mut self, bytes: &[u8]) -> Result<(), DisplayError> {
        let expected = self.buf.len() * 2;
        if bytes.len() != expected {
            return Err(DisplayError::BufferSizeMismatch { expected, actual: bytes.len() });
        }
        for (px, pair) in self.buf.iter_mut().zip(bytes.chunks_exact(2)) {
            *px = Rgb565::from(RawU16::new(u16::from_be_bytes([pair[0], pair[1]])));
        }
        self.mark_all_dirty();
        Ok(())
    }

    /// Big-endian RGB565 video memory, the inverse of `load_be_bytes`
    pub fn to_be_bytes(&self) -> Vec<u8> {
        self.buf
            .iter()
            .flat_map(|c| c.into_storage().to_be_bytes())
            .collect()
    }

    /// Map (x,y) to linear index; returns None if out of bounds
    #[inline]
    fn idx(&self, p: Point) -> Option<usize> {
        if p.x >= 0 && p.y >= 0 {
            let (x, y) = (p.x as usize, p.y as usize);
            if x < self.w && y < self.h {
                return Some(y * self.w + x);
            }
        }
        None
    }
}

impl OriginDimensions for FrameBuffer {
    fn size(&self) -> Size {
        Size::new(self.w as u32, self.h as u32)
    }
}

impl DrawTarget for FrameBuffer {
    type Color = Rgb565;
    type Error = Infallible;

    fn draw_iter<I>(&mut self, pixels: I) -> Result<(), Self::Error>
    where
        I: IntoIterator<Item = Pixel<Self::Color>>,
    {
        for Pixel(p, c) in pixels {
            if let Some(i) = self.idx(p) {
                self.buf[i] = c;
                let row = p.y as u16;
                self.mark_dirty(row, row);
            }
        }
        Ok(())
    }

    fn clear(&mut self, color: Self::Color) -> Result<(), Self::Error> {
        self.fill(color);
        Ok(())
    }

    fn fill_contiguous<I>(&mut self, area: &Rectangle, colors: I) -> Result<(), Self::Error>
    where
        I: IntoIterator<Item = Self::Color>,
    {
        let visible = area.intersection(&self.bounding_box());
        if visible.is_zero_sized() {
            return Ok(());
        }

        for (p, c) in area.points().zip(colors) {
            if let Some(i) = self.idx(p) {
                self.buf[i] = c;
            }
        }

        let top = visible.top_left.y as u16;
        let bottom = top + visible.size.height as u16 - 1;
        self.mark_dirty(top, bottom);
        Ok(())
    }
}
