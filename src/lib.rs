/*
 *  lib.rs
 *
 *  fbtft - small panels, big pixels
 *  (c) 2020-26 Stuart Hunter
 *
 *  Library root: panel host framework and bundled drivers
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

//! # fbtft
//!
//! A userspace take on the small-panel framebuffer host: a panel context
//! (`Par`) with register-write framing, a display/command transport over
//! `embedded-hal` SPI and GPIO, a framebuffer with dirty-row tracking, and a
//! registry that matches device compatible strings to driver descriptors.
//!
//! Panel drivers plug in by implementing [`display::FbtftOps`] and publishing
//! a [`display::DriverRegistration`]. The SEPS114A 96x96 OLED driver ships
//! built in (feature `driver-seps114a`) and as a dynamically loaded plugin
//! (`drivers/fbtft-driver-seps114a`).

pub mod config;
pub mod display;
