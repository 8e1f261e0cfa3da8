/*
 *  fbtft SEPS114A Plugin
 *
 *  A dynamic plugin for the fbtft panel host that provides the Syncoam
 *  SEPS114A OLED driver via the plugin system.
 *
 *  This program is free software: you can redistribute it and/or modify
 *  it under the terms of the GNU General Public License as published by
 *  the Free Software Foundation, either version 3 of the License, or
 *  (at your option) any later version.
 */

//! # fbtft SEPS114A Display Driver Plugin
//!
//! - 96x96 RGB OLED, 16 bpp, 95 Hz
//! - 4-wire SPI with data/command and optional reset lines
//!
//! Install as `libfbtft_seps114a.so` on the plugin search path and select
//! it with:
//!
//! ```yaml
//! display:
//!   driver: seps114a
//!   bus:
//!     type: spi
//!     bus: "/dev/spidev0.0"
//!     dc_pin: 24
//!     rst_pin: 25
//! ```

mod plugin;

// Re-export the plugin registration function
pub use plugin::fbtft_plugin_register;
