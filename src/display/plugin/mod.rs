/*
 *  display/plugin/mod.rs
 *
 *  fbtft - small panels, big pixels
 *  (c) 2020-26 Stuart Hunter
 *
 *  Dynamic plugin system for display drivers
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

//! Dynamic plugin system for fbtft display drivers
//!
//! A driver can be shipped as a shared library instead of being compiled
//! into the host. The host loads it, checks its ABI version and wraps its C
//! vtable as an ordinary [`DisplayDriver`](crate::display::DisplayDriver).
//!
//! 1. **FFI Layer** (`ffi.rs`) - C ABI types, shared with the plugins
//! 2. **Loader** (`loader.rs`) - discovers and loads the libraries
//! 3. **Adapter** (`adapter.rs`) - wraps a plugin instance as a trait object
//!
//! ## Plugin Discovery
//!
//! Searched in order:
//!
//! 1. `$FBTFT_DRIVER_PATH`
//! 2. `./target/release/drivers/`
//! 3. `~/.local/lib/fbtft/drivers/`
//! 4. `/usr/local/lib/fbtft/drivers/`
//! 5. `/usr/lib/fbtft/drivers/`
//!
//! Files are named `libfbtft_<driver>.so` or `libfbtft-<driver>.so`.

pub mod ffi;

#[cfg(feature = "plugin-system")]
pub mod loader;
#[cfg(feature = "plugin-system")]
pub mod adapter;

pub use ffi::{
    FbtftPluginVTable,
    FbtftDriverHandle,
    FbtftErrorCode,
    FbtftError,
    FbtftDisplayConfig,
    FbtftDisplayCapabilities,
    FbtftSpiConfig,
};

#[cfg(feature = "plugin-system")]
pub use loader::{PluginLoader, LoadedPlugin, PluginMetadata};
#[cfg(feature = "plugin-system")]
pub use adapter::PluginDriverAdapter;
