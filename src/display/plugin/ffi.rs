/*
 *  display/plugin/ffi.rs
 *
 *  fbtft - small panels, big pixels
 *  (c) 2020-26 Stuart Hunter
 *
 *  C ABI shared by the host and driver plugins
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

//! FFI types for the fbtft plugin system
//!
//! Every type here is `#[repr(C)]` and versioned by
//! `FBTFT_PLUGIN_ABI_VERSION_*`; a plugin whose major version differs from
//! the host's is refused at load time.

use std::ffi::c_char;

use crate::config::{BusConfig, DisplayConfig};
use crate::display::error::DisplayError;
use crate::display::traits::DisplayCapabilities;

/// Plugin ABI version
pub const FBTFT_PLUGIN_ABI_VERSION_MAJOR: u32 = 1;
pub const FBTFT_PLUGIN_ABI_VERSION_MINOR: u32 = 0;
pub const FBTFT_PLUGIN_ABI_VERSION_PATCH: u32 = 0;

/// Symbol every plugin exports
pub const FBTFT_PLUGIN_REGISTER_SYMBOL: &[u8] = b"fbtft_plugin_register\0";

pub const FBTFT_ERROR_MESSAGE_SIZE: usize = 256;

/// Sizes of the metadata buffers handed to `plugin_info`
pub const FBTFT_PLUGIN_NAME_SIZE: usize = 64;
pub const FBTFT_PLUGIN_VERSION_SIZE: usize = 32;
pub const FBTFT_PLUGIN_COMPATIBLE_SIZE: usize = 64;

pub const FBTFT_BUS_PATH_SIZE: usize = 256;
pub const FBTFT_GPIO_CHIP_SIZE: usize = 64;

/// GPIO line number meaning "not connected"
pub const FBTFT_GPIO_NONE: i32 = -1;

/// Opaque handle to a plugin driver instance
#[repr(C)]
pub struct FbtftDriverHandle {
    _private: [u8; 0],
}

/// Error codes returned by plugin functions
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FbtftErrorCode {
    Success = 0,
    ErrorGeneric = 1,
    ErrorInvalidArgument = 2,
    // 3 is retired
    /// SPI or display/command transfer failed
    ErrorCommunication = 4,
    ErrorInitialization = 5,
    ErrorGpio = 6,
    ErrorNullPointer = 7,
    /// Plugin code panicked; the panic was caught at the boundary
    ErrorPanic = 8,
    ErrorAbiMismatch = 9,
    ErrorBufferSize = 10,
}

/// Error code plus a NUL-terminated message
#[repr(C)]
pub struct FbtftError {
    pub code: FbtftErrorCode,
    pub message: [c_char; FBTFT_ERROR_MESSAGE_SIZE],
}

impl FbtftError {
    pub fn new(code: FbtftErrorCode, message: &str) -> Self {
        let mut error = Self {
            code,
            message: [0; FBTFT_ERROR_MESSAGE_SIZE],
        };
        copy_str_to_buffer(message, &mut error.message);
        error
    }

    pub fn success() -> Self {
        Self::new(FbtftErrorCode::Success, "")
    }

    pub fn message_str(&self) -> String {
        extract_string_from_buffer(&self.message)
    }
}

impl Default for FbtftError {
    fn default() -> Self {
        Self::success()
    }
}

impl From<DisplayError> for FbtftError {
    fn from(error: DisplayError) -> Self {
        let code = match &error {
            DisplayError::SpiError(_) | DisplayError::InterfaceError(_) => {
                FbtftErrorCode::ErrorCommunication
            }
            DisplayError::GpioError(_) => FbtftErrorCode::ErrorGpio,
            DisplayError::InitializationFailed(_) => FbtftErrorCode::ErrorInitialization,
            DisplayError::InvalidConfiguration(_) => FbtftErrorCode::ErrorInvalidArgument,
            DisplayError::BufferSizeMismatch { .. } => FbtftErrorCode::ErrorBufferSize,
            DisplayError::Other(_) => FbtftErrorCode::ErrorGeneric,
        };
        Self::new(code, &error.to_string())
    }
}

impl From<FbtftError> for DisplayError {
    fn from(error: FbtftError) -> Self {
        let message = error.message_str();

        match error.code {
            FbtftErrorCode::Success => DisplayError::Other("No error".to_string()),
            FbtftErrorCode::ErrorCommunication => DisplayError::SpiError(message),
            FbtftErrorCode::ErrorGpio => DisplayError::GpioError(message),
            FbtftErrorCode::ErrorInitialization => DisplayError::InitializationFailed(message),
            FbtftErrorCode::ErrorInvalidArgument => DisplayError::InvalidConfiguration(message),
            _ => DisplayError::Other(message),
        }
    }
}

/// SPI panel wiring
#[repr(C)]
#[derive(Clone, Copy)]
pub struct FbtftSpiConfig {
    /// spidev node, e.g. "/dev/spidev0.0"
    pub bus_path: [c_char; FBTFT_BUS_PATH_SIZE],

    /// GPIO character device, empty for the default chip
    pub gpio_chip: [c_char; FBTFT_GPIO_CHIP_SIZE],

    /// Clock speed in Hz (0 = driver default)
    pub speed_hz: u32,

    /// Data/command line, `FBTFT_GPIO_NONE` when absent
    pub dc_pin: i32,

    /// Reset line, `FBTFT_GPIO_NONE` when absent
    pub rst_pin: i32,
}

/// Display configuration passed to plugin
#[repr(C)]
#[derive(Clone, Copy)]
pub struct FbtftDisplayConfig {
    pub spi: FbtftSpiConfig,

    /// Debug flag mask, see `DebugFlags`
    pub debug: u32,
}

#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FbtftDisplayCapabilities {
    pub width: u32,
    pub height: u32,
    pub bits_per_pixel: u8,
    pub max_fps: u32,
}

impl From<&DisplayCapabilities> for FbtftDisplayCapabilities {
    fn from(caps: &DisplayCapabilities) -> Self {
        Self {
            width: caps.width,
            height: caps.height,
            bits_per_pixel: caps.bits_per_pixel,
            max_fps: caps.max_fps,
        }
    }
}

impl From<FbtftDisplayCapabilities> for DisplayCapabilities {
    fn from(caps: FbtftDisplayCapabilities) -> Self {
        Self {
            width: caps.width,
            height: caps.height,
            bits_per_pixel: caps.bits_per_pixel,
            max_fps: caps.max_fps,
        }
    }
}

/// Copy `s` into a C buffer, truncating on a char boundary and always
/// NUL-terminating
pub fn copy_str_to_buffer(s: &str, buffer: &mut [c_char]) {
    let Some(room) = buffer.len().checked_sub(1) else { return };
    let mut len = s.len().min(room);
    while !s.is_char_boundary(len) {
        len -= 1;
    }
    for (dst, &byte) in buffer.iter_mut().zip(&s.as_bytes()[..len]) {
        *dst = byte as c_char;
    }
    buffer[len] = 0;
}

/// Read a NUL-terminated string out of a C buffer
pub fn extract_string_from_buffer(buffer: &[c_char]) -> String {
    let len = buffer.iter().position(|&c| c == 0).unwrap_or(buffer.len());
    let bytes: Vec<u8> = buffer[..len].iter().map(|&c| c as u8).collect();
    String::from_utf8_lossy(&bytes).into_owned()
}

fn pin_to_ffi(pin: Option<u32>) -> Result<i32, String> {
    match pin {
        None => Ok(FBTFT_GPIO_NONE),
        Some(line) => i32::try_from(line).map_err(|_| format!("GPIO line {} out of range", line)),
    }
}

fn pin_from_ffi(pin: i32) -> Option<u32> {
    u32::try_from(pin).ok()
}

/// Convert Rust DisplayConfig to FFI config
pub fn display_config_to_ffi(config: &DisplayConfig) -> Result<FbtftDisplayConfig, String> {
    let Some(BusConfig::Spi { bus, speed_hz, dc_pin, rst_pin, gpio_chip }) = config.bus.as_ref()
    else {
        return Err("No bus configuration".to_string());
    };

    if bus.len() >= FBTFT_BUS_PATH_SIZE {
        return Err(format!("SPI device path too long: {}", bus));
    }

    let mut spi = FbtftSpiConfig {
        bus_path: [0; FBTFT_BUS_PATH_SIZE],
        gpio_chip: [0; FBTFT_GPIO_CHIP_SIZE],
        speed_hz: speed_hz.unwrap_or(0),
        dc_pin: pin_to_ffi(*dc_pin)?,
        rst_pin: pin_to_ffi(*rst_pin)?,
    };
    copy_str_to_buffer(bus, &mut spi.bus_path);
    if let Some(chip) = gpio_chip {
        if chip.len() >= FBTFT_GPIO_CHIP_SIZE {
            return Err(format!("GPIO chip path too long: {}", chip));
        }
        copy_str_to_buffer(chip, &mut spi.gpio_chip);
    }

    Ok(FbtftDisplayConfig {
        spi,
        debug: config.debug.unwrap_or(0),
    })
}

/// Rebuild a DisplayConfig on the plugin side; the driver name is filled by the caller
pub fn ffi_to_display_config(config: &FbtftDisplayConfig) -> DisplayConfig {
    let spi = &config.spi;
    let gpio_chip = extract_string_from_buffer(&spi.gpio_chip);

    DisplayConfig {
        driver: None,
        bus: Some(BusConfig::Spi {
            bus: extract_string_from_buffer(&spi.bus_path),
            speed_hz: (spi.speed_hz != 0).then_some(spi.speed_hz),
            dc_pin: pin_from_ffi(spi.dc_pin),
            rst_pin: pin_from_ffi(spi.rst_pin),
            gpio_chip: (!gpio_chip.is_empty()).then_some(gpio_chip),
        }),
        debug: (config.debug != 0).then_some(config.debug),
    }
}

/// Plugin vtable - function pointers for all driver operations
#[repr(C)]
pub struct FbtftPluginVTable {
    /// Get plugin ABI version (major, minor, patch)
    pub abi_version: extern "C" fn(major: *mut u32, minor: *mut u32, patch: *mut u32),

    /// Fill name, version and compatible string buffers
    pub plugin_info: extern "C" fn(name: *mut c_char, version: *mut c_char, compatible: *mut c_char),

    /// Probe the panel described by `config`
    pub create: extern "C" fn(
        config: *const FbtftDisplayConfig,
        handle: *mut *mut FbtftDriverHandle,
        error: *mut FbtftError,
    ) -> FbtftErrorCode,

    pub destroy: extern "C" fn(handle: *mut FbtftDriverHandle),

    pub capabilities: extern "C" fn(
        handle: *const FbtftDriverHandle,
        caps: *mut FbtftDisplayCapabilities,
        error: *mut FbtftError,
    ) -> FbtftErrorCode,

    pub init: extern "C" fn(handle: *mut FbtftDriverHandle, error: *mut FbtftError) -> FbtftErrorCode,

    pub reset: extern "C" fn(handle: *mut FbtftDriverHandle, error: *mut FbtftError) -> FbtftErrorCode,

    pub flush: extern "C" fn(handle: *mut FbtftDriverHandle, error: *mut FbtftError) -> FbtftErrorCode,

    pub clear: extern "C" fn(handle: *mut FbtftDriverHandle, error: *mut FbtftError) -> FbtftErrorCode,

    /// Replace video memory with `length` bytes of big-endian RGB565 and flush
    pub write_buffer: extern "C" fn(
        handle: *mut FbtftDriverHandle,
        buffer: *const u8,
        length: usize,
        error: *mut FbtftError,
    ) -> FbtftErrorCode,
}

/// Plugin registration function type
///
/// ```c
/// const FbtftPluginVTable *fbtft_plugin_register(void);
/// ```
pub type PluginRegisterFn = extern "C" fn() -> *const FbtftPluginVTable;
