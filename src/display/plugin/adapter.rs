/*
 *  display/plugin/adapter.rs
 *
 *  fbtft - small panels, big pixels
 *  (c) 2020-26 Stuart Hunter
 *
 *  Present a loaded plugin as a DisplayDriver
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

use std::panic::{self, AssertUnwindSafe};

use log::{debug, error};

use super::ffi::{
    display_config_to_ffi, FbtftDisplayCapabilities, FbtftDriverHandle, FbtftError,
    FbtftErrorCode,
};
use super::loader::LoadedPlugin;
use crate::config::DisplayConfig;
use crate::display::error::DisplayError;
use crate::display::traits::{DisplayCapabilities, DisplayDriver};

/// A plugin driver instance behind the DisplayDriver trait
///
/// Every vtable call runs under `catch_unwind`; the instance is destroyed
/// on drop, before the library is unloaded.
pub struct PluginDriverAdapter {
    handle: *mut FbtftDriverHandle,
    capabilities: DisplayCapabilities,
    plugin: LoadedPlugin,
}

// SAFETY: the handle is owned exclusively by this adapter and only ever
// touched through &mut self, so moving it to another thread is sound as
// long as the plugin keeps no thread-local state, which the ABI forbids
unsafe impl Send for PluginDriverAdapter {}

impl PluginDriverAdapter {
    /// Probe the panel through the plugin and cache its capabilities
    pub fn new(plugin: LoadedPlugin, config: &DisplayConfig) -> Result<Self, DisplayError> {
        let ffi_config = display_config_to_ffi(config).map_err(DisplayError::InvalidConfiguration)?;
        let vtable = plugin.vtable();

        let mut handle: *mut FbtftDriverHandle = std::ptr::null_mut();
        let mut error = FbtftError::default();
        let code = catch_ffi_call(|| (vtable.create)(&ffi_config, &mut handle, &mut error));
        check(code, error)?;
        if handle.is_null() {
            return Err(DisplayError::InitializationFailed(
                "plugin returned a null driver handle".to_string(),
            ));
        }

        debug!("Created plugin driver instance: {:p}", handle);

        let mut caps = FbtftDisplayCapabilities::default();
        let mut error = FbtftError::default();
        let code = catch_ffi_call(|| (vtable.capabilities)(handle, &mut caps, &mut error));
        if let Err(e) = check(code, error) {
            destroy_instance(|h| (vtable.destroy)(h), handle);
            return Err(e);
        }

        let capabilities = DisplayCapabilities::from(caps);
        debug!("Plugin driver capabilities: {:?}", capabilities);

        Ok(Self {
            handle,
            capabilities,
            plugin,
        })
    }

    /// Run one handle operation from the vtable
    fn call(
        &mut self,
        op: impl FnOnce(*mut FbtftDriverHandle, *mut FbtftError) -> FbtftErrorCode,
    ) -> Result<(), DisplayError> {
        let mut error = FbtftError::default();
        let handle = self.handle;
        let code = catch_ffi_call(|| op(handle, &mut error as *mut FbtftError));
        check(code, error)
    }
}

impl DisplayDriver for PluginDriverAdapter {
    fn capabilities(&self) -> &DisplayCapabilities {
        &self.capabilities
    }

    fn init(&mut self) -> Result<(), DisplayError> {
        let init = self.plugin.vtable().init;
        self.call(|h, e| init(h, e))
    }

    fn reset(&mut self) -> Result<(), DisplayError> {
        let reset = self.plugin.vtable().reset;
        self.call(|h, e| reset(h, e))
    }

    fn flush(&mut self) -> Result<(), DisplayError> {
        let flush = self.plugin.vtable().flush;
        self.call(|h, e| flush(h, e))
    }

    fn clear(&mut self) -> Result<(), DisplayError> {
        let clear = self.plugin.vtable().clear;
        self.call(|h, e| clear(h, e))
    }

    fn write_buffer(&mut self, buffer: &[u8]) -> Result<(), DisplayError> {
        let expected = self.capabilities.frame_bytes();
        if buffer.len() != expected {
            return Err(DisplayError::BufferSizeMismatch { expected, actual: buffer.len() });
        }

        let write_buffer = self.plugin.vtable().write_buffer;
        self.call(|h, e| write_buffer(h, buffer.as_ptr(), buffer.len(), e))
    }
}

impl Drop for PluginDriverAdapter {
    fn drop(&mut self) {
        if self.handle.is_null() {
            return;
        }
        debug!("Destroying plugin driver instance: {:p}", self.handle);

        let destroy = self.plugin.vtable().destroy;
        let handle = std::mem::replace(&mut self.handle, std::ptr::null_mut());
        destroy_instance(|h| destroy(h), handle);
    }
}

/// Hand an instance back to the plugin; a panic there is logged and dropped
fn destroy_instance(destroy: impl FnOnce(*mut FbtftDriverHandle), handle: *mut FbtftDriverHandle) {
    let _ = catch_ffi_call(|| {
        destroy(handle);
        FbtftErrorCode::Success
    });
}

fn check(code: Result<FbtftErrorCode, FbtftError>, error: FbtftError) -> Result<(), DisplayError> {
    match code {
        Ok(FbtftErrorCode::Success) => Ok(()),
        Ok(code) if error.code == FbtftErrorCode::Success => {
            // plugin failed without filling the error block
            Err(FbtftError::new(code, &format!("plugin call failed ({:?})", code)).into())
        }
        Ok(_) => Err(error.into()),
        Err(panic_error) => Err(panic_error.into()),
    }
}

/// Run a plugin call, turning a panic into `ErrorPanic`
///
/// Unwinding must not cross into or out of plugin code.
fn catch_ffi_call<F>(f: F) -> Result<FbtftErrorCode, FbtftError>
where
    F: FnOnce() -> FbtftErrorCode,
{
    panic::catch_unwind(AssertUnwindSafe(f)).map_err(|payload| {
        let message = if let Some(s) = payload.downcast_ref::<&str>() {
            format!("Plugin panic: {}", s)
        } else if let Some(s) = payload.downcast_ref::<String>() {
            format!("Plugin panic: {}", s)
        } else {
            "Plugin panic: unknown error".to_string()
        };

        error!("Caught panic in plugin FFI call: {}", message);
        FbtftError::new(FbtftErrorCode::ErrorPanic, &message)
    })
}
