/*
 *  fbtft SEPS114A Plugin - vtable implementation
 *
 *  Wraps the built-in SEPS114A driver behind the plugin C ABI
 */

use std::ffi::c_char;
use std::panic::{catch_unwind, AssertUnwindSafe};

use fbtft::display::drivers::seps114a;
use fbtft::display::plugin::ffi::*;
use fbtft::display::{BoxedDriver, DisplayDriver, DisplayError};

/// What a driver handle points at
type Instance = BoxedDriver;

macro_rules! plugin_log {
    ($($arg:tt)*) => {
        #[cfg(feature = "debug-logging")]
        log::debug!($($arg)*);
    };
}

/// Store an error in the caller's error block, if it passed one
fn report(error: *mut FbtftError, code: FbtftErrorCode, message: &str) -> FbtftErrorCode {
    if !error.is_null() {
        // SAFETY: non-null error pointers point at a caller-owned FbtftError
        unsafe { *error = FbtftError::new(code, message) };
    }
    code
}

fn report_display_error(error: *mut FbtftError, e: DisplayError) -> FbtftErrorCode {
    let e = FbtftError::from(e);
    let code = e.code;
    if !error.is_null() {
        // SAFETY: as in report()
        unsafe { *error = e };
    }
    code
}

/// Run `f`, converting a panic into `ErrorPanic`
fn catch_panic(error: *mut FbtftError, f: impl FnOnce() -> FbtftErrorCode) -> FbtftErrorCode {
    match catch_unwind(AssertUnwindSafe(f)) {
        Ok(code) => code,
        Err(payload) => {
            let message = if let Some(s) = payload.downcast_ref::<&str>() {
                format!("Plugin panic: {}", s)
            } else if let Some(s) = payload.downcast_ref::<String>() {
                format!("Plugin panic: {}", s)
            } else {
                "Plugin panic: unknown error".to_string()
            };
            report(error, FbtftErrorCode::ErrorPanic, &message)
        }
    }
}

/// Run one driver operation against a handle
fn with_driver(
    handle: *mut FbtftDriverHandle,
    error: *mut FbtftError,
    op: &str,
    f: impl FnOnce(&mut Instance) -> Result<(), DisplayError>,
) -> FbtftErrorCode {
    catch_panic(error, || {
        if handle.is_null() {
            return report(
                error,
                FbtftErrorCode::ErrorNullPointer,
                &format!("Null handle passed to {}", op),
            );
        }

        // SAFETY: handles are only produced by create() and freed by destroy()
        let driver = unsafe { &mut *(handle as *mut Instance) };
        match f(driver) {
            Ok(()) => FbtftErrorCode::Success,
            Err(e) => report_display_error(error, e),
        }
    })
}

extern "C" fn abi_version(major: *mut u32, minor: *mut u32, patch: *mut u32) {
    if major.is_null() || minor.is_null() || patch.is_null() {
        return;
    }
    // SAFETY: checked non-null above
    unsafe {
        *major = FBTFT_PLUGIN_ABI_VERSION_MAJOR;
        *minor = FBTFT_PLUGIN_ABI_VERSION_MINOR;
        *patch = FBTFT_PLUGIN_ABI_VERSION_PATCH;
    }
}

/// Fill the caller's metadata buffers, sized per the FFI constants
extern "C" fn plugin_info(name: *mut c_char, version: *mut c_char, compatible: *mut c_char) {
    let fill = |dst: *mut c_char, size: usize, s: &str| {
        if !dst.is_null() {
            // SAFETY: the host hands in buffers of the documented sizes
            copy_str_to_buffer(s, unsafe { std::slice::from_raw_parts_mut(dst, size) });
        }
    };
    fill(name, FBTFT_PLUGIN_NAME_SIZE, "fbtft SEPS114A driver");
    fill(version, FBTFT_PLUGIN_VERSION_SIZE, env!("CARGO_PKG_VERSION"));
    fill(compatible, FBTFT_PLUGIN_COMPATIBLE_SIZE, seps114a::COMPATIBLE);
}

extern "C" fn create(
    config: *const FbtftDisplayConfig,
    handle: *mut *mut FbtftDriverHandle,
    error: *mut FbtftError,
) -> FbtftErrorCode {
    catch_panic(error, || {
        if config.is_null() || handle.is_null() {
            return report(
                error,
                FbtftErrorCode::ErrorNullPointer,
                "Null pointer passed to create",
            );
        }

        // SAFETY: checked non-null above
        let mut display_config = ffi_to_display_config(unsafe { &*config });
        display_config.driver = Some(seps114a::DRVNAME.to_string());
        plugin_log!("creating SEPS114A instance: {:?}", display_config.bus);

        match seps114a::probe(&display_config) {
            Ok(driver) => {
                let instance: Box<Instance> = Box::new(driver);
                // SAFETY: checked non-null above
                unsafe { *handle = Box::into_raw(instance) as *mut FbtftDriverHandle };
                FbtftErrorCode::Success
            }
            Err(e) => report_display_error(error, e),
        }
    })
}

extern "C" fn destroy(handle: *mut FbtftDriverHandle) {
    if handle.is_null() {
        return;
    }
    plugin_log!("destroying SEPS114A instance");
    // SAFETY: the handle came from Box::into_raw in create()
    drop(unsafe { Box::from_raw(handle as *mut Instance) });
}

extern "C" fn capabilities(
    handle: *const FbtftDriverHandle,
    caps: *mut FbtftDisplayCapabilities,
    error: *mut FbtftError,
) -> FbtftErrorCode {
    if caps.is_null() {
        return report(
            error,
            FbtftErrorCode::ErrorNullPointer,
            "Null pointer passed to capabilities",
        );
    }
    with_driver(handle as *mut FbtftDriverHandle, error, "capabilities", |d| {
        // SAFETY: checked non-null above
        unsafe { *caps = FbtftDisplayCapabilities::from(d.capabilities()) };
        Ok(())
    })
}

extern "C" fn init(handle: *mut FbtftDriverHandle, error: *mut FbtftError) -> FbtftErrorCode {
    with_driver(handle, error, "init", |d| d.init())
}

extern "C" fn reset(handle: *mut FbtftDriverHandle, error: *mut FbtftError) -> FbtftErrorCode {
    with_driver(handle, error, "reset", |d| d.reset())
}

extern "C" fn flush(handle: *mut FbtftDriverHandle, error: *mut FbtftError) -> FbtftErrorCode {
    with_driver(handle, error, "flush", |d| d.flush())
}

extern "C" fn clear(handle: *mut FbtftDriverHandle, error: *mut FbtftError) -> FbtftErrorCode {
    with_driver(handle, error, "clear", |d| d.clear())
}

extern "C" fn write_buffer(
    handle: *mut FbtftDriverHandle,
    buffer: *const u8,
    length: usize,
    error: *mut FbtftError,
) -> FbtftErrorCode {
    if buffer.is_null() {
        return report(
            error,
            FbtftErrorCode::ErrorNullPointer,
            "Null pointer passed to write_buffer",
        );
    }
    // SAFETY: the host passes a live buffer of `length` bytes
    let data = unsafe { std::slice::from_raw_parts(buffer, length) };
    with_driver(handle, error, "write_buffer", |d| d.write_buffer(data))
}

static VTABLE: FbtftPluginVTable = FbtftPluginVTable {
    abi_version,
    plugin_info,
    create,
    destroy,
    capabilities,
    init,
    reset,
    flush,
    clear,
    write_buffer,
};

/// Plugin entry point - returns the vtable
#[no_mangle]
pub extern "C" fn fbtft_plugin_register() -> *const FbtftPluginVTable {
    &VTABLE
}
