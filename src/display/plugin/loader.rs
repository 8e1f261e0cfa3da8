/*
 *  display/plugin/loader.rs
 *
 *  fbtft - small panels, big pixels
 *  (c) 2020-26 Stuart Hunter
 *
 *  Find driver plugins on disk and bind their vtables
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

use std::ffi::c_char;
use std::path::{Path, PathBuf};

use libloading::{Library, Symbol};
use log::{debug, info, warn};

use super::ffi::{
    extract_string_from_buffer, FbtftPluginVTable, PluginRegisterFn,
    FBTFT_PLUGIN_ABI_VERSION_MAJOR, FBTFT_PLUGIN_ABI_VERSION_MINOR,
    FBTFT_PLUGIN_ABI_VERSION_PATCH, FBTFT_PLUGIN_COMPATIBLE_SIZE, FBTFT_PLUGIN_NAME_SIZE,
    FBTFT_PLUGIN_REGISTER_SYMBOL, FBTFT_PLUGIN_VERSION_SIZE,
};

/// Environment variable naming an extra plugin directory, searched first
pub const DRIVER_PATH_ENV: &str = "FBTFT_DRIVER_PATH";

/// What a plugin says about itself
#[derive(Debug, Clone)]
pub struct PluginMetadata {
    /// e.g. "fbtft SEPS114A driver"
    pub name: String,
    pub version: String,
    /// Device compatible string, e.g. "syncoam,seps114a"
    pub compatible: String,
    pub abi_version: (u32, u32, u32),
}

/// A loaded plugin with its library and vtable
///
/// The vtable points into the library, so the two live and die together.
pub struct LoadedPlugin {
    vtable: &'static FbtftPluginVTable,
    metadata: PluginMetadata,
    _library: Library,
}

impl LoadedPlugin {
    pub fn vtable(&self) -> &FbtftPluginVTable {
        self.vtable
    }

    pub fn metadata(&self) -> &PluginMetadata {
        &self.metadata
    }
}

/// Plugin loader - searches for and loads display driver plugins
pub struct PluginLoader;

impl PluginLoader {
    /// Plugin directories in priority order
    pub fn search_paths() -> Vec<PathBuf> {
        let mut paths = Vec::new();

        if let Some(path) = std::env::var_os(DRIVER_PATH_ENV).filter(|p| !p.is_empty()) {
            paths.push(PathBuf::from(path));
        }

        // development tree
        paths.push(PathBuf::from("./target/release/drivers"));

        if let Some(home) = dirs_next::home_dir() {
            paths.push(home.join(".local/lib/fbtft/drivers"));
        }

        paths.push(PathBuf::from("/usr/local/lib/fbtft/drivers"));
        paths.push(PathBuf::from("/usr/lib/fbtft/drivers"));

        paths
    }

    /// Candidate file names for a driver, e.g. `libfbtft_seps114a.so`
    pub fn plugin_filenames(driver_type: &str) -> Vec<String> {
        let (prefix, ext) = if cfg!(target_os = "windows") {
            ("", "dll")
        } else if cfg!(target_os = "macos") {
            ("lib", "dylib")
        } else {
            ("lib", "so")
        };

        ["_", "-"]
            .iter()
            .map(|sep| format!("{}fbtft{}{}.{}", prefix, sep, driver_type, ext))
            .collect()
    }

    /// First existing plugin file for `driver_type` along the search path
    pub fn find_plugin(driver_type: &str) -> Option<PathBuf> {
        let filenames = Self::plugin_filenames(driver_type);

        let found = Self::search_paths()
            .into_iter()
            .filter(|dir| dir.is_dir())
            .flat_map(|dir| filenames.iter().map(move |f| dir.join(f)).collect::<Vec<_>>())
            .find(|candidate| candidate.is_file());

        match &found {
            Some(path) => debug!("Found plugin at: {}", path.display()),
            None => debug!("Plugin not found for driver: {}", driver_type),
        }
        found
    }

    /// Load a plugin from a specific path, checking its ABI version
    pub fn load_plugin<P: AsRef<Path>>(path: P) -> Result<LoadedPlugin, String> {
        let path = path.as_ref();
        info!("Loading plugin from: {}", path.display());

        // SAFETY: loading runs the library's initializers; plugins are trusted code
        let library = unsafe { Library::new(path) }
            .map_err(|e| format!("Failed to load library: {}", e))?;

        let vtable_ptr = {
            // SAFETY: the symbol type matches PluginRegisterFn for conforming plugins
            let register: Symbol<PluginRegisterFn> = unsafe {
                library.get(FBTFT_PLUGIN_REGISTER_SYMBOL)
            }
            .map_err(|e| format!("Failed to find registration function: {}", e))?;
            register()
        };

        if vtable_ptr.is_null() {
            return Err("Plugin registration returned null vtable".to_string());
        }

        // SAFETY: the vtable is a static inside the library, which we keep alive
        let vtable: &'static FbtftPluginVTable = unsafe { &*vtable_ptr };

        let (mut major, mut minor, mut patch) = (0u32, 0u32, 0u32);
        (vtable.abi_version)(&mut major, &mut minor, &mut patch);
        check_abi((major, minor, patch))?;

        let mut name = [0 as c_char; FBTFT_PLUGIN_NAME_SIZE];
        let mut version = [0 as c_char; FBTFT_PLUGIN_VERSION_SIZE];
        let mut compatible = [0 as c_char; FBTFT_PLUGIN_COMPATIBLE_SIZE];
        (vtable.plugin_info)(name.as_mut_ptr(), version.as_mut_ptr(), compatible.as_mut_ptr());

        let metadata = PluginMetadata {
            name: extract_string_from_buffer(&name),
            version: extract_string_from_buffer(&version),
            compatible: extract_string_from_buffer(&compatible),
            abi_version: (major, minor, patch),
        };

        info!(
            "Loaded plugin: {} v{} ({})",
            metadata.name, metadata.version, metadata.compatible
        );

        Ok(LoadedPlugin {
            vtable,
            metadata,
            _library: library,
        })
    }

    /// Search for and load the plugin for `driver_type`
    pub fn load_by_driver_type(driver_type: &str) -> Result<LoadedPlugin, String> {
        let path = Self::find_plugin(driver_type)
            .ok_or_else(|| format!("Plugin not found for driver: {}", driver_type))?;

        Self::load_plugin(path)
    }
}

/// Same major version is required; a newer minor only earns a warning
fn check_abi((major, minor, patch): (u32, u32, u32)) -> Result<(), String> {
    debug!(
        "Plugin ABI {}.{}.{}, host ABI {}.{}.{}",
        major,
        minor,
        patch,
        FBTFT_PLUGIN_ABI_VERSION_MAJOR,
        FBTFT_PLUGIN_ABI_VERSION_MINOR,
        FBTFT_PLUGIN_ABI_VERSION_PATCH
    );

    if major != FBTFT_PLUGIN_ABI_VERSION_MAJOR {
        return Err(format!(
            "ABI version mismatch: plugin {}.{}.{} incompatible with host {}.{}.{}",
            major,
            minor,
            patch,
            FBTFT_PLUGIN_ABI_VERSION_MAJOR,
            FBTFT_PLUGIN_ABI_VERSION_MINOR,
            FBTFT_PLUGIN_ABI_VERSION_PATCH
        ));
    }

    if minor > FBTFT_PLUGIN_ABI_VERSION_MINOR {
        warn!(
            "Plugin ABI {}.{}.{} is newer than host {}.{}.{}",
            major,
            minor,
            patch,
            FBTFT_PLUGIN_ABI_VERSION_MAJOR,
            FBTFT_PLUGIN_ABI_VERSION_MINOR,
            FBTFT_PLUGIN_ABI_VERSION_PATCH
        );
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_search_paths() {
        let paths = PluginLoader::search_paths();

        assert!(paths.iter().any(|p| p.ends_with("target/release/drivers")));
        assert_eq!(paths.last(), Some(&PathBuf::from("/usr/lib/fbtft/drivers")));
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn test_plugin_filenames() {
        let names = PluginLoader::plugin_filenames("seps114a");
        assert_eq!(names, vec!["libfbtft_seps114a.so", "libfbtft-seps114a.so"]);
    }

    #[test]
    fn test_missing_plugin() {
        assert!(PluginLoader::find_plugin("definitely-not-a-panel").is_none());
        assert!(PluginLoader::load_by_driver_type("definitely-not-a-panel").is_err());
    }

    #[test]
    fn test_load_rejects_non_library() {
        let err = PluginLoader::load_plugin("/nonexistent/libfbtft_x.so").err().unwrap();
        assert!(err.contains("Failed to load library"));
    }

    #[test]
    fn test_abi_check() {
        assert!(check_abi((FBTFT_PLUGIN_ABI_VERSION_MAJOR, 0, 0)).is_ok());
        assert!(check_abi((FBTFT_PLUGIN_ABI_VERSION_MAJOR, 99, 0)).is_ok());
        assert!(check_abi((FBTFT_PLUGIN_ABI_VERSION_MAJOR + 1, 0, 0)).is_err());
    }
}
