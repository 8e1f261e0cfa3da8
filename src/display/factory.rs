/*
 *  display/factory.rs
 *
 *  fbtft - small panels, big pixels
 *  (c) 2020-26 Stuart Hunter
 *
 *  Resolve a display config to a bound panel driver
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

use log::{debug, info};

use crate::config::DisplayConfig;
use crate::display::error::DisplayFactoryError;
use crate::display::registry;
use crate::display::traits::DisplayDriver;

#[cfg(feature = "plugin-system")]
use crate::display::plugin::{PluginDriverAdapter, PluginLoader};

/// Type alias for boxed display driver trait objects
pub type BoxedDriver = Box<dyn DisplayDriver>;

/// Factory for creating display drivers from configuration
pub struct DisplayDriverFactory;

impl DisplayDriverFactory {
    /// Create a display driver from configuration
    ///
    /// A matching plugin wins over the built-in driver of the same name, so a
    /// panel can be fixed in the field without rebuilding the host. The
    /// driver is returned probed but not initialized.
    ///
    /// ```ignore
    /// let config = DisplayConfig {
    ///     driver: Some("seps114a".to_string()),
    ///     bus: Some(BusConfig::Spi {
    ///         bus: "/dev/spidev0.0".to_string(),
    ///         speed_hz: None,
    ///         dc_pin: Some(24),
    ///         rst_pin: Some(25),
    ///         gpio_chip: None,
    ///     }),
    ///     ..Default::default()
    /// };
    ///
    /// let mut driver = DisplayDriverFactory::create_from_config(&config)?;
    /// driver.init()?;
    /// ```
    pub fn create_from_config(config: &DisplayConfig) -> Result<BoxedDriver, DisplayFactoryError> {
        Self::validate_config(config)?;
        let name = config.driver.as_deref().unwrap_or_default().trim();
        let builtin = registry::find(name);

        #[cfg(feature = "plugin-system")]
        {
            let plugin_name = builtin
                .map(|reg| reg.short_name().to_string())
                .unwrap_or_else(|| plugin_name(name));
            if let Some(driver) = Self::try_load_plugin(config, &plugin_name) {
                info!("Using plugin driver for {}", plugin_name);
                return Ok(driver);
            }
            debug!("No usable plugin for {}, trying built-in drivers", plugin_name);
        }

        let reg = builtin.ok_or_else(|| DisplayFactoryError::UnknownDriver(name.to_string()))?;
        info!("Using built-in driver {} ({})", reg.name, reg.compatible);

        (reg.probe)(config).map_err(DisplayFactoryError::DriverInitFailed)
    }

    /// Load and bind a plugin, or None when there is none to use
    #[cfg(feature = "plugin-system")]
    fn try_load_plugin(config: &DisplayConfig, plugin_name: &str) -> Option<BoxedDriver> {
        debug!("Searching for plugin: {}", plugin_name);

        let plugin = match PluginLoader::load_by_driver_type(plugin_name) {
            Ok(plugin) => plugin,
            Err(e) => {
                debug!("Failed to load plugin: {}", e);
                return None;
            }
        };

        info!(
            "Loaded plugin: {} v{}",
            plugin.metadata().name,
            plugin.metadata().version
        );

        match PluginDriverAdapter::new(plugin, config) {
            Ok(adapter) => Some(Box::new(adapter)),
            Err(e) => {
                info!("Failed to create plugin driver: {}", e);
                None
            }
        }
    }

    /// Validate a configuration without touching hardware
    pub fn validate_config(config: &DisplayConfig) -> Result<(), DisplayFactoryError> {
        let name = config
            .driver
            .as_deref()
            .map(str::trim)
            .filter(|n| !n.is_empty())
            .ok_or(DisplayFactoryError::NoDriverSpecified)?;

        if config.bus.is_none() {
            return Err(DisplayFactoryError::NoBusConfiguration);
        }

        if let Some(reg) = registry::find(name) {
            debug!("{} matches built-in driver {}", name, reg.name);
        }
        Ok(())
    }
}

/// Plugin file stem for a driver name the registry does not know
#[cfg(feature = "plugin-system")]
fn plugin_name(name: &str) -> String {
    let name = name.rsplit(|c| c == ':' || c == ',').next().unwrap_or(name);
    name.strip_prefix("fb_").unwrap_or(name).to_ascii_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::BusConfig;

    fn spi(bus: &str) -> Option<BusConfig> {
        Some(BusConfig::Spi {
            bus: bus.to_string(),
            speed_hz: None,
            dc_pin: None,
            rst_pin: None,
            gpio_chip: None,
        })
    }

    #[test]
    fn test_validate_config_no_driver() {
        let config = DisplayConfig {
            driver: None,
            bus: spi("/dev/spidev0.0"),
            ..Default::default()
        };

        assert!(matches!(
            DisplayDriverFactory::validate_config(&config),
            Err(DisplayFactoryError::NoDriverSpecified)
        ));
    }

    #[test]
    fn test_validate_config_blank_driver() {
        let config = DisplayConfig {
            driver: Some("  ".to_string()),
            bus: spi("/dev/spidev0.0"),
            ..Default::default()
        };

        assert!(matches!(
            DisplayDriverFactory::validate_config(&config),
            Err(DisplayFactoryError::NoDriverSpecified)
        ));
    }

    #[test]
    fn test_validate_config_no_bus() {
        let config = DisplayConfig {
            driver: Some("seps114a".to_string()),
            bus: None,
            ..Default::default()
        };

        assert!(matches!(
            DisplayDriverFactory::validate_config(&config),
            Err(DisplayFactoryError::NoBusConfiguration)
        ));
    }

    #[test]
    fn test_unknown_driver() {
        let config = DisplayConfig {
            driver: Some("no-such-panel-xyz".to_string()),
            bus: spi("/dev/spidev0.0"),
            ..Default::default()
        };

        match DisplayDriverFactory::create_from_config(&config) {
            Err(DisplayFactoryError::UnknownDriver(name)) => assert_eq!(name, "no-such-panel-xyz"),
            Err(e) => panic!("unexpected error: {}", e),
            Ok(_) => panic!("unknown driver was accepted"),
        }
    }

    #[cfg(feature = "driver-seps114a")]
    #[test]
    fn test_builtin_probe_failure_is_reported() {
        let config = DisplayConfig {
            driver: Some("syncoam,seps114a".to_string()),
            bus: spi("/nonexistent/spidev9.9"),
            ..Default::default()
        };

        assert!(matches!(
            DisplayDriverFactory::create_from_config(&config),
            Err(DisplayFactoryError::DriverInitFailed(_))
        ));
    }

    #[cfg(feature = "plugin-system")]
    #[test]
    fn test_plugin_name() {
        assert_eq!(plugin_name("fb_ili9341"), "ili9341");
        assert_eq!(plugin_name("spi:fb_ST7735R"), "st7735r");
        assert_eq!(plugin_name("sitronix,st7789v"), "st7789v");
    }
}
