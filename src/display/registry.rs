/*
 *  display/registry.rs
 *
 *  fbtft - small panels, big pixels
 *  (c) 2020-26 Stuart Hunter
 *
 *  Static table of built-in panel drivers
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

use log::debug;

use crate::config::DisplayConfig;
use crate::display::error::DisplayError;
use crate::display::factory::BoxedDriver;
use crate::display::ops::FbtftDisplay;

/// Opens the hardware named in a display config and binds a driver to it
pub type ProbeFn = fn(&DisplayConfig) -> Result<BoxedDriver, DisplayError>;

/// How a built-in driver announces itself
///
/// A driver is found by its name (`fb_seps114a`), the device-tree style
/// compatible string, or any of its module aliases.
pub struct DriverRegistration {
    pub name: &'static str,
    pub compatible: &'static str,
    pub aliases: &'static [&'static str],
    pub display: &'static FbtftDisplay,
    pub probe: ProbeFn,
}

impl DriverRegistration {
    /// Name used for plugin lookup: the driver name without its `fb_` prefix
    pub fn short_name(&self) -> &'static str {
        self.name.strip_prefix("fb_").unwrap_or(self.name)
    }

    pub fn matches(&self, name: &str) -> bool {
        let name = name.trim();
        name.eq_ignore_ascii_case(self.name)
            || name.eq_ignore_ascii_case(self.short_name())
            || name.eq_ignore_ascii_case(self.compatible)
            || self.aliases.iter().any(|a| name.eq_ignore_ascii_case(a))
    }
}

impl std::fmt::Debug for DriverRegistration {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DriverRegistration")
            .field("name", &self.name)
            .field("compatible", &self.compatible)
            .field("aliases", &self.aliases)
            .field("display", &self.display)
            .finish()
    }
}

static DRIVERS: &[&DriverRegistration] = &[
    #[cfg(feature = "driver-seps114a")]
    &crate::display::drivers::seps114a::DRIVER,
];

/// Every driver compiled into this build
pub fn drivers() -> &'static [&'static DriverRegistration] {
    DRIVERS
}

/// Look a driver up by name, compatible string or alias
pub fn find(name: &str) -> Option<&'static DriverRegistration> {
    let found = DRIVERS.iter().copied().find(|d| d.matches(name));
    debug!("registry lookup '{}': {:?}", name, found.map(|d| d.name));
    found
}

#[cfg(all(test, feature = "driver-seps114a"))]
mod tests {
    use super::*;

    #[test]
    fn test_find_by_every_identity() {
        for name in [
            "fb_seps114a",
            "seps114a",
            "syncoam,seps114a",
            "spi:fb_seps114a",
            "spi:seps114a",
            "SEPS114A",
        ] {
            let reg = find(name).unwrap_or_else(|| panic!("{} not found", name));
            assert_eq!(reg.name, "fb_seps114a");
        }
    }

    #[test]
    fn test_find_unknown() {
        assert!(find("ili9341").is_none());
        assert!(find("").is_none());
    }

    #[test]
    fn test_short_name() {
        assert_eq!(find("seps114a").unwrap().short_name(), "seps114a");
    }

    #[test]
    fn test_listed_once() {
        let names: Vec<_> = drivers().iter().map(|d| d.name).collect();
        assert_eq!(names.iter().filter(|n| **n == "fb_seps114a").count(), 1);
    }

    #[test]
    fn test_descriptor_reachable() {
        let reg = find("seps114a").unwrap();
        assert_eq!((reg.display.width, reg.display.height), (96, 96));
        assert_eq!(reg.display.bpp, 16);
    }
}
