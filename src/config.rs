/*
 *  config.rs
 *
 *  fbtft - small panels, big pixels
 *  (c) 2020-26 Stuart Hunter
 *
 *  Configuration: YAML file layered under command line overrides
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

use clap::{ArgAction, Parser, Subcommand, ValueHint};
use dirs_next::home_dir;
use serde::{Deserialize, Serialize};
use std::{fs, path::{Path, PathBuf}};
use thiserror::Error;

/// Error type for config loading/validation.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("YAML parse error: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Validation error: {0}")]
    Validation(String),
}

/// Top-level app configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct Config {
    /// e.g. "info" | "debug"
    pub log_level: Option<String>,
    pub display: Option<DisplayConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct DisplayConfig {
    /// Compatible string, driver name or module alias ("syncoam,seps114a")
    pub driver: Option<String>,
    pub bus: Option<BusConfig>,
    /// Debug flag mask handed to the panel context (see `DebugFlags`)
    pub debug: Option<u32>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum BusConfig {
    Spi {
        bus: String,                // e.g. "/dev/spidev0.0"
        speed_hz: Option<u32>,
        dc_pin: Option<u32>,        // line offset on gpio_chip, absent for 3-wire panels
        rst_pin: Option<u32>,
        gpio_chip: Option<String>,  // defaults to /dev/gpiochip0
    },
}

/// CLI overrides. All fields are Options so we can layer them over YAML.
#[derive(Debug, Parser, Clone)]
#[command(name = "fbtft", version, about = "Small SPI panel framebuffer host")]
pub struct Cli {
    /// Path to a YAML config file (overrides search)
    #[arg(long, value_hint = ValueHint::FilePath)]
    pub config: Option<PathBuf>,
    #[arg(long)]
    pub log_level: Option<String>,
    /// Driver compatible string or alias, e.g. "syncoam,seps114a"
    #[arg(long)]
    pub driver: Option<String>,
    /// SPI device node
    #[arg(long, value_hint = ValueHint::FilePath)]
    pub spi: Option<String>,
    #[arg(long)]
    pub speed_hz: Option<u32>,
    #[arg(long)]
    pub dc_pin: Option<u32>,
    #[arg(long)]
    pub rst_pin: Option<u32>,
    #[arg(long)]
    pub gpio_chip: Option<String>,
    /// Debug flag mask, decimal or 0x-prefixed hex
    #[arg(long, value_parser = parse_mask)]
    pub debug: Option<u32>,
    /// dump fully merged config (after overrides) and exit
    #[arg(long, action = ArgAction::SetTrue)]
    pub dump_config: bool,
    #[command(subcommand)]
    pub command: Option<Action>,
}

#[derive(Debug, Subcommand, Clone, PartialEq)]
pub enum Action {
    /// List registered drivers and their aliases
    List,
    /// Probe and run the panel init sequence
    Init,
    /// Pulse the reset line
    Reset,
    /// Init, then blank the panel
    Clear,
    /// Init, then fill the panel with an RRGGBB colour
    Fill { color: String },
    /// Init, then draw colour bars
    TestPattern,
}

fn parse_mask(s: &str) -> Result<u32, String> {
    let parsed = match s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        Some(hex) => u32::from_str_radix(hex, 16),
        None => s.parse::<u32>(),
    };
    parsed.map_err(|e| format!("invalid debug mask '{}': {}", s, e))
}

/// Public entry point: read YAML, merge CLI, validate.
pub fn load(cli: &Cli) -> Result<Config, ConfigError> {
    // 1) defaults (from `Default` impl)
    let mut cfg = Config::default();

    // 2) YAML file (explicit path or search)
    if let Some(p) = cli.config.as_ref() {
        if !p.exists() {
            return Err(ConfigError::Validation(format!(
                "Config file not found: {}",
                p.display()
            )));
        }
        merge(&mut cfg, read_yaml(p)?);
    } else if let Some(p) = find_config_file() {
        merge(&mut cfg, read_yaml(&p)?);
    }

    // 3) CLI overrides (highest precedence)
    apply_cli_overrides(&mut cfg, cli);

    // 4) Validate
    validate(&cfg)?;

    Ok(cfg)
}

/// Try common locations in order (first hit wins).
fn find_config_file() -> Option<PathBuf> {
    // XDG-style: ~/.config/fbtft/config.yaml
    if let Some(home) = home_dir() {
        let p = home.join(".config/fbtft/config.yaml");
        if p.exists() { return Some(p) }
        let p = home.join(".config/fbtft.yaml");
        if p.exists() { return Some(p) }
    }
    // project local
    for candidate in &["fbtft.yaml", "config.yaml", "config/fbtft.yaml"] {
        let p = PathBuf::from(candidate);
        if p.exists() { return Some(p) }
    }
    None
}

pub fn read_yaml(path: &Path) -> Result<Config, ConfigError> {
    let s = fs::read_to_string(path)?;
    let cfg: Config = serde_yaml::from_str(&s)?;
    Ok(cfg)
}

/// Shallow merge `src` into `dst`, Option-by-Option.
fn merge(dst: &mut Config, src: Config) {
    if src.log_level.is_some() { dst.log_level = src.log_level; }
    match (&mut dst.display, src.display) {
        (None, Some(c)) => dst.display = Some(c),
        (Some(d), Some(s)) => merge_display(d, s),
        _ => {}
    }
}

fn merge_display(dst: &mut DisplayConfig, src: DisplayConfig) {
    if src.driver.is_some() { dst.driver = src.driver; }
    if src.bus.is_some()    { dst.bus = src.bus; }
    if src.debug.is_some()  { dst.debug = src.debug; }
}

fn apply_cli_overrides(cfg: &mut Config, cli: &Cli) {
    if cli.log_level.is_some() { cfg.log_level = cli.log_level.clone(); }

    let any_bus = cli.spi.is_some()
        || cli.speed_hz.is_some()
        || cli.dc_pin.is_some()
        || cli.rst_pin.is_some()
        || cli.gpio_chip.is_some();
    let any_display = any_bus || cli.driver.is_some() || cli.debug.is_some();

    if any_display && cfg.display.is_none() {
        cfg.display = Some(DisplayConfig::default());
    }
    let Some(display) = cfg.display.as_mut() else { return };

    if cli.driver.is_some() { display.driver = cli.driver.clone(); }
    if cli.debug.is_some()  { display.debug = cli.debug; }

    if !any_bus {
        return;
    }
    match display.bus.as_mut() {
        Some(BusConfig::Spi { bus, speed_hz, dc_pin, rst_pin, gpio_chip }) => {
            if let Some(p) = cli.spi.as_ref()       { *bus = p.clone(); }
            if cli.speed_hz.is_some()               { *speed_hz = cli.speed_hz; }
            if cli.dc_pin.is_some()                 { *dc_pin = cli.dc_pin; }
            if cli.rst_pin.is_some()                { *rst_pin = cli.rst_pin; }
            if cli.gpio_chip.is_some()              { *gpio_chip = cli.gpio_chip.clone(); }
        }
        None => {
            display.bus = Some(BusConfig::Spi {
                bus: cli.spi.clone().unwrap_or_else(|| "/dev/spidev0.0".to_string()),
                speed_hz: cli.speed_hz,
                dc_pin: cli.dc_pin,
                rst_pin: cli.rst_pin,
                gpio_chip: cli.gpio_chip.clone(),
            });
        }
    }
}

/// Put any invariants here (required fields, ranges, etc.)
pub fn validate(cfg: &Config) -> Result<(), ConfigError> {
    let Some(display) = cfg.display.as_ref() else { return Ok(()) };

    if let Some(driver) = display.driver.as_deref() {
        if driver.trim().is_empty() {
            return Err(ConfigError::Validation("display driver must not be empty".into()));
        }
    }
    if let Some(BusConfig::Spi { bus, speed_hz, dc_pin, rst_pin, .. }) = display.bus.as_ref() {
        if bus.is_empty() {
            return Err(ConfigError::Validation("spi bus path must not be empty".into()));
        }
        if *speed_hz == Some(0) {
            return Err(ConfigError::Validation("spi speed_hz must be > 0".into()));
        }
        if dc_pin.is_some() && dc_pin == rst_pin {
            return Err(ConfigError::Validation("dc_pin and rst_pin must differ".into()));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cli(args: &[&str]) -> Cli {
        let mut argv = vec!["fbtft"];
        argv.extend_from_slice(args);
        Cli::parse_from(argv)
    }

    #[test]
    fn test_yaml_spi_bus() {
        let yaml = r#"
log_level: debug
display:
  driver: "syncoam,seps114a"
  debug: 67108864
  bus:
    type: spi
    bus: /dev/spidev0.0
    speed_hz: 16000000
    dc_pin: 24
    rst_pin: 25
"#;
        let cfg: Config = serde_yaml::from_str(yaml).unwrap();
        let display = cfg.display.unwrap();
        assert_eq!(display.driver.as_deref(), Some("syncoam,seps114a"));
        assert_eq!(display.debug, Some(0x4000000));
        match display.bus.unwrap() {
            BusConfig::Spi { bus, dc_pin, rst_pin, gpio_chip, .. } => {
                assert_eq!(bus, "/dev/spidev0.0");
                assert_eq!(dc_pin, Some(24));
                assert_eq!(rst_pin, Some(25));
                assert_eq!(gpio_chip, None);
            }
        }
    }

    #[test]
    fn test_cli_overrides_bus_fields() {
        let mut cfg = Config {
            log_level: None,
            display: Some(DisplayConfig {
                driver: Some("seps114a".into()),
                bus: Some(BusConfig::Spi {
                    bus: "/dev/spidev0.0".into(),
                    speed_hz: None,
                    dc_pin: Some(24),
                    rst_pin: Some(25),
                    gpio_chip: None,
                }),
                debug: None,
            }),
        };
        apply_cli_overrides(&mut cfg, &cli(&["--spi", "/dev/spidev1.0", "--rst-pin", "17", "list"]));

        let Some(BusConfig::Spi { bus, dc_pin, rst_pin, .. }) = cfg.display.unwrap().bus else {
            panic!("bus missing");
        };
        assert_eq!(bus, "/dev/spidev1.0");
        assert_eq!(dc_pin, Some(24));
        assert_eq!(rst_pin, Some(17));
    }

    #[test]
    fn test_cli_creates_display_section() {
        let mut cfg = Config::default();
        apply_cli_overrides(&mut cfg, &cli(&["--driver", "spi:seps114a", "--dc-pin", "24", "init"]));

        let display = cfg.display.unwrap();
        assert_eq!(display.driver.as_deref(), Some("spi:seps114a"));
        assert!(matches!(
            display.bus,
            Some(BusConfig::Spi { dc_pin: Some(24), rst_pin: None, .. })
        ));
    }

    #[test]
    fn test_parse_mask_hex_and_decimal() {
        assert_eq!(parse_mask("0x400000"), Ok(0x400000));
        assert_eq!(parse_mask("1024"), Ok(1024));
        assert!(parse_mask("zz").is_err());
    }

    #[test]
    fn test_validate_rejects_shared_pins() {
        let cfg = Config {
            log_level: None,
            display: Some(DisplayConfig {
                driver: Some("seps114a".into()),
                bus: Some(BusConfig::Spi {
                    bus: "/dev/spidev0.0".into(),
                    speed_hz: None,
                    dc_pin: Some(24),
                    rst_pin: Some(24),
                    gpio_chip: None,
                }),
                debug: None,
            }),
        };
        assert!(validate(&cfg).is_err());
    }

    #[test]
    fn test_validate_rejects_zero_speed() {
        let cfg = Config {
            log_level: None,
            display: Some(DisplayConfig {
                driver: None,
                bus: Some(BusConfig::Spi {
                    bus: "/dev/spidev0.0".into(),
                    speed_hz: Some(0),
                    dc_pin: None,
                    rst_pin: None,
                    gpio_chip: None,
                }),
                debug: None,
            }),
        };
        assert!(validate(&cfg).is_err());
    }
}
