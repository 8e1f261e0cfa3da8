/*
 *  tests/display_integration.rs
 *
 *  Integration tests for display system
 *
 *  fbtft - small panels, big pixels
 *  (c) 2020-26 Stuart Hunter
 */

use std::convert::Infallible;
use std::sync::{Arc, Mutex};

use display_interface::{DataFormat, DisplayError as BusError, WriteOnlyDataCommand};
use embedded_graphics::pixelcolor::Rgb565;
use embedded_graphics::prelude::*;
use embedded_graphics::primitives::{PrimitiveStyle, Rectangle};
use embedded_hal::delay::DelayNs;
use embedded_hal::digital::{ErrorType, OutputPin};

use fbtft::config::{self, BusConfig, Config, DisplayConfig};
use fbtft::display::plugin::ffi::{display_config_to_ffi, ffi_to_display_config};
use fbtft::display::{
    registry, DisplayDriver, DisplayDriverFactory, DisplayFactoryError, FbtftDevice, FrameBuffer,
    Par,
};

#[cfg(feature = "driver-seps114a")]
use fbtft::display::Seps114a;

/// Bytes sent as commands and as data, in order
#[derive(Clone, Default)]
struct Wire(Arc<Mutex<Vec<(bool, Vec<u8>)>>>);

impl Wire {
    fn commands(&self) -> Vec<u8> {
        self.0
            .lock()
            .unwrap()
            .iter()
            .filter(|(is_cmd, _)| *is_cmd)
            .flat_map(|(_, b)| b.clone())
            .collect()
    }

    fn data_bytes(&self) -> usize {
        self.0
            .lock()
            .unwrap()
            .iter()
            .filter(|(is_cmd, _)| !*is_cmd)
            .map(|(_, b)| b.len())
            .sum()
    }

    fn clear(&self) {
        self.0.lock().unwrap().clear();
    }
}

fn bytes(fmt: DataFormat<'_>) -> Result<Vec<u8>, BusError> {
    match fmt {
        DataFormat::U8(s) => Ok(s.to_vec()),
        DataFormat::U16BEIter(it) => Ok(it.flat_map(u16::to_be_bytes).collect()),
        _ => Err(BusError::DataFormatNotImplemented),
    }
}

impl WriteOnlyDataCommand for Wire {
    fn send_commands(&mut self, cmd: DataFormat<'_>) -> Result<(), BusError> {
        let b = bytes(cmd)?;
        self.0.lock().unwrap().push((true, b));
        Ok(())
    }

    fn send_data(&mut self, buf: DataFormat<'_>) -> Result<(), BusError> {
        let b = bytes(buf)?;
        self.0.lock().unwrap().push((false, b));
        Ok(())
    }
}

struct NoPin;

impl ErrorType for NoPin {
    type Error = Infallible;
}

impl OutputPin for NoPin {
    fn set_low(&mut self) -> Result<(), Infallible> {
        Ok(())
    }

    fn set_high(&mut self) -> Result<(), Infallible> {
        Ok(())
    }
}

struct NoDelay;

impl DelayNs for NoDelay {
    fn delay_ns(&mut self, _ns: u32) {}
}

fn spi_bus(path: &str) -> Option<BusConfig> {
    Some(BusConfig::Spi {
        bus: path.to_string(),
        speed_hz: Some(16_000_000),
        dc_pin: Some(24),
        rst_pin: Some(25),
        gpio_chip: None,
    })
}

#[cfg(feature = "driver-seps114a")]
#[test]
fn test_registry_knows_seps114a() {
    let reg = registry::find("syncoam,seps114a").expect("seps114a registered");
    assert_eq!(reg.name, "fb_seps114a");
    assert!(registry::find("spi:seps114a").is_some());
    assert_eq!((reg.display.width, reg.display.height, reg.display.bpp), (96, 96, 16));
}

#[test]
fn test_yaml_config() {
    let yaml = r#"
log_level: debug
display:
  driver: syncoam,seps114a
  debug: 2097152
  bus:
    type: spi
    bus: /dev/spidev0.0
    speed_hz: 16000000
    dc_pin: 24
    rst_pin: 25
"#;
    let cfg: Config = serde_yaml::from_str(yaml).unwrap();
    config::validate(&cfg).unwrap();

    let display = cfg.display.unwrap();
    assert_eq!(display.driver.as_deref(), Some("syncoam,seps114a"));
    assert_eq!(display.debug, Some(1 << 21));
    assert_eq!(display.bus, spi_bus("/dev/spidev0.0"));
}

#[test]
fn test_yaml_config_from_file() {
    let path = std::env::temp_dir().join(format!("fbtft-it-{}.yaml", std::process::id()));
    std::fs::write(&path, "display:\n  driver: seps114a\n").unwrap();

    let cfg = config::read_yaml(&path).unwrap();
    std::fs::remove_file(&path).ok();

    assert_eq!(cfg.display.unwrap().driver.as_deref(), Some("seps114a"));
}

#[test]
fn test_factory_errors() {
    let no_driver = DisplayConfig { bus: spi_bus("/dev/spidev0.0"), ..Default::default() };
    assert!(matches!(
        DisplayDriverFactory::create_from_config(&no_driver),
        Err(DisplayFactoryError::NoDriverSpecified)
    ));

    let no_bus = DisplayConfig { driver: Some("seps114a".into()), ..Default::default() };
    assert!(matches!(
        DisplayDriverFactory::create_from_config(&no_bus),
        Err(DisplayFactoryError::NoBusConfiguration)
    ));

    let unknown = DisplayConfig {
        driver: Some("not-a-real-panel".into()),
        bus: spi_bus("/dev/spidev0.0"),
        ..Default::default()
    };
    assert!(matches!(
        DisplayDriverFactory::create_from_config(&unknown),
        Err(DisplayFactoryError::UnknownDriver(_))
    ));
}

#[cfg(feature = "driver-seps114a")]
#[test]
fn test_factory_missing_spi_device() {
    let config = DisplayConfig {
        driver: Some("fb_seps114a".into()),
        bus: spi_bus("/nonexistent/spidev7.7"),
        ..Default::default()
    };
    assert!(matches!(
        DisplayDriverFactory::create_from_config(&config),
        Err(DisplayFactoryError::DriverInitFailed(_))
    ));
}

#[test]
fn test_ffi_config_keeps_wiring() {
    let config = DisplayConfig {
        driver: Some("seps114a".into()),
        bus: spi_bus("/dev/spidev1.0"),
        debug: Some(0x0400_0000),
    };
    let back = ffi_to_display_config(&display_config_to_ffi(&config).unwrap());
    assert_eq!(back.bus, config.bus);
    assert_eq!(back.debug, config.debug);
}

#[test]
fn test_framebuffer_dirty_rows() {
    let mut fb = FrameBuffer::new(96, 96);
    assert_eq!(fb.dirty_rows(), None);

    Rectangle::new(Point::new(10, 20), Size::new(5, 3))
        .into_styled(PrimitiveStyle::with_fill(Rgb565::GREEN))
        .draw(&mut fb)
        .unwrap();

    assert_eq!(fb.take_dirty(), Some((20, 22)));
    assert_eq!(fb.pixel(12, 21), Some(Rgb565::GREEN));
    assert_eq!(fb.dirty_rows(), None);
}

#[cfg(feature = "driver-seps114a")]
#[test]
fn test_device_over_custom_bus() {
    let wire = Wire::default();
    let par = Par::new(wire.clone(), None::<NoPin>, NoDelay);
    let mut device = FbtftDevice::new(Seps114a::new(par)).unwrap();

    device.init().unwrap();
    // power-up sequence starts with a soft reset
    assert_eq!(wire.commands()[0], 0x01);
    // 35 register values, 9216 white pixels, then a window and one black frame
    assert_eq!(wire.data_bytes(), 35 + 96 * 96 * 2 + 5 + 96 * 96 * 2);
    assert_eq!(wire.commands().len(), 36 + 6);

    wire.clear();
    Rectangle::new(Point::new(0, 40), Size::new(96, 2))
        .into_styled(PrimitiveStyle::with_fill(Rgb565::BLUE))
        .draw(&mut device)
        .unwrap();
    device.flush().unwrap();

    // window setup then the DDRAM access port
    assert_eq!(wire.commands(), vec![0x1D, 0x34, 0x35, 0x36, 0x37, 0x08]);
    // five one-byte register values plus two rows of pixels
    assert_eq!(wire.data_bytes(), 5 + 2 * 96 * 2);
}
