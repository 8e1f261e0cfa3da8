/*
 *  main.rs
 *
 *  fbtft - small panels, big pixels
 *  (c) 2020-26 Stuart Hunter
 *
 *  fbtft command line: probe, initialize and exercise a panel
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

use anyhow::{bail, Context, Result};
use clap::Parser;
use embedded_graphics::mono_font::{ascii::FONT_6X10, MonoTextStyle};
use embedded_graphics::pixelcolor::{Rgb565, Rgb888};
use embedded_graphics::prelude::*;
use embedded_graphics::primitives::{PrimitiveStyle, Rectangle};
use embedded_graphics::text::{Alignment, Text};
use env_logger::Env;
use log::{debug, info};

use fbtft::config::{self, Action, Cli};
use fbtft::display::{registry, BoxedDriver, DisplayDriver, DisplayDriverFactory, FrameBuffer};

include!(concat!(env!("OUT_DIR"), "/build_info.rs"));

/// Parse "RRGGBB" or "#RRGGBB"
fn parse_color(s: &str) -> Result<Rgb565> {
    let hex = s.trim().trim_start_matches('#');
    if hex.len() != 6 {
        bail!("colour must be RRGGBB, got '{}'", s);
    }
    let rgb = u32::from_str_radix(hex, 16).with_context(|| format!("bad colour '{}'", s))?;
    let c = Rgb888::new((rgb >> 16) as u8, (rgb >> 8) as u8, rgb as u8);
    Ok(Rgb565::from(c))
}

/// Eight vertical colour bars with the panel size written across them
fn test_pattern(width: u32, height: u32) -> FrameBuffer {
    const BARS: [Rgb565; 8] = [
        Rgb565::WHITE,
        Rgb565::YELLOW,
        Rgb565::CYAN,
        Rgb565::GREEN,
        Rgb565::MAGENTA,
        Rgb565::RED,
        Rgb565::BLUE,
        Rgb565::BLACK,
    ];

    let mut fb = FrameBuffer::new(width, height);
    let bar_w = width.div_ceil(BARS.len() as u32).max(1);
    for (i, color) in BARS.iter().enumerate() {
        let _ = Rectangle::new(Point::new(i as i32 * bar_w as i32, 0), Size::new(bar_w, height))
            .into_styled(PrimitiveStyle::with_fill(*color))
            .draw(&mut fb);
    }

    let label = format!("{}x{}", width, height);
    let center = Point::new(width as i32 / 2, height as i32 / 2);
    let _ = Rectangle::with_center(center, Size::new(label.len() as u32 * 6 + 4, 14))
        .into_styled(PrimitiveStyle::with_fill(Rgb565::BLACK))
        .draw(&mut fb);
    let _ = Text::with_alignment(
        &label,
        center + Point::new(0, 3),
        MonoTextStyle::new(&FONT_6X10, Rgb565::WHITE),
        Alignment::Center,
    )
    .draw(&mut fb);

    fb
}

fn list_drivers() {
    for reg in registry::drivers() {
        let d = reg.display;
        println!(
            "{:<14} {:<20} {}x{} {}bpp {}fps  aliases: {}",
            reg.name,
            reg.compatible,
            d.width,
            d.height,
            d.bpp,
            d.fps,
            reg.aliases.join(", ")
        );
    }

    #[cfg(feature = "plugin-system")]
    for dir in fbtft::display::plugin::PluginLoader::search_paths() {
        println!("plugin path: {}", dir.display());
    }
}

fn probe(cfg: &config::Config) -> Result<BoxedDriver> {
    let display = cfg
        .display
        .as_ref()
        .context("no display configured (use --driver and --spi, or a config file)")?;
    let driver = DisplayDriverFactory::create_from_config(display)
        .context("failed to probe display")?;
    let (w, h) = driver.dimensions();
    info!("Probed {}x{} panel", w, h);
    Ok(driver)
}

fn run(action: Action, cfg: &config::Config) -> Result<()> {
    if action == Action::List {
        list_drivers();
        return Ok(());
    }

    let mut driver = probe(cfg)?;

    if action == Action::Reset {
        driver.reset().context("reset failed")?;
        info!("Reset pulsed");
        return Ok(());
    }

    driver.init().context("panel init failed")?;

    match action {
        Action::Init | Action::List | Action::Reset => {}
        Action::Clear => driver.clear().context("clear failed")?,
        Action::Fill { color } => {
            let color = parse_color(&color)?;
            let (w, h) = driver.dimensions();
            let mut fb = FrameBuffer::new(w, h);
            fb.fill(color);
            driver.write_buffer(&fb.to_be_bytes()).context("fill failed")?;
        }
        Action::TestPattern => {
            let (w, h) = driver.dimensions();
            let fb = test_pattern(w, h);
            driver.write_buffer(&fb.to_be_bytes()).context("test pattern failed")?;
        }
    }

    info!("Done");
    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let cfg = config::load(&cli).context("failed to load configuration")?;

    if cli.dump_config {
        print!("{}", serde_yaml::to_string(&cfg)?);
        return Ok(());
    }

    let level = cfg.log_level.clone().unwrap_or_else(|| "info".to_string());
    env_logger::Builder::from_env(Env::default().default_filter_or(level))
        .format_timestamp_secs()
        .init();

    info!("{} - small panels, big pixels", env!("CARGO_PKG_NAME"));
    info!("v.{} built {}", env!("CARGO_PKG_VERSION"), BUILD_DATE);
    debug!("config: {:?}", cfg);

    run(cli.command.clone().unwrap_or(Action::Init), &cfg)
}
