/*
 *  display/drivers/mock.rs
 *
 *  fbtft - small panels, big pixels
 *  (c) 2020-26 Stuart Hunter
 *
 *  Recording bus, pins and delay for testing without hardware
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

use core::convert::Infallible;
use std::cell::RefCell;
use std::sync::{Arc, Mutex};

use display_interface::{DataFormat, DisplayError, WriteOnlyDataCommand};
use embedded_hal::delay::DelayNs;
use embedded_hal::digital::{self, ErrorType, OutputPin};
use embedded_hal::spi::{self, Operation, SpiDevice};
use log::{Level, LevelFilter, Log, Metadata, Record};

use crate::display::par::Par;
use crate::display::transport::{spi_transport, SpiTransport};

/// One observable thing the panel would see
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BusEvent {
    Command(Vec<u8>),
    Data(Vec<u8>),
    Reset(bool),
    /// DC line level seen by a real SPI transport
    Dc(bool),
    /// One SPI write
    Spi(Vec<u8>),
    DelayMs(u32),
    DelayNs(u32),
}

/// Shared event log, cloned into every mock part
#[derive(Debug, Clone, Default)]
pub struct BusLog {
    events: Arc<Mutex<Vec<BusEvent>>>,
    /// Fail every bus write once this many have succeeded
    fail_after: Arc<Mutex<Option<usize>>>,
}

impl BusLog {
    fn push(&self, event: BusEvent) {
        self.events.lock().unwrap().push(event);
    }

    pub fn events(&self) -> Vec<BusEvent> {
        self.events.lock().unwrap().clone()
    }

    pub fn clear(&self) {
        self.events.lock().unwrap().clear();
    }

    pub fn fail_after(&self, writes: usize) {
        *self.fail_after.lock().unwrap() = Some(writes);
    }

    pub fn spi(&self) -> MockSpi {
        MockSpi { log: self.clone() }
    }

    pub fn dc(&self) -> MockDc {
        MockDc { log: self.clone() }
    }

    fn check_write(&self) -> Result<(), DisplayError> {
        let mut limit = self.fail_after.lock().unwrap();
        match limit.as_mut() {
            Some(0) => Err(DisplayError::BusWriteError),
            Some(n) => {
                *n -= 1;
                Ok(())
            }
            None => Ok(()),
        }
    }

    /// Register writes as (register, value bytes) pairs, delays and pins dropped
    pub fn register_writes(&self) -> Vec<(u8, Vec<u8>)> {
        let mut writes: Vec<(u8, Vec<u8>)> = Vec::new();
        for event in self.events() {
            match event {
                BusEvent::Command(cmd) => writes.push((cmd[0], Vec::new())),
                BusEvent::Data(data) => {
                    if let Some(last) = writes.last_mut() {
                        last.1.extend_from_slice(&data);
                    }
                }
                _ => {}
            }
        }
        writes
    }
}

fn collect_bytes(words: DataFormat<'_>) -> Result<Vec<u8>, DisplayError> {
    Ok(match words {
        DataFormat::U8(slice) => slice.to_vec(),
        DataFormat::U16BE(slice) => slice.iter().flat_map(|w| w.to_be_bytes()).collect(),
        DataFormat::U8Iter(iter) => iter.collect(),
        DataFormat::U16BEIter(iter) => iter.flat_map(|w| w.to_be_bytes()).collect(),
        _ => return Err(DisplayError::DataFormatNotImplemented),
    })
}

/// Command/data interface that records instead of transmitting
pub struct MockInterface {
    log: BusLog,
}

impl WriteOnlyDataCommand for MockInterface {
    fn send_commands(&mut self, cmd: DataFormat<'_>) -> Result<(), DisplayError> {
        self.log.check_write()?;
        let bytes = collect_bytes(cmd)?;
        self.log.push(BusEvent::Command(bytes));
        Ok(())
    }

    fn send_data(&mut self, buf: DataFormat<'_>) -> Result<(), DisplayError> {
        self.log.check_write()?;
        let bytes = collect_bytes(buf)?;
        self.log.push(BusEvent::Data(bytes));
        Ok(())
    }
}

/// Reset line
pub struct MockPin {
    log: BusLog,
}

impl ErrorType for MockPin {
    type Error = Infallible;
}

impl OutputPin for MockPin {
    fn set_low(&mut self) -> Result<(), Self::Error> {
        self.log.push(BusEvent::Reset(false));
        Ok(())
    }

    fn set_high(&mut self) -> Result<(), Self::Error> {
        self.log.push(BusEvent::Reset(true));
        Ok(())
    }
}

/// Reset line whose every write fails after being recorded
pub struct FailingPin {
    log: BusLog,
}

impl ErrorType for FailingPin {
    type Error = digital::ErrorKind;
}

impl OutputPin for FailingPin {
    fn set_low(&mut self) -> Result<(), Self::Error> {
        self.log.push(BusEvent::Reset(false));
        Err(digital::ErrorKind::Other)
    }

    fn set_high(&mut self) -> Result<(), Self::Error> {
        self.log.push(BusEvent::Reset(true));
        Err(digital::ErrorKind::Other)
    }
}

/// SPI device recording each write, failing along with the bus log
pub struct MockSpi {
    log: BusLog,
}

impl spi::ErrorType for MockSpi {
    type Error = spi::ErrorKind;
}

impl SpiDevice for MockSpi {
    fn transaction(&mut self, operations: &mut [Operation<'_, u8>]) -> Result<(), Self::Error> {
        self.log.check_write().map_err(|_| spi::ErrorKind::Other)?;
        for op in operations.iter() {
            if let Operation::Write(bytes) = op {
                self.log.push(BusEvent::Spi(bytes.to_vec()));
            }
        }
        Ok(())
    }
}

/// DC line
pub struct MockDc {
    log: BusLog,
}

impl ErrorType for MockDc {
    type Error = Infallible;
}

impl OutputPin for MockDc {
    fn set_low(&mut self) -> Result<(), Self::Error> {
        self.log.push(BusEvent::Dc(false));
        Ok(())
    }

    fn set_high(&mut self) -> Result<(), Self::Error> {
        self.log.push(BusEvent::Dc(true));
        Ok(())
    }
}

pub struct MockDelay {
    log: BusLog,
}

impl DelayNs for MockDelay {
    fn delay_ns(&mut self, ns: u32) {
        self.log.push(BusEvent::DelayNs(ns));
    }

    fn delay_ms(&mut self, ms: u32) {
        self.log.push(BusEvent::DelayMs(ms));
    }
}

pub type MockPar = Par<MockInterface, MockPin, MockDelay>;

/// Panel context wired to a fresh log, with or without a reset line
pub fn mock_par(with_reset: bool) -> (MockPar, BusLog) {
    let log = BusLog::default();
    let reset = with_reset.then(|| MockPin { log: log.clone() });
    let par = Par::new(
        MockInterface { log: log.clone() },
        reset,
        MockDelay { log: log.clone() },
    );
    (par, log)
}

pub type MockSpiPar = Par<SpiTransport<MockSpi, MockDc>, FailingPin, MockDelay>;

/// Panel context over the real SPI transport, with a DC line and a reset
/// line that refuses every write
pub fn mock_spi_par() -> (MockSpiPar, BusLog) {
    let log = BusLog::default();
    let par = Par::new(
        spi_transport(log.spi(), Some(log.dc())),
        Some(FailingPin { log: log.clone() }),
        MockDelay { log: log.clone() },
    );
    (par, log)
}

thread_local! {
    static CAPTURED: RefCell<Vec<(Level, String)>> = const { RefCell::new(Vec::new()) };
}

/// Logger keeping records per thread, so parallel tests do not see each other
struct CaptureLogger;

impl Log for CaptureLogger {
    fn enabled(&self, _metadata: &Metadata<'_>) -> bool {
        true
    }

    fn log(&self, record: &Record<'_>) {
        CAPTURED.with(|c| c.borrow_mut().push((record.level(), record.args().to_string())));
    }

    fn flush(&self) {}
}

static LOGGER: CaptureLogger = CaptureLogger;

/// Start capturing log records emitted on the calling thread
pub fn capture_logs() {
    // installed once per test binary; later calls only reset the buffer
    let _ = log::set_logger(&LOGGER);
    log::set_max_level(LevelFilter::Trace);
    CAPTURED.with(|c| c.borrow_mut().clear());
}

/// Records captured on the calling thread since `capture_logs`
pub fn captured_logs() -> Vec<(Level, String)> {
    CAPTURED.with(|c| c.borrow().clone())
}

/// Captured messages at `level`
pub fn captured_at(level: Level) -> Vec<String> {
    captured_logs()
        .into_iter()
        .filter(|(l, _)| *l == level)
        .map(|(_, msg)| msg)
        .collect()
}
