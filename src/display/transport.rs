/*
 *  display/transport.rs
 *
 *  fbtft - small panels, big pixels
 *  (c) 2020-26 Stuart Hunter
 *
 *  SPI data/command transport with an optional DC line
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

use display_interface_spi::SPIInterface;
use embedded_hal::digital::{ErrorType, OutputPin};
use embedded_hal::spi::SpiDevice;

/// A control line that may not be wired
///
/// Driving an absent line succeeds without doing anything.
pub struct OptionalPin<P>(Option<P>);

impl<P> OptionalPin<P> {
    pub fn new(pin: Option<P>) -> Self {
        Self(pin)
    }
}

impl<P: OutputPin> ErrorType for OptionalPin<P> {
    type Error = P::Error;
}

impl<P: OutputPin> OutputPin for OptionalPin<P> {
    fn set_low(&mut self) -> Result<(), Self::Error> {
        match self.0.as_mut() {
            Some(pin) => pin.set_low(),
            None => Ok(()),
        }
    }

    fn set_high(&mut self) -> Result<(), Self::Error> {
        match self.0.as_mut() {
            Some(pin) => pin.set_high(),
            None => Ok(()),
        }
    }
}

/// 4-wire SPI transport: DC low for command bytes, high for data bytes
///
/// Without a DC line both kinds of byte go out unframed; the panel then has
/// to be strapped for its own framing.
pub type SpiTransport<SPI, DC> = SPIInterface<SPI, OptionalPin<DC>>;

pub fn spi_transport<SPI, DC>(spi: SPI, dc: Option<DC>) -> SpiTransport<SPI, DC>
where
    SPI: SpiDevice,
    DC: OutputPin,
{
    SPIInterface::new(spi, OptionalPin::new(dc))
}
