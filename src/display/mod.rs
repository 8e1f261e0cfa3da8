/*
 *  display/mod.rs
 *
 *  fbtft - small panels, big pixels
 *  (c) 2020-26 Stuart Hunter
 *
 *  Display subsystem - panel drivers, framebuffer devices and plugin loading
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

// Core trait definitions
pub mod traits;
pub mod error;

// Panel plumbing: bus, register access and driver callbacks
pub mod transport;
pub mod par;
pub mod ops;
pub mod linux;

// Video memory and the device that flushes it
pub mod framebuffer;
pub mod device;

// Driver lookup
pub mod registry;
pub mod factory;

// Built-in drivers (conditionally compiled based on features)
pub mod drivers;

// C ABI types are always built so driver plugins can link against them;
// loading plugins needs the plugin-system feature
pub mod plugin;

// Re-exports for convenience
pub use traits::{DisplayDriver, DisplayCapabilities};
pub use error::{DisplayError, DisplayFactoryError};
pub use framebuffer::FrameBuffer;
pub use device::FbtftDevice;
pub use ops::{FbtftDisplay, FbtftOps};
pub use par::{DebugFlags, Par};
pub use transport::{spi_transport, OptionalPin, SpiTransport};
pub use registry::DriverRegistration;
pub use factory::{DisplayDriverFactory, BoxedDriver};

#[cfg(feature = "driver-seps114a")]
pub use drivers::seps114a::Seps114a;
