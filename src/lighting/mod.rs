/*
 *  lighting/mod.rs
 *
 *  keyload - load on the keys
 *  (c) 2020-26 Stuart Hunter
 *
 *  Lighting subsystem - device sessions and LED output
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
pub mod factory;
pub mod session;

// Software keyboard
pub mod emulator;

// Mock session for testing
#[cfg(test)]
pub mod mock;

// Re-exports for convenience
pub use traits::{ColorSink, DeviceInfo, DeviceKind, LedColor, LedId, LedPosition, LightingSession};
pub use error::LightingError;
pub use factory::{BoxedSession, LightingSessionFactory};
pub use session::{handshake_with_retries, select_device, DeviceOutput};
pub use emulator::EmulatedKeyboard;
