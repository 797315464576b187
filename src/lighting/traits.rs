/*
 *  lighting/traits.rs
 *
 *  keyload - load on the keys
 *  (c) 2020-26 Stuart Hunter
 *
 *  Core types and trait definitions for the lighting device abstraction
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

use embedded_graphics::pixelcolor::Rgb888;
use serde::{Deserialize, Serialize};

use crate::lighting::error::LightingError;

/// Opaque LED identity as handed out by the device
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LedId(pub u32);

/// Physical placement of one LED, in device units
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LedPosition {
    pub id: LedId,
    pub left: f64,
    pub top: f64,
    #[serde(default)]
    pub width: f64,
    #[serde(default)]
    pub height: f64,
}

/// Color currently assigned to one LED
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LedColor {
    pub id: LedId,
    pub color: Rgb888,
}

impl LedColor {
    pub fn new(id: LedId, color: Rgb888) -> Self {
        Self { id, color }
    }
}

/// Broad device class reported during enumeration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeviceKind {
    Keyboard,
}

/// Enumerated device metadata
#[derive(Debug, Clone, PartialEq)]
pub struct DeviceInfo {
    /// Device class
    pub kind: DeviceKind,

    /// Model identifier used for device selection, e.g. "K63"
    pub model: String,

    /// Number of addressable LEDs
    pub led_count: usize,
}

/// A connection to the vendor lighting service
///
/// Everything the application needs from the SDK: the protocol handshake,
/// device enumeration, LED layout discovery and buffered color updates.
/// Colors passed to `set_colors` are only guaranteed to reach the hardware
/// after `flush`.
pub trait LightingSession: Send {
    /// Perform the protocol handshake with the lighting service
    fn handshake(&mut self) -> Result<(), LightingError>;

    /// Devices currently visible to the session
    fn devices(&self) -> Vec<DeviceInfo>;

    /// Physical LED layout of one device
    fn led_positions(&self, device_index: usize) -> Result<Vec<LedPosition>, LightingError>;

    /// Queue colors for a device
    fn set_colors(&mut self, device_index: usize, colors: &[LedColor]) -> Result<(), LightingError>;

    /// Push all queued colors to the hardware
    fn flush(&mut self) -> Result<(), LightingError>;
}

impl<T: LightingSession + ?Sized> LightingSession for Box<T> {
    fn handshake(&mut self) -> Result<(), LightingError> {
        (**self).handshake()
    }

    fn devices(&self) -> Vec<DeviceInfo> {
        (**self).devices()
    }

    fn led_positions(&self, device_index: usize) -> Result<Vec<LedPosition>, LightingError> {
        (**self).led_positions(device_index)
    }

    fn set_colors(
        &mut self,
        device_index: usize,
        colors: &[LedColor],
    ) -> Result<(), LightingError> {
        (**self).set_colors(device_index, colors)
    }

    fn flush(&mut self) -> Result<(), LightingError> {
        (**self).flush()
    }
}

/// Output capability the bar renderer draws through
///
/// Narrower than `LightingSession`: the device is already chosen. A queued or
/// rate limited sender can stand in for a direct device binding.
pub trait ColorSink {
    fn set_colors(&mut self, colors: &[LedColor]) -> Result<(), LightingError>;

    fn flush(&mut self) -> Result<(), LightingError>;
}
