/*
 *  lighting/session.rs
 *
 *  keyload - load on the keys
 *  (c) 2020-26 Stuart Hunter
 *
 *  Session bring-up: handshake retries, device selection, output binding
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

use log::{info, warn};

use crate::lighting::error::LightingError;
use crate::lighting::traits::{ColorSink, DeviceInfo, LedColor, LightingSession};

/// Attempt the protocol handshake up to `retries` times (at least once).
///
/// Every failed attempt is logged; the last error is returned once the
/// attempts are used up.
pub fn handshake_with_retries<S>(session: &mut S, retries: u32) -> Result<(), LightingError>
where
    S: LightingSession + ?Sized,
{
    let attempts = retries.max(1);
    let mut last_error = String::new();
    for attempt in 1..=attempts {
        match session.handshake() {
            Ok(()) => {
                info!("Lighting handshake complete (attempt {}/{})", attempt, attempts);
                return Ok(());
            }
            Err(e) => {
                warn!("Handshake attempt {}/{} failed: {}", attempt, attempts, e);
                last_error = e.to_string();
            }
        }
    }
    Err(LightingError::HandshakeFailed(format!(
        "gave up after {} attempts: {}",
        attempts, last_error
    )))
}

/// Index of the device whose model matches `model` exactly.
///
/// When several devices match, the last one enumerated wins.
pub fn select_device(devices: &[DeviceInfo], model: &str) -> Result<usize, LightingError> {
    devices
        .iter()
        .rposition(|d| d.model == model)
        .ok_or_else(|| LightingError::NoDeviceFound(model.to_string()))
}

/// A session bound to one device, usable as the renderer's output
#[derive(Debug)]
pub struct DeviceOutput<S> {
    session: S,
    device_index: usize,
}

impl<S: LightingSession> DeviceOutput<S> {
    pub fn new(session: S, device_index: usize) -> Self {
        Self { session, device_index }
    }

    pub fn session(&self) -> &S {
        &self.session
    }
}

impl<S: LightingSession> ColorSink for DeviceOutput<S> {
    fn set_colors(&mut self, colors: &[LedColor]) -> Result<(), LightingError> {
        self.session.set_colors(self.device_index, colors)
    }

    fn flush(&mut self) -> Result<(), LightingError> {
        self.session.flush()
    }
}
