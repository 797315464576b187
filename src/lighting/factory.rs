/*
 *  lighting/factory.rs
 *
 *  keyload - load on the keys
 *  (c) 2020-26 Stuart Hunter
 *
 *  Lighting session creation from configuration
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

use log::info;

use crate::config::{BackendKind, DeviceConfig, DEFAULT_EMULATOR_FPS};
use crate::lighting::emulator::EmulatedKeyboard;
use crate::lighting::error::LightingError;
use crate::lighting::traits::LightingSession;

/// Type alias for boxed lighting session trait objects
pub type BoxedSession = Box<dyn LightingSession>;

/// Factory for creating lighting sessions from configuration
pub struct LightingSessionFactory;

impl LightingSessionFactory {
    /// Create a lighting session from configuration
    ///
    /// The session is returned unconnected; run the handshake before use.
    ///
    /// ```ignore
    /// let config = DeviceConfig {
    ///     backend: Some(BackendKind::Emulator),
    ///     model: Some("K63".into()),
    ///     ..Default::default()
    /// };
    /// let mut session = LightingSessionFactory::create_from_config(&config)?;
    /// ```
    pub fn create_from_config(config: &DeviceConfig) -> Result<BoxedSession, LightingError> {
        match config.backend.unwrap_or_default() {
            BackendKind::Emulator => {
                info!("Creating emulated {} keyboard", config.model());
                Ok(Box::new(Self::create_emulator(config)?))
            }
        }
    }

    fn create_emulator(config: &DeviceConfig) -> Result<EmulatedKeyboard, LightingError> {
        let keyboard = match config.layout.as_ref() {
            Some(path) => EmulatedKeyboard::from_layout_file(config.model(), path)?,
            None => EmulatedKeyboard::tenkeyless(config.model()),
        };
        if config.terminal.unwrap_or(true) {
            let fps = config.emulator_fps.unwrap_or(DEFAULT_EMULATOR_FPS);
            return Ok(keyboard.with_terminal_output(fps));
        }
        Ok(keyboard)
    }
}
