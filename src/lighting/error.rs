/*
 *  lighting/error.rs
 *
 *  keyload - load on the keys
 *  (c) 2020-26 Stuart Hunter
 *
 *  Unified error types for the lighting subsystem
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

use thiserror::Error;

/// Unified error type for all lighting operations
#[derive(Debug, Error)]
pub enum LightingError {
    /// Protocol handshake with the lighting service failed
    #[error("Protocol handshake failed: {0}")]
    HandshakeFailed(String),

    /// No enumerated device carries the requested model identifier
    #[error("No device found with model '{0}'")]
    NoDeviceFound(String),

    /// Device index outside the enumerated range
    #[error("Invalid device index: {0}")]
    InvalidDevice(usize),

    /// Session used before a successful handshake
    #[error("Lighting session not connected")]
    NotConnected,

    /// LED layout could not be loaded
    #[error("Layout error: {0}")]
    Layout(String),

    #[error("Layout YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Generic error with message
    #[error("{0}")]
    Other(String),
}
