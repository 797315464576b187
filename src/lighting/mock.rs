/*
 *  lighting/mock.rs
 *
 *  keyload - load on the keys
 *  (c) 2020-26 Stuart Hunter
 *
 *  Mock lighting session for testing without hardware
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

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use embedded_graphics::pixelcolor::Rgb888;

use crate::lighting::error::LightingError;
use crate::lighting::traits::{
    DeviceInfo, DeviceKind, LedColor, LedId, LedPosition, LightingSession,
};

/// Mock lighting session
///
/// Records every call and exposes the recorded state through a shared handle
/// so tests can inspect it after the session has been moved into a renderer.
#[derive(Debug, Clone)]
pub struct MockSession {
    devices: Vec<(DeviceInfo, Vec<LedPosition>)>,
    state: Arc<Mutex<MockSessionState>>,
}

/// Internal state for the mock session (shared for inspection in tests)
#[derive(Debug, Default)]
pub struct MockSessionState {
    /// Number of times handshake() was called
    pub handshake_count: usize,

    /// Number of upcoming handshakes that should fail
    pub handshake_failures: usize,

    /// Every set_colors() call: device index and batch size
    pub set_colors_calls: Vec<(usize, usize)>,

    /// Number of times flush() was called
    pub flush_count: usize,

    /// Colors queued since the last flush
    pub queued: Vec<LedColor>,

    /// Colors applied by flush()
    pub applied: HashMap<LedId, Rgb888>,

    /// Simulate failures (for error testing)
    pub simulate_flush_failure: bool,
}

impl MockSession {
    pub fn new() -> Self {
        Self { devices: Vec::new(), state: Arc::new(Mutex::new(MockSessionState::default())) }
    }

    pub fn with_device(mut self, model: &str, positions: Vec<LedPosition>) -> Self {
        let info = DeviceInfo {
            kind: DeviceKind::Keyboard,
            model: model.to_string(),
            led_count: positions.len(),
        };
        self.devices.push((info, positions));
        self
    }

    /// Fail the next `count` handshakes
    pub fn failing_handshakes(self, count: usize) -> Self {
        self.state.lock().unwrap().handshake_failures = count;
        self
    }

    pub fn state(&self) -> Arc<Mutex<MockSessionState>> {
        Arc::clone(&self.state)
    }

    fn check_device(&self, device_index: usize) -> Result<(), LightingError> {
        if device_index >= self.devices.len() {
            return Err(LightingError::InvalidDevice(device_index));
        }
        Ok(())
    }
}

impl LightingSession for MockSession {
    fn handshake(&mut self) -> Result<(), LightingError> {
        let mut state = self.state.lock().unwrap();
        state.handshake_count += 1;
        if state.handshake_failures > 0 {
            state.handshake_failures -= 1;
            return Err(LightingError::HandshakeFailed("simulated: server not found".to_string()));
        }
        Ok(())
    }

    fn devices(&self) -> Vec<DeviceInfo> {
        self.devices.iter().map(|(info, _)| info.clone()).collect()
    }

    fn led_positions(&self, device_index: usize) -> Result<Vec<LedPosition>, LightingError> {
        self.check_device(device_index)?;
        Ok(self.devices[device_index].1.clone())
    }

    fn set_colors(
        &mut self,
        device_index: usize,
        colors: &[LedColor],
    ) -> Result<(), LightingError> {
        self.check_device(device_index)?;
        let mut state = self.state.lock().unwrap();
        state.set_colors_calls.push((device_index, colors.len()));
        state.queued.extend_from_slice(colors);
        Ok(())
    }

    fn flush(&mut self) -> Result<(), LightingError> {
        let mut state = self.state.lock().unwrap();
        if state.simulate_flush_failure {
            return Err(LightingError::Other("Simulated flush failure".to_string()));
        }
        state.flush_count += 1;
        let queued: Vec<LedColor> = state.queued.drain(..).collect();
        for led in queued {
            state.applied.insert(led.id, led.color);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mock_handshake_failures() {
        let mut session = MockSession::new().failing_handshakes(2);
        assert!(session.handshake().is_err());
        assert!(session.handshake().is_err());
        assert!(session.handshake().is_ok());
        assert_eq!(session.state().lock().unwrap().handshake_count, 3);
    }

    #[test]
    fn test_mock_flush_applies_queue() {
        let positions =
            vec![LedPosition { id: LedId(1), left: 0.0, top: 0.0, width: 1.0, height: 1.0 }];
        let mut session = MockSession::new().with_device("K63", positions);
        session.set_colors(0, &[LedColor::new(LedId(1), Rgb888::new(255, 0, 0))]).unwrap();
        assert!(session.state().lock().unwrap().applied.is_empty());

        session.flush().unwrap();
        let state = session.state();
        let state = state.lock().unwrap();
        assert_eq!(state.applied.get(&LedId(1)), Some(&Rgb888::new(255, 0, 0)));
        assert_eq!(state.flush_count, 1);
    }

    #[test]
    fn test_mock_invalid_device() {
        let mut session = MockSession::new();
        assert!(matches!(session.set_colors(0, &[]), Err(LightingError::InvalidDevice(0))));
        assert!(session.led_positions(3).is_err());
    }

    #[test]
    fn test_mock_simulated_flush_failure() {
        let mut session = MockSession::new();
        session.state().lock().unwrap().simulate_flush_failure = true;
        assert!(session.flush().is_err());
        session.state().lock().unwrap().simulate_flush_failure = false;
        assert!(session.flush().is_ok());
    }
}
