/*
 *  pacer.rs
 *
 *  keyload - load on the keys
 *  (c) 2020-26 Stuart Hunter
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
use std::time::{Duration, Instant};

/// Frame rate cap: hands out at most one "go" per frame period.
#[derive(Debug, Clone)]
pub struct Pacer {
    next_deadline: Instant,
    frame: Duration,
}

impl Pacer {
    pub fn new(target_fps: u32) -> Self {
        Self { next_deadline: Instant::now(), frame: Self::frame_for(target_fps) }
    }

    #[inline]
    fn frame_for(fps: u32) -> Duration {
        Duration::from_micros((1_000_000u32 / fps.max(1)) as u64)
    }

    #[inline]
    pub fn frame(&self) -> Duration {
        self.frame
    }

    /// Returns true if we should draw now; if true, it also schedules the next deadline.
    #[inline]
    pub fn should_flush(&mut self) -> bool {
        let now = Instant::now();
        if now >= self.next_deadline {
            self.next_deadline = now + self.frame;
            true
        } else {
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_call_flushes() {
        let mut pacer = Pacer::new(10);
        assert!(pacer.should_flush());
        // next deadline is 100ms away
        assert!(!pacer.should_flush());
    }

    #[test]
    fn test_zero_fps_is_one_per_second() {
        let pacer = Pacer::new(0);
        assert_eq!(pacer.frame(), Duration::from_secs(1));
    }

    #[test]
    fn test_flushes_again_after_frame() {
        let mut pacer = Pacer::new(1000);
        assert!(pacer.should_flush());
        std::thread::sleep(Duration::from_millis(5));
        assert!(pacer.should_flush());
    }
}
