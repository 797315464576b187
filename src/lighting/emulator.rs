/*
 *  lighting/emulator.rs
 *
 *  keyload - load on the keys
 *  (c) 2020-26 Stuart Hunter
 *
 *  Software keyboard drawn to the terminal, stands in for vendor hardware
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

use std::collections::{HashMap, HashSet};
use std::fs;
use std::io::Write;
use std::path::Path;

use chrono::Local;
use embedded_graphics::pixelcolor::Rgb888;
use embedded_graphics::prelude::*;
use log::{debug, info};
use serde::Deserialize;

use crate::lighting::error::LightingError;
use crate::lighting::traits::{
    DeviceInfo, DeviceKind, LedColor, LedId, LedPosition, LightingSession,
};
use crate::pacer::Pacer;

/// Key pitch of the built-in layout, in millimetres
const KEY_UNIT: f64 = 19.0;

/// Terminal columns per key unit
const CHARS_PER_UNIT: f64 = 4.0;

/// Built-in tenkeyless layout: (row top in key units, key widths in key units).
/// Negative widths are gaps.
#[rustfmt::skip]
const TENKEYLESS: &[(f64, &[f64])] = &[
    (0.0, &[1.0, -1.0, 1.0, 1.0, 1.0, 1.0, -0.5, 1.0, 1.0, 1.0, 1.0, -0.5, 1.0, 1.0, 1.0, 1.0, -0.25, 1.0, 1.0, 1.0]),
    (1.5, &[1.0, 1.0, 1.0, 1.0, 1.0, 1.0, 1.0, 1.0, 1.0, 1.0, 1.0, 1.0, 1.0, 2.0, -0.25, 1.0, 1.0, 1.0]),
    (2.5, &[1.5, 1.0, 1.0, 1.0, 1.0, 1.0, 1.0, 1.0, 1.0, 1.0, 1.0, 1.0, 1.0, 1.5, -0.25, 1.0, 1.0, 1.0]),
    (3.5, &[1.75, 1.0, 1.0, 1.0, 1.0, 1.0, 1.0, 1.0, 1.0, 1.0, 1.0, 1.0, 2.25]),
    (4.5, &[2.25, 1.0, 1.0, 1.0, 1.0, 1.0, 1.0, 1.0, 1.0, 1.0, 1.0, 2.75, -1.25, 1.0]),
    (5.5, &[1.25, 1.25, 1.25, 6.25, 1.25, 1.25, 1.25, 1.25, -0.25, 1.0, 1.0, 1.0]),
];

#[derive(Debug, Deserialize)]
struct LayoutFile {
    leds: Vec<LedPosition>,
}

/// LED positions of the built-in tenkeyless keyboard, ids in reading order
pub fn tenkeyless_layout() -> Vec<LedPosition> {
    let mut out = Vec::new();
    let mut next_id = 1u32;
    for (row_top, widths) in TENKEYLESS {
        let mut x = 0.0;
        for &w in widths.iter() {
            if w < 0.0 {
                x += -w;
                continue;
            }
            out.push(LedPosition {
                id: LedId(next_id),
                left: x * KEY_UNIT,
                top: row_top * KEY_UNIT,
                width: w * KEY_UNIT,
                height: KEY_UNIT,
            });
            next_id += 1;
            x += w;
        }
    }
    out
}

/// Reads a YAML layout: `leds: [{ id, left, top, width, height }, ...]`
pub fn load_layout(path: &Path) -> Result<Vec<LedPosition>, LightingError> {
    let s = fs::read_to_string(path)?;
    let file: LayoutFile = serde_yaml::from_str(&s)?;
    if file.leds.is_empty() {
        return Err(LightingError::Layout(format!("{} lists no LEDs", path.display())));
    }
    let mut seen = HashSet::new();
    if let Some(dup) = file.leds.iter().find(|p| !seen.insert(p.id)) {
        return Err(LightingError::Layout(format!(
            "{} lists LED {} more than once",
            path.display(),
            dup.id.0
        )));
    }
    Ok(file.leds)
}

/// Emulated lighting service exposing a single keyboard
///
/// Colors are kept per LED. A flush that completes a full refresh of the
/// layout counts as a frame; with terminal output enabled the frame is drawn
/// with 24-bit ANSI colors, at most once per pacer period.
#[derive(Debug)]
pub struct EmulatedKeyboard {
    model: String,
    layout: Vec<LedPosition>,
    colors: HashMap<LedId, Rgb888>,
    queued: Vec<LedColor>,
    touched: HashSet<LedId>,
    connected: bool,
    terminal: Option<Pacer>,
    frames: usize,
}

impl EmulatedKeyboard {
    pub fn new(model: &str, layout: Vec<LedPosition>) -> Self {
        let colors = layout.iter().map(|p| (p.id, Rgb888::BLACK)).collect();
        Self {
            model: model.to_string(),
            layout,
            colors,
            queued: Vec::new(),
            touched: HashSet::new(),
            connected: false,
            terminal: None,
            frames: 0,
        }
    }

    pub fn tenkeyless(model: &str) -> Self {
        Self::new(model, tenkeyless_layout())
    }

    pub fn from_layout_file(model: &str, path: &Path) -> Result<Self, LightingError> {
        let layout = load_layout(path)?;
        info!("Loaded {} LED layout from {}", layout.len(), path.display());
        Ok(Self::new(model, layout))
    }

    /// Draw completed frames to stdout, capped at `fps`.
    pub fn with_terminal_output(mut self, fps: u32) -> Self {
        let pacer = Pacer::new(fps);
        debug!("Terminal view drawn at most every {} ms", pacer.frame().as_millis());
        self.terminal = Some(pacer);
        self
    }

    /// Color last flushed to `id`
    pub fn color_of(&self, id: LedId) -> Option<Rgb888> {
        self.colors.get(&id).copied()
    }

    /// Full refreshes seen so far
    pub fn frames(&self) -> usize {
        self.frames
    }

    fn check_device(&self, device_index: usize) -> Result<(), LightingError> {
        if device_index != 0 {
            return Err(LightingError::InvalidDevice(device_index));
        }
        Ok(())
    }

    /// Text rendering of the keyboard, one terminal line per key row.
    pub fn render_text(&self) -> String {
        let cells: Vec<(usize, usize, usize, Rgb888)> = self
            .layout
            .iter()
            .map(|p| {
                let x = (p.left / KEY_UNIT * CHARS_PER_UNIT).round() as usize;
                let y = (p.top / KEY_UNIT).round() as usize;
                let w = ((p.width / KEY_UNIT * CHARS_PER_UNIT).round() as usize).max(2) - 1;
                let color = self.colors.get(&p.id).copied().unwrap_or(Rgb888::BLACK);
                (x, y, w, color)
            })
            .collect();

        let width = cells.iter().map(|(x, _, w, _)| x + w).max().unwrap_or(0);
        let height = cells.iter().map(|(_, y, _, _)| y + 1).max().unwrap_or(0);
        let mut canvas: Vec<Vec<Option<Rgb888>>> = vec![vec![None; width]; height];
        for (x, y, w, color) in cells {
            for cell in canvas[y].iter_mut().skip(x).take(w) {
                *cell = Some(color);
            }
        }

        let mut out = String::new();
        for line in canvas.iter().filter(|l| l.iter().any(Option::is_some)) {
            for cell in line {
                match cell {
                    Some(c) if *c == Rgb888::BLACK => out.push_str("\x1b[38;2;48;48;48m\u{2588}"),
                    Some(c) => out.push_str(&format!(
                        "\x1b[38;2;{};{};{}m\u{2588}",
                        c.r(),
                        c.g(),
                        c.b()
                    )),
                    None => out.push(' '),
                }
            }
            out.push_str("\x1b[0m\n");
        }
        out
    }

    fn draw(&self) {
        let mut stdout = std::io::stdout().lock();
        let frame = self.render_text();
        let stamp = Local::now().format("%H:%M:%S");
        // drawing is best effort, a closed stdout must not stop the lighting loop
        let _ = write!(
            stdout,
            "\x1b[H\x1b[2J{}\n{} {} frame {}\n",
            frame, self.model, stamp, self.frames
        );
        let _ = stdout.flush();
    }
}

impl LightingSession for EmulatedKeyboard {
    fn handshake(&mut self) -> Result<(), LightingError> {
        self.connected = true;
        debug!("Emulated {} connected with {} LEDs", self.model, self.layout.len());
        Ok(())
    }

    fn devices(&self) -> Vec<DeviceInfo> {
        vec![DeviceInfo {
            kind: DeviceKind::Keyboard,
            model: self.model.clone(),
            led_count: self.layout.len(),
        }]
    }

    fn led_positions(&self, device_index: usize) -> Result<Vec<LedPosition>, LightingError> {
        self.check_device(device_index)?;
        Ok(self.layout.clone())
    }

    fn set_colors(
        &mut self,
        device_index: usize,
        colors: &[LedColor],
    ) -> Result<(), LightingError> {
        if !self.connected {
            return Err(LightingError::NotConnected);
        }
        self.check_device(device_index)?;
        self.queued.extend_from_slice(colors);
        Ok(())
    }

    fn flush(&mut self) -> Result<(), LightingError> {
        if !self.connected {
            return Err(LightingError::NotConnected);
        }
        for led in self.queued.drain(..) {
            self.colors.insert(led.id, led.color);
            self.touched.insert(led.id);
        }

        if self.touched.len() >= self.layout.len() {
            self.touched.clear();
            self.frames += 1;
            let draw_now = self.terminal.as_mut().is_some_and(Pacer::should_flush);
            if draw_now {
                self.draw();
            }
        }
        Ok(())
    }
}
