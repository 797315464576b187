/*
 *  render.rs
 *
 *  keyload - load on the keys
 *  (c) 2020-26 Stuart Hunter
 *
 *  Scrolling bar graph over the LED division grid
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

use clap::ValueEnum;
use embedded_graphics::pixelcolor::Rgb888;
use embedded_graphics::prelude::*;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::geometry::{lerp, LedGrid};
use crate::lighting::{ColorSink, LightingError};
use crate::ringbuf::{RingBuffer, RingBufferError};

#[derive(Debug, Error)]
pub enum RenderError {
    #[error("history read failed: {0}")]
    History(#[from] RingBufferError),
    #[error(transparent)]
    Lighting(#[from] LightingError),
}

/// Color channel driven by the bar; the other two are left alone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Channel {
    #[default]
    Red,
    Green,
    Blue,
}

impl Channel {
    /// `color` with this channel replaced by `value`.
    pub fn apply(self, color: Rgb888, value: u8) -> Rgb888 {
        match self {
            Channel::Red => Rgb888::new(value, color.g(), color.b()),
            Channel::Green => Rgb888::new(color.r(), value, color.b()),
            Channel::Blue => Rgb888::new(color.r(), color.g(), value),
        }
    }
}

/// Highest lit row for a load percentage, `None` when nothing is lit.
///
/// `floor(lerp(0, rows, percent / 100))`; rows at or below it are lit, so any
/// sample from 0 up lights at least the bottom row. Negative (unavailable)
/// and NaN samples light nothing.
pub fn threshold_row(percent: f32, rows: usize) -> Option<usize> {
    let t = lerp(0.0, rows as f64, f64::from(percent) / 100.0).floor();
    if !t.is_finite() || t < 0.0 {
        return None;
    }
    Some(t as usize)
}

/// Bar graph renderer: one column per retained sample, newest on the right.
pub struct BarRenderer<S> {
    history: RingBuffer<f32>,
    grid: LedGrid,
    sink: S,
    channel: Channel,
    intensity: u8,
}

impl<S: ColorSink> BarRenderer<S> {
    /// History capacity follows the grid's column count.
    pub fn new(grid: LedGrid, sink: S) -> Self {
        Self {
            history: RingBuffer::new(grid.columns()),
            grid,
            sink,
            channel: Channel::Red,
            intensity: u8::MAX,
        }
    }

    pub fn with_channel(mut self, channel: Channel, intensity: u8) -> Self {
        self.channel = channel;
        self.intensity = intensity;
        self
    }

    pub fn grid(&self) -> &LedGrid {
        &self.grid
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    /// Record a sample and redraw every column.
    pub fn add_value(&mut self, sample: f32) -> Result<(), RenderError> {
        self.history.add_val(sample);
        self.update()
    }

    fn update(&mut self) -> Result<(), RenderError> {
        let columns = self.grid.columns();
        let rows = self.grid.rows();
        let samples = self.history.time_ordered(columns)?;

        for (col, sample) in samples.into_iter().enumerate() {
            let threshold = threshold_row(sample, rows);
            for row in 0..rows {
                let lit = threshold.is_some_and(|t| row <= t);
                let value = if lit { self.intensity } else { 0 };
                for led in self.grid.cell_mut(col, row) {
                    led.color = self.channel.apply(led.color, value);
                }
            }
            // one submission and flush per column
            self.sink.set_colors(&self.grid.column(col))?;
            self.sink.flush()?;
        }
        Ok(())
    }

    /// Turn every LED off and flush once.
    pub fn clear(&mut self) -> Result<(), RenderError> {
        self.grid.fill(Rgb888::BLACK);
        let all: Vec<_> = self.grid.iter().copied().collect();
        self.sink.set_colors(&all)?;
        self.sink.flush()?;
        Ok(())
    }
}
