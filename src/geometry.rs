/*
 *  geometry.rs
 *
 *  keyload - load on the keys
 *  (c) 2020-26 Stuart Hunter
 *
 *  Partition of physical LED positions into a columns x rows division grid
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
use embedded_graphics::prelude::*;
use log::debug;
use thiserror::Error;

use crate::lighting::{LedColor, LedId, LedPosition};

#[derive(Debug, Error, Clone, PartialEq)]
pub enum GeometryError {
    #[error("device reported no LED positions")]
    NoLeds,
    #[error("grid needs at least one division each way, got {columns}x{rows}")]
    ZeroDivisions { columns: usize, rows: usize },
}

#[inline]
pub fn lerp(a: f64, b: f64, t: f64) -> f64 {
    a + (b - a) * t
}

/// Position of `value` within `[a, b]` as a fraction. A degenerate interval maps to 0.
#[inline]
pub fn inv_lerp(a: f64, b: f64, value: f64) -> f64 {
    if b == a {
        0.0
    } else {
        (value - a) / (b - a)
    }
}

/// Bounding box the grid is laid over, in device units.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds {
    pub left: f64,
    pub top: f64,
    pub width: f64,
    pub height: f64,
}

impl Bounds {
    /// Extent of the layout.
    ///
    /// The far edges come from the LED with the greatest `left` (plus its
    /// width) and the LED with the greatest `top` (plus its height), searched
    /// independently. A nonzero `manual_top` replaces the computed top, which
    /// pushes stray LEDs above it (function rows and the like) into the top row.
    pub fn from_positions(
        positions: &[LedPosition],
        manual_top: Option<f64>,
    ) -> Result<Self, GeometryError> {
        let first = positions.first().ok_or(GeometryError::NoLeds)?;

        let mut left = first.left;
        let mut top = first.top;
        let mut max_left = first;
        let mut max_top = first;
        for p in positions {
            left = left.min(p.left);
            top = top.min(p.top);
            if p.left > max_left.left {
                max_left = p;
            }
            if p.top > max_top.top {
                max_top = p;
            }
        }

        let top = manual_top.filter(|t| *t != 0.0).unwrap_or(top);
        Ok(Self {
            left,
            top,
            width: max_left.left + max_left.width - left,
            height: max_top.top + max_top.height - top,
        })
    }
}

/// Division index of `value` along one axis, clamped into `0..divisions`.
fn division_index(start: f64, span: f64, value: f64, divisions: usize) -> usize {
    let raw = (inv_lerp(start, start + span, value) * divisions as f64).floor();
    if !raw.is_finite() || raw < 0.0 {
        return 0;
    }
    (raw as usize).min(divisions - 1)
}

/// LEDs grouped by (column, row) cell, row 0 at the bottom of the keyboard.
///
/// Built once from the device layout; only the colors change afterwards.
#[derive(Debug, Clone)]
pub struct LedGrid {
    columns: usize,
    rows: usize,
    cells: Vec<Vec<LedColor>>,
}

impl LedGrid {
    pub fn build(
        positions: &[LedPosition],
        columns: usize,
        rows: usize,
        manual_top: Option<f64>,
    ) -> Result<Self, GeometryError> {
        if columns == 0 || rows == 0 {
            return Err(GeometryError::ZeroDivisions { columns, rows });
        }
        let bounds = Bounds::from_positions(positions, manual_top)?;
        let mut cells = vec![Vec::new(); columns * rows];

        for led in positions {
            let col = division_index(bounds.left, bounds.width, led.left, columns);
            let raw_row = division_index(bounds.top, bounds.height, led.top, rows);
            let row = rows - raw_row - 1;
            cells[col * rows + row].push(LedColor::new(led.id, Rgb888::BLACK));
        }

        debug!(
            "LED grid {}x{} over {} LEDs, bounds {:?}",
            columns,
            rows,
            positions.len(),
            bounds
        );

        Ok(Self { columns, rows, cells })
    }

    #[inline]
    pub fn columns(&self) -> usize {
        self.columns
    }

    #[inline]
    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cell(&self, column: usize, row: usize) -> &[LedColor] {
        &self.cells[column * self.rows + row]
    }

    pub fn cell_mut(&mut self, column: usize, row: usize) -> &mut Vec<LedColor> {
        &mut self.cells[column * self.rows + row]
    }

    /// Every LED in a column, bottom row first.
    pub fn column(&self, column: usize) -> Vec<LedColor> {
        let start = column * self.rows;
        self.cells[start..start + self.rows]
            .iter()
            .flatten()
            .copied()
            .collect()
    }

    /// Cell holding `id`, if it was placed in the grid.
    pub fn locate(&self, id: LedId) -> Option<(usize, usize)> {
        self.cells
            .iter()
            .position(|cell| cell.iter().any(|c| c.id == id))
            .map(|idx| (idx / self.rows, idx % self.rows))
    }

    pub fn led_count(&self) -> usize {
        self.cells.iter().map(Vec::len).sum()
    }

    /// Every LED record, column by column.
    pub fn iter(&self) -> impl Iterator<Item = &LedColor> {
        self.cells.iter().flatten()
    }

    /// Sets every LED to `color`.
    pub fn fill(&mut self, color: Rgb888) {
        for led in self.cells.iter_mut().flatten() {
            led.color = color;
        }
    }
}
