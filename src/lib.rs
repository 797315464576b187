/*
 *  lib.rs
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
//! Scrolling CPU load bar graph across a keyboard LED matrix.
//!
//! `cpuload` samples the host, `ringbuf` keeps history, `geometry` lays the
//! keyboard's LEDs over a division grid and `render` lights it through a
//! `lighting` session.

pub mod config;
pub mod cpuload;
pub mod geometry;
pub mod lighting;
pub mod pacer;
pub mod render;
pub mod ringbuf;

pub use cpuload::{CpuLoad, LoadCalculator, ProcStat, TickCounters, TimeSource};
pub use geometry::LedGrid;
pub use render::{BarRenderer, Channel};
pub use ringbuf::RingBuffer;
