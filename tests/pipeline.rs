/*
 *  tests/pipeline.rs
 *
 *  Integration tests for the sample -> grid -> LED pipeline
 *
 *  keyload - load on the keys
 *  (c) 2020-26 Stuart Hunter
 */

use std::time::Duration;

use embedded_graphics::pixelcolor::Rgb888;
use embedded_graphics::prelude::*;

use keyload::cpuload::{CpuLoad, TickCounters, TimeSource, TimeSourceError};
use keyload::geometry::LedGrid;
use keyload::lighting::{
    handshake_with_retries, select_device, DeviceOutput, EmulatedKeyboard, LedId, LedPosition,
    LightingSession,
};
use keyload::render::BarRenderer;

fn corner(id: u32, left: f64, top: f64) -> LedPosition {
    LedPosition { id: LedId(id), left, top, width: 0.0, height: 0.0 }
}

fn connect(
    keyboard: EmulatedKeyboard,
    model: &str,
) -> (DeviceOutput<EmulatedKeyboard>, Vec<LedPosition>) {
    let mut keyboard = keyboard;
    handshake_with_retries(&mut keyboard, 3).unwrap();
    let idx = select_device(&keyboard.devices(), model).unwrap();
    let positions = keyboard.led_positions(idx).unwrap();
    (DeviceOutput::new(keyboard, idx), positions)
}

#[test]
fn test_four_corner_keyboard() {
    // 1 top-left, 2 top-right, 3 bottom-left, 4 bottom-right
    let layout = vec![
        corner(1, 0.0, 0.0),
        corner(2, 1.0, 0.0),
        corner(3, 0.0, 1.0),
        corner(4, 1.0, 1.0),
    ];
    let (output, positions) = connect(EmulatedKeyboard::new("K63", layout), "K63");
    let grid = LedGrid::build(&positions, 2, 2, None).unwrap();
    assert_eq!(grid.locate(LedId(1)), Some((0, 1)));
    assert_eq!(grid.locate(LedId(4)), Some((1, 0)));

    let mut renderer = BarRenderer::new(grid, output);
    renderer.add_value(0.0).unwrap();
    renderer.add_value(100.0).unwrap();

    let kb = renderer.sink().session();
    // left column holds the 0% sample: only its bottom cell is lit
    assert_eq!(kb.color_of(LedId(3)), Some(Rgb888::RED));
    assert_eq!(kb.color_of(LedId(1)), Some(Rgb888::BLACK));
    // right column holds the 100% sample: fully lit
    assert_eq!(kb.color_of(LedId(2)), Some(Rgb888::RED));
    assert_eq!(kb.color_of(LedId(4)), Some(Rgb888::RED));
    // every add_value refreshes all four LEDs
    assert_eq!(kb.frames(), 2);
}

#[test]
fn test_tenkeyless_full_load_lights_every_key() {
    let (output, positions) = connect(EmulatedKeyboard::tenkeyless("K63"), "K63");
    let grid = LedGrid::build(&positions, 18, 6, None).unwrap();
    assert_eq!(grid.led_count(), positions.len());

    let mut renderer = BarRenderer::new(grid, output);
    for _ in 0..18 {
        renderer.add_value(100.0).unwrap();
    }
    let kb = renderer.sink().session();
    assert!(positions.iter().all(|p| kb.color_of(p.id) == Some(Rgb888::RED)));

    renderer.clear().unwrap();
    let kb = renderer.sink().session();
    assert!(positions.iter().all(|p| kb.color_of(p.id) == Some(Rgb888::BLACK)));
}

#[test]
fn test_wrong_model_is_not_found() {
    let mut kb = EmulatedKeyboard::tenkeyless("K63");
    kb.handshake().unwrap();
    assert!(select_device(&kb.devices(), "K95").is_err());
}

/// Half of every interval idle.
struct HalfBusy {
    ticks: u64,
}

impl TimeSource for HalfBusy {
    fn read_cumulative_times(&mut self) -> Result<TickCounters, TimeSourceError> {
        self.ticks += 100;
        Ok(TickCounters { idle: self.ticks / 2, busy: self.ticks })
    }
}

#[tokio::test]
async fn test_sampler_feeds_renderer() {
    let cpu = CpuLoad::spawn(HalfBusy { ticks: 0 }, 5, Duration::from_millis(2));
    tokio::time::sleep(Duration::from_millis(80)).await;
    let load = cpu.current_load().expect("sampler produced samples");
    assert!((load - 50.0).abs() < 0.01, "load was {load}");

    let (output, positions) = connect(EmulatedKeyboard::tenkeyless("K63"), "K63");
    let mut renderer = BarRenderer::new(LedGrid::build(&positions, 4, 6, None).unwrap(), output);
    for _ in 0..4 {
        renderer.add_value(load).unwrap();
    }
    // 50% of 6 rows: rows 0..=3 lit, 4 and 5 dark
    let grid = renderer.grid();
    for col in 0..4 {
        for row in 0..6 {
            let expect = if row <= 3 { 255 } else { 0 };
            for led in grid.cell(col, row) {
                assert_eq!(led.color.r(), expect, "cell ({col}, {row})");
            }
        }
    }
}
