/*
 *  main.rs
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

use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use env_logger::Env;
use log::{debug, error, info};
use tokio::time::MissedTickBehavior;

#[cfg(unix)] // Only compile this block on Unix-like systems
use tokio::signal::unix::{signal, SignalKind};

use keyload::config::{self, Cli};
use keyload::cpuload::{CpuLoad, ProcStat};
use keyload::geometry::LedGrid;
use keyload::lighting::{
    handshake_with_retries, select_device, ColorSink, DeviceOutput, LightingSessionFactory,
};
use keyload::render::BarRenderer;

include!(concat!(env!("OUT_DIR"), "/build_info.rs"));

/// Waits for a SIGINT, SIGTERM, or SIGHUP signal.
#[cfg(unix)]
async fn signal_handler() -> Result<(), Box<dyn std::error::Error>> {
    let mut sigint = signal(SignalKind::interrupt())?;
    let mut sigterm = signal(SignalKind::terminate())?;
    let mut sighup = signal(SignalKind::hangup())?;

    tokio::select! {
        _ = sigint.recv() => {
            info!("SIGINT received. Initiating graceful shutdown.");
        }
        _ = sigterm.recv() => {
            info!("SIGTERM received. Initiating graceful shutdown.");
        }
        _ = sighup.recv() => {
            info!("SIGHUP received. Initiating graceful shutdown.");
        }
    }
    Ok(())
}

#[cfg(not(unix))]
async fn signal_handler() -> Result<(), Box<dyn std::error::Error>> {
    tokio::signal::ctrl_c().await?;
    info!("Ctrl-C received. Initiating graceful shutdown.");
    Ok(())
}

/// Feed the averaged CPU load into the bar graph at the render cadence.
async fn render_loop<S: ColorSink>(cpu: &CpuLoad, renderer: &mut BarRenderer<S>, poll: Duration) {
    let mut ticker = tokio::time::interval(poll);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    // the first tick fires at once, before the sampler has anything
    ticker.tick().await;
    loop {
        ticker.tick().await;
        let Some(load) = cpu.current_load() else {
            debug!("No CPU samples yet, skipping frame");
            continue;
        };
        debug!("CPU load {:.1}%", load);
        renderer
            .add_value(load)
            .unwrap_or_else(|e| error!("Failed to render CPU load frame: {}", e));
    }
}

#[tokio::main] // Requires the `tokio` runtime with `macros` and `rt-multi-thread` features
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let cfg = config::load_from(&cli).context("loading configuration")?;

    // Initialize the logger; --debug wins over the configured level
    let level = if cli.debug {
        "debug".to_string()
    } else {
        cfg.log_level.clone().unwrap_or_else(|| "info".into())
    };
    env_logger::Builder::from_env(Env::default().default_filter_or(level))
        .format_timestamp_secs()
        .init();

    if cli.dump_config {
        // Pretty YAML of effective config (nice for debugging)
        print!("{}", serde_yaml::to_string(&cfg)?);
        return Ok(());
    }

    info!("{} - load on the keys", env!("CARGO_PKG_NAME"));
    info!("v.{} built {}", env!("CARGO_PKG_VERSION"), BUILD_DATE);

    let device_cfg = cfg.device();
    let grid_cfg = cfg.grid();

    let mut session = LightingSessionFactory::create_from_config(&device_cfg)
        .context("creating lighting session")?;
    handshake_with_retries(&mut session, device_cfg.handshake_retries())
        .context("lighting service handshake")?;

    let devices = session.devices();
    if cli.list_devices {
        for (idx, d) in devices.iter().enumerate() {
            info!("  [{}] {:?} {} ({} LEDs)", idx, d.kind, d.model, d.led_count);
        }
        return Ok(());
    }

    let device_index = select_device(&devices, device_cfg.model())?;
    let positions = session
        .led_positions(device_index)
        .with_context(|| format!("reading LED positions of device {}", device_index))?;
    info!("Driving {} (device {}) with {} LEDs", device_cfg.model(), device_index, positions.len());

    let grid = LedGrid::build(
        &positions,
        grid_cfg.width_divisions(),
        grid_cfg.height_divisions(),
        grid_cfg.manual_top,
    )?;
    info!("LED grid {}x{}", grid.columns(), grid.rows());

    let mut renderer = BarRenderer::new(grid, DeviceOutput::new(session, device_index))
        .with_channel(grid_cfg.channel(), grid_cfg.intensity());

    let cpu = CpuLoad::spawn(ProcStat::new(), cfg.sample_count(), cfg.sample_interval());

    tokio::select! {
        // Handle signals for graceful shutdown
        res = signal_handler() => {
            if let Err(e) = res {
                error!("Signal handler failed: {}", e);
            }
        }
        _ = render_loop(&cpu, &mut renderer, cfg.render_interval()) => {
            info!("Closed render loop.");
        }
    }

    info!("Exiting. Clearing keyboard and stopping CPU sampler.");
    renderer
        .clear()
        .unwrap_or_else(|e| error!("Failed to clear keyboard: {}", e));
    drop(cpu);

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use keyload::cpuload::{TickCounters, TimeSource, TimeSourceError};
    use keyload::lighting::{LedColor, LedId, LedPosition, LightingError};

    struct Idle;

    impl TimeSource for Idle {
        fn read_cumulative_times(&mut self) -> Result<TickCounters, TimeSourceError> {
            Ok(TickCounters { idle: 0, busy: 0 })
        }
    }

    /// Counts flushes, each one taking `cost` of wall time.
    struct SlowSink {
        cost: Duration,
        flushes: usize,
    }

    impl ColorSink for SlowSink {
        fn set_colors(&mut self, _colors: &[LedColor]) -> Result<(), LightingError> {
            Ok(())
        }

        fn flush(&mut self) -> Result<(), LightingError> {
            std::thread::sleep(self.cost);
            self.flushes += 1;
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_render_cadence_ignores_render_time() {
        let cpu = CpuLoad::spawn(Idle, 4, Duration::from_millis(5));
        let led = LedPosition { id: LedId(1), left: 0.0, top: 0.0, width: 1.0, height: 1.0 };
        let grid = LedGrid::build(&[led], 1, 1, None).unwrap();
        let sink = SlowSink { cost: Duration::from_millis(20), flushes: 0 };
        let mut renderer = BarRenderer::new(grid, sink);

        // ticks at 40, 80, 120, 160, 200 ms; sleeping 40 ms after each
        // 20 ms frame would only reach 3 frames
        let poll = Duration::from_millis(40);
        let run = render_loop(&cpu, &mut renderer, poll);
        let _ = tokio::time::timeout(Duration::from_millis(230), run).await;

        let frames = renderer.sink().flushes;
        assert!(frames >= 4, "only {frames} frames rendered");
    }
}
