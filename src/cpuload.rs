/*
 *  cpuload.rs
 *
 *  keyload - load on the keys
 *  (c) 2020-26 Stuart Hunter
 *
 *  Host CPU load estimation from cumulative idle/busy tick counters
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

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use log::{debug, error, info};
use thiserror::Error;
use tokio::sync::mpsc;
use tokio::time::MissedTickBehavior;

use crate::ringbuf::RingBuffer;

/// Load pushed for a tick whose counters could not be read.
pub const UNAVAILABLE_LOAD: f32 = -100.0;

#[derive(Debug, Error)]
pub enum TimeSourceError {
    #[error("cannot read cumulative CPU times: {0}")]
    Io(#[from] std::io::Error),
    #[error("malformed CPU time record: {0}")]
    Parse(String),
}

/// Cumulative tick counts since some fixed epoch.
///
/// `busy` is every accounted tick, idle included, so that
/// `idle / busy` is the idle fraction of the interval.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TickCounters {
    pub idle: u64,
    pub busy: u64,
}

/// Anything able to report cumulative idle/busy time for the whole host.
pub trait TimeSource: Send + 'static {
    fn read_cumulative_times(&mut self) -> Result<TickCounters, TimeSourceError>;
}

/// Aggregate `cpu` line of the Linux `/proc/stat` file.
#[derive(Debug, Clone)]
pub struct ProcStat {
    path: PathBuf,
}

impl ProcStat {
    pub fn new() -> Self {
        Self::with_path("/proc/stat")
    }

    pub fn with_path<P: AsRef<Path>>(path: P) -> Self {
        Self { path: path.as_ref().to_path_buf() }
    }
}

impl Default for ProcStat {
    fn default() -> Self {
        Self::new()
    }
}

impl TimeSource for ProcStat {
    fn read_cumulative_times(&mut self) -> Result<TickCounters, TimeSourceError> {
        let content = fs::read_to_string(&self.path)?;
        parse_proc_stat(&content)
    }
}

/// Pulls idle and total ticks out of the aggregate `cpu` line.
///
/// Idle is `idle + iowait`. Total is user through steal; guest time is
/// already folded into user by the kernel so it is not added twice.
pub fn parse_proc_stat(content: &str) -> Result<TickCounters, TimeSourceError> {
    let rest = content
        .lines()
        .find_map(|line| line.strip_prefix("cpu "))
        .ok_or_else(|| TimeSourceError::Parse("no aggregate cpu line".into()))?;

    let fields = rest
        .split_whitespace()
        .map(|s| s.parse::<u64>())
        .collect::<Result<Vec<u64>, _>>()
        .map_err(|e| TimeSourceError::Parse(e.to_string()))?;

    if fields.len() < 4 {
        return Err(TimeSourceError::Parse(format!(
            "expected at least 4 counters, got {}",
            fields.len()
        )));
    }

    let idle = fields[3] + fields.get(4).copied().unwrap_or(0);
    let busy = fields.iter().take(8).sum();
    Ok(TickCounters { idle, busy })
}

/// Backward differencing of consecutive counter observations.
#[derive(Debug, Default, Clone)]
pub struct LoadCalculator {
    previous: TickCounters,
}

impl LoadCalculator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load in percent since the previous observation. Not clamped.
    ///
    /// A zero busy delta means no overhead, which reads as 100%.
    pub fn update(&mut self, counters: TickCounters) -> f32 {
        let busy_delta = counters.busy.saturating_sub(self.previous.busy);
        let idle_delta = counters.idle.saturating_sub(self.previous.idle);
        let overhead = if busy_delta > 0 {
            idle_delta as f32 / busy_delta as f32
        } else {
            0.0
        };
        self.previous = counters;
        (1.0 - overhead) * 100.0
    }
}

/// One sampler tick: read the source and turn it into a load figure.
pub fn sample_load<S: TimeSource + ?Sized>(source: &mut S, calc: &mut LoadCalculator) -> f32 {
    match source.read_cumulative_times() {
        Ok(counters) => calc.update(counters),
        Err(e) => {
            debug!("CPU times unavailable this tick: {}", e);
            UNAVAILABLE_LOAD
        }
    }
}

fn lock_history(history: &Mutex<RingBuffer<f32>>) -> MutexGuard<'_, RingBuffer<f32>> {
    history.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Background CPU sampler and its private history.
///
/// The sampler task owns the write side of the history; the lock is held for a
/// single insertion or a single average. Dropping the handle stops the task.
pub struct CpuLoad {
    history: Arc<Mutex<RingBuffer<f32>>>,
    stop_sender: Option<mpsc::Sender<()>>,
}

impl CpuLoad {
    /// Starts sampling `source` every `interval`, keeping `sample_count` samples.
    ///
    /// Must be called from within a tokio runtime.
    pub fn spawn<S: TimeSource>(source: S, sample_count: usize, interval: Duration) -> Self {
        let history = Arc::new(Mutex::new(RingBuffer::new(sample_count)));
        let (tx, mut rx) = mpsc::channel::<()>(1);
        let writer = Arc::clone(&history);

        tokio::spawn(async move {
            let mut source = source;
            let mut calc = LoadCalculator::new();
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            info!(
                "CPU sampler started ({} ms cadence, {} samples)",
                interval.as_millis(),
                sample_count
            );
            loop {
                tokio::select! {
                    _ = rx.recv() => {
                        debug!("CPU sampler received stop signal. Exiting.");
                        break;
                    }
                    _ = ticker.tick() => {
                        let load = sample_load(&mut source, &mut calc);
                        lock_history(&writer).add_val(load);
                    }
                }
            }
        });

        Self { history, stop_sender: Some(tx) }
    }

    /// Average of the retained samples, `None` before the first tick lands.
    pub fn current_load(&self) -> Option<f32> {
        lock_history(&self.history).average()
    }

    /// Number of samples held so far (saturates at the configured count).
    pub fn samples_held(&self) -> usize {
        lock_history(&self.history).len()
    }
}

impl Drop for CpuLoad {
    fn drop(&mut self) {
        if let Some(sender) = self.stop_sender.take() {
            if let Err(mpsc::error::TrySendError::Full(_)) = sender.try_send(()) {
                error!("Failed to send stop signal to CPU sampler");
            }
        }
    }
}
