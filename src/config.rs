/*
 *  config.rs
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

use clap::{ArgAction, Parser, ValueHint};
use dirs_next::home_dir;
use serde::{Deserialize, Serialize};
use std::{fs, path::{Path, PathBuf}, time::Duration};
use thiserror::Error;

use crate::render::Channel;

pub const DEFAULT_SAMPLE_INTERVAL_MS: u64 = 50;
pub const DEFAULT_SAMPLE_COUNT: usize = 50;
pub const DEFAULT_RENDER_INTERVAL_MS: u64 = 500;
pub const DEFAULT_MODEL: &str = "K63";
pub const DEFAULT_HANDSHAKE_RETRIES: u32 = 10;
pub const DEFAULT_EMULATOR_FPS: u32 = 10;
pub const DEFAULT_WIDTH_DIVISIONS: usize = 18;
pub const DEFAULT_HEIGHT_DIVISIONS: usize = 6;
pub const DEFAULT_INTENSITY: u8 = 255;

/// Error type for config loading/validation.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("YAML parse error: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Validation error: {0}")]
    Validation(String),
}

/// Top-level app configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct Config {
    pub log_level: Option<String>,          // e.g., "info" | "debug"
    pub sample_interval_ms: Option<u64>,    // CPU sampler cadence
    pub sample_count: Option<usize>,        // samples averaged into one load figure
    pub render_interval_ms: Option<u64>,    // bar graph scroll cadence
    pub device: Option<DeviceConfig>,
    pub grid: Option<GridConfig>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct DeviceConfig {
    pub backend: Option<BackendKind>,
    pub model: Option<String>,              // model identifier to drive, e.g. "K63"
    pub handshake_retries: Option<u32>,
    pub layout: Option<PathBuf>,            // emulator LED layout (YAML)
    pub emulator_fps: Option<u32>,
    pub terminal: Option<bool>,             // draw the emulated keyboard to stdout
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct GridConfig {
    pub width_divisions: Option<usize>,     // time columns
    pub height_divisions: Option<usize>,    // bar height levels
    pub manual_top: Option<f64>,            // overrides the computed topmost LED edge
    pub channel: Option<Channel>,
    pub intensity: Option<u8>,              // 0-255
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    #[default]
    Emulator,
}

impl Config {
    pub fn sample_interval(&self) -> Duration {
        Duration::from_millis(self.sample_interval_ms.unwrap_or(DEFAULT_SAMPLE_INTERVAL_MS))
    }

    pub fn sample_count(&self) -> usize {
        self.sample_count.unwrap_or(DEFAULT_SAMPLE_COUNT)
    }

    pub fn render_interval(&self) -> Duration {
        Duration::from_millis(self.render_interval_ms.unwrap_or(DEFAULT_RENDER_INTERVAL_MS))
    }

    pub fn device(&self) -> DeviceConfig {
        self.device.clone().unwrap_or_default()
    }

    pub fn grid(&self) -> GridConfig {
        self.grid.clone().unwrap_or_default()
    }
}

impl DeviceConfig {
    pub fn model(&self) -> &str {
        self.model.as_deref().unwrap_or(DEFAULT_MODEL)
    }

    pub fn handshake_retries(&self) -> u32 {
        self.handshake_retries.unwrap_or(DEFAULT_HANDSHAKE_RETRIES)
    }
}

impl GridConfig {
    pub fn width_divisions(&self) -> usize {
        self.width_divisions.unwrap_or(DEFAULT_WIDTH_DIVISIONS)
    }

    pub fn height_divisions(&self) -> usize {
        self.height_divisions.unwrap_or(DEFAULT_HEIGHT_DIVISIONS)
    }

    pub fn channel(&self) -> Channel {
        self.channel.unwrap_or_default()
    }

    pub fn intensity(&self) -> u8 {
        self.intensity.unwrap_or(DEFAULT_INTENSITY)
    }
}

/// CLI overrides. All fields are Options so we can layer them over YAML.
#[derive(Debug, Parser, Clone, Default)]
#[command(name = "keyload", version, about = "CPU load bar graph on your keyboard LEDs")]
pub struct Cli {
    /// Path to a YAML config file (overrides search)
    #[arg(long, short = 'c', value_hint = ValueHint::FilePath)]
    pub config: Option<PathBuf>,
    /// Enable debug log level
    #[arg(long, short = 'v', alias = "verbose", action = ArgAction::SetTrue)]
    pub debug: bool,
    #[arg(long)]
    pub log_level: Option<String>,
    #[arg(long)]
    pub sample_interval_ms: Option<u64>,
    #[arg(long)]
    pub sample_count: Option<usize>,
    #[arg(long)]
    pub render_interval_ms: Option<u64>,
    /// Device model identifier to drive
    #[arg(long, short = 'm')]
    pub model: Option<String>,
    #[arg(long)]
    pub handshake_retries: Option<u32>,
    /// LED layout file for the emulated keyboard
    #[arg(long, value_hint = ValueHint::FilePath)]
    pub layout: Option<PathBuf>,
    #[arg(long, action = ArgAction::Set)]
    pub terminal: Option<bool>,
    /// Frame rate cap for the terminal view
    #[arg(long)]
    pub emulator_fps: Option<u32>,
    #[arg(long)]
    pub width_divisions: Option<usize>,
    #[arg(long)]
    pub height_divisions: Option<usize>,
    #[arg(long)]
    pub manual_top: Option<f64>,
    #[arg(long, value_enum)]
    pub channel: Option<Channel>,
    #[arg(long)]
    pub intensity: Option<u8>,
    /// list enumerated lighting devices and exit
    #[arg(long, action = ArgAction::SetTrue)]
    pub list_devices: bool,
    /// dump fully merged config (after overrides) and exit
    #[arg(long, action = ArgAction::SetTrue)]
    pub dump_config: bool,
}

/// Read YAML (explicit path or search), merge CLI overrides, validate.
pub fn load_from(cli: &Cli) -> Result<Config, ConfigError> {
    // 1) defaults (from `Default` impl)
    let mut cfg = Config::default();

    // 2) YAML file (explicit path or search)
    if let Some(p) = cli.config.as_ref() {
        if p.exists() {
            let y = read_yaml(p)?;
            merge(&mut cfg, y);
        } else {
            return Err(ConfigError::Validation(format!(
                "Config file not found: {}",
                p.display()
            )));
        }
    } else if let Some(p) = find_config_file() {
        let y = read_yaml(&p)?;
        merge(&mut cfg, y);
    }

    // 3) CLI overrides (highest precedence)
    apply_cli_overrides(&mut cfg, cli);

    // 4) Validate
    validate(&cfg)?;

    Ok(cfg)
}

/// Try common locations in order (first hit wins).
fn find_config_file() -> Option<PathBuf> {
    // XDG-style: ~/.config/keyload/config.yaml
    if let Some(home) = home_dir() {
        let p = home.join(".config/keyload/config.yaml");
        if p.exists() { return Some(p) }
        let p = home.join(".config/keyload.yaml");
        if p.exists() { return Some(p) }
    }
    // project local
    for candidate in &["keyload.yaml", "config/keyload.yaml"] {
        let p = PathBuf::from(candidate);
        if p.exists() { return Some(p) }
    }
    None
}

pub fn read_yaml(path: &Path) -> Result<Config, ConfigError> {
    let s = fs::read_to_string(path)?;
    let cfg: Config = serde_yaml::from_str(&s)?;
    Ok(cfg)
}

/// Shallow merge `src` into `dst`, Option-by-Option.
fn merge(dst: &mut Config, src: Config) {
    // top-level
    if src.log_level.is_some()          { dst.log_level = src.log_level; }
    if src.sample_interval_ms.is_some() { dst.sample_interval_ms = src.sample_interval_ms; }
    if src.sample_count.is_some()       { dst.sample_count = src.sample_count; }
    if src.render_interval_ms.is_some() { dst.render_interval_ms = src.render_interval_ms; }
    // device
    match (&mut dst.device, src.device) {
        (None, Some(c)) => dst.device = Some(c),
        (Some(d), Some(s)) => merge_device(d, s),
        _ => {}
    }
    // grid
    match (&mut dst.grid, src.grid) {
        (None, Some(c)) => dst.grid = Some(c),
        (Some(d), Some(s)) => merge_grid(d, s),
        _ => {}
    }
}

fn merge_device(dst: &mut DeviceConfig, src: DeviceConfig) {
    if src.backend.is_some()            { dst.backend = src.backend; }
    if src.model.is_some()              { dst.model = src.model; }
    if src.handshake_retries.is_some()  { dst.handshake_retries = src.handshake_retries; }
    if src.layout.is_some()             { dst.layout = src.layout; }
    if src.emulator_fps.is_some()       { dst.emulator_fps = src.emulator_fps; }
    if src.terminal.is_some()           { dst.terminal = src.terminal; }
}

fn merge_grid(dst: &mut GridConfig, src: GridConfig) {
    if src.width_divisions.is_some()    { dst.width_divisions = src.width_divisions; }
    if src.height_divisions.is_some()   { dst.height_divisions = src.height_divisions; }
    if src.manual_top.is_some()         { dst.manual_top = src.manual_top; }
    if src.channel.is_some()            { dst.channel = src.channel; }
    if src.intensity.is_some()          { dst.intensity = src.intensity; }
}

fn apply_cli_overrides(cfg: &mut Config, cli: &Cli) {
    if cli.log_level.is_some()          { cfg.log_level = cli.log_level.clone(); }
    if cli.sample_interval_ms.is_some() { cfg.sample_interval_ms = cli.sample_interval_ms; }
    if cli.sample_count.is_some()       { cfg.sample_count = cli.sample_count; }
    if cli.render_interval_ms.is_some() { cfg.render_interval_ms = cli.render_interval_ms; }

    let any_device = cli.model.is_some()
        || cli.handshake_retries.is_some()
        || cli.layout.is_some()
        || cli.terminal.is_some()
        || cli.emulator_fps.is_some();
    if any_device && cfg.device.is_none() {
        cfg.device = Some(DeviceConfig::default());
    }
    if let Some(device) = cfg.device.as_mut() {
        if cli.model.is_some()              { device.model = cli.model.clone(); }
        if cli.handshake_retries.is_some()  { device.handshake_retries = cli.handshake_retries; }
        if cli.layout.is_some()             { device.layout = cli.layout.clone(); }
        if cli.terminal.is_some()           { device.terminal = cli.terminal; }
        if cli.emulator_fps.is_some()       { device.emulator_fps = cli.emulator_fps; }
    }

    let any_grid = cli.width_divisions.is_some()
        || cli.height_divisions.is_some()
        || cli.manual_top.is_some()
        || cli.channel.is_some()
        || cli.intensity.is_some();
    if any_grid && cfg.grid.is_none() {
        cfg.grid = Some(GridConfig::default());
    }
    if let Some(grid) = cfg.grid.as_mut() {
        if cli.width_divisions.is_some()    { grid.width_divisions = cli.width_divisions; }
        if cli.height_divisions.is_some()   { grid.height_divisions = cli.height_divisions; }
        if cli.manual_top.is_some()         { grid.manual_top = cli.manual_top; }
        if cli.channel.is_some()            { grid.channel = cli.channel; }
        if cli.intensity.is_some()          { grid.intensity = cli.intensity; }
    }
}

/// Put any invariants here (required fields, ranges, etc.)
fn validate(cfg: &Config) -> Result<(), ConfigError> {
    if cfg.sample_interval_ms == Some(0) || cfg.render_interval_ms == Some(0) {
        return Err(ConfigError::Validation("sample/render intervals must be > 0 ms".into()));
    }
    if cfg.sample_count == Some(0) {
        return Err(ConfigError::Validation("sample_count must be > 0".into()));
    }
    if let Some(device) = cfg.device.as_ref() {
        if device.model.as_deref().is_some_and(str::is_empty) {
            return Err(ConfigError::Validation("device model must not be empty".into()));
        }
        if device.handshake_retries == Some(0) {
            return Err(ConfigError::Validation("device handshake_retries must be > 0".into()));
        }
        if device.emulator_fps == Some(0) {
            return Err(ConfigError::Validation("device emulator_fps must be > 0".into()));
        }
        if let Some(layout) = device.layout.as_ref() {
            if !layout.exists() {
                return Err(ConfigError::Validation(format!(
                    "Layout file not found: {}",
                    layout.display()
                )));
            }
        }
    }
    if let Some(grid) = cfg.grid.as_ref() {
        if grid.width_divisions == Some(0) || grid.height_divisions == Some(0) {
            return Err(ConfigError::Validation("grid divisions must be > 0".into()));
        }
        if let Some(top) = grid.manual_top {
            if !top.is_finite() {
                return Err(ConfigError::Validation(
                    "grid manual_top must be a finite number".into(),
                ));
            }
        }
    }
    Ok(())
}
