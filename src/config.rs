use clap::{ArgAction, Parser, ValueEnum, ValueHint};
use dirs_next::home_dir;
use serde::{Deserialize, Serialize};
use std::{fs, path::{Path, PathBuf}};
use thiserror::Error;

use crate::display::fonts::FontDescriptor;
use crate::metrics::MetricKind;
use crate::scheduler::PushFailurePolicy;

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

/// Top-level app configuration. Every field is optional so files, CLI and
/// defaults can be layered.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    pub log_level: Option<String>,     // e.g., "info" | "debug"
    pub display: Option<DisplayConfig>,
    pub refresh: Option<RefreshConfig>,
    pub fonts: Option<FontsConfig>,
    pub font_rules: Option<Vec<FontRuleConfig>>,
    pub layout: Option<LayoutTuning>,
    pub sampler: Option<SamplerConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct DisplayConfig {
    pub width: Option<u32>,
    pub height: Option<u32>,
    pub rotate_deg: Option<u16>,
    pub brightness: Option<u8>,     // 0-255
    pub driver: Option<DriverKind>,
    pub bus: Option<BusConfig>,
    /// headless only: write every pushed frame to this PBM file
    pub snapshot: Option<PathBuf>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct RefreshConfig {
    pub mode: Option<RefreshMode>,
    /// all-at-once period between frames
    pub interval_secs: Option<u64>,
    /// paged dwell time per page
    pub dwell_secs: Option<u64>,
    /// paged round-robin order
    pub pages: Option<Vec<MetricKind>>,
    /// detail lines under the address headline
    pub details: Option<Vec<MetricKind>>,
    pub on_push_failure: Option<PushFailurePolicy>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct FontsConfig {
    pub headline: Option<FontDescriptor>,
    pub detail: Option<FontDescriptor>,
    pub title: Option<FontDescriptor>,
    pub value: Option<FontDescriptor>,
    pub value_fallback: Option<FontDescriptor>,
}

/// Paged value font override: values longer than `max_len` characters under
/// `category` are drawn with `font`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FontRuleConfig {
    pub category: MetricKind,
    pub max_len: usize,
    pub font: FontDescriptor,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct LayoutTuning {
    pub top_offset: Option<i32>,
    pub headline_gap: Option<u32>,
    pub line_gap: Option<u32>,
    pub title_y: Option<i32>,
    pub value_offset: Option<i32>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct SamplerConfig {
    /// preferred interfaces, first with an IPv4 address wins
    pub interfaces: Option<Vec<String>>,
    pub cpu_window_ms: Option<u64>,
    pub thermal_zone: Option<PathBuf>,
    pub mount_point: Option<PathBuf>,
    pub fahrenheit: Option<bool>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum RefreshMode {
    /// address headline over detail lines, one composite frame per interval
    Stacked,
    /// one title/value page per metric, round robin
    Paged,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum BusConfig {
    I2c {
        bus: String,        // e.g. "/dev/i2c-1"
        address: u8,        // e.g. 0x3C (I2C addresses are 7-bit, stored in u8)
    },
}

impl Default for BusConfig {
    fn default() -> Self {
        BusConfig::I2c { bus: "/dev/i2c-1".to_string(), address: 0x3C }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum DriverKind {
    Ssd1306,
    /// no hardware, frames kept in memory (and optionally dumped as PBM)
    Headless,
}

/// CLI overrides. All fields are Options so we can layer them over YAML.
#[derive(Debug, Parser, Clone, Default)]
#[command(name = "pistatus", version, about = "Host status on a small OLED")]
pub struct Cli {
    /// Path to a YAML config file (overrides search)
    #[arg(short = 'c', long, value_hint = ValueHint::FilePath)]
    pub config: Option<PathBuf>,
    /// Enable debug log level
    #[arg(short = 'v', long, alias = "verbose", action = ArgAction::SetTrue)]
    pub debug: bool,
    #[arg(long)]
    pub log_level: Option<String>,
    #[arg(short = 'm', long, value_enum)]
    pub mode: Option<RefreshMode>,
    /// Seconds between frames in stacked mode
    #[arg(short = 'i', long)]
    pub interval: Option<u64>,
    /// Seconds each page stays up in paged mode
    #[arg(short = 'd', long)]
    pub dwell: Option<u64>,
    #[arg(long, value_enum)]
    pub driver: Option<DriverKind>,
    /// I2C bus device path for the OLED (e.g., /dev/i2c-1)
    #[arg(long, value_hint = ValueHint::FilePath)]
    pub i2c_bus: Option<String>,
    /// I2C address, decimal or 0x-prefixed hex
    #[arg(long, value_parser = parse_i2c_address)]
    pub i2c_address: Option<u8>,
    #[arg(long)]
    pub display_width: Option<u32>,
    #[arg(long)]
    pub display_height: Option<u32>,
    #[arg(long)]
    pub display_rotate_deg: Option<u16>,
    /// Headless driver: write each frame to this PBM file
    #[arg(long, value_hint = ValueHint::FilePath)]
    pub snapshot: Option<PathBuf>,
    /// dump fully merged config (after overrides) and exit
    #[arg(long, action = ArgAction::SetTrue)]
    pub dump_config: bool,
}

fn parse_i2c_address(s: &str) -> Result<u8, String> {
    let parsed = match s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        Some(hex) => u8::from_str_radix(hex, 16),
        None => s.parse::<u8>(),
    };
    parsed.map_err(|e| format!("invalid I2C address {s:?}: {e}"))
}

/// Read YAML, merge CLI overrides, validate.
pub fn load(cli: &Cli) -> Result<Config, ConfigError> {
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
    if let Some(home) = home_dir() {
        let p = home.join(".config/pistatus/config.yaml");
        if p.exists() { return Some(p) }
        let p = home.join(".config/pistatus.yaml");
        if p.exists() { return Some(p) }
    }
    for candidate in &["pistatus.yaml", "config.yaml"] {
        let p = PathBuf::from(candidate);
        if p.exists() { return Some(p) }
    }
    None
}

fn read_yaml(path: &Path) -> Result<Config, ConfigError> {
    let s = fs::read_to_string(path)?;
    parse_yaml(&s)
}

pub fn parse_yaml(s: &str) -> Result<Config, ConfigError> {
    let cfg: Config = serde_yaml::from_str(s)?;
    Ok(cfg)
}

/// Shallow merge `src` into `dst`, Option-by-Option.
pub fn merge(dst: &mut Config, src: Config) {
    if src.log_level.is_some()      { dst.log_level = src.log_level; }
    if src.fonts.is_some()          { dst.fonts = src.fonts; }
    if src.font_rules.is_some()     { dst.font_rules = src.font_rules; }
    if src.layout.is_some()         { dst.layout = src.layout; }
    if src.sampler.is_some()        { dst.sampler = src.sampler; }
    if let Some(s) = src.display {
        match dst.display.as_mut() {
            Some(d) => merge_display(d, s),
            None => dst.display = Some(s),
        }
    }
    if let Some(s) = src.refresh {
        match dst.refresh.as_mut() {
            Some(d) => merge_refresh(d, s),
            None => dst.refresh = Some(s),
        }
    }
}

fn merge_display(dst: &mut DisplayConfig, src: DisplayConfig) {
    if src.width.is_some()       { dst.width = src.width; }
    if src.height.is_some()      { dst.height = src.height; }
    if src.rotate_deg.is_some()  { dst.rotate_deg = src.rotate_deg; }
    if src.brightness.is_some()  { dst.brightness = src.brightness; }
    if src.driver.is_some()      { dst.driver = src.driver; }
    if src.bus.is_some()         { dst.bus = src.bus; }
    if src.snapshot.is_some()    { dst.snapshot = src.snapshot; }
}

fn merge_refresh(dst: &mut RefreshConfig, src: RefreshConfig) {
    if src.mode.is_some()             { dst.mode = src.mode; }
    if src.interval_secs.is_some()    { dst.interval_secs = src.interval_secs; }
    if src.dwell_secs.is_some()       { dst.dwell_secs = src.dwell_secs; }
    if src.pages.is_some()            { dst.pages = src.pages; }
    if src.details.is_some()          { dst.details = src.details; }
    if src.on_push_failure.is_some()  { dst.on_push_failure = src.on_push_failure; }
}

pub fn apply_cli_overrides(cfg: &mut Config, cli: &Cli) {
    if cli.log_level.is_some() { cfg.log_level = cli.log_level.clone(); }

    let refresh = cfg.refresh.get_or_insert_with(RefreshConfig::default);
    if cli.mode.is_some()     { refresh.mode = cli.mode; }
    if cli.interval.is_some() { refresh.interval_secs = cli.interval; }
    if cli.dwell.is_some()    { refresh.dwell_secs = cli.dwell; }

    let display = cfg.display.get_or_insert_with(DisplayConfig::default);
    if cli.driver.is_some()             { display.driver = cli.driver; }
    if cli.display_width.is_some()      { display.width = cli.display_width; }
    if cli.display_height.is_some()     { display.height = cli.display_height; }
    if cli.display_rotate_deg.is_some() { display.rotate_deg = cli.display_rotate_deg; }
    if cli.snapshot.is_some()           { display.snapshot = cli.snapshot.clone(); }
    if cli.i2c_bus.is_some() || cli.i2c_address.is_some() {
        let BusConfig::I2c { bus, address } = display.bus.get_or_insert_with(BusConfig::default);
        if let Some(b) = cli.i2c_bus.as_ref() { *bus = b.clone(); }
        if let Some(a) = cli.i2c_address { *address = a; }
    }
}

/// Put any invariants here (required fields, ranges, etc.)
pub fn validate(cfg: &Config) -> Result<(), ConfigError> {
    if let Some(display) = cfg.display.as_ref() {
        if display.width == Some(0) || display.height == Some(0) {
            return Err(ConfigError::Validation("display width/height must be > 0".into()));
        }
        if let Some(rot) = display.rotate_deg {
            match rot {
                0 | 90 | 180 | 270 => {},
                _ => return Err(ConfigError::Validation("display rotate_deg must be 0|90|180|270".into()))
            }
        }
        if let Some(BusConfig::I2c { address, .. }) = display.bus.as_ref() {
            if *address > 0x7F {
                return Err(ConfigError::Validation(format!(
                    "I2C address 0x{:02X} is not a 7-bit address", address
                )));
            }
        }
    }
    if let Some(refresh) = cfg.refresh.as_ref() {
        if refresh.interval_secs == Some(0) || refresh.dwell_secs == Some(0) {
            return Err(ConfigError::Validation("refresh interval/dwell must be > 0 seconds".into()));
        }
        if refresh.pages.as_ref().is_some_and(|p| p.is_empty()) {
            return Err(ConfigError::Validation("refresh pages must name at least one metric".into()));
        }
    }
    Ok(())
}
