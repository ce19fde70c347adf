/*
 *  metrics.rs
 *
 *  PiStatus - host status at a glance
 *  (c) 2020-26 Stuart Hunter
 *
 *  Host metric sampling with fail-soft placeholders
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
//! Gathering host metrics from /proc, /sys and the network stack.
//!
//! Sampling never fails from the caller's point of view: every source
//! problem collapses into [`MetricValue::Unavailable`], which renders as
//! the kind's placeholder text.

use std::ffi::CString;
use std::fmt;
use std::fs;
use std::io;
use std::os::unix::ffi::OsStrExt;
use std::path::{Path, PathBuf};
use std::time::Duration;

use log::debug;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::SamplerConfig;

const MIB: u64 = 1024 * 1024;

/// The metrics the display knows how to show.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MetricKind {
    Ip,
    Cpu,
    Temperature,
    Disk,
    Memory,
}

impl MetricKind {
    pub const ALL: [MetricKind; 5] = [
        MetricKind::Ip,
        MetricKind::Cpu,
        MetricKind::Temperature,
        MetricKind::Disk,
        MetricKind::Memory,
    ];

    /// Text shown when the metric cannot be sampled.
    pub fn placeholder(self) -> &'static str {
        match self {
            MetricKind::Ip => "No IP",
            _ => "N/A",
        }
    }

    /// Prefix used on stacked detail lines, e.g. `CPU: 12.5%`.
    pub fn label(self) -> &'static str {
        match self {
            MetricKind::Ip => "IP",
            MetricKind::Cpu => "CPU",
            MetricKind::Temperature => "Temp",
            MetricKind::Disk => "Disk",
            MetricKind::Memory => "Mem",
        }
    }

    /// Page title used in paged mode.
    pub fn title(self) -> &'static str {
        match self {
            MetricKind::Ip => "Wi-Fi IP",
            MetricKind::Cpu => "CPU Load",
            MetricKind::Temperature => "CPU Temp",
            MetricKind::Disk => "Disk",
            MetricKind::Memory => "Memory",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TempUnit {
    Celsius,
    Fahrenheit,
}

impl TempUnit {
    pub fn symbol(self) -> &'static str {
        match self {
            TempUnit::Celsius => "°C",
            TempUnit::Fahrenheit => "°F",
        }
    }
}

/// One sampled value. Always renders to text, including the error state.
#[derive(Debug, Clone, PartialEq)]
pub enum MetricValue {
    NetworkAddress(String),
    Percentage(f64),
    Temperature(f64, TempUnit),
    UsagePair { used: u64, total: u64, unit: &'static str },
    Unavailable(MetricKind),
}

impl fmt::Display for MetricValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MetricValue::NetworkAddress(addr) => write!(f, "{}", addr),
            MetricValue::Percentage(pct) => write!(f, "{:.1}%", pct),
            MetricValue::Temperature(deg, unit) => write!(f, "{:.1}{}", deg, unit.symbol()),
            MetricValue::UsagePair { used, total, unit } => write!(f, "{}/{} {}", used, total, unit),
            MetricValue::Unavailable(kind) => write!(f, "{}", kind.placeholder()),
        }
    }
}

/// Stacked-mode line for a metric, e.g. `Temp: 45.0°C` or `Temp: N/A`.
pub fn detail_line(kind: MetricKind, value: &MetricValue) -> String {
    format!("{}: {}", kind.label(), value)
}

/// Source of metric values consumed by the refresh loop.
///
/// Implementations must not fail: anything that goes wrong while reading a
/// source has to come back as `MetricValue::Unavailable(kind)`.
pub trait MetricSampler {
    fn sample(&mut self, kind: MetricKind) -> MetricValue;
}

#[derive(Debug, Error)]
enum SampleError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
    #[error("network lookup failed: {0}")]
    Net(#[from] local_ip_address::Error),
    #[error("unexpected contents in {0}")]
    Parse(String),
    #[error("no usable data: {0}")]
    NoData(&'static str),
}

/// Aggregate CPU jiffies taken from the `cpu` line of /proc/stat.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CpuTimes {
    pub idle: u64,
    pub total: u64,
}

/// Parse the aggregate `cpu` line of /proc/stat.
pub fn parse_cpu_times(stat: &str) -> Option<CpuTimes> {
    let line = stat.lines().find(|l| l.starts_with("cpu "))?;
    let fields: Vec<u64> = line
        .split_whitespace()
        .skip(1)
        .map(|f| f.parse::<u64>())
        .collect::<Result<_, _>>()
        .ok()?;
    if fields.len() < 4 {
        return None;
    }
    // user nice system idle iowait irq softirq steal; guest is already in user
    let total = fields.iter().take(8).sum();
    let idle = fields[3] + fields.get(4).copied().unwrap_or(0);
    Some(CpuTimes { idle, total })
}

/// Busy percentage between two /proc/stat snapshots.
pub fn busy_percent(before: CpuTimes, after: CpuTimes) -> Option<f64> {
    let total = after.total.checked_sub(before.total)?;
    let idle = after.idle.checked_sub(before.idle)?;
    if total == 0 {
        return None;
    }
    Some(100.0 * (total.saturating_sub(idle)) as f64 / total as f64)
}

/// Returns `(total_kib, available_kib)` from /proc/meminfo contents.
pub fn parse_meminfo(meminfo: &str) -> Option<(u64, u64)> {
    let field = |name: &str| {
        meminfo
            .lines()
            .find(|l| l.starts_with(name))
            .and_then(|l| l.split_whitespace().nth(1))
            .and_then(|v| v.parse::<u64>().ok())
    };
    Some((field("MemTotal:")?, field("MemAvailable:")?))
}

/// Thermal zones report millidegrees Celsius.
pub fn parse_millidegrees(raw: &str) -> Option<f64> {
    raw.trim().parse::<f64>().ok().map(|m| m / 1000.0)
}

/// Samples the local Linux host.
#[derive(Debug, Clone)]
pub struct SystemSampler {
    interfaces: Vec<String>,
    cpu_window: Duration,
    thermal_zone: PathBuf,
    mount_point: PathBuf,
    unit: TempUnit,
}

impl SystemSampler {
    pub fn new(config: &SamplerConfig) -> Self {
        Self {
            interfaces: config.interfaces.clone().unwrap_or_default(),
            cpu_window: Duration::from_millis(config.cpu_window_ms.unwrap_or(1000)),
            thermal_zone: config
                .thermal_zone
                .clone()
                .unwrap_or_else(|| PathBuf::from("/sys/class/thermal/thermal_zone0/temp")),
            mount_point: config.mount_point.clone().unwrap_or_else(|| PathBuf::from("/")),
            unit: if config.fahrenheit.unwrap_or(false) {
                TempUnit::Fahrenheit
            } else {
                TempUnit::Celsius
            },
        }
    }

    fn ip(&self) -> Result<MetricValue, SampleError> {
        if self.interfaces.is_empty() {
            let addr = local_ip_address::local_ip()?;
            return Ok(MetricValue::NetworkAddress(addr.to_string()));
        }
        let netifs = local_ip_address::list_afinet_netifas()?;
        self.interfaces
            .iter()
            .find_map(|wanted| {
                netifs
                    .iter()
                    .find(|(name, addr)| name == wanted && addr.is_ipv4())
                    .map(|(_, addr)| MetricValue::NetworkAddress(addr.to_string()))
            })
            .ok_or(SampleError::NoData("no configured interface has an IPv4 address"))
    }

    fn read_cpu_times() -> Result<CpuTimes, SampleError> {
        let stat = fs::read_to_string("/proc/stat")?;
        parse_cpu_times(&stat).ok_or_else(|| SampleError::Parse("/proc/stat".into()))
    }

    /// Blocks for the sample window between the two snapshots.
    fn cpu(&self) -> Result<MetricValue, SampleError> {
        let before = Self::read_cpu_times()?;
        std::thread::sleep(self.cpu_window);
        let after = Self::read_cpu_times()?;
        busy_percent(before, after)
            .map(MetricValue::Percentage)
            .ok_or(SampleError::NoData("cpu counters did not advance"))
    }

    fn temperature(&self) -> Result<MetricValue, SampleError> {
        let raw = fs::read_to_string(&self.thermal_zone)?;
        let celsius = parse_millidegrees(&raw)
            .ok_or_else(|| SampleError::Parse(self.thermal_zone.display().to_string()))?;
        let value = match self.unit {
            TempUnit::Celsius => celsius,
            TempUnit::Fahrenheit => celsius * 9.0 / 5.0 + 32.0,
        };
        Ok(MetricValue::Temperature(value, self.unit))
    }

    fn disk(&self) -> Result<MetricValue, SampleError> {
        let (used, total) = disk_usage(&self.mount_point)?;
        Ok(MetricValue::UsagePair { used: used / MIB, total: total / MIB, unit: "MB" })
    }

    fn memory(&self) -> Result<MetricValue, SampleError> {
        let meminfo = fs::read_to_string("/proc/meminfo")?;
        let (total_kib, avail_kib) =
            parse_meminfo(&meminfo).ok_or_else(|| SampleError::Parse("/proc/meminfo".into()))?;
        Ok(MetricValue::UsagePair {
            used: total_kib.saturating_sub(avail_kib) / 1024,
            total: total_kib / 1024,
            unit: "MB",
        })
    }
}

impl MetricSampler for SystemSampler {
    fn sample(&mut self, kind: MetricKind) -> MetricValue {
        let result = match kind {
            MetricKind::Ip => self.ip(),
            MetricKind::Cpu => self.cpu(),
            MetricKind::Temperature => self.temperature(),
            MetricKind::Disk => self.disk(),
            MetricKind::Memory => self.memory(),
        };
        result.unwrap_or_else(|e| {
            debug!("{:?} unavailable, showing placeholder: {}", kind, e);
            MetricValue::Unavailable(kind)
        })
    }
}

/// Bytes `(used, total)` for the filesystem holding `path`.
fn disk_usage(path: &Path) -> Result<(u64, u64), SampleError> {
    let c_path = CString::new(path.as_os_str().as_bytes())
        .map_err(|_| SampleError::Parse(path.display().to_string()))?;
    // SAFETY: statvfs is plain old data, zeroed is a valid bit pattern
    let mut st: libc::statvfs = unsafe { std::mem::zeroed() };
    // SAFETY: c_path is NUL terminated and st is a valid out pointer
    let rc = unsafe { libc::statvfs(c_path.as_ptr(), &mut st) };
    if rc != 0 {
        return Err(io::Error::last_os_error().into());
    }
    let frsize = st.f_frsize as u64;
    let blocks = st.f_blocks as u64;
    let free = st.f_bfree as u64;
    Ok((blocks.saturating_sub(free) * frsize, blocks * frsize))
}
