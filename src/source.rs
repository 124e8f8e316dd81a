//! Procfs-backed counter source.
//!
//! Every parser takes the raw file text so it can be tested without a live
//! `/proc`. A missing file is `SourceUnavailable`; unreadable content or a
//! missing field is `MalformedSnapshot`, never a silent zero.

use crate::error::SampleError;
use crate::snapshot::{CounterSnapshot, CpuTimes, DiskCounter, NetCounter};
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Instant;

/// Anything that can hand the sampler a fresh snapshot.
pub trait CounterSource {
    fn read_counters(&mut self) -> Result<CounterSnapshot, SampleError>;
}

pub struct ProcSource {
    root: PathBuf,
}

impl ProcSource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn read(&self, relative: &str) -> Result<String, SampleError> {
        let path = self.root.join(relative);
        std::fs::read_to_string(&path).map_err(|e| SampleError::unavailable(path, e))
    }
}

impl CounterSource for ProcSource {
    fn read_counters(&mut self) -> Result<CounterSnapshot, SampleError> {
        let timestamp = Instant::now();
        let cpu = parse_stat(&self.read("stat")?)?;
        let (mem_total, mem_available) = parse_meminfo(&self.read("meminfo")?)?;
        let disks = parse_diskstats(&self.read("diskstats")?)?;
        let interfaces = parse_net_dev(&self.read("net/dev")?)?;
        let entropy_available = parse_entropy(&self.read("sys/kernel/random/entropy_avail")?)?;
        let (load_avg_1, load_avg_5, load_avg_15) = parse_loadavg(&self.read("loadavg")?)?;
        let uptime_seconds = parse_uptime(&self.read("uptime")?)?;

        Ok(CounterSnapshot {
            timestamp,
            cpu,
            mem_total,
            mem_available,
            disks,
            interfaces,
            entropy_available,
            load_avg_1,
            load_avg_5,
            load_avg_15,
            uptime_seconds,
        })
    }
}

fn field<T: FromStr>(raw: Option<&str>, what: &str) -> Result<T, SampleError> {
    let raw = raw.ok_or_else(|| SampleError::malformed(format!("{what}: field missing")))?;
    raw.parse()
        .map_err(|_| SampleError::malformed(format!("{what}: cannot parse {raw:?}")))
}

/// Aggregate `cpu` line of `/proc/stat`.
pub fn parse_stat(content: &str) -> Result<CpuTimes, SampleError> {
    let line = content
        .lines()
        .find(|l| l.split_whitespace().next() == Some("cpu"))
        .ok_or_else(|| SampleError::malformed("stat: no aggregate cpu line"))?;
    let mut it = line.split_whitespace().skip(1);
    Ok(CpuTimes {
        user: field(it.next(), "stat user")?,
        nice: field(it.next(), "stat nice")?,
        system: field(it.next(), "stat system")?,
        idle: field(it.next(), "stat idle")?,
        iowait: field(it.next(), "stat iowait")?,
        irq: field(it.next(), "stat irq")?,
        softirq: field(it.next(), "stat softirq")?,
        steal: field(it.next(), "stat steal")?,
    })
}

/// Returns `(MemTotal, MemAvailable)` in bytes.
pub fn parse_meminfo(content: &str) -> Result<(u64, u64), SampleError> {
    let mut total = None;
    let mut available = None;
    for line in content.lines() {
        let Some((key, rest)) = line.split_once(':') else {
            continue;
        };
        let slot = match key.trim() {
            "MemTotal" => &mut total,
            "MemAvailable" => &mut available,
            _ => continue,
        };
        let kib: u64 = field(rest.split_whitespace().next(), key)?;
        *slot = Some(kib.saturating_mul(1024));
    }
    match (total, available) {
        (Some(t), Some(a)) => Ok((t, a)),
        (None, _) => Err(SampleError::malformed("meminfo: MemTotal missing")),
        (_, None) => Err(SampleError::malformed("meminfo: MemAvailable missing")),
    }
}

/// Weighted I/O ticks (field 14) per device, in kernel order.
pub fn parse_diskstats(content: &str) -> Result<Vec<DiskCounter>, SampleError> {
    let mut disks = Vec::new();
    for line in content.lines().filter(|l| !l.trim().is_empty()) {
        let cols: Vec<&str> = line.split_whitespace().collect();
        let name = cols
            .get(2)
            .ok_or_else(|| SampleError::malformed(format!("diskstats: short line {line:?}")))?;
        let weighted_io_ticks = field(cols.get(13).copied(), "diskstats weighted io ticks")?;
        disks.push(DiskCounter {
            name: (*name).to_string(),
            weighted_io_ticks,
        });
    }
    if disks.is_empty() {
        return Err(SampleError::malformed("diskstats: no devices"));
    }
    Ok(disks)
}

/// Per-interface byte counters, loopback excluded.
pub fn parse_net_dev(content: &str) -> Result<Vec<NetCounter>, SampleError> {
    let mut interfaces = Vec::new();
    let mut seen = false;
    for line in content.lines() {
        // Header lines carry a '|' separator and no interface colon.
        let Some((iface, counters)) = line.split_once(':') else {
            continue;
        };
        let iface = iface.trim();
        seen = true;
        if iface == "lo" {
            continue;
        }
        let cols: Vec<&str> = counters.split_whitespace().collect();
        interfaces.push(NetCounter {
            name: iface.to_string(),
            rx_bytes: field(cols.first().copied(), "net/dev rx bytes")?,
            tx_bytes: field(cols.get(8).copied(), "net/dev tx bytes")?,
        });
    }
    if !seen {
        return Err(SampleError::malformed("net/dev: no interfaces"));
    }
    Ok(interfaces)
}

pub fn parse_entropy(content: &str) -> Result<u64, SampleError> {
    field(content.split_whitespace().next(), "entropy_avail")
}

pub fn parse_loadavg(content: &str) -> Result<(f64, f64, f64), SampleError> {
    let mut it = content.split_whitespace();
    Ok((
        field(it.next(), "loadavg 1m")?,
        field(it.next(), "loadavg 5m")?,
        field(it.next(), "loadavg 15m")?,
    ))
}

/// Whole seconds since boot.
pub fn parse_uptime(content: &str) -> Result<u64, SampleError> {
    let secs: f64 = field(content.split_whitespace().next(), "uptime")?;
    if !secs.is_finite() || secs < 0.0 {
        return Err(SampleError::malformed(format!("uptime: out of range {secs}")));
    }
    Ok(secs as u64)
}
