use crate::error::SampleError;
use crate::metrics::{DerivedMetrics, Reading, Uptime};
use crate::snapshot::{CounterSnapshot, CpuTimes};
use std::time::Duration;
use tracing::{debug, info, warn};

/// Which block device feeds the disk activity panel.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DiskSelection {
    /// First non-virtual device in kernel order, pinned on first use.
    Auto,
    Named(String),
}

const VIRTUAL_DISK_PREFIXES: &[&str] = &["loop", "ram", "zram", "sr", "fd"];

enum CpuDelta {
    Regressed,
    Stalled,
    Moved { busy: u8, io_wait: u8 },
}

/// Turns consecutive counter snapshots into rates and percentages.
///
/// The sampler owns the previous snapshot. It is replaced only after a
/// derivation succeeds, so a malformed tick never poisons the baseline.
pub struct MetricsSampler {
    selection: DiskSelection,
    pinned_disk: Option<String>,
    previous: Option<CounterSnapshot>,
    last_cpu_percent: Option<u8>,
    last_io_wait_percent: Option<u8>,
}

impl MetricsSampler {
    pub fn new(selection: DiskSelection) -> Self {
        Self {
            selection,
            pinned_disk: None,
            previous: None,
            last_cpu_percent: None,
            last_io_wait_percent: None,
        }
    }

    pub fn has_baseline(&self) -> bool {
        self.previous.is_some()
    }

    pub fn disk_device(&self) -> Option<&str> {
        self.pinned_disk.as_deref()
    }

    pub fn derive(&mut self, current: CounterSnapshot) -> Result<DerivedMetrics, SampleError> {
        current.validate()?;
        let device = self.resolve_disk(&current)?;

        let (cpu_percent, io_wait_percent, net_rx_rate, net_tx_rate, disk_activity) =
            match &self.previous {
                None => (
                    Reading::Pending,
                    Reading::Pending,
                    Reading::Pending,
                    Reading::Pending,
                    Reading::Pending,
                ),
                Some(prev) => {
                    let elapsed = current.timestamp.saturating_duration_since(prev.timestamp);
                    if elapsed.is_zero() {
                        warn!("Zero-length sampling interval; rates unavailable for this tick");
                    }

                    let (cpu, io_wait) = match cpu_delta(&prev.cpu, &current.cpu, elapsed) {
                        CpuDelta::Moved { busy, io_wait } => {
                            self.last_cpu_percent = Some(busy);
                            self.last_io_wait_percent = Some(io_wait);
                            (Reading::Value(busy), Reading::Value(io_wait))
                        }
                        CpuDelta::Stalled => (
                            repeat_or_unavailable(self.last_cpu_percent),
                            repeat_or_unavailable(self.last_io_wait_percent),
                        ),
                        CpuDelta::Regressed => {
                            warn!("CPU counters decreased; possible counter reset");
                            (Reading::Unavailable, Reading::Unavailable)
                        }
                    };

                    let (rx, tx) = net_rates(prev, &current, elapsed);

                    let disk = match (prev.disk(&device), current.disk(&device)) {
                        (Some(p), Some(c)) if !elapsed.is_zero() => {
                            counter_delta(p.weighted_io_ticks, c.weighted_io_ticks)
                        }
                        (Some(_), Some(_)) => Reading::Unavailable,
                        _ => {
                            debug!("Disk {} absent from previous snapshot", device);
                            Reading::Unavailable
                        }
                    };

                    (cpu, io_wait, rx, tx, disk)
                }
            };

        let derived = DerivedMetrics {
            cpu_percent,
            io_wait_percent,
            mem_percent: memory_percent(current.mem_available, current.mem_total),
            net_rx_rate,
            net_tx_rate,
            net_rx_total: current.net_rx_total(),
            net_tx_total: current.net_tx_total(),
            disk_activity,
            disk_device: device.clone(),
            uptime: Uptime::from_seconds(current.uptime_seconds),
            entropy_available: current.entropy_available,
            load_avg_1: current.load_avg_1,
            load_avg_5: current.load_avg_5,
            load_avg_15: current.load_avg_15,
        };

        if self.pinned_disk.is_none() {
            info!("Disk activity tracks device {}", device);
        }
        self.pinned_disk = Some(device);
        self.previous = Some(current);
        Ok(derived)
    }

    fn resolve_disk(&self, current: &CounterSnapshot) -> Result<String, SampleError> {
        let wanted = match (&self.pinned_disk, &self.selection) {
            (Some(pinned), _) => pinned.clone(),
            (None, DiskSelection::Named(name)) => name.clone(),
            (None, DiskSelection::Auto) => return auto_select(current),
        };
        if current.disk(&wanted).is_none() {
            return Err(SampleError::malformed(format!(
                "block device {wanted} missing from diskstats"
            )));
        }
        Ok(wanted)
    }
}

fn auto_select(current: &CounterSnapshot) -> Result<String, SampleError> {
    current
        .disks
        .iter()
        .find(|d| {
            !VIRTUAL_DISK_PREFIXES
                .iter()
                .any(|prefix| d.name.starts_with(prefix))
        })
        .or_else(|| current.disks.first())
        .map(|d| d.name.clone())
        .ok_or_else(|| SampleError::malformed("no block devices reported"))
}

fn cpu_delta(prev: &CpuTimes, curr: &CpuTimes, elapsed: Duration) -> CpuDelta {
    let (prev_total, curr_total) = (prev.total(), curr.total());
    if curr_total < prev_total {
        return CpuDelta::Regressed;
    }
    let total = curr_total - prev_total;
    if total == 0 || elapsed.is_zero() {
        return CpuDelta::Stalled;
    }
    let busy = curr.busy().saturating_sub(prev.busy());
    let io_wait = curr.iowait.saturating_sub(prev.iowait);
    CpuDelta::Moved {
        busy: percent(busy, total),
        io_wait: percent(io_wait, total),
    }
}

fn repeat_or_unavailable(last: Option<u8>) -> Reading<u8> {
    match last {
        Some(v) => Reading::Value(v),
        None => Reading::Unavailable,
    }
}

/// Truncating integer percentage, clamped to 100.
fn percent(part: u64, whole: u64) -> u8 {
    if whole == 0 {
        return 0;
    }
    let pct = u128::from(part) * 100 / u128::from(whole);
    pct.min(100) as u8
}

fn memory_percent(available: u64, total: u64) -> u8 {
    // validate() guarantees total > 0; available > total saturates to 0% used.
    let free = u128::from(available) * 100 / u128::from(total.max(1));
    100u128.saturating_sub(free).min(100) as u8
}

fn counter_delta(prev: u64, curr: u64) -> Reading<u64> {
    match curr.checked_sub(prev) {
        Some(delta) => Reading::Value(delta),
        None => Reading::Unavailable,
    }
}

/// Summed byte rates over the interfaces present in both snapshots.
///
/// An interface that appeared or vanished between ticks contributes
/// nothing; one whose counter went backwards makes that direction unavailable.
fn net_rates(
    prev: &CounterSnapshot,
    curr: &CounterSnapshot,
    elapsed: Duration,
) -> (Reading<f64>, Reading<f64>) {
    let mut rx = Reading::Value(0u64);
    let mut tx = Reading::Value(0u64);
    let mut shared = 0usize;
    for c in &curr.interfaces {
        let Some(p) = prev.interface(&c.name) else {
            debug!("Interface {} has no baseline yet", c.name);
            continue;
        };
        shared += 1;
        rx = add_delta(rx, p.rx_bytes, c.rx_bytes, &c.name, "RX");
        tx = add_delta(tx, p.tx_bytes, c.tx_bytes, &c.name, "TX");
    }
    if shared == 0 || elapsed.is_zero() {
        return (Reading::Unavailable, Reading::Unavailable);
    }
    let secs = elapsed.as_secs_f64();
    (
        rx.map(|delta| delta as f64 / secs),
        tx.map(|delta| delta as f64 / secs),
    )
}

fn add_delta(
    sum: Reading<u64>,
    prev: u64,
    curr: u64,
    iface: &str,
    direction: &str,
) -> Reading<u64> {
    match (sum, counter_delta(prev, curr)) {
        (Reading::Value(total), Reading::Value(delta)) => {
            Reading::Value(total.saturating_add(delta))
        }
        (_, Reading::Value(_)) => Reading::Unavailable,
        (_, _) => {
            warn!(
                "Network {} counter decreased on {}; possible interface reset",
                direction, iface
            );
            Reading::Unavailable
        }
    }
}
