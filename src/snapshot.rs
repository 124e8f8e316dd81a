use crate::error::SampleError;
use std::time::Instant;

/// Cumulative CPU time buckets (jiffies) from the aggregate `cpu` line.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CpuTimes {
    pub user: u64,
    pub nice: u64,
    pub system: u64,
    pub idle: u64,
    pub iowait: u64,
    pub irq: u64,
    pub softirq: u64,
    pub steal: u64,
}

impl CpuTimes {
    pub fn total(&self) -> u64 {
        self.user
            .saturating_add(self.nice)
            .saturating_add(self.system)
            .saturating_add(self.idle)
            .saturating_add(self.iowait)
            .saturating_add(self.irq)
            .saturating_add(self.softirq)
            .saturating_add(self.steal)
    }

    /// Time spent doing work: everything except idle and I/O wait.
    pub fn busy(&self) -> u64 {
        self.total()
            .saturating_sub(self.idle)
            .saturating_sub(self.iowait)
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DiskCounter {
    pub name: String,
    /// Weighted milliseconds spent doing I/O.
    pub weighted_io_ticks: u64,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NetCounter {
    pub name: String,
    pub rx_bytes: u64,
    pub tx_bytes: u64,
}

/// One immutable capture of every raw counter the dashboard needs.
#[derive(Clone, Debug)]
pub struct CounterSnapshot {
    pub timestamp: Instant,
    pub cpu: CpuTimes,
    pub mem_total: u64,
    pub mem_available: u64,
    /// Kept in kernel order.
    pub disks: Vec<DiskCounter>,
    /// Non-loopback interfaces, in kernel order.
    pub interfaces: Vec<NetCounter>,
    pub entropy_available: u64,
    pub load_avg_1: f64,
    pub load_avg_5: f64,
    pub load_avg_15: f64,
    pub uptime_seconds: u64,
}

impl CounterSnapshot {
    pub fn validate(&self) -> Result<(), SampleError> {
        if self.mem_total == 0 {
            return Err(SampleError::malformed("MemTotal is zero"));
        }
        for (label, value) in [
            ("1m", self.load_avg_1),
            ("5m", self.load_avg_5),
            ("15m", self.load_avg_15),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(SampleError::malformed(format!(
                    "load average {label} out of range: {value}"
                )));
            }
        }
        if self.disks.is_empty() {
            return Err(SampleError::malformed("no block devices reported"));
        }
        Ok(())
    }

    pub fn disk(&self, name: &str) -> Option<&DiskCounter> {
        self.disks.iter().find(|d| d.name == name)
    }

    pub fn interface(&self, name: &str) -> Option<&NetCounter> {
        self.interfaces.iter().find(|i| i.name == name)
    }

    pub fn net_rx_total(&self) -> u64 {
        self.interfaces
            .iter()
            .fold(0u64, |acc, i| acc.saturating_add(i.rx_bytes))
    }

    pub fn net_tx_total(&self) -> u64 {
        self.interfaces
            .iter()
            .fold(0u64, |acc, i| acc.saturating_add(i.tx_bytes))
    }
}
