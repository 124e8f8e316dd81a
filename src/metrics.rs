use std::time::{SystemTime, UNIX_EPOCH};

/// A delta-based value that may not exist for the current tick.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Reading<T> {
    /// No previous snapshot yet, so there is nothing to diff against.
    Pending,
    /// No data for this interval (counter reset, zero-length interval, device change).
    Unavailable,
    Value(T),
}

impl<T: Copy> Reading<T> {
    pub fn value(&self) -> Option<T> {
        match self {
            Reading::Value(v) => Some(*v),
            Reading::Pending | Reading::Unavailable => None,
        }
    }

    pub fn is_pending(&self) -> bool {
        matches!(self, Reading::Pending)
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Reading<U> {
        match self {
            Reading::Pending => Reading::Pending,
            Reading::Unavailable => Reading::Unavailable,
            Reading::Value(v) => Reading::Value(f(v)),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Uptime {
    pub days: u64,
    pub hours: u64,
    pub minutes: u64,
}

impl Uptime {
    pub fn from_seconds(seconds: u64) -> Self {
        const DAY: u64 = 60 * 60 * 24;
        const HOUR: u64 = 60 * 60;
        let rem = seconds % DAY;
        Self {
            days: seconds / DAY,
            hours: rem / HOUR,
            minutes: (rem % HOUR) / 60,
        }
    }
}

/// Metrics for a single tick. Produced by the sampler, consumed by the
/// dashboard, then dropped.
#[derive(Clone, Debug, PartialEq)]
pub struct DerivedMetrics {
    pub cpu_percent: Reading<u8>,
    pub io_wait_percent: Reading<u8>,
    pub mem_percent: u8,
    /// Bytes per second.
    pub net_rx_rate: Reading<f64>,
    pub net_tx_rate: Reading<f64>,
    pub net_rx_total: u64,
    pub net_tx_total: u64,
    /// Weighted I/O ticks accumulated since the previous tick.
    pub disk_activity: Reading<u64>,
    pub disk_device: String,
    pub uptime: Uptime,
    pub entropy_available: u64,
    pub load_avg_1: f64,
    pub load_avg_5: f64,
    pub load_avg_15: f64,
}

/// Wall-clock time of a frame. `None` when the clock reads before 1970,
/// which happens on hosts that boot without an RTC.
pub fn now_timestamp_ms() -> Option<u128> {
    match SystemTime::now().duration_since(UNIX_EPOCH) {
        Ok(dur) => Some(dur.as_millis()),
        Err(err) => {
            tracing::warn!("System clock before UNIX_EPOCH: {}", err);
            None
        }
    }
}
