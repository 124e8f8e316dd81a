use serde::Serialize;

/// Severity color for a displayed value.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Band {
    Green,
    Yellow,
    Red,
}

fn by_thresholds(value: u8, warn: u8, crit: u8) -> Band {
    if value >= crit {
        Band::Red
    } else if value >= warn {
        Band::Yellow
    } else {
        Band::Green
    }
}

/// CPU and memory usage: yellow from 50%, red from 75%.
pub fn usage_band(percent: u8) -> Band {
    by_thresholds(percent, 50, 75)
}

pub fn io_wait_band(percent: u8) -> Band {
    by_thresholds(percent, 10, 50)
}

pub fn entropy_band(entropy_available: u64) -> Band {
    if entropy_available >= 256 {
        Band::Green
    } else {
        Band::Yellow
    }
}

pub fn uptime_band(days: u64) -> Band {
    if days >= 1 {
        Band::Green
    } else {
        Band::Yellow
    }
}
