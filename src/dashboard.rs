use crate::banding::{entropy_band, io_wait_band, uptime_band, usage_band, Band};
use crate::format::{format_bytes, format_underscored};
use crate::host::HostFacts;
use crate::metrics::{now_timestamp_ms, DerivedMetrics, Reading};
use serde::Serialize;

pub const HOSTNAME: &str = "Hostname";
pub const MEMORY_USAGE: &str = "Memory Usage";
pub const CPU_USAGE: &str = "CPU Usage";
pub const IO_WAIT: &str = "I/O Wait";
pub const FREE_DISK_SPACE: &str = "Free Disk Space";
pub const DISK_USAGE: &str = "Disk Usage";
pub const UPTIME: &str = "Uptime";
pub const NETWORK: &str = "Network";
pub const LOAD_AVERAGE: &str = "Load Average";
pub const ENTROPY: &str = "Entropy";

const NOT_AVAILABLE: &str = "n/a";
const NO_READING: &str = "--";

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum PanelValue {
    Gauge {
        percent: Option<u8>,
        band: Option<Band>,
    },
    Text {
        text: String,
        band: Option<Band>,
    },
}

impl PanelValue {
    pub fn band(&self) -> Option<Band> {
        match self {
            PanelValue::Gauge { band, .. } | PanelValue::Text { band, .. } => *band,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Panel {
    pub name: &'static str,
    pub value: PanelValue,
    /// Relative column width in a single-row layout.
    pub weight: u16,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct PanelSet {
    /// Milliseconds since the epoch; null when the wall clock is unusable.
    pub timestamp_ms: Option<u128>,
    pub panels: Vec<Panel>,
}

impl PanelSet {
    pub fn get(&self, name: &str) -> Option<&PanelValue> {
        self.panels.iter().find(|p| p.name == name).map(|p| &p.value)
    }
}

fn gauge(reading: Reading<u8>, band: fn(u8) -> Band) -> PanelValue {
    let percent = reading.value();
    PanelValue::Gauge {
        percent,
        band: percent.map(band),
    }
}

fn text(text: impl Into<String>, band: Option<Band>) -> PanelValue {
    PanelValue::Text {
        text: text.into(),
        band,
    }
}

fn reading_text<T: Copy>(reading: Reading<T>, fmt: impl FnOnce(T) -> String) -> String {
    reading.value().map(fmt).unwrap_or_else(|| NO_READING.to_string())
}

/// Lays out one frame: ten panels in display order.
pub fn compose(metrics: &DerivedMetrics, host: &HostFacts) -> PanelSet {
    let uptime = metrics.uptime;
    let network = format!(
        "{}/s / {}/s ({} / {})",
        reading_text(metrics.net_rx_rate, |r| format_bytes(r as u64)),
        reading_text(metrics.net_tx_rate, |r| format_bytes(r as u64)),
        format_bytes(metrics.net_rx_total),
        format_bytes(metrics.net_tx_total),
    );
    let disk_usage = format!(
        "{}: {}",
        metrics.disk_device,
        reading_text(metrics.disk_activity, format_underscored)
    );

    let panels = vec![
        Panel {
            name: HOSTNAME,
            value: text(host.hostname.as_deref().unwrap_or(NOT_AVAILABLE), None),
            weight: 10,
        },
        Panel {
            name: MEMORY_USAGE,
            value: gauge(Reading::Value(metrics.mem_percent), usage_band),
            weight: 12,
        },
        Panel {
            name: CPU_USAGE,
            value: gauge(metrics.cpu_percent, usage_band),
            weight: 12,
        },
        Panel {
            name: IO_WAIT,
            value: gauge(metrics.io_wait_percent, io_wait_band),
            weight: 6,
        },
        Panel {
            name: FREE_DISK_SPACE,
            value: text(
                host.free_disk_bytes
                    .map(format_bytes)
                    .unwrap_or_else(|| NOT_AVAILABLE.to_string()),
                None,
            ),
            weight: 6,
        },
        Panel {
            name: DISK_USAGE,
            value: text(disk_usage, None),
            weight: 8,
        },
        Panel {
            name: UPTIME,
            value: text(
                format!("{}d {}h {}m", uptime.days, uptime.hours, uptime.minutes),
                Some(uptime_band(uptime.days)),
            ),
            weight: 8,
        },
        Panel {
            name: NETWORK,
            value: text(network, None),
            weight: 10,
        },
        Panel {
            name: LOAD_AVERAGE,
            value: text(
                format!(
                    "{:.2}/{:.2}/{:.2}",
                    metrics.load_avg_1, metrics.load_avg_5, metrics.load_avg_15
                ),
                None,
            ),
            weight: 10,
        },
        Panel {
            name: ENTROPY,
            value: text(
                metrics.entropy_available.to_string(),
                Some(entropy_band(metrics.entropy_available)),
            ),
            weight: 6,
        },
    ];

    PanelSet {
        timestamp_ms: now_timestamp_ms(),
        panels,
    }
}
