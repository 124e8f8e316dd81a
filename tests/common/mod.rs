#![allow(dead_code)]

use host_monitor::error::SampleError;
use host_monitor::snapshot::{CounterSnapshot, CpuTimes, DiskCounter, NetCounter};
use host_monitor::source::CounterSource;
use std::collections::VecDeque;
use std::time::{Duration, Instant};

/// A snapshot `secs` seconds after `base` with the CPU split into busy
/// (user) and idle time.
pub fn snapshot_at(base: Instant, secs: u64, user: u64, idle: u64) -> CounterSnapshot {
    CounterSnapshot {
        timestamp: base + Duration::from_secs(secs),
        cpu: CpuTimes {
            user,
            idle,
            ..CpuTimes::default()
        },
        mem_total: 8_000_000,
        mem_available: 2_000_000,
        disks: vec![
            DiskCounter {
                name: "loop0".to_string(),
                weighted_io_ticks: 5,
            },
            DiskCounter {
                name: "sda".to_string(),
                weighted_io_ticks: 1_000 + secs * 100,
            },
        ],
        interfaces: vec![NetCounter {
            name: "eth0".to_string(),
            rx_bytes: 10_000 + secs * 4_096,
            tx_bytes: 20_000 + secs * 1_024,
        }],
        entropy_available: 128,
        load_avg_1: 0.5,
        load_avg_5: 0.4,
        load_avg_15: 0.3,
        uptime_seconds: 90_000 + secs,
    }
}

/// Replays a fixed script of results, then fails.
pub struct ScriptedSource {
    script: VecDeque<Result<CounterSnapshot, SampleError>>,
    pub reads: usize,
}

impl ScriptedSource {
    pub fn new(script: Vec<Result<CounterSnapshot, SampleError>>) -> Self {
        Self {
            script: script.into(),
            reads: 0,
        }
    }
}

impl CounterSource for ScriptedSource {
    fn read_counters(&mut self) -> Result<CounterSnapshot, SampleError> {
        self.reads += 1;
        self.script
            .pop_front()
            .unwrap_or_else(|| Err(SampleError::malformed("script exhausted")))
    }
}
