use crate::error::StartupError;
use crate::sampler::DiskSelection;
use clap::{Parser, ValueEnum};
use std::path::PathBuf;
use std::time::Duration;

#[derive(Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum Mode {
    /// Full-screen dashboard
    Tui,
    /// One JSON object per tick on stdout
    Json,
}

#[derive(Clone, Debug, Parser)]
#[command(name = "host_monitor", about = "Live terminal dashboard for host metrics")]
pub struct Config {
    /// Sampling interval in milliseconds
    #[arg(long, default_value_t = 1000)]
    pub interval_ms: u64,

    /// Output mode (tui/json)
    #[arg(long, value_enum, default_value_t = Mode::Tui)]
    pub mode: Mode,

    /// Root of the proc filesystem
    #[arg(long, default_value = "/proc")]
    pub proc_root: PathBuf,

    /// Block device for disk activity (default: first non-virtual device)
    #[arg(long)]
    pub disk: Option<String>,

    /// Mount point whose free space is shown
    #[arg(long, default_value = "/")]
    pub mount: PathBuf,

    /// Write logs here while the dashboard owns the terminal
    #[arg(long)]
    pub log_file: Option<PathBuf>,
}

impl Config {
    pub fn validate(&self) -> Result<(), StartupError> {
        if self.interval_ms == 0 {
            return Err(StartupError::Config {
                reason: "interval-ms must be > 0".to_string(),
            });
        }
        if let Some(disk) = &self.disk {
            if disk.trim().is_empty() {
                return Err(StartupError::Config {
                    reason: "disk must not be empty".to_string(),
                });
            }
        }
        Ok(())
    }

    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms)
    }

    pub fn disk_selection(&self) -> DiskSelection {
        match &self.disk {
            Some(name) => DiskSelection::Named(name.clone()),
            None => DiskSelection::Auto,
        }
    }
}
