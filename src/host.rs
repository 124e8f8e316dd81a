use std::path::PathBuf;
use sysinfo::{Disks, System};
use tracing::warn;

/// Host facts that are not kernel counters.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct HostFacts {
    pub hostname: Option<String>,
    pub free_disk_bytes: Option<u64>,
}

pub trait HostProbe {
    fn probe(&mut self) -> HostFacts;
}

/// Reads hostname and free space on one mount point through sysinfo.
pub struct SysHostProbe {
    mount: PathBuf,
    disks: Disks,
}

impl SysHostProbe {
    pub fn new(mount: impl Into<PathBuf>) -> Self {
        Self {
            mount: mount.into(),
            disks: Disks::new_with_refreshed_list(),
        }
    }

    fn free_space(&mut self) -> Option<u64> {
        self.disks.refresh(true);
        // Exact mount first, otherwise the deepest mount containing the path.
        let best = self
            .disks
            .list()
            .iter()
            .filter(|d| self.mount.starts_with(d.mount_point()))
            .max_by_key(|d| d.mount_point().components().count())?;
        Some(best.available_space())
    }
}

impl HostProbe for SysHostProbe {
    fn probe(&mut self) -> HostFacts {
        let hostname = System::host_name();
        if hostname.is_none() {
            warn!("Hostname unavailable");
        }
        let free_disk_bytes = self.free_space();
        if free_disk_bytes.is_none() {
            warn!("No filesystem found for {}", self.mount.display());
        }
        HostFacts {
            hostname,
            free_disk_bytes,
        }
    }
}

/// Fixed facts, for tests and for runs where probing is not wanted.
pub struct StaticHost(pub HostFacts);

impl HostProbe for StaticHost {
    fn probe(&mut self) -> HostFacts {
        self.0.clone()
    }
}
