//! Host information logged before balancing.

use serde::Serialize;
use tracing::info;

/// CPU and memory view of the host.
#[derive(Debug, Clone, Serialize)]
pub struct HostEnvironment {
    pub logical_cpus: usize,
    pub physical_cpus: usize,
    pub total_memory_mb: u64,
    pub available_memory_mb: u64,
}

/// Log and capture the host's CPU counts and memory status.
pub fn log_host_environment() -> HostEnvironment {
    info!("=== Host Environment ===");

    let logical_cpus = num_cpus::get();
    let physical_cpus = num_cpus::get_physical();
    info!("Logical CPU count: {}", logical_cpus);
    info!("Physical CPU count: {}", physical_cpus);

    let mut sys = sysinfo::System::new();
    sys.refresh_memory();
    let total_memory_mb = sys.total_memory() / 1024 / 1024;
    let available_memory_mb = sys.available_memory() / 1024 / 1024;
    info!(
        "Memory: {} MB total, {} MB available",
        total_memory_mb, available_memory_mb
    );

    info!("========================");

    HostEnvironment {
        logical_cpus,
        physical_cpus,
        total_memory_mb,
        available_memory_mb,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counts_are_consistent() {
        let env = log_host_environment();
        assert!(env.logical_cpus >= 1);
        assert!(env.physical_cpus >= 1);
        assert!(env.available_memory_mb <= env.total_memory_mb);
    }
}
