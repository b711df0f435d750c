use std::time::Duration;
use serde::{Deserialize, Serialize};

/// Per-index writer configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexConfig {
    pub name: String,

    pub write_lock_timeout_ms: u64,      // Writer token + directory lock bound
    pub batch_drain_timeout_ms: u64,     // Ceiling for a batch pool to drain
    pub batch_workers_per_cpu: usize,    // Pool size = this * available CPUs
    pub ram_buffer_mb: usize,            // Writer buffer hint passed to the directory
}

impl IndexConfig {
    pub fn new(name: impl Into<String>) -> Self {
        IndexConfig {
            name: name.into(),
            ..IndexConfig::default()
        }
    }

    pub fn write_lock_timeout(&self) -> Duration {
        Duration::from_millis(self.write_lock_timeout_ms)
    }

    pub fn batch_drain_timeout(&self) -> Duration {
        Duration::from_millis(self.batch_drain_timeout_ms)
    }

    pub fn batch_workers(&self) -> usize {
        (num_cpus::get() * self.batch_workers_per_cpu).max(1)
    }
}

impl Default for IndexConfig {
    fn default() -> Self {
        IndexConfig {
            name: "index".to_string(),
            write_lock_timeout_ms: 30_000,
            batch_drain_timeout_ms: 60 * 60 * 1000,   // Batches may be huge
            batch_workers_per_cpu: 2,
            ram_buffer_mb: 128,
        }
    }
}
