use serde::{Deserialize, Serialize};

/// Tunable parameters of the synchronization core.
///
/// The defaults mirror the production values; tests shrink the timing
/// windows instead of waiting for real time to pass.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncConfig {
    /// Quiet period after the last canonical mutation before a local flush
    /// and sync request are triggered.
    pub debounce_ms: i64,
    /// Clock/latency slack before one side's timestamp is considered
    /// definitively newer than the other's.
    pub tolerance_window_ms: i64,
    /// Staged remote operations per commit. Kept below the provider's hard
    /// 500-ops-per-commit cap so a straddling batch cannot fail.
    pub batch_flush_threshold: usize,
    /// How long the cloud-originated-update guard suppresses outbound
    /// pushes after a pull is applied.
    pub cloud_guard_ms: i64,
    /// Days a trashed bookmark is retained before the load-time sweep
    /// purges it.
    pub trash_retention_days: i64,
    /// Soft limit on the serialized size of an imported backup.
    pub soft_quota_bytes: usize,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            debounce_ms: 3000,
            tolerance_window_ms: 2000,
            batch_flush_threshold: 490,
            cloud_guard_ms: 3500,
            trash_retention_days: 30,
            soft_quota_bytes: 64 * 1024 * 1024,
        }
    }
}
