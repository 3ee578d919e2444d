use serde::Serialize;

/// Aggregate counters read back from storage after a cycle.
#[derive(Debug, Serialize, PartialEq, Eq, Clone, Copy, Default)]
pub struct StoreStats {
    /// Number of live keys, counters included.
    pub saved: u64,
    /// Value of the `processed` counter key.
    pub processed: u64,
    /// Value of the `failed` counter key.
    pub failed: u64,
}
