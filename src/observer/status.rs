//! Aggregate nodes status reported to the parent component

use serde::{Deserialize, Serialize};
use std::time::{SystemTime, UNIX_EPOCH};

/// Overall health derived from a [`NodesStatus`]
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum HealthStatus {
    /// All vital nodes alive and every initialization parameter set
    Healthy,
    /// Vital nodes alive but initialization still incomplete
    Degraded,
    /// At least one vital node is missing
    Unhealthy,
}

/// Consistent snapshot of the tracker's derived state
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct NodesStatus {
    /// Every vital node was present at the last check
    pub vital_nodes_alive: bool,
    /// Vital nodes absent at the last check, in configuration order
    pub missing_vital_nodes: Vec<String>,
    /// Parameters missing or falsy at the last full initialization check
    pub uninitialized_params: Vec<String>,
    /// At least one client is registered
    pub has_active_clients: bool,
    /// Registered clients, sorted
    pub active_clients: Vec<String>,
    /// Unix timestamp (seconds) of the snapshot
    pub timestamp: u64,
}

impl NodesStatus {
    /// Overall health
    ///
    /// An empty `uninitialized_params` while vital nodes are down does not mean
    /// initialization succeeded, so missing nodes always dominate.
    pub fn overall(&self) -> HealthStatus {
        if !self.vital_nodes_alive {
            HealthStatus::Unhealthy
        } else if !self.uninitialized_params.is_empty() {
            HealthStatus::Degraded
        } else {
            HealthStatus::Healthy
        }
    }
}

pub(crate) fn unix_timestamp() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}
