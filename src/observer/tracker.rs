//! Node liveness tracker
//!
//! Owns the configuration snapshot, the registered client set and the
//! derived health flags. Every mutation goes through a single lock; external
//! queries are made before the lock is taken so a slow registry never stalls
//! inbound registrations.

use std::collections::{BTreeSet, HashSet};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::config::ObserverSettings;
use crate::observer::status::{unix_timestamp, NodesStatus};
use crate::observer::traits::{
    is_truthy, ObserverError, ParameterStore, ProcessRegistry, StateNotifier,
};
use crate::utils::with_custom_timeout;

/// Mutable tracker state, guarded by one lock
#[derive(Debug, Default)]
struct TrackerState {
    registered_clients: BTreeSet<String>,
    vital_nodes_alive: bool,
    missing_vital_nodes: Vec<String>,
    uninitialized_params: Vec<String>,
}

/// Liveness tracker for vital nodes, initialization parameters and clients
pub struct NodesTracker {
    settings: ObserverSettings,
    registry: Arc<dyn ProcessRegistry>,
    params: Arc<dyn ParameterStore>,
    notifier: Arc<dyn StateNotifier>,
    state: Mutex<TrackerState>,
}

impl NodesTracker {
    /// Create a tracker in the conservative "vital nodes not alive" state
    pub fn new(
        settings: ObserverSettings,
        registry: Arc<dyn ProcessRegistry>,
        params: Arc<dyn ParameterStore>,
        notifier: Arc<dyn StateNotifier>,
    ) -> Self {
        Self {
            settings,
            registry,
            params,
            notifier,
            state: Mutex::new(TrackerState::default()),
        }
    }

    /// Configuration snapshot
    pub fn settings(&self) -> &ObserverSettings {
        &self.settings
    }

    /// Query the registry, bounded by the query timeout
    ///
    /// Errors and timeouts degrade to an empty set: nothing is considered
    /// alive.
    async fn query_alive_processes(&self) -> HashSet<String> {
        let query = self.registry.alive_process_names();
        match with_custom_timeout(query, self.settings.query_timeout()).await {
            Ok(Ok(alive)) => alive,
            Ok(Err(e)) => {
                warn!("Alive process query failed, assuming no process alive: {}", e);
                HashSet::new()
            }
            Err(_) => {
                warn!(
                    "Alive process query timed out after {:?}, assuming no process alive",
                    self.settings.query_timeout()
                );
                HashSet::new()
            }
        }
    }

    /// Check that every vital node is alive
    ///
    /// Also prunes registered clients that are no longer alive.
    pub async fn check_vital_nodes(&self) -> bool {
        let alive = self.query_alive_processes().await;

        let missing: Vec<String> = self
            .settings
            .vital_nodes()
            .iter()
            .filter(|node| !alive.contains(*node))
            .cloned()
            .collect();

        let mut state = self.state.lock().await;

        let before = state.registered_clients.len();
        state.registered_clients.retain(|client| alive.contains(client));
        let pruned = before - state.registered_clients.len();
        if pruned > 0 {
            info!("Pruned {} client(s) no longer alive", pruned);
        }

        let now_alive = missing.is_empty();
        if now_alive != state.vital_nodes_alive {
            if now_alive {
                info!("All vital nodes alive");
            } else {
                warn!("Vital nodes missing: {:?}", missing);
            }
        }
        debug!(
            "Vital nodes check: alive={}, missing={:?}",
            now_alive, missing
        );

        state.vital_nodes_alive = now_alive;
        state.missing_vital_nodes = missing;
        now_alive
    }

    /// Check that vital nodes are alive and every initialization parameter is set
    ///
    /// When vital nodes are missing this returns `false` without re-evaluating
    /// the parameters; `uninitialized_params` keeps the result of the last
    /// full evaluation.
    pub async fn check_nodes_initialization(&self) -> bool {
        if !self.check_vital_nodes().await {
            return false;
        }

        let mut uninitialized = Vec::new();
        for key in self.settings.initialization_params() {
            if !self.is_param_initialized(key).await {
                uninitialized.push(key.clone());
            }
        }

        if !uninitialized.is_empty() {
            debug!("Parameters not initialized: {:?}", uninitialized);
        }

        let mut state = self.state.lock().await;
        state.uninitialized_params = uninitialized;
        state.uninitialized_params.is_empty()
    }

    async fn is_param_initialized(&self, key: &str) -> bool {
        let lookup = async {
            if !self.params.has_param(key).await? {
                return Ok::<bool, ObserverError>(false);
            }
            let value = self.params.get_param(key).await?;
            Ok(value.as_ref().map(is_truthy).unwrap_or(false))
        };

        match with_custom_timeout(lookup, self.settings.query_timeout()).await {
            Ok(Ok(set)) => set,
            Ok(Err(e)) => {
                warn!("Parameter {} lookup failed, treating as unset: {}", key, e);
                false
            }
            Err(_) => {
                warn!("Parameter {} lookup timed out, treating as unset", key);
                false
            }
        }
    }

    /// Register (`present = true`) or deregister a client
    ///
    /// Empty names and the reserved client name are ignored. Any other
    /// announcement notifies the parent, even when membership is unchanged.
    pub async fn register_or_deregister_client(&self, name: &str, present: bool) {
        if name.is_empty() || name == self.settings.reserved_client_name() {
            debug!("Ignoring registration for filtered client name {:?}", name);
            return;
        }

        {
            let mut state = self.state.lock().await;
            if present {
                if state.registered_clients.insert(name.to_string()) {
                    info!("Client {} registered", name);
                }
            } else if state.registered_clients.remove(name) {
                info!("Client {} deregistered", name);
            }
        }

        self.notifier.notify_state_changed();
    }

    /// One periodic check: notifies the parent only when vital nodes are missing
    pub async fn tick(&self) -> bool {
        let alive = self.check_vital_nodes().await;
        if !alive {
            self.notifier.notify_state_changed();
        }
        alive
    }

    /// Whether at least one client is registered
    pub async fn has_active_clients(&self) -> bool {
        !self.state.lock().await.registered_clients.is_empty()
    }

    /// Registered clients, sorted
    pub async fn active_clients(&self) -> Vec<String> {
        self.state
            .lock()
            .await
            .registered_clients
            .iter()
            .cloned()
            .collect()
    }

    /// Result of the last vital nodes check
    pub async fn vital_nodes_alive(&self) -> bool {
        self.state.lock().await.vital_nodes_alive
    }

    /// Vital nodes missing at the last check
    pub async fn missing_vital_nodes(&self) -> Vec<String> {
        self.state.lock().await.missing_vital_nodes.clone()
    }

    /// Parameters missing or falsy at the last full initialization check
    pub async fn uninitialized_params(&self) -> Vec<String> {
        self.state.lock().await.uninitialized_params.clone()
    }

    /// Snapshot of the whole derived state under one lock acquisition
    pub async fn status(&self) -> NodesStatus {
        let state = self.state.lock().await;
        NodesStatus {
            vital_nodes_alive: state.vital_nodes_alive,
            missing_vital_nodes: state.missing_vital_nodes.clone(),
            uninitialized_params: state.uninitialized_params.clone(),
            has_active_clients: !state.registered_clients.is_empty(),
            active_clients: state.registered_clients.iter().cloned().collect(),
            timestamp: unix_timestamp(),
        }
    }
}
