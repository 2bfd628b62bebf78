//! Shared fixtures for observer tests
#![allow(dead_code)]

use async_trait::async_trait;
use nodes_observer::observer::sources::{MemoryParamStore, StaticProcessRegistry};
use nodes_observer::observer::{NodesTracker, ObserverError, ProcessRegistry, StateNotifier};
use nodes_observer::ObserverSettings;
use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Notifier counting change signals
#[derive(Default)]
pub struct CountingNotifier {
    count: AtomicUsize,
}

impl CountingNotifier {
    pub fn count(&self) -> usize {
        self.count.load(Ordering::SeqCst)
    }
}

impl StateNotifier for CountingNotifier {
    fn notify_state_changed(&self) {
        self.count.fetch_add(1, Ordering::SeqCst);
    }
}

/// Registry whose query always fails
pub struct FailingRegistry;

#[async_trait]
impl ProcessRegistry for FailingRegistry {
    async fn alive_process_names(&self) -> Result<HashSet<String>, ObserverError> {
        Err(ObserverError::Registry("registry unreachable".to_string()))
    }
}

/// Registry that never answers within any reasonable timeout
pub struct HangingRegistry;

#[async_trait]
impl ProcessRegistry for HangingRegistry {
    async fn alive_process_names(&self) -> Result<HashSet<String>, ObserverError> {
        tokio::time::sleep(Duration::from_secs(3600)).await;
        Ok(HashSet::new())
    }
}

/// Registry whose query panics, killing whatever task runs it
pub struct PanickingRegistry;

#[async_trait]
impl ProcessRegistry for PanickingRegistry {
    async fn alive_process_names(&self) -> Result<HashSet<String>, ObserverError> {
        panic!("registry crashed");
    }
}

pub fn names(list: &[&str]) -> Vec<String> {
    list.iter().map(|s| s.to_string()).collect()
}

/// Tracker wired to in-memory collaborators
pub struct TestObserver {
    pub tracker: Arc<NodesTracker>,
    pub registry: Arc<StaticProcessRegistry>,
    pub params: Arc<MemoryParamStore>,
    pub notifier: Arc<CountingNotifier>,
}

impl TestObserver {
    pub fn new(vital: &[&str], init_params: &[&str], alive: &[&str]) -> Self {
        Self::with_frequency(vital, init_params, alive, 10.0)
    }

    pub fn with_frequency(
        vital: &[&str],
        init_params: &[&str],
        alive: &[&str],
        frequency_hz: f64,
    ) -> Self {
        let settings = ObserverSettings::new(names(vital), names(init_params), frequency_hz)
            .expect("valid test settings");
        let registry = Arc::new(StaticProcessRegistry::new(alive.iter().copied()));
        let params = Arc::new(MemoryParamStore::new());
        let notifier = Arc::new(CountingNotifier::default());
        let tracker = Arc::new(NodesTracker::new(
            settings,
            registry.clone(),
            params.clone(),
            notifier.clone(),
        ));

        Self {
            tracker,
            registry,
            params,
            notifier,
        }
    }
}

/// Tracker wired to an arbitrary registry
pub fn tracker_with_registry(
    vital: &[&str],
    registry: Arc<dyn ProcessRegistry>,
    query_timeout: Duration,
) -> (Arc<NodesTracker>, Arc<CountingNotifier>) {
    let settings = ObserverSettings::new(names(vital), vec![], 10.0)
        .expect("valid test settings")
        .with_query_timeout(query_timeout);
    let notifier = Arc::new(CountingNotifier::default());
    let tracker = Arc::new(NodesTracker::new(
        settings,
        registry,
        Arc::new(MemoryParamStore::new()),
        notifier.clone(),
    ));
    (tracker, notifier)
}
