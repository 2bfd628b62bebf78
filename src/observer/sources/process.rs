//! Alive-process registries

use async_trait::async_trait;
use std::collections::HashSet;
use std::sync::RwLock;

use crate::observer::traits::{ObserverError, ProcessRegistry};

/// Registry over a fixed, replaceable set of names
///
/// Used when another component already knows which processes are up, and in
/// tests.
#[derive(Debug, Default)]
pub struct StaticProcessRegistry {
    alive: RwLock<HashSet<String>>,
}

impl StaticProcessRegistry {
    pub fn new<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            alive: RwLock::new(names.into_iter().map(Into::into).collect()),
        }
    }

    /// Replace the set of alive names
    pub fn set_alive<I, S>(&self, names: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let names: HashSet<String> = names.into_iter().map(Into::into).collect();
        match self.alive.write() {
            Ok(mut alive) => *alive = names,
            Err(poisoned) => *poisoned.into_inner() = names,
        }
    }
}

#[async_trait]
impl ProcessRegistry for StaticProcessRegistry {
    async fn alive_process_names(&self) -> Result<HashSet<String>, ObserverError> {
        self.alive
            .read()
            .map(|alive| alive.clone())
            .map_err(|_| ObserverError::Registry("registry lock poisoned".to_string()))
    }
}

/// Registry listing the processes of the local host
///
/// Process enumeration is blocking, so it runs on the blocking pool.
#[cfg(feature = "sysinfo")]
#[derive(Debug, Default)]
pub struct SysinfoProcessRegistry;

#[cfg(feature = "sysinfo")]
impl SysinfoProcessRegistry {
    pub fn new() -> Self {
        Self
    }
}

#[cfg(feature = "sysinfo")]
#[async_trait]
impl ProcessRegistry for SysinfoProcessRegistry {
    async fn alive_process_names(&self) -> Result<HashSet<String>, ObserverError> {
        tokio::task::spawn_blocking(|| {
            let mut system = sysinfo::System::new();
            system.refresh_processes();
            system
                .processes()
                .values()
                .map(|process| process.name().to_string())
                .collect::<HashSet<String>>()
        })
        .await
        .map_err(|e| ObserverError::Registry(format!("process listing task failed: {}", e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_static_registry_replace() {
        let registry = StaticProcessRegistry::new(["a", "b"]);
        assert_eq!(registry.alive_process_names().await.unwrap().len(), 2);

        registry.set_alive(["c"]);
        let alive = registry.alive_process_names().await.unwrap();
        assert!(alive.contains("c"));
        assert!(!alive.contains("a"));
    }
}
