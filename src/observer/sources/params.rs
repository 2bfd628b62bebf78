//! Parameter stores

use async_trait::async_trait;
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::RwLock;

use crate::observer::traits::{ObserverError, ParameterStore};

/// In-memory parameter store
#[derive(Debug, Default)]
pub struct MemoryParamStore {
    values: RwLock<HashMap<String, Value>>,
}

impl MemoryParamStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store seeded with initial values
    pub fn with_values(values: HashMap<String, Value>) -> Self {
        Self {
            values: RwLock::new(values),
        }
    }

    /// Set a parameter
    pub fn set_param(&self, key: impl Into<String>, value: Value) {
        let key = key.into();
        match self.values.write() {
            Ok(mut values) => {
                values.insert(key, value);
            }
            Err(poisoned) => {
                poisoned.into_inner().insert(key, value);
            }
        }
    }

    /// Delete a parameter, returning its previous value
    pub fn delete_param(&self, key: &str) -> Option<Value> {
        match self.values.write() {
            Ok(mut values) => values.remove(key),
            Err(poisoned) => poisoned.into_inner().remove(key),
        }
    }

    fn read<T>(&self, f: impl FnOnce(&HashMap<String, Value>) -> T) -> Result<T, ObserverError> {
        self.values
            .read()
            .map(|values| f(&*values))
            .map_err(|_| ObserverError::ParamStore("parameter store lock poisoned".to_string()))
    }
}

#[async_trait]
impl ParameterStore for MemoryParamStore {
    async fn has_param(&self, key: &str) -> Result<bool, ObserverError> {
        self.read(|values| values.contains_key(key))
    }

    async fn get_param(&self, key: &str) -> Result<Option<Value>, ObserverError> {
        self.read(|values| values.get(key).cloned())
    }
}

/// Parameter store backed by a JSON object file
///
/// The file is re-read on every lookup so other processes publish their
/// readiness by rewriting it. A missing file holds no parameters; an
/// unreadable or malformed file is a store error.
#[derive(Debug, Clone)]
pub struct JsonFileParamStore {
    path: PathBuf,
}

impl JsonFileParamStore {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn load(&self) -> Result<Map<String, Value>, ObserverError> {
        let content = match tokio::fs::read_to_string(&self.path).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Map::new()),
            Err(e) => {
                return Err(ObserverError::ParamStore(format!(
                    "failed to read {}: {}",
                    self.path.display(),
                    e
                )))
            }
        };

        match serde_json::from_str::<Value>(&content)? {
            Value::Object(map) => Ok(map),
            other => Err(ObserverError::ParamStore(format!(
                "{} must hold a JSON object, found {}",
                self.path.display(),
                other
            ))),
        }
    }
}

#[async_trait]
impl ParameterStore for JsonFileParamStore {
    async fn has_param(&self, key: &str) -> Result<bool, ObserverError> {
        Ok(self.load().await?.contains_key(key))
    }

    async fn get_param(&self, key: &str) -> Result<Option<Value>, ObserverError> {
        Ok(self.load().await?.remove(key))
    }
}
