//! Observer collaborator traits and errors
//!
//! Defines the narrow interfaces the tracker consumes: the alive-process
//! query, the parameter store and the parent notification sink.

use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashSet;
use thiserror::Error;

/// Source of the names of the processes currently alive on the system
///
/// Implementations may block or fail; the tracker bounds every call with a
/// timeout and treats errors as "nothing alive".
#[async_trait]
pub trait ProcessRegistry: Send + Sync {
    /// Return the set of currently alive process names
    async fn alive_process_names(&self) -> Result<HashSet<String>, ObserverError>;
}

/// Runtime parameter store queried for initialization flags
#[async_trait]
pub trait ParameterStore: Send + Sync {
    /// Check whether a parameter exists
    async fn has_param(&self, key: &str) -> Result<bool, ObserverError>;

    /// Get a parameter value, `None` if absent
    async fn get_param(&self, key: &str) -> Result<Option<Value>, ObserverError>;
}

/// Parent component told that aggregate state may have changed
///
/// Fire-and-forget: implementations must not block and delivery failures
/// are not reported back.
pub trait StateNotifier: Send + Sync {
    /// Signal that health-relevant state should be re-published
    fn notify_state_changed(&self);
}

/// Observer errors
#[derive(Debug, Error)]
pub enum ObserverError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Process registry query failed: {0}")]
    Registry(String),

    #[error("Parameter store error: {0}")]
    ParamStore(String),

    #[error("IPC communication error: {0}")]
    Ipc(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Timeout waiting for external query")]
    Timeout,
}

impl From<serde_json::Error> for ObserverError {
    fn from(e: serde_json::Error) -> Self {
        ObserverError::Serialization(e.to_string())
    }
}

impl From<bincode::Error> for ObserverError {
    fn from(e: bincode::Error) -> Self {
        ObserverError::Serialization(e.to_string())
    }
}

impl From<toml::de::Error> for ObserverError {
    fn from(e: toml::de::Error) -> Self {
        ObserverError::Config(e.to_string())
    }
}

impl From<tokio::time::error::Elapsed> for ObserverError {
    fn from(_: tokio::time::error::Elapsed) -> Self {
        ObserverError::Timeout
    }
}

/// Truthiness of a parameter value
///
/// `null`, `false`, zero, the empty string and empty collections are falsy.
pub fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().map(|f| f != 0.0).unwrap_or(true),
        Value::String(s) => !s.is_empty(),
        Value::Array(a) => !a.is_empty(),
        Value::Object(o) => !o.is_empty(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_truthiness() {
        assert!(!is_truthy(&Value::Null));
        assert!(!is_truthy(&json!(false)));
        assert!(!is_truthy(&json!(0)));
        assert!(!is_truthy(&json!(0.0)));
        assert!(!is_truthy(&json!("")));
        assert!(!is_truthy(&json!([])));
        assert!(!is_truthy(&json!({})));

        assert!(is_truthy(&json!(true)));
        assert!(is_truthy(&json!(-1)));
        assert!(is_truthy(&json!("ready")));
        assert!(is_truthy(&json!([0])));
        assert!(is_truthy(&json!({"a": null})));
    }
}
