//! Configuration management for nodes-observer
//!
//! Handles configuration loading, validation, and resolution of the static
//! snapshot the tracker is built from.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::path::Path;
use std::time::Duration;

use crate::observer::traits::ObserverError;
use crate::utils::env::env_bool_opt;
use crate::utils::timeout::DEFAULT_QUERY_TIMEOUT;

/// Environment variable overriding the simulation-mode flag
pub const SIMULATION_MODE_ENV: &str = "NODES_OBSERVER_SIMULATION_MODE";

/// Client name of the status UI itself, never tracked as a client
pub const DEFAULT_RESERVED_CLIENT_NAME: &str = "/niryo_robot_user_interface";

/// Node checks configuration (`[observer]` table)
///
/// The required keys are kept optional here so that a missing one surfaces as
/// a precise [`ObserverError::Config`] from [`ObserverSettings::from_config`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NodesCheckConfig {
    /// Process names that must always be alive
    pub vital_nodes_common: Option<Vec<String>>,

    /// Extra process names required on real hardware only
    #[serde(default)]
    pub vital_nodes_real: Vec<String>,

    /// Parameters that must be set and truthy once startup completed
    pub initialisation_params: Option<Vec<String>>,

    /// Periodic check frequency (Hz)
    pub check_nodes_frequency: Option<f64>,

    /// Simulation mode flag; the real-hardware list is merged only when this
    /// is present and false
    #[serde(default)]
    pub simulation_mode: Option<bool>,

    /// Client name filtered out of registrations
    #[serde(default = "default_reserved_client_name")]
    pub reserved_client_name: String,

    /// Timeout for process registry and parameter store queries (ms)
    #[serde(default = "default_query_timeout_ms")]
    pub query_timeout_ms: u64,
}

impl Default for NodesCheckConfig {
    fn default() -> Self {
        Self {
            vital_nodes_common: None,
            vital_nodes_real: Vec::new(),
            initialisation_params: None,
            check_nodes_frequency: None,
            simulation_mode: None,
            reserved_client_name: default_reserved_client_name(),
            query_timeout_ms: default_query_timeout_ms(),
        }
    }
}

fn default_reserved_client_name() -> String {
    DEFAULT_RESERVED_CLIENT_NAME.to_string()
}

fn default_query_timeout_ms() -> u64 {
    DEFAULT_QUERY_TIMEOUT.as_millis() as u64
}

fn default_true() -> bool {
    true
}

fn default_socket_path() -> String {
    "data/nodes_observer/ping.sock".to_string()
}

/// Registration endpoint IPC configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IpcConfig {
    /// Serve the registration endpoint over a Unix socket
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Socket path
    #[serde(default = "default_socket_path")]
    pub socket_path: String,
}

impl Default for IpcConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            socket_path: default_socket_path(),
        }
    }
}

/// Parameter store configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ParamsConfig {
    /// JSON object file re-read on every lookup (takes precedence over `initial`)
    #[serde(default)]
    pub file: Option<String>,

    /// Values seeded into the in-memory store
    #[serde(default)]
    pub initial: HashMap<String, Value>,
}

/// Logging configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log filter (e.g. "info", "nodes_observer=debug"); RUST_LOG wins
    #[serde(default)]
    pub filter: Option<String>,

    /// Emit JSON lines (requires the `json-logging` feature)
    #[serde(default)]
    pub json_format: bool,
}

/// Top-level configuration file
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ObserverConfig {
    /// Node checks
    #[serde(default)]
    pub observer: NodesCheckConfig,

    /// Registration endpoint transport
    #[serde(default)]
    pub ipc: IpcConfig,

    /// Parameter store
    #[serde(default)]
    pub params: ParamsConfig,

    /// Logging
    pub logging: Option<LoggingConfig>,
}

impl ObserverConfig {
    /// Load configuration from TOML file
    pub fn from_toml_file(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: ObserverConfig = toml::from_str(&content)?;
        Ok(config)
    }

    /// Load configuration from JSON file
    pub fn from_json_file(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: ObserverConfig = serde_json::from_str(&content)?;
        Ok(config)
    }

    /// Load configuration, picking the format from the file extension
    pub fn from_file(path: &Path) -> anyhow::Result<Self> {
        match path.extension().and_then(|e| e.to_str()) {
            Some("json") => Self::from_json_file(path),
            _ => Self::from_toml_file(path),
        }
    }

    /// Apply environment overrides
    pub fn apply_env_overrides(&mut self) {
        if let Some(simulation) = env_bool_opt(SIMULATION_MODE_ENV) {
            self.observer.simulation_mode = Some(simulation);
        }
    }

    /// Validate configuration
    pub fn validate(&self) -> anyhow::Result<()> {
        ObserverSettings::from_config(&self.observer)?;

        if self.ipc.enabled && self.ipc.socket_path.is_empty() {
            return Err(anyhow::anyhow!(
                "ipc.socket_path must not be empty when the IPC endpoint is enabled"
            ));
        }

        Ok(())
    }

    /// Resolve the tracker settings snapshot
    pub fn settings(&self) -> Result<ObserverSettings, ObserverError> {
        ObserverSettings::from_config(&self.observer)
    }
}

/// Immutable configuration snapshot of the tracker
#[derive(Debug, Clone, PartialEq)]
pub struct ObserverSettings {
    vital_nodes: Vec<String>,
    initialization_params: Vec<String>,
    check_frequency_hz: f64,
    check_period: Duration,
    reserved_client_name: String,
    query_timeout: Duration,
}

impl ObserverSettings {
    /// Create settings from explicit values
    pub fn new(
        vital_nodes: Vec<String>,
        initialization_params: Vec<String>,
        check_frequency_hz: f64,
    ) -> Result<Self, ObserverError> {
        if !check_frequency_hz.is_finite() || check_frequency_hz <= 0.0 {
            return Err(ObserverError::Config(format!(
                "check_nodes_frequency must be a positive number, got {}",
                check_frequency_hz
            )));
        }

        let check_period = match Duration::try_from_secs_f64(1.0 / check_frequency_hz) {
            Ok(period) if !period.is_zero() => period,
            _ => {
                return Err(ObserverError::Config(format!(
                    "check_nodes_frequency {} Hz gives no usable check period",
                    check_frequency_hz
                )))
            }
        };

        Ok(Self {
            vital_nodes,
            initialization_params,
            check_frequency_hz,
            check_period,
            reserved_client_name: DEFAULT_RESERVED_CLIENT_NAME.to_string(),
            query_timeout: DEFAULT_QUERY_TIMEOUT,
        })
    }

    /// Resolve settings from the `[observer]` table
    pub fn from_config(config: &NodesCheckConfig) -> Result<Self, ObserverError> {
        let mut vital_nodes = config
            .vital_nodes_common
            .clone()
            .ok_or_else(|| missing_key("vital_nodes_common"))?;
        let initialization_params = config
            .initialisation_params
            .clone()
            .ok_or_else(|| missing_key("initialisation_params"))?;
        let frequency = config
            .check_nodes_frequency
            .ok_or_else(|| missing_key("check_nodes_frequency"))?;

        if config.simulation_mode == Some(false) {
            vital_nodes.extend(config.vital_nodes_real.iter().cloned());
        }

        if config.query_timeout_ms == 0 {
            return Err(ObserverError::Config(
                "query_timeout_ms must be greater than 0".to_string(),
            ));
        }

        Ok(Self::new(vital_nodes, initialization_params, frequency)?
            .with_reserved_client_name(config.reserved_client_name.clone())
            .with_query_timeout(Duration::from_millis(config.query_timeout_ms)))
    }

    /// Set the reserved client name
    pub fn with_reserved_client_name(mut self, name: impl Into<String>) -> Self {
        self.reserved_client_name = name.into();
        self
    }

    /// Set the external query timeout
    pub fn with_query_timeout(mut self, timeout: Duration) -> Self {
        self.query_timeout = timeout;
        self
    }

    pub fn vital_nodes(&self) -> &[String] {
        &self.vital_nodes
    }

    pub fn initialization_params(&self) -> &[String] {
        &self.initialization_params
    }

    pub fn check_frequency_hz(&self) -> f64 {
        self.check_frequency_hz
    }

    /// Period between two automatic checks
    pub fn check_period(&self) -> Duration {
        self.check_period
    }

    pub fn reserved_client_name(&self) -> &str {
        &self.reserved_client_name
    }

    pub fn query_timeout(&self) -> Duration {
        self.query_timeout
    }
}

fn missing_key(key: &str) -> ObserverError {
    ObserverError::Config(format!("missing required key observer.{}", key))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    const FULL: &str = r#"
        [observer]
        vital_nodes_common = ["/controller", "/driver"]
        vital_nodes_real = ["/hardware"]
        initialisation_params = ["/ready"]
        check_nodes_frequency = 2.0

        [ipc]
        socket_path = "/tmp/observer.sock"

        [params.initial]
        "/ready" = false

        [logging]
        filter = "debug"
    "#;

    #[test]
    fn test_parse_full_config() {
        let config: ObserverConfig = toml::from_str(FULL).unwrap();
        config.validate().unwrap();

        let settings = config.settings().unwrap();
        assert_eq!(settings.vital_nodes(), ["/controller", "/driver"]);
        assert_eq!(settings.initialization_params(), ["/ready"]);
        assert_eq!(settings.check_period(), Duration::from_millis(500));
        assert_eq!(settings.reserved_client_name(), DEFAULT_RESERVED_CLIENT_NAME);
        assert_eq!(settings.query_timeout(), Duration::from_secs(2));
        assert_eq!(config.ipc.socket_path, "/tmp/observer.sock");
        assert_eq!(config.params.initial.get("/ready"), Some(&Value::Bool(false)));
        assert_eq!(
            config.logging.and_then(|l| l.filter),
            Some("debug".to_string())
        );
    }

    #[test]
    fn test_real_nodes_merged_only_outside_simulation() {
        let mut config: ObserverConfig = toml::from_str(FULL).unwrap();

        // Flag absent: real-hardware list ignored
        assert_eq!(config.settings().unwrap().vital_nodes().len(), 2);

        config.observer.simulation_mode = Some(true);
        assert_eq!(config.settings().unwrap().vital_nodes().len(), 2);

        config.observer.simulation_mode = Some(false);
        assert_eq!(
            config.settings().unwrap().vital_nodes(),
            ["/controller", "/driver", "/hardware"]
        );
    }

    #[test]
    fn test_missing_required_keys() {
        let config: ObserverConfig = toml::from_str(
            r#"
            [observer]
            vital_nodes_common = ["/controller"]
            check_nodes_frequency = 1.0
            "#,
        )
        .unwrap();

        match config.settings() {
            Err(ObserverError::Config(msg)) => assert!(msg.contains("initialisation_params")),
            other => panic!("expected config error, got {:?}", other),
        }
        assert!(config.validate().is_err());

        let empty = ObserverConfig::default();
        assert!(matches!(empty.settings(), Err(ObserverError::Config(_))));
    }

    #[test]
    fn test_invalid_frequency() {
        assert!(ObserverSettings::new(vec![], vec![], 0.0).is_err());
        assert!(ObserverSettings::new(vec![], vec![], -1.0).is_err());
        assert!(ObserverSettings::new(vec![], vec![], f64::NAN).is_err());
        assert!(ObserverSettings::new(vec![], vec![], 10.0).is_ok());

        // Period rounds to zero
        assert!(matches!(
            ObserverSettings::new(vec![], vec![], 1e12),
            Err(ObserverError::Config(_))
        ));
        // Period too long for a Duration
        assert!(matches!(
            ObserverSettings::new(vec![], vec![], 1e-20),
            Err(ObserverError::Config(_))
        ));

        let mut config: ObserverConfig = toml::from_str(FULL).unwrap();
        config.observer.check_nodes_frequency = Some(1e-20);
        assert!(config.validate().is_err());
        config.observer.check_nodes_frequency = Some(1e12);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_extreme_valid_frequencies_keep_a_period() {
        let fast = ObserverSettings::new(vec![], vec![], 1e6).unwrap();
        assert!(!fast.check_period().is_zero());
        assert!(fast.check_period() <= Duration::from_micros(1));

        let slow = ObserverSettings::new(vec![], vec![], 0.25).unwrap();
        assert_eq!(slow.check_period(), Duration::from_secs(4));
    }

    #[test]
    #[serial]
    fn test_simulation_env_override() {
        let mut config: ObserverConfig = toml::from_str(FULL).unwrap();
        config.observer.simulation_mode = Some(true);

        std::env::set_var(SIMULATION_MODE_ENV, "false");
        config.apply_env_overrides();
        std::env::remove_var(SIMULATION_MODE_ENV);

        assert_eq!(config.observer.simulation_mode, Some(false));
        assert_eq!(
            config.settings().unwrap().vital_nodes(),
            ["/controller", "/driver", "/hardware"]
        );

        std::env::set_var(SIMULATION_MODE_ENV, "true");
        config.apply_env_overrides();
        std::env::remove_var(SIMULATION_MODE_ENV);

        assert_eq!(
            config.settings().unwrap().vital_nodes(),
            ["/controller", "/driver"]
        );
    }

    #[test]
    #[serial]
    fn test_env_override_absent_keeps_file_value() {
        std::env::remove_var(SIMULATION_MODE_ENV);
        let mut config: ObserverConfig = toml::from_str(FULL).unwrap();
        config.observer.simulation_mode = Some(false);

        config.apply_env_overrides();
        assert_eq!(config.observer.simulation_mode, Some(false));
        assert_eq!(config.settings().unwrap().vital_nodes().len(), 3);
    }

    #[test]
    fn test_from_file_toml() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("observer.toml");
        std::fs::write(&path, FULL).unwrap();

        let loaded = ObserverConfig::from_file(&path).unwrap();
        loaded.validate().unwrap();
        assert_eq!(loaded.ipc.socket_path, "/tmp/observer.sock");
        assert_eq!(
            loaded.settings().unwrap(),
            toml::from_str::<ObserverConfig>(FULL).unwrap().settings().unwrap()
        );
    }

    #[test]
    fn test_json_round_trip_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("observer.json");
        let config: ObserverConfig = toml::from_str(FULL).unwrap();
        std::fs::write(&path, serde_json::to_string_pretty(&config).unwrap()).unwrap();

        let loaded = ObserverConfig::from_file(&path).unwrap();
        assert_eq!(loaded.settings().unwrap(), config.settings().unwrap());
    }
}
