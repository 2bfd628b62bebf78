//! Utility modules shared by the observer and its binary

pub mod env;
pub mod logging;
pub mod signal;
pub mod timeout;

pub use env::{env_bool_opt, env_opt};
pub use logging::{init_logging, init_logging_from_config};
#[cfg(feature = "json-logging")]
pub use logging::init_json_logging;
pub use signal::{create_shutdown_receiver, wait_for_shutdown_signal};
pub use timeout::{with_custom_timeout, DEFAULT_QUERY_TIMEOUT};
