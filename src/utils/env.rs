//! Environment variable helpers for configuration overrides

/// Get environment variable as Option
///
/// Returns `Some(value)` if set and valid unicode, `None` otherwise.
pub fn env_opt(key: &str) -> Option<String> {
    std::env::var(key).ok()
}

/// Get environment variable as an optional boolean
///
/// "true", "1", "yes", "on" map to `true` and "false", "0", "no", "off" to
/// `false` (case-insensitive). Unset or unrecognized values give `None`, so
/// an override only applies when it is explicit.
pub fn env_bool_opt(key: &str) -> Option<bool> {
    parse_bool(&env_opt(key)?)
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Some(true),
        "false" | "0" | "no" | "off" => Some(false),
        _ => None,
    }
}
