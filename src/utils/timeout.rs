//! Timeout utilities for external queries
//!
//! The alive-process query and the parameter store may block; every call
//! the tracker makes is bounded by one of these wrappers.

use std::time::Duration;

/// Fallback timeout for registry and parameter store queries
pub const DEFAULT_QUERY_TIMEOUT: Duration = Duration::from_secs(2);

/// Execute operation with custom timeout
pub async fn with_custom_timeout<F, T>(
    operation: F,
    duration: Duration,
) -> Result<T, tokio::time::error::Elapsed>
where
    F: std::future::Future<Output = T>,
{
    tokio::time::timeout(duration, operation).await
}
