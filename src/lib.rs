//! Nodes observer - liveness and readiness monitor for a robotics control stack
//!
//! Periodically checks that a configured set of vital processes is alive,
//! that the runtime initialization parameters are set, and keeps track of
//! the client processes that announce themselves over the registration
//! endpoint. Aggregate health is exposed as queryable state and as a
//! change notification to a parent status component.
//!
//! ## Design Principles
//!
//! 1. **Detect, never remediate**: nothing is restarted or killed
//! 2. **Injected collaborators**: process registry, parameter store and
//!    notifier are traits, so the tracker runs against fakes in tests
//! 3. **Degrade, don't crash**: a failed query reads as "nothing alive"
//!    and the check loop keeps running

pub mod config;
#[cfg(unix)]
pub mod ipc;
pub mod observer;
pub mod utils;

pub use config::{ObserverConfig, ObserverSettings};
pub use observer::{
    CheckLoop, HealthStatus, NodesStatus, NodesTracker, ObserverError, PingAck, PingRequest,
    RegistrationEndpoint,
};
