//! Node liveness observer
//!
//! Tracks whether the vital processes of the stack are alive, whether the
//! initialization parameters are set, and which client processes are
//! registered.
//!
//! ## Architecture
//!
//! - **Tracker**: owns configuration, client membership and derived health
//! - **Check loop**: periodic tick, started at most once
//! - **Registration endpoint**: client pings mutate membership and notify
//! - **Sources**: injected process registry, parameter store and notifier

pub mod check_loop;
pub mod endpoint;
pub mod sources;
pub mod status;
pub mod tracker;
pub mod traits;

pub use check_loop::CheckLoop;
pub use endpoint::{PingAck, PingRequest, RegistrationEndpoint};
pub use status::{HealthStatus, NodesStatus};
pub use tracker::NodesTracker;
pub use traits::{is_truthy, ObserverError, ParameterStore, ProcessRegistry, StateNotifier};
