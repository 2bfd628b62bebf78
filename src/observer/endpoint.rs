//! Client registration endpoint
//!
//! Translates "I am up" / "I am going away" announcements from client
//! processes into tracker membership changes. Always acknowledges.

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::debug;

use crate::observer::status::NodesStatus;
use crate::observer::tracker::NodesTracker;

/// Client announcement
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PingRequest {
    /// Client process name
    pub name: String,
    /// `true` when the client is up, `false` when it is going away
    pub state: bool,
}

impl PingRequest {
    pub fn new(name: impl Into<String>, state: bool) -> Self {
        Self {
            name: name.into(),
            state,
        }
    }
}

/// Empty acknowledgement
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PingAck;

/// Registration endpoint in front of a tracker
#[derive(Clone)]
pub struct RegistrationEndpoint {
    tracker: Arc<NodesTracker>,
}

impl RegistrationEndpoint {
    pub fn new(tracker: Arc<NodesTracker>) -> Self {
        Self { tracker }
    }

    /// Handle a client announcement
    pub async fn ping(&self, request: PingRequest) -> PingAck {
        debug!("Ping from {:?}: state={}", request.name, request.state);
        self.tracker
            .register_or_deregister_client(&request.name, request.state)
            .await;
        PingAck
    }

    /// Current aggregate status
    pub async fn status(&self) -> NodesStatus {
        self.tracker.status().await
    }

    pub fn tracker(&self) -> &Arc<NodesTracker> {
        &self.tracker
    }
}
