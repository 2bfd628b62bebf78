//! Periodic vital nodes check
//!
//! The loop is started at most once: `NotStarted -> Running`. A second start
//! request while the task is alive is a no-op. The task runs until the loop
//! is dropped; a task that ended abnormally may be started again.

use std::sync::{Arc, Mutex};
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tracing::{debug, info, warn};

use crate::observer::tracker::NodesTracker;

enum LoopState {
    NotStarted,
    Running(JoinHandle<()>),
}

/// Handle on the periodic check task
pub struct CheckLoop {
    state: Mutex<LoopState>,
}

impl CheckLoop {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(LoopState::NotStarted),
        }
    }

    /// Start ticking at the tracker's check frequency
    ///
    /// Returns `false` if the loop is already running. The first tick fires
    /// one period after start.
    pub fn start(&self, tracker: Arc<NodesTracker>) -> bool {
        let mut state = match self.state.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };

        if let LoopState::Running(handle) = &*state {
            if !handle.is_finished() {
                debug!("Nodes check loop already running");
                return false;
            }
            warn!("Nodes check loop task ended unexpectedly, restarting");
        }

        let period = tracker.settings().check_period();
        info!("Starting nodes check loop every {:?}", period);

        let handle = tokio::spawn(async move {
            let mut ticker = interval_at(Instant::now() + period, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                ticker.tick().await;
                tracker.tick().await;
            }
        });

        *state = LoopState::Running(handle);
        true
    }

    /// Whether the check task is alive
    pub fn is_running(&self) -> bool {
        let state = match self.state.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        matches!(&*state, LoopState::Running(handle) if !handle.is_finished())
    }
}

impl Default for CheckLoop {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for CheckLoop {
    fn drop(&mut self) {
        let state = match self.state.get_mut() {
            Ok(state) => state,
            Err(poisoned) => poisoned.into_inner(),
        };
        if let LoopState::Running(handle) = state {
            handle.abort();
        }
    }
}
