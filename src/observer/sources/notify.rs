//! Parent notification sinks

use tokio::sync::mpsc;
use tracing::trace;

use crate::observer::traits::StateNotifier;

/// Notifier forwarding change signals over an unbounded channel
///
/// A closed receiver is ignored; the tracker never learns about delivery.
#[derive(Debug, Clone)]
pub struct ChannelNotifier {
    tx: mpsc::UnboundedSender<()>,
}

impl ChannelNotifier {
    /// Create a notifier and the receiver the parent listens on
    pub fn new() -> (Self, mpsc::UnboundedReceiver<()>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }
}

impl StateNotifier for ChannelNotifier {
    fn notify_state_changed(&self) {
        if self.tx.send(()).is_err() {
            trace!("State change receiver dropped, notification discarded");
        }
    }
}
