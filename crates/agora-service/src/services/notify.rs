//! Transient user notifications
//!
//! Every user-visible failure ends up here as a [`Notice`]. Delivery is
//! fire-and-forget: with no listener the notice is logged and dropped.

use agora_common::Notice;
use tokio::sync::broadcast;
use tracing::{debug, warn};

use super::error::ServiceError;

/// Broadcasts notices to whoever renders them
#[derive(Clone)]
pub struct Notifier {
    tx: broadcast::Sender<Notice>,
}

impl Notifier {
    /// Create a notifier buffering up to `buffer` unseen notices per listener
    pub fn new(buffer: usize) -> Self {
        let (tx, _) = broadcast::channel(buffer.max(1));
        Self { tx }
    }

    /// Listen for notices
    pub fn subscribe(&self) -> broadcast::Receiver<Notice> {
        self.tx.subscribe()
    }

    pub fn notify(&self, notice: Notice) {
        if notice.is_error() {
            warn!(code = %notice.code, message = %notice.message, "Error notice");
        } else {
            debug!(code = %notice.code, "Info notice");
        }
        // No listener means nobody is looking
        let _ = self.tx.send(notice);
    }

    /// Surface an error to the user unless it is silent
    ///
    /// Returns whether a notice was sent.
    pub fn report(&self, err: &ServiceError) -> bool {
        match err.notice() {
            Some(notice) => {
                self.notify(notice);
                true
            }
            None => {
                debug!(code = %err.error_code(), "Silent failure");
                false
            }
        }
    }
}

impl std::fmt::Debug for Notifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Notifier")
            .field("listeners", &self.tx.receiver_count())
            .finish()
    }
}
