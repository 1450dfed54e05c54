//! Upload observers and throttled progress fan-out.

use std::sync::{Arc, PoisonError, RwLock};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use strongbox_protocol::Node;
use strongbox_transfer::{BlockProgress, ProgressThrottle};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::error::UploadError;

/// Observer of a buffered upload's lifecycle.
///
/// All methods default to no-ops. They run on the upload task, so
/// implementations should return quickly.
pub trait UploadCallback: Send + Sync {
    fn on_started(&self, _id: &str) {}

    /// `sent` bytes of `total` have been handed to the connection.
    fn on_running(&self, _id: &str, _sent: u64, _total: u64) {}

    fn on_finished(&self, _id: &str, _node: &Node) {}

    fn on_canceled(&self, _id: &str) {}

    fn on_failed(&self, _id: &str, _error: &UploadError) {}
}

// ---------------------------------------------------------------------------
// Registry
// ---------------------------------------------------------------------------

/// Insertion-ordered set of observers.
///
/// Observers may be added or removed while an upload dispatches; every
/// dispatch iterates a snapshot taken under the lock.
#[derive(Default)]
pub struct CallbackRegistry {
    callbacks: RwLock<Vec<Arc<dyn UploadCallback>>>,
}

impl CallbackRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `callback`. Adding the same observer twice is a no-op.
    pub fn add(&self, callback: Arc<dyn UploadCallback>) {
        let mut callbacks = self
            .callbacks
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        if !callbacks.iter().any(|c| Arc::ptr_eq(c, &callback)) {
            callbacks.push(callback);
        }
    }

    /// Unregisters `callback`. Returns `true` if it was registered.
    pub fn remove(&self, callback: &Arc<dyn UploadCallback>) -> bool {
        let mut callbacks = self
            .callbacks
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        let before = callbacks.len();
        callbacks.retain(|c| !Arc::ptr_eq(c, callback));
        callbacks.len() != before
    }

    pub fn len(&self) -> usize {
        self.callbacks
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn snapshot(&self) -> Vec<Arc<dyn UploadCallback>> {
        self.callbacks
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn started(&self, id: &str) {
        for cb in self.snapshot() {
            cb.on_started(id);
        }
    }

    pub fn running(&self, id: &str, sent: u64, total: u64) {
        for cb in self.snapshot() {
            cb.on_running(id, sent, total);
        }
    }

    pub fn finished(&self, id: &str, node: &Node) {
        for cb in self.snapshot() {
            cb.on_finished(id, node);
        }
    }

    pub fn canceled(&self, id: &str) {
        for cb in self.snapshot() {
            cb.on_canceled(id);
        }
    }

    pub fn failed(&self, id: &str, error: &UploadError) {
        for cb in self.snapshot() {
            cb.on_failed(id, error);
        }
    }
}

impl std::fmt::Debug for CallbackRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CallbackRegistry")
            .field("len", &self.len())
            .finish()
    }
}

// ---------------------------------------------------------------------------
// Progress notifier
// ---------------------------------------------------------------------------

/// Turns per-block progress into throttled `running` events.
///
/// No event is emitted once the upload is cancelled.
pub struct ProgressNotifier {
    id: String,
    total: u64,
    throttle: ProgressThrottle,
    callbacks: Arc<CallbackRegistry>,
    cancel: CancellationToken,
}

impl ProgressNotifier {
    pub fn new(
        id: impl Into<String>,
        total: u64,
        interval: Duration,
        callbacks: Arc<CallbackRegistry>,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            id: id.into(),
            total,
            throttle: ProgressThrottle::new(interval),
            callbacks,
            cancel,
        }
    }

    /// Reports that `sent` bytes of the source have been written.
    ///
    /// Returns `true` if a `running` event was dispatched.
    pub fn block_written(&self, sent: u64) -> bool {
        if self.cancel.is_cancelled() || !self.throttle.try_acquire() {
            return false;
        }
        self.callbacks.running(&self.id, sent, self.total);
        true
    }

    /// Builds the block hook for a chunk starting at `chunk_offset`.
    pub fn block_hook(self: &Arc<Self>, chunk_offset: u64) -> BlockProgress {
        let notifier = Arc::clone(self);
        Arc::new(move |written| {
            notifier.block_written(chunk_offset + written);
        })
    }
}

// ---------------------------------------------------------------------------
// Channel adapter
// ---------------------------------------------------------------------------

/// Lifecycle event delivered over a channel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum UploadEvent {
    Started { id: String },
    Running { id: String, sent: u64, total: u64 },
    Finished { id: String, node: Node },
    Canceled { id: String },
    Failed { id: String, error: String },
}

impl UploadCallback for mpsc::UnboundedSender<UploadEvent> {
    fn on_started(&self, id: &str) {
        let _ = self.send(UploadEvent::Started { id: id.into() });
    }

    fn on_running(&self, id: &str, sent: u64, total: u64) {
        let _ = self.send(UploadEvent::Running {
            id: id.into(),
            sent,
            total,
        });
    }

    fn on_finished(&self, id: &str, node: &Node) {
        let _ = self.send(UploadEvent::Finished {
            id: id.into(),
            node: node.clone(),
        });
    }

    fn on_canceled(&self, id: &str) {
        let _ = self.send(UploadEvent::Canceled { id: id.into() });
    }

    fn on_failed(&self, id: &str, error: &UploadError) {
        let _ = self.send(UploadEvent::Failed {
            id: id.into(),
            error: error.to_string(),
        });
    }
}
