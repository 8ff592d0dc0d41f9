/// External collaborator interfaces
///
/// Every external system the core talks to sits behind one of these traits:
/// the remote push transport, the local notification display, the ordered
/// remote message log, the identity provider, the navigation surface and the
/// opaque key-value persistence. `memory` carries in-process implementations
/// used by the demo binary and the test suites.
pub mod display;
pub mod identity;
pub mod kv;
pub mod memory;
pub mod message_log;
pub mod navigation;
pub mod push;

pub use display::{
    ChannelConfig, DisplayRequest, ForegroundEvent, ForegroundEventKind, ForegroundHandler,
    NotificationDisplay,
};
pub use identity::IdentityProvider;
pub use kv::KeyValueStore;
pub use message_log::{MessageCursor, MessageLog, SnapshotHandler};
pub use navigation::{Destination, Navigator};
pub use push::{MessageHandler, PermissionStatus, PushTransport};

use crate::error::Result;
use tokio::task::JoinHandle;
use tracing::debug;

/// Detachable subscription token returned by every listener registration.
///
/// Wraps either an unsubscribe closure or an abortable task. Detaching is
/// synchronous; after it returns the underlying callback can no longer fire.
pub struct ListenerHandle {
    label: &'static str,
    detach: Option<Box<dyn FnOnce() -> Result<()> + Send>>,
}

impl ListenerHandle {
    pub fn new<F>(label: &'static str, detach: F) -> Self
    where
        F: FnOnce() -> Result<()> + Send + 'static,
    {
        ListenerHandle {
            label,
            detach: Some(Box::new(detach)),
        }
    }

    /// Wrap a spawned task; detaching aborts it.
    pub fn from_task(label: &'static str, handle: JoinHandle<()>) -> Self {
        ListenerHandle::new(label, move || {
            handle.abort();
            Ok(())
        })
    }

    pub fn label(&self) -> &'static str {
        self.label
    }

    pub fn detach(mut self) -> Result<()> {
        debug!("detaching listener {}", self.label);
        match self.detach.take() {
            Some(detach) => detach(),
            None => Ok(()),
        }
    }
}

impl std::fmt::Debug for ListenerHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ListenerHandle")
            .field("label", &self.label)
            .finish()
    }
}
