//! Registry of live display connections
//!
//! One mutex guards both the active set and the display mapping, so every
//! mutation is linearizable with respect to `send_to` lookups. Outbound
//! messages go through per-connection unbounded channels; the socket task on
//! the other end owns the actual network send, which keeps this registry free
//! of await points while locked.

use parking_lot::Mutex;
use std::collections::HashMap;
use std::fmt;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::registry::message::DisplayMessage;

/// Identity of one connection, used to detect stale unregisters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConnectionId(Uuid);

impl ConnectionId {
    fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Outcome of an addressed delivery attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delivery {
    Delivered,
    /// No live connection is mapped to the display id; a no-op for the caller
    NotFound,
    /// The subscriber went away mid-send; its mapping has been removed
    Failed,
}

struct RegistryInner {
    active: HashMap<ConnectionId, mpsc::UnboundedSender<DisplayMessage>>,
    displays: HashMap<String, ConnectionId>,
}

/// Tracks live subscriber connections keyed by caller-chosen display ids
pub struct ConnectionRegistry {
    inner: Mutex<RegistryInner>,
}

impl ConnectionRegistry {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(RegistryInner {
                active: HashMap::new(),
                displays: HashMap::new(),
            }),
        }
    }

    /// Admit a connection, returning its identity and the receiving end of its
    /// outbox. A `display_id` installs or silently overwrites the mapping; the
    /// superseded connection stays in the active set but no longer receives
    /// addressed sends.
    pub fn register(
        &self,
        display_id: Option<&str>,
    ) -> (ConnectionId, mpsc::UnboundedReceiver<DisplayMessage>) {
        let id = ConnectionId::new();
        let (tx, rx) = mpsc::unbounded_channel();

        let mut inner = self.inner.lock();
        inner.active.insert(id, tx);
        if let Some(display_val) = display_id {
            if let Some(previous) = inner.displays.insert(display_val.to_string(), id) {
                debug!(display = %display_val, %previous, replacement = %id, "Display mapping superseded");
            }
        }
        info!(connection = %id, display = display_id.unwrap_or("-"), "Connection registered");
        (id, rx)
    }

    /// Drop a connection. The display mapping is removed only while it still
    /// points at this exact connection; a mapping already overwritten by a
    /// newer connection is left alone.
    pub fn unregister(&self, connection: ConnectionId, display_id: Option<&str>) {
        let mut inner = self.inner.lock();
        inner.active.remove(&connection);
        if let Some(display_val) = display_id {
            if inner.displays.get(display_val) == Some(&connection) {
                inner.displays.remove(display_val);
                debug!(display = %display_val, %connection, "Display mapping removed");
            }
        }
        info!(%connection, display = display_id.unwrap_or("-"), "Connection unregistered");
    }

    /// Deliver a message to the connection currently mapped to `display_id`.
    ///
    /// An unmapped id is reported, not raised; a dead subscriber is evicted and
    /// reported as failed. Callers never retry.
    pub fn send_to(&self, display_id: &str, message: DisplayMessage) -> Delivery {
        let mut inner = self.inner.lock();
        let Some(&connection) = inner.displays.get(display_id) else {
            debug!(display = %display_id, "No connection for display");
            return Delivery::NotFound;
        };
        let Some(tx) = inner.active.get(&connection) else {
            inner.displays.remove(display_id);
            return Delivery::NotFound;
        };

        if tx.send(message).is_err() {
            warn!(display = %display_id, %connection, "Subscriber gone, removing mapping");
            inner.active.remove(&connection);
            inner.displays.remove(display_id);
            return Delivery::Failed;
        }
        Delivery::Delivered
    }

    /// Best-effort delivery to every active connection. Dead connections are
    /// pruned without aborting delivery to the rest.
    pub fn broadcast(&self, message: DisplayMessage) -> usize {
        let mut inner = self.inner.lock();
        let mut dead = Vec::new();
        let mut delivered = 0;

        for (&connection, tx) in inner.active.iter() {
            if tx.send(message.clone()).is_ok() {
                delivered += 1;
            } else {
                dead.push(connection);
            }
        }

        for connection in dead {
            inner.active.remove(&connection);
            inner.displays.retain(|_, mapped| *mapped != connection);
            warn!(%connection, "Pruned dead connection during broadcast");
        }

        delivered
    }

    pub fn active_count(&self) -> usize {
        self.inner.lock().active.len()
    }

    pub fn display_count(&self) -> usize {
        self.inner.lock().displays.len()
    }
}

impl Default for ConnectionRegistry {
    fn default() -> Self {
        Self::new()
    }
}
