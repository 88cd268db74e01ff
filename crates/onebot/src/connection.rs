use {
    std::sync::RwLock,
    tokio::sync::mpsc,
    tracing::{debug, info},
};

/// Writer handle for the live peer connection.
///
/// Wraps the sender side of the channel drained by the connection's write
/// task. Cloning shares the same underlying connection; once the write task
/// is gone, every clone's [`send`](Self::send) fails.
#[derive(Debug, Clone)]
pub struct BotConnection {
    conn_id: String,
    tx: mpsc::UnboundedSender<String>,
}

impl BotConnection {
    #[must_use]
    pub fn new(tx: mpsc::UnboundedSender<String>) -> Self {
        Self {
            conn_id: uuid::Uuid::new_v4().to_string(),
            tx,
        }
    }

    #[must_use]
    pub fn conn_id(&self) -> &str {
        &self.conn_id
    }

    /// Queue one frame for the write task.
    pub fn send(&self, frame: String) -> Result<(), mpsc::error::SendError<String>> {
        self.tx.send(frame)
    }
}

/// Single-slot registry for the one live peer connection.
///
/// The peer connects toward this process, so its reconnect is the normal
/// recovery path: `register` replaces any existing handle unconditionally.
/// Sends racing a replacement fail individually against the abandoned
/// handle; they never corrupt the slot.
#[derive(Debug, Default)]
pub struct ConnectionRegistry {
    slot: RwLock<Option<BotConnection>>,
}

impl ConnectionRegistry {
    /// Install a connection, replacing whatever was there (last writer
    /// wins).
    pub fn register(&self, conn: BotConnection) {
        let mut slot = self.slot.write().unwrap_or_else(|e| e.into_inner());
        let conn_id = conn.conn_id.clone();
        if let Some(previous) = slot.replace(conn) {
            info!(conn_id = %conn_id, replaced = %previous.conn_id, "onebot: connection replaced");
        } else {
            info!(conn_id = %conn_id, "onebot: connection registered");
        }
    }

    /// The active handle, if any. Doubles as the liveness probe.
    #[must_use]
    pub fn current(&self) -> Option<BotConnection> {
        self.slot
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    #[must_use]
    pub fn is_connected(&self) -> bool {
        self.slot
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .is_some()
    }

    /// Remove the active handle. Idempotent.
    pub fn clear(&self) {
        let mut slot = self.slot.write().unwrap_or_else(|e| e.into_inner());
        if let Some(previous) = slot.take() {
            info!(conn_id = %previous.conn_id, "onebot: connection cleared");
        }
    }

    /// Remove the handle only if `conn_id` still owns the slot.
    ///
    /// A connection that was replaced must not clear its successor on the
    /// way out. Returns whether the slot was cleared.
    pub fn clear_if(&self, conn_id: &str) -> bool {
        let mut slot = self.slot.write().unwrap_or_else(|e| e.into_inner());
        if slot.as_ref().is_some_and(|c| c.conn_id == conn_id) {
            slot.take();
            info!(conn_id = %conn_id, "onebot: connection cleared");
            true
        } else {
            debug!(conn_id = %conn_id, "onebot: stale connection already replaced");
            false
        }
    }
}
