use crate::domain::PlayerId;
use crate::interface_adapters::protocol::ServerMessage;
use crate::use_cases::{Dispatch, Outbox};
use axum::extract::ws::Utf8Bytes;
use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;
use tracing::{error, warn};

/// Per-connection outbound queues, keyed by player id.
///
/// The world task delivers through this table without awaiting. A connection whose queue is
/// full is evicted; dropping its sender ends the connection's write loop.
#[derive(Debug, Default)]
pub struct ConnectionTable {
    senders: RwLock<HashMap<PlayerId, mpsc::Sender<Utf8Bytes>>>,
}

impl ConnectionTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a connection's outbound queue. Must happen before the arena hears about it.
    pub fn register(&self, player_id: PlayerId, tx: mpsc::Sender<Utf8Bytes>) {
        let mut senders = self.senders.write().unwrap_or_else(PoisonError::into_inner);
        senders.insert(player_id, tx);
    }

    pub fn unregister(&self, player_id: PlayerId) {
        let mut senders = self.senders.write().unwrap_or_else(PoisonError::into_inner);
        senders.remove(&player_id);
    }

    #[cfg(test)]
    fn len(&self) -> usize {
        self.senders
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}

impl Outbox for ConnectionTable {
    fn deliver(&self, dispatch: Dispatch) {
        // Serialize once per event and share the bytes across recipients.
        let msg = ServerMessage::from(&dispatch.event);
        let bytes = match serde_json::to_string(&msg) {
            Ok(txt) => Utf8Bytes::from(txt),
            Err(e) => {
                error!(error = ?e, "failed to serialize server event");
                return;
            }
        };

        let mut overflowed = Vec::new();
        {
            let senders = self.senders.read().unwrap_or_else(PoisonError::into_inner);
            for player_id in &dispatch.recipients {
                let Some(tx) = senders.get(player_id) else {
                    continue;
                };
                match tx.try_send(bytes.clone()) {
                    Ok(()) => {}
                    Err(TrySendError::Full(_)) => overflowed.push(*player_id),
                    // Connection is already tearing down.
                    Err(TrySendError::Closed(_)) => {}
                }
            }
        }

        if overflowed.is_empty() {
            return;
        }

        let mut senders = self.senders.write().unwrap_or_else(PoisonError::into_inner);
        for player_id in overflowed {
            warn!(player_id, "outbound queue full; dropping connection");
            senders.remove(&player_id);
        }
    }
}
