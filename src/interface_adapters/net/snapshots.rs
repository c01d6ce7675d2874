use crate::interface_adapters::protocol::ServerMessage;
use crate::use_cases::BulletsUpdate;
use axum::extract::ws::Utf8Bytes;
use tokio::sync::{broadcast, watch};
use tracing::{error, warn};

/// Serializes each projectile snapshot once and fans the shared bytes out to every connection.
pub async fn bullets_serializer(
    mut bullets_rx: broadcast::Receiver<BulletsUpdate>,
    bullets_bytes_tx: broadcast::Sender<Utf8Bytes>,
    bullets_latest_tx: watch::Sender<Utf8Bytes>,
) {
    loop {
        match bullets_rx.recv().await {
            Ok(update) => {
                let msg = ServerMessage::from(update);
                let txt = match serde_json::to_string(&msg) {
                    Ok(txt) => txt,
                    Err(e) => {
                        error!(error = ?e, "failed to serialize bullets update");
                        continue;
                    }
                };

                let bytes = Utf8Bytes::from(txt);
                // Latest bytes back the lag recovery path in connection loops.
                let _ = bullets_latest_tx.send(bytes.clone());
                let _ = bullets_bytes_tx.send(bytes);
            }
            Err(broadcast::error::RecvError::Lagged(n)) => {
                warn!(
                    missed = n,
                    "bullets serializer lagged; skipping to latest update"
                );
            }
            Err(broadcast::error::RecvError::Closed) => {
                warn!("bullets channel closed; serializer exiting");
                break;
            }
        }
    }
}
