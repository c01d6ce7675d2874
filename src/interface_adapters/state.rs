use crate::interface_adapters::net::outbox::ConnectionTable;
use crate::interface_adapters::utils::ids::ConnectionIds;
use crate::use_cases::ArenaHandle;
use axum::extract::ws::Utf8Bytes;
use std::sync::Arc;
use tokio::sync::{broadcast, watch};

#[derive(Clone)]
pub struct AppState {
    // Events and commands flowing from the network into the world task.
    pub arena: ArenaHandle,
    // Outbound queues the world task delivers discrete events through.
    pub connections: Arc<ConnectionTable>,
    // Capacity of each connection's outbound queue before it counts as too slow.
    pub outbound_capacity: usize,
    // Serialized projectile snapshots, shared across all connections.
    pub bullets_bytes_tx: broadcast::Sender<Utf8Bytes>,
    // Latest serialized snapshot for lag recovery.
    pub bullets_latest_tx: watch::Sender<Utf8Bytes>,
    pub connection_ids: Arc<ConnectionIds>,
}
