// Network adapter: client sockets, outbound routing and the shared snapshot stream.

pub mod client;
pub mod outbox;
pub mod snapshots;

pub use client::ws_handler;
pub use outbox::ConnectionTable;
pub use snapshots::bullets_serializer;
