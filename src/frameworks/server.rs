// Framework bootstrap for the arena server runtime.

use crate::frameworks::config;
use crate::interface_adapters::net::{ConnectionTable, bullets_serializer, ws_handler};
use crate::interface_adapters::state::AppState;
use crate::interface_adapters::utils::ids::ConnectionIds;
use crate::use_cases::{ArenaHandle, ArenaSettings};

use axum::{Router, extract::ws::Utf8Bytes, routing::get};
use std::net::SocketAddr;
use std::{io::Result, sync::Arc};
use tokio::sync::{broadcast, watch};

fn init_runtime() {
    let _ = dotenvy::dotenv();

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));

    let json = matches!(std::env::var("LOG_FORMAT").as_deref(), Ok("json"));
    if json {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(false)
            .json()
            .with_current_span(true)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(false)
            .compact()
            .init();
    }

    std::panic::set_hook(Box::new(|info| {
        let backtrace = std::backtrace::Backtrace::capture();
        tracing::error!(%info, ?backtrace, "panic");
    }));
}

pub async fn run(listener: tokio::net::TcpListener) -> Result<()> {
    let address = listener.local_addr()?;
    let state = build_state();
    let arena = state.arena.clone();

    let app = Router::new()
        .route("/ws", get(ws_handler))
        .with_state(state);

    tracing::info!(%address, "listening");

    // Serve app and report errors rather than panicking
    let served = axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .inspect_err(|e| {
            tracing::error!(error = %e, "server error");
        });

    arena.shutdown();
    tracing::info!("server stopped");
    served
}

pub async fn run_with_config() -> Result<()> {
    init_runtime();

    let address = SocketAddr::new(config::bind_addr(), config::http_port());

    // Bind TCP listener with error handling
    let listener = tokio::net::TcpListener::bind(address)
        .await
        .inspect_err(|e| {
            tracing::error!(%address, error = %e, "failed to bind");
        })?;

    run(listener).await
}

fn build_state() -> Arc<AppState> {
    let connections = Arc::new(ConnectionTable::new());

    let settings = ArenaSettings {
        input_channel_capacity: config::INPUT_CHANNEL_CAPACITY,
        bullets_broadcast_capacity: config::BULLETS_BROADCAST_CAPACITY,
        tick_interval: config::tick_interval(),
    };
    tracing::debug!(
        tick_ms = settings.tick_interval.as_millis() as u64,
        "arena configured"
    );
    let arena = ArenaHandle::spawn(&settings, connections.clone());

    // Serialized snapshots are shared by every connection.
    let (bullets_bytes_tx, _bullets_bytes_rx) =
        broadcast::channel::<Utf8Bytes>(config::BULLETS_BROADCAST_CAPACITY);
    let (bullets_latest_tx, _bullets_latest_rx) = watch::channel::<Utf8Bytes>(Utf8Bytes::from(""));
    tokio::spawn(bullets_serializer(
        arena.subscribe_bullets(),
        bullets_bytes_tx.clone(),
        bullets_latest_tx.clone(),
    ));

    Arc::new(AppState {
        arena,
        connections,
        outbound_capacity: config::OUTBOUND_CHANNEL_CAPACITY,
        bullets_bytes_tx,
        bullets_latest_tx,
        connection_ids: Arc::new(ConnectionIds::default()),
    })
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to listen for shutdown signal");
        // Keep serving; without a signal handler there is nothing to wait for.
        std::future::pending::<()>().await;
    }
    tracing::info!("shutdown signal received");
}
