use crate::domain::PlayerId;
use crate::interface_adapters::protocol::ClientMessage;
use crate::interface_adapters::state::AppState;
use crate::use_cases::{ArenaError, ArenaHandle, GameEvent, PlayerCommand};

use axum::{
    Error,
    extract::{
        State,
        ws::{CloseFrame, Message, Utf8Bytes, WebSocket, WebSocketUpgrade, close_code},
    },
    response::IntoResponse,
};
use futures::SinkExt;
use std::{
    sync::Arc,
    time::{Duration, Instant},
};
use tokio::sync::{broadcast, mpsc, watch};
use tracing::{Instrument, debug, info, info_span, warn};

#[derive(Debug)]
enum NetError {
    // Categorizes connection lifecycle failures so callers can decide policy.
    #[allow(dead_code)]
    Ws(axum::Error),
    ArenaClosed,
    BulletsClosed,
}

impl From<axum::Error> for NetError {
    fn from(e: axum::Error) -> Self {
        NetError::Ws(e)
    }
}

enum LoopControl {
    Continue,
    Disconnect,
}

const LOG_THROTTLE: Duration = Duration::from_secs(2);
const MAX_INVALID_JSON: u32 = 10;

pub async fn ws_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

async fn handle_socket(socket: WebSocket, state: Arc<AppState>) {
    // The connection id doubles as the player id for the lifetime of the socket.
    let conn_id = state.connection_ids.next_id();
    let span = info_span!("conn", conn_id);
    serve_connection(socket, state, conn_id)
        .instrument(span)
        .await
}

struct ConnCtx {
    player_id: PlayerId,
    arena: ArenaHandle,
    outbound_rx: mpsc::Receiver<Utf8Bytes>,
    bullets_bytes_rx: broadcast::Receiver<Utf8Bytes>,
    bullets_latest_rx: watch::Receiver<Utf8Bytes>,
    // Count lag recovery snapshots sent to this client.
    lag_recovery_count: u64,

    msgs_in: u64,
    msgs_out: u64,
    bytes_in: u64,
    bytes_out: u64,

    invalid_json: u32,
    dropped_commands: u64,

    logs: LogThrottles,

    close_frame: Option<CloseFrame>,
}

async fn serve_connection(mut socket: WebSocket, state: Arc<AppState>, player_id: PlayerId) {
    // Subscribe to snapshots before any await so the first ticks are not missed.
    let bullets_bytes_rx = state.bullets_bytes_tx.subscribe();
    let bullets_latest_rx = state.bullets_latest_tx.subscribe();

    // The queue must be routable before the arena hears about the player, otherwise the
    // targeted currentPlayers snapshot has nowhere to go.
    let (outbound_tx, outbound_rx) = mpsc::channel::<Utf8Bytes>(state.outbound_capacity);
    state.connections.register(player_id, outbound_tx);

    if let Err(e) = state.arena.send(GameEvent::Connect { player_id }).await {
        warn!(error = %e, "arena unavailable; refusing connection");
        state.connections.unregister(player_id);
        let _ = send_close_with_reason(&mut socket, close_code::AGAIN, "arena unavailable").await;
        return;
    }

    info!(player_id, "client connected");

    let mut ctx = ConnCtx {
        player_id,
        arena: state.arena.clone(),
        outbound_rx,
        bullets_bytes_rx,
        bullets_latest_rx,
        lag_recovery_count: 0,

        msgs_in: 0,
        msgs_out: 0,
        bytes_in: 0,
        bytes_out: 0,

        invalid_json: 0,
        dropped_commands: 0,

        logs: LogThrottles::new(),

        close_frame: None,
    };

    let result = run_client_loop(&mut socket, &mut ctx).await;

    // Stop routing to this socket before the arena forgets the player.
    state.connections.unregister(player_id);
    let cleanup = disconnect_cleanup(&ctx).await;

    if let Err(e) = result.and(cleanup) {
        warn!(error = ?e, "client loop exited with error");
    }
}

async fn send_close_with_reason(
    socket: &mut WebSocket,
    code: u16,
    reason: &'static str,
) -> Result<(), NetError> {
    socket
        .send(Message::Close(Some(CloseFrame {
            code,
            reason: reason.into(),
        })))
        .await
        .map_err(NetError::Ws)?;
    socket.close().await.map_err(NetError::Ws)
}

/// One throttle clock per log site.
struct LogThrottles {
    input_full: Instant,
    bullets_lag: Instant,
    lag_recovery: Instant,
    invalid_input: Instant,
}

impl LogThrottles {
    fn new() -> Self {
        // Backdated so the first occurrence at every site is logged.
        let now = Instant::now() - LOG_THROTTLE;
        Self {
            input_full: now,
            bullets_lag: now,
            lag_recovery: now,
            invalid_input: now,
        }
    }
}

fn should_log(last: &mut Instant) -> bool {
    if last.elapsed() >= LOG_THROTTLE {
        *last = Instant::now();
        true
    } else {
        false
    }
}

async fn run_client_loop(socket: &mut WebSocket, ctx: &mut ConnCtx) -> Result<(), NetError> {
    let player_id = ctx.player_id;
    let mut fatal: Option<NetError> = None;

    loop {
        let disconnect: bool = tokio::select! {
            // Incoming Message from Client
            incoming = socket.recv() => {
                match handle_incoming_ws(incoming, ctx) {
                    Ok(LoopControl::Continue) => false,
                    Ok(LoopControl::Disconnect) => true,
                    Err(e) => {
                        fatal = Some(e);
                        true
                    }
                }
            }

            // Discrete events routed to this connection by the world task.
            outbound = ctx.outbound_rx.recv() => {
                match outbound {
                    Some(bytes) => match forward_bytes(bytes, socket, ctx).await {
                        LoopControl::Continue => false,
                        LoopControl::Disconnect => true,
                    },
                    None => {
                        // Evicted from the connection table; this client fell too far behind.
                        warn!(player_id, "outbound queue overflowed; disconnecting");
                        ctx.close_frame = Some(CloseFrame {
                            code: close_code::AGAIN,
                            reason: "too slow".into(),
                        });
                        true
                    }
                }
            }

            // Per-tick projectile snapshot.
            bullets_msg = ctx.bullets_bytes_rx.recv() => {
                match bullets_msg {
                    Ok(bytes) => match forward_bytes(bytes, socket, ctx).await {
                        LoopControl::Continue => false,
                        LoopControl::Disconnect => true,
                    },
                    Err(broadcast::error::RecvError::Lagged(n)) => {
                        if should_log(&mut ctx.logs.bullets_lag) {
                            warn!(missed = n, "bullets updates lagged; sending latest snapshot");
                        }

                        // Snapshots are full state, so the latest one is a complete resync.
                        let latest = ctx.bullets_latest_rx.borrow().clone();
                        if latest.is_empty() {
                            false
                        } else {
                            let bytes_len = latest.len();
                            ctx.lag_recovery_count += 1;
                            let outcome = forward_bytes(latest, socket, ctx).await;

                            if should_log(&mut ctx.logs.lag_recovery) {
                                debug!(
                                    player_id,
                                    bytes = bytes_len,
                                    count = ctx.lag_recovery_count,
                                    "sent lag recovery snapshot"
                                );
                            }

                            match outcome {
                                LoopControl::Continue => false,
                                LoopControl::Disconnect => true,
                            }
                        }
                    }
                    Err(broadcast::error::RecvError::Closed) => {
                        fatal = Some(NetError::BulletsClosed);
                        true
                    }
                }
            }
        };

        if disconnect {
            if let Some(frame) = ctx.close_frame.take() {
                let _ = socket.send(Message::Close(Some(frame))).await;
            }
            if let Err(err) = socket.close().await.map_err(NetError::Ws) {
                debug!(error = ?err, "socket close error");
            }
            break;
        }
    }

    match fatal {
        Some(err) => Err(err),
        None => Ok(()),
    }
}

fn handle_incoming_ws(
    incoming: Option<Result<Message, Error>>,
    ctx: &mut ConnCtx,
) -> Result<LoopControl, NetError> {
    let player_id = ctx.player_id;
    match incoming {
        Some(Ok(msg)) => match msg {
            Message::Text(text) => {
                ctx.msgs_in += 1;
                ctx.bytes_in += text.len() as u64;

                match serde_json::from_str::<ClientMessage>(&text) {
                    Ok(msg) => match PlayerCommand::try_from(msg) {
                        Ok(command) => submit_command(ctx, command),
                        Err(reason) => {
                            if should_log(&mut ctx.logs.invalid_input) {
                                warn!(player_id, %reason, "invalid command values; dropping");
                            }
                            Ok(LoopControl::Continue)
                        }
                    },
                    Err(parse_err) => {
                        ctx.invalid_json += 1;
                        if should_log(&mut ctx.logs.invalid_input) {
                            warn!(
                                player_id,
                                bytes = text.len(),
                                error = %parse_err,
                                "failed to parse client message"
                            );
                        }

                        if ctx.invalid_json > MAX_INVALID_JSON {
                            ctx.close_frame = Some(CloseFrame {
                                code: close_code::POLICY,
                                reason: "too many invalid messages".into(),
                            });
                            return Ok(LoopControl::Disconnect);
                        }

                        Ok(LoopControl::Continue)
                    }
                }
            }
            Message::Binary(_) => {
                ctx.close_frame = Some(CloseFrame {
                    code: close_code::UNSUPPORTED,
                    reason: "binary messages not supported".into(),
                });
                Ok(LoopControl::Disconnect)
            }
            Message::Ping(_) | Message::Pong(_) => Ok(LoopControl::Continue),
            Message::Close(_) => Ok(LoopControl::Disconnect),
        },
        Some(Err(e)) => {
            warn!(player_id, error = %e, "websocket recv error");
            Ok(LoopControl::Disconnect)
        }
        None => {
            info!(player_id, "websocket closed");
            Ok(LoopControl::Disconnect)
        }
    }
}

fn submit_command(ctx: &mut ConnCtx, command: PlayerCommand) -> Result<LoopControl, NetError> {
    let player_id = ctx.player_id;
    match ctx.arena.submit(GameEvent::Command { player_id, command }) {
        Ok(()) => Ok(LoopControl::Continue),
        Err(ArenaError::Busy) => {
            ctx.dropped_commands += 1;
            if should_log(&mut ctx.logs.input_full) {
                warn!(player_id, "arena input channel full; dropping command");
            }
            Ok(LoopControl::Continue)
        }
        Err(ArenaError::Closed) => Err(NetError::ArenaClosed),
    }
}

async fn forward_bytes(bytes: Utf8Bytes, socket: &mut WebSocket, ctx: &mut ConnCtx) -> LoopControl {
    let bytes_len = bytes.len();
    match socket.send(Message::Text(bytes)).await.map_err(NetError::Ws) {
        Ok(()) => {
            ctx.msgs_out += 1;
            ctx.bytes_out += bytes_len as u64;
            LoopControl::Continue
        }
        Err(err) => {
            // Log unexpected send failures; disconnect will follow immediately.
            warn!(error = ?err, "failed to send message");
            LoopControl::Disconnect
        }
    }
}

async fn disconnect_cleanup(ctx: &ConnCtx) -> Result<(), NetError> {
    let player_id = ctx.player_id;

    debug!(
        player_id,
        msgs_in = ctx.msgs_in,
        msgs_out = ctx.msgs_out,
        bytes_in = ctx.bytes_in,
        bytes_out = ctx.bytes_out,
        invalid_json = ctx.invalid_json,
        dropped_commands = ctx.dropped_commands,
        lag_recovery_count = ctx.lag_recovery_count,
        "connection stats"
    );
    info!(player_id, "client disconnected");

    // Waits for queue space: a lost disconnect would leave a ghost player behind.
    ctx.arena
        .send(GameEvent::Disconnect { player_id })
        .await
        .map_err(|_| NetError::ArenaClosed)
}
