use super::arena::Arena;
use super::ports::Outbox;
use super::types::{BulletsUpdate, Dispatch, GameEvent};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::{Notify, broadcast, mpsc};
use tokio::time::MissedTickBehavior;
use tracing::{debug, info};

/// Single owner of the arena state.
///
/// Commands are applied in arrival order as they come in; the fixed-step interval drives the
/// projectile engine and publishes one `BulletsUpdate` per tick.
pub async fn world_task(
    mut arena: Arena,
    mut input_rx: mpsc::Receiver<GameEvent>,
    outbox: Arc<dyn Outbox>,
    bullets_tx: broadcast::Sender<BulletsUpdate>,
    tick_interval: Duration,
    shutdown: Arc<Notify>,
) {
    let mut interval = tokio::time::interval(tick_interval);
    // A stalled tick is not replayed in a burst.
    interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

    info!(tick_ms = tick_interval.as_millis() as u64, "arena world started");

    loop {
        tokio::select! {
            _ = shutdown.notified() => {
                break;
            }
            ev = input_rx.recv() => {
                let Some(ev) = ev else {
                    // Every sender is gone; nothing can reach the arena anymore.
                    break;
                };
                let dispatches = arena.handle(ev, Instant::now());
                deliver_all(outbox.as_ref(), dispatches);
            }
            _ = interval.tick() => {
                let (dispatches, update) = arena.tick();
                deliver_all(outbox.as_ref(), dispatches);

                // Err only means nobody is subscribed right now.
                let _ = bullets_tx.send(update);
            }
        }
    }

    info!(
        players = arena.players().len(),
        parties = arena.parties().len(),
        "arena world stopped"
    );
}

fn deliver_all(outbox: &dyn Outbox, dispatches: Vec<Dispatch>) {
    for dispatch in dispatches {
        debug!(
            recipients = dispatch.recipients.len(),
            event = ?dispatch.event,
            "dispatch"
        );
        outbox.deliver(dispatch);
    }
}
