// Arena orchestration: spawns the world task and exposes its channels.

use crate::use_cases::arena::Arena;
use crate::use_cases::game::world_task;
use crate::use_cases::ports::Outbox;
use crate::use_cases::{BulletsUpdate, GameEvent};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Notify, broadcast, mpsc};

/// Shared configuration for spawning the arena world.
#[derive(Debug, Clone)]
pub struct ArenaSettings {
    /// Capacity for inbound connection events and commands.
    pub input_channel_capacity: usize,
    /// Capacity for broadcast projectile snapshots.
    pub bullets_broadcast_capacity: usize,
    /// Fixed tick interval for the projectile engine.
    pub tick_interval: Duration,
}

/// Errors returned when handing events to the arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArenaError {
    /// Input queue is full; the event was not accepted.
    Busy,
    /// World task has stopped.
    Closed,
}

impl fmt::Display for ArenaError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Busy => write!(f, "arena input queue is full"),
            Self::Closed => write!(f, "arena world is not running"),
        }
    }
}

impl std::error::Error for ArenaError {}

impl From<mpsc::error::TrySendError<GameEvent>> for ArenaError {
    fn from(err: mpsc::error::TrySendError<GameEvent>) -> Self {
        match err {
            mpsc::error::TrySendError::Full(_) => Self::Busy,
            mpsc::error::TrySendError::Closed(_) => Self::Closed,
        }
    }
}

/// Channels into and out of the running arena world.
#[derive(Clone)]
pub struct ArenaHandle {
    /// Sender for game events into the world task.
    input_tx: mpsc::Sender<GameEvent>,
    /// Broadcast sender for raw projectile snapshots.
    bullets_tx: broadcast::Sender<BulletsUpdate>,
    /// Stops the world task.
    shutdown: Arc<Notify>,
}

impl ArenaHandle {
    /// Spawns the authoritative world loop. Must be called inside a Tokio runtime.
    pub fn spawn(settings: &ArenaSettings, outbox: Arc<dyn Outbox>) -> Self {
        let (input_tx, input_rx) = mpsc::channel::<GameEvent>(settings.input_channel_capacity);
        let (bullets_tx, _bullets_rx) =
            broadcast::channel::<BulletsUpdate>(settings.bullets_broadcast_capacity);
        let shutdown = Arc::new(Notify::new());

        tokio::spawn(world_task(
            Arena::default(),
            input_rx,
            outbox,
            bullets_tx.clone(),
            settings.tick_interval,
            shutdown.clone(),
        ));

        Self {
            input_tx,
            bullets_tx,
            shutdown,
        }
    }

    /// Subscribes to per-tick projectile snapshots.
    pub fn subscribe_bullets(&self) -> broadcast::Receiver<BulletsUpdate> {
        self.bullets_tx.subscribe()
    }

    /// Waits for queue space. Used for lifecycle events that must not be lost.
    pub async fn send(&self, event: GameEvent) -> Result<(), ArenaError> {
        self.input_tx
            .send(event)
            .await
            .map_err(|_| ArenaError::Closed)
    }

    /// Enqueues without waiting. Used for client commands, which are shed under load.
    pub fn submit(&self, event: GameEvent) -> Result<(), ArenaError> {
        self.input_tx.try_send(event).map_err(ArenaError::from)
    }

    pub fn shutdown(&self) {
        // Stored as a permit if the world is busy mid-iteration.
        self.shutdown.notify_one();
    }
}
