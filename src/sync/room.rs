//! Per-room event loop.
//!
//! Each room runs one task that owns the room's [`Replica`]. Every incoming
//! event (client actions and timer firings alike) is serialized through a
//! single queue and applied one at a time, so the state machine never runs
//! two transitions concurrently on one replica. Applied client events fan
//! out to the other connections of the room; the latest snapshot is
//! published on a watch channel for presentation adapters.

use std::collections::{HashSet, VecDeque};

use thiserror::Error;
use tokio::sync::{broadcast, mpsc, oneshot, watch};
use tracing::{debug, trace};
use uuid::Uuid;

use crate::{
    dto::game::GameSnapshot,
    engine::{Effect, GameEvent, GamePhase, GameState, PhaseTimer, RejectedTransition},
    services::sse_events,
    state::SseHub,
    sync::replica::{EventEnvelope, Replica},
};

/// Fan-out capacity for peer event relay.
const RELAY_CAPACITY: usize = 64;
/// How many recent event ids are remembered for redelivery suppression.
const DEDUP_WINDOW: usize = 256;

/// Failure modes when handing an event to a room.
#[derive(Debug, Error)]
pub enum RoomError {
    /// The room task has stopped.
    #[error("room task is no longer running")]
    Closed,
    /// The event did not apply to the current phase; state is unchanged.
    #[error(transparent)]
    Rejected(#[from] RejectedTransition),
}

enum RoomCommand {
    Apply {
        envelope: EventEnvelope,
        reply: oneshot::Sender<Result<(), RoomError>>,
    },
}

/// Cheap handle to a running room task.
#[derive(Clone)]
pub struct RoomHandle {
    /// Room identifier.
    pub id: Uuid,
    /// Whether this is a single-player room (no peer relay).
    pub solo: bool,
    /// When the room was created.
    pub created_at: std::time::SystemTime,
    commands: mpsc::UnboundedSender<RoomCommand>,
    relay: broadcast::Sender<EventEnvelope>,
    snapshot: watch::Receiver<GameSnapshot>,
}

impl RoomHandle {
    /// Apply one event through the room queue, waiting for the verdict.
    pub async fn apply(&self, envelope: EventEnvelope) -> Result<(), RoomError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.commands
            .send(RoomCommand::Apply {
                envelope,
                reply: reply_tx,
            })
            .map_err(|_| RoomError::Closed)?;
        reply_rx.await.map_err(|_| RoomError::Closed)?
    }

    /// Subscribe to events applied by other participants of this room.
    pub fn subscribe_events(&self) -> broadcast::Receiver<EventEnvelope> {
        self.relay.subscribe()
    }

    /// Latest consistent snapshot of the room state.
    pub fn snapshot(&self) -> GameSnapshot {
        self.snapshot.borrow().clone()
    }

    /// Watch snapshot updates; one value per applied event.
    pub fn watch_snapshot(&self) -> watch::Receiver<GameSnapshot> {
        self.snapshot.clone()
    }
}

/// Sliding window of recently-applied event ids.
struct SeenEvents {
    order: VecDeque<Uuid>,
    set: HashSet<Uuid>,
    capacity: usize,
}

impl SeenEvents {
    fn new(capacity: usize) -> Self {
        Self {
            order: VecDeque::with_capacity(capacity),
            set: HashSet::with_capacity(capacity),
            capacity,
        }
    }

    /// Record an id; returns `false` when it was already seen.
    fn remember(&mut self, id: Uuid) -> bool {
        if !self.set.insert(id) {
            return false;
        }
        self.order.push_back(id);
        if self.order.len() > self.capacity
            && let Some(evicted) = self.order.pop_front()
        {
            self.set.remove(&evicted);
        }
        true
    }
}

/// Start the event loop for a room and hand back its handle.
pub fn spawn_room(id: Uuid, state: GameState, solo: bool, hub: SseHub) -> RoomHandle {
    let (command_tx, mut command_rx) = mpsc::unbounded_channel::<RoomCommand>();
    let (timer_tx, mut timer_rx) = mpsc::unbounded_channel::<GameEvent>();
    let (relay_tx, _) = broadcast::channel(RELAY_CAPACITY);
    let (snapshot_tx, snapshot_rx) = watch::channel(GameSnapshot::from(&state));

    let mut replica = if solo {
        Replica::solo(state)
    } else {
        Replica::connected(state, relay_tx.clone())
    };

    let handle = RoomHandle {
        id,
        solo,
        created_at: std::time::SystemTime::now(),
        commands: command_tx,
        relay: relay_tx,
        snapshot: snapshot_rx,
    };

    tokio::spawn(async move {
        let mut timer = PhaseTimer::new();
        let mut seen = SeenEvents::new(DEDUP_WINDOW);

        loop {
            tokio::select! {
                maybe_command = command_rx.recv() => {
                    let Some(RoomCommand::Apply { envelope, reply }) = maybe_command else {
                        break;
                    };

                    if !seen.remember(envelope.event_id) {
                        // At-least-once redelivery; already applied.
                        trace!(room = %id, event_id = %envelope.event_id, "dropping duplicate event");
                        let _ = reply.send(Ok(()));
                        continue;
                    }

                    let outcome = match replica.emit(envelope) {
                        Ok(effects) => {
                            run_effects(&mut timer, &timer_tx, effects);
                            publish_snapshot(&snapshot_tx, &hub, id, &replica);
                            Ok(())
                        }
                        Err(rejected) => {
                            debug!(room = %id, error = %rejected, "rejected transition");
                            Err(RoomError::Rejected(rejected))
                        }
                    };
                    let _ = reply.send(outcome);
                }
                Some(event) = timer_rx.recv() => {
                    // Timer firings are replica-local; peers run their own
                    // deadlines relative to their own phase entry.
                    match replica.on_receive(&event) {
                        Ok(effects) => {
                            run_effects(&mut timer, &timer_tx, effects);
                            publish_snapshot(&snapshot_tx, &hub, id, &replica);
                        }
                        Err(rejected) => {
                            trace!(room = %id, error = %rejected, "stale timer firing dropped");
                        }
                    }
                }
            }

            // Terminal phase: stop the task so finished rooms do not pile up
            // for the life of the process. Dropping the snapshot sender tells
            // the registry the room is gone.
            if replica.state().phase() == GamePhase::GameEnd {
                debug!(room = %id, "game over; stopping room loop");
                break;
            }
        }

        debug!(room = %id, "room loop stopped");
    });

    handle
}

fn run_effects(
    timer: &mut PhaseTimer,
    timer_tx: &mpsc::UnboundedSender<GameEvent>,
    effects: Vec<Effect>,
) {
    for effect in effects {
        match effect {
            Effect::StartTimer {
                phase,
                duration_ms,
                generation,
            } => timer.schedule(timer_tx.clone(), phase, duration_ms, generation),
            Effect::CancelTimer => timer.cancel(),
        }
    }
}

fn publish_snapshot(
    snapshot_tx: &watch::Sender<GameSnapshot>,
    hub: &SseHub,
    room_id: Uuid,
    replica: &Replica,
) {
    let snapshot = GameSnapshot::from(replica.state());
    sse_events::broadcast_room_snapshot(hub, room_id, &snapshot);
    snapshot_tx.send_replace(snapshot);
}
