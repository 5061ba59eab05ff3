//! Local-first event replication.
//!
//! A replica owns one [`GameState`] copy. Locally-originated events are
//! applied optimistically and then published to peers; peer events run
//! through the identical transition function, so replicas fed the same
//! sequence converge. Single-player replicas skip publishing entirely.

use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use uuid::Uuid;

use crate::engine::{Effect, GameEvent, GameState, RejectedTransition};

/// Wire envelope around a game event.
///
/// The id is assigned once at origination and lets receivers drop
/// redeliveries of the at-least-once broadcast channel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventEnvelope {
    /// Unique id for deduplication across redeliveries.
    pub event_id: Uuid,
    /// The replicated event itself.
    pub event: GameEvent,
}

impl EventEnvelope {
    /// Wrap an event with a fresh id.
    pub fn new(event: GameEvent) -> Self {
        Self {
            event_id: Uuid::new_v4(),
            event,
        }
    }
}

/// One participant's copy of the game, with optional peer publishing.
#[derive(Debug)]
pub struct Replica {
    state: GameState,
    outbound: Option<broadcast::Sender<EventEnvelope>>,
}

impl Replica {
    /// Replica for a single-player room: no peers, no publishing.
    pub fn solo(state: GameState) -> Self {
        Self {
            state,
            outbound: None,
        }
    }

    /// Replica publishing every locally-applied event to peers.
    pub fn connected(state: GameState, outbound: broadcast::Sender<EventEnvelope>) -> Self {
        Self {
            state,
            outbound: Some(outbound),
        }
    }

    /// Read access to the authoritative local state.
    pub fn state(&self) -> &GameState {
        &self.state
    }

    /// Apply a locally-originated event and, if it applied, publish it.
    ///
    /// Publishing is fire-and-forget; a peerless channel is not an error.
    /// Rejected events are never published.
    pub fn emit(&mut self, envelope: EventEnvelope) -> Result<Vec<Effect>, RejectedTransition> {
        let effects = self.state.apply(&envelope.event)?;
        if let Some(outbound) = &self.outbound {
            let _ = outbound.send(envelope);
        }
        Ok(effects)
    }

    /// Apply a peer-originated or engine-internal event locally.
    ///
    /// Same transition function as [`Replica::emit`]; never republished.
    pub fn on_receive(&mut self, event: &GameEvent) -> Result<Vec<Effect>, RejectedTransition> {
        self.state.apply(event)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::{Board, Category, Clue, EventKind, GamePhase, PhaseTimings, Round};

    fn board() -> Board {
        Board {
            title: "b".into(),
            rounds: vec![Round {
                name: "r".into(),
                categories: vec![Category {
                    name: "c".into(),
                    clues: vec![Clue {
                        text: "t".into(),
                        answer: "a".into(),
                        value: 100,
                        timeout_ms: None,
                    }],
                }],
            }],
        }
    }

    fn state() -> GameState {
        GameState::new(board(), PhaseTimings::default())
    }

    #[test]
    fn solo_emit_applies_without_publishing() {
        let mut replica = Replica::solo(state());
        let envelope = EventEnvelope::new(GameEvent::new(
            "x",
            0,
            EventKind::Join { name: "X".into() },
        ));
        replica.emit(envelope).expect("join should apply");
        assert_eq!(replica.state().players().len(), 1);
    }

    #[test]
    fn emitted_events_reach_peers_and_converge() {
        let (tx, mut rx) = broadcast::channel(16);
        let mut local = Replica::connected(state(), tx);
        let mut peer = Replica::solo(state());

        let events = vec![
            GameEvent::new("x", 0, EventKind::Join { name: "X".into() }),
            GameEvent::new("y", 0, EventKind::Join { name: "Y".into() }),
            GameEvent::new("x", 1, EventKind::StartGame),
        ];
        for event in events {
            local.emit(EventEnvelope::new(event)).expect("apply");
        }

        while let Ok(envelope) = rx.try_recv() {
            peer.on_receive(&envelope.event).expect("apply");
        }

        assert_eq!(local.state(), peer.state());
        assert_eq!(peer.state().phase(), GamePhase::ClueSelect);
    }

    #[test]
    fn rejected_events_are_not_published() {
        let (tx, mut rx) = broadcast::channel(16);
        let mut local = Replica::connected(state(), tx);

        // Buzzing in the lobby cannot apply.
        let envelope = EventEnvelope::new(GameEvent::new("x", 0, EventKind::Buzz));
        assert!(local.emit(envelope).is_err());
        assert!(rx.try_recv().is_err());
    }
}
