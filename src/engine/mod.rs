//! Deterministic game core: board model, buzz arbitration, the state
//! machine, and phase timers. Nothing in here performs I/O; the engine is
//! driven entirely by events and is constructible with every external
//! collaborator stubbed.

pub mod board;
pub mod buzzer;
pub mod game;
pub mod state_machine;
pub mod timer;

pub use board::{Board, Category, Clue, ClueId, Round};
pub use buzzer::{BuzzOutcome, BuzzVerdict};
pub use game::{GameState, Player};
pub use state_machine::{
    Effect, EventKind, GameEvent, GamePhase, RejectReason, RejectedTransition, SYSTEM_USER,
};
pub use timer::{PhaseTimer, PhaseTimings, TimedPhase};
