//! The authoritative game aggregate.
//!
//! One [`GameState`] exists per room replica and is mutated exclusively by
//! the transition function in [`crate::engine::state_machine`]. Everything a
//! presentation adapter needs is reachable through the read accessors; no
//! other component writes to it.

use std::collections::HashSet;

use indexmap::IndexMap;

use crate::engine::{
    board::{Board, Clue, ClueId, Round},
    buzzer::BuzzOutcome,
    state_machine::GamePhase,
    timer::PhaseTimings,
};

/// A participant and their running score.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Player {
    /// Stable identity supplied by the session boundary.
    pub user_id: String,
    /// Display name chosen for the player.
    pub name: String,
    /// Current score; changes only through judged clues.
    pub score: i64,
}

/// Aggregated state for one game room replica.
#[derive(Debug, Clone, PartialEq)]
pub struct GameState {
    pub(crate) phase: GamePhase,
    pub(crate) players: IndexMap<String, Player>,
    pub(crate) host_id: Option<String>,
    pub(crate) board: Board,
    pub(crate) round: usize,
    pub(crate) resolved: HashSet<ClueId>,
    pub(crate) board_control: Option<String>,
    pub(crate) current_clue: Option<ClueId>,
    pub(crate) t0_ms: Option<u64>,
    pub(crate) window_budget_ms: u64,
    pub(crate) window_consumed_ms: u64,
    pub(crate) buzzes: IndexMap<String, BuzzOutcome>,
    pub(crate) winning_buzzer: Option<String>,
    pub(crate) pending_answer: Option<String>,
    pub(crate) wrong_answerers: HashSet<String>,
    pub(crate) timer_generation: u64,
    pub(crate) timings: PhaseTimings,
}

impl GameState {
    /// Build a fresh state in the lobby for the given board.
    pub fn new(board: Board, timings: PhaseTimings) -> Self {
        Self {
            phase: GamePhase::Lobby,
            players: IndexMap::new(),
            host_id: None,
            board,
            round: 0,
            resolved: HashSet::new(),
            board_control: None,
            current_clue: None,
            t0_ms: None,
            window_budget_ms: 0,
            window_consumed_ms: 0,
            buzzes: IndexMap::new(),
            winning_buzzer: None,
            pending_answer: None,
            wrong_answerers: HashSet::new(),
            timer_generation: 0,
            timings,
        }
    }

    /// Current phase.
    pub fn phase(&self) -> GamePhase {
        self.phase
    }

    /// Participants in join order, keyed by stable user id.
    pub fn players(&self) -> &IndexMap<String, Player> {
        &self.players
    }

    /// The authoritative judge, set when the first player joins.
    pub fn host_id(&self) -> Option<&str> {
        self.host_id.as_deref()
    }

    /// The immutable question set.
    pub fn board(&self) -> &Board {
        &self.board
    }

    /// Index of the round currently in play.
    pub fn round_index(&self) -> usize {
        self.round
    }

    /// The round currently in play, if the board has one at this index.
    pub fn current_round(&self) -> Option<&Round> {
        self.board.round(self.round)
    }

    /// The player holding control of the board.
    pub fn board_control(&self) -> Option<&str> {
        self.board_control.as_deref()
    }

    /// Address of the active clue.
    pub fn current_clue_id(&self) -> Option<ClueId> {
        self.current_clue
    }

    /// The active clue itself.
    pub fn current_clue(&self) -> Option<&Clue> {
        let id = self.current_clue?;
        self.current_round()?.clue(id)
    }

    /// Buzz outcomes recorded for the active clue, in observation order.
    pub fn buzzes(&self) -> &IndexMap<String, BuzzOutcome> {
        &self.buzzes
    }

    /// Winner of the buzz race for the active clue, if decided.
    pub fn winning_buzzer(&self) -> Option<&str> {
        self.winning_buzzer.as_deref()
    }

    /// Answer text submitted by the winning buzzer, awaiting judgment.
    pub fn pending_answer(&self) -> Option<&str> {
        self.pending_answer.as_deref()
    }

    /// Clues already resolved in the current round.
    pub fn resolved(&self) -> &HashSet<ClueId> {
        &self.resolved
    }

    /// Open timestamp of the current buzz window segment, if one opened.
    /// A second-chance re-open stamps a fresh value here.
    pub fn window_open_at_ms(&self) -> Option<u64> {
        self.t0_ms
    }

    /// Window budget already consumed by earlier segments of the active clue.
    pub fn window_consumed_ms(&self) -> u64 {
        self.window_consumed_ms
    }

    /// Generation counter used to reject stale timer firings.
    pub fn timer_generation(&self) -> u64 {
        self.timer_generation
    }

    /// Configured phase timings.
    pub fn timings(&self) -> PhaseTimings {
        self.timings
    }

    /// Buzz window budget for a clue, honoring its per-clue override.
    pub(crate) fn clue_budget_ms(&self, clue: &Clue) -> u64 {
        clue.timeout_ms.unwrap_or(self.timings.buzz_window_ms)
    }

    /// Whether every clue of the current round has been resolved.
    pub(crate) fn round_exhausted(&self) -> bool {
        match self.current_round() {
            Some(round) => round.clue_ids().all(|id| self.resolved.contains(&id)),
            None => true,
        }
    }
}
