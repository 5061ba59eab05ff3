//! The game state machine.
//!
//! All mutation of [`GameState`] flows through [`GameState::apply`]: local
//! user actions, peer-replicated events, and timer firings are the same
//! event type and take the same code path, which is what makes replicas
//! converge. An event that does not apply to the current phase is rejected
//! without touching the state; rejection is a diagnostic, not a failure.

use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::engine::{
    board::ClueId,
    buzzer::{self, BuzzVerdict},
    game::{GameState, Player},
    timer::TimedPhase,
};

/// Originator id stamped on engine-internal events such as timer firings.
pub const SYSTEM_USER: &str = "@system";

/// Milliseconds since the Unix epoch, used as the event origination stamp.
pub fn now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}

/// Phases a game moves through. Within one clue the progression is
/// monotonic, except that an incorrect judgment may re-open the buzz window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GamePhase {
    /// Waiting for players to join; the game has not started.
    Lobby,
    /// Transient round banner; exited immediately on entry.
    RoundIntro,
    /// The board-control holder picks the next clue.
    ClueSelect,
    /// Clue text is shown; buzzing is not yet allowed.
    ClueRevealed,
    /// The buzz race is on.
    BuzzWindowOpen,
    /// The winning buzzer is composing an answer.
    Answering,
    /// The host decides whether the submitted answer is correct.
    Judging,
    /// Answer revealed; waiting to move on.
    ClueResolved,
    /// Every clue of the round has been resolved.
    RoundEnd,
    /// Terminal state.
    GameEnd,
}

/// The payload of a replicated game event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum EventKind {
    /// A participant enters the lobby.
    Join {
        /// Display name supplied by the identity boundary.
        name: String,
    },
    /// The host starts the game.
    StartGame,
    /// The board-control holder picks a clue.
    SelectClue {
        /// Address of the picked clue within the current round.
        clue: ClueId,
    },
    /// A buzz attempt; validity is judged against the event timestamp.
    Buzz,
    /// The winning buzzer submits an answer for judgment.
    SubmitAnswer {
        /// Free-form answer text.
        text: String,
    },
    /// The host rules on the pending answer.
    Judge {
        /// Whether the answer was accepted.
        correct: bool,
    },
    /// Host override advancing past the current phase.
    AdvancePhase,
    /// A phase deadline elapsed. Never replicated; each replica runs its own
    /// timers relative to its local phase entry.
    TimerFired {
        /// Which deadline fired.
        phase: TimedPhase,
        /// Generation the timer was armed with; stale firings are rejected.
        generation: u64,
    },
}

/// An immutable record of an intended state change, the unit of replication.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameEvent {
    /// Originating participant, or [`SYSTEM_USER`] for timer events.
    pub user_id: String,
    /// Wall-clock stamp assigned at the point of local origination.
    pub wall_ts_ms: u64,
    /// What the event does.
    pub kind: EventKind,
}

impl GameEvent {
    /// Build an event with an explicit timestamp.
    pub fn new(user_id: impl Into<String>, wall_ts_ms: u64, kind: EventKind) -> Self {
        Self {
            user_id: user_id.into(),
            wall_ts_ms,
            kind,
        }
    }

    /// Build an event stamped with the current wall clock.
    pub fn now(user_id: impl Into<String>, kind: EventKind) -> Self {
        Self::new(user_id, now_ms(), kind)
    }

    /// Build a timer firing for the given deadline generation.
    pub fn timer_fired(phase: TimedPhase, generation: u64) -> Self {
        Self::now(SYSTEM_USER, EventKind::TimerFired { phase, generation })
    }
}

/// Side effects requested by a transition, executed by the room loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Effect {
    /// Arm the phase timer; supersedes any armed deadline.
    StartTimer {
        /// Which deadline to arm.
        phase: TimedPhase,
        /// How long until it fires.
        duration_ms: u64,
        /// Generation the firing must carry to be accepted.
        generation: u64,
    },
    /// Disarm the phase timer.
    CancelTimer,
}

/// Why an event was rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum RejectReason {
    /// The event does not apply to the current phase.
    #[error("event does not apply to the current phase")]
    WrongPhase,
    /// Only the host may do this.
    #[error("sender is not the host")]
    NotHost,
    /// Only the board-control holder may pick a clue.
    #[error("sender does not hold control of the board")]
    NotBoardControl,
    /// Only the winning buzzer may submit an answer.
    #[error("sender is not the winning buzzer")]
    NotWinningBuzzer,
    /// The sender is not a participant of this game.
    #[error("sender is not a player in this game")]
    UnknownPlayer,
    /// The clue address does not exist in the current round.
    #[error("no such clue in the current round")]
    UnknownClue,
    /// The clue was already played.
    #[error("clue is already resolved")]
    ClueAlreadyResolved,
    /// The participant already joined.
    #[error("player already joined")]
    AlreadyJoined,
    /// The player already has a buzz outcome for this clue.
    #[error("player already has a buzz outcome for this clue")]
    AlreadyBuzzed,
    /// A timer fired for a phase instance that has already exited.
    #[error("timer firing is stale")]
    StaleTimer,
}

/// Error returned when an event cannot be applied. The state is untouched.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("rejected {kind:?} from `{user_id}` while in {phase:?}: {reason}")]
pub struct RejectedTransition {
    /// Phase the machine was in when the event arrived.
    pub phase: GamePhase,
    /// Originator of the rejected event.
    pub user_id: String,
    /// The rejected payload.
    pub kind: EventKind,
    /// Why it was rejected.
    pub reason: RejectReason,
}

impl GameState {
    /// Apply one event, returning the effects the caller must execute.
    ///
    /// This is the single state-transition function: local and replicated
    /// events go through the same code so replicas fed the same sequence
    /// reach the same state.
    pub fn apply(&mut self, event: &GameEvent) -> Result<Vec<Effect>, RejectedTransition> {
        match &event.kind {
            EventKind::Join { name } => self.apply_join(event, name),
            EventKind::StartGame => self.apply_start(event),
            EventKind::SelectClue { clue } => self.apply_select_clue(event, *clue),
            EventKind::Buzz => self.apply_buzz(event),
            EventKind::SubmitAnswer { text } => self.apply_submit_answer(event, text),
            EventKind::Judge { correct } => self.apply_judge(event, *correct),
            EventKind::AdvancePhase => self.apply_advance(event),
            EventKind::TimerFired { phase, generation } => {
                self.apply_timer(event, *phase, *generation)
            }
        }
    }

    fn reject(&self, event: &GameEvent, reason: RejectReason) -> RejectedTransition {
        RejectedTransition {
            phase: self.phase,
            user_id: event.user_id.clone(),
            kind: event.kind.clone(),
            reason,
        }
    }

    fn apply_join(
        &mut self,
        event: &GameEvent,
        name: &str,
    ) -> Result<Vec<Effect>, RejectedTransition> {
        if self.phase != GamePhase::Lobby {
            return Err(self.reject(event, RejectReason::WrongPhase));
        }
        if self.players.contains_key(&event.user_id) {
            return Err(self.reject(event, RejectReason::AlreadyJoined));
        }

        self.players.insert(
            event.user_id.clone(),
            Player {
                user_id: event.user_id.clone(),
                name: name.to_string(),
                score: 0,
            },
        );
        // First joiner judges and starts the game; in a solo room that is
        // the sole player, which is exactly self-judged mode.
        if self.host_id.is_none() {
            self.host_id = Some(event.user_id.clone());
        }
        Ok(Vec::new())
    }

    fn apply_start(&mut self, event: &GameEvent) -> Result<Vec<Effect>, RejectedTransition> {
        if self.phase != GamePhase::Lobby {
            return Err(self.reject(event, RejectReason::WrongPhase));
        }
        if self.host_id.as_deref() != Some(event.user_id.as_str()) {
            return Err(self.reject(event, RejectReason::NotHost));
        }

        self.round = 0;
        self.enter_round();
        Ok(Vec::new())
    }

    /// Pass through `RoundIntro` into `ClueSelect` of the next playable
    /// round, or straight to `GameEnd` when none remains.
    fn enter_round(&mut self) {
        self.phase = GamePhase::RoundIntro;
        loop {
            match self.current_round() {
                None => {
                    self.phase = GamePhase::GameEnd;
                    return;
                }
                // A round with no clues would leave `ClueSelect` with
                // nothing to pick and no event able to exit the phase.
                Some(round) if round.clue_count() == 0 => self.round += 1,
                Some(_) => break,
            }
        }

        self.resolved.clear();
        if self.board_control.is_none() {
            self.board_control = self.players.keys().next().cloned();
        }
        self.phase = GamePhase::ClueSelect;
    }

    fn apply_select_clue(
        &mut self,
        event: &GameEvent,
        clue_id: ClueId,
    ) -> Result<Vec<Effect>, RejectedTransition> {
        if self.phase != GamePhase::ClueSelect {
            return Err(self.reject(event, RejectReason::WrongPhase));
        }
        if self.board_control.as_deref() != Some(event.user_id.as_str()) {
            return Err(self.reject(event, RejectReason::NotBoardControl));
        }
        let Some(clue) = self.current_round().and_then(|round| round.clue(clue_id)) else {
            return Err(self.reject(event, RejectReason::UnknownClue));
        };
        if self.resolved.contains(&clue_id) {
            return Err(self.reject(event, RejectReason::ClueAlreadyResolved));
        }

        self.window_budget_ms = self.clue_budget_ms(clue);
        self.window_consumed_ms = 0;
        self.current_clue = Some(clue_id);
        self.t0_ms = None;
        self.buzzes.clear();
        self.winning_buzzer = None;
        self.pending_answer = None;
        self.wrong_answerers.clear();
        self.phase = GamePhase::ClueRevealed;
        self.timer_generation += 1;
        Ok(vec![Effect::StartTimer {
            phase: TimedPhase::RevealDelay,
            duration_ms: self.timings.reveal_delay_ms,
            generation: self.timer_generation,
        }])
    }

    fn apply_buzz(&mut self, event: &GameEvent) -> Result<Vec<Effect>, RejectedTransition> {
        if !self.players.contains_key(&event.user_id) {
            return Err(self.reject(event, RejectReason::UnknownPlayer));
        }
        match self.phase {
            GamePhase::BuzzWindowOpen => {}
            // Buzzes arriving after the race is won are still recorded so
            // the player stays eligible for a second-chance window.
            GamePhase::Answering => {}
            _ => return Err(self.reject(event, RejectReason::WrongPhase)),
        }
        let Some(t0) = self.t0_ms else {
            return Err(self.reject(event, RejectReason::WrongPhase));
        };

        let verdict = buzzer::register_buzz(
            &mut self.buzzes,
            self.winning_buzzer.as_deref(),
            &event.user_id,
            event.wall_ts_ms,
            t0,
            self.window_consumed_ms,
            self.window_budget_ms,
        );

        match verdict {
            BuzzVerdict::Won { .. } if self.phase == GamePhase::BuzzWindowOpen => {
                self.winning_buzzer = Some(event.user_id.clone());
                self.phase = GamePhase::Answering;
                self.timer_generation += 1;
                Ok(vec![Effect::StartTimer {
                    phase: TimedPhase::AnswerWindow,
                    duration_ms: self.timings.answer_window_ms,
                    generation: self.timer_generation,
                }])
            }
            BuzzVerdict::Won { .. }
            | BuzzVerdict::Recorded { .. }
            | BuzzVerdict::Disqualified
            | BuzzVerdict::TooLate => Ok(Vec::new()),
            BuzzVerdict::Ignored => Err(self.reject(event, RejectReason::AlreadyBuzzed)),
        }
    }

    fn apply_submit_answer(
        &mut self,
        event: &GameEvent,
        text: &str,
    ) -> Result<Vec<Effect>, RejectedTransition> {
        if self.phase != GamePhase::Answering {
            return Err(self.reject(event, RejectReason::WrongPhase));
        }
        if self.winning_buzzer.as_deref() != Some(event.user_id.as_str()) {
            return Err(self.reject(event, RejectReason::NotWinningBuzzer));
        }

        self.pending_answer = Some(text.to_string());
        self.phase = GamePhase::Judging;
        self.timer_generation += 1;
        Ok(vec![Effect::CancelTimer])
    }

    fn apply_judge(
        &mut self,
        event: &GameEvent,
        correct: bool,
    ) -> Result<Vec<Effect>, RejectedTransition> {
        if self.phase != GamePhase::Judging {
            return Err(self.reject(event, RejectReason::WrongPhase));
        }
        if self.host_id.as_deref() != Some(event.user_id.as_str()) {
            return Err(self.reject(event, RejectReason::NotHost));
        }

        if correct {
            let value = self.current_clue_value();
            if let Some(answerer) = self.winning_buzzer.clone() {
                if let Some(player) = self.players.get_mut(&answerer) {
                    player.score += value;
                }
                self.board_control = Some(answerer);
            }
            self.resolve_clue();
            Ok(Vec::new())
        } else {
            Ok(self.judge_incorrect(event.wall_ts_ms))
        }
    }

    /// Deduct the clue value from the answerer, then either hand the clue to
    /// the next eligible buzzer, re-open the window for fresh contenders on
    /// the remaining budget, or resolve with no winner. `now_ms` stamps the
    /// re-opened window segment.
    fn judge_incorrect(&mut self, now_ms: u64) -> Vec<Effect> {
        let value = self.current_clue_value();
        let Some(answerer) = self.winning_buzzer.take() else {
            self.resolve_clue();
            return Vec::new();
        };

        if let Some(player) = self.players.get_mut(&answerer) {
            player.score -= value;
        }
        self.wrong_answerers.insert(answerer.clone());
        self.pending_answer = None;

        if let Some((next_winner, _)) =
            buzzer::next_recorded_winner(&self.buzzes, &self.wrong_answerers)
        {
            self.winning_buzzer = Some(next_winner);
            self.phase = GamePhase::Answering;
            self.timer_generation += 1;
            return vec![Effect::StartTimer {
                phase: TimedPhase::AnswerWindow,
                duration_ms: self.timings.answer_window_ms,
                generation: self.timer_generation,
            }];
        }

        let consumed = self
            .buzzes
            .get(&answerer)
            .and_then(|outcome| outcome.duration_ms())
            .unwrap_or(self.window_budget_ms);
        let remaining = self.window_budget_ms.saturating_sub(consumed);
        let contenders =
            buzzer::has_fresh_contenders(&self.buzzes, self.players.keys().map(String::as_str));

        if remaining > 0 && contenders {
            // The segment opens now; durations recorded inside it include the
            // consumed time, so the clue never exceeds its original budget
            // and all recorded durations stay comparable.
            self.t0_ms = Some(now_ms);
            self.window_consumed_ms = consumed;
            self.phase = GamePhase::BuzzWindowOpen;
            self.timer_generation += 1;
            return vec![Effect::StartTimer {
                phase: TimedPhase::BuzzWindow,
                duration_ms: remaining,
                generation: self.timer_generation,
            }];
        }

        self.resolve_clue();
        Vec::new()
    }

    fn apply_advance(&mut self, event: &GameEvent) -> Result<Vec<Effect>, RejectedTransition> {
        if self.host_id.as_deref() != Some(event.user_id.as_str()) {
            return Err(self.reject(event, RejectReason::NotHost));
        }

        match self.phase {
            GamePhase::ClueRevealed
            | GamePhase::BuzzWindowOpen
            | GamePhase::Answering
            | GamePhase::Judging => {
                // Host skip: resolve without scoring.
                self.winning_buzzer = None;
                self.pending_answer = None;
                self.resolve_clue();
                self.timer_generation += 1;
                Ok(vec![Effect::CancelTimer])
            }
            GamePhase::ClueResolved => {
                self.clear_clue_state();
                if self.round_exhausted() {
                    self.phase = GamePhase::RoundEnd;
                } else {
                    self.phase = GamePhase::ClueSelect;
                }
                Ok(Vec::new())
            }
            GamePhase::RoundEnd => {
                self.round += 1;
                self.enter_round();
                Ok(Vec::new())
            }
            _ => Err(self.reject(event, RejectReason::WrongPhase)),
        }
    }

    fn apply_timer(
        &mut self,
        event: &GameEvent,
        timed_phase: TimedPhase,
        generation: u64,
    ) -> Result<Vec<Effect>, RejectedTransition> {
        if generation != self.timer_generation {
            return Err(self.reject(event, RejectReason::StaleTimer));
        }

        match (timed_phase, self.phase) {
            (TimedPhase::RevealDelay, GamePhase::ClueRevealed) => {
                self.t0_ms = Some(event.wall_ts_ms);
                self.phase = GamePhase::BuzzWindowOpen;
                self.timer_generation += 1;
                Ok(vec![Effect::StartTimer {
                    phase: TimedPhase::BuzzWindow,
                    duration_ms: self.window_budget_ms,
                    generation: self.timer_generation,
                }])
            }
            (TimedPhase::BuzzWindow, GamePhase::BuzzWindowOpen) => {
                buzzer::close_window(&mut self.buzzes, self.players.keys().map(String::as_str));
                self.timer_generation += 1;
                self.resolve_clue();
                Ok(Vec::new())
            }
            (TimedPhase::AnswerWindow, GamePhase::Answering) => {
                // No answer in time counts as an incorrect judgment.
                self.timer_generation += 1;
                Ok(self.judge_incorrect(event.wall_ts_ms))
            }
            _ => Err(self.reject(event, RejectReason::StaleTimer)),
        }
    }

    /// Mark the active clue played and show the answer.
    fn resolve_clue(&mut self) {
        if let Some(id) = self.current_clue {
            self.resolved.insert(id);
        }
        self.phase = GamePhase::ClueResolved;
    }

    fn clear_clue_state(&mut self) {
        self.current_clue = None;
        self.t0_ms = None;
        self.window_budget_ms = 0;
        self.window_consumed_ms = 0;
        self.buzzes.clear();
        self.winning_buzzer = None;
        self.pending_answer = None;
        self.wrong_answerers.clear();
    }

    fn current_clue_value(&self) -> i64 {
        self.current_clue().map(|clue| clue.value).unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::{
        board::{Board, Category, Clue, Round},
        buzzer::BuzzOutcome,
        game::GameState,
        timer::PhaseTimings,
    };

    fn board() -> Board {
        let clues = |values: &[i64]| {
            values
                .iter()
                .map(|&value| Clue {
                    text: format!("clue for {value}"),
                    answer: format!("answer for {value}"),
                    value,
                    timeout_ms: None,
                })
                .collect()
        };
        Board {
            title: "test board".into(),
            rounds: vec![Round {
                name: "round one".into(),
                categories: vec![
                    Category {
                        name: "history".into(),
                        clues: clues(&[100, 200]),
                    },
                    Category {
                        name: "science".into(),
                        clues: clues(&[100, 200]),
                    },
                ],
            }],
        }
    }

    fn timings() -> PhaseTimings {
        PhaseTimings {
            reveal_delay_ms: 500,
            buzz_window_ms: 5_000,
            answer_window_ms: 15_000,
        }
    }

    fn apply(state: &mut GameState, event: GameEvent) -> Vec<Effect> {
        state.apply(&event).expect("event should apply")
    }

    fn join(state: &mut GameState, user: &str) {
        apply(
            state,
            GameEvent::new(user, 0, EventKind::Join { name: user.to_uppercase() }),
        );
    }

    /// Two players joined, game started, clue (0,1) worth 200 revealed, buzz
    /// window opened at t0 = 10_000 with a 5_000 ms budget.
    fn open_window() -> GameState {
        let mut state = GameState::new(board(), timings());
        join(&mut state, "x");
        join(&mut state, "y");
        apply(&mut state, GameEvent::new("x", 1, EventKind::StartGame));
        let effects = apply(
            &mut state,
            GameEvent::new(
                "x",
                2,
                EventKind::SelectClue { clue: ClueId { category: 0, row: 1 } },
            ),
        );
        let generation = match effects[..] {
            [Effect::StartTimer { phase: TimedPhase::RevealDelay, generation, .. }] => generation,
            ref other => panic!("expected reveal timer, got {other:?}"),
        };
        apply(
            &mut state,
            GameEvent::new(
                SYSTEM_USER,
                10_000,
                EventKind::TimerFired { phase: TimedPhase::RevealDelay, generation },
            ),
        );
        assert_eq!(state.phase(), GamePhase::BuzzWindowOpen);
        assert_eq!(state.window_open_at_ms(), Some(10_000));
        state
    }

    #[test]
    fn initial_state_is_lobby() {
        let state = GameState::new(board(), timings());
        assert_eq!(state.phase(), GamePhase::Lobby);
        assert!(state.players().is_empty());
    }

    #[test]
    fn first_joiner_becomes_host_and_gets_board_control() {
        let mut state = GameState::new(board(), timings());
        join(&mut state, "x");
        join(&mut state, "y");
        assert_eq!(state.host_id(), Some("x"));

        apply(&mut state, GameEvent::new("x", 1, EventKind::StartGame));
        assert_eq!(state.phase(), GamePhase::ClueSelect);
        assert_eq!(state.board_control(), Some("x"));
    }

    #[test]
    fn start_from_non_host_is_rejected() {
        let mut state = GameState::new(board(), timings());
        join(&mut state, "x");
        join(&mut state, "y");
        let err = state
            .apply(&GameEvent::new("y", 1, EventKind::StartGame))
            .unwrap_err();
        assert_eq!(err.reason, RejectReason::NotHost);
        assert_eq!(state.phase(), GamePhase::Lobby);
    }

    #[test]
    fn join_after_start_is_rejected() {
        let mut state = GameState::new(board(), timings());
        join(&mut state, "x");
        apply(&mut state, GameEvent::new("x", 1, EventKind::StartGame));
        let err = state
            .apply(&GameEvent::new("z", 2, EventKind::Join { name: "Z".into() }))
            .unwrap_err();
        assert_eq!(err.reason, RejectReason::WrongPhase);
        assert_eq!(state.players().len(), 1);
    }

    #[test]
    fn clue_selection_requires_board_control() {
        let mut state = GameState::new(board(), timings());
        join(&mut state, "x");
        join(&mut state, "y");
        apply(&mut state, GameEvent::new("x", 1, EventKind::StartGame));

        let err = state
            .apply(&GameEvent::new(
                "y",
                2,
                EventKind::SelectClue { clue: ClueId { category: 0, row: 0 } },
            ))
            .unwrap_err();
        assert_eq!(err.reason, RejectReason::NotBoardControl);
        assert_eq!(state.phase(), GamePhase::ClueSelect);
    }

    #[test]
    fn buzz_race_records_winner_and_later_buzzes() {
        // Scenario A: X buzzes at 300 ms, Y at 450 ms, window 5000 ms.
        let mut state = open_window();

        let effects = apply(&mut state, GameEvent::new("x", 10_300, EventKind::Buzz));
        assert_eq!(state.phase(), GamePhase::Answering);
        assert_eq!(state.winning_buzzer(), Some("x"));
        assert!(matches!(
            effects[..],
            [Effect::StartTimer { phase: TimedPhase::AnswerWindow, .. }]
        ));

        // Y's buzz lands after the race is decided but is still recorded.
        apply(&mut state, GameEvent::new("y", 10_450, EventKind::Buzz));
        assert_eq!(state.winning_buzzer(), Some("x"));
        assert_eq!(state.buzzes().get("x"), Some(&BuzzOutcome::Duration(300)));
        assert_eq!(state.buzzes().get("y"), Some(&BuzzOutcome::Duration(450)));
    }

    #[test]
    fn wrong_answer_hands_the_clue_to_the_next_buzzer() {
        // Scenario B: X wrong, Y answers correctly; X -200, Y +200.
        let mut state = open_window();
        apply(&mut state, GameEvent::new("x", 10_300, EventKind::Buzz));
        apply(&mut state, GameEvent::new("y", 10_450, EventKind::Buzz));
        apply(
            &mut state,
            GameEvent::new("x", 11_000, EventKind::SubmitAnswer { text: "wrong".into() }),
        );

        let effects = apply(&mut state, GameEvent::new("x", 11_500, EventKind::Judge { correct: false }));
        assert_eq!(state.phase(), GamePhase::Answering);
        assert_eq!(state.winning_buzzer(), Some("y"));
        assert!(matches!(
            effects[..],
            [Effect::StartTimer { phase: TimedPhase::AnswerWindow, .. }]
        ));
        // X's record survives the wrong answer untouched.
        assert_eq!(state.buzzes().get("x"), Some(&BuzzOutcome::Duration(300)));

        apply(
            &mut state,
            GameEvent::new("y", 12_000, EventKind::SubmitAnswer { text: "right".into() }),
        );
        apply(&mut state, GameEvent::new("x", 12_500, EventKind::Judge { correct: true }));

        assert_eq!(state.phase(), GamePhase::ClueResolved);
        assert_eq!(state.players()["x"].score, -200);
        assert_eq!(state.players()["y"].score, 200);
        assert_eq!(state.board_control(), Some("y"));
    }

    #[test]
    fn empty_window_times_everyone_out_without_scoring() {
        // Scenario C: no buzzes arrive before the window closes.
        let mut state = open_window();
        let generation = state.timer_generation();
        apply(
            &mut state,
            GameEvent::new(
                SYSTEM_USER,
                15_000,
                EventKind::TimerFired { phase: TimedPhase::BuzzWindow, generation },
            ),
        );

        assert_eq!(state.phase(), GamePhase::ClueResolved);
        assert_eq!(state.buzzes().get("x"), Some(&BuzzOutcome::TimedOut));
        assert_eq!(state.buzzes().get("y"), Some(&BuzzOutcome::TimedOut));
        assert_eq!(state.players()["x"].score, 0);
        assert_eq!(state.players()["y"].score, 0);
        assert_eq!(state.board_control(), Some("x"));
        assert!(state.winning_buzzer().is_none());
    }

    #[test]
    fn pre_reveal_buzz_disqualifies_for_the_whole_clue() {
        // Scenario D: buzz at t0 - 10 ms, then a legitimate retry.
        let mut state = open_window();
        apply(&mut state, GameEvent::new("x", 9_990, EventKind::Buzz));
        assert_eq!(state.buzzes().get("x"), Some(&BuzzOutcome::CannotBuzz));
        assert_eq!(state.phase(), GamePhase::BuzzWindowOpen);

        let err = state
            .apply(&GameEvent::new("x", 10_200, EventKind::Buzz))
            .unwrap_err();
        assert_eq!(err.reason, RejectReason::AlreadyBuzzed);
        assert_eq!(state.buzzes().get("x"), Some(&BuzzOutcome::CannotBuzz));
        assert!(state.winning_buzzer().is_none());
    }

    #[test]
    fn judgment_changes_exactly_one_score() {
        let mut state = open_window();
        apply(&mut state, GameEvent::new("y", 10_200, EventKind::Buzz));
        apply(
            &mut state,
            GameEvent::new("y", 10_900, EventKind::SubmitAnswer { text: "a".into() }),
        );
        apply(&mut state, GameEvent::new("x", 11_000, EventKind::Judge { correct: true }));

        assert_eq!(state.players()["y"].score, 200);
        assert_eq!(state.players()["x"].score, 0);
    }

    #[test]
    fn answer_timeout_counts_as_incorrect() {
        let mut state = open_window();
        apply(&mut state, GameEvent::new("x", 10_300, EventKind::Buzz));
        let generation = state.timer_generation();
        apply(
            &mut state,
            GameEvent::new(
                SYSTEM_USER,
                25_300,
                EventKind::TimerFired { phase: TimedPhase::AnswerWindow, generation },
            ),
        );

        assert_eq!(state.players()["x"].score, -200);
        // Y never buzzed, so the window re-opens on the remaining budget,
        // stamped at the moment of the timeout.
        assert_eq!(state.phase(), GamePhase::BuzzWindowOpen);
        assert_eq!(state.window_open_at_ms(), Some(25_300));
        assert_eq!(state.window_consumed_ms(), 300);
    }

    #[test]
    fn second_chance_buzz_wins_on_the_remaining_budget() {
        let mut state = open_window();
        apply(&mut state, GameEvent::new("x", 10_300, EventKind::Buzz));
        apply(
            &mut state,
            GameEvent::new("x", 11_000, EventKind::SubmitAnswer { text: "wrong".into() }),
        );
        // The judgment lands long after the original window would have
        // elapsed; the re-opened segment must still be winnable.
        apply(&mut state, GameEvent::new("x", 24_000, EventKind::Judge { correct: false }));
        assert_eq!(state.phase(), GamePhase::BuzzWindowOpen);
        assert_eq!(state.window_open_at_ms(), Some(24_000));

        let effects = apply(&mut state, GameEvent::new("y", 24_200, EventKind::Buzz));
        assert_eq!(state.phase(), GamePhase::Answering);
        assert_eq!(state.winning_buzzer(), Some("y"));
        // 300 ms consumed by X plus 200 ms inside the re-opened segment.
        assert_eq!(state.buzzes().get("y"), Some(&BuzzOutcome::Duration(500)));
        assert!(matches!(
            effects[..],
            [Effect::StartTimer { phase: TimedPhase::AnswerWindow, .. }]
        ));
    }

    #[test]
    fn second_chance_window_closes_when_everyone_is_exhausted() {
        let mut state = open_window();
        apply(&mut state, GameEvent::new("x", 10_300, EventKind::Buzz));
        apply(
            &mut state,
            GameEvent::new("x", 10_900, EventKind::SubmitAnswer { text: "a".into() }),
        );
        // X wrong, Y has no recorded buzz: window re-opens for Y alone.
        apply(&mut state, GameEvent::new("x", 11_000, EventKind::Judge { correct: false }));
        assert_eq!(state.phase(), GamePhase::BuzzWindowOpen);

        let generation = state.timer_generation();
        apply(
            &mut state,
            GameEvent::new(
                SYSTEM_USER,
                15_000,
                EventKind::TimerFired { phase: TimedPhase::BuzzWindow, generation },
            ),
        );
        assert_eq!(state.phase(), GamePhase::ClueResolved);
        assert_eq!(state.buzzes().get("y"), Some(&BuzzOutcome::TimedOut));
        assert_eq!(state.players()["x"].score, -200);
    }

    #[test]
    fn stale_timer_firings_are_rejected() {
        let mut state = open_window();
        apply(&mut state, GameEvent::new("x", 10_300, EventKind::Buzz));

        // The buzz-window timer fires after the phase already advanced.
        let err = state
            .apply(&GameEvent::new(
                SYSTEM_USER,
                15_000,
                EventKind::TimerFired {
                    phase: TimedPhase::BuzzWindow,
                    generation: state.timer_generation() - 1,
                },
            ))
            .unwrap_err();
        assert_eq!(err.reason, RejectReason::StaleTimer);
        assert_eq!(state.phase(), GamePhase::Answering);
    }

    #[test]
    fn out_of_phase_events_leave_state_untouched() {
        let mut state = GameState::new(board(), timings());
        join(&mut state, "x");
        apply(&mut state, GameEvent::new("x", 1, EventKind::StartGame));

        let before = state.clone();
        let err = state
            .apply(&GameEvent::new("x", 2, EventKind::Buzz))
            .unwrap_err();
        assert_eq!(err.reason, RejectReason::WrongPhase);
        assert_eq!(state, before);
    }

    #[test]
    fn replaying_the_same_events_yields_identical_state() {
        let events = vec![
            GameEvent::new("x", 0, EventKind::Join { name: "X".into() }),
            GameEvent::new("y", 0, EventKind::Join { name: "Y".into() }),
            GameEvent::new("x", 1, EventKind::StartGame),
            GameEvent::new("x", 2, EventKind::SelectClue { clue: ClueId { category: 0, row: 0 } }),
            GameEvent::new(
                SYSTEM_USER,
                10_000,
                EventKind::TimerFired { phase: TimedPhase::RevealDelay, generation: 1 },
            ),
            GameEvent::new("y", 10_250, EventKind::Buzz),
            GameEvent::new("x", 10_400, EventKind::Buzz),
            GameEvent::new("y", 11_000, EventKind::SubmitAnswer { text: "answer".into() }),
            GameEvent::new("x", 11_500, EventKind::Judge { correct: true }),
            GameEvent::new("x", 12_000, EventKind::AdvancePhase),
        ];

        let mut a = GameState::new(board(), timings());
        let mut b = GameState::new(board(), timings());
        for event in &events {
            let _ = a.apply(event);
            let _ = b.apply(event);
        }
        assert_eq!(a, b);
        assert_eq!(a.players()["y"].score, 100);
        assert_eq!(a.phase(), GamePhase::ClueSelect);
    }

    #[test]
    fn advancing_through_all_clues_ends_the_game() {
        let mut state = GameState::new(board(), timings());
        join(&mut state, "x");
        apply(&mut state, GameEvent::new("x", 1, EventKind::StartGame));

        let round_clues: Vec<ClueId> = state
            .current_round()
            .expect("round")
            .clue_ids()
            .collect();
        for clue in round_clues {
            apply(&mut state, GameEvent::new("x", 2, EventKind::SelectClue { clue }));
            // Host skips the clue outright.
            apply(&mut state, GameEvent::new("x", 3, EventKind::AdvancePhase));
            assert_eq!(state.phase(), GamePhase::ClueResolved);
            apply(&mut state, GameEvent::new("x", 4, EventKind::AdvancePhase));
        }

        assert_eq!(state.phase(), GamePhase::RoundEnd);
        apply(&mut state, GameEvent::new("x", 5, EventKind::AdvancePhase));
        assert_eq!(state.phase(), GamePhase::GameEnd);
        assert_eq!(state.players()["x"].score, 0);
    }

    #[test]
    fn boards_with_only_empty_rounds_end_immediately() {
        let empty = Board {
            title: "empty".into(),
            rounds: vec![Round {
                name: "round one".into(),
                categories: vec![Category { name: "void".into(), clues: vec![] }],
            }],
        };
        let mut state = GameState::new(empty, timings());
        join(&mut state, "x");
        apply(&mut state, GameEvent::new("x", 1, EventKind::StartGame));
        assert_eq!(state.phase(), GamePhase::GameEnd);
    }

    #[test]
    fn empty_rounds_are_skipped_on_entry() {
        let mut playable = board();
        playable
            .rounds
            .insert(0, Round { name: "teaser".into(), categories: vec![] });
        let mut state = GameState::new(playable, timings());
        join(&mut state, "x");
        apply(&mut state, GameEvent::new("x", 1, EventKind::StartGame));

        assert_eq!(state.phase(), GamePhase::ClueSelect);
        assert_eq!(state.round_index(), 1);
    }

    #[test]
    fn selecting_a_resolved_clue_is_rejected() {
        let mut state = GameState::new(board(), timings());
        join(&mut state, "x");
        apply(&mut state, GameEvent::new("x", 1, EventKind::StartGame));
        let clue = ClueId { category: 0, row: 0 };
        apply(&mut state, GameEvent::new("x", 2, EventKind::SelectClue { clue }));
        apply(&mut state, GameEvent::new("x", 3, EventKind::AdvancePhase));
        apply(&mut state, GameEvent::new("x", 4, EventKind::AdvancePhase));

        let err = state
            .apply(&GameEvent::new("x", 5, EventKind::SelectClue { clue }))
            .unwrap_err();
        assert_eq!(err.reason, RejectReason::ClueAlreadyResolved);
    }
}
