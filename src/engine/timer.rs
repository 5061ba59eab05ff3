//! Phase deadline scheduling.
//!
//! Each timed phase owns exactly one logical deadline. The room loop
//! schedules a timer when the state machine asks for one and the fired event
//! travels through the same queue as every other event; stale firings are
//! rejected by the state machine through the generation counter.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::{sync::mpsc, task::JoinHandle};

use crate::engine::state_machine::GameEvent;

/// The phases that carry a deadline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimedPhase {
    /// Fixed delay between clue reveal and the buzz window opening.
    RevealDelay,
    /// The buzz race window.
    BuzzWindow,
    /// Time the winning buzzer has to submit an answer.
    AnswerWindow,
}

/// Configured durations for the timed phases.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PhaseTimings {
    /// Delay between `ClueRevealed` and `BuzzWindowOpen`, in milliseconds.
    pub reveal_delay_ms: u64,
    /// Default buzz window budget when a clue carries no override.
    pub buzz_window_ms: u64,
    /// Answer window for the winning buzzer, in milliseconds.
    pub answer_window_ms: u64,
}

impl Default for PhaseTimings {
    fn default() -> Self {
        Self {
            reveal_delay_ms: 500,
            buzz_window_ms: 5_000,
            answer_window_ms: 15_000,
        }
    }
}

/// Single-slot timer: scheduling a new deadline aborts the previous one.
#[derive(Debug, Default)]
pub struct PhaseTimer {
    task: Option<JoinHandle<()>>,
}

impl PhaseTimer {
    /// Create an idle timer.
    pub fn new() -> Self {
        Self::default()
    }

    /// Arm the timer; the fired event is pushed onto `tx` after the duration.
    pub fn schedule(
        &mut self,
        tx: mpsc::UnboundedSender<GameEvent>,
        phase: TimedPhase,
        duration_ms: u64,
        generation: u64,
    ) {
        self.cancel();
        self.task = Some(tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(duration_ms)).await;
            let _ = tx.send(GameEvent::timer_fired(phase, generation));
        }));
    }

    /// Abort any armed deadline.
    pub fn cancel(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

impl Drop for PhaseTimer {
    fn drop(&mut self) {
        self.cancel();
    }
}
