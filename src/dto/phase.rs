use serde::Serialize;
use utoipa::ToSchema;

use crate::engine::GamePhase;

/// Publicly visible game phase exposed to clients (REST/WS/SSE).
#[derive(Debug, Serialize, ToSchema, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum VisibleGamePhase {
    /// Waiting for players; the game has not started.
    Lobby,
    /// Transient round banner.
    RoundIntro,
    /// The board-control holder picks the next clue.
    ClueSelect,
    /// Clue text shown; buzzing not yet allowed.
    ClueRevealed,
    /// The buzz race is on.
    BuzzWindowOpen,
    /// The winning buzzer is composing an answer.
    Answering,
    /// The host rules on the submitted answer.
    Judging,
    /// Answer revealed; waiting to move on.
    ClueResolved,
    /// Every clue of the round has been resolved.
    RoundEnd,
    /// Terminal state.
    GameEnd,
}

impl From<GamePhase> for VisibleGamePhase {
    fn from(value: GamePhase) -> Self {
        match value {
            GamePhase::Lobby => VisibleGamePhase::Lobby,
            GamePhase::RoundIntro => VisibleGamePhase::RoundIntro,
            GamePhase::ClueSelect => VisibleGamePhase::ClueSelect,
            GamePhase::ClueRevealed => VisibleGamePhase::ClueRevealed,
            GamePhase::BuzzWindowOpen => VisibleGamePhase::BuzzWindowOpen,
            GamePhase::Answering => VisibleGamePhase::Answering,
            GamePhase::Judging => VisibleGamePhase::Judging,
            GamePhase::ClueResolved => VisibleGamePhase::ClueResolved,
            GamePhase::RoundEnd => VisibleGamePhase::RoundEnd,
            GamePhase::GameEnd => VisibleGamePhase::GameEnd,
        }
    }
}
