use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::{Validate, ValidationErrors};

use crate::{
    dao::models::BoardListItemEntity,
    dto::{format_system_time, phase::VisibleGamePhase, validation::validate_board_id},
    engine::{BuzzOutcome, GamePhase, GameState},
    sync::RoomHandle,
};

/// Payload used to open a brand-new game room.
#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateRoomRequest {
    /// Identifier of the board to play.
    pub board_id: String,
    /// Open the room in single-player mode (no peer relay).
    #[serde(default)]
    pub solo: bool,
}

impl Validate for CreateRoomRequest {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        if let Err(e) = validate_board_id(&self.board_id) {
            errors.add("board_id", e);
        }
        if errors.is_empty() { Ok(()) } else { Err(errors) }
    }
}

/// Summary returned once a room has been created or looked up.
#[derive(Debug, Serialize, ToSchema)]
pub struct RoomSummary {
    pub id: Uuid,
    pub solo: bool,
    pub created_at: String,
    pub snapshot: GameSnapshot,
}

impl RoomSummary {
    /// Assemble the summary from a live room handle.
    pub fn from_handle(handle: &RoomHandle) -> Self {
        Self {
            id: handle.id,
            solo: handle.solo,
            created_at: format_system_time(handle.created_at),
            snapshot: handle.snapshot(),
        }
    }
}

/// Listing entry for a playable board.
#[derive(Debug, Serialize, ToSchema)]
pub struct BoardSummary {
    pub id: String,
    pub title: String,
    pub round_count: usize,
    pub clue_count: usize,
}

impl From<BoardListItemEntity> for BoardSummary {
    fn from(entity: BoardListItemEntity) -> Self {
        Self {
            id: entity.id,
            title: entity.title,
            round_count: entity.round_count,
            clue_count: entity.clue_count,
        }
    }
}

#[derive(Clone, Debug, Serialize, ToSchema)]
/// Public projection of a player exposed to REST/WS/SSE clients.
pub struct PlayerSummary {
    pub user_id: String,
    pub name: String,
    pub score: i64,
}

/// One cell of the board grid as shown to clients.
#[derive(Clone, Debug, Serialize, ToSchema)]
pub struct BoardCellSnapshot {
    /// Point value of the clue behind this cell.
    pub value: i64,
    /// Whether the clue has already been played.
    pub resolved: bool,
}

/// A category column of the current round.
#[derive(Clone, Debug, Serialize, ToSchema)]
pub struct CategorySnapshot {
    pub name: String,
    pub clues: Vec<BoardCellSnapshot>,
}

/// The active clue as shown to clients.
///
/// The reference answer only appears once judgment starts; before that the
/// snapshot must stay safe to broadcast to every participant.
#[derive(Clone, Debug, Serialize, ToSchema)]
pub struct ClueSnapshot {
    pub category: usize,
    pub row: usize,
    pub category_name: String,
    pub text: String,
    pub value: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub answer: Option<String>,
}

/// Serialized buzz outcome for one player.
#[derive(Clone, Debug, Serialize, ToSchema)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum BuzzOutcomeDto {
    /// A valid buzz and its latency relative to the window opening.
    Duration { duration_ms: u64 },
    /// Buzzed before the window opened.
    CannotBuzz,
    /// Buzzed after the window budget elapsed.
    TimedOut,
}

impl From<BuzzOutcome> for BuzzOutcomeDto {
    fn from(value: BuzzOutcome) -> Self {
        match value {
            BuzzOutcome::Duration(duration_ms) => BuzzOutcomeDto::Duration { duration_ms },
            BuzzOutcome::CannotBuzz => BuzzOutcomeDto::CannotBuzz,
            BuzzOutcome::TimedOut => BuzzOutcomeDto::TimedOut,
        }
    }
}

/// A recorded buzz for the active clue.
#[derive(Clone, Debug, Serialize, ToSchema)]
pub struct BuzzSnapshot {
    pub user_id: String,
    #[serde(flatten)]
    pub outcome: BuzzOutcomeDto,
}

/// Consistent view of a room's game state, safe to broadcast to clients.
#[derive(Clone, Debug, Serialize, ToSchema)]
pub struct GameSnapshot {
    pub phase: VisibleGamePhase,
    pub board_title: String,
    /// Zero-based index of the round in play.
    pub round: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub round_name: Option<String>,
    pub players: Vec<PlayerSummary>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub host_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub board_control: Option<String>,
    pub categories: Vec<CategorySnapshot>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current_clue: Option<ClueSnapshot>,
    pub buzzes: Vec<BuzzSnapshot>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub winning_buzzer: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pending_answer: Option<String>,
}

impl From<&GameState> for GameSnapshot {
    fn from(state: &GameState) -> Self {
        let round = state.current_round();

        let categories = round
            .map(|r| {
                r.categories
                    .iter()
                    .enumerate()
                    .map(|(category, col)| CategorySnapshot {
                        name: col.name.clone(),
                        clues: col
                            .clues
                            .iter()
                            .enumerate()
                            .map(|(row, clue)| BoardCellSnapshot {
                                value: clue.value,
                                resolved: state.resolved().contains(
                                    &crate::engine::ClueId { category, row },
                                ),
                            })
                            .collect(),
                    })
                    .collect()
            })
            .unwrap_or_default();

        let answer_visible = matches!(
            state.phase(),
            GamePhase::Judging | GamePhase::ClueResolved
        );

        let current_clue = state.current_clue_id().and_then(|id| {
            let round = state.current_round()?;
            let clue = round.clue(id)?;
            Some(ClueSnapshot {
                category: id.category,
                row: id.row,
                category_name: round
                    .categories
                    .get(id.category)
                    .map(|c| c.name.clone())
                    .unwrap_or_default(),
                text: clue.text.clone(),
                value: clue.value,
                answer: answer_visible.then(|| clue.answer.clone()),
            })
        });

        Self {
            phase: state.phase().into(),
            board_title: state.board().title.clone(),
            round: state.round_index(),
            round_name: round.map(|r| r.name.clone()),
            players: state
                .players()
                .values()
                .map(|player| PlayerSummary {
                    user_id: player.user_id.clone(),
                    name: player.name.clone(),
                    score: player.score,
                })
                .collect(),
            host_id: state.host_id().map(str::to_owned),
            board_control: state.board_control().map(str::to_owned),
            categories,
            current_clue,
            buzzes: state
                .buzzes()
                .iter()
                .map(|(user_id, outcome)| BuzzSnapshot {
                    user_id: user_id.clone(),
                    outcome: (*outcome).into(),
                })
                .collect(),
            winning_buzzer: state.winning_buzzer().map(str::to_owned),
            pending_answer: state.pending_answer().map(str::to_owned),
        }
    }
}
