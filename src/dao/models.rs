use serde::{Deserialize, Serialize};

/// Board definition as stored on disk.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct BoardEntity {
    /// Stable identifier for the board (also the file stem on disk).
    pub id: String,
    /// Display title of the board.
    pub title: String,
    /// Rounds played in order.
    pub rounds: Vec<RoundEntity>,
}

/// One round of a stored board.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RoundEntity {
    /// Display name of the round.
    pub name: String,
    /// Category columns making up the round grid.
    pub categories: Vec<CategoryEntity>,
}

/// A category column inside a stored round.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CategoryEntity {
    /// Display name of the category.
    pub name: String,
    /// Clues ordered top to bottom by value.
    pub clues: Vec<ClueEntity>,
}

/// A single stored clue.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ClueEntity {
    /// Prompt shown once the clue is revealed.
    pub text: String,
    /// Reference answer shown to the judge.
    pub answer: String,
    /// Point value awarded or deducted on judgment.
    pub value: i64,
    /// Optional buzz window override in milliseconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout_ms: Option<u64>,
}

/// Listing entry for a stored board (subset of [`BoardEntity`]).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct BoardListItemEntity {
    /// Stable identifier for the board.
    pub id: String,
    /// Display title of the board.
    pub title: String,
    /// Number of rounds the board contains.
    pub round_count: usize,
    /// Total number of clues across all rounds.
    pub clue_count: usize,
}

impl From<&BoardEntity> for BoardListItemEntity {
    fn from(entity: &BoardEntity) -> Self {
        Self {
            id: entity.id.clone(),
            title: entity.title.clone(),
            round_count: entity.rounds.len(),
            clue_count: entity
                .rounds
                .iter()
                .flat_map(|round| round.categories.iter())
                .map(|category| category.clues.len())
                .sum(),
        }
    }
}
