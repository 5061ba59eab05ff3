//! Immutable board data: rounds, categories, and clues loaded from the
//! question source. The engine only ever reads these; scores and phase live
//! in [`crate::engine::game::GameState`].

use serde::{Deserialize, Serialize};

use crate::dao::models::{BoardEntity, CategoryEntity, ClueEntity, RoundEntity};

/// Addresses one clue inside the current round.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ClueId {
    /// Index of the category column within the round.
    pub category: usize,
    /// Index of the clue row within the category.
    pub row: usize,
}

/// One question unit with a point value and an optional per-clue timeout.
#[derive(Debug, Clone, PartialEq)]
pub struct Clue {
    /// Prompt shown to the players once the clue is revealed.
    pub text: String,
    /// Reference answer shown to the judge and revealed on resolution.
    pub answer: String,
    /// Point value; may be negative for wagered clues.
    pub value: i64,
    /// Buzz window override in milliseconds; `None` uses the configured default.
    pub timeout_ms: Option<u64>,
}

/// A named column of clues.
#[derive(Debug, Clone, PartialEq)]
pub struct Category {
    /// Display name of the category.
    pub name: String,
    /// Clues ordered top to bottom.
    pub clues: Vec<Clue>,
}

/// One round of play holding a grid of categories.
#[derive(Debug, Clone, PartialEq)]
pub struct Round {
    /// Display name of the round.
    pub name: String,
    /// Category columns making up the grid.
    pub categories: Vec<Category>,
}

impl Round {
    /// Total number of clues in this round.
    pub fn clue_count(&self) -> usize {
        self.categories.iter().map(|c| c.clues.len()).sum()
    }

    /// Look up a clue by its in-round address.
    pub fn clue(&self, id: ClueId) -> Option<&Clue> {
        self.categories.get(id.category)?.clues.get(id.row)
    }

    /// Iterate over every clue address in the round.
    pub fn clue_ids(&self) -> impl Iterator<Item = ClueId> + '_ {
        self.categories
            .iter()
            .enumerate()
            .flat_map(|(category, col)| {
                (0..col.clues.len()).map(move |row| ClueId { category, row })
            })
    }
}

/// Full question set for a game, immutable once loaded from the store.
#[derive(Debug, Clone, PartialEq)]
pub struct Board {
    /// Display title of the board.
    pub title: String,
    /// Rounds played in order.
    pub rounds: Vec<Round>,
}

impl Board {
    /// Borrow a round by index.
    pub fn round(&self, index: usize) -> Option<&Round> {
        self.rounds.get(index)
    }
}

impl From<ClueEntity> for Clue {
    fn from(value: ClueEntity) -> Self {
        Self {
            text: value.text,
            answer: value.answer,
            value: value.value,
            timeout_ms: value.timeout_ms,
        }
    }
}

impl From<CategoryEntity> for Category {
    fn from(value: CategoryEntity) -> Self {
        Self {
            name: value.name,
            clues: value.clues.into_iter().map(Into::into).collect(),
        }
    }
}

impl From<RoundEntity> for Round {
    fn from(value: RoundEntity) -> Self {
        Self {
            name: value.name,
            categories: value.categories.into_iter().map(Into::into).collect(),
        }
    }
}

impl From<BoardEntity> for Board {
    fn from(value: BoardEntity) -> Self {
        Self {
            title: value.title,
            rounds: value.rounds.into_iter().map(Into::into).collect(),
        }
    }
}
