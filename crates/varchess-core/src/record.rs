//! Persistent game records.

use crate::Move;

/// Names of the strength levels, indexed by level.
///
/// Level 0 is a human player; higher levels are engine players.
pub const LEVEL_NAMES: [&str; 6] = ["Human", "Very Easy", "Easy", "Average", "Master", "Elder"];

/// A saved game: setup metadata plus the ordered moves played.
///
/// The record owns its moves exclusively.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GameRecord {
    /// Name of the variant setup, e.g. `classic`.
    pub setup: String,
    /// Whether the atomic capture rule is on.
    pub atomic: bool,
    /// Strength level of the White player (0 is human).
    pub white_level: u32,
    /// Strength level of the Black player (0 is human).
    pub black_level: u32,
    /// Moves in the order they were played.
    pub moves: Vec<Move>,
}

impl GameRecord {
    /// The setup used when none is specified.
    pub const DEFAULT_SETUP: &'static str = "classic";

    /// Creates an empty record for a setup.
    pub fn new(setup: impl Into<String>, atomic: bool, white_level: u32, black_level: u32) -> Self {
        GameRecord {
            setup: setup.into(),
            atomic,
            white_level,
            black_level,
            moves: Vec::new(),
        }
    }

    /// Appends a played move.
    pub fn push(&mut self, mv: Move) {
        self.moves.push(mv);
    }

    /// Removes and returns the last move.
    pub fn pop(&mut self) -> Option<Move> {
        self.moves.pop()
    }

    /// Number of plies recorded.
    pub fn len(&self) -> usize {
        self.moves.len()
    }

    pub fn is_empty(&self) -> bool {
        self.moves.is_empty()
    }

    /// Returns the display name of a level, clamping unknown levels.
    pub fn level_name(level: u32) -> &'static str {
        LEVEL_NAMES[(level as usize).min(LEVEL_NAMES.len() - 1)]
    }
}

impl Default for GameRecord {
    fn default() -> Self {
        GameRecord::new(Self::DEFAULT_SETUP, false, 0, 3)
    }
}
