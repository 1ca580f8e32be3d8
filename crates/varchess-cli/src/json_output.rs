//! JSON rendering of analysis results.

use serde::Serialize;
use varchess_core::GameRecord;
use varchess_engine::{BestSequence, Board, Phase};

/// JSON representation of one analysed position.
#[derive(Debug, Serialize)]
pub struct AnalysisJson<'a> {
    /// Variant setup name.
    pub setup: &'a str,
    pub atomic: bool,
    /// Plies played before the analysed position.
    pub ply: usize,
    /// "white" or "black".
    pub to_move: &'static str,
    /// Search depth in plies.
    pub depth: u32,
    /// Score from the point of view of the side to move.
    pub score: i32,
    /// Best line as move tokens.
    pub line: Vec<String>,
    /// Outcome text once the game is over.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub outcome: Option<String>,
}

impl<'a> AnalysisJson<'a> {
    pub fn new(record: &'a GameRecord, board: &Board, depth: u32, seq: &BestSequence) -> Self {
        AnalysisJson {
            setup: &record.setup,
            atomic: record.atomic,
            ply: board.ply(),
            to_move: match board.side_to_move() {
                varchess_core::Side::White => "white",
                varchess_core::Side::Black => "black",
            },
            depth,
            score: seq.score,
            line: seq.moves.iter().map(|m| m.to_token()).collect(),
            outcome: match board.phase() {
                Phase::Terminal(outcome) => Some(outcome.to_string()),
                _ => None,
            },
        }
    }
}
