//! Fixed-depth negamax search with alpha-beta pruning.
//!
//! The search runs on a private snapshot of the caller's board: every
//! simulated move is applied to the snapshot and undone once its subtree is
//! scored, so the caller's board is never observed in an intermediate state.

use crate::board::{Board, Phase};
use crate::rules::Outcome;
use crate::EngineError;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::debug;
use varchess_core::{Move, Side};

/// Score of a position where the side to move has been mated.
///
/// Mates are scored without distance, so every mate within the horizon is
/// worth exactly this much.
pub const MATE_SCORE: i32 = 1_000_000;

/// Score of stalemates and drawn positions.
pub const DRAW_SCORE: i32 = 0;

const INFINITY: i32 = MATE_SCORE + 1;

/// The line judged best up to the search horizon.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BestSequence {
    /// Principal variation, starting with the move to play.
    pub moves: Vec<Move>,
    /// Score from the point of view of the side to move at the root.
    pub score: i32,
}

impl BestSequence {
    /// The move to play, if any.
    pub fn best_move(&self) -> Option<&Move> {
        self.moves.first()
    }
}

/// Depth-bounded adversarial search.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SearchEngine {
    depth: u32,
}

impl SearchEngine {
    /// Creates a search of `depth` plies.
    pub fn new(depth: u32) -> Result<Self, EngineError> {
        if depth == 0 {
            return Err(EngineError::InvalidSearchDepth(depth));
        }
        Ok(SearchEngine { depth })
    }

    pub fn depth(&self) -> u32 {
        self.depth
    }

    /// Searches the position on `board`.
    ///
    /// Identical boards give identical results. Ties go to the line found
    /// first in canonical move order. A finished game yields no moves and
    /// the terminal score.
    pub fn best_sequence(&self, board: &Board) -> Result<BestSequence, EngineError> {
        self.best_sequence_cancellable(board, &AtomicBool::new(false))
    }

    /// Like [`SearchEngine::best_sequence`], abandoning the search with
    /// [`EngineError::SearchCancelled`] once `cancel` is set.
    pub fn best_sequence_cancellable(
        &self,
        board: &Board,
        cancel: &AtomicBool,
    ) -> Result<BestSequence, EngineError> {
        let mut searcher = Searcher {
            cancel,
            nodes: 0,
        };
        let mut scratch = board.snapshot();
        let (score, moves) = searcher.negamax(&mut scratch, self.depth, -INFINITY, INFINITY)?;
        debug!(
            depth = self.depth,
            nodes = searcher.nodes,
            score,
            line = ?moves,
            "search finished"
        );
        Ok(BestSequence { moves, score })
    }
}

/// Score of a finished game from the point of view of `to_move`.
pub fn terminal_score(outcome: Outcome, to_move: Side) -> i32 {
    match outcome {
        Outcome::Checkmate { winner } if winner == to_move => MATE_SCORE,
        Outcome::Checkmate { .. } => -MATE_SCORE,
        Outcome::Stalemate | Outcome::Draw(_) => DRAW_SCORE,
    }
}

struct Searcher<'a> {
    cancel: &'a AtomicBool,
    nodes: u64,
}

impl Searcher<'_> {
    fn negamax(
        &mut self,
        board: &mut Board,
        depth: u32,
        mut alpha: i32,
        beta: i32,
    ) -> Result<(i32, Vec<Move>), EngineError> {
        self.nodes += 1;
        if self.cancel.load(Ordering::Relaxed) {
            return Err(EngineError::SearchCancelled);
        }

        if let Phase::Terminal(outcome) = board.phase() {
            return Ok((terminal_score(outcome, board.side_to_move()), Vec::new()));
        }
        if depth == 0 {
            return Ok((board.evaluate(), Vec::new()));
        }

        let mut best_score = -INFINITY;
        let mut best_line = Vec::new();
        for mv in board.legal_moves() {
            board.play_unchecked(mv.clone());
            let child = self.negamax(board, depth - 1, -beta, -alpha);
            board.undo_unchecked();
            let (child_score, child_line) = child?;
            let score = -child_score;

            if score > best_score {
                best_score = score;
                best_line.clear();
                best_line.push(mv);
                best_line.extend(child_line);
            }
            alpha = alpha.max(score);
            if alpha >= beta {
                break;
            }
        }
        Ok((best_score, best_line))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{VariantCatalog, CLASSIC};
    use crate::rules::Variant;
    use std::sync::Arc;
    use varchess_core::Geometry;

    fn position(placement: &str, to_move: Side) -> Board {
        let variant = Variant::from_toml(CLASSIC)
            .unwrap()
            .with_placement(placement, to_move)
            .unwrap();
        Board::new(Arc::new(variant), false)
    }

    fn tokens(seq: &BestSequence) -> Vec<String> {
        seq.moves.iter().map(Move::to_token).collect()
    }

    #[test]
    fn zero_depth_is_rejected() {
        assert!(matches!(
            SearchEngine::new(0),
            Err(EngineError::InvalidSearchDepth(0))
        ));
    }

    #[test]
    fn finds_back_rank_mate() {
        let board = position("6k1/5ppp/8/8/8/8/8/R5K1", Side::White);
        let seq = SearchEngine::new(1).unwrap().best_sequence(&board).unwrap();
        assert_eq!(tokens(&seq), ["a1a8"]);
        assert_eq!(seq.score, MATE_SCORE);
    }

    #[test]
    fn wins_hanging_queen() {
        let board = position("4k3/8/8/3q4/8/8/3R4/4K3", Side::White);
        let seq = SearchEngine::new(2).unwrap().best_sequence(&board).unwrap();
        assert_eq!(seq.best_move().map(Move::to_token).as_deref(), Some("d2d5"));
        assert_eq!(seq.moves.len(), 2);
    }

    #[test]
    fn finished_game_returns_terminal_score() {
        let board = position("R5k1/5ppp/8/8/8/8/8/6K1", Side::Black);
        assert!(board.phase().is_terminal());
        let seq = SearchEngine::new(3).unwrap().best_sequence(&board).unwrap();
        assert!(seq.moves.is_empty());
        assert_eq!(seq.score, -MATE_SCORE);
    }

    #[test]
    fn search_leaves_board_untouched() {
        let mut board = Board::new(VariantCatalog::builtin().get("classic").unwrap(), false);
        board
            .apply_move(&Move::parse_token("e2e4", Geometry::STANDARD).unwrap())
            .unwrap();
        let before = board.state().clone();
        let engine = SearchEngine::new(2).unwrap();
        let first = engine.best_sequence(&board).unwrap();
        assert_eq!(board.state(), &before);
        assert_eq!(board.ply(), 1);
        let second = engine.best_sequence(&board).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn cancelled_search_reports_cancellation() {
        let board = Board::new(VariantCatalog::builtin().get("classic").unwrap(), false);
        let cancel = AtomicBool::new(true);
        let result = SearchEngine::new(3)
            .unwrap()
            .best_sequence_cancellable(&board, &cancel);
        assert!(matches!(result, Err(EngineError::SearchCancelled)));
    }

    #[test]
    fn terminal_scores() {
        let mate = Outcome::Checkmate {
            winner: Side::White,
        };
        assert_eq!(terminal_score(mate, Side::White), MATE_SCORE);
        assert_eq!(terminal_score(mate, Side::Black), -MATE_SCORE);
        assert_eq!(terminal_score(Outcome::Stalemate, Side::White), DRAW_SCORE);
    }
}
