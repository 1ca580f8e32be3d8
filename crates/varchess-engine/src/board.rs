//! Board state machine with apply/undo and terminal detection.
//!
//! The [`Board`] owns the occupied squares, the side to move, the atomic
//! flag and the bookkeeping needed for draw detection. It delegates piece
//! movement to a [`Rules`] provider and adds what is common to every
//! variant:
//! - legality filtering (a move may not leave a royal piece attacked)
//! - promotion choice resolution
//! - the atomic capture rule
//! - checkmate, stalemate and draw detection
//! - exact undo, atomic explosions included

use crate::rules::{DrawRule, Outcome, Rules, Squares};
use crate::{EngineError, IllegalReason};
use std::collections::hash_map::DefaultHasher;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;
use tracing::debug;
use varchess_core::{Coordinate, Move, Piece, Side};

/// Plies without a capture or pawn-like move before the game is drawn.
pub const NO_PROGRESS_LIMIT: u32 = 100;

/// Occurrences of one position that draw the game.
pub const REPETITION_LIMIT: usize = 3;

/// Lifecycle of a board.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// Freshly initialized, no move applied.
    Idle,
    /// At least one move applied and the game goes on.
    InProgress,
    /// The game is over.
    Terminal(Outcome),
}

impl Phase {
    pub fn is_terminal(self) -> bool {
        matches!(self, Phase::Terminal(_))
    }
}

/// Complete observable state of a board.
///
/// Two boards with equal states behave identically for every future move.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BoardState {
    pub squares: Squares,
    pub side_to_move: Side,
    pub atomic: bool,
    pub halfmove_clock: u32,
    pub phase: Phase,
    /// Position keys since initialization, for repetition detection.
    pub keys: Vec<u64>,
}

/// Squares changed by one move.
#[derive(Debug, Clone)]
struct Displacement {
    /// Pieces taken off the board: the mover, the captured piece and any
    /// exploded neighbours.
    removed: Vec<(Coordinate, Piece)>,
    /// Where the mover landed, unless it exploded.
    placed: Option<Coordinate>,
    captured: bool,
}

#[derive(Debug, Clone)]
struct UndoRecord {
    mv: Move,
    displacement: Displacement,
    halfmove_clock: u32,
    phase: Phase,
}

/// A mutable board for one variant.
#[derive(Debug, Clone)]
pub struct Board {
    rules: Arc<dyn Rules>,
    state: BoardState,
    history: Vec<UndoRecord>,
    locked: bool,
}

impl Board {
    /// Creates a board at the variant's starting position.
    pub fn new(rules: Arc<dyn Rules>, atomic: bool) -> Self {
        let state = initial_state(rules.as_ref(), atomic);
        let mut board = Board {
            rules,
            state,
            history: Vec::new(),
            locked: false,
        };
        if let Some(outcome) = board.detect_outcome() {
            board.state.phase = Phase::Terminal(outcome);
        }
        board
    }

    /// Resets to the starting position of `rules` with the atomic flag.
    ///
    /// This is the only way to change the atomic flag.
    pub fn init(&mut self, rules: Arc<dyn Rules>, atomic: bool) -> Result<(), EngineError> {
        if self.locked {
            return Err(EngineError::BoardLocked);
        }
        *self = Board::new(rules, atomic);
        Ok(())
    }

    /// Resets to the starting position, keeping variant and atomic flag.
    pub fn reset(&mut self) -> Result<(), EngineError> {
        self.init(self.rules.clone(), self.state.atomic)
    }

    /// Resets and applies `moves` in order.
    ///
    /// Returns the moves as applied, promotion choices filled in. An illegal
    /// move aborts the replay and leaves the board at the starting position.
    pub fn replay(&mut self, moves: &[Move]) -> Result<Vec<Move>, EngineError> {
        self.reset()?;
        let mut applied = Vec::with_capacity(moves.len());
        for mv in moves {
            match self.apply_move(mv) {
                Ok(done) => applied.push(done),
                Err(e) => {
                    self.reset()?;
                    return Err(e);
                }
            }
        }
        Ok(applied)
    }

    /// Navigates to the position after the first `ply` moves of `moves`.
    pub fn jump(&mut self, moves: &[Move], ply: usize) -> Result<Vec<Move>, EngineError> {
        self.replay(&moves[..ply.min(moves.len())])
    }

    pub fn rules(&self) -> &Arc<dyn Rules> {
        &self.rules
    }

    pub fn state(&self) -> &BoardState {
        &self.state
    }

    pub fn phase(&self) -> Phase {
        self.state.phase
    }

    pub fn side_to_move(&self) -> Side {
        self.state.side_to_move
    }

    pub fn is_atomic(&self) -> bool {
        self.state.atomic
    }

    pub fn piece_at(&self, c: Coordinate) -> Option<&Piece> {
        self.state.squares.get(&c)
    }

    /// Number of moves applied since initialization.
    pub fn ply(&self) -> usize {
        self.history.len()
    }

    /// Moves applied since initialization, oldest first.
    pub fn moves(&self) -> impl Iterator<Item = &Move> {
        self.history.iter().map(|u| &u.mv)
    }

    pub fn is_locked(&self) -> bool {
        self.locked
    }

    pub fn lock(&mut self) {
        self.locked = true;
    }

    pub fn unlock(&mut self) {
        self.locked = false;
    }

    /// An unlocked copy for speculative work.
    pub fn snapshot(&self) -> Board {
        Board {
            locked: false,
            ..self.clone()
        }
    }

    /// Returns true if a royal piece of `side` is attacked.
    pub fn in_check(&self, side: Side) -> bool {
        in_check(self.rules.as_ref(), &self.state.squares, side)
    }

    /// Legal moves for the side to move in canonical order: origin squares
    /// rank-major, then the piece's declared vectors, then promotion
    /// options. Empty once the game is over.
    pub fn legal_moves(&self) -> Vec<Move> {
        if self.state.phase.is_terminal() {
            return Vec::new();
        }
        self.generate_legal(false)
    }

    /// Static evaluation from the point of view of the side to move.
    pub fn evaluate(&self) -> i32 {
        self.rules.evaluate(&self.state.squares) * self.state.side_to_move.sign()
    }

    /// Validates and applies a move.
    ///
    /// The promotion choice may be omitted, in which case the first option
    /// the variant declares is taken. Returns the move as applied.
    pub fn apply_move(&mut self, mv: &Move) -> Result<Move, EngineError> {
        if self.locked {
            return Err(EngineError::BoardLocked);
        }
        let chosen = self.resolve(mv).map_err(|reason| EngineError::IllegalMove {
            token: mv.to_token(),
            ply: self.history.len() + 1,
            reason,
        })?;
        let chosen = match mv.elapsed() {
            Some(millis) => chosen.with_elapsed(millis),
            None => chosen,
        };
        self.make(chosen.clone());
        debug!(mv = %chosen, ply = self.history.len(), phase = ?self.state.phase, "applied move");
        Ok(chosen)
    }

    /// Reverses the last applied move.
    pub fn undo_last(&mut self) -> Result<Move, EngineError> {
        if self.locked {
            return Err(EngineError::BoardLocked);
        }
        let mv = self.unmake().ok_or(EngineError::NothingToUndo)?;
        debug!(mv = %mv, ply = self.history.len(), "undid move");
        Ok(mv)
    }

    /// Applies a move taken from [`Board::legal_moves`] without validation.
    pub(crate) fn play_unchecked(&mut self, mv: Move) {
        self.make(mv);
    }

    pub(crate) fn undo_unchecked(&mut self) {
        self.unmake();
    }

    fn resolve(&self, mv: &Move) -> Result<Move, IllegalReason> {
        if self.state.phase.is_terminal() {
            return Err(IllegalReason::GameOver);
        }
        let geometry = self.rules.geometry();
        if !geometry.contains(mv.origin()) || !geometry.contains(mv.destination()) {
            return Err(IllegalReason::OffBoard);
        }
        let piece = self
            .state
            .squares
            .get(&mv.origin())
            .ok_or(IllegalReason::EmptyOrigin)?;
        if piece.side != self.state.side_to_move {
            return Err(IllegalReason::WrongSide);
        }

        let mut pseudo = Vec::new();
        self.rules
            .pseudo_moves(&self.state.squares, mv.origin(), &mut pseudo);
        pseudo.retain(|m| m.destination() == mv.destination());
        if pseudo.is_empty() {
            return Err(IllegalReason::Unreachable);
        }

        let candidate = match mv.promotion() {
            Some(kind) => pseudo
                .into_iter()
                .find(|m| m.promotion() == Some(kind))
                .ok_or(IllegalReason::BadPromotion)?,
            None => pseudo.swap_remove(0),
        };

        let mut scratch = self.state.squares.clone();
        if is_legal(
            self.rules.as_ref(),
            self.state.atomic,
            &mut scratch,
            self.state.side_to_move,
            &candidate,
        ) {
            Ok(candidate)
        } else {
            Err(IllegalReason::ExposesRoyal)
        }
    }

    fn generate_legal(&self, first_only: bool) -> Vec<Move> {
        let side = self.state.side_to_move;
        let rules = self.rules.as_ref();
        let mut scratch = self.state.squares.clone();
        let mut pseudo = Vec::new();
        for (&from, piece) in &self.state.squares {
            if piece.side == side {
                rules.pseudo_moves(&self.state.squares, from, &mut pseudo);
            }
        }

        let mut legal = Vec::with_capacity(pseudo.len());
        for mv in pseudo {
            if is_legal(rules, self.state.atomic, &mut scratch, side, &mv) {
                legal.push(mv);
                if first_only {
                    break;
                }
            }
        }
        legal
    }

    fn make(&mut self, mv: Move) {
        let rules = self.rules.as_ref();
        let mover = self.state.squares.get(&mv.origin()).map(|p| p.kind.clone());
        let displacement = displace(rules, self.state.atomic, &mut self.state.squares, &mv);

        let resets = displacement.captured || mover.is_some_and(|k| rules.resets_clock(&k));
        self.history.push(UndoRecord {
            mv,
            displacement,
            halfmove_clock: self.state.halfmove_clock,
            phase: self.state.phase,
        });

        self.state.halfmove_clock = if resets {
            0
        } else {
            self.state.halfmove_clock + 1
        };
        self.state.side_to_move = self.state.side_to_move.opposite();
        self.state
            .keys
            .push(position_key(&self.state.squares, self.state.side_to_move));
        self.state.phase = match self.detect_outcome() {
            Some(outcome) => Phase::Terminal(outcome),
            None => Phase::InProgress,
        };
    }

    fn unmake(&mut self) -> Option<Move> {
        let record = self.history.pop()?;
        restore(&mut self.state.squares, &record.displacement);
        self.state.keys.pop();
        self.state.side_to_move = self.state.side_to_move.opposite();
        self.state.halfmove_clock = record.halfmove_clock;
        self.state.phase = record.phase;
        Some(record.mv)
    }

    fn detect_outcome(&self) -> Option<Outcome> {
        let rules = self.rules.as_ref();
        let squares = &self.state.squares;
        let side = self.state.side_to_move;

        if rules.has_royals()
            && royal_count(rules, squares, side) == 0
            && royal_count(rules, squares, side.opposite()) > 0
        {
            return Some(Outcome::Checkmate {
                winner: side.opposite(),
            });
        }

        if self.generate_legal(true).is_empty() {
            return Some(if in_check(rules, squares, side) {
                Outcome::Checkmate {
                    winner: side.opposite(),
                }
            } else {
                Outcome::Stalemate
            });
        }

        if self.state.halfmove_clock >= NO_PROGRESS_LIMIT {
            return Some(Outcome::Draw(DrawRule::NoProgress));
        }

        if let Some(current) = self.state.keys.last() {
            let seen = self.state.keys.iter().filter(|k| *k == current).count();
            if seen >= REPETITION_LIMIT {
                return Some(Outcome::Draw(DrawRule::Repetition));
            }
        }

        if rules.has_royals() && squares.values().all(|p| rules.is_royal(&p.kind)) {
            return Some(Outcome::Draw(DrawRule::BareRoyals));
        }

        None
    }
}

impl fmt::Display for Board {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let geometry = self.rules.geometry();
        for rank in (0..geometry.ranks()).rev() {
            let mut line = String::new();
            for file in 0..geometry.files() {
                let symbol = geometry
                    .coordinate(file, rank)
                    .and_then(|c| self.state.squares.get(&c))
                    .map_or('.', |p| self.rules.symbol(p));
                line.push(' ');
                line.push(symbol);
            }
            let label = geometry.coordinate(0, rank).map_or('?', |c| c.rank_char());
            writeln!(f, "{}{}", label, line)?;
        }
        let files: String = (0..geometry.files())
            .filter_map(|file| geometry.coordinate(file, 0))
            .flat_map(|c| [' ', c.file_char()])
            .collect();
        write!(f, " {}", files)
    }
}

fn initial_state(rules: &dyn Rules, atomic: bool) -> BoardState {
    let squares: Squares = rules.initial_placement().into_iter().collect();
    let side_to_move = rules.first_to_move();
    let key = position_key(&squares, side_to_move);
    BoardState {
        squares,
        side_to_move,
        atomic,
        halfmove_clock: 0,
        phase: Phase::Idle,
        keys: vec![key],
    }
}

fn position_key(squares: &Squares, side: Side) -> u64 {
    let mut hasher = DefaultHasher::new();
    squares.hash(&mut hasher);
    side.hash(&mut hasher);
    hasher.finish()
}

/// Moves the pieces for `mv`, exploding neighbours in atomic mode.
fn displace(rules: &dyn Rules, atomic: bool, squares: &mut Squares, mv: &Move) -> Displacement {
    let mut removed = Vec::new();
    let Some(mover) = squares.remove(&mv.origin()) else {
        return Displacement {
            removed,
            placed: None,
            captured: false,
        };
    };
    removed.push((mv.origin(), mover.clone()));

    let target = mv.destination();
    let captured = match squares.remove(&target) {
        Some(victim) => {
            removed.push((target, victim));
            true
        }
        None => false,
    };

    if atomic && captured {
        let geometry = rules.geometry();
        for n in geometry.neighbours(target) {
            let immune = match squares.get(&n) {
                Some(p) => rules.is_explosion_immune(&p.kind),
                None => true,
            };
            if !immune {
                if let Some(p) = squares.remove(&n) {
                    removed.push((n, p));
                }
            }
        }
        return Displacement {
            removed,
            placed: None,
            captured,
        };
    }

    let landed = match mv.promotion() {
        Some(kind) => Piece::new(kind.clone(), mover.side),
        None => mover,
    };
    squares.insert(target, landed);
    Displacement {
        removed,
        placed: Some(target),
        captured,
    }
}

fn restore(squares: &mut Squares, displacement: &Displacement) {
    if let Some(at) = displacement.placed {
        squares.remove(&at);
    }
    for (at, piece) in &displacement.removed {
        squares.insert(*at, piece.clone());
    }
}

fn royal_count(rules: &dyn Rules, squares: &Squares, side: Side) -> usize {
    squares
        .values()
        .filter(|p| p.side == side && rules.is_royal(&p.kind))
        .count()
}

fn in_check(rules: &dyn Rules, squares: &Squares, side: Side) -> bool {
    squares
        .iter()
        .filter(|(_, p)| p.side == side && rules.is_royal(&p.kind))
        .any(|(&royal, _)| {
            squares
                .iter()
                .filter(|(_, p)| p.side != side)
                .any(|(&from, _)| rules.attacks(squares, from, royal))
        })
}

/// A pseudo-legal move is legal unless it loses one of the mover's royal
/// pieces or leaves one attacked. Blowing up the last enemy royal wins
/// outright.
fn is_legal(rules: &dyn Rules, atomic: bool, scratch: &mut Squares, side: Side, mv: &Move) -> bool {
    if !rules.has_royals() {
        return true;
    }
    let own_before = royal_count(rules, scratch, side);
    let enemy_before = royal_count(rules, scratch, side.opposite());
    let displacement = displace(rules, atomic, scratch, mv);

    let legal = if royal_count(rules, scratch, side) < own_before {
        false
    } else if atomic && enemy_before > 0 && royal_count(rules, scratch, side.opposite()) == 0 {
        true
    } else {
        !in_check(rules, scratch, side)
    };

    restore(scratch, &displacement);
    legal
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::VariantCatalog;
    use crate::rules::Variant;
    use varchess_core::Geometry;

    fn classic(atomic: bool) -> Board {
        let rules = VariantCatalog::builtin().get("classic").unwrap();
        Board::new(rules, atomic)
    }

    fn from_placement(placement: &str, to_move: Side, atomic: bool) -> Board {
        let variant = Variant::from_toml(crate::catalog::CLASSIC)
            .unwrap()
            .with_placement(placement, to_move)
            .unwrap();
        Board::new(Arc::new(variant), atomic)
    }

    fn mv(token: &str) -> Move {
        Move::parse_token(token, Geometry::STANDARD).unwrap()
    }

    fn play(board: &mut Board, tokens: &[&str]) {
        for t in tokens {
            board.apply_move(&mv(t)).unwrap();
        }
    }

    #[test]
    fn start_position() {
        let board = classic(false);
        assert_eq!(board.phase(), Phase::Idle);
        assert_eq!(board.side_to_move(), Side::White);
        assert_eq!(board.legal_moves().len(), 20);
        assert_eq!(board.evaluate(), 0);
    }

    #[test]
    fn canonical_order_starts_with_first_rank() {
        let board = classic(false);
        let tokens: Vec<_> = board.legal_moves().iter().map(Move::to_token).collect();
        assert_eq!(&tokens[..4], ["b1c3", "b1a3", "g1h3", "g1f3"]);
        assert_eq!(tokens[4], "a2a3");
    }

    #[test]
    fn apply_moves_to_in_progress() {
        let mut board = classic(false);
        let applied = board.apply_move(&mv("e2e4")).unwrap();
        assert_eq!(applied, mv("e2e4"));
        assert_eq!(board.phase(), Phase::InProgress);
        assert_eq!(board.side_to_move(), Side::Black);
        assert_eq!(board.ply(), 1);
    }

    #[test]
    fn rejects_illegal_moves_without_mutation() {
        let mut board = classic(false);
        let before = board.state().clone();
        let reason = |board: &mut Board, token: &str| match board.apply_move(&mv(token)) {
            Err(EngineError::IllegalMove { reason, ply, .. }) => {
                assert_eq!(ply, 1);
                reason
            }
            other => panic!("expected illegal move, got {:?}", other),
        };
        assert_eq!(reason(&mut board, "e3e4"), IllegalReason::EmptyOrigin);
        assert_eq!(reason(&mut board, "e7e5"), IllegalReason::WrongSide);
        assert_eq!(reason(&mut board, "e2e5"), IllegalReason::Unreachable);
        assert_eq!(reason(&mut board, "e2e4_Queen"), IllegalReason::BadPromotion);
        assert_eq!(board.state(), &before);
    }

    #[test]
    fn pinned_piece_cannot_move() {
        let mut board = from_placement("4r2k/8/8/8/8/8/4N3/4K3", Side::White, false);
        let err = board.apply_move(&mv("e2c3")).unwrap_err();
        assert!(matches!(
            err,
            EngineError::IllegalMove {
                reason: IllegalReason::ExposesRoyal,
                ..
            }
        ));
    }

    #[test]
    fn promotion_defaults_to_first_option() {
        let mut board = from_placement("7k/4P3/8/8/8/8/8/K7", Side::White, false);
        let applied = board.apply_move(&mv("e7e8")).unwrap();
        assert_eq!(applied.promotion().map(|k| k.name()), Some("Queen"));
        let e8 = Geometry::STANDARD.parse_str("e8").unwrap();
        let queen = board.piece_at(e8).unwrap();
        assert_eq!(queen.kind.name(), "Queen");

        board.undo_last().unwrap();
        let knight = board.apply_move(&mv("e7e8_Knight")).unwrap();
        assert_eq!(knight.promotion().map(|k| k.name()), Some("Knight"));
    }

    #[test]
    fn undo_restores_exact_state() {
        let mut board = classic(false);
        let start = board.state().clone();
        play(&mut board, &["e2e4", "d7d5", "e4d5", "d8d5"]);
        for _ in 0..4 {
            board.undo_last().unwrap();
        }
        assert_eq!(board.state(), &start);
        assert!(matches!(board.undo_last(), Err(EngineError::NothingToUndo)));
    }

    #[test]
    fn atomic_capture_explodes_neighbours() {
        let mut board = classic(true);
        play(&mut board, &["g1f3", "a7a6", "f3e5", "a6a5"]);
        let before = board.state().clone();
        board.apply_move(&mv("e5f7")).unwrap();

        let squares = &board.state().squares;
        // Capturer, victim and the non-pawn neighbours are gone.
        for gone in ["e5", "f7", "e8", "f8", "g8"] {
            let c = Geometry::STANDARD.parse_str(gone).unwrap();
            assert!(!squares.contains_key(&c), "{} survived", gone);
        }
        // Pawns are immune.
        for kept in ["e7", "g7", "d8"] {
            let c = Geometry::STANDARD.parse_str(kept).unwrap();
            assert!(squares.contains_key(&c), "{} exploded", kept);
        }
        assert_eq!(
            board.phase(),
            Phase::Terminal(Outcome::Checkmate {
                winner: Side::White
            })
        );

        board.undo_last().unwrap();
        assert_eq!(board.state(), &before);
    }

    #[test]
    fn atomic_forbids_exploding_own_royal() {
        let mut board = from_placement("4k3/8/8/8/8/8/3p4/4K3", Side::White, true);
        let err = board.apply_move(&mv("e1d2")).unwrap_err();
        assert!(matches!(
            err,
            EngineError::IllegalMove {
                reason: IllegalReason::ExposesRoyal,
                ..
            }
        ));
    }

    #[test]
    fn fools_mate_is_checkmate() {
        let mut board = classic(false);
        play(&mut board, &["f2f3", "e7e5", "g2g4", "d8h4"]);
        assert_eq!(
            board.phase(),
            Phase::Terminal(Outcome::Checkmate {
                winner: Side::Black
            })
        );
        assert!(board.legal_moves().is_empty());
        assert!(matches!(
            board.apply_move(&mv("a2a3")),
            Err(EngineError::IllegalMove {
                reason: IllegalReason::GameOver,
                ..
            })
        ));
    }

    #[test]
    fn stalemate_detected() {
        let mut board = from_placement("7k/8/6Q1/8/8/8/8/K7", Side::White, false);
        board.apply_move(&mv("g6f7")).unwrap();
        assert_eq!(board.phase(), Phase::Terminal(Outcome::Stalemate));
    }

    #[test]
    fn repetition_draw() {
        let mut board = classic(false);
        let shuffle = ["g1f3", "g8f6", "f3g1", "f6g8"];
        play(&mut board, &shuffle);
        play(&mut board, &shuffle);
        assert_eq!(
            board.phase(),
            Phase::Terminal(Outcome::Draw(DrawRule::Repetition))
        );
    }

    #[test]
    fn no_progress_draw() {
        let mut board = from_placement("4k3/8/8/8/8/8/8/R3K2R", Side::White, false);
        for ply in 1..=NO_PROGRESS_LIMIT {
            // First quiet move that keeps the game going, or ends it by
            // the no-progress rule on the last ply.
            let quiet: Vec<Move> = board
                .legal_moves()
                .into_iter()
                .filter(|m| board.piece_at(m.destination()).is_none())
                .collect();
            let played = quiet.into_iter().find(|m| {
                board.apply_move(m).unwrap();
                let ok = match board.phase() {
                    Phase::InProgress => ply < NO_PROGRESS_LIMIT,
                    Phase::Terminal(Outcome::Draw(DrawRule::NoProgress)) => {
                        ply == NO_PROGRESS_LIMIT
                    }
                    _ => false,
                };
                if !ok {
                    board.undo_last().unwrap();
                }
                ok
            });
            assert!(played.is_some(), "stuck at ply {}", ply);
            assert_eq!(board.state().halfmove_clock, ply);
        }
        assert_eq!(
            board.phase(),
            Phase::Terminal(Outcome::Draw(DrawRule::NoProgress))
        );

        board.undo_last().unwrap();
        assert_eq!(board.state().halfmove_clock, NO_PROGRESS_LIMIT - 1);
        assert_eq!(board.phase(), Phase::InProgress);
    }

    #[test]
    fn pawn_moves_and_captures_reset_clock() {
        let mut board = classic(false);
        play(&mut board, &["g1f3", "g8f6"]);
        assert_eq!(board.state().halfmove_clock, 2);
        play(&mut board, &["e2e4"]);
        assert_eq!(board.state().halfmove_clock, 0);
        play(&mut board, &["b8c6", "f1b5"]);
        assert_eq!(board.state().halfmove_clock, 2);
        play(&mut board, &["f6e4"]);
        assert_eq!(board.state().halfmove_clock, 0);

        board.undo_last().unwrap();
        assert_eq!(board.state().halfmove_clock, 2);
        board.undo_last().unwrap();
        board.undo_last().unwrap();
        board.undo_last().unwrap();
        assert_eq!(board.state().halfmove_clock, 2);
    }

    #[test]
    fn bare_royals_draw() {
        let mut board = from_placement("7k/8/8/8/8/8/8/Kr6", Side::White, false);
        board.apply_move(&mv("a1b1")).unwrap();
        assert_eq!(
            board.phase(),
            Phase::Terminal(Outcome::Draw(DrawRule::BareRoyals))
        );
    }

    #[test]
    fn locked_board_refuses_mutation() {
        let mut board = classic(false);
        board.lock();
        assert!(matches!(
            board.apply_move(&mv("e2e4")),
            Err(EngineError::BoardLocked)
        ));
        assert!(matches!(board.undo_last(), Err(EngineError::BoardLocked)));
        assert_eq!(board.ply(), 0);
        assert!(!board.snapshot().is_locked());
        board.unlock();
        assert!(board.apply_move(&mv("e2e4")).is_ok());
    }

    #[test]
    fn replay_and_jump() {
        let mut board = classic(false);
        let moves: Vec<Move> = ["e2e4", "e7e5", "g1f3"].iter().map(|t| mv(t)).collect();
        board.replay(&moves).unwrap();
        assert_eq!(board.ply(), 3);
        board.jump(&moves, 1).unwrap();
        assert_eq!(board.ply(), 1);
        assert_eq!(board.side_to_move(), Side::Black);

        let bad: Vec<Move> = ["e2e4", "e2e4"].iter().map(|t| mv(t)).collect();
        assert!(board.replay(&bad).is_err());
        assert_eq!(board.ply(), 0);
    }

    #[test]
    fn renders_board() {
        let board = from_placement("7k/8/8/8/8/8/8/K7", Side::White, false);
        let text = board.to_string();
        assert!(text.starts_with("8 . . . . . . . k\n"), "{}", text);
        assert!(text.ends_with("1 K . . . . . . .\n  a b c d e f g h"), "{}", text);
    }
}
