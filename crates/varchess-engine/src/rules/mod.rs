//! Rule provider abstraction for chess variants.
//!
//! This module provides the [`Rules`] trait which abstracts over variants.
//! The board is rule-agnostic: it delegates piece movement, piece roles and
//! position evaluation to the active rule provider. [`Variant`] is the
//! data-driven provider, loaded from a TOML definition.

mod variant;

pub use variant::{PieceRule, Variant};

use std::collections::BTreeMap;
use std::fmt;
use varchess_core::{Coordinate, Geometry, Move, Piece, PieceKind, Side};

/// Occupied squares of a board, in canonical (rank-major) order.
pub type Squares = BTreeMap<Coordinate, Piece>;

/// Result of a finished game.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// The losing side is mated or has lost its last royal piece.
    Checkmate { winner: Side },
    /// No legal moves, royal pieces not attacked.
    Stalemate,
    /// Drawn by a rule.
    Draw(DrawRule),
}

/// Rule that ended a game in a draw.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DrawRule {
    /// The same position occurred for the third time.
    Repetition,
    /// 100 plies without a capture or a pawn-like move.
    NoProgress,
    /// Only royal pieces are left.
    BareRoyals,
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Outcome::Checkmate { winner } => write!(f, "{} wins", winner),
            Outcome::Stalemate => write!(f, "stalemate"),
            Outcome::Draw(DrawRule::Repetition) => write!(f, "draw by repetition"),
            Outcome::Draw(DrawRule::NoProgress) => write!(f, "draw by the fifty-move rule"),
            Outcome::Draw(DrawRule::BareRoyals) => write!(f, "draw by bare royals"),
        }
    }
}

/// Trait for variant rule providers.
///
/// Implementations describe the board, the starting position and how each
/// piece moves. Move generation here is pseudo-legal: the board filters out
/// moves that expose or destroy the mover's royal pieces.
pub trait Rules: fmt::Debug + Send + Sync {
    /// Setup name of this variant.
    fn name(&self) -> &str;

    /// Board dimensions.
    fn geometry(&self) -> Geometry;

    /// Pieces on the board before the first move.
    fn initial_placement(&self) -> Vec<(Coordinate, Piece)>;

    /// Side that moves first.
    fn first_to_move(&self) -> Side {
        Side::White
    }

    /// Appends the pseudo-legal moves of the piece on `from`.
    ///
    /// Moves are appended in the variant's canonical order; promotions yield
    /// one move per allowed choice.
    fn pseudo_moves(&self, squares: &Squares, from: Coordinate, out: &mut Vec<Move>);

    /// Returns true if the piece on `from` could capture on `target`.
    fn attacks(&self, squares: &Squares, from: Coordinate, target: Coordinate) -> bool;

    /// Pieces whose loss loses the game.
    fn is_royal(&self, kind: &PieceKind) -> bool;

    /// Pieces that survive atomic explosions next to them.
    fn is_explosion_immune(&self, kind: &PieceKind) -> bool;

    /// Pieces whose moves reset the no-progress counter.
    fn resets_clock(&self, kind: &PieceKind) -> bool;

    /// Returns true if the variant has any royal piece kind.
    fn has_royals(&self) -> bool;

    /// Static evaluation in centipawn-like units from White's point of view.
    fn evaluate(&self, squares: &Squares) -> i32;

    /// Board symbol for a piece: upper case for White, lower case for Black.
    fn symbol(&self, piece: &Piece) -> char;
}
