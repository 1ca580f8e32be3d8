//! Piece kinds and placed pieces.
//!
//! Piece kinds are data-driven: a variant declares them by name, so the core
//! only knows a kind as a validated name.

use crate::Side;
use std::fmt;
use std::sync::Arc;

/// The name of a piece kind, such as `Queen` or `Archbishop`.
///
/// Names are non-empty and made of ASCII letters, digits and underscores, so
/// they survive a round trip through the move notation.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PieceKind(Arc<str>);

impl PieceKind {
    /// Creates a piece kind, returning `None` for an empty or non-word name.
    pub fn new(name: &str) -> Option<Self> {
        if Self::is_valid_name(name) {
            Some(PieceKind(Arc::from(name)))
        } else {
            None
        }
    }

    /// Returns true if `name` can name a piece kind.
    pub fn is_valid_name(name: &str) -> bool {
        !name.is_empty()
            && name
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_')
    }

    /// Returns the kind's name.
    #[inline]
    pub fn name(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for PieceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PieceKind({})", self.0)
    }
}

impl fmt::Display for PieceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A piece standing on the board: its kind and owner.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Piece {
    pub kind: PieceKind,
    pub side: Side,
}

impl Piece {
    pub fn new(kind: PieceKind, side: Side) -> Self {
        Piece { kind, side }
    }
}
