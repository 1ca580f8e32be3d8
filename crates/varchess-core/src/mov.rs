//! Move representation.

use crate::{Coordinate, CoordinateError, Geometry, PieceKind};
use std::fmt;
use thiserror::Error;

/// Separator between the coordinate pair and a promotion choice in a token.
pub const PROMOTION_SEPARATOR: char = '_';

/// Reasons a move token cannot become a [`Move`].
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum MoveError {
    #[error("bad move length: '{0}'")]
    TooShort(String),

    #[error(transparent)]
    BadCoordinate(#[from] CoordinateError),

    #[error("bad promotion suffix: '{0}'")]
    BadPromotion(String),
}

/// A single move: origin, destination, optional promotion choice and
/// optional elapsed time in milliseconds.
///
/// Moves are immutable values; the `with_*` builders return a new move.
/// An absent elapsed time means "not recorded", which is distinct from zero.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct Move {
    origin: Coordinate,
    destination: Coordinate,
    promotion: Option<PieceKind>,
    elapsed: Option<u64>,
}

impl Move {
    /// Creates a plain move.
    #[inline]
    pub fn new(origin: Coordinate, destination: Coordinate) -> Self {
        Move {
            origin,
            destination,
            promotion: None,
            elapsed: None,
        }
    }

    /// Returns this move with a promotion choice.
    pub fn with_promotion(mut self, kind: PieceKind) -> Self {
        self.promotion = Some(kind);
        self
    }

    /// Returns this move with a recorded elapsed time.
    pub fn with_elapsed(mut self, millis: u64) -> Self {
        self.elapsed = Some(millis);
        self
    }

    #[inline]
    pub fn origin(&self) -> Coordinate {
        self.origin
    }

    #[inline]
    pub fn destination(&self) -> Coordinate {
        self.destination
    }

    #[inline]
    pub fn promotion(&self) -> Option<&PieceKind> {
        self.promotion.as_ref()
    }

    #[inline]
    pub fn elapsed(&self) -> Option<u64> {
        self.elapsed
    }

    /// Returns the move token, e.g. `e2e4` or `e7e8_Queen`.
    pub fn to_token(&self) -> String {
        match &self.promotion {
            Some(kind) => format!(
                "{}{}{}{}",
                self.origin, self.destination, PROMOTION_SEPARATOR, kind
            ),
            None => format!("{}{}", self.origin, self.destination),
        }
    }

    /// Parses a move token against a board geometry.
    ///
    /// The first four characters are the origin and destination coordinates.
    /// Anything after them must be the promotion separator followed by a
    /// non-empty piece-kind name.
    pub fn parse_token(token: &str, geometry: Geometry) -> Result<Self, MoveError> {
        let chars: Vec<char> = token.chars().collect();
        if chars.len() < 4 {
            return Err(MoveError::TooShort(token.to_string()));
        }

        let origin = geometry.parse(chars[0], chars[1])?;
        let destination = geometry.parse(chars[2], chars[3])?;
        let mut mv = Move::new(origin, destination);

        if chars.len() > 4 {
            if chars[4] != PROMOTION_SEPARATOR {
                return Err(MoveError::BadPromotion(token.to_string()));
            }
            let name: String = chars[5..].iter().collect();
            let kind =
                PieceKind::new(&name).ok_or_else(|| MoveError::BadPromotion(token.to_string()))?;
            mv = mv.with_promotion(kind);
        }

        Ok(mv)
    }
}

impl fmt::Debug for Move {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.elapsed {
            Some(ms) => write!(f, "Move({} {}ms)", self.to_token(), ms),
            None => write!(f, "Move({})", self.to_token()),
        }
    }
}

impl fmt::Display for Move {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_token())
    }
}
