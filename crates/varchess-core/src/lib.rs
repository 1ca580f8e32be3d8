//! Core types for variant chess.
//!
//! This crate provides the value types shared by the engine and its callers:
//! - [`Geometry`] and [`Coordinate`] for variant-sized boards
//! - [`Side`], [`PieceKind`] and [`Piece`] for piece representation
//! - [`Move`] for move representation
//! - [`GameRecord`] for saved games, and the [`notation`] codec that reads
//!   and writes them

mod coord;
mod mov;
pub mod notation;
mod piece;
mod record;
mod side;

pub use coord::{Coordinate, CoordinateError, Geometry, FILE_ALPHABET, RANK_ALPHABET};
pub use mov::{Move, MoveError, PROMOTION_SEPARATOR};
pub use notation::{BoardContext, MalformedKind, MalformedRecord, NotationError};
pub use piece::{Piece, PieceKind};
pub use record::{GameRecord, LEVEL_NAMES};
pub use side::Side;
