//! Variant chess engine.
//!
//! This crate provides:
//! - [`Rules`] - Trait for variant rule providers, with the data-driven
//!   [`Variant`] loaded from TOML
//! - [`VariantCatalog`] - Variants by setup name, also the board context for
//!   decoding saved games
//! - [`Board`] - Board state machine with apply/undo, legality and terminal
//!   detection, including the atomic capture rule
//! - [`SearchEngine`] - Fixed-depth alpha-beta search
//! - [`Session`] - A game in progress with asynchronous engine play
//!
//! # Example
//!
//! ```
//! use varchess_core::{Geometry, Move};
//! use varchess_engine::{Board, SearchEngine, VariantCatalog};
//!
//! let catalog = VariantCatalog::builtin();
//! let mut board = Board::new(catalog.get("classic").unwrap(), false);
//! board
//!     .apply_move(&Move::parse_token("e2e4", Geometry::STANDARD).unwrap())
//!     .unwrap();
//! println!("Legal replies: {}", board.legal_moves().len());
//!
//! let best = SearchEngine::new(2).unwrap().best_sequence(&board).unwrap();
//! println!("Best line: {:?} ({})", best.moves, best.score);
//! ```

mod board;
mod catalog;
mod config;
mod error;
pub mod rules;
pub mod search;
mod session;

pub use board::{Board, BoardState, Phase, NO_PROGRESS_LIMIT, REPETITION_LIMIT};
pub use catalog::VariantCatalog;
pub use config::{ConfigError, EngineConfig};
pub use error::{EngineError, IllegalReason};
pub use rules::{DrawRule, Outcome, PieceRule, Rules, Squares, Variant};
pub use search::{BestSequence, SearchEngine, DRAW_SCORE, MATE_SCORE};
pub use session::{CancelHandle, Session, SessionBroadcast, SessionEvent};
