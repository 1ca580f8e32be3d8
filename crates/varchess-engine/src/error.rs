//! Error taxonomy for the engine.

use std::path::PathBuf;
use thiserror::Error;
use varchess_core::{MalformedRecord, NotationError};

/// Why a move was rejected.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum IllegalReason {
    #[error("the game is over")]
    GameOver,
    #[error("coordinates are off the board")]
    OffBoard,
    #[error("no piece on the origin square")]
    EmptyOrigin,
    #[error("the piece belongs to the side not on move")]
    WrongSide,
    #[error("the piece cannot move there")]
    Unreachable,
    #[error("promotion choice is not allowed")]
    BadPromotion,
    #[error("it would expose or destroy a royal piece")]
    ExposesRoyal,
}

/// Errors produced by the board, the search and the session.
#[derive(Debug, Error)]
pub enum EngineError {
    /// The notation file could not be opened, read or written.
    #[error("cannot access {}: {source}", path.display())]
    FileAccess {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A saved game could not be decoded.
    #[error("malformed record{}: {source}", path.as_ref().map(|p| format!(" {}", p.display())).unwrap_or_default())]
    MalformedRecord {
        path: Option<PathBuf>,
        #[source]
        source: MalformedRecord,
    },

    /// A move is not legal in the current position.
    #[error("illegal move {token} at ply {ply}: {reason}")]
    IllegalMove {
        token: String,
        ply: usize,
        reason: IllegalReason,
    },

    /// The board is owned by a running operation.
    #[error("board is locked by a running operation")]
    BoardLocked,

    /// Undo was requested with no move applied since the last reset.
    #[error("nothing to undo")]
    NothingToUndo,

    /// A search was configured with a depth below one ply.
    #[error("invalid search depth {0}: must be at least 1")]
    InvalidSearchDepth(u32),

    /// A search was abandoned before it finished.
    #[error("search cancelled")]
    SearchCancelled,

    /// The search worker died without producing a result.
    #[error("search worker failed: {0}")]
    SearchFailed(String),

    /// No variant is registered under this setup name.
    #[error("unknown setup \"{0}\"")]
    UnknownSetup(String),

    /// A variant definition is inconsistent or unreadable.
    #[error("invalid variant {name}: {reason}")]
    InvalidVariant { name: String, reason: String },
}

impl From<NotationError> for EngineError {
    fn from(e: NotationError) -> Self {
        match e {
            NotationError::FileAccess { path, source } => EngineError::FileAccess { path, source },
            NotationError::Malformed { path, source } => EngineError::MalformedRecord {
                path: Some(path),
                source,
            },
        }
    }
}

impl From<MalformedRecord> for EngineError {
    fn from(source: MalformedRecord) -> Self {
        EngineError::MalformedRecord { path: None, source }
    }
}
