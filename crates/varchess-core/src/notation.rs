//! Game record notation: encoding and decoding of saved games.
//!
//! A saved game is a line-oriented text file:
//!
//! ```text
//! atomic=false
//! setup=classic
//! whitelevel=0
//! blacklevel=3
//! {BEGIN}
//! e2e4 1500
//! e7e5
//! e7e8_Queen 320
//! ```
//!
//! Header lines before the `{BEGIN}` marker are `name=value` pairs. After the
//! marker come move tokens, each optionally followed on the same line by a
//! bare integer: the time spent on that move, in milliseconds.
//!
//! Decoding is all-or-nothing. Any malformed line aborts the whole decode and
//! no partial record is returned.

use crate::{Geometry, GameRecord, Move, MoveError};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Line separating the header from the moves.
pub const BEGIN_MARKER: &str = "{BEGIN}";

/// Resolves the board a record's moves are validated against.
pub trait BoardContext {
    /// Returns the geometry of the named setup, or `None` if it is unknown.
    fn geometry_for(&self, setup: &str) -> Option<Geometry>;
}

/// A fixed geometry validates every record's moves, whatever its setup.
impl BoardContext for Geometry {
    fn geometry_for(&self, _setup: &str) -> Option<Geometry> {
        Some(*self)
    }
}

/// What was wrong with a malformed record.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum MalformedKind {
    #[error("unknown variable \"{0}\"")]
    UnknownVariable(String),

    #[error("header line is not name=value: \"{0}\"")]
    NotAnAssignment(String),

    #[error("bad number for {name}: \"{value}\"")]
    BadNumber { name: String, value: String },

    #[error("unknown setup \"{0}\"")]
    UnknownSetup(String),

    #[error("missing {{BEGIN}} marker")]
    MissingBegin,

    #[error(transparent)]
    BadMove(#[from] MoveError),

    #[error("invalid token \"{0}\"")]
    InvalidToken(String),
}

/// A decode failure, located by its 1-based line number.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("line {line}: {kind}")]
pub struct MalformedRecord {
    pub line: usize,
    pub kind: MalformedKind,
}

impl MalformedRecord {
    fn at(line: usize, kind: impl Into<MalformedKind>) -> Self {
        MalformedRecord {
            line,
            kind: kind.into(),
        }
    }
}

/// Errors from reading or writing notation files.
#[derive(Debug, Error)]
pub enum NotationError {
    #[error("cannot access {}: {source}", path.display())]
    FileAccess {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed record {}: {source}", path.display())]
    Malformed {
        path: PathBuf,
        #[source]
        source: MalformedRecord,
    },
}

/// Decodes a saved game.
///
/// `board` supplies the geometry the move coordinates are checked against,
/// looked up by the record's `setup` header once the header is complete.
pub fn decode(content: &str, board: &dyn BoardContext) -> Result<GameRecord, MalformedRecord> {
    let mut record = GameRecord::default();
    let mut lines = content.lines().enumerate().map(|(i, l)| (i + 1, l));

    let mut begin_line = None;
    for (number, line) in lines.by_ref() {
        if line.contains(BEGIN_MARKER) {
            begin_line = Some(number);
            break;
        }
        read_variable(&mut record, number, line)?;
    }
    let begin_line = begin_line
        .ok_or_else(|| MalformedRecord::at(content.lines().count().max(1), MalformedKind::MissingBegin))?;

    let geometry = board.geometry_for(&record.setup).ok_or_else(|| {
        MalformedRecord::at(begin_line, MalformedKind::UnknownSetup(record.setup.clone()))
    })?;

    for (number, line) in lines {
        let mut tokens = line.split_whitespace().peekable();
        while let Some(token) = tokens.next() {
            if !is_word(token) {
                return Err(MalformedRecord::at(
                    number,
                    MalformedKind::InvalidToken(token.to_string()),
                ));
            }
            let mut mv =
                Move::parse_token(token, geometry).map_err(|e| MalformedRecord::at(number, e))?;
            if let Some(millis) = tokens.peek().and_then(|t| parse_time(t)) {
                mv = mv.with_elapsed(millis);
                tokens.next();
            }
            record.push(mv);
        }
    }

    Ok(record)
}

/// Encodes a game record.
///
/// Header fields come in a fixed order, followed by the marker and one move
/// per line.
pub fn encode(record: &GameRecord) -> String {
    let mut out = String::new();
    out.push_str(&format!("atomic={}\n", record.atomic));
    out.push_str(&format!("setup={}\n", record.setup));
    out.push_str(&format!("whitelevel={}\n", record.white_level));
    out.push_str(&format!("blacklevel={}\n", record.black_level));
    out.push_str(BEGIN_MARKER);
    out.push('\n');
    for mv in &record.moves {
        out.push_str(&mv.to_token());
        if let Some(millis) = mv.elapsed() {
            out.push_str(&format!(" {}", millis));
        }
        out.push('\n');
    }
    out
}

/// Reads and decodes a saved game file.
pub fn read_file(path: &Path, board: &dyn BoardContext) -> Result<GameRecord, NotationError> {
    let content = std::fs::read_to_string(path).map_err(|source| NotationError::FileAccess {
        path: path.to_path_buf(),
        source,
    })?;
    decode(&content, board).map_err(|source| NotationError::Malformed {
        path: path.to_path_buf(),
        source,
    })
}

/// Encodes a game record and writes it to a file, replacing any content.
pub fn write_file(path: &Path, record: &GameRecord) -> Result<(), NotationError> {
    let access = |source: std::io::Error| NotationError::FileAccess {
        path: path.to_path_buf(),
        source,
    };
    let file = File::create(path).map_err(access)?;
    let mut writer = BufWriter::new(file);
    writer
        .write_all(encode(record).as_bytes())
        .map_err(access)?;
    writer.flush().map_err(access)
}

fn read_variable(record: &mut GameRecord, number: usize, line: &str) -> Result<(), MalformedRecord> {
    if line.trim().is_empty() {
        return Ok(());
    }
    let (name, value) = line.split_once('=').ok_or_else(|| {
        MalformedRecord::at(number, MalformedKind::NotAnAssignment(line.to_string()))
    })?;
    let (name, value) = (name.trim(), value.trim());

    let level = || {
        value.parse::<u32>().map_err(|_| {
            MalformedRecord::at(
                number,
                MalformedKind::BadNumber {
                    name: name.to_string(),
                    value: value.to_string(),
                },
            )
        })
    };

    match name {
        // Anything other than the literal `true` reads as false.
        "atomic" => record.atomic = value == "true",
        "setup" => record.setup = value.to_string(),
        "whitelevel" => record.white_level = level()?,
        "blacklevel" => record.black_level = level()?,
        _ => {
            return Err(MalformedRecord::at(
                number,
                MalformedKind::UnknownVariable(name.to_string()),
            ))
        }
    }
    Ok(())
}

/// A move token starts with a letter and holds only word characters.
fn is_word(token: &str) -> bool {
    token.starts_with(|c: char| c.is_alphabetic())
        && token.chars().all(|c| c.is_alphanumeric() || c == '_')
}

fn parse_time(token: &str) -> Option<u64> {
    if token.bytes().all(|b| b.is_ascii_digit()) {
        token.parse().ok()
    } else {
        None
    }
}
