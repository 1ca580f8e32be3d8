//! Data-driven variant rules.
//!
//! A variant is described in TOML: board size, a FEN-like starting placement
//! and the list of piece kinds with their movement vectors.
//!
//! ```toml
//! name = "classic"
//! files = 8
//! ranks = 8
//! placement = "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR"
//!
//! [[pieces]]
//! name = "Knight"
//! symbol = "N"
//! value = 320
//! leaps = [[1, 2], [2, 1], [2, -1], [1, -2], [-1, -2], [-2, -1], [-2, 1], [-1, 2]]
//! ```
//!
//! Vectors are `[file, rank]` offsets from White's point of view; Black's
//! rank offsets are mirrored.
//! - `leaps`: move or capture on the offset square
//! - `slides`: ride along the direction until blocked, capturing the blocker
//! - `pushes`: move to the offset square only if it is empty
//! - `strikes`: capture on the offset square only
//! - `double_push`: a push from the home rank may continue one more step
//! - `promotes_to`: choices offered on reaching the last rank

use super::{Rules, Squares};
use crate::EngineError;
use serde::Deserialize;
use varchess_core::{Coordinate, Geometry, Move, Piece, PieceKind, Side};

/// Largest accepted vector component.
const MAX_STEP: i8 = 15;

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
struct VariantDef {
    name: String,
    files: u8,
    ranks: u8,
    placement: String,
    #[serde(default)]
    to_move: SideDef,
    pieces: Vec<PieceDef>,
}

#[derive(Debug, Clone, Copy, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
enum SideDef {
    #[default]
    White,
    Black,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
struct PieceDef {
    name: String,
    symbol: char,
    #[serde(default)]
    value: i32,
    #[serde(default)]
    royal: bool,
    #[serde(default)]
    explosion_immune: bool,
    #[serde(default)]
    leaps: Vec<[i8; 2]>,
    #[serde(default)]
    slides: Vec<[i8; 2]>,
    #[serde(default)]
    pushes: Vec<[i8; 2]>,
    #[serde(default)]
    strikes: Vec<[i8; 2]>,
    #[serde(default)]
    double_push: bool,
    #[serde(default)]
    promotes_to: Vec<String>,
}

/// Movement and role of one piece kind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PieceRule {
    pub kind: PieceKind,
    /// Upper-case board symbol.
    pub symbol: char,
    pub value: i32,
    pub royal: bool,
    pub explosion_immune: bool,
    pub leaps: Vec<(i8, i8)>,
    pub slides: Vec<(i8, i8)>,
    pub pushes: Vec<(i8, i8)>,
    pub strikes: Vec<(i8, i8)>,
    pub double_push: bool,
    pub promotes_to: Vec<PieceKind>,
}

/// A variant loaded from its TOML definition.
#[derive(Debug, Clone)]
pub struct Variant {
    name: String,
    geometry: Geometry,
    first_to_move: Side,
    pieces: Vec<PieceRule>,
    initial: Vec<(Coordinate, Piece)>,
}

impl Variant {
    /// Parses and validates a variant definition.
    pub fn from_toml(text: &str) -> Result<Self, EngineError> {
        let def: VariantDef = toml::from_str(text).map_err(|e| EngineError::InvalidVariant {
            name: "<unparsed>".to_string(),
            reason: e.to_string(),
        })?;
        Self::from_def(def)
    }

    fn from_def(def: VariantDef) -> Result<Self, EngineError> {
        let invalid = |reason: String| EngineError::InvalidVariant {
            name: def.name.clone(),
            reason,
        };

        let geometry = Geometry::new(def.files, def.ranks).map_err(|e| invalid(e.to_string()))?;

        let mut pieces: Vec<PieceRule> = Vec::with_capacity(def.pieces.len());
        for p in &def.pieces {
            let kind = PieceKind::new(&p.name)
                .ok_or_else(|| invalid(format!("bad piece name \"{}\"", p.name)))?;
            if !p.symbol.is_ascii_alphabetic() {
                return Err(invalid(format!("bad symbol '{}' for {}", p.symbol, p.name)));
            }
            let symbol = p.symbol.to_ascii_uppercase();
            if pieces.iter().any(|r| r.kind == kind || r.symbol == symbol) {
                return Err(invalid(format!("duplicate piece {} ({})", p.name, symbol)));
            }
            let vectors = |list: &[[i8; 2]]| -> Result<Vec<(i8, i8)>, EngineError> {
                list.iter()
                    .map(|&[df, dr]| {
                        if (df, dr) == (0, 0)
                            || df.unsigned_abs() > MAX_STEP.unsigned_abs()
                            || dr.unsigned_abs() > MAX_STEP.unsigned_abs()
                        {
                            Err(invalid(format!("bad vector [{}, {}] for {}", df, dr, p.name)))
                        } else {
                            Ok((df, dr))
                        }
                    })
                    .collect()
            };
            pieces.push(PieceRule {
                kind,
                symbol,
                value: p.value,
                royal: p.royal,
                explosion_immune: p.explosion_immune,
                leaps: vectors(&p.leaps)?,
                slides: vectors(&p.slides)?,
                pushes: vectors(&p.pushes)?,
                strikes: vectors(&p.strikes)?,
                double_push: p.double_push,
                promotes_to: Vec::new(),
            });
        }

        // Promotion targets may name kinds declared later in the list.
        for (rule, p) in pieces.iter_mut().zip(&def.pieces) {
            for name in &p.promotes_to {
                let target = def
                    .pieces
                    .iter()
                    .find(|d| &d.name == name)
                    .and_then(|d| PieceKind::new(&d.name))
                    .ok_or_else(|| invalid(format!("{} promotes to unknown {}", p.name, name)))?;
                rule.promotes_to.push(target);
            }
        }

        let first_to_move = match def.to_move {
            SideDef::White => Side::White,
            SideDef::Black => Side::Black,
        };
        let initial = parse_placement(&def.placement, geometry, &pieces).map_err(invalid)?;

        Ok(Variant {
            name: def.name.clone(),
            geometry,
            first_to_move,
            pieces,
            initial,
        })
    }

    /// Returns a copy of this variant starting from another placement.
    pub fn with_placement(&self, placement: &str, to_move: Side) -> Result<Self, EngineError> {
        let initial = parse_placement(placement, self.geometry, &self.pieces).map_err(|reason| {
            EngineError::InvalidVariant {
                name: self.name.clone(),
                reason,
            }
        })?;
        Ok(Variant {
            initial,
            first_to_move: to_move,
            ..self.clone()
        })
    }

    /// All piece kinds in declaration order.
    pub fn pieces(&self) -> &[PieceRule] {
        &self.pieces
    }

    /// Returns the rule for a piece kind.
    pub fn rule(&self, kind: &PieceKind) -> Option<&PieceRule> {
        self.pieces.iter().find(|r| &r.kind == kind)
    }

    fn last_rank(&self, side: Side) -> u8 {
        match side {
            Side::White => self.geometry.ranks() - 1,
            Side::Black => 0,
        }
    }

    fn on_home_rank(&self, c: Coordinate, side: Side) -> bool {
        match side {
            Side::White => c.rank() == 1,
            Side::Black => c.rank() as usize + 2 == self.geometry.ranks() as usize,
        }
    }

    fn push_move(&self, rule: &PieceRule, side: Side, from: Coordinate, to: Coordinate, out: &mut Vec<Move>) {
        if !rule.promotes_to.is_empty() && to.rank() == self.last_rank(side) {
            for kind in &rule.promotes_to {
                out.push(Move::new(from, to).with_promotion(kind.clone()));
            }
        } else {
            out.push(Move::new(from, to));
        }
    }
}

impl Rules for Variant {
    fn name(&self) -> &str {
        &self.name
    }

    fn geometry(&self) -> Geometry {
        self.geometry
    }

    fn initial_placement(&self) -> Vec<(Coordinate, Piece)> {
        self.initial.clone()
    }

    fn first_to_move(&self) -> Side {
        self.first_to_move
    }

    fn pseudo_moves(&self, squares: &Squares, from: Coordinate, out: &mut Vec<Move>) {
        let Some(piece) = squares.get(&from) else {
            return;
        };
        let Some(rule) = self.rule(&piece.kind) else {
            return;
        };
        let side = piece.side;
        let g = self.geometry;
        let orient = |(df, dr): (i8, i8)| (df, dr * side.forward());

        for &v in &rule.leaps {
            let (df, dr) = orient(v);
            if let Some(to) = g.offset(from, df, dr) {
                if !matches!(squares.get(&to), Some(p) if p.side == side) {
                    self.push_move(rule, side, from, to, out);
                }
            }
        }

        for &v in &rule.slides {
            let (df, dr) = orient(v);
            let mut cur = from;
            while let Some(to) = g.offset(cur, df, dr) {
                match squares.get(&to) {
                    None => {
                        self.push_move(rule, side, from, to, out);
                        cur = to;
                    }
                    Some(p) => {
                        if p.side != side {
                            self.push_move(rule, side, from, to, out);
                        }
                        break;
                    }
                }
            }
        }

        for &v in &rule.pushes {
            let (df, dr) = orient(v);
            let Some(to) = g.offset(from, df, dr) else {
                continue;
            };
            if squares.contains_key(&to) {
                continue;
            }
            self.push_move(rule, side, from, to, out);
            if rule.double_push && self.on_home_rank(from, side) {
                if let Some(two) = g.offset(to, df, dr) {
                    if !squares.contains_key(&two) {
                        self.push_move(rule, side, from, two, out);
                    }
                }
            }
        }

        for &v in &rule.strikes {
            let (df, dr) = orient(v);
            if let Some(to) = g.offset(from, df, dr) {
                if matches!(squares.get(&to), Some(p) if p.side != side) {
                    self.push_move(rule, side, from, to, out);
                }
            }
        }
    }

    fn attacks(&self, squares: &Squares, from: Coordinate, target: Coordinate) -> bool {
        let Some(piece) = squares.get(&from) else {
            return false;
        };
        let Some(rule) = self.rule(&piece.kind) else {
            return false;
        };
        let forward = piece.side.forward();
        let df = target.file() as i16 - from.file() as i16;
        // Mirror back into White's frame.
        let dr = (target.rank() as i16 - from.rank() as i16) * forward as i16;
        if (df, dr) == (0, 0) {
            return false;
        }

        let hits = |&(vf, vr): &(i8, i8)| vf as i16 == df && vr as i16 == dr;
        if rule.leaps.iter().any(hits) || rule.strikes.iter().any(hits) {
            return true;
        }

        rule.slides.iter().any(|&(sf, sr)| {
            let Some(steps) = steps_along(df, dr, sf as i16, sr as i16) else {
                return false;
            };
            let mut cur = from;
            for _ in 1..steps {
                match self.geometry.offset(cur, sf, sr * forward) {
                    Some(next) if !squares.contains_key(&next) => cur = next,
                    _ => return false,
                }
            }
            true
        })
    }

    fn is_royal(&self, kind: &PieceKind) -> bool {
        self.rule(kind).is_some_and(|r| r.royal)
    }

    fn is_explosion_immune(&self, kind: &PieceKind) -> bool {
        self.rule(kind).is_some_and(|r| r.explosion_immune)
    }

    fn resets_clock(&self, kind: &PieceKind) -> bool {
        self.rule(kind).is_some_and(|r| !r.pushes.is_empty())
    }

    fn has_royals(&self) -> bool {
        self.pieces.iter().any(|r| r.royal)
    }

    fn evaluate(&self, squares: &Squares) -> i32 {
        squares
            .values()
            .map(|p| self.rule(&p.kind).map_or(0, |r| r.value) * p.side.sign())
            .sum()
    }

    fn symbol(&self, piece: &Piece) -> char {
        let symbol = self.rule(&piece.kind).map_or('?', |r| r.symbol);
        match piece.side {
            Side::White => symbol,
            Side::Black => symbol.to_ascii_lowercase(),
        }
    }
}

/// Number of steps `k >= 1` with `(df, dr) == k * (sf, sr)`.
fn steps_along(df: i16, dr: i16, sf: i16, sr: i16) -> Option<i16> {
    let k = if sf != 0 {
        if df % sf != 0 {
            return None;
        }
        df / sf
    } else {
        if df != 0 || sr == 0 || dr % sr != 0 {
            return None;
        }
        dr / sr
    };
    (k >= 1 && df == k * sf && dr == k * sr).then_some(k)
}

/// Parses a FEN-like placement: ranks from the top separated by `/`, piece
/// symbols (upper case White, lower case Black) and digit runs for empty
/// squares.
fn parse_placement(
    placement: &str,
    geometry: Geometry,
    pieces: &[PieceRule],
) -> Result<Vec<(Coordinate, Piece)>, String> {
    let rows: Vec<&str> = placement.split('/').collect();
    if rows.len() != geometry.ranks() as usize {
        return Err(format!(
            "placement has {} ranks, expected {}",
            rows.len(),
            geometry.ranks()
        ));
    }

    let mut out = Vec::new();
    for (i, row) in rows.iter().enumerate() {
        let rank = geometry.ranks() - 1 - i as u8;
        let mut file: usize = 0;
        let mut chars = row.chars().peekable();
        while let Some(c) = chars.next() {
            if let Some(d) = c.to_digit(10) {
                let mut run = d as usize;
                while let Some(d) = chars.peek().and_then(|c| c.to_digit(10)) {
                    run = run
                        .checked_mul(10)
                        .and_then(|r| r.checked_add(d as usize))
                        .filter(|&r| r <= geometry.files() as usize)
                        .ok_or_else(|| format!("rank {} is too wide", rank + 1))?;
                    chars.next();
                }
                file += run;
                continue;
            }
            let rule = pieces
                .iter()
                .find(|r| r.symbol == c.to_ascii_uppercase())
                .ok_or_else(|| format!("unknown symbol '{}' in placement", c))?;
            let side = if c.is_ascii_uppercase() {
                Side::White
            } else {
                Side::Black
            };
            let at = u8::try_from(file)
                .ok()
                .and_then(|f| geometry.coordinate(f, rank))
                .ok_or_else(|| format!("rank {} is too wide", rank + 1))?;
            out.push((at, Piece::new(rule.kind.clone(), side)));
            file += 1;
        }
        if file != geometry.files() as usize {
            return Err(format!(
                "rank {} has {} squares, expected {}",
                rank + 1,
                file,
                geometry.files()
            ));
        }
    }
    Ok(out)
}
