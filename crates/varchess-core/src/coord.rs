//! Board geometry and coordinates.
//!
//! Boards are variant-sized, up to 16 files by 16 ranks. A coordinate is
//! written as one file character followed by one rank character:
//! - files use `a`..`p`
//! - ranks use `1`..`9`, then `A`..`G`
//!
//! A [`Geometry`] selects the prefix of each alphabet that is valid for a
//! given board, so `i1` is a coordinate on a 10x8 board but not on 8x8.

use std::fmt;
use thiserror::Error;

/// Characters naming files, in order.
pub const FILE_ALPHABET: &[u8; 16] = b"abcdefghijklmnop";

/// Characters naming ranks, in order.
pub const RANK_ALPHABET: &[u8; 16] = b"123456789ABCDEFG";

/// Errors raised when building geometries or coordinates.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CoordinateError {
    #[error("bad coordinate '{file}{rank}' for a {files}x{ranks} board")]
    OutOfAlphabet {
        file: char,
        rank: char,
        files: u8,
        ranks: u8,
    },

    #[error("invalid board size {files}x{ranks}: each side must be 1..=16")]
    InvalidGeometry { files: u8, ranks: u8 },
}

/// A square on a variant board, as zero-based file and rank indices.
///
/// Coordinates order rank-major (a1, b1, ..., a2, ...), which is the
/// canonical square enumeration order used by move generation.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Coordinate {
    file: u8,
    rank: u8,
}

impl Coordinate {
    /// Returns the zero-based file index.
    #[inline]
    pub const fn file(self) -> u8 {
        self.file
    }

    /// Returns the zero-based rank index.
    #[inline]
    pub const fn rank(self) -> u8 {
        self.rank
    }

    /// Returns the file character.
    #[inline]
    pub const fn file_char(self) -> char {
        FILE_ALPHABET[self.file as usize] as char
    }

    /// Returns the rank character.
    #[inline]
    pub const fn rank_char(self) -> char {
        RANK_ALPHABET[self.rank as usize] as char
    }
}

impl PartialOrd for Coordinate {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Coordinate {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        (self.rank, self.file).cmp(&(other.rank, other.file))
    }
}

impl fmt::Debug for Coordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Coordinate({})", self)
    }
}

impl fmt::Display for Coordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.file_char(), self.rank_char())
    }
}

/// The dimensions of a variant board.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Geometry {
    files: u8,
    ranks: u8,
}

impl Geometry {
    /// Largest supported number of files or ranks.
    pub const MAX_SIDE: u8 = 16;

    /// The 8x8 board.
    pub const STANDARD: Geometry = Geometry { files: 8, ranks: 8 };

    /// Creates a geometry, rejecting sizes outside `1..=16`.
    pub const fn new(files: u8, ranks: u8) -> Result<Self, CoordinateError> {
        if files == 0 || ranks == 0 || files > Self::MAX_SIDE || ranks > Self::MAX_SIDE {
            return Err(CoordinateError::InvalidGeometry { files, ranks });
        }
        Ok(Geometry { files, ranks })
    }

    #[inline]
    pub const fn files(self) -> u8 {
        self.files
    }

    #[inline]
    pub const fn ranks(self) -> u8 {
        self.ranks
    }

    /// Number of squares on the board.
    #[inline]
    pub const fn len(self) -> usize {
        self.files as usize * self.ranks as usize
    }

    /// Always false: geometries have at least one square.
    #[inline]
    pub const fn is_empty(self) -> bool {
        false
    }

    /// Returns the file index for a file character on this board.
    pub fn file_index(self, c: char) -> Option<u8> {
        FILE_ALPHABET[..self.files as usize]
            .iter()
            .position(|&b| b as char == c)
            .map(|i| i as u8)
    }

    /// Returns the rank index for a rank character on this board.
    pub fn rank_index(self, c: char) -> Option<u8> {
        RANK_ALPHABET[..self.ranks as usize]
            .iter()
            .position(|&b| b as char == c)
            .map(|i| i as u8)
    }

    /// Returns true if both characters lie inside this board's alphabets.
    ///
    /// This is a pure check; call it before building a coordinate from
    /// untrusted text.
    pub fn is_valid(self, file: char, rank: char) -> bool {
        self.file_index(file).is_some() && self.rank_index(rank).is_some()
    }

    /// Parses a coordinate from its two characters.
    pub fn parse(self, file: char, rank: char) -> Result<Coordinate, CoordinateError> {
        match (self.file_index(file), self.rank_index(rank)) {
            (Some(file), Some(rank)) => Ok(Coordinate { file, rank }),
            _ => Err(CoordinateError::OutOfAlphabet {
                file,
                rank,
                files: self.files,
                ranks: self.ranks,
            }),
        }
    }

    /// Parses a two-character coordinate string such as `e4`.
    pub fn parse_str(self, s: &str) -> Result<Coordinate, CoordinateError> {
        let mut chars = s.chars();
        match (chars.next(), chars.next(), chars.next()) {
            (Some(file), Some(rank), None) => self.parse(file, rank),
            _ => Err(CoordinateError::OutOfAlphabet {
                file: s.chars().next().unwrap_or(' '),
                rank: s.chars().nth(1).unwrap_or(' '),
                files: self.files,
                ranks: self.ranks,
            }),
        }
    }

    /// Returns the coordinate at the given indices, if it is on the board.
    pub const fn coordinate(self, file: u8, rank: u8) -> Option<Coordinate> {
        if file < self.files && rank < self.ranks {
            Some(Coordinate { file, rank })
        } else {
            None
        }
    }

    /// Returns true if the coordinate lies on this board.
    #[inline]
    pub const fn contains(self, c: Coordinate) -> bool {
        c.file < self.files && c.rank < self.ranks
    }

    /// Steps from `c` by a file and rank delta, staying on the board.
    pub fn offset(self, c: Coordinate, df: i8, dr: i8) -> Option<Coordinate> {
        let file = c.file as i16 + df as i16;
        let rank = c.rank as i16 + dr as i16;
        if (0..self.files as i16).contains(&file) && (0..self.ranks as i16).contains(&rank) {
            Some(Coordinate {
                file: file as u8,
                rank: rank as u8,
            })
        } else {
            None
        }
    }

    /// All squares in rank-major order.
    pub fn squares(self) -> impl Iterator<Item = Coordinate> {
        (0..self.ranks).flat_map(move |rank| (0..self.files).map(move |file| Coordinate { file, rank }))
    }

    /// The up to eight squares touching `c`.
    pub fn neighbours(self, c: Coordinate) -> impl Iterator<Item = Coordinate> {
        const STEPS: [(i8, i8); 8] = [
            (-1, -1),
            (0, -1),
            (1, -1),
            (-1, 0),
            (1, 0),
            (-1, 1),
            (0, 1),
            (1, 1),
        ];
        STEPS
            .into_iter()
            .filter_map(move |(df, dr)| self.offset(c, df, dr))
    }
}

impl Default for Geometry {
    fn default() -> Self {
        Self::STANDARD
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn parse_standard() {
        let g = Geometry::STANDARD;
        let e4 = g.parse('e', '4').unwrap();
        assert_eq!(e4.file(), 4);
        assert_eq!(e4.rank(), 3);
        assert_eq!(e4.to_string(), "e4");
        assert_eq!(g.parse_str("h8").unwrap(), g.coordinate(7, 7).unwrap());
    }

    #[test]
    fn rejects_outside_alphabet() {
        let g = Geometry::STANDARD;
        assert!(!g.is_valid('i', '1'));
        assert!(!g.is_valid('a', '9'));
        assert!(!g.is_valid('A', '1'));
        assert!(!g.is_valid('a', '0'));
        assert!(matches!(
            g.parse('z', '1'),
            Err(CoordinateError::OutOfAlphabet { file: 'z', .. })
        ));
        assert!(g.parse_str("e").is_err());
        assert!(g.parse_str("e44").is_err());
    }

    #[test]
    fn wide_and_tall_boards() {
        let capablanca = Geometry::new(10, 8).unwrap();
        assert!(capablanca.is_valid('j', '8'));
        assert!(!capablanca.is_valid('k', '1'));

        let big = Geometry::new(16, 16).unwrap();
        let top = big.parse('p', 'G').unwrap();
        assert_eq!(top.rank(), 15);
        assert_eq!(top.to_string(), "pG");
    }

    #[test]
    fn invalid_geometry() {
        assert!(Geometry::new(0, 8).is_err());
        assert!(Geometry::new(8, 17).is_err());
    }

    #[test]
    fn offset_stays_on_board() {
        let g = Geometry::STANDARD;
        let a1 = g.parse_str("a1").unwrap();
        assert_eq!(g.offset(a1, -1, 0), None);
        assert_eq!(g.offset(a1, 1, 2), Some(g.parse_str("b3").unwrap()));
    }

    #[test]
    fn squares_are_rank_major() {
        let g = Geometry::new(3, 2).unwrap();
        let names: Vec<String> = g.squares().map(|c| c.to_string()).collect();
        assert_eq!(names, ["a1", "b1", "c1", "a2", "b2", "c2"]);
        let mut sorted = g.squares().collect::<Vec<_>>();
        sorted.sort();
        assert_eq!(sorted, g.squares().collect::<Vec<_>>());
    }

    #[test]
    fn neighbours_in_corner_and_centre() {
        let g = Geometry::STANDARD;
        assert_eq!(g.neighbours(g.parse_str("a1").unwrap()).count(), 3);
        assert_eq!(g.neighbours(g.parse_str("d4").unwrap()).count(), 8);
    }

    proptest! {
        #[test]
        fn validity_matches_alphabet_prefix(files in 1u8..=16, ranks in 1u8..=16, f in any::<char>(), r in any::<char>()) {
            let g = Geometry::new(files, ranks).unwrap();
            let expected = FILE_ALPHABET[..files as usize].contains(&(f as u32 as u8)) && f.is_ascii()
                && RANK_ALPHABET[..ranks as usize].contains(&(r as u32 as u8)) && r.is_ascii();
            prop_assert_eq!(g.is_valid(f, r), expected);
            prop_assert_eq!(g.parse(f, r).is_ok(), expected);
        }
    }
}
