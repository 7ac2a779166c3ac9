//! Board coordinates.

use std::fmt;

/// A file (column) on the chess board, from A to H.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(u8)]
pub enum File {
    A = 0,
    B = 1,
    C = 2,
    D = 3,
    E = 4,
    F = 5,
    G = 6,
    H = 7,
}

impl File {
    /// All files, a to h.
    pub const ALL: [File; 8] = [
        File::A,
        File::B,
        File::C,
        File::D,
        File::E,
        File::F,
        File::G,
        File::H,
    ];

    /// Creates a file from index (0-7).
    #[inline]
    pub const fn from_index(index: u8) -> Option<Self> {
        if index < 8 {
            Some(Self::ALL[index as usize])
        } else {
            None
        }
    }

    /// Creates a file from a letter ('a'-'h', either case).
    #[inline]
    pub const fn from_char(c: char) -> Option<Self> {
        let c = c.to_ascii_lowercase();
        if c >= 'a' && c <= 'h' {
            Self::from_index(c as u8 - b'a')
        } else {
            None
        }
    }

    #[inline]
    pub const fn index(self) -> u8 {
        self as u8
    }

    #[inline]
    pub const fn to_char(self) -> char {
        (b'a' + self as u8) as char
    }

    /// The file `delta` columns away, if it is on the board.
    #[inline]
    pub const fn offset(self, delta: i8) -> Option<Self> {
        let index = self as i8 + delta;
        if index < 0 {
            None
        } else {
            Self::from_index(index as u8)
        }
    }
}

impl fmt::Display for File {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_char())
    }
}

/// A rank (row) on the chess board, from 1 to 8.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(u8)]
pub enum Rank {
    R1 = 0,
    R2 = 1,
    R3 = 2,
    R4 = 3,
    R5 = 4,
    R6 = 5,
    R7 = 6,
    R8 = 7,
}

impl Rank {
    /// All ranks, 1 to 8.
    pub const ALL: [Rank; 8] = [
        Rank::R1,
        Rank::R2,
        Rank::R3,
        Rank::R4,
        Rank::R5,
        Rank::R6,
        Rank::R7,
        Rank::R8,
    ];

    /// Creates a rank from index (0-7).
    #[inline]
    pub const fn from_index(index: u8) -> Option<Self> {
        if index < 8 {
            Some(Self::ALL[index as usize])
        } else {
            None
        }
    }

    /// Creates a rank from a digit ('1'-'8').
    #[inline]
    pub const fn from_char(c: char) -> Option<Self> {
        if c >= '1' && c <= '8' {
            Self::from_index(c as u8 - b'1')
        } else {
            None
        }
    }

    #[inline]
    pub const fn index(self) -> u8 {
        self as u8
    }

    #[inline]
    pub const fn to_char(self) -> char {
        (b'1' + self as u8) as char
    }

    /// The rank `delta` rows away, if it is on the board.
    #[inline]
    pub const fn offset(self, delta: i8) -> Option<Self> {
        let index = self as i8 + delta;
        if index < 0 {
            None
        } else {
            Self::from_index(index as u8)
        }
    }
}

impl fmt::Display for Rank {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_char())
    }
}

/// A square on the chess board, indexed 0-63.
///
/// Squares are indexed in little-endian rank-file mapping:
/// - a1 = 0, b1 = 1, ..., h1 = 7
/// - a2 = 8, ..., h8 = 63
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Square(u8);

impl Square {
    #[inline]
    pub const fn new(file: File, rank: Rank) -> Self {
        Square(rank.index() * 8 + file.index())
    }

    #[inline]
    pub const fn from_index(index: u8) -> Option<Self> {
        if index < 64 {
            Some(Square(index))
        } else {
            None
        }
    }

    /// Parses a square from algebraic notation (e.g., "e4").
    pub const fn from_algebraic(s: &str) -> Option<Self> {
        let bytes = s.as_bytes();
        if bytes.len() != 2 {
            return None;
        }
        match (File::from_char(bytes[0] as char), Rank::from_char(bytes[1] as char)) {
            (Some(file), Some(rank)) => Some(Square::new(file, rank)),
            _ => None,
        }
    }

    /// Iterates a1, b1, ..., h8.
    pub fn all() -> impl DoubleEndedIterator<Item = Square> {
        (0..64).map(Square)
    }

    #[inline]
    pub const fn index(self) -> u8 {
        self.0
    }

    #[inline]
    pub const fn file(self) -> File {
        File::ALL[(self.0 % 8) as usize]
    }

    #[inline]
    pub const fn rank(self) -> Rank {
        Rank::ALL[(self.0 / 8) as usize]
    }

    pub fn to_algebraic(self) -> String {
        format!("{}{}", self.file(), self.rank())
    }

    /// The square `df` files and `dr` ranks away, if it is on the board.
    #[inline]
    pub const fn offset(self, df: i8, dr: i8) -> Option<Square> {
        match (self.file().offset(df), self.rank().offset(dr)) {
            (Some(file), Some(rank)) => Some(Square::new(file, rank)),
            _ => None,
        }
    }

    /// Light squares are those where file and rank parity differ (h1 is light).
    #[inline]
    pub const fn is_light(self) -> bool {
        (self.file().index() + self.rank().index()) % 2 == 1
    }

    /// Chebyshev distance: the number of king steps between two squares.
    #[inline]
    pub const fn distance(self, other: Square) -> u8 {
        let df = (self.file().index() as i8 - other.file().index() as i8).unsigned_abs();
        let dr = (self.rank().index() as i8 - other.rank().index() as i8).unsigned_abs();
        if df > dr {
            df
        } else {
            dr
        }
    }

    /// Returns true if the squares touch, including diagonally.
    #[inline]
    pub const fn is_adjacent(self, other: Square) -> bool {
        self.distance(other) == 1
    }

    /// Squares strictly between two squares on a shared rank, file or diagonal.
    ///
    /// Returns an empty list when the squares are not aligned.
    pub fn between(self, other: Square) -> Vec<Square> {
        let df = other.file().index() as i8 - self.file().index() as i8;
        let dr = other.rank().index() as i8 - self.rank().index() as i8;
        if self == other || (df != 0 && dr != 0 && df.abs() != dr.abs()) {
            return Vec::new();
        }
        let step = (df.signum(), dr.signum());
        let mut squares = Vec::new();
        let mut current = self.offset(step.0, step.1);
        while let Some(sq) = current {
            if sq == other {
                break;
            }
            squares.push(sq);
            current = sq.offset(step.0, step.1);
        }
        squares
    }

    pub const A1: Square = Square(0);
    pub const B1: Square = Square(1);
    pub const C1: Square = Square(2);
    pub const D1: Square = Square(3);
    pub const E1: Square = Square(4);
    pub const F1: Square = Square(5);
    pub const G1: Square = Square(6);
    pub const H1: Square = Square(7);
    pub const D4: Square = Square(27);
    pub const E4: Square = Square(28);
    pub const D5: Square = Square(35);
    pub const E5: Square = Square(36);
    pub const A8: Square = Square(56);
    pub const B8: Square = Square(57);
    pub const C8: Square = Square(58);
    pub const D8: Square = Square(59);
    pub const E8: Square = Square(60);
    pub const F8: Square = Square(61);
    pub const G8: Square = Square(62);
    pub const H8: Square = Square(63);
}

impl fmt::Debug for Square {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Square({})", self.to_algebraic())
    }
}

impl fmt::Display for Square {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.file(), self.rank())
    }
}

impl std::str::FromStr for Square {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Square::from_algebraic(s).ok_or_else(|| format!("invalid square '{s}'"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sq(s: &str) -> Square {
        Square::from_algebraic(s).unwrap()
    }

    #[test]
    fn square_new() {
        let e4 = Square::new(File::E, Rank::R4);
        assert_eq!(e4.file(), File::E);
        assert_eq!(e4.rank(), Rank::R4);
        assert_eq!(e4.index(), 28);
        assert_eq!(e4, Square::E4);
    }

    #[test]
    fn square_from_algebraic() {
        assert_eq!(Square::from_algebraic("a1"), Some(Square::A1));
        assert_eq!(Square::from_algebraic("H8"), Some(Square::H8));
        assert_eq!(Square::from_algebraic("i1"), None);
        assert_eq!(Square::from_algebraic("a9"), None);
        assert_eq!(Square::from_algebraic(""), None);
        assert!("e9".parse::<Square>().is_err());
    }

    #[test]
    fn square_to_algebraic() {
        assert_eq!(Square::A1.to_algebraic(), "a1");
        assert_eq!(Square::H8.to_string(), "h8");
    }

    #[test]
    fn offsets_stay_on_board() {
        assert_eq!(Square::A1.offset(1, 2), Some(sq("b3")));
        assert_eq!(Square::A1.offset(-1, 0), None);
        assert_eq!(Square::H8.offset(0, 1), None);
        assert_eq!(File::H.offset(1), None);
        assert_eq!(Rank::R1.offset(-1), None);
    }

    #[test]
    fn square_colors() {
        assert!(!Square::A1.is_light());
        assert!(Square::H1.is_light());
        assert!(sq("d1").is_light());
        assert!(!sq("e1").is_light());
    }

    #[test]
    fn adjacency() {
        assert!(sq("e4").is_adjacent(sq("d5")));
        assert!(sq("e4").is_adjacent(sq("e3")));
        assert!(!sq("e4").is_adjacent(sq("e4")));
        assert!(!sq("e4").is_adjacent(sq("g4")));
        assert_eq!(Square::A1.distance(Square::H8), 7);
    }

    #[test]
    fn between_aligned_squares() {
        assert_eq!(Square::E1.between(Square::H1), vec![Square::F1, Square::G1]);
        assert_eq!(Square::E1.between(Square::A1), vec![Square::D1, Square::C1, Square::B1]);
        assert_eq!(sq("a1").between(sq("d4")), vec![sq("b2"), sq("c3")]);
        assert!(sq("a1").between(sq("b3")).is_empty());
        assert!(sq("a1").between(sq("a2")).is_empty());
    }

    #[test]
    fn all_squares_in_order() {
        let squares: Vec<Square> = Square::all().collect();
        assert_eq!(squares.len(), 64);
        assert_eq!(squares[0], Square::A1);
        assert_eq!(squares[63], Square::H8);
    }

    proptest::proptest! {
        #[test]
        fn algebraic_round_trip(index in 0u8..64) {
            let square = Square::from_index(index).unwrap();
            proptest::prop_assert_eq!(Square::from_algebraic(&square.to_algebraic()), Some(square));
            proptest::prop_assert_eq!(Square::new(square.file(), square.rank()), square);
        }

        #[test]
        fn distance_is_symmetric(a in 0u8..64, b in 0u8..64) {
            let (a, b) = (Square::from_index(a).unwrap(), Square::from_index(b).unwrap());
            proptest::prop_assert_eq!(a.distance(b), b.distance(a));
            proptest::prop_assert_eq!(a.is_adjacent(b), a.distance(b) == 1);
        }
    }
}
