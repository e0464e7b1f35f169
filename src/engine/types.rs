use std::fmt;

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Color
// ---------------------------------------------------------------------------

/// The two sides in a chess game.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Color {
    White,
    Black,
}

impl Color {
    /// Index for array lookups: White=0, Black=1.
    #[inline]
    pub const fn index(self) -> usize {
        self as usize
    }

    /// FEN side-to-move letter.
    pub fn fen_char(self) -> char {
        match self {
            Color::White => 'w',
            Color::Black => 'b',
        }
    }

    /// Parse "white"/"black" (or "w"/"b"), case-insensitive.
    pub fn from_str_loose(s: &str) -> Option<Self> {
        match s.to_ascii_lowercase().as_str() {
            "white" | "w" => Some(Color::White),
            "black" | "b" => Some(Color::Black),
            _ => None,
        }
    }
}

impl std::ops::Not for Color {
    type Output = Self;
    fn not(self) -> Self {
        match self {
            Color::White => Color::Black,
            Color::Black => Color::White,
        }
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Color::White => write!(f, "white"),
            Color::Black => write!(f, "black"),
        }
    }
}

// ---------------------------------------------------------------------------
// PieceType
// ---------------------------------------------------------------------------

/// The six piece kinds.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PieceType {
    Pawn,
    Knight,
    Bishop,
    Rook,
    Queen,
    King,
}

impl PieceType {
    /// All piece types in order.
    pub const ALL: [PieceType; 6] = [
        PieceType::Pawn,
        PieceType::Knight,
        PieceType::Bishop,
        PieceType::Rook,
        PieceType::Queen,
        PieceType::King,
    ];

    /// Number of piece types.
    pub const COUNT: usize = 6;

    /// Index for array lookups: Pawn=0 .. King=5.
    #[inline]
    pub const fn index(self) -> usize {
        self as usize
    }

    /// Search value in centipawns. The king carries a sentinel large enough
    /// that no combination of other material outweighs it.
    pub fn value(self) -> i32 {
        match self {
            PieceType::Pawn => 100,
            PieceType::Knight => 320,
            PieceType::Bishop => 330,
            PieceType::Rook => 500,
            PieceType::Queen => 900,
            PieceType::King => 20_000,
        }
    }

    /// Classic 1/3/3/5/9 material points (king counts as 0).
    pub fn points(self) -> u32 {
        match self {
            PieceType::Pawn => 1,
            PieceType::Knight | PieceType::Bishop => 3,
            PieceType::Rook => 5,
            PieceType::Queen => 9,
            PieceType::King => 0,
        }
    }

    /// Lowercase letter used by FEN for black pieces.
    pub fn letter(self) -> char {
        match self {
            PieceType::Pawn => 'p',
            PieceType::Knight => 'n',
            PieceType::Bishop => 'b',
            PieceType::Rook => 'r',
            PieceType::Queen => 'q',
            PieceType::King => 'k',
        }
    }

    /// Parse a single piece letter, ignoring case.
    pub fn from_letter(c: char) -> Option<Self> {
        match c.to_ascii_lowercase() {
            'p' => Some(PieceType::Pawn),
            'n' => Some(PieceType::Knight),
            'b' => Some(PieceType::Bishop),
            'r' => Some(PieceType::Rook),
            'q' => Some(PieceType::Queen),
            'k' => Some(PieceType::King),
            _ => None,
        }
    }

    /// Whether a pawn may promote to this piece.
    pub fn is_promotion_target(self) -> bool {
        matches!(
            self,
            PieceType::Knight | PieceType::Bishop | PieceType::Rook | PieceType::Queen
        )
    }
}

impl fmt::Display for PieceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PieceType::Pawn => write!(f, "pawn"),
            PieceType::Knight => write!(f, "knight"),
            PieceType::Bishop => write!(f, "bishop"),
            PieceType::Rook => write!(f, "rook"),
            PieceType::Queen => write!(f, "queen"),
            PieceType::King => write!(f, "king"),
        }
    }
}

// ---------------------------------------------------------------------------
// Piece
// ---------------------------------------------------------------------------

/// A piece on the board. Pieces are values: capture and promotion replace
/// them, nothing mutates one in place.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Piece {
    pub kind: PieceType,
    pub color: Color,
}

impl Piece {
    #[inline]
    pub const fn new(color: Color, kind: PieceType) -> Self {
        Piece { kind, color }
    }

    /// FEN letter: uppercase for white, lowercase for black.
    pub fn to_char(self) -> char {
        match self.color {
            Color::White => self.kind.letter().to_ascii_uppercase(),
            Color::Black => self.kind.letter(),
        }
    }

    /// Parse a FEN piece letter; case decides the color.
    pub fn from_char(c: char) -> Option<Self> {
        let kind = PieceType::from_letter(c)?;
        let color = if c.is_ascii_uppercase() {
            Color::White
        } else {
            Color::Black
        };
        Some(Piece { kind, color })
    }
}

impl fmt::Display for Piece {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.color, self.kind)
    }
}

// ---------------------------------------------------------------------------
// Square
// ---------------------------------------------------------------------------

/// A square on the chess board (0..63, LERF: a1=0, h8=63).
///
/// File 0..7 is 'a'..'h', rank 0..7 is '1'..'8'. Externally a square is
/// always its algebraic name.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub struct Square(pub u8);

impl Square {
    pub const NUM: usize = 64;

    /// Caller contract: `index < 64`.
    #[inline]
    pub fn new(index: u8) -> Self {
        debug_assert!(index < 64, "Square index out of range: {index}");
        Square(index)
    }

    #[inline]
    pub fn file(self) -> u8 {
        self.0 & 7
    }

    #[inline]
    pub fn rank(self) -> u8 {
        self.0 >> 3
    }

    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }

    /// Caller contract: `file < 8 && rank < 8`.
    #[inline]
    pub fn from_file_rank(file: u8, rank: u8) -> Self {
        debug_assert!(file < 8 && rank < 8);
        Square(rank * 8 + file)
    }

    /// The square `df` files and `dr` ranks away, if it is on the board.
    #[inline]
    pub fn offset(self, df: i8, dr: i8) -> Option<Self> {
        let file = self.file() as i8 + df;
        let rank = self.rank() as i8 + dr;
        if (0..8).contains(&file) && (0..8).contains(&rank) {
            Some(Square::from_file_rank(file as u8, rank as u8))
        } else {
            None
        }
    }

    /// Parse algebraic notation like "e4". Anything not matching
    /// `^[a-h][1-8]$` is rejected.
    pub fn from_algebraic(s: &str) -> Option<Self> {
        let bytes = s.as_bytes();
        if bytes.len() != 2 {
            return None;
        }
        let file = bytes[0].wrapping_sub(b'a');
        let rank = bytes[1].wrapping_sub(b'1');
        if file < 8 && rank < 8 {
            Some(Square::from_file_rank(file, rank))
        } else {
            None
        }
    }

    /// Convert to algebraic notation like "e4".
    pub fn to_algebraic(self) -> String {
        let file = (b'a' + self.file()) as char;
        let rank = (b'1' + self.rank()) as char;
        format!("{file}{rank}")
    }

    /// Whether this is a light square (h1 is light).
    pub fn is_light(self) -> bool {
        (self.file() + self.rank()) % 2 == 1
    }

    /// Iterate all 64 squares from a1 to h8.
    pub fn all() -> impl Iterator<Item = Square> {
        (0..64u8).map(Square)
    }
}

impl fmt::Display for Square {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_algebraic())
    }
}

impl From<Square> for String {
    fn from(sq: Square) -> Self {
        sq.to_algebraic()
    }
}

impl TryFrom<String> for Square {
    type Error = ChessError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Square::from_algebraic(&s).ok_or(ChessError::InvalidSquare(s))
    }
}

impl std::str::FromStr for Square {
    type Err = ChessError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Square::from_algebraic(s).ok_or_else(|| ChessError::InvalidSquare(s.to_string()))
    }
}

// ---------------------------------------------------------------------------
// MoveFlags
// ---------------------------------------------------------------------------

/// Flags for special move types packed in a single byte.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct MoveFlags(pub u8);

impl MoveFlags {
    pub const NONE: MoveFlags = MoveFlags(0);
    pub const CAPTURE: MoveFlags = MoveFlags(1);
    pub const EN_PASSANT: MoveFlags = MoveFlags(2);
    pub const CASTLING: MoveFlags = MoveFlags(4);
    pub const DOUBLE_PUSH: MoveFlags = MoveFlags(8);

    #[inline]
    pub fn is_capture(self) -> bool {
        self.0 & Self::CAPTURE.0 != 0
    }

    #[inline]
    pub fn is_en_passant(self) -> bool {
        self.0 & Self::EN_PASSANT.0 != 0
    }

    #[inline]
    pub fn is_castling(self) -> bool {
        self.0 & Self::CASTLING.0 != 0
    }

    #[inline]
    pub fn is_double_push(self) -> bool {
        self.0 & Self::DOUBLE_PUSH.0 != 0
    }
}

impl std::ops::BitOr for MoveFlags {
    type Output = Self;
    #[inline]
    fn bitor(self, rhs: Self) -> Self {
        MoveFlags(self.0 | rhs.0)
    }
}

// ---------------------------------------------------------------------------
// Move
// ---------------------------------------------------------------------------

/// A chess move: from-square, to-square, optional promotion, and flags.
///
/// Flags are filled in by the move generator; two moves name the same
/// action when `from`, `to` and `promotion` agree.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
pub struct Move {
    pub from: Square,
    pub to: Square,
    pub promotion: Option<PieceType>,
    #[serde(skip)]
    pub flags: MoveFlags,
}

impl Move {
    pub fn new(from: Square, to: Square) -> Self {
        Move {
            from,
            to,
            promotion: None,
            flags: MoveFlags::NONE,
        }
    }

    pub fn with_flags(from: Square, to: Square, flags: MoveFlags) -> Self {
        Move {
            from,
            to,
            promotion: None,
            flags,
        }
    }

    pub fn with_promotion(
        from: Square,
        to: Square,
        promotion: PieceType,
        flags: MoveFlags,
    ) -> Self {
        Move {
            from,
            to,
            promotion: Some(promotion),
            flags,
        }
    }

    /// Same origin and destination, ignoring promotion and flags.
    #[inline]
    pub fn same_squares(&self, other: &Move) -> bool {
        self.from == other.from && self.to == other.to
    }
}

impl fmt::Display for Move {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.from, self.to)?;
        if let Some(promo) = self.promotion {
            write!(f, "={}", promo.letter())?;
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// CastlingRights
// ---------------------------------------------------------------------------

/// Castling availability bitfield: bits 0-3 = WK, WQ, BK, BQ.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct CastlingRights(pub u8);

impl CastlingRights {
    pub const NONE: CastlingRights = CastlingRights(0);
    pub const WHITE_KINGSIDE: u8 = 1;
    pub const WHITE_QUEENSIDE: u8 = 2;
    pub const BLACK_KINGSIDE: u8 = 4;
    pub const BLACK_QUEENSIDE: u8 = 8;
    pub const ALL: CastlingRights = CastlingRights(0b1111);

    #[inline]
    pub fn has(self, flag: u8) -> bool {
        self.0 & flag != 0
    }

    #[inline]
    pub fn remove(&mut self, flag: u8) {
        self.0 &= !flag;
    }

    #[inline]
    pub fn can_castle_kingside(self, color: Color) -> bool {
        match color {
            Color::White => self.has(Self::WHITE_KINGSIDE),
            Color::Black => self.has(Self::BLACK_KINGSIDE),
        }
    }

    #[inline]
    pub fn can_castle_queenside(self, color: Color) -> bool {
        match color {
            Color::White => self.has(Self::WHITE_QUEENSIDE),
            Color::Black => self.has(Self::BLACK_QUEENSIDE),
        }
    }

    /// Parse FEN castling string (e.g. "KQkq", "-", "Kq").
    pub fn from_fen(s: &str) -> Option<Self> {
        if s == "-" {
            return Some(CastlingRights::NONE);
        }
        let mut rights = 0u8;
        for c in s.chars() {
            match c {
                'K' => rights |= Self::WHITE_KINGSIDE,
                'Q' => rights |= Self::WHITE_QUEENSIDE,
                'k' => rights |= Self::BLACK_KINGSIDE,
                'q' => rights |= Self::BLACK_QUEENSIDE,
                _ => return None,
            }
        }
        Some(CastlingRights(rights))
    }

    /// Convert to FEN castling string.
    pub fn to_fen(self) -> String {
        if self.0 == 0 {
            return "-".to_string();
        }
        let mut s = String::with_capacity(4);
        if self.has(Self::WHITE_KINGSIDE) {
            s.push('K');
        }
        if self.has(Self::WHITE_QUEENSIDE) {
            s.push('Q');
        }
        if self.has(Self::BLACK_KINGSIDE) {
            s.push('k');
        }
        if self.has(Self::BLACK_QUEENSIDE) {
            s.push('q');
        }
        s
    }
}

impl fmt::Display for CastlingRights {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_fen())
    }
}

// ---------------------------------------------------------------------------
// RuleSet
// ---------------------------------------------------------------------------

/// Which rules the engine enforces.
///
/// `Minimal` has no castling, no en passant and no promotion: a pawn on the
/// last rank stays a pawn. `Standard` adds all three.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RuleSet {
    #[default]
    Minimal,
    Standard,
}

impl RuleSet {
    pub fn from_str_loose(s: &str) -> Option<Self> {
        match s.to_ascii_lowercase().as_str() {
            "minimal" => Some(RuleSet::Minimal),
            "standard" | "fide" => Some(RuleSet::Standard),
            _ => None,
        }
    }

    #[inline]
    pub fn is_standard(self) -> bool {
        self == RuleSet::Standard
    }
}

impl fmt::Display for RuleSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RuleSet::Minimal => write!(f, "minimal"),
            RuleSet::Standard => write!(f, "standard"),
        }
    }
}

// ---------------------------------------------------------------------------
// GameStatus & Difficulty
// ---------------------------------------------------------------------------

/// Current status of a game. Always derived from the board and history.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum GameStatus {
    Active,
    Check,
    Checkmate,
    Stalemate,
    Draw(DrawReason),
}

impl GameStatus {
    pub fn as_str(&self) -> &str {
        match self {
            GameStatus::Active => "active",
            GameStatus::Check => "check",
            GameStatus::Checkmate => "checkmate",
            GameStatus::Stalemate => "stalemate",
            GameStatus::Draw(reason) => reason.as_str(),
        }
    }

    pub fn is_game_over(&self) -> bool {
        matches!(
            self,
            GameStatus::Checkmate | GameStatus::Stalemate | GameStatus::Draw(_)
        )
    }

    /// Stalemate counts as a draw.
    pub fn is_draw(&self) -> bool {
        matches!(self, GameStatus::Stalemate | GameStatus::Draw(_))
    }
}

impl fmt::Display for GameStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Reason for a draw other than stalemate.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DrawReason {
    InsufficientMaterial,
    ThreefoldRepetition,
}

impl DrawReason {
    pub fn as_str(&self) -> &str {
        match self {
            DrawReason::InsufficientMaterial => "insufficient_material",
            DrawReason::ThreefoldRepetition => "threefold_repetition",
        }
    }
}

/// AI difficulty levels 1..6.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    Beginner = 1,
    Amateur = 2,
    #[default]
    Intermediate = 3,
    Advanced = 4,
    Expert = 5,
    Master = 6,
}

impl Difficulty {
    pub const ALL: [Difficulty; 6] = [
        Difficulty::Beginner,
        Difficulty::Amateur,
        Difficulty::Intermediate,
        Difficulty::Advanced,
        Difficulty::Expert,
        Difficulty::Master,
    ];

    /// Numeric level 1..6.
    #[inline]
    pub fn level(self) -> u8 {
        self as u8
    }

    pub fn from_level(level: u8) -> Option<Self> {
        Self::ALL.get((level as usize).checked_sub(1)?).copied()
    }

    /// Parse a level number or name (case-insensitive).
    pub fn from_str_loose(s: &str) -> Option<Self> {
        if let Ok(level) = s.trim().parse::<u8>() {
            return Self::from_level(level);
        }
        match s.trim().to_lowercase().as_str() {
            "beginner" => Some(Difficulty::Beginner),
            "amateur" => Some(Difficulty::Amateur),
            "intermediate" => Some(Difficulty::Intermediate),
            "advanced" => Some(Difficulty::Advanced),
            "expert" => Some(Difficulty::Expert),
            "master" => Some(Difficulty::Master),
            _ => None,
        }
    }

    /// Search depth for minimax: level + 1.
    pub fn depth(self) -> u32 {
        self.level() as u32 + 1
    }

    /// Levels up to Intermediate add evaluation noise.
    pub fn is_noisy(self) -> bool {
        self.level() <= 3
    }

    /// Amplitude of the evaluation noise in centipawns.
    pub fn noise_amplitude(self) -> f64 {
        if self.is_noisy() {
            f64::from(5 - self.level()) * 20.0
        } else {
            0.0
        }
    }
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Difficulty::Beginner => write!(f, "beginner"),
            Difficulty::Amateur => write!(f, "amateur"),
            Difficulty::Intermediate => write!(f, "intermediate"),
            Difficulty::Advanced => write!(f, "advanced"),
            Difficulty::Expert => write!(f, "expert"),
            Difficulty::Master => write!(f, "master"),
        }
    }
}

// ---------------------------------------------------------------------------
// ChessError
// ---------------------------------------------------------------------------

/// Domain errors for the chess engine.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ChessError {
    #[error("invalid square notation: {0:?}")]
    InvalidSquare(String),

    #[error("no piece on {0}")]
    EmptySquare(Square),

    #[error("piece on {square} belongs to {color}, but it is {turn}'s turn")]
    WrongTurn {
        square: Square,
        color: Color,
        turn: Color,
    },

    #[error("{piece} on {from} cannot move to {to}")]
    IllegalMove {
        piece: PieceType,
        from: Square,
        to: Square,
    },

    #[error("{to} is occupied by a piece of the moving side")]
    OwnPieceCapture { to: Square },

    #[error("{from}{to} would leave the king in check")]
    LeavesKingInCheck { from: Square, to: Square },

    #[error("invalid promotion piece: {0}")]
    InvalidPromotion(String),

    #[error("invalid FEN string: {0}")]
    InvalidFen(String),

    #[error("invalid SAN move: {0}")]
    InvalidSan(String),

    #[error("no moves to undo")]
    NothingToUndo,
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn color_toggle() {
        assert_eq!(!Color::White, Color::Black);
        assert_eq!(!Color::Black, Color::White);
    }

    #[test]
    fn color_display_and_parse() {
        assert_eq!(Color::White.to_string(), "white");
        assert_eq!(Color::from_str_loose("BLACK"), Some(Color::Black));
        assert_eq!(Color::from_str_loose("w"), Some(Color::White));
        assert_eq!(Color::from_str_loose("red"), None);
    }

    #[test]
    fn piece_values() {
        assert_eq!(PieceType::Pawn.value(), 100);
        assert_eq!(PieceType::Knight.value(), 320);
        assert_eq!(PieceType::Bishop.value(), 330);
        assert_eq!(PieceType::Rook.value(), 500);
        assert_eq!(PieceType::Queen.value(), 900);
        assert_eq!(PieceType::King.value(), 20_000);
    }

    #[test]
    fn piece_points() {
        let total: u32 = [
            PieceType::Pawn,
            PieceType::Knight,
            PieceType::Bishop,
            PieceType::Rook,
            PieceType::Queen,
            PieceType::King,
        ]
        .iter()
        .map(|pt| pt.points())
        .sum();
        assert_eq!(total, 1 + 3 + 3 + 5 + 9);
    }

    #[test]
    fn piece_char_round_trip() {
        for pt in PieceType::ALL {
            for color in [Color::White, Color::Black] {
                let piece = Piece::new(color, pt);
                let c = piece.to_char();
                assert_eq!(c.is_ascii_uppercase(), color == Color::White);
                assert_eq!(Piece::from_char(c), Some(piece));
            }
        }
        assert_eq!(Piece::from_char('x'), None);
        assert_eq!(Piece::from_char('1'), None);
    }

    #[test]
    fn square_from_algebraic() {
        assert_eq!(Square::from_algebraic("a1"), Some(Square(0)));
        assert_eq!(Square::from_algebraic("h1"), Some(Square(7)));
        assert_eq!(Square::from_algebraic("a8"), Some(Square(56)));
        assert_eq!(Square::from_algebraic("h8"), Some(Square(63)));
        assert_eq!(Square::from_algebraic("e4"), Some(Square(28)));
    }

    #[test]
    fn square_from_algebraic_invalid() {
        for bad in ["", "a", "a9", "i1", "abc", "A1", "e0", " e4"] {
            assert_eq!(Square::from_algebraic(bad), None, "{bad:?} should be rejected");
        }
    }

    #[test]
    fn square_algebraic_round_trip() {
        for sq in Square::all() {
            assert_eq!(Square::from_algebraic(&sq.to_algebraic()), Some(sq));
        }
    }

    #[test]
    fn square_offset_stays_on_board() {
        let a1 = Square::from_algebraic("a1").unwrap();
        assert_eq!(a1.offset(-1, 0), None);
        assert_eq!(a1.offset(0, -1), None);
        assert_eq!(a1.offset(1, 2), Square::from_algebraic("b3"));
        let h8 = Square::from_algebraic("h8").unwrap();
        assert_eq!(h8.offset(1, 0), None);
        assert_eq!(h8.offset(-7, -7), Some(a1));
    }

    #[test]
    fn square_colors() {
        assert!(!Square::from_algebraic("a1").unwrap().is_light());
        assert!(Square::from_algebraic("h1").unwrap().is_light());
    }

    #[test]
    fn square_serializes_as_algebraic() {
        let e4 = Square::from_algebraic("e4").unwrap();
        assert_eq!(serde_json::to_string(&e4).unwrap(), "\"e4\"");
        let back: Square = serde_json::from_str("\"e4\"").unwrap();
        assert_eq!(back, e4);
        assert!(serde_json::from_str::<Square>("\"z9\"").is_err());
    }

    #[test]
    fn move_display() {
        let m = Move::new(
            Square::from_algebraic("e2").unwrap(),
            Square::from_algebraic("e4").unwrap(),
        );
        assert_eq!(m.to_string(), "e2e4");

        let promo = Move::with_promotion(
            Square::from_algebraic("e7").unwrap(),
            Square::from_algebraic("e8").unwrap(),
            PieceType::Queen,
            MoveFlags::NONE,
        );
        assert_eq!(promo.to_string(), "e7e8=q");
    }

    #[test]
    fn move_flags() {
        let flags = MoveFlags::CAPTURE | MoveFlags::EN_PASSANT;
        assert!(flags.is_capture());
        assert!(flags.is_en_passant());
        assert!(!flags.is_castling());
        assert!(!flags.is_double_push());
    }

    #[test]
    fn castling_rights_fen_round_trip() {
        for s in ["-", "K", "Kq", "KQkq", "kq", "Q"] {
            let cr = CastlingRights::from_fen(s).unwrap();
            assert_eq!(cr.to_fen(), s);
        }
        assert_eq!(CastlingRights::from_fen("X"), None);
    }

    #[test]
    fn castling_rights_flags() {
        let mut cr = CastlingRights::ALL;
        cr.remove(CastlingRights::WHITE_KINGSIDE);
        assert!(!cr.can_castle_kingside(Color::White));
        assert!(cr.can_castle_queenside(Color::White));
        assert!(cr.can_castle_kingside(Color::Black));
    }

    #[test]
    fn rule_set_parse() {
        assert_eq!(RuleSet::default(), RuleSet::Minimal);
        assert_eq!(RuleSet::from_str_loose("Standard"), Some(RuleSet::Standard));
        assert_eq!(RuleSet::from_str_loose("minimal"), Some(RuleSet::Minimal));
        assert_eq!(RuleSet::from_str_loose("chess960"), None);
    }

    #[test]
    fn game_status_strings() {
        assert_eq!(GameStatus::Active.as_str(), "active");
        assert_eq!(GameStatus::Checkmate.as_str(), "checkmate");
        assert_eq!(
            GameStatus::Draw(DrawReason::ThreefoldRepetition).as_str(),
            "threefold_repetition"
        );
    }

    #[test]
    fn game_status_predicates() {
        assert!(!GameStatus::Check.is_game_over());
        assert!(GameStatus::Checkmate.is_game_over());
        assert!(!GameStatus::Checkmate.is_draw());
        assert!(GameStatus::Stalemate.is_draw());
        assert!(GameStatus::Draw(DrawReason::InsufficientMaterial).is_draw());
    }

    #[test]
    fn difficulty_depth_mapping() {
        let depths: Vec<u32> = Difficulty::ALL.iter().map(|d| d.depth()).collect();
        assert_eq!(depths, vec![2, 3, 4, 5, 6, 7]);
    }

    #[test]
    fn difficulty_levels() {
        assert_eq!(Difficulty::from_level(0), None);
        assert_eq!(Difficulty::from_level(7), None);
        assert_eq!(Difficulty::from_level(4), Some(Difficulty::Advanced));
        assert_eq!(Difficulty::from_str_loose("6"), Some(Difficulty::Master));
        assert_eq!(Difficulty::from_str_loose("Expert"), Some(Difficulty::Expert));
        assert_eq!(Difficulty::from_str_loose("godlike"), None);
        assert_eq!(Difficulty::default(), Difficulty::Intermediate);
    }

    #[test]
    fn difficulty_noise() {
        assert_eq!(Difficulty::Beginner.noise_amplitude(), 80.0);
        assert_eq!(Difficulty::Intermediate.noise_amplitude(), 40.0);
        assert_eq!(Difficulty::Advanced.noise_amplitude(), 0.0);
        assert!(!Difficulty::Master.is_noisy());
    }

    #[test]
    fn chess_error_messages() {
        let err = ChessError::InvalidSquare("z9".into());
        assert_eq!(err.to_string(), "invalid square notation: \"z9\"");
        assert_eq!(ChessError::NothingToUndo.to_string(), "no moves to undo");
    }
}
