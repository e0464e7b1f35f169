//! Mailbox board representation.
//!
//! `Board` stores piece placement as 64 optional pieces (LERF order), the
//! side to move, castling rights and the en-passant target. It is `Copy`:
//! a snapshot is a fixed-size array copy, which is what the search uses to
//! give every node its own private board.
//!
//! The board knows nothing about move legality. Generation and application
//! live in `movegen`, check detection in `attacks`.

use crate::engine::attacks;
use crate::engine::types::{CastlingRights, ChessError, Color, Piece, PieceType, RuleSet, Square};
use crate::engine::zobrist;

/// FEN of the standard starting position.
pub const START_FEN: &str = "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1";

// ---------------------------------------------------------------------------
// Board
// ---------------------------------------------------------------------------

/// A chess position: placement plus the state needed to generate moves.
///
/// Board layout follows LERF (Little-Endian Rank-File) mapping:
/// a1 = 0, b1 = 1, … h1 = 7, a2 = 8, … h8 = 63.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Board {
    squares: [Option<Piece>; 64],

    /// Whose turn it is.
    pub side_to_move: Color,

    /// Castling availability (K/Q/k/q). Always empty under `RuleSet::Minimal`.
    pub castling_rights: CastlingRights,

    /// En-passant target square (the square *behind* the double-pushed pawn).
    pub en_passant: Option<Square>,

    /// Rule variant this board is played under.
    pub rules: RuleSet,
}

// ---------------------------------------------------------------------------
// Construction and primitives
// ---------------------------------------------------------------------------

impl Board {
    /// An empty board, white to move.
    pub fn empty(rules: RuleSet) -> Self {
        Board {
            squares: [None; 64],
            side_to_move: Color::White,
            castling_rights: CastlingRights::NONE,
            en_passant: None,
            rules,
        }
    }

    /// Standard starting position.
    pub fn starting(rules: RuleSet) -> Self {
        const BACK_RANK: [PieceType; 8] = [
            PieceType::Rook,
            PieceType::Knight,
            PieceType::Bishop,
            PieceType::Queen,
            PieceType::King,
            PieceType::Bishop,
            PieceType::Knight,
            PieceType::Rook,
        ];

        let mut board = Board::empty(rules);
        for (file, &kind) in BACK_RANK.iter().enumerate() {
            let file = file as u8;
            board.set(Square::from_file_rank(file, 0), Some(Piece::new(Color::White, kind)));
            board.set(
                Square::from_file_rank(file, 1),
                Some(Piece::new(Color::White, PieceType::Pawn)),
            );
            board.set(
                Square::from_file_rank(file, 6),
                Some(Piece::new(Color::Black, PieceType::Pawn)),
            );
            board.set(Square::from_file_rank(file, 7), Some(Piece::new(Color::Black, kind)));
        }
        if rules.is_standard() {
            board.castling_rights = CastlingRights::ALL;
        }
        board
    }

    /// What piece (if any) is on a given square?
    #[inline]
    pub fn get(&self, sq: Square) -> Option<Piece> {
        self.squares[sq.index()]
    }

    /// Put a piece on a square, or empty it with `None`.
    #[inline]
    pub fn set(&mut self, sq: Square, piece: Option<Piece>) {
        self.squares[sq.index()] = piece;
    }

    /// Empty a square, returning what was there.
    #[inline]
    pub fn clear(&mut self, sq: Square) -> Option<Piece> {
        self.squares[sq.index()].take()
    }

    /// Iterate occupied squares from a1 to h8.
    pub fn pieces(&self) -> impl Iterator<Item = (Square, Piece)> + '_ {
        self.squares
            .iter()
            .enumerate()
            .filter_map(|(i, p)| p.map(|piece| (Square(i as u8), piece)))
    }

    /// Number of pieces on the board, both colors.
    pub fn piece_count(&self) -> usize {
        self.squares.iter().filter(|p| p.is_some()).count()
    }

    /// Find the king square for the given color, if it has one.
    pub fn king_square(&self, color: Color) -> Option<Square> {
        let king = Piece::new(color, PieceType::King);
        self.pieces()
            .find_map(|(sq, piece)| (piece == king).then_some(sq))
    }

    /// Full Zobrist fingerprint of placement, side to move, castling rights
    /// and en-passant file.
    pub fn zobrist(&self) -> u64 {
        let zk = zobrist::keys();
        let mut hash = 0u64;

        for (sq, piece) in self.pieces() {
            hash ^= zk.piece_key(piece.color, piece.kind, sq);
        }
        if self.side_to_move == Color::Black {
            hash ^= zk.side_to_move;
        }
        hash ^= zk.castling_key(self.castling_rights.0);
        if let Some(ep_sq) = self.en_passant {
            hash ^= zk.ep_key(ep_sq.file());
        }
        hash
    }

    // -----------------------------------------------------------------------
    // Views
    // -----------------------------------------------------------------------

    /// 8×8 array, rank 8 first, files a..h left to right.
    pub fn board_array(&self) -> [[Option<Piece>; 8]; 8] {
        let mut rows = [[None; 8]; 8];
        for (row, cells) in rows.iter_mut().enumerate() {
            let rank = 7 - row as u8;
            for (file, cell) in cells.iter_mut().enumerate() {
                *cell = self.get(Square::from_file_rank(file as u8, rank));
            }
        }
        rows
    }

    /// Render the board as an 8-line string (rank 8 at top).
    pub fn board_string(&self) -> String {
        let mut s = String::with_capacity(200);
        for rank in (0..8).rev() {
            s.push((b'1' + rank) as char);
            s.push(' ');
            for file in 0..8 {
                let ch = match self.get(Square::from_file_rank(file, rank)) {
                    Some(piece) => piece.to_char(),
                    None => '.',
                };
                s.push(ch);
                if file < 7 {
                    s.push(' ');
                }
            }
            s.push('\n');
        }
        s.push_str("  a b c d e f g h");
        s
    }
}

// ---------------------------------------------------------------------------
// FEN parsing & generation
// ---------------------------------------------------------------------------

impl Board {
    /// Parse a FEN string into a `Board` under the given rules.
    ///
    /// All six fields are validated and each side must have exactly one king.
    /// The two counters are checked for syntax only; under
    /// `RuleSet::Minimal` the castling and en-passant fields are dropped.
    pub fn from_fen(fen: &str, rules: RuleSet) -> Result<Self, ChessError> {
        let fields: Vec<&str> = fen.split_whitespace().collect();
        if fields.len() != 6 {
            return Err(ChessError::InvalidFen(format!(
                "expected 6 fields, got {}",
                fields.len()
            )));
        }

        let mut board = Board::empty(rules);

        // ----- Field 1: Piece placement -----
        let ranks: Vec<&str> = fields[0].split('/').collect();
        if ranks.len() != 8 {
            return Err(ChessError::InvalidFen(format!(
                "expected 8 ranks, got {}",
                ranks.len()
            )));
        }

        for (rank_idx, rank_str) in ranks.iter().enumerate() {
            let rank = 7 - rank_idx as u8;
            let mut file: u8 = 0;
            for ch in rank_str.chars() {
                if file > 7 {
                    return Err(ChessError::InvalidFen(format!(
                        "too many squares in rank {}",
                        rank + 1
                    )));
                }
                if let Some(digit) = ch.to_digit(10) {
                    if !(1..=8).contains(&digit) {
                        return Err(ChessError::InvalidFen(format!(
                            "invalid empty count '{ch}' in rank {}",
                            rank + 1
                        )));
                    }
                    file += digit as u8;
                } else if let Some(piece) = Piece::from_char(ch) {
                    board.set(Square::from_file_rank(file, rank), Some(piece));
                    file += 1;
                } else {
                    return Err(ChessError::InvalidFen(format!(
                        "invalid character '{ch}' in piece placement"
                    )));
                }
            }
            if file != 8 {
                return Err(ChessError::InvalidFen(format!(
                    "rank {} has {} squares instead of 8",
                    rank + 1,
                    file
                )));
            }
        }

        for color in [Color::White, Color::Black] {
            let king = Piece::new(color, PieceType::King);
            let king_count = board.pieces().filter(|&(_, p)| p == king).count();
            if king_count != 1 {
                return Err(ChessError::InvalidFen(format!(
                    "{color} has {king_count} kings (expected 1)"
                )));
            }
        }

        // ----- Field 2: Side to move -----
        board.side_to_move = match fields[1] {
            "w" => Color::White,
            "b" => Color::Black,
            other => {
                return Err(ChessError::InvalidFen(format!(
                    "invalid side to move: '{other}'"
                )));
            }
        };

        // The side that just moved cannot have left its own king attacked.
        if attacks::in_check(&board, !board.side_to_move) {
            return Err(ChessError::InvalidFen(
                "side not to move is in check".to_string(),
            ));
        }

        // ----- Field 3: Castling availability -----
        let castling = CastlingRights::from_fen(fields[2]).ok_or_else(|| {
            ChessError::InvalidFen(format!("invalid castling string: '{}'", fields[2]))
        })?;

        // ----- Field 4: En passant target square -----
        let mut en_passant = None;
        if fields[3] != "-" {
            let ep_sq = Square::from_algebraic(fields[3]).ok_or_else(|| {
                ChessError::InvalidFen(format!("invalid en passant square: '{}'", fields[3]))
            })?;
            let rank = ep_sq.rank();
            if rank != 2 && rank != 5 {
                return Err(ChessError::InvalidFen(format!(
                    "en passant square {} is not on rank 3 or 6",
                    fields[3]
                )));
            }
            en_passant = Some(ep_sq);
        }

        if rules.is_standard() {
            board.castling_rights = board.sanitize_castling(castling);
            board.en_passant = en_passant;
        }

        // ----- Fields 5-6: counters (validated, not stored) -----
        fields[4].parse::<u16>().map_err(|_| {
            ChessError::InvalidFen(format!("invalid halfmove clock: '{}'", fields[4]))
        })?;
        let fullmove = fields[5].parse::<u16>().map_err(|_| {
            ChessError::InvalidFen(format!("invalid fullmove number: '{}'", fields[5]))
        })?;
        if fullmove == 0 {
            return Err(ChessError::InvalidFen(
                "fullmove number must be >= 1".to_string(),
            ));
        }

        Ok(board)
    }

    /// Drop castling rights whose king or rook is not on its home square.
    fn sanitize_castling(&self, mut rights: CastlingRights) -> CastlingRights {
        let checks = [
            (CastlingRights::WHITE_KINGSIDE, Color::White, 4, 7),
            (CastlingRights::WHITE_QUEENSIDE, Color::White, 4, 0),
            (CastlingRights::BLACK_KINGSIDE, Color::Black, 60, 63),
            (CastlingRights::BLACK_QUEENSIDE, Color::Black, 60, 56),
        ];
        for (flag, color, king_sq, rook_sq) in checks {
            let king_home = self.get(Square(king_sq)) == Some(Piece::new(color, PieceType::King));
            let rook_home = self.get(Square(rook_sq)) == Some(Piece::new(color, PieceType::Rook));
            if !(king_home && rook_home) {
                rights.remove(flag);
            }
        }
        rights
    }

    /// The first four FEN fields: placement, side, castling, en passant.
    ///
    /// Two positions with the same key are the same position for repetition
    /// purposes.
    pub fn position_key(&self) -> String {
        let mut fen = String::with_capacity(72);

        // ----- Field 1: Piece placement -----
        for rank in (0..8).rev() {
            let mut empty_count = 0u8;
            for file in 0..8 {
                match self.get(Square::from_file_rank(file, rank)) {
                    Some(piece) => {
                        if empty_count > 0 {
                            fen.push((b'0' + empty_count) as char);
                            empty_count = 0;
                        }
                        fen.push(piece.to_char());
                    }
                    None => empty_count += 1,
                }
            }
            if empty_count > 0 {
                fen.push((b'0' + empty_count) as char);
            }
            if rank > 0 {
                fen.push('/');
            }
        }

        // ----- Field 2: Side to move -----
        fen.push(' ');
        fen.push(self.side_to_move.fen_char());

        // ----- Field 3: Castling -----
        fen.push(' ');
        fen.push_str(&self.castling_rights.to_fen());

        // ----- Field 4: En passant -----
        fen.push(' ');
        match self.en_passant {
            Some(sq) => fen.push_str(&sq.to_algebraic()),
            None => fen.push('-'),
        }

        fen
    }

    /// Export the position as a FEN string. The halfmove clock is always 0.
    pub fn to_fen(&self, fullmove_number: usize) -> String {
        format!("{} 0 {fullmove_number}", self.position_key())
    }
}

impl Default for Board {
    fn default() -> Self {
        Board::starting(RuleSet::default())
    }
}

impl std::fmt::Display for Board {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.board_string())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn sq(name: &str) -> Square {
        Square::from_algebraic(name).unwrap()
    }

    // ===================================================================
    // Starting position
    // ===================================================================

    #[test]
    fn starting_position_fen_standard() {
        let board = Board::starting(RuleSet::Standard);
        assert_eq!(board.to_fen(1), START_FEN);
    }

    #[test]
    fn starting_position_fen_minimal() {
        let board = Board::starting(RuleSet::Minimal);
        assert_eq!(
            board.to_fen(1),
            "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w - - 0 1"
        );
    }

    #[test]
    fn starting_position_pieces() {
        let board = Board::starting(RuleSet::Minimal);
        assert_eq!(board.piece_count(), 32);
        assert_eq!(
            board.get(sq("e1")),
            Some(Piece::new(Color::White, PieceType::King))
        );
        assert_eq!(
            board.get(sq("d8")),
            Some(Piece::new(Color::Black, PieceType::Queen))
        );
        for file in 0..8 {
            assert_eq!(
                board.get(Square::from_file_rank(file, 1)),
                Some(Piece::new(Color::White, PieceType::Pawn))
            );
            assert_eq!(
                board.get(Square::from_file_rank(file, 6)),
                Some(Piece::new(Color::Black, PieceType::Pawn))
            );
        }
        for rank in 2..6 {
            for file in 0..8 {
                assert_eq!(board.get(Square::from_file_rank(file, rank)), None);
            }
        }
    }

    #[test]
    fn king_square_lookup() {
        let board = Board::starting(RuleSet::Minimal);
        assert_eq!(board.king_square(Color::White), Some(sq("e1")));
        assert_eq!(board.king_square(Color::Black), Some(sq("e8")));
        assert_eq!(Board::empty(RuleSet::Minimal).king_square(Color::White), None);
    }

    #[test]
    fn set_and_clear() {
        let mut board = Board::empty(RuleSet::Minimal);
        let knight = Piece::new(Color::Black, PieceType::Knight);
        board.set(sq("c3"), Some(knight));
        assert_eq!(board.get(sq("c3")), Some(knight));
        assert_eq!(board.clear(sq("c3")), Some(knight));
        assert_eq!(board.get(sq("c3")), None);
        assert_eq!(board.piece_count(), 0);
    }

    #[test]
    fn copy_is_independent() {
        let original = Board::starting(RuleSet::Minimal);
        let mut copy = original;
        copy.clear(sq("e2"));
        copy.side_to_move = Color::Black;
        assert!(original.get(sq("e2")).is_some());
        assert_eq!(original.side_to_move, Color::White);
    }

    // ===================================================================
    // FEN
    // ===================================================================

    #[test]
    fn fen_round_trip_standard() {
        for fen in [
            START_FEN,
            "r3k2r/p1ppqpb1/bn2pnp1/3PN3/1p2P3/2N2Q1p/PPPBBPPP/R3K2R w KQkq - 0 1",
            "rnbqkbnr/pppp1ppp/8/4p3/4P3/8/PPPP1PPP/RNBQKBNR w KQkq e6 0 2",
            "8/2p5/3p4/KP5r/1R3p1k/8/4P1P1/8 w - - 0 1",
            "r3k2r/8/8/8/8/8/8/R3K2R b Kq - 0 1",
        ] {
            let board = Board::from_fen(fen, RuleSet::Standard).unwrap();
            assert_eq!(board.to_fen(fen_fullmove(fen)), fen);
        }
    }

    fn fen_fullmove(fen: &str) -> usize {
        fen.split_whitespace().last().unwrap().parse().unwrap()
    }

    #[test]
    fn minimal_rules_drop_castling_and_en_passant() {
        let fen = "rnbqkbnr/pppp1ppp/8/4p3/4P3/8/PPPP1PPP/RNBQKBNR w KQkq e6 0 2";
        let board = Board::from_fen(fen, RuleSet::Minimal).unwrap();
        assert_eq!(board.castling_rights, CastlingRights::NONE);
        assert_eq!(board.en_passant, None);
        assert_eq!(
            board.position_key(),
            "rnbqkbnr/pppp1ppp/8/4p3/4P3/8/PPPP1PPP/RNBQKBNR w - -"
        );
    }

    #[test]
    fn castling_rights_require_pieces_at_home() {
        let board = Board::from_fen("4k3/8/8/8/8/8/8/4K2R w KQkq - 0 1", RuleSet::Standard)
            .unwrap();
        assert_eq!(board.castling_rights.to_fen(), "K");
    }

    #[test]
    fn fen_errors() {
        let bad = [
            ("rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq -", "field count"),
            ("rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP w KQkq - 0 1", "rank count"),
            ("rnbqkbnr/ppppxppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1", "piece char"),
            ("rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR x KQkq - 0 1", "side"),
            ("rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQxq - 0 1", "castling"),
            ("rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq z9 0 1", "ep square"),
            ("rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq e4 0 1", "ep rank"),
            ("rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - x 1", "halfmove"),
            ("rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 0", "fullmove"),
            ("rnbqqbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1", "no black king"),
            ("rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBKKBNR w KQkq - 0 1", "two white kings"),
            ("rnbqkbnrr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1", "rank too long"),
            ("rnbqkbnr/pppppppp/9/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1", "digit 9"),
            ("4k3/8/8/8/8/8/8/4RK2 w - - 0 1", "black in check, white to move"),
            ("4k3/8/8/8/8/8/3q4/4K3 b - - 0 1", "white in check, black to move"),
        ];
        for (fen, what) in bad {
            assert!(
                matches!(
                    Board::from_fen(fen, RuleSet::Standard),
                    Err(ChessError::InvalidFen(_))
                ),
                "expected InvalidFen for {what}: {fen}"
            );
        }
    }

    // ===================================================================
    // Views and hashing
    // ===================================================================

    #[test]
    fn board_array_rank_eight_first() {
        let board = Board::starting(RuleSet::Minimal);
        let rows = board.board_array();
        assert_eq!(rows[0][0], Some(Piece::new(Color::Black, PieceType::Rook)));
        assert_eq!(rows[7][4], Some(Piece::new(Color::White, PieceType::King)));
        assert_eq!(rows[4][4], None);
    }

    #[test]
    fn board_string_starting() {
        let s = Board::starting(RuleSet::Minimal).board_string();
        let lines: Vec<&str> = s.lines().collect();
        assert_eq!(lines[0], "8 r n b q k b n r");
        assert_eq!(lines[7], "1 R N B Q K B N R");
        assert_eq!(lines[8], "  a b c d e f g h");
    }

    #[test]
    fn zobrist_tracks_placement_and_side() {
        let start = Board::starting(RuleSet::Minimal);
        assert_ne!(start.zobrist(), 0);
        assert_eq!(start.zobrist(), Board::starting(RuleSet::Minimal).zobrist());

        let mut flipped = start;
        flipped.side_to_move = Color::Black;
        assert_ne!(flipped.zobrist(), start.zobrist());

        let mut moved = start;
        let pawn = moved.clear(sq("e2"));
        moved.set(sq("e4"), pawn);
        assert_ne!(moved.zobrist(), start.zobrist());
    }
}
