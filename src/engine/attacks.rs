//! Pre-computed offset and ray tables, and check detection.
//!
//! Tables are initialised once (via `OnceLock`) and live for the lifetime of
//! the process. Leapers (knight, king) get a destination list per square;
//! sliders get one outward ray per direction per square.

use std::sync::OnceLock;

use crate::engine::board::Board;
use crate::engine::types::{Color, Piece, PieceType, Square};

// =========================================================================
// Public API
// =========================================================================

/// Straight directions (rook), then diagonals (bishop). Queen uses all 8.
pub const DIRECTIONS: [(i8, i8); 8] = [
    (0, 1),
    (0, -1),
    (1, 0),
    (-1, 0),
    (1, 1),
    (1, -1),
    (-1, 1),
    (-1, -1),
];

/// Index range of the rook directions in [`DIRECTIONS`].
pub const ROOK_DIRS: std::ops::Range<usize> = 0..4;
/// Index range of the bishop directions in [`DIRECTIONS`].
pub const BISHOP_DIRS: std::ops::Range<usize> = 4..8;

const KNIGHT_OFFSETS: [(i8, i8); 8] = [
    (1, 2),
    (2, 1),
    (2, -1),
    (1, -2),
    (-1, -2),
    (-2, -1),
    (-2, 1),
    (-1, 2),
];

/// Get a reference to the global attack tables.
pub fn tables() -> &'static AttackTables {
    static TABLES: OnceLock<AttackTables> = OnceLock::new();
    TABLES.get_or_init(AttackTables::init)
}

/// Per-square destination lists for every piece shape.
pub struct AttackTables {
    pub knight: [Vec<Square>; 64],
    pub king: [Vec<Square>; 64],
    /// `rays[square][direction]`, nearest square first.
    pub rays: [[Vec<Square>; 8]; 64],
}

impl AttackTables {
    /// Knight destinations from a square, on-board only.
    #[inline]
    pub fn knight_targets(&self, sq: Square) -> &[Square] {
        &self.knight[sq.index()]
    }

    /// King destinations from a square, on-board only.
    #[inline]
    pub fn king_targets(&self, sq: Square) -> &[Square] {
        &self.king[sq.index()]
    }

    /// Ray from `sq` in direction `dir` (index into [`DIRECTIONS`]).
    #[inline]
    pub fn ray(&self, sq: Square, dir: usize) -> &[Square] {
        &self.rays[sq.index()][dir]
    }

    fn init() -> Self {
        let leaper = |offsets: &[(i8, i8)], sq: Square| -> Vec<Square> {
            offsets
                .iter()
                .filter_map(|&(df, dr)| sq.offset(df, dr))
                .collect()
        };
        let king_offsets: Vec<(i8, i8)> = DIRECTIONS.to_vec();

        let knight = std::array::from_fn(|i| leaper(&KNIGHT_OFFSETS, Square(i as u8)));
        let king = std::array::from_fn(|i| leaper(&king_offsets, Square(i as u8)));
        let rays = std::array::from_fn(|i| {
            std::array::from_fn(|dir| {
                let (df, dr) = DIRECTIONS[dir];
                let mut ray = Vec::with_capacity(7);
                let mut cur = Square(i as u8);
                while let Some(next) = cur.offset(df, dr) {
                    ray.push(next);
                    cur = next;
                }
                ray
            })
        });

        AttackTables { knight, king, rays }
    }
}

/// Rank direction a pawn of this color advances in (white up, black down).
#[inline]
pub fn pawn_direction(color: Color) -> i8 {
    match color {
        Color::White => 1,
        Color::Black => -1,
    }
}

// =========================================================================
// Attack detection
// =========================================================================

/// Is `sq` attacked by any piece of color `by`?
///
/// Looks outward from `sq` with each piece shape and asks whether a matching
/// enemy piece sits at the end. This is the same set of squares as "any
/// piece of `by` has a pseudo-legal capture onto `sq`", computed without
/// generating moves.
pub fn is_square_attacked(board: &Board, sq: Square, by: Color) -> bool {
    let t = tables();
    let is = |s: Square, kind: PieceType| board.get(s) == Some(Piece::new(by, kind));

    // A pawn of `by` attacking sq stands one rank behind it, from by's view.
    let back = -pawn_direction(by);
    for df in [-1, 1] {
        if let Some(s) = sq.offset(df, back)
            && is(s, PieceType::Pawn)
        {
            return true;
        }
    }

    if t.knight_targets(sq).iter().any(|&s| is(s, PieceType::Knight)) {
        return true;
    }

    if t.king_targets(sq).iter().any(|&s| is(s, PieceType::King)) {
        return true;
    }

    for dir in 0..DIRECTIONS.len() {
        let slider = if ROOK_DIRS.contains(&dir) {
            PieceType::Rook
        } else {
            PieceType::Bishop
        };
        if let Some(first) = first_piece_on_ray(board, sq, dir)
            && first.color == by
            && (first.kind == slider || first.kind == PieceType::Queen)
        {
            return true;
        }
    }

    false
}

/// The first piece met walking outward from `sq` in direction `dir`.
fn first_piece_on_ray(board: &Board, sq: Square, dir: usize) -> Option<Piece> {
    tables().ray(sq, dir).iter().find_map(|&s| board.get(s))
}

/// Is `color`'s king attacked? A color without a king is never in check.
pub fn in_check(board: &Board, color: Color) -> bool {
    board
        .king_square(color)
        .is_some_and(|king| is_square_attacked(board, king, !color))
}

// =========================================================================
// Tests
// =========================================================================
