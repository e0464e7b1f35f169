//! Static position evaluation.
//!
//! Returns a score in centipawns from White's perspective.
//! Positive = White advantage, negative = Black advantage.
//!
//! Components:
//!   1. Material balance
//!   2. Piece-square tables
//!   3. King safety (side to move in check)
//!   4. Mobility (legal-move difference)
//!
//! Pawn structure is not scored.

use rand::Rng;

use crate::engine::attacks::in_check;
use crate::engine::board::Board;
use crate::engine::movegen::{has_legal_move, mobility};
use crate::engine::status::is_insufficient_material;
use crate::engine::types::{Color, PieceType, Square};

/// Score of a checkmate seen by static evaluation. The search adds the
/// remaining depth on top so faster mates score higher.
pub const MATE_SCORE: f64 = 20_000.0;

/// |evaluation| above this counts as a winning position.
pub const WINNING_THRESHOLD: f64 = 500.0;

/// Is this score a checkmate score?
#[inline]
pub fn is_mate_score(score: f64) -> bool {
    score.abs() >= MATE_SCORE
}

const CHECK_PENALTY: f64 = 50.0;
const MOBILITY_WEIGHT: f64 = 2.0;

/// Material total (1/3/3/5/9 scale) below which the endgame king table
/// applies.
const ENDGAME_MATERIAL: u32 = 1500;

// =========================================================================
// Piece-Square Tables
//
// Row 0 is the eighth rank from White's point of view, row 7 the first.
// A white piece on rank index r reads row 7 - r, a black piece reads row r.
// =========================================================================

type Table = [[i32; 8]; 8];

#[rustfmt::skip]
const PAWN_TABLE: Table = [
    [ 0,  0,  0,  0,  0,  0,  0,  0],
    [50, 50, 50, 50, 50, 50, 50, 50],
    [10, 10, 20, 30, 30, 20, 10, 10],
    [ 5,  5, 10, 25, 25, 10,  5,  5],
    [ 0,  0,  0, 20, 20,  0,  0,  0],
    [ 5, -5,-10,  0,  0,-10, -5,  5],
    [ 5, 10, 10,-20,-20, 10, 10,  5],
    [ 0,  0,  0,  0,  0,  0,  0,  0],
];

#[rustfmt::skip]
const KNIGHT_TABLE: Table = [
    [-50,-40,-30,-30,-30,-30,-40,-50],
    [-40,-20,  0,  0,  0,  0,-20,-40],
    [-30,  0, 10, 15, 15, 10,  0,-30],
    [-30,  5, 15, 20, 20, 15,  5,-30],
    [-30,  0, 15, 20, 20, 15,  0,-30],
    [-30,  5, 10, 15, 15, 10,  5,-30],
    [-40,-20,  0,  5,  5,  0,-20,-40],
    [-50,-40,-30,-30,-30,-30,-40,-50],
];

#[rustfmt::skip]
const BISHOP_TABLE: Table = [
    [-20,-10,-10,-10,-10,-10,-10,-20],
    [-10,  0,  0,  0,  0,  0,  0,-10],
    [-10,  0,  5, 10, 10,  5,  0,-10],
    [-10,  5,  5, 10, 10,  5,  5,-10],
    [-10,  0, 10, 10, 10, 10,  0,-10],
    [-10, 10, 10, 10, 10, 10, 10,-10],
    [-10,  5,  0,  0,  0,  0,  5,-10],
    [-20,-10,-10,-10,-10,-10,-10,-20],
];

#[rustfmt::skip]
const ROOK_TABLE: Table = [
    [ 0,  0,  0,  0,  0,  0,  0,  0],
    [ 5, 10, 10, 10, 10, 10, 10,  5],
    [-5,  0,  0,  0,  0,  0,  0, -5],
    [-5,  0,  0,  0,  0,  0,  0, -5],
    [-5,  0,  0,  0,  0,  0,  0, -5],
    [-5,  0,  0,  0,  0,  0,  0, -5],
    [-5,  0,  0,  0,  0,  0,  0, -5],
    [ 0,  0,  0,  5,  5,  0,  0,  0],
];

#[rustfmt::skip]
const QUEEN_TABLE: Table = [
    [-20,-10,-10, -5, -5,-10,-10,-20],
    [-10,  0,  0,  0,  0,  0,  0,-10],
    [-10,  0,  5,  5,  5,  5,  0,-10],
    [ -5,  0,  5,  5,  5,  5,  0, -5],
    [  0,  0,  5,  5,  5,  5,  0, -5],
    [-10,  5,  5,  5,  5,  5,  0,-10],
    [-10,  0,  5,  0,  0,  0,  0,-10],
    [-20,-10,-10, -5, -5,-10,-10,-20],
];

#[rustfmt::skip]
const KING_MIDDLE_TABLE: Table = [
    [-30,-40,-40,-50,-50,-40,-40,-30],
    [-30,-40,-40,-50,-50,-40,-40,-30],
    [-30,-40,-40,-50,-50,-40,-40,-30],
    [-30,-40,-40,-50,-50,-40,-40,-30],
    [-20,-30,-30,-40,-40,-30,-30,-20],
    [-10,-20,-20,-20,-20,-20,-20,-10],
    [ 20, 20,  0,  0,  0,  0, 20, 20],
    [ 20, 30, 10,  0,  0, 10, 30, 20],
];

#[rustfmt::skip]
const KING_END_TABLE: Table = [
    [-50,-40,-30,-20,-20,-30,-40,-50],
    [-30,-20,-10,  0,  0,-10,-20,-30],
    [-30,-10, 20, 30, 30, 20,-10,-30],
    [-30,-10, 30, 40, 40, 30,-10,-30],
    [-30,-10, 30, 40, 40, 30,-10,-30],
    [-30,-10, 20, 30, 30, 20,-10,-30],
    [-30,-30,  0,  0,  0,  0,-30,-30],
    [-50,-30,-30,-30,-30,-30,-30,-50],
];

/// Positional bonus for `kind` of `color` standing on `sq`.
pub fn square_bonus(kind: PieceType, color: Color, sq: Square, endgame: bool) -> i32 {
    let table = match kind {
        PieceType::Pawn => &PAWN_TABLE,
        PieceType::Knight => &KNIGHT_TABLE,
        PieceType::Bishop => &BISHOP_TABLE,
        PieceType::Rook => &ROOK_TABLE,
        PieceType::Queen => &QUEEN_TABLE,
        PieceType::King if endgame => &KING_END_TABLE,
        PieceType::King => &KING_MIDDLE_TABLE,
    };
    let row = match color {
        Color::White => 7 - sq.rank(),
        Color::Black => sq.rank(),
    };
    table[row as usize][sq.file() as usize]
}

// =========================================================================
// Evaluation
// =========================================================================

/// Score of a finished game, or `None` while play continues.
///
/// Checkmate is `∓MATE_SCORE` against the mated side; stalemate,
/// insufficient material and `repeated` (threefold) are 0.
pub fn game_over_score(board: &Board, repeated: bool) -> Option<f64> {
    if !has_legal_move(board) {
        if !in_check(board, board.side_to_move) {
            return Some(0.0);
        }
        return Some(match board.side_to_move {
            Color::White => -MATE_SCORE,
            Color::Black => MATE_SCORE,
        });
    }
    if repeated || is_insufficient_material(board) {
        return Some(0.0);
    }
    None
}

/// Evaluate a position. `repeated` marks a threefold repetition.
pub fn evaluate(board: &Board, repeated: bool) -> f64 {
    game_over_score(board, repeated).unwrap_or_else(|| static_eval(board))
}

/// Sum of the positional terms, ignoring whether the game is over.
pub fn static_eval(board: &Board) -> f64 {
    let endgame = is_endgame(board);
    let mut score = 0i32;

    for (sq, piece) in board.pieces() {
        let term = piece.kind.value() + square_bonus(piece.kind, piece.color, sq, endgame);
        match piece.color {
            Color::White => score += term,
            Color::Black => score -= term,
        }
    }

    f64::from(score) + king_safety(board) + piece_activity(board)
}

/// ∓50 when the side to move is in check.
fn king_safety(board: &Board) -> f64 {
    if !in_check(board, board.side_to_move) {
        return 0.0;
    }
    match board.side_to_move {
        Color::White => -CHECK_PENALTY,
        Color::Black => CHECK_PENALTY,
    }
}

/// Mobility difference, white minus black.
fn piece_activity(board: &Board) -> f64 {
    let white = mobility(board, Color::White) as f64;
    let black = mobility(board, Color::Black) as f64;
    (white - black) * MOBILITY_WEIGHT
}

/// Total material on the 1/3/3/5/9 scale below [`ENDGAME_MATERIAL`].
///
/// With a full set the total is 78, so this holds for every position.
pub fn is_endgame(board: &Board) -> bool {
    let total: u32 = board.pieces().map(|(_, p)| p.kind.points()).sum();
    total < ENDGAME_MATERIAL
}

/// Uniform noise in `[-amplitude / 2, amplitude / 2)`.
pub fn noise<R: Rng + ?Sized>(rng: &mut R, amplitude: f64) -> f64 {
    if amplitude <= 0.0 {
        return 0.0;
    }
    (rng.r#gen::<f64>() - 0.5) * amplitude
}

// =========================================================================
// Tests
// =========================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::types::RuleSet;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn board(fen: &str) -> Board {
        Board::from_fen(fen, RuleSet::Minimal).unwrap()
    }

    fn sq(name: &str) -> Square {
        Square::from_algebraic(name).unwrap()
    }

    #[test]
    fn starting_position_is_balanced() {
        assert_eq!(evaluate(&Board::starting(RuleSet::Minimal), false), 0.0);
    }

    #[test]
    fn tables_mirror_between_colors() {
        for kind in PieceType::ALL {
            for s in Square::all() {
                let mirror = Square::from_file_rank(s.file(), 7 - s.rank());
                assert_eq!(
                    square_bonus(kind, Color::White, s, true),
                    square_bonus(kind, Color::Black, mirror, true),
                    "{kind} on {s}"
                );
            }
        }
    }

    #[test]
    fn pawn_table_rewards_advancement() {
        assert_eq!(square_bonus(PieceType::Pawn, Color::White, sq("e7"), true), 50);
        assert_eq!(square_bonus(PieceType::Pawn, Color::Black, sq("e2"), true), 50);
        assert_eq!(square_bonus(PieceType::Pawn, Color::White, sq("d2"), true), -20);
        assert_eq!(square_bonus(PieceType::Pawn, Color::White, sq("e4"), true), 20);
    }

    #[test]
    fn king_tables_differ() {
        assert_eq!(square_bonus(PieceType::King, Color::White, sq("g1"), false), 30);
        assert_eq!(square_bonus(PieceType::King, Color::White, sq("g1"), true), -30);
        assert_eq!(square_bonus(PieceType::King, Color::White, sq("e4"), true), 40);
    }

    #[test]
    fn endgame_test_always_holds() {
        assert!(is_endgame(&Board::starting(RuleSet::Minimal)));
        assert!(is_endgame(&board("4k3/8/8/8/8/8/8/4K3 w - - 0 1")));
    }

    #[test]
    fn extra_material_favors_its_owner() {
        let white_up = board("4k3/8/8/8/8/8/8/Q3K3 w - - 0 1");
        assert!(evaluate(&white_up, false) > 800.0);
        let black_up = board("q3k3/8/8/8/8/8/8/4K3 w - - 0 1");
        assert!(evaluate(&black_up, false) < -800.0);
    }

    #[test]
    fn checkmate_scores() {
        let white_mated = board("rnb1kbnr/pppp1ppp/8/4p3/6Pq/5P2/PPPPP2P/RNBQKBNR w - - 1 3");
        assert_eq!(evaluate(&white_mated, false), -MATE_SCORE);
        let black_mated = board("r1bqkb1r/pppp1Qpp/2n2n2/4p3/2B1P3/8/PPPP1PPP/RNB1K1NR b - - 0 4");
        assert_eq!(evaluate(&black_mated, false), MATE_SCORE);
        assert!(is_mate_score(MATE_SCORE + 3.0));
        assert!(!is_mate_score(900.0));
    }

    #[test]
    fn draws_score_zero() {
        assert_eq!(evaluate(&board("k7/2K5/1Q6/8/8/8/8/8 b - - 0 1"), false), 0.0);
        assert_eq!(evaluate(&board("4k3/8/8/8/8/8/8/2B1K3 w - - 0 1"), false), 0.0);
        let quiet = board("4k3/8/8/8/8/8/8/R3K3 w - - 0 1");
        assert_ne!(evaluate(&quiet, false), 0.0);
        assert_eq!(evaluate(&quiet, true), 0.0);
        assert_eq!(game_over_score(&quiet, false), None);
    }

    #[test]
    fn check_costs_the_side_to_move() {
        let checked = board("4k3/8/8/8/8/8/8/R3K2r w - - 0 1");
        assert_eq!(king_safety(&checked), -CHECK_PENALTY);
        let black_checked = board("4k2R/8/8/8/8/8/8/4K3 b - - 0 1");
        assert_eq!(king_safety(&black_checked), CHECK_PENALTY);
        assert_eq!(king_safety(&Board::starting(RuleSet::Minimal)), 0.0);
    }

    #[test]
    fn mobility_counts_both_sides() {
        // Rook vs bare king: white has far more moves.
        let b = board("4k3/8/8/8/8/8/8/R3K3 b - - 0 1");
        assert!(piece_activity(&b) > 0.0);
        assert_eq!(piece_activity(&Board::starting(RuleSet::Minimal)), 0.0);
    }

    #[test]
    fn noise_stays_in_range() {
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..1000 {
            let n = noise(&mut rng, 80.0);
            assert!((-40.0..40.0).contains(&n));
        }
        assert_eq!(noise(&mut rng, 0.0), 0.0);
    }
}
