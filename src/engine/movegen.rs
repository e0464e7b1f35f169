//! Move generation, legality filtering, and move application.
//!
//! Pipeline:
//!   1. Generate pseudo-legal moves (piece shapes only, ignoring pins).
//!   2. Filter: apply the move to a board copy and reject it if the mover's
//!      king is attacked afterwards.
//!
//! The self-check filter is the only legality test. There is no separate pin
//! or evasion logic; castling adds its own path checks on top.

use crate::engine::attacks::{self, BISHOP_DIRS, ROOK_DIRS, in_check, is_square_attacked};
use crate::engine::board::Board;
use crate::engine::types::{CastlingRights, Color, Move, MoveFlags, Piece, PieceType, Square};

// =========================================================================
// Public API
// =========================================================================

/// All legal moves for the side to move.
pub fn legal_moves(board: &Board) -> Vec<Move> {
    let mut pseudo = Vec::with_capacity(64);
    generate_pseudo_legal(board, &mut pseudo);
    pseudo.retain(|&mv| is_safe(board, mv));
    pseudo
}

/// Legal moves starting on `from`. Empty when `from` is empty or holds a
/// piece of the side not to move.
pub fn legal_moves_from(board: &Board, from: Square) -> Vec<Move> {
    let mut moves = pseudo_legal_moves_from(board, from);
    moves.retain(|&mv| is_safe(board, mv));
    moves
}

/// Pseudo-legal moves starting on `from`, before the self-check filter.
pub fn pseudo_legal_moves_from(board: &Board, from: Square) -> Vec<Move> {
    let mut moves = Vec::with_capacity(32);
    if let Some(piece) = board.get(from)
        && piece.color == board.side_to_move
    {
        generate_piece_moves(board, from, piece, &mut moves);
        if piece.kind == PieceType::King {
            generate_castling_moves(board, piece.color, &mut moves);
        }
    }
    moves
}

/// Would `mv` leave the mover's own king safe?
pub fn is_safe(board: &Board, mv: Move) -> bool {
    let us = board.side_to_move;
    let mut scratch = *board;
    apply_move(&mut scratch, mv);
    !in_check(&scratch, us)
}

/// Does the side to move have at least one legal move?
pub fn has_legal_move(board: &Board) -> bool {
    let mut pseudo = Vec::with_capacity(64);
    generate_pseudo_legal(board, &mut pseudo);
    pseudo.into_iter().any(|mv| is_safe(board, mv))
}

/// Legal moves of `color`, as if it were that side's turn.
pub fn legal_moves_for(board: &Board, color: Color) -> Vec<Move> {
    if board.side_to_move == color {
        return legal_moves(board);
    }
    let mut turned = *board;
    turned.side_to_move = color;
    turned.en_passant = None;
    legal_moves(&turned)
}

/// Number of legal moves `color` would have on this board.
pub fn mobility(board: &Board, color: Color) -> usize {
    legal_moves_for(board, color).len()
}

/// Leaf-node count of the legal move tree to `depth`.
pub fn perft(board: &Board, depth: u32) -> u64 {
    if depth == 0 {
        return 1;
    }
    let moves = legal_moves(board);
    if depth == 1 {
        return moves.len() as u64;
    }
    moves
        .into_iter()
        .map(|mv| {
            let mut child = *board;
            apply_move(&mut child, mv);
            perft(&child, depth - 1)
        })
        .sum()
}

// =========================================================================
// Pseudo-legal generation
// =========================================================================

/// Every pseudo-legal move of the side to move.
pub fn generate_pseudo_legal(board: &Board, moves: &mut Vec<Move>) {
    let us = board.side_to_move;
    for (from, piece) in board.pieces() {
        if piece.color == us {
            generate_piece_moves(board, from, piece, moves);
        }
    }
    generate_castling_moves(board, us, moves);
}

fn generate_piece_moves(board: &Board, from: Square, piece: Piece, moves: &mut Vec<Move>) {
    let t = attacks::tables();
    match piece.kind {
        PieceType::Pawn => generate_pawn_moves(board, from, piece.color, moves),
        PieceType::Knight => generate_leaper_moves(board, from, t.knight_targets(from), moves),
        PieceType::King => generate_leaper_moves(board, from, t.king_targets(from), moves),
        PieceType::Bishop => generate_slider_moves(board, from, BISHOP_DIRS, moves),
        PieceType::Rook => generate_slider_moves(board, from, ROOK_DIRS, moves),
        PieceType::Queen => {
            generate_slider_moves(board, from, ROOK_DIRS, moves);
            generate_slider_moves(board, from, BISHOP_DIRS, moves);
        }
    }
}

// -------------------------------------------------------------------------
// Pawn moves
// -------------------------------------------------------------------------

fn generate_pawn_moves(board: &Board, from: Square, us: Color, moves: &mut Vec<Move>) {
    let dir = attacks::pawn_direction(us);
    let (start_rank, last_rank) = match us {
        Color::White => (1, 7),
        Color::Black => (6, 0),
    };
    let promotes = board.rules.is_standard();

    let push = |to: Square, flags: MoveFlags, moves: &mut Vec<Move>| {
        if promotes && to.rank() == last_rank {
            add_promotions(from, to, flags, moves);
        } else {
            moves.push(Move::with_flags(from, to, flags));
        }
    };

    // --- Single and double push ---
    if let Some(one) = from.offset(0, dir)
        && board.get(one).is_none()
    {
        push(one, MoveFlags::NONE, moves);
        if from.rank() == start_rank
            && let Some(two) = one.offset(0, dir)
            && board.get(two).is_none()
        {
            moves.push(Move::with_flags(from, two, MoveFlags::DOUBLE_PUSH));
        }
    }

    // --- Diagonal captures, en passant ---
    for df in [-1, 1] {
        let Some(to) = from.offset(df, dir) else {
            continue;
        };
        match board.get(to) {
            Some(target) if target.color != us => push(to, MoveFlags::CAPTURE, moves),
            None if board.en_passant == Some(to) => moves.push(Move::with_flags(
                from,
                to,
                MoveFlags::CAPTURE | MoveFlags::EN_PASSANT,
            )),
            _ => {}
        }
    }
}

/// Add all four promotion variants for a pawn push or capture.
fn add_promotions(from: Square, to: Square, flags: MoveFlags, moves: &mut Vec<Move>) {
    for promo in [
        PieceType::Queen,
        PieceType::Rook,
        PieceType::Bishop,
        PieceType::Knight,
    ] {
        moves.push(Move::with_promotion(from, to, promo, flags));
    }
}

// -------------------------------------------------------------------------
// Knight, king, sliders
// -------------------------------------------------------------------------

fn generate_leaper_moves(board: &Board, from: Square, targets: &[Square], moves: &mut Vec<Move>) {
    let us = board.side_to_move;
    for &to in targets {
        match board.get(to) {
            None => moves.push(Move::new(from, to)),
            Some(p) if p.color != us => moves.push(Move::with_flags(from, to, MoveFlags::CAPTURE)),
            Some(_) => {}
        }
    }
}

fn generate_slider_moves(
    board: &Board,
    from: Square,
    dirs: std::ops::Range<usize>,
    moves: &mut Vec<Move>,
) {
    let t = attacks::tables();
    let us = board.side_to_move;
    for dir in dirs {
        for &to in t.ray(from, dir) {
            match board.get(to) {
                None => moves.push(Move::new(from, to)),
                Some(p) => {
                    if p.color != us {
                        moves.push(Move::with_flags(from, to, MoveFlags::CAPTURE));
                    }
                    break;
                }
            }
        }
    }
}

// -------------------------------------------------------------------------
// Castling (standard rules only)
// -------------------------------------------------------------------------

fn generate_castling_moves(board: &Board, us: Color, moves: &mut Vec<Move>) {
    if !board.rules.is_standard() {
        return;
    }
    let them = !us;
    let (ks_right, qs_right, base) = match us {
        Color::White => (
            CastlingRights::WHITE_KINGSIDE,
            CastlingRights::WHITE_QUEENSIDE,
            0u8,
        ),
        Color::Black => (
            CastlingRights::BLACK_KINGSIDE,
            CastlingRights::BLACK_QUEENSIDE,
            56u8,
        ),
    };
    let rights = board.castling_rights;
    if !rights.has(ks_right) && !rights.has(qs_right) {
        return;
    }

    let king_sq = Square(base + 4);
    if board.get(king_sq) != Some(Piece::new(us, PieceType::King))
        || is_square_attacked(board, king_sq, them)
    {
        return;
    }

    let rook = Some(Piece::new(us, PieceType::Rook));
    let empty = |offsets: &[u8]| offsets.iter().all(|&o| board.get(Square(base + o)).is_none());
    let safe = |offsets: &[u8]| {
        offsets
            .iter()
            .all(|&o| !is_square_attacked(board, Square(base + o), them))
    };

    // Kingside: e→g, f and g empty and not attacked.
    if rights.has(ks_right) && board.get(Square(base + 7)) == rook && empty(&[5, 6]) && safe(&[5, 6])
    {
        moves.push(Move::with_flags(king_sq, Square(base + 6), MoveFlags::CASTLING));
    }

    // Queenside: e→c, b, c and d empty; c and d not attacked.
    if rights.has(qs_right)
        && board.get(Square(base)) == rook
        && empty(&[1, 2, 3])
        && safe(&[2, 3])
    {
        moves.push(Move::with_flags(king_sq, Square(base + 2), MoveFlags::CASTLING));
    }
}

// =========================================================================
// Apply / revert
// =========================================================================

/// State saved before applying a move so it can be reverted.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct UndoInfo {
    pub captured: Option<Piece>,
    pub castling_rights: CastlingRights,
    pub en_passant: Option<Square>,
}

/// Apply a move to the board and flip the side to move.
///
/// Caller contract: `mv` is pseudo-legal on this board (normally it comes
/// from `legal_moves`). Under `RuleSet::Minimal` a pawn reaching the last
/// rank stays a pawn, whatever `mv.promotion` says.
pub fn apply_move(board: &mut Board, mv: Move) -> UndoInfo {
    let us = board.side_to_move;
    let mut undo = UndoInfo {
        captured: None,
        castling_rights: board.castling_rights,
        en_passant: board.en_passant,
    };

    let moving = board.clear(mv.from);
    debug_assert!(moving.is_some(), "no piece on {} for {mv}", mv.from);

    if mv.flags.is_en_passant() {
        if let Some(victim) = mv.to.offset(0, -attacks::pawn_direction(us)) {
            undo.captured = board.clear(victim);
        }
    } else {
        undo.captured = board.clear(mv.to);
    }

    let landing = match (moving, mv.promotion) {
        (Some(p), Some(promo)) if p.kind == PieceType::Pawn && board.rules.is_standard() => {
            Some(Piece::new(us, promo))
        }
        _ => moving,
    };
    board.set(mv.to, landing);

    if mv.flags.is_castling() {
        let (rook_from, rook_to) = castling_rook_squares(mv.to);
        let rook = board.clear(rook_from);
        board.set(rook_to, rook);
    }

    board.castling_rights.0 &= CASTLING_MASK[mv.from.index()] & CASTLING_MASK[mv.to.index()];

    board.en_passant = None;
    if mv.flags.is_double_push() && board.rules.is_standard() {
        board.en_passant = mv.from.offset(0, attacks::pawn_direction(us));
    }

    board.side_to_move = !us;
    undo
}

/// Reverse a move previously applied with [`apply_move`].
pub fn revert_move(board: &mut Board, mv: Move, undo: &UndoInfo) {
    let us = !board.side_to_move;
    board.side_to_move = us;

    let landed = board.clear(mv.to);
    let original = match (landed, mv.promotion) {
        (Some(p), Some(_)) if board.rules.is_standard() => Some(Piece::new(p.color, PieceType::Pawn)),
        _ => landed,
    };
    board.set(mv.from, original);

    if mv.flags.is_en_passant() {
        if let Some(victim) = mv.to.offset(0, -attacks::pawn_direction(us)) {
            board.set(victim, undo.captured);
        }
    } else {
        board.set(mv.to, undo.captured);
    }

    if mv.flags.is_castling() {
        let (rook_from, rook_to) = castling_rook_squares(mv.to);
        let rook = board.clear(rook_to);
        board.set(rook_from, rook);
    }

    board.castling_rights = undo.castling_rights;
    board.en_passant = undo.en_passant;
}

/// For a king destination after castling, return (rook_from, rook_to).
fn castling_rook_squares(king_to: Square) -> (Square, Square) {
    match king_to.0 {
        // White kingside: rook h1→f1.
        6 => (Square(7), Square(5)),
        // White queenside: rook a1→d1.
        2 => (Square(0), Square(3)),
        // Black kingside: rook h8→f8.
        62 => (Square(63), Square(61)),
        // Black queenside: rook a8→d8.
        _ => (Square(56), Square(59)),
    }
}

/// AND the castling rights with this mask for both squares a move touches.
/// A rook's home square clears that side's right, a king's home clears both.
#[rustfmt::skip]
const CASTLING_MASK: [u8; 64] = {
    let mut mask = [0b1111u8; 64];
    mask[0]  = 0b1111 & !CastlingRights::WHITE_QUEENSIDE;
    mask[4]  = 0b1111 & !(CastlingRights::WHITE_KINGSIDE | CastlingRights::WHITE_QUEENSIDE);
    mask[7]  = 0b1111 & !CastlingRights::WHITE_KINGSIDE;
    mask[56] = 0b1111 & !CastlingRights::BLACK_QUEENSIDE;
    mask[60] = 0b1111 & !(CastlingRights::BLACK_KINGSIDE | CastlingRights::BLACK_QUEENSIDE);
    mask[63] = 0b1111 & !CastlingRights::BLACK_KINGSIDE;
    mask
};

// =========================================================================
// Tests
// =========================================================================
