//! Terminal-state classification.
//!
//! Status is never stored: it is recomputed from the board and the recorded
//! position keys whenever someone asks.

use std::collections::HashMap;
use std::hash::Hash;

use crate::engine::attacks::in_check;
use crate::engine::board::Board;
use crate::engine::movegen::has_legal_move;
use crate::engine::types::{DrawReason, GameStatus, PieceType};

/// Classify the position. `threefold` tells whether the history already
/// holds a position three times (see [`has_threefold`]).
pub fn classify(board: &Board, threefold: bool) -> GameStatus {
    let checked = in_check(board, board.side_to_move);

    if !has_legal_move(board) {
        return if checked {
            GameStatus::Checkmate
        } else {
            GameStatus::Stalemate
        };
    }
    if is_insufficient_material(board) {
        return GameStatus::Draw(DrawReason::InsufficientMaterial);
    }
    if threefold {
        return GameStatus::Draw(DrawReason::ThreefoldRepetition);
    }
    if checked {
        GameStatus::Check
    } else {
        GameStatus::Active
    }
}

/// Bare kings, or kings plus a single knight or bishop.
///
/// No other material combination counts as insufficient.
pub fn is_insufficient_material(board: &Board) -> bool {
    match board.piece_count() {
        2 => true,
        3 => board
            .pieces()
            .any(|(_, p)| matches!(p.kind, PieceType::Knight | PieceType::Bishop)),
        _ => false,
    }
}

/// Does any key occur three or more times?
pub fn has_threefold<K, I>(keys: I) -> bool
where
    K: Hash + Eq,
    I: IntoIterator<Item = K>,
{
    let mut counts: HashMap<K, u32> = HashMap::new();
    for key in keys {
        let n = counts.entry(key).or_insert(0);
        *n += 1;
        if *n >= 3 {
            return true;
        }
    }
    false
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
