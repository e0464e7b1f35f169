//! Move ordering for alpha-beta search.
//!
//! Priority, highest first: captures (1000 + victim value), moves that give
//! check (+500), killer moves at the current depth (+100), then the history
//! score. The sort is stable, so equal scores keep generation order.

use std::cmp::Reverse;

use crate::engine::attacks::in_check;
use crate::engine::board::Board;
use crate::engine::movegen::apply_move;
use crate::engine::types::{Move, PieceType};

const CAPTURE_BONUS: i64 = 1000;
const CHECK_BONUS: i64 = 500;
const KILLER_BONUS: i64 = 100;

/// Killer slots kept per depth.
pub const KILLERS_PER_DEPTH: usize = 2;

// =========================================================================
// Killer moves
// =========================================================================

/// Moves that caused a cutoff, indexed by remaining depth.
#[derive(Debug, Default, Clone)]
pub struct KillerTable {
    slots: Vec<Vec<Move>>,
}

impl KillerTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Remember a cutoff move. Only the first two per depth are kept.
    pub fn record(&mut self, depth: u32, mv: Move) {
        let depth = depth as usize;
        if self.slots.len() <= depth {
            self.slots.resize_with(depth + 1, Vec::new);
        }
        let slot = &mut self.slots[depth];
        if slot.len() < KILLERS_PER_DEPTH && !slot.iter().any(|k| k.same_squares(&mv)) {
            slot.push(mv);
        }
    }

    /// Is `mv` a killer at this depth? Matched on (from, to).
    pub fn is_killer(&self, depth: u32, mv: &Move) -> bool {
        self.slots
            .get(depth as usize)
            .is_some_and(|slot| slot.iter().any(|k| k.same_squares(mv)))
    }

    pub fn clear(&mut self) {
        self.slots.clear();
    }
}

// =========================================================================
// History heuristic
// =========================================================================

/// Cutoff score per (from, to) pair.
#[derive(Debug, Clone)]
pub struct HistoryTable {
    scores: Vec<u64>,
}

impl Default for HistoryTable {
    fn default() -> Self {
        Self {
            scores: vec![0; 64 * 64],
        }
    }
}

impl HistoryTable {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    fn slot(mv: &Move) -> usize {
        mv.from.index() * 64 + mv.to.index()
    }

    /// Credit a cutoff at `depth` with `depth²`.
    pub fn reward(&mut self, mv: &Move, depth: u32) {
        let d = u64::from(depth);
        self.scores[Self::slot(mv)] += d * d;
    }

    pub fn score(&self, mv: &Move) -> u64 {
        self.scores[Self::slot(mv)]
    }

    pub fn clear(&mut self) {
        self.scores.fill(0);
    }
}

// =========================================================================
// Ordering
// =========================================================================

/// Ordering score of one move. Higher is searched first.
pub fn move_order_score(
    board: &Board,
    mv: &Move,
    depth: u32,
    killers: &KillerTable,
    history: &HistoryTable,
) -> i64 {
    let mut score = 0i64;

    let victim = if mv.flags.is_en_passant() {
        Some(PieceType::Pawn)
    } else {
        board.get(mv.to).map(|p| p.kind)
    };
    if let Some(kind) = victim {
        score += CAPTURE_BONUS + i64::from(kind.value());
    }

    let mut after = *board;
    apply_move(&mut after, *mv);
    if in_check(&after, after.side_to_move) {
        score += CHECK_BONUS;
    }

    if killers.is_killer(depth, mv) {
        score += KILLER_BONUS;
    }

    score + history.score(mv) as i64
}

/// Sort moves best-first for the search.
pub fn order_moves(
    board: &Board,
    moves: &mut [Move],
    depth: u32,
    killers: &KillerTable,
    history: &HistoryTable,
) {
    moves.sort_by_cached_key(|m| Reverse(move_order_score(board, m, depth, killers, history)));
}

// =========================================================================
// Tests
// =========================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::movegen::legal_moves;
    use crate::engine::types::{RuleSet, Square};

    fn sq(name: &str) -> Square {
        Square::from_algebraic(name).unwrap()
    }

    fn board(fen: &str) -> Board {
        Board::from_fen(fen, RuleSet::Minimal).unwrap()
    }

    #[test]
    fn killers_keep_first_two_per_depth() {
        let mut k = KillerTable::new();
        let a = Move::new(sq("e2"), sq("e4"));
        let b = Move::new(sq("d2"), sq("d4"));
        let c = Move::new(sq("g1"), sq("f3"));
        k.record(3, a);
        k.record(3, a);
        k.record(3, b);
        k.record(3, c);
        assert!(k.is_killer(3, &a));
        assert!(k.is_killer(3, &b));
        assert!(!k.is_killer(3, &c));
        // Other depths are unaffected.
        assert!(!k.is_killer(2, &a));
        k.clear();
        assert!(!k.is_killer(3, &a));
    }

    #[test]
    fn history_accumulates_depth_squared() {
        let mut h = HistoryTable::new();
        let mv = Move::new(sq("e2"), sq("e4"));
        h.reward(&mv, 3);
        h.reward(&mv, 2);
        assert_eq!(h.score(&mv), 13);
        assert_eq!(h.score(&Move::new(sq("d2"), sq("d4"))), 0);
        h.clear();
        assert_eq!(h.score(&mv), 0);
    }

    #[test]
    fn captures_come_first_most_valuable_victim_leading() {
        // White queen d2 can take a rook on d5 or a knight on a5.
        let b = board("4k3/8/8/n2r4/8/8/3Q4/4K3 w - - 0 1");
        let mut moves = legal_moves(&b);
        order_moves(&b, &mut moves, 2, &KillerTable::new(), &HistoryTable::new());
        assert_eq!(moves[0].to, sq("d5"));
        assert_eq!(moves[1].to, sq("a5"));
    }

    #[test]
    fn checks_outrank_quiet_moves() {
        let b = board("4k3/8/8/8/8/8/8/R3K3 w - - 0 1");
        let mut moves = legal_moves(&b);
        order_moves(&b, &mut moves, 1, &KillerTable::new(), &HistoryTable::new());
        let mut after = b;
        apply_move(&mut after, moves[0]);
        assert!(in_check(&after, after.side_to_move), "first move {}", moves[0]);
    }

    #[test]
    fn killers_and_history_break_ties() {
        let b = Board::starting(RuleSet::Minimal);
        let quiet = Move::new(sq("h2"), sq("h3"));
        let historic = Move::new(sq("a2"), sq("a3"));

        let mut killers = KillerTable::new();
        killers.record(4, quiet);
        let mut history = HistoryTable::new();
        history.reward(&historic, 2);

        let mut moves = legal_moves(&b);
        order_moves(&b, &mut moves, 4, &killers, &history);
        assert!(moves[0].same_squares(&quiet));
        assert!(moves[1].same_squares(&historic));

        // At another depth the killer bonus does not apply.
        let mut moves = legal_moves(&b);
        order_moves(&b, &mut moves, 3, &killers, &history);
        assert!(moves[0].same_squares(&historic));
    }
}
