//! Transposition cache for the minimax search.
//!
//! Entries are keyed by (position fingerprint, remaining depth, maximizing
//! flag) and carry a bound flag. Alpha-beta returns exact values only inside
//! the window it was given; outside it the value is a bound, and a later
//! probe may only use it when that bound already decides its own window.

use std::collections::HashMap;

/// What a stored score means relative to the true minimax value.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TTFlag {
    /// The score is the minimax value.
    Exact,
    /// The true value is at least the score (search failed high).
    LowerBound,
    /// The true value is at most the score (search failed low).
    UpperBound,
}

/// Cache key.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct TTKey {
    pub hash: u64,
    pub depth: u32,
    pub maximizing: bool,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TTEntry {
    pub score: f64,
    pub flag: TTFlag,
}

impl TTEntry {
    /// Classify `score` against the window the node was searched with.
    pub fn new(score: f64, alpha: f64, beta: f64) -> Self {
        let flag = if score <= alpha {
            TTFlag::UpperBound
        } else if score >= beta {
            TTFlag::LowerBound
        } else {
            TTFlag::Exact
        };
        TTEntry { score, flag }
    }

    /// The stored score, if it settles a node searched with `(alpha, beta)`.
    pub fn usable(&self, alpha: f64, beta: f64) -> Option<f64> {
        match self.flag {
            TTFlag::Exact => Some(self.score),
            TTFlag::LowerBound if self.score >= beta => Some(self.score),
            TTFlag::UpperBound if self.score <= alpha => Some(self.score),
            _ => None,
        }
    }
}

/// Position cache owned by one AI instance. Cleared before every top-level
/// search.
#[derive(Debug, Default)]
pub struct TranspositionTable {
    entries: HashMap<TTKey, TTEntry>,
}

impl TranspositionTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up a score usable inside `(alpha, beta)`.
    pub fn probe(&self, key: &TTKey, alpha: f64, beta: f64) -> Option<f64> {
        self.entries.get(key)?.usable(alpha, beta)
    }

    pub fn store(&mut self, key: TTKey, entry: TTEntry) {
        self.entries.insert(key, entry);
    }

    pub fn get(&self, key: &TTKey) -> Option<&TTEntry> {
        self.entries.get(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(hash: u64) -> TTKey {
        TTKey {
            hash,
            depth: 2,
            maximizing: true,
        }
    }

    #[test]
    fn flags_follow_the_window() {
        assert_eq!(TTEntry::new(5.0, 0.0, 10.0).flag, TTFlag::Exact);
        assert_eq!(TTEntry::new(0.0, 0.0, 10.0).flag, TTFlag::UpperBound);
        assert_eq!(TTEntry::new(12.0, 0.0, 10.0).flag, TTFlag::LowerBound);
        let full = TTEntry::new(1e9, f64::NEG_INFINITY, f64::INFINITY);
        assert_eq!(full.flag, TTFlag::Exact);
    }

    #[test]
    fn exact_entries_always_hit() {
        let mut tt = TranspositionTable::new();
        tt.store(key(1), TTEntry::new(5.0, 0.0, 10.0));
        assert_eq!(tt.probe(&key(1), -100.0, 100.0), Some(5.0));
        assert_eq!(tt.probe(&key(2), -100.0, 100.0), None);
    }

    #[test]
    fn bounds_hit_only_when_decisive() {
        let mut tt = TranspositionTable::new();
        tt.store(key(1), TTEntry::new(12.0, 0.0, 10.0)); // >= 12
        assert_eq!(tt.probe(&key(1), 0.0, 11.0), Some(12.0));
        assert_eq!(tt.probe(&key(1), 0.0, 20.0), None);

        tt.store(key(2), TTEntry::new(-3.0, 0.0, 10.0)); // <= -3
        assert_eq!(tt.probe(&key(2), -1.0, 5.0), Some(-3.0));
        assert_eq!(tt.probe(&key(2), -10.0, 5.0), None);
    }

    #[test]
    fn key_includes_depth_and_side() {
        let mut tt = TranspositionTable::new();
        tt.store(key(1), TTEntry::new(5.0, 0.0, 10.0));
        let deeper = TTKey { depth: 3, ..key(1) };
        let minimizing = TTKey {
            maximizing: false,
            ..key(1)
        };
        assert!(tt.get(&deeper).is_none());
        assert!(tt.get(&minimizing).is_none());
        assert_eq!(tt.len(), 1);
        tt.clear();
        assert!(tt.is_empty());
    }
}
