//! AI engines: the `AiEngine` trait, `RandomAi` and `MinimaxAi`.
//!
//! The `AiEngine` trait defines the interface for all AI engines.
//! Two implementations are provided:
//!   - `RandomAi`: plays a uniformly random legal move.
//!   - `MinimaxAi`: minimax with alpha-beta pruning, move ordering and a
//!     transposition cache.
//!
//! The search runs on `Board` copies: every node gets its own snapshot, so
//! sibling branches never share state and nothing needs undoing.

use std::time::Instant;

use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::engine::board::Board;
use crate::engine::game::Game;
use crate::engine::movegen::{apply_move, legal_moves};
use crate::engine::types::{Color, Difficulty, Move};

use super::evaluation::{
    WINNING_THRESHOLD, game_over_score, is_mate_score, noise, static_eval,
};
use super::ordering::{HistoryTable, KillerTable, order_moves};
use super::transposition::{TTEntry, TTFlag, TTKey, TranspositionTable};

// =========================================================================
// AiEngine trait
// =========================================================================

/// The AI engine interface.
pub trait AiEngine: Send {
    /// Pick a move for the side to move. `None` only when there is no legal
    /// move (the game is over).
    fn best_move(&mut self, game: &Game) -> Option<Move>;

    /// Human-readable name for this engine.
    fn name(&self) -> &str;
}

// =========================================================================
// RandomAi
// =========================================================================

/// Picks a random legal move.
pub struct RandomAi {
    rng: StdRng,
}

impl RandomAi {
    pub fn new() -> Self {
        Self {
            rng: StdRng::from_entropy(),
        }
    }

    pub fn with_seed(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }
}

impl Default for RandomAi {
    fn default() -> Self {
        Self::new()
    }
}

impl AiEngine for RandomAi {
    fn best_move(&mut self, game: &Game) -> Option<Move> {
        game.legal_moves().choose(&mut self.rng).copied()
    }

    fn name(&self) -> &str {
        "RandomAi"
    }
}

// =========================================================================
// Search results
// =========================================================================

/// Search statistics of the last top-level search.
#[derive(Debug, Default, Clone, Copy, PartialEq, Serialize)]
pub struct SearchStats {
    pub nodes: u64,
    pub cache_hits: u64,
    pub cutoffs: u64,
    pub depth: u32,
    pub score: f64,
    pub time_ms: u64,
}

/// Result of a root search.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SearchOutcome {
    pub best_move: Move,
    /// Minimax value of `best_move`, White-positive.
    pub score: f64,
    pub stats: SearchStats,
}

/// Summary of a position for the presentation layer.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Analysis {
    /// Static evaluation, White-positive.
    pub evaluation: f64,
    pub best_move: Option<Move>,
    /// Side to move.
    pub color: Color,
    /// |evaluation| above the winning threshold.
    pub is_winning: bool,
    /// White when the evaluation is positive, otherwise Black.
    pub advantage: Color,
}

/// Faults inside the search. They never leave [`MinimaxAi::best_move`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SearchError {
    #[error("no legal moves in the root position")]
    NoLegalMoves,

    #[error("search depth must be at least 1")]
    ZeroDepth,

    #[error("generated move {mv} starts on an empty square")]
    EmptyOrigin { mv: Move },
}

// =========================================================================
// Minimax with alpha-beta pruning
// =========================================================================

/// Mutable state of one top-level search.
struct SearchContext<'a> {
    tt: &'a mut TranspositionTable,
    killers: &'a mut KillerTable,
    history: &'a mut HistoryTable,
    rng: &'a mut StdRng,
    noise_amplitude: f64,
    /// Fingerprints of the game history followed by the current line.
    path: Vec<u64>,
    /// Set when the subtree just searched ended a line on a repetition.
    saw_repetition: bool,
    stats: SearchStats,
}

impl SearchContext<'_> {
    /// Apply `mv` to a copy of `board` and push the result onto the line.
    fn play(&mut self, board: &Board, mv: Move) -> Result<Board, SearchError> {
        if board.get(mv.from).is_none() {
            return Err(SearchError::EmptyOrigin { mv });
        }
        let mut child = *board;
        apply_move(&mut child, mv);
        self.path.push(child.zobrist());
        Ok(child)
    }

    /// Has the position at the end of the line occurred three times?
    fn repeated(&self) -> bool {
        self.path
            .last()
            .is_some_and(|&key| self.path.iter().filter(|&&k| k == key).count() >= 3)
    }

    /// White-positive minimax value of `board` searched `depth` plies deep.
    fn minimax(
        &mut self,
        board: &Board,
        depth: u32,
        mut alpha: f64,
        mut beta: f64,
        maximizing: bool,
    ) -> Result<f64, SearchError> {
        self.stats.nodes += 1;

        // Repetition depends on the line, so it is decided before the cache
        // and never stored.
        if self.repeated() {
            self.saw_repetition = true;
            let score = game_over_score(board, true).map_or(0.0, |s| mate_in_depth(s, depth));
            return Ok(score);
        }

        let key = TTKey {
            hash: board.zobrist(),
            depth,
            maximizing,
        };
        if let Some(score) = self.tt.probe(&key, alpha, beta) {
            self.stats.cache_hits += 1;
            return Ok(score);
        }

        if let Some(score) = game_over_score(board, false) {
            let score = mate_in_depth(score, depth);
            self.tt.store(
                key,
                TTEntry {
                    score,
                    flag: TTFlag::Exact,
                },
            );
            return Ok(score);
        }

        if depth == 0 {
            let score = static_eval(board) + noise(&mut *self.rng, self.noise_amplitude);
            self.tt.store(
                key,
                TTEntry {
                    score,
                    flag: TTFlag::Exact,
                },
            );
            return Ok(score);
        }

        let (alpha_orig, beta_orig) = (alpha, beta);
        let outer_repetition = std::mem::take(&mut self.saw_repetition);
        let mut moves = legal_moves(board);
        order_moves(board, &mut moves, depth, &*self.killers, &*self.history);

        let mut best = if maximizing {
            f64::NEG_INFINITY
        } else {
            f64::INFINITY
        };

        for mv in moves {
            let child = self.play(board, mv)?;
            let score = self.minimax(&child, depth - 1, alpha, beta, !maximizing);
            self.path.pop();
            let score = score?;

            if maximizing {
                best = best.max(score);
                alpha = alpha.max(score);
            } else {
                best = best.min(score);
                beta = beta.min(score);
            }

            if beta <= alpha {
                self.killers.record(depth, mv);
                self.history.reward(&mv, depth);
                self.stats.cutoffs += 1;
                break;
            }
        }

        // A value that leaned on a repeated line is only valid for this line.
        if !self.saw_repetition {
            self.tt.store(key, TTEntry::new(best, alpha_orig, beta_orig));
        }
        self.saw_repetition |= outer_repetition;
        Ok(best)
    }
}

/// Push a mate score further from zero by the remaining depth, so a mate
/// found higher in the tree (sooner) wins over a slower one.
fn mate_in_depth(score: f64, depth: u32) -> f64 {
    if is_mate_score(score) {
        score + score.signum() * f64::from(depth)
    } else {
        score
    }
}

// =========================================================================
// MinimaxAi
// =========================================================================

/// Minimax AI engine with alpha-beta pruning.
///
/// Owns its cache, killer and history tables and its random source. All of
/// them are private to the instance; a search never shares them.
pub struct MinimaxAi {
    difficulty: Difficulty,
    tt: TranspositionTable,
    killers: KillerTable,
    history: HistoryTable,
    rng: StdRng,
    stats: SearchStats,
    /// Makes the next root search play a move from an empty square.
    #[cfg(test)]
    inject_fault: bool,
}

impl MinimaxAi {
    pub fn new(difficulty: Difficulty) -> Self {
        Self::with_rng(difficulty, StdRng::from_entropy())
    }

    /// Reproducible engine: noise and the random fallback come from `seed`.
    pub fn with_seed(difficulty: Difficulty, seed: u64) -> Self {
        Self::with_rng(difficulty, StdRng::seed_from_u64(seed))
    }

    fn with_rng(difficulty: Difficulty, rng: StdRng) -> Self {
        Self {
            difficulty,
            tt: TranspositionTable::new(),
            killers: KillerTable::new(),
            history: HistoryTable::new(),
            rng,
            stats: SearchStats::default(),
            #[cfg(test)]
            inject_fault: false,
        }
    }

    pub fn difficulty(&self) -> Difficulty {
        self.difficulty
    }

    /// Change the level. The cache is cleared.
    pub fn set_difficulty(&mut self, difficulty: Difficulty) {
        self.difficulty = difficulty;
        self.tt.clear();
    }

    /// Statistics of the last search.
    pub fn stats(&self) -> SearchStats {
        self.stats
    }

    /// Entries currently in the transposition cache.
    pub fn cache_len(&self) -> usize {
        self.tt.len()
    }

    fn clear_tables(&mut self) {
        self.tt.clear();
        self.killers.clear();
        self.history.clear();
    }

    /// Suggest a move for the side to move. Same search as `best_move`.
    pub fn hint(&mut self, game: &Game) -> Option<Move> {
        self.best_move(game)
    }

    /// Evaluation plus the move the engine would play.
    pub fn analyze_position(&mut self, game: &Game) -> Analysis {
        let board = game.position();
        let evaluation = game_over_score(board, game.is_threefold_repetition())
            .unwrap_or_else(|| {
                static_eval(board) + noise(&mut self.rng, self.difficulty.noise_amplitude())
            });
        let best_move = self.best_move(game);

        Analysis {
            evaluation,
            best_move,
            color: game.turn(),
            is_winning: evaluation.abs() > WINNING_THRESHOLD,
            advantage: if evaluation > 0.0 {
                Color::White
            } else {
                Color::Black
            },
        }
    }

    /// Root search at an explicit depth.
    ///
    /// Clears the cache, killer and history tables, then searches every root
    /// move with a full window. White keeps the maximum, Black the minimum;
    /// ties keep the first move in search order.
    pub fn search_fixed_depth(
        &mut self,
        game: &Game,
        depth: u32,
    ) -> Result<SearchOutcome, SearchError> {
        if depth == 0 {
            return Err(SearchError::ZeroDepth);
        }
        self.clear_tables();
        let start = Instant::now();

        let board = *game.position();
        let mut moves = game.legal_moves();
        if moves.is_empty() {
            return Err(SearchError::NoLegalMoves);
        }
        order_moves(&board, &mut moves, depth, &self.killers, &self.history);

        #[cfg(test)]
        {
            use crate::engine::types::Square;
            let empty = Square::all().find(|&sq| board.get(sq).is_none());
            if self.inject_fault
                && let Some(from) = empty
            {
                moves.insert(0, Move::new(from, moves[0].to));
            }
        }

        let root_white = board.side_to_move == Color::White;
        let mut ctx = SearchContext {
            tt: &mut self.tt,
            killers: &mut self.killers,
            history: &mut self.history,
            rng: &mut self.rng,
            noise_amplitude: self.difficulty.noise_amplitude(),
            path: game.position_keys().collect(),
            saw_repetition: false,
            stats: SearchStats {
                depth,
                ..SearchStats::default()
            },
        };

        let mut best: Option<(Move, f64)> = None;
        for mv in moves {
            let child = ctx.play(&board, mv)?;
            let maximizing = child.side_to_move == Color::White;
            let score = ctx.minimax(
                &child,
                depth - 1,
                f64::NEG_INFINITY,
                f64::INFINITY,
                maximizing,
            );
            ctx.path.pop();
            let score = score?;

            let improves = best.is_none_or(|(_, b)| {
                if root_white { score > b } else { score < b }
            });
            if improves {
                best = Some((mv, score));
            }
        }

        let (best_move, score) = best.ok_or(SearchError::NoLegalMoves)?;
        let mut stats = ctx.stats;
        stats.score = score;
        stats.time_ms = start.elapsed().as_millis() as u64;
        self.stats = stats;

        debug!(
            entries = self.tt.len(),
            hits = stats.cache_hits,
            cutoffs = stats.cutoffs,
            "transposition cache"
        );

        Ok(SearchOutcome {
            best_move,
            score,
            stats,
        })
    }
}

impl Default for MinimaxAi {
    fn default() -> Self {
        Self::new(Difficulty::default())
    }
}

impl AiEngine for MinimaxAi {
    /// Clear the tables, return the only move if there is one, otherwise
    /// search at the difficulty's depth. A search fault falls back to a
    /// random legal move.
    fn best_move(&mut self, game: &Game) -> Option<Move> {
        self.clear_tables();
        self.stats = SearchStats::default();

        let moves = game.legal_moves();
        match moves.as_slice() {
            [] => return None,
            [only] => return Some(*only),
            _ => {}
        }

        match self.search_fixed_depth(game, self.difficulty.depth()) {
            Ok(outcome) => {
                info!(
                    best = %outcome.best_move,
                    score = outcome.score,
                    nodes = outcome.stats.nodes,
                    depth = outcome.stats.depth,
                    time_ms = outcome.stats.time_ms,
                    "search complete"
                );
                Some(outcome.best_move)
            }
            Err(e) => {
                warn!(error = %e, "search failed, playing a random legal move");
                moves.choose(&mut self.rng).copied()
            }
        }
    }

    fn name(&self) -> &str {
        "MinimaxAi"
    }
}

// =========================================================================
// Tests
// =========================================================================
