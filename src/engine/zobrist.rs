//! Zobrist keys for position fingerprints.
//!
//! Each aspect of a position (piece on square, side to move, castling rights,
//! en passant file) gets a random 64-bit key. The fingerprint is the XOR of
//! all applicable keys; the search uses it to key its transposition cache and
//! to spot repetitions along the current line.

use std::sync::OnceLock;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::engine::types::{Color, PieceType, Square};

/// 16 possible castling-rights bitmasks (0..15).
const CASTLING_KEYS: usize = 16;
/// 8 en-passant files (a..h). Only the file is hashed.
const EP_KEYS: usize = 8;
/// Fixed seed so fingerprints are identical across runs.
const SEED: u64 = 0x3243_F6A8_885A_308D;

/// Pre-computed Zobrist random keys (generated once via `OnceLock`).
pub struct ZobristKeys {
    /// piece\[color\]\[piece_type\]\[square\]
    pub piece: [[[u64; 64]; PieceType::COUNT]; 2],
    /// XOR this when it is Black's turn to move.
    pub side_to_move: u64,
    pub castling: [u64; CASTLING_KEYS],
    pub en_passant: [u64; EP_KEYS],
}

static ZOBRIST: OnceLock<ZobristKeys> = OnceLock::new();

/// Get a reference to the global Zobrist keys.
pub fn keys() -> &'static ZobristKeys {
    ZOBRIST.get_or_init(ZobristKeys::init)
}

impl ZobristKeys {
    fn init() -> Self {
        let mut rng = StdRng::seed_from_u64(SEED);

        let mut piece = [[[0u64; 64]; PieceType::COUNT]; 2];
        for color in &mut piece {
            for pt in color {
                for sq in pt {
                    *sq = rng.r#gen();
                }
            }
        }

        let side_to_move = rng.r#gen();

        let mut castling = [0u64; CASTLING_KEYS];
        // Key 0 stays zero: no rights, nothing to fold in.
        for key in castling.iter_mut().skip(1) {
            *key = rng.r#gen();
        }

        let mut en_passant = [0u64; EP_KEYS];
        for key in &mut en_passant {
            *key = rng.r#gen();
        }

        ZobristKeys {
            piece,
            side_to_move,
            castling,
            en_passant,
        }
    }

    #[inline]
    pub fn piece_key(&self, color: Color, piece: PieceType, sq: Square) -> u64 {
        self.piece[color.index()][piece.index()][sq.index()]
    }

    #[inline]
    pub fn ep_key(&self, file: u8) -> u64 {
        self.en_passant[file as usize]
    }

    #[inline]
    pub fn castling_key(&self, rights: u8) -> u64 {
        self.castling[rights as usize]
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
