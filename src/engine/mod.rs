pub mod attacks;
pub mod board;
pub mod game;
pub mod movegen;
pub mod pgn;
pub mod san;
pub mod status;
pub mod types;
pub mod zobrist;

pub use board::Board;
pub use game::{CapturedPieces, Game, MaterialCount, MoveRequest, MoveResult};
pub use movegen::{legal_moves, legal_moves_from};
pub use types::*;
