//! Rules engine, game session and minimax AI for a 3D chess game.
//!
//! The presentation layer lives elsewhere; this crate is the part that
//! knows chess.

pub mod ai;
pub mod config;
pub mod engine;
