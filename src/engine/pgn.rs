//! PGN (Portable Game Notation) export.
//!
//! Produces PGN with the Seven Tag Roster and move text with move numbers.
//! Move numbers always start at 1: the fullmove counter of a loaded FEN is
//! not carried over.

use crate::engine::game::Game;
use crate::engine::types::{Color, GameStatus};

const LINE_WIDTH: usize = 80;

// =========================================================================
// PGN generation
// =========================================================================

/// Export a game as a PGN string.
pub fn to_pgn(game: &Game) -> String {
    let mut pgn = String::with_capacity(512);

    // Seven Tag Roster.
    let date = game.created_at.format("%Y.%m.%d").to_string();
    let result = result_string(game);

    pgn.push_str("[Event \"Casual Game\"]\n");
    pgn.push_str("[Site \"chess3d\"]\n");
    pgn.push_str(&format!("[Date \"{date}\"]\n"));
    pgn.push_str("[Round \"-\"]\n");
    pgn.push_str(&format!("[White \"{}\"]\n", game.white_player));
    pgn.push_str(&format!("[Black \"{}\"]\n", game.black_player));
    pgn.push_str(&format!("[Result \"{result}\"]\n"));

    if let Some(fen) = game.starting_fen() {
        pgn.push_str("[SetUp \"1\"]\n");
        pgn.push_str(&format!("[FEN \"{fen}\"]\n"));
    }

    pgn.push('\n');

    let history = game.history();
    let black_first = history.first().is_some_and(|r| r.color == Color::Black);
    let tokens = history.iter().enumerate().map(|(i, record)| {
        let number = (i + usize::from(black_first)) / 2 + 1;
        if record.color == Color::White {
            format!("{number}. {}", record.san)
        } else if i == 0 {
            format!("{number}... {}", record.san)
        } else {
            record.san.clone()
        }
    });

    let mut line = String::new();
    for token in tokens.chain(std::iter::once(result.to_string())) {
        if !line.is_empty() && line.len() + token.len() + 1 > LINE_WIDTH {
            pgn.push_str(&line);
            pgn.push('\n');
            line.clear();
        }
        if !line.is_empty() {
            line.push(' ');
        }
        line.push_str(&token);
    }
    pgn.push_str(&line);
    pgn.push('\n');

    pgn
}

/// PGN result token. On checkmate the side to move is the loser.
fn result_string(game: &Game) -> &'static str {
    match game.status() {
        GameStatus::Checkmate => match game.turn() {
            Color::White => "0-1",
            Color::Black => "1-0",
        },
        GameStatus::Stalemate | GameStatus::Draw(_) => "1/2-1/2",
        GameStatus::Active | GameStatus::Check => "*",
    }
}

// =========================================================================
// Tests
// =========================================================================
