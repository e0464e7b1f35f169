//! Stateful game session wrapping `Board`.
//!
//! `Game` owns one board, an append-only history of `MoveResult`s, and the
//! pieces each side has lost. Status is never stored: every query derives it
//! from the board and the recorded positions. Cloning a `Game` gives a fully
//! independent session.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::engine::attacks;
use crate::engine::board::Board;
use crate::engine::movegen::{self, UndoInfo};
use crate::engine::san;
use crate::engine::status;
use crate::engine::types::{
    ChessError, Color, GameStatus, Move, Piece, PieceType, RuleSet, Square,
};

// =========================================================================
// MoveRequest
// =========================================================================

/// A move as a caller asks for it: squares plus an optional promotion.
///
/// Flags are never supplied by the caller; the request is matched against
/// the generated legal moves.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MoveRequest {
    pub from: Square,
    pub to: Square,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub promotion: Option<PieceType>,
}

impl MoveRequest {
    pub fn new(from: Square, to: Square) -> Self {
        MoveRequest {
            from,
            to,
            promotion: None,
        }
    }

    pub fn with_promotion(from: Square, to: Square, promotion: PieceType) -> Self {
        MoveRequest {
            from,
            to,
            promotion: Some(promotion),
        }
    }

    /// Parse coordinate notation: `e2e4`, `e2-e4`, `e7e8q`, `e7e8=q`.
    pub fn parse(text: &str) -> Result<Self, ChessError> {
        let compact: String = text
            .trim()
            .chars()
            .filter(|&c| c != '-' && c != '=')
            .collect();
        if !compact.is_ascii() || !(4..=5).contains(&compact.len()) {
            return Err(ChessError::InvalidSquare(text.trim().to_string()));
        }
        let from: Square = compact[0..2].parse()?;
        let to: Square = compact[2..4].parse()?;
        let promotion = match compact[4..].chars().next() {
            None => None,
            Some(c) => Some(
                PieceType::from_letter(c)
                    .ok_or_else(|| ChessError::InvalidPromotion(c.to_string()))?,
            ),
        };
        Ok(MoveRequest {
            from,
            to,
            promotion,
        })
    }
}

impl From<Move> for MoveRequest {
    fn from(mv: Move) -> Self {
        MoveRequest {
            from: mv.from,
            to: mv.to,
            promotion: mv.promotion,
        }
    }
}

// =========================================================================
// MoveResult
// =========================================================================

/// One entry of the game history.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct MoveResult {
    pub from: Square,
    pub to: Square,
    /// The piece type that moved (a pawn, for promotions).
    pub piece: PieceType,
    pub color: Color,
    pub captured: Option<PieceType>,
    pub promotion: Option<PieceType>,
    /// SAN, including the `+`/`#` suffix.
    pub san: String,
    /// FEN of the position after the move.
    pub fen: String,

    #[serde(skip)]
    pub(crate) mv: Move,
    #[serde(skip)]
    pub(crate) undo: UndoInfo,
    /// Zobrist fingerprint of the position after the move.
    #[serde(skip)]
    pub(crate) key: u64,
}

impl MoveResult {
    /// The generated move this entry applied.
    pub fn as_move(&self) -> Move {
        self.mv
    }
}

// =========================================================================
// Captures and material
// =========================================================================

/// Pieces lost so far, listed under the color that lost them.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct CapturedPieces {
    pub white: Vec<PieceType>,
    pub black: Vec<PieceType>,
}

impl CapturedPieces {
    fn list_mut(&mut self, loser: Color) -> &mut Vec<PieceType> {
        match loser {
            Color::White => &mut self.white,
            Color::Black => &mut self.black,
        }
    }

    pub fn lost_by(&self, color: Color) -> &[PieceType] {
        match color {
            Color::White => &self.white,
            Color::Black => &self.black,
        }
    }
}

/// Material on the board per side, on the 1/3/3/5/9 scale.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct MaterialCount {
    pub white: u32,
    pub black: u32,
}

// =========================================================================
// Game
// =========================================================================

/// A chess game session with history, undo, and derived status.
#[derive(Clone, Debug)]
pub struct Game {
    board: Board,
    history: Vec<MoveResult>,
    captured: CapturedPieces,

    // Metadata for PGN export.
    pub white_player: String,
    pub black_player: String,
    pub created_at: DateTime<Utc>,
    starting_fen: Option<String>,
}

impl Game {
    // -----------------------------------------------------------------
    // Constructors
    // -----------------------------------------------------------------

    /// A new game from the standard starting position, minimal rules.
    pub fn new() -> Self {
        Self::with_rules(RuleSet::default())
    }

    /// A new game from the standard starting position.
    pub fn with_rules(rules: RuleSet) -> Self {
        Self::from_board(Board::starting(rules), None)
    }

    /// A game starting from a FEN position.
    pub fn from_fen(fen: &str, rules: RuleSet) -> Result<Self, ChessError> {
        let board = Board::from_fen(fen, rules)?;
        Ok(Self::from_board(board, Some(fen.trim().to_string())))
    }

    fn from_board(board: Board, starting_fen: Option<String>) -> Self {
        Game {
            board,
            history: Vec::new(),
            captured: CapturedPieces::default(),
            white_player: "Player".into(),
            black_player: "Player".into(),
            created_at: Utc::now(),
            starting_fen,
        }
    }

    /// Replace the position with a FEN, clearing history and captures.
    /// On error the game is left untouched.
    pub fn load_fen(&mut self, fen: &str) -> Result<(), ChessError> {
        let board = Board::from_fen(fen, self.board.rules)?;
        self.board = board;
        self.history.clear();
        self.captured = CapturedPieces::default();
        self.starting_fen = Some(fen.trim().to_string());
        Ok(())
    }

    /// Back to the standard starting position under the same rules.
    pub fn reset(&mut self) {
        self.board = Board::starting(self.board.rules);
        self.history.clear();
        self.captured = CapturedPieces::default();
        self.starting_fen = None;
    }

    // -----------------------------------------------------------------
    // Accessors
    // -----------------------------------------------------------------

    /// Current board position.
    pub fn position(&self) -> &Board {
        &self.board
    }

    pub fn rules(&self) -> RuleSet {
        self.board.rules
    }

    /// Side to move.
    pub fn turn(&self) -> Color {
        self.board.side_to_move
    }

    /// Piece on a square.
    pub fn get(&self, sq: Square) -> Option<Piece> {
        self.board.get(sq)
    }

    /// Completed moves, oldest first.
    pub fn history(&self) -> &[MoveResult] {
        &self.history
    }

    /// History as SAN strings.
    pub fn history_san(&self) -> Vec<String> {
        self.history.iter().map(|r| r.san.clone()).collect()
    }

    pub fn captured_pieces(&self) -> &CapturedPieces {
        &self.captured
    }

    /// The FEN this game was set up from, if not the standard start.
    pub fn starting_fen(&self) -> Option<&str> {
        self.starting_fen.as_deref()
    }

    /// ⌊plies / 2⌋ + 1.
    pub fn fullmove_number(&self) -> usize {
        self.history.len() / 2 + 1
    }

    /// Current position as FEN.
    pub fn fen(&self) -> String {
        self.board.to_fen(self.fullmove_number())
    }

    /// Minimal PGN of the game so far.
    pub fn pgn(&self) -> String {
        crate::engine::pgn::to_pgn(self)
    }

    /// Fingerprints of every position recorded in history, oldest first.
    pub(crate) fn position_keys(&self) -> impl Iterator<Item = u64> + '_ {
        self.history.iter().map(|r| r.key)
    }

    // -----------------------------------------------------------------
    // Move queries
    // -----------------------------------------------------------------

    /// Legal moves for the side to move, optionally only from `square`.
    pub fn moves(&self, square: Option<Square>) -> Vec<Move> {
        match square {
            Some(sq) => movegen::legal_moves_from(&self.board, sq),
            None => movegen::legal_moves(&self.board),
        }
    }

    /// All legal moves for the side to move.
    pub fn legal_moves(&self) -> Vec<Move> {
        self.moves(None)
    }

    /// Destination squares reachable from `square`, without duplicates.
    pub fn move_targets(&self, square: Square) -> Vec<Square> {
        let mut targets: Vec<Square> = self.moves(Some(square)).iter().map(|m| m.to).collect();
        targets.dedup();
        targets
    }

    /// Distinct destinations of `color`'s legal moves.
    pub fn attacked_squares(&self, color: Color) -> Vec<Square> {
        let mut seen = [false; 64];
        let mut squares = Vec::new();
        for mv in movegen::legal_moves_for(&self.board, color) {
            if !seen[mv.to.index()] {
                seen[mv.to.index()] = true;
                squares.push(mv.to);
            }
        }
        squares
    }

    /// Would this request be accepted? Runs on a throwaway copy.
    pub fn is_legal_move(&self, request: &MoveRequest) -> bool {
        self.clone().try_move(request).is_ok()
    }

    // -----------------------------------------------------------------
    // Making moves
    // -----------------------------------------------------------------

    /// Play a move. `None` means no move was made; the reason is logged.
    pub fn make_move(&mut self, request: &MoveRequest) -> Option<MoveResult> {
        self.try_move(request)
            .inspect_err(|e| debug!(from = %request.from, to = %request.to, "move rejected: {e}"))
            .ok()
    }

    /// Play a move given in SAN. `None` means no move was made.
    pub fn make_san(&mut self, text: &str) -> Option<MoveResult> {
        self.try_move_san(text)
            .inspect_err(|e| debug!(san = text, "move rejected: {e}"))
            .ok()
    }

    /// Play a move given in SAN, reporting why it was rejected.
    pub fn try_move_san(&mut self, text: &str) -> Result<MoveResult, ChessError> {
        let mv = san::parse_san(&self.board, text)?;
        Ok(self.push(mv))
    }

    /// Validate and play a move, reporting why it was rejected.
    pub fn try_move(&mut self, request: &MoveRequest) -> Result<MoveResult, ChessError> {
        let mv = self.resolve(request)?;
        Ok(self.push(mv))
    }

    /// Match a request against the legal moves, in the order a player
    /// would hear about the problem.
    fn resolve(&self, request: &MoveRequest) -> Result<Move, ChessError> {
        let board = &self.board;
        let turn = board.side_to_move;
        let (from, to) = (request.from, request.to);

        let piece = board.get(from).ok_or(ChessError::EmptySquare(from))?;
        if piece.color != turn {
            return Err(ChessError::WrongTurn {
                square: from,
                color: piece.color,
                turn,
            });
        }
        if board.get(to).is_some_and(|p| p.color == turn) {
            return Err(ChessError::OwnPieceCapture { to });
        }

        let promotion = if board.rules.is_standard() {
            match request.promotion {
                Some(pt) if !pt.is_promotion_target() => {
                    return Err(ChessError::InvalidPromotion(pt.to_string()));
                }
                Some(pt) => Some(pt),
                None => Some(PieceType::Queen),
            }
        } else {
            None
        };

        let candidate = movegen::pseudo_legal_moves_from(board, from)
            .into_iter()
            .find(|m| m.to == to && (m.promotion.is_none() || m.promotion == promotion))
            .ok_or(ChessError::IllegalMove {
                piece: piece.kind,
                from,
                to,
            })?;

        if !movegen::is_safe(board, candidate) {
            return Err(ChessError::LeavesKingInCheck { from, to });
        }
        Ok(candidate)
    }

    /// Apply a move known to be legal and record it.
    fn push(&mut self, mv: Move) -> MoveResult {
        let legal = movegen::legal_moves(&self.board);
        let mut notation = san::move_to_san(&self.board, mv, &legal);

        let mover = self.board.get(mv.from);
        let color = self.board.side_to_move;
        let undo = movegen::apply_move(&mut self.board, mv);
        notation.push_str(san::check_suffix(&self.board));

        let captured = undo.captured.map(|p| p.kind);
        if let Some(kind) = captured {
            self.captured.list_mut(!color).push(kind);
        }

        let promotion = match (mover, self.board.get(mv.to)) {
            (Some(before), Some(after)) if before.kind != after.kind => Some(after.kind),
            _ => None,
        };

        let plies = self.history.len() + 1;
        let result = MoveResult {
            from: mv.from,
            to: mv.to,
            piece: mover.map_or(PieceType::Pawn, |p| p.kind),
            color,
            captured,
            promotion,
            san: notation,
            fen: self.board.to_fen(plies / 2 + 1),
            mv,
            undo,
            key: self.board.zobrist(),
        };
        self.history.push(result.clone());
        result
    }

    // -----------------------------------------------------------------
    // Undo
    // -----------------------------------------------------------------

    /// Take back the last move. `None` when there is nothing to undo.
    pub fn undo(&mut self) -> Option<MoveResult> {
        self.try_undo().ok()
    }

    /// Take back the last move, or `NothingToUndo`.
    pub fn try_undo(&mut self) -> Result<MoveResult, ChessError> {
        let record = self.history.pop().ok_or(ChessError::NothingToUndo)?;
        movegen::revert_move(&mut self.board, record.mv, &record.undo);
        if record.captured.is_some() {
            self.captured.list_mut(!record.color).pop();
        }
        Ok(record)
    }

    // -----------------------------------------------------------------
    // Status
    // -----------------------------------------------------------------

    /// Current status, derived from the board and history.
    pub fn status(&self) -> GameStatus {
        status::classify(&self.board, self.is_threefold_repetition())
    }

    /// Is the side to move in check?
    pub fn in_check(&self) -> bool {
        attacks::in_check(&self.board, self.board.side_to_move)
    }

    pub fn is_checkmate(&self) -> bool {
        self.status() == GameStatus::Checkmate
    }

    pub fn is_stalemate(&self) -> bool {
        self.status() == GameStatus::Stalemate
    }

    /// Stalemate, insufficient material, or threefold repetition.
    pub fn is_draw(&self) -> bool {
        self.status().is_draw()
    }

    pub fn is_game_over(&self) -> bool {
        self.status().is_game_over()
    }

    pub fn is_insufficient_material(&self) -> bool {
        status::is_insufficient_material(&self.board)
    }

    /// Three recorded moves leading to the same position (placement, side,
    /// castling, en passant; counters ignored).
    pub fn is_threefold_repetition(&self) -> bool {
        status::has_threefold(self.history.iter().map(|r| position_part(&r.fen)))
    }

    /// Material per side on the 1/3/3/5/9 scale.
    pub fn material_count(&self) -> MaterialCount {
        let mut count = MaterialCount::default();
        for (_, piece) in self.board.pieces() {
            match piece.color {
                Color::White => count.white += piece.kind.points(),
                Color::Black => count.black += piece.kind.points(),
            }
        }
        count
    }

    // -----------------------------------------------------------------
    // Board array (for presentation layers)
    // -----------------------------------------------------------------

    /// 8×8 board, rank 8 first, `None` for empty squares.
    pub fn board(&self) -> [[Option<Piece>; 8]; 8] {
        self.board.board_array()
    }
}

/// FEN without its two counter fields.
fn position_part(fen: &str) -> &str {
    fen.rsplitn(3, ' ').nth(2).unwrap_or(fen)
}

impl Default for Game {
    fn default() -> Self {
        Self::new()
    }
}

// =========================================================================
// Tests
// =========================================================================
