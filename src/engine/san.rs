//! Standard Algebraic Notation (SAN) generation and parsing.
//!
//! SAN examples: `e4`, `Nf3`, `Bxe5`, `O-O`, `e8=Q+`, `Raxd1#`.

use crate::engine::attacks::in_check;
use crate::engine::board::Board;
use crate::engine::movegen::{self, has_legal_move};
use crate::engine::types::{ChessError, Move, PieceType, Square};

// =========================================================================
// SAN generation
// =========================================================================

/// Convert a move to SAN notation, without the `+`/`#` suffix.
///
/// `legal_moves` is the full legal list of the position, passed in to avoid
/// generating it twice. The suffix is added by [`check_suffix`] once the
/// move has been applied.
pub fn move_to_san(board: &Board, mv: Move, legal_moves: &[Move]) -> String {
    if mv.flags.is_castling() {
        return if mv.to.file() > mv.from.file() {
            "O-O".into()
        } else {
            "O-O-O".into()
        };
    }

    let Some(piece) = board.get(mv.from).map(|p| p.kind) else {
        return mv.to_string();
    };

    let mut san = String::with_capacity(8);

    if piece == PieceType::Pawn {
        if mv.flags.is_capture() {
            san.push(file_char(mv.from));
            san.push('x');
        }
        san.push_str(&mv.to.to_algebraic());

        if let Some(promo) = mv.promotion
            && board.rules.is_standard()
        {
            san.push('=');
            san.push(piece_letter(promo));
        }
    } else {
        san.push(piece_letter(piece));
        san.push_str(&disambiguation(board, mv, piece, legal_moves));
        if mv.flags.is_capture() {
            san.push('x');
        }
        san.push_str(&mv.to.to_algebraic());
    }

    san
}

/// `#` if the side to move on `after` is mated, `+` if merely in check.
pub fn check_suffix(after: &Board) -> &'static str {
    if !in_check(after, after.side_to_move) {
        ""
    } else if has_legal_move(after) {
        "+"
    } else {
        "#"
    }
}

/// File, rank, or both, when another piece of the same type could also
/// reach the destination.
fn disambiguation(board: &Board, mv: Move, piece: PieceType, legal_moves: &[Move]) -> String {
    let rivals: Vec<&Move> = legal_moves
        .iter()
        .filter(|m| {
            m.to == mv.to
                && m.from != mv.from
                && !m.flags.is_castling()
                && board.get(m.from).map(|p| p.kind) == Some(piece)
        })
        .collect();

    if rivals.is_empty() {
        return String::new();
    }

    let same_file = rivals.iter().any(|m| m.from.file() == mv.from.file());
    let same_rank = rivals.iter().any(|m| m.from.rank() == mv.from.rank());

    match (same_file, same_rank) {
        (false, _) => file_char(mv.from).to_string(),
        (true, false) => rank_char(mv.from).to_string(),
        (true, true) => mv.from.to_algebraic(),
    }
}

fn file_char(sq: Square) -> char {
    (b'a' + sq.file()) as char
}

fn rank_char(sq: Square) -> char {
    (b'1' + sq.rank()) as char
}

fn piece_letter(pt: PieceType) -> char {
    pt.letter().to_ascii_uppercase()
}

// =========================================================================
// SAN parsing
// =========================================================================

/// Parse a SAN string and return the matching legal move.
///
/// Check/annotation suffixes (`+`, `#`, `!`, `?`) are ignored. Under
/// `RuleSet::Minimal` a promotion suffix is accepted and ignored.
pub fn parse_san(board: &Board, san: &str) -> Result<Move, ChessError> {
    let legal = movegen::legal_moves(board);
    let text = san.trim().trim_end_matches(['+', '#', '!', '?']);
    let invalid = || ChessError::InvalidSan(san.to_string());

    if text == "O-O" || text == "0-0" {
        return find_castling(&legal, true).ok_or_else(invalid);
    }
    if text == "O-O-O" || text == "0-0-0" {
        return find_castling(&legal, false).ok_or_else(invalid);
    }

    let chars: Vec<char> = text.chars().collect();
    if chars.len() < 2 {
        return Err(invalid());
    }

    // Promotion suffix "=Q".
    let (chars, promotion) = if chars.len() >= 4 && chars[chars.len() - 2] == '=' {
        let promo_char = chars[chars.len() - 1];
        let promo = PieceType::from_letter(promo_char)
            .filter(|pt| pt.is_promotion_target())
            .ok_or_else(|| ChessError::InvalidPromotion(promo_char.to_string()))?;
        (&chars[..chars.len() - 2], Some(promo))
    } else {
        (&chars[..], None)
    };

    let (piece, rest) = match chars[0] {
        'N' | 'B' | 'R' | 'Q' | 'K' => match PieceType::from_letter(chars[0]) {
            Some(pt) => (pt, &chars[1..]),
            None => return Err(invalid()),
        },
        _ => (PieceType::Pawn, chars),
    };

    let rest: Vec<char> = rest.iter().copied().filter(|&c| c != 'x').collect();
    if rest.len() < 2 {
        return Err(invalid());
    }

    let dest_str: String = rest[rest.len() - 2..].iter().collect();
    let dest = Square::from_algebraic(&dest_str).ok_or_else(invalid)?;

    let hints = &rest[..rest.len() - 2];
    let is_hint = |c: &char| ('a'..='h').contains(c) || ('1'..='8').contains(c);
    if hints.len() > 2 || !hints.iter().all(is_hint) {
        return Err(invalid());
    }
    let hint_file = hints
        .iter()
        .find(|c| ('a'..='h').contains(c))
        .map(|&c| c as u8 - b'a');
    let hint_rank = hints
        .iter()
        .find(|c| ('1'..='8').contains(c))
        .map(|&c| c as u8 - b'1');
    let want_promotion = promotion.filter(|_| board.rules.is_standard());

    let candidates: Vec<&Move> = legal
        .iter()
        .filter(|m| {
            m.to == dest
                && !m.flags.is_castling()
                && board.get(m.from).map(|p| p.kind) == Some(piece)
                && hint_file.is_none_or(|f| m.from.file() == f)
                && hint_rank.is_none_or(|r| m.from.rank() == r)
                && match want_promotion {
                    Some(promo) => m.promotion == Some(promo),
                    None => m.promotion.is_none() || m.promotion == Some(PieceType::Queen),
                }
        })
        .collect();

    match candidates.as_slice() {
        [only] => Ok(**only),
        _ => Err(invalid()),
    }
}

fn find_castling(legal: &[Move], kingside: bool) -> Option<Move> {
    let target_file = if kingside { 6 } else { 2 };
    legal
        .iter()
        .find(|m| m.flags.is_castling() && m.to.file() == target_file)
        .copied()
}

// =========================================================================
// Tests
// =========================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::movegen::apply_move;
    use crate::engine::types::{MoveFlags, RuleSet};

    fn sq(name: &str) -> Square {
        Square::from_algebraic(name).unwrap()
    }

    fn board(fen: &str) -> Board {
        Board::from_fen(fen, RuleSet::Standard).unwrap()
    }

    fn san(fen: &str, from: &str, to: &str) -> String {
        let b = board(fen);
        let legal = movegen::legal_moves(&b);
        let mv = *legal
            .iter()
            .find(|m| m.from == sq(from) && m.to == sq(to))
            .unwrap();
        move_to_san(&b, mv, &legal)
    }

    const START: &str = "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1";

    // -------------------------------------------------------------------
    // Generation
    // -------------------------------------------------------------------

    #[test]
    fn san_pawn_push() {
        assert_eq!(san(START, "e2", "e4"), "e4");
    }

    #[test]
    fn san_knight_move() {
        assert_eq!(san(START, "g1", "f3"), "Nf3");
    }

    #[test]
    fn san_pawn_capture() {
        assert_eq!(
            san("rnbqkbnr/ppp1pppp/8/3p4/4P3/8/PPPP1PPP/RNBQKBNR w KQkq - 0 2", "e4", "d5"),
            "exd5"
        );
    }

    #[test]
    fn san_piece_capture() {
        assert_eq!(san("4k3/8/8/3r4/8/8/3Q4/4K3 w - - 0 1", "d2", "d5"), "Qxd5");
    }

    #[test]
    fn san_castling() {
        let fen = "r3k2r/8/8/8/8/8/8/R3K2R w KQkq - 0 1";
        assert_eq!(san(fen, "e1", "g1"), "O-O");
        assert_eq!(san(fen, "e1", "c1"), "O-O-O");
    }

    #[test]
    fn san_promotion() {
        let b = board("7k/4P3/8/8/8/8/8/4K3 w - - 0 1");
        let legal = movegen::legal_moves(&b);
        let mv = Move::with_promotion(sq("e7"), sq("e8"), PieceType::Knight, MoveFlags::NONE);
        assert_eq!(move_to_san(&b, mv, &legal), "e8=N");
    }

    #[test]
    fn san_file_disambiguation() {
        assert_eq!(san("4k3/8/8/8/8/8/8/R3K2R w - - 0 1", "a1", "d1"), "Rad1");
    }

    #[test]
    fn san_rank_disambiguation() {
        assert_eq!(san("4k3/R7/8/8/8/8/8/R3K3 w - - 0 1", "a1", "a4"), "R1a4");
    }

    #[test]
    fn san_full_disambiguation() {
        assert_eq!(
            san("k7/8/8/8/8/2Q1Q3/8/2Q1K3 w - - 0 1", "c3", "d2"),
            "Qc3d2"
        );
    }

    #[test]
    fn check_and_mate_suffixes() {
        let mut b = board("rnbqkbnr/pppp1ppp/8/4p3/6P1/5P2/PPPPP2P/RNBQKBNR b KQkq - 0 2");
        let mv = parse_san(&b, "Qh4").unwrap();
        apply_move(&mut b, mv);
        assert_eq!(check_suffix(&b), "#");

        let mut b = board("4k3/8/8/8/8/8/8/R3K3 w - - 0 1");
        let mv = parse_san(&b, "Ra8").unwrap();
        apply_move(&mut b, mv);
        assert_eq!(check_suffix(&b), "+");

        assert_eq!(check_suffix(&board(START)), "");
    }

    // -------------------------------------------------------------------
    // Parsing
    // -------------------------------------------------------------------

    #[test]
    fn parse_simple_moves() {
        let b = board(START);
        let mv = parse_san(&b, "e4").unwrap();
        assert_eq!((mv.from, mv.to), (sq("e2"), sq("e4")));
        let mv = parse_san(&b, "Nf3").unwrap();
        assert_eq!((mv.from, mv.to), (sq("g1"), sq("f3")));
    }

    #[test]
    fn parse_ignores_suffixes() {
        let b = board(START);
        assert_eq!(parse_san(&b, "Nc3+!?").unwrap().to, sq("c3"));
    }

    #[test]
    fn parse_castling() {
        let b = board("r3k2r/8/8/8/8/8/8/R3K2R w KQkq - 0 1");
        assert_eq!(parse_san(&b, "O-O").unwrap().to, sq("g1"));
        assert_eq!(parse_san(&b, "0-0-0").unwrap().to, sq("c1"));
    }

    #[test]
    fn parse_castling_unavailable() {
        let b = board(START);
        assert_eq!(
            parse_san(&b, "O-O"),
            Err(ChessError::InvalidSan("O-O".into()))
        );
    }

    #[test]
    fn parse_disambiguated() {
        let b = board("4k3/8/8/8/8/8/8/R3K2R w - - 0 1");
        assert_eq!(parse_san(&b, "Rad1").unwrap().from, sq("a1"));
        assert_eq!(parse_san(&b, "Rhf1").unwrap().from, sq("h1"));
        assert!(parse_san(&b, "Rd1").is_err(), "ambiguous without a hint");
    }

    #[test]
    fn parse_promotion() {
        let b = board("7k/4P3/8/8/8/8/8/4K3 w - - 0 1");
        assert_eq!(parse_san(&b, "e8=R").unwrap().promotion, Some(PieceType::Rook));
        assert_eq!(parse_san(&b, "e8").unwrap().promotion, Some(PieceType::Queen));
        assert_eq!(
            parse_san(&b, "e8=K"),
            Err(ChessError::InvalidPromotion("K".into()))
        );
    }

    #[test]
    fn parse_promotion_minimal_rules() {
        let b = Board::from_fen("7k/4P3/8/8/8/8/8/4K3 w - - 0 1", RuleSet::Minimal).unwrap();
        let mv = parse_san(&b, "e8=Q").unwrap();
        assert_eq!(mv.promotion, None);
        assert_eq!(mv.to, sq("e8"));
    }

    #[test]
    fn parse_rejects_garbage() {
        let b = board(START);
        for bad in ["", "x", "Zf3", "Nf9", "e5", "Ke2"] {
            assert!(parse_san(&b, bad).is_err(), "{bad:?} should not parse");
        }
    }

    #[test]
    fn every_start_move_round_trips() {
        let b = board(START);
        let legal = movegen::legal_moves(&b);
        for mv in &legal {
            let text = move_to_san(&b, *mv, &legal);
            assert_eq!(parse_san(&b, &text).unwrap(), *mv, "round trip of {text}");
        }
    }
}
