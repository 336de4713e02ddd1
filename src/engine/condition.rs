//! Game condition evaluation.
//!
//! [`evaluate`] inspects a board (without changing it) and reports the
//! condition for the side to move. Rules are tried in a fixed priority order
//! and the first match wins:
//!
//! 1. fifty-move rule (no capture in the trailing window of plies)
//! 2. repetition (fixed 9-ply window heuristic)
//! 3. check / checkmate
//! 4. stalemate
//! 5. insufficient material
//! 6. pending promotion

use crate::engine::board::Board;
use crate::engine::types::{Color, DrawReason, GameCondition, Move, MoveKind, PieceType};

/// Length of the repetition window.
pub const REPETITION_WINDOW: usize = 9;

/// Non-king material strictly below this cannot force mate.
pub const MATERIAL_THRESHOLD: u32 = 5;

/// Compute the condition of `board` for the side to move.
pub fn evaluate(board: &Board) -> GameCondition {
    let history = board.history();

    if fifty_move_rule(history, board.rules().fifty_move_plies) {
        return GameCondition::Draw(DrawReason::FiftyMoveRule);
    }
    if repetition(history) {
        return GameCondition::Draw(DrawReason::Repetition);
    }

    let can_move = board.has_legal_move();
    if board.in_check(board.to_move()) {
        return if can_move {
            GameCondition::Check
        } else {
            GameCondition::Checkmate
        };
    }
    if !can_move {
        return GameCondition::Stalemate;
    }
    if insufficient_material(board) {
        return GameCondition::Draw(DrawReason::InsufficientMaterial);
    }
    if pending_promotion(board) {
        return GameCondition::PendingPromotion;
    }
    GameCondition::Normal
}

/// No capture in the last `window` plies.
pub fn fifty_move_rule(history: &[Move], window: usize) -> bool {
    window > 0
        && history.len() >= window
        && !history[history.len() - window..]
            .iter()
            .any(Move::is_capture)
}

/// Within the trailing nine plies, plies 0/4/8, 1/5, 2/6 and 3/7 are each
/// the same move.
pub fn repetition(history: &[Move]) -> bool {
    if history.len() < REPETITION_WINDOW {
        return false;
    }
    let w = &history[history.len() - REPETITION_WINDOW..];
    w[0].is_equivalent(&w[4])
        && w[4].is_equivalent(&w[8])
        && w[1].is_equivalent(&w[5])
        && w[2].is_equivalent(&w[6])
        && w[3].is_equivalent(&w[7])
}

/// Sum of piece values for `color` (kings count zero).
pub fn material(board: &Board, color: Color) -> u32 {
    board.active_pieces(color).map(|p| p.value()).sum()
}

/// Neither side has a pawn and each side's material is under the threshold.
pub fn insufficient_material(board: &Board) -> bool {
    [Color::White, Color::Black].into_iter().all(|color| {
        board
            .active_pieces(color)
            .all(|p| p.kind != PieceType::Pawn)
            && material(board, color) < MATERIAL_THRESHOLD
    })
}

/// The last move was a plain pawn advance (capturing or not) onto the
/// mover's promotion rank.
pub fn pending_promotion(board: &Board) -> bool {
    let Some(last) = board.last_move() else {
        return false;
    };
    if last.kind != MoveKind::Normal {
        return false;
    }
    let pawn = board.piece(last.mover());
    pawn.kind == PieceType::Pawn
        && last
            .destination()
            .is_some_and(|to| to.rank() == pawn.color.promotion_rank())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::board::Rules;
    use crate::engine::types::Square;

    fn sq(name: &str) -> Square {
        Square::from_algebraic(name).unwrap()
    }

    fn play_all(b: &mut Board, moves: &[(&str, &str)]) {
        for (from, to) in moves {
            assert!(
                b.attempt_move(sq(from), sq(to)).is_valid(),
                "{from}{to} was rejected"
            );
        }
    }

    const KNIGHT_SHUFFLE: [(&str, &str); 9] = [
        ("g1", "f3"),
        ("g8", "f6"),
        ("f3", "g1"),
        ("f6", "g8"),
        ("g1", "f3"),
        ("g8", "f6"),
        ("f3", "g1"),
        ("f6", "g8"),
        ("g1", "f3"),
    ];

    #[test]
    fn starting_position_is_normal() {
        assert_eq!(evaluate(&Board::starting()), GameCondition::Normal);
    }

    #[test]
    fn repetition_needs_the_full_window() {
        let mut b = Board::starting();
        play_all(&mut b, &KNIGHT_SHUFFLE[..8]);
        assert_eq!(b.condition(), GameCondition::Normal);
        play_all(&mut b, &KNIGHT_SHUFFLE[8..]);
        assert_eq!(b.condition(), GameCondition::Draw(DrawReason::Repetition));
        assert!(repetition(b.history()));
        assert_eq!(b.last_move().unwrap().notation.as_deref(), Some("Nf3="));
    }

    #[test]
    fn broken_alignment_is_not_repetition() {
        let mut b = Board::starting();
        play_all(&mut b, &KNIGHT_SHUFFLE[..8]);
        // Same knight, different square on the ninth ply.
        play_all(&mut b, &[("g1", "h3")]);
        assert!(!repetition(b.history()));
        assert_eq!(b.condition(), GameCondition::Normal);
    }

    #[test]
    fn fifty_move_window_is_configurable() {
        let mut b = Board::starting().with_rules(Rules {
            fifty_move_plies: 8,
        });
        play_all(&mut b, &KNIGHT_SHUFFLE[..7]);
        assert_eq!(b.condition(), GameCondition::Normal);
        play_all(&mut b, &KNIGHT_SHUFFLE[7..8]);
        assert_eq!(b.condition(), GameCondition::Draw(DrawReason::FiftyMoveRule));
    }

    #[test]
    fn fifty_move_window_resets_on_capture() {
        let mut b = Board::starting().with_rules(Rules {
            fifty_move_plies: 4,
        });
        play_all(&mut b, &[("e2", "e4"), ("d7", "d5"), ("e4", "d5")]);
        assert_eq!(b.condition(), GameCondition::Normal);
        play_all(&mut b, &[("g8", "f6"), ("g1", "f3"), ("b8", "c6")]);
        assert_eq!(b.condition(), GameCondition::Normal);
        play_all(&mut b, &[("b1", "c3")]);
        assert_eq!(b.condition(), GameCondition::Draw(DrawReason::FiftyMoveRule));
    }

    #[test]
    fn fools_mate_is_checkmate() {
        let mut b = Board::starting();
        play_all(
            &mut b,
            &[("f2", "f3"), ("e7", "e5"), ("g2", "g4"), ("d8", "h4")],
        );
        assert_eq!(b.condition(), GameCondition::Checkmate);
        assert_eq!(b.last_move().unwrap().notation.as_deref(), Some("Qh4#"));
    }

    #[test]
    fn check_with_escape_is_check() {
        let mut b = Board::starting();
        play_all(
            &mut b,
            &[("e2", "e4"), ("f7", "f6"), ("d1", "h5")],
        );
        assert_eq!(b.condition(), GameCondition::Check);
    }

    #[test]
    fn cornered_king_is_stalemated() {
        let mut b = Board::from_fen("7k/8/5Q2/8/8/8/8/K7 w - - 0 1").unwrap();
        play_all(&mut b, &[("f6", "f7")]);
        assert_eq!(b.condition(), GameCondition::Stalemate);
        assert!(b.condition().is_drawn());
        assert_eq!(b.last_move().unwrap().notation.as_deref(), Some("Qf7="));
    }

    #[test]
    fn insufficient_material_thresholds() {
        let b = Board::from_fen("4k3/8/8/8/8/8/8/3NK3 w - - 0 1").unwrap();
        assert_eq!(
            evaluate(&b),
            GameCondition::Draw(DrawReason::InsufficientMaterial)
        );
        let b = Board::from_fen("4k3/8/8/8/8/8/8/3RK3 w - - 0 1").unwrap();
        assert_eq!(evaluate(&b), GameCondition::Normal);
        let b = Board::from_fen("4k3/8/8/8/8/8/4P3/4K3 w - - 0 1").unwrap();
        assert_eq!(evaluate(&b), GameCondition::Normal);
        assert_eq!(material(&b, Color::White), 1);
    }

    #[test]
    fn capture_onto_last_rank_is_pending_promotion() {
        let mut b = Board::from_fen("4k3/8/8/8/8/8/1p6/R3K3 b - - 0 1").unwrap();
        play_all(&mut b, &[("b2", "a1")]);
        assert!(pending_promotion(&b));
        assert_eq!(b.condition(), GameCondition::PendingPromotion);
    }

    #[test]
    fn empty_history_has_no_pending_promotion() {
        let b = Board::from_fen("P3k3/8/8/8/8/8/8/4K3 b - - 0 1").unwrap();
        assert!(!pending_promotion(&b));
    }
}
