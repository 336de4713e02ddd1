//! Scripted interactive moves with expected outcomes.
//!
//! Each entry is `(from, to, outcome)` with squares given as 1-based
//! `(rank, file)` pairs, the way a renderer reports clicks.

use swapchess::engine::board::Board;
use swapchess::engine::manual::{ManualBoard, MoveStage};
use swapchess::engine::types::{MoveKind, Square};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Outcome {
    /// Accepted as an ordinary move.
    Legal,
    /// Rejected by the piece's geometry or turn rules.
    Invalid,
    /// Geometrically fine but leaves the mover's own king attacked.
    SelfCheck,
    /// Accepted as castling.
    Castle,
}

use Outcome::*;

type Click = (u8, u8);

const MANUAL_GAME_MOVES: [(Click, Click, Outcome); 51] = [
    ((2, 5), (4, 5), Legal),
    // Invalid pawn movements
    ((7, 3), (6, 5), Invalid),
    ((7, 3), (6, 4), Invalid),
    ((7, 3), (6, 3), Legal),
    // Invalid knight movements
    ((1, 7), (3, 7), Invalid),
    ((1, 7), (4, 6), Invalid),
    // Invalid rook movements
    ((1, 8), (5, 8), Invalid),
    ((1, 8), (8, 8), Invalid),
    // Invalid bishop movements
    ((1, 6), (3, 8), Invalid),
    // Invalid queen movements
    ((1, 4), (3, 2), Invalid),
    ((1, 4), (5, 4), Invalid),
    ((1, 4), (4, 7), Legal),
    ((7, 5), (5, 5), Legal),
    ((4, 5), (5, 6), Invalid),
    ((4, 5), (5, 5), Invalid),
    ((4, 5), (5, 4), Invalid),
    ((1, 6), (2, 5), Legal),
    ((8, 6), (5, 3), Legal),
    ((2, 5), (5, 8), Invalid),
    ((4, 7), (1, 4), Invalid),
    ((1, 7), (3, 6), Legal),
    ((8, 7), (6, 6), Legal),
    ((4, 7), (8, 7), Invalid),
    ((4, 7), (7, 7), Legal),
    // King walks into check
    ((8, 5), (8, 6), SelfCheck),
    // King castles into check
    ((8, 5), (8, 7), Invalid),
    ((8, 5), (7, 5), Legal),
    ((2, 7), (4, 7), Legal),
    ((6, 6), (4, 7), Legal),
    ((2, 3), (4, 3), Legal),
    // Pinned piece
    ((7, 6), (6, 6), SelfCheck),
    ((7, 6), (5, 6), SelfCheck),
    ((5, 3), (6, 2), Legal),
    ((4, 3), (5, 3), Legal),
    ((7, 4), (5, 4), Legal),
    // En passant on the wrong square
    ((4, 5), (5, 6), Invalid),
    ((4, 5), (5, 5), Invalid),
    ((1, 5), (1, 7), Castle),
    ((8, 2), (6, 1), Legal),
    // En passant at the wrong time
    ((5, 3), (6, 4), Invalid),
    ((5, 3), (6, 4), Invalid),
    ((7, 7), (6, 6), Legal),
    ((7, 5), (8, 5), Legal),
    ((4, 5), (5, 4), Legal),
    // King cannot castle after moving
    ((8, 5), (8, 7), Invalid),
    ((8, 4), (6, 6), Legal),
    ((3, 6), (5, 5), Legal),
    ((6, 6), (6, 7), Legal),
    ((2, 4), (3, 4), Legal),
    ((4, 7), (3, 5), Legal),
    ((1, 7), (1, 8), Legal),
];

fn square((rank, file): Click) -> Square {
    Square::from_file_rank(file - 1, rank - 1)
}

fn expected_kind(outcome: Outcome, actual: MoveKind) -> bool {
    match outcome {
        Legal => matches!(actual, MoveKind::Normal | MoveKind::EnPassant),
        Castle => actual == MoveKind::Castle,
        Invalid | SelfCheck => actual == MoveKind::Invalid,
    }
}

#[test]
fn scripted_moves_match_expected_outcomes() {
    let mut board = ManualBoard::new(Board::starting());
    for (i, &(from, to, outcome)) in MANUAL_GAME_MOVES.iter().enumerate() {
        let before = board.board().ply();
        let kind = board.attempt_move(square(from), square(to));
        assert!(
            expected_kind(outcome, kind),
            "move {i} {}->{}: expected {outcome:?}, got {kind:?}",
            square(from),
            square(to)
        );
        let after = board.board().ply();
        if kind.is_valid() {
            assert_eq!(after, before + 1, "move {i}");
        } else {
            assert_eq!(after, before, "move {i} changed the history");
        }
    }

    let accepted = MANUAL_GAME_MOVES
        .iter()
        .filter(|(_, _, o)| matches!(o, Legal | Castle))
        .count();
    assert_eq!(board.board().ply(), accepted);
    assert_eq!(board.messages().len(), MANUAL_GAME_MOVES.len());
    assert_eq!(board.stage(), MoveStage::Idle);
}

#[test]
fn self_check_attempts_leave_the_position_untouched() {
    let mut board = ManualBoard::new(Board::starting());
    for &(from, to, outcome) in &MANUAL_GAME_MOVES {
        if outcome == SelfCheck {
            let fen = board.board().to_fen();
            let grid = board.board().grid().clone();
            board.attempt_move(square(from), square(to));
            assert_eq!(board.board().to_fen(), fen);
            assert_eq!(board.board().grid(), &grid);
        } else {
            board.attempt_move(square(from), square(to));
        }
    }
}

#[test]
fn scripted_moves_through_clicks() {
    let mut board = ManualBoard::new(Board::starting());
    for &(from, to, outcome) in &MANUAL_GAME_MOVES {
        board.select_and_advance(square(from)).unwrap();
        let result = board.select_and_advance(square(to)).unwrap();
        if let Some(kind) = result {
            assert!(expected_kind(outcome, kind));
        } else {
            // The origin was not a piece of the side to move, so nothing
            // was picked up and the second click selected nothing or a new
            // piece; either way no move was made.
            assert!(matches!(outcome, Invalid | SelfCheck));
            board.clear_selection();
        }
        assert_eq!(board.stage(), MoveStage::Idle);
    }

    let mut direct = Board::starting();
    for &(from, to, _) in &MANUAL_GAME_MOVES {
        direct.attempt_move(square(from), square(to));
    }
    assert_eq!(board.board().to_fen(), direct.to_fen());
    assert_eq!(board.board().condition(), direct.condition());
    assert_eq!(board.board().grid().selected(), None);
}

#[test]
fn scripted_game_undoes_cleanly() {
    let mut board = ManualBoard::new(Board::starting());
    for &(from, to, _) in &MANUAL_GAME_MOVES {
        board.attempt_move(square(from), square(to));
    }
    while board.board().ply() > 0 {
        board.undo().unwrap();
    }
    assert_eq!(board.board().to_fen(), Board::starting().to_fen());
}
