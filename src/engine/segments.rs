//! Ray traversal for sliding pieces.
//!
//! Diagonal and straight segments are walked one square at a time from the
//! origin towards the target. An occupied square stops the walk, except in
//! passive mode where a friendly piece that forms a *battery* with the slider
//! lets the ray continue: the slider is then credited with attacking the
//! target exactly when the blocker itself attacks it.

use crate::engine::board::Board;
use crate::engine::pieces::{self, Piece};
use crate::engine::types::{PieceId, PieceType, Square};

/// Unit step from `from` towards `to` along a diagonal.
fn diagonal_step(from: Square, to: Square) -> Option<(i8, i8)> {
    let dr = to.rank() as i8 - from.rank() as i8;
    let df = to.file() as i8 - from.file() as i8;
    (dr != 0 && dr.abs() == df.abs()).then(|| (dr.signum(), df.signum()))
}

/// Unit step from `from` towards `to` along a rank or file.
fn straight_step(from: Square, to: Square) -> Option<(i8, i8)> {
    let dr = to.rank() as i8 - from.rank() as i8;
    let df = to.file() as i8 - from.file() as i8;
    ((dr == 0) != (df == 0)).then(|| (dr.signum(), df.signum()))
}

/// Squares after `start` in direction `(dr, df)` up to the board edge.
pub fn walk(start: Square, dr: i8, df: i8) -> impl Iterator<Item = Square> {
    std::iter::successors(start.offset(dr, df), move |sq| sq.offset(dr, df))
}

/// Can `slider` reach `to` from `from` along a diagonal?
pub fn diagonal(board: &Board, slider: &Piece, from: Square, to: Square, passive: bool) -> bool {
    match diagonal_step(from, to) {
        Some(step) => traverse(board, slider, from, to, step, passive, PieceType::Bishop),
        None => false,
    }
}

/// Can `slider` reach `to` from `from` along a rank or file?
pub fn straight(board: &Board, slider: &Piece, from: Square, to: Square, passive: bool) -> bool {
    match straight_step(from, to) {
        Some(step) => traverse(board, slider, from, to, step, passive, PieceType::Rook),
        None => false,
    }
}

fn traverse(
    board: &Board,
    slider: &Piece,
    from: Square,
    to: Square,
    (dr, df): (i8, i8),
    passive: bool,
    line: PieceType,
) -> bool {
    for sq in walk(from, dr, df) {
        if sq == to {
            return true;
        }
        if let Some(blocker) = board.piece_on(sq) {
            return passive
                && forms_battery(slider, blocker, line, dr)
                && pieces::classify(board, sq, to, true).is_valid();
        }
    }
    false
}

/// Whether `blocker` backs up `slider` on a ray of the given `line` kind
/// (bishop for diagonals, rook for ranks and files). Queens back up either
/// line; pawns back up a diagonal only when the ray runs the way they capture.
pub fn forms_battery(slider: &Piece, blocker: &Piece, line: PieceType, dr: i8) -> bool {
    if blocker.color != slider.color {
        return false;
    }
    match blocker.kind {
        PieceType::Queen => true,
        PieceType::Pawn => line == PieceType::Bishop && dr == blocker.color.forward(),
        kind => kind == line,
    }
}

/// Scan outward from the king in file direction `dir` for an unmoved friendly
/// rook with only empty squares in between.
pub fn find_castling_rook(board: &Board, king_sq: Square, dir: i8) -> Option<PieceId> {
    let king = board.piece_on(king_sq)?;
    for sq in walk(king_sq, 0, dir) {
        if let Some(piece) = board.piece_on(sq) {
            let usable =
                piece.kind == PieceType::Rook && piece.color == king.color && !piece.has_moved();
            return usable.then_some(piece.id);
        }
    }
    None
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
