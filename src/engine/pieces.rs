//! Piece records and move classification.
//!
//! Every piece kind maps to a pure classifier through [`classifier`]. A
//! classifier answers one question about a `(from, to)` pair: what kind of
//! move would this be? In *active* mode the answer respects turn ownership and
//! forbids self-capture. In *passive* mode the question is "does this piece
//! attack `to`", which is what the board's targeting map is built from.

use crate::engine::board::Board;
use crate::engine::segments;
use crate::engine::types::{Color, MoveKind, PieceId, PieceType, Square};

// ---------------------------------------------------------------------------
// Piece
// ---------------------------------------------------------------------------

/// A piece in the board's arena. Pieces are never deleted: a capture sets
/// `captured`, and the piece keeps the last square it stood on.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Piece {
    pub id: PieceId,
    pub color: Color,
    pub kind: PieceType,
    pub square: Square,
    pub captured: bool,
    /// Ply on which the piece first moved. `Some(0)` marks pieces set up as
    /// already moved (a rook whose castling right is gone).
    pub first_moved_on: Option<usize>,
}

impl Piece {
    pub fn new(id: PieceId, color: Color, kind: PieceType, square: Square) -> Self {
        Piece {
            id,
            color,
            kind,
            square,
            captured: false,
            first_moved_on: None,
        }
    }

    #[inline]
    pub fn has_moved(&self) -> bool {
        self.first_moved_on.is_some()
    }

    #[inline]
    pub fn value(&self) -> u32 {
        self.kind.value()
    }

    #[inline]
    pub fn symbol(&self) -> char {
        self.kind.symbol(self.color)
    }
}

// ---------------------------------------------------------------------------
// Dispatch
// ---------------------------------------------------------------------------

/// Signature shared by every per-kind classifier.
pub type Classifier = fn(&Board, &Piece, Square, Square, bool) -> MoveKind;

/// Kind → classifier table.
pub fn classifier(kind: PieceType) -> Classifier {
    match kind {
        PieceType::Pawn => classify_pawn,
        PieceType::Knight => classify_knight,
        PieceType::Bishop => classify_bishop,
        PieceType::Rook => classify_rook,
        PieceType::Queen => classify_queen,
        PieceType::King => classify_king,
    }
}

/// Classify moving the occupant of `from` to `to`.
///
/// Returns `Invalid` when `from` is empty. Never returns `Promotion`; that
/// kind only comes from amending a pawn advance.
pub fn classify(board: &Board, from: Square, to: Square, passive: bool) -> MoveKind {
    if from == to {
        return MoveKind::Invalid;
    }
    let Some(piece) = board.piece_on(from) else {
        return MoveKind::Invalid;
    };
    if !passive {
        if piece.color != board.to_move() {
            return MoveKind::Invalid;
        }
        if board.piece_on(to).is_some_and(|other| other.color == piece.color) {
            return MoveKind::Invalid;
        }
    }
    classifier(piece.kind)(board, piece, from, to, passive)
}

#[inline]
fn deltas(from: Square, to: Square) -> (i8, i8) {
    (
        to.rank() as i8 - from.rank() as i8,
        to.file() as i8 - from.file() as i8,
    )
}

// ---------------------------------------------------------------------------
// Pawn
// ---------------------------------------------------------------------------

fn classify_pawn(board: &Board, piece: &Piece, from: Square, to: Square, passive: bool) -> MoveKind {
    let forward = piece.color.forward();
    let (dr, df) = deltas(from, to);

    if dr == forward && df.abs() == 1 {
        if passive {
            return MoveKind::Normal;
        }
        return if board.piece_on(to).is_some() {
            MoveKind::Normal
        } else if en_passant_available(board, piece, from, to) {
            MoveKind::EnPassant
        } else {
            MoveKind::Invalid
        };
    }

    // Pawns never attack straight ahead.
    if passive || df != 0 || !board.is_empty(to) {
        return MoveKind::Invalid;
    }
    if dr == forward {
        return MoveKind::Normal;
    }
    let path_clear = from.offset(forward, 0).is_some_and(|mid| board.is_empty(mid));
    if dr == 2 * forward && from.rank() == piece.color.pawn_rank() && path_clear {
        return MoveKind::Normal;
    }
    MoveKind::Invalid
}

/// En passant looks at the most recent move only: it must be an enemy pawn's
/// double step that landed beside `from` on the file of `to`.
fn en_passant_available(board: &Board, piece: &Piece, from: Square, to: Square) -> bool {
    let Some(last) = board.last_move() else {
        return false;
    };
    if last.kind != MoveKind::Normal {
        return false;
    }
    let swap = last.primary();
    let (Some(src), Some(dst)) = (swap.from, swap.to) else {
        return false;
    };
    let victim = board.piece(swap.piece);
    victim.kind == PieceType::Pawn
        && victim.color != piece.color
        && (dst.rank() as i8 - src.rank() as i8).abs() == 2
        && dst.rank() == from.rank()
        && dst.file() == to.file()
}

// ---------------------------------------------------------------------------
// Knight
// ---------------------------------------------------------------------------

fn classify_knight(_: &Board, _: &Piece, from: Square, to: Square, _: bool) -> MoveKind {
    match deltas(from, to) {
        (dr, df) if (dr.abs() == 2 && df.abs() == 1) || (dr.abs() == 1 && df.abs() == 2) => {
            MoveKind::Normal
        }
        _ => MoveKind::Invalid,
    }
}

// ---------------------------------------------------------------------------
// Sliders
// ---------------------------------------------------------------------------

fn classify_bishop(board: &Board, piece: &Piece, from: Square, to: Square, passive: bool) -> MoveKind {
    if segments::diagonal(board, piece, from, to, passive) {
        MoveKind::Normal
    } else {
        MoveKind::Invalid
    }
}

fn classify_rook(board: &Board, piece: &Piece, from: Square, to: Square, passive: bool) -> MoveKind {
    if segments::straight(board, piece, from, to, passive) {
        MoveKind::Normal
    } else {
        MoveKind::Invalid
    }
}

fn classify_queen(board: &Board, piece: &Piece, from: Square, to: Square, passive: bool) -> MoveKind {
    if segments::diagonal(board, piece, from, to, passive)
        || segments::straight(board, piece, from, to, passive)
    {
        MoveKind::Normal
    } else {
        MoveKind::Invalid
    }
}

// ---------------------------------------------------------------------------
// King
// ---------------------------------------------------------------------------

fn classify_king(board: &Board, piece: &Piece, from: Square, to: Square, passive: bool) -> MoveKind {
    let (dr, df) = deltas(from, to);
    if dr.abs() <= 1 && df.abs() <= 1 {
        return MoveKind::Normal;
    }
    if passive || dr != 0 || df.abs() != 2 {
        return MoveKind::Invalid;
    }
    classify_castle(board, piece, from, to, df.signum())
}

fn classify_castle(board: &Board, king: &Piece, from: Square, to: Square, dir: i8) -> MoveKind {
    if king.has_moved() {
        return MoveKind::Invalid;
    }
    let enemy = !king.color;
    let Some(transit) = from.offset(0, dir) else {
        return MoveKind::Invalid;
    };
    if [from, transit, to]
        .into_iter()
        .any(|sq| board.is_attacked(sq, enemy))
    {
        return MoveKind::Invalid;
    }
    match segments::find_castling_rook(board, from, dir) {
        Some(_) => MoveKind::Castle,
        None => MoveKind::Invalid,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn sq(name: &str) -> Square {
        Square::from_algebraic(name).unwrap()
    }

    fn board(fen: &str) -> Board {
        Board::from_fen(fen).unwrap()
    }

    #[test]
    fn empty_origin_is_invalid() {
        let b = Board::starting();
        assert_eq!(classify(&b, sq("e4"), sq("e5"), false), MoveKind::Invalid);
    }

    #[test]
    fn wrong_side_is_invalid_unless_passive() {
        let b = Board::starting();
        assert_eq!(classify(&b, sq("e7"), sq("e5"), false), MoveKind::Invalid);
        assert_eq!(classify(&b, sq("e7"), sq("d6"), true), MoveKind::Normal);
    }

    #[test]
    fn pawn_steps() {
        let b = Board::starting();
        assert_eq!(classify(&b, sq("e2"), sq("e3"), false), MoveKind::Normal);
        assert_eq!(classify(&b, sq("e2"), sq("e4"), false), MoveKind::Normal);
        assert_eq!(classify(&b, sq("e2"), sq("e5"), false), MoveKind::Invalid);
        assert_eq!(classify(&b, sq("e2"), sq("d3"), false), MoveKind::Invalid);
        assert_eq!(classify(&b, sq("e2"), sq("e1"), false), MoveKind::Invalid);
    }

    #[test]
    fn pawn_double_step_needs_clear_path_and_start_rank() {
        let b = board("4k3/8/8/8/8/4n3/4P3/4K3 w - - 0 1");
        assert_eq!(classify(&b, sq("e2"), sq("e4"), false), MoveKind::Invalid);
        let b = board("4k3/8/8/8/8/4P3/8/4K3 w - - 0 1");
        assert_eq!(classify(&b, sq("e3"), sq("e5"), false), MoveKind::Invalid);
    }

    #[test]
    fn pawn_capture_and_passive_reach() {
        let b = board("4k3/8/8/3p4/4P3/8/8/4K3 w - - 0 1");
        assert_eq!(classify(&b, sq("e4"), sq("d5"), false), MoveKind::Normal);
        assert_eq!(classify(&b, sq("e4"), sq("f5"), false), MoveKind::Invalid);
        assert_eq!(classify(&b, sq("e4"), sq("f5"), true), MoveKind::Normal);
        assert_eq!(classify(&b, sq("e4"), sq("e5"), true), MoveKind::Invalid);
    }

    #[test]
    fn knight_geometry_ignores_blockers() {
        let b = Board::starting();
        assert_eq!(classify(&b, sq("g1"), sq("f3"), false), MoveKind::Normal);
        assert_eq!(classify(&b, sq("g1"), sq("e2"), false), MoveKind::Invalid);
        assert_eq!(classify(&b, sq("g1"), sq("e2"), true), MoveKind::Normal);
        assert_eq!(classify(&b, sq("g1"), sq("g3"), false), MoveKind::Invalid);
    }

    #[test]
    fn sliders_are_blocked() {
        let b = Board::starting();
        assert_eq!(classify(&b, sq("f1"), sq("c4"), false), MoveKind::Invalid);
        assert_eq!(classify(&b, sq("a1"), sq("a3"), false), MoveKind::Invalid);
        assert_eq!(classify(&b, sq("d1"), sq("d3"), false), MoveKind::Invalid);
        let b = board("4k3/8/8/8/8/8/8/R2QK3 w - - 0 1");
        assert_eq!(classify(&b, sq("d1"), sq("h5"), false), MoveKind::Normal);
        assert_eq!(classify(&b, sq("d1"), sq("d8"), false), MoveKind::Normal);
        assert_eq!(classify(&b, sq("a1"), sq("e1"), false), MoveKind::Invalid);
        assert_eq!(classify(&b, sq("d1"), sq("e3"), false), MoveKind::Invalid);
    }

    #[test]
    fn king_single_steps() {
        let b = board("4k3/8/8/8/8/8/8/4K3 w - - 0 1");
        assert_eq!(classify(&b, sq("e1"), sq("d2"), false), MoveKind::Normal);
        assert_eq!(classify(&b, sq("e1"), sq("e3"), false), MoveKind::Invalid);
    }

    #[test]
    fn castling_needs_unmoved_rook_and_clear_path() {
        let b = board("r3k2r/8/8/8/8/8/8/R3K2R w KQkq - 0 1");
        assert_eq!(classify(&b, sq("e1"), sq("g1"), false), MoveKind::Castle);
        assert_eq!(classify(&b, sq("e1"), sq("c1"), false), MoveKind::Castle);

        let b = board("r3k2r/8/8/8/8/8/8/RN2K2R w KQkq - 0 1");
        assert_eq!(classify(&b, sq("e1"), sq("c1"), false), MoveKind::Invalid);

        let b = board("r3k2r/8/8/8/8/8/8/R3K2R w Qkq - 0 1");
        assert_eq!(classify(&b, sq("e1"), sq("g1"), false), MoveKind::Invalid);
        assert_eq!(classify(&b, sq("e1"), sq("c1"), false), MoveKind::Castle);
    }

    #[test]
    fn castling_refused_through_attacked_squares() {
        // Black rook on f8 covers f1, the kingside transit square.
        let b = board("4kr2/8/8/8/8/8/8/R3K2R w KQ - 0 1");
        assert_eq!(classify(&b, sq("e1"), sq("g1"), false), MoveKind::Invalid);
        assert_eq!(classify(&b, sq("e1"), sq("c1"), false), MoveKind::Castle);

        // In check: no castling either way.
        let b = board("4k3/4r3/8/8/8/8/8/R3K2R w KQ - 0 1");
        assert_eq!(classify(&b, sq("e1"), sq("g1"), false), MoveKind::Invalid);
        assert_eq!(classify(&b, sq("e1"), sq("c1"), false), MoveKind::Invalid);
    }

    #[test]
    fn passive_king_never_castles() {
        let b = board("r3k2r/8/8/8/8/8/8/R3K2R w KQkq - 0 1");
        assert_eq!(classify(&b, sq("e1"), sq("g1"), true), MoveKind::Invalid);
    }

    #[test]
    fn en_passant_only_right_after_double_step() {
        let mut b = board("4k3/3p4/8/4P3/8/8/8/4K3 b - - 0 1");
        assert!(b.attempt_move(sq("d7"), sq("d5")).is_valid());
        assert_eq!(classify(&b, sq("e5"), sq("d6"), false), MoveKind::EnPassant);
        assert_eq!(classify(&b, sq("e5"), sq("f6"), false), MoveKind::Invalid);

        let mut b = board("4k3/8/3p4/4P3/8/8/8/4K3 b - - 0 1");
        assert!(b.attempt_move(sq("d6"), sq("d5")).is_valid());
        assert_eq!(classify(&b, sq("e5"), sq("d6"), false), MoveKind::Invalid);
    }

    #[test]
    fn classifier_table_covers_every_kind() {
        let b = board("4k3/8/8/8/8/8/8/4K3 w - - 0 1");
        let king = b.piece_on(sq("e1")).unwrap();
        let f = classifier(PieceType::King);
        assert_eq!(f(&b, king, sq("e1"), sq("f2"), false), MoveKind::Normal);
        assert_eq!(
            classifier(PieceType::Knight)(&b, king, sq("e1"), sq("f3"), true),
            MoveKind::Normal
        );
    }
}
