use std::fmt;

use serde::Serialize;

// ---------------------------------------------------------------------------
// Color
// ---------------------------------------------------------------------------

/// The two sides in a chess game.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Color {
    White,
    Black,
}

impl Color {
    /// Index for array lookups: White=0, Black=1.
    #[inline]
    pub const fn index(self) -> usize {
        self as usize
    }

    /// Rank step of a single pawn advance for this side.
    #[inline]
    pub const fn forward(self) -> i8 {
        match self {
            Color::White => 1,
            Color::Black => -1,
        }
    }

    /// Rank (0-based) pawns of this side start on.
    #[inline]
    pub const fn pawn_rank(self) -> u8 {
        match self {
            Color::White => 1,
            Color::Black => 6,
        }
    }

    /// Rank (0-based) on which this side's pawns promote.
    #[inline]
    pub const fn promotion_rank(self) -> u8 {
        match self {
            Color::White => 7,
            Color::Black => 0,
        }
    }
}

impl std::ops::Not for Color {
    type Output = Self;
    fn not(self) -> Self {
        match self {
            Color::White => Color::Black,
            Color::Black => Color::White,
        }
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Color::White => write!(f, "white"),
            Color::Black => write!(f, "black"),
        }
    }
}

// ---------------------------------------------------------------------------
// PieceType
// ---------------------------------------------------------------------------

/// The six piece kinds.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PieceType {
    Pawn,
    Knight,
    Bishop,
    Rook,
    Queen,
    King,
}

impl PieceType {
    /// Kinds a pawn may promote to.
    pub const PROMOTIONS: [PieceType; 4] = [
        PieceType::Queen,
        PieceType::Rook,
        PieceType::Bishop,
        PieceType::Knight,
    ];

    /// Material value in pawns. Kings carry no material.
    pub fn value(self) -> u32 {
        match self {
            PieceType::Pawn => 1,
            PieceType::Knight => 3,
            PieceType::Bishop => 3,
            PieceType::Rook => 5,
            PieceType::Queen => 9,
            PieceType::King => 0,
        }
    }

    /// Single uppercase letter for white, lowercase for black.
    pub fn to_char(self, color: Color) -> char {
        let c = match self {
            PieceType::Pawn => 'p',
            PieceType::Knight => 'n',
            PieceType::Bishop => 'b',
            PieceType::Rook => 'r',
            PieceType::Queen => 'q',
            PieceType::King => 'k',
        };
        match color {
            Color::White => c.to_ascii_uppercase(),
            Color::Black => c,
        }
    }

    /// Parse a FEN piece character; case decides the colour.
    pub fn from_char(c: char) -> Option<(Color, PieceType)> {
        let color = if c.is_ascii_uppercase() {
            Color::White
        } else {
            Color::Black
        };
        let piece = match c.to_ascii_lowercase() {
            'p' => PieceType::Pawn,
            'n' => PieceType::Knight,
            'b' => PieceType::Bishop,
            'r' => PieceType::Rook,
            'q' => PieceType::Queen,
            'k' => PieceType::King,
            _ => return None,
        };
        Some((color, piece))
    }

    /// Notation letter; pawns have none.
    pub fn letter(self) -> Option<char> {
        match self {
            PieceType::Pawn => None,
            PieceType::Knight => Some('N'),
            PieceType::Bishop => Some('B'),
            PieceType::Rook => Some('R'),
            PieceType::Queen => Some('Q'),
            PieceType::King => Some('K'),
        }
    }

    /// Inverse of [`PieceType::letter`], uppercase only.
    pub fn from_letter(c: char) -> Option<PieceType> {
        match c {
            'N' => Some(PieceType::Knight),
            'B' => Some(PieceType::Bishop),
            'R' => Some(PieceType::Rook),
            'Q' => Some(PieceType::Queen),
            'K' => Some(PieceType::King),
            _ => None,
        }
    }

    /// Figurine used by renderers.
    pub fn symbol(self, color: Color) -> char {
        match (color, self) {
            (Color::White, PieceType::Pawn) => '♙',
            (Color::White, PieceType::Knight) => '♘',
            (Color::White, PieceType::Bishop) => '♗',
            (Color::White, PieceType::Rook) => '♖',
            (Color::White, PieceType::Queen) => '♕',
            (Color::White, PieceType::King) => '♔',
            (Color::Black, PieceType::Pawn) => '♟',
            (Color::Black, PieceType::Knight) => '♞',
            (Color::Black, PieceType::Bishop) => '♝',
            (Color::Black, PieceType::Rook) => '♜',
            (Color::Black, PieceType::Queen) => '♛',
            (Color::Black, PieceType::King) => '♚',
        }
    }
}

impl fmt::Display for PieceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PieceType::Pawn => write!(f, "pawn"),
            PieceType::Knight => write!(f, "knight"),
            PieceType::Bishop => write!(f, "bishop"),
            PieceType::Rook => write!(f, "rook"),
            PieceType::Queen => write!(f, "queen"),
            PieceType::King => write!(f, "king"),
        }
    }
}

// ---------------------------------------------------------------------------
// Square
// ---------------------------------------------------------------------------

/// A square on the chess board (0..63, LERF: a1=0, h8=63).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Square(pub u8);

impl Square {
    pub const NUM: usize = 64;

    #[inline]
    pub fn new(index: u8) -> Self {
        debug_assert!(index < 64, "Square index out of range: {index}");
        Square(index)
    }

    /// File index, 0 = a.
    #[inline]
    pub fn file(self) -> u8 {
        self.0 & 7
    }

    /// Rank index, 0 = first rank.
    #[inline]
    pub fn rank(self) -> u8 {
        self.0 >> 3
    }

    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }

    #[inline]
    pub fn from_file_rank(file: u8, rank: u8) -> Self {
        debug_assert!(file < 8 && rank < 8);
        Square(rank * 8 + file)
    }

    /// The square `(d_rank, d_file)` away, if it is still on the board.
    pub fn offset(self, d_rank: i8, d_file: i8) -> Option<Square> {
        let rank = self.rank() as i8 + d_rank;
        let file = self.file() as i8 + d_file;
        if (0..8).contains(&rank) && (0..8).contains(&file) {
            Some(Square::from_file_rank(file as u8, rank as u8))
        } else {
            None
        }
    }

    /// Every square, a1 first.
    pub fn all() -> impl Iterator<Item = Square> {
        (0..Square::NUM as u8).map(Square)
    }

    /// Light or dark, fixed by rank/file parity.
    #[inline]
    pub fn shade(self) -> Shade {
        if (self.rank() + self.file()) % 2 == 0 {
            Shade::Dark
        } else {
            Shade::Light
        }
    }

    /// Parse algebraic notation like "e4".
    pub fn from_algebraic(s: &str) -> Option<Self> {
        let bytes = s.as_bytes();
        if bytes.len() != 2 {
            return None;
        }
        let file = bytes[0].wrapping_sub(b'a');
        let rank = bytes[1].wrapping_sub(b'1');
        if file < 8 && rank < 8 {
            Some(Square::from_file_rank(file, rank))
        } else {
            None
        }
    }

    /// Convert to algebraic notation like "e4".
    pub fn to_algebraic(self) -> String {
        format!("{}{}", self.file_char(), self.rank_char())
    }

    #[inline]
    pub fn file_char(self) -> char {
        (b'a' + self.file()) as char
    }

    #[inline]
    pub fn rank_char(self) -> char {
        (b'1' + self.rank()) as char
    }
}

impl fmt::Display for Square {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_algebraic())
    }
}

impl Serialize for Square {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_algebraic())
    }
}

/// Fixed colour of a board square.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Shade {
    Light,
    Dark,
}

// ---------------------------------------------------------------------------
// PieceId
// ---------------------------------------------------------------------------

/// Stable index into the board's piece arena. Pieces are never removed from
/// the arena, so an id stays valid for the lifetime of the board.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct PieceId(pub usize);

// ---------------------------------------------------------------------------
// MoveKind
// ---------------------------------------------------------------------------

/// Classification of a move. Piece classifiers only ever produce the first
/// four; `Promotion` is assigned when a pawn advance is amended.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MoveKind {
    Invalid,
    Normal,
    EnPassant,
    Castle,
    Promotion,
}

impl MoveKind {
    #[inline]
    pub fn is_valid(self) -> bool {
        self != MoveKind::Invalid
    }
}

// ---------------------------------------------------------------------------
// Swap
// ---------------------------------------------------------------------------

/// One atomic relocation inside a move.
///
/// - `from` + `to`: the piece moves.
/// - `from` only: the piece leaves the board (a capture, or the pawn that
///   gets replaced on promotion).
/// - `to` only: the piece appears (the promoted piece).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Swap {
    pub piece: PieceId,
    pub from: Option<Square>,
    pub to: Option<Square>,
}

impl Swap {
    pub fn relocate(piece: PieceId, from: Square, to: Square) -> Self {
        Swap {
            piece,
            from: Some(from),
            to: Some(to),
        }
    }

    pub fn remove(piece: PieceId, from: Square) -> Self {
        Swap {
            piece,
            from: Some(from),
            to: None,
        }
    }

    pub fn appear(piece: PieceId, to: Square) -> Self {
        Swap {
            piece,
            from: None,
            to: Some(to),
        }
    }

    /// Takes a piece off the board without placing one.
    #[inline]
    pub fn is_removal(&self) -> bool {
        self.from.is_some() && self.to.is_none()
    }

    #[inline]
    pub fn is_relocation(&self) -> bool {
        self.from.is_some() && self.to.is_some()
    }

    #[inline]
    pub fn is_appearance(&self) -> bool {
        self.from.is_none() && self.to.is_some()
    }
}

// ---------------------------------------------------------------------------
// Move
// ---------------------------------------------------------------------------

/// A committed (or about to be committed) move.
///
/// `swaps[0]` is always the primary swap: the mover's relocation for normal,
/// en-passant and castling moves, or the removal of the promoting pawn for
/// promotions. Any capture follows it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Move {
    pub kind: MoveKind,
    pub notation: Option<String>,
    pub swaps: Vec<Swap>,
}

impl Move {
    pub fn new(kind: MoveKind, swaps: Vec<Swap>) -> Self {
        debug_assert!(!swaps.is_empty() && swaps.len() <= 3);
        Move {
            kind,
            notation: None,
            swaps,
        }
    }

    /// The primary swap.
    #[inline]
    pub fn primary(&self) -> &Swap {
        &self.swaps[0]
    }

    /// The piece that made the move (the pawn, for promotions).
    #[inline]
    pub fn mover(&self) -> PieceId {
        self.swaps[0].piece
    }

    /// Origin square of the mover.
    pub fn origin(&self) -> Option<Square> {
        self.swaps[0].from
    }

    /// Destination square of the mover (the promotion square for promotions).
    pub fn destination(&self) -> Option<Square> {
        match self.kind {
            MoveKind::Promotion => self
                .swaps
                .iter()
                .find(|s| s.is_appearance())
                .and_then(|s| s.to),
            _ => self.swaps[0].to,
        }
    }

    /// The enemy piece removed by this move, if any.
    pub fn captured(&self) -> Option<PieceId> {
        self.swaps[1..]
            .iter()
            .find(|s| s.is_removal())
            .map(|s| s.piece)
    }

    /// The piece placed by a promotion.
    pub fn promoted(&self) -> Option<PieceId> {
        if self.kind != MoveKind::Promotion {
            return None;
        }
        self.swaps.iter().find(|s| s.is_appearance()).map(|s| s.piece)
    }

    #[inline]
    pub fn is_capture(&self) -> bool {
        self.captured().is_some()
    }

    /// Same kind and the same set of swaps (piece, source, destination).
    pub fn is_equivalent(&self, other: &Move) -> bool {
        self.kind == other.kind
            && self.swaps.len() == other.swaps.len()
            && self.swaps.iter().all(|s| other.swaps.contains(s))
    }
}

// ---------------------------------------------------------------------------
// GameCondition
// ---------------------------------------------------------------------------

/// Condition of the game as seen by the side to move.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum GameCondition {
    Normal,
    Check,
    Checkmate,
    Stalemate,
    Draw(DrawReason),
    PendingPromotion,
}

impl GameCondition {
    pub fn as_str(&self) -> &str {
        match self {
            GameCondition::Normal => "normal",
            GameCondition::Check => "check",
            GameCondition::Checkmate => "checkmate",
            GameCondition::Stalemate => "stalemate",
            GameCondition::Draw(reason) => reason.as_str(),
            GameCondition::PendingPromotion => "pending_promotion",
        }
    }

    pub fn is_game_over(&self) -> bool {
        matches!(
            self,
            GameCondition::Checkmate | GameCondition::Stalemate | GameCondition::Draw(_)
        )
    }

    /// Stalemate and every draw rule.
    pub fn is_drawn(&self) -> bool {
        matches!(self, GameCondition::Stalemate | GameCondition::Draw(_))
    }
}

impl fmt::Display for GameCondition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Reason for a draw.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DrawReason {
    FiftyMoveRule,
    Repetition,
    InsufficientMaterial,
}

impl DrawReason {
    pub fn as_str(&self) -> &str {
        match self {
            DrawReason::FiftyMoveRule => "fifty_move_rule",
            DrawReason::Repetition => "repetition",
            DrawReason::InsufficientMaterial => "insufficient_material",
        }
    }
}

// ---------------------------------------------------------------------------
// ChessError
// ---------------------------------------------------------------------------

/// Domain errors for the chess engine.
#[derive(Debug, thiserror::Error)]
pub enum ChessError {
    #[error("invalid FEN string: {0}")]
    InvalidFen(String),

    #[error("invalid square notation: {0}")]
    InvalidSquare(String),

    #[error("cannot parse move token '{token}': {reason}")]
    InvalidToken { token: String, reason: String },

    #[error("no {color} piece can play '{token}'")]
    NoCandidate { token: String, color: Color },

    #[error("'{token}' fits more than one {color} piece")]
    AmbiguousCandidate { token: String, color: Color },

    #[error("illegal move: {from} -> {to}")]
    IllegalMove { from: Square, to: Square },

    #[error("invalid promotion piece: {0}")]
    InvalidPromotion(PieceType),

    #[error("no pawn is waiting to promote")]
    NoPendingPromotion,

    #[error("a pawn on {0} must be promoted before play continues")]
    PromotionPending(Square),

    #[error("no moves to undo")]
    NothingToUndo,

    #[error("cannot rewind {requested} moves, history holds {available}")]
    HistoryTooShort { requested: usize, available: usize },
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn color_toggle() {
        assert_eq!(!Color::White, Color::Black);
        assert_eq!(!Color::Black, Color::White);
    }

    #[test]
    fn color_geometry() {
        assert_eq!(Color::White.forward(), 1);
        assert_eq!(Color::Black.forward(), -1);
        assert_eq!(Color::White.promotion_rank(), 7);
        assert_eq!(Color::Black.pawn_rank(), 6);
    }

    #[test]
    fn piece_type_char_round_trip() {
        for pt in [
            PieceType::Pawn,
            PieceType::Knight,
            PieceType::Bishop,
            PieceType::Rook,
            PieceType::Queen,
            PieceType::King,
        ] {
            let wc = pt.to_char(Color::White);
            let bc = pt.to_char(Color::Black);
            assert_eq!(PieceType::from_char(wc), Some((Color::White, pt)));
            assert_eq!(PieceType::from_char(bc), Some((Color::Black, pt)));
            if let Some(letter) = pt.letter() {
                assert_eq!(PieceType::from_letter(letter), Some(pt));
            }
        }
        assert_eq!(PieceType::from_char('x'), None);
        assert_eq!(PieceType::from_letter('P'), None);
    }

    #[test]
    fn piece_values() {
        assert_eq!(PieceType::Pawn.value(), 1);
        assert_eq!(PieceType::Bishop.value(), 3);
        assert_eq!(PieceType::Queen.value(), 9);
        assert_eq!(PieceType::King.value(), 0);
    }

    #[test]
    fn square_algebraic() {
        assert_eq!(Square::from_algebraic("a1"), Some(Square(0)));
        assert_eq!(Square::from_algebraic("h8"), Some(Square(63)));
        assert_eq!(Square::from_algebraic("e4"), Some(Square(28)));
        assert_eq!(Square(28).to_algebraic(), "e4");
        assert_eq!(Square::from_algebraic("i1"), None);
        assert_eq!(Square::from_algebraic("a9"), None);
        assert_eq!(Square::from_algebraic("e"), None);
    }

    #[test]
    fn square_offset_stays_on_board() {
        let a1 = Square::from_algebraic("a1").unwrap();
        assert_eq!(a1.offset(1, 1), Square::from_algebraic("b2"));
        assert_eq!(a1.offset(-1, 0), None);
        assert_eq!(a1.offset(0, 8), None);
    }

    #[test]
    fn square_shades() {
        assert_eq!(Square::from_algebraic("a1").unwrap().shade(), Shade::Dark);
        assert_eq!(Square::from_algebraic("h1").unwrap().shade(), Shade::Light);
        assert_eq!(Square::from_algebraic("d1").unwrap().shade(), Shade::Light);
        assert_eq!(Square::from_algebraic("h8").unwrap().shade(), Shade::Dark);
    }

    #[test]
    fn swap_shapes() {
        let sq = Square(12);
        assert!(Swap::remove(PieceId(0), sq).is_removal());
        assert!(Swap::appear(PieceId(0), sq).is_appearance());
        assert!(Swap::relocate(PieceId(0), sq, Square(20)).is_relocation());
    }

    #[test]
    fn move_capture_and_promotion_accessors() {
        let d7 = Square::from_algebraic("d7").unwrap();
        let c8 = Square::from_algebraic("c8").unwrap();
        let mv = Move::new(
            MoveKind::Promotion,
            vec![
                Swap::remove(PieceId(3), d7),
                Swap::appear(PieceId(40), c8),
                Swap::remove(PieceId(20), c8),
            ],
        );
        assert_eq!(mv.mover(), PieceId(3));
        assert_eq!(mv.captured(), Some(PieceId(20)));
        assert_eq!(mv.promoted(), Some(PieceId(40)));
        assert_eq!(mv.destination(), Some(c8));
        assert_eq!(mv.origin(), Some(d7));
    }

    #[test]
    fn move_equivalence_ignores_swap_order() {
        let a = Move::new(
            MoveKind::Normal,
            vec![
                Swap::relocate(PieceId(1), Square(1), Square(18)),
                Swap::remove(PieceId(9), Square(18)),
            ],
        );
        let mut b = a.clone();
        b.swaps.reverse();
        b.notation = Some("Nxc3".into());
        assert!(a.is_equivalent(&b));

        let c = Move::new(
            MoveKind::Normal,
            vec![Swap::relocate(PieceId(1), Square(1), Square(18))],
        );
        assert!(!a.is_equivalent(&c));
    }

    #[test]
    fn condition_strings() {
        assert_eq!(GameCondition::Normal.as_str(), "normal");
        assert_eq!(
            GameCondition::Draw(DrawReason::Repetition).as_str(),
            "repetition"
        );
        assert!(GameCondition::Checkmate.is_game_over());
        assert!(!GameCondition::PendingPromotion.is_game_over());
        assert!(GameCondition::Stalemate.is_drawn());
        assert!(!GameCondition::Check.is_drawn());
    }
}
