//! Arena-based chess board with transactional, swap-based moves.
//!
//! `Board` owns two parallel arenas: the 64-cell [`Grid`] and an append-only
//! list of [`Piece`]s. Each side references the other by index, and both are
//! only ever updated together through `place` / `vacate`.
//!
//! Every move is an ordered list of [`Swap`]s. Committing a move applies its
//! swaps (removals first), flips the side to move and rebuilds the targeting
//! map from scratch. Undo applies the same swaps in exactly the reverse order.

use tracing::debug;

use crate::engine::condition;
use crate::engine::grid::{Cell, Grid};
use crate::engine::pieces::{self, Piece};
use crate::engine::san;
use crate::engine::segments;
use crate::engine::types::{
    ChessError, Color, GameCondition, Move, MoveKind, PieceId, PieceType, Square, Swap,
};

/// Standard starting position.
pub const STANDARD_FEN: &str = "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1";

// ---------------------------------------------------------------------------
// Rules
// ---------------------------------------------------------------------------

/// Tunable rule parameters.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Rules {
    /// Length, in plies, of the capture-free window that ends the game under
    /// the fifty-move rule.
    pub fifty_move_plies: usize,
}

impl Default for Rules {
    fn default() -> Self {
        Rules {
            fifty_move_plies: 100,
        }
    }
}

// ---------------------------------------------------------------------------
// Board
// ---------------------------------------------------------------------------

#[derive(Clone, Debug)]
pub struct Board {
    grid: Grid,
    pieces: Vec<Piece>,
    to_move: Color,
    /// Committed moves, oldest first. Doubles as the undo stack.
    history: Vec<Move>,
    condition: GameCondition,
    rules: Rules,
}

// ---------------------------------------------------------------------------
// Construction
// ---------------------------------------------------------------------------

impl Board {
    /// A board with no pieces, white to move.
    pub fn empty() -> Self {
        Board {
            grid: Grid::new(),
            pieces: Vec::with_capacity(32),
            to_move: Color::White,
            history: Vec::new(),
            condition: GameCondition::Normal,
            rules: Rules::default(),
        }
    }

    /// Standard starting position.
    pub fn starting() -> Self {
        Self::from_fen(STANDARD_FEN).expect("starting FEN is always valid")
    }

    /// Replace the rule parameters.
    pub fn with_rules(mut self, rules: Rules) -> Self {
        self.rules = rules;
        self.condition = condition::evaluate(&self);
        self
    }

    /// Append a new piece to the arena and put it on `sq`.
    fn add_piece(&mut self, color: Color, kind: PieceType, sq: Square) -> PieceId {
        let id = self.spawn(color, kind, sq);
        self.pieces[id.0].captured = false;
        self.place(id, sq);
        id
    }

    /// Append a piece that is not yet on the board. An appearance swap puts
    /// it there.
    fn spawn(&mut self, color: Color, kind: PieceType, sq: Square) -> PieceId {
        let id = PieceId(self.pieces.len());
        let mut piece = Piece::new(id, color, kind, sq);
        piece.captured = true;
        self.pieces.push(piece);
        id
    }

    // -----------------------------------------------------------------------
    // Place / vacate: the only writers of occupancy
    // -----------------------------------------------------------------------

    fn place(&mut self, id: PieceId, sq: Square) {
        if let Some(other) = self.grid[sq].occupant
            && other != id
        {
            panic!("cannot place {id:?} on {sq}: already holds {other:?}");
        }
        self.grid[sq].occupant = Some(id);
        self.pieces[id.0].square = sq;
    }

    fn vacate(&mut self, id: PieceId, sq: Square) {
        let occupant = self.grid[sq].occupant;
        if occupant != Some(id) || self.pieces[id.0].square != sq {
            panic!("back-reference mismatch on {sq}: cell holds {occupant:?}, expected {id:?}");
        }
        self.grid[sq].occupant = None;
    }

    // -----------------------------------------------------------------------
    // Queries
    // -----------------------------------------------------------------------

    #[inline]
    pub fn to_move(&self) -> Color {
        self.to_move
    }

    #[inline]
    pub fn condition(&self) -> GameCondition {
        self.condition
    }

    #[inline]
    pub fn rules(&self) -> Rules {
        self.rules
    }

    #[inline]
    pub fn history(&self) -> &[Move] {
        &self.history
    }

    #[inline]
    pub fn last_move(&self) -> Option<&Move> {
        self.history.last()
    }

    /// Number of committed plies.
    #[inline]
    pub fn ply(&self) -> usize {
        self.history.len()
    }

    #[inline]
    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    #[inline]
    pub fn cell(&self, sq: Square) -> &Cell {
        &self.grid[sq]
    }

    pub(crate) fn grid_mut(&mut self) -> &mut Grid {
        &mut self.grid
    }

    /// Every piece ever created, captured ones included.
    #[inline]
    pub fn pieces(&self) -> &[Piece] {
        &self.pieces
    }

    #[inline]
    pub fn piece(&self, id: PieceId) -> &Piece {
        &self.pieces[id.0]
    }

    /// Pieces of `color` still on the board.
    pub fn active_pieces(&self, color: Color) -> impl Iterator<Item = &Piece> {
        self.pieces
            .iter()
            .filter(move |p| !p.captured && p.color == color)
    }

    /// The piece standing on `sq`, if any.
    #[inline]
    pub fn piece_on(&self, sq: Square) -> Option<&Piece> {
        self.grid.occupant(sq).map(|id| &self.pieces[id.0])
    }

    #[inline]
    pub fn is_empty(&self, sq: Square) -> bool {
        self.grid[sq].is_empty()
    }

    /// The king of `color`, if it is on the board.
    pub fn king(&self, color: Color) -> Option<&Piece> {
        self.active_pieces(color).find(|p| p.kind == PieceType::King)
    }

    /// Is `sq` attacked by any piece of colour `by`, per the targeting map?
    #[inline]
    pub fn is_attacked(&self, sq: Square, by: Color) -> bool {
        self.grid[sq].is_attacked_by(by)
    }

    /// Is the last move an unamended pawn advance onto its promotion rank?
    ///
    /// Play is suspended while this holds, even when the reported condition
    /// is a check.
    pub fn promotion_pending(&self) -> bool {
        condition::pending_promotion(self)
    }

    /// Is the king of `color` attacked?
    pub fn in_check(&self, color: Color) -> bool {
        self.king(color)
            .is_some_and(|king| self.is_attacked(king.square, !color))
    }

    // -----------------------------------------------------------------------
    // Targeting map
    // -----------------------------------------------------------------------

    /// Rebuild every cell's attacker lists by classifying every piece on the
    /// board against every square in passive mode.
    fn refresh_targets(&mut self) {
        let mut hits = Vec::new();
        for piece in self.pieces.iter().filter(|p| !p.captured) {
            for sq in Square::all() {
                if pieces::classify(self, piece.square, sq, true).is_valid() {
                    hits.push((sq, piece.color, piece.id));
                }
            }
        }
        self.grid.clear_targeting();
        for (sq, color, id) in hits {
            self.grid[sq].targeting[color.index()].push(id);
        }
    }

    // -----------------------------------------------------------------------
    // Swap execution
    // -----------------------------------------------------------------------

    /// Commit order: removals before anything that places a piece.
    fn ordered_swaps(mv: &Move) -> Vec<Swap> {
        let mut swaps = mv.swaps.clone();
        swaps.sort_by_key(|s| !s.is_removal());
        swaps
    }

    fn apply_swap(&mut self, swap: Swap, ply: usize) {
        match (swap.from, swap.to) {
            (Some(from), Some(to)) => {
                self.vacate(swap.piece, from);
                self.place(swap.piece, to);
            }
            (Some(from), None) => {
                self.vacate(swap.piece, from);
                self.pieces[swap.piece.0].captured = true;
            }
            (None, Some(to)) => {
                self.pieces[swap.piece.0].captured = false;
                self.place(swap.piece, to);
            }
            (None, None) => {}
        }
        let piece = &mut self.pieces[swap.piece.0];
        if piece.first_moved_on.is_none() {
            piece.first_moved_on = Some(ply);
        }
    }

    fn revert_swap(&mut self, swap: Swap, ply: usize) {
        match (swap.from, swap.to) {
            (Some(from), Some(to)) => {
                self.vacate(swap.piece, to);
                self.place(swap.piece, from);
            }
            (Some(from), None) => {
                self.pieces[swap.piece.0].captured = false;
                self.place(swap.piece, from);
            }
            (None, Some(to)) => {
                self.vacate(swap.piece, to);
                self.pieces[swap.piece.0].captured = true;
            }
            (None, None) => {}
        }
        let piece = &mut self.pieces[swap.piece.0];
        if piece.first_moved_on == Some(ply) {
            piece.first_moved_on = None;
        }
    }

    /// Push `mv` onto the history and apply it. No legality checks.
    pub(crate) fn commit(&mut self, mv: Move) {
        let swaps = Self::ordered_swaps(&mv);
        self.history.push(mv);
        let ply = self.history.len();
        for swap in swaps {
            self.apply_swap(swap, ply);
        }
        self.to_move = !self.to_move;
        self.refresh_targets();
    }

    /// Pop the last move and reverse it. Leaves `condition` untouched.
    pub(crate) fn rollback(&mut self) -> Option<Move> {
        let ply = self.history.len();
        let mv = self.history.pop()?;
        for swap in Self::ordered_swaps(&mv).into_iter().rev() {
            self.revert_swap(swap, ply);
        }
        self.to_move = !self.to_move;
        self.refresh_targets();
        Some(mv)
    }

    // -----------------------------------------------------------------------
    // Move construction
    // -----------------------------------------------------------------------

    /// Classify `from -> to` and build the swaps for it.
    fn build_move(&self, from: Square, to: Square) -> Option<Move> {
        let mover = self.grid.occupant(from)?;
        let kind = pieces::classify(self, from, to, false);
        let swaps = match kind {
            MoveKind::Invalid | MoveKind::Promotion => return None,
            MoveKind::EnPassant => {
                let victim_sq = Square::from_file_rank(to.file(), from.rank());
                let victim = self.grid.occupant(victim_sq)?;
                vec![
                    Swap::relocate(mover, from, to),
                    Swap::remove(victim, victim_sq),
                ]
            }
            MoveKind::Castle => {
                let dir = (to.file() as i8 - from.file() as i8).signum();
                let rook = segments::find_castling_rook(self, from, dir)
                    .expect("castling rook must exist once castling is legal");
                let rook_from = self.piece(rook).square;
                let rook_to = from
                    .offset(0, dir)
                    .expect("castling transit square is on the board");
                vec![
                    Swap::relocate(mover, from, to),
                    Swap::relocate(rook, rook_from, rook_to),
                ]
            }
            MoveKind::Normal => {
                let mut swaps = vec![Swap::relocate(mover, from, to)];
                if let Some(victim) = self.grid.occupant(to) {
                    swaps.push(Swap::remove(victim, to));
                }
                swaps
            }
        };
        Some(Move::new(kind, swaps))
    }

    /// Commit `from -> to` and keep it only if the mover's king is safe.
    fn speculate(&mut self, from: Square, to: Square) -> MoveKind {
        let Some(mv) = self.build_move(from, to) else {
            return MoveKind::Invalid;
        };
        let kind = mv.kind;
        let mover = self.to_move;
        self.commit(mv);
        if self.in_check(mover) {
            self.rollback();
            debug!(%from, %to, "move rejected: own king left in check");
            return MoveKind::Invalid;
        }
        kind
    }

    // -----------------------------------------------------------------------
    // Public move API
    // -----------------------------------------------------------------------

    /// Try to play `from -> to` for the side to move.
    ///
    /// Illegal attempts leave the board untouched and return
    /// `MoveKind::Invalid`. A legal move is committed, the game condition is
    /// re-evaluated and the move's notation is filled in.
    pub fn attempt_move(&mut self, from: Square, to: Square) -> MoveKind {
        if self.promotion_pending() {
            debug!(%from, %to, "move rejected: promotion pending");
            return MoveKind::Invalid;
        }
        let kind = self.speculate(from, to);
        if kind.is_valid() {
            self.settle();
        } else {
            debug!(%from, %to, side = %self.to_move, "move rejected");
        }
        kind
    }

    /// Re-evaluate the condition and notate the last move.
    fn settle(&mut self) {
        self.condition = condition::evaluate(self);
        let notation = san::encode_last_move(self);
        if let Some(last) = self.history.last_mut() {
            last.notation = notation;
        }
    }

    /// Turn the pending pawn advance into a promotion to `kind`.
    ///
    /// The pawn swap becomes a removal from its origin, the new piece
    /// appears on the destination, and any capture swap is kept.
    pub fn amend_promotion_move(&mut self, kind: PieceType) -> Result<(), ChessError> {
        if !self.promotion_pending() {
            return Err(ChessError::NoPendingPromotion);
        }
        if !PieceType::PROMOTIONS.contains(&kind) {
            return Err(ChessError::InvalidPromotion(kind));
        }
        let pending = self.rollback().ok_or(ChessError::NoPendingPromotion)?;
        let pawn_swap = *pending.primary();
        let (Some(from), Some(to)) = (pawn_swap.from, pawn_swap.to) else {
            self.commit(pending);
            return Err(ChessError::NoPendingPromotion);
        };
        let color = self.piece(pawn_swap.piece).color;
        let promoted = self.spawn(color, kind, to);

        let mut swaps = vec![
            Swap::remove(pawn_swap.piece, from),
            Swap::appear(promoted, to),
        ];
        swaps.extend(pending.swaps[1..].iter().copied());
        self.commit(Move::new(MoveKind::Promotion, swaps));
        self.settle();
        Ok(())
    }

    /// Undo the most recent move.
    pub fn undo(&mut self) -> Result<Move, ChessError> {
        let mv = self.rollback().ok_or(ChessError::NothingToUndo)?;
        self.condition = condition::evaluate(self);
        Ok(mv)
    }

    /// Rewind `plies` moves, run `inspect` against the rewound board, then
    /// replay the same moves in their original order.
    ///
    /// The inspector only gets a shared reference, so it cannot disturb the
    /// replay. The stored condition is not recomputed while rewound.
    pub fn history_callback<R>(
        &mut self,
        plies: usize,
        inspect: impl FnOnce(&Board) -> R,
    ) -> Result<R, ChessError> {
        if plies > self.history.len() {
            return Err(ChessError::HistoryTooShort {
                requested: plies,
                available: self.history.len(),
            });
        }
        let mut undone = Vec::with_capacity(plies);
        while undone.len() < plies {
            match self.rollback() {
                Some(mv) => undone.push(mv),
                None => break,
            }
        }
        let result = inspect(self);
        for mv in undone.into_iter().rev() {
            self.commit(mv);
        }
        Ok(result)
    }

    // -----------------------------------------------------------------------
    // Legality probes
    // -----------------------------------------------------------------------

    /// Would `from -> to` be accepted for the side to move (ignoring any
    /// pending promotion)?
    pub fn is_legal(&self, from: Square, to: Square) -> bool {
        if !pieces::classify(self, from, to, false).is_valid() {
            return false;
        }
        let mut probe = self.clone();
        probe.speculate(from, to).is_valid()
    }

    /// Every square the piece on `from` may legally move to.
    pub fn legal_destinations(&self, from: Square) -> Vec<Square> {
        let mut probe = self.clone();
        let mut out = Vec::new();
        for to in Square::all() {
            if !pieces::classify(&probe, from, to, false).is_valid() {
                continue;
            }
            if probe.speculate(from, to).is_valid() {
                out.push(to);
                probe.rollback();
            }
        }
        out
    }

    /// Does the side to move have at least one legal move?
    pub fn has_legal_move(&self) -> bool {
        let mut probe = self.clone();
        let origins: Vec<Square> = self.active_pieces(self.to_move).map(|p| p.square).collect();
        for from in origins {
            for to in Square::all() {
                if !pieces::classify(&probe, from, to, false).is_valid() {
                    continue;
                }
                if probe.speculate(from, to).is_valid() {
                    return true;
                }
            }
        }
        false
    }

    // -----------------------------------------------------------------------
    // Board display (8×8 text grid)
    // -----------------------------------------------------------------------

    /// Render the board as an 8-line string (rank 8 at top), useful for debugging.
    pub fn board_string(&self) -> String {
        let mut s = String::with_capacity(200);
        for rank in (0..8).rev() {
            s.push((b'1' + rank) as char);
            s.push(' ');
            for file in 0..8 {
                let sq = Square::from_file_rank(file, rank);
                let ch = match self.piece_on(sq) {
                    Some(p) => p.kind.to_char(p.color),
                    None => '.',
                };
                s.push(ch);
                if file < 7 {
                    s.push(' ');
                }
            }
            s.push('\n');
        }
        s.push_str("  a b c d e f g h");
        s
    }
}

// ---------------------------------------------------------------------------
// FEN parsing / serialization
// ---------------------------------------------------------------------------

impl Board {
    /// Parse a FEN string.
    ///
    /// Piece placement, active colour and castling rights are interpreted; a
    /// missing castling right marks that side's rook as already moved. The
    /// en-passant square and the move clocks must be present but are ignored.
    pub fn from_fen(fen: &str) -> Result<Self, ChessError> {
        let fields: Vec<&str> = fen.split_whitespace().collect();
        if fields.len() != 6 {
            return Err(ChessError::InvalidFen(format!(
                "expected 6 fields, got {}",
                fields.len()
            )));
        }

        let mut board = Board::empty();

        // ----- Field 1: Piece placement -----
        let ranks: Vec<&str> = fields[0].split('/').collect();
        if ranks.len() != 8 {
            return Err(ChessError::InvalidFen(format!(
                "expected 8 ranks, got {}",
                ranks.len()
            )));
        }

        for (rank_idx, rank_str) in ranks.iter().enumerate() {
            let rank = 7 - rank_idx as u8; // FEN starts from rank 8
            let mut file: u8 = 0;
            for ch in rank_str.chars() {
                if file > 7 {
                    return Err(ChessError::InvalidFen(format!(
                        "too many squares in rank {}",
                        rank + 1
                    )));
                }
                if let Some(digit) = ch.to_digit(10) {
                    if !(1..=8).contains(&digit) {
                        return Err(ChessError::InvalidFen(format!(
                            "invalid empty count '{ch}' in rank {}",
                            rank + 1
                        )));
                    }
                    file += digit as u8;
                } else if let Some((color, kind)) = PieceType::from_char(ch) {
                    board.add_piece(color, kind, Square::from_file_rank(file, rank));
                    file += 1;
                } else {
                    return Err(ChessError::InvalidFen(format!(
                        "invalid character '{ch}' in piece placement"
                    )));
                }
            }
            if file != 8 {
                return Err(ChessError::InvalidFen(format!(
                    "rank {} has {} squares instead of 8",
                    rank + 1,
                    file
                )));
            }
        }

        // Validate exactly one king per side.
        for color in [Color::White, Color::Black] {
            let king_count = board
                .active_pieces(color)
                .filter(|p| p.kind == PieceType::King)
                .count();
            if king_count != 1 {
                return Err(ChessError::InvalidFen(format!(
                    "{color} has {king_count} kings (expected 1)"
                )));
            }
        }

        // ----- Field 2: Side to move -----
        board.to_move = match fields[1] {
            "w" => Color::White,
            "b" => Color::Black,
            other => {
                return Err(ChessError::InvalidFen(format!(
                    "invalid side to move: '{other}'"
                )));
            }
        };

        // ----- Field 3: Castling availability -----
        let castling = fields[2];
        let well_formed = castling == "-"
            || (!castling.is_empty() && castling.chars().all(|c| "KQkq".contains(c)));
        if !well_formed {
            return Err(ChessError::InvalidFen(format!(
                "invalid castling string: '{castling}'"
            )));
        }
        for (right, color, side) in [
            ('K', Color::White, 1),
            ('Q', Color::White, -1),
            ('k', Color::Black, 1),
            ('q', Color::Black, -1),
        ] {
            if !castling.contains(right) {
                board.retire_rooks(color, side);
            }
        }

        // Fields 4-6 (en passant, clocks) are accepted as-is.

        board.refresh_targets();
        board.condition = condition::evaluate(&board);
        Ok(board)
    }

    /// Mark every rook of `color` on the `side` of its king as moved.
    fn retire_rooks(&mut self, color: Color, side: i8) {
        let Some(king_file) = self.king(color).map(|k| k.square.file() as i8) else {
            return;
        };
        for piece in self.pieces.iter_mut() {
            let file = piece.square.file() as i8;
            if piece.color == color
                && piece.kind == PieceType::Rook
                && (file - king_file).signum() == side
            {
                piece.first_moved_on = Some(0);
            }
        }
    }

    /// Castling rights as they stand: unmoved king plus an unmoved rook on
    /// the matching side of the home rank.
    fn castling_string(&self) -> String {
        let mut s = String::new();
        for (color, rights) in [(Color::White, ['K', 'Q']), (Color::Black, ['k', 'q'])] {
            let Some(king) = self.king(color) else {
                continue;
            };
            if king.has_moved() {
                continue;
            }
            for (right, dir) in rights.into_iter().zip([1i8, -1]) {
                let has_rook = self.active_pieces(color).any(|p| {
                    p.kind == PieceType::Rook
                        && !p.has_moved()
                        && p.square.rank() == king.square.rank()
                        && (p.square.file() as i8 - king.square.file() as i8).signum() == dir
                });
                if has_rook {
                    s.push(right);
                }
            }
        }
        if s.is_empty() {
            s.push('-');
        }
        s
    }

    /// Export the position as a FEN string. The en-passant and clock fields
    /// are not tracked and always read `- 0 1`.
    pub fn to_fen(&self) -> String {
        let mut fen = String::with_capacity(80);

        // ----- Field 1: Piece placement -----
        for rank in (0..8).rev() {
            let mut empty_count = 0u8;
            for file in 0..8 {
                let sq = Square::from_file_rank(file, rank);
                match self.piece_on(sq) {
                    Some(piece) => {
                        if empty_count > 0 {
                            fen.push((b'0' + empty_count) as char);
                            empty_count = 0;
                        }
                        fen.push(piece.kind.to_char(piece.color));
                    }
                    None => {
                        empty_count += 1;
                    }
                }
            }
            if empty_count > 0 {
                fen.push((b'0' + empty_count) as char);
            }
            if rank > 0 {
                fen.push('/');
            }
        }

        // ----- Field 2: Side to move -----
        fen.push(' ');
        fen.push(match self.to_move {
            Color::White => 'w',
            Color::Black => 'b',
        });

        // ----- Field 3: Castling -----
        fen.push(' ');
        fen.push_str(&self.castling_string());

        // ----- Fields 4-6 -----
        fen.push_str(" - 0 1");

        fen
    }
}

// ---------------------------------------------------------------------------
// Display
// ---------------------------------------------------------------------------

impl std::fmt::Display for Board {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.board_string())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
