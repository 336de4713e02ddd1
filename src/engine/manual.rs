//! Click-driven play on top of a [`Board`].
//!
//! A renderer feeds square selections into [`ManualBoard::select_and_advance`]
//! and re-reads the board afterwards. The selection walks through three
//! stages: idle, moving (a piece is picked up) and promoting (a pawn reached
//! the last rank and is waiting for [`ManualBoard::amend_promotion`]).

use serde::Serialize;
use tracing::debug;

use crate::engine::board::Board;
use crate::engine::types::{ChessError, Color, GameCondition, Move, MoveKind, PieceType, Square};

/// Where the selection state machine currently is.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MoveStage {
    #[default]
    Idle,
    Moving,
    Promoting,
}

#[derive(Clone, Debug)]
pub struct ManualBoard {
    board: Board,
    stage: MoveStage,
    selected: Option<Square>,
    /// One line per attempted move.
    msg_log: Vec<String>,
}

impl ManualBoard {
    pub fn new(board: Board) -> Self {
        let stage = if board.promotion_pending() {
            MoveStage::Promoting
        } else {
            MoveStage::Idle
        };
        ManualBoard {
            board,
            stage,
            selected: None,
            msg_log: Vec::new(),
        }
    }

    #[inline]
    pub fn board(&self) -> &Board {
        &self.board
    }

    pub fn into_board(self) -> Board {
        self.board
    }

    #[inline]
    pub fn stage(&self) -> MoveStage {
        self.stage
    }

    #[inline]
    pub fn selected(&self) -> Option<Square> {
        self.selected
    }

    pub fn messages(&self) -> &[String] {
        &self.msg_log
    }

    // -----------------------------------------------------------------------
    // Selection
    // -----------------------------------------------------------------------

    /// Feed one square selection into the state machine.
    ///
    /// Returns the classification of the move it triggered, if any. Fails
    /// while a promotion piece is still owed.
    pub fn select_and_advance(&mut self, sq: Square) -> Result<Option<MoveKind>, ChessError> {
        let own_piece = self
            .board
            .piece_on(sq)
            .is_some_and(|p| p.color == self.board.to_move());

        match self.stage {
            MoveStage::Promoting => {
                let at = self
                    .board
                    .last_move()
                    .and_then(Move::destination)
                    .unwrap_or(sq);
                Err(ChessError::PromotionPending(at))
            }
            MoveStage::Idle => {
                if own_piece {
                    self.pick_up(sq);
                }
                Ok(None)
            }
            MoveStage::Moving if self.selected == Some(sq) => {
                self.clear_selection();
                Ok(None)
            }
            MoveStage::Moving if own_piece => {
                self.clear_selection();
                self.pick_up(sq);
                Ok(None)
            }
            MoveStage::Moving => {
                let from = self.selected;
                self.clear_selection();
                Ok(from.map(|from| self.attempt_move(from, sq)))
            }
        }
    }

    fn pick_up(&mut self, sq: Square) {
        self.board.grid_mut()[sq].select();
        self.selected = Some(sq);
        self.stage = MoveStage::Moving;
    }

    /// Deselect every cell and return to idle (unless a promotion is owed).
    pub fn clear_selection(&mut self) {
        self.board.grid_mut().clear_selection();
        self.selected = None;
        if self.stage == MoveStage::Moving {
            self.stage = MoveStage::Idle;
        }
    }

    // -----------------------------------------------------------------------
    // Moves
    // -----------------------------------------------------------------------

    /// Attempt `from -> to` directly and record the outcome in the log.
    pub fn attempt_move(&mut self, from: Square, to: Square) -> MoveKind {
        if self.stage == MoveStage::Promoting {
            self.msg_log.push(format!("{from} -> {to}: promotion pending"));
            return MoveKind::Invalid;
        }
        let kind = self.board.attempt_move(from, to);
        self.msg_log.push(format!("{from} -> {to}: {}", kind_label(kind)));
        if self.board.promotion_pending() {
            self.stage = MoveStage::Promoting;
        }
        kind
    }

    /// Supply the piece for a pawn waiting on its last rank.
    pub fn amend_promotion(&mut self, kind: PieceType) -> Result<(), ChessError> {
        self.board.amend_promotion_move(kind)?;
        self.stage = MoveStage::Idle;
        debug!(piece = ?kind, "promotion amended");
        Ok(())
    }

    /// Undo the last move and drop any selection.
    pub fn undo(&mut self) -> Result<Move, ChessError> {
        let mv = self.board.undo()?;
        self.board.grid_mut().clear_selection();
        self.selected = None;
        self.stage = if self.board.promotion_pending() {
            MoveStage::Promoting
        } else {
            MoveStage::Idle
        };
        Ok(mv)
    }

    // -----------------------------------------------------------------------
    // Debug output
    // -----------------------------------------------------------------------

    /// Pretty JSON snapshot of the selection state and message log.
    pub fn debug_dump(&self) -> Result<String, serde_json::Error> {
        let selected = self.selected.map(|square| {
            let piece = self.board.piece_on(square);
            SelectedSnapshot {
                square,
                kind: piece.map(|p| p.kind),
                color: piece.map(|p| p.color),
            }
        });
        let snapshot = DebugSnapshot {
            selected,
            to_move: self.board.to_move(),
            stage: self.stage,
            condition: self.board.condition(),
            fen: self.board.to_fen(),
            messages: &self.msg_log,
        };
        serde_json::to_string_pretty(&snapshot)
    }
}

fn kind_label(kind: MoveKind) -> &'static str {
    match kind {
        MoveKind::Invalid => "rejected",
        MoveKind::Normal => "normal",
        MoveKind::EnPassant => "en passant",
        MoveKind::Castle => "castle",
        MoveKind::Promotion => "promotion",
    }
}

#[derive(Serialize)]
struct SelectedSnapshot {
    square: Square,
    kind: Option<PieceType>,
    color: Option<Color>,
}

#[derive(Serialize)]
struct DebugSnapshot<'a> {
    selected: Option<SelectedSnapshot>,
    to_move: Color,
    stage: MoveStage,
    condition: GameCondition,
    fen: String,
    messages: &'a [String],
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
