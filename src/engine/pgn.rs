//! PGN (Portable Game Notation) input and output.
//!
//! Input: the tag block of a record is discarded and only the movetext is
//! tokenised and decoded. Output: numbered movetext, plus a full PGN export
//! with the Seven Tag Roster.

use chrono::{Local, NaiveDate};
use tracing::{debug, info};

use crate::engine::board::{Board, STANDARD_FEN};
use crate::engine::san::{self, DecodeReport};
use crate::engine::types::{Color, GameCondition};

/// Tokens that close a movetext.
pub const RESULT_TOKENS: [&str; 4] = ["1-0", "0-1", "1/2-1/2", "*"];

// =========================================================================
// Token extraction
// =========================================================================

/// Everything after the last closing tag bracket.
pub fn strip_headers(record: &str) -> &str {
    match record.rfind(']') {
        Some(idx) => &record[idx + 1..],
        None => record,
    }
}

/// Drop a leading move number (`12.`, `12...`). Returns what follows it,
/// which may be empty or a move glued to the number (`1.e4`).
fn strip_move_number(token: &str) -> &str {
    let rest = token.trim_start_matches(|c: char| c.is_ascii_digit());
    if rest.len() < token.len() && rest.starts_with('.') {
        rest.trim_start_matches('.')
    } else {
        token
    }
}

/// Split movetext into bare move tokens.
///
/// Separators are whitespace, commas, tabs and literal `\n` sequences.
/// Annotation marks, move numbers, en-passant markers and a trailing result
/// are removed.
pub fn extract_raw_moves(movetext: &str) -> Vec<String> {
    let cleaned = movetext
        .replace("\\n", " ")
        .replace([',', '\t', '\r', '\n'], " ")
        .replace(['!', '?'], "");

    let mut tokens: Vec<String> = cleaned
        .split_whitespace()
        .filter(|t| !matches!(*t, "e.p." | "(e.p.)"))
        .map(strip_move_number)
        .filter(|t| !t.is_empty())
        .map(str::to_string)
        .collect();

    if tokens
        .last()
        .is_some_and(|t| RESULT_TOKENS.contains(&t.as_str()))
    {
        tokens.pop();
    }
    tokens
}

// =========================================================================
// Record compilation
// =========================================================================

/// A decoded game record.
#[derive(Debug)]
pub struct CompiledGame {
    pub board: Board,
    pub report: DecodeReport,
    /// Tokens extracted from the movetext, in order.
    pub tokens: Vec<String>,
}

impl CompiledGame {
    /// Every extracted token was committed.
    pub fn is_complete(&self) -> bool {
        self.report.skipped.is_empty() && self.report.applied == self.tokens.len()
    }
}

/// Decode bare tokens from the position held by `start`.
pub fn compile_raw_moves<S: AsRef<str>>(tokens: &[S], start: Board) -> CompiledGame {
    let mut board = start;
    let report = san::decode(&mut board, tokens);
    CompiledGame {
        board,
        report,
        tokens: tokens.iter().map(|t| t.as_ref().to_string()).collect(),
    }
}

/// Strip the tag block from `record`, extract its movetext and decode it
/// from the position held by `start`.
pub fn compile_pgn(record: &str, start: Board) -> CompiledGame {
    let tokens = extract_raw_moves(strip_headers(record));
    debug!(tokens = tokens.len(), "compiling game record");
    let game = compile_raw_moves(&tokens, start);
    info!(
        applied = game.report.applied,
        skipped = game.report.skipped.len(),
        condition = %game.board.condition(),
        "game record compiled"
    );
    game
}

// =========================================================================
// Movetext generation
// =========================================================================

/// Side that made the first recorded move.
fn first_mover(board: &Board) -> Color {
    if board.ply() % 2 == 0 {
        board.to_move()
    } else {
        !board.to_move()
    }
}

/// Numbered movetext tokens: `1.`, `e4`, `e5`, `2.`, `Nf3`, ...
///
/// A record whose first move is black's opens with `1...`.
fn movetext_tokens(board: &Board) -> Vec<String> {
    let mut tokens = Vec::with_capacity(board.ply() * 3 / 2 + 1);
    let mut white_turn = first_mover(board) == Color::White;
    let mut move_num = 1;

    for (i, mv) in board.history().iter().enumerate() {
        if white_turn {
            tokens.push(format!("{move_num}."));
        } else if i == 0 {
            tokens.push(format!("{move_num}..."));
        }
        tokens.push(mv.notation.clone().unwrap_or_default());
        if !white_turn {
            move_num += 1;
        }
        white_turn = !white_turn;
    }
    tokens
}

/// Single-line movetext of every committed move, e.g.
/// `1. e4 e5 2. Nf3 Nc6`.
pub fn notate_game(board: &Board) -> String {
    movetext_tokens(board).join(" ")
}

// =========================================================================
// PGN export
// =========================================================================

/// Tag values that the board itself does not know.
#[derive(Clone, Debug)]
pub struct GameInfo {
    pub event: String,
    pub site: String,
    pub date: NaiveDate,
    pub white: String,
    pub black: String,
}

impl Default for GameInfo {
    fn default() -> Self {
        GameInfo {
            event: "Casual Game".to_string(),
            site: "swapchess".to_string(),
            date: Local::now().date_naive(),
            white: "White".to_string(),
            black: "Black".to_string(),
        }
    }
}

/// PGN result for the board's current condition. On checkmate the side to
/// move has lost.
pub fn result_string(board: &Board) -> &'static str {
    match board.condition() {
        GameCondition::Checkmate => match board.to_move() {
            Color::White => "0-1",
            Color::Black => "1-0",
        },
        c if c.is_drawn() => "1/2-1/2",
        _ => "*",
    }
}

/// FEN of the position before the first recorded move.
pub fn starting_fen(board: &Board) -> String {
    let mut rewound = board.clone();
    let plies = rewound.ply();
    rewound
        .history_callback(plies, |b| b.to_fen())
        .unwrap_or_else(|_| board.to_fen())
}

/// Export the game on `board` as a PGN string.
pub fn to_pgn(board: &Board, info: &GameInfo) -> String {
    let mut pgn = String::with_capacity(512);
    let result = result_string(board);

    // Seven Tag Roster.
    pgn.push_str(&format!("[Event \"{}\"]\n", info.event));
    pgn.push_str(&format!("[Site \"{}\"]\n", info.site));
    pgn.push_str(&format!("[Date \"{}\"]\n", info.date.format("%Y.%m.%d")));
    pgn.push_str("[Round \"-\"]\n");
    pgn.push_str(&format!("[White \"{}\"]\n", info.white));
    pgn.push_str(&format!("[Black \"{}\"]\n", info.black));
    pgn.push_str(&format!("[Result \"{result}\"]\n"));

    let start = starting_fen(board);
    if start != STANDARD_FEN {
        pgn.push_str("[SetUp \"1\"]\n");
        pgn.push_str(&format!("[FEN \"{start}\"]\n"));
    }
    pgn.push('\n');

    // Movetext, wrapped at 80 columns. Numbers stay glued to their move.
    let mut line = String::new();
    let mut pending_number: Option<String> = None;
    let mut words: Vec<String> = Vec::new();
    for token in movetext_tokens(board) {
        if token.starts_with(|c: char| c.is_ascii_digit()) {
            pending_number = Some(token);
            continue;
        }
        match pending_number.take() {
            Some(num) => words.push(format!("{num} {token}")),
            None => words.push(token),
        }
    }
    words.push(result.to_string());

    for word in words {
        if !line.is_empty() && line.len() + word.len() + 1 > 80 {
            pgn.push_str(&line);
            pgn.push('\n');
            line.clear();
        }
        if !line.is_empty() {
            line.push(' ');
        }
        line.push_str(&word);
    }
    pgn.push_str(&line);
    pgn.push('\n');
    pgn
}

// =========================================================================
// Tests
// =========================================================================
