//! Standard Algebraic Notation (SAN) against a live board.
//!
//! Decoding resolves each token against the *current* position and commits it
//! through [`Board::attempt_move`], so a token is accepted exactly when the
//! same move would be accepted interactively. Encoding only ever notates the
//! most recently committed move.
//!
//! SAN examples: `e4`, `Nf3`, `Bxe5`, `O-O`, `e8=Q+`, `Raxd1#`, `exd6 e.p.`.

use tracing::warn;

use crate::engine::board::Board;
use crate::engine::pieces;
use crate::engine::types::{ChessError, GameCondition, MoveKind, PieceType, Square};

/// Appended to en-passant captures.
pub const EN_PASSANT_SUFFIX: &str = " e.p.";

// =========================================================================
// SAN generation
// =========================================================================

/// Notate the last committed move, including its check/mate/draw suffix.
///
/// Uses [`Board::history_callback`] to ask whether another piece of the same
/// kind could have reached the destination one ply ago.
pub fn encode_last_move(board: &mut Board) -> Option<String> {
    let mv = board.last_move()?.clone();
    let from = mv.origin()?;
    let to = mv.destination()?;
    let mut san = String::with_capacity(12);

    if mv.kind == MoveKind::Castle {
        san.push_str(if to.file() > from.file() { "O-O" } else { "O-O-O" });
    } else {
        let kind = board.piece(mv.mover()).kind;
        match kind.letter() {
            None => {
                if mv.is_capture() {
                    san.push(from.file_char());
                    san.push('x');
                }
                san.push_str(&to.to_algebraic());
                if let Some(letter) = mv.promoted().and_then(|id| board.piece(id).kind.letter()) {
                    san.push('=');
                    san.push(letter);
                }
            }
            Some(letter) => {
                san.push(letter);
                san.push_str(&disambiguation(board, kind, from, to));
                if mv.is_capture() {
                    san.push('x');
                }
                san.push_str(&to.to_algebraic());
            }
        }
    }

    san.push_str(condition_suffix(board.condition()));
    if mv.kind == MoveKind::EnPassant {
        san.push_str(EN_PASSANT_SUFFIX);
    }
    Some(san)
}

/// `#` for mate, `+` for check, `=` for any drawn condition.
pub fn condition_suffix(condition: GameCondition) -> &'static str {
    match condition {
        GameCondition::Checkmate => "#",
        GameCondition::Check => "+",
        c if c.is_drawn() => "=",
        _ => "",
    }
}

/// Determine the disambiguation string for the last move.
///
/// If other pieces of the same kind and colour could legally have reached
/// `to` before the move, add file, rank, or both to distinguish.
fn disambiguation(board: &mut Board, kind: PieceType, from: Square, to: Square) -> String {
    let rivals = board
        .history_callback(1, |rewound| {
            let us = rewound.to_move();
            rewound
                .active_pieces(us)
                .filter(|p| p.kind == kind && p.square != from)
                .map(|p| p.square)
                .filter(|&sq| rewound.is_legal(sq, to))
                .collect::<Vec<_>>()
        })
        .unwrap_or_default();

    if rivals.is_empty() {
        return String::new();
    }

    let same_file = rivals.iter().any(|sq| sq.file() == from.file());
    let same_rank = rivals.iter().any(|sq| sq.rank() == from.rank());

    match (same_file, same_rank) {
        // File alone is sufficient.
        (false, _) => from.file_char().to_string(),
        // Rank alone is sufficient.
        (true, false) => from.rank_char().to_string(),
        (true, true) => from.to_algebraic(),
    }
}

// =========================================================================
// SAN parsing
// =========================================================================

/// A move token, parsed but not yet resolved against a board.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SanToken {
    Castle {
        kingside: bool,
    },
    Pawn {
        from_file: Option<u8>,
        to: Square,
        promotion: Option<PieceType>,
    },
    Piece {
        kind: PieceType,
        from_file: Option<u8>,
        from_rank: Option<u8>,
        to: Square,
    },
}

fn token_error(token: &str, reason: impl Into<String>) -> ChessError {
    ChessError::InvalidToken {
        token: token.to_string(),
        reason: reason.into(),
    }
}

/// Drop annotation and condition suffixes (`+`, `#`, `!`, `?`, a trailing
/// draw `=`) and an en-passant marker.
pub fn normalize(token: &str) -> &str {
    let token = token.trim();
    let token = token.strip_suffix(EN_PASSANT_SUFFIX).unwrap_or(token);
    let token = token.trim_end_matches(['+', '#', '!', '?']);
    let token = token.strip_suffix('=').unwrap_or(token);
    token.trim_end_matches(['+', '#'])
}

/// Parse a SAN token.
///
/// Accepts `e4`, `exd5`, `e8=Q`, `Nf3`, `Nbd7`, `R1a4`, `Nd7f6`, `Bxe5`,
/// `O-O`, `O-O-O` (and the `0-0` spellings). Check, mate and draw suffixes
/// are ignored.
pub fn parse_token(raw: &str) -> Result<SanToken, ChessError> {
    let san = normalize(raw);

    // Castling.
    match san {
        "O-O" | "0-0" => return Ok(SanToken::Castle { kingside: true }),
        "O-O-O" | "0-0-0" => return Ok(SanToken::Castle { kingside: false }),
        _ => {}
    }

    let chars: Vec<char> = san.chars().collect();
    if chars.is_empty() {
        return Err(token_error(raw, "empty token"));
    }

    // Detect promotion.
    let (chars, promotion) = if chars.len() >= 2 && chars[chars.len() - 2] == '=' {
        let letter = chars[chars.len() - 1];
        let promo = PieceType::from_letter(letter.to_ascii_uppercase())
            .filter(|p| PieceType::PROMOTIONS.contains(p))
            .ok_or_else(|| token_error(raw, format!("bad promotion piece '{letter}'")))?;
        (&chars[..chars.len() - 2], Some(promo))
    } else {
        (&chars[..], None)
    };
    if chars.is_empty() {
        return Err(token_error(raw, "empty token"));
    }

    // Determine piece type.
    let (kind, rest) = match PieceType::from_letter(chars[0]) {
        Some(kind) => (kind, &chars[1..]),
        None => (PieceType::Pawn, chars),
    };

    // Strip capture marker 'x'.
    let rest: Vec<char> = rest.iter().copied().filter(|&c| c != 'x').collect();

    // The last two characters are the destination square.
    if rest.len() < 2 {
        return Err(token_error(raw, "too short"));
    }
    let dest_str: String = rest[rest.len() - 2..].iter().collect();
    let to = Square::from_algebraic(&dest_str)
        .ok_or_else(|| ChessError::InvalidSquare(dest_str.clone()))?;

    // Disambiguation characters (0, 1, or 2 chars before destination).
    let disambig = &rest[..rest.len() - 2];
    if disambig.len() > 2
        || disambig
            .iter()
            .any(|c| !matches!(c, 'a'..='h' | '1'..='8'))
    {
        return Err(token_error(raw, "unreadable origin"));
    }
    let from_file = disambig
        .iter()
        .find(|c| c.is_ascii_lowercase())
        .map(|&c| c as u8 - b'a');
    let from_rank = disambig
        .iter()
        .find(|c| c.is_ascii_digit())
        .map(|&c| c as u8 - b'1');

    if kind == PieceType::Pawn {
        if from_rank.is_some() {
            return Err(token_error(raw, "pawn moves name only an origin file"));
        }
        return Ok(SanToken::Pawn {
            from_file,
            to,
            promotion,
        });
    }
    if promotion.is_some() {
        return Err(token_error(raw, "only pawns promote"));
    }
    Ok(SanToken::Piece {
        kind,
        from_file,
        from_rank,
        to,
    })
}

/// Origin squares of the side to move that fit `token`, in arena order.
fn candidates(board: &Board, token: SanToken) -> Vec<(Square, Square)> {
    let us = board.to_move();
    match token {
        SanToken::Castle { kingside } => board
            .king(us)
            .and_then(|king| {
                let to = king.square.offset(0, if kingside { 2 } else { -2 })?;
                Some((king.square, to))
            })
            .into_iter()
            .collect(),
        SanToken::Pawn { from_file, to, .. } => board
            .active_pieces(us)
            .filter(|p| p.kind == PieceType::Pawn)
            .filter(|p| match from_file {
                // A capture names the origin file; a push stays on its file.
                Some(file) => p.square.file() == file && file != to.file(),
                None => p.square.file() == to.file(),
            })
            .filter(|p| {
                let kind = pieces::classify(board, p.square, to, false);
                kind.is_valid() && (from_file.is_some() || kind != MoveKind::EnPassant)
            })
            .map(|p| (p.square, to))
            .collect(),
        SanToken::Piece {
            kind,
            from_file,
            from_rank,
            to,
        } => board
            .active_pieces(us)
            .filter(|p| p.kind == kind)
            .filter(|p| from_file.is_none_or(|f| p.square.file() == f))
            .filter(|p| from_rank.is_none_or(|r| p.square.rank() == r))
            .filter(|p| pieces::classify(board, p.square, to, false).is_valid())
            .map(|p| (p.square, to))
            .collect(),
    }
}

/// Resolve one token against the board and commit it.
///
/// Candidates the board would refuse (a pinned piece, say) are dropped;
/// exactly one legal candidate must remain. A promotion without a named
/// piece becomes a queen.
pub fn apply_token(board: &mut Board, raw: &str) -> Result<MoveKind, ChessError> {
    let token = parse_token(raw)?;
    if board.promotion_pending()
        && let Some(last) = board.last_move().and_then(|m| m.destination())
    {
        return Err(ChessError::PromotionPending(last));
    }

    let options = candidates(board, token);
    if options.is_empty() {
        return Err(ChessError::NoCandidate {
            token: raw.to_string(),
            color: board.to_move(),
        });
    }

    let legal: Vec<(Square, Square)> = options
        .iter()
        .copied()
        .filter(|&(from, to)| board.is_legal(from, to))
        .collect();
    let (from, to) = match legal.as_slice() {
        [only] => *only,
        [] => {
            let (from, to) = options[0];
            return Err(ChessError::IllegalMove { from, to });
        }
        _ => {
            return Err(ChessError::AmbiguousCandidate {
                token: raw.to_string(),
                color: board.to_move(),
            });
        }
    };

    let kind = board.attempt_move(from, to);
    if !kind.is_valid() {
        return Err(ChessError::IllegalMove { from, to });
    }
    if board.promotion_pending() {
        let promotion = match token {
            SanToken::Pawn {
                promotion: Some(p), ..
            } => p,
            _ => {
                warn!(token = raw, "promotion piece missing, promoting to queen");
                PieceType::Queen
            }
        };
        board.amend_promotion_move(promotion)?;
        return Ok(MoveKind::Promotion);
    }
    Ok(kind)
}

/// Outcome of decoding a token stream.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct DecodeReport {
    /// Tokens that were committed.
    pub applied: usize,
    /// Tokens that could not be resolved, in order.
    pub skipped: Vec<String>,
}

/// Decode `tokens` onto `board` one by one.
///
/// A token that fails is logged and skipped; later tokens are still applied
/// to whatever position the board is in.
pub fn decode<S: AsRef<str>>(board: &mut Board, tokens: &[S]) -> DecodeReport {
    let mut report = DecodeReport::default();
    for token in tokens {
        let token = token.as_ref();
        match apply_token(board, token) {
            Ok(_) => report.applied += 1,
            Err(e) => {
                warn!(token, ply = board.ply(), error = %e, "skipping move token");
                report.skipped.push(token.to_string());
            }
        }
    }
    report
}

// =========================================================================
// Tests
// =========================================================================
