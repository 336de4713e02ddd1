use crate::engine::board::{Board, Rules, STANDARD_FEN};
use crate::engine::types::ChessError;

/// Engine configuration parsed from environment variables.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Log filter used when `RUST_LOG` is not set.
    pub log_filter: String,
    /// Position that compiled records start from.
    pub start_fen: String,
    /// Capture-free plies before the fifty-move rule declares a draw.
    pub fifty_move_plies: usize,
}

impl AppConfig {
    /// Load configuration from environment variables with defaults.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build a configuration from any key/value source. Unset or unparsable
    /// values fall back to the defaults.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = AppConfig::default();
        AppConfig {
            log_filter: lookup("CHESS_LOG").unwrap_or(defaults.log_filter),
            start_fen: lookup("CHESS_START_FEN").unwrap_or(defaults.start_fen),
            fifty_move_plies: lookup("CHESS_FIFTY_MOVE_PLIES")
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.fifty_move_plies),
        }
    }

    pub fn rules(&self) -> Rules {
        Rules {
            fifty_move_plies: self.fifty_move_plies,
        }
    }

    /// A fresh board at the configured start position with the configured
    /// rules.
    pub fn start_board(&self) -> Result<Board, ChessError> {
        Ok(Board::from_fen(&self.start_fen)?.with_rules(self.rules()))
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        AppConfig {
            log_filter: "swapchess=info".to_string(),
            start_fen: STANDARD_FEN.to_string(),
            fifty_move_plies: Rules::default().fifty_move_plies,
        }
    }
}
