pub mod board;
pub mod condition;
pub mod grid;
pub mod manual;
pub mod pgn;
pub mod pieces;
pub mod san;
pub mod segments;
pub mod types;

pub use board::{Board, Rules, STANDARD_FEN};
pub use manual::{ManualBoard, MoveStage};
pub use pgn::{CompiledGame, compile_pgn, extract_raw_moves, notate_game};
pub use san::DecodeReport;
pub use types::*;
