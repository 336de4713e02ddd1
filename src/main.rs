use std::io::Read;
use std::process::ExitCode;

use swapchess::config::AppConfig;
use swapchess::engine::pgn::{self, GameInfo};

fn main() -> ExitCode {
    let config = AppConfig::from_env();

    // Initialize tracing (structured logging).
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| config.log_filter.as_str().into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let export_pgn = args.iter().any(|a| a == "--pgn");
    let path = args.iter().find(|a| !a.starts_with("--"));

    let record = match read_record(path.map(String::as_str)) {
        Ok(text) => text,
        Err(e) => {
            eprintln!("Failed to read game record: {e}");
            return ExitCode::FAILURE;
        }
    };

    let start = match config.start_board() {
        Ok(board) => board,
        Err(e) => {
            eprintln!("Bad CHESS_START_FEN: {e}");
            return ExitCode::FAILURE;
        }
    };

    tracing::info!(
        "swapchess v{} compiling {}",
        env!("CARGO_PKG_VERSION"),
        path.map_or("<stdin>", String::as_str)
    );
    let game = pgn::compile_pgn(&record, start);

    if export_pgn {
        print!("{}", pgn::to_pgn(&game.board, &GameInfo::default()));
    } else {
        println!("{}", pgn::notate_game(&game.board));
        println!("condition: {}", game.board.condition());
        println!("fen: {}", game.board.to_fen());
        println!();
        print!("{}", game.board);
    }

    if game.is_complete() {
        ExitCode::SUCCESS
    } else {
        for token in &game.report.skipped {
            eprintln!("skipped: {token}");
        }
        ExitCode::from(2)
    }
}

/// Read the whole record from `path`, or from stdin when no path is given.
fn read_record(path: Option<&str>) -> std::io::Result<String> {
    match path {
        Some(path) => std::fs::read_to_string(path),
        None => {
            let mut text = String::new();
            std::io::stdin().read_to_string(&mut text)?;
            Ok(text)
        }
    }
}
