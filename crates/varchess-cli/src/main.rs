//! varchess - replay, validate, analyse and self-play variant chess games.

mod json_output;

use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use json_output::AnalysisJson;
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;
use varchess_core::{notation, GameRecord};
use varchess_engine::{
    Board, EngineConfig, Phase, SearchEngine, Session, SessionEvent, VariantCatalog,
};

#[derive(Parser)]
#[command(name = "varchess")]
#[command(about = "Variant chess engine")]
struct Cli {
    /// Configuration file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Check that a saved game decodes and replays
    Validate {
        /// Saved game file
        file: PathBuf,
    },
    /// Replay a saved game and print the final position
    Replay {
        /// Saved game file
        file: PathBuf,
        /// Stop after this many plies
        #[arg(long)]
        ply: Option<usize>,
    },
    /// Search the final position of a saved game
    Analyse {
        /// Saved game file
        file: PathBuf,
        /// Search depth in plies
        #[arg(short, long, default_value = "3")]
        depth: u32,
        /// Print the result as JSON
        #[arg(long)]
        json: bool,
    },
    /// Let the engine play both sides and save the game
    Selfplay {
        /// Variant setup name
        #[arg(short, long, default_value = "classic")]
        setup: String,
        /// Use the atomic capture rule
        #[arg(long)]
        atomic: bool,
        /// Strength level of White (1-5)
        #[arg(long, default_value = "2")]
        white: u32,
        /// Strength level of Black (1-5)
        #[arg(long, default_value = "2")]
        black: u32,
        /// Stop after this many plies
        #[arg(long, default_value = "200")]
        max_plies: usize,
        /// Where to save the game
        #[arg(short, long)]
        out: PathBuf,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => EngineConfig::load_from(path),
        None => EngineConfig::load(),
    }
    .context("loading configuration")?;
    let catalog = load_catalog(&config)?;

    match cli.command {
        Commands::Validate { file } => validate(&catalog, &file),
        Commands::Replay { file, ply } => replay(&catalog, &file, ply),
        Commands::Analyse { file, depth, json } => analyse(&catalog, &file, depth, json),
        Commands::Selfplay {
            setup,
            atomic,
            white,
            black,
            max_plies,
            out,
        } => {
            let session = Session::new(catalog, config)?;
            selfplay(session, &setup, atomic, (white, black), max_plies, &out).await
        }
    }
}

fn load_catalog(config: &EngineConfig) -> anyhow::Result<VariantCatalog> {
    let mut catalog = VariantCatalog::builtin();
    if let Some(dir) = &config.variants_dir {
        let loaded = catalog
            .load_dir(dir)
            .with_context(|| format!("loading variants from {}", dir.display()))?;
        tracing::info!("Loaded {} variants from {}", loaded, dir.display());
    }
    Ok(catalog)
}

/// Decodes a saved game and replays it onto a fresh board.
fn load_game(catalog: &VariantCatalog, file: &Path) -> anyhow::Result<(GameRecord, Board)> {
    let record = notation::read_file(file, catalog)
        .map_err(varchess_engine::EngineError::from)
        .with_context(|| format!("reading {}", file.display()))?;
    let mut board = Board::new(catalog.get(&record.setup)?, record.atomic);
    board
        .replay(&record.moves)
        .with_context(|| format!("replaying {}", file.display()))?;
    Ok((record, board))
}

fn validate(catalog: &VariantCatalog, file: &Path) -> anyhow::Result<()> {
    let (record, board) = load_game(catalog, file)?;
    println!(
        "{}: ok ({} plies, setup {}{}, {} vs {})",
        file.display(),
        record.len(),
        record.setup,
        if record.atomic { ", atomic" } else { "" },
        GameRecord::level_name(record.white_level),
        GameRecord::level_name(record.black_level),
    );
    if let Phase::Terminal(outcome) = board.phase() {
        println!("Result: {}", outcome);
    }
    Ok(())
}

fn replay(catalog: &VariantCatalog, file: &Path, ply: Option<usize>) -> anyhow::Result<()> {
    let (record, mut board) = load_game(catalog, file)?;
    if let Some(ply) = ply {
        board.jump(&record.moves, ply)?;
    }
    for (i, mv) in board.moves().enumerate() {
        if i % 2 == 0 {
            print!("{}. {}", i / 2 + 1, mv.to_token());
        } else {
            println!(" {}", mv.to_token());
        }
    }
    if board.ply() % 2 == 1 {
        println!();
    }
    println!("{}", board);
    match board.phase() {
        Phase::Terminal(outcome) => println!("Result: {}", outcome),
        _ => println!("{} to move", board.side_to_move()),
    }
    Ok(())
}

fn analyse(catalog: &VariantCatalog, file: &Path, depth: u32, json: bool) -> anyhow::Result<()> {
    let (record, board) = load_game(catalog, file)?;
    let seq = SearchEngine::new(depth)?.best_sequence(&board)?;
    if json {
        let out = AnalysisJson::new(&record, &board, depth, &seq);
        println!("{}", serde_json::to_string_pretty(&out)?);
    } else {
        let line: Vec<String> = seq.moves.iter().map(|m| m.to_token()).collect();
        println!("Depth {}: score {} line {}", depth, seq.score, line.join(" "));
    }
    Ok(())
}

async fn selfplay(
    mut session: Session,
    setup: &str,
    atomic: bool,
    (white, black): (u32, u32),
    max_plies: usize,
    out: &Path,
) -> anyhow::Result<()> {
    if white == 0 || black == 0 {
        bail!("self-play needs engine levels of at least 1 for both sides");
    }
    session.set_levels(white, black);
    session.new_game(setup, atomic)?;
    let mut events = session.subscribe();

    while session.record().len() < max_plies {
        if session.play_engine_move().await?.is_none() {
            break;
        }
        while let Ok(event) = events.try_recv() {
            match event {
                SessionEvent::MoveApplied(mv) => {
                    tracing::info!("Ply {}: {}", session.record().len(), mv)
                }
                SessionEvent::GameOver {
                    outcome,
                    final_score,
                } => println!("Game over: {} (final score {})", outcome, final_score),
                _ => {}
            }
        }
    }

    session
        .save(out)
        .with_context(|| format!("saving {}", out.display()))?;
    println!(
        "Saved {} plies to {}",
        session.record().len(),
        out.display()
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_parses_subcommands() {
        let cli = Cli::try_parse_from(["varchess", "analyse", "game.mcg", "--depth", "2", "--json"])
            .unwrap();
        assert!(matches!(
            cli.command,
            Commands::Analyse { depth: 2, json: true, .. }
        ));

        let cli = Cli::try_parse_from([
            "varchess", "selfplay", "--setup", "gardner", "--atomic", "--out", "g.mcg",
        ])
        .unwrap();
        assert!(matches!(
            cli.command,
            Commands::Selfplay { atomic: true, white: 2, max_plies: 200, .. }
        ));
    }

    #[test]
    fn load_game_reports_bad_files() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.mcg");
        std::fs::write(&path, "colour=red\n{BEGIN}\n").unwrap();
        let catalog = VariantCatalog::builtin();
        let err = load_game(&catalog, &path).unwrap_err();
        assert!(format!("{:#}", err).contains("colour"), "{:#}", err);

        std::fs::write(&path, "setup=gardner\n{BEGIN}\na2a3\n").unwrap();
        let (record, board) = load_game(&catalog, &path).unwrap();
        assert_eq!(record.setup, "gardner");
        assert_eq!(board.ply(), 1);
    }

    #[tokio::test]
    async fn selfplay_saves_a_game() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("self.mcg");
        let session = Session::new(VariantCatalog::builtin(), EngineConfig::default()).unwrap();
        selfplay(session, "gardner", false, (1, 1), 6, &out).await.unwrap();

        let record = notation::read_file(&out, &VariantCatalog::builtin()).unwrap();
        assert_eq!(record.setup, "gardner");
        assert!(record.len() <= 6 && !record.is_empty());
        assert_eq!((record.white_level, record.black_level), (1, 1));
    }
}
