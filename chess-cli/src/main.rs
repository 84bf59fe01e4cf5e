//! 自对弈命令行
//!
//! 引擎执白执黑对弈到终局，逐步打印走法与棋盘，最后输出结果与 PGN。

use std::path::PathBuf;

use anyhow::{Context, Result};
use chess_ai::{AiConfig, AiEngine, Difficulty, MoveSource};
use clap::{Parser, ValueEnum};
use rules::{Game, GameRecord, MoveRecord};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser, Debug)]
#[command(author, version, about = "Chess engine self-play", long_about = None)]
struct Args {
    /// Difficulty preset used when no config file is given
    #[arg(long, value_enum, default_value_t = Level::Medium)]
    difficulty: Level,

    /// AI config file (JSON); command-line flags override its fields
    #[arg(long)]
    config: Option<PathBuf>,

    /// Maximum search depth
    #[arg(long)]
    depth: Option<u8>,

    /// Time limit per move in milliseconds (0 = unlimited)
    #[arg(long)]
    time_ms: Option<u64>,

    /// Transposition table size in MB
    #[arg(long)]
    tt_mb: Option<usize>,

    /// Opening book file (JSON)
    #[arg(long, conflicts_with = "no_book")]
    book: Option<PathBuf>,

    /// Disable the opening book
    #[arg(long)]
    no_book: bool,

    /// Seed for opening book choices
    #[arg(long)]
    seed: Option<u64>,

    /// Starting position
    #[arg(long)]
    fen: Option<String>,

    /// Stop after this many plies
    #[arg(long)]
    max_plies: Option<usize>,

    /// End the game on claimable draws (threefold repetition, fifty moves)
    #[arg(long)]
    claim_draw: bool,

    #[arg(long, default_value = "chess-ai")]
    white: String,

    #[arg(long, default_value = "chess-ai")]
    black: String,

    #[arg(long, default_value = "Self-play")]
    event: String,

    /// Write the game record as JSON
    #[arg(long)]
    json: Option<PathBuf>,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Level {
    Easy,
    Medium,
    Hard,
}

impl From<Level> for Difficulty {
    fn from(level: Level) -> Self {
        match level {
            Level::Easy => Difficulty::Easy,
            Level::Medium => Difficulty::Medium,
            Level::Hard => Difficulty::Hard,
        }
    }
}

fn build_config(args: &Args) -> Result<AiConfig> {
    let mut config = match &args.config {
        Some(path) => AiConfig::load(path)
            .with_context(|| format!("Failed to load AI config {:?}", path))?,
        None => AiConfig::from_difficulty(args.difficulty.into()),
    };

    if let Some(depth) = args.depth {
        config.max_depth = depth;
    }
    if let Some(ms) = args.time_ms {
        config.time_limit_ms = (ms > 0).then_some(ms);
    }
    if let Some(mb) = args.tt_mb {
        config.tt_size_mb = mb;
    }
    if let Some(path) = &args.book {
        config.book_path = Some(path.clone());
        config.use_opening_book = true;
    }
    if args.no_book {
        config.use_opening_book = false;
    }
    if args.seed.is_some() {
        config.seed = args.seed;
    }

    Ok(config)
}

fn main() -> Result<()> {
    // 初始化日志
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("chess_cli=info".parse()?)
                .add_directive("chess_ai=info".parse()?),
        )
        .init();

    let args = Args::parse();
    let config = build_config(&args)?;
    info!(
        "Starting self-play: depth {}, time limit {:?} ms, book {}",
        config.max_depth, config.time_limit_ms, config.use_opening_book
    );
    let mut engine = AiEngine::from_config(config).context("Failed to create engine")?;

    let (mut game, mut record) = match &args.fen {
        Some(fen) => {
            let game = Game::from_fen(fen).with_context(|| format!("Invalid FEN {:?}", fen))?;
            let record = GameRecord::from_fen(args.white.clone(), args.black.clone(), game.to_fen());
            (game, record)
        }
        None => (Game::new(), GameRecord::new(args.white.clone(), args.black.clone())),
    };
    record.set_event(&args.event);

    while !game.is_game_over(args.claim_draw) {
        if args.max_plies.is_some_and(|max| game.ply() >= max) {
            warn!("Stopping after {} plies", game.ply());
            break;
        }

        let number = game.fullmove_number();
        let outcome = engine.think(&mut game)?;
        let entry = MoveRecord::new(&game, outcome.best_move)?;
        game.apply(outcome.best_move)?;

        let source = match outcome.source {
            MoveSource::Book => "book".to_string(),
            MoveSource::Search => format!("depth {}, score {}", outcome.depth, outcome.score),
        };
        println!(
            "The move is: {} ({})\nThe number of moves: {}\n\n{}\n",
            entry.san, source, number, game
        );
        record.add_move(entry);
    }

    if let Some(result) = game.outcome(args.claim_draw) {
        record.set_result(result);
    }
    println!("{}", game.result(args.claim_draw));
    println!("{}", record.to_pgn());

    if let Some(path) = &args.json {
        let json = record.to_json()?;
        std::fs::write(path, json)
            .with_context(|| format!("Failed to write game record {:?}", path))?;
        info!("Game record saved to {:?}", path);
    }

    Ok(())
}
