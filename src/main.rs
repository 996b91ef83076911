//! # Delve Main Entry Point
//!
//! Generates a level, optionally plays a scripted sequence of actions and
//! prints the result as ASCII.

use clap::Parser;
use delve::{
    AsciiDisplay, DelveError, DelveResult, DungeonAlgorithm, GameConfig, GameState,
    PlayerAction,
};
use log::{error, info};
use std::path::PathBuf;

/// Command line arguments for the Delve simulator.
#[derive(Parser, Debug)]
#[command(name = "delve")]
#[command(about = "Headless runner for the Delve dungeon simulation")]
#[command(version)]
struct Args {
    /// Random seed for the run
    #[arg(short, long)]
    seed: Option<u64>,

    /// Map width in cells
    #[arg(long)]
    width: Option<i32>,

    /// Map height in cells
    #[arg(long)]
    height: Option<i32>,

    /// Digging strategy (bsp, tunneling)
    #[arg(short, long)]
    algorithm: Option<DungeonAlgorithm>,

    /// Dungeon level to generate
    #[arg(short, long)]
    level: Option<u32>,

    /// Turns to wait before printing
    #[arg(short, long, default_value_t = 0)]
    turns: u32,

    /// Keys to play, e.g. "l l j g"
    #[arg(long)]
    script: Option<String>,

    /// JSON configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Print every cell, ignoring fog of war
    #[arg(long)]
    reveal: bool,

    /// Log level (error, warn, info, debug, trace)
    #[arg(long, default_value = "info")]
    log_level: String,
}

fn main() {
    let args = Args::parse();
    initialize_logging(&args.log_level);

    info!("Starting Delve v{}", delve::VERSION);
    if let Err(e) = run(&args) {
        error!("{}", e);
        std::process::exit(1);
    }
}

/// Initializes env_logger, letting `RUST_LOG` override the command line.
fn initialize_logging(log_level: &str) {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(log_level))
        .format_target(false)
        .init();
}

/// Merges the configuration file with the command line overrides.
fn build_config(args: &Args) -> DelveResult<GameConfig> {
    let mut config = match &args.config {
        Some(path) => GameConfig::from_path(path)?,
        None => GameConfig::default(),
    };
    if let Some(seed) = args.seed {
        config.seed = seed;
    }
    if let Some(width) = args.width {
        config.generation.width = width;
    }
    if let Some(height) = args.height {
        config.generation.height = height;
    }
    if let Some(algorithm) = args.algorithm {
        config.generation.algorithm = algorithm;
    }
    if let Some(level) = args.level {
        config.level = level;
    }
    Ok(config)
}

fn run(args: &Args) -> DelveResult<()> {
    let config = build_config(args)?;
    info!(
        "Generating level {} ({}x{}, {:?}) with seed {}",
        config.level,
        config.generation.width,
        config.generation.height,
        config.generation.algorithm,
        config.seed
    );
    let mut state = GameState::new(&config)?;

    let mut actions = match &args.script {
        Some(script) => PlayerAction::parse_script(script).map_err(|key| {
            DelveError::InvalidAction(format!("unknown key '{}' in script", key))
        })?,
        None => Vec::new(),
    };
    actions.extend(std::iter::repeat(PlayerAction::Wait).take(args.turns as usize));

    for action in actions {
        if state.player_dead {
            info!("The player died, stopping early");
            break;
        }
        state.perform(action)?;
    }

    let display = AsciiDisplay {
        reveal_all: args.reveal,
        message_count: 10,
    };
    print!("{}", display.render(&state)?);
    info!(
        "Finished after {} turns: {} enemies defeated, {} damage taken",
        state.turn_number, state.statistics.enemies_defeated, state.statistics.damage_taken
    );
    Ok(())
}
