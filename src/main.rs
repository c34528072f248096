//! # Tactica Main Entry Point
//!
//! Synthesizes a battlefield, sets up a match and plays it headlessly, either
//! from a command script or with the automatic controller.

use clap::Parser;
use serde::Serialize;
use std::path::PathBuf;
use tactica::{
    config, generation::utils, run_skirmish, AutoController, Command, GameEvent, GameOutcome,
    Match, MatchConfig, SynthesisConfig, TacticaResult, TerrainType, Unit,
};

/// Command line arguments for the Tactica simulator.
#[derive(Parser, Debug)]
#[command(name = "tactica")]
#[command(about = "Headless turn-based tactics on a synthesized grid")]
#[command(version)]
struct Args {
    /// Random seed for terrain synthesis and the automatic controller
    #[arg(short, long)]
    seed: Option<u64>,

    /// Grid width in tiles
    #[arg(long, default_value_t = config::DEFAULT_GRID_WIDTH)]
    width: u32,

    /// Grid height in tiles
    #[arg(long, default_value_t = config::DEFAULT_GRID_HEIGHT)]
    height: u32,

    /// Synthesis runs allowed before a contradiction is fatal
    #[arg(long, default_value_t = 10)]
    max_attempts: u32,

    /// JSON command script to play instead of the automatic controller
    #[arg(long)]
    script: Option<PathBuf>,

    /// Stop the automatic skirmish after this many turns
    #[arg(long, default_value_t = 200)]
    max_turns: u64,

    /// Print a JSON summary instead of the text board
    #[arg(long)]
    json: bool,

    /// Log level (error, warn, info, debug, trace)
    #[arg(long, default_value = "info")]
    log_level: String,
}

/// Machine-readable result of a run.
#[derive(Debug, Serialize)]
struct Summary<'a> {
    seed: u64,
    terrain: Vec<Vec<TerrainType>>,
    units: Vec<&'a Unit>,
    turns: u64,
    outcome: Option<GameOutcome>,
    events: Vec<GameEvent>,
}

fn main() -> TacticaResult<()> {
    let args = Args::parse();

    initialize_logging(&args.log_level);

    log::info!("Starting Tactica v{}", tactica::VERSION);

    let seed = args.seed.unwrap_or(12345);
    let synthesis = SynthesisConfig::new(seed).with_max_attempts(args.max_attempts);
    let mut rng = utils::create_rng(&synthesis);

    let match_config = MatchConfig {
        grid_width: args.width,
        grid_height: args.height,
        ..MatchConfig::new()
    };
    let mut game = Match::with_generated_terrain(match_config, &synthesis, &mut rng)?;

    let (turns, outcome, events) = match &args.script {
        Some(path) => {
            log::info!("Playing script {}", path.display());
            let commands = Command::load_script_file(path)?;
            let events = play_script(&mut game, &commands);
            (game.turn_number(), game.outcome(), events)
        }
        None => {
            log::info!("Playing automatic skirmish with seed {}", seed);
            let report = run_skirmish(&mut game, &AutoController::new(), &mut rng, args.max_turns);
            (report.turns, report.outcome, report.events)
        }
    };

    if args.json {
        let summary = Summary {
            seed,
            terrain: game.grid().terrain_map().rows(),
            units: game.units().iter().collect(),
            turns,
            outcome,
            events,
        };
        println!("{}", serde_json::to_string_pretty(&summary)?);
    } else {
        print!("{}", render_board(&game));
        for unit in game.units().iter() {
            println!(
                "{:<14} {:<8} hp {} energy {}",
                unit.name,
                unit.position.to_string(),
                unit.hp,
                unit.energy
            );
        }
        match outcome {
            Some(GameOutcome::Winner(team)) => println!("{team} wins after {turns} turns"),
            Some(GameOutcome::Draw) => println!("Draw after {turns} turns"),
            None => println!("No result after {turns} turns"),
        }
    }

    Ok(())
}

/// Initializes the logging system based on the specified log level.
fn initialize_logging(log_level: &str) {
    #[cfg(feature = "dev-tools")]
    {
        use tracing::Level;

        let level = match log_level.to_lowercase().as_str() {
            "error" => Level::ERROR,
            "warn" => Level::WARN,
            "info" => Level::INFO,
            "debug" => Level::DEBUG,
            "trace" => Level::TRACE,
            _ => Level::INFO,
        };

        tracing_subscriber::fmt()
            .with_max_level(level)
            .with_target(false)
            .init();
    }

    #[cfg(not(feature = "dev-tools"))]
    {
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(log_level))
            .init();
    }
}

/// Applies every command in order, letting movement finish between commands.
fn play_script(game: &mut Match, commands: &[Command]) -> Vec<GameEvent> {
    let mut events = game.drain_events();

    for (step, command) in commands.iter().enumerate() {
        if game.is_game_over() {
            log::info!("Match over, ignoring {} remaining commands", commands.len() - step);
            break;
        }
        if let Err(rejection) = game.apply(*command) {
            log::warn!("Command {} ({:?}) rejected: {}", step + 1, command, rejection);
        }
        while game.is_busy() {
            game.tick(config::TICK_SECONDS);
        }
        events.extend(game.drain_events());
    }

    events
}

/// Terrain glyphs with units drawn on top, one line per row.
fn render_board(game: &Match) -> String {
    let grid = game.grid();
    let mut board = String::new();

    for y in 0..grid.height() as i32 {
        for x in 0..grid.width() as i32 {
            let coord = tactica::GridCoordinate::new(x, y);
            let glyph = match game.unit_at(coord) {
                Some(unit) => char::from(b'A' + unit.team.id()),
                None => grid
                    .tile_at(coord)
                    .map(|tile| tile.terrain.glyph())
                    .unwrap_or(' '),
            };
            board.push(glyph);
        }
        board.push('\n');
    }

    board
}
