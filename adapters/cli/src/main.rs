#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Command-line adapter that runs OpenBound maps headlessly.

mod config;
mod script;
mod session;

use std::{
    fs,
    path::{Path, PathBuf},
    process::ExitCode,
};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use openbound_map_format::{parse_map, LoadedMap, TileTable};
use openbound_world::{query, World};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use crate::{
    config::{load_tiles, CliConfig},
    script::Script,
    session::{log_events, Session, Summary},
};

#[derive(Debug, Parser)]
#[command(name = "openbound", about = "Headless runner for OpenBound maps")]
struct CliArgs {
    /// TOML file with a `[tuning]` table overriding movement constants.
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    /// TOML tile table replacing the stock tile palette.
    #[arg(long, global = true)]
    tiles: Option<PathBuf>,
    #[command(subcommand)]
    command: CliCommand,
}

#[derive(Debug, Subcommand)]
enum CliCommand {
    /// Prints map metadata and the compiled navigation of every wall state.
    Inspect {
        /// JSON map document.
        map: PathBuf,
    },
    /// Replays scripted input through the fixed-step loop and prints a JSON summary.
    Simulate {
        /// JSON map document.
        map: PathBuf,
        /// TOML file of `[[input]]` entries keyed by tick.
        #[arg(long)]
        script: Option<PathBuf>,
        /// Number of ticks to simulate.
        #[arg(long, default_value_t = 600)]
        ticks: u64,
    },
}

/// Entry point for the OpenBound command-line interface.
fn main() -> ExitCode {
    install_tracing();
    match run(CliArgs::parse()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(failure) => {
            error!("{failure:#}");
            ExitCode::FAILURE
        }
    }
}

fn install_tracing() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("openbound=info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn run(args: CliArgs) -> Result<()> {
    let config = CliConfig::load(args.config.as_deref())?;
    let tiles = load_tiles(args.tiles.as_deref())?;
    match args.command {
        CliCommand::Inspect { map } => {
            let loaded = load_map(&map, &tiles, &config)?;
            inspect(&loaded, &config);
            Ok(())
        }
        CliCommand::Simulate { map, script, ticks } => {
            let loaded = load_map(&map, &tiles, &config)?;
            let script = Script::load(script.as_deref())?;
            simulate(&loaded, &config, &script, ticks)
        }
    }
}

fn load_map(path: &Path, tiles: &TileTable, config: &CliConfig) -> Result<LoadedMap> {
    let source = fs::read_to_string(path)
        .with_context(|| format!("failed to read map {}", path.display()))?;
    let loaded = parse_map(&source, tiles, config.tuning.unit_half_width)
        .with_context(|| format!("failed to load map {}", path.display()))?;
    info!(map = %loaded.name, author = %loaded.author, "map loaded");
    Ok(loaded)
}

fn inspect(loaded: &LoadedMap, config: &CliConfig) {
    let definition = &loaded.definition;
    let world = World::new(definition, config.tuning.clone());
    let states = query::wall_states(&world);

    println!("{} by {}", loaded.name, loaded.author);
    if !loaded.notes.is_empty() {
        println!("  {}", loaded.notes);
    }
    println!(
        "grid {}x{} ({} walls), start {}, lives {}, difficulty {}",
        definition.grid.columns(),
        definition.grid.rows(),
        definition.grid.wall_count(),
        definition.start,
        definition.initial_lives,
        loaded.difficulty,
    );
    for (index, obstacle) in definition.obstacles.iter().enumerate() {
        println!(
            "obstacle {index}: {} locations, {} explosion records, {} wall configurations",
            obstacle.locations.len(),
            obstacle.explosions.len(),
            states.configurations(index).map_or(0, <[_]>::len),
        );
    }
    println!("wall states: {}", states.len());
    for (key, mesh) in states.iter() {
        let stats = mesh.stats();
        println!(
            "  {:?}: {} regions, {} nodes, {} edges, {} collision segments",
            key.components(),
            stats.regions,
            stats.nodes,
            stats.edges,
            stats.collision_segments,
        );
    }
}

fn simulate(loaded: &LoadedMap, config: &CliConfig, script: &Script, ticks: u64) -> Result<()> {
    let mut session = Session::new(&loaded.definition, config.tuning.clone())
        .with_context(|| format!("failed to prepare obstacles of {}", loaded.name))?;
    let mut log = Vec::new();
    for tick in 0..ticks {
        let first = log.len();
        session
            .step(&script.inputs_at(tick), &mut log)
            .with_context(|| format!("simulation failed at tick {tick}"))?;
        log_events(tick, &log[first..]);
    }

    let summary = Summary::collect(&loaded.name, &session, &log);
    info!(
        ticks = summary.ticks,
        deaths = summary.deaths,
        state = ?summary.state,
        "simulation finished"
    );
    println!("{}", serde_json::to_string_pretty(&summary)?);
    Ok(())
}
