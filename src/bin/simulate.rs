//! Headless batch simulation.
//!
//! Usage: `simulate [games] [players] [seed] [max_turns]`
//!
//! Logs a summary on stderr (`RUST_LOG` adjusts verbosity) and prints the
//! full report as JSON on stdout.

use anyhow::{Context, Result};
use aggravation::core::GameConfig;
use aggravation::sim::simulate_batch;

const DEFAULT_GAMES: usize = 10;
const DEFAULT_PLAYERS: usize = 4;
const DEFAULT_MAX_TURNS: u32 = 10_000;

fn arg<T: std::str::FromStr>(args: &[String], index: usize, name: &str) -> Result<Option<T>> {
    args.get(index)
        .map(|raw| {
            raw.parse()
                .ok()
                .with_context(|| format!("Invalid {name}: {raw}. Usage: simulate [games] [players] [seed] [max_turns]"))
        })
        .transpose()
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let games = arg(&args, 0, "game count")?.unwrap_or(DEFAULT_GAMES);
    let players = arg(&args, 1, "player count")?.unwrap_or(DEFAULT_PLAYERS);
    let max_turns = arg(&args, 3, "turn limit")?.unwrap_or(DEFAULT_MAX_TURNS);
    anyhow::ensure!((1..=4).contains(&players), "player count must be 1-4, got {players}");

    let mut config = GameConfig::new(players);
    if let Some(seed) = arg(&args, 2, "seed")? {
        config = config.with_seed(seed);
    }

    tracing::info!(
        "Running {} games, {} players, seed {}, turn limit {}",
        games,
        players,
        config.seed,
        max_turns
    );
    let report = simulate_batch(&config, games, max_turns)?;

    tracing::info!(
        "Completed {}/{} ({:.1}%), turns min {:?} max {:?} mean {:.1}",
        report.games_completed,
        report.games_played,
        report.completion_rate() * 100.0,
        report.min_turns,
        report.max_turns,
        report.mean_turns().unwrap_or(0.0)
    );
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}
