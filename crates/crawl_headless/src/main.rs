//! Terminal dungeon crawler.
//!
//! # Usage
//!
//! ```bash
//! # Play over stdin/stdout (JSON lines or w/a/s/d/space)
//! cargo run -p crawl_headless -- play --seed 42 --auto-render
//!
//! # Watch the autopilot play one seed
//! cargo run -p crawl_headless -- simulate --seed 7 --every 5
//!
//! # Autopilot batch with results saved to disk
//! cargo run -p crawl_headless -- batch --count 500 --output results/batch.json
//!
//! # Check that seeds replay identically
//! cargo run -p crawl_headless -- verify --seed 1 --seeds 20
//! ```
//!
//! # Protocol
//!
//! Input (stdin): commands, one per line
//! Output (stdout): JSON responses, one per line
//! Logs (stderr): Debug information (filter with `RUST_LOG`)

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crawl_core::prelude::*;
use crawl_headless::{
    ascii::{render_frame, AsciiConfig},
    batch::{autopilot_for, play_autopilot, run_batch, verify_seed, BatchConfig},
    config::SessionConfig,
    session::run_session,
};

#[derive(Parser)]
#[command(name = "crawl_headless")]
#[command(about = "Terminal dungeon crawler with autopilot and batch tools")]
#[command(version)]
struct Cli {
    /// Enable verbose logging to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Session config file (RON)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Play one game over stdin/stdout
    Play {
        /// Seed for the first game
        #[arg(long)]
        seed: Option<u64>,

        /// Output state after every change
        #[arg(long)]
        auto_state: bool,

        /// Output an ASCII frame after every change
        #[arg(long)]
        auto_render: bool,
    },

    /// Watch the autopilot play one seed
    Simulate {
        /// Seed to play
        #[arg(long, default_value = "0")]
        seed: u64,

        /// Enemy tick limit
        #[arg(short, long, default_value = "500")]
        ticks: u64,

        /// Print a frame every N enemy ticks
        #[arg(short, long, default_value = "10")]
        every: u64,

        /// Disable colored output
        #[arg(long)]
        no_color: bool,
    },

    /// Run a batch of autopilot games
    Batch {
        /// Number of games to run
        #[arg(short = 'n', long, default_value = "100")]
        count: u32,

        /// Starting random seed
        #[arg(long, default_value = "0")]
        seed: u64,

        /// Enemy tick limit per game
        #[arg(long, default_value = "2000")]
        max_ticks: u64,

        /// Maximum parallel games (0 = auto)
        #[arg(short, long, default_value = "0")]
        parallel: usize,

        /// Results file (JSON)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Verify determinism by replaying seeds several times
    Verify {
        /// First seed to verify
        #[arg(long, default_value = "12345")]
        seed: u64,

        /// Number of consecutive seeds
        #[arg(long, default_value = "1")]
        seeds: u64,

        /// Runs per seed
        #[arg(short, long, default_value = "5")]
        runs: usize,

        /// Enemy tick limit per run
        #[arg(long, default_value = "500")]
        max_ticks: u64,
    },
}

fn main() {
    let cli = Cli::parse();

    // Initialize logging to stderr (stdout is for protocol)
    let default_level = if cli.verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_ansi(true),
        )
        .with(filter)
        .init();

    match cli.command {
        Some(Commands::Play {
            seed,
            auto_state,
            auto_render,
        }) => cmd_play(cli.config, seed, auto_state, auto_render),
        Some(Commands::Simulate {
            seed,
            ticks,
            every,
            no_color,
        }) => cmd_simulate(seed, ticks, every, no_color),
        Some(Commands::Batch {
            count,
            seed,
            max_ticks,
            parallel,
            output,
        }) => cmd_batch(count, seed, max_ticks, parallel, output),
        Some(Commands::Verify {
            seed,
            seeds,
            runs,
            max_ticks,
        }) => cmd_verify(seed, seeds, runs, max_ticks),
        None => cmd_play(cli.config, None, false, false),
    }
}

/// Run an interactive session
fn cmd_play(config_path: Option<PathBuf>, seed: Option<u64>, auto_state: bool, auto_render: bool) {
    let mut config = match SessionConfig::load_or_default(config_path.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Failed to load config: {e}");
            std::process::exit(1);
        }
    };
    if seed.is_some() {
        config.seed = seed;
    }
    config.auto_state |= auto_state;
    config.auto_render |= auto_render;

    tracing::info!("Starting interactive session");

    let runtime = match tokio::runtime::Runtime::new() {
        Ok(rt) => rt,
        Err(e) => {
            eprintln!("Failed to start runtime: {e}");
            std::process::exit(1);
        }
    };

    let result = runtime.block_on(run_session(config));
    // The stdin reader may still be parked on a blocking read.
    runtime.shutdown_background();

    if let Err(e) = result {
        tracing::error!(error = %e, "Session failed");
        std::process::exit(1);
    }
}

/// Print frames while the autopilot plays
fn cmd_simulate(seed: u64, ticks: u64, every: u64, no_color: bool) {
    let render = if no_color {
        AsciiConfig::plain()
    } else {
        AsciiConfig::default()
    };
    let config = BatchConfig::new(1).with_seed(seed).with_max_enemy_ticks(ticks);
    let every = every.max(1);

    let mut game = GameInstance::from_seed(seed);
    let mut autopilot = autopilot_for(seed);

    println!("{}", render_frame(&game.snapshot(), &render));
    let outcome = play_autopilot(&mut game, &mut autopilot, &config, |game, events| {
        if events.game_over || game.stats().enemy_ticks % every == 0 {
            println!("{}", render_frame(&game.snapshot(), &render));
        }
    });

    let stats = game.stats();
    eprintln!("\nOutcome: {outcome:?} after {} ticks", game.tick());
    eprintln!(
        "Kills: {} ({} by sword), potions: {}, damage taken: {}",
        stats.total_kills(),
        stats.charged_kills,
        stats.potions_drunk,
        stats.damage_taken
    );
}

/// Run batch of autopilot games
fn cmd_batch(count: u32, seed: u64, max_ticks: u64, parallel: usize, output: Option<PathBuf>) {
    let config = BatchConfig {
        game_count: count,
        seed_start: seed,
        max_enemy_ticks: max_ticks,
        parallel_games: parallel,
        output: output.clone(),
        ..BatchConfig::default()
    };

    let results = run_batch(config);

    if let Some(path) = &output {
        if let Err(e) = results.save(path) {
            tracing::error!(error = %e, path = %path.display(), "Failed to save results");
            eprintln!("FATAL: Failed to save results: {e}");
            std::process::exit(1);
        }
    }

    let summary = &results.summary;
    eprintln!("\n{}", "=".repeat(50));
    eprintln!("BATCH COMPLETE");
    eprintln!("{}", "=".repeat(50));
    eprintln!("Games played: {}", summary.total_games);
    eprintln!("Duration: {:.1}s", results.duration_seconds);
    eprintln!(
        "Died: {}  Cleared: {}  Timed out: {}",
        summary.deaths, summary.cleared, summary.timed_out
    );
    eprintln!("Survival rate: {:.1}%", summary.survival_rate * 100.0);
    eprintln!("Average kills: {:.2}", summary.avg_kills);
    eprintln!("Average enemy ticks: {:.1}", summary.avg_enemy_ticks);
    eprintln!("Average damage taken: {:.1}", summary.avg_damage_taken);

    if let Some(path) = output {
        eprintln!("\nResults saved to: {}", path.display());
    }
}

/// Verify determinism
fn cmd_verify(seed: u64, seeds: u64, runs: usize, max_ticks: u64) {
    tracing::info!(seed, seeds, runs, "Verifying determinism");

    let config = BatchConfig::new(1).with_max_enemy_ticks(max_ticks);
    let mut failures = 0;

    for seed in seed..seed.saturating_add(seeds.max(1)) {
        let report = verify_seed(seed, runs, &config);
        if report.is_deterministic {
            eprintln!("  seed {seed}: OK ({:#018x})", report.hashes.first().copied().unwrap_or(0));
        } else {
            failures += 1;
            eprintln!("  seed {seed}: DIVERGED {:?}", report.hashes);
        }
    }

    if failures > 0 {
        eprintln!("\n{failures} seed(s) failed determinism check");
        std::process::exit(1);
    }
    eprintln!("\nAll seeds deterministic");
}
