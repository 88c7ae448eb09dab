//! Batch autopilot runner.
//!
//! Plays many seeded games in parallel using rayon and summarizes how the
//! autopilot fared. The same machinery backs determinism verification:
//! replaying one seed several times must end on the same state hash.

use std::path::{Path, PathBuf};
use std::time::Instant;

use crawl_core::prelude::*;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::autopilot::Autopilot;

/// Mixed into the game seed to seed the autopilot's own wandering.
const AUTOPILOT_SALT: u64 = 0x9E37_79B9_7F4A_7C15;

/// Configuration for a batch run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchConfig {
    /// Number of games to run
    pub game_count: u32,
    /// Seed of the first game; game `i` uses `seed_start + i`
    pub seed_start: u64,
    /// Enemy ticks after which a game is abandoned
    pub max_enemy_ticks: u64,
    /// Hero actions between enemy ticks
    pub actions_per_enemy_tick: u32,
    /// Maximum parallel games (0 = use rayon default)
    pub parallel_games: usize,
    /// Where to write results, if anywhere
    pub output: Option<PathBuf>,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            game_count: 100,
            seed_start: 0,
            max_enemy_ticks: 2000,
            actions_per_enemy_tick: 2,
            parallel_games: 0,
            output: None,
        }
    }
}

impl BatchConfig {
    /// Config for `game_count` games with default limits
    pub fn new(game_count: u32) -> Self {
        Self {
            game_count,
            ..Default::default()
        }
    }

    /// Set seed start
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed_start = seed;
        self
    }

    /// Set the enemy tick limit
    pub fn with_max_enemy_ticks(mut self, ticks: u64) -> Self {
        self.max_enemy_ticks = ticks;
        self
    }
}

/// How an autopilot game ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GameOutcome {
    /// The hero died.
    Died,
    /// Every enemy was killed.
    Cleared,
    /// The enemy tick limit was reached.
    TimedOut,
    /// No hero could be placed.
    Inert,
}

/// Result of one autopilot game.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameSummary {
    /// Game seed
    pub seed: u64,
    /// How it ended
    pub outcome: GameOutcome,
    /// Final tick counter
    pub ticks: u64,
    /// Statistics at the end
    pub stats: GameStats,
    /// Hero hit points at the end (0 after death)
    pub final_hp: i32,
    /// Enemies left on the map
    pub enemies_remaining: usize,
    /// Final state hash
    pub final_hash: u64,
}

/// Aggregate over a batch.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BatchSummary {
    /// Games played
    pub total_games: usize,
    /// Games where the hero died
    pub deaths: usize,
    /// Games where every enemy died
    pub cleared: usize,
    /// Games abandoned at the tick limit
    pub timed_out: usize,
    /// Fraction of games the hero survived
    pub survival_rate: f64,
    /// Mean kills per game
    pub avg_kills: f64,
    /// Mean enemy ticks per game
    pub avg_enemy_ticks: f64,
    /// Mean damage taken per game
    pub avg_damage_taken: f64,
}

impl BatchSummary {
    /// Summarize finished games.
    #[allow(clippy::cast_precision_loss)]
    pub fn from_games(games: &[GameSummary]) -> Self {
        if games.is_empty() {
            return Self::default();
        }

        let count = |outcome| games.iter().filter(|g| g.outcome == outcome).count();
        let total = games.len() as f64;
        let deaths = count(GameOutcome::Died);

        Self {
            total_games: games.len(),
            deaths,
            cleared: count(GameOutcome::Cleared),
            timed_out: count(GameOutcome::TimedOut),
            survival_rate: (games.len() - deaths) as f64 / total,
            avg_kills: games.iter().map(|g| f64::from(g.stats.total_kills())).sum::<f64>() / total,
            avg_enemy_ticks: games.iter().map(|g| g.stats.enemy_ticks as f64).sum::<f64>() / total,
            avg_damage_taken: games.iter().map(|g| g.stats.damage_taken as f64).sum::<f64>()
                / total,
        }
    }
}

/// Results from a batch run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchResults {
    /// Configuration used
    pub config: BatchConfig,
    /// Individual games
    pub games: Vec<GameSummary>,
    /// Aggregate summary
    pub summary: BatchSummary,
    /// Total runtime
    pub duration_seconds: f64,
}

impl BatchResults {
    /// Save results to JSON file
    pub fn save(&self, path: &Path) -> std::io::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(self).map_err(std::io::Error::other)?;
        std::fs::write(path, json)
    }

    /// Load results from JSON file
    pub fn load(path: &Path) -> std::io::Result<Self> {
        let json = std::fs::read_to_string(path)?;
        serde_json::from_str(&json).map_err(std::io::Error::other)
    }
}

/// Outcome of replaying one seed several times.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerifyReport {
    /// Seed replayed
    pub seed: u64,
    /// Final hash of each run
    pub hashes: Vec<u64>,
    /// Whether every run agreed
    pub is_deterministic: bool,
}

/// Drive `game` with `autopilot` until it ends or hits the tick limit.
///
/// `on_enemy_tick` sees the game after every enemy tick.
pub fn play_autopilot<F>(
    game: &mut GameInstance,
    autopilot: &mut Autopilot,
    config: &BatchConfig,
    mut on_enemy_tick: F,
) -> GameOutcome
where
    F: FnMut(&GameInstance, &TickEvents),
{
    if game.status() == GameStatus::Inert {
        return GameOutcome::Inert;
    }

    while game.is_playing()
        && !game.entities().enemies().is_empty()
        && game.stats().enemy_ticks < config.max_enemy_ticks
    {
        for _ in 0..config.actions_per_enemy_tick {
            let Some(action) = autopilot.choose(game) else {
                break;
            };
            game.apply(action);
        }
        let events = game.enemy_tick();
        on_enemy_tick(game, &events);
    }

    if !game.is_playing() {
        GameOutcome::Died
    } else if game.entities().enemies().is_empty() {
        GameOutcome::Cleared
    } else {
        GameOutcome::TimedOut
    }
}

/// Autopilot paired with the game of `seed`.
pub fn autopilot_for(seed: u64) -> Autopilot {
    Autopilot::new(seed ^ AUTOPILOT_SALT)
}

/// Play one seeded autopilot game to the end.
pub fn run_game(seed: u64, config: &BatchConfig) -> GameSummary {
    let mut game = GameInstance::from_seed(seed);
    let mut autopilot = autopilot_for(seed);
    let outcome = play_autopilot(&mut game, &mut autopilot, config, |_, _| {});

    debug!(seed, ?outcome, ticks = game.tick(), "Autopilot game finished");

    GameSummary {
        seed,
        outcome,
        ticks: game.tick(),
        stats: *game.stats(),
        final_hp: game.hero().map_or(0, |h| h.hp),
        enemies_remaining: game.entities().enemies().len(),
        final_hash: game.state_hash(),
    }
}

/// Run a batch of games in parallel
pub fn run_batch(config: BatchConfig) -> BatchResults {
    let start = Instant::now();

    info!(
        games = config.game_count,
        seed_start = config.seed_start,
        "Starting batch"
    );

    // Configure thread pool if specified
    if config.parallel_games > 0 {
        rayon::ThreadPoolBuilder::new()
            .num_threads(config.parallel_games)
            .build_global()
            .ok(); // Ignore if already set
    }

    let games: Vec<GameSummary> = (0..config.game_count)
        .into_par_iter()
        .map(|i| run_game(config.seed_start.wrapping_add(u64::from(i)), &config))
        .collect();

    let summary = BatchSummary::from_games(&games);
    let duration_seconds = start.elapsed().as_secs_f64();

    info!(
        games = games.len(),
        deaths = summary.deaths,
        cleared = summary.cleared,
        "Batch complete in {duration_seconds:.1}s"
    );

    BatchResults {
        config,
        games,
        summary,
        duration_seconds,
    }
}

/// Replay `seed` `runs` times in parallel and compare final hashes.
pub fn verify_seed(seed: u64, runs: usize, config: &BatchConfig) -> VerifyReport {
    let hashes: Vec<u64> = (0..runs)
        .into_par_iter()
        .map(|_| run_game(seed, config).final_hash)
        .collect();

    VerifyReport {
        seed,
        is_deterministic: hashes.windows(2).all(|w| w[0] == w[1]),
        hashes,
    }
}
