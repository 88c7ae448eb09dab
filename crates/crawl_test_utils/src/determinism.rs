//! Determinism testing utilities.
//!
//! Verifies that a seeded game fed the same actions always ends in the
//! same state.
//!
//! # Sources of Non-determinism
//!
//! - **Unseeded randomness**: every draw in the core goes through the
//!   game's own `RandomSource`; nothing touches `thread_rng`.
//! - **Map iteration order**: enemies live in a `BTreeMap` keyed by
//!   position, and every grid scan is row-major.
//! - **Wall clock**: the core never reads time; enemy ticks are driven
//!   explicitly.
//!
//! # Test Levels
//!
//! 1. **Unit tests**: scripted draws against hand-drawn layouts
//! 2. **Property tests**: random seeds and action sequences
//! 3. **Parallel tests**: the same game replayed on several threads

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::thread;

use crawl_core::simulation::{Action, GameInstance};
use tracing::debug;

use crate::fixtures::play_script;

/// Result of a determinism test.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeterminismResult {
    /// Whether all runs produced identical results.
    pub is_deterministic: bool,
    /// Final hash of each run.
    pub hashes: Vec<u64>,
    /// Steps applied per run.
    pub steps: u64,
}

impl DeterminismResult {
    /// Distinct final hashes (1 for a deterministic game).
    #[must_use]
    pub fn unique_hashes(&self) -> Vec<u64> {
        let mut unique = self.hashes.clone();
        unique.sort_unstable();
        unique.dedup();
        unique
    }

    /// Assert that every run agreed.
    ///
    /// # Panics
    ///
    /// Panics with the collected hashes if the runs diverged.
    pub fn assert_deterministic(&self) {
        assert!(
            self.is_deterministic,
            "Game is non-deterministic!\n\
             Runs: {}\n\
             Steps: {}\n\
             Unique hashes: {} (expected 1)\n\
             All hashes: {:?}",
            self.hashes.len(),
            self.steps,
            self.unique_hashes().len(),
            self.hashes
        );
    }
}

/// Run any stateful process several times and compare final hashes.
///
/// # Arguments
///
/// * `runs` - Number of independent runs
/// * `steps` - Steps applied per run
/// * `setup` - Builds the initial state
/// * `step` - Advances the state by one step
/// * `hash` - Hashes the final state
pub fn verify_determinism<S, Setup, Step, HashFn>(
    runs: usize,
    steps: u64,
    setup: Setup,
    step: Step,
    hash: HashFn,
) -> DeterminismResult
where
    Setup: Fn() -> S,
    Step: Fn(&mut S),
    HashFn: Fn(&S) -> u64,
{
    let hashes: Vec<u64> = (0..runs)
        .map(|_| {
            let mut state = setup();
            for _ in 0..steps {
                step(&mut state);
            }
            hash(&state)
        })
        .collect();

    DeterminismResult {
        is_deterministic: hashes.windows(2).all(|w| w[0] == w[1]),
        hashes,
        steps,
    }
}

/// Replay `actions` (each followed by an enemy tick) on fresh games from
/// `seed`, `runs` times.
#[must_use]
pub fn verify_game_determinism(seed: u64, actions: &[Action], runs: usize) -> DeterminismResult {
    let mut hashes = Vec::with_capacity(runs);
    for _ in 0..runs {
        let mut game = GameInstance::from_seed(seed);
        play_script(&mut game, actions);
        hashes.push(game.state_hash());
    }

    DeterminismResult {
        is_deterministic: hashes.windows(2).all(|w| w[0] == w[1]),
        hashes,
        steps: actions.len() as u64,
    }
}

/// Replay the same seeded script on `threads` scoped threads.
///
/// # Panics
///
/// Panics if a worker thread panics.
#[must_use]
pub fn run_parallel_games_scoped(seed: u64, actions: &[Action], threads: usize) -> DeterminismResult {
    let hashes: Vec<u64> = thread::scope(|s| {
        let handles: Vec<_> = (0..threads)
            .map(|_| {
                s.spawn(|| {
                    let mut game = GameInstance::from_seed(seed);
                    play_script(&mut game, actions);
                    game.state_hash()
                })
            })
            .collect();

        handles
            .into_iter()
            .map(|h| match h.join() {
                Ok(hash) => hash,
                Err(_) => panic!("game thread panicked"),
            })
            .collect()
    });

    DeterminismResult {
        is_deterministic: hashes.windows(2).all(|w| w[0] == w[1]),
        hashes,
        steps: actions.len() as u64,
    }
}

/// Replay two games side by side and report the first action index after
/// which their hashes differ.
///
/// Returns `Some(0)` if the initial states already differ.
#[must_use]
pub fn find_first_divergence(seed: u64, actions: &[Action]) -> Option<usize> {
    let mut left = GameInstance::from_seed(seed);
    let mut right = GameInstance::from_seed(seed);

    if left.state_hash() != right.state_hash() {
        return Some(0);
    }

    for (index, action) in actions.iter().enumerate() {
        play_script(&mut left, std::slice::from_ref(action));
        play_script(&mut right, std::slice::from_ref(action));
        if left.state_hash() != right.state_hash() {
            debug!(seed, step = index + 1, "Games diverged");
            return Some(index + 1);
        }
    }

    None
}

/// Hash any hashable value.
pub fn compute_hash<T: Hash>(value: &T) -> u64 {
    let mut hasher = DefaultHasher::new();
    value.hash(&mut hasher);
    hasher.finish()
}

/// Proptest strategies for game inputs.
pub mod strategies {
    use crawl_core::grid::Direction;
    use crawl_core::simulation::Action;
    use proptest::prelude::*;

    /// Any cardinal direction.
    pub fn arb_direction() -> impl Strategy<Value = Direction> {
        prop_oneof![
            Just(Direction::North),
            Just(Direction::South),
            Just(Direction::West),
            Just(Direction::East),
        ]
    }

    /// A move or an attack, moves weighted 4:1.
    pub fn arb_action() -> impl Strategy<Value = Action> {
        prop_oneof![
            4 => arb_direction().prop_map(Action::Move),
            1 => Just(Action::Attack),
        ]
    }

    /// Up to `max_len` actions.
    pub fn arb_action_sequence(max_len: usize) -> impl Strategy<Value = Vec<Action>> {
        prop::collection::vec(arb_action(), 0..=max_len)
    }

    /// Any game seed.
    pub fn arb_seed() -> impl Strategy<Value = u64> {
        any::<u64>()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crawl_core::grid::Direction;

    fn script() -> Vec<Action> {
        let mut actions = Vec::new();
        for direction in [Direction::East, Direction::South, Direction::West, Direction::North] {
            actions.extend([Action::Move(direction), Action::Move(direction), Action::Attack]);
        }
        actions
    }

    #[test]
    fn test_seeded_games_are_deterministic() {
        verify_game_determinism(99, &script(), 3).assert_deterministic();
    }

    #[test]
    fn test_parallel_games_agree() {
        let result = run_parallel_games_scoped(5, &script(), 4);
        result.assert_deterministic();
        assert_eq!(result.hashes.len(), 4);
    }

    #[test]
    fn test_no_divergence() {
        assert_eq!(find_first_divergence(11, &script()), None);
    }

    #[test]
    fn test_generic_harness() {
        let result = verify_determinism(
            3,
            50,
            || GameInstance::from_seed(8),
            |game| {
                game.enemy_tick();
            },
            GameInstance::state_hash,
        );
        result.assert_deterministic();
        assert_eq!(result.unique_hashes().len(), 1);
    }

    #[test]
    fn test_compute_hash_stable() {
        assert_eq!(compute_hash(&(1, 2)), compute_hash(&(1, 2)));
        assert_ne!(compute_hash(&(1, 2)), compute_hash(&(2, 1)));
    }
}
