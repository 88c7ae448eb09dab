//! Test fixtures and helpers.
//!
//! Small hand-drawn layouts using the grid glyphs:
//! `#` wall, `.` floor, `@` hero, `E` enemy, `!` potion, `/` weapon.

use crawl_core::prelude::*;

/// Hero boxed in by eight enemies inside walls. No enemy can move.
pub const SURROUNDED: &[&str] = &["#####", "#EEE#", "#E@E#", "#EEE#", "#####"];

/// Hero with one enemy to the east, walled so nobody can move.
pub const DUEL: &[&str] = &["#####", "#.@E#", "#####"];

/// Open corridor with a potion and a weapon ahead of the hero.
pub const PICKUP_CORRIDOR: &[&str] = &["##########", "#@.!./...#", "##########"];

/// Hero far from a single enemy, out of trigger range.
pub const DISTANT_ENEMY: &[&str] = &[
    "...............",
    ".@.............",
    "...............",
    "............E..",
];

/// Build a game from a layout.
///
/// Enemy AI draws come from `draws`, then 0 forever.
///
/// # Errors
///
/// Returns the layout parse error or [`GameError::InvalidLayout`] for
/// more than one hero.
pub fn try_game_from_layout(rows: &[&str], draws: &[u32]) -> Result<GameInstance> {
    let grid = Grid::from_rows(rows)?;
    GameInstance::from_grid(grid, ScriptedRandom::new(draws.iter().copied()))
}

/// Build a game from a layout with every random draw returning 0.
///
/// # Panics
///
/// Panics if the layout is invalid.
#[must_use]
pub fn game_from_layout(rows: &[&str]) -> GameInstance {
    game_with_draws(rows, &[])
}

/// Build a game from a layout with scripted draws.
///
/// # Panics
///
/// Panics if the layout is invalid.
#[must_use]
pub fn game_with_draws(rows: &[&str], draws: &[u32]) -> GameInstance {
    match try_game_from_layout(rows, draws) {
        Ok(game) => game,
        Err(err) => panic!("invalid fixture layout: {err}"),
    }
}

/// Generated game for a seed.
#[must_use]
pub fn seeded_game(seed: u64) -> GameInstance {
    GameInstance::from_seed(seed)
}

/// Current hero position, if alive.
#[must_use]
pub fn hero_position(game: &GameInstance) -> Option<Position> {
    game.hero().map(|h| h.position)
}

/// Apply each action followed by one enemy tick.
pub fn play_script(game: &mut GameInstance, actions: &[Action]) -> Vec<TickEvents> {
    let mut events = Vec::with_capacity(actions.len() * 2);
    for &action in actions {
        events.push(game.apply(action));
        events.push(game.enemy_tick());
    }
    events
}
