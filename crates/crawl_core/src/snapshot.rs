//! Read-only view of a game for presentation layers.
//!
//! Enemy hit points are only exposed for lit cells; the grid still tags
//! every enemy, so renderers decide themselves whether to draw unlit ones.

use serde::{Deserialize, Serialize};

use crate::grid::Grid;
use crate::rules::ENEMY_MAX_HP;
use crate::simulation::{GameInstance, GameStats, GameStatus};
use crate::visibility::{RenderWindow, VisibilityMask};

/// Hero fields a presentation layer may show.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HeroSnapshot {
    /// Column.
    pub x: i32,
    /// Row.
    pub y: i32,
    /// Current hit points.
    pub hp: i32,
    /// Maximum hit points.
    pub max_hp: i32,
    /// Remaining weapon charges.
    pub bonus_attack_turns: u32,
}

/// A lit enemy with its health.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnemySnapshot {
    /// Column.
    pub x: i32,
    /// Row.
    pub y: i32,
    /// Current hit points.
    pub hp: i32,
    /// Maximum hit points.
    pub max_hp: i32,
}

/// Everything a renderer reads after a state change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snapshot {
    /// Tick counter.
    pub tick: u64,
    /// Lifecycle state.
    pub status: GameStatus,
    /// The hero, while alive.
    pub hero: Option<HeroSnapshot>,
    /// Enemies on lit cells, in row-major order.
    pub enemies: Vec<EnemySnapshot>,
    /// Enemies anywhere on the map.
    pub enemies_remaining: usize,
    /// Full grid.
    pub grid: Grid,
    /// Light-radius mask.
    pub visibility: VisibilityMask,
    /// Cells to draw; `None` without a hero.
    pub window: Option<RenderWindow>,
    /// Running totals.
    pub stats: GameStats,
}

impl Snapshot {
    /// Capture the current state of `game`.
    #[must_use]
    pub fn capture(game: &GameInstance) -> Self {
        let grid = game.grid();
        let visibility = game.visibility();

        let hero = game.hero().map(|h| HeroSnapshot {
            x: h.position.x,
            y: h.position.y,
            hp: h.hp,
            max_hp: h.max_hp,
            bonus_attack_turns: h.bonus_attack_turns,
        });

        let enemies = game
            .entities()
            .enemies()
            .iter()
            .filter(|(pos, _)| visibility.is_visible(*pos))
            .map(|(pos, hp)| EnemySnapshot {
                x: pos.x,
                y: pos.y,
                hp,
                max_hp: ENEMY_MAX_HP,
            })
            .collect();

        Self {
            tick: game.tick(),
            status: game.status(),
            hero,
            enemies,
            enemies_remaining: game.entities().enemies().len(),
            grid: grid.clone(),
            visibility: visibility.clone(),
            window: game
                .hero()
                .map(|h| RenderWindow::around(grid, h.position)),
            stats: *game.stats(),
        }
    }
}

impl GameInstance {
    /// Capture a [`Snapshot`] of the current state.
    #[must_use]
    pub fn snapshot(&self) -> Snapshot {
        Snapshot::capture(self)
    }
}
