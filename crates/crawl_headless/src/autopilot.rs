//! Scripted hero for unattended runs.
//!
//! Greedy and short-sighted on purpose: it only reacts to what the light
//! radius shows.
//! 1. Attack when any enemy is adjacent
//! 2. Otherwise walk toward the most urgent lit target
//! 3. Otherwise wander to a random open neighbour

use crawl_core::prelude::*;
use tracing::trace;

/// Hit points at or below which potions outrank everything else.
pub const LOW_HP: i32 = 50;

/// Decides the next hero action from the visible state.
#[derive(Debug, Clone)]
pub struct Autopilot {
    rng: SeededRandom,
}

impl Autopilot {
    /// Autopilot wandering with its own seeded source.
    pub fn new(seed: u64) -> Self {
        Self {
            rng: SeededRandom::new(seed),
        }
    }

    /// Next action, or `None` once the hero is gone.
    pub fn choose(&mut self, game: &GameInstance) -> Option<Action> {
        let hero = game.hero()?;
        let grid = game.grid();

        if grid.neighbors(hero.position).any(|p| grid.is(p, Cell::Enemy)) {
            return Some(Action::Attack);
        }

        let target = game
            .visibility()
            .iter_visible()
            .filter_map(|pos| {
                let priority = target_priority(grid.get(pos)?, hero)?;
                Some((priority, hero.position.distance_squared(pos), pos))
            })
            .min();

        if let Some((_, _, target)) = target {
            if let Some(direction) = step_toward(grid, hero.position, target) {
                trace!(x = target.x, y = target.y, ?direction, "Autopilot heading to target");
                return Some(Action::Move(direction));
            }
        }

        Some(self.wander(grid, hero.position))
    }

    fn wander(&mut self, grid: &Grid, from: Position) -> Action {
        let open: Vec<Direction> = Direction::ALL
            .into_iter()
            .filter(|d| {
                let (dx, dy) = d.delta();
                grid.get(from.offset(dx, dy)).is_some_and(is_walkable)
            })
            .collect();

        if open.is_empty() {
            return Action::Attack;
        }
        let len = u32::try_from(open.len()).unwrap_or(u32::MAX);
        Action::Move(open[self.rng.below(len) as usize])
    }
}

fn is_walkable(cell: Cell) -> bool {
    matches!(cell, Cell::Floor | Cell::HealthPotion | Cell::WeaponPickup)
}

/// Lower is more urgent; `None` means not a target.
fn target_priority(cell: Cell, hero: &Hero) -> Option<u8> {
    match cell {
        Cell::HealthPotion if hero.hp <= LOW_HP => Some(0),
        Cell::WeaponPickup => Some(1),
        Cell::Enemy => Some(2),
        Cell::HealthPotion if hero.hp < hero.max_hp => Some(3),
        _ => None,
    }
}

/// First cardinal step that closes the distance to `target`, larger axis first.
fn step_toward(grid: &Grid, from: Position, target: Position) -> Option<Direction> {
    let dx = target.x - from.x;
    let dy = target.y - from.y;
    let horizontal = (dx.signum(), 0);
    let vertical = (0, dy.signum());
    let order = if dx.abs() >= dy.abs() {
        [horizontal, vertical]
    } else {
        [vertical, horizontal]
    };

    order
        .into_iter()
        .filter(|&step| step != (0, 0))
        .filter(|&(sx, sy)| grid.get(from.offset(sx, sy)).is_some_and(is_walkable))
        .find_map(|(sx, sy)| Direction::from_delta(sx, sy).ok())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crawl_test_utils::fixtures::{game_from_layout, DUEL};

    #[test]
    fn test_attacks_adjacent_enemy() {
        let game = game_from_layout(DUEL);
        assert_eq!(Autopilot::new(1).choose(&game), Some(Action::Attack));

        let game = game_from_layout(&["E..", ".@.", "..."]);
        assert_eq!(Autopilot::new(1).choose(&game), Some(Action::Attack));
    }

    #[test]
    fn test_prefers_weapon_over_enemy() {
        let game = game_from_layout(&["...E...", ".......", "...@./."]);
        assert_eq!(
            Autopilot::new(1).choose(&game),
            Some(Action::Move(Direction::East))
        );
    }

    #[test]
    fn test_low_hp_seeks_potion() {
        let mut game = game_from_layout(&[".......", ".......", "!.@./.."]);
        game.set_hero_hp(40);
        assert_eq!(
            Autopilot::new(1).choose(&game),
            Some(Action::Move(Direction::West))
        );
    }

    #[test]
    fn test_blocked_path_falls_back_to_wandering() {
        // Target is level with the hero behind a wall; south is the only way out.
        let game = game_from_layout(&["#####", "#@#E#", "#...#", "#####"]);
        assert_eq!(
            Autopilot::new(1).choose(&game),
            Some(Action::Move(Direction::South))
        );
    }

    #[test]
    fn test_wanders_when_nothing_lit() {
        let game = game_from_layout(&["###", "#@.", "###"]);
        assert_eq!(
            Autopilot::new(9).choose(&game),
            Some(Action::Move(Direction::East))
        );
    }

    #[test]
    fn test_no_action_without_hero() {
        let game = game_from_layout(&["E.."]);
        assert_eq!(Autopilot::new(1).choose(&game), None);
    }
}
