//! Movement and collision resolution.
//!
//! Hero moves are single cardinal steps validated against the live grid.
//! Enemy moves are resolved in one pass against a snapshot taken at the
//! start of the pass: an enemy may only step onto a cell that was floor
//! before anyone moved and that no earlier mover has claimed, so enemies
//! never trade places, stack, or follow each other within one tick.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::entities::EntityStore;
use crate::grid::{Cell, Direction, Grid, Position};
use crate::random::RandomSource;
use crate::rules::{ENEMY_TRIGGER_RADIUS, POTION_HEAL};

/// Item consumed by stepping onto its cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Pickup {
    /// Health potion; `healed` is the amount actually restored.
    HealthPotion {
        /// Hit points restored after capping at max.
        healed: i32,
    },
    /// Weapon pickup; charges are reset to `charges`.
    Weapon {
        /// Charges held after pickup.
        charges: u32,
    },
}

/// Why a hero move was ignored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BlockReason {
    /// There is no living hero.
    NoHero,
    /// Target lies outside the grid.
    OutOfBounds,
    /// Target is a wall.
    Wall,
    /// Target is occupied by an enemy; enemies must be fought.
    Enemy,
}

/// Result of a hero move attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MoveOutcome {
    /// The hero moved.
    Moved {
        /// Previous cell (now floor).
        from: Position,
        /// New cell.
        to: Position,
        /// Item picked up on arrival.
        pickup: Option<Pickup>,
    },
    /// Nothing changed.
    Blocked(BlockReason),
}

impl MoveOutcome {
    /// Whether the hero actually moved.
    #[must_use]
    pub const fn is_moved(&self) -> bool {
        matches!(self, Self::Moved { .. })
    }
}

/// A single enemy step applied during an enemy tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnemyMove {
    /// Cell the enemy left.
    pub from: Position,
    /// Cell the enemy entered.
    pub to: Position,
}

/// Move the hero one cardinal step.
///
/// Walls, enemies and the grid edge block the move without side effects.
/// Potions heal (capped at max hit points) and weapons reset the charge
/// count; either way the item cell is consumed by the move.
pub fn move_hero(grid: &mut Grid, store: &mut EntityStore, direction: Direction) -> MoveOutcome {
    let Some(hero) = store.hero_mut() else {
        return MoveOutcome::Blocked(BlockReason::NoHero);
    };

    let (dx, dy) = direction.delta();
    let target = hero.position.offset(dx, dy);
    let Some(cell) = grid.get(target) else {
        return MoveOutcome::Blocked(BlockReason::OutOfBounds);
    };

    let pickup = match cell {
        Cell::Wall => return MoveOutcome::Blocked(BlockReason::Wall),
        Cell::Enemy => return MoveOutcome::Blocked(BlockReason::Enemy),
        Cell::HealthPotion => Some(Pickup::HealthPotion {
            healed: hero.heal(POTION_HEAL),
        }),
        Cell::WeaponPickup => {
            hero.equip_weapon();
            Some(Pickup::Weapon {
                charges: hero.bonus_attack_turns,
            })
        }
        Cell::Floor | Cell::Hero => None,
    };

    let from = hero.position;
    grid.set(from, Cell::Floor);
    hero.position = target;
    grid.set(target, Cell::Hero);

    if let Some(pickup) = pickup {
        debug!(x = target.x, y = target.y, ?pickup, hp = hero.hp, "Hero picked up item");
    }

    MoveOutcome::Moved {
        from,
        to: target,
        pickup,
    }
}

/// Choose the step an enemy at `enemy` wants to take this tick.
///
/// Within the trigger radius (Chebyshev) the enemy closes in on the hero,
/// picking the horizontal axis on a coin flip when both offsets are
/// non-zero. Outside it the enemy wanders one random cardinal step.
pub fn enemy_step<R: RandomSource + ?Sized>(
    enemy: Position,
    hero: Position,
    rng: &mut R,
) -> (i32, i32) {
    let dx = hero.x - enemy.x;
    let dy = hero.y - enemy.y;

    if dx.abs() <= ENEMY_TRIGGER_RADIUS && dy.abs() <= ENEMY_TRIGGER_RADIUS {
        // The coin is flipped whenever there is horizontal distance to close.
        if dx != 0 && (rng.coin() || dy == 0) {
            (dx.signum(), 0)
        } else if dy != 0 {
            (0, dy.signum())
        } else {
            (0, 0)
        }
    } else {
        Direction::ALL[rng.below(4) as usize].delta()
    }
}

/// Run one movement pass over every enemy.
///
/// Does nothing when there is no hero. Failed steps leave the enemy in
/// place silently.
pub fn move_enemies<R: RandomSource + ?Sized>(
    grid: &mut Grid,
    store: &mut EntityStore,
    rng: &mut R,
) -> Vec<EnemyMove> {
    let Some(hero) = store.hero().map(|h| h.position) else {
        return Vec::new();
    };

    let snapshot = grid.clone();
    let mut moves = Vec::new();

    for from in snapshot.positions_of(Cell::Enemy) {
        let (dx, dy) = enemy_step(from, hero, rng);
        let to = from.offset(dx, dy);
        if to == from {
            continue;
        }

        if snapshot.is(to, Cell::Floor) && grid.is(to, Cell::Floor) {
            grid.set(to, Cell::Enemy);
            grid.set(from, Cell::Floor);
            store.enemies_mut().relocate(from, to);
            moves.push(EnemyMove { from, to });
        }
    }

    moves
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::{check_invariants, Hero};
    use crate::random::ScriptedRandom;
    use crate::rules::ENEMY_MAX_HP;

    fn setup(rows: &[&str]) -> (Grid, EntityStore) {
        let grid = Grid::from_rows(rows).unwrap();
        let mut store = EntityStore::new();
        if let Some(&pos) = grid.positions_of(Cell::Hero).first() {
            store.set_hero(Some(Hero::new(pos)));
        }
        for pos in grid.positions_of(Cell::Enemy) {
            store.enemies_mut().insert(pos, ENEMY_MAX_HP);
        }
        (grid, store)
    }

    #[test]
    fn test_hero_plain_move() {
        let (mut grid, mut store) = setup(&["#####", "#.@.#", "#####"]);
        let outcome = move_hero(&mut grid, &mut store, Direction::East);

        assert_eq!(
            outcome,
            MoveOutcome::Moved {
                from: Position::new(2, 1),
                to: Position::new(3, 1),
                pickup: None
            }
        );
        assert_eq!(grid.to_rows(), vec!["#####", "#..@#", "#####"]);
        assert_eq!(store.hero().unwrap().position, Position::new(3, 1));
    }

    #[test]
    fn test_hero_blocked_by_wall_and_enemy() {
        let (mut grid, mut store) = setup(&["#####", "#E@.#", "#####"]);
        let before = grid.clone();

        assert_eq!(
            move_hero(&mut grid, &mut store, Direction::North),
            MoveOutcome::Blocked(BlockReason::Wall)
        );
        assert_eq!(
            move_hero(&mut grid, &mut store, Direction::West),
            MoveOutcome::Blocked(BlockReason::Enemy)
        );
        assert_eq!(grid, before);
        assert_eq!(store.hero().unwrap().position, Position::new(2, 1));
        assert_eq!(store.enemies().hp_at(Position::new(1, 1)), Some(ENEMY_MAX_HP));
    }

    #[test]
    fn test_hero_blocked_by_edge() {
        let (mut grid, mut store) = setup(&["@.", ".."]);
        assert_eq!(
            move_hero(&mut grid, &mut store, Direction::West),
            MoveOutcome::Blocked(BlockReason::OutOfBounds)
        );
        assert_eq!(
            move_hero(&mut grid, &mut store, Direction::North),
            MoveOutcome::Blocked(BlockReason::OutOfBounds)
        );
        assert_eq!(grid.to_rows(), vec!["@.", ".."]);
    }

    #[test]
    fn test_move_without_hero() {
        let (mut grid, mut store) = setup(&["..", ".."]);
        assert_eq!(
            move_hero(&mut grid, &mut store, Direction::East),
            MoveOutcome::Blocked(BlockReason::NoHero)
        );
    }

    #[test]
    fn test_potion_heals_capped_and_is_consumed() {
        let (mut grid, mut store) = setup(&["@!!"]);
        store.hero_mut().unwrap().hp = 90;

        let outcome = move_hero(&mut grid, &mut store, Direction::East);
        assert!(matches!(
            outcome,
            MoveOutcome::Moved {
                pickup: Some(Pickup::HealthPotion { healed: 10 }),
                ..
            }
        ));
        assert_eq!(store.hero().unwrap().hp, 100);
        assert_eq!(grid.to_rows(), vec![".@!"]);

        store.hero_mut().unwrap().hp = 40;
        move_hero(&mut grid, &mut store, Direction::East);
        assert_eq!(store.hero().unwrap().hp, 60);
        assert_eq!(grid.to_rows(), vec!["..@"]);
    }

    #[test]
    fn test_weapon_pickup_overwrites_charges() {
        let (mut grid, mut store) = setup(&["@/"]);
        store.hero_mut().unwrap().bonus_attack_turns = 3;

        let outcome = move_hero(&mut grid, &mut store, Direction::East);
        assert!(matches!(
            outcome,
            MoveOutcome::Moved {
                pickup: Some(Pickup::Weapon { charges: 5 }),
                ..
            }
        ));
        assert_eq!(store.hero().unwrap().bonus_attack_turns, 5);
        assert_eq!(grid.count(Cell::WeaponPickup), 0);
    }

    #[test]
    fn test_enemy_step_chases_on_coin() {
        let enemy = Position::new(5, 5);
        let hero = Position::new(8, 7);

        // Even draw: horizontal.
        let mut rng = ScriptedRandom::new([0]);
        assert_eq!(enemy_step(enemy, hero, &mut rng), (1, 0));
        // Odd draw: vertical.
        let mut rng = ScriptedRandom::new([1]);
        assert_eq!(enemy_step(enemy, hero, &mut rng), (0, 1));
    }

    #[test]
    fn test_enemy_step_single_axis() {
        let enemy = Position::new(5, 5);

        // Same column: always vertical, no coin flip.
        let mut rng = ScriptedRandom::new([0]);
        assert_eq!(enemy_step(enemy, Position::new(5, 2), &mut rng), (0, -1));
        assert_eq!(rng.taken(), 0);

        // Same row: horizontal even when the coin says vertical.
        let mut rng = ScriptedRandom::new([1]);
        assert_eq!(enemy_step(enemy, Position::new(1, 5), &mut rng), (-1, 0));
        assert_eq!(rng.taken(), 1);
    }

    #[test]
    fn test_enemy_step_trigger_radius_is_chebyshev() {
        let enemy = Position::new(10, 10);
        // (5, 5) offset is still inside the trigger box.
        let mut rng = ScriptedRandom::new([1]);
        assert_eq!(enemy_step(enemy, Position::new(15, 15), &mut rng), (0, 1));

        // Six columns away: wander. Draws 0..4 map to E, W, S, N.
        for (draw, expected) in [(0, (1, 0)), (1, (-1, 0)), (2, (0, 1)), (3, (0, -1))] {
            let mut rng = ScriptedRandom::new([draw]);
            assert_eq!(enemy_step(enemy, Position::new(16, 10), &mut rng), expected);
        }
    }

    #[test]
    fn test_enemies_cannot_enter_vacated_cells() {
        // Hero far away so both enemies wander; both draw West.
        let (mut grid, mut store) = setup(&["#.EE.......@#"]);
        let mut rng = ScriptedRandom::new([1, 1]);

        let moves = move_enemies(&mut grid, &mut store, &mut rng);

        assert_eq!(
            moves,
            vec![EnemyMove {
                from: Position::new(2, 0),
                to: Position::new(1, 0)
            }]
        );
        assert_eq!(grid.to_rows(), vec!["#E.E.......@#"]);
        assert_eq!(check_invariants(&grid, &store), Ok(()));
    }

    #[test]
    fn test_enemies_never_share_a_cell() {
        // Both enemies target the middle cell: first East, second West.
        let (mut grid, mut store) = setup(&["#E.E........@"]);
        store.enemies_mut().insert(Position::new(1, 0), 7);
        let mut rng = ScriptedRandom::new([0, 1]);

        let moves = move_enemies(&mut grid, &mut store, &mut rng);

        assert_eq!(moves.len(), 1);
        assert_eq!(grid.to_rows(), vec!["#.EE........@"]);
        assert_eq!(store.enemies().len(), 2);
        assert_eq!(store.enemies().hp_at(Position::new(2, 0)), Some(7));
        assert_eq!(check_invariants(&grid, &store), Ok(()));
    }

    #[test]
    fn test_enemy_blocked_by_hero_and_items() {
        let (mut grid, mut store) = setup(&["!E@"]);
        // Enemy next to hero chases East into the hero cell: blocked.
        let mut rng = ScriptedRandom::new([0]);
        assert!(move_enemies(&mut grid, &mut store, &mut rng).is_empty());
        assert_eq!(grid.to_rows(), vec!["!E@"]);
    }

    #[test]
    fn test_enemy_chase_moves_hp_entry() {
        let (mut grid, mut store) = setup(&["E...@"]);
        store.enemies_mut().insert(Position::new(0, 0), 12);
        let mut rng = ScriptedRandom::constant(0);

        move_enemies(&mut grid, &mut store, &mut rng);
        move_enemies(&mut grid, &mut store, &mut rng);

        assert_eq!(grid.to_rows(), vec!["..E.@"]);
        assert_eq!(store.enemies().hp_at(Position::new(2, 0)), Some(12));
        assert_eq!(check_invariants(&grid, &store), Ok(()));
    }

    #[test]
    fn test_enemies_idle_without_hero() {
        let (mut grid, mut store) = setup(&["E.."]);
        let mut rng = ScriptedRandom::constant(0);
        assert!(move_enemies(&mut grid, &mut store, &mut rng).is_empty());
        assert_eq!(rng.taken(), 0);
    }
}
