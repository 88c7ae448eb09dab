//! Hero and enemy state.
//!
//! The store never touches the grid. Every caller that inserts, removes or
//! relocates an enemy writes the matching grid cell in the same step, so
//! the grid's `Enemy` tags and the store's keys stay in 1:1 correspondence.
//! [`check_invariants`] verifies that contract.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::{GameError, Result};
use crate::grid::{Cell, Grid, Position};
use crate::rules::{HERO_ATTACK, HERO_MAX_HP, WEAPON_CHARGES};

/// The player-controlled hero.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Hero {
    /// Current cell.
    pub position: Position,
    /// Current hit points. Clamped to 0 on death.
    pub hp: i32,
    /// Maximum hit points.
    pub max_hp: i32,
    /// Damage of a normal strike.
    pub attack: i32,
    /// Remaining one-hit-kill charges.
    pub bonus_attack_turns: u32,
}

impl Hero {
    /// A fresh hero at full health with no charges.
    #[must_use]
    pub const fn new(position: Position) -> Self {
        Self {
            position,
            hp: HERO_MAX_HP,
            max_hp: HERO_MAX_HP,
            attack: HERO_ATTACK,
            bonus_attack_turns: 0,
        }
    }

    /// Restore up to `amount` hit points, capped at `max_hp`.
    ///
    /// Returns the hit points actually restored.
    pub fn heal(&mut self, amount: i32) -> i32 {
        let before = self.hp;
        self.hp = (self.hp + amount).min(self.max_hp);
        self.hp - before
    }

    /// Subtract `amount` hit points. May go below zero until the death check clamps it.
    pub fn take_damage(&mut self, amount: i32) {
        self.hp -= amount;
    }

    /// Whether the hero has run out of hit points.
    #[must_use]
    pub const fn is_dead(&self) -> bool {
        self.hp <= 0
    }

    /// Set the one-hit-kill charges to the weapon's full count.
    ///
    /// Charges are replaced, not accumulated.
    pub fn equip_weapon(&mut self) {
        self.bonus_attack_turns = WEAPON_CHARGES;
    }

    /// Spend one charge if any remain.
    pub fn consume_charge(&mut self) -> bool {
        if self.bonus_attack_turns > 0 {
            self.bonus_attack_turns -= 1;
            true
        } else {
            false
        }
    }
}

/// Enemy hit points keyed by grid position.
///
/// Keys iterate in row-major order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EnemyStore {
    hp: BTreeMap<Position, i32>,
}

impl EnemyStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert (or overwrite) the enemy at `pos`.
    pub fn insert(&mut self, pos: Position, hp: i32) -> Option<i32> {
        self.hp.insert(pos, hp)
    }

    /// Remove the enemy at `pos`, returning its hit points.
    pub fn remove(&mut self, pos: Position) -> Option<i32> {
        self.hp.remove(&pos)
    }

    /// Hit points of the enemy at `pos`.
    #[must_use]
    pub fn hp_at(&self, pos: Position) -> Option<i32> {
        self.hp.get(&pos).copied()
    }

    /// Mutable hit points of the enemy at `pos`.
    pub fn hp_at_mut(&mut self, pos: Position) -> Option<&mut i32> {
        self.hp.get_mut(&pos)
    }

    /// Check whether an enemy is registered at `pos`.
    #[must_use]
    pub fn contains(&self, pos: Position) -> bool {
        self.hp.contains_key(&pos)
    }

    /// Move the entry at `from` to `to`.
    ///
    /// Returns `false` (and changes nothing) if there is no entry at `from`.
    pub fn relocate(&mut self, from: Position, to: Position) -> bool {
        match self.hp.remove(&from) {
            Some(hp) => {
                self.hp.insert(to, hp);
                true
            }
            None => false,
        }
    }

    /// Number of living enemies.
    #[must_use]
    pub fn len(&self) -> usize {
        self.hp.len()
    }

    /// Whether no enemies remain.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.hp.is_empty()
    }

    /// Enemy positions in row-major order.
    pub fn positions(&self) -> impl Iterator<Item = Position> + '_ {
        self.hp.keys().copied()
    }

    /// `(position, hp)` pairs in row-major order.
    pub fn iter(&self) -> impl Iterator<Item = (Position, i32)> + '_ {
        self.hp.iter().map(|(&pos, &hp)| (pos, hp))
    }
}

/// Hero (while alive) plus the enemy hit point map.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EntityStore {
    hero: Option<Hero>,
    enemies: EnemyStore,
}

impl EntityStore {
    /// Create an empty store with no hero.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The hero, if alive.
    #[must_use]
    pub const fn hero(&self) -> Option<&Hero> {
        self.hero.as_ref()
    }

    /// Mutable hero, if alive.
    pub fn hero_mut(&mut self) -> Option<&mut Hero> {
        self.hero.as_mut()
    }

    /// Replace the hero.
    pub fn set_hero(&mut self, hero: Option<Hero>) {
        self.hero = hero;
    }

    /// Clear the hero, returning the last state.
    pub fn take_hero(&mut self) -> Option<Hero> {
        self.hero.take()
    }

    /// Enemy hit points.
    #[must_use]
    pub const fn enemies(&self) -> &EnemyStore {
        &self.enemies
    }

    /// Mutable enemy hit points.
    pub fn enemies_mut(&mut self) -> &mut EnemyStore {
        &mut self.enemies
    }
}

/// Verify that grid tags and the entity store agree.
///
/// # Errors
///
/// Returns [`GameError::InvariantViolation`] when:
/// - the `Enemy` cells and the enemy store keys differ
/// - the hero is present but not the single `Hero` cell, or absent while a `Hero` cell exists
/// - hero hit points leave `0..=max_hp`
pub fn check_invariants(grid: &Grid, store: &EntityStore) -> Result<()> {
    let tagged = grid.positions_of(Cell::Enemy);
    let keyed: Vec<Position> = store.enemies().positions().collect();
    if tagged != keyed {
        return Err(GameError::InvariantViolation(format!(
            "{} enemy cells vs {} enemy entries",
            tagged.len(),
            keyed.len()
        )));
    }

    let hero_cells = grid.positions_of(Cell::Hero);
    match store.hero() {
        Some(hero) => {
            if hero_cells != [hero.position] {
                return Err(GameError::InvariantViolation(format!(
                    "hero at {} but hero cells are {hero_cells:?}",
                    hero.position
                )));
            }
            if hero.hp < 0 || hero.hp > hero.max_hp {
                return Err(GameError::InvariantViolation(format!(
                    "hero hp {} outside 0..={}",
                    hero.hp, hero.max_hp
                )));
            }
        }
        None => {
            if !hero_cells.is_empty() {
                return Err(GameError::InvariantViolation(format!(
                    "no hero but hero cells at {hero_cells:?}"
                )));
            }
        }
    }

    Ok(())
}
