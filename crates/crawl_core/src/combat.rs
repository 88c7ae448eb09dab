//! Melee resolution between the hero and adjacent enemies.
//!
//! Adjacency is the 8-neighbourhood. Both directions of combat touch every
//! adjacent enemy at once: the hero's attack hits all of them, and every
//! one of them hits the hero on an enemy tick.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::entities::EntityStore;
use crate::grid::{Cell, Grid, Position, NEIGHBOR_OFFSETS};
use crate::rules::ENEMY_DAMAGE;

/// Effect of the hero's attack on one adjacent enemy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HeroStrike {
    /// Enemy cell.
    pub target: Position,
    /// Damage dealt; equals the enemy's remaining hp for charged kills.
    pub damage: i32,
    /// Whether a weapon charge was spent on this enemy.
    pub charged: bool,
    /// Whether the enemy died and was removed.
    pub killed: bool,
}

/// Damage dealt to the hero during one enemy tick.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnemyAttackReport {
    /// Cells of the enemies that struck.
    pub attackers: Vec<Position>,
    /// Total damage applied.
    pub total_damage: i32,
}

/// Hero strikes every adjacent enemy.
///
/// Enemies are visited in neighbour order (row by row from the top-left).
/// While charges remain each visited enemy is killed outright and one
/// charge is spent; once charges run out the remaining enemies take the
/// hero's normal attack. Killed enemies are removed from the store and
/// their cell becomes floor.
pub fn hero_attack(grid: &mut Grid, store: &mut EntityStore) -> Vec<HeroStrike> {
    let Some(hero) = store.hero().copied() else {
        return Vec::new();
    };

    let mut strikes = Vec::new();
    for (dx, dy) in NEIGHBOR_OFFSETS {
        let target = hero.position.offset(dx, dy);
        if !grid.is(target, Cell::Enemy) {
            continue;
        }
        let Some(hp) = store.enemies().hp_at(target) else {
            continue;
        };

        let charged = store.hero_mut().is_some_and(|h| h.consume_charge());
        let damage = if charged { hp } else { hero.attack };
        let remaining = hp - damage;
        let killed = remaining <= 0;

        if killed {
            store.enemies_mut().remove(target);
            grid.set(target, Cell::Floor);
            debug!(x = target.x, y = target.y, charged, "Enemy killed");
        } else if let Some(slot) = store.enemies_mut().hp_at_mut(target) {
            *slot = remaining;
        }

        strikes.push(HeroStrike {
            target,
            damage,
            charged,
            killed,
        });
    }

    strikes
}

/// Every enemy adjacent to the hero deals fixed damage.
///
/// Hit points may drop below zero here; the death check clamps them.
pub fn enemies_attack_hero(grid: &Grid, store: &mut EntityStore) -> EnemyAttackReport {
    let mut report = EnemyAttackReport::default();
    let Some(hero) = store.hero_mut() else {
        return report;
    };

    for (dx, dy) in NEIGHBOR_OFFSETS {
        let attacker = hero.position.offset(dx, dy);
        if grid.is(attacker, Cell::Enemy) {
            hero.take_damage(ENEMY_DAMAGE);
            report.attackers.push(attacker);
            report.total_damage += ENEMY_DAMAGE;
        }
    }

    if report.total_damage > 0 {
        debug!(
            attackers = report.attackers.len(),
            damage = report.total_damage,
            hp = hero.hp,
            "Hero attacked"
        );
    }

    report
}
