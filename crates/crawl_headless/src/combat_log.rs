//! Human-readable log lines for tick events.

use crawl_core::prelude::*;

/// Describe what happened in `events`, reading follow-up state from `game`.
///
/// `game` must be the instance that produced `events`, queried right after
/// the tick so remaining hit points and charges are current.
pub fn describe(events: &TickEvents, game: &GameInstance) -> Vec<String> {
    let mut lines = Vec::new();
    let hero = game.hero();

    match events.pickup() {
        Some(Pickup::HealthPotion { healed }) => {
            let (hp, max_hp) = hero.map_or((0, 0), |h| (h.hp, h.max_hp));
            lines.push(format!("Drank a health potion (+{healed} hp), hp {hp}/{max_hp}"));
        }
        Some(Pickup::Weapon { charges }) => {
            lines.push(format!("Picked up a sword: {charges} instant kills"));
        }
        None => {}
    }

    let mut charges_left = hero.map_or(0, |h| h.bonus_attack_turns)
        + events.strikes.iter().filter(|s| s.charged).count() as u32;
    for strike in &events.strikes {
        if strike.charged {
            charges_left = charges_left.saturating_sub(1);
            lines.push(format!(
                "Enemy at {} killed instantly by sword, {charges_left} charges left",
                strike.target
            ));
        } else if strike.killed {
            lines.push(format!("Enemy at {} slain", strike.target));
        } else {
            let left = game.entities().enemies().hp_at(strike.target).unwrap_or(0);
            lines.push(format!(
                "Hit enemy at {} for {}, {left} hp left",
                strike.target, strike.damage
            ));
        }
    }

    let report = &events.enemy_attack;
    if report.total_damage > 0 {
        let hp = hero.map_or(0, |h| h.hp);
        lines.push(format!(
            "Took {} damage from {} enemies, hp {hp}",
            report.total_damage,
            report.attackers.len()
        ));
    }

    if events.game_over {
        lines.push("The hero has fallen".to_string());
    }

    lines
}
