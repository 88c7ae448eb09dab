//! Game rule tests driven through the public `GameInstance` API.
//!
//! Layouts come from `crawl_test_utils::fixtures`; enemy AI draws are
//! scripted so every tick is predictable.

use std::time::Duration;

use crawl_core::prelude::*;
use crawl_test_utils::fixtures::{
    game_from_layout, game_with_draws, hero_position, DISTANT_ENEMY, DUEL, PICKUP_CORRIDOR,
    SURROUNDED,
};

// =============================================================================
// Movement
// =============================================================================

#[test]
fn test_walls_and_enemies_block_without_side_effects() {
    let mut game = game_from_layout(DUEL);
    let before = game.grid().clone();

    let north = game.move_hero(Direction::North);
    let east = game.move_hero(Direction::East);

    assert_eq!(north.hero_move, Some(MoveOutcome::Blocked(BlockReason::Wall)));
    assert_eq!(east.hero_move, Some(MoveOutcome::Blocked(BlockReason::Enemy)));
    assert_eq!(game.grid(), &before);
    assert_eq!(hero_position(&game), Some(Position::new(2, 1)));
}

#[test]
fn test_corridor_pickups() {
    let mut game = game_from_layout(PICKUP_CORRIDOR);
    game.set_hero_hp(50);

    for _ in 0..4 {
        game.move_hero(Direction::East);
    }

    let hero = game.hero().copied().unwrap();
    assert_eq!(hero.position, Position::new(5, 1));
    assert_eq!(hero.hp, 70);
    assert_eq!(hero.bonus_attack_turns, 5);
    assert_eq!(game.grid().count(Cell::HealthPotion), 0);
    assert_eq!(game.grid().count(Cell::WeaponPickup), 0);
}

// =============================================================================
// Enemy AI
// =============================================================================

#[test]
fn test_distant_enemy_wanders() {
    // Enemy at (12, 3), hero at (1, 1): out of trigger range. Draw 3 = north.
    let mut game = game_with_draws(DISTANT_ENEMY, &[3]);
    let events = game.enemy_tick();

    assert_eq!(
        events.enemy_moves,
        vec![EnemyMove {
            from: Position::new(12, 3),
            to: Position::new(12, 2)
        }]
    );
    assert_eq!(game.check_invariants(), Ok(()));
}

#[test]
fn test_enemy_closes_in_and_attacks() {
    let mut game = game_from_layout(&["@...E"]);

    // Draws are 0: horizontal chase every tick.
    game.enemy_tick();
    game.enemy_tick();
    assert!(game.grid().is(Position::new(2, 0), Cell::Enemy));
    assert_eq!(game.hero().unwrap().hp, 100);

    game.enemy_tick();
    assert!(game.grid().is(Position::new(1, 0), Cell::Enemy));
    assert_eq!(game.hero().unwrap().hp, 90);

    // Adjacent: stays put and keeps hitting.
    let events = game.enemy_tick();
    assert!(events.enemy_moves.is_empty());
    assert_eq!(game.hero().unwrap().hp, 80);
}

#[test]
fn test_enemy_cannot_take_cell_vacated_this_tick() {
    // Both enemies wander west; the second is blocked by the first's old cell.
    let mut game = game_with_draws(&["#.EE.........@"], &[1, 1]);
    let events = game.enemy_tick();

    assert_eq!(events.enemy_moves.len(), 1);
    assert_eq!(game.grid().to_rows(), vec!["#E.E.........@"]);
    assert_eq!(game.check_invariants(), Ok(()));
}

// =============================================================================
// Combat
// =============================================================================

#[test]
fn test_charged_kill_spares_non_adjacent_enemy() {
    let mut game = game_from_layout(&["@E..E"]);
    game.set_bonus_attack_turns(1);
    game.set_enemy_hp(Position::new(1, 0), 5);

    game.attack();

    assert!(game.grid().is(Position::new(1, 0), Cell::Floor));
    assert_eq!(game.hero().unwrap().bonus_attack_turns, 0);
    assert_eq!(game.entities().enemies().hp_at(Position::new(4, 0)), Some(20));
}

#[test]
fn test_uncharged_strike_wounds() {
    let mut game = game_from_layout(&["@E"]);
    game.set_enemy_hp(Position::new(1, 0), 15);

    let events = game.attack();

    assert_eq!(events.strikes[0].damage, 10);
    assert!(!events.strikes[0].killed);
    assert_eq!(game.entities().enemies().hp_at(Position::new(1, 0)), Some(5));
}

#[test]
fn test_attack_hits_every_neighbour() {
    let mut game = game_from_layout(SURROUNDED);
    let events = game.attack();

    assert_eq!(events.strikes.len(), 8);
    assert!(game.entities().enemies().iter().all(|(_, hp)| hp == 10));

    let events = game.attack();
    assert_eq!(events.kills(), 8);
    assert!(game.entities().enemies().is_empty());
    assert_eq!(game.stats().enemies_slain, 8);
}

// =============================================================================
// Death and restart
// =============================================================================

#[test]
fn test_death_freezes_the_game() {
    let mut game = game_from_layout(SURROUNDED);
    game.set_hero_hp(80);

    let ticks = game.advance(Duration::from_millis(500));

    assert_eq!(ticks.len(), 1);
    assert!(ticks[0].game_over);
    assert_eq!(game.status(), GameStatus::GameOver);
    assert!(game.hero().is_none());
    assert!(game.grid().is(Position::new(2, 2), Cell::Floor));
    assert_eq!(game.grid().count(Cell::Hero), 0);

    let hash = game.state_hash();
    game.apply(Action::Move(Direction::West));
    game.apply(Action::Attack);
    assert!(game.advance(Duration::from_secs(60)).is_empty());
    assert_eq!(game.state_hash(), hash);
}

#[test]
fn test_hero_survives_with_one_hp() {
    let mut game = game_from_layout(SURROUNDED);
    game.set_hero_hp(81);

    let events = game.enemy_tick();

    assert!(!events.game_over);
    assert_eq!(game.hero().unwrap().hp, 1);
}

#[test]
fn test_restart_after_game_over() {
    let mut game = game_from_layout(SURROUNDED);
    game.set_hero_hp(10);
    game.enemy_tick();

    game.restart(SeededRandom::new(21));

    assert_eq!(game.status(), GameStatus::Playing);
    assert!(game.timer().is_armed());
    assert_eq!(game.grid().width(), 40);
    assert_eq!(game.check_invariants(), Ok(()));
}

#[test]
fn test_snapshot_after_game_over() {
    let mut game = game_from_layout(SURROUNDED);
    game.set_hero_hp(10);
    game.enemy_tick();

    let snapshot = game.snapshot();

    assert_eq!(snapshot.status, GameStatus::GameOver);
    assert!(snapshot.hero.is_none());
    assert!(snapshot.enemies.is_empty());
    assert_eq!(snapshot.enemies_remaining, 8);
    assert_eq!(snapshot.stats.damage_taken, 80);
}
