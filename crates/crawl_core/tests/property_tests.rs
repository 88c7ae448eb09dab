//! Property tests over generated games and random action sequences.

use crawl_core::map_generation::generate_map;
use crawl_core::prelude::*;
use crawl_core::rules::{HEALTH_POTION_COUNT, MAP_HEIGHT, MAP_WIDTH, WEAPON_PICKUP_COUNT};
use crawl_core::visibility::is_lit;
use crawl_test_utils::determinism::strategies::{arb_action_sequence, arb_seed};
use crawl_test_utils::determinism::verify_game_determinism;
use proptest::prelude::*;

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    /// Any seed yields a full-size grid with floor and bounded item counts.
    #[test]
    fn prop_generation_shape(seed in arb_seed()) {
        let mut rng = SeededRandom::new(seed);
        let grid = generate_map(&mut rng);

        prop_assert_eq!(grid.width(), MAP_WIDTH);
        prop_assert_eq!(grid.height(), MAP_HEIGHT);
        prop_assert!(grid.count(Cell::Floor) > 0);
        prop_assert!(grid.count(Cell::WeaponPickup) <= WEAPON_PICKUP_COUNT);
        prop_assert!(grid.count(Cell::HealthPotion) <= HEALTH_POTION_COUNT);
        prop_assert_eq!(grid.count(Cell::Hero) + grid.count(Cell::Enemy), 0);
    }

    /// Generation terminates for arbitrary draw sequences, not just ChaCha output.
    #[test]
    fn prop_generation_never_fails(draws in prop::collection::vec(any::<u32>(), 0..200)) {
        let mut rng = ScriptedRandom::new(draws);
        let grid = generate_map(&mut rng);
        prop_assert_eq!(grid.len(), 960);
        prop_assert!(grid.count(Cell::Floor) > 0);
    }

    /// Grid and store agree after every step of any game.
    #[test]
    fn prop_invariants_hold(seed in arb_seed(), actions in arb_action_sequence(60)) {
        let mut game = GameInstance::from_seed(seed);
        prop_assert_eq!(game.check_invariants(), Ok(()));

        for action in actions {
            game.apply(action);
            prop_assert_eq!(game.check_invariants(), Ok(()));
            game.enemy_tick();
            prop_assert_eq!(game.check_invariants(), Ok(()));

            if let Some(hero) = game.hero() {
                prop_assert!((0..=hero.max_hp).contains(&hero.hp));
                prop_assert_eq!(game.grid().count(Cell::Hero), 1);
            } else {
                prop_assert_eq!(game.grid().count(Cell::Hero), 0);
                prop_assert_eq!(game.status(), GameStatus::GameOver);
            }
        }
    }

    /// Same seed, same actions, same final state.
    #[test]
    fn prop_games_are_deterministic(seed in arb_seed(), actions in arb_action_sequence(40)) {
        let result = verify_game_determinism(seed, &actions, 2);
        prop_assert!(result.is_deterministic);
    }

    /// The mask lights exactly the cells within Euclidean distance 3.
    #[test]
    fn prop_mask_matches_distance(hx in 0..MAP_WIDTH, hy in 0..MAP_HEIGHT) {
        let grid = Grid::new(Cell::Floor);
        let hero = Position::new(hx, hy);
        let mask = VisibilityMask::recompute(&grid, hero);

        for (pos, _) in grid.iter() {
            let (dx, dy) = (pos.x - hx, pos.y - hy);
            prop_assert_eq!(mask.is_visible(pos), dx * dx + dy * dy <= 9);
            prop_assert_eq!(mask.is_visible(pos), is_lit(hero, pos, 3));
        }
    }

    /// Enemies only ever step onto cells that were floor before the tick.
    #[test]
    fn prop_enemy_moves_target_prior_floor(seed in arb_seed(), ticks in 1usize..30) {
        let mut game = GameInstance::from_seed(seed);
        for _ in 0..ticks {
            let before = game.grid().clone();
            let events = game.enemy_tick();
            for step in &events.enemy_moves {
                prop_assert!(before.is(step.to, Cell::Floor));
                prop_assert!(before.is(step.from, Cell::Enemy));
                prop_assert_eq!(step.from.chebyshev(step.to), 1);
            }
        }
    }
}
