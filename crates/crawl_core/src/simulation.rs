//! The game instance and its tick pipeline.
//!
//! [`GameInstance`] owns everything belonging to one game: grid, hero,
//! enemies, visibility mask, enemy timer and random source. Restarting
//! replaces the whole instance; nothing survives from the previous game.
//!
//! # Tick Pipeline
//!
//! Two kinds of tick feed the same serial pipeline:
//! 1. **Hero actions** - a move (followed by the death check and a
//!    visibility refresh) or an attack (followed by a visibility refresh)
//! 2. **Enemy ticks** - enemy movement, enemy attacks, death check,
//!    visibility refresh
//!
//! Every method takes `&mut self`, so ticks can never overlap. Hosts drive
//! enemy ticks by feeding elapsed time into [`GameInstance::advance`].

use std::collections::hash_map::DefaultHasher;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::combat::{self, EnemyAttackReport, HeroStrike};
use crate::entities::{self, EntityStore, Hero};
use crate::error::{GameError, Result};
use crate::grid::{Cell, Direction, Grid, Position};
use crate::map_generation::{self, place_objects, random_empty_cell};
use crate::movement::{self, BlockReason, EnemyMove, MoveOutcome, Pickup};
use crate::random::{RandomSource, SeededRandom};
use crate::rules::{ENEMY_COUNT, ENEMY_MAX_HP};
use crate::timer::EnemyTimer;
use crate::visibility::VisibilityMask;

/// Lifecycle state of a game.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GameStatus {
    /// Hero alive, enemy timer running.
    Playing,
    /// Hero died. Terminal.
    GameOver,
    /// No hero could be placed. Nothing ever happens.
    Inert,
}

/// A hero-initiated action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Action {
    /// Step one cell in a cardinal direction.
    Move(Direction),
    /// Strike every adjacent enemy.
    Attack,
}

/// Everything that happened during one tick.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TickEvents {
    /// Tick counter after this tick.
    pub tick: u64,
    /// Result of a hero move, if this tick was a move.
    pub hero_move: Option<MoveOutcome>,
    /// Strikes of a hero attack.
    pub strikes: Vec<HeroStrike>,
    /// Enemy steps applied during an enemy tick.
    pub enemy_moves: Vec<EnemyMove>,
    /// Damage the hero took during an enemy tick.
    pub enemy_attack: EnemyAttackReport,
    /// The hero died during this tick.
    pub game_over: bool,
}

impl TickEvents {
    fn at(tick: u64) -> Self {
        Self {
            tick,
            ..Self::default()
        }
    }

    /// Number of enemies killed.
    #[must_use]
    pub fn kills(&self) -> usize {
        self.strikes.iter().filter(|s| s.killed).count()
    }

    /// Item picked up by a hero move.
    #[must_use]
    pub fn pickup(&self) -> Option<Pickup> {
        match self.hero_move {
            Some(MoveOutcome::Moved { pickup, .. }) => pickup,
            _ => None,
        }
    }

    /// Whether the tick changed anything observable.
    #[must_use]
    pub fn is_quiet(&self) -> bool {
        !self.hero_move.is_some_and(|m| m.is_moved())
            && self.strikes.is_empty()
            && self.enemy_moves.is_empty()
            && self.enemy_attack.total_damage == 0
            && !self.game_over
    }
}

/// Running totals for one game.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameStats {
    /// Enemy ticks processed.
    pub enemy_ticks: u64,
    /// Hero moves and attacks processed while alive.
    pub hero_actions: u64,
    /// Enemies killed by normal strikes.
    pub enemies_slain: u32,
    /// Enemies killed with a weapon charge.
    pub charged_kills: u32,
    /// Health potions consumed.
    pub potions_drunk: u32,
    /// Weapon pickups collected.
    pub weapons_collected: u32,
    /// Total damage taken from enemies.
    pub damage_taken: i64,
}

impl GameStats {
    /// All enemies killed, charged or not.
    #[must_use]
    pub const fn total_kills(&self) -> u32 {
        self.enemies_slain + self.charged_kills
    }
}

/// A single game.
pub struct GameInstance {
    tick: u64,
    seed: Option<u64>,
    grid: Grid,
    entities: EntityStore,
    visibility: VisibilityMask,
    status: GameStatus,
    timer: EnemyTimer,
    rng: Box<dyn RandomSource + Send>,
    stats: GameStats,
}

impl fmt::Debug for GameInstance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GameInstance")
            .field("tick", &self.tick)
            .field("seed", &self.seed)
            .field("status", &self.status)
            .field("hero", &self.entities.hero())
            .field("enemies", &self.entities.enemies().len())
            .field("timer", &self.timer.state())
            .finish_non_exhaustive()
    }
}

impl GameInstance {
    /// Generate and initialize a new game drawing from `rng`.
    ///
    /// Order: map (rooms, corridors, items), hero, enemies, visibility,
    /// timer. When no floor cell is left for the hero the game is
    /// [`GameStatus::Inert`]: no enemies, no timer.
    pub fn new<R: RandomSource + Send + 'static>(rng: R) -> Self {
        Self::build(Box::new(rng), None)
    }

    /// New game from a seeded ChaCha source.
    #[must_use]
    pub fn from_seed(seed: u64) -> Self {
        Self::build(Box::new(SeededRandom::new(seed)), Some(seed))
    }

    /// New game seeded from system entropy. The seed is recorded.
    #[must_use]
    pub fn from_entropy() -> Self {
        let rng = SeededRandom::from_entropy();
        let seed = rng.seed();
        Self::build(Box::new(rng), Some(seed))
    }

    fn build(mut rng: Box<dyn RandomSource + Send>, seed: Option<u64>) -> Self {
        let mut grid = map_generation::generate_map(&mut *rng);
        let mut entities = EntityStore::new();

        if let Some(cell) = random_empty_cell(&grid, &mut *rng) {
            grid.set(cell, Cell::Hero);
            entities.set_hero(Some(Hero::new(cell)));

            place_objects(&mut grid, Cell::Enemy, ENEMY_COUNT, &mut *rng);
            for pos in grid.positions_of(Cell::Enemy) {
                entities.enemies_mut().insert(pos, ENEMY_MAX_HP);
            }
        }

        let game = Self::assemble(grid, entities, rng, seed);
        info!(
            seed = ?game.seed,
            status = ?game.status,
            enemies = game.entities.enemies().len(),
            "Game started"
        );
        game
    }

    /// Build a game from a prepared grid instead of generating one.
    ///
    /// The hero is taken from the single `Hero` cell, if any. Every
    /// `Enemy` cell gets a full-health enemy.
    ///
    /// # Errors
    ///
    /// Returns [`GameError::InvalidLayout`] if the grid holds more than one hero.
    pub fn from_grid<R: RandomSource + Send + 'static>(grid: Grid, rng: R) -> Result<Self> {
        let heroes = grid.positions_of(Cell::Hero);
        if heroes.len() > 1 {
            return Err(GameError::InvalidLayout(format!(
                "expected at most one hero, found {}",
                heroes.len()
            )));
        }

        let mut entities = EntityStore::new();
        entities.set_hero(heroes.first().copied().map(Hero::new));
        for pos in grid.positions_of(Cell::Enemy) {
            entities.enemies_mut().insert(pos, ENEMY_MAX_HP);
        }

        Ok(Self::assemble(grid, entities, Box::new(rng), None))
    }

    fn assemble(
        grid: Grid,
        entities: EntityStore,
        rng: Box<dyn RandomSource + Send>,
        seed: Option<u64>,
    ) -> Self {
        let (status, timer) = if entities.hero().is_some() {
            (GameStatus::Playing, EnemyTimer::new())
        } else {
            (GameStatus::Inert, EnemyTimer::idle())
        };

        let mut game = Self {
            tick: 0,
            seed,
            visibility: VisibilityMask::hidden(&grid),
            grid,
            entities,
            status,
            timer,
            rng,
            stats: GameStats::default(),
        };
        game.refresh_visibility();
        game
    }

    /// Discard this game and start a new one drawing from `rng`.
    pub fn restart<R: RandomSource + Send + 'static>(&mut self, rng: R) {
        info!(tick = self.tick, "Restarting game");
        *self = Self::new(rng);
    }

    /// Discard this game and start a new seeded one.
    pub fn restart_with_seed(&mut self, seed: u64) {
        info!(tick = self.tick, seed, "Restarting game");
        *self = Self::from_seed(seed);
    }

    /// Current tick count. Only ticks processed with a living hero count.
    #[must_use]
    pub const fn tick(&self) -> u64 {
        self.tick
    }

    /// Seed of the random source, when the game was seeded.
    #[must_use]
    pub const fn seed(&self) -> Option<u64> {
        self.seed
    }

    /// The grid.
    #[must_use]
    pub const fn grid(&self) -> &Grid {
        &self.grid
    }

    /// Hero and enemies.
    #[must_use]
    pub const fn entities(&self) -> &EntityStore {
        &self.entities
    }

    /// The hero, while alive.
    #[must_use]
    pub const fn hero(&self) -> Option<&Hero> {
        self.entities.hero()
    }

    /// Current visibility mask.
    #[must_use]
    pub const fn visibility(&self) -> &VisibilityMask {
        &self.visibility
    }

    /// Lifecycle state.
    #[must_use]
    pub const fn status(&self) -> GameStatus {
        self.status
    }

    /// The enemy timer.
    #[must_use]
    pub const fn timer(&self) -> &EnemyTimer {
        &self.timer
    }

    /// Running totals.
    #[must_use]
    pub const fn stats(&self) -> &GameStats {
        &self.stats
    }

    /// Whether the game still reacts to input.
    #[must_use]
    pub fn is_playing(&self) -> bool {
        self.status == GameStatus::Playing
    }

    /// Override an existing enemy's hit points. Returns `false` if there is no enemy at `pos`.
    pub fn set_enemy_hp(&mut self, pos: Position, hp: i32) -> bool {
        match self.entities.enemies_mut().hp_at_mut(pos) {
            Some(slot) => {
                *slot = hp;
                true
            }
            None => false,
        }
    }

    /// Override the hero's hit points, clamped to `0..=max_hp`. Returns `false` without a hero.
    pub fn set_hero_hp(&mut self, hp: i32) -> bool {
        let Some(hero) = self.entities.hero_mut() else {
            return false;
        };
        hero.hp = hp.clamp(0, hero.max_hp);
        true
    }

    /// Override the hero's weapon charges. Returns `false` without a hero.
    pub fn set_bonus_attack_turns(&mut self, charges: u32) -> bool {
        let Some(hero) = self.entities.hero_mut() else {
            return false;
        };
        hero.bonus_attack_turns = charges;
        true
    }

    /// Apply a hero action.
    pub fn apply(&mut self, action: Action) -> TickEvents {
        match action {
            Action::Move(direction) => self.move_hero(direction),
            Action::Attack => self.attack(),
        }
    }

    /// Move the hero one step. A no-op without a hero.
    pub fn move_hero(&mut self, direction: Direction) -> TickEvents {
        if self.entities.hero().is_none() {
            let mut events = TickEvents::at(self.tick);
            events.hero_move = Some(MoveOutcome::Blocked(BlockReason::NoHero));
            return events;
        }

        self.tick += 1;
        self.stats.hero_actions += 1;
        let mut events = TickEvents::at(self.tick);

        let outcome = movement::move_hero(&mut self.grid, &mut self.entities, direction);
        events.hero_move = Some(outcome);

        if let MoveOutcome::Moved { pickup, .. } = outcome {
            match pickup {
                Some(Pickup::HealthPotion { .. }) => self.stats.potions_drunk += 1,
                Some(Pickup::Weapon { .. }) => self.stats.weapons_collected += 1,
                None => {}
            }
            self.check_hero_death(&mut events);
            self.refresh_visibility();
        }

        self.validate();
        events
    }

    /// Strike every adjacent enemy. A no-op without a hero.
    pub fn attack(&mut self) -> TickEvents {
        if self.entities.hero().is_none() {
            return TickEvents::at(self.tick);
        }

        self.tick += 1;
        self.stats.hero_actions += 1;
        let mut events = TickEvents::at(self.tick);

        events.strikes = combat::hero_attack(&mut self.grid, &mut self.entities);
        for strike in events.strikes.iter().filter(|s| s.killed) {
            if strike.charged {
                self.stats.charged_kills += 1;
            } else {
                self.stats.enemies_slain += 1;
            }
        }

        self.refresh_visibility();
        self.validate();
        events
    }

    /// Run one enemy tick.
    ///
    /// Without a living hero the timer is cancelled (if still armed) and
    /// nothing else happens.
    pub fn enemy_tick(&mut self) -> TickEvents {
        if self.entities.hero().is_none() {
            if self.timer.cancel() {
                debug!(tick = self.tick, "Enemy timer cancelled, no hero");
            }
            return TickEvents::at(self.tick);
        }

        self.tick += 1;
        self.stats.enemy_ticks += 1;
        let mut events = TickEvents::at(self.tick);

        events.enemy_moves =
            movement::move_enemies(&mut self.grid, &mut self.entities, &mut *self.rng);
        events.enemy_attack = combat::enemies_attack_hero(&self.grid, &mut self.entities);
        self.stats.damage_taken += i64::from(events.enemy_attack.total_damage);

        self.check_hero_death(&mut events);
        self.refresh_visibility();

        debug!(
            tick = self.tick,
            moved = events.enemy_moves.len(),
            damage = events.enemy_attack.total_damage,
            "Enemy tick"
        );

        #[cfg(debug_assertions)]
        {
            let hash = self.state_hash();
            debug!(tick = self.tick, state_hash = hash, "Simulation state hash");
        }

        self.validate();
        events
    }

    /// Feed elapsed wall-clock time to the enemy timer and run every enemy
    /// tick that fell due.
    ///
    /// Stops early once the timer is cancelled, so no tick runs after the
    /// hero's death.
    pub fn advance(&mut self, elapsed: Duration) -> Vec<TickEvents> {
        let due = self.timer.poll(elapsed);
        let mut ticks = Vec::new();
        for _ in 0..due {
            if !self.timer.is_armed() {
                break;
            }
            ticks.push(self.enemy_tick());
        }
        ticks
    }

    /// Death check: run after every mutation that may lower hero hp.
    fn check_hero_death(&mut self, events: &mut TickEvents) {
        let Some(hero) = self.entities.hero_mut() else {
            return;
        };
        if !hero.is_dead() {
            return;
        }

        hero.hp = 0;
        let pos = hero.position;
        self.grid.set(pos, Cell::Floor);
        self.timer.cancel();
        self.entities.take_hero();
        self.status = GameStatus::GameOver;
        events.game_over = true;

        info!(
            tick = self.tick,
            x = pos.x,
            y = pos.y,
            kills = self.stats.total_kills(),
            "Hero died, game over"
        );
    }

    fn refresh_visibility(&mut self) {
        self.visibility = match self.entities.hero() {
            Some(hero) => VisibilityMask::recompute(&self.grid, hero.position),
            None => VisibilityMask::hidden(&self.grid),
        };
    }

    /// Deterministic hash of the observable game state.
    ///
    /// Two games fed the same seed and the same actions hash equal.
    #[must_use]
    pub fn state_hash(&self) -> u64 {
        let mut hasher = DefaultHasher::new();

        self.tick.hash(&mut hasher);
        self.status.hash(&mut hasher);
        self.grid.hash(&mut hasher);
        self.entities.hero().hash(&mut hasher);

        self.entities.enemies().len().hash(&mut hasher);
        for (pos, hp) in self.entities.enemies().iter() {
            pos.hash(&mut hasher);
            hp.hash(&mut hasher);
        }

        self.visibility.hash(&mut hasher);
        self.timer.state().hash(&mut hasher);

        hasher.finish()
    }

    /// Verify grid, store, status and mask agree with each other.
    ///
    /// # Errors
    ///
    /// Returns [`GameError::InvariantViolation`] describing the first mismatch.
    pub fn check_invariants(&self) -> Result<()> {
        entities::check_invariants(&self.grid, &self.entities)?;

        let hero_present = self.entities.hero().is_some();
        if hero_present != (self.status == GameStatus::Playing) {
            return Err(GameError::InvariantViolation(format!(
                "status {:?} with hero present = {hero_present}",
                self.status
            )));
        }
        if hero_present != self.timer.is_armed() {
            return Err(GameError::InvariantViolation(format!(
                "timer {:?} with hero present = {hero_present}",
                self.timer.state()
            )));
        }
        if !hero_present && self.visibility.visible_count() > 0 {
            return Err(GameError::InvariantViolation(
                "cells visible without a hero".to_string(),
            ));
        }

        Ok(())
    }

    #[cfg(feature = "debug-validation")]
    fn validate(&self) {
        if let Err(err) = self.check_invariants() {
            tracing::error!(tick = self.tick, %err, "Invariant violation");
        }
    }

    #[cfg(not(feature = "debug-validation"))]
    #[allow(clippy::unused_self)]
    fn validate(&self) {}
}
