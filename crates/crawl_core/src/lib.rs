//! # Crawl Core
//!
//! Deterministic simulation core for a grid dungeon crawler.
//!
//! This crate contains **only** simulation logic:
//! - No rendering
//! - No IO
//! - No system randomness (every draw goes through a [`random::RandomSource`])
//! - No wall clock (hosts feed elapsed time into the enemy timer)
//!
//! This separation enables:
//! - Seeded, reproducible games
//! - Terminal and headless hosts
//! - Determinism testing
//!
//! ## Crate Structure
//!
//! - [`rules`] - Game constants
//! - [`grid`] - Cells, positions, directions and the grid itself
//! - [`map_generation`] - Rooms, corridors and item placement
//! - [`visibility`] - Light mask and render window
//! - [`entities`] - Hero and enemy state
//! - [`movement`] - Hero moves and enemy AI
//! - [`combat`] - Melee between the hero and adjacent enemies
//! - [`timer`] - The cancellable enemy timer
//! - [`simulation`] - The game instance and its tick pipeline
//! - [`snapshot`] - Read-only view for renderers

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic)]

pub mod combat;
pub mod entities;
pub mod error;
pub mod grid;
pub mod map_generation;
pub mod movement;
pub mod random;
pub mod rules;
pub mod simulation;
pub mod snapshot;
pub mod timer;
pub mod visibility;

/// Re-export commonly used types
pub mod prelude {
    pub use crate::combat::{EnemyAttackReport, HeroStrike};
    pub use crate::entities::{EnemyStore, EntityStore, Hero};
    pub use crate::error::{GameError, Result};
    pub use crate::grid::{Cell, Direction, Grid, Position};
    pub use crate::movement::{BlockReason, EnemyMove, MoveOutcome, Pickup};
    pub use crate::random::{RandomSource, ScriptedRandom, SeededRandom};
    pub use crate::simulation::{Action, GameInstance, GameStats, GameStatus, TickEvents};
    pub use crate::snapshot::{EnemySnapshot, HeroSnapshot, Snapshot};
    pub use crate::timer::{EnemyTimer, TimerState};
    pub use crate::visibility::{RenderWindow, VisibilityMask};
}
