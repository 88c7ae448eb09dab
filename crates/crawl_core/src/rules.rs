//! Game rule constants.
//!
//! Every tunable number of the simulation lives here so that generation,
//! movement, combat and the presentation layer agree on the same values.

/// Grid width in cells.
pub const MAP_WIDTH: i32 = 40;

/// Grid height in cells.
pub const MAP_HEIGHT: i32 = 24;

/// Hero maximum (and starting) hit points.
pub const HERO_MAX_HP: i32 = 100;

/// Damage dealt by a normal hero strike.
pub const HERO_ATTACK: i32 = 10;

/// Maximum (and starting) hit points of every enemy.
///
/// Only current hit points are stored per enemy; this is the shared maximum
/// used for spawning and for HP bar display.
pub const ENEMY_MAX_HP: i32 = 20;

/// Number of enemies placed at game start.
pub const ENEMY_COUNT: usize = 10;

/// Damage each adjacent enemy deals to the hero per enemy tick.
pub const ENEMY_DAMAGE: i32 = 10;

/// Chebyshev distance within which enemies chase the hero.
pub const ENEMY_TRIGGER_RADIUS: i32 = 5;

/// Euclidean light radius used for the visibility mask.
pub const LIGHT_RADIUS: i32 = 3;

/// Radius of the window of cells the presentation layer draws.
pub const RENDER_RADIUS: i32 = 8;

/// Hit points restored by a health potion.
pub const POTION_HEAL: i32 = 20;

/// One-hit-kill charges granted by a weapon pickup.
pub const WEAPON_CHARGES: u32 = 5;

/// Weapon pickups placed per map.
pub const WEAPON_PICKUP_COUNT: usize = 2;

/// Health potions placed per map.
pub const HEALTH_POTION_COUNT: usize = 10;

/// Enemy tick period in milliseconds.
pub const ENEMY_TICK_MS: u64 = 500;

/// Minimum number of carved rooms.
pub const ROOM_COUNT_MIN: u32 = 5;

/// Number of distinct extra room counts (rooms = min + 0..spread).
pub const ROOM_COUNT_SPREAD: u32 = 6;

/// Smallest room side length.
pub const ROOM_SIDE_MIN: i32 = 3;

/// Number of distinct room side lengths (side = min + 0..spread).
pub const ROOM_SIDE_SPREAD: u32 = 6;

/// Minimum number of corridors per axis.
pub const CORRIDOR_COUNT_MIN: u32 = 3;

/// Number of distinct extra corridor counts per axis.
pub const CORRIDOR_COUNT_SPREAD: u32 = 3;
