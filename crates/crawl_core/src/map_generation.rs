//! Procedural dungeon generation.
//!
//! Generation runs in a fixed order, later steps overwriting earlier ones:
//! - Fill the grid with walls
//! - Carve overlapping rectangular rooms
//! - Carve full-length vertical and horizontal corridors
//! - Scatter weapon pickups and health potions on empty floor
//!
//! Connectivity is never verified. Corridors make a connected dungeon
//! likely, but pockets of floor cut off from the hero are valid output.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::grid::{Cell, Grid, Position};
use crate::random::RandomSource;
use crate::rules::{
    CORRIDOR_COUNT_MIN, CORRIDOR_COUNT_SPREAD, HEALTH_POTION_COUNT, ROOM_COUNT_MIN,
    ROOM_COUNT_SPREAD, ROOM_SIDE_MIN, ROOM_SIDE_SPREAD, WEAPON_PICKUP_COUNT,
};

/// A carved rectangular room.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Room {
    /// Left column.
    pub x: i32,
    /// Top row.
    pub y: i32,
    /// Width in cells.
    pub width: i32,
    /// Height in cells.
    pub height: i32,
}

impl Room {
    /// Check whether a position lies inside the room.
    #[must_use]
    pub const fn contains(&self, pos: Position) -> bool {
        pos.x >= self.x
            && pos.x < self.x + self.width
            && pos.y >= self.y
            && pos.y < self.y + self.height
    }
}

/// Generated dungeon with the features that shaped it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneratedMap {
    /// Final grid, pickups included.
    pub grid: Grid,
    /// Rooms in carving order.
    pub rooms: Vec<Room>,
    /// Columns of vertical corridors.
    pub vertical_corridors: Vec<i32>,
    /// Rows of horizontal corridors.
    pub horizontal_corridors: Vec<i32>,
    /// Weapon pickups actually placed.
    pub weapons_placed: usize,
    /// Health potions actually placed.
    pub potions_placed: usize,
}

/// Generate a full-size dungeon grid.
pub fn generate_map<R: RandomSource + ?Sized>(rng: &mut R) -> Grid {
    generate_layout(rng).grid
}

/// Generate a full-size dungeon and keep the carving record.
pub fn generate_layout<R: RandomSource + ?Sized>(rng: &mut R) -> GeneratedMap {
    let mut grid = Grid::new(Cell::Wall);

    let rooms = carve_rooms(&mut grid, rng);
    let (vertical_corridors, horizontal_corridors) = carve_corridors(&mut grid, rng);

    let weapons_placed = place_objects(&mut grid, Cell::WeaponPickup, WEAPON_PICKUP_COUNT, rng);
    let potions_placed = place_objects(&mut grid, Cell::HealthPotion, HEALTH_POTION_COUNT, rng);

    debug!(
        rooms = rooms.len(),
        vertical = vertical_corridors.len(),
        horizontal = horizontal_corridors.len(),
        weapons = weapons_placed,
        potions = potions_placed,
        floor = grid.count(Cell::Floor),
        "Generated dungeon"
    );

    GeneratedMap {
        grid,
        rooms,
        vertical_corridors,
        horizontal_corridors,
        weapons_placed,
        potions_placed,
    }
}

fn carve_rooms<R: RandomSource + ?Sized>(grid: &mut Grid, rng: &mut R) -> Vec<Room> {
    let count = ROOM_COUNT_MIN + rng.below(ROOM_COUNT_SPREAD);
    let mut rooms = Vec::with_capacity(count as usize);

    for _ in 0..count {
        let width = ROOM_SIDE_MIN + rng.below(ROOM_SIDE_SPREAD) as i32;
        let height = ROOM_SIDE_MIN + rng.below(ROOM_SIDE_SPREAD) as i32;
        // Leave at least one wall column/row on the high edge.
        let x = rng.below((grid.width() - width - 1).max(1) as u32) as i32;
        let y = rng.below((grid.height() - height - 1).max(1) as u32) as i32;

        let room = Room {
            x,
            y,
            width,
            height,
        };
        for yy in y..y + height {
            for xx in x..x + width {
                grid.set(Position::new(xx, yy), Cell::Floor);
            }
        }
        rooms.push(room);
    }

    rooms
}

fn carve_corridors<R: RandomSource + ?Sized>(
    grid: &mut Grid,
    rng: &mut R,
) -> (Vec<i32>, Vec<i32>) {
    let vertical_count = CORRIDOR_COUNT_MIN + rng.below(CORRIDOR_COUNT_SPREAD);
    let mut vertical = Vec::with_capacity(vertical_count as usize);
    for _ in 0..vertical_count {
        let x = rng.below(grid.width() as u32) as i32;
        for y in 0..grid.height() {
            grid.set(Position::new(x, y), Cell::Floor);
        }
        vertical.push(x);
    }

    let horizontal_count = CORRIDOR_COUNT_MIN + rng.below(CORRIDOR_COUNT_SPREAD);
    let mut horizontal = Vec::with_capacity(horizontal_count as usize);
    for _ in 0..horizontal_count {
        let y = rng.below(grid.height() as u32) as i32;
        for x in 0..grid.width() {
            grid.set(Position::new(x, y), Cell::Floor);
        }
        horizontal.push(y);
    }

    (vertical, horizontal)
}

/// Pick a uniformly random empty floor cell.
///
/// Returns `None` (without drawing) when no empty cell remains.
pub fn random_empty_cell<R: RandomSource + ?Sized>(grid: &Grid, rng: &mut R) -> Option<Position> {
    let empty = grid.empty_cells();
    if empty.is_empty() {
        return None;
    }
    let index = rng.below(empty.len() as u32) as usize;
    empty.get(index).copied()
}

/// Convert up to `count` random empty cells to `cell`.
///
/// Stops early once the floor is exhausted. Returns how many were placed.
pub fn place_objects<R: RandomSource + ?Sized>(
    grid: &mut Grid,
    cell: Cell,
    count: usize,
    rng: &mut R,
) -> usize {
    let mut placed = 0;
    for _ in 0..count {
        let Some(pos) = random_empty_cell(grid, rng) else {
            debug!(?cell, placed, requested = count, "Placement ran out of floor");
            break;
        };
        grid.set(pos, cell);
        placed += 1;
    }
    placed
}
