//! Hero-centred visibility.
//!
//! Two independent radii are in play:
//! - the light radius (3) drives the [`VisibilityMask`], which gates AI
//!   decisions and enemy HP display
//! - the render radius (8) drives the [`RenderWindow`], the block of cells
//!   the presentation layer draws at all
//!
//! The mask is recomputed in full from the hero position every time; there
//! is no memory of previously seen cells.

use serde::{Deserialize, Serialize};

use crate::grid::{Grid, Position};
use crate::rules::{LIGHT_RADIUS, RENDER_RADIUS};

/// Whether `pos` lies within Euclidean distance `radius` of `center`.
///
/// Compares squared integer distances, so `d == radius` is lit and
/// anything beyond it, however slightly, is not.
#[must_use]
pub const fn is_lit(center: Position, pos: Position, radius: i32) -> bool {
    center.distance_squared(pos) <= radius * radius
}

/// Per-cell visibility flags, row-major like the grid.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct VisibilityMask {
    width: i32,
    height: i32,
    visible: Vec<bool>,
}

impl VisibilityMask {
    /// A mask matching `grid` with every cell hidden.
    #[must_use]
    pub fn hidden(grid: &Grid) -> Self {
        Self {
            width: grid.width(),
            height: grid.height(),
            visible: vec![false; grid.len()],
        }
    }

    /// Recompute the mask for a hero standing at `hero` using the light radius.
    #[must_use]
    pub fn recompute(grid: &Grid, hero: Position) -> Self {
        Self::with_radius(grid, hero, LIGHT_RADIUS)
    }

    /// Recompute the mask for an arbitrary radius.
    #[must_use]
    pub fn with_radius(grid: &Grid, center: Position, radius: i32) -> Self {
        let visible = grid
            .iter()
            .map(|(pos, _)| is_lit(center, pos, radius))
            .collect();
        Self {
            width: grid.width(),
            height: grid.height(),
            visible,
        }
    }

    /// Whether the cell at `pos` is visible. Out-of-bounds cells never are.
    #[must_use]
    pub fn is_visible(&self, pos: Position) -> bool {
        if pos.x < 0 || pos.x >= self.width || pos.y < 0 || pos.y >= self.height {
            return false;
        }
        self.visible[(pos.y as usize) * (self.width as usize) + (pos.x as usize)]
    }

    /// Number of visible cells.
    #[must_use]
    pub fn visible_count(&self) -> usize {
        self.visible.iter().filter(|&&v| v).count()
    }

    /// Visible positions in row-major order.
    pub fn iter_visible(&self) -> impl Iterator<Item = Position> + '_ {
        let width = self.width.max(1);
        self.visible
            .iter()
            .enumerate()
            .filter(|(_, v)| **v)
            .map(move |(i, _)| Position::new(i as i32 % width, i as i32 / width))
    }
}

/// Rectangular block of cells drawn around the hero.
///
/// Bounds follow the clamp `[hero - r, hero + r)` on each axis, so the
/// window covers `r` cells before the hero and `r - 1` after it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RenderWindow {
    /// First drawn column.
    pub min_x: i32,
    /// First drawn row.
    pub min_y: i32,
    /// One past the last drawn column.
    pub max_x: i32,
    /// One past the last drawn row.
    pub max_y: i32,
}

impl RenderWindow {
    /// Window of the default render radius around `hero`, clamped to `grid`.
    #[must_use]
    pub fn around(grid: &Grid, hero: Position) -> Self {
        Self::with_radius(grid, hero, RENDER_RADIUS)
    }

    /// Window of an arbitrary radius around `center`, clamped to `grid`.
    #[must_use]
    pub fn with_radius(grid: &Grid, center: Position, radius: i32) -> Self {
        Self {
            min_x: (center.x - radius).max(0),
            min_y: (center.y - radius).max(0),
            max_x: (center.x + radius).min(grid.width()),
            max_y: (center.y + radius).min(grid.height()),
        }
    }

    /// Whether `pos` falls inside the window.
    #[must_use]
    pub const fn contains(&self, pos: Position) -> bool {
        pos.x >= self.min_x && pos.x < self.max_x && pos.y >= self.min_y && pos.y < self.max_y
    }

    /// Window width in cells.
    #[must_use]
    pub fn width(&self) -> i32 {
        (self.max_x - self.min_x).max(0)
    }

    /// Window height in cells.
    #[must_use]
    pub fn height(&self) -> i32 {
        (self.max_y - self.min_y).max(0)
    }

    /// Positions inside the window in row-major order.
    pub fn positions(&self) -> impl Iterator<Item = Position> + '_ {
        (self.min_y..self.max_y)
            .flat_map(move |y| (self.min_x..self.max_x).map(move |x| Position::new(x, y)))
    }
}
