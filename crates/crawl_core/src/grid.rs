//! Cell grid, positions and directions.
//!
//! The grid is the single source of truth for occupancy: every cell holds
//! exactly one [`Cell`] tag and the entity store is kept in lockstep with it.

use std::cmp::Ordering;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{GameError, Result};
use crate::rules::{MAP_HEIGHT, MAP_WIDTH};

/// Tag held by a single grid cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum Cell {
    /// Solid rock.
    #[default]
    Wall,
    /// Open, empty floor.
    Floor,
    /// The hero.
    Hero,
    /// A hostile entity (hit points live in the enemy store).
    Enemy,
    /// Restores hero hit points when stepped on.
    HealthPotion,
    /// Grants one-hit-kill charges when stepped on.
    WeaponPickup,
}

impl Cell {
    /// Layout character for this cell.
    #[must_use]
    pub const fn glyph(self) -> char {
        match self {
            Self::Wall => '#',
            Self::Floor => '.',
            Self::Hero => '@',
            Self::Enemy => 'E',
            Self::HealthPotion => '!',
            Self::WeaponPickup => '/',
        }
    }

    /// Parse a layout character.
    #[must_use]
    pub const fn from_glyph(glyph: char) -> Option<Self> {
        match glyph {
            '#' => Some(Self::Wall),
            '.' => Some(Self::Floor),
            '@' => Some(Self::Hero),
            'E' => Some(Self::Enemy),
            '!' => Some(Self::HealthPotion),
            '/' => Some(Self::WeaponPickup),
            _ => None,
        }
    }

    /// Whether placement routines may use this cell.
    #[must_use]
    pub const fn is_empty(self) -> bool {
        matches!(self, Self::Floor)
    }
}

/// Integer cell coordinates.
///
/// Ordering is row-major (`y` first, then `x`) so sorted collections of
/// positions iterate in the same order as a grid scan.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub struct Position {
    /// Column.
    pub x: i32,
    /// Row.
    pub y: i32,
}

impl Position {
    /// Create a position.
    #[must_use]
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Position shifted by `(dx, dy)`.
    #[must_use]
    pub const fn offset(self, dx: i32, dy: i32) -> Self {
        Self {
            x: self.x + dx,
            y: self.y + dy,
        }
    }

    /// Squared Euclidean distance between cell centers.
    #[must_use]
    pub const fn distance_squared(self, other: Self) -> i32 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        dx * dx + dy * dy
    }

    /// Chebyshev (king-move) distance.
    #[must_use]
    pub fn chebyshev(self, other: Self) -> i32 {
        (self.x - other.x).abs().max((self.y - other.y).abs())
    }

    /// Whether `other` is one of the eight surrounding cells.
    #[must_use]
    pub fn is_adjacent(self, other: Self) -> bool {
        self != other && self.chebyshev(other) == 1
    }
}

impl Ord for Position {
    fn cmp(&self, other: &Self) -> Ordering {
        (self.y, self.x).cmp(&(other.y, other.x))
    }
}

impl PartialOrd for Position {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

/// The eight compass offsets, row by row from the north-west corner.
pub const NEIGHBOR_OFFSETS: [(i32, i32); 8] = [
    (-1, -1),
    (0, -1),
    (1, -1),
    (-1, 0),
    (1, 0),
    (-1, 1),
    (0, 1),
    (1, 1),
];

/// Cardinal movement direction. The hero never moves diagonally.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    /// Up (`dy = -1`).
    North,
    /// Down (`dy = 1`).
    South,
    /// Left (`dx = -1`).
    West,
    /// Right (`dx = 1`).
    East,
}

impl Direction {
    /// All directions, in the order random wandering indexes them.
    pub const ALL: [Self; 4] = [Self::East, Self::West, Self::South, Self::North];

    /// Unit step `(dx, dy)`.
    #[must_use]
    pub const fn delta(self) -> (i32, i32) {
        match self {
            Self::North => (0, -1),
            Self::South => (0, 1),
            Self::West => (-1, 0),
            Self::East => (1, 0),
        }
    }

    /// Validate a raw `(dx, dy)` step.
    ///
    /// # Errors
    ///
    /// Returns [`GameError::InvalidDirection`] unless exactly one axis is
    /// `±1` and the other is 0.
    pub fn from_delta(dx: i32, dy: i32) -> Result<Self> {
        match (dx, dy) {
            (0, -1) => Ok(Self::North),
            (0, 1) => Ok(Self::South),
            (-1, 0) => Ok(Self::West),
            (1, 0) => Ok(Self::East),
            _ => Err(GameError::InvalidDirection { dx, dy }),
        }
    }
}

/// Rectangular cell matrix stored in row-major order.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Grid {
    width: i32,
    height: i32,
    cells: Vec<Cell>,
}

impl Grid {
    /// Create a full-size dungeon grid filled with `fill`.
    #[must_use]
    pub fn new(fill: Cell) -> Self {
        Self::with_size(MAP_WIDTH, MAP_HEIGHT, fill)
    }

    /// Create a grid of arbitrary size filled with `fill`.
    ///
    /// Non-positive dimensions produce an empty grid.
    #[must_use]
    pub fn with_size(width: i32, height: i32, fill: Cell) -> Self {
        let width = width.max(0);
        let height = height.max(0);
        Self {
            width,
            height,
            cells: vec![fill; (width as usize) * (height as usize)],
        }
    }

    /// Parse a grid from layout rows (see [`Cell::glyph`]).
    ///
    /// # Errors
    ///
    /// Returns an error when there are no rows, rows differ in length, or a
    /// character has no cell mapping.
    pub fn from_rows<S: AsRef<str>>(rows: &[S]) -> Result<Self> {
        let Some(first) = rows.first() else {
            return Err(GameError::InvalidLayout("layout has no rows".to_string()));
        };
        let width = first.as_ref().chars().count();
        if width == 0 {
            return Err(GameError::InvalidLayout("layout rows are empty".to_string()));
        }

        let mut cells = Vec::with_capacity(width * rows.len());
        for (y, row) in rows.iter().enumerate() {
            let row = row.as_ref();
            if row.chars().count() != width {
                return Err(GameError::InvalidLayout(format!(
                    "row {y} has {} cells, expected {width}",
                    row.chars().count()
                )));
            }
            for (x, glyph) in row.chars().enumerate() {
                let cell = Cell::from_glyph(glyph).ok_or(GameError::UnknownGlyph {
                    glyph,
                    x: x as i32,
                    y: y as i32,
                })?;
                cells.push(cell);
            }
        }

        Ok(Self {
            width: width as i32,
            height: rows.len() as i32,
            cells,
        })
    }

    /// Grid width in cells.
    #[must_use]
    pub const fn width(&self) -> i32 {
        self.width
    }

    /// Grid height in cells.
    #[must_use]
    pub const fn height(&self) -> i32 {
        self.height
    }

    /// Total number of cells.
    #[must_use]
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    /// Whether the grid has no cells.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Check if a position lies inside the grid.
    #[must_use]
    pub const fn in_bounds(&self, pos: Position) -> bool {
        pos.x >= 0 && pos.x < self.width && pos.y >= 0 && pos.y < self.height
    }

    #[inline]
    fn index(&self, pos: Position) -> usize {
        (pos.y as usize) * (self.width as usize) + (pos.x as usize)
    }

    /// Cell at `pos`, or `None` when out of bounds.
    #[must_use]
    pub fn get(&self, pos: Position) -> Option<Cell> {
        if self.in_bounds(pos) {
            Some(self.cells[self.index(pos)])
        } else {
            None
        }
    }

    /// Whether the cell at `pos` is in bounds and holds `cell`.
    #[must_use]
    pub fn is(&self, pos: Position, cell: Cell) -> bool {
        self.get(pos) == Some(cell)
    }

    /// Overwrite the cell at `pos`.
    ///
    /// Returns `false` (and does nothing) when out of bounds.
    pub fn set(&mut self, pos: Position, cell: Cell) -> bool {
        if self.in_bounds(pos) {
            let index = self.index(pos);
            self.cells[index] = cell;
            true
        } else {
            false
        }
    }

    /// Fill every cell with `cell`.
    pub fn fill(&mut self, cell: Cell) {
        self.cells.fill(cell);
    }

    /// Iterate `(position, cell)` pairs in row-major order.
    pub fn iter(&self) -> impl Iterator<Item = (Position, Cell)> + '_ {
        let width = self.width.max(1);
        self.cells.iter().enumerate().map(move |(i, &cell)| {
            let i = i as i32;
            (Position::new(i % width, i / width), cell)
        })
    }

    /// Positions holding `cell`, in row-major order.
    #[must_use]
    pub fn positions_of(&self, cell: Cell) -> Vec<Position> {
        self.iter()
            .filter(|&(_, c)| c == cell)
            .map(|(pos, _)| pos)
            .collect()
    }

    /// Number of cells holding `cell`.
    #[must_use]
    pub fn count(&self, cell: Cell) -> usize {
        self.cells.iter().filter(|&&c| c == cell).count()
    }

    /// Empty floor cells, in row-major order.
    #[must_use]
    pub fn empty_cells(&self) -> Vec<Position> {
        self.iter()
            .filter(|&(_, c)| c.is_empty())
            .map(|(pos, _)| pos)
            .collect()
    }

    /// In-bounds neighbours of `pos` in [`NEIGHBOR_OFFSETS`] order.
    pub fn neighbors(&self, pos: Position) -> impl Iterator<Item = Position> + '_ {
        NEIGHBOR_OFFSETS
            .iter()
            .map(move |&(dx, dy)| pos.offset(dx, dy))
            .filter(move |&p| self.in_bounds(p))
    }

    /// Layout rows, one string per grid row.
    #[must_use]
    pub fn to_rows(&self) -> Vec<String> {
        if self.width == 0 {
            return Vec::new();
        }
        self.cells
            .chunks(self.width as usize)
            .map(|row| row.iter().map(|c| c.glyph()).collect())
            .collect()
    }
}

impl fmt::Display for Grid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for row in self.to_rows() {
            writeln!(f, "{row}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_grid_has_dungeon_size() {
        let grid = Grid::new(Cell::Wall);
        assert_eq!(grid.width(), 40);
        assert_eq!(grid.height(), 24);
        assert_eq!(grid.len(), 960);
        assert_eq!(grid.count(Cell::Wall), 960);
    }

    #[test]
    fn test_get_set_bounds() {
        let mut grid = Grid::with_size(4, 3, Cell::Wall);
        assert!(grid.set(Position::new(3, 2), Cell::Floor));
        assert_eq!(grid.get(Position::new(3, 2)), Some(Cell::Floor));
        assert!(!grid.set(Position::new(4, 0), Cell::Floor));
        assert!(!grid.set(Position::new(0, -1), Cell::Floor));
        assert_eq!(grid.get(Position::new(-1, 0)), None);
        assert_eq!(grid.count(Cell::Floor), 1);
    }

    #[test]
    fn test_layout_roundtrip() {
        let rows = ["#####", "#@.E#", "#!/.#", "#####"];
        let grid = Grid::from_rows(&rows).unwrap();
        assert_eq!(grid.width(), 5);
        assert_eq!(grid.height(), 4);
        assert_eq!(grid.get(Position::new(1, 1)), Some(Cell::Hero));
        assert_eq!(grid.get(Position::new(3, 1)), Some(Cell::Enemy));
        assert_eq!(grid.get(Position::new(2, 2)), Some(Cell::WeaponPickup));
        assert_eq!(grid.to_rows(), rows);
    }

    #[test]
    fn test_layout_rejects_bad_input() {
        assert!(matches!(
            Grid::from_rows::<&str>(&[]),
            Err(GameError::InvalidLayout(_))
        ));
        assert!(matches!(
            Grid::from_rows(&["###", "##"]),
            Err(GameError::InvalidLayout(_))
        ));
        assert_eq!(
            Grid::from_rows(&["#.", ".x"]),
            Err(GameError::UnknownGlyph {
                glyph: 'x',
                x: 1,
                y: 1
            })
        );
    }

    #[test]
    fn test_iteration_is_row_major() {
        let grid = Grid::from_rows(&["E.E", ".E."]).unwrap();
        assert_eq!(
            grid.positions_of(Cell::Enemy),
            vec![
                Position::new(0, 0),
                Position::new(2, 0),
                Position::new(1, 1)
            ]
        );
    }

    #[test]
    fn test_position_ordering_matches_scan() {
        let mut positions = vec![
            Position::new(5, 1),
            Position::new(0, 2),
            Position::new(9, 0),
            Position::new(1, 1),
        ];
        positions.sort();
        assert_eq!(
            positions,
            vec![
                Position::new(9, 0),
                Position::new(1, 1),
                Position::new(5, 1),
                Position::new(0, 2)
            ]
        );
    }

    #[test]
    fn test_neighbors_clip_at_edges() {
        let grid = Grid::with_size(5, 5, Cell::Floor);
        assert_eq!(grid.neighbors(Position::new(2, 2)).count(), 8);
        assert_eq!(grid.neighbors(Position::new(0, 0)).count(), 3);
        assert_eq!(grid.neighbors(Position::new(4, 2)).count(), 5);
    }

    #[test]
    fn test_direction_from_delta() {
        assert_eq!(Direction::from_delta(0, -1), Ok(Direction::North));
        assert_eq!(Direction::from_delta(1, 0), Ok(Direction::East));
        assert!(Direction::from_delta(1, 1).is_err());
        assert!(Direction::from_delta(0, 0).is_err());
        assert!(Direction::from_delta(2, 0).is_err());
        for dir in Direction::ALL {
            let (dx, dy) = dir.delta();
            assert_eq!(Direction::from_delta(dx, dy), Ok(dir));
        }
    }

    #[test]
    fn test_distances() {
        let a = Position::new(2, 2);
        assert_eq!(a.distance_squared(Position::new(5, 3)), 10);
        assert_eq!(a.chebyshev(Position::new(5, 3)), 3);
        assert!(a.is_adjacent(Position::new(3, 3)));
        assert!(!a.is_adjacent(a));
        assert!(!a.is_adjacent(Position::new(4, 2)));
    }
}
