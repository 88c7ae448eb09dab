//! Error types for the dungeon simulation.
//!
//! Normal play never fails: blocked moves and exhausted placements are
//! silent no-ops. Errors only surface at the boundaries, when parsing
//! host input or layouts and when validating state invariants.

use thiserror::Error;

/// Result type alias using [`GameError`].
pub type Result<T> = std::result::Result<T, GameError>;

/// Top-level error type for the simulation core.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GameError {
    /// Movement delta is not one of the four cardinal unit steps.
    #[error("Invalid direction ({dx}, {dy}): expected a single cardinal step")]
    InvalidDirection {
        /// Horizontal component.
        dx: i32,
        /// Vertical component.
        dy: i32,
    },

    /// Layout text contains a character with no cell mapping.
    #[error("Unknown layout glyph '{glyph}' at ({x}, {y})")]
    UnknownGlyph {
        /// Offending character.
        glyph: char,
        /// Column of the character.
        x: i32,
        /// Row of the character.
        y: i32,
    },

    /// Layout is structurally invalid (ragged rows, several heroes, ...).
    #[error("Invalid layout: {0}")]
    InvalidLayout(String),

    /// Grid tags and entity store disagree.
    #[error("Invariant violated: {0}")]
    InvariantViolation(String),
}
