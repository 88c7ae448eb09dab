//! JSON protocol for play sessions.
//!
//! Sessions communicate via JSON lines (one JSON object per line):
//!
//! **Input (stdin):** Commands from the player or a controlling program
//! **Output (stdout):** Responses, combat log lines and frames
//!
//! Single-key lines are accepted as shorthand: `w`, `a`, `s`, `d` move
//! and a lone space attacks.
//!
//! # Example Session
//!
//! ```text
//! <- {"type":"ready","version":"1.0","tick":0,"seed":7}
//! -> {"cmd":"move","dx":1,"dy":0}
//! <- {"type":"ack","cmd":"move","tick":1}
//! -> d
//! <- {"type":"ack","cmd":"move","tick":2}
//! -> {"cmd":"attack"}
//! <- {"type":"log","tick":3,"message":"Hit enemy at (12, 4) for 10, 10 hp left"}
//! <- {"type":"ack","cmd":"attack","tick":3}
//! -> {"cmd":"hash"}
//! <- {"type":"state_hash","tick":3,"hash":1234567890}
//! ```

use crawl_core::prelude::*;
use std::result::Result;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Protocol version reported in `ready`.
pub const PROTOCOL_VERSION: &str = "1.0";

/// Error parsing an input line.
#[derive(Error, Debug)]
pub enum ProtocolError {
    /// Line was blank.
    #[error("Empty command line")]
    Empty,
    /// Line was neither shorthand nor valid JSON.
    #[error("Parse error: {0}")]
    Parse(#[from] serde_json::Error),
}

// ============================================================================
// Input Commands (player -> session)
// ============================================================================

/// Commands accepted by a session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "cmd", rename_all = "snake_case")]
pub enum Command {
    /// Move the hero one cardinal step.
    Move {
        /// Horizontal step.
        dx: i32,
        /// Vertical step.
        dy: i32,
    },

    /// Strike every adjacent enemy.
    Attack,

    /// Report the current state.
    Query,

    /// Draw an ASCII frame.
    Render,

    /// Report the state hash.
    Hash,

    /// Discard the game and start a new one.
    Restart {
        /// Seed for the new game; drawn from entropy when absent.
        #[serde(default)]
        seed: Option<u64>,
    },

    /// End the session.
    Quit,
}

impl Command {
    /// Parse from a JSON line.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Parse a raw input line, accepting key shorthand.
    pub fn parse_line(line: &str) -> Result<Self, ProtocolError> {
        let line = line.trim_end_matches(['\r', '\n']);
        match line {
            "w" | "W" => return Ok(Self::Move { dx: 0, dy: -1 }),
            "a" | "A" => return Ok(Self::Move { dx: -1, dy: 0 }),
            "s" | "S" => return Ok(Self::Move { dx: 0, dy: 1 }),
            "d" | "D" => return Ok(Self::Move { dx: 1, dy: 0 }),
            " " => return Ok(Self::Attack),
            _ => {}
        }

        let trimmed = line.trim();
        if trimmed.is_empty() {
            return Err(ProtocolError::Empty);
        }
        Ok(Self::from_json(trimmed)?)
    }

    /// Get command name for acknowledgment.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Move { .. } => "move",
            Self::Attack => "attack",
            Self::Query => "query",
            Self::Render => "render",
            Self::Hash => "hash",
            Self::Restart { .. } => "restart",
            Self::Quit => "quit",
        }
    }
}

// ============================================================================
// Output Responses (session -> player)
// ============================================================================

/// Responses emitted by a session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Response {
    /// Session is ready (also sent after every restart).
    Ready {
        /// Protocol version.
        version: String,
        /// Current tick.
        tick: u64,
        /// Seed of the running game.
        seed: Option<u64>,
    },

    /// Command processed.
    Ack {
        /// Command name.
        cmd: String,
        /// Tick after the command.
        tick: u64,
    },

    /// Command rejected.
    Error {
        /// What went wrong.
        message: String,
        /// Command name, if it parsed.
        cmd: Option<String>,
    },

    /// Current game state.
    State(StateReport),

    /// Human-readable combat log line.
    Log {
        /// Tick that produced the line.
        tick: u64,
        /// Log text.
        message: String,
    },

    /// ASCII frame.
    Frame {
        /// Tick the frame shows.
        tick: u64,
        /// Rendered text, newline separated.
        text: String,
    },

    /// The hero died.
    GameOver {
        /// Tick of death.
        tick: u64,
        /// Final statistics.
        stats: GameStats,
    },

    /// State hash for determinism checks.
    StateHash {
        /// Current tick.
        tick: u64,
        /// Hash value.
        hash: u64,
    },

    /// Goodbye message before shutdown.
    Bye,
}

/// Game state as reported by `query` and `auto_state`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StateReport {
    /// Current tick.
    pub tick: u64,
    /// Lifecycle state.
    pub status: GameStatus,
    /// Hero, while alive.
    pub hero: Option<HeroSnapshot>,
    /// Enemies within the light radius.
    pub visible_enemies: Vec<EnemySnapshot>,
    /// Enemies anywhere.
    pub enemies_remaining: usize,
    /// Running totals.
    pub stats: GameStats,
    /// State hash.
    pub hash: u64,
}

impl StateReport {
    /// Build a report from a running game.
    pub fn from_game(game: &GameInstance) -> Self {
        let snapshot = game.snapshot();
        Self {
            tick: snapshot.tick,
            status: snapshot.status,
            hero: snapshot.hero,
            visible_enemies: snapshot.enemies,
            enemies_remaining: snapshot.enemies_remaining,
            stats: snapshot.stats,
            hash: game.state_hash(),
        }
    }
}

// ============================================================================
// Helpers
// ============================================================================

impl Response {
    /// Create a ready response.
    pub fn ready(tick: u64, seed: Option<u64>) -> Self {
        Self::Ready {
            version: PROTOCOL_VERSION.to_string(),
            tick,
            seed,
        }
    }

    /// Create an acknowledgment.
    pub fn ack(cmd: &str, tick: u64) -> Self {
        Self::Ack {
            cmd: cmd.to_string(),
            tick,
        }
    }

    /// Create an error response.
    pub fn error(message: impl Into<String>, cmd: Option<&str>) -> Self {
        Self::Error {
            message: message.into(),
            cmd: cmd.map(String::from),
        }
    }

    /// Current state of `game`.
    pub fn state(game: &GameInstance) -> Self {
        Self::State(StateReport::from_game(game))
    }

    /// Serialize to JSON line (with newline).
    pub fn to_json_line(&self) -> String {
        let mut json = serde_json::to_string(self).unwrap_or_else(|e| {
            format!(r#"{{"type":"error","message":"Serialization failed: {e}"}}"#)
        });
        json.push('\n');
        json
    }
}
