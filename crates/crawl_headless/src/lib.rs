//! Terminal host for the dungeon crawler.
//!
//! Runs games without graphics, controlled via JSON lines on stdin with
//! responses on stdout. This enables:
//!
//! - **Interactive play**: type `w`/`a`/`s`/`d`/space or JSON commands
//! - **Autopilot runs**: a scripted hero plays seeded games
//! - **CI verification**: seeded replays must hash identically
//!
//! # Protocol
//!
//! - **stdin**: Commands (`move`, `attack`, `query`, `render`, ...)
//! - **stdout**: Responses and ASCII frames (JSON)
//! - **stderr**: Logs (human-readable)
//!
//! See [`protocol`] for the full command/response format.
//!
//! # Example
//!
//! ```bash
//! # Play interactively
//! cargo run -p crawl_headless -- play --auto-render
//!
//! # Watch the autopilot play seed 7
//! cargo run -p crawl_headless -- simulate --seed 7
//!
//! # 500 autopilot games in parallel
//! cargo run -p crawl_headless -- batch --count 500 --output results.json
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic)]

pub mod ascii;
pub mod autopilot;
pub mod batch;
pub mod combat_log;
pub mod config;
pub mod protocol;
pub mod session;

pub use ascii::{render_frame, AsciiConfig};
pub use autopilot::Autopilot;
pub use batch::{run_batch, verify_seed, BatchConfig, BatchResults, GameSummary};
pub use config::{ConfigError, SessionConfig};
pub use protocol::{Command, Response};
pub use session::{run_session, Session, SessionError};
