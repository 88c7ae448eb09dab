//! ASCII frame renderer.
//!
//! Draws the render window around the hero. Cells outside the light
//! radius are dimmed, and enemies standing on them are drawn as floor:
//! the player only sees enemies inside the light.

use std::fmt::Write as _;

use crawl_core::prelude::*;
use serde::{Deserialize, Serialize};

/// ASCII rendering configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AsciiConfig {
    /// Use colored output (ANSI).
    pub use_color: bool,
    /// Show the hero status legend.
    pub show_legend: bool,
    /// Dim unlit cells and hide unlit enemies.
    pub show_fog: bool,
}

impl Default for AsciiConfig {
    fn default() -> Self {
        Self {
            use_color: true,
            show_legend: true,
            show_fog: true,
        }
    }
}

impl AsciiConfig {
    /// Plain text, no escapes.
    pub fn plain() -> Self {
        Self {
            use_color: false,
            ..Self::default()
        }
    }
}

/// ANSI color codes.
mod colors {
    pub const RESET: &str = "\x1b[0m";
    pub const BOLD: &str = "\x1b[1m";
    pub const DIM: &str = "\x1b[2m";

    pub const CYAN: &str = "\x1b[36m";
    pub const RED: &str = "\x1b[31m";
    pub const YELLOW: &str = "\x1b[33m";
    pub const GREEN: &str = "\x1b[32m";
    pub const GRAY: &str = "\x1b[90m";
}

fn cell_color(cell: Cell) -> &'static str {
    match cell {
        Cell::Wall => colors::GRAY,
        Cell::Floor => "",
        Cell::Hero => colors::YELLOW,
        Cell::Enemy => colors::RED,
        Cell::HealthPotion => colors::GREEN,
        Cell::WeaponPickup => colors::CYAN,
    }
}

fn health_color(hp: i32, max_hp: i32) -> &'static str {
    let percent = hp * 100 / max_hp.max(1);
    if percent > 66 {
        colors::GREEN
    } else if percent > 33 {
        colors::YELLOW
    } else {
        colors::RED
    }
}

/// Glyph and color for one cell of the window.
fn cell_style(cell: Cell, lit: bool, config: &AsciiConfig) -> (char, String) {
    let fogged = config.show_fog && !lit;
    let shown = if fogged && cell == Cell::Enemy {
        Cell::Floor
    } else {
        cell
    };

    let color = if !config.use_color {
        String::new()
    } else if fogged {
        format!("{}{}", colors::DIM, cell_color(shown))
    } else if shown == Cell::Hero {
        format!("{}{}", colors::BOLD, colors::YELLOW)
    } else {
        cell_color(shown).to_string()
    };

    (shown.glyph(), color)
}

/// Render a snapshot as an ASCII frame.
pub fn render_frame(snapshot: &Snapshot, config: &AsciiConfig) -> String {
    let mut output = String::new();
    let (bold, reset) = if config.use_color {
        (colors::BOLD, colors::RESET)
    } else {
        ("", "")
    };

    let Some(window) = snapshot.window else {
        let banner = match snapshot.status {
            GameStatus::GameOver => "GAME OVER",
            GameStatus::Inert => "NO HERO",
            GameStatus::Playing => "PLAYING",
        };
        let _ = writeln!(output, "{bold}╔══ {banner} │ Tick: {} ══╗{reset}", snapshot.tick);
        let _ = writeln!(
            output,
            "║ Kills: {} │ Enemy ticks: {} │ Damage taken: {}",
            snapshot.stats.total_kills(),
            snapshot.stats.enemy_ticks,
            snapshot.stats.damage_taken
        );
        return output;
    };

    let width = usize::try_from(window.width()).unwrap_or(0);
    let _ = writeln!(output, "{bold}╔══ Tick: {} ══╗{reset}", snapshot.tick);

    output.push('║');
    output.push_str(&"═".repeat(width));
    output.push_str("║\n");

    for y in window.min_y..window.max_y {
        output.push('║');
        for x in window.min_x..window.max_x {
            let pos = Position::new(x, y);
            let cell = snapshot.grid.get(pos).unwrap_or_default();
            let (ch, color) = cell_style(cell, snapshot.visibility.is_visible(pos), config);
            if color.is_empty() {
                output.push(ch);
            } else {
                output.push_str(&color);
                output.push(ch);
                output.push_str(colors::RESET);
            }
        }
        output.push_str("║\n");
    }

    output.push('║');
    output.push_str(&"═".repeat(width));
    output.push_str("║\n");

    if config.show_legend {
        render_legend(&mut output, snapshot, config);
    }

    output.push('╚');
    output.push_str(&"═".repeat(width));
    output.push_str("╝\n");

    output
}

fn render_legend(output: &mut String, snapshot: &Snapshot, config: &AsciiConfig) {
    let reset = if config.use_color { colors::RESET } else { "" };

    if let Some(hero) = snapshot.hero {
        let color = if config.use_color {
            health_color(hero.hp, hero.max_hp)
        } else {
            ""
        };
        let _ = writeln!(
            output,
            "║ HP {color}{}/{}{reset} │ Sword: {} │ Enemies: {}",
            hero.hp, hero.max_hp, hero.bonus_attack_turns, snapshot.enemies_remaining
        );
    }

    for enemy in &snapshot.enemies {
        let color = if config.use_color {
            health_color(enemy.hp, enemy.max_hp)
        } else {
            ""
        };
        let _ = writeln!(
            output,
            "║ E ({}, {}) {color}{}/{}{reset}",
            enemy.x, enemy.y, enemy.hp, enemy.max_hp
        );
    }

    let _ = writeln!(output, "║ @=Hero E=Enemy !=Potion /=Sword #=Wall");
}
