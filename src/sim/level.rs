/// Level loader.
///
/// ## Sources (priority order):
///   1. `[sim] level` path from config.toml
///   2. Built-in embedded level
///
/// ## Format (`.txt`):
///   Optional line 1: `# Level Name`
///   Lines: map rows, top row first
///
/// Each character is a 1×1 tile centred at `(col, height - 1 - row)`,
/// so +y is up and the bottom row sits at y = 0.
///
/// ## Tile legend:
///   '#' = Brick (diggable ground)   '=' = Concrete (ground, not diggable)
///   '%' = Hard brick (a block that refuses to be dug)
///   'X' = Obstacle wall             'H' = Ladder
///   '-' = Rope                      '$' = Gold
///   'K' = Key                       'D' = Exit door
///   'P' = Player spawn              'E' = Enemy spawn
///   ' ' / '.' = Empty

use std::path::Path;

use glam::Vec2;

use crate::config::GameConfig;
use crate::domain::entity::{Pickup, PickupKind, Player};
use crate::domain::physics::Aabb;
use crate::domain::tile::Layer;
use crate::error::LevelError;
use super::event::GameEvent;
use super::progress::Progress;
use super::world::{WorldState, TILE_HALF};

/// Parsed level text (owned rows, padded to equal width).
#[derive(Clone, Debug)]
pub struct LevelDef {
    pub name: String,
    pub rows: Vec<String>,
}

// ══════════════════════════════════════════════════════════════
// Public API
// ══════════════════════════════════════════════════════════════

pub fn load_level_file(path: &Path) -> Result<LevelDef, LevelError> {
    let content = std::fs::read_to_string(path).map_err(|source| LevelError::Io { path: path.to_path_buf(), source })?;
    let def = parse_level(&content)?;
    log::info!("level: {} ({})", def.name, path.display());
    Ok(def)
}

/// Build a ready-to-run world: terrain, pickups, player(s), enemies.
pub fn build_world(def: &LevelDef, config: &GameConfig) -> Result<(WorldState, Vec<GameEvent>), LevelError> {
    let mut world = WorldState::new(config);
    world.level_name = def.name.clone();
    world.height = def.rows.len();
    world.width = def.rows.iter().map(|r| r.chars().count()).max().unwrap_or(0);

    let mut spawn_points = vec![];
    let top = world.height as f32 - 1.0;

    for (row, line) in def.rows.iter().enumerate() {
        for (col, ch) in line.chars().enumerate() {
            let pos = Vec2::new(col as f32, top - row as f32);
            match ch {
                '#' => {
                    world.add_block(pos);
                }
                '%' => {
                    let b = world.add_block(pos);
                    world.blocks[b].set_diggable(false);
                }
                '=' => {
                    world.add_terrain(Layer::Ground, pos);
                }
                'X' => {
                    world.add_terrain(Layer::Obstacle, pos);
                }
                'H' => {
                    world.add_terrain(Layer::Ladder, pos);
                }
                '-' => {
                    world.add_terrain(Layer::Rope, pos);
                }
                '$' => world.pickups.push(Pickup::new(PickupKind::Gold, pos)),
                'K' => world.pickups.push(Pickup::new(PickupKind::Key, pos)),
                'D' => {
                    if world.exit.is_some() {
                        log::warn!("level: extra exit at row {row}, column {col} ignored");
                    } else {
                        world.exit = Some(Aabb::new(pos, TILE_HALF));
                    }
                }
                'P' => world.players.push(Player::new(pos)),
                'E' => spawn_points.push(pos),
                ' ' | '.' => {}
                _ => return Err(LevelError::UnknownTile { ch, row, col }),
            }
        }
    }

    if world.players.is_empty() {
        return Err(LevelError::NoPlayer);
    }
    if world.exit.is_none() {
        log::warn!("level: no exit ('D'), the level cannot be completed");
    }

    let gold = world.pickups.iter().filter(|p| p.kind == PickupKind::Gold).count();
    world.progress = Progress::new(config.level.clone(), gold);
    world.spawner.points = spawn_points;
    let events = world.spawn_enemies();

    log::info!(
        "level: {}x{} tiles, {} blocks, {} gold, {} players, {} enemies",
        world.width,
        world.height,
        world.blocks.len(),
        gold,
        world.players.len(),
        world.enemies.len(),
    );
    Ok((world, events))
}

// ══════════════════════════════════════════════════════════════
// Parsing
// ══════════════════════════════════════════════════════════════

/// Parse a single level from text content. Tiles are validated here so
/// errors point at the row as written.
pub fn parse_level(content: &str) -> Result<LevelDef, LevelError> {
    let mut name = String::new();
    let mut rows: Vec<String> = vec![];

    for line in content.lines() {
        if line.starts_with('#') && name.is_empty() && rows.is_empty() && is_name_line(line) {
            name = line[1..].trim().to_string();
        } else {
            rows.push(line.trim_end_matches('\r').to_string());
        }
    }

    while rows.last().map_or(false, |r| r.trim().is_empty()) {
        rows.pop();
    }
    while rows.first().map_or(false, |r| r.trim().is_empty()) {
        rows.remove(0);
    }

    if rows.is_empty() {
        return Err(LevelError::Empty);
    }

    for (row, line) in rows.iter().enumerate() {
        if let Some((col, ch)) = line.chars().enumerate().find(|(_, c)| !is_tile_char(*c)) {
            return Err(LevelError::UnknownTile { ch, row, col });
        }
    }

    let max_width = rows.iter().map(|r| r.chars().count()).max().unwrap_or(0);
    for row in &mut rows {
        let len = row.chars().count();
        if len < max_width {
            row.extend(std::iter::repeat(' ').take(max_width - len));
        }
    }

    if name.is_empty() {
        name = "Unnamed Level".to_string();
    }

    Ok(LevelDef { name, rows })
}

/// Distinguish `# Level Name` from `####====` (level data).
/// A name line starts with `#` and contains at least one letter other
/// than the tile letters.
fn is_name_line(line: &str) -> bool {
    line[1..].chars().any(|c| c.is_alphabetic() && !is_tile_char(c))
}

fn is_tile_char(c: char) -> bool {
    matches!(c, '#' | '%' | '=' | 'X' | 'H' | '-' | '$' | 'K' | 'D' | 'P' | 'E' | ' ' | '.')
}

// ══════════════════════════════════════════════════════════════
// Embedded fallback level
// ══════════════════════════════════════════════════════════════

pub fn builtin_level() -> LevelDef {
    LevelDef {
        name: "Level 1 - Dig In".to_string(),
        rows: BUILTIN_MAP.iter().map(|s| s.to_string()).collect(),
    }
}

const BUILTIN_MAP: &[&str] = &[
    "                        ",
    " D    $     E      K    ",
    "===H#########=====###H==",
    "   H                 H  ",
    "   H   $    E    $   H  ",
    "####H#######XX######H###",
    "    H   ----------  H   ",
    "    H               H   ",
    "  P H  $    E     $ H   ",
    "========================",
];
