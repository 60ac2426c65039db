/// External configuration loader.
///
/// Reads `config.toml` from the executable's directory (or CWD).
/// Falls back to sensible defaults if the file is missing or incomplete.

use serde::Deserialize;
use std::path::PathBuf;

use crate::domain::ai::{AiKind, AiParams};
use crate::domain::rules::{PlayerSpeeds, Speeds};
use crate::domain::steering::Separation;

// ── Public Config Struct ──

#[derive(Clone, Debug)]
pub struct GameConfig {
    pub sim: SimConfig,
    pub enemy: EnemyConfig,
    pub player: PlayerConfig,
    pub level: LevelConfig,
}

#[derive(Clone, Debug)]
pub struct SimConfig {
    pub tick_rate_ms: u64,
    pub run_seconds: f32,
    /// Times the level is played; the world is reset between rounds.
    pub rounds: u32,
    pub seed: u64,
    /// Level file; `None` runs the built-in level.
    pub level_path: Option<PathBuf>,
}

impl SimConfig {
    pub fn dt(&self) -> f32 {
        self.tick_rate_ms.max(1) as f32 / 1000.0
    }
}

#[derive(Clone, Debug)]
pub struct EnemyConfig {
    pub walk_speed: f32,
    pub climb_speed: f32,
    pub gravity_scale: f32,
    pub ai: AiKind,
    pub params: AiParams,
    pub separation: Option<Separation>,
    pub stuck_in_hole_time: f32,
    pub respawn_delay: f32,
    /// Feet check offset below the body centre; `None` disables ground sensing.
    pub ground_check_offset: Option<f32>,
    pub ground_check_radius: f32,
}

impl EnemyConfig {
    pub fn speeds(&self) -> Speeds {
        Speeds { walk: self.walk_speed, climb: self.climb_speed }
    }
}

#[derive(Clone, Debug)]
pub struct PlayerConfig {
    pub walk_speed: f32,
    pub climb_speed: f32,
    pub rope_speed: f32,
    pub dig_range: f32,
    pub dig_cooldown: f32,
    pub hole_restore_time: f32,
    pub respawn_delay: f32,
}

impl PlayerConfig {
    pub fn speeds(&self) -> PlayerSpeeds {
        PlayerSpeeds { walk: self.walk_speed, climb: self.climb_speed, rope: self.rope_speed }
    }
}

#[derive(Clone, Debug)]
pub struct LevelConfig {
    pub require_all_gold: bool,
    pub require_key: bool,
    pub max_enemies: usize,
    pub gold_score: u32,
    pub key_score: u32,
    pub crush_score: u32,
}

// ── TOML Schema (with serde defaults) ──

#[derive(Deserialize, Debug, Default)]
struct TomlConfig {
    #[serde(default)]
    sim: TomlSim,
    #[serde(default)]
    enemy: TomlEnemy,
    #[serde(default)]
    player: TomlPlayer,
    #[serde(default)]
    level: TomlLevel,
}

#[derive(Deserialize, Debug)]
struct TomlSim {
    #[serde(default = "default_tick_rate")]
    tick_rate_ms: u64,
    #[serde(default = "default_run_seconds")]
    run_seconds: f32,
    #[serde(default = "default_rounds")]
    rounds: u32,
    #[serde(default)]
    seed: u64,
    #[serde(default)]
    level: String,
}

#[derive(Deserialize, Debug)]
struct TomlEnemy {
    #[serde(default = "default_enemy_walk")]
    walk_speed: f32,
    #[serde(default = "default_enemy_climb")]
    climb_speed: f32,
    #[serde(default = "default_gravity_scale")]
    gravity_scale: f32,
    #[serde(default = "default_ai")]
    ai: String,
    #[serde(default)]
    use_pathfinding: bool,
    #[serde(default = "default_max_path_length")]
    max_path_length: usize,
    #[serde(default = "default_detection_range")]
    detection_range: f32,
    #[serde(default = "default_update_interval")]
    update_path_interval: f32,
    #[serde(default = "default_alignment_threshold")]
    alignment_threshold: f32,
    #[serde(default = "default_vertical_threshold")]
    vertical_distance_threshold: f32,
    #[serde(default = "default_ladder_search_radius")]
    ladder_search_radius: f32,
    #[serde(default = "default_stuck_check_interval")]
    stuck_check_interval: f32,
    #[serde(default = "default_min_stuck_distance")]
    min_stuck_distance: f32,
    #[serde(default = "default_wander_min")]
    wander_min_time: f32,
    #[serde(default = "default_wander_max")]
    wander_max_time: f32,
    #[serde(default = "default_true")]
    always_moving: bool,
    #[serde(default = "default_true")]
    separation: bool,
    #[serde(default = "default_separation_radius")]
    separation_radius: f32,
    #[serde(default = "default_separation_force")]
    separation_force: f32,
    #[serde(default = "default_stuck_in_hole")]
    stuck_in_hole_time: f32,
    #[serde(default = "default_respawn_delay")]
    respawn_delay: f32,
    #[serde(default = "default_true")]
    ground_check: bool,
    #[serde(default = "default_ground_check_offset")]
    ground_check_offset: f32,
    #[serde(default = "default_ground_check_radius")]
    ground_check_radius: f32,
}

#[derive(Deserialize, Debug)]
struct TomlPlayer {
    #[serde(default = "default_player_walk")]
    walk_speed: f32,
    #[serde(default = "default_player_climb")]
    climb_speed: f32,
    #[serde(default = "default_rope_speed")]
    rope_speed: f32,
    #[serde(default = "default_dig_range")]
    dig_range: f32,
    #[serde(default = "default_dig_cooldown")]
    dig_cooldown: f32,
    #[serde(default = "default_hole_restore")]
    hole_restore_time: f32,
    #[serde(default = "default_respawn_delay")]
    respawn_delay: f32,
}

#[derive(Deserialize, Debug)]
struct TomlLevel {
    #[serde(default = "default_true")]
    require_all_gold: bool,
    #[serde(default = "default_true")]
    require_key: bool,
    #[serde(default = "default_max_enemies")]
    max_enemies: usize,
    #[serde(default = "default_gold_score")]
    gold_score: u32,
    #[serde(default = "default_key_score")]
    key_score: u32,
    #[serde(default = "default_crush_score")]
    crush_score: u32,
}

// ── Defaults ──

fn default_true() -> bool { true }

fn default_tick_rate() -> u64 { 20 }     // 50 Hz physics
fn default_run_seconds() -> f32 { 20.0 }
fn default_rounds() -> u32 { 1 }

fn default_enemy_walk() -> f32 { 3.0 }
fn default_enemy_climb() -> f32 { 2.0 }
fn default_gravity_scale() -> f32 { 3.0 }
fn default_ai() -> String { "greedy".into() }
fn default_max_path_length() -> usize { 50 }
fn default_detection_range() -> f32 { 15.0 }
fn default_update_interval() -> f32 { 0.5 }
fn default_alignment_threshold() -> f32 { 0.3 }
fn default_vertical_threshold() -> f32 { 2.0 }
fn default_ladder_search_radius() -> f32 { 5.0 }
fn default_stuck_check_interval() -> f32 { 1.0 }
fn default_min_stuck_distance() -> f32 { 0.2 }
fn default_wander_min() -> f32 { 2.0 }
fn default_wander_max() -> f32 { 4.0 }
fn default_separation_radius() -> f32 { 0.6 }
fn default_separation_force() -> f32 { 2.0 }
fn default_stuck_in_hole() -> f32 { 3.0 }
fn default_respawn_delay() -> f32 { 2.0 }
fn default_ground_check_offset() -> f32 { -0.5 } // just under the feet
fn default_ground_check_radius() -> f32 { 0.2 }

fn default_player_walk() -> f32 { 5.0 }
fn default_player_climb() -> f32 { 3.0 }
fn default_rope_speed() -> f32 { 4.0 }
fn default_dig_range() -> f32 { 1.0 }
fn default_dig_cooldown() -> f32 { 0.5 }
fn default_hole_restore() -> f32 { 5.0 }

fn default_max_enemies() -> usize { 5 }
fn default_gold_score() -> u32 { 100 }
fn default_key_score() -> u32 { 250 }
fn default_crush_score() -> u32 { 50 }

impl Default for TomlSim {
    fn default() -> Self {
        TomlSim {
            tick_rate_ms: default_tick_rate(),
            run_seconds: default_run_seconds(),
            rounds: default_rounds(),
            seed: 0,
            level: String::new(),
        }
    }
}

impl Default for TomlEnemy {
    fn default() -> Self {
        TomlEnemy {
            walk_speed: default_enemy_walk(),
            climb_speed: default_enemy_climb(),
            gravity_scale: default_gravity_scale(),
            ai: default_ai(),
            use_pathfinding: false,
            max_path_length: default_max_path_length(),
            detection_range: default_detection_range(),
            update_path_interval: default_update_interval(),
            alignment_threshold: default_alignment_threshold(),
            vertical_distance_threshold: default_vertical_threshold(),
            ladder_search_radius: default_ladder_search_radius(),
            stuck_check_interval: default_stuck_check_interval(),
            min_stuck_distance: default_min_stuck_distance(),
            wander_min_time: default_wander_min(),
            wander_max_time: default_wander_max(),
            always_moving: true,
            separation: true,
            separation_radius: default_separation_radius(),
            separation_force: default_separation_force(),
            stuck_in_hole_time: default_stuck_in_hole(),
            respawn_delay: default_respawn_delay(),
            ground_check: true,
            ground_check_offset: default_ground_check_offset(),
            ground_check_radius: default_ground_check_radius(),
        }
    }
}

impl Default for TomlPlayer {
    fn default() -> Self {
        TomlPlayer {
            walk_speed: default_player_walk(),
            climb_speed: default_player_climb(),
            rope_speed: default_rope_speed(),
            dig_range: default_dig_range(),
            dig_cooldown: default_dig_cooldown(),
            hole_restore_time: default_hole_restore(),
            respawn_delay: default_respawn_delay(),
        }
    }
}

impl Default for TomlLevel {
    fn default() -> Self {
        TomlLevel {
            require_all_gold: true,
            require_key: true,
            max_enemies: default_max_enemies(),
            gold_score: default_gold_score(),
            key_score: default_key_score(),
            crush_score: default_crush_score(),
        }
    }
}

impl Default for GameConfig {
    fn default() -> Self {
        resolve(TomlConfig::default(), &[])
    }
}

// ── Loading ──

impl GameConfig {
    /// Load config from `config.toml`.
    /// Search order: (1) exe directory, (2) current working directory,
    /// (3) XDG data dir. Missing file or missing keys fall back to defaults.
    pub fn load() -> Self {
        let search_dirs = candidate_dirs();
        let toml_cfg = load_toml(&search_dirs);
        resolve(toml_cfg, &search_dirs)
    }

    /// Parse a config document; paths are resolved against the CWD only.
    #[cfg(test)]
    pub fn from_toml_str(text: &str) -> Result<Self, toml::de::Error> {
        let cfg = toml::from_str::<TomlConfig>(text)?;
        Ok(resolve(cfg, &[]))
    }
}

fn resolve(cfg: TomlConfig, search_dirs: &[PathBuf]) -> GameConfig {
    let e = cfg.enemy;

    let ai = AiKind::from_name(&e.ai).unwrap_or_else(|| {
        log::warn!("config: unknown enemy ai {:?}, using greedy", e.ai);
        AiKind::Greedy
    });

    let (wander_min_time, wander_max_time) = if e.wander_min_time <= e.wander_max_time {
        (e.wander_min_time, e.wander_max_time)
    } else {
        log::warn!("config: wander_min_time > wander_max_time, swapping");
        (e.wander_max_time, e.wander_min_time)
    };

    let params = AiParams {
        detection_range: e.detection_range,
        update_interval: e.update_path_interval,
        alignment_threshold: e.alignment_threshold,
        vertical_threshold: e.vertical_distance_threshold,
        ladder_search_radius: e.ladder_search_radius,
        stuck_check_interval: e.stuck_check_interval,
        min_stuck_distance: e.min_stuck_distance,
        wander_min_time,
        wander_max_time,
        always_moving: e.always_moving,
        use_pathfinding: e.use_pathfinding,
        max_path_length: e.max_path_length,
        ..AiParams::default()
    };

    GameConfig {
        sim: SimConfig {
            tick_rate_ms: cfg.sim.tick_rate_ms,
            run_seconds: cfg.sim.run_seconds,
            rounds: cfg.sim.rounds.max(1),
            seed: cfg.sim.seed,
            level_path: resolve_level_path(&cfg.sim.level, search_dirs),
        },
        enemy: EnemyConfig {
            walk_speed: e.walk_speed,
            climb_speed: e.climb_speed,
            gravity_scale: e.gravity_scale,
            ai,
            params,
            separation: e.separation.then_some(Separation { radius: e.separation_radius, force: e.separation_force }),
            stuck_in_hole_time: e.stuck_in_hole_time,
            respawn_delay: e.respawn_delay,
            ground_check_offset: e.ground_check.then_some(e.ground_check_offset),
            ground_check_radius: e.ground_check_radius,
        },
        player: PlayerConfig {
            walk_speed: cfg.player.walk_speed,
            climb_speed: cfg.player.climb_speed,
            rope_speed: cfg.player.rope_speed,
            dig_range: cfg.player.dig_range,
            dig_cooldown: cfg.player.dig_cooldown,
            hole_restore_time: cfg.player.hole_restore_time,
            respawn_delay: cfg.player.respawn_delay,
        },
        level: LevelConfig {
            require_all_gold: cfg.level.require_all_gold,
            require_key: cfg.level.require_key,
            max_enemies: cfg.level.max_enemies,
            gold_score: cfg.level.gold_score,
            key_score: cfg.level.key_score,
            crush_score: cfg.level.crush_score,
        },
    }
}

/// Empty = built-in level. Relative paths are looked up in the search
/// dirs, falling back to the path as given (relative to CWD).
fn resolve_level_path(level: &str, search_dirs: &[PathBuf]) -> Option<PathBuf> {
    let level = level.trim();
    if level.is_empty() {
        return None;
    }
    let path = PathBuf::from(level);
    if path.is_absolute() {
        return Some(path);
    }
    Some(
        search_dirs
            .iter()
            .map(|d| d.join(level))
            .find(|p| p.is_file())
            .unwrap_or(path),
    )
}

/// Candidate directories to search: exe dir + CWD + XDG data (deduplicated).
fn candidate_dirs() -> Vec<PathBuf> {
    let mut dirs = vec![];

    // 1. Directory of the running executable
    if let Ok(exe) = std::env::current_exe() {
        let resolved = exe.canonicalize().unwrap_or(exe);
        if let Some(parent) = resolved.parent() {
            dirs.push(parent.to_path_buf());
        }
    }

    // 2. Current working directory
    if let Ok(cwd) = std::env::current_dir() {
        if !dirs.iter().any(|d| d == &cwd) {
            dirs.push(cwd);
        }
    }

    // 3. XDG data home (~/.local/share/lodechase)
    if let Ok(home) = std::env::var("HOME") {
        let xdg = PathBuf::from(&home).join(".local/share/lodechase");
        if xdg.is_dir() && !dirs.iter().any(|d| d == &xdg) {
            dirs.push(xdg);
        }
    }

    if dirs.is_empty() {
        dirs.push(PathBuf::from("."));
    }

    dirs
}

/// Search for config.toml in candidate directories.
fn load_toml(search_dirs: &[PathBuf]) -> TomlConfig {
    for dir in search_dirs {
        let path = dir.join("config.toml");
        if path.exists() {
            match std::fs::read_to_string(&path) {
                Ok(text) => match toml::from_str::<TomlConfig>(&text) {
                    Ok(cfg) => {
                        log::info!("config: {}", path.display());
                        return cfg;
                    }
                    Err(e) => {
                        log::warn!("config.toml parse error: {e}; using default settings");
                        return TomlConfig::default();
                    }
                },
                Err(e) => {
                    log::warn!("could not read {}: {e}", path.display());
                }
            }
        }
    }
    TomlConfig::default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_document_gives_defaults() {
        let cfg = GameConfig::from_toml_str("").unwrap();
        assert_eq!(cfg.sim.tick_rate_ms, 20);
        assert_eq!(cfg.sim.rounds, 1);
        assert!(cfg.sim.level_path.is_none());
        assert_eq!(cfg.enemy.ai, AiKind::Greedy);
        assert_eq!(cfg.enemy.params, AiParams::default());
        assert_eq!(cfg.enemy.separation, Some(Separation::default()));
        assert_eq!(cfg.enemy.ground_check_offset, Some(-0.5));
        assert_eq!(cfg.player.dig_range, 1.0);
        assert_eq!(cfg.level.max_enemies, 5);
        assert!(cfg.level.require_key);
    }

    #[test]
    fn partial_sections_override_only_given_keys() {
        let cfg = GameConfig::from_toml_str(
            r#"
            [sim]
            seed = 42
            rounds = 3
            level = "levels/one.txt"

            [enemy]
            ai = "patrol"
            detection_range = 8.0
            separation = false
            ground_check = false
            "#,
        )
        .unwrap();
        assert_eq!(cfg.sim.seed, 42);
        assert_eq!(cfg.sim.rounds, 3);
        assert_eq!(cfg.sim.level_path, Some(PathBuf::from("levels/one.txt")));
        assert_eq!(cfg.enemy.ai, AiKind::Patrol);
        assert_eq!(cfg.enemy.params.detection_range, 8.0);
        assert_eq!(cfg.enemy.params.update_interval, 0.5);
        assert!(cfg.enemy.separation.is_none());
        assert!(cfg.enemy.ground_check_offset.is_none());
    }

    #[test]
    fn unknown_ai_falls_back_to_greedy() {
        let cfg = GameConfig::from_toml_str("[enemy]\nai = \"telepathic\"\n").unwrap();
        assert_eq!(cfg.enemy.ai, AiKind::Greedy);
    }

    #[test]
    fn inverted_wander_window_is_swapped() {
        let cfg = GameConfig::from_toml_str("[enemy]\nwander_min_time = 5.0\nwander_max_time = 1.0\n").unwrap();
        assert_eq!((cfg.enemy.params.wander_min_time, cfg.enemy.params.wander_max_time), (1.0, 5.0));
    }

    #[test]
    fn bad_types_are_an_error() {
        assert!(GameConfig::from_toml_str("[sim]\ntick_rate_ms = \"fast\"\n").is_err());
    }

    #[test]
    fn tick_rate_to_seconds() {
        let cfg = GameConfig::default();
        assert!((cfg.sim.dt() - 0.02).abs() < 1e-6);
    }
}
