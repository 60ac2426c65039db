/// WorldState: the complete snapshot of a running level.
///
/// ## Collider Architecture
///
/// Terrain is a flat list of unit-tile colliders built once at load:
///   - `terrain[i].enabled` is the only runtime mutation (dug blocks).
///   - Diggable blocks own their collider by index (`block.collider`).
///   - `block_of` maps a collider index back to its block.
///
/// Enemy and player bodies are exposed to queries as colliders too
/// (layers Enemy / Player); dead bodies are invisible.
///
/// ## Triggers
///
/// The host calls the two notifications:
///   - `notify_fell_into_hole(enemy)`  → agent becomes StuckInHole
///   - `notify_terrain_restored(block)` → collider back on, crush overlaps
///
/// ## Snapshot legend
///
/// `snapshot_rows` draws the level alphabet plus the live bodies:
///   'P' player   'E' enemy   'T' trapped enemy   (dead bodies are hidden)
///   Open holes are blank, blinking back in during their warning phase.

use glam::Vec2;
use rustc_hash::FxHashMap;

use crate::config::{EnemyConfig, GameConfig, PlayerConfig};
use crate::domain::entity::{DiggableBlock, Enemy, Pickup, PickupKind, Player, PlayerId};
use crate::domain::physics::{closest_hit, Aabb, ColliderId, ColliderRef, RayHit, SpatialQuery};
use crate::domain::tile::{Layer, LayerMask};
use super::event::GameEvent;
use super::progress::Progress;
use super::spawner::{self, Spawner};

pub const TILE_HALF: Vec2 = Vec2::splat(0.5);

#[derive(Clone, Copy, Debug)]
pub struct TerrainCollider {
    pub layer: Layer,
    pub bounds: Aabb,
    pub enabled: bool,
}

pub struct WorldState {
    // ── Terrain ──
    pub terrain: Vec<TerrainCollider>,
    pub blocks: Vec<DiggableBlock>,
    block_of: FxHashMap<usize, usize>,
    pub pickups: Vec<Pickup>,
    pub exit: Option<Aabb>,
    pub width: usize,
    pub height: usize,

    // ── Entities ──
    pub players: Vec<Player>,
    pub enemies: Vec<Enemy>,
    pub spawner: Spawner,

    // ── Game tracking ──
    pub progress: Progress,
    /// Some player stood in the exit last tick (edge-triggers the exit).
    pub exit_occupied: bool,

    // ── Tuning ──
    pub enemy_cfg: EnemyConfig,
    pub player_cfg: PlayerConfig,

    // ── Meta ──
    pub level_name: String,
    pub time: f32,
    pub tick: u64,
}

// ── Construction ──

impl WorldState {
    pub fn new(config: &GameConfig) -> Self {
        WorldState {
            terrain: vec![],
            blocks: vec![],
            block_of: FxHashMap::default(),
            pickups: vec![],
            exit: None,
            width: 0,
            height: 0,
            players: vec![],
            enemies: vec![],
            spawner: Spawner::new(vec![], config.level.max_enemies, config.enemy.ai, config.sim.seed),
            progress: Progress::new(config.level.clone(), 0),
            exit_occupied: false,
            enemy_cfg: config.enemy.clone(),
            player_cfg: config.player.clone(),
            level_name: String::new(),
            time: 0.0,
            tick: 0,
        }
    }

    /// Add a unit-tile collider centred at `center`. Returns its index.
    pub fn add_terrain(&mut self, layer: Layer, center: Vec2) -> usize {
        self.terrain.push(TerrainCollider { layer, bounds: Aabb::new(center, TILE_HALF), enabled: true });
        self.terrain.len() - 1
    }

    /// Diggable brick: a Ground collider owned by a block.
    pub fn add_block(&mut self, center: Vec2) -> usize {
        let collider = self.add_terrain(Layer::Ground, center);
        self.blocks.push(DiggableBlock::new(collider, center));
        let idx = self.blocks.len() - 1;
        self.block_of.insert(collider, idx);
        idx
    }

    /// Populate enemies from the spawner's points.
    pub fn spawn_enemies(&mut self) -> Vec<GameEvent> {
        let ids = self.spawner.spawn_all(&mut self.enemies, &self.players, &self.enemy_cfg, self.time);
        ids.into_iter()
            .map(|id| GameEvent::EnemySpawned { id, pos: self.enemies[id].pos })
            .collect()
    }
}

// ── Queries ──

impl WorldState {
    pub fn alive_enemies(&self) -> usize {
        spawner::alive_count(&self.enemies)
    }

    /// Position of a living target.
    pub fn target_position(&self, target: Option<PlayerId>) -> Option<Vec2> {
        let p = self.players.get(target?.0)?;
        p.alive.then_some(p.pos)
    }

    /// Bounds of every enabled solid terrain collider.
    pub fn solid_boxes(&self) -> Vec<Aabb> {
        self.terrain
            .iter()
            .filter(|t| t.enabled && t.layer.is_solid())
            .map(|t| t.bounds)
            .collect()
    }

    /// Block owning a terrain collider, if any.
    pub fn block_for_collider(&self, collider: usize) -> Option<usize> {
        self.block_of.get(&collider).copied()
    }

    /// Open hole whose cell contains `point`.
    pub fn dug_block_at(&self, point: Vec2) -> Option<usize> {
        self.blocks
            .iter()
            .position(|b| b.is_dug() && Aabb::new(b.pos, TILE_HALF).contains_point(point))
    }

    fn colliders(&self, mask: LayerMask) -> impl Iterator<Item = ColliderRef> + '_ {
        let terrain = self
            .terrain
            .iter()
            .enumerate()
            .filter(move |(_, t)| t.enabled && mask.contains(t.layer))
            .map(|(i, t)| ColliderRef { id: ColliderId::Terrain(i), layer: t.layer, bounds: t.bounds });
        let enemies = self
            .enemies
            .iter()
            .enumerate()
            .filter(move |(_, e)| e.collider_enabled && mask.contains(Layer::Enemy))
            .map(|(i, e)| ColliderRef { id: ColliderId::Enemy(i), layer: Layer::Enemy, bounds: Aabb::new(e.pos, e.half) });
        let players = self
            .players
            .iter()
            .enumerate()
            .filter(move |(_, p)| p.alive && mask.contains(Layer::Player))
            .map(|(i, p)| ColliderRef { id: ColliderId::Player(i), layer: Layer::Player, bounds: Aabb::new(p.pos, p.half) });
        terrain.chain(enemies).chain(players)
    }
}

impl SpatialQuery for WorldState {
    fn overlap_region(&self, center: Vec2, half_extents: Vec2, mask: LayerMask) -> Option<ColliderRef> {
        let region = Aabb::new(center, half_extents);
        self.colliders(mask).find(|c| c.bounds.overlaps(&region))
    }

    fn overlap_circle(&self, center: Vec2, radius: f32, mask: LayerMask) -> Vec<ColliderRef> {
        self.colliders(mask).filter(|c| c.bounds.intersects_circle(center, radius)).collect()
    }

    fn raycast(&self, origin: Vec2, direction: Vec2, max_distance: f32, mask: LayerMask) -> Option<RayHit> {
        closest_hit(origin, direction, max_distance, self.colliders(mask))
    }
}

// ── Holes ──

impl WorldState {
    /// Open a block. Returns false if it is not diggable or already open.
    pub fn dig_block(&mut self, block: usize, restore_time: Option<f32>) -> bool {
        let Some(b) = self.blocks.get_mut(block) else { return false };
        if !b.dig(restore_time) {
            return false;
        }
        if let Some(t) = self.terrain.get_mut(b.collider) {
            t.enabled = false;
        }
        log::debug!("hole dug at ({:.1}, {:.1})", b.pos.x, b.pos.y);
        true
    }

    /// Trigger: an enemy's centre entered an open hole.
    pub fn notify_fell_into_hole(&mut self, enemy: usize, events: &mut Vec<GameEvent>) {
        let Some(e) = self.enemies.get_mut(enemy) else { return };
        if e.stuck_in_hole() {
            log::debug!("enemy {enemy} trapped at ({:.2}, {:.2})", e.pos.x, e.pos.y);
            events.push(GameEvent::EnemyTrapped { id: enemy });
        }
    }

    /// Trigger: a block became Intact. Re-enables its collider and kills
    /// every enemy and player overlapping it, in this call.
    pub fn notify_terrain_restored(&mut self, block: usize, events: &mut Vec<GameEvent>) {
        let Some(b) = self.blocks.get(block) else { return };
        let (collider, pos) = (b.collider, b.pos);
        let bounds = Aabb::new(pos, TILE_HALF);
        if let Some(t) = self.terrain.get_mut(collider) {
            t.enabled = true;
        }
        events.push(GameEvent::HoleRestored { block, pos });

        let (now, delay) = (self.time, self.enemy_cfg.respawn_delay);
        for e in self.enemies.iter_mut() {
            if e.collider_enabled && bounds.overlaps(&Aabb::new(e.pos, e.half)) && e.die(now, delay) {
                log::debug!("enemy {} crushed", e.id);
                self.progress.enemy_crushed();
                events.push(GameEvent::EnemyKilled { id: e.id, crushed: true });
            }
        }

        let delay = self.player_cfg.respawn_delay;
        for (i, p) in self.players.iter_mut().enumerate() {
            if p.alive && bounds.overlaps(&Aabb::new(p.pos, p.half)) && p.die(now, delay) {
                log::debug!("player {i} crushed");
                events.push(GameEvent::PlayerKilled { player: PlayerId(i) });
            }
        }
    }
}

// ── Reset ──

impl WorldState {
    /// Restart the level in place: holes closed, pickups back, players at
    /// their spawns, enemies rebuilt from the spawn points, progress cleared.
    /// Clock and tick keep running.
    pub fn reset_level(&mut self) -> Vec<GameEvent> {
        for b in self.blocks.iter_mut() {
            if b.instant_restore() {
                if let Some(t) = self.terrain.get_mut(b.collider) {
                    t.enabled = true;
                }
            }
        }
        for k in self.pickups.iter_mut() {
            k.collected = false;
        }
        for p in self.players.iter_mut() {
            p.respawn();
            p.last_dig = None;
        }
        self.exit_occupied = false;

        let gold = self.pickups.iter().filter(|k| k.kind == PickupKind::Gold).count();
        self.progress.reset_level(gold);

        let ids = self.spawner.respawn_all(&mut self.enemies, &self.players, &self.enemy_cfg, self.time);
        log::info!("level \"{}\" reset", self.level_name);

        let mut events = vec![GameEvent::LevelReset];
        events.extend(ids.into_iter().map(|id| GameEvent::EnemySpawned { id, pos: self.enemies[id].pos }));
        events
    }
}

// ── Snapshot ──

impl WorldState {
    /// ASCII picture of the world, top row first.
    pub fn snapshot_rows(&self) -> Vec<String> {
        let (width, height) = (self.width as i32, self.height as i32);
        let mut grid = vec![vec![' '; self.width]; self.height];
        let mut put = |pos: Vec2, ch: char| {
            let col = pos.x.round() as i32;
            let row = height - 1 - pos.y.round() as i32;
            if (0..width).contains(&col) && (0..height).contains(&row) {
                grid[row as usize][col as usize] = ch;
            }
        };

        for (i, t) in self.terrain.iter().enumerate() {
            if self.block_for_collider(i).is_some() {
                continue;
            }
            let ch = match t.layer {
                Layer::Ground => '=',
                Layer::Obstacle => 'X',
                Layer::Ladder => 'H',
                Layer::Rope => '-',
                Layer::Enemy | Layer::Player => continue,
            };
            put(t.bounds.center, ch);
        }
        for b in self.blocks.iter().filter(|b| b.blink_visible()) {
            put(b.pos, if b.is_diggable() { '#' } else { '%' });
        }
        if let Some(exit) = self.exit {
            put(exit.center, 'D');
        }
        for k in self.pickups.iter().filter(|k| !k.collected) {
            put(k.pos, if k.kind == PickupKind::Gold { '$' } else { 'K' });
        }
        for p in self.players.iter().filter(|p| p.alive) {
            put(p.pos, 'P');
        }
        for e in self.enemies.iter().filter(|e| !e.is_dead()) {
            put(e.pos, if e.is_trapped() { 'T' } else { 'E' });
        }

        grid.into_iter().map(|row| row.into_iter().collect()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ai::{AiKind, AiParams, Brain};
    use crate::domain::entity::{EnemyState, DEFAULT_GRAVITY_SCALE};

    fn world() -> WorldState {
        let mut w = WorldState::new(&GameConfig::default());
        for x in 0..5 {
            w.add_block(Vec2::new(x as f32, 0.0));
        }
        w.add_terrain(Layer::Ladder, Vec2::new(5.0, 1.0));
        w
    }

    fn enemy_at(w: &mut WorldState, pos: Vec2) -> usize {
        let brain = Brain::new(AiKind::Greedy, &AiParams::default(), 0, 0.0, pos);
        let id = w.enemies.len();
        w.enemies.push(Enemy::new(id, pos, brain, DEFAULT_GRAVITY_SCALE));
        id
    }

    #[test]
    fn dug_block_is_invisible_to_queries() {
        let mut w = world();
        let spot = Vec2::new(2.0, 0.0);
        assert!(w.overlap_region(spot, Vec2::splat(0.1), LayerMask::GROUND).is_some());
        assert!(w.dig_block(2, Some(5.0)));
        assert!(w.overlap_region(spot, Vec2::splat(0.1), LayerMask::GROUND).is_none());
        assert!(!w.dig_block(2, Some(5.0)));
        assert_eq!(w.dug_block_at(spot), Some(2));
        assert_eq!(w.solid_boxes().len(), 4);
    }

    #[test]
    fn bodies_are_queryable_by_layer() {
        let mut w = world();
        let id = enemy_at(&mut w, Vec2::new(1.0, 0.95));
        let hits = w.overlap_circle(Vec2::new(1.0, 1.0), 0.2, LayerMask::ENEMY);
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].id, ColliderId::Enemy(id));
        assert!(w.overlap_circle(Vec2::new(1.0, 1.0), 0.2, LayerMask::SOLID).is_empty());

        w.enemies[id].die(0.0, 2.0);
        assert!(w.overlap_circle(Vec2::new(1.0, 1.0), 0.2, LayerMask::ENEMY).is_empty());
    }

    #[test]
    fn raycast_finds_nearest_ground() {
        let w = world();
        let hit = w.raycast(Vec2::new(3.0, 2.0), Vec2::NEG_Y, 5.0, LayerMask::SOLID).unwrap();
        assert!((hit.distance - 1.5).abs() < 1e-5);
        assert_eq!(hit.collider, ColliderId::Terrain(3));
        let ladder = w.raycast(Vec2::new(3.0, 1.0), Vec2::X, 5.0, LayerMask::LADDER).unwrap();
        assert!((ladder.distance - 1.5).abs() < 1e-5);
    }

    #[test]
    fn falling_into_hole_is_idempotent() {
        let mut w = world();
        let id = enemy_at(&mut w, Vec2::new(2.0, 0.0));
        let mut events = vec![];
        w.notify_fell_into_hole(id, &mut events);
        w.notify_fell_into_hole(id, &mut events);
        assert_eq!(events, vec![GameEvent::EnemyTrapped { id }]);
        assert_eq!(w.enemies[id].state, EnemyState::StuckInHole);
    }

    #[test]
    fn restore_crushes_overlapping_bodies() {
        let mut w = world();
        w.dig_block(2, Some(5.0));
        let trapped = enemy_at(&mut w, Vec2::new(2.0, -0.05));
        let bystander = enemy_at(&mut w, Vec2::new(3.0, 0.95));
        w.players.push(Player::new(Vec2::new(2.0, 0.3)));
        let mut events = vec![];
        w.notify_fell_into_hole(trapped, &mut events);

        w.blocks[2].instant_restore();
        w.notify_terrain_restored(2, &mut events);

        assert!(w.enemies[trapped].is_dead());
        assert!(!w.enemies[bystander].is_dead());
        assert!(!w.players[0].alive);
        assert_eq!(w.progress.score, 50);
        assert!(events.contains(&GameEvent::EnemyKilled { id: trapped, crushed: true }));
        assert!(events.contains(&GameEvent::PlayerKilled { player: PlayerId(0) }));
        assert!(w.overlap_region(Vec2::new(2.0, 0.0), Vec2::splat(0.1), LayerMask::GROUND).is_some());
    }

    #[test]
    fn dead_player_is_not_a_target() {
        let mut w = world();
        w.players.push(Player::new(Vec2::new(1.0, 1.0)));
        assert_eq!(w.target_position(Some(PlayerId(0))), Some(Vec2::new(1.0, 1.0)));
        assert_eq!(w.target_position(Some(PlayerId(3))), None);
        w.players[0].die(0.0, 2.0);
        assert_eq!(w.target_position(Some(PlayerId(0))), None);
        assert_eq!(w.target_position(None), None);
    }

    #[test]
    fn block_lookup_by_collider() {
        let w = world();
        let b = &w.blocks[4];
        assert_eq!(w.block_for_collider(b.collider), Some(4));
        assert_eq!(w.block_for_collider(5), None);
        assert_eq!(b.pos, Vec2::new(4.0, 0.0));
    }
}
