/// Enemy spawner: places agents on the level's spawn points.
///
/// Each agent gets its own RNG stream (`seed + id`), a respawn anchor at
/// its spawn point and the nearest player as target.

use glam::Vec2;

use crate::config::EnemyConfig;
use crate::domain::ai::{AiKind, Brain};
use crate::domain::entity::{Enemy, Player, PlayerId};

#[derive(Clone, Debug)]
pub struct Spawner {
    pub points: Vec<Vec2>,
    pub max_enemies: usize,
    pub kind: AiKind,
    seed: u64,
}

impl Spawner {
    pub fn new(points: Vec<Vec2>, max_enemies: usize, kind: AiKind, seed: u64) -> Self {
        Spawner { points, max_enemies, kind, seed }
    }

    /// One agent per spawn point, up to `max_enemies`. Returns the new ids.
    pub fn spawn_all(&self, enemies: &mut Vec<Enemy>, players: &[Player], cfg: &EnemyConfig, now: f32) -> Vec<usize> {
        if self.points.is_empty() {
            log::warn!("spawner: level has no enemy spawn points");
            return vec![];
        }
        let ids: Vec<usize> = self
            .points
            .iter()
            .take(self.max_enemies)
            .filter_map(|&p| self.spawn_at(enemies, players, cfg, p, now))
            .collect();
        log::info!("spawner: {} {:?} enemies", ids.len(), self.kind);
        ids
    }

    /// Spawn one agent at `pos` unless the live cap is reached.
    pub fn spawn_at(
        &self,
        enemies: &mut Vec<Enemy>,
        players: &[Player],
        cfg: &EnemyConfig,
        pos: Vec2,
        now: f32,
    ) -> Option<usize> {
        if alive_count(enemies) >= self.max_enemies {
            log::debug!("spawner: cap of {} reached", self.max_enemies);
            return None;
        }
        let id = enemies.len();
        let brain = Brain::new(self.kind, &cfg.params, self.seed.wrapping_add(id as u64), now, pos);
        let mut enemy = Enemy::new(id, pos, brain, cfg.gravity_scale);
        enemy.target = nearest_player(players, pos);
        if enemy.target.is_none() {
            log::warn!("enemy {id}: no player to target");
        }
        if cfg.ground_check_offset.is_none() {
            log::warn!("enemy {id}: ground check not configured, grounded sensing disabled");
        }
        enemies.push(enemy);
        Some(id)
    }

    /// Remove every agent.
    pub fn clear_all(&self, enemies: &mut Vec<Enemy>) {
        enemies.clear();
    }

    pub fn respawn_all(&self, enemies: &mut Vec<Enemy>, players: &[Player], cfg: &EnemyConfig, now: f32) -> Vec<usize> {
        self.clear_all(enemies);
        self.spawn_all(enemies, players, cfg, now)
    }
}

/// Agents that are not Dead (trapped ones still count).
pub fn alive_count(enemies: &[Enemy]) -> usize {
    enemies.iter().filter(|e| !e.is_dead()).count()
}

pub fn nearest_player(players: &[Player], from: Vec2) -> Option<PlayerId> {
    players
        .iter()
        .enumerate()
        .min_by(|(_, a), (_, b)| a.pos.distance_squared(from).total_cmp(&b.pos.distance_squared(from)))
        .map(|(i, _)| PlayerId(i))
}
