/// The step function: advances the world by one tick.
///
/// Processing order:
///   Frame update
///     1. Players: respawn timer, sensing, dig, locomotion state
///     2. Enemies: respawn / hole timers, sensing, AI decision, locomotion state
///   Physics step
///     3. Separation steering (one snapshot, then applied)
///     4. Velocity from state, gravity, collision (players → enemies)
///     5. Hole triggers (enemy centre inside an open hole)
///     6. Block restore timers (warning edge, crush on restore)
///     7. Pickups, exit, enemy contact
///
/// Every environment check goes through `SpatialQuery`, the same view the
/// AI decides from. Gravity modes from the resolver:
///   On   → gravity_scale = base
///   Off  → gravity_scale = 0
///   Hold → gravity_scale = 0, vy = 0

use glam::Vec2;

use crate::domain::ai::{AiView, EnemyAi};
use crate::domain::entity::{
    Enemy, EnemyState, Facing, FrameInput, PickupKind, PlayerId, PlayerState, Senses, DEFAULT_GRAVITY_SCALE,
};
use crate::domain::physics::{Aabb, ColliderId, SpatialQuery};
use crate::domain::rules::{self, Gravity, FALL_ALIGN_SPEED};
use crate::domain::steering::Agent;
use crate::domain::tile::LayerMask;
use super::body;
use super::event::GameEvent;
use super::world::WorldState;

/// Ladder sensing box (half extents) around the body centre.
const LADDER_SENSE: Vec2 = Vec2::new(0.25, 0.5);
const ROPE_SENSE: Vec2 = Vec2::new(0.25, 0.15);
const PLAYER_GROUND_OFFSET: f32 = -0.5;
const PLAYER_GROUND_RADIUS: f32 = 0.2;
/// Dig target sits this far below the body centre.
const DIG_DROP: f32 = 0.9;
const DIG_RADIUS: f32 = 0.2;
const PICKUP_HALF: Vec2 = Vec2::splat(0.3);

// ══════════════════════════════════════════════════════════════
// Main entry point
// ══════════════════════════════════════════════════════════════

/// `input` drives the first player; any others stand idle. `dt` is fixed
/// for a run: the clock is derived from the tick count so it never drifts.
pub fn step(world: &mut WorldState, input: FrameInput, dt: f32) -> Vec<GameEvent> {
    let mut events: Vec<GameEvent> = Vec::new();
    world.tick += 1;
    world.time = (world.tick as f64 * dt as f64) as f32;

    update_players(world, input, &mut events);
    update_enemies(world, dt, &mut events);
    physics_step(world, dt, &mut events);

    events
}

fn physics_step(world: &mut WorldState, dt: f32, events: &mut Vec<GameEvent>) {
    let solids = world.solid_boxes();
    separate_enemies(world, dt, &solids);
    move_players(world, dt, &solids);
    move_enemies(world, dt, &solids);
    resolve_hole_traps(world, events);
    resolve_blocks(world, dt, events);
    resolve_pickups(world, events);
    resolve_exit(world, events);
    resolve_enemy_contact(world, events);
}

// ══════════════════════════════════════════════════════════════
// Sensing
// ══════════════════════════════════════════════════════════════

/// `ground` = (offset below centre, radius); `None` skips ground sensing.
fn sense<Q: SpatialQuery + ?Sized>(world: &Q, pos: Vec2, ground: Option<(f32, f32)>) -> Senses {
    let grounded = ground.map_or(false, |(offset, radius)| {
        !world.overlap_circle(pos + Vec2::new(0.0, offset), radius, LayerMask::SOLID).is_empty()
    });
    let ladder = world.overlap_region(pos, LADDER_SENSE, LayerMask::LADDER);
    Senses {
        grounded,
        on_ladder: ladder.is_some(),
        ladder_center_x: ladder.map_or(pos.x, |c| c.bounds.center.x),
    }
}

fn apply_gravity_mode(gravity: Gravity, base: f32, scale: &mut f32, vel: &mut Vec2) {
    match gravity {
        Gravity::On => *scale = base,
        Gravity::Off => *scale = 0.0,
        Gravity::Hold => {
            *scale = 0.0;
            vel.y = 0.0;
        }
    }
}

// ══════════════════════════════════════════════════════════════
// Frame update: players
// ══════════════════════════════════════════════════════════════

fn update_players(world: &mut WorldState, input: FrameInput, events: &mut Vec<GameEvent>) {
    let now = world.time;
    for i in 0..world.players.len() {
        if !world.players[i].alive {
            let p = &mut world.players[i];
            if p.respawn_at.map_or(false, |t| now >= t) {
                p.respawn();
                log::debug!("player {i} respawned");
                events.push(GameEvent::PlayerRespawned { player: PlayerId(i) });
            }
            continue;
        }

        let input = if i == 0 { input } else { FrameInput::default() };
        let pos = world.players[i].pos;
        let senses = sense(&*world, pos, Some((PLAYER_GROUND_OFFSET, PLAYER_GROUND_RADIUS)));
        let on_rope = world.overlap_region(pos, ROPE_SENSE, LayerMask::ROPE).is_some();

        if let Some(dir) = input.dig {
            try_dig(world, i, dir, senses.grounded, events);
        }

        let axis = input.movement.map_or(Vec2::ZERO, |m| m.axis());
        let p = &mut world.players[i];
        p.senses = senses;
        p.on_rope = on_rope;
        p.intent = axis;
        if let Some(f) = Facing::from_intent(axis.x) {
            p.facing = f;
        }
        let loco = rules::resolve_player(p.state, senses, on_rope, axis);
        p.state = loco.state;
        apply_gravity_mode(loco.gravity, DEFAULT_GRAVITY_SCALE, &mut p.gravity_scale, &mut p.vel);
    }
}

/// Dig the brick at `(x ± dig_range, y - 0.9)`. Needs footing and the
/// cooldown since the last attempt; refused while standing inside a hole.
fn try_dig(world: &mut WorldState, player: usize, dir: Facing, grounded: bool, events: &mut Vec<GameEvent>) {
    let now = world.time;
    let cfg = world.player_cfg.clone();
    let pos = world.players[player].pos;
    if !world.players[player].can_dig(now, cfg.dig_cooldown) || !grounded {
        return;
    }
    if world.dug_block_at(pos).is_some() {
        log::trace!("player {player}: cannot dig from inside a hole");
        return;
    }

    world.players[player].facing = dir;
    world.players[player].last_dig = Some(now);

    let target = pos + Vec2::new(dir.sign() * cfg.dig_range, -DIG_DROP);
    let block = world
        .overlap_circle(target, DIG_RADIUS, LayerMask::GROUND)
        .into_iter()
        .find_map(|c| match c.id {
            ColliderId::Terrain(t) => world.block_for_collider(t),
            _ => None,
        });
    let Some(block) = block else {
        log::trace!("player {player}: nothing to dig at ({:.2}, {:.2})", target.x, target.y);
        return;
    };
    if world.dig_block(block, Some(cfg.hole_restore_time)) {
        events.push(GameEvent::HoleDug { block, pos: world.blocks[block].pos });
    }
}

// ══════════════════════════════════════════════════════════════
// Frame update: enemies
// ══════════════════════════════════════════════════════════════

fn update_enemies(world: &mut WorldState, dt: f32, events: &mut Vec<GameEvent>) {
    let now = world.time;
    let stuck_time = world.enemy_cfg.stuck_in_hole_time;

    // The AI reads the world while the agents are out of it; it never
    // queries the Enemy layer.
    let mut enemies = std::mem::take(&mut world.enemies);
    for e in enemies.iter_mut() {
        match e.state {
            EnemyState::Dead => {
                if e.respawn_at.map_or(false, |t| now >= t) {
                    respawn(e, now, events);
                }
            }
            EnemyState::StuckInHole => {
                e.hole_timer += dt;
                if e.hole_timer >= stuck_time {
                    respawn(e, now, events);
                }
            }
            _ => think(world, e, now, events),
        }
    }
    world.enemies = enemies;
}

fn respawn(e: &mut Enemy, now: f32, events: &mut Vec<GameEvent>) {
    e.respawn(now);
    log::debug!("enemy {} respawned at ({:.1}, {:.1}) as {:?}", e.id, e.pos.x, e.pos.y, e.mode);
    events.push(GameEvent::EnemyRespawned { id: e.id });
}

fn think(world: &WorldState, e: &mut Enemy, now: f32, events: &mut Vec<GameEvent>) {
    let cfg = &world.enemy_cfg;
    let ground = cfg.ground_check_offset.map(|offset| (offset, cfg.ground_check_radius));
    e.senses = sense(world, e.pos, ground);

    let view = AiView {
        world,
        now,
        position: e.pos,
        target: world.target_position(e.target),
        senses: e.senses,
    };
    let mode = e.brain.think(&view, &mut e.intent);
    if mode != e.mode {
        log::debug!("enemy {}: {:?} -> {:?}", e.id, e.mode, mode);
        events.push(GameEvent::EnemyModeChanged { id: e.id, mode });
        e.mode = mode;
    }
    e.face_intent();

    let loco = rules::resolve_enemy(e.state, e.senses, e.intent);
    e.state = rules::flavour(loco.state, e.mode);
    let base = e.base_gravity_scale();
    apply_gravity_mode(loco.gravity, base, &mut e.gravity_scale, &mut e.vel);
    log::trace!("enemy {}: {:?} intent ({}, {})", e.id, e.state, e.intent.x, e.intent.y);
}

// ══════════════════════════════════════════════════════════════
// Physics step
// ══════════════════════════════════════════════════════════════

fn separate_enemies(world: &mut WorldState, dt: f32, solids: &[Aabb]) {
    let Some(sep) = world.enemy_cfg.separation else { return };
    let snapshot: Vec<Agent> = world
        .enemies
        .iter()
        .map(|e| Agent { pos: e.pos, steered: e.is_active(), pushes: e.collider_enabled })
        .collect();
    let offsets = sep.offsets(&snapshot, dt);
    for (e, offset) in world.enemies.iter_mut().zip(offsets) {
        if offset != Vec2::ZERO {
            e.pos = body::move_and_collide(e.pos, e.half, offset, solids).0;
        }
    }
}

fn move_players(world: &mut WorldState, dt: f32, solids: &[Aabb]) {
    let speeds = world.player_cfg.speeds();
    for p in world.players.iter_mut().filter(|p| p.alive) {
        let (m, state) =
            rules::player_motion(p.state, p.intent, p.vel, p.pos.x, p.senses.ladder_center_x, speeds, dt);
        if p.state == PlayerState::OnRope && state == PlayerState::Falling {
            p.gravity_scale = DEFAULT_GRAVITY_SCALE;
        }
        p.state = state;
        p.vel = body::apply_gravity(m.vel, p.gravity_scale, dt);
        let (pos, contacts) = body::move_and_collide(Vec2::new(m.x, p.pos.y), p.half, p.vel * dt, solids);
        p.pos = pos;
        if contacts.hit_x {
            p.vel.x = 0.0;
        }
        if contacts.hit_y {
            p.vel.y = 0.0;
        }
    }
}

fn move_enemies(world: &mut WorldState, dt: f32, solids: &[Aabb]) {
    let speeds = world.enemy_cfg.speeds();
    for e in world.enemies.iter_mut().filter(|e| e.is_active()) {
        let m = rules::enemy_motion(e.state, e.intent, e.vel, e.pos.x, e.senses.ladder_center_x, speeds, dt);
        let mut x = m.x;
        // Drift onto the column centre while falling so one-tile holes catch.
        if e.state == EnemyState::Falling {
            x = rules::move_towards(x, x.round(), FALL_ALIGN_SPEED * dt);
        }
        e.vel = body::apply_gravity(m.vel, e.gravity_scale, dt);
        let (pos, contacts) = body::move_and_collide(Vec2::new(x, e.pos.y), e.half, e.vel * dt, solids);
        e.pos = pos;
        if contacts.hit_x {
            e.vel.x = 0.0;
        }
        if contacts.hit_y {
            e.vel.y = 0.0;
        }
    }
}

fn resolve_hole_traps(world: &mut WorldState, events: &mut Vec<GameEvent>) {
    for i in 0..world.enemies.len() {
        let e = &world.enemies[i];
        if e.is_active() && world.dug_block_at(e.pos).is_some() {
            world.notify_fell_into_hole(i, events);
        }
    }
}

fn resolve_blocks(world: &mut WorldState, dt: f32, events: &mut Vec<GameEvent>) {
    for i in 0..world.blocks.len() {
        let was_warning = world.blocks[i].is_warning();
        if world.blocks[i].tick(dt) {
            world.notify_terrain_restored(i, events);
        } else if !was_warning && world.blocks[i].is_warning() {
            events.push(GameEvent::HoleClosing { block: i });
        }
    }
}

fn resolve_pickups(world: &mut WorldState, events: &mut Vec<GameEvent>) {
    for p in world.players.iter().filter(|p| p.alive) {
        let body = Aabb::new(p.pos, p.half);
        for pickup in world.pickups.iter_mut().filter(|k| !k.collected) {
            if !body.overlaps(&Aabb::new(pickup.pos, PICKUP_HALF)) {
                continue;
            }
            pickup.collected = true;
            match pickup.kind {
                PickupKind::Gold => {
                    let all = world.progress.collect_gold();
                    events.push(GameEvent::GoldCollected {
                        collected: world.progress.gold_collected,
                        total: world.progress.gold_total,
                    });
                    if all {
                        events.push(GameEvent::AllGoldCollected);
                    }
                }
                PickupKind::Key => {
                    world.progress.collect_key();
                    events.push(GameEvent::KeyCollected);
                }
            }
        }
    }
}

/// Edge-triggered: fires when a player steps into the exit.
fn resolve_exit(world: &mut WorldState, events: &mut Vec<GameEvent>) {
    let Some(exit) = world.exit else { return };
    let inside = world
        .players
        .iter()
        .any(|p| p.alive && exit.overlaps(&Aabb::new(p.pos, p.half)));
    let entered = inside && !world.exit_occupied;
    world.exit_occupied = inside;
    if !entered || world.progress.completed {
        return;
    }

    if world.progress.can_complete_level() {
        world.progress.complete_level();
        events.push(GameEvent::LevelComplete { score: world.progress.score });
    } else {
        let reason = world.progress.blocked_reason().unwrap_or_default();
        log::warn!("exit blocked: {reason}");
        events.push(GameEvent::ExitBlocked { reason });
    }
}

/// Active enemies (not trapped, not dead) kill the player on contact.
fn resolve_enemy_contact(world: &mut WorldState, events: &mut Vec<GameEvent>) {
    let caught: Vec<(usize, usize)> = world
        .players
        .iter()
        .enumerate()
        .filter(|(_, p)| p.alive)
        .filter_map(|(i, p)| {
            let body = Aabb::new(p.pos, p.half);
            world
                .overlap_circle(p.pos, p.half.length(), LayerMask::ENEMY)
                .into_iter()
                .find_map(|c| match c.id {
                    ColliderId::Enemy(e) if world.enemies[e].is_active() && body.overlaps(&c.bounds) => Some((i, e)),
                    _ => None,
                })
        })
        .collect();

    let now = world.time;
    let delay = world.player_cfg.respawn_delay;
    for (i, e) in caught {
        if world.players[i].die(now, delay) {
            log::debug!("player {i} caught by enemy {e}");
            events.push(GameEvent::PlayerKilled { player: PlayerId(i) });
        }
    }
}

// ══════════════════════════════════════════════════════════════
// Unit tests
// ══════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GameConfig;
    use crate::domain::ai::AiKind;
    use crate::sim::level::{build_world, builtin_level, parse_level};

    const DT: f32 = 0.02;

    fn world_from(rows: &str, config: &GameConfig) -> WorldState {
        let def = parse_level(rows).unwrap();
        build_world(&def, config).unwrap().0
    }

    fn idle(world: &mut WorldState, ticks: usize) -> Vec<GameEvent> {
        (0..ticks).flat_map(|_| step(world, FrameInput::default(), DT)).collect()
    }

    fn dig(world: &mut WorldState, dir: Facing) -> Vec<GameEvent> {
        step(world, FrameInput { movement: None, dig: Some(dir) }, DT)
    }

    const DIG_MAP: &str = "  P    \n#=#####\n=======\n";

    #[test]
    fn player_digs_brick_but_not_concrete() {
        let mut w = world_from(DIG_MAP, &GameConfig::default());
        let events = dig(&mut w, Facing::Right);
        assert!(matches!(events.as_slice(), [GameEvent::HoleDug { .. }]));
        assert!(w.blocks.iter().any(|b| b.is_dug() && b.pos == Vec2::new(3.0, 1.0)));

        // Cooldown: a second attempt right away does nothing
        assert!(dig(&mut w, Facing::Left).is_empty());
        idle(&mut w, 30);
        // Left of the player is concrete
        assert!(dig(&mut w, Facing::Left).is_empty());
        assert_eq!(w.blocks.iter().filter(|b| b.is_dug()).count(), 1);
    }

    #[test]
    fn cannot_dig_from_inside_a_hole() {
        let mut w = world_from(DIG_MAP, &GameConfig::default());
        dig(&mut w, Facing::Right);
        w.players[0].pos = Vec2::new(3.0, 0.95);
        w.players[0].vel = Vec2::ZERO;
        idle(&mut w, 30);
        assert!(dig(&mut w, Facing::Right).is_empty());
        assert_eq!(w.blocks.iter().filter(|b| b.is_dug()).count(), 1);
    }

    #[test]
    fn enemy_falls_into_hole_then_respawns() {
        let mut w = world_from("P    E    \n##########\n==========\n", &GameConfig::default());
        assert_eq!(w.enemies.len(), 1);
        assert!(w.dig_block(3, Some(10.0)));

        let mut trapped_at = None;
        for t in 0..150 {
            let events = step(&mut w, FrameInput::default(), DT);
            if events.contains(&GameEvent::EnemyTrapped { id: 0 }) {
                trapped_at = Some(t);
                break;
            }
        }
        assert!(trapped_at.is_some(), "enemy never reached the hole");
        let e = &w.enemies[0];
        assert_eq!(e.state, EnemyState::StuckInHole);
        assert!((e.pos.x - 3.0).abs() < 0.15);
        assert!(w.players[0].alive);

        // Held for 3 s, then back at the anchor
        let events = idle(&mut w, 145);
        assert!(!events.contains(&GameEvent::EnemyRespawned { id: 0 }));
        let events = idle(&mut w, 10);
        assert!(events.contains(&GameEvent::EnemyRespawned { id: 0 }));
        assert!(w.enemies[0].is_active());
        assert!(w.enemies[0].collider_enabled);
    }

    #[test]
    fn restored_block_crushes_trapped_enemy() {
        let mut w = world_from("P    E    \n##########\n==========\n", &GameConfig::default());
        w.dig_block(7, Some(0.1));
        w.enemies[0].pos = Vec2::new(7.0, 0.95);
        let mut events = vec![];
        w.notify_fell_into_hole(0, &mut events);

        let events = idle(&mut w, 10);
        assert!(events.contains(&GameEvent::HoleRestored { block: 7, pos: Vec2::new(7.0, 1.0) }));
        assert!(events.contains(&GameEvent::EnemyKilled { id: 0, crushed: true }));
        assert!(w.enemies[0].is_dead());
        assert!(!w.enemies[0].collider_enabled);
        assert_eq!(w.progress.score, 50);

        // Dead for 2 s
        let events = idle(&mut w, 105);
        assert!(events.contains(&GameEvent::EnemyRespawned { id: 0 }));
        assert!(w.enemies[0].collider_enabled);
    }

    #[test]
    fn enemy_contact_kills_player_who_later_respawns() {
        let mut w = world_from("  P E  \n=======\n", &GameConfig::default());
        w.enemies[0].pos = Vec2::new(2.5, 0.95);
        w.players[0].pos = Vec2::new(2.0, 0.95);
        let events = step(&mut w, FrameInput::default(), DT);
        assert!(events.contains(&GameEvent::PlayerKilled { player: PlayerId(0) }));
        assert!(!w.players[0].alive);

        // The dead player is no target
        assert_eq!(w.target_position(w.enemies[0].target), None);

        let events = idle(&mut w, 105);
        assert!(events.contains(&GameEvent::PlayerRespawned { player: PlayerId(0) }));
    }

    #[test]
    fn overlapping_enemies_are_pushed_apart() {
        let mut config = GameConfig::default();
        config.level.max_enemies = 2;
        let mut w = world_from("     \nE E P\n=====\n", &config);
        // No target in reach: both stand still
        w.players[0].alive = false;
        w.players[0].respawn_at = Some(1000.0);
        w.enemies[0].pos = Vec2::new(2.0, 0.95);
        w.enemies[1].pos = Vec2::new(2.2, 0.95);
        step(&mut w, FrameInput::default(), DT);
        assert!(w.enemies[0].pos.x < 2.0);
        assert!(w.enemies[1].pos.x > 2.2);
    }

    #[test]
    fn pickups_unlock_the_exit() {
        let mut w = world_from("D $P$K\n======\n", &GameConfig::default());
        let visit = |w: &mut WorldState, x: f32| {
            w.players[0].pos.x = x;
            step(w, FrameInput::default(), DT)
        };

        let events = visit(&mut w, 0.0);
        assert_eq!(
            events,
            vec![GameEvent::ExitBlocked { reason: "collect all gold (0/2) and find the key".into() }]
        );
        assert_eq!(visit(&mut w, 2.0), vec![GameEvent::GoldCollected { collected: 1, total: 2 }]);
        assert_eq!(
            visit(&mut w, 4.0),
            vec![GameEvent::GoldCollected { collected: 2, total: 2 }, GameEvent::AllGoldCollected]
        );
        assert_eq!(visit(&mut w, 5.0), vec![GameEvent::KeyCollected]);
        assert_eq!(visit(&mut w, 0.0), vec![GameEvent::LevelComplete { score: 450 }]);
        assert!(w.progress.completed);
    }

    #[test]
    fn player_climbs_ladder() {
        let mut w = world_from("  H  \n  H  \n PH  \n=====\n", &GameConfig::default());
        w.players[0].pos = Vec2::new(2.0, 0.95);
        let up = FrameInput { movement: Some(crate::domain::entity::MoveDir::Up), dig: None };
        for _ in 0..25 {
            step(&mut w, up, DT);
        }
        let p = &w.players[0];
        assert_eq!(p.state, PlayerState::Climbing);
        assert!(p.pos.y > 2.0);
        assert!((p.pos.x - 2.0).abs() < 1e-3);
    }

    #[test]
    fn hole_warns_before_it_closes() {
        let mut w = world_from(DIG_MAP, &GameConfig::default());
        assert!(w.dig_block(5, Some(1.0)));
        let events: Vec<GameEvent> = idle(&mut w, 60)
            .into_iter()
            .filter(|e| matches!(e, GameEvent::HoleClosing { .. } | GameEvent::HoleRestored { .. }))
            .collect();
        assert_eq!(
            events,
            vec![
                GameEvent::HoleClosing { block: 5 },
                GameEvent::HoleRestored { block: 5, pos: Vec2::new(6.0, 1.0) },
            ]
        );
    }

    #[test]
    fn enemy_without_ground_check_never_grounds() {
        let mut config = GameConfig::default();
        config.enemy.ground_check_offset = None;
        let mut w = world_from("P   E\n=====\n", &config);
        let start_x = w.enemies[0].pos.x;
        for _ in 0..20 {
            step(&mut w, FrameInput::default(), DT);
            let e = &w.enemies[0];
            assert!(!e.senses.grounded);
            assert_eq!(e.state, EnemyState::Falling);
        }
        // Collision still holds it on the floor
        let e = &w.enemies[0];
        assert!((e.pos.y - 0.95).abs() < 1e-3);
        assert!((e.pos.x - start_x).abs() < 1e-3);
        assert!(e.is_active());
    }

    #[test]
    fn clock_follows_the_tick_count() {
        let mut w = world_from("P\n=\n", &GameConfig::default());
        idle(&mut w, 50_000);
        assert_eq!(w.tick, 50_000);
        assert!((w.time - 1000.0).abs() < 1e-3, "clock drifted to {}", w.time);
    }

    #[test]
    fn level_reset_restores_the_start() {
        let mut w = world_from("D $P$K E\n########\n========\n", &GameConfig::default());
        let spawn = w.players[0].pos;
        w.players[0].pos.x = 2.0;
        step(&mut w, FrameInput::default(), DT);
        w.players[0].pos.x = 5.0;
        step(&mut w, FrameInput::default(), DT);
        assert_eq!(w.progress.score, 350);
        assert!(w.dig_block(0, Some(10.0)));
        w.enemies[0].die(w.time, 2.0);

        let events = w.reset_level();
        assert_eq!(events[0], GameEvent::LevelReset);
        assert!(events.contains(&GameEvent::EnemySpawned { id: 0, pos: Vec2::new(7.0, 2.0) }));

        assert!(w.blocks.iter().all(|b| !b.is_dug()));
        assert!(w.terrain[w.blocks[0].collider].enabled);
        assert!(w.pickups.iter().all(|k| !k.collected));
        assert_eq!(w.players[0].pos, spawn);
        assert_eq!(w.enemies.len(), 1);
        assert!(w.enemies[0].is_active());
        assert_eq!((w.progress.score, w.progress.gold_collected, w.progress.gold_total), (0, 0, 2));
        assert!(!w.progress.has_key);
        assert!(!w.exit_occupied);
    }

    #[test]
    fn builtin_level_runs_for_twenty_seconds() {
        for kind in [AiKind::Greedy, AiKind::Patrol] {
            let mut config = GameConfig::default();
            config.enemy.ai = kind;
            let (mut w, _) = build_world(&builtin_level(), &config).unwrap();
            idle(&mut w, 1000);
            assert_eq!(w.tick, 1000);
            for e in &w.enemies {
                assert!(e.pos.is_finite());
                assert!(e.pos.y > -1.0, "enemy {} fell out of the level", e.id);
            }
        }
    }
}
