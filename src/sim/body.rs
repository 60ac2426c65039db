/// Kinematic bodies: gravity and box-vs-terrain collision.
///
/// Movement is resolved one axis at a time (x, then y). A body is pushed
/// back to the face of any solid it would enter. Solids the body already
/// overlaps before the move are ignored so a body spawned inside terrain
/// (or caught by a restored block) can still move out.
///
/// The tested box is shrunk by `SKIN` on the axis not being moved, so a
/// body resting exactly on a floor can still slide along it.

use glam::Vec2;

use crate::domain::physics::Aabb;

pub const GRAVITY: f32 = 9.81;
/// Terminal fall speed; keeps a tick's fall below one tile.
pub const MAX_FALL_SPEED: f32 = 20.0;

const SKIN: f32 = 1e-3;

#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub struct Contacts {
    pub hit_x: bool,
    pub hit_y: bool,
}

pub fn apply_gravity(vel: Vec2, gravity_scale: f32, dt: f32) -> Vec2 {
    let vy = (vel.y - GRAVITY * gravity_scale * dt).max(-MAX_FALL_SPEED);
    Vec2::new(vel.x, vy)
}

pub fn move_and_collide(pos: Vec2, half: Vec2, delta: Vec2, solids: &[Aabb]) -> (Vec2, Contacts) {
    let mut contacts = Contacts::default();
    let mut pos = pos;

    // ── x ──
    if delta.x != 0.0 {
        let inner_half = Vec2::new(half.x, (half.y - SKIN).max(0.0));
        let start = Aabb::new(pos, inner_half);
        let mut x = pos.x + delta.x;
        for s in solids.iter().filter(|s| !s.overlaps(&start)) {
            if !Aabb::new(Vec2::new(x, pos.y), inner_half).overlaps(s) {
                continue;
            }
            x = if delta.x > 0.0 { x.min(s.min().x - half.x) } else { x.max(s.max().x + half.x) };
            contacts.hit_x = true;
        }
        pos.x = x;
    }

    // ── y ──
    if delta.y != 0.0 {
        let inner_half = Vec2::new((half.x - SKIN).max(0.0), half.y);
        let start = Aabb::new(pos, inner_half);
        let mut y = pos.y + delta.y;
        for s in solids.iter().filter(|s| !s.overlaps(&start)) {
            if !Aabb::new(Vec2::new(pos.x, y), inner_half).overlaps(s) {
                continue;
            }
            y = if delta.y > 0.0 { y.min(s.min().y - half.y) } else { y.max(s.max().y + half.y) };
            contacts.hit_y = true;
        }
        pos.y = y;
    }

    (pos, contacts)
}
