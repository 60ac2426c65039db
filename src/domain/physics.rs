/// Spatial query contract — the only view of the physics world the AI has.
///
/// ## Architecture
///
/// The AI never walks collider lists itself. It asks three questions:
///   1. OVERLAP REGION — is anything of these layers inside this box?
///   2. OVERLAP CIRCLE — which colliders of these layers touch this circle?
///   3. RAYCAST        — what is the first collider of these layers on a ray?
///
/// `sim::world::WorldState` answers them for the bundled simulation; any
/// other physics backend can stand in by implementing `SpatialQuery`.
///
/// Disabled colliders (dug blocks, dead enemies) are invisible to every query.

use glam::Vec2;

use super::tile::{Layer, LayerMask};

// ══════════════════════════════════════════════════════════════
// Shapes
// ══════════════════════════════════════════════════════════════

/// Axis-aligned box, stored as centre + half extents.
#[derive(Clone, Copy, PartialEq, Debug)]
pub struct Aabb {
    pub center: Vec2,
    pub half: Vec2,
}

impl Aabb {
    pub fn new(center: Vec2, half: Vec2) -> Self {
        Aabb { center, half }
    }

    pub fn min(&self) -> Vec2 {
        self.center - self.half
    }

    pub fn max(&self) -> Vec2 {
        self.center + self.half
    }

    /// Strict overlap: boxes that only share an edge do not overlap.
    pub fn overlaps(&self, other: &Aabb) -> bool {
        let d = (self.center - other.center).abs();
        let reach = self.half + other.half;
        d.x < reach.x && d.y < reach.y
    }

    pub fn contains_point(&self, p: Vec2) -> bool {
        let d = (p - self.center).abs();
        d.x <= self.half.x && d.y <= self.half.y
    }

    pub fn intersects_circle(&self, center: Vec2, radius: f32) -> bool {
        let closest = center.clamp(self.min(), self.max());
        closest.distance_squared(center) <= radius * radius
    }

    /// Distance along `dir` (unit length) at which the ray enters the box,
    /// or `None` if it misses within `max_distance`. A ray starting inside
    /// the box hits at distance 0.
    pub fn ray_distance(&self, origin: Vec2, dir: Vec2, max_distance: f32) -> Option<f32> {
        let lo = self.min();
        let hi = self.max();
        let mut t_enter = 0.0_f32;
        let mut t_exit = max_distance;

        for axis in 0..2 {
            let o = origin[axis];
            let d = dir[axis];
            if d.abs() < 1e-8 {
                if o < lo[axis] || o > hi[axis] {
                    return None;
                }
                continue;
            }
            let inv = 1.0 / d;
            let mut t1 = (lo[axis] - o) * inv;
            let mut t2 = (hi[axis] - o) * inv;
            if t1 > t2 {
                std::mem::swap(&mut t1, &mut t2);
            }
            t_enter = t_enter.max(t1);
            t_exit = t_exit.min(t2);
            if t_enter > t_exit {
                return None;
            }
        }

        Some(t_enter)
    }
}

// ══════════════════════════════════════════════════════════════
// Query results
// ══════════════════════════════════════════════════════════════

/// Non-owning handle to whatever a collider belongs to.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Hash)]
pub enum ColliderId {
    /// Static terrain collider (index into the world's collider list).
    Terrain(usize),
    /// Enemy body (index into the world's enemy list).
    Enemy(usize),
    /// Player body (index into the world's player list).
    Player(usize),
}

#[derive(Clone, Copy, PartialEq, Debug)]
pub struct ColliderRef {
    pub id: ColliderId,
    pub layer: Layer,
    pub bounds: Aabb,
}

#[derive(Clone, Copy, PartialEq, Debug)]
pub struct RayHit {
    pub point: Vec2,
    pub distance: f32,
    pub collider: ColliderId,
}

// ══════════════════════════════════════════════════════════════
// Contract
// ══════════════════════════════════════════════════════════════

pub trait SpatialQuery {
    /// First enabled collider of `mask` overlapping the box, if any.
    fn overlap_region(&self, center: Vec2, half_extents: Vec2, mask: LayerMask) -> Option<ColliderRef>;

    /// Every enabled collider of `mask` touching the circle.
    fn overlap_circle(&self, center: Vec2, radius: f32, mask: LayerMask) -> Vec<ColliderRef>;

    /// Closest enabled collider of `mask` hit by the ray.
    fn raycast(&self, origin: Vec2, direction: Vec2, max_distance: f32, mask: LayerMask) -> Option<RayHit>;
}

/// Closest hit among `candidates` (shared by implementations).
pub fn closest_hit<I>(origin: Vec2, direction: Vec2, max_distance: f32, candidates: I) -> Option<RayHit>
where
    I: IntoIterator<Item = ColliderRef>,
{
    let dir = direction.normalize_or_zero();
    if dir == Vec2::ZERO {
        return None;
    }
    candidates
        .into_iter()
        .filter_map(|c| {
            c.bounds.ray_distance(origin, dir, max_distance).map(|t| RayHit {
                point: origin + dir * t,
                distance: t,
                collider: c.id,
            })
        })
        .min_by(|a, b| a.distance.total_cmp(&b.distance))
}

// ══════════════════════════════════════════════════════════════
// Test stub: one collider per grid cell
// ══════════════════════════════════════════════════════════════


// ══════════════════════════════════════════════════════════════
// Unit tests
// ══════════════════════════════════════════════════════════════
