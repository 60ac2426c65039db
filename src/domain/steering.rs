/// Separation steering: keeps enemies from stacking on the same spot.
///
/// Not a physics solve. Each tick every participating agent gets a small
/// positional offset away from its close neighbours:
///
///   offset = avg( normalize(self - other) × (1 - d / radius) ) × force × dt
///
/// for neighbours with `0.01 < d < radius`. All offsets are computed from
/// one snapshot of positions, then applied, so the result does not depend
/// on agent order. Trapped agents repel but are not moved; dead agents do
/// neither.

use glam::Vec2;

pub const DEFAULT_SEPARATION_RADIUS: f32 = 0.6;
pub const DEFAULT_SEPARATION_FORCE: f32 = 2.0;

/// Neighbours closer than this are treated as coincident and ignored.
const MIN_DISTANCE: f32 = 0.01;

#[derive(Clone, Copy, PartialEq, Debug)]
pub struct Separation {
    pub radius: f32,
    pub force: f32,
}

impl Default for Separation {
    fn default() -> Self {
        Separation { radius: DEFAULT_SEPARATION_RADIUS, force: DEFAULT_SEPARATION_FORCE }
    }
}

impl Separation {
    /// Offset for one agent at `me`, given the other agents' positions.
    pub fn offset<I>(&self, me: Vec2, others: I, dt: f32) -> Vec2
    where
        I: IntoIterator<Item = Vec2>,
    {
        let mut sum = Vec2::ZERO;
        let mut count = 0u32;
        for other in others {
            let away = me - other;
            let d = away.length();
            if d > MIN_DISTANCE && d < self.radius {
                sum += away / d * (1.0 - d / self.radius);
                count += 1;
            }
        }
        if count == 0 {
            return Vec2::ZERO;
        }
        sum / count as f32 * self.force * dt
    }

    /// Offsets for a whole snapshot, index-aligned with it.
    pub fn offsets(&self, snapshot: &[Agent], dt: f32) -> Vec<Vec2> {
        snapshot
            .iter()
            .enumerate()
            .map(|(i, me)| {
                if !me.steered {
                    return Vec2::ZERO;
                }
                let others = snapshot
                    .iter()
                    .enumerate()
                    .filter(|&(j, a)| j != i && a.pushes)
                    .map(|(_, a)| a.pos);
                self.offset(me.pos, others, dt)
            })
            .collect()
    }
}

/// One agent in a separation snapshot.
#[derive(Clone, Copy, PartialEq, Debug)]
pub struct Agent {
    pub pos: Vec2,
    /// Receives an offset (live and free to move).
    pub steered: bool,
    /// Repels neighbours (collider enabled; trapped agents still push).
    pub pushes: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn free(x: f32) -> Agent {
        Agent { pos: Vec2::new(x, 0.0), steered: true, pushes: true }
    }

    #[test]
    fn pair_pushes_apart_symmetrically() {
        let sep = Separation::default();
        let out = sep.offsets(&[free(0.0), free(0.3)], 0.02);
        // strength 1 - 0.3/0.6 = 0.5, × force 2 × dt 0.02
        assert!((out[0].x + 0.02).abs() < 1e-6);
        assert!((out[1].x - 0.02).abs() < 1e-6);
        assert_eq!(out[0].y, 0.0);
    }

    #[test]
    fn out_of_radius_and_coincident_are_ignored() {
        let sep = Separation::default();
        let me = Vec2::ZERO;
        assert_eq!(sep.offset(me, [Vec2::new(0.6, 0.0), Vec2::new(2.0, 0.0)], 0.02), Vec2::ZERO);
        assert_eq!(sep.offset(me, [Vec2::new(0.005, 0.0)], 0.02), Vec2::ZERO);
    }

    #[test]
    fn neighbours_are_averaged() {
        let sep = Separation::default();
        let me = Vec2::ZERO;
        // Equal and opposite pushes cancel
        let o = sep.offset(me, [Vec2::new(0.3, 0.0), Vec2::new(-0.3, 0.0)], 0.02);
        assert!(o.length() < 1e-6);
        // Two neighbours on the same side: average, not sum
        let one = sep.offset(me, [Vec2::new(0.3, 0.0)], 0.02);
        let two = sep.offset(me, [Vec2::new(0.3, 0.0), Vec2::new(0.3, 0.0)], 0.02);
        assert!((one - two).length() < 1e-6);
    }

    #[test]
    fn trapped_agents_push_but_stay_put() {
        let sep = Separation::default();
        let trapped = Agent { pos: Vec2::new(0.3, 0.0), steered: false, pushes: true };
        let out = sep.offsets(&[free(0.0), trapped], 0.02);
        assert!(out[0].x < 0.0);
        assert_eq!(out[1], Vec2::ZERO);
    }

    #[test]
    fn dead_agents_neither_move_nor_push() {
        let sep = Separation::default();
        let dead = Agent { pos: Vec2::new(0.3, 0.0), steered: false, pushes: false };
        let out = sep.offsets(&[free(0.0), dead], 0.02);
        assert_eq!(out, vec![Vec2::ZERO, Vec2::ZERO]);
    }
}
