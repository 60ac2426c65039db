/// Enemy AI: decides a movement intent from what the agent senses.
///
/// Two interchangeable strategies behind one trait:
///   1. **Greedy**: the classic arcade chaser. Re-decides every
///      `update_interval`; idles when the target is out of range.
///      Optionally consults the grid path search first.
///   2. **Patrol**: patrols when the target is far, chases when it is
///      near, and wanders randomly for a while when it notices it has
///      stopped making progress.
///
/// An intent is a `Vec2` with components in [-1, 1]. It lives on the agent
/// and is held between decisions; the AI only overwrites it.
///
/// ## Greedy Decision Table (t = alignment threshold)
///
/// ┌───────────────────────────────────┬───────────────────────────────┐
/// │ Condition (priority order)         │ Intent                        │
/// ├───────────────────────────────────┼───────────────────────────────┤
/// │ on ladder, dy >  t                 │ up                            │
/// │ on ladder, dy < -t                 │ down                          │
/// │ on ladder, |dx| > t                │ sign(dx) horizontally         │
/// │ on ladder                          │ hold                          │
/// │ |dy| > gap, grounded, ladder near  │ walk to ladder, or climb if   │
/// │                                    │ aligned with it               │
/// │ |dx| > t                           │ sign(dx) horizontally         │
/// │ otherwise                          │ hold                          │
/// └───────────────────────────────────┴───────────────────────────────┘

use glam::Vec2;
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

use super::entity::{AiMode, Senses};
use super::grid::GridSpec;
use super::pathfind::{GridPathBuilder, DEFAULT_MAX_PATH_LENGTH};
use super::physics::SpatialQuery;
use super::tile::LayerMask;

/// Path steering ignores axis components smaller than this.
const PATH_DEAD_ZONE: f32 = 0.1;
/// Patrol rays reach this far ahead of the body centre.
const PATROL_LOOK_AHEAD: f32 = 0.6;
const PATROL_FLOOR_RAY: f32 = 1.0;
/// Horizontal nudge applied while climbing toward a far-off target.
const LADDER_NUDGE: f32 = 0.2;

/// Which strategy an agent runs.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub enum AiKind {
    #[default]
    Greedy,
    Patrol,
}

impl AiKind {
    pub fn from_name(name: &str) -> Option<AiKind> {
        match name.trim().to_ascii_lowercase().as_str() {
            "greedy" | "simple" => Some(AiKind::Greedy),
            "patrol" | "wander" => Some(AiKind::Patrol),
            _ => None,
        }
    }
}

/// Tuning shared by both strategies.
#[derive(Clone, Debug, PartialEq)]
pub struct AiParams {
    pub detection_range: f32,
    pub update_interval: f32,
    pub alignment_threshold: f32,
    /// Vertical gap beyond which the agent goes looking for a ladder.
    pub vertical_threshold: f32,
    pub ladder_search_radius: f32,
    /// Patrol strategy: horizontal/vertical dead band while chasing.
    pub chase_threshold: f32,
    pub stuck_check_interval: f32,
    pub min_stuck_distance: f32,
    pub wander_min_time: f32,
    pub wander_max_time: f32,
    pub always_moving: bool,
    pub use_pathfinding: bool,
    pub max_path_length: usize,
}

impl Default for AiParams {
    fn default() -> Self {
        AiParams {
            detection_range: 15.0,
            update_interval: 0.5,
            alignment_threshold: 0.3,
            vertical_threshold: 2.0,
            ladder_search_radius: 5.0,
            chase_threshold: 0.5,
            stuck_check_interval: 1.0,
            min_stuck_distance: 0.2,
            wander_min_time: 2.0,
            wander_max_time: 4.0,
            always_moving: true,
            use_pathfinding: false,
            max_path_length: DEFAULT_MAX_PATH_LENGTH,
        }
    }
}

/// Everything an AI may look at when deciding.
pub struct AiView<'a, Q: SpatialQuery + ?Sized> {
    pub world: &'a Q,
    pub now: f32,
    pub position: Vec2,
    /// Target position, if the agent has a target at all.
    pub target: Option<Vec2>,
    pub senses: Senses,
}

pub trait EnemyAi {
    /// Update `intent` (only when a decision is due) and report the mode.
    fn think<Q: SpatialQuery + ?Sized>(&mut self, view: &AiView<'_, Q>, intent: &mut Vec2) -> AiMode;

    /// Reset per-life state; returns the mode to resume in.
    fn on_respawn(&mut self, now: f32, position: Vec2) -> AiMode;

    fn initial_mode(&self) -> AiMode;
}

/// Per-agent strategy, chosen at spawn.
#[derive(Clone, Debug)]
pub enum Brain {
    Greedy(GreedyAi),
    Patrol(PatrolAi),
}

impl Brain {
    pub fn new(kind: AiKind, params: &AiParams, seed: u64, now: f32, position: Vec2) -> Brain {
        match kind {
            AiKind::Greedy => Brain::Greedy(GreedyAi::new(params.clone())),
            AiKind::Patrol => Brain::Patrol(PatrolAi::new(params.clone(), seed, now, position)),
        }
    }

    pub fn kind(&self) -> AiKind {
        match self {
            Brain::Greedy(_) => AiKind::Greedy,
            Brain::Patrol(_) => AiKind::Patrol,
        }
    }
}

impl EnemyAi for Brain {
    fn think<Q: SpatialQuery + ?Sized>(&mut self, view: &AiView<'_, Q>, intent: &mut Vec2) -> AiMode {
        match self {
            Brain::Greedy(ai) => ai.think(view, intent),
            Brain::Patrol(ai) => ai.think(view, intent),
        }
    }

    fn on_respawn(&mut self, now: f32, position: Vec2) -> AiMode {
        match self {
            Brain::Greedy(ai) => ai.on_respawn(now, position),
            Brain::Patrol(ai) => ai.on_respawn(now, position),
        }
    }

    fn initial_mode(&self) -> AiMode {
        match self {
            Brain::Greedy(ai) => ai.initial_mode(),
            Brain::Patrol(ai) => ai.initial_mode(),
        }
    }
}

// ══════════════════════════════════════════════════════════════
// Shared helpers
// ══════════════════════════════════════════════════════════════

/// +1 toward positive `d`, -1 otherwise.
fn toward(d: f32) -> f32 {
    if d > 0.0 { 1.0 } else { -1.0 }
}

/// Centre of the closest ladder collider within `radius`, measured from
/// `from` to each collider's centre.
pub fn find_nearest_ladder<Q: SpatialQuery + ?Sized>(world: &Q, from: Vec2, radius: f32) -> Option<Vec2> {
    world
        .overlap_circle(from, radius, LayerMask::LADDER)
        .into_iter()
        .map(|c| c.bounds.center)
        .min_by(|a, b| a.distance_squared(from).total_cmp(&b.distance_squared(from)))
}

/// One greedy decision. Pure apart from the ladder query.
pub fn greedy_direction<Q: SpatialQuery + ?Sized>(view: &AiView<'_, Q>, target: Vec2, p: &AiParams) -> Vec2 {
    let delta = target - view.position;
    let t = p.alignment_threshold;

    if view.senses.on_ladder {
        return if delta.y > t {
            Vec2::Y
        } else if delta.y < -t {
            Vec2::NEG_Y
        } else if delta.x.abs() > t {
            Vec2::new(toward(delta.x), 0.0)
        } else {
            Vec2::ZERO
        };
    }

    if delta.y.abs() > p.vertical_threshold && view.senses.grounded {
        if let Some(ladder) = find_nearest_ladder(view.world, view.position, p.ladder_search_radius) {
            let off = ladder.x - view.position.x;
            return if off.abs() > t {
                Vec2::new(toward(off), 0.0)
            } else {
                Vec2::new(0.0, toward(delta.y))
            };
        }
    }

    if delta.x.abs() > t {
        Vec2::new(toward(delta.x), 0.0)
    } else {
        Vec2::ZERO
    }
}

// ══════════════════════════════════════════════════════════════
// Greedy strategy
// ══════════════════════════════════════════════════════════════

#[derive(Clone, Debug)]
pub struct GreedyAi {
    params: AiParams,
    next_decision: f32,
    pathfinder: Option<GridPathBuilder>,
}

impl GreedyAi {
    pub fn new(params: AiParams) -> Self {
        let pathfinder = params
            .use_pathfinding
            .then(|| GridPathBuilder::new(GridSpec::default(), params.max_path_length));
        GreedyAi { params, next_decision: 0.0, pathfinder }
    }

    #[cfg(test)]
    pub fn pathfinder(&self) -> Option<&GridPathBuilder> {
        self.pathfinder.as_ref()
    }

    fn decide<Q: SpatialQuery + ?Sized>(&mut self, view: &AiView<'_, Q>, target: Vec2) -> Vec2 {
        if let Some(pf) = self.pathfinder.as_mut() {
            pf.refresh(view.now);
            let path = pf.find_path(view.world, view.position, target);
            if path.len() >= 2 {
                let next = pf.grid().grid_to_world(path[1]);
                let dir = (next - view.position).normalize_or_zero();
                let axis = |c: f32| if c.abs() > PATH_DEAD_ZONE { toward(c) } else { 0.0 };
                log::trace!("following path, {} cells left, cost {:?}", path.len() - 1, pf.last_cost());
                return Vec2::new(axis(dir.x), axis(dir.y));
            }
        }
        greedy_direction(view, target, &self.params)
    }
}

impl EnemyAi for GreedyAi {
    fn think<Q: SpatialQuery + ?Sized>(&mut self, view: &AiView<'_, Q>, intent: &mut Vec2) -> AiMode {
        let Some(target) = view.target else {
            *intent = Vec2::ZERO;
            return AiMode::Idle;
        };
        if view.position.distance(target) > self.params.detection_range {
            *intent = Vec2::ZERO;
            return AiMode::Idle;
        }
        if view.now >= self.next_decision {
            *intent = self.decide(view, target);
            self.next_decision = view.now + self.params.update_interval;
        }
        AiMode::Chasing
    }

    fn on_respawn(&mut self, _now: f32, _position: Vec2) -> AiMode {
        AiMode::Idle
    }

    fn initial_mode(&self) -> AiMode {
        AiMode::Idle
    }
}

// ══════════════════════════════════════════════════════════════
// Patrol / wander strategy
// ══════════════════════════════════════════════════════════════

#[derive(Clone, Copy, Debug, PartialEq)]
struct Wander {
    dir: f32,
    until: f32,
}

#[derive(Clone, Debug)]
pub struct PatrolAi {
    params: AiParams,
    rng: SmallRng,
    patrol_dir: f32,
    next_decision: f32,
    next_stuck_check: f32,
    last_check_pos: Vec2,
    wander: Option<Wander>,
}

impl PatrolAi {
    pub fn new(params: AiParams, seed: u64, now: f32, position: Vec2) -> Self {
        let mut rng = SmallRng::seed_from_u64(seed);
        let patrol_dir = random_dir(&mut rng);
        PatrolAi {
            next_stuck_check: now + params.stuck_check_interval,
            params,
            rng,
            patrol_dir,
            next_decision: 0.0,
            last_check_pos: position,
            wander: None,
        }
    }

    #[cfg(test)]
    pub fn patrol_dir(&self) -> f32 {
        self.patrol_dir
    }

    /// End time of the current wander, if wandering.
    #[cfg(test)]
    pub fn wander_until(&self) -> Option<f32> {
        self.wander.map(|w| w.until)
    }

    fn reset_stuck_check(&mut self, now: f32, position: Vec2) {
        self.last_check_pos = position;
        self.next_stuck_check = now + self.params.stuck_check_interval;
    }

    /// Returns true if a wander was started.
    fn check_stuck(&mut self, now: f32, position: Vec2) -> bool {
        if now < self.next_stuck_check {
            return false;
        }
        let moved = position.distance(self.last_check_pos);
        self.reset_stuck_check(now, position);
        if moved >= self.params.min_stuck_distance {
            return false;
        }
        let duration = self.rng.gen_range(self.params.wander_min_time..=self.params.wander_max_time);
        let dir = random_dir(&mut self.rng);
        self.wander = Some(Wander { dir, until: now + duration });
        log::debug!("stuck (moved {moved:.2}), wandering {duration:.1}s toward {dir}");
        true
    }

    fn patrol<Q: SpatialQuery + ?Sized>(&mut self, view: &AiView<'_, Q>, intent: &mut Vec2) {
        *intent = Vec2::new(self.patrol_dir, 0.0);
        if self.should_turn_around(view) {
            self.patrol_dir = -self.patrol_dir;
        }
    }

    /// Ledge ahead (no floor under the look-ahead point while grounded) or a
    /// wall right in front.
    fn should_turn_around<Q: SpatialQuery + ?Sized>(&self, view: &AiView<'_, Q>) -> bool {
        let ahead = view.position + Vec2::new(self.patrol_dir * PATROL_LOOK_AHEAD, 0.0);
        let floor = view.world.raycast(ahead, Vec2::NEG_Y, PATROL_FLOOR_RAY, LayerMask::SOLID);
        if floor.is_none() && view.senses.grounded {
            return true;
        }
        let forward = Vec2::new(self.patrol_dir, 0.0);
        view.world
            .raycast(view.position, forward, PATROL_LOOK_AHEAD, LayerMask::SOLID)
            .is_some()
    }

    /// Chase decision with active ladder seeking.
    fn smart_chase<Q: SpatialQuery + ?Sized>(&self, view: &AiView<'_, Q>, target: Vec2) -> Vec2 {
        let p = &self.params;
        let delta = target - view.position;
        let s = view.senses;

        if delta.y.abs() > p.vertical_threshold {
            if s.on_ladder {
                let nudge = if delta.x.abs() > p.chase_threshold { LADDER_NUDGE * toward(delta.x) } else { 0.0 };
                return Vec2::new(nudge, toward(delta.y));
            }
            if s.grounded {
                if let Some(ladder) = find_nearest_ladder(view.world, view.position, p.ladder_search_radius) {
                    let off = ladder.x - view.position.x;
                    return if off.abs() > p.alignment_threshold {
                        Vec2::new(toward(off), 0.0)
                    } else {
                        Vec2::new(0.0, toward(delta.y))
                    };
                }
            }
        }

        let ix = if delta.x.abs() > p.chase_threshold { toward(delta.x) } else { 0.0 };
        let iy = if s.on_ladder && delta.y.abs() > p.chase_threshold { toward(delta.y) } else { 0.0 };
        Vec2::new(ix, iy)
    }
}

impl EnemyAi for PatrolAi {
    fn think<Q: SpatialQuery + ?Sized>(&mut self, view: &AiView<'_, Q>, intent: &mut Vec2) -> AiMode {
        let Some(target) = view.target else {
            if self.params.always_moving {
                self.patrol(view, intent);
                return AiMode::Patrolling;
            }
            *intent = Vec2::ZERO;
            return AiMode::Idle;
        };

        if let Some(w) = self.wander {
            *intent = Vec2::new(w.dir, 0.0);
            if view.now >= w.until {
                self.wander = None;
                self.reset_stuck_check(view.now, view.position);
                log::debug!("wander over, back to chasing");
            }
            return AiMode::Wandering;
        }

        if view.position.distance(target) <= self.params.detection_range {
            if self.check_stuck(view.now, view.position) {
                if let Some(w) = self.wander {
                    *intent = Vec2::new(w.dir, 0.0);
                }
                return AiMode::Wandering;
            }
            if view.now >= self.next_decision {
                *intent = self.smart_chase(view, target);
                self.next_decision = view.now + self.params.update_interval;
            }
            return AiMode::Chasing;
        }

        if self.params.always_moving {
            self.patrol(view, intent);
            AiMode::Patrolling
        } else {
            *intent = Vec2::ZERO;
            AiMode::Idle
        }
    }

    fn on_respawn(&mut self, now: f32, position: Vec2) -> AiMode {
        self.wander = None;
        self.reset_stuck_check(now, position);
        self.patrol_dir = random_dir(&mut self.rng);
        AiMode::Patrolling
    }

    fn initial_mode(&self) -> AiMode {
        AiMode::Patrolling
    }
}

fn random_dir(rng: &mut SmallRng) -> f32 {
    if rng.gen_bool(0.5) { 1.0 } else { -1.0 }
}

// ══════════════════════════════════════════════════════════════
// Unit tests
// ══════════════════════════════════════════════════════════════
