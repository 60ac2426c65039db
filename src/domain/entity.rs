/// Entities: Enemy, Player, DiggableBlock (dig / restore lifecycle), Pickup.
///
/// Entities own their kinematic state and timers. They never look at the
/// world themselves: sensing and collision live in `sim`, decisions in
/// `domain::ai`, locomotion in `domain::rules`.

use glam::Vec2;

use super::ai::{Brain, EnemyAi};

/// Half extents shared by every walking body (0.8 wide, 0.9 tall).
pub const BODY_HALF: Vec2 = Vec2::new(0.4, 0.45);

pub const DEFAULT_GRAVITY_SCALE: f32 = 3.0;

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Facing {
    Left,
    Right,
}

impl Facing {
    pub fn sign(self) -> f32 {
        match self {
            Facing::Left => -1.0,
            Facing::Right => 1.0,
        }
    }

    /// Facing implied by a horizontal intent, if it is decisive.
    pub fn from_intent(ix: f32) -> Option<Facing> {
        if ix > 0.1 {
            Some(Facing::Right)
        } else if ix < -0.1 {
            Some(Facing::Left)
        } else {
            None
        }
    }
}

/// Movement direction (continuous while held)
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum MoveDir {
    Left,
    Right,
    Up,
    Down,
}

impl MoveDir {
    pub fn axis(self) -> Vec2 {
        match self {
            MoveDir::Left => Vec2::NEG_X,
            MoveDir::Right => Vec2::X,
            MoveDir::Up => Vec2::Y,
            MoveDir::Down => Vec2::NEG_Y,
        }
    }
}

/// Frame input: separates movement from dig so both can fire in one tick.
/// Movement = continuous (held), Dig = edge-triggered (fresh press).
#[derive(Clone, Copy, Debug, Default)]
pub struct FrameInput {
    pub movement: Option<MoveDir>,
    pub dig: Option<Facing>,
}

/// Non-owning handle into the world's player list.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub struct PlayerId(pub usize);

// ══════════════════════════════════════════════════════════════
// Enemy
// ══════════════════════════════════════════════════════════════

/// Locomotion / lifecycle state of an enemy.
///
/// Idle, Walking, Climbing and Falling come from the locomotion resolver.
/// Patrolling, Wandering and Chasing are the behaviour-flavoured variants
/// reported when the agent walks under that behaviour. StuckInHole and Dead
/// are entered from outside and left only through their timers.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub enum EnemyState {
    #[default]
    Idle,
    Patrolling,
    Walking,
    Climbing,
    Falling,
    Wandering,
    Chasing,
    StuckInHole,
    Dead,
}

impl EnemyState {
    /// Terminal-ish states: the AI and the state machine are suspended.
    pub fn is_disabled(self) -> bool {
        matches!(self, EnemyState::StuckInHole | EnemyState::Dead)
    }
}

/// What the movement policy is currently trying to do.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub enum AiMode {
    #[default]
    Idle,
    Patrolling,
    Chasing,
    Wandering,
}

/// Per-frame environment sensing for one body.
#[derive(Clone, Copy, PartialEq, Debug, Default)]
pub struct Senses {
    pub grounded: bool,
    pub on_ladder: bool,
    /// Horizontal centre of the ladder collider being touched.
    pub ladder_center_x: f32,
}

#[derive(Clone, Debug)]
pub struct Enemy {
    pub id: usize,
    pub pos: Vec2,
    pub vel: Vec2,
    pub half: Vec2,
    pub facing: Facing,
    pub state: EnemyState,
    pub mode: AiMode,
    pub gravity_scale: f32,
    base_gravity_scale: f32,
    pub collider_enabled: bool,
    /// Last direction chosen by the AI; held between decisions.
    pub intent: Vec2,
    pub senses: Senses,
    pub target: Option<PlayerId>,
    pub anchor: Vec2,
    pub hole_timer: f32,
    pub respawn_at: Option<f32>,
    pub brain: Brain,
}

impl Enemy {
    pub fn new(id: usize, pos: Vec2, brain: Brain, gravity_scale: f32) -> Self {
        let mode = brain.initial_mode();
        Enemy {
            id,
            pos,
            vel: Vec2::ZERO,
            half: BODY_HALF,
            facing: Facing::Right,
            state: state_for_mode(mode),
            mode,
            gravity_scale,
            base_gravity_scale: gravity_scale,
            collider_enabled: true,
            intent: Vec2::ZERO,
            senses: Senses::default(),
            target: None,
            anchor: pos,
            hole_timer: 0.0,
            respawn_at: None,
            brain,
        }
    }

    pub fn is_dead(&self) -> bool {
        self.state == EnemyState::Dead
    }

    pub fn is_trapped(&self) -> bool {
        self.state == EnemyState::StuckInHole
    }

    /// Neither trapped nor dead.
    pub fn is_active(&self) -> bool {
        !self.state.is_disabled()
    }

    pub fn base_gravity_scale(&self) -> f32 {
        self.base_gravity_scale
    }

    /// Enter StuckInHole. Returns false (no-op) if already trapped or dead.
    pub fn stuck_in_hole(&mut self) -> bool {
        if self.state.is_disabled() {
            return false;
        }
        self.state = EnemyState::StuckInHole;
        self.hole_timer = 0.0;
        self.vel = Vec2::ZERO;
        self.gravity_scale = 0.0;
        true
    }

    /// Enter Dead. Returns false (no-op) if already dead.
    pub fn die(&mut self, now: f32, respawn_delay: f32) -> bool {
        if self.is_dead() {
            return false;
        }
        self.state = EnemyState::Dead;
        self.collider_enabled = false;
        self.vel = Vec2::ZERO;
        self.gravity_scale = 0.0;
        self.respawn_at = Some(now + respawn_delay);
        true
    }

    /// Back to the anchor with physics, collider and AI reset.
    pub fn respawn(&mut self, now: f32) {
        self.pos = self.anchor;
        self.vel = Vec2::ZERO;
        self.intent = Vec2::ZERO;
        self.gravity_scale = self.base_gravity_scale;
        self.collider_enabled = true;
        self.hole_timer = 0.0;
        self.respawn_at = None;
        self.mode = self.brain.on_respawn(now, self.anchor);
        self.state = state_for_mode(self.mode);
    }

    pub fn face_intent(&mut self) {
        if let Some(f) = Facing::from_intent(self.intent.x) {
            self.facing = f;
        }
    }
}

fn state_for_mode(mode: AiMode) -> EnemyState {
    match mode {
        AiMode::Patrolling => EnemyState::Patrolling,
        _ => EnemyState::Idle,
    }
}

// ══════════════════════════════════════════════════════════════
// Player
// ══════════════════════════════════════════════════════════════

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum PlayerState {
    Walking,
    Climbing,
    OnRope,
    Falling,
}

#[derive(Clone, Debug)]
pub struct Player {
    pub pos: Vec2,
    pub vel: Vec2,
    pub half: Vec2,
    pub facing: Facing,
    pub state: PlayerState,
    pub gravity_scale: f32,
    pub alive: bool,
    /// Movement input held for this tick's physics.
    pub intent: Vec2,
    pub senses: Senses,
    pub on_rope: bool,
    pub spawn: Vec2,
    pub last_dig: Option<f32>,
    pub respawn_at: Option<f32>,
}

impl Player {
    pub fn new(pos: Vec2) -> Self {
        Player {
            pos,
            vel: Vec2::ZERO,
            half: BODY_HALF,
            facing: Facing::Right,
            state: PlayerState::Walking,
            gravity_scale: DEFAULT_GRAVITY_SCALE,
            alive: true,
            intent: Vec2::ZERO,
            senses: Senses::default(),
            on_rope: false,
            spawn: pos,
            last_dig: None,
            respawn_at: None,
        }
    }

    /// Returns false if already dead.
    pub fn die(&mut self, now: f32, respawn_delay: f32) -> bool {
        if !self.alive {
            return false;
        }
        self.alive = false;
        self.vel = Vec2::ZERO;
        self.gravity_scale = 0.0;
        self.respawn_at = Some(now + respawn_delay);
        true
    }

    pub fn respawn(&mut self) {
        self.alive = true;
        self.pos = self.spawn;
        self.vel = Vec2::ZERO;
        self.intent = Vec2::ZERO;
        self.gravity_scale = DEFAULT_GRAVITY_SCALE;
        self.state = PlayerState::Falling;
        self.respawn_at = None;
    }

    pub fn can_dig(&self, now: f32, cooldown: f32) -> bool {
        self.alive && self.last_dig.map_or(true, |t| now >= t + cooldown)
    }
}

// ══════════════════════════════════════════════════════════════
// Diggable block
// ══════════════════════════════════════════════════════════════

pub const DEFAULT_RESTORE_TIME: f32 = 5.0;

/// Fraction of the restore countdown after which the block starts blinking.
const WARNING_START: f32 = 0.7;

#[derive(Clone, Copy, PartialEq, Debug)]
pub enum BlockState {
    Intact,
    Dug { elapsed: f32, restore_time: f32 },
}

/// A brick that can be dug out and grows back.
///
/// ```text
///   Intact ──dig()──▶ Dug ──tick() × restore_time──▶ Intact (crush check)
///                      │
///                      └──instant_restore()──▶ Intact (crush check)
/// ```
///
/// The block owns a terrain collider (`collider`); the world disables it
/// while the block is dug.
#[derive(Clone, Debug)]
pub struct DiggableBlock {
    pub collider: usize,
    pub pos: Vec2,
    pub state: BlockState,
    diggable: bool,
}

impl DiggableBlock {
    pub fn new(collider: usize, pos: Vec2) -> Self {
        DiggableBlock { collider, pos, state: BlockState::Intact, diggable: true }
    }

    pub fn is_dug(&self) -> bool {
        matches!(self.state, BlockState::Dug { .. })
    }

    pub fn is_diggable(&self) -> bool {
        self.diggable
    }

    pub fn set_diggable(&mut self, value: bool) {
        self.diggable = value;
    }

    /// Returns false if the block cannot be dug or is already open.
    pub fn dig(&mut self, restore_time: Option<f32>) -> bool {
        if !self.diggable || self.is_dug() {
            return false;
        }
        let restore_time = restore_time.unwrap_or(DEFAULT_RESTORE_TIME).max(0.0);
        self.state = BlockState::Dug { elapsed: 0.0, restore_time };
        true
    }

    /// Advance the restore countdown. Returns true on the tick the block
    /// becomes Intact again.
    pub fn tick(&mut self, dt: f32) -> bool {
        let BlockState::Dug { elapsed, restore_time } = &mut self.state else {
            return false;
        };
        *elapsed += dt;
        if *elapsed >= *restore_time {
            self.state = BlockState::Intact;
            return true;
        }
        false
    }

    /// Skip the countdown. Returns true if the block was dug.
    pub fn instant_restore(&mut self) -> bool {
        if !self.is_dug() {
            return false;
        }
        self.state = BlockState::Intact;
        true
    }

    /// 0.0 → 1.0 across the warning phase; `None` outside it.
    pub fn warning_progress(&self) -> Option<f32> {
        let BlockState::Dug { elapsed, restore_time } = self.state else {
            return None;
        };
        let start = restore_time * WARNING_START;
        if elapsed < start {
            return None;
        }
        let span = restore_time - start;
        if span <= 0.0 {
            return Some(1.0);
        }
        Some(((elapsed - start) / span).min(1.0))
    }

    pub fn is_warning(&self) -> bool {
        self.warning_progress().is_some()
    }

    /// Should the brick be drawn this instant? Hidden while open, blinking
    /// faster and faster during the warning phase.
    pub fn blink_visible(&self) -> bool {
        match self.state {
            BlockState::Intact => true,
            BlockState::Dug { elapsed, .. } => match self.warning_progress() {
                Some(p) => (elapsed * lerp(2.0, 8.0, p)).sin() > 0.0,
                None => false,
            },
        }
    }
}

fn lerp(a: f32, b: f32, t: f32) -> f32 {
    a + (b - a) * t
}

// ══════════════════════════════════════════════════════════════
// Pickups
// ══════════════════════════════════════════════════════════════

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum PickupKind {
    Gold,
    Key,
}

#[derive(Clone, Debug)]
pub struct Pickup {
    pub kind: PickupKind,
    pub pos: Vec2,
    pub collected: bool,
}

impl Pickup {
    pub fn new(kind: PickupKind, pos: Vec2) -> Self {
        Pickup { kind, pos, collected: false }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ai::{AiKind, AiParams};

    fn enemy() -> Enemy {
        let brain = Brain::new(AiKind::Patrol, &AiParams::default(), 7, 0.0, Vec2::ZERO);
        Enemy::new(0, Vec2::new(2.0, 1.0), brain, DEFAULT_GRAVITY_SCALE)
    }

    #[test]
    fn block_restores_after_restore_time() {
        let dt = 0.02;
        let mut b = DiggableBlock::new(0, Vec2::ZERO);
        assert!(b.dig(Some(5.0)));
        let mut t = 0.0;
        loop {
            t += dt;
            if b.tick(dt) {
                break;
            }
            assert!(t < 6.0, "never restored");
        }
        assert!((t - 5.0).abs() <= dt + 1e-4, "restored at {t}");
        assert!(!b.is_dug());
    }

    #[test]
    fn dig_is_refused_when_open_or_not_diggable() {
        let mut b = DiggableBlock::new(0, Vec2::ZERO);
        assert!(b.dig(None));
        assert!(!b.dig(None));
        assert_eq!(b.state, BlockState::Dug { elapsed: 0.0, restore_time: DEFAULT_RESTORE_TIME });

        let mut solid = DiggableBlock::new(1, Vec2::ZERO);
        solid.set_diggable(false);
        assert!(!solid.dig(None));
    }

    #[test]
    fn warning_phase_is_last_thirty_percent() {
        let mut b = DiggableBlock::new(0, Vec2::ZERO);
        b.dig(Some(10.0));
        b.tick(6.9);
        assert!(!b.is_warning());
        assert!(!b.blink_visible());
        b.tick(0.2);
        let p = b.warning_progress().unwrap();
        assert!(p > 0.0 && p < 0.1);
    }

    #[test]
    fn instant_restore_only_when_dug() {
        let mut b = DiggableBlock::new(0, Vec2::ZERO);
        assert!(!b.instant_restore());
        b.dig(None);
        assert!(b.instant_restore());
        assert!(b.blink_visible());
    }

    #[test]
    fn stuck_in_hole_is_idempotent() {
        let mut e = enemy();
        e.vel = Vec2::new(3.0, -1.0);
        assert!(e.stuck_in_hole());
        assert_eq!(e.vel, Vec2::ZERO);
        assert_eq!(e.gravity_scale, 0.0);
        e.hole_timer = 1.0;
        assert!(!e.stuck_in_hole());
        assert_eq!(e.hole_timer, 1.0);
    }

    #[test]
    fn die_is_idempotent_and_disables_collider() {
        let mut e = enemy();
        assert!(e.die(1.0, 2.0));
        assert!(!e.collider_enabled);
        assert_eq!(e.respawn_at, Some(3.0));
        assert!(!e.die(1.5, 2.0));
        assert_eq!(e.respawn_at, Some(3.0));
    }

    #[test]
    fn respawn_returns_to_anchor() {
        let mut e = enemy();
        e.pos = Vec2::new(9.0, 9.0);
        e.die(0.0, 2.0);
        e.respawn(2.0);
        assert_eq!(e.pos, e.anchor);
        assert!(e.collider_enabled);
        assert_eq!(e.mode, AiMode::Patrolling);
        assert_eq!(e.state, EnemyState::Patrolling);
        assert_eq!(e.gravity_scale, DEFAULT_GRAVITY_SCALE);
    }

    #[test]
    fn dead_enemy_cannot_be_trapped() {
        let mut e = enemy();
        e.die(0.0, 2.0);
        assert!(!e.stuck_in_hole());
        assert!(e.is_dead());
    }

    #[test]
    fn player_dig_cooldown() {
        let mut p = Player::new(Vec2::ZERO);
        assert!(p.can_dig(0.0, 0.5));
        p.last_dig = Some(1.0);
        assert!(!p.can_dig(1.2, 0.5));
        assert!(p.can_dig(1.5, 0.5));
        p.die(2.0, 2.0);
        assert!(!p.can_dig(3.0, 0.5));
    }
}
