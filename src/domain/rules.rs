/// Locomotion rules: truth-table driven.
///
/// Pure functions: sensing + intent in, state + velocity out. They never
/// touch the world; `sim::step` applies what they return.
///
/// ## Enemy State Resolution
///
/// Inputs: `grounded`, `on_ladder`, intent `(ix, iy)`, current state.
/// A component of the intent counts as "set" when its magnitude exceeds 0.1.
///
/// ┌──────────────────────────────────────┬──────────────┬────────────┐
/// │ Condition (priority order)            │ New State    │ Gravity    │
/// ├──────────────────────────────────────┼──────────────┼────────────┤
/// │ on ladder, iy set                     │ Climbing     │ off        │
/// │ Climbing, on ladder, grounded, iy = 0 │ Walking      │ on         │
/// │ Climbing, on ladder                   │ Climbing     │ off        │
/// │ on ladder, grounded                   │ Walking      │ on         │
/// │ on ladder, airborne                   │ unchanged*   │ off, vy=0  │
/// │ grounded, ix set                      │ Walking      │ on         │
/// │ grounded                              │ Idle         │ on         │
/// │ otherwise                             │ Falling      │ on         │
/// └──────────────────────────────────────┴──────────────┴────────────┘
///
/// * Falling lands as Walking: a ladder top is footing.
///
/// Walking is then flavoured by the AI mode (Patrolling / Chasing /
/// Wandering); all four move identically.
///
/// ## Velocity
///
/// ┌──────────────────────────┬──────────────────────────────────────────┐
/// │ State                     │ Velocity                                 │
/// ├──────────────────────────┼──────────────────────────────────────────┤
/// │ Idle                      │ vx = 0                                   │
/// │ Walking (any flavour)     │ vx = ix × walk                           │
/// │ Climbing, iy set          │ vy = iy × climb, vx = ix × walk × 0.1,   │
/// │                           │ x pulled to ladder centre at 10 u/s      │
/// │ Climbing, iy = 0          │ vy = 0, vx = ix × walk × 0.5             │
/// │ Falling                   │ vx = 0                                   │
/// │ StuckInHole / Dead        │ zero                                     │
/// └──────────────────────────┴──────────────────────────────────────────┘

use glam::Vec2;

use super::entity::{AiMode, EnemyState, PlayerState, Senses};

/// Ladder centring speed (units per second).
pub const LADDER_CENTER_SPEED: f32 = 10.0;
/// Player drift toward the column centre while falling (units per second).
pub const FALL_ALIGN_SPEED: f32 = 3.0;
/// Downward speed when letting go of a rope.
pub const ROPE_DROP_SPEED: f32 = 2.0;

const INTENT_EPS: f32 = 0.1;
const CENTER_EPS: f32 = 0.01;
const CLIMB_DRIFT: f32 = 0.1;
const LADDER_STEP_OFF: f32 = 0.5;

#[inline]
fn set(v: f32) -> bool {
    v.abs() > INTENT_EPS
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Gravity {
    On,
    Off,
    /// Off, and vertical velocity zeroed (hanging on a ladder edge).
    Hold,
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct Locomotion<S> {
    pub state: S,
    pub gravity: Gravity,
}

#[derive(Clone, Copy, PartialEq, Debug)]
pub struct Speeds {
    pub walk: f32,
    pub climb: f32,
}

/// Velocity and (possibly corrected) x for one physics tick.
#[derive(Clone, Copy, PartialEq, Debug)]
pub struct Motion {
    pub vel: Vec2,
    pub x: f32,
}

pub fn move_towards(current: f32, target: f32, max_delta: f32) -> f32 {
    if (target - current).abs() <= max_delta {
        target
    } else {
        current + (target - current).signum() * max_delta
    }
}

// ── Enemy ──

/// Resolve the enemy's locomotion state. See the table above.
pub fn resolve_enemy(current: EnemyState, senses: Senses, intent: Vec2) -> Locomotion<EnemyState> {
    use EnemyState::*;

    let walk = |gravity| Locomotion { state: Walking, gravity };

    if senses.on_ladder && set(intent.y) {
        return Locomotion { state: Climbing, gravity: Gravity::Off };
    }
    if current == Climbing && senses.on_ladder {
        if senses.grounded && !set(intent.y) {
            return walk(Gravity::On);
        }
        return Locomotion { state: Climbing, gravity: Gravity::Off };
    }
    if senses.on_ladder {
        if senses.grounded {
            return walk(Gravity::On);
        }
        let state = if current == Falling { Walking } else { current };
        return Locomotion { state, gravity: Gravity::Hold };
    }
    if senses.grounded {
        let state = if set(intent.x) { Walking } else { Idle };
        return Locomotion { state, gravity: Gravity::On };
    }
    Locomotion { state: Falling, gravity: Gravity::On }
}

/// Walking reported under the behaviour that drives it.
pub fn flavour(state: EnemyState, mode: AiMode) -> EnemyState {
    match (state, mode) {
        (EnemyState::Walking, AiMode::Patrolling) => EnemyState::Patrolling,
        (EnemyState::Walking, AiMode::Chasing) => EnemyState::Chasing,
        (EnemyState::Walking, AiMode::Wandering) => EnemyState::Wandering,
        (s, _) => s,
    }
}

pub fn enemy_motion(
    state: EnemyState,
    intent: Vec2,
    vel: Vec2,
    x: f32,
    ladder_center_x: f32,
    speeds: Speeds,
    dt: f32,
) -> Motion {
    use EnemyState::*;
    match state {
        Idle => Motion { vel: Vec2::new(0.0, vel.y), x },
        Walking | Patrolling | Chasing | Wandering => Motion { vel: Vec2::new(intent.x * speeds.walk, vel.y), x },
        Climbing => climb_motion(intent, x, ladder_center_x, speeds, dt),
        Falling => Motion { vel: Vec2::new(0.0, vel.y), x },
        StuckInHole | Dead => Motion { vel: Vec2::ZERO, x },
    }
}

fn climb_motion(intent: Vec2, x: f32, ladder_center_x: f32, speeds: Speeds, dt: f32) -> Motion {
    if set(intent.y) {
        let x = if (x - ladder_center_x).abs() > CENTER_EPS {
            move_towards(x, ladder_center_x, LADDER_CENTER_SPEED * dt)
        } else {
            x
        };
        Motion { vel: Vec2::new(intent.x * speeds.walk * CLIMB_DRIFT, intent.y * speeds.climb), x }
    } else {
        Motion { vel: Vec2::new(intent.x * speeds.walk * LADDER_STEP_OFF, 0.0), x }
    }
}

// ── Player ──

/// Player variant: adds rope hanging, and only leaves a ladder onto the
/// ground when stepping sideways.
pub fn resolve_player(current: PlayerState, senses: Senses, on_rope: bool, input: Vec2) -> Locomotion<PlayerState> {
    use PlayerState::*;

    if senses.on_ladder && set(input.y) {
        return Locomotion { state: Climbing, gravity: Gravity::Off };
    }
    if current == Climbing && senses.on_ladder {
        if senses.grounded && !set(input.y) && set(input.x) {
            return Locomotion { state: Walking, gravity: Gravity::On };
        }
        return Locomotion { state: Climbing, gravity: Gravity::Off };
    }
    if senses.on_ladder {
        if senses.grounded {
            return Locomotion { state: Walking, gravity: Gravity::On };
        }
        let state = if current == Falling { Walking } else { current };
        return Locomotion { state, gravity: Gravity::Hold };
    }
    if on_rope && !senses.grounded {
        return Locomotion { state: OnRope, gravity: Gravity::Off };
    }
    if senses.grounded {
        return Locomotion { state: Walking, gravity: Gravity::On };
    }
    Locomotion { state: Falling, gravity: Gravity::On }
}

#[derive(Clone, Copy, PartialEq, Debug)]
pub struct PlayerSpeeds {
    pub walk: f32,
    pub climb: f32,
    pub rope: f32,
}

/// Returns the motion plus the state after motion (dropping off a rope
/// switches to Falling).
pub fn player_motion(
    state: PlayerState,
    input: Vec2,
    vel: Vec2,
    x: f32,
    ladder_center_x: f32,
    speeds: PlayerSpeeds,
    dt: f32,
) -> (Motion, PlayerState) {
    use PlayerState::*;
    match state {
        Walking => (Motion { vel: Vec2::new(input.x * speeds.walk, vel.y), x }, Walking),
        Falling => {
            let column = x.round();
            let x = if (x - column).abs() > CENTER_EPS { move_towards(x, column, FALL_ALIGN_SPEED * dt) } else { x };
            (Motion { vel: Vec2::new(0.0, vel.y), x }, Falling)
        }
        Climbing => {
            let s = Speeds { walk: speeds.walk, climb: speeds.climb };
            (climb_motion(input, x, ladder_center_x, s, dt), Climbing)
        }
        OnRope => {
            if input.y < -INTENT_EPS {
                (Motion { vel: Vec2::new(input.x * speeds.rope, -ROPE_DROP_SPEED), x }, Falling)
            } else {
                (Motion { vel: Vec2::new(input.x * speeds.rope, 0.0), x }, OnRope)
            }
        }
    }
}

// ══════════════════════════════════════════════════════════════
// Unit tests
// ══════════════════════════════════════════════════════════════
