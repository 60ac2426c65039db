/// Events emitted during a simulation step.
/// The runner logs them; a presentation layer would animate/sound them.

use glam::Vec2;

use crate::domain::entity::{AiMode, PlayerId};

#[derive(Clone, Debug, PartialEq)]
pub enum GameEvent {
    HoleDug { block: usize, pos: Vec2 },
    /// The hole entered its warning phase and starts blinking.
    HoleClosing { block: usize },
    HoleRestored { block: usize, pos: Vec2 },
    EnemySpawned { id: usize, pos: Vec2 },
    EnemyModeChanged { id: usize, mode: AiMode },
    EnemyTrapped { id: usize },
    EnemyKilled { id: usize, crushed: bool },
    EnemyRespawned { id: usize },
    PlayerKilled { player: PlayerId },
    PlayerRespawned { player: PlayerId },
    GoldCollected { collected: usize, total: usize },
    AllGoldCollected,
    KeyCollected,
    ExitBlocked { reason: String },
    LevelComplete { score: u32 },
    LevelReset,
}
