//! Discrete game events and read-only snapshots for renderers, HUDs and audio

use glam::Vec3;
use serde::{Deserialize, Serialize};

use super::pusher::{ControlMode, PusherPhase, Side};

/// Index of an arena within its pool
pub type ArenaId = usize;

/// Why an arena was reset
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ResetReason {
    Goal,
    StepLimit,
    /// Requested by the host (driver, UI, tests)
    External,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum GameEvent {
    /// A pusher started touching the puck
    PuckStrike { side: Side },
    /// Puck entered a goal pocket; scores after counting the goal
    Goal { scorer: Side, near: u32, far: u32 },
    /// A side reached the win threshold; scores are zeroed with the reset
    MatchWon { winner: Side },
    /// Episode boundary applied
    EpisodeReset { reason: ResetReason },
}

/// Event tagged with its arena
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArenaEvent {
    pub arena: ArenaId,
    pub event: GameEvent,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BodySnapshot {
    pub local: Vec3,
    pub world: Vec3,
    pub vel: Vec3,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PusherSnapshot {
    pub side: Side,
    pub body: BodySnapshot,
    pub mode: ControlMode,
    pub phase: PusherPhase,
    pub steps: u32,
    pub episode_reward: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArenaSnapshot {
    pub arena: ArenaId,
    pub origin: Vec3,
    pub puck: BodySnapshot,
    pub pushers: [PusherSnapshot; 2],
    pub score_near: u32,
    pub score_far: u32,
    pub episodes: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PoolSnapshot {
    pub step: u64,
    pub arenas: Vec<ArenaSnapshot>,
}
