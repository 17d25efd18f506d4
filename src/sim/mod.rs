//! Deterministic simulation module
//!
//! All gameplay logic lives here. This module must stay pure and deterministic:
//! - Fixed timestep only
//! - Seeded per-arena RNG only
//! - Stable iteration order (arena id, then Near before Far)
//! - No rendering or platform dependencies

pub mod arena;
pub mod body;
pub mod clamp;
pub mod collision;
pub mod events;
pub mod goal;
pub mod policy;
pub mod pool;
pub mod pusher;
pub mod score;
pub mod table;

pub use arena::{Arena, ArenaBuilder, ArenaStepReport, StartPoses};
pub use body::RigidBody;
pub use clamp::{Axis, AxisRange, clamp_axis};
pub use collision::{
    Contact, circle_circle_contact, circle_plane_contact, resolve_absorbing, resolve_elastic,
    resolve_wall_bounce,
};
pub use events::{
    ArenaEvent, ArenaId, ArenaSnapshot, BodySnapshot, GameEvent, PoolSnapshot, PusherSnapshot,
    ResetReason,
};
pub use goal::GoalTrigger;
pub use policy::{
    ChasePuckPolicy, Direction, IdlePolicy, OBSERVATION_SIZE, Observation, Policy, PolicyHandle,
    Transition,
};
pub use pool::{ArenaPool, grid_offset};
pub use pusher::{ControlMode, DecisionSource, Pusher, PusherPhase, ScriptedController, Side};
pub use score::ScoreTracker;
pub use table::{Rect, Table, Wall};
