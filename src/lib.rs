//! Air hockey arena simulation
//!
//! Core modules:
//! - `sim`: Deterministic simulation (physics, collisions, arenas, pool)
//! - `settings`: Data-driven tuning and grid layout
//! - `error`: Configuration and arena construction errors

pub mod error;
pub mod settings;
pub mod sim;

pub use error::{ArenaError, ConfigError};
pub use settings::SimSettings;

use glam::{Vec2, Vec3};

/// Simulation configuration constants
pub mod consts {
    /// Fixed simulation timestep (50 Hz physics)
    pub const SIM_DT: f32 = 1.0 / 50.0;

    /// Table dimensions (local frame, metres)
    pub const TABLE_HALF_LENGTH: f32 = 2.0;
    pub const TABLE_HALF_WIDTH: f32 = 1.0;
    pub const GOAL_HALF_WIDTH: f32 = 0.35;
    pub const GOAL_DEPTH: f32 = 0.5;

    /// Body defaults
    pub const PUCK_RADIUS: f32 = 0.1;
    pub const PUSHER_RADIUS: f32 = 0.15;
    pub const PUCK_MASS: f32 = 1.0;
    pub const PUSHER_MASS: f32 = 1.0;
    pub const PUCK_MAX_SPEED: f32 = 10.0;

    /// Pusher actuation (m/s and m/s²)
    pub const PUSHER_MAX_SPEED: f32 = 2.5;
    pub const PUSHER_ACCEL_RATE: f32 = 25.0;
    pub const PUSHER_DECEL_RATE: f32 = 18.0;
    /// Divisor used to normalize observed positions
    pub const OBS_HALF_TABLE_WIDTH: f32 = 2.0;

    /// Speed added along a wall's normal on every bounce
    pub const WALL_BOUNCE_KICK: f32 = 0.4;
    /// Minimum post-bounce speed; slower bounces are forced outward at this speed
    pub const UNSTICK_SPEED: f32 = 0.15;

    /// Total mass below which a collision is skipped
    pub const MIN_TOTAL_MASS: f32 = 1e-6;

    /// Episode defaults
    pub const DEFAULT_MAX_STEPS: u32 = 5000;
    pub const DEFAULT_WIN_THRESHOLD: u32 = 7;
    pub const DEFAULT_POLICY_PROBABILITY: f32 = 0.9;
}

/// Drop the vertical component of a vector
#[inline]
pub fn planar(v: Vec3) -> Vec3 {
    Vec3::new(v.x, 0.0, v.z)
}

/// Project a local-frame vector onto the table plane (x, z)
#[inline]
pub fn to_table(v: Vec3) -> Vec2 {
    Vec2::new(v.x, v.z)
}

/// Move `current` toward `target` by at most `max_delta`, never overshooting
#[inline]
pub fn move_towards(current: Vec3, target: Vec3, max_delta: f32) -> Vec3 {
    let delta = target - current;
    let dist = delta.length();
    if dist <= max_delta || dist <= f32::EPSILON {
        target
    } else {
        current + delta / dist * max_delta
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_move_towards_does_not_overshoot() {
        let v = move_towards(Vec3::ZERO, Vec3::new(1.0, 0.0, 0.0), 5.0);
        assert_eq!(v, Vec3::new(1.0, 0.0, 0.0));
    }

    #[test]
    fn test_move_towards_partial_step() {
        let v = move_towards(Vec3::ZERO, Vec3::new(2.5, 0.0, 0.0), 0.5);
        assert!((v.x - 0.5).abs() < 1e-6);
        assert_eq!(v.z, 0.0);
    }

    #[test]
    fn test_planar_drops_height() {
        assert_eq!(planar(Vec3::new(1.0, 3.0, -2.0)), Vec3::new(1.0, 0.0, -2.0));
        assert_eq!(to_table(Vec3::new(1.0, 3.0, -2.0)), Vec2::new(1.0, -2.0));
    }
}
