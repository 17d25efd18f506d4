//! Minimal planar rigid body
//!
//! Position and velocity live in the owning arena's local frame. Height is
//! fixed: vertical velocity is driven to zero on every mutation path.

use glam::Vec3;
use serde::{Deserialize, Serialize};

use crate::consts::MIN_TOTAL_MASS;
use crate::error::ArenaError;

/// Physics state for the puck or a pusher
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RigidBody {
    /// Local-frame position
    pub pos: Vec3,
    /// Local-frame linear velocity (y always 0)
    pub vel: Vec3,
    /// Yaw rate; rotation is frozen so this only ever gets cleared
    pub angular_vel: f32,
    pub mass: f32,
    /// Collision radius on the table plane
    pub radius: f32,
}

impl RigidBody {
    pub fn new(pos: Vec3, mass: f32, radius: f32) -> Self {
        Self {
            pos,
            vel: Vec3::ZERO,
            angular_vel: 0.0,
            mass,
            radius,
        }
    }

    /// Reject bodies that cannot take part in a collision
    pub fn validate(&self, body: &'static str) -> Result<(), ArenaError> {
        if !self.mass.is_finite() || self.mass <= MIN_TOTAL_MASS {
            return Err(ArenaError::InvalidMass {
                body,
                mass: self.mass,
            });
        }
        Ok(())
    }

    /// Advance position by one step of the current velocity
    pub fn integrate(&mut self, dt: f32) {
        self.vel.y = 0.0;
        self.pos += self.vel * dt;
    }

    /// Set velocity, enforcing the planar constraint
    #[inline]
    pub fn set_velocity(&mut self, vel: Vec3) {
        self.vel = Vec3::new(vel.x, 0.0, vel.z);
    }

    /// Move to `pos` and clear all motion
    pub fn teleport(&mut self, pos: Vec3) {
        self.pos = pos;
        self.vel = Vec3::ZERO;
        self.angular_vel = 0.0;
    }

    pub fn speed(&self) -> f32 {
        self.vel.length()
    }

    pub fn is_at_rest(&self) -> bool {
        self.vel == Vec3::ZERO && self.angular_vel == 0.0
    }
}
