//! Boundary clamp for arena-local travel ranges

use glam::Vec3;
use serde::{Deserialize, Serialize};

use super::body::RigidBody;

/// Local-frame axis on the table plane
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Axis {
    X,
    Z,
}

impl Axis {
    #[inline]
    fn get(self, v: Vec3) -> f32 {
        match self {
            Axis::X => v.x,
            Axis::Z => v.z,
        }
    }

    #[inline]
    fn set(self, v: &mut Vec3, value: f32) {
        match self {
            Axis::X => v.x = value,
            Axis::Z => v.z = value,
        }
    }
}

/// Closed interval `[min, max]` on one axis
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AxisRange {
    pub min: f32,
    pub max: f32,
}

impl AxisRange {
    pub fn new(min: f32, max: f32) -> Self {
        Self { min, max }
    }

    pub fn contains(&self, value: f32) -> bool {
        value >= self.min && value <= self.max
    }

    pub fn is_valid(&self) -> bool {
        self.min.is_finite() && self.max.is_finite() && self.min <= self.max
    }
}

/// Clamp `body` into `range` on `axis`
///
/// When the position had to move, velocity along the axis is zeroed only if
/// it points further out; a body already heading back in keeps its velocity.
/// Returns true if the position was clamped.
pub fn clamp_axis(body: &mut RigidBody, axis: Axis, range: AxisRange) -> bool {
    let p = axis.get(body.pos);
    let clamped = p.clamp(range.min, range.max);
    if clamped == p {
        return false;
    }

    axis.set(&mut body.pos, clamped);
    let v = axis.get(body.vel);
    let outward = (clamped == range.min && v < 0.0) || (clamped == range.max && v > 0.0);
    if outward {
        axis.set(&mut body.vel, 0.0);
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn body_at(x: f32, vx: f32) -> RigidBody {
        let mut body = RigidBody::new(Vec3::new(x, 0.0, 0.0), 1.0, 0.15);
        body.vel = Vec3::new(vx, 0.0, 0.5);
        body
    }

    #[test]
    fn test_clamp_kills_outward_velocity() {
        let mut body = body_at(-2.3, -1.0);
        assert!(clamp_axis(&mut body, Axis::X, AxisRange::new(-2.0, 0.0)));
        assert_eq!(body.pos.x, -2.0);
        assert_eq!(body.vel.x, 0.0);
        // Other axes untouched
        assert_eq!(body.vel.z, 0.5);
    }

    #[test]
    fn test_clamp_keeps_inward_velocity() {
        let mut body = body_at(0.1, -1.0);
        assert!(clamp_axis(&mut body, Axis::X, AxisRange::new(-2.0, 0.0)));
        assert_eq!(body.pos.x, 0.0);
        assert_eq!(body.vel.x, -1.0);
    }

    #[test]
    fn test_inside_range_is_untouched() {
        let mut body = body_at(-1.0, 3.0);
        assert!(!clamp_axis(&mut body, Axis::X, AxisRange::new(-2.0, 0.0)));
        assert_eq!(body.vel.x, 3.0);
    }

    #[test]
    fn test_z_axis() {
        let mut body = RigidBody::new(Vec3::new(0.0, 0.0, 1.2), 1.0, 0.15);
        body.vel = Vec3::new(0.0, 0.0, 2.0);
        assert!(clamp_axis(&mut body, Axis::Z, AxisRange::new(-0.85, 0.85)));
        assert_eq!(body.pos.z, 0.85);
        assert_eq!(body.vel.z, 0.0);
    }

    proptest! {
        #[test]
        fn prop_clamped_position_in_range(
            x in -10.0f32..10.0,
            vx in -10.0f32..10.0,
            min in -3.0f32..0.0,
            width in 0.0f32..3.0,
        ) {
            let range = AxisRange::new(min, min + width);
            let mut body = body_at(x, vx);
            clamp_axis(&mut body, Axis::X, range);
            prop_assert!(range.contains(body.pos.x));
        }
    }
}
