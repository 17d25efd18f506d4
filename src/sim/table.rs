//! Table geometry in the arena's local frame
//!
//! The table is a rectangle centred on the arena origin, X along its length
//! and Z across it. The Near side defends the -X end, the Far side the +X end.
//! Each end wall has a goal mouth the puck can pass through.

use glam::{Vec2, Vec3};
use serde::{Deserialize, Serialize};

use super::clamp::AxisRange;
use super::collision::{Contact, circle_plane_contact};
use super::pusher::Side;
use crate::settings::TableSettings;

/// Axis-aligned rectangle on the table plane (x, z)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    pub min: Vec2,
    pub max: Vec2,
}

impl Rect {
    pub fn new(min: Vec2, max: Vec2) -> Self {
        Self { min, max }
    }

    pub fn contains(&self, p: Vec3) -> bool {
        p.x >= self.min.x && p.x <= self.max.x && p.z >= self.min.y && p.z <= self.max.y
    }
}

/// A straight wall, possibly with a goal mouth cut into it
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Wall {
    /// Unit normal pointing into the table
    pub normal: Vec3,
    /// Plane offset: the surface is `p · normal == offset`
    pub offset: f32,
    /// Half-width of the opening centred on z = 0 (end walls only)
    pub mouth: Option<f32>,
}

impl Wall {
    pub fn contact(&self, pos: Vec3, radius: f32) -> Contact {
        if self.mouth.is_some_and(|half| pos.z.abs() < half) {
            return Contact::miss();
        }
        circle_plane_contact(pos, radius, self.normal, self.offset)
    }
}

/// Static table description shared by every arena of a pool
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Table {
    pub half_length: f32,
    pub half_width: f32,
    pub goal_half_width: f32,
    pub goal_depth: f32,
    pub walls: [Wall; 4],
}

impl Table {
    pub fn new(settings: &TableSettings) -> Self {
        let hl = settings.half_length;
        let hw = settings.half_width;
        let mouth = Some(settings.goal_half_width);
        Self {
            half_length: hl,
            half_width: hw,
            goal_half_width: settings.goal_half_width,
            goal_depth: settings.goal_depth,
            walls: [
                // Side walls at z = ±half_width
                Wall {
                    normal: -Vec3::Z,
                    offset: -hw,
                    mouth: None,
                },
                Wall {
                    normal: Vec3::Z,
                    offset: -hw,
                    mouth: None,
                },
                // End walls at x = ±half_length
                Wall {
                    normal: -Vec3::X,
                    offset: -hl,
                    mouth,
                },
                Wall {
                    normal: Vec3::X,
                    offset: -hl,
                    mouth,
                },
            ],
        }
    }

    /// Travel range along X for a pusher of `side`: its own half of the table
    pub fn pusher_x_range(&self, side: Side) -> AxisRange {
        match side {
            Side::Near => AxisRange::new(-self.half_length, 0.0),
            Side::Far => AxisRange::new(0.0, self.half_length),
        }
    }

    /// Travel range along Z keeping a body of `radius` inside the side walls
    pub fn z_range(&self, radius: f32) -> AxisRange {
        let limit = (self.half_width - radius).max(0.0);
        AxisRange::new(-limit, limit)
    }

    /// Goal pocket behind the end wall defended by `defender`
    pub fn goal_region(&self, defender: Side) -> Rect {
        let (x0, x1) = match defender {
            Side::Near => (-self.half_length - self.goal_depth, -self.half_length),
            Side::Far => (self.half_length, self.half_length + self.goal_depth),
        };
        Rect::new(
            Vec2::new(x0, -self.goal_half_width),
            Vec2::new(x1, self.goal_half_width),
        )
    }

    /// Which half a local X coordinate lies on; the centre line counts as neither
    pub fn half_of(&self, x: f32) -> Option<Side> {
        if x < 0.0 {
            Some(Side::Near)
        } else if x > 0.0 {
            Some(Side::Far)
        } else {
            None
        }
    }
}
