//! Contact detection and response for the table
//!
//! Detection is plain planar geometry (circles against circles and against
//! wall half-planes). Response comes in three flavours:
//! - elastic: 1-D elastic exchange along the contact normal, tangents untouched
//! - absorbing: puck struck by a pusher, picks up the pusher's full speed along
//!   the normal on top of the elastic exchange
//! - wall: perfect reflection, outward kick, guaranteed un-sticking speed
//!
//! Every response returns a velocity with zero vertical component.

use glam::Vec3;

use super::body::RigidBody;
use crate::consts::MIN_TOTAL_MASS;
use crate::planar;

/// Result of a contact check
#[derive(Debug, Clone)]
pub struct Contact {
    /// Whether the shapes overlap
    pub hit: bool,
    /// Unit normal pointing toward the body being pushed out
    pub normal: Vec3,
    /// Overlap depth (for position correction)
    pub penetration: f32,
}

impl Contact {
    pub fn miss() -> Self {
        Self {
            hit: false,
            normal: Vec3::ZERO,
            penetration: 0.0,
        }
    }
}

/// Check overlap between two circles on the table plane
///
/// The normal points from `a` toward `b`. Coincident centres fall back to +X
/// so the response is still well defined.
pub fn circle_circle_contact(a_pos: Vec3, a_radius: f32, b_pos: Vec3, b_radius: f32) -> Contact {
    let delta = planar(b_pos - a_pos);
    let dist = delta.length();
    let reach = a_radius + b_radius;

    if dist >= reach {
        return Contact::miss();
    }

    let normal = if dist > 1e-6 { delta / dist } else { Vec3::X };
    Contact {
        hit: true,
        normal,
        penetration: reach - dist,
    }
}

/// Check overlap between a circle and a wall half-plane
///
/// The wall surface is every point `p` with `p · normal == offset`; `normal`
/// points into the table, so it is also the contact normal handed to the
/// bounce response.
pub fn circle_plane_contact(pos: Vec3, radius: f32, normal: Vec3, offset: f32) -> Contact {
    let dist = planar(pos).dot(normal) - offset;
    if dist >= radius {
        return Contact::miss();
    }

    Contact {
        hit: true,
        normal,
        penetration: radius - dist,
    }
}

/// Post-collision velocities for a symmetric elastic contact
///
/// Returns `None` for degenerate input (total mass ≈ 0 or zero normal), which
/// callers treat as "leave both velocities alone".
pub fn resolve_elastic(m1: f32, v1: Vec3, m2: f32, v2: Vec3, normal: Vec3) -> Option<(Vec3, Vec3)> {
    let total = m1 + m2;
    if total.abs() < MIN_TOTAL_MASS {
        return None;
    }
    let n = planar(normal).try_normalize()?;

    let v1n = v1.dot(n);
    let v2n = v2.dot(n);
    let v1t = v1 - v1n * n;
    let v2t = v2 - v2n * n;

    let v1n_after = (v1n * (m1 - m2) + 2.0 * m2 * v2n) / total;
    let v2n_after = (v2n * (m2 - m1) + 2.0 * m1 * v1n) / total;

    Some((planar(v1t + v1n_after * n), planar(v2t + v2n_after * n)))
}

/// Post-collision puck velocity for a pusher strike
///
/// `normal` points from the pusher toward the puck. The puck gets the elastic
/// normal exchange plus the magnitude of the pusher's whole velocity along the
/// same normal. The pusher's own velocity is not touched here; its actuation
/// owns it.
pub fn resolve_absorbing(
    puck_mass: f32,
    puck_vel: Vec3,
    pusher_mass: f32,
    pusher_vel: Vec3,
    normal: Vec3,
) -> Option<Vec3> {
    let total = puck_mass + pusher_mass;
    if total.abs() < MIN_TOTAL_MASS {
        return None;
    }
    let n = planar(normal).try_normalize()?;

    let v1n = puck_vel.dot(n);
    let v2n = pusher_vel.dot(n);
    let v1t = puck_vel - v1n * n;

    let v1n_after = (v1n * (puck_mass - pusher_mass) + 2.0 * pusher_mass * v2n) / total;

    Some(planar(v1t + v1n_after * n + n * pusher_vel.length()))
}

/// Velocity after bouncing off a wall with outward normal `normal`
///
/// Perpendicular component is negated, `kick` is added along the normal, and a
/// result slower than `unstick_speed` is replaced by exactly `unstick_speed`
/// along the normal.
pub fn resolve_wall_bounce(vel: Vec3, normal: Vec3, kick: f32, unstick_speed: f32) -> Vec3 {
    let Some(n) = planar(normal).try_normalize() else {
        return planar(vel);
    };

    let v = planar(vel);
    let v_perp = v.dot(n) * n;
    let v_para = v - v_perp;

    let mut reflected = v_para - v_perp + n * kick;
    if reflected.length_squared() < unstick_speed * unstick_speed {
        reflected = n * unstick_speed;
    }
    planar(reflected)
}

/// Floor contact only wipes vertical velocity
#[inline]
pub fn resolve_floor_contact(vel: Vec3) -> Vec3 {
    planar(vel)
}

/// Apply the elastic response to two bodies in place
///
/// Returns false when the contact was skipped as degenerate.
pub fn collide_elastic(a: &mut RigidBody, b: &mut RigidBody, normal: Vec3) -> bool {
    match resolve_elastic(a.mass, a.vel, b.mass, b.vel, normal) {
        Some((va, vb)) => {
            a.set_velocity(va);
            b.set_velocity(vb);
            true
        }
        None => false,
    }
}

/// Apply the absorbing strike response to the puck in place
pub fn collide_absorbing(puck: &mut RigidBody, pusher: &RigidBody, normal: Vec3) -> bool {
    match resolve_absorbing(puck.mass, puck.vel, pusher.mass, pusher.vel, normal) {
        Some(v) => {
            puck.set_velocity(v);
            true
        }
        None => false,
    }
}
