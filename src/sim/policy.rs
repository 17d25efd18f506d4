//! Decision-source contract
//!
//! A learned policy sees a 13-float observation in a side-mirrored frame and
//! answers with one discrete direction per step. Rewards and episode ends flow
//! back through [`Transition`] records in each step report. The learning
//! algorithm itself lives outside this crate.

use glam::Vec3;
use serde::{Deserialize, Serialize};

use super::pusher::Side;

/// Length of the observation vector
pub const OBSERVATION_SIZE: usize = 13;

/// Discrete action chosen each step
///
/// The discriminants match the policy's action indices.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Direction {
    #[default]
    Idle = 0,
    PlusZ = 1,
    MinusZ = 2,
    MinusX = 3,
    PlusX = 4,
}

impl Direction {
    pub const ALL: [Direction; 5] = [
        Direction::Idle,
        Direction::PlusZ,
        Direction::MinusZ,
        Direction::MinusX,
        Direction::PlusX,
    ];

    pub fn from_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }

    pub fn index(self) -> usize {
        self as usize
    }

    /// Unit vector in the pusher's own (unmirrored) frame
    pub fn vector(self) -> Vec3 {
        match self {
            Direction::Idle => Vec3::ZERO,
            Direction::PlusZ => Vec3::Z,
            Direction::MinusZ => -Vec3::Z,
            Direction::MinusX => -Vec3::X,
            Direction::PlusX => Vec3::X,
        }
    }

    /// Direction that best reduces an offset `(dx, dz)`
    ///
    /// The dominant axis wins; offsets inside `deadzone` on both axes give Idle.
    pub fn toward(dx: f32, dz: f32, deadzone: f32) -> Self {
        if dx.abs() <= deadzone && dz.abs() <= deadzone {
            return Direction::Idle;
        }
        if dx.abs() >= dz.abs() {
            if dx > 0.0 { Direction::PlusX } else { Direction::MinusX }
        } else if dz > 0.0 {
            Direction::PlusZ
        } else {
            Direction::MinusZ
        }
    }
}

/// Identifies which learned behaviour drives a pusher (the team id)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PolicyHandle(pub u32);

impl PolicyHandle {
    /// Default team id per side: both sides share one behaviour, split by team
    pub fn for_side(side: Side) -> Self {
        match side {
            Side::Near => PolicyHandle(0),
            Side::Far => PolicyHandle(1),
        }
    }
}

/// Normalized, side-mirrored observation
///
/// Layout: self-pos(2), self-vel(2), side(1), opp-pos(2), opp-vel(2),
/// puck-pos(2), puck-vel(2).
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Observation(pub [f32; OBSERVATION_SIZE]);

impl Observation {
    pub const SELF_POS: usize = 0;
    pub const SELF_VEL: usize = 2;
    pub const SIDE: usize = 4;
    pub const OPPONENT_POS: usize = 5;
    pub const OPPONENT_VEL: usize = 7;
    pub const PUCK_POS: usize = 9;
    pub const PUCK_VEL: usize = 11;

    pub fn as_slice(&self) -> &[f32] {
        &self.0
    }

    fn pair(&self, at: usize) -> (f32, f32) {
        (self.0[at], self.0[at + 1])
    }

    pub fn self_pos(&self) -> (f32, f32) {
        self.pair(Self::SELF_POS)
    }

    pub fn self_vel(&self) -> (f32, f32) {
        self.pair(Self::SELF_VEL)
    }

    pub fn side(&self) -> f32 {
        self.0[Self::SIDE]
    }

    pub fn opponent_pos(&self) -> (f32, f32) {
        self.pair(Self::OPPONENT_POS)
    }

    pub fn opponent_vel(&self) -> (f32, f32) {
        self.pair(Self::OPPONENT_VEL)
    }

    pub fn puck_pos(&self) -> (f32, f32) {
        self.pair(Self::PUCK_POS)
    }

    pub fn puck_vel(&self) -> (f32, f32) {
        self.pair(Self::PUCK_VEL)
    }
}

/// Learned decision source
///
/// Called concurrently from every arena of a pool, so it takes `&self`.
pub trait Policy: Sync {
    fn decide(&self, handle: PolicyHandle, observation: &Observation) -> Direction;
}

impl<F> Policy for F
where
    F: Fn(PolicyHandle, &Observation) -> Direction + Sync,
{
    fn decide(&self, handle: PolicyHandle, observation: &Observation) -> Direction {
        self(handle, observation)
    }
}

/// Never moves
#[derive(Debug, Clone, Copy, Default)]
pub struct IdlePolicy;

impl Policy for IdlePolicy {
    fn decide(&self, _handle: PolicyHandle, _observation: &Observation) -> Direction {
        Direction::Idle
    }
}

/// Heads for the puck using only the mirrored observation
#[derive(Debug, Clone, Copy)]
pub struct ChasePuckPolicy {
    pub deadzone: f32,
}

impl Default for ChasePuckPolicy {
    fn default() -> Self {
        Self { deadzone: 0.02 }
    }
}

impl Policy for ChasePuckPolicy {
    fn decide(&self, _handle: PolicyHandle, observation: &Observation) -> Direction {
        let (sx, sz) = observation.self_pos();
        let (px, pz) = observation.puck_pos();
        Direction::toward(px - sx, pz - sz, self.deadzone)
    }
}

/// Per-step feedback for one policy-driven pusher
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Transition {
    pub side: Side,
    pub handle: PolicyHandle,
    /// Observation the action was chosen from
    pub observation: Observation,
    pub action: Direction,
    /// Reward earned during this step
    pub reward: f32,
    /// Episode ended with this step
    pub done: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_direction_indices() {
        for (i, dir) in Direction::ALL.iter().enumerate() {
            assert_eq!(dir.index(), i);
            assert_eq!(Direction::from_index(i), Some(*dir));
        }
        assert_eq!(Direction::from_index(5), None);
    }

    #[test]
    fn test_toward_picks_dominant_axis() {
        assert_eq!(Direction::toward(1.0, 0.5, 0.05), Direction::PlusX);
        assert_eq!(Direction::toward(-1.0, 0.5, 0.05), Direction::MinusX);
        assert_eq!(Direction::toward(0.1, -0.5, 0.05), Direction::MinusZ);
        assert_eq!(Direction::toward(0.01, 0.02, 0.05), Direction::Idle);
    }

    #[test]
    fn test_closure_policy() {
        let policy = |handle: PolicyHandle, _: &Observation| {
            if handle.0 == 0 { Direction::PlusX } else { Direction::MinusZ }
        };
        let obs = Observation::default();
        assert_eq!(policy.decide(PolicyHandle(0), &obs), Direction::PlusX);
        assert_eq!(policy.decide(PolicyHandle(1), &obs), Direction::MinusZ);
    }

    #[test]
    fn test_chase_puck_reads_observation() {
        let mut obs = Observation::default();
        obs.0[Observation::SELF_POS] = -1.0;
        obs.0[Observation::PUCK_POS] = 1.0;
        assert_eq!(ChasePuckPolicy::default().decide(PolicyHandle(0), &obs), Direction::PlusX);
    }
}
