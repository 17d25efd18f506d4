//! Pusher agents
//!
//! A pusher is a rigid body restricted to one half of the table, driven each
//! step by either a learned policy or the scripted puck-seeker. Both sides
//! share one policy: actions and observations are mirrored by the side sign so
//! "forward" always points at the opponent.

use std::str::FromStr;

use glam::Vec3;
use serde::{Deserialize, Serialize};

use super::body::RigidBody;
use super::clamp::{Axis, AxisRange, clamp_axis};
use super::policy::{Direction, OBSERVATION_SIZE, Observation, Policy, PolicyHandle, Transition};
use crate::error::{ArenaError, ConfigError};
use crate::move_towards;
use crate::settings::PusherTuning;

/// Which end of the table a pusher defends
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Side {
    /// Defends the -X end ("Player1")
    Near,
    /// Defends the +X end ("Player2")
    Far,
}

impl Side {
    pub const BOTH: [Side; 2] = [Side::Near, Side::Far];

    /// Sign applied to actions and observations
    #[inline]
    pub fn mirror(self) -> f32 {
        match self {
            Side::Near => 1.0,
            Side::Far => -1.0,
        }
    }

    pub fn opponent(self) -> Side {
        match self {
            Side::Near => Side::Far,
            Side::Far => Side::Near,
        }
    }

    pub fn index(self) -> usize {
        match self {
            Side::Near => 0,
            Side::Far => 1,
        }
    }

    /// Scoreboard label
    pub fn player_label(self) -> &'static str {
        match self {
            Side::Near => "Player1",
            Side::Far => "Player2",
        }
    }
}

impl FromStr for Side {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "player1" | "near" | "blue" => Ok(Side::Near),
            "player2" | "far" | "orange" => Ok(Side::Far),
            other => Err(ConfigError::invalid("side", format!("unknown side {other:?}"))),
        }
    }
}

/// Per-episode controller mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ControlMode {
    Policy,
    Scripted,
}

/// Deterministic puck-seeker
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScriptedController {
    /// Offsets smaller than this on both axes mean "arrived"
    pub deadzone: f32,
    /// Direction chosen last step; breaks near-ties between the axes
    last: Direction,
}

impl ScriptedController {
    pub fn new(deadzone: f32) -> Self {
        Self {
            deadzone,
            last: Direction::Idle,
        }
    }

    /// Pick the direction that closes the X/Z offset to the puck
    ///
    /// Positions are arena-local. The result is expressed in the pusher's
    /// mirrored action frame so it goes through the same actuation path as a
    /// policy action.
    pub fn decide(&mut self, own: Vec3, puck: Vec3, mirror: f32) -> Direction {
        let dx = (puck.x - own.x) * mirror;
        let dz = (puck.z - own.z) * mirror;

        let mut dir = Direction::toward(dx, dz, self.deadzone);
        let near_tie = (dx.abs() - dz.abs()).abs() < self.deadzone;
        if near_tie && self.still_closing(dx, dz) {
            dir = self.last;
        }
        self.last = dir;
        dir
    }

    fn still_closing(&self, dx: f32, dz: f32) -> bool {
        match self.last {
            Direction::PlusX => dx > self.deadzone,
            Direction::MinusX => dx < -self.deadzone,
            Direction::PlusZ => dz > self.deadzone,
            Direction::MinusZ => dz < -self.deadzone,
            Direction::Idle => false,
        }
    }

    pub fn clear(&mut self) {
        self.last = Direction::Idle;
    }
}

/// Where a pusher's actions come from this episode
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum DecisionSource {
    Policy(PolicyHandle),
    Scripted(ScriptedController),
}

impl DecisionSource {
    pub fn mode(&self) -> ControlMode {
        match self {
            DecisionSource::Policy(_) => ControlMode::Policy,
            DecisionSource::Scripted(_) => ControlMode::Scripted,
        }
    }

    fn clear(&mut self) {
        if let DecisionSource::Scripted(controller) = self {
            controller.clear();
        }
    }
}

/// Episode phase of a single pusher
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PusherPhase {
    /// Normal observe/act loop
    Active,
    /// Episode over; rewards final, actions ignored until the arena resets
    Terminating,
    /// Just reset by the arena; becomes Active on the next step
    Reset,
}

/// A controllable paddle
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Pusher {
    pub side: Side,
    pub body: RigidBody,
    /// Own half of the table
    pub x_range: AxisRange,
    /// Between the side walls
    pub z_range: AxisRange,
    pub source: DecisionSource,
    pub phase: PusherPhase,
    /// Steps taken this episode
    pub steps: u32,
    step_reward: f32,
    episode_reward: f32,
    /// Overlapping the puck as of the last contact pass
    pub(crate) touching_puck: bool,
    action: Direction,
    observation: Observation,
}

impl Pusher {
    pub fn new(
        side: Side,
        body: RigidBody,
        x_range: AxisRange,
        z_range: AxisRange,
    ) -> Result<Self, ArenaError> {
        body.validate("pusher")?;
        for range in [x_range, z_range] {
            if !range.is_valid() {
                return Err(ArenaError::InvalidRange {
                    side,
                    min: range.min,
                    max: range.max,
                });
            }
        }

        Ok(Self {
            side,
            body,
            x_range,
            z_range,
            source: DecisionSource::Policy(PolicyHandle::for_side(side)),
            phase: PusherPhase::Reset,
            steps: 0,
            step_reward: 0.0,
            episode_reward: 0.0,
            touching_puck: false,
            action: Direction::Idle,
            observation: Observation::default(),
        })
    }

    #[inline]
    pub fn mirror(&self) -> f32 {
        self.side.mirror()
    }

    pub fn mode(&self) -> ControlMode {
        self.source.mode()
    }

    pub fn is_active(&self) -> bool {
        self.phase == PusherPhase::Active
    }

    pub fn is_policy_driven(&self) -> bool {
        matches!(self.source, DecisionSource::Policy(_))
    }

    /// Start-of-step bookkeeping: a freshly reset pusher begins its episode
    pub fn begin_step(&mut self) {
        if self.phase == PusherPhase::Reset {
            self.phase = PusherPhase::Active;
        }
        self.step_reward = 0.0;
        self.action = Direction::Idle;
    }

    /// Ask the current decision source for this step's action
    ///
    /// `observation` must come from [`Pusher::observe`] for this step.
    /// Non-active pushers always answer Idle.
    pub fn decide_action(
        &mut self,
        observation: Observation,
        puck: Vec3,
        policy: &dyn Policy,
    ) -> Direction {
        if !self.is_active() {
            return Direction::Idle;
        }
        self.observation = observation;
        self.steps += 1;

        let mirror = self.mirror();
        let own = self.body.pos;
        let dir = match &mut self.source {
            DecisionSource::Policy(handle) => policy.decide(*handle, &observation),
            DecisionSource::Scripted(controller) => controller.decide(own, puck, mirror),
        };
        self.action = dir;
        dir
    }

    /// Turn a direction into velocity
    ///
    /// Target speed is `max_speed` along the mirrored direction. Velocity moves
    /// toward it at `accel_rate`, or toward zero at `decel_rate` when idle.
    pub fn apply_action(&mut self, dir: Direction, tuning: &PusherTuning, dt: f32) {
        let dir = if self.is_active() { dir } else { Direction::Idle };
        let target = dir.vector() * self.mirror() * tuning.max_speed;
        let rate = if dir == Direction::Idle {
            tuning.decel_rate
        } else {
            tuning.accel_rate
        };
        let vel = move_towards(self.body.vel, target, rate * dt);
        self.body.set_velocity(vel);
    }

    /// Keep the body on its half and between the side walls
    pub fn constrain(&mut self) -> bool {
        let clamped_x = clamp_axis(&mut self.body, Axis::X, self.x_range);
        let clamped_z = clamp_axis(&mut self.body, Axis::Z, self.z_range);
        clamped_x || clamped_z
    }

    /// Build this pusher's observation
    ///
    /// X is mapped so the own half spans [-1, 1] with +1 at the centre line;
    /// Z and velocities are scaled and mirrored by side. A missing opponent
    /// observes as zeros.
    pub fn observe(
        &self,
        opponent: Option<&RigidBody>,
        puck: &RigidBody,
        tuning: &PusherTuning,
    ) -> Observation {
        let mirror = self.mirror();
        let h = tuning.half_table_width;
        let norm_pos = |p: Vec3| {
            [
                mirror * ((p.x / h) * 2.0 + mirror),
                mirror * p.z / h,
            ]
        };
        let norm_vel = |v: Vec3| {
            [
                mirror * v.x / tuning.max_speed,
                mirror * v.z / tuning.max_speed,
            ]
        };

        let mut obs = [0.0f32; OBSERVATION_SIZE];
        obs[0..2].copy_from_slice(&norm_pos(self.body.pos));
        obs[2..4].copy_from_slice(&norm_vel(self.body.vel));
        obs[4] = if self.side == Side::Near { 0.0 } else { 1.0 };
        if let Some(opp) = opponent {
            obs[5..7].copy_from_slice(&norm_pos(opp.pos));
            obs[7..9].copy_from_slice(&norm_vel(opp.vel));
        }
        obs[9..11].copy_from_slice(&norm_pos(puck.pos));
        obs[11..13].copy_from_slice(&norm_vel(puck.vel));
        Observation(obs)
    }

    /// Credit a reward; ignored unless a policy is driving an active episode
    pub fn add_reward(&mut self, reward: f32) {
        if self.is_policy_driven() && self.is_active() {
            self.step_reward += reward;
            self.episode_reward += reward;
        }
    }

    /// Move to Terminating. Returns false if the episode had already ended.
    pub fn terminate(&mut self) -> bool {
        if self.phase == PusherPhase::Active {
            self.phase = PusherPhase::Terminating;
            true
        } else {
            false
        }
    }

    /// Close the episode between steps
    ///
    /// The last step's reward was already reported, so the closing record
    /// carries zero reward. Returns `None` unless the pusher was active.
    pub fn end_episode(&mut self) -> Option<Transition> {
        if !self.terminate() {
            return None;
        }
        self.step_reward = 0.0;
        self.transition()
    }

    /// `max_steps == 0` means no limit
    pub fn reached_step_limit(&self, max_steps: u32) -> bool {
        max_steps > 0 && self.steps >= max_steps
    }

    /// Arena-driven reset: back to `start`, motion and episode state cleared
    pub fn reset_episode(&mut self, start: Vec3) {
        self.body.teleport(start);
        self.phase = PusherPhase::Reset;
        self.steps = 0;
        self.step_reward = 0.0;
        self.episode_reward = 0.0;
        self.touching_puck = false;
        self.action = Direction::Idle;
        self.source.clear();
    }

    pub fn set_source(&mut self, source: DecisionSource) {
        self.source = source;
        self.body.vel = Vec3::ZERO;
        self.body.angular_vel = 0.0;
    }

    pub fn step_reward(&self) -> f32 {
        self.step_reward
    }

    pub fn episode_reward(&self) -> f32 {
        self.episode_reward
    }

    pub fn last_action(&self) -> Direction {
        self.action
    }

    /// Feedback record for the step just taken, if a policy chose the action
    pub fn transition(&self) -> Option<Transition> {
        let DecisionSource::Policy(handle) = self.source else {
            return None;
        };
        if self.phase == PusherPhase::Reset {
            return None;
        }
        Some(Transition {
            side: self.side,
            handle,
            observation: self.observation,
            action: self.action,
            reward: self.step_reward,
            done: self.phase == PusherPhase::Terminating,
        })
    }
}
