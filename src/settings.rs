//! Simulation settings
//!
//! Everything tunable about the table, the bodies, rewards and the arena grid.
//! Loaded from JSON; every section falls back to its defaults so partial files
//! work.

use std::path::Path;

use glam::Vec3;
use serde::{Deserialize, Serialize};

use crate::consts::*;
use crate::error::ConfigError;

/// Contact response and body properties
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PhysicsTuning {
    /// Fixed step length (seconds)
    pub dt: f32,
    /// Speed added along a wall normal on each bounce
    pub wall_bounce_kick: f32,
    /// Minimum post-bounce speed
    pub unstick_speed: f32,
    pub puck_mass: f32,
    pub pusher_mass: f32,
    pub puck_radius: f32,
    pub pusher_radius: f32,
    /// Puck speed cap; keeps per-step travel shorter than the goal pocket
    pub max_puck_speed: f32,
}

impl Default for PhysicsTuning {
    fn default() -> Self {
        Self {
            dt: SIM_DT,
            wall_bounce_kick: WALL_BOUNCE_KICK,
            unstick_speed: UNSTICK_SPEED,
            puck_mass: PUCK_MASS,
            pusher_mass: PUSHER_MASS,
            puck_radius: PUCK_RADIUS,
            pusher_radius: PUSHER_RADIUS,
            max_puck_speed: PUCK_MAX_SPEED,
        }
    }
}

/// Pusher actuation and observation scaling
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PusherTuning {
    pub max_speed: f32,
    pub accel_rate: f32,
    pub decel_rate: f32,
    /// Divisor for observed positions
    pub half_table_width: f32,
    /// Scripted controller stops closing in below this offset
    pub scripted_deadzone: f32,
}

impl Default for PusherTuning {
    fn default() -> Self {
        Self {
            max_speed: PUSHER_MAX_SPEED,
            accel_rate: PUSHER_ACCEL_RATE,
            decel_rate: PUSHER_DECEL_RATE,
            half_table_width: OBS_HALF_TABLE_WIDTH,
            scripted_deadzone: 0.05,
        }
    }
}

/// Reward shaping for policy-driven pushers
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RewardTuning {
    /// Every step
    pub existence_penalty: f32,
    /// Puck on the agent's own half
    pub puck_own_half: f32,
    /// Puck on the opponent's half
    pub puck_opponent_half: f32,
    /// Agent touched the puck
    pub puck_touch: f32,
    /// Opponent touched the puck
    pub opponent_touch: f32,
    /// Both agents when the step limit ends the episode
    pub step_limit_penalty: f32,
    pub goal_scored: f32,
    pub goal_conceded: f32,
}

impl Default for RewardTuning {
    fn default() -> Self {
        Self {
            existence_penalty: -0.001,
            puck_own_half: -0.0015,
            puck_opponent_half: 0.002,
            puck_touch: 5.0,
            opponent_touch: -3.0,
            step_limit_penalty: -100.0,
            goal_scored: 1.0,
            goal_conceded: -1.0,
        }
    }
}

/// Episode rules
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EpisodeSettings {
    /// Steps per episode; 0 disables the limit
    pub max_steps: u32,
    /// Chance each side is policy-driven for an episode
    pub policy_probability: f32,
    /// Goals needed to win a match
    pub win_threshold: u32,
}

impl Default for EpisodeSettings {
    fn default() -> Self {
        Self {
            max_steps: DEFAULT_MAX_STEPS,
            policy_probability: DEFAULT_POLICY_PROBABILITY,
            win_threshold: DEFAULT_WIN_THRESHOLD,
        }
    }
}

/// Table geometry and start poses (arena-local)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TableSettings {
    pub half_length: f32,
    pub half_width: f32,
    pub goal_half_width: f32,
    pub goal_depth: f32,
    pub puck_start: Vec3,
    pub near_start: Vec3,
    pub far_start: Vec3,
}

impl Default for TableSettings {
    fn default() -> Self {
        Self {
            half_length: TABLE_HALF_LENGTH,
            half_width: TABLE_HALF_WIDTH,
            goal_half_width: GOAL_HALF_WIDTH,
            goal_depth: GOAL_DEPTH,
            puck_start: Vec3::ZERO,
            near_start: Vec3::new(-1.5, 0.0, 0.0),
            far_start: Vec3::new(1.5, 0.0, 0.0),
        }
    }
}

/// Arena grid placement (purely geometric)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GridSettings {
    pub rows: u32,
    pub columns: u32,
    /// Spacing between columns (world X)
    pub step_x: f32,
    /// Spacing between rows (world Z)
    pub step_z: f32,
}

impl Default for GridSettings {
    fn default() -> Self {
        Self {
            rows: 3,
            columns: 3,
            step_x: 10.0,
            step_z: 15.0,
        }
    }
}

impl GridSettings {
    pub fn arena_count(&self) -> usize {
        self.rows as usize * self.columns as usize
    }
}

/// Complete simulation settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimSettings {
    pub physics: PhysicsTuning,
    pub pusher: PusherTuning,
    pub rewards: RewardTuning,
    pub episode: EpisodeSettings,
    pub table: TableSettings,
    pub grid: GridSettings,
    /// Base seed; each arena derives its own stream
    pub seed: u64,
    /// Step arenas on the rayon pool
    pub parallel: bool,
}

impl Default for SimSettings {
    fn default() -> Self {
        Self {
            physics: PhysicsTuning::default(),
            pusher: PusherTuning::default(),
            rewards: RewardTuning::default(),
            episode: EpisodeSettings::default(),
            table: TableSettings::default(),
            grid: GridSettings::default(),
            seed: 42,
            parallel: true,
        }
    }
}

impl SimSettings {
    /// Training grid: every side policy-driven, arenas stepped in parallel
    pub fn training() -> Self {
        let mut settings = Self::default();
        settings.episode.policy_probability = 1.0;
        settings
    }

    /// One table, no step limit, occasional scripted opponents
    pub fn exhibition() -> Self {
        let mut settings = Self::default();
        settings.grid.rows = 1;
        settings.grid.columns = 1;
        settings.episode.max_steps = 0;
        settings.parallel = false;
        settings
    }

    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let settings: Self = serde_json::from_str(json)?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path)?;
        let settings = Self::from_json(&json)?;
        log::info!("Loaded settings from {}", path.display());
        Ok(settings)
    }

    pub fn to_json(&self) -> Result<String, ConfigError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Reject settings the simulation cannot run with
    pub fn validate(&self) -> Result<(), ConfigError> {
        let positive = [
            ("physics.dt", self.physics.dt),
            ("physics.puck_mass", self.physics.puck_mass),
            ("physics.pusher_mass", self.physics.pusher_mass),
            ("physics.puck_radius", self.physics.puck_radius),
            ("physics.pusher_radius", self.physics.pusher_radius),
            ("physics.max_puck_speed", self.physics.max_puck_speed),
            ("pusher.max_speed", self.pusher.max_speed),
            ("pusher.accel_rate", self.pusher.accel_rate),
            ("pusher.decel_rate", self.pusher.decel_rate),
            ("pusher.half_table_width", self.pusher.half_table_width),
            ("table.half_length", self.table.half_length),
            ("table.half_width", self.table.half_width),
            ("table.goal_half_width", self.table.goal_half_width),
            ("table.goal_depth", self.table.goal_depth),
        ];
        for (field, value) in positive {
            if !(value.is_finite() && value > 0.0) {
                return Err(ConfigError::invalid(field, format!("must be positive, got {value}")));
            }
        }

        let non_negative = [
            ("physics.wall_bounce_kick", self.physics.wall_bounce_kick),
            ("physics.unstick_speed", self.physics.unstick_speed),
            ("pusher.scripted_deadzone", self.pusher.scripted_deadzone),
        ];
        for (field, value) in non_negative {
            if !(value.is_finite() && value >= 0.0) {
                return Err(ConfigError::invalid(
                    field,
                    format!("must be non-negative, got {value}"),
                ));
            }
        }

        let p = self.episode.policy_probability;
        if !(0.0..=1.0).contains(&p) {
            return Err(ConfigError::invalid(
                "episode.policy_probability",
                format!("must be in [0, 1], got {p}"),
            ));
        }
        if self.episode.win_threshold == 0 {
            return Err(ConfigError::invalid("episode.win_threshold", "must be at least 1"));
        }
        if self.grid.rows == 0 || self.grid.columns == 0 {
            return Err(ConfigError::invalid("grid", "needs at least one row and one column"));
        }
        if self.table.goal_half_width >= self.table.half_width {
            return Err(ConfigError::invalid(
                "table.goal_half_width",
                "goal mouth must be narrower than the table",
            ));
        }
        if self.physics.pusher_radius >= self.table.half_width {
            return Err(ConfigError::invalid(
                "physics.pusher_radius",
                "pusher does not fit on the table",
            ));
        }
        Ok(())
    }
}
