//! Error types for configuration loading and arena construction.

use thiserror::Error;

use crate::sim::Side;

/// Failure to load or validate simulation settings
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Settings parse error: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Invalid value for {field}: {reason}")]
    InvalidValue { field: &'static str, reason: String },
}

impl ConfigError {
    pub(crate) fn invalid(field: &'static str, reason: impl Into<String>) -> Self {
        ConfigError::InvalidValue {
            field,
            reason: reason.into(),
        }
    }
}

/// Arena wiring errors. An arena that fails to build stays disabled.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ArenaError {
    #[error("no puck bound to arena")]
    MissingPuck,

    #[error("no pusher bound for side {0:?}")]
    MissingPusher(Side),

    #[error("both pushers tagged {0:?}")]
    DuplicateSide(Side),

    #[error("invalid mass {mass} on {body}")]
    InvalidMass { body: &'static str, mass: f32 },

    #[error("invalid travel range [{min}, {max}] for side {side:?}")]
    InvalidRange { side: Side, min: f32, max: f32 },

    #[error("{body} start ({x}, {z}) lies outside its travel range")]
    StartOutOfRange { body: &'static str, x: f32, z: f32 },

    #[error("arena settings rejected: {0}")]
    Settings(String),
}

impl From<ConfigError> for ArenaError {
    fn from(err: ConfigError) -> Self {
        ArenaError::Settings(err.to_string())
    }
}
