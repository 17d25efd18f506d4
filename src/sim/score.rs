//! Per-arena scoreboard

use serde::{Deserialize, Serialize};

use super::pusher::Side;
use crate::consts::DEFAULT_WIN_THRESHOLD;

/// Goal counters for one arena
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoreTracker {
    near: u32,
    far: u32,
    win_threshold: u32,
}

impl Default for ScoreTracker {
    fn default() -> Self {
        Self::new(DEFAULT_WIN_THRESHOLD)
    }
}

impl ScoreTracker {
    pub fn new(win_threshold: u32) -> Self {
        Self {
            near: 0,
            far: 0,
            win_threshold,
        }
    }

    /// Count a goal for `scorer`. Returns true once either side has reached
    /// the win threshold.
    pub fn add_score(&mut self, scorer: Side) -> bool {
        match scorer {
            Side::Near => self.near += 1,
            Side::Far => self.far += 1,
        }
        self.threshold_reached()
    }

    pub fn threshold_reached(&self) -> bool {
        self.near >= self.win_threshold || self.far >= self.win_threshold
    }

    /// Side currently at or past the threshold
    pub fn leader(&self) -> Option<Side> {
        if self.near >= self.win_threshold {
            Some(Side::Near)
        } else if self.far >= self.win_threshold {
            Some(Side::Far)
        } else {
            None
        }
    }

    pub fn reset(&mut self) {
        self.near = 0;
        self.far = 0;
    }

    pub fn score(&self, side: Side) -> u32 {
        match side {
            Side::Near => self.near,
            Side::Far => self.far,
        }
    }

    pub fn win_threshold(&self) -> u32 {
        self.win_threshold
    }
}
