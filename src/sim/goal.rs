//! Goal triggers
//!
//! A trigger watches one goal pocket. It fires on the step the puck centre
//! enters the pocket and stays quiet until the puck has left again.

use glam::Vec3;
use serde::{Deserialize, Serialize};

use super::pusher::Side;
use super::table::{Rect, Table};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GoalTrigger {
    pub region: Rect,
    /// Side credited when the puck enters (the defender is its opponent)
    pub scorer: Side,
    occupied: bool,
}

impl GoalTrigger {
    pub fn new(region: Rect, scorer: Side) -> Self {
        Self {
            region,
            scorer,
            occupied: false,
        }
    }

    /// Trigger for the pocket `defender` protects
    pub fn for_defender(table: &Table, defender: Side) -> Self {
        Self::new(table.goal_region(defender), defender.opponent())
    }

    /// Update with the puck's local position; returns the scorer on entry
    pub fn check(&mut self, puck: Vec3) -> Option<Side> {
        let inside = self.region.contains(puck);
        let entered = inside && !self.occupied;
        self.occupied = inside;
        entered.then_some(self.scorer)
    }

    pub fn clear(&mut self) {
        self.occupied = false;
    }
}
