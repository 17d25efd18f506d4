//! A grid of independent arenas stepped together
//!
//! Arenas never share mutable state, so a pool step is a plain map over the
//! arena list. Parallel and sequential stepping give identical results.

use glam::Vec3;
use rayon::prelude::*;

use super::arena::{Arena, ArenaStepReport};
use super::events::{ArenaEvent, ArenaId, PoolSnapshot};
use super::policy::Policy;
use crate::error::ArenaError;
use crate::settings::{GridSettings, SimSettings};

/// World offset of the arena in `row`/`column`, grid centred on the origin
pub fn grid_offset(grid: &GridSettings, row: u32, column: u32) -> Vec3 {
    let centre = |index: u32, count: u32| {
        let half = (count / 2) as f32;
        let even = if count % 2 == 0 { 0.5 } else { 0.0 };
        index as f32 - half + even
    };
    Vec3::new(
        centre(column, grid.columns) * grid.step_x,
        0.0,
        centre(row, grid.rows) * grid.step_z,
    )
}

pub struct ArenaPool {
    arenas: Vec<Arena>,
    parallel: bool,
    /// Pool steps taken
    step: u64,
}

impl ArenaPool {
    /// One arena per grid cell, ids in row-major order
    pub fn new(settings: &SimSettings) -> Result<Self, ArenaError> {
        let grid = &settings.grid;
        let table = &settings.table;
        let spans_x = 2.0 * (table.half_length + table.goal_depth);
        let spans_z = 2.0 * table.half_width;
        let cramped_x = grid.columns > 1 && grid.step_x < spans_x;
        let cramped_z = grid.rows > 1 && grid.step_z < spans_z;
        if cramped_x || cramped_z {
            log::warn!(
                "grid spacing {}x{} is smaller than a table ({spans_x}x{spans_z}); \
                 arenas overlap in world space",
                grid.step_x,
                grid.step_z
            );
        }

        let mut arenas = Vec::with_capacity(grid.arena_count());
        for row in 0..grid.rows {
            for column in 0..grid.columns {
                let id = arenas.len();
                let origin = grid_offset(grid, row, column);
                let arena = Arena::new(id, origin, settings).inspect_err(|e| {
                    log::error!("arena {id} at row {row}, column {column}: {e}");
                })?;
                arenas.push(arena);
            }
        }

        log::info!(
            "Built {} arenas ({}x{}), parallel: {}",
            arenas.len(),
            grid.rows,
            grid.columns,
            settings.parallel
        );
        Ok(Self {
            arenas,
            parallel: settings.parallel,
            step: 0,
        })
    }

    /// Step every arena once, reports in arena order
    pub fn step(&mut self, policy: &dyn Policy) -> Vec<ArenaStepReport> {
        self.step += 1;
        if self.parallel && self.arenas.len() > 1 {
            self.arenas.par_iter_mut().map(|arena| arena.step(policy)).collect()
        } else {
            self.arenas.iter_mut().map(|arena| arena.step(policy)).collect()
        }
    }

    /// Flatten the events of a batch of reports
    pub fn events(reports: &[ArenaStepReport]) -> Vec<ArenaEvent> {
        reports
            .iter()
            .flat_map(|report| {
                report.events.iter().map(|event| ArenaEvent {
                    arena: report.arena,
                    event: event.clone(),
                })
            })
            .collect()
    }

    /// Immediate reset of every arena, with the closing transitions
    pub fn reset_all(&mut self) -> Vec<ArenaStepReport> {
        self.arenas.iter_mut().map(Arena::reset_arena).collect()
    }

    pub fn arenas(&self) -> &[Arena] {
        &self.arenas
    }

    pub fn arena(&self, id: ArenaId) -> Option<&Arena> {
        self.arenas.get(id)
    }

    pub fn arena_mut(&mut self, id: ArenaId) -> Option<&mut Arena> {
        self.arenas.get_mut(id)
    }

    pub fn len(&self) -> usize {
        self.arenas.len()
    }

    pub fn is_empty(&self) -> bool {
        self.arenas.is_empty()
    }

    pub fn steps(&self) -> u64 {
        self.step
    }

    pub fn snapshot(&self) -> PoolSnapshot {
        PoolSnapshot {
            step: self.step,
            arenas: self.arenas.iter().map(Arena::snapshot).collect(),
        }
    }
}
