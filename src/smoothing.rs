//! Reduction of dense cell-by-cell paths into sparse waypoint lists.
use glam::Vec2;
use itertools::Itertools;
use log::error;
use serde::{Deserialize, Serialize};

use crate::cell::CellId;
use crate::grid::Grid;
use crate::oracle::CollisionOracle;

/// Post-processing applied to a found path.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Smoothing {
    /// One waypoint per cell.
    None,
    /// Only the cells reached by a change of step direction, plus the goal.
    Simplify,
    /// Line-of-sight shortcuts checked against the collision oracle.
    #[default]
    LineOfSight,
}

/// Turns a chain of cells, starting at the start cell, into waypoints. A cell
/// is kept whenever the step that reaches it differs from the step before,
/// so the first step is always kept. The last cell always ends the path.
pub fn simplify_path(grid: &Grid, cells: &[CellId]) -> Vec<Vec2> {
    if cells.len() < 2 {
        return Vec::new();
    }
    let mut waypoints = Vec::new();
    let mut previous_step = (0, 0);
    for (&from, &to) in cells.iter().tuple_windows() {
        let (from, to) = (grid.cell(from), grid.cell(to));
        let step = (to.x() - from.x(), to.y() - from.y());
        if step != previous_step {
            waypoints.push(to.world_position());
        }
        previous_step = step;
    }
    let last = grid.cell(cells[cells.len() - 1]).world_position();
    if waypoints.last() != Some(&last) {
        waypoints.push(last);
    }
    waypoints
}

/// Drops every waypoint that can be skipped without the straight segment
/// from the previous kept waypoint becoming obstructed. The first and last
/// points are always kept.
///
/// At most `max_iterations` segments are tested. When the limit is hit the
/// points kept so far are returned together with the final point.
pub fn smooth_path<O: CollisionOracle>(path: &[Vec2], oracle: &O, max_iterations: usize) -> Vec<Vec2> {
    if path.len() <= 2 {
        return path.to_vec();
    }
    let mut waypoints = vec![path[0]];
    let mut anchor = 0;
    for (iteration, candidate) in (1..path.len()).enumerate() {
        if iteration >= max_iterations {
            error!(
                "Path smoothing stopped after {} segment checks on a path of {} points",
                max_iterations,
                path.len()
            );
            break;
        }
        if oracle.line_of_sight_blocked(path[anchor], path[candidate]) && candidate - 1 > anchor {
            waypoints.push(path[candidate - 1]);
            anchor = candidate - 1;
        }
    }
    waypoints.push(path[path.len() - 1]);
    waypoints
}
