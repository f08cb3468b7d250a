use serde::{Deserialize, Serialize};

use crate::cell::Cell;
use crate::{C, D};

/// Distance function used both for step costs and for the estimate to the goal.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Heuristic {
    /// Truncated world-space distance between cell centres.
    VectorMagnitude,
    /// Octile distance: the cost of taking as many diagonal steps as possible
    /// before going straight.
    #[default]
    Manhattan,
    /// Straight-line grid distance, capped by the octile distance so it never
    /// overestimates the remaining step cost.
    Euclidean,
}

impl Heuristic {
    pub fn distance(self, a: &Cell, b: &Cell) -> i32 {
        match self {
            Heuristic::VectorMagnitude => a.world_position().distance(b.world_position()) as i32,
            Heuristic::Manhattan => octile(a, b),
            Heuristic::Euclidean => {
                let (delta_x, delta_y) = deltas(a, b);
                let straight = (C as f32 * ((delta_x * delta_x + delta_y * delta_y) as f32).sqrt()) as i32;
                straight.min(octile(a, b))
            }
        }
    }
}

fn deltas(a: &Cell, b: &Cell) -> (i32, i32) {
    ((a.x() - b.x()).abs(), (a.y() - b.y()).abs())
}

fn octile(a: &Cell, b: &Cell) -> i32 {
    let (delta_x, delta_y) = deltas(a, b);
    if delta_x > delta_y {
        D * delta_y + C * (delta_x - delta_y)
    } else {
        D * delta_x + C * (delta_y - delta_x)
    }
}
