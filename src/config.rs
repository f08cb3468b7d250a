//! Grid geometry and search defaults, loadable from TOML.
//!
//! ```toml
//! [grid]
//! world_size = [30.0, 20.0]
//! cell_radius = 0.5
//! connectivity = "eight_directional"
//!
//! [[grid.terrain]]
//! mask = 8
//! penalty = 20
//!
//! [search]
//! heuristic = "euclidean"
//! smoothing = "simplify"
//! ```
use glam::Vec2;
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::{NavError, NavResult};
use crate::heuristic::Heuristic;
use crate::smoothing::Smoothing;
use crate::terrain::TerrainType;

/// How cells are wired to the cells around them.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Connectivity {
    FourDirectional,
    EightDirectional,
    /// Diagonal moves are only allowed when both cells flanking the move are
    /// traversable.
    #[default]
    EightDirectionalNoCornerCut,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GridConfig {
    /// World position of the grid centre.
    pub origin: Vec2,
    pub world_size: Vec2,
    pub cell_radius: f32,
    /// Largest ring radius, in cells, searched for a nearby traversable cell.
    pub nearest_cell_distance: f32,
    /// Scale applied to the cell radius when asking the oracle for obstacles.
    pub collision_radius: f32,
    pub connectivity: Connectivity,
    pub terrain: Vec<TerrainType>,
}

impl Default for GridConfig {
    fn default() -> Self {
        Self {
            origin: Vec2::ZERO,
            world_size: Vec2::new(100.0, 100.0),
            cell_radius: 1.0,
            nearest_cell_distance: 10.0,
            collision_radius: 1.0,
            connectivity: Connectivity::default(),
            terrain: Vec::new(),
        }
    }
}

impl GridConfig {
    pub fn new(origin: Vec2, world_size: Vec2, cell_radius: f32, connectivity: Connectivity) -> Self {
        Self {
            origin,
            world_size,
            cell_radius,
            connectivity,
            ..Self::default()
        }
    }

    pub fn cell_diameter(&self) -> f32 {
        self.cell_radius * 2.0
    }

    /// Number of cells along each axis.
    pub fn cell_counts(&self) -> NavResult<(usize, usize)> {
        if !(self.cell_radius > 0.0) {
            return Err(NavError::InvalidGeometry(format!(
                "cell radius must be positive, got {}",
                self.cell_radius
            )));
        }
        if !(self.world_size.x > 0.0 && self.world_size.y > 0.0) {
            return Err(NavError::InvalidGeometry(format!(
                "world size must be positive, got {}",
                self.world_size
            )));
        }
        let count_x = (self.world_size.x / self.cell_diameter()).round() as usize;
        let count_y = (self.world_size.y / self.cell_diameter()).round() as usize;
        if count_x == 0 || count_y == 0 {
            return Err(NavError::InvalidGeometry(format!(
                "world size {} holds no cells of diameter {}",
                self.world_size,
                self.cell_diameter()
            )));
        }
        Ok((count_x, count_y))
    }

    /// World position of the bottom-left corner of the grid.
    pub fn bottom_left(&self) -> Vec2 {
        self.origin - self.world_size / 2.0
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    pub heuristic: Heuristic,
    /// Scale on the goal estimate. Above 1 trades optimality for speed, 0
    /// turns the search into Dijkstra.
    pub heuristic_multiplier: f32,
    pub smoothing: Smoothing,
    pub smoothing_iteration_limit: usize,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            heuristic: Heuristic::default(),
            heuristic_multiplier: 1.0,
            smoothing: Smoothing::LineOfSight,
            smoothing_iteration_limit: 1000,
        }
    }
}

impl SearchConfig {
    pub fn validate(&self) -> NavResult<()> {
        crate::astar::validate_multiplier(self.heuristic_multiplier)
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub grid: GridConfig,
    pub search: SearchConfig,
}

impl Config {
    pub fn from_toml_str(contents: &str) -> NavResult<Config> {
        let config: Config = toml::from_str(contents)?;
        config.search.validate()?;
        Ok(config)
    }

    pub fn from_file<P: AsRef<Path>>(path: P) -> NavResult<Config> {
        let contents = std::fs::read_to_string(path)?;
        Config::from_toml_str(&contents)
    }
}
