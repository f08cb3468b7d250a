use glam::{UVec2, Vec2};
use log::{debug, warn};
use rand::Rng;

use crate::astar::{AstarSearch, CancelToken};
use crate::cell::CellId;
use crate::config::{Config, SearchConfig};
use crate::error::NavResult;
use crate::grid::Grid;
use crate::heuristic::Heuristic;
use crate::oracle::CollisionOracle;
use crate::smoothing::{simplify_path, smooth_path, Smoothing};

/// Per-query search options.
#[derive(Clone, Debug, PartialEq)]
pub struct PathRequest {
    pub heuristic: Heuristic,
    pub heuristic_multiplier: f32,
    pub smoothing: Smoothing,
    pub smoothing_iteration_limit: usize,
}

impl Default for PathRequest {
    fn default() -> Self {
        PathRequest::from(&SearchConfig::default())
    }
}

impl From<&SearchConfig> for PathRequest {
    fn from(config: &SearchConfig) -> Self {
        PathRequest {
            heuristic: config.heuristic,
            heuristic_multiplier: config.heuristic_multiplier,
            smoothing: config.smoothing,
            smoothing_iteration_limit: config.smoothing_iteration_limit,
        }
    }
}

impl PathRequest {
    fn search(&self) -> AstarSearch {
        AstarSearch::new(self.heuristic, self.heuristic_multiplier)
    }
}

/// [Pathfinder] ties a [Grid] to the [CollisionOracle] it was built from and
/// answers world-space path queries.
///
/// Searches only borrow the pathfinder, so queries may run concurrently.
/// Placement updates mark the regions dirty; call [update](Self::update)
/// before the next query to relabel them.
#[derive(Clone, Debug)]
pub struct Pathfinder<O: CollisionOracle> {
    grid: Grid,
    oracle: O,
    search: SearchConfig,
}

impl<O: CollisionOracle> Pathfinder<O> {
    pub fn build(layout: &str, config: &Config, oracle: O) -> NavResult<Pathfinder<O>> {
        config.search.validate()?;
        let grid = Grid::build(layout, &config.grid, &oracle)?;
        Ok(Pathfinder {
            grid,
            oracle,
            search: config.search.clone(),
        })
    }

    /// Builds the grid from a layout baked out of the oracle itself.
    pub fn bake(config: &Config, oracle: O) -> NavResult<Pathfinder<O>> {
        let layout = Grid::bake_layout(&config.grid, &oracle)?;
        Pathfinder::build(&layout, config, oracle)
    }

    pub fn grid(&self) -> &Grid {
        &self.grid
    }
    pub fn oracle(&self) -> &O {
        &self.oracle
    }
    /// The request built from the configured search defaults.
    pub fn default_request(&self) -> PathRequest {
        PathRequest::from(&self.search)
    }

    /// Finds a path between two world positions. Both ends snap to the
    /// nearest traversable cell, the goal within the start's region. The
    /// start position is not part of the returned path, which is empty when
    /// no path exists.
    pub fn find_path(&self, start: Vec2, goal: Vec2, request: &PathRequest) -> NavResult<Vec<Vec2>> {
        self.route(start, goal, request, None)
    }

    pub fn find_path_cancellable(
        &self,
        start: Vec2,
        goal: Vec2,
        request: &PathRequest,
        token: &CancelToken,
    ) -> NavResult<Vec<Vec2>> {
        self.route(start, goal, request, Some(token))
    }

    fn route(
        &self,
        start: Vec2,
        goal: Vec2,
        request: &PathRequest,
        token: Option<&CancelToken>,
    ) -> NavResult<Vec<Vec2>> {
        if self.grid.regions_dirty {
            warn!("Searching with stale regions, call update after placement changes");
        }
        let Some(start_cell) = self.grid.closest_traversable_cell(start, None) else {
            return Ok(Vec::new());
        };
        let region = self.grid.cell(start_cell).region();
        let Some(goal_cell) = self.grid.closest_traversable_cell(goal, region) else {
            return Ok(Vec::new());
        };
        let search = request.search();
        let cells = match token {
            Some(token) => search.find_path_cancellable(&self.grid, start_cell, goal_cell, token)?,
            None => search.find_path(&self.grid, start_cell, goal_cell)?,
        };
        if cells.is_empty() {
            debug!("No path from {} to {}", start, goal);
            return Ok(Vec::new());
        }
        Ok(self.finish(start_cell, &cells, request))
    }

    fn finish(&self, start: CellId, cells: &[CellId], request: &PathRequest) -> Vec<Vec2> {
        match request.smoothing {
            Smoothing::None => self.world_path(cells),
            Smoothing::Simplify => {
                let chain: Vec<CellId> = std::iter::once(start).chain(cells.iter().copied()).collect();
                simplify_path(&self.grid, &chain)
            }
            Smoothing::LineOfSight => smooth_path(
                &self.world_path(cells),
                &self.oracle,
                request.smoothing_iteration_limit,
            ),
        }
    }

    fn world_path(&self, cells: &[CellId]) -> Vec<Vec2> {
        cells
            .iter()
            .map(|&id| self.grid.cell(id).world_position())
            .collect()
    }

    /// World position of the traversable cell nearest to `position`.
    pub fn closest_traversable(&self, position: Vec2) -> Option<Vec2> {
        self.grid
            .closest_traversable_cell(position, None)
            .map(|id| self.grid.cell(id).world_position())
    }

    pub fn random_traversable_position<R: Rng + ?Sized>(&self, rng: &mut R) -> Option<Vec2> {
        self.grid
            .random_traversable_cell(rng)
            .map(|id| self.grid.cell(id).world_position())
    }

    pub fn region_fits(&self, size: UVec2, position: Vec2) -> NavResult<bool> {
        self.grid.region_fits(size, position)
    }

    pub fn set_region_walkability(&mut self, size: UVec2, position: Vec2, walkable: bool) -> NavResult<()> {
        self.grid.set_region_walkability(size, position, walkable)
    }

    /// Re-reads the obstacles around `position` from the oracle.
    pub fn refresh_obstacles(&mut self, position: Vec2, radius: u32) {
        self.grid.refresh_obstacles(position, radius, &self.oracle);
    }

    /// Relabels the regions if placement changed since the last labeling.
    pub fn update(&mut self) {
        self.grid.update();
    }
}
