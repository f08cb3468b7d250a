//! A* over the neighbour graph of a [Grid].
//!
//! All per-search bookkeeping lives in a map owned by the search call, keyed
//! by cell id, so a grid can be searched from several threads at once.
use fixedbitset::FixedBitSet;
use fxhash::FxBuildHasher;
use indexmap::IndexMap;
use log::{debug, warn};
use std::cmp::Ordering;
use std::sync::atomic::{AtomicBool, Ordering as AtomicOrdering};
use std::sync::Arc;

use crate::cell::CellId;
use crate::error::{NavError, NavResult};
use crate::grid::Grid;
use crate::heap::{HeapItem, IndexedHeap};
use crate::heuristic::Heuristic;

type FxIndexMap<K, V> = IndexMap<K, V, FxBuildHasher>;

/// Shared flag used to abort a running search from another thread.
#[derive(Clone, Debug, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> CancelToken {
        CancelToken::default()
    }
    pub fn cancel(&self) {
        self.0.store(true, AtomicOrdering::Relaxed);
    }
    pub fn is_cancelled(&self) -> bool {
        self.0.load(AtomicOrdering::Relaxed)
    }
}

#[derive(Clone, Debug)]
struct SearchNode {
    cost: i32,
    estimated_cost: i32,
    parent: Option<usize>,
    heap_index: usize,
}

impl SearchNode {
    fn total_cost(&self) -> i64 {
        i64::from(self.cost) + i64::from(self.estimated_cost)
    }
}

impl Eq for SearchNode {}

impl PartialEq for SearchNode {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl PartialOrd for SearchNode {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for SearchNode {
    fn cmp(&self, other: &Self) -> Ordering {
        // Lower total cost ranks higher; among equal totals the node with the
        // smaller estimate to the goal goes first.
        other
            .total_cost()
            .cmp(&self.total_cost())
            .then_with(|| other.estimated_cost.cmp(&self.estimated_cost))
    }
}

impl HeapItem for SearchNode {
    fn heap_index(&self) -> usize {
        self.heap_index
    }
    fn set_heap_index(&mut self, index: usize) {
        self.heap_index = index;
    }
}

pub(crate) fn validate_multiplier(multiplier: f32) -> NavResult<()> {
    if multiplier.is_finite() && multiplier >= 0.0 {
        Ok(())
    } else {
        Err(NavError::InvalidMultiplier(multiplier))
    }
}

/// Walks the parent links back from the goal. The start node has no parent
/// and is left out.
fn reverse_path(nodes: &FxIndexMap<CellId, SearchNode>, goal: usize) -> Vec<CellId> {
    let mut path: Vec<CellId> = std::iter::successors(Some(goal), |&ix| nodes[ix].parent)
        .filter(|&ix| nodes[ix].parent.is_some())
        .filter_map(|ix| nodes.get_index(ix).map(|(&cell, _)| cell))
        .collect();
    path.reverse();
    path
}

#[derive(Clone, Debug)]
pub struct AstarSearch {
    pub heuristic: Heuristic,
    /// Scale on the estimate to the goal; 1 keeps the search optimal.
    pub heuristic_multiplier: f32,
}

impl Default for AstarSearch {
    fn default() -> Self {
        AstarSearch::new(Heuristic::default(), 1.0)
    }
}

impl AstarSearch {
    pub fn new(heuristic: Heuristic, heuristic_multiplier: f32) -> AstarSearch {
        AstarSearch {
            heuristic,
            heuristic_multiplier,
        }
    }

    /// Computes the cell path from `start` to `goal`, excluding `start`.
    /// An empty path means the goal cannot be reached.
    pub fn find_path(&self, grid: &Grid, start: CellId, goal: CellId) -> NavResult<Vec<CellId>> {
        self.search(grid, start, goal, None)
    }

    /// Like [find_path](Self::find_path), but returns [NavError::Cancelled]
    /// once `token` is cancelled.
    pub fn find_path_cancellable(
        &self,
        grid: &Grid,
        start: CellId,
        goal: CellId,
        token: &CancelToken,
    ) -> NavResult<Vec<CellId>> {
        self.search(grid, start, goal, Some(token))
    }

    /// Sum of step costs and movement penalties along `path`, which starts
    /// after `start`.
    pub fn path_cost(&self, grid: &Grid, start: CellId, path: &[CellId]) -> i32 {
        std::iter::once(&start)
            .chain(path)
            .zip(path)
            .map(|(&from, &to)| {
                self.heuristic.distance(grid.cell(from), grid.cell(to))
                    + grid.cell(to).movement_penalty()
            })
            .sum()
    }

    /// Saturates at `i32::MAX` for very large multipliers.
    fn estimate(&self, grid: &Grid, cell: CellId, goal: CellId) -> i32 {
        let distance = self.heuristic.distance(grid.cell(cell), grid.cell(goal));
        (distance as f32 * self.heuristic_multiplier).round() as i32
    }

    /// Rejects multipliers that are negative, NaN or infinite.
    pub fn validate(&self) -> NavResult<()> {
        validate_multiplier(self.heuristic_multiplier)
    }

    fn search(
        &self,
        grid: &Grid,
        start: CellId,
        goal: CellId,
        token: Option<&CancelToken>,
    ) -> NavResult<Vec<CellId>> {
        self.validate()?;
        if !grid.cell(start).is_walkable() || !grid.cell(goal).is_walkable() {
            debug!("Start or goal cell is blocked");
            return Ok(Vec::new());
        }
        let capacity = grid.cell_count();
        let mut nodes: FxIndexMap<CellId, SearchNode> = FxIndexMap::default();
        let mut open = IndexedHeap::with_capacity(capacity);
        let mut closed = FixedBitSet::with_capacity(capacity);

        let (start_ix, _) = nodes.insert_full(
            start,
            SearchNode {
                cost: 0,
                estimated_cost: 0,
                parent: None,
                heap_index: usize::MAX,
            },
        );
        open.insert(&mut nodes, start_ix)?;

        while let Some(current_ix) = open.extract_best(&mut nodes) {
            if token.map_or(false, CancelToken::is_cancelled) {
                return Err(NavError::Cancelled);
            }
            let current = match nodes.get_index(current_ix) {
                Some((&cell, _)) => cell,
                None => break,
            };
            closed.insert(current);
            if current == goal {
                let path = reverse_path(&nodes, current_ix);
                debug!(
                    "Found path of {} cells after expanding {} cells",
                    path.len(),
                    closed.count_ones(..)
                );
                return Ok(path);
            }
            let current_cost = nodes[current_ix].cost;
            for neighbour in grid.cell(current).neighbours() {
                let neighbour_cell = grid.cell(neighbour);
                if !neighbour_cell.is_walkable() || closed.contains(neighbour) {
                    continue;
                }
                let new_cost = current_cost
                    .saturating_add(self.heuristic.distance(grid.cell(current), neighbour_cell))
                    .saturating_add(neighbour_cell.movement_penalty());
                let known = nodes.get_index_of(&neighbour);
                let in_open = known.map_or(false, |ix| open.contains(&nodes, ix));
                if in_open && known.map_or(false, |ix| new_cost >= nodes[ix].cost) {
                    continue;
                }
                let estimated_cost = self.estimate(grid, neighbour, goal);
                match known {
                    Some(ix) => {
                        let node = &mut nodes[ix];
                        node.cost = new_cost;
                        node.estimated_cost = estimated_cost;
                        node.parent = Some(current_ix);
                        if in_open {
                            open.update(&mut nodes, ix);
                        } else {
                            open.insert(&mut nodes, ix)?;
                        }
                    }
                    None => {
                        let (ix, _) = nodes.insert_full(
                            neighbour,
                            SearchNode {
                                cost: new_cost,
                                estimated_cost,
                                parent: Some(current_ix),
                                heap_index: usize::MAX,
                            },
                        );
                        open.insert(&mut nodes, ix)?;
                    }
                }
            }
        }
        if grid.reachable(start, goal) {
            warn!("Reachable goal could not be pathed to, are the regions stale?");
        } else {
            debug!("No path: open set exhausted");
        }
        Ok(Vec::new())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{Connectivity, GridConfig};
    use crate::oracle::{CollisionOracle, LayerMask, OpenWorld};
    use crate::terrain::TerrainType;
    use glam::Vec2;
    use smallvec::{smallvec, SmallVec};

    fn grid_3x3(layout: &str, connectivity: Connectivity) -> Grid {
        let config = GridConfig::new(Vec2::ZERO, Vec2::new(3.0, 3.0), 0.5, connectivity);
        Grid::build(layout, &config, &OpenWorld).unwrap()
    }

    fn coords(grid: &Grid, path: &[CellId]) -> Vec<(i32, i32)> {
        path.iter()
            .map(|&id| (grid.cell(id).x(), grid.cell(id).y()))
            .collect()
    }

    fn solve(grid: &Grid, start: (i32, i32), goal: (i32, i32)) -> Vec<(i32, i32)> {
        let start = grid.cell_id(start.0, start.1).unwrap();
        let goal = grid.cell_id(goal.0, goal.1).unwrap();
        let path = AstarSearch::default().find_path(grid, start, goal).unwrap();
        coords(grid, &path)
    }

    #[test]
    fn open_grid_diagonal() {
        let grid = grid_3x3("000000000", Connectivity::EightDirectional);
        assert_eq!(solve(&grid, (0, 0), (2, 2)), vec![(1, 1), (2, 2)]);
    }

    #[test]
    fn cuts_corner_around_obstacle() {
        let grid = grid_3x3("000010000", Connectivity::EightDirectional);
        assert_eq!(solve(&grid, (0, 0), (2, 2)), vec![(0, 1), (1, 2), (2, 2)]);
    }

    #[test]
    fn goes_around_without_corner_cutting() {
        let grid = grid_3x3("000010000", Connectivity::EightDirectionalNoCornerCut);
        assert_eq!(
            solve(&grid, (0, 0), (2, 2)),
            vec![(0, 1), (0, 2), (1, 2), (2, 2)]
        );
    }

    #[test]
    fn goes_around_wall_without_corner_cutting() {
        let grid = grid_3x3("000011000", Connectivity::EightDirectionalNoCornerCut);
        assert_eq!(
            solve(&grid, (0, 0), (2, 2)),
            vec![(1, 0), (2, 0), (2, 1), (2, 2)]
        );
    }

    #[test]
    fn four_directional_steps() {
        let grid = grid_3x3("000000000", Connectivity::FourDirectional);
        assert_eq!(solve(&grid, (0, 0), (2, 2)).len(), 4);
    }

    #[test]
    fn blocked_goal() {
        let grid = grid_3x3("000000001", Connectivity::EightDirectional);
        assert!(solve(&grid, (0, 0), (2, 2)).is_empty());
    }

    #[test]
    fn blocked_start() {
        let grid = grid_3x3("100000000", Connectivity::EightDirectional);
        assert!(solve(&grid, (0, 0), (2, 2)).is_empty());
    }

    #[test]
    fn no_path_across_wall() {
        let grid = grid_3x3("000111000", Connectivity::EightDirectional);
        assert!(solve(&grid, (0, 0), (2, 2)).is_empty());
    }

    #[test]
    fn equal_start_goal() {
        let grid = grid_3x3("000000000", Connectivity::EightDirectional);
        assert!(solve(&grid, (1, 1), (1, 1)).is_empty());
    }

    /// Reports terrain layer 0 under a single world point.
    struct Mud(Vec2);

    impl CollisionOracle for Mud {
        fn is_region_blocked(&self, _point: Vec2, _radius: f32) -> bool {
            false
        }
        fn line_of_sight_blocked(&self, _from: Vec2, _to: Vec2) -> bool {
            false
        }
        fn overlapping_layers(&self, point: Vec2, radius: f32) -> SmallVec<[u8; 4]> {
            if point.distance(self.0) < radius {
                smallvec![0]
            } else {
                SmallVec::new()
            }
        }
    }

    #[test]
    fn penalties_steer_the_path() {
        let mut config = GridConfig::new(
            Vec2::ZERO,
            Vec2::new(5.0, 3.0),
            0.5,
            Connectivity::FourDirectional,
        );
        config.terrain = vec![TerrainType {
            mask: LayerMask(1),
            penalty: 100,
        }];
        // Cell (2, 0) sits at (0, -1).
        let grid = Grid::build(&"0".repeat(15), &config, &Mud(Vec2::new(0.0, -1.0))).unwrap();
        assert_eq!(grid.cell_at(2, 0).unwrap().movement_penalty(), 100);
        let path = solve(&grid, (0, 0), (4, 0));
        assert!(!path.contains(&(2, 0)));
        assert_eq!(path.len(), 6);
        assert_eq!(path.last(), Some(&(4, 0)));

        let search = AstarSearch::default();
        let start = grid.cell_id(0, 0).unwrap();
        let cells = search
            .find_path(&grid, start, grid.cell_id(4, 0).unwrap())
            .unwrap();
        assert_eq!(search.path_cost(&grid, start, &cells), 60);
    }

    #[test]
    fn heuristics_reach_goal() {
        let config = GridConfig::new(Vec2::ZERO, Vec2::new(6.0, 6.0), 0.5, Connectivity::EightDirectional);
        let grid = Grid::build(&"0".repeat(36), &config, &OpenWorld).unwrap();
        let start = grid.cell_id(0, 0).unwrap();
        let goal = grid.cell_id(5, 3).unwrap();
        let search = AstarSearch::new(Heuristic::Manhattan, 1.0);
        let path = search.find_path(&grid, start, goal).unwrap();
        assert_eq!(path.len(), 5);
        assert_eq!(search.path_cost(&grid, start, &path), 82);
        for heuristic in [Heuristic::Euclidean, Heuristic::VectorMagnitude] {
            let path = AstarSearch::new(heuristic, 1.0)
                .find_path(&grid, start, goal)
                .unwrap();
            assert_eq!(path.last(), Some(&goal));
        }
    }

    #[test]
    fn zero_multiplier_matches_optimal_cost() {
        let layout = "000000\
                      011110\
                      000010\
                      011010\
                      000010\
                      000000";
        let config = GridConfig::new(Vec2::ZERO, Vec2::new(6.0, 6.0), 0.5, Connectivity::EightDirectionalNoCornerCut);
        let grid = Grid::build(layout, &config, &OpenWorld).unwrap();
        let start = grid.cell_id(0, 0).unwrap();
        let goal = grid.cell_id(2, 2).unwrap();
        let guided = AstarSearch::new(Heuristic::Manhattan, 1.0);
        let dijkstra = AstarSearch::new(Heuristic::Manhattan, 0.0);
        let guided_path = guided.find_path(&grid, start, goal).unwrap();
        let dijkstra_path = dijkstra.find_path(&grid, start, goal).unwrap();
        assert!(!guided_path.is_empty());
        assert_eq!(
            guided.path_cost(&grid, start, &guided_path),
            dijkstra.path_cost(&grid, start, &dijkstra_path)
        );
    }

    #[test]
    fn path_cost_sums_steps() {
        let grid = grid_3x3("000010000", Connectivity::EightDirectionalNoCornerCut);
        let search = AstarSearch::default();
        let start = grid.cell_id(0, 0).unwrap();
        let goal = grid.cell_id(2, 2).unwrap();
        let path = search.find_path(&grid, start, goal).unwrap();
        assert_eq!(search.path_cost(&grid, start, &path), 40);
    }

    #[test]
    fn huge_multiplier_still_finds_path() {
        let config = GridConfig::new(Vec2::ZERO, Vec2::new(5.0, 5.0), 0.5, Connectivity::EightDirectional);
        let grid = Grid::build(&"0".repeat(25), &config, &OpenWorld).unwrap();
        let goal = grid.cell_id(4, 4).unwrap();
        let path = AstarSearch::new(Heuristic::Manhattan, 1.0e9)
            .find_path(&grid, grid.cell_id(0, 0).unwrap(), goal)
            .unwrap();
        assert_eq!(path.last(), Some(&goal));
    }

    #[test]
    fn rejects_invalid_multiplier() {
        let grid = grid_3x3("000000000", Connectivity::EightDirectional);
        let (start, goal) = (grid.cell_id(0, 0).unwrap(), grid.cell_id(2, 2).unwrap());
        for multiplier in [-1.0, f32::NAN, f32::INFINITY] {
            let result = AstarSearch::new(Heuristic::Manhattan, multiplier).find_path(&grid, start, goal);
            assert!(matches!(result, Err(NavError::InvalidMultiplier(_))));
        }
    }

    #[test]
    fn multiplier_rounds_to_nearest() {
        let grid = grid_3x3("000000000", Connectivity::EightDirectional);
        let (a, b) = (grid.cell_id(0, 0).unwrap(), grid.cell_id(1, 0).unwrap());
        // 10 * 1.26 = 12.6
        assert_eq!(AstarSearch::new(Heuristic::Manhattan, 1.26).estimate(&grid, a, b), 13);
        assert_eq!(AstarSearch::new(Heuristic::Manhattan, 1.24).estimate(&grid, a, b), 12);

        // Cells five world units apart: 5 * 1.5 = 7.5
        let config = GridConfig::new(Vec2::ZERO, Vec2::new(15.0, 15.0), 2.5, Connectivity::EightDirectional);
        let wide = Grid::build("000000000", &config, &OpenWorld).unwrap();
        let (a, b) = (wide.cell_id(0, 0).unwrap(), wide.cell_id(1, 0).unwrap());
        assert_eq!(
            AstarSearch::new(Heuristic::VectorMagnitude, 1.5).estimate(&wide, a, b),
            8
        );
    }

    #[test]
    fn cancelled_search() {
        let grid = grid_3x3("000000000", Connectivity::EightDirectional);
        let token = CancelToken::new();
        token.cancel();
        let result = AstarSearch::default().find_path_cancellable(
            &grid,
            grid.cell_id(0, 0).unwrap(),
            grid.cell_id(2, 2).unwrap(),
            &token,
        );
        assert!(matches!(result, Err(NavError::Cancelled)));
    }
}
