use core::fmt;
use fixedbitset::FixedBitSet;
use glam::{UVec2, Vec2};
use grid_util::point::Point;
use log::{debug, info, warn};
use rand::seq::IteratorRandom;
use rand::Rng;
use std::cmp::Ordering;

use crate::cell::{Cell, CellId, RegionId, MAX_NEIGHBOURS};
use crate::config::{Connectivity, GridConfig};
use crate::error::{NavError, NavResult};
use crate::heap::{HeapItem, IndexedHeap};
use crate::oracle::CollisionOracle;
use crate::terrain::TerrainClassifier;

/// Layout symbol for a walkable cell. Any other symbol is an obstacle.
pub const WALKABLE: char = '0';
pub const OBSTACLE: char = '1';

/// Flood-fill entry. Every entry ranks equally; the heap is only used as a
/// container with O(1) membership tests.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct FloodNode {
    heap_index: usize,
}

impl PartialOrd for FloodNode {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for FloodNode {
    fn cmp(&self, _other: &Self) -> Ordering {
        Ordering::Equal
    }
}

impl HeapItem for FloodNode {
    fn heap_index(&self) -> usize {
        self.heap_index
    }
    fn set_heap_index(&mut self, index: usize) {
        self.heap_index = index;
    }
}

/// [Grid] owns every [Cell] of the discretized world. Cells are stored column
/// by column, so the cell at `(x, y)` lives at index `y + x * count_y`, the
/// same order as the persisted layout.
#[derive(Clone, Debug)]
pub struct Grid {
    config: GridConfig,
    count_x: usize,
    count_y: usize,
    cells: Vec<Cell>,
    region_count: u32,
    pub regions_dirty: bool,
}

impl Grid {
    /// Builds all cells from a layout string, wires their neighbours and
    /// labels the connected regions.
    pub fn build<O: CollisionOracle>(
        layout: &str,
        config: &GridConfig,
        oracle: &O,
    ) -> NavResult<Grid> {
        let (count_x, count_y) = config.cell_counts()?;
        let symbols: Vec<char> = layout.chars().collect();
        let expected = count_x * count_y;
        if symbols.len() != expected {
            return Err(NavError::LayoutSizeMismatch {
                expected,
                actual: symbols.len(),
            });
        }
        let terrain = TerrainClassifier::new(&config.terrain);
        let bottom_left = config.bottom_left();
        let diameter = config.cell_diameter();
        let mut cells = Vec::with_capacity(expected);
        for x in 0..count_x {
            for y in 0..count_y {
                let world_position = bottom_left
                    + Vec2::new(
                        x as f32 * diameter + config.cell_radius,
                        y as f32 * diameter + config.cell_radius,
                    );
                let walkable = symbols[y + x * count_y] == WALKABLE;
                let movement_penalty = if walkable {
                    terrain.penalty(oracle, world_position, config.cell_radius)
                } else {
                    0
                };
                cells.push(Cell::new(
                    Point::new(x as i32, y as i32),
                    world_position,
                    walkable,
                    movement_penalty,
                ));
            }
        }
        let mut grid = Grid {
            config: config.clone(),
            count_x,
            count_y,
            cells,
            region_count: 0,
            regions_dirty: false,
        };
        grid.connect_neighbours();
        let regions = grid.label_regions();
        info!(
            "Built {}x{} grid with {} connected regions",
            count_x, count_y, regions
        );
        Ok(grid)
    }

    /// Renders the layout string for the configured geometry by asking the
    /// oracle about every cell.
    pub fn bake_layout<O: CollisionOracle>(config: &GridConfig, oracle: &O) -> NavResult<String> {
        let (count_x, count_y) = config.cell_counts()?;
        let bottom_left = config.bottom_left();
        let diameter = config.cell_diameter();
        let probe_radius = config.cell_radius * config.collision_radius;
        let mut layout = String::with_capacity(count_x * count_y);
        for x in 0..count_x {
            for y in 0..count_y {
                let world_position = bottom_left
                    + Vec2::new(
                        x as f32 * diameter + config.cell_radius,
                        y as f32 * diameter + config.cell_radius,
                    );
                layout.push(if oracle.is_region_blocked(world_position, probe_radius) {
                    OBSTACLE
                } else {
                    WALKABLE
                });
            }
        }
        Ok(layout)
    }

    pub fn config(&self) -> &GridConfig {
        &self.config
    }
    pub fn count_x(&self) -> usize {
        self.count_x
    }
    pub fn count_y(&self) -> usize {
        self.count_y
    }
    pub fn cell_count(&self) -> usize {
        self.cells.len()
    }
    pub fn cells(&self) -> &[Cell] {
        &self.cells
    }
    pub fn cell(&self, id: CellId) -> &Cell {
        &self.cells[id]
    }
    /// Number of regions found by the last labeling pass.
    pub fn region_count(&self) -> u32 {
        self.region_count
    }
    pub fn in_bounds(&self, x: i32, y: i32) -> bool {
        x >= 0 && y >= 0 && (x as usize) < self.count_x && (y as usize) < self.count_y
    }
    pub fn cell_id(&self, x: i32, y: i32) -> Option<CellId> {
        self.in_bounds(x, y).then(|| y as usize + x as usize * self.count_y)
    }
    pub fn cell_at(&self, x: i32, y: i32) -> Option<&Cell> {
        self.cell_id(x, y).map(|id| &self.cells[id])
    }

    fn is_walkable_at(&self, x: i32, y: i32) -> bool {
        self.cell_at(x, y).map_or(false, Cell::is_walkable)
    }

    /// Fills the neighbour slots of every cell. Offsets are scanned with `dx`
    /// outer and `dy` inner and packed into the front of the slot array.
    fn connect_neighbours(&mut self) {
        let connectivity = self.config.connectivity;
        for id in 0..self.cells.len() {
            let (x, y) = (self.cells[id].x(), self.cells[id].y());
            let mut slots = [None; MAX_NEIGHBOURS];
            let mut slot = 0;
            for dx in -1..=1 {
                for dy in -1..=1 {
                    if dx == 0 && dy == 0 {
                        continue;
                    }
                    let diagonal = dx != 0 && dy != 0;
                    if diagonal && connectivity == Connectivity::FourDirectional {
                        continue;
                    }
                    let (check_x, check_y) = (x + dx, y + dy);
                    let Some(neighbour) = self.cell_id(check_x, check_y) else {
                        continue;
                    };
                    if diagonal
                        && connectivity == Connectivity::EightDirectionalNoCornerCut
                        && !(self.is_walkable_at(check_x, check_y)
                            && self.is_walkable_at(check_x, y)
                            && self.is_walkable_at(x, check_y))
                    {
                        continue;
                    }
                    slots[slot] = Some(neighbour);
                    slot += 1;
                }
            }
            self.cells[id].neighbours = slots;
        }
    }

    /// Labels every connected traversable component with its own region id,
    /// counting up from 1 in scan order. Returns the number of regions.
    pub fn label_regions(&mut self) -> u32 {
        for cell in &mut self.cells {
            cell.region = None;
        }
        let capacity = self.cells.len();
        let mut nodes = vec![FloodNode { heap_index: usize::MAX }; capacity];
        let mut open = IndexedHeap::with_capacity(capacity);
        let mut closed = FixedBitSet::with_capacity(capacity);
        let mut regions: u32 = 0;
        for seed in 0..capacity {
            if !self.cells[seed].is_walkable() || self.cells[seed].region.is_some() {
                continue;
            }
            regions += 1;
            self.cells[seed].region = Some(regions);
            // Capacity covers every cell and each cell is queued at most once.
            if open.insert(&mut nodes, seed).is_err() {
                break;
            }
            while let Some(current) = open.extract_best(&mut nodes) {
                closed.insert(current);
                for neighbour in self.cells[current].neighbours {
                    let Some(neighbour) = neighbour else {
                        continue;
                    };
                    if !self.cells[neighbour].is_walkable()
                        || closed.contains(neighbour)
                        || open.contains(&nodes, neighbour)
                    {
                        continue;
                    }
                    self.cells[neighbour].region = Some(regions);
                    if open.insert(&mut nodes, neighbour).is_err() {
                        break;
                    }
                }
            }
        }
        self.region_count = regions;
        self.regions_dirty = false;
        debug!("Labeled {} regions", regions);
        regions
    }

    /// Relabels the regions if walkability changed since the last pass.
    pub fn update(&mut self) {
        if self.regions_dirty {
            info!("Regions are dirty: relabeling");
            self.label_regions();
        }
    }

    /// Checks if both cells are traversable and share a region.
    pub fn reachable(&self, start: CellId, goal: CellId) -> bool {
        let (start, goal) = (&self.cells[start], &self.cells[goal]);
        start.is_walkable()
            && goal.is_walkable()
            && start.region().is_some()
            && start.region() == goal.region()
    }

    /// Maps a world position to the cell covering it, clamped to the grid
    /// edge for positions outside the grid.
    pub fn cell_from_world(&self, world_position: Vec2) -> CellId {
        let local = world_position - self.config.origin + self.config.world_size / 2.0;
        let percent = (local / self.config.world_size).clamp(Vec2::ZERO, Vec2::ONE);
        let x = ((self.count_x - 1) as f32 * percent.x).round() as usize;
        let y = ((self.count_y - 1) as f32 * percent.y).round() as usize;
        y + x * self.count_y
    }

    /// Finds the cell for `world_position`, or the first traversable cell on
    /// the surrounding square rings when that cell is blocked or outside the
    /// required region. Returns `None` once the ring radius exceeds
    /// `nearest_cell_distance`.
    pub fn closest_traversable_cell(
        &self,
        world_position: Vec2,
        region: Option<RegionId>,
    ) -> Option<CellId> {
        let id = self.cell_from_world(world_position);
        let cell = &self.cells[id];
        if cell.is_traversable_in(region) {
            return Some(id);
        }
        let (centre_x, centre_y) = (cell.x(), cell.y());
        // Rings wider than the grid only probe cells outside it.
        let max_radius = self.count_x.max(self.count_y) as i32;
        let mut radius = 1;
        while radius <= max_radius && radius as f32 <= self.config.nearest_cell_distance {
            for i in -radius..=radius {
                let probes = [
                    (centre_x + i, centre_y + radius),
                    (centre_x + i, centre_y - radius),
                    (centre_x + radius, centre_y + i),
                    (centre_x - radius, centre_y + i),
                ];
                for (x, y) in probes {
                    if let Some(found) = self.cell_id(x, y) {
                        if self.cells[found].is_traversable_in(region) {
                            return Some(found);
                        }
                    }
                }
            }
            radius += 1;
        }
        warn!(
            "No traversable cell within {} cells of {}",
            self.config.nearest_cell_distance, world_position
        );
        None
    }

    pub fn random_traversable_cell<R: Rng + ?Sized>(&self, rng: &mut R) -> Option<CellId> {
        self.cells
            .iter()
            .enumerate()
            .filter(|(_, cell)| cell.is_walkable())
            .map(|(id, _)| id)
            .choose(rng)
    }

    /// Cells covered by a footprint of `size` centred on the cell under
    /// `world_position`, spanning `1 - size..=size` on each axis.
    fn footprint(&self, size: UVec2, world_position: Vec2) -> NavResult<Vec<CellId>> {
        let centre = self.cells[self.cell_from_world(world_position)].coord();
        let (size_x, size_y) = (size.x as i32, size.y as i32);
        let mut covered = Vec::new();
        for i in (1 - size_x)..=size_x {
            for j in (1 - size_y)..=size_y {
                let (x, y) = (centre.x + i, centre.y + j);
                match self.cell_id(x, y) {
                    Some(id) => covered.push(id),
                    None => return Err(NavError::OutOfBounds { x, y }),
                }
            }
        }
        Ok(covered)
    }

    /// Checks whether an object of `size` placed at `world_position` would
    /// only cover walkable cells.
    pub fn region_fits(&self, size: UVec2, world_position: Vec2) -> NavResult<bool> {
        Ok(self
            .footprint(size, world_position)?
            .into_iter()
            .all(|id| self.cells[id].is_walkable()))
    }

    /// Marks the footprint of an object as walkable or blocked. Nothing is
    /// written when any part of the footprint lies outside the grid.
    pub fn set_region_walkability(
        &mut self,
        size: UVec2,
        world_position: Vec2,
        walkable: bool,
    ) -> NavResult<()> {
        for id in self.footprint(size, world_position)? {
            if self.cells[id].is_walkable() != walkable {
                self.cells[id].set_walkable(walkable);
                self.regions_dirty = true;
            }
        }
        Ok(())
    }

    /// Re-queries the oracle for every cell within `radius` cells of the cell
    /// under `world_position`.
    pub fn refresh_obstacles<O: CollisionOracle>(
        &mut self,
        world_position: Vec2,
        radius: u32,
        oracle: &O,
    ) {
        let centre = self.cells[self.cell_from_world(world_position)].coord();
        let probe_radius = self.config.cell_radius * self.config.collision_radius;
        let radius = radius as i32;
        for x in -radius..=radius {
            for y in -radius..=radius {
                let Some(id) = self.cell_id(centre.x + x, centre.y + y) else {
                    continue;
                };
                let cell = &mut self.cells[id];
                let walkable = !oracle.is_region_blocked(cell.world_position(), probe_radius);
                if cell.is_walkable() != walkable {
                    cell.set_walkable(walkable);
                    self.regions_dirty = true;
                }
            }
        }
    }
}

impl fmt::Display for Grid {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        for y in (0..self.count_y).rev() {
            let row: String = (0..self.count_x)
                .map(|x| {
                    if self.cells[y + x * self.count_y].is_walkable() {
                        '.'
                    } else {
                        '#'
                    }
                })
                .collect();
            writeln!(f, "{}", row)?;
        }
        Ok(())
    }
}
