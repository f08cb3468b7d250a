use glam::Vec2;
use grid_util::point::Point;

/// Index of a [Cell] in its grid's cell vector.
pub type CellId = usize;
/// Label shared by all cells of one connected traversable component.
pub type RegionId = u32;

pub const MAX_NEIGHBOURS: usize = 8;

/// A single grid-addressed unit of space. Coordinates and world position are
/// fixed at creation; only walkability and the region label change later.
#[derive(Clone, Debug, PartialEq)]
pub struct Cell {
    coord: Point,
    world_position: Vec2,
    walkable: bool,
    movement_penalty: i32,
    pub(crate) region: Option<RegionId>,
    pub(crate) neighbours: [Option<CellId>; MAX_NEIGHBOURS],
}

impl Cell {
    pub fn new(coord: Point, world_position: Vec2, walkable: bool, movement_penalty: i32) -> Cell {
        Cell {
            coord,
            world_position,
            walkable,
            movement_penalty,
            region: None,
            neighbours: [None; MAX_NEIGHBOURS],
        }
    }
    pub fn coord(&self) -> Point {
        self.coord
    }
    pub fn x(&self) -> i32 {
        self.coord.x
    }
    pub fn y(&self) -> i32 {
        self.coord.y
    }
    pub fn world_position(&self) -> Vec2 {
        self.world_position
    }
    pub fn is_walkable(&self) -> bool {
        self.walkable
    }
    pub(crate) fn set_walkable(&mut self, walkable: bool) {
        self.walkable = walkable;
    }
    pub fn movement_penalty(&self) -> i32 {
        self.movement_penalty
    }
    /// `None` until regions are labeled, and always for obstacles.
    pub fn region(&self) -> Option<RegionId> {
        self.region
    }
    /// Neighbour slots in scan order. Slots are compacted, so a slot index
    /// carries no direction.
    pub fn neighbour_slots(&self) -> &[Option<CellId>; MAX_NEIGHBOURS] {
        &self.neighbours
    }
    pub fn neighbours(&self) -> impl Iterator<Item = CellId> + '_ {
        self.neighbours.iter().flatten().copied()
    }
    /// Walkable, and inside `region` when one is required.
    pub fn is_traversable_in(&self, region: Option<RegionId>) -> bool {
        self.walkable && region.map_or(true, |r| self.region == Some(r))
    }
}
