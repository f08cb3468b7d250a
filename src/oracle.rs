use glam::Vec2;
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

/// A set of physics layers, one bit per layer index (0..32).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LayerMask(pub u32);

impl LayerMask {
    pub const NONE: LayerMask = LayerMask(0);

    /// Layers past 31 give an empty mask.
    pub fn from_layer(layer: u8) -> LayerMask {
        LayerMask(1u32.checked_shl(layer.into()).unwrap_or(0))
    }
    pub fn contains(self, layer: u8) -> bool {
        layer < 32 && self.0 & (1 << layer) != 0
    }
    /// Index of the lowest set bit, if any.
    pub fn lowest_layer(self) -> Option<u8> {
        (self.0 != 0).then(|| self.0.trailing_zeros() as u8)
    }
}

impl std::ops::BitOr for LayerMask {
    type Output = LayerMask;
    fn bitor(self, rhs: LayerMask) -> LayerMask {
        LayerMask(self.0 | rhs.0)
    }
}

impl std::ops::BitOrAssign for LayerMask {
    fn bitor_assign(&mut self, rhs: LayerMask) {
        self.0 |= rhs.0;
    }
}

/// The physics world the grid is laid over. The grid never simulates
/// anything itself; every obstruction question goes through this trait.
pub trait CollisionOracle {
    /// Whether any obstacle overlaps the circle at `point`.
    fn is_region_blocked(&self, point: Vec2, radius: f32) -> bool;

    /// Whether an obstacle intersects the segment from `from` to `to`.
    fn line_of_sight_blocked(&self, from: Vec2, to: Vec2) -> bool;

    /// Layers of the terrain colliders overlapping the circle at `point`.
    fn overlapping_layers(&self, _point: Vec2, _radius: f32) -> SmallVec<[u8; 4]> {
        SmallVec::new()
    }
}

impl<O: CollisionOracle + ?Sized> CollisionOracle for &O {
    fn is_region_blocked(&self, point: Vec2, radius: f32) -> bool {
        (**self).is_region_blocked(point, radius)
    }
    fn line_of_sight_blocked(&self, from: Vec2, to: Vec2) -> bool {
        (**self).line_of_sight_blocked(from, to)
    }
    fn overlapping_layers(&self, point: Vec2, radius: f32) -> SmallVec<[u8; 4]> {
        (**self).overlapping_layers(point, radius)
    }
}

/// A world without obstacles or terrain.
#[derive(Clone, Copy, Debug, Default)]
pub struct OpenWorld;

impl CollisionOracle for OpenWorld {
    fn is_region_blocked(&self, _point: Vec2, _radius: f32) -> bool {
        false
    }
    fn line_of_sight_blocked(&self, _from: Vec2, _to: Vec2) -> bool {
        false
    }
}
