use fxhash::FxHashMap;
use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::oracle::{CollisionOracle, LayerMask};

/// A terrain category and the extra cost of moving across it.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TerrainType {
    pub mask: LayerMask,
    pub penalty: i32,
}

/// Resolves the movement penalty of a world point from the terrain layers
/// overlapping it.
#[derive(Clone, Debug, Default)]
pub struct TerrainClassifier {
    mask: LayerMask,
    penalties: FxHashMap<u8, i32>,
}

impl TerrainClassifier {
    /// Later entries for the same layer replace earlier ones. Each type is
    /// keyed by the lowest layer of its mask.
    pub fn new(terrain: &[TerrainType]) -> TerrainClassifier {
        let mut classifier = TerrainClassifier::default();
        for terrain_type in terrain {
            classifier.mask |= terrain_type.mask;
            if let Some(layer) = terrain_type.mask.lowest_layer() {
                classifier.penalties.insert(layer, terrain_type.penalty);
            }
        }
        classifier
    }

    pub fn mask(&self) -> LayerMask {
        self.mask
    }

    /// Highest penalty among the overlapping terrain layers, or 0.
    pub fn penalty<O: CollisionOracle>(&self, oracle: &O, point: Vec2, radius: f32) -> i32 {
        if self.penalties.is_empty() {
            return 0;
        }
        oracle
            .overlapping_layers(point, radius)
            .into_iter()
            .filter(|&layer| self.mask.contains(layer))
            .filter_map(|layer| self.penalties.get(&layer).copied())
            .fold(0, i32::max)
    }
}
