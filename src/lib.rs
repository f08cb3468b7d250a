//! # navgrid
//!
//! A grid-based pathfinding system for world-space navigation. The world is
//! discretized into square cells whose walkability is read from a layout
//! string, with movement penalties taken from terrain layers reported by a
//! [CollisionOracle]. Pre-computes
//! [connected components](https://en.wikipedia.org/wiki/Component_(graph_theory))
//! so that queries between disconnected regions fail fast, searches with
//! [A*](https://en.wikipedia.org/wiki/A*_search_algorithm) over an indexed
//! binary heap, and post-processes the result into a sparse list of world
//! waypoints.
//!
//! ```
//! use glam::Vec2;
//! use navgrid::{Config, OpenWorld, Pathfinder};
//!
//! let mut config = Config::default();
//! config.grid.world_size = Vec2::new(3.0, 3.0);
//! config.grid.cell_radius = 0.5;
//! let pathfinder = Pathfinder::build("000010000", &config, OpenWorld).unwrap();
//! let path = pathfinder
//!     .find_path(Vec2::new(-1.0, -1.0), Vec2::new(1.0, 1.0), &pathfinder.default_request())
//!     .unwrap();
//! assert_eq!(path.last(), Some(&Vec2::new(1.0, 1.0)));
//! ```
pub mod astar;
pub mod cell;
pub mod config;
pub mod error;
pub mod grid;
pub mod heap;
pub mod heuristic;
pub mod oracle;
pub mod pathfinder;
pub mod smoothing;
pub mod terrain;

/// Cost of a straight step between neighbouring cells.
pub const C: i32 = 10;
/// Cost of a diagonal step, roughly `C * sqrt(2)`.
pub const D: i32 = 14;

pub use crate::astar::{AstarSearch, CancelToken};
pub use crate::cell::{Cell, CellId, RegionId};
pub use crate::config::{Config, Connectivity, GridConfig, SearchConfig};
pub use crate::error::{NavError, NavResult};
pub use crate::grid::Grid;
pub use crate::heuristic::Heuristic;
pub use crate::oracle::{CollisionOracle, LayerMask, OpenWorld};
pub use crate::pathfinder::{PathRequest, Pathfinder};
pub use crate::smoothing::Smoothing;
pub use crate::terrain::TerrainType;
