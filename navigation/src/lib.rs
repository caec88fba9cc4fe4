#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Region compilation, visibility graphs and path queries for OpenBound.
//!
//! A [`NavigationMesh`] is compiled once per wall grid. Compilation labels the
//! 4-connected open regions, places nodes on the convex corners of each region,
//! merges the wall faces bordering it, and links nodes whose straight
//! connection a unit footprint can slide along. Queries then run A* over the
//! region graph extended by the start and goal points.

mod graph;
mod mesh;
mod regions;
mod solver;
mod sweep;

pub use graph::{GraphFilterStats, RegionGraph};
pub use mesh::{MeshStats, NavigationMesh};
pub use regions::{
    compile_regions, CollisionSegment, CornerMask, Quadrant, RegionCompilation, RegionId,
    RegionLayout, RegionMap, WallSide,
};
pub use solver::{Path, PathfindError};
pub use sweep::{edge_is_traversable, sampled_sweep_is_clear, valid_unit_position};
