//! Compiled navigation data for a single wall grid.

use openbound_core::{Vec2, WallGrid};
use tracing::debug;

use crate::{
    graph::{GraphFilterStats, RegionGraph},
    regions::{compile_regions, RegionId, RegionMap},
    solver::{self, Path, PathfindError},
};

/// Summary counts describing a compiled mesh.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct MeshStats {
    /// Number of regions.
    pub regions: usize,
    /// Number of nodes across all regions.
    pub nodes: usize,
    /// Number of undirected edges across all regions.
    pub edges: usize,
    /// Number of merged wall faces across all regions.
    pub collision_segments: usize,
}

/// Region labels and visibility graphs precomputed for one wall grid.
///
/// Meshes are immutable once compiled; a changed grid gets a fresh mesh.
#[derive(Clone, Debug, PartialEq)]
pub struct NavigationMesh {
    grid: WallGrid,
    region_map: RegionMap,
    regions: Vec<RegionGraph>,
    half_width: f32,
}

impl NavigationMesh {
    /// Compiles regions and visibility graphs for a unit of the given half width.
    #[must_use]
    pub fn compile(grid: WallGrid, half_width: f32) -> Self {
        let compilation = compile_regions(&grid);
        let mut filter_totals = GraphFilterStats::default();
        let regions = compilation
            .layouts
            .iter()
            .map(|layout| {
                let (graph, stats) = RegionGraph::build(layout, &grid, half_width);
                filter_totals.pairs += stats.pairs;
                filter_totals.good_angles += stats.good_angles;
                filter_totals.never_into_wall += stats.never_into_wall;
                filter_totals.traversable += stats.traversable;
                filter_totals.accepted += stats.accepted;
                graph
            })
            .collect();
        let mesh = Self {
            grid,
            region_map: compilation.region_map,
            regions,
            half_width,
        };
        debug!(stats = ?mesh.stats(), filters = ?filter_totals, "compiled navigation mesh");
        mesh
    }

    /// Wall grid the mesh was compiled from.
    #[must_use]
    pub fn grid(&self) -> &WallGrid {
        &self.grid
    }

    /// Region label of every cell.
    #[must_use]
    pub fn region_map(&self) -> &RegionMap {
        &self.region_map
    }

    /// Visibility graphs indexed by [`RegionId::index`].
    #[must_use]
    pub fn regions(&self) -> &[RegionGraph] {
        &self.regions
    }

    /// Visibility graph of one region.
    #[must_use]
    pub fn region(&self, id: RegionId) -> Option<&RegionGraph> {
        self.regions.get(id.index())
    }

    /// Region containing a world-space point.
    #[must_use]
    pub fn region_at(&self, point: Vec2) -> Option<RegionId> {
        let cell = self.grid.cell_containing(point)?;
        self.region_map.region(cell)
    }

    /// Half width of the footprint the mesh was compiled for.
    #[must_use]
    pub const fn half_width(&self) -> f32 {
        self.half_width
    }

    /// Summary counts.
    #[must_use]
    pub fn stats(&self) -> MeshStats {
        MeshStats {
            regions: self.regions.len(),
            nodes: self.regions.iter().map(RegionGraph::node_count).sum(),
            edges: self.regions.iter().map(RegionGraph::edge_count).sum(),
            collision_segments: self
                .regions
                .iter()
                .map(|region| region.collision_segments().len())
                .sum(),
        }
    }

    /// Plans a path from `start` to the closest reachable point to `goal`.
    ///
    /// Goals in another region, outside the grid, or overlapping walls are
    /// moved to the nearest valid point in the unit's region.
    ///
    /// # Errors
    ///
    /// Returns [`PathfindError::Unreachable`] when no path exists and
    /// [`PathfindError::DisconnectedGraph`] when the mesh cannot link the
    /// endpoints at all.
    pub fn pathfind(&self, start: Vec2, goal: Vec2) -> Result<Path, PathfindError> {
        solver::pathfind(self, start, goal)
    }
}
