//! Precomputed navigation meshes for every reachable wall state.

use std::collections::BTreeMap;

use openbound_core::{
    cell_index_of, CellState, MapDefinition, ObstacleDefinition, WallConfiguration, WallGrid,
    WallStateKey,
};
use openbound_navigation::NavigationMesh;
use tracing::debug;

/// Lookup table from wall-state key to its compiled mesh.
///
/// Every combination of obstacle configurations is compiled up front, so
/// switching walls during play is a key swap.
#[derive(Clone, Debug)]
pub struct WallStates {
    configurations: Vec<Vec<WallConfiguration>>,
    meshes: BTreeMap<WallStateKey, NavigationMesh>,
}

impl WallStates {
    /// Compiles a mesh for every key in the Cartesian product of the obstacles'
    /// wall configurations.
    #[must_use]
    pub fn compile(map: &MapDefinition, half_width: f32) -> Self {
        let configurations: Vec<Vec<WallConfiguration>> = map
            .obstacles
            .iter()
            .map(ObstacleDefinition::wall_configurations)
            .collect();
        let counts: Vec<u32> = configurations
            .iter()
            .map(|options| u32::try_from(options.len()).unwrap_or(u32::MAX))
            .collect();

        let mut meshes = BTreeMap::new();
        for key in enumerate_keys(&counts) {
            let mut grid = map.grid.clone();
            for ((obstacle, options), &index) in map
                .obstacles
                .iter()
                .zip(&configurations)
                .zip(key.components())
            {
                if let Some(configuration) = options.get(index as usize) {
                    stamp(&mut grid, obstacle, configuration);
                }
            }
            debug!(key = ?key.components(), walls = grid.wall_count(), "compiling wall state");
            let _ = meshes.insert(key, NavigationMesh::compile(grid, half_width));
        }

        Self {
            configurations,
            meshes,
        }
    }

    /// Mesh compiled for `key`.
    #[must_use]
    pub fn mesh(&self, key: &WallStateKey) -> Option<&NavigationMesh> {
        self.meshes.get(key)
    }

    /// Number of compiled wall states.
    #[must_use]
    pub fn len(&self) -> usize {
        self.meshes.len()
    }

    /// Whether no wall state was compiled.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.meshes.is_empty()
    }

    /// Compiled keys with their meshes in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&WallStateKey, &NavigationMesh)> + '_ {
        self.meshes.iter()
    }

    /// Number of obstacles contributing to the key.
    #[must_use]
    pub fn obstacle_count(&self) -> usize {
        self.configurations.len()
    }

    /// Wall configurations of one obstacle.
    #[must_use]
    pub fn configurations(&self, obstacle: usize) -> Option<&[WallConfiguration]> {
        self.configurations.get(obstacle).map(Vec::as_slice)
    }
}

/// Keys in lexicographic order, last obstacle varying fastest.
fn enumerate_keys(counts: &[u32]) -> Vec<WallStateKey> {
    if counts.contains(&0) {
        return Vec::new();
    }
    let mut keys = Vec::new();
    let mut digits = vec![0_u32; counts.len()];
    loop {
        keys.push(WallStateKey::new(digits.clone()));
        let mut position = digits.len();
        loop {
            if position == 0 {
                return keys;
            }
            position -= 1;
            digits[position] += 1;
            if digits[position] < counts[position] {
                break;
            }
            digits[position] = 0;
        }
    }
}

/// Marks the flagged locations of a configuration as wall cells.
fn stamp(grid: &mut WallGrid, obstacle: &ObstacleDefinition, configuration: &WallConfiguration) {
    for (location, walled) in obstacle.locations.iter().zip(configuration.flags()) {
        if *walled {
            grid.fill(
                cell_index_of(location.area.min()),
                cell_index_of(location.area.max()),
                CellState::Wall,
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keys_cover_the_cartesian_product() {
        let keys = enumerate_keys(&[2, 1, 3]);
        assert_eq!(keys.len(), 6);
        assert_eq!(keys[0].components(), &[0, 0, 0]);
        assert_eq!(keys[1].components(), &[0, 0, 1]);
        assert_eq!(keys[5].components(), &[1, 0, 2]);
    }

    #[test]
    fn no_obstacles_yield_a_single_empty_key() {
        let keys = enumerate_keys(&[]);
        assert_eq!(keys, vec![WallStateKey::initial(0)]);
    }
}
