use std::collections::VecDeque;

use openbound_core::{CellCoord, CellState, WallGrid};
use openbound_navigation::{
    compile_regions, edge_is_traversable, sampled_sweep_is_clear, valid_unit_position,
    NavigationMesh,
};
use rand::{seq::SliceRandom, Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

const HALF_WIDTH: f32 = 7.99;
const SEEDS: [u64; 4] = [0x5eed_0001, 0x5eed_0002, 0x0b0b_cafe, 0x1234_5678];

fn block_map(seed: u64) -> WallGrid {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let (columns, rows) = (28_i64, 20_i64);
    let mut grid = WallGrid::new(columns as u32, rows as u32);
    for _ in 0..14 {
        let width = rng.gen_range(1..=4);
        let height = rng.gen_range(1..=4);
        let x = rng.gen_range(1..columns - width);
        let y = rng.gen_range(1..rows - height);
        grid.fill((x, y), (x + width, y + height), CellState::Wall);
    }
    grid.sanitize_border();
    grid
}

fn open_cells(grid: &WallGrid) -> Vec<CellCoord> {
    grid.cells()
        .filter(|(_, state)| *state == CellState::Open)
        .map(|(cell, _)| cell)
        .collect()
}

fn component_count(grid: &WallGrid) -> u32 {
    let mut seen = vec![false; (grid.columns() * grid.rows()) as usize];
    let index = |cell: CellCoord| (cell.row() * grid.columns() + cell.column()) as usize;
    let mut components = 0;
    for cell in open_cells(grid) {
        if seen[index(cell)] {
            continue;
        }
        components += 1;
        seen[index(cell)] = true;
        let mut queue = VecDeque::from([cell]);
        while let Some(current) = queue.pop_front() {
            let (x, y) = (i64::from(current.column()), i64::from(current.row()));
            for (nx, ny) in [(x - 1, y), (x + 1, y), (x, y - 1), (x, y + 1)] {
                if grid.is_wall_at(nx, ny) {
                    continue;
                }
                let next = CellCoord::new(nx as u32, ny as u32);
                if !seen[index(next)] {
                    seen[index(next)] = true;
                    queue.push_back(next);
                }
            }
        }
    }
    components
}

#[test]
fn regions_partition_open_cells_into_components() {
    for seed in SEEDS {
        let grid = block_map(seed);
        let compilation = compile_regions(&grid);
        let regions = &compilation.region_map;
        assert_eq!(regions.region_count(), component_count(&grid), "seed {seed:#x}");
        for cell in open_cells(&grid) {
            let region = regions.region(cell);
            assert!(region.is_some(), "open cell {cell:?} unlabelled");
            let (x, y) = (i64::from(cell.column()), i64::from(cell.row()));
            for (nx, ny) in [(x + 1, y), (x, y + 1)] {
                if !grid.is_wall_at(nx, ny) {
                    assert_eq!(regions.region_at(nx, ny), region);
                }
            }
        }
        for (cell, state) in grid.cells() {
            if state == CellState::Wall {
                assert_eq!(regions.region(cell), None);
            }
        }
    }
}

#[test]
fn graph_edges_are_symmetric_and_traversable() {
    for seed in SEEDS {
        let mesh = NavigationMesh::compile(block_map(seed), HALF_WIDTH);
        for graph in mesh.regions() {
            for node in 0..graph.node_count() {
                for &other in graph.neighbours(node) {
                    assert_ne!(node, other);
                    assert!(graph.neighbours(other).contains(&node));
                    let (a, b) = (graph.points()[node], graph.points()[other]);
                    assert!(edge_is_traversable(mesh.grid(), a, b, HALF_WIDTH));
                    assert!(sampled_sweep_is_clear(
                        mesh.grid(),
                        a,
                        b,
                        HALF_WIDTH - 1.0e-3,
                        0.25
                    ));
                }
            }
        }
    }
}

#[test]
fn same_region_queries_produce_collision_free_paths() {
    for seed in SEEDS {
        let mesh = NavigationMesh::compile(block_map(seed), HALF_WIDTH);
        let mut rng = ChaCha8Rng::seed_from_u64(seed ^ 0xfeed);
        let cells = open_cells(mesh.grid());

        for _ in 0..40 {
            let start_cell = *cells.choose(&mut rng).expect("open cells exist");
            let region = mesh.region_map().region(start_cell);
            let peers: Vec<CellCoord> = cells
                .iter()
                .copied()
                .filter(|cell| mesh.region_map().region(*cell) == region)
                .collect();
            let goal_cell = *peers.choose(&mut rng).expect("start is its own peer");
            let (start, goal) = (start_cell.center(), goal_cell.center());

            let path = mesh
                .pathfind(start, goal)
                .unwrap_or_else(|error| panic!("seed {seed:#x} {start} -> {goal}: {error}"));
            assert_eq!(path.destination(), Some(goal));
            assert_eq!(path.origin(), Some(start));

            for pair in path.points().windows(2) {
                let (to, from) = (pair[0], pair[1]);
                assert!(edge_is_traversable(mesh.grid(), from, to, HALF_WIDTH));
                if from.distance(to) < 1.0 {
                    assert!(valid_unit_position(mesh.grid(), from, HALF_WIDTH));
                } else {
                    assert!(sampled_sweep_is_clear(
                        mesh.grid(),
                        from,
                        to,
                        HALF_WIDTH - 1.0e-3,
                        0.25
                    ));
                }
            }

            let again = mesh.pathfind(start, goal).expect("deterministic");
            assert_eq!(again, path);
        }
    }
}
