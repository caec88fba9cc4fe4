//! Visibility graph over the nodes of one region.

use std::collections::{HashMap, HashSet};

use openbound_core::{CellCoord, Vec2, WallGrid};

use crate::{
    regions::{CollisionSegment, CornerMask, Quadrant, RegionLayout},
    sweep::edge_is_traversable,
};

/// Counts of candidate pairs surviving each pruning stage.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct GraphFilterStats {
    /// Unordered node pairs considered.
    pub pairs: usize,
    /// Pairs passing the incoming-angle test.
    pub good_angles: usize,
    /// Pairs that additionally never depart into a wall corner.
    pub never_into_wall: usize,
    /// Pairs that additionally pass the swept-footprint test.
    pub traversable: usize,
    /// Pairs kept after dropping collinear redundancies.
    pub accepted: usize,
}

/// Navigation nodes of a region with their symmetric adjacency.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct RegionGraph {
    cells: Vec<CellCoord>,
    points: Vec<Vec2>,
    corner_masks: Vec<CornerMask>,
    adjacency: Vec<Vec<usize>>,
    collision_segments: Vec<CollisionSegment>,
}

impl RegionGraph {
    /// Builds the graph for one region's layout.
    #[must_use]
    pub fn build(layout: &RegionLayout, grid: &WallGrid, half_width: f32) -> (Self, GraphFilterStats) {
        let cells = layout.nodes.clone();
        let masks = layout.corner_masks.clone();
        let points: Vec<Vec2> = cells.iter().map(CellCoord::center).collect();
        let mut stats = GraphFilterStats::default();

        let mut candidates = Vec::new();
        for first in 0..cells.len() {
            for second in first + 1..cells.len() {
                stats.pairs += 1;
                let (a, b) = (cells[first], cells[second]);
                if !has_good_incoming_angles(a, b, masks[first], masks[second]) {
                    continue;
                }
                stats.good_angles += 1;
                if !never_turns_into_wall(a, b, masks[first], masks[second]) {
                    continue;
                }
                stats.never_into_wall += 1;
                if !edge_is_traversable(grid, points[first], points[second], half_width) {
                    continue;
                }
                stats.traversable += 1;
                candidates.push((first, second));
            }
        }

        let lookup: HashMap<CellCoord, usize> = cells
            .iter()
            .enumerate()
            .map(|(index, cell)| (*cell, index))
            .collect();
        let candidate_set: HashSet<(usize, usize)> = candidates.iter().copied().collect();
        let is_candidate = |x: usize, y: usize| candidate_set.contains(&(x.min(y), x.max(y)));

        let mut adjacency = vec![Vec::new(); cells.len()];
        for (first, second) in candidates {
            let redundant = lattice_points_between(cells[first], cells[second]).any(|cell| {
                lookup.get(&cell).is_some_and(|&middle| {
                    is_candidate(first, middle) && is_candidate(middle, second)
                })
            });
            if redundant {
                continue;
            }
            stats.accepted += 1;
            adjacency[first].push(second);
            adjacency[second].push(first);
        }

        let graph = Self {
            cells,
            points,
            corner_masks: masks,
            adjacency,
            collision_segments: layout.collision_segments.clone(),
        };
        (graph, stats)
    }

    /// Number of nodes.
    #[must_use]
    pub fn node_count(&self) -> usize {
        self.cells.len()
    }

    /// Number of undirected edges.
    #[must_use]
    pub fn edge_count(&self) -> usize {
        self.adjacency.iter().map(Vec::len).sum::<usize>() / 2
    }

    /// Cells hosting the nodes.
    #[must_use]
    pub fn cells(&self) -> &[CellCoord] {
        &self.cells
    }

    /// World-space node positions at the cell centres.
    #[must_use]
    pub fn points(&self) -> &[Vec2] {
        &self.points
    }

    /// Diagonal wall masks parallel to [`Self::points`].
    #[must_use]
    pub fn corner_masks(&self) -> &[CornerMask] {
        &self.corner_masks
    }

    /// Neighbours of a node.
    #[must_use]
    pub fn neighbours(&self, node: usize) -> &[usize] {
        self.adjacency.get(node).map_or(&[], Vec::as_slice)
    }

    /// Merged wall faces bordering the region.
    #[must_use]
    pub fn collision_segments(&self) -> &[CollisionSegment] {
        &self.collision_segments
    }

    /// Reports whether the segment `a..b` properly crosses any wall face.
    #[must_use]
    pub fn crosses_collision(&self, a: Vec2, b: Vec2) -> bool {
        self.collision_segments
            .iter()
            .any(|segment| segments_cross(a, b, segment.start, segment.end))
    }
}

/// Rejects edges whose extension past both endpoints runs straight into a
/// wall corner. Axis-aligned edges always pass.
fn has_good_incoming_angles(a: CellCoord, b: CellCoord, mask_a: CornerMask, mask_b: CornerMask) -> bool {
    let (dx, dy) = a.delta_to(b);
    let Some(towards_b) = Quadrant::of(dx, dy) else {
        return true;
    };
    let towards_a = Quadrant::of(-dx, -dy).unwrap_or(towards_b);
    !mask_b.blocks(towards_b) || !mask_a.blocks(towards_a)
}

/// Rejects edges that leave either endpoint through that endpoint's walled
/// diagonal quadrant.
fn never_turns_into_wall(a: CellCoord, b: CellCoord, mask_a: CornerMask, mask_b: CornerMask) -> bool {
    let (dx, dy) = a.delta_to(b);
    match (Quadrant::of(dx, dy), Quadrant::of(-dx, -dy)) {
        (Some(leaving_a), Some(leaving_b)) => !mask_a.blocks(leaving_a) && !mask_b.blocks(leaving_b),
        _ => true,
    }
}

/// Cells strictly between `a` and `b` that lie exactly on the connecting line.
fn lattice_points_between(a: CellCoord, b: CellCoord) -> impl Iterator<Item = CellCoord> {
    let (dx, dy) = a.delta_to(b);
    let steps = dx.abs().max(dy.abs());
    let (x0, y0) = (i64::from(a.column()), i64::from(a.row()));
    (1..steps).filter_map(move |i| {
        if (i * dx) % steps != 0 || (i * dy) % steps != 0 {
            return None;
        }
        let x = x0 + i * dx / steps;
        let y = y0 + i * dy / steps;
        Some(CellCoord::new(u32::try_from(x).ok()?, u32::try_from(y).ok()?))
    })
}

fn cross(o: Vec2, a: Vec2, b: Vec2) -> f32 {
    (a - o).perp_dot(b - o)
}

fn segments_cross(p1: Vec2, p2: Vec2, q1: Vec2, q2: Vec2) -> bool {
    let d1 = cross(q1, q2, p1);
    let d2 = cross(q1, q2, p2);
    let d3 = cross(p1, p2, q1);
    let d4 = cross(p1, p2, q2);
    d1 * d2 < 0.0 && d3 * d4 < 0.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::regions::compile_regions;

    const HALF_WIDTH: f32 = 7.99;

    fn mask(bits: u8) -> CornerMask {
        CornerMask::from_bits(bits)
    }

    #[test]
    fn axis_aligned_edges_pass_angle_tests() {
        let a = CellCoord::new(2, 2);
        let b = CellCoord::new(6, 2);
        let all = mask(0b1111);
        assert!(has_good_incoming_angles(a, b, all, all));
        assert!(never_turns_into_wall(a, b, all, all));
    }

    #[test]
    fn incoming_angle_needs_one_clear_end() {
        let a = CellCoord::new(2, 2);
        let b = CellCoord::new(5, 4);
        // Heading south-east into b and north-west into a.
        let se = mask(CornerMask::SOUTH_EAST);
        let nw = mask(CornerMask::NORTH_WEST);
        assert!(!has_good_incoming_angles(a, b, nw, se));
        assert!(has_good_incoming_angles(a, b, mask(0), se));
        assert!(has_good_incoming_angles(a, b, nw, mask(0)));
    }

    #[test]
    fn departing_into_own_wall_corner_is_rejected() {
        let a = CellCoord::new(2, 2);
        let b = CellCoord::new(5, 4);
        assert!(!never_turns_into_wall(a, b, mask(CornerMask::SOUTH_EAST), mask(0)));
        assert!(!never_turns_into_wall(a, b, mask(0), mask(CornerMask::NORTH_WEST)));
        assert!(never_turns_into_wall(
            a,
            b,
            mask(CornerMask::NORTH_WEST),
            mask(CornerMask::SOUTH_EAST)
        ));
    }

    #[test]
    fn lattice_points_follow_exact_line() {
        let points: Vec<CellCoord> =
            lattice_points_between(CellCoord::new(1, 1), CellCoord::new(7, 4)).collect();
        assert_eq!(points, vec![CellCoord::new(3, 2), CellCoord::new(5, 3)]);
        assert_eq!(
            lattice_points_between(CellCoord::new(1, 1), CellCoord::new(4, 2)).count(),
            0
        );
    }

    #[test]
    fn pillar_graph_is_a_symmetric_ring() {
        let grid = WallGrid::from_ascii(
            "
            #######
            #.....#
            #.....#
            #..#..#
            #.....#
            #.....#
            #######
            ",
        );
        let compilation = compile_regions(&grid);
        let (graph, stats) = RegionGraph::build(&compilation.layouts[0], &grid, HALF_WIDTH);
        assert_eq!(graph.node_count(), 4);
        assert_eq!(stats.pairs, 6);
        for node in 0..graph.node_count() {
            for &other in graph.neighbours(node) {
                assert!(graph.neighbours(other).contains(&node));
            }
        }
        // Opposite corners look at each other through the pillar.
        assert_eq!(graph.edge_count(), 4);
        assert_eq!(stats.accepted, 4);
    }

    #[test]
    fn collinear_chain_drops_the_long_edge() {
        let grid = WallGrid::from_ascii(
            "
            ###########
            #.........#
            #.#..#..#.#
            #.........#
            ###########
            ",
        );
        let compilation = compile_regions(&grid);
        let (graph, stats) = RegionGraph::build(&compilation.layouts[0], &grid, HALF_WIDTH);
        assert!(stats.traversable > stats.accepted);
        let index_of = |cell: CellCoord| {
            graph
                .cells()
                .iter()
                .position(|candidate| *candidate == cell)
                .expect("node present")
        };
        let left = index_of(CellCoord::new(1, 1));
        let middle = index_of(CellCoord::new(3, 1));
        let right = index_of(CellCoord::new(4, 1));
        assert!(graph.neighbours(left).contains(&middle));
        assert!(graph.neighbours(middle).contains(&right));
        assert!(!graph.neighbours(left).contains(&right));
    }

    #[test]
    fn crossing_detection_ignores_touching_segments() {
        let grid = WallGrid::from_ascii(
            "
            #####
            #...#
            #####
            ",
        );
        let compilation = compile_regions(&grid);
        let (graph, _) = RegionGraph::build(&compilation.layouts[0], &grid, HALF_WIDTH);
        assert!(graph.crosses_collision(Vec2::new(24.0, 24.0), Vec2::new(24.0, 0.0)));
        assert!(!graph.crosses_collision(Vec2::new(24.0, 24.0), Vec2::new(56.0, 24.0)));
    }
}
