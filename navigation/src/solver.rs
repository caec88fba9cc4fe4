//! Point-to-point path queries over a compiled mesh.

use std::{
    cmp::Ordering,
    collections::{BinaryHeap, VecDeque},
};

use openbound_core::{CellCoord, Vec2};
use thiserror::Error;
use tracing::{trace, warn};

use crate::{
    graph::RegionGraph,
    mesh::NavigationMesh,
    regions::RegionId,
    sweep::{edge_is_traversable, valid_unit_position},
};

/// Failures reported by [`NavigationMesh::pathfind`].
#[derive(Clone, Debug, Error, PartialEq)]
pub enum PathfindError {
    /// No path joins the start to any reachable goal.
    #[error("no path reaches the goal")]
    Unreachable,
    /// Start or goal could not be linked to the region graph.
    ///
    /// Indicates an inconsistent mesh rather than an unreachable target.
    #[error("graph endpoints are disconnected (start {start}, goal {goal})")]
    DisconnectedGraph {
        /// Start position of the failed query.
        start: Vec2,
        /// Goal position of the failed query.
        goal: Vec2,
    },
}

impl PathfindError {
    /// Whether the error signals a broken mesh instead of an unreachable goal.
    #[must_use]
    pub const fn is_fatal(&self) -> bool {
        matches!(self, Self::DisconnectedGraph { .. })
    }
}

/// Waypoints of a planned path stored goal first, start last.
#[derive(Clone, Debug, PartialEq)]
pub struct Path {
    points: Vec<Vec2>,
}

impl Path {
    /// Wraps waypoints ordered from goal to start.
    #[must_use]
    pub fn from_goal_first(points: Vec<Vec2>) -> Self {
        Self { points }
    }

    /// Waypoints ordered from goal to start.
    #[must_use]
    pub fn points(&self) -> &[Vec2] {
        &self.points
    }

    /// Final destination of the path.
    #[must_use]
    pub fn destination(&self) -> Option<Vec2> {
        self.points.first().copied()
    }

    /// Starting position of the path.
    #[must_use]
    pub fn origin(&self) -> Option<Vec2> {
        self.points.last().copied()
    }

    /// Waypoints after the start, in the order the unit visits them.
    pub fn travel_order(&self) -> impl Iterator<Item = Vec2> + '_ {
        let legs = self.points.len().saturating_sub(1);
        self.points[..legs].iter().rev().copied()
    }

    /// Total length of the polyline.
    #[must_use]
    pub fn length(&self) -> f32 {
        self.points
            .windows(2)
            .map(|pair| pair[0].distance(pair[1]))
            .sum()
    }
}

pub(crate) fn pathfind(mesh: &NavigationMesh, start: Vec2, goal: Vec2) -> Result<Path, PathfindError> {
    let grid = mesh.grid();
    let half_width = mesh.half_width();
    let (Some(start_cell), Some(clicked_cell)) = (grid.cell_containing(start), grid.clamped_cell(goal))
    else {
        return Err(PathfindError::Unreachable);
    };
    let Some(start_region) = mesh.region_map().region(start_cell) else {
        warn!(?start, "unit stands outside every region");
        return Err(PathfindError::Unreachable);
    };
    if !valid_unit_position(grid, start, half_width) {
        warn!(?start, "unit footprint overlaps a wall");
        return Err(PathfindError::Unreachable);
    }

    let goal = if mesh.region_map().region(clicked_cell) == Some(start_region)
        && valid_unit_position(grid, goal, half_width)
    {
        goal
    } else {
        let fallback = nearest_cell_in_region(mesh, clicked_cell, start_cell, start_region)
            .ok_or(PathfindError::Unreachable)?;
        let adjusted = nudge_towards(mesh, fallback.center(), goal);
        trace!(?goal, ?adjusted, "goal moved into the unit's region");
        adjusted
    };

    if edge_is_traversable(grid, start, goal, half_width) {
        return Ok(Path::from_goal_first(vec![goal, start]));
    }

    let graph = mesh
        .region(start_region)
        .ok_or(PathfindError::DisconnectedGraph { start, goal })?;
    search(mesh, graph, start, goal)
}

/// Finds the cell of `region` closest to the click.
///
/// A straight walk from the click back towards the unit is tried first; a
/// breadth-first flood over the whole grid picks the nearest candidate
/// otherwise.
fn nearest_cell_in_region(
    mesh: &NavigationMesh,
    clicked: CellCoord,
    unit: CellCoord,
    region: RegionId,
) -> Option<CellCoord> {
    let regions = mesh.region_map();
    let (cx, cy) = (i64::from(clicked.column()), i64::from(clicked.row()));
    let (dx, dy) = clicked.delta_to(unit);
    let steps = dx.abs() + dy.abs();
    for i in 0..steps {
        let x = cx + i * dx / steps;
        let y = cy + i * dy / steps;
        if regions.region_at(x, y) == Some(region) {
            return Some(CellCoord::new(x as u32, y as u32));
        }
    }

    let columns = regions.columns() as usize;
    let mut visited = vec![false; columns * regions.rows() as usize];
    let index = |cell: CellCoord| cell.row() as usize * columns + cell.column() as usize;
    let mut queue = VecDeque::from([clicked]);
    visited[index(clicked)] = true;

    while let Some(cell) = queue.pop_front() {
        if regions.region(cell) == Some(region) {
            let target = clicked.center();
            return std::iter::once(cell)
                .chain(queue.iter().copied().filter(|c| regions.region(*c) == Some(region)))
                .min_by(|a, b| {
                    a.center()
                        .distance(target)
                        .total_cmp(&b.center().distance(target))
                        .then_with(|| (a.column(), a.row()).cmp(&(b.column(), b.row())))
                });
        }
        let (x, y) = (i64::from(cell.column()), i64::from(cell.row()));
        for (nx, ny) in [(x - 1, y), (x + 1, y), (x, y - 1), (x, y + 1)] {
            if nx < 0 || ny < 0 || nx >= i64::from(regions.columns()) || ny >= i64::from(regions.rows())
            {
                continue;
            }
            let neighbour = CellCoord::new(nx as u32, ny as u32);
            if !visited[index(neighbour)] {
                visited[index(neighbour)] = true;
                queue.push_back(neighbour);
            }
        }
    }
    None
}

/// Slides a valid point one unit at a time towards `target`, first along x
/// then along y, stopping on each axis before the footprint hits a wall.
fn nudge_towards(mesh: &NavigationMesh, mut point: Vec2, target: Vec2) -> Vec2 {
    let grid = mesh.grid();
    let half_width = mesh.half_width();
    let limit = (grid.width() + grid.height()) as usize + 1;

    for axis in [Vec2::X, Vec2::Y] {
        for _ in 0..limit {
            let remaining = (target - point).dot(axis);
            if remaining.abs() < 1.0 {
                break;
            }
            let next = point + axis * remaining.signum();
            if !valid_unit_position(grid, next, half_width) {
                break;
            }
            point = next;
        }
    }
    point
}

#[derive(Clone, Copy, Debug)]
struct Frontier {
    estimate: f32,
    cost: f32,
    node: usize,
}

impl PartialEq for Frontier {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Frontier {}

impl PartialOrd for Frontier {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Frontier {
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .estimate
            .total_cmp(&self.estimate)
            .then_with(|| other.cost.total_cmp(&self.cost))
            .then_with(|| other.node.cmp(&self.node))
    }
}

/// A* over the region graph temporarily extended by the start and goal.
fn search(
    mesh: &NavigationMesh,
    graph: &RegionGraph,
    start: Vec2,
    goal: Vec2,
) -> Result<Path, PathfindError> {
    let grid = mesh.grid();
    let half_width = mesh.half_width();
    let points = graph.points();
    let start_node = points.len();
    let goal_node = points.len() + 1;

    let start_links: Vec<usize> = (0..points.len())
        .filter(|&node| edge_is_traversable(grid, start, points[node], half_width))
        .collect();
    let goal_linked: Vec<bool> = points
        .iter()
        .map(|&point| edge_is_traversable(grid, point, goal, half_width))
        .collect();
    if start_links.is_empty() || !goal_linked.contains(&true) {
        return Err(PathfindError::DisconnectedGraph { start, goal });
    }

    let position = |node: usize| match node {
        n if n == start_node => start,
        n if n == goal_node => goal,
        n => points[n],
    };
    let neighbours = |node: usize| -> Vec<usize> {
        if node == start_node {
            return start_links.clone();
        }
        if node == goal_node {
            return (0..points.len()).filter(|&n| goal_linked[n]).collect();
        }
        let mut linked = graph.neighbours(node).to_vec();
        if goal_linked[node] {
            linked.push(goal_node);
        }
        if start_links.contains(&node) {
            linked.push(start_node);
        }
        linked
    };

    let total = points.len() + 2;
    let mut visited = vec![false; total];
    let mut queued_cost: Vec<Option<f32>> = vec![None; total];
    let mut came_from: Vec<Option<usize>> = vec![None; total];
    let mut open = BinaryHeap::new();
    open.push(Frontier {
        estimate: start.distance(goal),
        cost: 0.0,
        node: start_node,
    });
    queued_cost[start_node] = Some(0.0);

    while let Some(Frontier { cost, node, .. }) = open.pop() {
        if visited[node] {
            continue;
        }
        visited[node] = true;
        if node == goal_node {
            return Ok(reconstruct(&came_from, goal_node, total, position));
        }
        for next in neighbours(node) {
            if visited[next] {
                continue;
            }
            let next_cost = cost + position(node).distance(position(next));
            if queued_cost[next].is_some_and(|queued| queued <= next_cost) {
                continue;
            }
            queued_cost[next] = Some(next_cost);
            came_from[next] = Some(node);
            open.push(Frontier {
                estimate: next_cost + position(next).distance(goal),
                cost: next_cost,
                node: next,
            });
        }
    }

    Err(PathfindError::Unreachable)
}

fn reconstruct(
    came_from: &[Option<usize>],
    goal_node: usize,
    total: usize,
    position: impl Fn(usize) -> Vec2,
) -> Path {
    let mut points = vec![position(goal_node)];
    let mut current = goal_node;
    while let Some(previous) = came_from[current] {
        points.push(position(previous));
        current = previous;
        if points.len() > total {
            break;
        }
    }
    Path::from_goal_first(points)
}
