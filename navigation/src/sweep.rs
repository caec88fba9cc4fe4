//! Swept-footprint collision tests against the wall grid.

use openbound_core::{Vec2, WallGrid, GRID_SIZE};

fn corner_offsets(half_width: f32) -> [Vec2; 4] {
    [
        Vec2::new(-half_width, -half_width),
        Vec2::new(half_width, -half_width),
        Vec2::new(half_width, half_width),
        Vec2::new(-half_width, half_width),
    ]
}

/// Reports whether a square footprint can slide from `from` to `to` without
/// touching a wall cell.
///
/// The test is continuous: every cell crossed by the path of each footprint
/// corner is inspected, so no thin wall corner can be skipped between samples.
/// Cells outside the grid count as walls.
#[must_use]
pub fn edge_is_traversable(grid: &WallGrid, from: Vec2, to: Vec2, half_width: f32) -> bool {
    corner_offsets(half_width)
        .into_iter()
        .all(|offset| corner_path_is_clear(grid, from + offset, to + offset))
}

/// Reports whether a unit centred at `point` overlaps no wall cell.
#[must_use]
pub fn valid_unit_position(grid: &WallGrid, point: Vec2, half_width: f32) -> bool {
    edge_is_traversable(grid, point, point, half_width)
}

/// Stepped variant of [`edge_is_traversable`] that samples the footprint
/// corners every `step` units, skipping both endpoints.
///
/// Returns `false` when the edge is too short to hold a single interior sample.
#[must_use]
pub fn sampled_sweep_is_clear(
    grid: &WallGrid,
    from: Vec2,
    to: Vec2,
    half_width: f32,
    step: f32,
) -> bool {
    let delta = to - from;
    let length = delta.length();
    let steps = (length / step) as i64 - 1;
    if steps <= 0 {
        return false;
    }
    let advance = delta * (step / length);
    corner_offsets(half_width).into_iter().all(|offset| {
        (1..=steps).all(|i| !grid.is_point_in_wall(from + offset + advance * i as f32))
    })
}

/// Walks the closed cells touched by the segment `a..b`, column by column.
fn corner_path_is_clear(grid: &WallGrid, a: Vec2, b: Vec2) -> bool {
    let first_column = closed_first_index(a.x.min(b.x));
    let last_column = (a.x.max(b.x) / GRID_SIZE).floor() as i64;
    for column in first_column..=last_column {
        let left = column as f32 * GRID_SIZE;
        let Some((low, high)) = rows_within_column(a, b, left, left + GRID_SIZE) else {
            continue;
        };
        let first_row = closed_first_index(low);
        let last_row = (high / GRID_SIZE).floor() as i64;
        if (first_row..=last_row).any(|row| grid.is_wall_at(column, row)) {
            return false;
        }
    }
    true
}

/// Smallest cell index whose closed span still reaches `coordinate`.
fn closed_first_index(coordinate: f32) -> i64 {
    (coordinate / GRID_SIZE).ceil() as i64 - 1
}

/// Vertical extent of the part of `a..b` whose x lies in `[left, right]`.
fn rows_within_column(a: Vec2, b: Vec2, left: f32, right: f32) -> Option<(f32, f32)> {
    let dx = b.x - a.x;
    let (enter, exit) = if dx == 0.0 {
        if a.x < left || a.x > right {
            return None;
        }
        (0.0, 1.0)
    } else {
        let t_left = (left - a.x) / dx;
        let t_right = (right - a.x) / dx;
        let enter = t_left.min(t_right).max(0.0);
        let exit = t_left.max(t_right).min(1.0);
        if enter > exit {
            return None;
        }
        (enter, exit)
    };
    let dy = b.y - a.y;
    let y_enter = a.y + dy * enter;
    let y_exit = a.y + dy * exit;
    Some((y_enter.min(y_exit), y_enter.max(y_exit)))
}
