use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::{GRID_SIZE, SMALL_NUMBER};

/// Axis-aligned rectangle expressed in world units.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Aabb {
    min: Vec2,
    max: Vec2,
}

impl Aabb {
    /// Builds a rectangle spanning two arbitrary corners.
    #[must_use]
    pub fn from_corners(a: Vec2, b: Vec2) -> Self {
        Self {
            min: a.min(b),
            max: a.max(b),
        }
    }

    /// Builds a square centred on `center` that extends `half_width` in every direction.
    #[must_use]
    pub fn centered(center: Vec2, half_width: f32) -> Self {
        let extent = Vec2::splat(half_width);
        Self {
            min: center - extent,
            max: center + extent,
        }
    }

    /// Top-left corner of the rectangle.
    #[must_use]
    pub const fn min(&self) -> Vec2 {
        self.min
    }

    /// Bottom-right corner of the rectangle.
    #[must_use]
    pub const fn max(&self) -> Vec2 {
        self.max
    }

    /// Midpoint of the rectangle.
    #[must_use]
    pub fn center(&self) -> Vec2 {
        (self.min + self.max) * 0.5
    }

    /// Grows the rectangle by `amount` on every side.
    #[must_use]
    pub fn expanded(&self, amount: f32) -> Self {
        let extent = Vec2::splat(amount);
        Self {
            min: self.min - extent,
            max: self.max + extent,
        }
    }

    /// Reports whether the point lies inside the rectangle, edges included.
    #[must_use]
    pub fn contains(&self, point: Vec2) -> bool {
        self.min.x <= point.x
            && point.x <= self.max.x
            && self.min.y <= point.y
            && point.y <= self.max.y
    }

    /// Reports whether the point lies strictly inside the rectangle.
    #[must_use]
    pub fn contains_exclusive(&self, point: Vec2) -> bool {
        self.min.x < point.x && point.x < self.max.x && self.min.y < point.y && point.y < self.max.y
    }

    /// Reports whether two rectangles share interior area. Touching edges do not overlap.
    #[must_use]
    pub fn overlaps(&self, other: &Aabb) -> bool {
        self.min.x < other.max.x
            && other.min.x < self.max.x
            && self.min.y < other.max.y
            && other.min.y < self.max.y
    }
}

/// Location of a single grid cell expressed as column and row coordinates.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CellCoord {
    column: u32,
    row: u32,
}

impl CellCoord {
    /// Creates a new grid cell coordinate.
    #[must_use]
    pub const fn new(column: u32, row: u32) -> Self {
        Self { column, row }
    }

    /// Zero-based column index of the cell.
    #[must_use]
    pub const fn column(&self) -> u32 {
        self.column
    }

    /// Zero-based row index of the cell.
    #[must_use]
    pub const fn row(&self) -> u32 {
        self.row
    }

    /// World-space centre of the cell.
    #[must_use]
    pub fn center(&self) -> Vec2 {
        Vec2::new(
            self.column as f32 * GRID_SIZE + GRID_SIZE * 0.5,
            self.row as f32 * GRID_SIZE + GRID_SIZE * 0.5,
        )
    }

    /// World-space rectangle covered by the cell.
    #[must_use]
    pub fn bounds(&self) -> Aabb {
        let min = Vec2::new(self.column as f32, self.row as f32) * GRID_SIZE;
        Aabb::from_corners(min, min + Vec2::splat(GRID_SIZE))
    }

    /// Signed column and row offsets that lead from `self` to `other`.
    #[must_use]
    pub fn delta_to(&self, other: CellCoord) -> (i64, i64) {
        (
            i64::from(other.column) - i64::from(self.column),
            i64::from(other.row) - i64::from(self.row),
        )
    }
}

/// Signed cell indices containing a world-space point. May fall outside any grid.
#[must_use]
pub fn cell_index_of(point: Vec2) -> (i64, i64) {
    (
        (point.x / GRID_SIZE).floor() as i64,
        (point.y / GRID_SIZE).floor() as i64,
    )
}

/// Wraps an angle in degrees into `[0, 360)`, snapping near-zero values to zero.
#[must_use]
pub fn angle_clamp(angle: f32) -> f32 {
    if angle.abs() < SMALL_NUMBER {
        return 0.0;
    }
    let wrapped = angle.rem_euclid(360.0);
    if wrapped >= 360.0 - SMALL_NUMBER {
        0.0
    } else {
        wrapped
    }
}

/// Smallest circular separation between two angles in degrees.
#[must_use]
pub fn angular_distance(a: f32, b: f32) -> f32 {
    let delta = a - b;
    delta.abs().min((delta + 360.0).abs()).min((delta - 360.0).abs())
}

/// Facing angle in degrees from `from` towards `to`.
///
/// Screen space grows downwards, so the raw `atan2` bearing is negated to keep
/// counter-clockwise rotations positive.
#[must_use]
pub fn bearing(from: Vec2, to: Vec2) -> f32 {
    let delta = to - from;
    angle_clamp(-delta.y.atan2(delta.x).to_degrees())
}
