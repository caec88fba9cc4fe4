use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::{geometry::cell_index_of, CellCoord, GRID_SIZE};

/// State of a single grid cell.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CellState {
    /// Floor the unit may occupy.
    Open,
    /// Impassable terrain.
    Wall,
}

/// Dense boolean wall map indexed by column and row.
///
/// Lookups outside the grid report [`CellState::Wall`], so callers never need
/// to bounds-check neighbour probes.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct WallGrid {
    columns: u32,
    rows: u32,
    cells: Vec<CellState>,
}

impl WallGrid {
    /// Creates a fully open grid with the provided dimensions.
    #[must_use]
    pub fn new(columns: u32, rows: u32) -> Self {
        Self {
            columns,
            rows,
            cells: vec![CellState::Open; columns as usize * rows as usize],
        }
    }

    /// Parses a text picture where `#` marks walls and any other glyph is floor.
    ///
    /// Blank lines are skipped and short lines are padded with walls.
    #[must_use]
    pub fn from_ascii(picture: &str) -> Self {
        let lines: Vec<&str> = picture
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .collect();
        let columns = lines
            .iter()
            .map(|line| line.chars().count())
            .max()
            .unwrap_or(0) as u32;
        let mut grid = Self::new(columns, lines.len() as u32);
        for (row, line) in lines.iter().enumerate() {
            let mut glyphs = line.chars();
            for column in 0..columns {
                let state = match glyphs.next() {
                    Some('#') | None => CellState::Wall,
                    Some(_) => CellState::Open,
                };
                grid.set(CellCoord::new(column, row as u32), state);
            }
        }
        grid
    }

    /// Number of columns in the grid.
    #[must_use]
    pub const fn columns(&self) -> u32 {
        self.columns
    }

    /// Number of rows in the grid.
    #[must_use]
    pub const fn rows(&self) -> u32 {
        self.rows
    }

    /// Width of the grid in world units.
    #[must_use]
    pub fn width(&self) -> f32 {
        self.columns as f32 * GRID_SIZE
    }

    /// Height of the grid in world units.
    #[must_use]
    pub fn height(&self) -> f32 {
        self.rows as f32 * GRID_SIZE
    }

    fn index(&self, column: i64, row: i64) -> Option<usize> {
        if column < 0 || row < 0 || column >= i64::from(self.columns) || row >= i64::from(self.rows)
        {
            return None;
        }
        Some(row as usize * self.columns as usize + column as usize)
    }

    /// Reports the state of a cell, treating anything outside the grid as wall.
    #[must_use]
    pub fn state(&self, cell: CellCoord) -> CellState {
        self.state_at(i64::from(cell.column()), i64::from(cell.row()))
    }

    /// Signed variant of [`WallGrid::state`] used for neighbour probes.
    #[must_use]
    pub fn state_at(&self, column: i64, row: i64) -> CellState {
        self.index(column, row)
            .map_or(CellState::Wall, |index| self.cells[index])
    }

    /// Reports whether a cell is impassable.
    #[must_use]
    pub fn is_wall(&self, cell: CellCoord) -> bool {
        self.state(cell) == CellState::Wall
    }

    /// Signed variant of [`WallGrid::is_wall`].
    #[must_use]
    pub fn is_wall_at(&self, column: i64, row: i64) -> bool {
        self.state_at(column, row) == CellState::Wall
    }

    /// Reports whether the cell containing a world-space point is impassable.
    #[must_use]
    pub fn is_point_in_wall(&self, point: Vec2) -> bool {
        let (column, row) = cell_index_of(point);
        self.is_wall_at(column, row)
    }

    /// Returns the in-bounds cell containing the point, if any.
    #[must_use]
    pub fn cell_containing(&self, point: Vec2) -> Option<CellCoord> {
        let (column, row) = cell_index_of(point);
        self.index(column, row)
            .map(|_| CellCoord::new(column as u32, row as u32))
    }

    /// Returns the cell containing the point after clamping it onto the grid.
    ///
    /// Returns `None` only when the grid has no cells.
    #[must_use]
    pub fn clamped_cell(&self, point: Vec2) -> Option<CellCoord> {
        if self.columns == 0 || self.rows == 0 {
            return None;
        }
        let (column, row) = cell_index_of(point);
        Some(CellCoord::new(
            column.clamp(0, i64::from(self.columns) - 1) as u32,
            row.clamp(0, i64::from(self.rows) - 1) as u32,
        ))
    }

    /// Overwrites the state of an in-bounds cell. Out-of-bounds writes are ignored.
    pub fn set(&mut self, cell: CellCoord, state: CellState) {
        if let Some(index) = self.index(i64::from(cell.column()), i64::from(cell.row())) {
            self.cells[index] = state;
        }
    }

    /// Fills the half-open cell range `[first, end)` with `state`, clipped to the grid.
    pub fn fill(&mut self, first: (i64, i64), end: (i64, i64), state: CellState) {
        let column_range = first.0.max(0)..end.0.min(i64::from(self.columns));
        let row_range = first.1.max(0)..end.1.min(i64::from(self.rows));
        for row in row_range {
            for column in column_range.clone() {
                if let Some(index) = self.index(column, row) {
                    self.cells[index] = state;
                }
            }
        }
    }

    /// Forces every cell on the outer ring of the grid to be a wall.
    pub fn sanitize_border(&mut self) {
        if self.columns == 0 || self.rows == 0 {
            return;
        }
        for column in 0..self.columns {
            self.set(CellCoord::new(column, 0), CellState::Wall);
            self.set(CellCoord::new(column, self.rows - 1), CellState::Wall);
        }
        for row in 0..self.rows {
            self.set(CellCoord::new(0, row), CellState::Wall);
            self.set(CellCoord::new(self.columns - 1, row), CellState::Wall);
        }
    }

    /// Iterates every cell together with its state in row-major order.
    pub fn cells(&self) -> impl Iterator<Item = (CellCoord, CellState)> + '_ {
        let columns = self.columns.max(1);
        self.cells.iter().enumerate().map(move |(index, state)| {
            let column = index as u32 % columns;
            let row = index as u32 / columns;
            (CellCoord::new(column, row), *state)
        })
    }

    /// Number of wall cells inside the grid.
    #[must_use]
    pub fn wall_count(&self) -> usize {
        self.cells
            .iter()
            .filter(|state| **state == CellState::Wall)
            .count()
    }
}
