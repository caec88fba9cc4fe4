#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Persisted map documents for OpenBound.
//!
//! Maps are stored as JSON objects carrying metadata, a row-major grid of tile
//! ids (`tile_dat`) and any number of `obstacle_N` entries. Each obstacle names
//! its rectangles as `loc_K` entries and its explosion timeline as `exp_K`
//! entries of the form `[[locations], [units], delay]`. Tile ids are resolved
//! to walls through a [`TileTable`], which defaults to the stock palette and can
//! be replaced from a TOML file.

mod document;
mod tiles;

use openbound_core::{CellCoord, MapDefinition, Vec2};
use thiserror::Error;

pub use tiles::{TileInfo, TileTable};

/// Errors raised while reading map documents or tile tables.
#[derive(Debug, Error)]
pub enum MapFormatError {
    /// The document is not valid JSON or misses a required field.
    #[error("malformed map document: {0}")]
    Json(#[from] serde_json::Error),
    /// The tile table is not valid TOML.
    #[error("malformed tile table: {0}")]
    TileTable(#[from] toml::de::Error),
    /// A tile id appears twice in a tile table.
    #[error("tile id {id} is defined more than once")]
    DuplicateTile {
        /// Repeated id.
        id: u32,
    },
    /// The document has no `start_pos`.
    #[error("map has no start position")]
    MissingStart,
    /// `tile_dat` does not hold `map_height` rows.
    #[error("expected {expected} tile rows, found {found}")]
    RowCount {
        /// Declared map height.
        expected: usize,
        /// Rows present in `tile_dat`.
        found: usize,
    },
    /// A `tile_dat` row does not hold `map_width` entries.
    #[error("tile row {row} holds {found} entries, expected {expected}")]
    RowLength {
        /// Offending row.
        row: u32,
        /// Declared map width.
        expected: usize,
        /// Entries present in the row.
        found: usize,
    },
    /// A tile id is missing from the tile table.
    #[error("unknown tile id {tile} at {cell:?}")]
    UnknownTile {
        /// Unrecognised id.
        tile: u32,
        /// Cell painted with the id.
        cell: CellCoord,
    },
    /// The unit footprint at the start position overlaps a wall.
    #[error("start position {start} places the unit inside a wall")]
    StartInWall {
        /// Declared start position.
        start: Vec2,
    },
    /// A numbered key such as `obstacle_x` has a non-numeric suffix.
    #[error("malformed key `{key}`")]
    MalformedKey {
        /// Offending key.
        key: String,
    },
    /// A numbered entry has the wrong shape.
    #[error("malformed entry `{key}`: {source}")]
    InvalidEntry {
        /// Key of the entry.
        key: String,
        /// Underlying decoding failure.
        source: serde_json::Error,
    },
    /// An obstacle action is unknown or carries a value of the wrong type.
    #[error("obstacle {obstacle} has a malformed `{action}` action")]
    MalformedAction {
        /// Number of the obstacle as written in its key.
        obstacle: u32,
        /// Action name.
        action: String,
    },
    /// An explosion record lists a different number of locations and units.
    #[error("obstacle {obstacle} entry `{key}` pairs locations with units unevenly")]
    MismatchedExplosion {
        /// Number of the obstacle as written in its key.
        obstacle: u32,
        /// Key of the explosion record.
        key: String,
    },
    /// An explosion record names a location the obstacle does not define.
    #[error("obstacle {obstacle} references unknown location `{name}`")]
    UnknownLocation {
        /// Number of the obstacle as written in its key.
        obstacle: u32,
        /// Missing location name.
        name: String,
    },
}

/// Map definition together with the document's descriptive metadata.
#[derive(Clone, Debug, PartialEq)]
pub struct LoadedMap {
    /// Display name.
    pub name: String,
    /// Author credit.
    pub author: String,
    /// Free-form description.
    pub notes: String,
    /// Author supplied difficulty rating.
    pub difficulty: u32,
    /// Playable content.
    pub definition: MapDefinition,
}

/// Parses a JSON map document.
///
/// The outer ring of the grid is forced to walls, obstacles are numbered in
/// the order of their key suffix, and the start position must leave room for a
/// unit footprint of `half_width`.
pub fn parse_map(source: &str, tiles: &TileTable, half_width: f32) -> Result<LoadedMap, MapFormatError> {
    let raw: document::RawMap = serde_json::from_str(source)?;
    raw.into_loaded(tiles, half_width)
}
