use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::MapFormatError;

/// Description of one tile id.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TileInfo {
    /// Tile id referenced by `tile_dat`.
    pub id: u32,
    /// Human readable name.
    #[serde(default)]
    pub name: String,
    /// Whether cells painted with the tile block movement.
    pub wall: bool,
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct TileTableFile {
    tile: Vec<TileInfo>,
}

/// Lookup from tile id to wall flag.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TileTable {
    tiles: BTreeMap<u32, TileInfo>,
}

impl TileTable {
    /// Builds a table from explicit entries, rejecting repeated ids.
    pub fn from_tiles(tiles: impl IntoIterator<Item = TileInfo>) -> Result<Self, MapFormatError> {
        let mut table = BTreeMap::new();
        for tile in tiles {
            let id = tile.id;
            if table.insert(id, tile).is_some() {
                return Err(MapFormatError::DuplicateTile { id });
            }
        }
        Ok(Self { tiles: table })
    }

    /// Parses a TOML document made of `[[tile]]` entries.
    ///
    /// ```toml
    /// [[tile]]
    /// id = 0
    /// name = "floor"
    /// wall = false
    /// ```
    pub fn from_toml_str(source: &str) -> Result<Self, MapFormatError> {
        let file: TileTableFile = toml::from_str(source)?;
        Self::from_tiles(file.tile)
    }

    /// Wall flag of a tile id, or `None` when the id is unknown.
    #[must_use]
    pub fn is_wall(&self, id: u32) -> Option<bool> {
        self.tiles.get(&id).map(|tile| tile.wall)
    }

    /// Entry for a tile id.
    #[must_use]
    pub fn get(&self, id: u32) -> Option<&TileInfo> {
        self.tiles.get(&id)
    }

    /// Number of known tile ids.
    #[must_use]
    pub fn len(&self) -> usize {
        self.tiles.len()
    }

    /// Reports whether the table knows no tile ids.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tiles.is_empty()
    }
}

impl Default for TileTable {
    /// The stock palette: ids 0 to 19 with walls at 1, 3, 6, 9, 12, 15 and 18.
    fn default() -> Self {
        const PALETTE: [(&str, bool); 20] = [
            ("blank_walkable", false),
            ("blank_wall", true),
            ("test_walkable", false),
            ("test_wall", true),
            ("blockfloor", false),
            ("test_walkable", false),
            ("test_wall", true),
            ("blockfloor", false),
            ("test_walkable", false),
            ("test_wall", true),
            ("blockfloor", false),
            ("test_walkable", false),
            ("test_wall", true),
            ("blockfloor", false),
            ("test_walkable", false),
            ("test_wall", true),
            ("blockfloor", false),
            ("test_walkable", false),
            ("test_wall", true),
            ("blockfloor", false),
        ];
        let tiles = PALETTE
            .iter()
            .zip(0u32..)
            .map(|(&(name, wall), id)| {
                (
                    id,
                    TileInfo {
                        id,
                        name: name.to_owned(),
                        wall,
                    },
                )
            })
            .collect();
        Self { tiles }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_palette_walls() {
        let table = TileTable::default();
        let walls: Vec<u32> = (0..20).filter(|id| table.is_wall(*id) == Some(true)).collect();
        assert_eq!(walls, vec![1, 3, 6, 9, 12, 15, 18]);
        assert_eq!(table.len(), 20);
        assert_eq!(table.is_wall(20), None);
    }

    #[test]
    fn toml_table_replaces_the_palette() {
        let table = TileTable::from_toml_str(
            r#"
            [[tile]]
            id = 0
            name = "sand"
            wall = false

            [[tile]]
            id = 7
            wall = true
            "#,
        )
        .expect("valid table");
        assert_eq!(table.len(), 2);
        assert_eq!(table.is_wall(7), Some(true));
        assert_eq!(table.is_wall(1), None);
        assert_eq!(table.get(0).map(|tile| tile.name.as_str()), Some("sand"));
    }

    #[test]
    fn repeated_ids_are_rejected() {
        let error = TileTable::from_toml_str(
            r#"
            [[tile]]
            id = 3
            wall = true

            [[tile]]
            id = 3
            wall = false
            "#,
        )
        .expect_err("duplicate id");
        assert!(matches!(error, MapFormatError::DuplicateTile { id: 3 }));
    }
}
