//! Serde mirror of the JSON map document and its conversion into core types.

use std::collections::BTreeMap;

use openbound_core::{
    Aabb, CellCoord, CellState, ExplosionRecord, MapDefinition, NamedLocation, ObstacleAction,
    ObstacleDefinition, ObstacleId, Placement, Vec2, WallGrid,
};
use openbound_navigation::valid_unit_position;
use serde::Deserialize;
use serde_json::Value;
use tracing::debug;

use crate::{tiles::TileTable, LoadedMap, MapFormatError};

const OBSTACLE_PREFIX: &str = "obstacle_";
const LOCATION_PREFIX: &str = "loc_";
const EXPLOSION_PREFIX: &str = "exp_";

#[derive(Deserialize)]
pub(crate) struct RawMap {
    #[serde(default)]
    map_name: String,
    #[serde(default)]
    map_author: String,
    #[serde(default)]
    map_notes: String,
    #[serde(default)]
    difficulty: u32,
    map_width: u32,
    map_height: u32,
    init_lives: u32,
    #[serde(default)]
    start_pos: Option<[f32; 2]>,
    tile_dat: Vec<Vec<u32>>,
    #[serde(flatten)]
    rest: BTreeMap<String, Value>,
}

#[derive(Deserialize)]
struct RawObstacle {
    startbox: [f32; 4],
    endbox: [f32; 4],
    revive: [f32; 2],
    #[serde(default)]
    actions: Vec<(String, Value)>,
    #[serde(flatten)]
    rest: BTreeMap<String, Value>,
}

type RawExplosion = (Vec<String>, Vec<String>, u32);

impl RawMap {
    pub(crate) fn into_loaded(
        self,
        tiles: &TileTable,
        half_width: f32,
    ) -> Result<LoadedMap, MapFormatError> {
        let mut grid = self.wall_grid(tiles)?;
        grid.sanitize_border();

        let [x, y] = self.start_pos.ok_or(MapFormatError::MissingStart)?;
        let start = Vec2::new(x, y);
        if !valid_unit_position(&grid, start, half_width) {
            return Err(MapFormatError::StartInWall { start });
        }

        let obstacles = numbered_entries(&self.rest, OBSTACLE_PREFIX)?
            .into_iter()
            .zip(0u32..)
            .map(|((number, key, value), index)| -> Result<_, MapFormatError> {
                let raw: RawObstacle = serde_json::from_value(value.clone())
                    .map_err(|source| MapFormatError::InvalidEntry { key, source })?;
                raw.into_definition(ObstacleId::new(index), number)
            })
            .collect::<Result<Vec<_>, _>>()?;

        debug!(
            name = %self.map_name,
            columns = grid.columns(),
            rows = grid.rows(),
            obstacles = obstacles.len(),
            "map parsed"
        );

        Ok(LoadedMap {
            name: self.map_name,
            author: self.map_author,
            notes: self.map_notes,
            difficulty: self.difficulty,
            definition: MapDefinition {
                grid,
                start,
                initial_lives: self.init_lives,
                obstacles,
            },
        })
    }

    /// Rows of `tile_dat` run top to bottom, columns left to right.
    fn wall_grid(&self, tiles: &TileTable) -> Result<WallGrid, MapFormatError> {
        let expected_rows = self.map_height as usize;
        if self.tile_dat.len() != expected_rows {
            return Err(MapFormatError::RowCount {
                expected: expected_rows,
                found: self.tile_dat.len(),
            });
        }
        let mut grid = WallGrid::new(self.map_width, self.map_height);
        for (tile_row, row) in self.tile_dat.iter().zip(0u32..) {
            if tile_row.len() != self.map_width as usize {
                return Err(MapFormatError::RowLength {
                    row,
                    expected: self.map_width as usize,
                    found: tile_row.len(),
                });
            }
            for (&tile, column) in tile_row.iter().zip(0u32..) {
                let cell = CellCoord::new(column, row);
                let wall = tiles
                    .is_wall(tile)
                    .ok_or(MapFormatError::UnknownTile { tile, cell })?;
                if wall {
                    grid.set(cell, CellState::Wall);
                }
            }
        }
        Ok(grid)
    }
}

impl RawObstacle {
    fn into_definition(self, id: ObstacleId, number: u32) -> Result<ObstacleDefinition, MapFormatError> {
        let locations: Vec<NamedLocation> = numbered_entries(&self.rest, LOCATION_PREFIX)?
            .into_iter()
            .map(|(_, key, value)| -> Result<_, MapFormatError> {
                let corners: [f32; 4] = serde_json::from_value(value.clone())
                    .map_err(|source| MapFormatError::InvalidEntry {
                        key: key.clone(),
                        source,
                    })?;
                Ok(NamedLocation {
                    name: key[LOCATION_PREFIX.len()..].to_owned(),
                    area: rectangle(corners),
                })
            })
            .collect::<Result<_, _>>()?;

        let explosions = numbered_entries(&self.rest, EXPLOSION_PREFIX)?
            .into_iter()
            .map(|(_, key, value)| -> Result<_, MapFormatError> {
                let (names, units, delay): RawExplosion = serde_json::from_value(value.clone())
                    .map_err(|source| MapFormatError::InvalidEntry {
                        key: key.clone(),
                        source,
                    })?;
                if names.len() != units.len() {
                    return Err(MapFormatError::MismatchedExplosion {
                        obstacle: number,
                        key,
                    });
                }
                let placements = names
                    .into_iter()
                    .zip(units)
                    .map(|(location, unit)| {
                        if locations.iter().any(|known| known.name == location) {
                            Ok(Placement { location, unit })
                        } else {
                            Err(MapFormatError::UnknownLocation {
                                obstacle: number,
                                name: location,
                            })
                        }
                    })
                    .collect::<Result<_, _>>()?;
                Ok(ExplosionRecord { placements, delay })
            })
            .collect::<Result<_, _>>()?;

        let mut actions = self
            .actions
            .iter()
            .map(|(name, value)| parse_action(number, name, value))
            .collect::<Result<Vec<_>, _>>()?;
        actions.sort();

        Ok(ObstacleDefinition {
            id,
            start_box: rectangle(self.startbox),
            end_box: rectangle(self.endbox),
            revive: Vec2::new(self.revive[0], self.revive[1]),
            actions,
            locations,
            explosions,
        })
    }
}

fn rectangle([x1, y1, x2, y2]: [f32; 4]) -> Aabb {
    Aabb::from_corners(Vec2::new(x1, y1), Vec2::new(x2, y2))
}

fn parse_action(obstacle: u32, name: &str, value: &Value) -> Result<ObstacleAction, MapFormatError> {
    let count = || value.as_u64().and_then(|n| u32::try_from(n).ok());
    let action = match name {
        "move_player" => count().map(|mode| ObstacleAction::MoveUnit { to_revive: mode != 0 }),
        "add_lives" => count().map(ObstacleAction::AddLives),
        "set_lives" => count().map(ObstacleAction::SetLives),
        "change_music" => value
            .as_str()
            .map(|track| ObstacleAction::ChangeMusic(track.to_owned())),
        _ => None,
    };
    action.ok_or_else(|| MapFormatError::MalformedAction {
        obstacle,
        action: name.to_owned(),
    })
}

/// Entries whose key is `prefix` followed by a number, sorted numerically.
fn numbered_entries<'a>(
    entries: &'a BTreeMap<String, Value>,
    prefix: &str,
) -> Result<Vec<(u32, String, &'a Value)>, MapFormatError> {
    let mut numbered = entries
        .iter()
        .filter_map(|(key, value)| key.strip_prefix(prefix).map(|suffix| (key, suffix, value)))
        .map(|(key, suffix, value)| {
            suffix
                .parse::<u32>()
                .map(|number| (number, key.clone(), value))
                .map_err(|_| MapFormatError::MalformedKey { key: key.clone() })
        })
        .collect::<Result<Vec<_>, _>>()?;
    numbered.sort_by(|a, b| (a.0, &a.1).cmp(&(b.0, &b.1)));
    Ok(numbered)
}
