use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::Aabb;

/// Unit names whose placement turns a location into wall.
pub const WALL_UNITS: [&str; 2] = ["psi_emitter", "crystal"];

/// Unit name marking the source rectangle of a teleport.
pub const TELEPORT_ORIGIN_UNIT: &str = "tele_origin";

/// Unit name marking the landing rectangle of a teleport.
pub const TELEPORT_DESTINATION_UNIT: &str = "tele_destination";

/// Reports whether placing `unit` converts its location into wall.
#[must_use]
pub fn is_wall_unit(unit: &str) -> bool {
    WALL_UNITS.contains(&unit)
}

/// Reports whether `unit` is a marker rather than a lethal explosion.
#[must_use]
pub fn is_marker_unit(unit: &str) -> bool {
    is_wall_unit(unit) || unit == TELEPORT_ORIGIN_UNIT || unit == TELEPORT_DESTINATION_UNIT
}

/// Identifier of an obstacle, equal to its position in map order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ObstacleId(u32);

impl ObstacleId {
    /// Creates a new obstacle identifier with the provided numeric value.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the identifier.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

/// Named rectangle referenced by explosion records.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct NamedLocation {
    /// Name used by explosion records to refer to the location.
    pub name: String,
    /// World-space rectangle covered by the location.
    pub area: Aabb,
}

/// One-shot effect fired when an obstacle activates.
///
/// Variants are declared in the order activation applies them.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ObstacleAction {
    /// Grants additional lives.
    AddLives(u32),
    /// Switches the background music track.
    ChangeMusic(String),
    /// Moves the unit onto the obstacle's revive point when `to_revive` is set.
    MoveUnit {
        /// Whether the move is enabled.
        to_revive: bool,
    },
    /// Overwrites the remaining lives.
    SetLives(u32),
}

/// Unit spawned at a named location by an explosion record.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Placement {
    /// Name of the location the unit is spawned at.
    pub location: String,
    /// Name of the spawned unit.
    pub unit: String,
}

/// One step of an obstacle's explosion timeline.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExplosionRecord {
    /// Units spawned by the step.
    pub placements: Vec<Placement>,
    /// Number of empty frames that follow the step.
    pub delay: u32,
}

/// Wall flags of an obstacle, one per location in declaration order.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct WallConfiguration(Vec<bool>);

impl WallConfiguration {
    /// Creates a configuration from explicit flags.
    #[must_use]
    pub fn new(flags: Vec<bool>) -> Self {
        Self(flags)
    }

    /// Configuration with every location clear.
    #[must_use]
    pub fn clear(locations: usize) -> Self {
        Self(vec![false; locations])
    }

    /// Per-location wall flags.
    #[must_use]
    pub fn flags(&self) -> &[bool] {
        &self.0
    }

    /// Reports whether no location is walled.
    #[must_use]
    pub fn is_clear(&self) -> bool {
        self.0.iter().all(|flag| !flag)
    }
}

/// Static description of a scripted obstacle as authored in the map.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ObstacleDefinition {
    /// Identifier of the obstacle.
    pub id: ObstacleId,
    /// Rectangle the unit enters to activate the obstacle.
    pub start_box: Aabb,
    /// Rectangle the unit enters to deactivate the obstacle.
    pub end_box: Aabb,
    /// Point the unit revives at after dying inside the obstacle.
    pub revive: Vec2,
    /// Effects fired on activation.
    pub actions: Vec<ObstacleAction>,
    /// Named rectangles in declaration order.
    pub locations: Vec<NamedLocation>,
    /// Explosion timeline in declaration order.
    pub explosions: Vec<ExplosionRecord>,
}

impl ObstacleDefinition {
    /// Position of the named location in declaration order.
    #[must_use]
    pub fn location_index(&self, name: &str) -> Option<usize> {
        self.locations
            .iter()
            .position(|location| location.name == name)
    }

    /// Looks up a location by name.
    #[must_use]
    pub fn location(&self, name: &str) -> Option<&NamedLocation> {
        self.locations
            .iter()
            .find(|location| location.name == name)
    }

    /// Wall flags that result from applying a single explosion record.
    #[must_use]
    pub fn wall_flags_for(&self, record: &ExplosionRecord) -> WallConfiguration {
        let mut flags = vec![false; self.locations.len()];
        for placement in &record.placements {
            if !is_wall_unit(&placement.unit) {
                continue;
            }
            if let Some(index) = self.location_index(&placement.location) {
                flags[index] = true;
            }
        }
        WallConfiguration(flags)
    }

    /// Sorted, de-duplicated wall configurations this obstacle can produce.
    ///
    /// The all-clear configuration is always present.
    #[must_use]
    pub fn wall_configurations(&self) -> Vec<WallConfiguration> {
        let mut configurations: Vec<WallConfiguration> = self
            .explosions
            .iter()
            .map(|record| self.wall_flags_for(record))
            .collect();
        configurations.push(WallConfiguration::clear(self.locations.len()));
        configurations.sort();
        configurations.dedup();
        configurations
    }

    /// Index of the configuration produced by `record` within [`Self::wall_configurations`].
    #[must_use]
    pub fn configuration_index(&self, record: &ExplosionRecord) -> Option<usize> {
        let flags = self.wall_flags_for(record);
        self.wall_configurations()
            .iter()
            .position(|configuration| *configuration == flags)
    }
}

/// Composite wall state: one configuration index per obstacle, in obstacle order.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct WallStateKey(Vec<u32>);

impl WallStateKey {
    /// Creates a key from explicit per-obstacle configuration indices.
    #[must_use]
    pub fn new(components: Vec<u32>) -> Self {
        Self(components)
    }

    /// Key with every obstacle at configuration zero.
    #[must_use]
    pub fn initial(obstacles: usize) -> Self {
        Self(vec![0; obstacles])
    }

    /// Per-obstacle configuration indices.
    #[must_use]
    pub fn components(&self) -> &[u32] {
        &self.0
    }

    /// Copy of the key with one obstacle's component replaced.
    ///
    /// Returns `None` when the obstacle index is outside the key.
    #[must_use]
    pub fn with_component(&self, obstacle: usize, configuration: u32) -> Option<Self> {
        let mut components = self.0.clone();
        *components.get_mut(obstacle)? = configuration;
        Some(Self(components))
    }
}
