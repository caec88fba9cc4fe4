#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Authoritative world state for OpenBound.
//!
//! The world owns the unit, the precomputed wall-state table and the revive
//! point. All mutation goes through [`apply`]; adapters and systems read it
//! through [`query`].

mod wall_states;

use openbound_core::{Command, Event, MapDefinition, ObstacleId, Tuning, Vec2, WallStateKey};
use openbound_navigation::PathfindError;
use openbound_system_movement::{Mauzling, UnitInput};
use thiserror::Error;
use tracing::{debug, error};

pub use wall_states::WallStates;

/// Failures raised while applying commands.
#[derive(Clone, Debug, Error, PartialEq)]
pub enum WorldError {
    /// The navigation mesh could not link the unit to its goal.
    #[error("navigation failed: {0}")]
    Navigation(#[from] PathfindError),
    /// No mesh was compiled for the requested wall state.
    #[error("no navigation mesh compiled for wall state {key:?}")]
    MissingWallState {
        /// Requested key.
        key: WallStateKey,
    },
    /// A wall-state command named an obstacle the map does not define.
    #[error("unknown obstacle {obstacle:?}")]
    UnknownObstacle {
        /// Requested obstacle.
        obstacle: ObstacleId,
    },
    /// A wall-state command named a configuration the obstacle does not have.
    #[error("obstacle {obstacle:?} has no wall configuration {configuration}")]
    UnknownConfiguration {
        /// Requested obstacle.
        obstacle: ObstacleId,
        /// Requested configuration index.
        configuration: u32,
    },
}

/// Represents the authoritative OpenBound world state.
#[derive(Clone, Debug)]
pub struct World {
    wall_states: WallStates,
    active_key: WallStateKey,
    unit: Mauzling,
    revive_point: Vec2,
    tick_index: u64,
}

impl World {
    /// Builds the world for `map`, compiling every wall state up front.
    #[must_use]
    pub fn new(map: &MapDefinition, tuning: Tuning) -> Self {
        let wall_states = WallStates::compile(map, tuning.unit_half_width);
        debug!(
            wall_states = wall_states.len(),
            obstacles = map.obstacles.len(),
            "world created"
        );
        Self {
            active_key: WallStateKey::initial(map.obstacles.len()),
            wall_states,
            unit: Mauzling::new(map.start, map.initial_lives, tuning),
            revive_point: map.start,
            tick_index: 0,
        }
    }
}

/// Applies the provided command to the world, mutating state deterministically.
///
/// # Errors
///
/// Returns [`WorldError`] for wall-state commands that do not resolve to a
/// compiled mesh and for fatal navigation inconsistencies. Unreachable orders
/// are not errors; they surface as [`Event::OrderAbandoned`].
pub fn apply(
    world: &mut World,
    command: Command,
    out_events: &mut Vec<Event>,
) -> Result<(), WorldError> {
    let revive = world.revive_point;
    let input = match command {
        Command::Tick => {
            world.tick_index = world.tick_index.saturating_add(1);
            out_events.push(Event::TimeAdvanced {
                tick: world.tick_index,
            });
            let navigation = world.wall_states.mesh(&world.active_key).ok_or_else(|| {
                WorldError::MissingWallState {
                    key: world.active_key.clone(),
                }
            })?;
            if let Err(failure) = world
                .unit
                .transition(UnitInput::Tick { navigation }, out_events)
            {
                error!(
                    error = %failure,
                    key = ?world.active_key.components(),
                    "navigation inconsistency"
                );
                return Err(failure.into());
            }
            return Ok(());
        }
        Command::SelectAt { point } => UnitInput::SelectAt { point },
        Command::SelectInBox { corner_a, corner_b } => {
            UnitInput::SelectInBox { corner_a, corner_b }
        }
        Command::IssueOrder { target, queued } => UnitInput::IssueOrder { target, queued },
        Command::KillUnitIn { boxes, revive } => {
            let _ = world
                .unit
                .transition(UnitInput::Kill { boxes: &boxes, revive }, out_events)?;
            return Ok(());
        }
        Command::TeleportUnit {
            origin,
            destination,
        } => UnitInput::Teleport {
            origin,
            destination,
        },
        Command::SetWallState {
            obstacle,
            configuration,
        } => return set_wall_state(world, obstacle, configuration, out_events),
        Command::SetRevivePoint { revive } => {
            if world.revive_point != revive {
                world.revive_point = revive;
                out_events.push(Event::RevivePointChanged { revive });
            }
            return Ok(());
        }
        Command::GrantLives { count } => UnitInput::GrantLives { count, revive },
        Command::SetLives { count } => UnitInput::SetLives { count, revive },
        Command::MoveUnitTo { destination } => UnitInput::MoveTo { destination },
        Command::PresentCues { graphics, sounds } => {
            out_events.extend(graphics.into_iter().map(Event::GraphicCue));
            out_events.extend(sounds.into_iter().map(Event::SoundCue));
            return Ok(());
        }
        Command::ChangeMusic { track } => {
            out_events.push(Event::MusicChanged { track });
            return Ok(());
        }
    };
    let _ = world.unit.transition(input, out_events)?;
    Ok(())
}

fn set_wall_state(
    world: &mut World,
    obstacle: ObstacleId,
    configuration: u32,
    out_events: &mut Vec<Event>,
) -> Result<(), WorldError> {
    let index = obstacle.get() as usize;
    let options = world
        .wall_states
        .configurations(index)
        .ok_or(WorldError::UnknownObstacle { obstacle })?;
    if configuration as usize >= options.len() {
        return Err(WorldError::UnknownConfiguration {
            obstacle,
            configuration,
        });
    }
    let key = world
        .active_key
        .with_component(index, configuration)
        .ok_or(WorldError::UnknownObstacle { obstacle })?;
    if key == world.active_key {
        return Ok(());
    }
    if world.wall_states.mesh(&key).is_none() {
        return Err(WorldError::MissingWallState { key });
    }
    debug!(from = ?world.active_key.components(), to = ?key.components(), "wall state swapped");
    world.active_key = key.clone();
    out_events.push(Event::WallStateChanged { key });
    Ok(())
}

/// Query functions that provide read-only access to the world state.
pub mod query {
    use openbound_core::{UnitSnapshot, Vec2, WallStateKey};
    use openbound_navigation::NavigationMesh;
    use openbound_system_movement::Mauzling;

    use super::{WallStates, World};

    /// Captures a read-only view of the unit.
    #[must_use]
    pub fn unit_snapshot(world: &World) -> UnitSnapshot {
        world.unit.snapshot()
    }

    /// Provides read-only access to the unit itself.
    #[must_use]
    pub fn unit(world: &World) -> &Mauzling {
        &world.unit
    }

    /// Currently active wall-state key.
    #[must_use]
    pub fn active_wall_state(world: &World) -> &WallStateKey {
        &world.active_key
    }

    /// Mesh for the active wall state.
    #[must_use]
    pub fn navigation_mesh(world: &World) -> Option<&NavigationMesh> {
        world.wall_states.mesh(&world.active_key)
    }

    /// Every compiled wall state.
    #[must_use]
    pub fn wall_states(world: &World) -> &WallStates {
        &world.wall_states
    }

    /// Where the unit revives after dying or being granted lives while dead.
    #[must_use]
    pub fn revive_point(world: &World) -> Vec2 {
        world.revive_point
    }

    /// Number of ticks simulated so far.
    #[must_use]
    pub fn tick_index(world: &World) -> u64 {
        world.tick_index
    }
}
