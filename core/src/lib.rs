#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Core contracts shared across the OpenBound simulator.
//!
//! This crate defines the message surface that connects adapters, the
//! authoritative world, and pure systems. Adapters submit [`Command`] values
//! describing desired mutations, the world executes those commands via its
//! `apply` entry point, and then broadcasts [`Event`] values for systems to
//! react to deterministically. Systems consume event streams, read immutable
//! snapshots such as [`UnitSnapshot`], and respond exclusively with new
//! command batches.

mod geometry;
mod grid;
mod obstacle;
mod tuning;

pub use geometry::{angle_clamp, angular_distance, bearing, cell_index_of, Aabb, CellCoord};
pub use glam::Vec2;
pub use grid::{CellState, WallGrid};
pub use obstacle::{
    is_marker_unit, is_wall_unit, ExplosionRecord, NamedLocation, ObstacleAction,
    ObstacleDefinition, ObstacleId, Placement, WallConfiguration, WallStateKey,
    TELEPORT_DESTINATION_UNIT, TELEPORT_ORIGIN_UNIT, WALL_UNITS,
};
pub use tuning::Tuning;

use serde::{Deserialize, Serialize};

/// Side length of a grid cell in world units.
pub const GRID_SIZE: f32 = 16.0;

/// Half the side length of the unit's footprint before shrinking.
pub const PLAYER_RADIUS: f32 = 8.0;

/// Amount the footprint is shrunk so a unit fits snugly inside a one-cell corridor.
pub const UNIT_RADIUS_EPS: f32 = 0.01;

/// Tolerance for float comparisons on positions and angles.
pub const SMALL_NUMBER: f32 = 1.0e-6;

/// Number of discrete sprite rotations.
pub const FACING_DIRECTIONS: u8 = 16;

/// Lifecycle state of the controllable unit.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum UnitState {
    /// Standing still with nothing to do.
    Idle,
    /// Waiting out the click delay of a fresh order.
    Delay,
    /// Rotating towards the next waypoint.
    Turning,
    /// Walking towards the next waypoint.
    Moving,
    /// Reached the final waypoint this tick.
    Arrived,
    /// Waiting for a queued order's delay to elapse.
    DelayQueued,
    /// Out of lives.
    Dead,
}

/// Distinguishes replacing orders from appended ones.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OrderKind {
    /// Replaces the current queue.
    New,
    /// Appends to the current queue.
    Queued,
}

/// Reasons a move order is refused.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OrderRejection {
    /// The unit is not selected or is dead.
    NotSelected,
    /// The order queue is already at capacity.
    QueueFull,
    /// The order repeats the most recently buffered one.
    DuplicateOfBuffered,
    /// The unit is already heading to (almost) the same spot.
    AlreadyHeadingThere,
    /// The target lies on the unit itself.
    InsideUnit,
}

impl OrderRejection {
    /// Whether the click still produces a cursor acknowledgement.
    #[must_use]
    pub const fn shows_cursor_feedback(self) -> bool {
        matches!(
            self,
            Self::QueueFull | Self::DuplicateOfBuffered | Self::AlreadyHeadingThere
        )
    }
}

/// Visual effect requested at a world position.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GraphicCue {
    /// Name of the effect.
    pub name: String,
    /// World-space centre of the effect.
    pub position: Vec2,
}

/// Sound effect requested by the simulation.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SoundCue {
    /// Name of the sound.
    pub name: String,
}

/// Commands that express all permissible world mutations.
#[derive(Clone, Debug, PartialEq)]
pub enum Command {
    /// Advances the simulation by one fixed step.
    Tick,
    /// Selects the unit when the point lands on it, deselecting otherwise.
    SelectAt {
        /// World-space click position.
        point: Vec2,
    },
    /// Selects the unit when it lies inside the dragged rectangle.
    SelectInBox {
        /// First corner of the drag.
        corner_a: Vec2,
        /// Opposite corner of the drag.
        corner_b: Vec2,
    },
    /// Issues a move order to the selected unit.
    IssueOrder {
        /// World-space destination.
        target: Vec2,
        /// Whether the order appends to the queue instead of replacing it.
        queued: bool,
    },
    /// Kills the unit when its footprint overlaps any of the rectangles.
    KillUnitIn {
        /// Lethal rectangles.
        boxes: Vec<Aabb>,
        /// Point the unit revives at if lives remain.
        revive: Vec2,
    },
    /// Moves the unit to `destination` when its footprint overlaps `origin`.
    TeleportUnit {
        /// Rectangle that triggers the teleport.
        origin: Aabb,
        /// Landing point.
        destination: Vec2,
    },
    /// Switches one obstacle's wall configuration.
    SetWallState {
        /// Obstacle whose walls change.
        obstacle: ObstacleId,
        /// Index into that obstacle's wall configurations.
        configuration: u32,
    },
    /// Records the revive point of the most recently activated obstacle.
    SetRevivePoint {
        /// New revive point.
        revive: Vec2,
    },
    /// Adds lives, reviving a dead unit.
    GrantLives {
        /// Number of lives granted.
        count: u32,
    },
    /// Overwrites the unit's remaining lives.
    SetLives {
        /// New number of lives.
        count: u32,
    },
    /// Relocates the unit, dropping its orders.
    MoveUnitTo {
        /// Landing point.
        destination: Vec2,
    },
    /// Forwards presentation cues to adapters.
    PresentCues {
        /// Visual effects to show.
        graphics: Vec<GraphicCue>,
        /// Sounds to play.
        sounds: Vec<SoundCue>,
    },
    /// Switches the background music.
    ChangeMusic {
        /// Track name.
        track: String,
    },
}

/// Events broadcast by the world after processing commands.
#[derive(Clone, Debug, PartialEq)]
pub enum Event {
    /// Indicates that the simulation advanced by one step.
    TimeAdvanced {
        /// Number of steps simulated so far, including this one.
        tick: u64,
    },
    /// Reports a change of the unit's lifecycle state.
    UnitStateChanged {
        /// State before the change.
        from: UnitState,
        /// State after the change.
        to: UnitState,
    },
    /// Reports that the unit changed position.
    UnitMoved {
        /// Position before the move.
        from: Vec2,
        /// Position after the move.
        to: Vec2,
    },
    /// Reports that the unit rotated.
    UnitTurned {
        /// New facing angle in degrees.
        angle: f32,
    },
    /// Reports that the unit's selection flag changed.
    SelectionChanged {
        /// Whether the unit is now selected.
        selected: bool,
    },
    /// Confirms that a move order was buffered.
    OrderIssued {
        /// Destination of the order.
        target: Vec2,
        /// Whether the order replaces or appends.
        kind: OrderKind,
    },
    /// Reports that a move order was refused.
    OrderRejected {
        /// Destination of the refused order.
        target: Vec2,
        /// Why the order was refused.
        reason: OrderRejection,
    },
    /// Reports the waypoints planned for an order, in travel order.
    PathPlanned {
        /// Waypoints excluding the starting position.
        waypoints: Vec<Vec2>,
    },
    /// Reports that an order was dropped because no path exists.
    OrderAbandoned {
        /// Destination of the dropped order.
        target: Vec2,
    },
    /// Reports that the unit was killed.
    UnitKilled {
        /// Where the unit died.
        position: Vec2,
        /// Lives left after the death.
        lives_remaining: u32,
    },
    /// Reports that the unit came back to life.
    UnitRevived {
        /// Where the unit revived.
        position: Vec2,
    },
    /// Reports that the unit was relocated by a teleport or scripted move.
    UnitTeleported {
        /// Position before the jump.
        from: Vec2,
        /// Position after the jump.
        to: Vec2,
    },
    /// Reports the unit's new life count.
    LivesChanged {
        /// Remaining lives.
        lives: u32,
    },
    /// Reports that the revive point moved.
    RevivePointChanged {
        /// New revive point.
        revive: Vec2,
    },
    /// Reports that the active wall state changed.
    WallStateChanged {
        /// Newly active wall-state key.
        key: WallStateKey,
    },
    /// Requests a visual effect.
    GraphicCue(GraphicCue),
    /// Requests a sound effect.
    SoundCue(SoundCue),
    /// Requests a music change.
    MusicChanged {
        /// Track name.
        track: String,
    },
}

/// Read-only view of the unit exposed to systems and adapters.
#[derive(Clone, Debug, PartialEq)]
pub struct UnitSnapshot {
    /// Centre of the unit in world units.
    pub position: Vec2,
    /// Facing angle in degrees.
    pub angle: f32,
    /// Lifecycle state.
    pub state: UnitState,
    /// Whether the unit is selected.
    pub selected: bool,
    /// Current frame of the walk animation.
    pub animation_index: usize,
    /// Remaining lives.
    pub lives: u32,
    /// Collision footprint.
    pub bounding_box: Aabb,
    /// Destinations of the accepted orders, head first.
    pub pending_destinations: Vec<Vec2>,
}

impl UnitSnapshot {
    /// Sprite rotation bucket derived from the facing angle.
    #[must_use]
    pub fn facing_index(&self) -> u8 {
        facing_index(self.angle)
    }
}

/// Maps a facing angle in degrees onto one of [`FACING_DIRECTIONS`] buckets.
///
/// Bucket zero is centred on east and indices increase counter-clockwise.
#[must_use]
pub fn facing_index(angle: f32) -> u8 {
    let width = 360.0 / f32::from(FACING_DIRECTIONS);
    let bucket = ((angle_clamp(angle) + width * 0.5) / width).floor() as u32;
    (bucket % u32::from(FACING_DIRECTIONS)) as u8
}

/// Fully parsed map: walls, spawn, lives and obstacles.
#[derive(Clone, Debug, PartialEq)]
pub struct MapDefinition {
    /// Base wall grid with a sanitized border.
    pub grid: WallGrid,
    /// Spawn point of the unit.
    pub start: Vec2,
    /// Lives the unit starts with.
    pub initial_lives: u32,
    /// Obstacles in map order.
    pub obstacles: Vec<ObstacleDefinition>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn facing_index_buckets_wrap_around_east() {
        assert_eq!(facing_index(0.0), 0);
        assert_eq!(facing_index(11.0), 0);
        assert_eq!(facing_index(12.0), 1);
        assert_eq!(facing_index(90.0), 4);
        assert_eq!(facing_index(349.0), 0);
        assert_eq!(facing_index(-90.0), 12);
    }

    #[test]
    fn only_informative_rejections_show_feedback() {
        assert!(!OrderRejection::NotSelected.shows_cursor_feedback());
        assert!(!OrderRejection::InsideUnit.shows_cursor_feedback());
        assert!(OrderRejection::QueueFull.shows_cursor_feedback());
        assert!(OrderRejection::DuplicateOfBuffered.shows_cursor_feedback());
        assert!(OrderRejection::AlreadyHeadingThere.shows_cursor_feedback());
    }

    #[test]
    fn default_unit_half_width_fits_a_cell() {
        let tuning = Tuning::default();
        assert!(tuning.unit_half_width * 2.0 < GRID_SIZE);
        assert!((tuning.unit_half_width - 7.99).abs() < 1.0e-4);
    }
}
