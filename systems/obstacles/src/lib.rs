#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Obstacle trigger engine.
//!
//! Each obstacle bakes its explosion records into a cyclic [`Timeline`] at
//! load. While the unit keeps an obstacle active the timeline advances one
//! frame per tick and its effects are emitted as world commands: kills,
//! teleports, wall-state swaps and presentation cues.

mod timeline;

use openbound_core::{
    Aabb, Command, Event, GraphicCue, ObstacleAction, ObstacleDefinition, ObstacleId, SoundCue,
    UnitSnapshot, UnitState, Vec2,
};
use thiserror::Error;
use tracing::debug;

pub use timeline::{Timeline, TriggerEvent};

/// Failures raised while preparing obstacles.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum ObstacleError {
    /// An explosion record references an undeclared location.
    #[error("obstacle {obstacle:?} references unknown location `{name}`")]
    UnknownLocation {
        /// Obstacle holding the record.
        obstacle: ObstacleId,
        /// Name that failed to resolve.
        name: String,
    },
    /// An explosion record produced a wall layout missing from the obstacle's configurations.
    #[error("obstacle {obstacle:?} has no configuration for one of its records")]
    MissingConfiguration {
        /// Obstacle holding the record.
        obstacle: ObstacleId,
    },
}

/// Activation latch of an obstacle.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Latch {
    /// Waiting for the unit to enter the start box.
    Armed,
    /// Playing its timeline.
    Active,
    /// Finished; re-arms once the unit leaves the start box.
    Consumed,
}

/// Runtime state of a single obstacle.
#[derive(Clone, Debug)]
pub struct ObstacleRuntime {
    id: ObstacleId,
    start_box: Aabb,
    end_box: Aabb,
    revive: Vec2,
    actions: Vec<ObstacleAction>,
    timeline: Timeline,
    frame_index: usize,
    latch: Latch,
}

impl ObstacleRuntime {
    /// Bakes the obstacle described by `definition`.
    ///
    /// # Errors
    ///
    /// Propagates baking failures from [`Timeline::bake`].
    pub fn new(definition: &ObstacleDefinition) -> Result<Self, ObstacleError> {
        let mut actions = definition.actions.clone();
        actions.sort();
        Ok(Self {
            id: definition.id,
            start_box: definition.start_box,
            end_box: definition.end_box,
            revive: definition.revive,
            actions,
            timeline: Timeline::bake(definition)?,
            frame_index: 0,
            latch: Latch::Armed,
        })
    }

    /// Identifier of the obstacle.
    #[must_use]
    pub const fn id(&self) -> ObstacleId {
        self.id
    }

    /// Current activation latch.
    #[must_use]
    pub const fn latch(&self) -> Latch {
        self.latch
    }

    /// Frame that the next tick will play.
    #[must_use]
    pub const fn frame_index(&self) -> usize {
        self.frame_index
    }

    /// Baked timeline.
    #[must_use]
    pub const fn timeline(&self) -> &Timeline {
        &self.timeline
    }

    /// Activates the obstacle when the unit stands strictly inside the start box.
    ///
    /// Returns the start actions on activation.
    pub fn check_start(&mut self, position: Vec2) -> Option<&[ObstacleAction]> {
        if self.latch != Latch::Armed || !self.start_box.contains_exclusive(position) {
            return None;
        }
        self.latch = Latch::Active;
        self.frame_index = 0;
        debug!(obstacle = self.id.get(), "obstacle activated");
        Some(&self.actions)
    }

    /// Deactivates the obstacle when the unit stands strictly inside the end box.
    pub fn check_end(&mut self, position: Vec2) -> bool {
        if self.latch != Latch::Active || !self.end_box.contains_exclusive(position) {
            return false;
        }
        self.latch = Latch::Consumed;
        debug!(obstacle = self.id.get(), "obstacle deactivated");
        true
    }

    /// Re-arms a consumed obstacle once the unit is outside its start box.
    pub fn check_rearm(&mut self, position: Vec2) {
        if self.latch == Latch::Consumed && !self.start_box.contains(position) {
            self.latch = Latch::Armed;
        }
    }

    /// Plays the current frame if active and advances cyclically.
    pub fn tick(&mut self) -> &[TriggerEvent] {
        if self.latch != Latch::Active {
            return &[];
        }
        let index = self.frame_index;
        self.frame_index = (index + 1) % self.timeline.cycle_length();
        self.timeline.frame(index)
    }
}

/// System driving every obstacle of a map.
#[derive(Clone, Debug)]
pub struct Obstacles {
    runtimes: Vec<ObstacleRuntime>,
}

impl Obstacles {
    /// Bakes all obstacles in map order.
    ///
    /// # Errors
    ///
    /// Returns the first baking failure.
    pub fn new(definitions: &[ObstacleDefinition]) -> Result<Self, ObstacleError> {
        let runtimes = definitions
            .iter()
            .map(ObstacleRuntime::new)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { runtimes })
    }

    /// Runtime state of every obstacle, in map order.
    #[must_use]
    pub fn runtimes(&self) -> &[ObstacleRuntime] {
        &self.runtimes
    }

    /// Reacts to a simulation step by updating latches and playing frames.
    pub fn handle(&mut self, events: &[Event], unit: &UnitSnapshot, out: &mut Vec<Command>) {
        if !events
            .iter()
            .any(|event| matches!(event, Event::TimeAdvanced { .. }))
        {
            return;
        }

        let alive = unit.state != UnitState::Dead;
        for runtime in &mut self.runtimes {
            let revive = runtime.revive;
            let id = runtime.id;
            if alive {
                if let Some(actions) = runtime.check_start(unit.position) {
                    out.push(Command::SetRevivePoint { revive });
                    out.extend(actions.iter().filter_map(|action| start_command(action, revive)));
                }
                let _ = runtime.check_end(unit.position);
                runtime.check_rearm(unit.position);
            }

            emit_frame(id, revive, runtime.tick(), out);
        }
    }
}

fn start_command(action: &ObstacleAction, revive: Vec2) -> Option<Command> {
    match action {
        ObstacleAction::AddLives(count) => Some(Command::GrantLives { count: *count }),
        ObstacleAction::ChangeMusic(track) => Some(Command::ChangeMusic {
            track: track.clone(),
        }),
        ObstacleAction::MoveUnit { to_revive: true } => {
            Some(Command::MoveUnitTo { destination: revive })
        }
        ObstacleAction::MoveUnit { to_revive: false } => None,
        ObstacleAction::SetLives(count) => Some(Command::SetLives { count: *count }),
    }
}

fn emit_frame(obstacle: ObstacleId, revive: Vec2, frame: &[TriggerEvent], out: &mut Vec<Command>) {
    let mut graphics: Vec<GraphicCue> = Vec::new();
    let mut sounds: Vec<SoundCue> = Vec::new();
    let mut kills = Vec::new();
    let mut teleports = Vec::new();
    let mut walls = Vec::new();

    for event in frame {
        match event {
            TriggerEvent::Kill { area } => kills.push(*area),
            TriggerEvent::Teleport {
                origin,
                destination,
            } => teleports.push(Command::TeleportUnit {
                origin: *origin,
                destination: *destination,
            }),
            TriggerEvent::WallDelta { configuration } => walls.push(Command::SetWallState {
                obstacle,
                configuration: *configuration,
            }),
            TriggerEvent::Graphic(cue) => graphics.push(cue.clone()),
            TriggerEvent::Sound(cue) => {
                if !sounds.contains(cue) {
                    sounds.push(cue.clone());
                }
            }
        }
    }

    if !graphics.is_empty() || !sounds.is_empty() {
        out.push(Command::PresentCues { graphics, sounds });
    }
    out.extend(walls);
    if !kills.is_empty() {
        out.push(Command::KillUnitIn {
            boxes: kills,
            revive,
        });
    }
    out.extend(teleports);
}
