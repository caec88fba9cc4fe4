use openbound_core::{Command, Event, MapDefinition, Tuning, UnitState, Vec2};
use openbound_system_control::{Control, ControlInput};
use openbound_system_obstacles::{ObstacleError, Obstacles};
use openbound_world::{self as world, query, World, WorldError};
use serde::Serialize;
use tracing::debug;

/// Fixed-step driver wiring input, the world and the obstacle system together.
pub(crate) struct Session {
    world: World,
    obstacles: Obstacles,
    control: Control,
}

impl Session {
    pub(crate) fn new(map: &MapDefinition, tuning: Tuning) -> Result<Self, ObstacleError> {
        Ok(Self {
            obstacles: Obstacles::new(&map.obstacles)?,
            control: Control::new(&tuning),
            world: World::new(map, tuning),
        })
    }

    /// Delivers one frame of input, advances time and lets obstacles respond.
    pub(crate) fn step(&mut self, inputs: &[ControlInput], log: &mut Vec<Event>) -> Result<(), WorldError> {
        let mut commands = Vec::new();
        for input in inputs {
            self.control.handle(input, &mut commands);
        }
        for command in commands {
            world::apply(&mut self.world, command, log)?;
        }

        let mut events = Vec::new();
        world::apply(&mut self.world, Command::Tick, &mut events)?;
        let mut follow_ups = Vec::new();
        self.obstacles
            .handle(&events, &query::unit_snapshot(&self.world), &mut follow_ups);
        log.extend(events);
        for command in follow_ups {
            world::apply(&mut self.world, command, log)?;
        }
        Ok(())
    }

    pub(crate) fn world(&self) -> &World {
        &self.world
    }
}

/// Final state of a simulation run, printed as JSON.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub(crate) struct Summary {
    pub(crate) map: String,
    pub(crate) ticks: u64,
    pub(crate) position: Vec2,
    pub(crate) angle: f32,
    pub(crate) state: UnitState,
    pub(crate) lives: u32,
    pub(crate) wall_state: Vec<u32>,
    pub(crate) deaths: usize,
    pub(crate) paths_planned: usize,
    pub(crate) orders_abandoned: usize,
}

impl Summary {
    pub(crate) fn collect(map: &str, session: &Session, log: &[Event]) -> Self {
        let world = session.world();
        let unit = query::unit_snapshot(world);
        let count = |predicate: fn(&Event) -> bool| log.iter().filter(|event| predicate(event)).count();
        Self {
            map: map.to_owned(),
            ticks: query::tick_index(world),
            position: unit.position,
            angle: unit.angle,
            state: unit.state,
            lives: unit.lives,
            wall_state: query::active_wall_state(world).components().to_vec(),
            deaths: count(|event| matches!(event, Event::UnitKilled { .. })),
            paths_planned: count(|event| matches!(event, Event::PathPlanned { .. })),
            orders_abandoned: count(|event| matches!(event, Event::OrderAbandoned { .. })),
        }
    }
}

pub(crate) fn log_events(tick: u64, events: &[Event]) {
    for event in events {
        debug!(tick, ?event, "event");
    }
}
