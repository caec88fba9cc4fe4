#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Movement state machine for the controllable unit.
//!
//! The unit buffers right-click orders behind a click delay, asks the
//! navigation mesh for a path once an order comes due, turns towards each
//! waypoint in fixed angular steps and then walks the waypoint chain at the
//! speed dictated by its animation cycle. Every interaction goes through
//! [`Mauzling::transition`], which reports observable changes as world
//! [`Event`]s.

mod turning;

use std::collections::VecDeque;

use openbound_core::{
    facing_index, Aabb, Event, OrderKind, OrderRejection, Tuning, UnitSnapshot, UnitState, Vec2,
    PLAYER_RADIUS, SMALL_NUMBER,
};
use openbound_navigation::{NavigationMesh, Path, PathfindError};
use tracing::{debug, info, warn};

use crate::turning::{plan_turn, TurnRequest};

/// Accepted leg of a move order.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Order {
    /// Destination of the leg.
    pub goal: Vec2,
    /// Ticks left before the leg starts. Reaches `-1` on the tick the unit
    /// begins turning towards `goal`.
    pub countdown: i32,
    /// Whether the leg still has to be resolved into waypoints.
    pub needs_path: bool,
    /// Click that produced the leg, used to break turn ties.
    pub origin_click: Option<Vec2>,
}

#[derive(Clone, Copy, Debug, PartialEq)]
struct IncomingOrder {
    target: Vec2,
    countdown: i32,
    kind: OrderKind,
}

/// Stimulus fed into [`Mauzling::transition`].
#[derive(Clone, Copy, Debug)]
pub enum UnitInput<'a> {
    /// Advances the unit by one simulation step using the active mesh.
    Tick {
        /// Mesh for the current wall state.
        navigation: &'a NavigationMesh,
    },
    /// Selects or deselects the unit with a click.
    SelectAt {
        /// World-space click.
        point: Vec2,
    },
    /// Selects or deselects the unit with a dragged rectangle.
    SelectInBox {
        /// First drag corner.
        corner_a: Vec2,
        /// Opposite drag corner.
        corner_b: Vec2,
    },
    /// Offers a move order.
    IssueOrder {
        /// World-space destination.
        target: Vec2,
        /// Whether the order appends to the queue.
        queued: bool,
    },
    /// Kills the unit if its footprint overlaps any rectangle.
    Kill {
        /// Lethal rectangles.
        boxes: &'a [Aabb],
        /// Where to revive when lives remain.
        revive: Vec2,
    },
    /// Teleports the unit if its footprint overlaps `origin`.
    Teleport {
        /// Trigger rectangle.
        origin: Aabb,
        /// Landing point.
        destination: Vec2,
    },
    /// Moves the unit unconditionally.
    MoveTo {
        /// Landing point.
        destination: Vec2,
    },
    /// Adds lives, reviving a dead unit at `revive`.
    GrantLives {
        /// Lives granted.
        count: u32,
        /// Where a dead unit comes back.
        revive: Vec2,
    },
    /// Overwrites the life count.
    SetLives {
        /// New life count.
        count: u32,
        /// Where a dead unit comes back when lives become positive.
        revive: Vec2,
    },
}

/// The controllable unit.
#[derive(Clone, Debug, PartialEq)]
pub struct Mauzling {
    position: Vec2,
    angle: f32,
    state: UnitState,
    selected: bool,
    animation_index: usize,
    lives: u32,
    incoming: Vec<IncomingOrder>,
    queue: VecDeque<Order>,
    turn_angles: VecDeque<f32>,
    tuning: Tuning,
}

impl Mauzling {
    /// Spawns an idle, unselected unit facing east.
    #[must_use]
    pub fn new(position: Vec2, lives: u32, tuning: Tuning) -> Self {
        Self {
            position,
            angle: 0.0,
            state: if lives == 0 {
                UnitState::Dead
            } else {
                UnitState::Idle
            },
            selected: false,
            animation_index: 0,
            lives,
            incoming: Vec::new(),
            queue: VecDeque::new(),
            turn_angles: VecDeque::new(),
            tuning,
        }
    }

    /// Centre of the unit.
    #[must_use]
    pub const fn position(&self) -> Vec2 {
        self.position
    }

    /// Facing angle in degrees.
    #[must_use]
    pub const fn angle(&self) -> f32 {
        self.angle
    }

    /// Lifecycle state.
    #[must_use]
    pub const fn state(&self) -> UnitState {
        self.state
    }

    /// Whether the unit is selected.
    #[must_use]
    pub const fn is_selected(&self) -> bool {
        self.selected
    }

    /// Remaining lives, including the current one.
    #[must_use]
    pub const fn lives(&self) -> u32 {
        self.lives
    }

    /// Current walk animation frame.
    #[must_use]
    pub const fn animation_index(&self) -> usize {
        self.animation_index
    }

    /// Accepted order legs, head first.
    pub fn orders(&self) -> impl Iterator<Item = &Order> + '_ {
        self.queue.iter()
    }

    /// Number of orders still waiting out their click delay.
    #[must_use]
    pub fn buffered_order_count(&self) -> usize {
        self.incoming.len()
    }

    /// Tuning the unit was created with.
    #[must_use]
    pub const fn tuning(&self) -> &Tuning {
        &self.tuning
    }

    /// Collision footprint used for kills, teleports and clicks.
    #[must_use]
    pub fn bounding_box(&self) -> Aabb {
        Aabb::centered(self.position, PLAYER_RADIUS)
    }

    /// Sprite rotation bucket for the current angle.
    #[must_use]
    pub fn facing_index(&self) -> u8 {
        facing_index(self.angle)
    }

    /// Read-only view handed to systems and adapters.
    #[must_use]
    pub fn snapshot(&self) -> UnitSnapshot {
        UnitSnapshot {
            position: self.position,
            angle: self.angle,
            state: self.state,
            selected: self.selected,
            animation_index: self.animation_index,
            lives: self.lives,
            bounding_box: self.bounding_box(),
            pending_destinations: self.queue.iter().map(|order| order.goal).collect(),
        }
    }

    /// Applies one input and reports the resulting observable changes.
    ///
    /// # Errors
    ///
    /// Propagates [`PathfindError::DisconnectedGraph`] when the mesh cannot
    /// link the unit to its goal at all. Unreachable goals are not errors; the
    /// order is dropped and [`Event::OrderAbandoned`] is emitted instead.
    pub fn transition(
        &mut self,
        input: UnitInput<'_>,
        out_events: &mut Vec<Event>,
    ) -> Result<UnitState, PathfindError> {
        let before_state = self.state;
        let before_position = self.position;
        let before_angle = self.angle;
        let first_event = out_events.len();

        let result = match input {
            UnitInput::Tick { navigation } => self.tick(navigation, out_events),
            UnitInput::SelectAt { point } => {
                let hit = self
                    .bounding_box()
                    .expanded(self.tuning.click_selection_buffer)
                    .contains(point);
                self.set_selected(hit, out_events);
                Ok(())
            }
            UnitInput::SelectInBox { corner_a, corner_b } => {
                let hit = Aabb::from_corners(corner_a, corner_b).contains(self.position);
                self.set_selected(hit, out_events);
                Ok(())
            }
            UnitInput::IssueOrder { target, queued } => {
                self.issue_order(target, queued, out_events);
                Ok(())
            }
            UnitInput::Kill { boxes, revive } => {
                self.check_kill_boxes(boxes, revive, out_events);
                Ok(())
            }
            UnitInput::Teleport {
                origin,
                destination,
            } => {
                if self.state != UnitState::Dead && origin.overlaps(&self.bounding_box()) {
                    self.relocate(destination, out_events);
                }
                Ok(())
            }
            UnitInput::MoveTo { destination } => {
                if self.state != UnitState::Dead {
                    self.relocate(destination, out_events);
                }
                Ok(())
            }
            UnitInput::GrantLives { count, revive } => {
                self.grant_lives(count, revive, out_events);
                Ok(())
            }
            UnitInput::SetLives { count, revive } => {
                self.set_lives(count, revive, out_events);
                Ok(())
            }
        };

        let jumped = out_events[first_event..]
            .iter()
            .any(|event| matches!(event, Event::UnitTeleported { .. } | Event::UnitRevived { .. }));
        if self.position != before_position && !jumped {
            out_events.push(Event::UnitMoved {
                from: before_position,
                to: self.position,
            });
        }
        if self.angle != before_angle {
            out_events.push(Event::UnitTurned { angle: self.angle });
        }
        if self.state != before_state {
            out_events.push(Event::UnitStateChanged {
                from: before_state,
                to: self.state,
            });
        }

        result.map(|()| self.state)
    }

    fn set_selected(&mut self, selected: bool, out_events: &mut Vec<Event>) {
        if self.state == UnitState::Dead {
            return;
        }
        if self.selected != selected {
            self.selected = selected;
            out_events.push(Event::SelectionChanged { selected });
        }
    }

    fn issue_order(&mut self, target: Vec2, queued: bool, out_events: &mut Vec<Event>) {
        let kind = if queued {
            OrderKind::Queued
        } else {
            OrderKind::New
        };
        match self.admit(target, kind) {
            Ok(()) => {
                self.incoming.push(IncomingOrder {
                    target,
                    countdown: self.tuning.move_delay,
                    kind,
                });
                if self.state == UnitState::Idle {
                    self.state = UnitState::Delay;
                }
                out_events.push(Event::OrderIssued { target, kind });
            }
            Err(reason) => {
                debug!(?target, ?reason, "order rejected");
                out_events.push(Event::OrderRejected { target, reason });
            }
        }
    }

    fn admit(&self, target: Vec2, kind: OrderKind) -> Result<(), OrderRejection> {
        if !self.selected || self.state == UnitState::Dead {
            return Err(OrderRejection::NotSelected);
        }
        if kind == OrderKind::Queued
            && self.queue.len() + self.incoming.len() >= self.tuning.max_orders
        {
            return Err(OrderRejection::QueueFull);
        }
        if self.incoming.last().is_some_and(|last| last.target == target) {
            return Err(OrderRejection::DuplicateOfBuffered);
        }
        if kind == OrderKind::New
            && self
                .queue
                .back()
                .is_some_and(|last| last.goal.distance(target) <= self.tuning.click_deadzone)
        {
            return Err(OrderRejection::AlreadyHeadingThere);
        }
        if self
            .bounding_box()
            .expanded(self.tuning.hitbox_deadzone_buffer)
            .contains(target)
        {
            return Err(OrderRejection::InsideUnit);
        }
        Ok(())
    }

    fn tick(
        &mut self,
        navigation: &NavigationMesh,
        out_events: &mut Vec<Event>,
    ) -> Result<(), PathfindError> {
        match self.state {
            UnitState::Dead => return Ok(()),
            UnitState::Idle | UnitState::DelayQueued => self.animation_index = 0,
            UnitState::Arrived => self.state = UnitState::Idle,
            UnitState::Delay | UnitState::Turning | UnitState::Moving => {}
        }

        self.promote_incoming_orders();

        let Some(head) = self.queue.front_mut() else {
            return Ok(());
        };
        head.countdown -= 1;
        if head.countdown > -1 {
            self.state = UnitState::DelayQueued;
            return Ok(());
        }

        if head.needs_path {
            let clicked = head.goal;
            match navigation.pathfind(self.position, clicked) {
                Ok(path) => self.adopt_path(&path, clicked, out_events),
                Err(PathfindError::Unreachable) => {
                    debug!(target = ?clicked, "order abandoned, goal unreachable");
                    let _ = self.queue.pop_front();
                    self.turn_angles.clear();
                    self.state = UnitState::Arrived;
                    out_events.push(Event::OrderAbandoned { target: clicked });
                    return Ok(());
                }
                Err(fatal) => {
                    warn!(error = %fatal, "navigation mesh cannot link the unit");
                    return Err(fatal);
                }
            }
        }

        let Some(head) = self.queue.front().copied() else {
            return Ok(());
        };
        if head.countdown == -1 {
            self.turn_angles = plan_turn(
                &self.tuning,
                TurnRequest {
                    position: self.position,
                    angle: self.angle,
                    goal: head.goal,
                    origin_click: head.origin_click,
                    already_moving: matches!(self.state, UnitState::Moving | UnitState::Turning),
                },
            );
        }

        if let Some(angle) = self.turn_angles.pop_front() {
            self.state = UnitState::Turning;
            self.angle = angle;
            if self.turn_angles.is_empty() {
                self.state = UnitState::Moving;
            } else {
                self.advance_animation();
            }
        }

        if self.state == UnitState::Moving {
            self.step_towards(head.goal);
        }
        Ok(())
    }

    /// Moves due incoming orders into the queue.
    ///
    /// Countdowns are computed first and the queue updated afterwards, so an
    /// order never observes a half-updated buffer.
    fn promote_incoming_orders(&mut self) {
        let (due, waiting): (Vec<IncomingOrder>, Vec<IncomingOrder>) = self
            .incoming
            .iter()
            .map(|order| IncomingOrder {
                countdown: order.countdown - 1,
                ..*order
            })
            .partition(|order| order.countdown <= 0);
        self.incoming = waiting;

        for order in due {
            let leg = Order {
                goal: order.target,
                countdown: 0,
                needs_path: true,
                origin_click: None,
            };
            if order.kind == OrderKind::Queued && !self.queue.is_empty() {
                self.queue.push_back(Order {
                    countdown: self.tuning.queue_delay,
                    ..leg
                });
            } else {
                self.queue.clear();
                self.queue.push_back(leg);
            }
        }
    }

    fn adopt_path(&mut self, path: &Path, clicked: Vec2, out_events: &mut Vec<Event>) {
        let points = path.points();
        let already_there = points
            .first()
            .map_or(true, |goal| goal.distance(self.position) < SMALL_NUMBER);

        if already_there {
            // Turn to face the click without walking anywhere.
            self.turn_angles = plan_turn(
                &self.tuning,
                TurnRequest {
                    position: self.position,
                    angle: self.angle,
                    goal: clicked,
                    origin_click: None,
                    already_moving: matches!(self.state, UnitState::Moving | UnitState::Turning),
                },
            );
            if let Some(head) = self.queue.front_mut() {
                *head = Order {
                    goal: self.position,
                    countdown: -2,
                    needs_path: false,
                    origin_click: None,
                };
            }
            return;
        }

        let _ = self.queue.pop_front();
        let legs = points.len().saturating_sub(1);
        for waypoint in &points[..legs] {
            self.queue.push_front(Order {
                goal: *waypoint,
                countdown: 0,
                needs_path: false,
                origin_click: Some(clicked),
            });
        }
        if let Some(head) = self.queue.front_mut() {
            head.countdown = -1;
        }
        out_events.push(Event::PathPlanned {
            waypoints: path.travel_order().collect(),
        });
    }

    fn step_towards(&mut self, goal: Vec2) {
        let offset = goal - self.position;
        let distance = offset.length();
        let speed = self.tuning.speed_at(self.animation_index);
        if distance <= speed {
            self.position = goal;
            let _ = self.queue.pop_front();
            self.state = UnitState::Arrived;
        } else {
            self.position += offset / distance * speed;
        }
        self.advance_animation();
    }

    fn advance_animation(&mut self) {
        self.animation_index = self.tuning.next_animation_index(self.animation_index);
    }

    fn clear_orders(&mut self) {
        self.incoming.clear();
        self.queue.clear();
        self.turn_angles.clear();
        self.animation_index = 0;
    }

    fn relocate(&mut self, destination: Vec2, out_events: &mut Vec<Event>) {
        let from = self.position;
        self.clear_orders();
        self.position = destination;
        self.state = UnitState::Idle;
        out_events.push(Event::UnitTeleported {
            from,
            to: destination,
        });
    }

    fn revive_at(&mut self, revive: Vec2, out_events: &mut Vec<Event>) {
        self.clear_orders();
        if self.selected {
            self.selected = false;
            out_events.push(Event::SelectionChanged { selected: false });
        }
        self.position = revive;
        self.angle = 0.0;
        self.state = UnitState::Idle;
        info!(position = ?revive, lives = self.lives, "unit revived");
        out_events.push(Event::UnitRevived { position: revive });
    }

    fn die(&mut self, out_events: &mut Vec<Event>) {
        self.clear_orders();
        if self.selected {
            self.selected = false;
            out_events.push(Event::SelectionChanged { selected: false });
        }
        self.state = UnitState::Dead;
        info!(position = ?self.position, "unit is out of lives");
    }

    fn check_kill_boxes(&mut self, boxes: &[Aabb], revive: Vec2, out_events: &mut Vec<Event>) {
        if self.state == UnitState::Dead {
            return;
        }
        let footprint = self.bounding_box();
        if !boxes.iter().any(|area| area.overlaps(&footprint)) {
            return;
        }
        self.lives = self.lives.saturating_sub(1);
        info!(position = ?self.position, lives = self.lives, "unit killed");
        out_events.push(Event::UnitKilled {
            position: self.position,
            lives_remaining: self.lives,
        });
        out_events.push(Event::LivesChanged { lives: self.lives });
        if self.lives > 0 {
            self.revive_at(revive, out_events);
        } else {
            self.die(out_events);
        }
    }

    fn grant_lives(&mut self, count: u32, revive: Vec2, out_events: &mut Vec<Event>) {
        if count == 0 {
            return;
        }
        self.lives = self.lives.saturating_add(count);
        out_events.push(Event::LivesChanged { lives: self.lives });
        if self.state == UnitState::Dead {
            self.revive_at(revive, out_events);
        }
    }

    fn set_lives(&mut self, count: u32, revive: Vec2, out_events: &mut Vec<Event>) {
        if count == self.lives {
            return;
        }
        self.lives = count;
        out_events.push(Event::LivesChanged { lives: count });
        match (count, self.state) {
            (0, UnitState::Dead) => {}
            (0, _) => self.die(out_events),
            (_, UnitState::Dead) => self.revive_at(revive, out_events),
            _ => {}
        }
    }
}
