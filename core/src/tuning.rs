use serde::{Deserialize, Serialize};

use crate::PLAYER_RADIUS;

/// Adjustable movement and input constants.
///
/// Every field has a default, so configuration files only need to name the
/// values they override.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Tuning {
    /// Per-frame movement speeds cycled through while walking.
    pub move_cycle: Vec<u32>,
    /// Degrees rotated per turning frame.
    pub turn_speed: f32,
    /// Turns at or below this many degrees are free while already moving.
    pub moving_turn_discount: f32,
    /// Upper bounds in degrees for each additional turning frame.
    pub turn_frame_thresholds: Vec<f32>,
    /// Ticks between a click and the unit acting on it.
    pub move_delay: i32,
    /// Extra ticks before a queued order starts after the previous one.
    pub queue_delay: i32,
    /// Maximum number of queued orders.
    pub max_orders: usize,
    /// Distance within which a new order repeats the current destination.
    pub click_deadzone: f32,
    /// Margin around the unit inside which orders are ignored.
    pub hitbox_deadzone_buffer: f32,
    /// Margin around the unit that still counts as clicking it.
    pub click_selection_buffer: f32,
    /// Minimum drag distance that turns a click into a box selection.
    pub drag_threshold: f32,
    /// Half the unit's square footprint, slightly shrunk below a cell.
    pub unit_half_width: f32,
}

impl Default for Tuning {
    fn default() -> Self {
        Self {
            move_cycle: vec![2, 8, 9, 5, 6, 7, 2],
            turn_speed: 40.0,
            moving_turn_discount: 40.0,
            turn_frame_thresholds: vec![80.0, 120.0, 160.0],
            move_delay: 4,
            queue_delay: 1,
            max_orders: 32,
            click_deadzone: 4.0,
            hitbox_deadzone_buffer: 4.0,
            click_selection_buffer: 8.0,
            drag_threshold: 4.0,
            unit_half_width: PLAYER_RADIUS - crate::UNIT_RADIUS_EPS,
        }
    }
}

impl Tuning {
    /// Speed for the given animation frame, wrapping around the cycle.
    #[must_use]
    pub fn speed_at(&self, animation_index: usize) -> f32 {
        if self.move_cycle.is_empty() {
            return 0.0;
        }
        self.move_cycle[animation_index % self.move_cycle.len()] as f32
    }

    /// Animation frame that follows `animation_index`.
    #[must_use]
    pub fn next_animation_index(&self, animation_index: usize) -> usize {
        (animation_index + 1) % self.move_cycle.len().max(1)
    }

    /// Number of turning frames needed to cover `degrees`, ignoring the moving discount.
    #[must_use]
    pub fn turn_frames_for(&self, degrees: f32) -> u32 {
        1 + self
            .turn_frame_thresholds
            .iter()
            .filter(|threshold| degrees > **threshold)
            .count() as u32
    }
}
