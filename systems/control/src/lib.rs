#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Translates raw pointer input into world commands.

use openbound_core::{Command, Tuning, Vec2};
use serde::{Deserialize, Serialize};

/// Pointer input collected during one frame.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ControlInput {
    /// Press and release positions of a finished left drag.
    pub left_release: Option<(Vec2, Vec2)>,
    /// Position of a right click.
    pub right_click: Option<Vec2>,
    /// Whether shift was held during the right click.
    pub shift_held: bool,
}

/// Stateless mapping from pointer gestures to selection and order commands.
#[derive(Clone, Copy, Debug)]
pub struct Control {
    drag_threshold: f32,
}

impl Control {
    /// Creates the system using the drag threshold from `tuning`.
    #[must_use]
    pub fn new(tuning: &Tuning) -> Self {
        Self {
            drag_threshold: tuning.drag_threshold,
        }
    }

    /// Emits the commands described by one frame of input.
    ///
    /// Selection is resolved before orders so a click-and-order frame acts on
    /// the new selection.
    pub fn handle(&self, input: &ControlInput, out: &mut Vec<Command>) {
        if let Some((pressed, released)) = input.left_release {
            if pressed.distance(released) < self.drag_threshold {
                out.push(Command::SelectAt { point: released });
            } else {
                out.push(Command::SelectInBox {
                    corner_a: pressed,
                    corner_b: released,
                });
            }
        }
        if let Some(target) = input.right_click {
            out.push(Command::IssueOrder {
                target,
                queued: input.shift_held,
            });
        }
    }
}
