use std::collections::VecDeque;

use openbound_core::{angle_clamp, angular_distance, bearing, Tuning, Vec2, SMALL_NUMBER};

/// Inputs needed to plan the rotation towards a waypoint.
#[derive(Clone, Copy, Debug)]
pub(crate) struct TurnRequest {
    pub(crate) position: Vec2,
    pub(crate) angle: f32,
    pub(crate) goal: Vec2,
    pub(crate) origin_click: Option<Vec2>,
    pub(crate) already_moving: bool,
}

/// Per-frame facing angles ending exactly on the bearing to the goal.
pub(crate) fn plan_turn(tuning: &Tuning, request: TurnRequest) -> VecDeque<f32> {
    let start = request.angle;
    let goal_angle = bearing(request.position, request.goal);
    let delta = angular_distance(start, goal_angle);
    let frames = turn_frames(tuning, delta, request.already_moving);

    let clockwise_end = angle_clamp(start - delta);
    let counter_end = angle_clamp(start + delta);
    let clockwise_gap = angular_distance(clockwise_end, goal_angle);
    let counter_gap = angular_distance(counter_end, goal_angle);

    // Ties happen when clicking against a wall; lean towards the click.
    let clockwise = match request.origin_click {
        Some(click) if (clockwise_gap - counter_gap).abs() < SMALL_NUMBER => {
            let click_angle = bearing(request.position, click);
            angular_distance(angle_clamp(start - 1.0), click_angle)
                < angular_distance(angle_clamp(start + 1.0), click_angle)
        }
        _ => clockwise_gap < counter_gap,
    };
    let direction = if clockwise { -1.0 } else { 1.0 };
    let step = tuning.turn_speed;

    let mut angles = VecDeque::new();
    if frames > 1 {
        angles.extend((1..=frames).map(|n| angle_clamp(start + direction * n as f32 * step)));
    } else if frames == 1 {
        if delta <= step {
            angles.push_back(goal_angle);
        } else {
            angles.push_back(angle_clamp(start + direction * step));
        }
    }
    angles.push_back(goal_angle);
    angles
}

fn turn_frames(tuning: &Tuning, delta: f32, already_moving: bool) -> u32 {
    let delta = if delta > 180.0 { (delta - 360.0).abs() } else { delta };
    if already_moving && delta <= tuning.moving_turn_discount {
        return 0;
    }
    tuning.turn_frames_for(delta)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(angle: f32, goal: Vec2, already_moving: bool) -> TurnRequest {
        TurnRequest {
            position: Vec2::new(100.0, 100.0),
            angle,
            goal,
            origin_click: None,
            already_moving,
        }
    }

    fn assert_angles(actual: &VecDeque<f32>, expected: &[f32]) {
        assert_eq!(actual.len(), expected.len(), "{actual:?} vs {expected:?}");
        for (a, e) in actual.iter().zip(expected) {
            assert!((a - e).abs() < 1.0e-3, "{actual:?} vs {expected:?}");
        }
    }

    #[test]
    fn small_turn_from_rest_takes_one_frame() {
        let tuning = Tuning::default();
        let angles = plan_turn(&tuning, request(0.0, Vec2::new(200.0, 100.0), false));
        assert_angles(&angles, &[0.0, 0.0]);
    }

    #[test]
    fn small_turn_while_moving_is_immediate() {
        let tuning = Tuning::default();
        let angles = plan_turn(&tuning, request(10.0, Vec2::new(200.0, 100.0), true));
        assert_angles(&angles, &[0.0]);
    }

    #[test]
    fn about_face_rotates_in_forty_degree_steps() {
        let tuning = Tuning::default();
        // Facing north (90) and turning to face south-west (225) is a 135 degree
        // counter-clockwise turn.
        let angles = plan_turn(&tuning, request(90.0, Vec2::new(0.0, 200.0), false));
        assert_angles(&angles, &[130.0, 170.0, 210.0, 225.0]);
    }

    #[test]
    fn clockwise_turns_wrap_through_zero() {
        let tuning = Tuning::default();
        // From 20 degrees to 270 (south) is 110 degrees clockwise.
        let angles = plan_turn(&tuning, request(20.0, Vec2::new(100.0, 200.0), false));
        assert_angles(&angles, &[340.0, 300.0, 270.0]);
    }

    #[test]
    fn ties_lean_towards_the_first_click() {
        let tuning = Tuning::default();
        let mut turn = request(0.0, Vec2::new(0.0, 100.0), false);
        turn.origin_click = Some(Vec2::new(0.0, 120.0));
        let angles = plan_turn(&tuning, turn);
        // The click lies slightly south of due west, so turn clockwise.
        assert_angles(&angles, &[320.0, 280.0, 240.0, 200.0, 180.0]);
    }
}
