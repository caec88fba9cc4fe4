use openbound_core::{Command, Tuning, Vec2};
use openbound_system_control::{Control, ControlInput};

fn control() -> Control {
    Control::new(&Tuning::default())
}

#[test]
fn short_drag_is_a_click_on_the_release_point() {
    let mut out = Vec::new();
    control().handle(
        &ControlInput {
            left_release: Some((Vec2::new(10.0, 10.0), Vec2::new(12.0, 12.0))),
            ..ControlInput::default()
        },
        &mut out,
    );
    assert_eq!(
        out,
        vec![Command::SelectAt {
            point: Vec2::new(12.0, 12.0),
        }]
    );
}

#[test]
fn long_drag_selects_by_box() {
    let mut out = Vec::new();
    control().handle(
        &ControlInput {
            left_release: Some((Vec2::new(10.0, 10.0), Vec2::new(14.0, 10.0))),
            ..ControlInput::default()
        },
        &mut out,
    );
    assert_eq!(
        out,
        vec![Command::SelectInBox {
            corner_a: Vec2::new(10.0, 10.0),
            corner_b: Vec2::new(14.0, 10.0),
        }]
    );
}

#[test]
fn right_click_orders_follow_selection() {
    let mut out = Vec::new();
    control().handle(
        &ControlInput {
            left_release: Some((Vec2::new(10.0, 10.0), Vec2::new(10.0, 10.0))),
            right_click: Some(Vec2::new(80.0, 40.0)),
            shift_held: true,
        },
        &mut out,
    );
    assert_eq!(
        out,
        vec![
            Command::SelectAt {
                point: Vec2::new(10.0, 10.0),
            },
            Command::IssueOrder {
                target: Vec2::new(80.0, 40.0),
                queued: true,
            },
        ]
    );
}

#[test]
fn drag_threshold_comes_from_tuning() {
    let tuning = Tuning {
        drag_threshold: 10.0,
        ..Tuning::default()
    };
    let mut out = Vec::new();
    Control::new(&tuning).handle(
        &ControlInput {
            left_release: Some((Vec2::new(0.0, 0.0), Vec2::new(6.0, 6.0))),
            ..ControlInput::default()
        },
        &mut out,
    );
    assert!(matches!(out.as_slice(), [Command::SelectAt { .. }]));
}
