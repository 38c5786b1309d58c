// Copyright 2023 the Sill Authors
// SPDX-License-Identifier: Apache-2.0

//! Pointer gestures on the resize and grab edges.

use std::time::{Duration, Instant};

use crate::compositor::{MoveResizeDirection, MAXIMIZE_STATE};
use crate::geometry::Point;
use crate::tests::harness::{Harness, TestWindow};

/// Default harness window: geometry (100, 100, 800, 600), border extents
/// (1, 1, 28, 1), input extents (11, 11, 38, 11). The grab edge covers
/// (100, 72)–(900, 100); the top-left corner edge starts at (89, 62).

#[test]
fn corner_drag_sends_one_top_left_resize() {
    let harness = Harness::new();
    let win = TestWindow::new(2);
    let window = harness.add_window(&win);
    window.update_decoration_position();

    let mixer = window.input_mixer().expect("decorated window has a mixer");
    let p = Point::new(90, 65);
    mixer.borrow_mut().enter_event(p);
    mixer.borrow_mut().button_down_event(p, 1, 100);

    {
        let requests = harness.screen.move_resizes.borrow();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].direction, MoveResizeDirection::SizeTopLeft);
        assert_eq!((requests[0].root_x, requests[0].root_y), (90, 65));
        assert_eq!(requests[0].button, 1);
        assert_eq!(requests[0].window, 2);
    }

    // No further messages until the release.
    mixer.borrow_mut().motion_event(Point::new(88, 63), 120);
    mixer.borrow_mut().button_up_event(Point::new(88, 63), 1, 140);
    assert_eq!(harness.screen.move_resizes.borrow().len(), 1);
}

#[test]
fn double_click_maximizes_exactly_once() {
    let harness = Harness::new();
    let win = TestWindow::new(3);
    let window = harness.add_window(&win);
    window.update_decoration_position();

    let mixer = window.input_mixer().expect("mixer");
    let p = Point::new(300, 80);

    mixer.borrow_mut().enter_event(p);
    mixer.borrow_mut().button_down_event(p, 1, 0);
    mixer.borrow_mut().button_up_event(p, 1, 50);
    mixer.borrow_mut().button_down_event(p, 1, 100);
    mixer.borrow_mut().button_up_event(p, 1, 120);

    assert_eq!(*win.maximize_calls.borrow(), vec![MAXIMIZE_STATE]);
    assert!(harness.screen.move_resizes.borrow().is_empty());
}

#[test]
fn held_press_promotes_to_move_after_grab_wait() {
    let harness = Harness::new();
    let win = TestWindow::new(4);
    let window = harness.add_window(&win);
    window.update_decoration_position();

    let p = Point::new(300, 80);
    harness.screen.pointer.set(p);

    let mixer = window.input_mixer().expect("mixer");
    mixer.borrow_mut().enter_event(p);
    mixer.borrow_mut().button_down_event(p, 1, 0);
    // Motions that stay on the click point must not promote early.
    mixer.borrow_mut().motion_event(p, 50);
    mixer.borrow_mut().motion_event(p, 150);
    assert!(harness.screen.move_resizes.borrow().is_empty());

    // The grab-wait timer (150 ms by default) fires and promotes.
    harness
        .manager
        .run_timers(Instant::now() + Duration::from_millis(400));

    {
        let requests = harness.screen.move_resizes.borrow();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].direction, MoveResizeDirection::Move);
        assert_eq!(requests[0].button, 1);
    }

    mixer.borrow_mut().button_up_event(p, 1, 200);
    assert_eq!(harness.screen.move_resizes.borrow().len(), 1);
    assert!(win.maximize_calls.borrow().is_empty());
}

#[test]
fn motion_past_the_slop_promotes_immediately() {
    let harness = Harness::new();
    let win = TestWindow::new(5);
    let window = harness.add_window(&win);
    window.update_decoration_position();

    let p = Point::new(300, 80);
    let mixer = window.input_mixer().expect("mixer");
    mixer.borrow_mut().enter_event(p);
    mixer.borrow_mut().button_down_event(p, 1, 0);
    mixer.borrow_mut().motion_event(Point::new(320, 80), 30);

    let requests = harness.screen.move_resizes.borrow();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].direction, MoveResizeDirection::Move);
    assert_eq!((requests[0].root_x, requests[0].root_y), (320, 80));
}

#[test]
fn middle_click_runs_the_bound_action() {
    // The default binding for the middle click is "lower".
    let harness = Harness::new();
    let win = TestWindow::new(6);
    let window = harness.add_window(&win);
    window.update_decoration_position();

    let p = Point::new(300, 80);
    let mixer = window.input_mixer().expect("mixer");
    mixer.borrow_mut().enter_event(p);
    mixer.borrow_mut().button_down_event(p, 2, 0);
    mixer.borrow_mut().button_up_event(p, 2, 20);

    assert_eq!(win.lower_calls.get(), 1);
    assert!(harness.screen.window_menus.borrow().is_empty());
    assert!(harness.screen.move_resizes.borrow().is_empty());
}

#[test]
fn edge_hover_sets_and_restores_the_cursor() {
    let harness = Harness::new();
    let win = TestWindow::new(7);
    let window = harness.add_window(&win);
    window.update_decoration_position();

    let mixer = window.input_mixer().expect("mixer");
    mixer.borrow_mut().enter_event(Point::new(90, 65));
    mixer.borrow_mut().leave_event(Point::new(0, 0));

    let cursors = harness.screen.cursors.borrow();
    assert_eq!(cursors.len(), 2);
    assert!(cursors[0].1.is_some());
    assert_eq!(cursors[1].1, None);
}

#[test]
fn close_button_closes_on_release() {
    let harness = Harness::new();
    let win = TestWindow::new(8);
    let window = harness.add_window(&win);
    window.update_decoration_position();

    // The close button is the first child of the top layout, placed at the
    // layout's left padding.
    let mixer = window.input_mixer().expect("mixer");
    let p = Point::new(102, 80);
    mixer.borrow_mut().enter_event(p);
    mixer.borrow_mut().button_down_event(p, 1, 10);
    assert!(win.close_calls.borrow().is_empty());
    mixer.borrow_mut().button_up_event(p, 1, 30);

    assert_eq!(*win.close_calls.borrow(), vec![30]);
}

#[test]
fn pressed_button_released_outside_does_nothing() {
    let harness = Harness::new();
    let win = TestWindow::new(9);
    let window = harness.add_window(&win);
    window.update_decoration_position();

    let mixer = window.input_mixer().expect("mixer");
    let p = Point::new(102, 80);
    mixer.borrow_mut().enter_event(p);
    mixer.borrow_mut().button_down_event(p, 1, 10);
    // Drag far away; the implicit grab keeps routing to the button.
    mixer.borrow_mut().motion_event(Point::new(500, 400), 20);
    mixer.borrow_mut().button_up_event(Point::new(500, 400), 1, 30);

    assert!(win.close_calls.borrow().is_empty());
}
