// Copyright 2023 the Sill Authors
// SPDX-License-Identifier: Apache-2.0

//! Manager-level event demultiplexing.

use x11rb::protocol::xproto::{
    ButtonPressEvent, ButtonReleaseEvent, ConfigureNotifyEvent, FocusOutEvent, NotifyDetail,
    NotifyMode, Property, PropertyNotifyEvent,
};
use x11rb::protocol::Event;

use crate::geometry::Rect;
use crate::tests::harness::{test_atoms, Harness, TestWindow};

fn button_event(frame: u32, button: u8, pos: (i16, i16), time: u32) -> ButtonPressEvent {
    ButtonPressEvent {
        response_type: x11rb::protocol::xproto::BUTTON_PRESS_EVENT,
        detail: button,
        sequence: 0,
        time,
        root: 1,
        event: frame,
        child: 0,
        root_x: pos.0,
        root_y: pos.1,
        event_x: 0,
        event_y: 0,
        state: 0,
        same_screen: true,
    }
}

fn property_event(window: u32, atom: u32) -> PropertyNotifyEvent {
    PropertyNotifyEvent {
        response_type: x11rb::protocol::xproto::PROPERTY_NOTIFY_EVENT,
        sequence: 0,
        window,
        atom,
        time: 0,
        state: Property::NEW_VALUE,
    }
}

#[test]
fn button_press_routes_to_the_frame_mixer() {
    let harness = Harness::new();
    let win = TestWindow::new(2);
    let window = harness.add_window(&win);
    window.update_decoration_position();
    let frame = window.frame();

    let press = button_event(frame, 1, (90, 65), 100);
    harness.manager.handle_event_before(&Event::ButtonPress(press));

    // The top-left resize edge answered with a move-resize request.
    assert_eq!(harness.screen.move_resizes.borrow().len(), 1);
}

#[test]
fn release_outside_any_frame_reaches_the_grabbed_mixer() {
    let harness = Harness::new();
    let win = TestWindow::new(3);
    let window = harness.add_window(&win);
    window.update_decoration_position();
    let frame = window.frame();

    let press = button_event(frame, 1, (300, 80), 100);
    harness.manager.handle_event_before(&Event::ButtonPress(press));
    assert!(window
        .input_mixer()
        .map(|m| m.borrow().grabbed())
        .unwrap_or(false));

    // The release arrives on an unrelated window.
    let release: ButtonReleaseEvent = button_event(0xdead, 1, (500, 500), 200);
    harness
        .manager
        .handle_event_before(&Event::ButtonRelease(release));

    assert!(!window.input_mixer().expect("mixer").borrow().grabbed());
}

#[test]
fn focus_grab_out_cancels_the_implicit_grab() {
    let harness = Harness::new();
    let win = TestWindow::new(4);
    let window = harness.add_window(&win);
    window.update_decoration_position();
    let frame = window.frame();

    let press = button_event(frame, 1, (300, 80), 100);
    harness.manager.handle_event_before(&Event::ButtonPress(press));

    let focus_out = FocusOutEvent {
        response_type: x11rb::protocol::xproto::FOCUS_OUT_EVENT,
        detail: NotifyDetail::NONLINEAR,
        sequence: 0,
        event: win.id,
        mode: NotifyMode::GRAB,
    };
    harness.manager.handle_event_before(&Event::FocusOut(focus_out));

    assert!(!window.input_mixer().expect("mixer").borrow().grabbed());
}

#[test]
fn frame_events_are_ignored_while_scale_is_active() {
    let harness = Harness::new();
    let win = TestWindow::new(5);
    let window = harness.add_window(&win);
    window.update_decoration_position();
    harness.screen.scale_active.set(true);

    let press = button_event(window.frame(), 1, (90, 65), 100);
    harness.manager.handle_event_before(&Event::ButtonPress(press));

    assert!(harness.screen.move_resizes.borrow().is_empty());
}

#[test]
fn active_window_property_flips_the_flags() {
    let harness = Harness::new();
    let first = TestWindow::new(6);
    let second = TestWindow::new(7);
    let window_a = harness.add_window(&first);
    let window_b = harness.add_window(&second);

    harness.screen.active.set(6);
    harness
        .manager
        .handle_event_after(&Event::PropertyNotify(property_event(
            1,
            test_atoms().net_active_window,
        )));
    assert!(window_a.is_active());
    assert!(!window_b.is_active());

    harness.screen.active.set(7);
    harness
        .manager
        .handle_event_after(&Event::PropertyNotify(property_event(
            1,
            test_atoms().net_active_window,
        )));
    assert!(!window_a.is_active());
    assert!(window_b.is_active());
}

#[test]
fn title_property_updates_the_window_title() {
    let harness = Harness::new();
    let win = TestWindow::new(8);
    let window = harness.add_window(&win);

    let atoms = test_atoms();
    harness
        .screen
        .string_props
        .borrow_mut()
        .insert((8, atoms.net_wm_name), "Text Editor".into());
    harness
        .manager
        .handle_event_after(&Event::PropertyNotify(property_event(8, atoms.net_wm_name)));

    assert_eq!(window.title(), "Text Editor");
}

#[test]
fn configure_notify_reruns_update() {
    let harness = Harness::new();
    let win = TestWindow::new(9);
    let window = harness.add_window(&win);
    assert_ne!(window.frame(), 0);

    // Maximize out-of-band, then tell the manager the window changed.
    win.state.set(crate::MAXIMIZE_STATE);
    win.geometry.set(Rect::new(0, 0, 1920, 1080));
    let configure = ConfigureNotifyEvent {
        response_type: x11rb::protocol::xproto::CONFIGURE_NOTIFY_EVENT,
        sequence: 0,
        event: 9,
        window: 9,
        above_sibling: 0,
        x: 0,
        y: 0,
        width: 1920,
        height: 1080,
        border_width: 0,
        override_redirect: false,
    };
    harness
        .manager
        .handle_event_after(&Event::ConfigureNotify(configure));

    assert_eq!(window.frame(), 0);
    assert!(window.elements().is_empty());
}

#[test]
fn force_quit_message_is_consumed() {
    let harness = Harness::new();
    let win = TestWindow::new(10);
    let window = harness.add_window(&win);

    let atoms = test_atoms();
    let show = crate::wire::client_message(
        10,
        atoms.toolkit_action,
        [atoms.toolkit_action_force_quit_dialog, 4242, 1, 0, 0],
    );
    assert!(harness
        .manager
        .handle_event_before(&Event::ClientMessage(show)));
    assert!(window.has_force_quit_dialog());

    let hide = crate::wire::client_message(
        10,
        atoms.toolkit_action,
        [atoms.toolkit_action_force_quit_dialog, 4243, 0, 0, 0],
    );
    assert!(harness
        .manager
        .handle_event_before(&Event::ClientMessage(hide)));
    assert!(!window.has_force_quit_dialog());
}

#[test]
fn frame_extents_client_message_writes_the_property() {
    let harness = Harness::new();
    let win = TestWindow::new(11);
    win.viewable.set(false);
    harness.add_window(&win);

    let atoms = test_atoms();
    let request = crate::wire::client_message(11, atoms.net_request_frame_extents, [0u32; 5]);
    harness
        .manager
        .handle_event_before(&Event::ClientMessage(request));

    assert_eq!(
        harness
            .screen
            .cardinal_props
            .borrow()
            .get(&(11, atoms.net_frame_extents)),
        Some(&vec![1, 1, 28, 1])
    );
}

#[test]
fn unhandled_windows_are_forgotten() {
    let harness = Harness::new();
    let win = TestWindow::new(12);
    let window = harness.add_window(&win);
    let frame = window.frame();
    assert!(harness.manager.window_by_frame(frame).is_some());

    harness.manager.unhandle_window(12);
    assert!(harness.manager.window_by_xid(12).is_none());
    assert!(harness.manager.window_by_frame(frame).is_none());
    // The frame window was destroyed with it.
    assert!(harness.screen.frames.borrow().is_empty());
}

#[test]
fn supported_atoms_are_advertised() {
    let harness = Harness::new();
    let mut atoms = Vec::new();
    harness.manager.add_supported_atoms(&mut atoms);
    let expected = test_atoms();
    assert!(atoms.contains(&expected.gtk_border_radius));
    assert!(atoms.contains(&expected.net_request_frame_extents));
}
