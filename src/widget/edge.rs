// Copyright 2023 the Sill Authors
// SPDX-License-Identifier: Apache-2.0

//! Resize edges and the title-strip grab edge.

use std::cell::RefCell;
use std::rc::Rc;
use std::time::Duration;

use crate::compositor::{
    CursorShape, HostWindowRef, MoveResizeDirection, MoveResizeRequest, ScreenRef, Timestamp,
    WindowActions, WindowState, MAXIMIZE_STATE,
};
use crate::debug::DebugState;
use crate::geometry::Point;
use crate::style::{Style, WmAction, WmEvent};
use crate::timers::{TimerQueue, TimerToken};
use crate::widget::{ItemCore, Widget};

/// The nine edge slots. `Grab` is always the last, explicit slot.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EdgeKind {
    Top,
    TopLeft,
    TopRight,
    Left,
    Right,
    Bottom,
    BottomLeft,
    BottomRight,
    Grab,
}

impl EdgeKind {
    pub const RESIZE_KINDS: [EdgeKind; 8] = [
        EdgeKind::Top,
        EdgeKind::TopLeft,
        EdgeKind::TopRight,
        EdgeKind::Left,
        EdgeKind::Right,
        EdgeKind::Bottom,
        EdgeKind::BottomLeft,
        EdgeKind::BottomRight,
    ];

    pub fn direction(self) -> MoveResizeDirection {
        match self {
            EdgeKind::Top => MoveResizeDirection::SizeTop,
            EdgeKind::TopLeft => MoveResizeDirection::SizeTopLeft,
            EdgeKind::TopRight => MoveResizeDirection::SizeTopRight,
            EdgeKind::Left => MoveResizeDirection::SizeLeft,
            EdgeKind::Right => MoveResizeDirection::SizeRight,
            EdgeKind::Bottom => MoveResizeDirection::SizeBottom,
            EdgeKind::BottomLeft => MoveResizeDirection::SizeBottomLeft,
            EdgeKind::BottomRight => MoveResizeDirection::SizeBottomRight,
            EdgeKind::Grab => MoveResizeDirection::Move,
        }
    }

    pub fn cursor_shape(self) -> CursorShape {
        match self {
            EdgeKind::Top => CursorShape::TopSide,
            EdgeKind::TopLeft => CursorShape::TopLeftCorner,
            EdgeKind::TopRight => CursorShape::TopRightCorner,
            EdgeKind::Left => CursorShape::LeftSide,
            EdgeKind::Right => CursorShape::RightSide,
            EdgeKind::Bottom => CursorShape::BottomSide,
            EdgeKind::BottomLeft => CursorShape::BottomLeftCorner,
            EdgeKind::BottomRight => CursorShape::BottomRightCorner,
            EdgeKind::Grab => CursorShape::LeftPtr,
        }
    }

    fn name(self) -> &'static str {
        match self {
            EdgeKind::Top => "TopEdge",
            EdgeKind::TopLeft => "TopLeftEdge",
            EdgeKind::TopRight => "TopRightEdge",
            EdgeKind::Left => "LeftEdge",
            EdgeKind::Right => "RightEdge",
            EdgeKind::Bottom => "BottomEdge",
            EdgeKind::BottomLeft => "BottomLeftEdge",
            EdgeKind::BottomRight => "BottomRightEdge",
            EdgeKind::Grab => "GrabEdge",
        }
    }
}

/// One resize edge: sets the matching cursor on hover and turns a
/// button-down into a `_NET_WM_MOVERESIZE` request.
pub struct Edge {
    core: ItemCore,
    screen: ScreenRef,
    win: HostWindowRef,
    kind: EdgeKind,
}

impl Edge {
    pub fn new(screen: ScreenRef, win: HostWindowRef, kind: EdgeKind) -> Edge {
        let mut core = ItemCore::default();
        let mask = if kind == EdgeKind::Grab {
            WindowActions::MOVE
        } else {
            WindowActions::RESIZE
        };
        core.sensitive = win.actions().intersects(mask);
        Edge {
            core,
            screen,
            win,
            kind,
        }
    }

    pub fn kind(&self) -> EdgeKind {
        self.kind
    }

    pub fn window(&self) -> &HostWindowRef {
        &self.win
    }

    fn send_move_resize(&self, p: Point, button: u8) {
        self.screen.send_move_resize(MoveResizeRequest {
            window: self.win.id(),
            root_x: p.x,
            root_y: p.y,
            direction: self.kind.direction(),
            button,
        });
    }

    fn hover_changed(&self, over: bool) {
        let cursor = over.then(|| self.screen.cursor_cache(self.kind.cursor_shape()));
        self.screen.define_cursor(self.win.frame(), cursor);
    }
}

impl Widget for Edge {
    fn core(&self) -> &ItemCore {
        &self.core
    }

    fn core_mut(&mut self) -> &mut ItemCore {
        &mut self.core
    }

    fn name(&self) -> &'static str {
        self.kind.name()
    }

    fn mouse_owner_changed(&mut self, owner: bool) {
        self.hover_changed(owner);
    }

    fn button_down(&mut self, p: Point, button: u8, _time: Timestamp) {
        self.send_move_resize(p, button);
    }
}

/// Applies a bound window-manager action to a window.
pub(crate) fn apply_wm_action(
    screen: &ScreenRef,
    win: &HostWindowRef,
    action: WmAction,
    p: Point,
    button: u8,
    time: Timestamp,
) {
    let state = win.state();
    let actions = win.actions();
    match action {
        WmAction::None => {}
        WmAction::ToggleShade => {
            if actions.contains(WindowActions::SHADE) {
                win.shade(!state.contains(WindowState::SHADED));
            }
        }
        WmAction::ToggleMaximize => {
            if state.contains(MAXIMIZE_STATE) {
                win.maximize(WindowState::empty());
            } else if actions.intersects(WindowActions::MAXIMIZE) {
                win.maximize(MAXIMIZE_STATE);
            }
        }
        WmAction::ToggleMaximizeHorizontally => {
            if actions.contains(WindowActions::MAXIMIZE_HORZ) {
                if state.contains(WindowState::MAXIMIZED_HORZ) {
                    win.maximize(WindowState::empty());
                } else {
                    win.maximize(WindowState::MAXIMIZED_HORZ);
                }
            }
        }
        WmAction::ToggleMaximizeVertically => {
            if actions.contains(WindowActions::MAXIMIZE_VERT) {
                if state.contains(WindowState::MAXIMIZED_VERT) {
                    win.maximize(WindowState::empty());
                } else {
                    win.maximize(WindowState::MAXIMIZED_VERT);
                }
            }
        }
        WmAction::Minimize => {
            if actions.contains(WindowActions::MINIMIZE) {
                win.minimize();
            }
        }
        WmAction::Shade => {
            if actions.contains(WindowActions::SHADE) {
                win.shade(true);
            }
        }
        WmAction::Menu => {
            screen.show_window_menu(win.id(), button, time, p);
        }
        WmAction::Lower => {
            win.lower();
        }
    }
}

/// The move/grab edge over the title area.
///
/// Button-1 runs a small state machine: a second click within the
/// double-click bounds invokes the bound action; otherwise a grab-wait
/// timer (or a motion beyond the click slop) promotes the press to a
/// window-manager move.
pub struct GrabEdge {
    edge: Edge,
    timers: Rc<RefCell<TimerQueue>>,
    last_click_time: Timestamp,
    last_click_pos: Point,
    button_down: Option<u8>,
    timer: Option<TimerToken>,
    /// Wait out the grab timer even for non-maximizable windows; used when
    /// the edge is embedded in a menu entry.
    always_wait_grab_timeout: bool,
}

impl GrabEdge {
    pub fn new(
        screen: ScreenRef,
        win: HostWindowRef,
        timers: Rc<RefCell<TimerQueue>>,
        always_wait_grab_timeout: bool,
    ) -> GrabEdge {
        GrabEdge {
            edge: Edge::new(screen, win, EdgeKind::Grab),
            timers,
            last_click_time: 0,
            last_click_pos: Point::ZERO,
            button_down: None,
            timer: None,
            always_wait_grab_timeout,
        }
    }

    pub fn is_maximizable(&self) -> bool {
        self.edge.win.actions().intersects(WindowActions::MAXIMIZE)
    }

    /// Whether the grab-wait timer is still pending (the press has neither
    /// promoted to a move nor been released).
    pub fn is_pending(&self) -> bool {
        self.timer.is_some()
    }

    pub fn button_pressed(&self) -> Option<u8> {
        self.button_down
    }

    pub fn clicked_point(&self) -> Point {
        self.last_click_pos
    }

    /// Routes a fired timer token; promotes to a move when it is ours.
    pub fn timer_fired(&mut self, token: TimerToken) -> bool {
        if self.timer != Some(token) {
            return false;
        }
        self.timer = None;
        let pointer = self.edge.screen.pointer_position();
        self.edge
            .send_move_resize(pointer, self.button_down.unwrap_or(1));
        true
    }

    fn cancel_timer(&mut self) {
        self.timer = None;
    }
}

impl Widget for GrabEdge {
    fn core(&self) -> &ItemCore {
        &self.edge.core
    }

    fn core_mut(&mut self) -> &mut ItemCore {
        &mut self.edge.core
    }

    fn name(&self) -> &'static str {
        "GrabEdge"
    }

    fn mouse_owner_changed(&mut self, owner: bool) {
        self.edge.hover_changed(owner);
    }

    fn button_down(&mut self, p: Point, button: u8, time: Timestamp) {
        let style = Style::get();

        if button != 1 {
            let event = match button {
                2 => Some(WmEvent::MiddleClick),
                3 => Some(WmEvent::RightClick),
                _ => None,
            };
            if let Some(event) = event {
                let action = style.window_manager_action(event);
                if action == WmAction::None && button == 3 {
                    self.edge
                        .screen
                        .show_window_menu(self.edge.win.id(), button, time, p);
                } else {
                    apply_wm_action(&self.edge.screen, &self.edge.win, action, p, button, time);
                }
            }
            return;
        }

        if !self.is_maximizable() && !self.always_wait_grab_timeout {
            self.edge.send_move_resize(p, button);
            return;
        }

        let max_time_delta = style.double_click_max_time_delta();
        let mut double_click = false;

        if time.wrapping_sub(self.last_click_time) < max_time_delta {
            let max_distance = style.double_click_max_distance();
            if (p.x - self.last_click_pos.x).abs() < max_distance
                && (p.y - self.last_click_pos.y).abs() < max_distance
            {
                apply_wm_action(
                    &self.edge.screen,
                    &self.edge.win,
                    style.window_manager_action(WmEvent::DoubleClick),
                    p,
                    button,
                    time,
                );
                double_click = true;
                self.cancel_timer();
            }
        }

        if !double_click {
            let deadline = Duration::from_millis(style.grab_wait() as u64);
            self.timer = Some(self.timers.borrow_mut().schedule_in(deadline));
        }

        self.button_down = Some(button);
        self.last_click_pos = p;
        self.last_click_time = time;
    }

    fn motion(&mut self, p: Point, _time: Timestamp) {
        if self.timer.is_none() {
            return;
        }
        let slop = Style::get().double_click_max_distance();
        if (p.x - self.last_click_pos.x).abs() >= slop
            || (p.y - self.last_click_pos.y).abs() >= slop
        {
            self.cancel_timer();
            self.edge.send_move_resize(p, self.button_down.unwrap_or(1));
        }
    }

    fn button_up(&mut self, _p: Point, _button: u8, _time: Timestamp) {
        self.cancel_timer();
        self.button_down = None;
    }

    fn debug_state(&self) -> DebugState {
        let mut state = self.edge.debug_state();
        state.display_name = "GrabEdge".into();
        state.add(
            "button_down",
            self.button_down.map(i32::from).unwrap_or(-1),
        );
        state.add("maximizable", self.is_maximizable());
        state.add("always_wait_grab_timeout", self.always_wait_grab_timeout);
        state
    }
}
