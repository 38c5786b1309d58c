// Copyright 2023 the Sill Authors
// SPDX-License-Identifier: Apache-2.0

//! The close/minimize/maximize window buttons.

use std::rc::Rc;

use crate::compositor::{
    GlMatrix, HostWindowRef, PaintAttrib, PaintMask, PaintSink, Timestamp, WindowActions,
    WindowState, MAXIMIZE_STATE,
};
use crate::debug::DebugState;
use crate::geometry::{Point, Region};
use crate::pool::DataPool;
use crate::style::{WidgetState, WindowButtonType};
use crate::widget::{ItemCore, TexturedItem, Widget};

pub struct WindowButton {
    core: ItemCore,
    tex: TexturedItem,
    kind: WindowButtonType,
    pressed: bool,
    /// Still true after the pointer left with the button held, so coming
    /// back re-presses instead of prelighting.
    was_pressed: bool,
    win: HostWindowRef,
    pool: Rc<DataPool>,
}

impl WindowButton {
    pub fn new(win: HostWindowRef, pool: Rc<DataPool>, kind: WindowButtonType) -> WindowButton {
        let mut button = WindowButton {
            core: ItemCore::default(),
            tex: TexturedItem::default(),
            kind,
            pressed: false,
            was_pressed: false,
            win,
            pool,
        };
        button.update_texture();
        button
    }

    pub fn kind(&self) -> WindowButtonType {
        self.kind
    }

    fn current_state(&self) -> WidgetState {
        if self.core.focused {
            if self.core.mouse_owner && self.pressed {
                WidgetState::Pressed
            } else if self.core.mouse_owner && !self.was_pressed {
                WidgetState::Prelight
            } else {
                WidgetState::Normal
            }
        } else if self.core.mouse_owner && self.pressed {
            WidgetState::BackdropPressed
        } else if self.core.mouse_owner && !self.was_pressed {
            WidgetState::BackdropPrelight
        } else {
            WidgetState::Backdrop
        }
    }

    fn update_texture(&mut self) {
        let texture = self
            .pool
            .button_texture(self.core.scale, self.kind, self.current_state());
        self.tex.set_texture(&mut self.core, texture);
    }
}

impl Widget for WindowButton {
    fn core(&self) -> &ItemCore {
        &self.core
    }

    fn core_mut(&mut self) -> &mut ItemCore {
        &mut self.core
    }

    fn name(&self) -> &'static str {
        match self.kind {
            WindowButtonType::Close => "CloseWindowButton",
            WindowButtonType::Minimize => "MinimizeWindowButton",
            WindowButtonType::Maximize => "MaximizeWindowButton",
            WindowButtonType::Unmaximize => "UnmaximizeWindowButton",
        }
    }

    fn mouse_owner_changed(&mut self, _owner: bool) {
        self.update_texture();
    }

    fn focused_changed(&mut self, _focused: bool) {
        self.update_texture();
    }

    fn scale_changed(&mut self, _scale: f64) {
        self.update_texture();
    }

    fn button_down(&mut self, _p: Point, button: u8, _time: Timestamp) {
        if !self.pressed && button <= 3 {
            self.pressed = true;
            self.was_pressed = true;
            self.update_texture();
        }
    }

    fn button_up(&mut self, _p: Point, button: u8, time: Timestamp) {
        if self.pressed && button <= 3 {
            self.pressed = false;
            self.update_texture();

            let actions = self.win.actions();
            let state = self.win.state();
            match self.kind {
                WindowButtonType::Close => {
                    if actions.contains(WindowActions::CLOSE) {
                        self.win.close(time);
                    }
                }
                WindowButtonType::Minimize => {
                    if actions.contains(WindowActions::MINIMIZE) {
                        self.win.minimize();
                    }
                }
                WindowButtonType::Maximize | WindowButtonType::Unmaximize => match button {
                    1 => {
                        if state.intersects(MAXIMIZE_STATE) {
                            self.win.maximize(WindowState::empty());
                        } else if actions.intersects(WindowActions::MAXIMIZE) {
                            self.win.maximize(MAXIMIZE_STATE);
                        }
                    }
                    2 => {
                        if actions.contains(WindowActions::MAXIMIZE_VERT) {
                            if !state.contains(WindowState::MAXIMIZED_VERT) {
                                self.win.maximize(WindowState::MAXIMIZED_VERT);
                            } else {
                                self.win.maximize(WindowState::empty());
                            }
                        }
                    }
                    3 => {
                        if actions.contains(WindowActions::MAXIMIZE_HORZ) {
                            if !state.contains(WindowState::MAXIMIZED_HORZ) {
                                self.win.maximize(WindowState::MAXIMIZED_HORZ);
                            } else {
                                self.win.maximize(WindowState::empty());
                            }
                        }
                    }
                    _ => {}
                },
            }
        }

        self.was_pressed = false;
    }

    fn motion(&mut self, p: Point, _time: Timestamp) {
        if self.pressed {
            if !self.core.geometry().contains(p) {
                self.pressed = false;
                self.update_texture();
            }
        } else if self.was_pressed && self.core.geometry().contains(p) {
            self.pressed = true;
            self.update_texture();
        }
    }

    fn draw(
        &mut self,
        sink: &mut dyn PaintSink,
        transform: &GlMatrix,
        attrib: PaintAttrib,
        clip: &Region,
        mask: PaintMask,
    ) {
        self.tex.draw(&self.core, sink, transform, attrib, clip, mask);
    }

    fn debug_state(&self) -> DebugState {
        DebugState::new(self.name())
            .with("geo", format!("{:?}", self.core.geometry()))
            .with("pressed", self.pressed)
            .with("state", format!("{:?}", self.current_state()))
    }
}
