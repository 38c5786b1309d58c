// Copyright 2023 the Sill Authors
// SPDX-License-Identifier: Apache-2.0

//! Lifecycle driver for the force-quit dialog.
//!
//! The dialog itself is rendered by the shell; the decoration core only
//! tracks when one should exist for a window, keeps it centered over the
//! client area, and carries the event timestamp the kill needs.

use std::cell::Cell;

use crate::compositor::{HostWindowRef, Timestamp};
use crate::debug::DebugState;
use crate::geometry::{Point, Rect};

pub struct ForceQuitDialog {
    win: HostWindowRef,
    time: Cell<Timestamp>,
    position: Cell<Point>,
}

impl ForceQuitDialog {
    pub fn new(win: HostWindowRef, time: Timestamp) -> ForceQuitDialog {
        let dialog = ForceQuitDialog {
            win,
            time: Cell::new(time),
            position: Cell::new(Point::ZERO),
        };
        dialog.update_position();
        dialog
    }

    /// The timestamp of the request that opened (or re-posted) the dialog.
    pub fn time(&self) -> Timestamp {
        self.time.get()
    }

    pub fn set_time(&self, time: Timestamp) {
        self.time.set(time);
    }

    pub fn position(&self) -> Point {
        self.position.get()
    }

    /// Re-centers the dialog over the client area.
    pub fn update_position(&self) {
        let geo: Rect = self.win.geometry();
        self.position
            .set(Point::new(geo.x + geo.width / 2, geo.y + geo.height / 2));
    }

    /// Asks the client to close, carrying the original timestamp.
    pub fn close_window(&self) {
        self.win.close(self.time.get());
    }

    pub fn debug_state(&self) -> DebugState {
        DebugState::new("ForceQuitDialog")
            .with("time", self.time.get())
            .with("position", format!("{:?}", self.position.get()))
    }
}
