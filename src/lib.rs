// Copyright 2023 the Sill Authors
// SPDX-License-Identifier: Apache-2.0

//! Window decorations for an X11 compositing shell.
//!
//! This crate is the decoration core of the shell's compositor plugin: it
//! synthesizes, positions, paints and routes input to the non-client area
//! of every managed top-level window: frame, title, shadow, window
//! buttons, resize edges and the integrated application menu.
//!
//! The compositor host stays in charge of the window lifecycle, the GL
//! paint pump and the event feed; it talks to this crate through the
//! [`compositor`] traits:
//!
//! - hand every X event to [`Manager::handle_event_before`] /
//!   [`Manager::handle_event_after`] around your own processing;
//! - register windows with [`Manager::handle_window`];
//! - call [`DecoratedWindow::paint`] and [`DecoratedWindow::draw`] from the
//!   paint pass, in that order;
//! - pump [`Manager::run_timers`] from the event loop, waking up at
//!   [`Manager::next_timeout`].

#![deny(unsafe_op_in_unsafe_fn)]

#[macro_use]
mod util;

pub mod compositor;
pub mod debug;
pub mod dialog;
pub mod frame;
pub mod geometry;
pub mod indicator;
pub mod input;
pub mod manager;
pub mod pool;
pub mod shadow;
pub mod style;
pub mod texture;
pub mod timers;
pub mod widget;
pub mod window;
pub mod wire;

pub use compositor::{
    DecorElements, HostWindow, MoveResizeDirection, MoveResizeRequest, PaintAttrib, PaintMask,
    PaintSink, Screen, WindowActions, WindowState, Xid, MAXIMIZE_STATE,
};
pub use geometry::{Extents, Point, Rect, Region, Size};
pub use indicator::{IndicatorEntryState, IndicatorSource};
pub use input::InputMixer;
pub use manager::Manager;
pub use pool::DataPool;
pub use style::{Style, StyleConfig, WmAction, WmEvent};
pub use window::{DecorAtoms, DecoratedWindow};

#[cfg(test)]
mod tests;
