// Copyright 2023 the Sill Authors
// SPDX-License-Identifier: Apache-2.0

//! The application-menu data feed.
//!
//! The shell's indicator service owns the actual menu model; the
//! decoration core only mirrors entry states into title-strip widgets and
//! asks the service to pop menus up.

use std::rc::Rc;

use crate::compositor::Xid;
use crate::geometry::Rect;

/// Snapshot of one indicator entry.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct IndicatorEntryState {
    pub label: String,
    pub label_sensitive: bool,
    pub image_sensitive: bool,
    pub visible: bool,
    pub active: bool,
    pub show_now: bool,
}

/// The application-menu oracle provided by the shell.
pub trait IndicatorSource {
    fn has_app_menu(&self) -> bool;

    /// Whether menus are shown in window title strips at all.
    fn integrated_menus(&self) -> bool;

    /// Whether the menu replaces the title permanently instead of
    /// crossfading on hover.
    fn always_show_menus(&self) -> bool;

    /// Crossfade durations, in milliseconds.
    fn fadein_ms(&self) -> u32;
    fn fadeout_ms(&self) -> u32;

    /// Entry ids of the application menu of `xid`, in display order.
    fn app_menu_entries(&self, xid: Xid) -> Vec<String>;

    fn entry_state(&self, id: &str) -> Option<IndicatorEntryState>;

    /// Opens the menu of an entry at the given root position.
    fn show_menu(&self, id: &str, xid: Xid, x: i32, y: i32, button: u8);

    /// Opens a native dropdown listing `ids`; `active` is pre-selected.
    fn show_dropdown(&self, ids: &[String], active: Option<&str>, xid: Xid, x: i32, y: i32);

    /// Publishes the on-screen geometry of the entries of one window
    /// panel, for menu-bar navigation.
    fn sync_geometries(&self, panel_id: &str, geometries: Vec<(String, Rect)>);
}

pub type IndicatorSourceRef = Rc<dyn IndicatorSource>;
