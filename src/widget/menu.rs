// Copyright 2023 the Sill Authors
// SPDX-License-Identifier: Apache-2.0

//! Integrated application-menu widgets: entries, the overflow dropdown,
//! and the layout that spills entries into it.

use std::cell::RefCell;
use std::rc::Rc;
use std::time::Duration;

use tracing::warn;

use crate::compositor::{
    GlMatrix, HostWindowRef, PaintAttrib, PaintMask, PaintSink, ScreenRef, Timestamp,
};
use crate::debug::DebugState;
use crate::geometry::{Point, Rect, Region, Size};
use crate::indicator::{IndicatorEntryState, IndicatorSourceRef};
use crate::style::{Style, WidgetState, WmAction, WmEvent};
use crate::timers::{TimerQueue, TimerToken};
use crate::widget::{layout_row, GrabEdge, ItemCore, ItemRef, Padding, TexturedItem, Widget};

const DROPDOWN_ICON_SIZE: i32 = 10;
const MENU_SHOW_NOW_WAIT: Duration = Duration::from_millis(180);
const POINTER_TRACK_INTERVAL: Duration = Duration::from_millis(16);

/// One indicator entry in the title strip.
///
/// The entry embeds a grab edge in always-wait mode, so dragging it still
/// moves the window and double-clicking it still maximizes; the menu only
/// opens when the press never promoted.
pub struct MenuEntry {
    core: ItemCore,
    tex: TexturedItem,
    id: String,
    state: IndicatorEntryState,
    horizontal_padding: i32,
    vertical_padding: i32,
    in_dropdown: bool,
    grab: GrabEdge,
    indicators: IndicatorSourceRef,
    win: HostWindowRef,
    screen: ScreenRef,
    timers: Rc<RefCell<TimerQueue>>,
    open_timer: Option<TimerToken>,
    rendered_state: Option<(WidgetState, Size)>,
}

impl MenuEntry {
    pub fn new(
        id: impl Into<String>,
        screen: ScreenRef,
        win: HostWindowRef,
        indicators: IndicatorSourceRef,
        timers: Rc<RefCell<TimerQueue>>,
    ) -> MenuEntry {
        let mut entry = MenuEntry {
            core: ItemCore::default(),
            tex: TexturedItem::default(),
            id: id.into(),
            state: IndicatorEntryState::default(),
            horizontal_padding: 5,
            vertical_padding: 3,
            in_dropdown: false,
            grab: GrabEdge::new(screen.clone(), win.clone(), timers.clone(), true),
            indicators,
            win,
            screen,
            timers,
            open_timer: None,
            rendered_state: None,
        };
        entry.update_from_source();
        entry
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn is_active(&self) -> bool {
        self.state.active
    }

    pub fn shows_now(&self) -> bool {
        self.state.show_now
    }

    pub fn in_dropdown(&self) -> bool {
        self.in_dropdown
    }

    pub fn set_in_dropdown(&mut self, in_dropdown: bool) {
        self.in_dropdown = in_dropdown;
        self.core.visible = self.state.visible && !in_dropdown;
    }

    /// Pulls the current entry state from the indicator service.
    pub fn update_from_source(&mut self) {
        if let Some(state) = self.indicators.entry_state(&self.id) {
            self.state = state;
        }
        self.core.sensitive = self.state.label_sensitive || self.state.image_sensitive;
        self.core.visible = self.state.visible && !self.in_dropdown;
        self.update_natural_size();
        self.rendered_state = None;
    }

    fn update_natural_size(&mut self) {
        let raw = Style::get().menu_item_natural_size(&self.state.label);
        let scale = self.core.scale;
        self.core.set_natural(Size::new(
            ((raw.width + self.horizontal_padding * 2) as f64 * scale).round() as i32,
            ((raw.height + self.vertical_padding * 2) as f64 * scale).round() as i32,
        ));
    }

    fn widget_state(&self) -> WidgetState {
        if self.state.active {
            WidgetState::Prelight
        } else if self.state.show_now {
            WidgetState::Pressed
        } else if self.core.focused {
            WidgetState::Normal
        } else {
            WidgetState::Backdrop
        }
    }

    pub fn show_menu(&mut self, button: u8) {
        if self.state.active {
            return;
        }
        self.state.active = true;
        self.rendered_state = None;
        let geo = self.core.geometry();
        self.indicators
            .show_menu(&self.id, self.win.id(), geo.x, geo.y1(), button);
    }

    /// Routes a fired timer token (the deferred menu open, or the embedded
    /// grab's promotion timer).
    pub fn timer_fired(&mut self, token: TimerToken) -> bool {
        if self.open_timer == Some(token) {
            self.open_timer = None;
            self.show_menu(1);
            return true;
        }
        self.grab.timer_fired(token)
    }

    fn render_texture(&mut self) {
        let size = Size::new(self.natural_width(), self.natural_height());
        if size.is_empty() {
            self.tex.quad.set_texture(None);
            self.rendered_state = None;
            return;
        }
        let scale = self.core.scale;
        let state = self.widget_state();
        match self.screen.create_texture_surface(size, scale) {
            Ok(ctx) => {
                let style = Style::get();
                let cr = ctx.cr();
                cr.save().ok();
                cr.scale(scale, scale);
                let unscaled = Size::new(
                    (size.width as f64 / scale) as i32,
                    (size.height as f64 / scale) as i32,
                );
                if state == WidgetState::Prelight {
                    style.draw_menu_item(state, cr, unscaled.width as f64, unscaled.height as f64);
                }
                cr.translate(
                    self.horizontal_padding as f64,
                    self.vertical_padding as f64,
                );
                style.draw_menu_item_entry(
                    &self.state.label,
                    state,
                    cr,
                    (unscaled.width - self.horizontal_padding * 2) as f64,
                    (unscaled.height - self.vertical_padding * 2) as f64,
                );
                cr.restore().ok();
                self.tex.quad.set_texture(Some(ctx.into_texture()));
                self.rendered_state = Some((state, size));
            }
            Err(e) => {
                warn!("failed to render menu entry {}: {}", self.id, e);
                self.tex.quad.set_texture(None);
            }
        }
    }
}

impl Widget for MenuEntry {
    fn core(&self) -> &ItemCore {
        &self.core
    }

    fn core_mut(&mut self) -> &mut ItemCore {
        &mut self.core
    }

    fn name(&self) -> &'static str {
        "MenuEntry"
    }

    fn scale_changed(&mut self, scale: f64) {
        self.grab.set_scale(scale);
        self.update_natural_size();
        self.rendered_state = None;
    }

    fn focused_changed(&mut self, _focused: bool) {
        self.rendered_state = None;
    }

    fn button_down(&mut self, p: Point, button: u8, time: Timestamp) {
        self.open_timer = None;
        self.grab.button_down(p, button, time);
    }

    fn button_up(&mut self, p: Point, button: u8, time: Timestamp) {
        if button == 1 && self.grab.is_pending() {
            let wait = Style::get().double_click_max_time_delta();
            if self.grab.is_maximizable() && wait > 0 {
                // Defer the open so a double-click can still maximize.
                self.open_timer = Some(
                    self.timers
                        .borrow_mut()
                        .schedule_in(Duration::from_millis(wait as u64)),
                );
            } else {
                self.show_menu(button);
            }
        }

        if button == 2 || button == 3 {
            let event = if button == 2 {
                WmEvent::MiddleClick
            } else {
                WmEvent::RightClick
            };
            if Style::get().window_manager_action(event) == WmAction::None {
                self.show_menu(button);
            }
        }

        self.grab.button_up(p, button, time);
    }

    fn motion(&mut self, p: Point, time: Timestamp) {
        self.grab.motion(p, time);
    }

    fn draw(
        &mut self,
        sink: &mut dyn PaintSink,
        transform: &GlMatrix,
        attrib: PaintAttrib,
        clip: &Region,
        mask: PaintMask,
    ) {
        let wanted = (
            self.widget_state(),
            Size::new(self.natural_width(), self.natural_height()),
        );
        if self.rendered_state != Some(wanted) {
            self.render_texture();
        }
        self.tex.draw(&self.core, sink, transform, attrib, clip, mask);
    }

    fn debug_state(&self) -> DebugState {
        DebugState::new(self.name())
            .with("entry_id", &self.id)
            .with("label", &self.state.label)
            .with("geo", format!("{:?}", self.core.geometry()))
            .with("active", self.state.active)
            .with("in_dropdown", self.in_dropdown)
    }
}

/// The overflow dropdown: retains spilled entries and shows a down-arrow
/// that opens them in a native list.
pub struct MenuDropdown {
    core: ItemCore,
    tex: TexturedItem,
    children: Vec<Rc<RefCell<MenuEntry>>>,
    active: bool,
    pending_active: Option<String>,
    horizontal_padding: i32,
    vertical_padding: i32,
    extra_icon_height: i32,
    grab: GrabEdge,
    indicators: IndicatorSourceRef,
    win: HostWindowRef,
    screen: ScreenRef,
    rendered_state: Option<(WidgetState, Size)>,
}

impl MenuDropdown {
    pub fn new(
        screen: ScreenRef,
        win: HostWindowRef,
        indicators: IndicatorSourceRef,
        timers: Rc<RefCell<TimerQueue>>,
    ) -> MenuDropdown {
        let mut dropdown = MenuDropdown {
            core: ItemCore::default(),
            tex: TexturedItem::default(),
            children: Vec::new(),
            active: false,
            pending_active: None,
            horizontal_padding: 5,
            vertical_padding: 3,
            extra_icon_height: 0,
            grab: GrabEdge::new(screen.clone(), win.clone(), timers, true),
            indicators,
            win,
            screen,
            rendered_state: None,
        };
        dropdown.update_natural_size();
        dropdown
    }

    fn update_natural_size(&mut self) {
        let scale = self.core.scale;
        self.core.set_natural(Size::new(
            ((DROPDOWN_ICON_SIZE + self.horizontal_padding * 2) as f64 * scale).round() as i32,
            ((DROPDOWN_ICON_SIZE + self.extra_icon_height + self.vertical_padding * 2) as f64
                * scale)
                .round() as i32,
        ));
    }

    pub fn push(&mut self, child: Rc<RefCell<MenuEntry>>) {
        if self
            .children
            .iter()
            .any(|c| Rc::ptr_eq(c, &child))
        {
            return;
        }

        // Grow to match the tallest pushed entry.
        let child_height = child.borrow().natural_height();
        let size_diff =
            ((child_height - self.natural_height()) as f64 / self.core.scale) as i32;
        if size_diff > 0 {
            self.extra_icon_height += size_diff % 2;
            self.vertical_padding += size_diff / 2;
            self.update_natural_size();
            self.rendered_state = None;
        }

        child.borrow_mut().set_in_dropdown(true);
        self.children.insert(0, child);
    }

    pub fn pop(&mut self) -> Option<Rc<RefCell<MenuEntry>>> {
        if self.children.is_empty() {
            return None;
        }
        let child = self.children.remove(0);
        child.borrow_mut().set_in_dropdown(false);
        Some(child)
    }

    pub fn top_natural_width(&self) -> Option<i32> {
        self.children.first().map(|c| c.borrow().natural_width())
    }

    pub fn len(&self) -> usize {
        self.children.len()
    }

    pub fn is_empty(&self) -> bool {
        self.children.is_empty()
    }

    pub fn show_menu(&mut self, _button: u8) {
        if self.active {
            return;
        }
        self.active = true;
        self.rendered_state = None;
        let geo = self.core.geometry();
        let ids: Vec<String> = self
            .children
            .iter()
            .map(|c| c.borrow().id().to_string())
            .collect();
        self.indicators.show_dropdown(
            &ids,
            self.pending_active.as_deref(),
            self.win.id(),
            geo.x,
            geo.y1(),
        );
    }

    /// Opens the dropdown with `entry` preselected, if it is retained here.
    pub fn activate_child(&mut self, entry_id: &str) -> bool {
        if !self.children.iter().any(|c| c.borrow().id() == entry_id) {
            return false;
        }
        self.pending_active = Some(entry_id.to_string());
        self.active = false;
        self.show_menu(0);
        self.pending_active = None;
        true
    }

    pub fn set_active(&mut self, active: bool) {
        if self.active != active {
            self.active = active;
            self.rendered_state = None;
        }
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn timer_fired(&mut self, token: TimerToken) -> bool {
        self.grab.timer_fired(token)
    }

    fn widget_state(&self) -> WidgetState {
        if self.active {
            WidgetState::Prelight
        } else if self.core.focused {
            WidgetState::Normal
        } else {
            WidgetState::Backdrop
        }
    }

    fn render_texture(&mut self) {
        let size = Size::new(self.natural_width(), self.natural_height());
        if size.is_empty() {
            return;
        }
        let scale = self.core.scale;
        let state = self.widget_state();
        match self.screen.create_texture_surface(size, scale) {
            Ok(ctx) => {
                let style = Style::get();
                let cr = ctx.cr();
                cr.save().ok();
                cr.scale(scale, scale);
                let unscaled_w = size.width as f64 / scale;
                let unscaled_h = size.height as f64 / scale;
                if state == WidgetState::Prelight {
                    style.draw_menu_item(state, cr, unscaled_w, unscaled_h);
                }
                cr.translate(
                    self.horizontal_padding as f64,
                    (self.vertical_padding + self.extra_icon_height) as f64,
                );
                style.draw_menu_item_icon(state, cr, DROPDOWN_ICON_SIZE as f64);
                cr.restore().ok();
                self.tex.quad.set_texture(Some(ctx.into_texture()));
                self.rendered_state = Some((state, size));
            }
            Err(e) => warn!("failed to render menu dropdown: {}", e),
        }
    }
}

impl Widget for MenuDropdown {
    fn core(&self) -> &ItemCore {
        &self.core
    }

    fn core_mut(&mut self) -> &mut ItemCore {
        &mut self.core
    }

    fn name(&self) -> &'static str {
        "MenuDropdown"
    }

    fn scale_changed(&mut self, scale: f64) {
        self.grab.set_scale(scale);
        self.update_natural_size();
        self.rendered_state = None;
    }

    fn focused_changed(&mut self, _focused: bool) {
        self.rendered_state = None;
    }

    fn button_down(&mut self, p: Point, button: u8, time: Timestamp) {
        self.grab.button_down(p, button, time);
    }

    fn button_up(&mut self, p: Point, button: u8, time: Timestamp) {
        if button == 1 && self.grab.is_pending() {
            self.show_menu(button);
        }
        if button == 2 || button == 3 {
            let event = if button == 2 {
                WmEvent::MiddleClick
            } else {
                WmEvent::RightClick
            };
            if Style::get().window_manager_action(event) == WmAction::None {
                self.show_menu(button);
            }
        }
        self.grab.button_up(p, button, time);
    }

    fn motion(&mut self, p: Point, time: Timestamp) {
        self.grab.motion(p, time);
    }

    fn draw(
        &mut self,
        sink: &mut dyn PaintSink,
        transform: &GlMatrix,
        attrib: PaintAttrib,
        clip: &Region,
        mask: PaintMask,
    ) {
        let wanted = (
            self.widget_state(),
            Size::new(self.natural_width(), self.natural_height()),
        );
        if self.rendered_state != Some(wanted) {
            self.render_texture();
        }
        self.tex.draw(&self.core, sink, transform, attrib, clip, mask);
    }

    fn debug_state(&self) -> DebugState {
        let mut state = DebugState::new(self.name())
            .with("geo", format!("{:?}", self.core.geometry()))
            .with("active", self.active)
            .with("retained", self.children.len());
        state.children = self
            .children
            .iter()
            .map(|child| child.borrow().debug_state())
            .collect();
        state
    }
}

/// The ordered row of menu entries plus the overflow dropdown.
pub struct MenuLayout {
    core: ItemCore,
    items: Vec<ItemRef>,
    entries: Vec<Rc<RefCell<MenuEntry>>>,
    dropdown: Rc<RefCell<MenuDropdown>>,
    dropdown_in_items: bool,
    padding: Padding,
    show_now: bool,
    show_now_timer: Option<TimerToken>,
    pointer_timer: Option<TimerToken>,
    timers: Rc<RefCell<TimerQueue>>,
    last_pointer: Point,
    screen: ScreenRef,
    win: HostWindowRef,
    indicators: IndicatorSourceRef,
}

impl MenuLayout {
    pub fn new(
        screen: ScreenRef,
        win: HostWindowRef,
        indicators: IndicatorSourceRef,
        timers: Rc<RefCell<TimerQueue>>,
    ) -> MenuLayout {
        let dropdown = Rc::new(RefCell::new(MenuDropdown::new(
            screen.clone(),
            win.clone(),
            indicators.clone(),
            timers.clone(),
        )));
        MenuLayout {
            core: ItemCore::default(),
            items: Vec::new(),
            entries: Vec::new(),
            dropdown,
            dropdown_in_items: false,
            padding: Padding::default(),
            show_now: false,
            show_now_timer: None,
            pointer_timer: None,
            timers,
            last_pointer: Point::ZERO,
            screen,
            win,
            indicators,
        }
    }

    /// (Re)builds the entry widgets from the window's application menu.
    pub fn setup(&mut self) {
        self.items.clear();
        self.entries.clear();
        self.dropdown_in_items = false;

        for id in self.indicators.app_menu_entries(self.win.id()) {
            let entry = Rc::new(RefCell::new(MenuEntry::new(
                id,
                self.screen.clone(),
                self.win.clone(),
                self.indicators.clone(),
                self.timers.clone(),
            )));
            {
                let mut e = entry.borrow_mut();
                e.set_focused(self.core.focused);
                e.set_scale(self.core.scale);
            }
            self.items.push(entry.clone());
            self.entries.push(entry);
        }

        if !self.entries.is_empty() {
            self.relayout();
        }
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn set_padding(&mut self, padding: Padding) {
        self.padding = padding;
    }

    /// Re-reads every entry's state from the indicator service.
    pub fn update_entries(&mut self) {
        for entry in &self.entries {
            entry.borrow_mut().update_from_source();
        }
        self.sync_show_now();
        self.sync_pointer_tracking();
        self.relayout();
    }

    pub fn any_mouse_owner(&self) -> bool {
        self.entries
            .iter()
            .any(|e| e.borrow().core().mouse_owner)
            || self.dropdown.borrow().core().mouse_owner
            || self.core.mouse_owner
    }

    pub fn any_active(&self) -> bool {
        self.entries.iter().any(|e| e.borrow().is_active()) || self.dropdown.borrow().is_active()
    }

    pub fn shows_now(&self) -> bool {
        self.show_now
    }

    /// Debounces the indicator `show-now` hint into the crossfade flag.
    fn sync_show_now(&mut self) {
        let wanted = self.entries.iter().any(|e| e.borrow().shows_now());
        if !wanted {
            self.show_now_timer = None;
            self.show_now = false;
        } else if !self.show_now && self.show_now_timer.is_none() {
            self.show_now_timer = Some(self.timers.borrow_mut().schedule_in(MENU_SHOW_NOW_WAIT));
        }
    }

    /// While a menu is open, a cheap pointer poll switches between entries
    /// on hover, the way toolkit menu bars do.
    fn sync_pointer_tracking(&mut self) {
        let active = self.any_active();
        if active && self.pointer_timer.is_none() && self.entries.len() > 1 {
            self.pointer_timer = Some(
                self.timers
                    .borrow_mut()
                    .schedule_in(POINTER_TRACK_INTERVAL),
            );
        } else if !active {
            self.pointer_timer = None;
        }
    }

    pub fn timer_fired(&mut self, token: TimerToken) -> bool {
        if self.show_now_timer == Some(token) {
            self.show_now_timer = None;
            self.show_now = true;
            return true;
        }
        if self.pointer_timer == Some(token) {
            self.pointer_timer = None;
            self.track_pointer();
            self.sync_pointer_tracking();
            return true;
        }
        for entry in &self.entries {
            if entry.borrow_mut().timer_fired(token) {
                return true;
            }
        }
        self.dropdown.borrow_mut().timer_fired(token)
    }

    fn track_pointer(&mut self) {
        let pointer = self.screen.pointer_position();
        if pointer == self.last_pointer {
            return;
        }
        self.last_pointer = pointer;
        for entry in &self.entries {
            let hit = {
                let e = entry.borrow();
                e.core().visible && e.core().sensitive && e.geometry().contains(pointer)
            };
            if hit {
                entry.borrow_mut().show_menu(1);
                break;
            }
        }
    }

    /// Activates the entry with `id`, going through the dropdown when the
    /// entry overflowed into it.
    pub fn activate_menu(&mut self, entry_id: &str) -> bool {
        for entry in &self.entries {
            if entry.borrow().id() != entry_id {
                continue;
            }
            let usable = {
                let e = entry.borrow();
                e.core().visible && e.core().sensitive
            };
            if usable {
                entry.borrow_mut().show_menu(0);
                return true;
            }
            break;
        }
        self.dropdown.borrow_mut().activate_child(entry_id)
    }

    /// Geometry of every visible entry, for the indicator service.
    pub fn children_geometries(&self) -> Vec<(String, Rect)> {
        self.entries
            .iter()
            .filter(|e| e.borrow().core().visible)
            .map(|e| {
                let e = e.borrow();
                (e.id().to_string(), e.geometry())
            })
            .collect()
    }

    fn append_dropdown(&mut self) {
        if !self.dropdown_in_items {
            self.items.push(self.dropdown.clone());
            self.dropdown_in_items = true;
        }
    }

    fn remove_dropdown(&mut self) {
        if self.dropdown_in_items {
            let dropdown: ItemRef = self.dropdown.clone();
            self.items.retain(|item| !crate::widget::same_item(item, &dropdown));
            self.dropdown_in_items = false;
        }
    }
}

impl Widget for MenuLayout {
    fn core(&self) -> &ItemCore {
        &self.core
    }

    fn core_mut(&mut self) -> &mut ItemCore {
        &mut self.core
    }

    fn name(&self) -> &'static str {
        "MenuLayout"
    }

    fn is_container(&self) -> bool {
        true
    }

    fn children(&self) -> &[ItemRef] {
        &self.items
    }

    fn set_focused(&mut self, focused: bool) {
        if self.core.focused != focused {
            self.core.focused = focused;
            for entry in &self.entries {
                entry.borrow_mut().set_focused(focused);
            }
            self.dropdown.borrow_mut().set_focused(focused);
        }
    }

    fn set_scale(&mut self, scale: f64) {
        if (self.core.scale - scale).abs() > f64::EPSILON {
            self.core.scale = scale;
            for entry in &self.entries {
                entry.borrow_mut().set_scale(scale);
            }
            self.dropdown.borrow_mut().set_scale(scale);
            self.relayout();
        }
    }

    /// The overflow pass: spill entries into the dropdown from the tail
    /// when they no longer fit, pop them back in order when space returns,
    /// then run the plain row layout.
    fn relayout(&mut self) {
        let dropdown_width = self.dropdown.borrow().natural_width();
        let max_width = self.core.max_size().width;
        let mut accumulated =
            dropdown_width + self.padding.left + self.padding.right - self.padding.inner;
        let mut to_hide: Vec<Rc<RefCell<MenuEntry>>> = Vec::new();

        for entry in &self.entries {
            let e = entry.borrow();
            if !e.core().visible {
                continue;
            }
            accumulated += e.natural_width() + self.padding.inner;
            if accumulated > max_width {
                to_hide.insert(0, entry.clone());
            }
        }

        // No need to hide a single entry if dropping the dropdown itself
        // frees enough room.
        if self.dropdown.borrow().is_empty() && to_hide.len() == 1 {
            if accumulated - dropdown_width < max_width {
                to_hide.clear();
            }
        }

        // A lone retained entry might fit back into the dropdown's spot.
        if to_hide.is_empty() && self.dropdown.borrow().len() == 1 {
            accumulated -= dropdown_width;
        }

        if accumulated < max_width {
            loop {
                let fits = {
                    let dropdown = self.dropdown.borrow();
                    match dropdown.top_natural_width() {
                        Some(width) => width < max_width - accumulated,
                        None => false,
                    }
                };
                if !fits {
                    break;
                }
                self.dropdown.borrow_mut().pop();
            }
            if self.dropdown.borrow().is_empty() {
                self.remove_dropdown();
            }
        } else if !to_hide.is_empty() {
            if self.dropdown.borrow().is_empty() {
                self.append_dropdown();
            }
            for hidden in to_hide {
                self.dropdown.borrow_mut().push(hidden);
            }
        }

        layout_row(&mut self.core, &self.padding, &self.items);
    }

    fn draw(
        &mut self,
        sink: &mut dyn PaintSink,
        transform: &GlMatrix,
        attrib: PaintAttrib,
        clip: &Region,
        mask: PaintMask,
    ) {
        for item in &self.items {
            let mut item = item.borrow_mut();
            if item.core().visible {
                item.draw(sink, transform, attrib, clip, mask);
            }
        }
    }

    fn debug_state(&self) -> DebugState {
        let mut state = DebugState::new(self.name())
            .with("geo", format!("{:?}", self.core.geometry()))
            .with("show_now", self.show_now)
            .with("entries", self.entries.len());
        state.children = self
            .items
            .iter()
            .map(|item| item.borrow().debug_state())
            .collect();
        state
    }
}
