// Copyright 2023 the Sill Authors
// SPDX-License-Identifier: Apache-2.0

//! The process-wide decoration manager.
//!
//! Owns the registry of decorated windows, demultiplexes X events around
//! the compositor's own handling, keeps the shared shadow texture pair
//! fresh, and wires the application-menu service into the windows.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::{Rc, Weak};
use std::time::Instant;

use anyhow::Result;
use tracing::{debug, warn};
use x11rb::connection::Connection;
use x11rb::protocol::xproto::{AtomEnum, ConnectionExt, NotifyMode};
use x11rb::protocol::Event;

use crate::compositor::{HostWindowRef, ScreenRef, Xid};
use crate::debug::DebugState;
use crate::geometry::Point;
use crate::input::InputMixer;
use crate::pool::DataPool;
use crate::shadow::build_shadow_texture;
use crate::style::{Color, Style, StyleConfig};
use crate::timers::{TimerQueue, TimerToken};
use crate::window::{DecorAtoms, DecoratedWindow, SharedShadowTextures};
use crate::wire;
use crate::indicator::IndicatorSourceRef;

impl DecorAtoms {
    /// Interns the atom set on the host's connection.
    pub fn intern(conn: &impl Connection) -> Result<DecorAtoms> {
        let cookie = |name: &[u8]| conn.intern_atom(false, name);
        let net_wm_name = cookie(b"_NET_WM_NAME")?;
        let net_wm_visible_name = cookie(b"_NET_WM_VISIBLE_NAME")?;
        let net_active_window = cookie(b"_NET_ACTIVE_WINDOW")?;
        let net_wm_moveresize = cookie(b"_NET_WM_MOVERESIZE")?;
        let net_request_frame_extents = cookie(b"_NET_REQUEST_FRAME_EXTENTS")?;
        let net_frame_extents = cookie(b"_NET_FRAME_EXTENTS")?;
        let net_wm_allowed_actions = cookie(b"_NET_WM_ALLOWED_ACTIONS")?;
        let motif_wm_hints = cookie(b"_MOTIF_WM_HINTS")?;
        let gtk_border_radius = cookie(b"_UNITY_GTK_BORDER_RADIUS")?;
        let toolkit_action = cookie(b"_TOOLKIT_ACTION")?;
        let toolkit_action_force_quit_dialog = cookie(b"_TOOLKIT_ACTION_FORCE_QUIT_DIALOG")?;

        Ok(DecorAtoms {
            wm_name: u32::from(AtomEnum::WM_NAME),
            net_wm_name: net_wm_name.reply()?.atom,
            net_wm_visible_name: net_wm_visible_name.reply()?.atom,
            net_active_window: net_active_window.reply()?.atom,
            net_wm_moveresize: net_wm_moveresize.reply()?.atom,
            net_request_frame_extents: net_request_frame_extents.reply()?.atom,
            net_frame_extents: net_frame_extents.reply()?.atom,
            net_wm_allowed_actions: net_wm_allowed_actions.reply()?.atom,
            motif_wm_hints: motif_wm_hints.reply()?.atom,
            gtk_border_radius: gtk_border_radius.reply()?.atom,
            toolkit_action: toolkit_action.reply()?.atom,
            toolkit_action_force_quit_dialog: toolkit_action_force_quit_dialog.reply()?.atom,
        })
    }
}

/// The shadow-affecting style keys, for change detection.
#[derive(Clone, PartialEq)]
struct ShadowSettings {
    active_color: Color,
    active_radius: u32,
    inactive_color: Color,
    inactive_radius: u32,
    offset: Point,
}

impl ShadowSettings {
    fn current() -> ShadowSettings {
        let style = Style::get();
        ShadowSettings {
            active_color: style.active_shadow_color(),
            active_radius: style.active_shadow_radius(),
            inactive_color: style.inactive_shadow_color(),
            inactive_radius: style.inactive_shadow_radius(),
            offset: style.shadow_offset(),
        }
    }
}

pub struct Manager {
    screen: ScreenRef,
    atoms: Rc<DecorAtoms>,
    pool: Rc<DataPool>,
    timers: Rc<RefCell<TimerQueue>>,
    indicators: Option<IndicatorSourceRef>,
    windows: RefCell<HashMap<Xid, Rc<DecoratedWindow>>>,
    /// Secondary index, shared with the per-window framed callbacks.
    framed_windows: Rc<RefCell<HashMap<Xid, Weak<DecoratedWindow>>>>,
    active_window: RefCell<Weak<DecoratedWindow>>,
    /// Mixer that received the last button press; release events outside
    /// any frame are routed here to close implicit grabs.
    last_mouse_owner: RefCell<Weak<RefCell<InputMixer>>>,
    shadow_textures: Rc<SharedShadowTextures>,
    shadow_settings: RefCell<ShadowSettings>,
}

impl Manager {
    pub fn new(
        screen: ScreenRef,
        atoms: DecorAtoms,
        indicators: Option<IndicatorSourceRef>,
    ) -> Manager {
        let pool = DataPool::instance(&screen);
        let manager = Manager {
            atoms: Rc::new(atoms),
            pool,
            timers: Rc::new(RefCell::new(TimerQueue::new())),
            indicators,
            windows: RefCell::new(HashMap::new()),
            framed_windows: Rc::new(RefCell::new(HashMap::new())),
            active_window: RefCell::new(Weak::new()),
            last_mouse_owner: RefCell::new(Weak::new()),
            shadow_textures: Rc::new(SharedShadowTextures::default()),
            shadow_settings: RefCell::new(ShadowSettings::current()),
            screen,
        };
        manager.build_shadow_textures(true, true);
        manager
    }

    /// Atoms the compositor should advertise in `_NET_SUPPORTED`.
    pub fn add_supported_atoms(&self, atoms: &mut Vec<u32>) {
        atoms.push(self.atoms.gtk_border_radius);
        atoms.push(self.atoms.net_request_frame_extents);
    }

    pub fn timers(&self) -> Rc<RefCell<TimerQueue>> {
        self.timers.clone()
    }

    // Style changes

    fn build_shadow_textures(&self, active: bool, inactive: bool) {
        let settings = self.shadow_settings.borrow().clone();
        if active {
            match build_shadow_texture(&self.screen, settings.active_radius, settings.active_color)
            {
                Ok(texture) => *self.shadow_textures.active.borrow_mut() = Some(texture),
                Err(e) => {
                    warn!("active shadow texture: {:#}", e);
                    *self.shadow_textures.active.borrow_mut() = None;
                }
            }
        }
        if inactive {
            match build_shadow_texture(
                &self.screen,
                settings.inactive_radius,
                settings.inactive_color,
            ) {
                Ok(texture) => *self.shadow_textures.inactive.borrow_mut() = Some(texture),
                Err(e) => {
                    warn!("inactive shadow texture: {:#}", e);
                    *self.shadow_textures.inactive.borrow_mut() = None;
                }
            }
        }
    }

    /// Pushes a new style configuration from the host, rebuilding whatever
    /// the change invalidates.
    pub fn apply_style(&self, config: StyleConfig) {
        Style::get().apply_config(config);
        let settings = ShadowSettings::current();
        let old = self.shadow_settings.replace(settings.clone());

        let active_changed = settings.active_color != old.active_color
            || settings.active_radius != old.active_radius;
        let inactive_changed = settings.inactive_color != old.inactive_color
            || settings.inactive_radius != old.inactive_radius;
        if active_changed || inactive_changed {
            self.build_shadow_textures(active_changed, inactive_changed);
        }

        self.update_windows_extents();
    }

    /// Called by the host when monitors or their DPI scales changed.
    pub fn monitors_changed(&self) {
        Style::get().notify_dpi_changed();
        for window in self.windows.borrow().values() {
            window.update();
        }
        self.update_windows_extents();
    }

    fn update_windows_extents(&self) {
        for window in self.windows.borrow().values() {
            window.redraw_decorations();
        }
    }

    // Window registry

    pub fn handle_window(&self, host_win: HostWindowRef) -> Rc<DecoratedWindow> {
        let window = DecoratedWindow::new(
            self.screen.clone(),
            host_win,
            self.pool.clone(),
            self.timers.clone(),
            self.indicators.clone(),
            self.atoms.clone(),
            self.shadow_textures.clone(),
        );

        let xid = window.xid();
        // Keep the frame index in sync as frames come and go.
        let framed = Rc::downgrade(&window);
        let index = self.framed_windows.clone();
        window.set_framed_callback(Box::new(move |is_framed, frame| {
            if !is_framed || frame == 0 {
                index.borrow_mut().remove(&frame);
            } else {
                index.borrow_mut().insert(frame, framed.clone());
            }
        }));

        if window.frame() != 0 {
            self.framed_windows
                .borrow_mut()
                .insert(window.frame(), Rc::downgrade(&window));
        }
        self.windows.borrow_mut().insert(xid, window.clone());
        window
    }

    pub fn unhandle_window(&self, xid: Xid) {
        if let Some(window) = self.windows.borrow_mut().remove(&xid) {
            if window.frame() != 0 {
                self.framed_windows.borrow_mut().remove(&window.frame());
            }
            window.undecorate();
        }
    }

    pub fn window_by_xid(&self, xid: Xid) -> Option<Rc<DecoratedWindow>> {
        self.windows.borrow().get(&xid).cloned()
    }

    pub fn window_by_frame(&self, frame: Xid) -> Option<Rc<DecoratedWindow>> {
        self.framed_windows
            .borrow()
            .get(&frame)
            .and_then(Weak::upgrade)
    }

    fn update_window(&self, xid: Xid) -> bool {
        match self.window_by_xid(xid) {
            Some(window) if !window.host_window().has_unmap_reference() => {
                window.update();
                true
            }
            _ => false,
        }
    }

    // Event pipeline

    /// Pre-composite hook; returns `true` when the event was consumed.
    pub fn handle_event_before(&self, event: &Event) -> bool {
        match event {
            Event::ClientMessage(ev) => {
                if ev.type_ == self.atoms.net_request_frame_extents {
                    if let Some(window) = self.window_by_xid(ev.window) {
                        window.send_frame_extents();
                    }
                } else if ev.type_ == self.atoms.toolkit_action {
                    if let Some(request) =
                        wire::force_quit_request(ev, self.atoms.toolkit_action_force_quit_dialog)
                    {
                        if let Some(window) = self.window_by_xid(request.window) {
                            window.show_force_quit_dialog(request.show, request.time);
                            return true;
                        }
                    }
                }
            }
            Event::MotionNotify(_)
            | Event::EnterNotify(_)
            | Event::LeaveNotify(_)
            | Event::ButtonPress(_)
            | Event::ButtonRelease(_) => {
                if self.handle_frame_event(event) {
                    return true;
                }
            }
            Event::FocusOut(ev) => {
                if ev.mode == NotifyMode::GRAB {
                    if let Some(mixer) = self.last_mouse_owner.borrow().upgrade() {
                        mixer.borrow_mut().ungrab_pointer();
                    }
                    *self.last_mouse_owner.borrow_mut() = Weak::new();
                }
            }
            _ => {}
        }
        false
    }

    /// Post-composite hook.
    pub fn handle_event_after(&self, event: &Event) -> bool {
        match event {
            Event::PropertyNotify(ev) => {
                if ev.atom == self.atoms.net_active_window {
                    self.update_active_window();
                } else if ev.atom == self.atoms.motif_wm_hints
                    || ev.atom == self.atoms.net_wm_allowed_actions
                {
                    if let Some(window) = self.window_by_xid(ev.window) {
                        window.update_frame_actions();
                    }
                } else if ev.atom == self.atoms.wm_name
                    || ev.atom == self.atoms.net_wm_name
                    || ev.atom == self.atoms.net_wm_visible_name
                {
                    if let Some(window) = self.window_by_xid(ev.window) {
                        let title = self
                            .screen
                            .string_property(ev.window, ev.atom)
                            .unwrap_or_else(|| self.screen.window_name(ev.window));
                        window.set_title(title);
                    }
                } else if ev.atom == self.atoms.gtk_border_radius {
                    self.update_window(ev.window);
                }
            }
            Event::ConfigureNotify(ev) => {
                self.update_window(ev.window);
            }
            Event::ShapeNotify(ev) => {
                if !self.update_window(ev.affected_window) {
                    if let Some(window) = self.window_by_frame(ev.affected_window) {
                        window.sync_shape_with_frame_region();
                    }
                }
            }
            _ => {}
        }
        false
    }

    fn frame_event_target(&self, frame: Xid, is_release: bool) -> Option<Rc<RefCell<InputMixer>>> {
        let window = self.window_by_frame(frame);

        if let Some(window) = &window {
            if window.host_window().default_viewport() != self.screen.viewport() {
                return None;
            }
        }

        match window {
            Some(window) => window.input_mixer(),
            // Release events can happen outside the frame; they must still
            // reach the mixer holding the implicit grab.
            None if is_release => self.last_mouse_owner.borrow().upgrade(),
            None => None,
        }
    }

    fn handle_frame_event(&self, event: &Event) -> bool {
        if self.screen.is_scale_active() {
            return false;
        }

        let (frame, is_release) = match event {
            Event::MotionNotify(ev) => (ev.event, false),
            Event::EnterNotify(ev) => (ev.event, false),
            Event::LeaveNotify(ev) => (ev.event, false),
            Event::ButtonPress(ev) => (ev.event, false),
            Event::ButtonRelease(ev) => (ev.event, true),
            _ => return false,
        };

        let window = self.window_by_frame(frame);
        let Some(mixer) = self.frame_event_target(frame, is_release) else {
            return false;
        };

        match event {
            Event::MotionNotify(ev) => {
                mixer
                    .borrow_mut()
                    .motion_event(Point::new(ev.root_x as i32, ev.root_y as i32), ev.time);
            }
            Event::EnterNotify(ev) => {
                mixer
                    .borrow_mut()
                    .enter_event(Point::new(ev.root_x as i32, ev.root_y as i32));
            }
            Event::LeaveNotify(ev) => {
                mixer
                    .borrow_mut()
                    .leave_event(Point::new(ev.root_x as i32, ev.root_y as i32));
            }
            Event::ButtonPress(ev) => {
                let point = Point::new(ev.root_x as i32, ev.root_y as i32);
                mixer.borrow_mut().button_down_event(point, ev.detail, ev.time);
                if mixer.borrow().mouse_owner().is_some() {
                    *self.last_mouse_owner.borrow_mut() = Rc::downgrade(&mixer);
                }
            }
            Event::ButtonRelease(ev) => {
                let point = Point::new(ev.root_x as i32, ev.root_y as i32);
                mixer.borrow_mut().button_up_event(point, ev.detail, ev.time);
                *self.last_mouse_owner.borrow_mut() = Weak::new();
            }
            _ => {}
        }

        if let Some(window) = window {
            window.after_input_event();
        }

        // Consuming these events would break Alt+drag window moves, so the
        // compositor always sees them too.
        false
    }

    fn update_active_window(&self) {
        if let Some(old) = self.active_window.borrow().upgrade() {
            old.set_active(false);
        }

        let active_xid = self.screen.active_window();
        let new_active = self.window_by_xid(active_xid);
        *self.active_window.borrow_mut() = match &new_active {
            Some(window) => Rc::downgrade(window),
            None => Weak::new(),
        };

        if let Some(window) = new_active {
            window.set_active(true);
        }
    }

    // Menu wiring

    /// Re-applies the app-menu setup to every window; called when the
    /// indicator service gains/loses the menu or its mode toggles.
    pub fn refresh_app_menus(&self) {
        for window in self.windows.borrow().values() {
            window.setup_app_menu();
            window.damage();
        }
    }

    /// The indicator service reported new entry state for one window.
    pub fn app_menu_updated(&self, xid: Xid) {
        if let Some(window) = self.window_by_xid(xid) {
            window.update_app_menu();
            window.damage();
        }
    }

    /// A menu entry was activated by keyboard (e.g. Alt+F); routed to the
    /// active window.
    pub fn activate_menu(&self, entry_id: &str) -> bool {
        match self.active_window.borrow().upgrade() {
            Some(window) => window.activate_menu(entry_id),
            None => false,
        }
    }

    // Timers

    /// When the host's event loop should wake us up next.
    pub fn next_timeout(&self) -> Option<Instant> {
        self.timers.borrow().next_deadline()
    }

    /// Dispatches expired timers to the windows that own them.
    pub fn run_timers(&self, now: Instant) {
        let fired: Vec<TimerToken> = self.timers.borrow_mut().run_timers(now);
        for token in fired {
            let windows: Vec<Rc<DecoratedWindow>> =
                self.windows.borrow().values().cloned().collect();
            let mut handled = false;
            for window in windows {
                if window.handle_timer(token) {
                    handled = true;
                    break;
                }
            }
            if !handled {
                debug!("timer {:?} fired with no owner", token);
            }
        }
    }

    pub fn debug_state(&self) -> DebugState {
        let settings = self.shadow_settings.borrow();
        let mut state = DebugState::new("DecorationsManager")
            .with("active_window", self.screen.active_window())
            .with("windows", self.windows.borrow().len())
            .with("shadow_offset", format!("{:?}", settings.offset))
            .with("active_shadow_radius", settings.active_radius)
            .with("inactive_shadow_radius", settings.inactive_radius);
        for window in self.windows.borrow().values() {
            state.children.push(window.debug_state());
        }
        state
    }
}
