// Copyright 2023 the Sill Authors
// SPDX-License-Identifier: Apache-2.0

//! The per-window decoration controller.
//!
//! One `DecoratedWindow` exists per managed top-level. It decides which
//! decoration elements the window gets, owns the input-only frame window,
//! the widget tree and the cached decoration textures, and implements the
//! compositor's paint protocol for the non-client area.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use anyhow::{Context as _, Result};
use tracing::{debug, warn};

use crate::compositor::{
    DecorElements, GlMatrix, HostWindowRef, PaintAttrib, PaintMask, PaintSink, ScreenRef,
    Timestamp, WindowActions, WindowType, Xid, MAXIMIZE_STATE, OPAQUE,
};
use crate::debug::DebugState;
use crate::dialog::ForceQuitDialog;
use crate::geometry::{Extents, Rect, Region};
use crate::indicator::IndicatorSourceRef;
use crate::input::InputMixer;
use crate::pool::DataPool;
use crate::shadow::{self, ShadowQuads};
use crate::style::{Side, Style, WidgetState, WindowButtonType};
use crate::texture::{SimpleTextureQuad, Texture, TextureQuad};
use crate::timers::{TimerQueue, TimerToken};
use crate::widget::{
    EdgeBorders, ItemRef, Layout, MenuLayout, Padding, SlidingLayout, Title, Widget, WindowButton,
};
use crate::wire;

/// Which situation the element policy is evaluated for.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum WindowFilter {
    None,
    ClientsideDecorated,
    /// `_NET_REQUEST_FRAME_EXTENTS` handling: the window is not mapped yet.
    Unmapped,
}

/// Shadow textures shared between every rectangular window, owned by the
/// manager and rebuilt on style changes.
#[derive(Default)]
pub struct SharedShadowTextures {
    pub active: RefCell<Option<Rc<dyn Texture>>>,
    pub inactive: RefCell<Option<Rc<dyn Texture>>>,
}

/// Atoms the decoration core needs at runtime, interned by the host.
pub struct DecorAtoms {
    pub wm_name: u32,
    pub net_wm_name: u32,
    pub net_wm_visible_name: u32,
    pub net_active_window: u32,
    pub net_wm_moveresize: u32,
    pub net_request_frame_extents: u32,
    pub net_frame_extents: u32,
    pub net_wm_allowed_actions: u32,
    pub motif_wm_hints: u32,
    pub gtk_border_radius: u32,
    pub toolkit_action: u32,
    pub toolkit_action_force_quit_dialog: u32,
}

pub struct DecoratedWindow {
    screen: ScreenRef,
    win: HostWindowRef,
    pool: Rc<DataPool>,
    timers: Rc<RefCell<TimerQueue>>,
    indicators: Option<IndicatorSourceRef>,
    atoms: Rc<DecorAtoms>,
    shadow_textures: Rc<SharedShadowTextures>,

    active: Cell<bool>,
    scaled: Cell<bool>,
    monitor: Cell<usize>,
    dpi_scale: Cell<f64>,

    frame: Cell<Xid>,
    frame_geo: Cell<Rect>,
    frame_region: RefCell<Region>,
    framed_callback: RefCell<Option<Box<dyn Fn(bool, Xid)>>>,

    elements: Cell<DecorElements>,
    client_decorated: Cell<bool>,
    client_borders: Cell<Extents>,
    last_mwm_decor: Cell<crate::compositor::MwmDecor>,
    last_actions: Cell<WindowActions>,
    dirty_geo: Cell<bool>,
    dirty_frame: Cell<bool>,

    last_title: RefCell<Option<String>>,
    last_shadow_rect: Cell<Rect>,
    shadow_quads: RefCell<ShadowQuads>,
    shaped_shadow: RefCell<Option<(Rc<dyn Texture>, TextureQuad)>>,
    bg_textures: RefCell<Vec<SimpleTextureQuad>>,

    input_mixer: RefCell<Option<Rc<RefCell<InputMixer>>>>,
    edge_borders: RefCell<Option<Rc<RefCell<EdgeBorders>>>>,
    top_layout: RefCell<Option<Rc<RefCell<Layout>>>>,
    title: RefCell<Option<Rc<RefCell<Title>>>>,
    sliding_layout: RefCell<Option<Rc<RefCell<SlidingLayout>>>>,
    menus: RefCell<Option<Rc<RefCell<MenuLayout>>>>,
    force_quit: RefCell<Option<ForceQuitDialog>>,

    panel_id: String,
}

impl DecoratedWindow {
    pub fn new(
        screen: ScreenRef,
        win: HostWindowRef,
        pool: Rc<DataPool>,
        timers: Rc<RefCell<TimerQueue>>,
        indicators: Option<IndicatorSourceRef>,
        atoms: Rc<DecorAtoms>,
        shadow_textures: Rc<SharedShadowTextures>,
    ) -> Rc<DecoratedWindow> {
        let panel_id = format!("WindowLIM{}", win.id());
        let window = Rc::new(DecoratedWindow {
            screen,
            last_mwm_decor: Cell::new(win.mwm_decor()),
            last_actions: Cell::new(win.actions()),
            win,
            pool,
            timers,
            indicators,
            atoms,
            shadow_textures,
            active: Cell::new(false),
            scaled: Cell::new(false),
            monitor: Cell::new(0),
            dpi_scale: Cell::new(1.0),
            frame: Cell::new(0),
            frame_geo: Cell::new(Rect::ZERO),
            frame_region: RefCell::new(Region::EMPTY),
            framed_callback: RefCell::new(None),
            elements: Cell::new(DecorElements::empty()),
            client_decorated: Cell::new(false),
            client_borders: Cell::new(Extents::ZERO),
            dirty_geo: Cell::new(true),
            dirty_frame: Cell::new(false),
            last_title: RefCell::new(None),
            last_shadow_rect: Cell::new(Rect::ZERO),
            shadow_quads: RefCell::new(ShadowQuads::default()),
            shaped_shadow: RefCell::new(None),
            bg_textures: RefCell::new(Vec::new()),
            input_mixer: RefCell::new(None),
            edge_borders: RefCell::new(None),
            top_layout: RefCell::new(None),
            title: RefCell::new(None),
            sliding_layout: RefCell::new(None),
            menus: RefCell::new(None),
            force_quit: RefCell::new(None),
            panel_id,
        });
        if window.win.is_viewable() || window.win.shaded() {
            window.update();
        }
        window
    }

    pub fn xid(&self) -> Xid {
        self.win.id()
    }

    pub fn host_window(&self) -> &HostWindowRef {
        &self.win
    }

    pub fn frame(&self) -> Xid {
        self.frame.get()
    }

    pub fn input_mixer(&self) -> Option<Rc<RefCell<InputMixer>>> {
        self.input_mixer.borrow().clone()
    }

    pub fn is_active(&self) -> bool {
        self.active.get()
    }

    pub fn scaled(&self) -> bool {
        self.scaled.get()
    }

    pub fn set_scaled(&self, scaled: bool) {
        if self.scaled.get() != scaled {
            self.scaled.set(scaled);
            self.update();
        }
    }

    pub fn dpi_scale(&self) -> f64 {
        self.dpi_scale.get()
    }

    pub fn elements(&self) -> DecorElements {
        self.elements.get()
    }

    pub fn last_shadow_rect(&self) -> Rect {
        self.last_shadow_rect.get()
    }

    /// Called by the manager so it can maintain the frame-xid index.
    pub fn set_framed_callback(&self, callback: Box<dyn Fn(bool, Xid)>) {
        *self.framed_callback.borrow_mut() = Some(callback);
    }

    // Title property

    pub fn title(&self) -> String {
        if let Some(title) = self.title.borrow().as_ref() {
            return title.borrow().text().to_string();
        }
        let mut cached = self.last_title.borrow_mut();
        cached
            .get_or_insert_with(|| self.screen.window_name(self.win.id()))
            .clone()
    }

    pub fn set_title(&self, new_title: String) {
        if let Some(title) = self.title.borrow().as_ref() {
            if title.borrow().text() == new_title {
                return;
            }
            title.borrow_mut().set_text(new_title);
            if let Some(layout) = self.top_layout.borrow().as_ref() {
                layout.borrow_mut().relayout();
            }
            self.redraw_decorations();
        } else {
            *self.last_title.borrow_mut() = Some(new_title);
        }
    }

    // Active state

    pub fn set_active(&self, active: bool) {
        if self.active.get() == active {
            return;
        }
        self.active.set(active);
        self.bg_textures.borrow_mut().clear();
        if let Some(layout) = self.top_layout.borrow().as_ref() {
            layout.borrow_mut().set_focused(active);
        }
        self.redraw_decorations();
    }

    // Element policy

    fn is_maximized(&self) -> bool {
        self.win.state().contains(MAXIMIZE_STATE)
    }

    fn compute_elements(&self, filter: WindowFilter) -> DecorElements {
        let win = &self.win;

        if filter != WindowFilter::Unmapped {
            if !win.is_viewable() && !win.shaded() {
                return DecorElements::empty();
            }
            if win.override_redirect() {
                return DecorElements::empty();
            }
        }

        let decorable_type = matches!(
            win.window_type(),
            WindowType::Normal | WindowType::Dialog | WindowType::ModalDialog | WindowType::Utility
        );
        if !decorable_type {
            return DecorElements::empty();
        }

        if filter != WindowFilter::Unmapped && self.screen.has_shape() && win.is_shaped() {
            return DecorElements::SHADOW | DecorElements::SHAPED;
        }

        if filter == WindowFilter::ClientsideDecorated {
            return DecorElements::SHADOW;
        }

        let mut elements = DecorElements::empty();
        if filter != WindowFilter::Unmapped {
            elements |= DecorElements::SHADOW;
        }

        let wants_border = !win.mwm_decor().is_empty()
            && matches!(
                win.window_type(),
                WindowType::Normal | WindowType::Dialog | WindowType::ModalDialog
            );
        if wants_border {
            elements |= DecorElements::BORDER;
        }
        if filter != WindowFilter::Unmapped
            && win
                .actions()
                .intersects(WindowActions::MOVE | WindowActions::RESIZE)
        {
            elements |= DecorElements::EDGE;
        }

        elements
    }

    fn update_elements(&self, filter: WindowFilter) {
        if !self.scaled.get() && self.is_maximized() {
            self.elements.set(DecorElements::empty());
            return;
        }
        self.elements.set(self.compute_elements(filter));
    }

    fn update_client_decorations_state(&self) {
        if self.win.alpha() {
            let corners = self
                .screen
                .cardinal_property(self.win.id(), self.atoms.gtk_border_radius);
            if let Some(borders) = wire::client_border_radii(&corners) {
                self.client_borders.set(borders);
                self.client_decorated.set(true);
                return;
            }
        }
        if self.client_decorated.get() {
            self.client_borders.set(Extents::ZERO);
            self.client_decorated.set(false);
        }
    }

    // The update entry point

    pub fn update(&self) {
        self.update_client_decorations_state();
        let filter = if self.client_decorated.get() {
            WindowFilter::ClientsideDecorated
        } else {
            WindowFilter::None
        };
        self.update_elements(filter);

        if self
            .elements
            .get()
            .intersects(DecorElements::EDGE | DecorElements::BORDER)
        {
            if let Err(e) = self.decorate() {
                warn!("failed to decorate 0x{:x}: {:#}", self.win.id(), e);
                self.undecorate();
            }
        } else {
            self.undecorate();
        }

        self.last_mwm_decor.set(self.win.mwm_decor());
        self.last_actions.set(self.win.actions());
    }

    fn decorate(&self) -> Result<()> {
        self.setup_extents();
        self.update_frame()?;
        self.setup_window_edges();

        if self.elements.get().contains(DecorElements::BORDER) {
            self.setup_window_controls();
        } else {
            self.cleanup_window_controls();
            self.bg_textures.borrow_mut().clear();
        }
        Ok(())
    }

    pub fn undecorate(&self) {
        self.unset_extents();
        self.unset_frame();
        self.cleanup_window_controls();
        self.cleanup_window_edges();
        self.bg_textures.borrow_mut().clear();
    }

    // Frame extents

    fn scaled_border_extents(&self) -> Extents {
        if self.elements.get().contains(DecorElements::BORDER) {
            Style::get().border().scaled(self.dpi_scale.get())
        } else {
            Extents::ZERO
        }
    }

    fn setup_extents(&self) {
        if self.win.has_unmap_reference() {
            return;
        }

        let border = self.scaled_border_extents();
        let mut input = border;
        if self.elements.get().contains(DecorElements::EDGE) {
            input = input + Style::get().input_border().scaled(self.dpi_scale.get());
        }

        if self.win.border() != border || self.win.input() != input {
            self.win.set_frame_extents(border, input);
        }
    }

    fn unset_extents(&self) {
        if self.win.has_unmap_reference() {
            return;
        }
        if !self.win.border().is_zero() || !self.win.input().is_zero() {
            self.win.set_frame_extents(Extents::ZERO, Extents::ZERO);
        }
    }

    /// Answers `_NET_REQUEST_FRAME_EXTENTS` without decorating.
    pub fn send_frame_extents(&self) {
        self.update_elements(WindowFilter::Unmapped);
        let border = self.scaled_border_extents();
        self.screen.change_cardinal_property(
            self.win.id(),
            self.atoms.net_frame_extents,
            &wire::frame_extents_property(border),
        );
    }

    // Frame window

    fn update_frame(&self) -> Result<()> {
        let input = self.win.input();
        let server = self.win.server_geometry();
        let mut frame_geo = Rect::new(
            0,
            0,
            server.width + input.left + input.right,
            server.height + input.top + input.bottom,
        );
        if self.win.shaded() {
            frame_geo.height = input.top + input.bottom;
        }

        if self.frame.get() == 0 && self.win.frame() != 0 {
            self.create_frame(frame_geo)?;
        }
        if self.frame.get() != 0 && self.frame_geo.get() != frame_geo {
            self.update_frame_geo(frame_geo);
        }
        Ok(())
    }

    fn create_frame(&self, frame_geo: Rect) -> Result<()> {
        let frame = self
            .screen
            .create_frame(self.win.frame(), frame_geo)
            .context("create input frame")?;
        self.frame.set(frame);
        if let Some(callback) = self.framed_callback.borrow().as_ref() {
            callback(true, frame);
        }
        Ok(())
    }

    fn unset_frame(&self) {
        let frame = self.frame.get();
        if frame == 0 {
            return;
        }
        self.screen.destroy_frame(frame);
        if let Some(callback) = self.framed_callback.borrow().as_ref() {
            callback(false, frame);
        }
        self.frame.set(0);
        self.frame_geo.set(Rect::ZERO);
        self.frame_region.borrow_mut().clear();
    }

    fn update_frame_geo(&self, frame_geo: Rect) {
        let input = self.win.input();
        let frame = self.frame.get();
        self.screen.configure_frame(frame, frame_geo);

        // Four rectangles stitched to cover only the border, never the
        // client area.
        let mut rects = Vec::with_capacity(4);
        let middle_height = frame_geo.height - input.top - input.bottom;
        for rect in [
            Rect::new(0, 0, frame_geo.width, input.top),
            Rect::new(0, input.top, input.left, middle_height),
            Rect::new(
                frame_geo.width - input.right,
                input.top,
                input.right,
                middle_height,
            ),
            Rect::new(0, frame_geo.height - input.bottom, frame_geo.width, input.bottom),
        ] {
            if !rect.is_empty() {
                rects.push(rect);
            }
        }
        self.screen.set_frame_shape(frame, &rects);

        self.frame_geo.set(frame_geo);
        self.sync_shape_with_frame_region();
    }

    /// Re-reads the frame's input shape from the server and hands the new
    /// region to the compositor.
    pub fn sync_shape_with_frame_region(&self) {
        let mut region = Region::EMPTY;
        for rect in self.screen.frame_input_shape(self.frame.get()) {
            region.add_rect(rect);
        }
        *self.frame_region.borrow_mut() = region;
        self.win.update_frame_region();
    }

    /// Merges the frame region, in screen coordinates, into the
    /// compositor's aggregate.
    pub fn update_frame_region(&self, region: &mut Region) {
        let frame_region = self.frame_region.borrow();
        if frame_region.is_empty() {
            return;
        }
        let geo = self.win.geometry();
        let input = self.win.input();
        let translated = frame_region.translated(geo.x - input.left, geo.y - input.top);
        for rect in translated.rects() {
            region.add_rect(*rect);
        }
        self.update_decoration_position_delayed();
    }

    /// Expands the compositor's output extents to cover the shadow.
    pub fn update_output_extents(&self, output: &mut Extents) {
        let geo = self.win.geometry();
        let shadow = self.last_shadow_rect.get();
        if shadow.is_empty() {
            return;
        }
        output.top = output.top.max(geo.y - shadow.y0());
        output.left = output.left.max(geo.x - shadow.x0());
        output.right = output.right.max(shadow.x1() - geo.x1());
        output.bottom = output.bottom.max(shadow.y1() - geo.y1());
    }

    // Edges

    fn setup_window_edges(&self) {
        if self.input_mixer.borrow().is_some() {
            return;
        }
        let mixer = Rc::new(RefCell::new(InputMixer::new()));
        let borders = Rc::new(RefCell::new(EdgeBorders::new(
            self.screen.clone(),
            self.win.clone(),
            self.timers.clone(),
        )));
        borders.borrow_mut().set_scale(self.dpi_scale.get());
        mixer.borrow_mut().push_to_front(borders.clone());
        *self.input_mixer.borrow_mut() = Some(mixer);
        *self.edge_borders.borrow_mut() = Some(borders);
        self.update_window_edges_geo();
    }

    fn update_window_edges_geo(&self) {
        if let Some(borders) = self.edge_borders.borrow().as_ref() {
            borders.borrow_mut().set_frame(self.win.input_geometry());
        }
    }

    fn cleanup_window_edges(&self) {
        *self.input_mixer.borrow_mut() = None;
        *self.edge_borders.borrow_mut() = None;
    }

    // Window controls (top layout)

    fn setup_window_controls(&self) {
        if self.top_layout.borrow().is_some() {
            return;
        }
        let style = Style::get();
        let scale = self.dpi_scale.get();

        let padding = style.padding(Side::Top, WidgetState::Normal);
        let top_layout = Rc::new(RefCell::new(Layout::new()));
        {
            let mut layout = top_layout.borrow_mut();
            layout.set_padding(Padding {
                inner: 0,
                left: padding.left,
                right: padding.right,
                top: padding.top,
                bottom: 0,
            });
            layout.set_focused(self.active.get());
            layout.core_mut().scale = scale;
        }

        let actions = self.win.actions();
        let buttons = [
            (WindowActions::CLOSE, WindowButtonType::Close),
            (WindowActions::MINIMIZE, WindowButtonType::Minimize),
            (WindowActions::MAXIMIZE, WindowButtonType::Maximize),
        ];
        for (mask, kind) in buttons {
            if actions.intersects(mask) {
                let button = Rc::new(RefCell::new(WindowButton::new(
                    self.win.clone(),
                    self.pool.clone(),
                    kind,
                )));
                button.borrow_mut().set_scale(scale);
                top_layout.borrow_mut().append(button);
            }
        }

        let text = self
            .last_title
            .borrow_mut()
            .take()
            .unwrap_or_else(|| self.screen.window_name(self.win.id()));
        let title = Rc::new(RefCell::new(Title::new(self.screen.clone(), text)));
        title.borrow_mut().set_scale(scale);

        let sliding = Rc::new(RefCell::new(SlidingLayout::new()));
        let title_item: ItemRef = title.clone();
        sliding.borrow_mut().set_main_item(Some(title_item));

        let title_layout = Rc::new(RefCell::new(Layout::new()));
        title_layout.borrow_mut().set_padding(Padding {
            left: style.title_indent(),
            ..Padding::default()
        });
        title_layout.borrow_mut().append(sliding.clone());
        top_layout.borrow_mut().append(title_layout);

        if let Some(mixer) = self.input_mixer.borrow().as_ref() {
            mixer.borrow_mut().push_to_front(top_layout.clone());
        }

        *self.title.borrow_mut() = Some(title);
        *self.sliding_layout.borrow_mut() = Some(sliding);
        *self.top_layout.borrow_mut() = Some(top_layout);
        self.dirty_frame.set(false);

        self.setup_app_menu();
        self.redraw_decorations();
    }

    fn cleanup_window_controls(&self) {
        if let Some(title) = self.title.borrow().as_ref() {
            *self.last_title.borrow_mut() = Some(title.borrow().text().to_string());
        }
        if let (Some(mixer), Some(layout)) = (
            self.input_mixer.borrow().as_ref(),
            self.top_layout.borrow().as_ref(),
        ) {
            let layout: ItemRef = layout.clone();
            mixer.borrow_mut().remove(&layout);
        }
        self.unset_app_menu();
        *self.title.borrow_mut() = None;
        *self.sliding_layout.borrow_mut() = None;
        *self.top_layout.borrow_mut() = None;
    }

    /// Marks the frame dirty when the window's hints or allowed actions
    /// changed; the next paint rebuilds the controls.
    pub fn update_frame_actions(&self) {
        if !self.dirty_frame.get()
            && (self.win.mwm_decor() != self.last_mwm_decor.get()
                || self.win.actions() != self.last_actions.get())
        {
            self.dirty_frame.set(true);
            self.damage();
        }
    }

    // Application menu

    pub fn setup_app_menu(&self) {
        let Some(sliding) = self.sliding_layout.borrow().clone() else {
            return;
        };
        {
            let mut sliding = sliding.borrow_mut();
            sliding.set_input_item(None);
            sliding.set_mouse_owner(false);
            sliding.override_main_item = false;
        }
        *self.menus.borrow_mut() = None;

        let Some(indicators) = self.indicators.clone() else {
            return;
        };
        if !indicators.has_app_menu() || !indicators.integrated_menus() {
            return;
        }

        let menus = Rc::new(RefCell::new(MenuLayout::new(
            self.screen.clone(),
            self.win.clone(),
            indicators.clone(),
            self.timers.clone(),
        )));
        {
            let mut m = menus.borrow_mut();
            m.set_focused(self.active.get());
            m.core_mut().scale = self.dpi_scale.get();
            m.setup();
            if m.is_empty() {
                return;
            }
        }

        {
            let menus_item: ItemRef = menus.clone();
            let mut sliding = sliding.borrow_mut();
            sliding.set_input_item(Some(menus_item));
            sliding.fadein = std::time::Duration::from_millis(indicators.fadein_ms() as u64);
            sliding.fadeout = std::time::Duration::from_millis(indicators.fadeout_ms() as u64);
            if indicators.always_show_menus() {
                sliding.override_main_item = true;
            }
        }
        *self.menus.borrow_mut() = Some(menus);

        if !indicators.always_show_menus() {
            let pointer = self.screen.pointer_position();
            let over_grab = self
                .edge_borders
                .borrow()
                .as_ref()
                .map(|borders| {
                    let borders = borders.borrow();
                    let grab = borders.grab_edge().borrow();
                    grab.core().mouse_owner || grab.geometry().contains(pointer)
                })
                .unwrap_or(false);
            if over_grab {
                sliding.borrow_mut().set_mouse_owner(true);
            }
        }

        self.sync_menus_geometries();
    }

    pub fn unset_app_menu(&self) {
        if self.menus.borrow().is_none() {
            return;
        }
        if let Some(indicators) = &self.indicators {
            indicators.sync_geometries(&self.panel_id, Vec::new());
        }
        if let Some(sliding) = self.sliding_layout.borrow().as_ref() {
            sliding.borrow_mut().set_input_item(None);
        }
        *self.menus.borrow_mut() = None;
    }

    fn sync_menus_geometries(&self) {
        let Some(menus) = self.menus.borrow().clone() else {
            return;
        };
        if let Some(indicators) = &self.indicators {
            indicators.sync_geometries(&self.panel_id, menus.borrow().children_geometries());
        }
    }

    /// Re-reads indicator entry states, typically after the service
    /// reported an update for this window.
    pub fn update_app_menu(&self) {
        if let Some(menus) = self.menus.borrow().as_ref() {
            menus.borrow_mut().update_entries();
        }
        self.sync_menu_visibility();
        self.sync_menus_geometries();
    }

    pub fn activate_menu(&self, entry_id: &str) -> bool {
        match self.menus.borrow().as_ref() {
            Some(menus) => menus.borrow_mut().activate_menu(entry_id),
            None => false,
        }
    }

    /// Drives the title ↔ menu crossfade from the grab edge and menu
    /// state. Called after every routed input event and timer.
    pub fn sync_menu_visibility(&self) {
        let Some(sliding) = self.sliding_layout.borrow().clone() else {
            return;
        };
        let Some(menus) = self.menus.borrow().clone() else {
            return;
        };
        if sliding.borrow().override_main_item {
            return;
        }

        let menus_ref = menus.borrow();
        let mut owner =
            menus_ref.any_mouse_owner() || menus_ref.any_active() || menus_ref.shows_now();
        drop(menus_ref);

        if !owner {
            if let Some(borders) = self.edge_borders.borrow().as_ref() {
                owner = borders.borrow().grab_edge().borrow().core().mouse_owner;
            }
        }

        let changed = sliding.borrow().core().mouse_owner != owner;
        if changed {
            sliding.borrow_mut().set_mouse_owner(owner);
            self.damage();
        }
    }

    /// Post-processing after the manager routed an input event here.
    pub fn after_input_event(&self) {
        self.sync_menu_visibility();
    }

    // Timers

    pub fn handle_timer(&self, token: TimerToken) -> bool {
        if let Some(borders) = self.edge_borders.borrow().clone() {
            let handled = {
                let borders = borders.borrow();
                let grab = borders.grab_edge().clone();
                let fired = grab.borrow_mut().timer_fired(token);
                fired
            };
            if handled {
                return true;
            }
        }
        if let Some(menus) = self.menus.borrow().clone() {
            if menus.borrow_mut().timer_fired(token) {
                self.sync_menu_visibility();
                self.damage();
                return true;
            }
        }
        false
    }

    // Monitor / DPI

    fn update_monitor(&self) {
        let input = self.win.input_geometry();
        let monitor = self.screen.monitor_geometry_in(input);
        let scale = self
            .screen
            .monitor_scales()
            .get(monitor)
            .copied()
            .unwrap_or(1.0);

        if monitor != self.monitor.get() || (scale - self.dpi_scale.get()).abs() > f64::EPSILON {
            self.monitor.set(monitor);
            self.dpi_scale.set(scale);
            self.update();

            if let Some(layout) = self.top_layout.borrow().as_ref() {
                layout.borrow_mut().set_scale(scale);
            }
            if let Some(borders) = self.edge_borders.borrow().as_ref() {
                borders.borrow_mut().set_scale(scale);
            }
        }
    }

    // Shadows

    fn shadow_radius(&self) -> u32 {
        let style = Style::get();
        if self.active.get() || self.scaled.get() {
            style.active_shadow_radius()
        } else {
            style.inactive_shadow_radius()
        }
    }

    fn shared_shadow_texture(&self) -> Option<Rc<dyn Texture>> {
        if self.active.get() || self.scaled.get() {
            self.shadow_textures.active.borrow().clone()
        } else {
            self.shadow_textures.inactive.borrow().clone()
        }
    }

    pub fn compute_shadow_quads(&self) {
        let elements = self.elements.get();
        if !elements.contains(DecorElements::SHADOW) {
            if !self.last_shadow_rect.get().is_empty() {
                self.last_shadow_rect.set(Rect::ZERO);
            }
            *self.shaped_shadow.borrow_mut() = None;
        } else if elements.contains(DecorElements::SHAPED) {
            self.compute_shaped_shadow_quad();
        } else {
            *self.shaped_shadow.borrow_mut() = None;
            self.compute_generic_shadow_quads();
        }
    }

    fn compute_generic_shadow_quads(&self) {
        let Some(texture) = self.shared_shadow_texture() else {
            return;
        };
        if texture.size().is_empty() {
            return;
        }

        let style = Style::get();
        let mut quads = shadow::generic_shadow_quads(
            texture.as_ref(),
            self.win.border_geometry(),
            self.win.geometry(),
            style.shadow_offset(),
            self.shadow_radius(),
        );

        let shadow_rect = quads.bounding_rect();
        if shadow_rect == self.last_shadow_rect.get() {
            return;
        }

        let mut win_region = self.win.region();
        if self.client_decorated.get() {
            // The client paints its own rounded corners; pull the region in
            // by the corner radii so the shadow shows through there.
            let borders = self.client_borders.get();
            win_region = win_region
                .shrunk(
                    (borders.left + borders.right) / 2,
                    (borders.top + borders.bottom) / 2,
                )
                .translated(
                    (borders.left - borders.right) / 2,
                    (borders.top - borders.bottom) / 2,
                );
        }
        quads.clip_to_window(&win_region);

        *self.shadow_quads.borrow_mut() = quads;
        self.last_shadow_rect.set(shadow_rect);
        self.win.update_output_extents();
    }

    fn compute_shaped_shadow_quad(&self) {
        let style = Style::get();
        let (color, radius) = if self.active.get() {
            (style.active_shadow_color(), style.active_shadow_radius())
        } else {
            (style.inactive_shadow_color(), style.inactive_shadow_radius())
        };

        let Some(shape) = self.screen.shape_extents(self.win.id()) else {
            warn!("shape query returned no extents for 0x{:x}", self.win.id());
            return;
        };

        let size = shadow::shaped_shadow_size(&shape, radius);
        let needs_texture = {
            let last = self.last_shadow_rect.get();
            size.width != last.width || size.height != last.height
        } || self.shaped_shadow.borrow().is_none();

        let texture = if needs_texture {
            match shadow::build_shaped_shadow_texture(&self.screen, radius, color, &shape) {
                Ok(texture) => texture,
                Err(e) => {
                    warn!("shaped shadow build failed for 0x{:x}: {:#}", self.win.id(), e);
                    return;
                }
            }
        } else {
            match self.shaped_shadow.borrow().as_ref() {
                Some((texture, _)) => texture.clone(),
                None => return,
            }
        };

        let border = self.win.border_geometry();
        let mut quad = shadow::shaped_shadow_quad(
            texture.as_ref(),
            border,
            style.shadow_offset(),
            radius,
            shape.bounds.origin(),
        );

        let shadow_rect = quad.box_;
        if shadow_rect != self.last_shadow_rect.get() {
            let mut region = Region::from_rect(quad.box_);
            region.subtract_region(&self.win.region());
            quad.region = region;

            self.last_shadow_rect.set(shadow_rect);
            self.win.update_output_extents();
        } else if let Some((_, old)) = self.shaped_shadow.borrow().as_ref() {
            quad.region = old.region.clone();
        }

        *self.shaped_shadow.borrow_mut() = Some((texture, quad));
    }

    // Decoration textures

    fn render_decoration_texture(&self, side: Side, index: usize, geo: Rect) {
        if geo.is_empty() {
            return;
        }
        let mut textures = self.bg_textures.borrow_mut();
        let deco_tex = &mut textures[index];

        if deco_tex.quad.box_.size() != geo.size() {
            let scale = self.dpi_scale.get();
            let state = if self.active.get() {
                WidgetState::Normal
            } else {
                WidgetState::Backdrop
            };
            match self.screen.create_texture_surface(geo.size(), scale) {
                Ok(ctx) => {
                    let cr = ctx.cr();
                    cr.save().ok();
                    cr.scale(scale, scale);
                    Style::get().draw_side(
                        side,
                        state,
                        cr,
                        geo.width as f64 / scale,
                        geo.height as f64 / scale,
                    );
                    cr.restore().ok();
                    deco_tex.set_texture(Some(ctx.into_texture()));
                }
                Err(e) => {
                    warn!("failed to render {:?} decoration: {:#}", side, e);
                    deco_tex.set_texture(None);
                    return;
                }
            }
        }

        deco_tex.set_coords(geo.origin());
        deco_tex.set_box(geo);
    }

    fn update_decoration_textures(&self) {
        if self.top_layout.borrow().is_none() {
            self.bg_textures.borrow_mut().clear();
            return;
        }

        let geo = self.win.border_geometry();
        let border = self.win.border();

        if self.bg_textures.borrow().len() != 4 {
            self.bg_textures
                .borrow_mut()
                .resize_with(4, SimpleTextureQuad::default);
        }

        self.render_decoration_texture(Side::Top, 0, Rect::new(geo.x, geo.y, geo.width, border.top));
        self.render_decoration_texture(
            Side::Left,
            1,
            Rect::new(
                geo.x,
                geo.y + border.top,
                border.left,
                geo.height - border.top - border.bottom,
            ),
        );
        self.render_decoration_texture(
            Side::Right,
            2,
            Rect::new(
                geo.x1() - border.right,
                geo.y + border.top,
                border.right,
                geo.height - border.top - border.bottom,
            ),
        );
        self.render_decoration_texture(
            Side::Bottom,
            3,
            Rect::new(geo.x, geo.y1() - border.bottom, geo.width, border.bottom),
        );

        if let Some(layout) = self.top_layout.borrow().as_ref() {
            layout
                .borrow_mut()
                .set_frame(Rect::new(geo.x, geo.y, geo.width, border.top));
        }

        self.sync_menus_geometries();
    }

    // Position updates and paint protocol

    pub fn update_decoration_position(&self) {
        self.update_monitor();
        self.compute_shadow_quads();
        self.update_window_edges_geo();
        self.update_decoration_textures();
        if let Some(dialog) = self.force_quit.borrow().as_ref() {
            dialog.update_position();
        }
        self.dirty_geo.set(false);
    }

    pub fn update_decoration_position_delayed(&self) {
        self.dirty_geo.set(true);
    }

    /// First decoration call of a paint pass.
    pub fn paint(
        &self,
        _transform: &GlMatrix,
        _attrib: &PaintAttrib,
        _region: &Region,
        mask: PaintMask,
    ) {
        if !mask.contains(PaintMask::SCREEN_TRANSFORMED)
            && self.win.default_viewport() != self.screen.viewport()
        {
            return;
        }

        if self.dirty_geo.get() {
            self.update_decoration_position();
        }

        if self.dirty_frame.get() {
            // Picks up changed actions: the number of buttons may differ.
            self.dirty_frame.set(false);
            self.cleanup_window_controls();
            self.cleanup_window_edges();
            self.update();
        }
    }

    /// Emits the shadow, the four side textures, and the widget tree.
    pub fn draw(
        &self,
        sink: &mut dyn PaintSink,
        transform: &GlMatrix,
        attrib: &PaintAttrib,
        region: &Region,
        mask: PaintMask,
    ) {
        if self.last_shadow_rect.get().is_empty() {
            return;
        }
        if !mask.contains(PaintMask::SCREEN_TRANSFORMED)
            && self.win.default_viewport() != self.screen.viewport()
        {
            return;
        }

        let infinite = Region::from_rect(Rect::new(i32::MIN / 2, i32::MIN / 2, i32::MAX, i32::MAX));
        let clip = if mask.contains(PaintMask::WINDOW_TRANSFORMED) {
            &infinite
        } else {
            region
        };

        let mut mask = mask | PaintMask::WINDOW_BLEND;
        if self.win.alpha() || attrib.opacity != OPAQUE {
            mask |= PaintMask::WINDOW_TRANSLUCENT;
        }

        if let Some((texture, quad)) = self.shaped_shadow.borrow().as_ref() {
            sink.draw_textured(
                texture.as_ref(),
                std::slice::from_ref(quad),
                transform,
                *attrib,
                mask,
                clip,
            );
        } else if let Some(texture) = self.shared_shadow_texture() {
            let quads = self.shadow_quads.borrow();
            sink.draw_textured(texture.as_ref(), quads.all(), transform, *attrib, mask, clip);
        }

        for deco_tex in self.bg_textures.borrow().iter() {
            if let Some(texture) = deco_tex.texture() {
                sink.draw_textured(
                    texture.as_ref(),
                    std::slice::from_ref(&deco_tex.quad),
                    transform,
                    *attrib,
                    mask,
                    clip,
                );
            }
        }

        if let Some(layout) = self.top_layout.borrow().clone() {
            layout
                .borrow_mut()
                .draw(sink, transform, *attrib, region, mask);
        }
    }

    pub fn damage(&self) {
        self.win.damage_output_extents();
    }

    /// Flags the geometry dirty and damages, so the next paint rebuilds
    /// positions and textures.
    pub fn redraw_decorations(&self) {
        if !self.win.is_mapped() {
            return;
        }
        self.dirty_geo.set(true);
        self.win.damage_output_extents();
    }

    // Force-quit dialog

    pub fn show_force_quit_dialog(&self, show: bool, time: Timestamp) {
        if show {
            let mut dialog = self.force_quit.borrow_mut();
            match dialog.as_ref() {
                Some(dialog) => dialog.set_time(time),
                None => {
                    debug!("opening force-quit dialog for 0x{:x}", self.win.id());
                    *dialog = Some(ForceQuitDialog::new(self.win.clone(), time));
                }
            }
        } else {
            *self.force_quit.borrow_mut() = None;
        }
    }

    pub fn has_force_quit_dialog(&self) -> bool {
        self.force_quit.borrow().is_some()
    }

    /// The dialog asked to go away.
    pub fn dismiss_force_quit_dialog(&self) {
        *self.force_quit.borrow_mut() = None;
    }

    // Introspection

    pub fn debug_state(&self) -> DebugState {
        let elements = self.elements.get();
        let state = self.win.state();
        let actions = self.win.actions();
        let mut debug = DebugState::new("DecoratedWindow")
            .with("xid", format!("0x{:x}", self.win.id()))
            .with("title", self.title())
            .with("active", self.active.get())
            .with("scaled", self.scaled.get())
            .with("monitor", self.monitor.get())
            .with("dpi_scale", self.dpi_scale.get())
            .with("border_geo", format!("{:?}", self.win.border_geometry()))
            .with("input_geo", format!("{:?}", self.win.input_geometry()))
            .with("content_geo", format!("{:?}", self.win.geometry()))
            .with("framed", self.frame.get() != 0)
            .with("frame_geo", format!("{:?}", self.frame_geo.get()))
            .with("shadow_rect", format!("{:?}", self.last_shadow_rect.get()))
            .with("shadow_decorated", elements.contains(DecorElements::SHADOW))
            .with("fully_decorated", elements.contains(DecorElements::BORDER))
            .with("maximized", self.is_maximized())
            .with(
                "v_maximized",
                state.contains(crate::compositor::WindowState::MAXIMIZED_VERT),
            )
            .with(
                "h_maximized",
                state.contains(crate::compositor::WindowState::MAXIMIZED_HORZ),
            )
            .with("resizable", actions.contains(WindowActions::RESIZE))
            .with("movable", actions.contains(WindowActions::MOVE))
            .with("closable", actions.contains(WindowActions::CLOSE))
            .with("minimizable", actions.contains(WindowActions::MINIMIZE))
            .with("maximizable", actions.intersects(WindowActions::MAXIMIZE));
        if let Some(layout) = self.top_layout.borrow().as_ref() {
            debug.children.push(layout.borrow().debug_state());
        }
        if let Some(borders) = self.edge_borders.borrow().as_ref() {
            debug.children.push(borders.borrow().debug_state());
        }
        if let Some(dialog) = self.force_quit.borrow().as_ref() {
            debug.children.push(dialog.debug_state());
        }
        debug
    }

    /// Number of cached decoration textures, exposed for the teardown
    /// round-trip checks.
    pub fn cached_texture_count(&self) -> usize {
        let mut count = self
            .bg_textures
            .borrow()
            .iter()
            .filter(|tex| tex.texture().is_some())
            .count();
        if self.shaped_shadow.borrow().is_some() {
            count += 1;
        }
        count
    }
}
