// Copyright 2023 the Sill Authors
// SPDX-License-Identifier: Apache-2.0

//! A mock compositor host for decoration tests.
//!
//! Everything the core would send to the X server or the shell is recorded
//! here instead; textures are CPU image surfaces behind stub handles.

#![allow(dead_code)]

use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::rc::Rc;

use anyhow::Result;

use crate::compositor::{
    CursorShape, HostWindow, HostWindowRef, MoveResizeRequest, MwmDecor, Screen, ScreenRef,
    ShapeExtents, Timestamp, WindowActions, WindowState, WindowType, XCursor, Xid,
};
use crate::geometry::{Extents, Point, Rect, Region, Size};
use crate::indicator::{IndicatorEntryState, IndicatorSource};
use crate::manager::Manager;
use crate::pool::DataPool;
use crate::style::Style;
use crate::texture::{CairoContext, StubTexture, Texture, TextureQuad};
use crate::window::DecorAtoms;

pub fn test_atoms() -> DecorAtoms {
    DecorAtoms {
        wm_name: 39,
        net_wm_name: 1001,
        net_wm_visible_name: 1002,
        net_active_window: 1003,
        net_wm_moveresize: 1004,
        net_request_frame_extents: 1005,
        net_frame_extents: 1006,
        net_wm_allowed_actions: 1007,
        motif_wm_hints: 1008,
        gtk_border_radius: 1009,
        toolkit_action: 1010,
        toolkit_action_force_quit_dialog: 1011,
    }
}

#[derive(Default)]
pub struct TestScreen {
    pub active: Cell<Xid>,
    pub pointer: Cell<Point>,
    pub scale_active: Cell<bool>,
    pub scales: RefCell<Vec<f64>>,
    pub move_resizes: RefCell<Vec<MoveResizeRequest>>,
    pub window_menus: RefCell<Vec<(Xid, u8, Point)>>,
    pub cursors: RefCell<Vec<(Xid, Option<XCursor>)>>,
    pub frames: RefCell<Vec<Xid>>,
    next_frame: Cell<Xid>,
    pub frame_shapes: RefCell<HashMap<Xid, Vec<Rect>>>,
    pub cardinal_props: RefCell<HashMap<(Xid, u32), Vec<u32>>>,
    pub string_props: RefCell<HashMap<(Xid, u32), String>>,
    pub names: RefCell<HashMap<Xid, String>>,
    pub shapes: RefCell<HashMap<Xid, ShapeExtents>>,
    pub damage: Cell<usize>,
}

impl TestScreen {
    pub fn new() -> Rc<TestScreen> {
        let screen = TestScreen::default();
        screen.next_frame.set(0xf000);
        *screen.scales.borrow_mut() = vec![1.0];
        Rc::new(screen)
    }
}

impl Screen for TestScreen {
    fn root(&self) -> Xid {
        1
    }

    fn viewport(&self) -> Point {
        Point::ZERO
    }

    fn active_window(&self) -> Xid {
        self.active.get()
    }

    fn cursor_cache(&self, shape: CursorShape) -> XCursor {
        shape as XCursor + 100
    }

    fn define_cursor(&self, frame: Xid, cursor: Option<XCursor>) {
        self.cursors.borrow_mut().push((frame, cursor));
    }

    fn has_shape(&self) -> bool {
        true
    }

    fn pointer_position(&self) -> Point {
        self.pointer.get()
    }

    fn monitor_geometry_in(&self, _rect: Rect) -> usize {
        0
    }

    fn monitor_scales(&self) -> Vec<f64> {
        self.scales.borrow().clone()
    }

    fn window_name(&self, xid: Xid) -> String {
        self.names
            .borrow()
            .get(&xid)
            .cloned()
            .unwrap_or_else(|| format!("window-{xid}"))
    }

    fn string_property(&self, xid: Xid, atom: u32) -> Option<String> {
        self.string_props.borrow().get(&(xid, atom)).cloned()
    }

    fn cardinal_property(&self, xid: Xid, atom: u32) -> Vec<u32> {
        self.cardinal_props
            .borrow()
            .get(&(xid, atom))
            .cloned()
            .unwrap_or_default()
    }

    fn is_scale_active(&self) -> bool {
        self.scale_active.get()
    }

    fn send_move_resize(&self, request: MoveResizeRequest) {
        self.move_resizes.borrow_mut().push(request);
    }

    fn show_window_menu(&self, xid: Xid, button: u8, _time: Timestamp, pos: Point) {
        self.window_menus.borrow_mut().push((xid, button, pos));
    }

    fn damage_region(&self, _region: &Region) {
        self.damage.set(self.damage.get() + 1);
    }

    fn create_frame(&self, _parent: Xid, _geo: Rect) -> Result<Xid> {
        let frame = self.next_frame.get();
        self.next_frame.set(frame + 1);
        self.frames.borrow_mut().push(frame);
        Ok(frame)
    }

    fn destroy_frame(&self, frame: Xid) {
        self.frames.borrow_mut().retain(|f| *f != frame);
        self.frame_shapes.borrow_mut().remove(&frame);
    }

    fn configure_frame(&self, _frame: Xid, _geo: Rect) {}

    fn set_frame_shape(&self, frame: Xid, rects: &[Rect]) {
        self.frame_shapes.borrow_mut().insert(frame, rects.to_vec());
    }

    fn frame_input_shape(&self, frame: Xid) -> Vec<Rect> {
        self.frame_shapes
            .borrow()
            .get(&frame)
            .cloned()
            .unwrap_or_default()
    }

    fn shape_extents(&self, xid: Xid) -> Option<ShapeExtents> {
        self.shapes.borrow().get(&xid).cloned()
    }

    fn change_cardinal_property(&self, xid: Xid, atom: u32, values: &[u32]) {
        self.cardinal_props
            .borrow_mut()
            .insert((xid, atom), values.to_vec());
    }

    fn create_texture_surface(&self, size: Size, scale: f64) -> Result<CairoContext> {
        CairoContext::image(size, scale, Rc::new(StubTexture::new(size)))
    }
}

pub struct TestWindow {
    pub id: Xid,
    pub wrapper: Cell<Xid>,
    pub viewable: Cell<bool>,
    pub mapped: Cell<bool>,
    pub shaded: Cell<bool>,
    pub override_redirect: Cell<bool>,
    pub window_type: Cell<WindowType>,
    pub alpha: Cell<bool>,
    pub shaped: Cell<bool>,
    pub state: Cell<WindowState>,
    pub actions: Cell<WindowActions>,
    pub mwm: Cell<MwmDecor>,
    pub unmap_reference: Cell<bool>,
    pub geometry: Cell<Rect>,
    pub border: Cell<Extents>,
    pub input: Cell<Extents>,
    pub extents_calls: RefCell<Vec<(Extents, Extents)>>,
    pub close_calls: RefCell<Vec<Timestamp>>,
    pub minimize_calls: Cell<usize>,
    pub maximize_calls: RefCell<Vec<WindowState>>,
    pub lower_calls: Cell<usize>,
    pub shade_calls: RefCell<Vec<bool>>,
    pub frame_region_updates: Cell<usize>,
    pub output_extent_updates: Cell<usize>,
    pub damage_count: Cell<usize>,
}

impl TestWindow {
    pub fn new(id: Xid) -> Rc<TestWindow> {
        Rc::new(TestWindow {
            id,
            wrapper: Cell::new(id + 0x10000),
            viewable: Cell::new(true),
            mapped: Cell::new(true),
            shaded: Cell::new(false),
            override_redirect: Cell::new(false),
            window_type: Cell::new(WindowType::Normal),
            alpha: Cell::new(false),
            shaped: Cell::new(false),
            state: Cell::new(WindowState::empty()),
            actions: Cell::new(WindowActions::all()),
            mwm: Cell::new(MwmDecor::ALL),
            unmap_reference: Cell::new(false),
            geometry: Cell::new(Rect::new(100, 100, 800, 600)),
            border: Cell::new(Extents::ZERO),
            input: Cell::new(Extents::ZERO),
            extents_calls: RefCell::new(Vec::new()),
            close_calls: RefCell::new(Vec::new()),
            minimize_calls: Cell::new(0),
            maximize_calls: RefCell::new(Vec::new()),
            lower_calls: Cell::new(0),
            shade_calls: RefCell::new(Vec::new()),
            frame_region_updates: Cell::new(0),
            output_extent_updates: Cell::new(0),
            damage_count: Cell::new(0),
        })
    }
}

impl HostWindow for TestWindow {
    fn id(&self) -> Xid {
        self.id
    }

    fn frame(&self) -> Xid {
        self.wrapper.get()
    }

    fn is_viewable(&self) -> bool {
        self.viewable.get()
    }

    fn is_mapped(&self) -> bool {
        self.mapped.get()
    }

    fn shaded(&self) -> bool {
        self.shaded.get()
    }

    fn override_redirect(&self) -> bool {
        self.override_redirect.get()
    }

    fn window_type(&self) -> WindowType {
        self.window_type.get()
    }

    fn is_shaped(&self) -> bool {
        self.shaped.get()
    }

    fn alpha(&self) -> bool {
        self.alpha.get()
    }

    fn state(&self) -> WindowState {
        self.state.get()
    }

    fn actions(&self) -> WindowActions {
        self.actions.get()
    }

    fn mwm_decor(&self) -> MwmDecor {
        self.mwm.get()
    }

    fn has_unmap_reference(&self) -> bool {
        self.unmap_reference.get()
    }

    fn server_geometry(&self) -> Rect {
        self.geometry.get()
    }

    fn border(&self) -> Extents {
        self.border.get()
    }

    fn input(&self) -> Extents {
        self.input.get()
    }

    fn default_viewport(&self) -> Point {
        Point::ZERO
    }

    fn set_frame_extents(&self, border: Extents, input: Extents) {
        self.border.set(border);
        self.input.set(input);
        self.extents_calls.borrow_mut().push((border, input));
    }

    fn update_frame_region(&self) {
        self.frame_region_updates.set(self.frame_region_updates.get() + 1);
    }

    fn update_output_extents(&self) {
        self.output_extent_updates
            .set(self.output_extent_updates.get() + 1);
    }

    fn damage_output_extents(&self) {
        self.damage_count.set(self.damage_count.get() + 1);
    }

    fn close(&self, time: Timestamp) {
        self.close_calls.borrow_mut().push(time);
    }

    fn minimize(&self) {
        self.minimize_calls.set(self.minimize_calls.get() + 1);
    }

    fn maximize(&self, state: WindowState) {
        self.maximize_calls.borrow_mut().push(state);
    }

    fn lower(&self) {
        self.lower_calls.set(self.lower_calls.get() + 1);
    }

    fn shade(&self, shaded: bool) {
        self.shade_calls.borrow_mut().push(shaded);
    }
}

#[derive(Default)]
pub struct TestIndicators {
    pub menu_entries: RefCell<Vec<String>>,
    pub states: RefCell<HashMap<String, IndicatorEntryState>>,
    pub opened: RefCell<Vec<(String, u8)>>,
    pub dropdowns: RefCell<Vec<Vec<String>>>,
    pub synced: RefCell<Vec<(String, Vec<(String, Rect)>)>>,
    pub integrated: Cell<bool>,
    pub has_menu: Cell<bool>,
    pub always_show: Cell<bool>,
}

impl TestIndicators {
    pub fn with_entries(labels: &[&str]) -> Rc<TestIndicators> {
        let indicators = TestIndicators {
            integrated: Cell::new(true),
            has_menu: Cell::new(true),
            ..TestIndicators::default()
        };
        for (i, label) in labels.iter().enumerate() {
            let id = format!("entry-{i}");
            indicators.menu_entries.borrow_mut().push(id.clone());
            indicators.states.borrow_mut().insert(
                id,
                IndicatorEntryState {
                    label: label.to_string(),
                    label_sensitive: true,
                    image_sensitive: false,
                    visible: true,
                    active: false,
                    show_now: false,
                },
            );
        }
        Rc::new(indicators)
    }
}

impl IndicatorSource for TestIndicators {
    fn has_app_menu(&self) -> bool {
        self.has_menu.get()
    }

    fn integrated_menus(&self) -> bool {
        self.integrated.get()
    }

    fn always_show_menus(&self) -> bool {
        self.always_show.get()
    }

    fn fadein_ms(&self) -> u32 {
        100
    }

    fn fadeout_ms(&self) -> u32 {
        120
    }

    fn app_menu_entries(&self, _xid: Xid) -> Vec<String> {
        self.menu_entries.borrow().clone()
    }

    fn entry_state(&self, id: &str) -> Option<IndicatorEntryState> {
        self.states.borrow().get(id).cloned()
    }

    fn show_menu(&self, id: &str, _xid: Xid, _x: i32, _y: i32, button: u8) {
        self.opened.borrow_mut().push((id.to_string(), button));
    }

    fn show_dropdown(&self, ids: &[String], _active: Option<&str>, _xid: Xid, _x: i32, _y: i32) {
        self.dropdowns.borrow_mut().push(ids.to_vec());
    }

    fn sync_geometries(&self, panel_id: &str, geometries: Vec<(String, Rect)>) {
        self.synced
            .borrow_mut()
            .push((panel_id.to_string(), geometries));
    }
}

/// Records what the draw pass emits.
#[derive(Default)]
pub struct RecordingSink {
    pub draws: Vec<(u32, Vec<TextureQuad>)>,
}

impl crate::compositor::PaintSink for RecordingSink {
    fn draw_textured(
        &mut self,
        texture: &dyn Texture,
        quads: &[TextureQuad],
        _transform: &crate::compositor::GlMatrix,
        _attrib: crate::compositor::PaintAttrib,
        _mask: crate::compositor::PaintMask,
        _clip: &Region,
    ) {
        self.draws.push((texture.id(), quads.to_vec()));
    }
}

pub struct Harness {
    pub screen: Rc<TestScreen>,
    pub manager: Manager,
}

impl Harness {
    /// Fresh singletons, a mock screen, and a manager with no menu feed.
    pub fn new() -> Harness {
        Style::reset();
        DataPool::reset();
        let screen = TestScreen::new();
        let screen_ref: ScreenRef = screen.clone();
        let manager = Manager::new(screen_ref, test_atoms(), None);
        Harness { screen, manager }
    }

    pub fn with_indicators(indicators: Rc<TestIndicators>) -> Harness {
        Style::reset();
        DataPool::reset();
        let screen = TestScreen::new();
        let screen_ref: ScreenRef = screen.clone();
        let indicators: crate::indicator::IndicatorSourceRef = indicators;
        let manager = Manager::new(screen_ref, test_atoms(), Some(indicators));
        Harness { screen, manager }
    }

    pub fn add_window(&self, win: &Rc<TestWindow>) -> Rc<crate::window::DecoratedWindow> {
        let host: HostWindowRef = win.clone();
        self.manager.handle_window(host)
    }
}
