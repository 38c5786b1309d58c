// Copyright 2023 the Sill Authors
// SPDX-License-Identifier: Apache-2.0

//! The style oracle.
//!
//! Single source of truth for decoration metrics, colors, fonts, window
//! button assets and window-manager action bindings. Everything else in the
//! core receives values from here and never reads configuration itself.
//!
//! The oracle is a process-wide singleton with an explicit [`Style::reset`]
//! for tests. The core is single-threaded by contract, so the singleton is
//! thread-local and interior mutability is plain `Cell`/`RefCell`.

use std::cell::{Cell, RefCell};
use std::collections::HashSet;
use std::path::PathBuf;
use std::rc::Rc;

use anyhow::{anyhow, Result};
use tracing::warn;

use crate::geometry::{Extents, Point, Size};

/// The four decoration sides.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Side {
    Top,
    Left,
    Right,
    Bottom,
}

/// Where the title sits in the top strip.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Alignment {
    Left,
    Center,
    Right,
    Floating(f64),
}

impl Alignment {
    /// The horizontal fraction used for the title X clamp.
    pub fn fraction(self) -> f64 {
        match self {
            Alignment::Left => 0.0,
            Alignment::Center => 0.5,
            Alignment::Right => 1.0,
            Alignment::Floating(f) => f.clamp(0.0, 1.0),
        }
    }
}

/// Render state of a decoration element.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum WidgetState {
    Normal,
    Prelight,
    Pressed,
    Disabled,
    Backdrop,
    BackdropPrelight,
    BackdropPressed,
}

pub const WIDGET_STATES: [WidgetState; 7] = [
    WidgetState::Normal,
    WidgetState::Prelight,
    WidgetState::Pressed,
    WidgetState::Disabled,
    WidgetState::Backdrop,
    WidgetState::BackdropPrelight,
    WidgetState::BackdropPressed,
];

impl WidgetState {
    fn asset_suffix(self) -> &'static str {
        match self {
            WidgetState::Normal => "normal",
            WidgetState::Prelight => "prelight",
            WidgetState::Pressed => "pressed",
            WidgetState::Disabled => "disabled",
            WidgetState::Backdrop => "unfocused",
            WidgetState::BackdropPrelight => "unfocused_prelight",
            WidgetState::BackdropPressed => "unfocused_pressed",
        }
    }

    pub fn is_backdrop(self) -> bool {
        matches!(
            self,
            WidgetState::Backdrop | WidgetState::BackdropPrelight | WidgetState::BackdropPressed
        )
    }
}

/// The window buttons a decorated title bar may carry.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum WindowButtonType {
    Close,
    Minimize,
    Unmaximize,
    Maximize,
}

pub const WINDOW_BUTTON_TYPES: [WindowButtonType; 4] = [
    WindowButtonType::Close,
    WindowButtonType::Minimize,
    WindowButtonType::Unmaximize,
    WindowButtonType::Maximize,
];

impl WindowButtonType {
    fn asset_name(self) -> &'static str {
        match self {
            WindowButtonType::Close => "close",
            WindowButtonType::Minimize => "minimize",
            WindowButtonType::Unmaximize => "unmaximize",
            WindowButtonType::Maximize => "maximize",
        }
    }
}

/// Title-bar events that can be bound to a window-manager action.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum WmEvent {
    DoubleClick,
    MiddleClick,
    RightClick,
}

/// Window-manager actions bindable to title-bar events.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum WmAction {
    None,
    ToggleShade,
    ToggleMaximize,
    ToggleMaximizeHorizontally,
    ToggleMaximizeVertically,
    Minimize,
    Shade,
    Menu,
    Lower,
}

fn wm_action_from_string(action: &str) -> WmAction {
    match action {
        "toggle-shade" => WmAction::ToggleShade,
        "toggle-maximize" => WmAction::ToggleMaximize,
        "toggle-maximize-horizontally" => WmAction::ToggleMaximizeHorizontally,
        "toggle-maximize-vertically" => WmAction::ToggleMaximizeVertically,
        "minimize" => WmAction::Minimize,
        "shade" => WmAction::Shade,
        "menu" => WmAction::Menu,
        "lower" => WmAction::Lower,
        _ => WmAction::None,
    }
}

/// Straight-alpha RGBA color.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Color {
    pub r: f64,
    pub g: f64,
    pub b: f64,
    pub a: f64,
}

impl Color {
    pub const fn rgba(r: f64, g: f64, b: f64, a: f64) -> Color {
        Color { r, g, b, a }
    }

    pub fn set_source(&self, cr: &cairo::Context) {
        cr.set_source_rgba(self.r, self.g, self.b, self.a);
    }
}

const DEFAULT_TITLE_FADING_PIXELS: i32 = 35;
const DEFAULT_GRAB_WAIT_MS: u32 = 150;

/// The recognized style keys, as read from the host configuration system.
#[derive(Clone, Debug, PartialEq)]
pub struct StyleConfig {
    pub theme: String,
    pub theme_dir: Option<PathBuf>,

    pub border: Extents,
    pub input_border: Extents,
    /// Per-side corner radius of the visual border.
    pub corner_radius: Extents,
    /// Inner padding of the top strip.
    pub top_padding: Extents,

    pub active_shadow_color: Color,
    pub active_shadow_radius: u32,
    pub inactive_shadow_color: Color,
    pub inactive_shadow_radius: u32,
    pub shadow_offset: Point,
    pub glow_size: u32,
    pub glow_color: Color,

    pub titlebar_font: String,
    pub titlebar_uses_system_font: bool,
    pub system_font: String,
    pub title_alignment: f64,
    pub title_indent: i32,
    pub title_fade: i32,

    pub grab_wait: u32,
    pub double_click_max_distance: i32,
    pub double_click_max_time_delta: u32,
    pub action_double_click_titlebar: String,
    pub action_middle_click_titlebar: String,
    pub action_right_click_titlebar: String,
}

impl Default for StyleConfig {
    fn default() -> StyleConfig {
        StyleConfig {
            theme: "Ambiance".into(),
            theme_dir: None,
            border: Extents::new(1, 1, 28, 1),
            input_border: Extents::new(10, 10, 10, 10),
            corner_radius: Extents::new(0, 0, 7, 0),
            top_padding: Extents::new(2, 2, 2, 0),
            active_shadow_color: Color::rgba(0.0, 0.0, 0.0, 0.647),
            active_shadow_radius: 8,
            inactive_shadow_color: Color::rgba(0.0, 0.0, 0.0, 0.4),
            inactive_shadow_radius: 5,
            shadow_offset: Point::new(1, 1),
            glow_size: 10,
            glow_color: Color::rgba(0.86, 0.54, 0.3, 1.0),
            titlebar_font: "Ubuntu Bold 11".into(),
            titlebar_uses_system_font: false,
            system_font: "Ubuntu 11".into(),
            title_alignment: 0.0,
            title_indent: 10,
            title_fade: DEFAULT_TITLE_FADING_PIXELS,
            grab_wait: DEFAULT_GRAB_WAIT_MS,
            double_click_max_distance: 5,
            double_click_max_time_delta: 400,
            action_double_click_titlebar: "toggle-maximize".into(),
            action_middle_click_titlebar: "lower".into(),
            action_right_click_titlebar: "menu".into(),
        }
    }
}

/// A parsed font description: everything before the trailing size is the
/// family.
#[derive(Clone, Debug, PartialEq)]
struct FontDesc {
    family: String,
    bold: bool,
    size: f64,
}

fn parse_font(font: &str) -> FontDesc {
    let mut parts: Vec<&str> = font.split_whitespace().collect();
    let size = parts
        .last()
        .and_then(|s| s.parse::<f64>().ok())
        .unwrap_or(11.0);
    if parts
        .last()
        .map(|s| s.parse::<f64>().is_ok())
        .unwrap_or(false)
    {
        parts.pop();
    }
    let bold = parts
        .last()
        .map(|s| s.eq_ignore_ascii_case("bold"))
        .unwrap_or(false);
    if bold {
        parts.pop();
    }
    let family = if parts.is_empty() {
        "sans-serif".to_string()
    } else {
        parts.join(" ")
    };
    FontDesc { family, bold, size }
}

thread_local! {
    static INSTANCE: RefCell<Option<Rc<Style>>> = RefCell::new(None);
}

/// The process-wide style oracle.
pub struct Style {
    config: RefCell<StyleConfig>,
    theme_serial: Cell<u64>,
    dpi_serial: Cell<u64>,
    warned_assets: RefCell<HashSet<PathBuf>>,
    text_measure_failed: Cell<bool>,
}

impl Style {
    pub fn get() -> Rc<Style> {
        INSTANCE.with(|instance| {
            instance
                .borrow_mut()
                .get_or_insert_with(|| {
                    Rc::new(Style {
                        config: RefCell::new(StyleConfig::default()),
                        theme_serial: Cell::new(1),
                        dpi_serial: Cell::new(1),
                        warned_assets: RefCell::new(HashSet::new()),
                        text_measure_failed: Cell::new(false),
                    })
                })
                .clone()
        })
    }

    /// Drops the singleton so the next [`Style::get`] starts from defaults.
    pub fn reset() {
        INSTANCE.with(|instance| *instance.borrow_mut() = None);
    }

    /// Replaces the configuration. Bumps the theme serial when any visual
    /// key changed, which is what makes the pool and the per-window caches
    /// re-render.
    pub fn apply_config(&self, config: StyleConfig) {
        let changed = {
            let current = self.config.borrow();
            *current != config
        };
        if changed {
            *self.config.borrow_mut() = config;
            self.theme_serial.set(self.theme_serial.get() + 1);
            self.warned_assets.borrow_mut().clear();
        }
    }

    /// Called by the manager when a monitor's DPI scale changes or monitors
    /// are plugged/unplugged.
    pub fn notify_dpi_changed(&self) {
        self.dpi_serial.set(self.dpi_serial.get() + 1);
    }

    /// Monotonic counter bumped on every visual configuration change.
    pub fn theme_serial(&self) -> u64 {
        self.theme_serial.get()
    }

    pub fn dpi_serial(&self) -> u64 {
        self.dpi_serial.get()
    }

    // Metrics

    pub fn border(&self) -> Extents {
        self.config.borrow().border
    }

    pub fn input_border(&self) -> Extents {
        self.config.borrow().input_border
    }

    pub fn corner_radius(&self, side: Side) -> i32 {
        let radius = self.config.borrow().corner_radius;
        match side {
            Side::Top => radius.top,
            Side::Left => radius.left,
            Side::Right => radius.right,
            Side::Bottom => radius.bottom,
        }
    }

    pub fn padding(&self, side: Side, _state: WidgetState) -> Extents {
        match side {
            Side::Top => self.config.borrow().top_padding,
            _ => Extents::ZERO,
        }
    }

    pub fn shadow_offset(&self) -> Point {
        self.config.borrow().shadow_offset
    }

    pub fn active_shadow_color(&self) -> Color {
        self.config.borrow().active_shadow_color
    }

    pub fn active_shadow_radius(&self) -> u32 {
        self.config.borrow().active_shadow_radius
    }

    pub fn inactive_shadow_color(&self) -> Color {
        self.config.borrow().inactive_shadow_color
    }

    pub fn inactive_shadow_radius(&self) -> u32 {
        self.config.borrow().inactive_shadow_radius
    }

    pub fn glow_size(&self) -> u32 {
        self.config.borrow().glow_size
    }

    pub fn glow_color(&self) -> Color {
        self.config.borrow().glow_color
    }

    pub fn title_alignment(&self) -> Alignment {
        let value = self.config.borrow().title_alignment;
        if value <= 0.0 {
            Alignment::Left
        } else if (value - 0.5).abs() < f64::EPSILON {
            Alignment::Center
        } else if value >= 1.0 {
            Alignment::Right
        } else {
            Alignment::Floating(value)
        }
    }

    pub fn title_indent(&self) -> i32 {
        self.config.borrow().title_indent
    }

    pub fn title_fading_pixels(&self) -> i32 {
        self.config.borrow().title_fade
    }

    pub fn grab_wait(&self) -> u32 {
        self.config.borrow().grab_wait
    }

    pub fn double_click_max_distance(&self) -> i32 {
        self.config.borrow().double_click_max_distance
    }

    pub fn double_click_max_time_delta(&self) -> u32 {
        self.config.borrow().double_click_max_time_delta
    }

    pub fn window_manager_action(&self, event: WmEvent) -> WmAction {
        let config = self.config.borrow();
        let action = match event {
            WmEvent::DoubleClick => &config.action_double_click_titlebar,
            WmEvent::MiddleClick => &config.action_middle_click_titlebar,
            WmEvent::RightClick => &config.action_right_click_titlebar,
        };
        wm_action_from_string(action)
    }

    /// Theme asset path for a window button; the file may be missing, in
    /// which case the pool falls back to [`Style::draw_window_button`].
    pub fn window_button_file(&self, button: WindowButtonType, state: WidgetState) -> PathBuf {
        let config = self.config.borrow();
        let dir = config
            .theme_dir
            .clone()
            .unwrap_or_else(|| PathBuf::from("/usr/share/themes").join(&config.theme));
        dir.join(format!(
            "{}_{}.png",
            button.asset_name(),
            state.asset_suffix()
        ))
    }

    /// Warns about a missing theme asset, once per path per theme.
    pub fn warn_missing_asset(&self, path: &PathBuf) {
        if self.warned_assets.borrow_mut().insert(path.clone()) {
            warn!("missing theme asset {:?}; using the drawn fallback", path);
        }
    }

    fn title_font(&self) -> FontDesc {
        let config = self.config.borrow();
        if config.titlebar_uses_system_font {
            parse_font(&config.system_font)
        } else {
            parse_font(&config.titlebar_font)
        }
    }

    // Text measurement

    fn measure_text(&self, text: &str, font: &FontDesc) -> Size {
        match measure_with_cairo(text, font) {
            Ok(size) => size,
            Err(e) => {
                if !self.text_measure_failed.replace(true) {
                    warn!("text measurement failed ({}); using an estimate", e);
                }
                // Rough advance estimate keeps layout usable.
                Size::new(
                    (text.chars().count() as f64 * font.size * 0.6).ceil() as i32,
                    (font.size * 1.4).ceil() as i32,
                )
            }
        }
    }

    /// Unscaled natural size of a rendered window title.
    pub fn title_natural_size(&self, text: &str) -> Size {
        self.measure_text(text, &self.title_font())
    }

    /// Unscaled natural size of a menu entry label, without padding.
    pub fn menu_item_natural_size(&self, label: &str) -> Size {
        let config = self.config.borrow();
        let font = parse_font(&config.system_font);
        drop(config);
        self.measure_text(label, &font)
    }

    // Drawing. All functions render one decoration element into an
    // off-screen cairo context whose user-space unit is an unscaled pixel.

    fn text_color(&self, state: WidgetState) -> Color {
        if state.is_backdrop() {
            Color::rgba(0.87, 0.87, 0.87, 0.6)
        } else {
            Color::rgba(0.98, 0.98, 0.98, 1.0)
        }
    }

    fn frame_color(&self, state: WidgetState) -> Color {
        if state.is_backdrop() {
            Color::rgba(0.22, 0.22, 0.22, 1.0)
        } else {
            Color::rgba(0.15, 0.15, 0.15, 1.0)
        }
    }

    /// Paints one side strip of the decoration frame.
    pub fn draw_side(&self, side: Side, state: WidgetState, cr: &cairo::Context, w: f64, h: f64) {
        self.frame_color(state).set_source(cr);
        if side == Side::Top {
            let radius = self.corner_radius(Side::Top) as f64;
            rounded_top_rect(cr, w, h, radius);
            cr.fill().ok();
        } else {
            cr.rectangle(0.0, 0.0, w, h);
            cr.fill().ok();
        }
    }

    fn select_font(&self, cr: &cairo::Context, font: &FontDesc) {
        let weight = if font.bold {
            cairo::FontWeight::Bold
        } else {
            cairo::FontWeight::Normal
        };
        cr.select_font_face(&font.family, cairo::FontSlant::Normal, weight);
        cr.set_font_size(font.size);
    }

    /// Draws a window title into `w` × `h`, fading out the rightmost
    /// `title_fading_pixels` when the text does not fit.
    pub fn draw_title(&self, text: &str, state: WidgetState, cr: &cairo::Context, w: f64, h: f64) {
        let font = self.title_font();
        self.select_font(cr, &font);
        self.text_color(state).set_source(cr);

        let text_width = cr
            .text_extents(text)
            .map(|e| e.x_advance())
            .unwrap_or(0.0);
        let baseline = cr
            .font_extents()
            .map(|fe| (h + fe.ascent() - fe.descent()) / 2.0)
            .unwrap_or(h * 0.75);

        if text_width > w {
            let fade = self.title_fading_pixels() as f64;
            cr.push_group();
            self.text_color(state).set_source(cr);
            cr.move_to(0.0, baseline);
            cr.show_text(text).ok();
            if let Ok(group) = cr.pop_group() {
                // The pad extend of the gradient keeps everything left of
                // the fade band at full alpha.
                let mask = cairo::LinearGradient::new((w - fade).max(0.0), 0.0, w, 0.0);
                mask.add_color_stop_rgba(0.0, 0.0, 0.0, 0.0, 1.0);
                mask.add_color_stop_rgba(1.0, 0.0, 0.0, 0.0, 0.0);
                let _ = cr.set_source(&group);
                let _ = cr.mask(&mask);
            }
        } else {
            cr.move_to(0.0, baseline);
            cr.show_text(text).ok();
        }
    }

    /// Paints the prelight background of an active menu item.
    pub fn draw_menu_item(&self, _state: WidgetState, cr: &cairo::Context, w: f64, h: f64) {
        cr.set_source_rgba(1.0, 1.0, 1.0, 0.15);
        cr.rectangle(0.0, 0.0, w, h);
        cr.fill().ok();
    }

    /// Draws a menu entry label.
    pub fn draw_menu_item_entry(
        &self,
        label: &str,
        state: WidgetState,
        cr: &cairo::Context,
        _w: f64,
        h: f64,
    ) {
        let config = self.config.borrow();
        let font = parse_font(&config.system_font);
        drop(config);
        self.select_font(cr, &font);
        self.text_color(state).set_source(cr);
        let baseline = cr
            .font_extents()
            .map(|fe| (h + fe.ascent() - fe.descent()) / 2.0)
            .unwrap_or(h * 0.75);
        cr.move_to(0.0, baseline);
        cr.show_text(label).ok();
    }

    /// Draws the dropdown's down-arrow glyph at `size` × `size`.
    pub fn draw_menu_item_icon(&self, state: WidgetState, cr: &cairo::Context, size: f64) {
        self.text_color(state).set_source(cr);
        cr.move_to(size * 0.2, size * 0.35);
        cr.line_to(size * 0.8, size * 0.35);
        cr.line_to(size * 0.5, size * 0.75);
        cr.close_path();
        cr.fill().ok();
    }

    /// Vector fallback for a missing window-button asset.
    pub fn draw_window_button(
        &self,
        button: WindowButtonType,
        state: WidgetState,
        cr: &cairo::Context,
        w: f64,
        h: f64,
    ) {
        let bg = match state {
            WidgetState::Pressed | WidgetState::BackdropPressed => Color::rgba(0.9, 0.4, 0.2, 1.0),
            WidgetState::Prelight | WidgetState::BackdropPrelight => {
                Color::rgba(0.45, 0.45, 0.45, 1.0)
            }
            WidgetState::Disabled => Color::rgba(0.3, 0.3, 0.3, 0.5),
            _ if state.is_backdrop() => Color::rgba(0.3, 0.3, 0.3, 1.0),
            _ => Color::rgba(0.35, 0.35, 0.35, 1.0),
        };
        let (cx, cy) = (w / 2.0, h / 2.0);
        let radius = w.min(h) / 2.0 - 0.5;

        bg.set_source(cr);
        cr.arc(cx, cy, radius, 0.0, std::f64::consts::TAU);
        cr.fill().ok();

        self.text_color(state).set_source(cr);
        cr.set_line_width(1.5);
        let glyph = radius * 0.55;
        match button {
            WindowButtonType::Close => {
                cr.move_to(cx - glyph, cy - glyph);
                cr.line_to(cx + glyph, cy + glyph);
                cr.move_to(cx + glyph, cy - glyph);
                cr.line_to(cx - glyph, cy + glyph);
                cr.stroke().ok();
            }
            WindowButtonType::Minimize => {
                cr.move_to(cx - glyph, cy + glyph * 0.8);
                cr.line_to(cx + glyph, cy + glyph * 0.8);
                cr.stroke().ok();
            }
            WindowButtonType::Maximize => {
                cr.rectangle(cx - glyph, cy - glyph, glyph * 2.0, glyph * 2.0);
                cr.stroke().ok();
            }
            WindowButtonType::Unmaximize => {
                cr.rectangle(cx - glyph, cy - glyph * 0.4, glyph * 2.0, glyph * 1.4);
                cr.stroke().ok();
            }
        }
    }
}

fn rounded_top_rect(cr: &cairo::Context, w: f64, h: f64, radius: f64) {
    use std::f64::consts::PI;
    let r = radius.clamp(0.0, h);
    cr.new_path();
    cr.arc(r, r, r, PI, 1.5 * PI);
    cr.arc(w - r, r, r, 1.5 * PI, 2.0 * PI);
    cr.line_to(w, h);
    cr.line_to(0.0, h);
    cr.close_path();
}

fn measure_with_cairo(text: &str, font: &FontDesc) -> Result<Size> {
    let surface = cairo::ImageSurface::create(cairo::Format::ARgb32, 1, 1)
        .map_err(|e| anyhow!("scratch surface: {}", e))?;
    let cr = cairo::Context::new(&surface).map_err(|e| anyhow!("scratch context: {}", e))?;
    let weight = if font.bold {
        cairo::FontWeight::Bold
    } else {
        cairo::FontWeight::Normal
    };
    cr.select_font_face(&font.family, cairo::FontSlant::Normal, weight);
    cr.set_font_size(font.size);
    let te = cr
        .text_extents(text)
        .map_err(|e| anyhow!("text extents: {}", e))?;
    let fe = cr
        .font_extents()
        .map_err(|e| anyhow!("font extents: {}", e))?;
    Ok(Size::new(
        te.x_advance().ceil() as i32,
        fe.height().ceil() as i32,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wm_action_strings() {
        assert_eq!(wm_action_from_string("lower"), WmAction::Lower);
        assert_eq!(wm_action_from_string("toggle-maximize"), WmAction::ToggleMaximize);
        assert_eq!(
            wm_action_from_string("toggle-maximize-vertically"),
            WmAction::ToggleMaximizeVertically
        );
        assert_eq!(wm_action_from_string("bogus"), WmAction::None);
        assert_eq!(wm_action_from_string(""), WmAction::None);
    }

    #[test]
    fn alignment_from_fraction() {
        Style::reset();
        let style = Style::get();
        assert_eq!(style.title_alignment(), Alignment::Left);

        let mut config = StyleConfig::default();
        config.title_alignment = 0.5;
        style.apply_config(config.clone());
        assert_eq!(style.title_alignment(), Alignment::Center);

        config.title_alignment = 1.0;
        style.apply_config(config.clone());
        assert_eq!(style.title_alignment(), Alignment::Right);

        config.title_alignment = 0.25;
        style.apply_config(config);
        assert_eq!(style.title_alignment(), Alignment::Floating(0.25));
        Style::reset();
    }

    #[test]
    fn theme_serial_bumps_only_on_change() {
        Style::reset();
        let style = Style::get();
        let serial = style.theme_serial();
        style.apply_config(StyleConfig::default());
        assert_eq!(style.theme_serial(), serial);

        let mut config = StyleConfig::default();
        config.theme = "Radiance".into();
        style.apply_config(config);
        assert_eq!(style.theme_serial(), serial + 1);
        Style::reset();
    }

    #[test]
    fn font_parsing() {
        let font = parse_font("Ubuntu Bold 11");
        assert_eq!(font.family, "Ubuntu");
        assert!(font.bold);
        assert_eq!(font.size, 11.0);

        let font = parse_font("DejaVu Sans 9.5");
        assert_eq!(font.family, "DejaVu Sans");
        assert!(!font.bold);
        assert_eq!(font.size, 9.5);

        let font = parse_font("");
        assert_eq!(font.family, "sans-serif");
    }

    #[test]
    fn button_files_cover_all_states() {
        Style::reset();
        let style = Style::get();
        for button in WINDOW_BUTTON_TYPES {
            for state in WIDGET_STATES {
                let path = style.window_button_file(button, state);
                assert!(path.to_string_lossy().ends_with(".png"));
            }
        }
        let path = style.window_button_file(WindowButtonType::Close, WidgetState::Backdrop);
        assert!(path.to_string_lossy().contains("close_unfocused"));
        Style::reset();
    }
}
