// Copyright 2023 the Sill Authors
// SPDX-License-Identifier: Apache-2.0

//! The process-wide texture pool.
//!
//! Caches the glow texture and the window-button textures, one array per
//! distinct DPI scale active across the monitors. Buttons are reloaded
//! when the theme or a monitor's scale changes; the glow texture survives
//! rebuilds.

use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::fs::File;
use std::rc::Rc;

use anyhow::Result;
use tracing::{debug, warn};

use crate::compositor::ScreenRef;
use crate::geometry::Size;
use crate::style::{Style, WidgetState, WindowButtonType, WIDGET_STATES, WINDOW_BUTTON_TYPES};
use crate::texture::Texture;
use crate::widget::EdgeKind;

const BUTTONS_SIZE: i32 = 16;
const BUTTONS_PADDING: i32 = 1;
const GLOW_SIZE: i32 = 64;

type ButtonSet = HashMap<(WindowButtonType, WidgetState), Rc<dyn Texture>>;

/// Scales are cached keyed by their value in thousandths, so visually
/// identical scales share an array.
fn scale_key(scale: f64) -> u32 {
    (scale * 1000.0).round() as u32
}

thread_local! {
    static INSTANCE: RefCell<Option<Rc<DataPool>>> = RefCell::new(None);
}

pub struct DataPool {
    screen: ScreenRef,
    glow: RefCell<Option<Rc<dyn Texture>>>,
    buttons: RefCell<HashMap<u32, ButtonSet>>,
    theme_seen: Cell<u64>,
    dpi_seen: Cell<u64>,
}

impl DataPool {
    /// The lazily created process singleton.
    pub fn instance(screen: &ScreenRef) -> Rc<DataPool> {
        INSTANCE.with(|instance| {
            instance
                .borrow_mut()
                .get_or_insert_with(|| {
                    let pool = DataPool {
                        screen: screen.clone(),
                        glow: RefCell::new(None),
                        buttons: RefCell::new(HashMap::new()),
                        theme_seen: Cell::new(0),
                        dpi_seen: Cell::new(0),
                    };
                    pool.build_glow_texture();
                    Rc::new(pool)
                })
                .clone()
        })
    }

    pub fn reset() {
        INSTANCE.with(|instance| *instance.borrow_mut() = None);
    }

    pub fn glow_texture(&self) -> Option<Rc<dyn Texture>> {
        self.glow.borrow().clone()
    }

    pub fn edge_cursor(&self, kind: EdgeKind) -> u32 {
        self.screen.cursor_cache(kind.cursor_shape())
    }

    /// The cached texture for a button at the given DPI scale, falling back
    /// to the 1.0 array for unknown scales.
    pub fn button_texture(
        &self,
        scale: f64,
        button: WindowButtonType,
        state: WidgetState,
    ) -> Option<Rc<dyn Texture>> {
        self.refresh_if_stale();
        let buttons = self.buttons.borrow();
        buttons
            .get(&scale_key(scale))
            .or_else(|| buttons.get(&scale_key(1.0)))
            .and_then(|set| set.get(&(button, state)))
            .cloned()
    }

    fn wanted_scales(&self) -> Vec<f64> {
        let mut scales = vec![1.0];
        for scale in self.screen.monitor_scales() {
            if !scales.iter().any(|s| scale_key(*s) == scale_key(scale)) {
                scales.push(scale);
            }
        }
        scales
    }

    fn refresh_if_stale(&self) {
        let style = Style::get();
        let stale = self.theme_seen.get() != style.theme_serial()
            || self.dpi_seen.get() != style.dpi_serial()
            || {
                let buttons = self.buttons.borrow();
                let wanted = self.wanted_scales();
                buttons.len() != wanted.len()
                    || wanted.iter().any(|s| !buttons.contains_key(&scale_key(*s)))
            };
        if !stale {
            return;
        }
        self.theme_seen.set(style.theme_serial());
        self.dpi_seen.set(style.dpi_serial());
        self.setup_textures(&style);
    }

    fn setup_textures(&self, style: &Style) {
        let mut buttons = self.buttons.borrow_mut();
        buttons.clear();

        for scale in self.wanted_scales() {
            let mut set = ButtonSet::new();
            for button in WINDOW_BUTTON_TYPES {
                for state in WIDGET_STATES {
                    match self.load_button_texture(style, scale, button, state) {
                        Ok(texture) => {
                            set.insert((button, state), texture);
                        }
                        Err(e) => {
                            warn!(
                                "could not build texture for {:?}/{:?} at scale {}: {}",
                                button, state, scale, e
                            );
                        }
                    }
                }
            }
            buttons.insert(scale_key(scale), set);
        }
    }

    fn load_button_texture(
        &self,
        style: &Style,
        scale: f64,
        button: WindowButtonType,
        state: WidgetState,
    ) -> Result<Rc<dyn Texture>> {
        let file = style.window_button_file(button, state);
        let png = File::open(&file)
            .ok()
            .and_then(|mut f| cairo::ImageSurface::create_from_png(&mut f).ok());

        if let Some(png) = png {
            debug!("loading button texture {:?}", file);
            let size = Size::new(
                (png.width() as f64 * scale).round() as i32,
                (png.height() as f64 * scale).round() as i32,
            );
            let ctx = self.screen.create_texture_surface(size, scale)?;
            let cr = ctx.cr();
            cr.scale(scale, scale);
            cr.set_source_surface(&png, 0.0, 0.0).ok();
            cr.paint().ok();
            Ok(ctx.into_texture())
        } else {
            style.warn_missing_asset(&file);
            let side = ((BUTTONS_SIZE + BUTTONS_PADDING * 2) as f64 * scale).round() as i32;
            let ctx = self
                .screen
                .create_texture_surface(Size::new(side, side), scale)?;
            let cr = ctx.cr();
            cr.scale(scale, scale);
            cr.translate(BUTTONS_PADDING as f64, BUTTONS_PADDING as f64);
            style.draw_window_button(button, state, cr, BUTTONS_SIZE as f64, BUTTONS_SIZE as f64);
            Ok(ctx.into_texture())
        }
    }

    fn build_glow_texture(&self) {
        let size = Size::new(GLOW_SIZE, GLOW_SIZE);
        match self.screen.create_texture_surface(size, 1.0) {
            Ok(ctx) => {
                let cr = ctx.cr();
                let center = GLOW_SIZE as f64 / 2.0;
                let gradient =
                    cairo::RadialGradient::new(center, center, 0.0, center, center, center);
                gradient.add_color_stop_rgba(0.0, 1.0, 1.0, 1.0, 1.0);
                gradient.add_color_stop_rgba(1.0, 1.0, 1.0, 1.0, 0.0);
                let _ = cr.set_source(&gradient);
                cr.paint().ok();
                *self.glow.borrow_mut() = Some(ctx.into_texture());
            }
            Err(e) => warn!("could not build the glow texture: {}", e),
        }
    }
}
