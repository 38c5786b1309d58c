// Copyright 2023 the Sill Authors
// SPDX-License-Identifier: Apache-2.0

//! The window-title widget.

use tracing::warn;

use crate::compositor::{GlMatrix, PaintAttrib, PaintMask, PaintSink, ScreenRef};
use crate::debug::DebugState;
use crate::geometry::{Region, Size};
use crate::style::{Style, WidgetState};
use crate::widget::{ItemCore, TexturedItem, Widget};

/// Draws the window title through the style oracle, aligned within the top
/// strip and re-rendered lazily when the drawn size changes.
pub struct Title {
    core: ItemCore,
    tex: TexturedItem,
    text: String,
    /// Size the current texture was rendered at; empty forces a render.
    texture_size: Size,
    screen: ScreenRef,
}

impl Title {
    pub fn new(screen: ScreenRef, text: impl Into<String>) -> Title {
        let mut title = Title {
            core: ItemCore::default(),
            tex: TexturedItem::default(),
            text: String::new(),
            texture_size: Size::ZERO,
            screen,
        };
        // The title never takes input; the grab edge below it does.
        title.core.sensitive = false;
        title.set_text(text.into());
        title
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn set_text(&mut self, text: String) {
        let natural = self.scaled_natural_size(&text);
        self.text = text;
        self.core.set_size(natural.width, natural.height);
        self.texture_size = Size::ZERO;
    }

    fn scaled_natural_size(&self, text: &str) -> Size {
        let size = Style::get().title_natural_size(text);
        Size::new(
            (size.width as f64 * self.core.scale).round() as i32,
            (size.height as f64 * self.core.scale).round() as i32,
        )
    }

    fn render_texture(&mut self) {
        if self.texture_size.is_empty() {
            self.tex.quad.set_texture(None);
            return;
        }
        let scale = self.core.scale;
        let state = if self.core.focused {
            WidgetState::Normal
        } else {
            WidgetState::Backdrop
        };
        match self.screen.create_texture_surface(self.texture_size, scale) {
            Ok(ctx) => {
                let cr = ctx.cr();
                cr.save().ok();
                cr.scale(scale, scale);
                Style::get().draw_title(
                    &self.text,
                    state,
                    cr,
                    self.texture_size.width as f64 / scale,
                    self.texture_size.height as f64 / scale,
                );
                cr.restore().ok();
                self.tex.quad.set_texture(Some(ctx.into_texture()));
            }
            Err(e) => {
                warn!("failed to render title texture: {}", e);
                self.tex.quad.set_texture(None);
            }
        }
    }
}

impl Widget for Title {
    fn core(&self) -> &ItemCore {
        &self.core
    }

    fn core_mut(&mut self) -> &mut ItemCore {
        &mut self.core
    }

    fn name(&self) -> &'static str {
        "WindowTitle"
    }

    fn set_x(&mut self, x: i32) {
        // Centered and right-aligned titles never move left of their
        // alignment position within the top container.
        let alignment = Style::get().title_alignment().fraction();
        let mut x = x;
        if alignment > 0.0 {
            if let Some(top) = self.core.top_rect {
                let aligned =
                    top.x + ((top.width - self.natural_width()) as f64 * alignment) as i32;
                x = x.max(aligned);
            }
        }
        let y = self.core.geometry().y;
        self.core.set_coords(x, y);
    }

    fn focused_changed(&mut self, _focused: bool) {
        if !self.texture_size.is_empty() {
            self.render_texture();
        }
    }

    fn scale_changed(&mut self, _scale: f64) {
        let natural = self.scaled_natural_size(&self.text);
        self.core.set_size(natural.width, natural.height);
        self.texture_size = Size::ZERO;
    }

    fn draw(
        &mut self,
        sink: &mut dyn PaintSink,
        transform: &GlMatrix,
        attrib: PaintAttrib,
        clip: &Region,
        mask: PaintMask,
    ) {
        let size = self.core.geometry().size();
        if self.texture_size != size {
            self.texture_size = size;
            self.render_texture();
        }
        self.tex.draw(&self.core, sink, transform, attrib, clip, mask);
    }

    fn debug_state(&self) -> DebugState {
        let mut state = DebugState::new(self.name())
            .with("geo", format!("{:?}", self.core.geometry()))
            .with("texture_size", format!("{:?}", self.texture_size));
        state.main_value = self.text.clone();
        state
    }
}
