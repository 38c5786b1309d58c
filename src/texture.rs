// Copyright 2023 the Sill Authors
// SPDX-License-Identifier: Apache-2.0

//! Pixmap-backed textures and the cairo contexts that render into them.
//!
//! A [`PixmapTexture`] owns a server-side pixmap plus the host-bound GPU
//! texture handle; a [`CairoContext`] is an ARGB32 cairo context over a
//! fresh texture. The texture may outlive the context, which is what lets
//! the data pool and the per-window caches hold on to rendered decorations.

use std::cell::Cell;
use std::rc::Rc;

use anyhow::{anyhow, Context as _, Result};
use x11rb::connection::Connection;
use x11rb::protocol::xproto::{ConnectionExt, Pixmap};
use x11rb::xcb_ffi::XCBConnection;

use crate::geometry::{Point, Rect, Region, Size};

/// Host-side GPU texture handle, produced by binding a pixmap.
pub type TextureId = u32;

/// Texture-space coordinate transform of a quad: `u = xx * x + x0`,
/// `v = yy * y + y0`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TexCoordMatrix {
    pub xx: f64,
    pub yy: f64,
    pub x0: f64,
    pub y0: f64,
}

impl TexCoordMatrix {
    /// The native matrix of a texture: one texel per pixel, anchored at the
    /// origin.
    pub fn native(size: Size) -> TexCoordMatrix {
        TexCoordMatrix {
            xx: 1.0 / size.width.max(1) as f64,
            yy: 1.0 / size.height.max(1) as f64,
            x0: 0.0,
            y0: 0.0,
        }
    }

    pub fn tex_x(&self, x: i32) -> f64 {
        self.xx * x as f64 + self.x0
    }

    pub fn tex_y(&self, y: i32) -> f64 {
        self.yy * y as f64 + self.y0
    }
}

/// A screen-space box plus the texture matrix and clip region drawn with it:
/// one GPU draw call.
#[derive(Clone, Debug, PartialEq)]
pub struct TextureQuad {
    pub box_: Rect,
    pub matrix: TexCoordMatrix,
    pub region: Region,
}

impl TextureQuad {
    pub fn new(box_: Rect, matrix: TexCoordMatrix) -> TextureQuad {
        let region = Region::from_rect(box_);
        TextureQuad {
            box_,
            matrix,
            region,
        }
    }
}

impl Default for TextureQuad {
    fn default() -> TextureQuad {
        TextureQuad {
            box_: Rect::ZERO,
            matrix: TexCoordMatrix::native(Size::new(1, 1)),
            region: Region::EMPTY,
        }
    }
}

/// Anything that can be handed to the paint sink.
pub trait Texture {
    fn size(&self) -> Size;
    fn id(&self) -> TextureId;

    fn width(&self) -> i32 {
        self.size().width
    }

    fn height(&self) -> i32 {
        self.size().height
    }

    fn matrix(&self) -> TexCoordMatrix {
        TexCoordMatrix::native(self.size())
    }
}

/// A texture together with one positioned quad, the backing store of every
/// textured widget and of the four per-window side strips.
#[derive(Clone, Default)]
pub struct SimpleTextureQuad {
    texture: Option<Rc<dyn Texture>>,
    pub quad: TextureQuad,
}

impl SimpleTextureQuad {
    pub fn texture(&self) -> Option<&Rc<dyn Texture>> {
        self.texture.as_ref()
    }

    pub fn set_texture(&mut self, texture: Option<Rc<dyn Texture>>) {
        let origin = self.quad.box_.origin();
        match &texture {
            Some(tex) => {
                self.quad.box_ = Rect::from_origin_size(origin, tex.size());
                self.quad.matrix = tex.matrix();
            }
            None => {
                self.quad = TextureQuad::default();
            }
        }
        self.texture = texture;
        self.update_matrix();
    }

    /// Moves the quad, keeping the texture anchored to its top-left corner.
    pub fn set_coords(&mut self, p: Point) {
        if self.quad.box_.origin() == p {
            return;
        }
        self.quad.box_ = self.quad.box_.with_origin(p);
        self.update_matrix();
    }

    /// Resizes the quad box (the texture is cropped, not stretched).
    pub fn set_box(&mut self, box_: Rect) {
        self.quad.box_ = box_;
        self.update_matrix();
    }

    fn update_matrix(&mut self) {
        if let Some(tex) = &self.texture {
            let native = tex.matrix();
            self.quad.matrix.xx = native.xx;
            self.quad.matrix.yy = native.yy;
            self.quad.matrix.x0 = -native.xx * self.quad.box_.x0() as f64;
            self.quad.matrix.y0 = -native.yy * self.quad.box_.y0() as f64;
        }
        self.quad.region = Region::from_rect(self.quad.box_);
    }
}

/// Binds pixmaps to GPU textures. Implemented by the compositor host; the
/// GL side of the binding is its business.
pub trait PixmapBinder {
    fn bind(&self, pixmap: Pixmap, size: Size) -> Result<TextureId>;
    fn release(&self, id: TextureId);
}

/// A server-side pixmap bound to a GPU texture.
pub struct PixmapTexture {
    conn: Rc<XCBConnection>,
    binder: Rc<dyn PixmapBinder>,
    pixmap: Pixmap,
    id: TextureId,
    size: Size,
}

const PIXMAP_DEPTH: u8 = 32;

impl PixmapTexture {
    pub fn new(
        conn: Rc<XCBConnection>,
        binder: Rc<dyn PixmapBinder>,
        root: u32,
        size: Size,
    ) -> Result<PixmapTexture> {
        if size.is_empty() {
            return Err(anyhow!("refusing to create an empty pixmap texture"));
        }
        let pixmap = conn.generate_id()?;
        conn.create_pixmap(
            PIXMAP_DEPTH,
            pixmap,
            root,
            size.width as u16,
            size.height as u16,
        )?
        .check()
        .context("create decoration pixmap")?;
        let id = match binder.bind(pixmap, size) {
            Ok(id) => id,
            Err(e) => {
                log_x11!(conn.free_pixmap(pixmap));
                return Err(e).context("bind decoration pixmap");
            }
        };
        Ok(PixmapTexture {
            conn,
            binder,
            pixmap,
            id,
            size,
        })
    }

    pub fn pixmap(&self) -> Pixmap {
        self.pixmap
    }
}

impl Texture for PixmapTexture {
    fn size(&self) -> Size {
        self.size
    }

    fn id(&self) -> TextureId {
        self.id
    }
}

impl Drop for PixmapTexture {
    fn drop(&mut self) {
        self.binder.release(self.id);
        log_x11!(self.conn.free_pixmap(self.pixmap));
    }
}

/// An ARGB32 cairo rendering context over a freshly allocated texture.
///
/// Constructed by the host's [`crate::compositor::Screen::create_texture_surface`];
/// the X-backed path goes through [`xcb_pixmap_context`], tests use plain
/// image surfaces via [`CairoContext::image`].
pub struct CairoContext {
    cr: cairo::Context,
    surface: cairo::Surface,
    texture: Rc<dyn Texture>,
    size: Size,
    scale: f64,
}

impl CairoContext {
    pub fn new(
        cr: cairo::Context,
        surface: cairo::Surface,
        texture: Rc<dyn Texture>,
        size: Size,
        scale: f64,
    ) -> CairoContext {
        CairoContext {
            cr,
            surface,
            texture,
            size,
            scale,
        }
    }

    /// A CPU-only context over an image surface, backed by a fake texture
    /// handle. This is what mock hosts hand out.
    pub fn image(size: Size, scale: f64, texture: Rc<dyn Texture>) -> Result<CairoContext> {
        let surface = cairo::ImageSurface::create(cairo::Format::ARgb32, size.width, size.height)
            .map_err(|e| anyhow!("image surface: {}", e))?;
        let cr = cairo::Context::new(&surface).map_err(|e| anyhow!("cairo context: {}", e))?;
        Ok(CairoContext::new(cr, (*surface).clone(), texture, size, scale))
    }

    pub fn cr(&self) -> &cairo::Context {
        &self.cr
    }

    pub fn size(&self) -> Size {
        self.size
    }

    pub fn width(&self) -> i32 {
        self.size.width
    }

    pub fn height(&self) -> i32 {
        self.size.height
    }

    pub fn scale(&self) -> f64 {
        self.scale
    }

    /// Flushes pending drawing and releases the context, handing out the
    /// backing texture.
    pub fn into_texture(self) -> Rc<dyn Texture> {
        self.surface.flush();
        self.texture
    }
}

/// Builds a cairo context over a new 32-bit pixmap, the way the compositor
/// host is expected to implement its texture factory. `argb_visual` must be
/// the server's 32-bit ARGB visual.
pub fn xcb_pixmap_context(
    conn: Rc<XCBConnection>,
    binder: Rc<dyn PixmapBinder>,
    root: u32,
    argb_visual: x11rb::protocol::xproto::Visualtype,
    size: Size,
    scale: f64,
) -> Result<CairoContext> {
    let texture = Rc::new(PixmapTexture::new(conn.clone(), binder, root, size)?);

    let cairo_conn = unsafe {
        cairo::XCBConnection::from_raw_none(
            conn.get_raw_xcb_connection() as *mut cairo_sys::xcb_connection_t
        )
    };
    let drawable = cairo::XCBDrawable(texture.pixmap());
    let mut visual = xcb_visualtype_t::from(argb_visual);
    let cairo_visual = unsafe {
        cairo::XCBVisualType::from_raw_none(
            &mut visual as *mut xcb_visualtype_t as *mut cairo_sys::xcb_visualtype_t,
        )
    };
    let surface = cairo::XCBSurface::create(
        &cairo_conn,
        &drawable,
        &cairo_visual,
        size.width,
        size.height,
    )
    .map_err(|status| anyhow!("failed to create cairo surface: {}", status))?;
    let cr = cairo::Context::new(&surface).map_err(|e| anyhow!("cairo context: {}", e))?;

    // Pixmap contents are undefined until cleared.
    cr.save().ok();
    cr.set_operator(cairo::Operator::Clear);
    cr.paint().ok();
    cr.restore().ok();

    Ok(CairoContext::new(
        cr,
        (*surface).clone(),
        texture,
        size,
        scale,
    ))
}

/// A version of XCB's `xcb_visualtype_t` struct, needed to interoperate
/// with cairo.
#[allow(non_camel_case_types)]
#[derive(Debug, Clone, Copy)]
#[repr(C)]
pub struct xcb_visualtype_t {
    pub visual_id: u32,
    pub class: u8,
    pub bits_per_rgb_value: u8,
    pub colormap_entries: u16,
    pub red_mask: u32,
    pub green_mask: u32,
    pub blue_mask: u32,
    pub pad0: [u8; 4],
}

impl From<x11rb::protocol::xproto::Visualtype> for xcb_visualtype_t {
    fn from(value: x11rb::protocol::xproto::Visualtype) -> xcb_visualtype_t {
        xcb_visualtype_t {
            visual_id: value.visual_id,
            class: value.class.into(),
            bits_per_rgb_value: value.bits_per_rgb_value,
            colormap_entries: value.colormap_entries,
            red_mask: value.red_mask,
            green_mask: value.green_mask,
            blue_mask: value.blue_mask,
            pad0: [0; 4],
        }
    }
}

/// Box-blurs the alpha-premultiplied contents of an image surface in place.
/// Three passes approximate the gaussian the shadow recipe asks for; the
/// kernel reach is wider than `radius`, which is why shadow surfaces are
/// allocated with a doubled margin.
pub fn blur_image_surface(surface: &mut cairo::ImageSurface, radius: u32) {
    if radius == 0 {
        return;
    }
    let width = surface.width() as usize;
    let height = surface.height() as usize;
    let stride = surface.stride() as usize;
    if width == 0 || height == 0 {
        return;
    }
    surface.flush();
    let Ok(mut data) = surface.data() else {
        tracing::warn!("blur skipped: surface data unavailable");
        return;
    };

    let r = radius as usize;
    let mut scratch = vec![0u8; data.len()];
    for _ in 0..3 {
        // Horizontal pass, per channel of the 32-bit pixels.
        for y in 0..height {
            let row = y * stride;
            for c in 0..4 {
                let mut sum: u32 = 0;
                let mut count: u32 = 0;
                for x in 0..width.min(r + 1) {
                    sum += data[row + x * 4 + c] as u32;
                    count += 1;
                }
                for x in 0..width {
                    scratch[row + x * 4 + c] = (sum / count.max(1)) as u8;
                    if x + r + 1 < width {
                        sum += data[row + (x + r + 1) * 4 + c] as u32;
                        count += 1;
                    }
                    if x >= r {
                        sum -= data[row + (x - r) * 4 + c] as u32;
                        count -= 1;
                    }
                }
            }
        }
        // Vertical pass.
        for x in 0..width {
            for c in 0..4 {
                let col = x * 4 + c;
                let mut sum: u32 = 0;
                let mut count: u32 = 0;
                for y in 0..height.min(r + 1) {
                    sum += scratch[y * stride + col] as u32;
                    count += 1;
                }
                for y in 0..height {
                    data[y * stride + col] = (sum / count.max(1)) as u8;
                    if y + r + 1 < height {
                        sum += scratch[(y + r + 1) * stride + col] as u32;
                        count += 1;
                    }
                    if y >= r {
                        sum -= scratch[(y - r) * stride + col] as u32;
                        count -= 1;
                    }
                }
            }
        }
    }
    drop(data);
    surface.mark_dirty();
}

/// A texture that exists only as a size and an id; used by mock hosts and
/// by tests that exercise quad math without a server.
pub struct StubTexture {
    size: Size,
    id: TextureId,
}

thread_local! {
    static NEXT_STUB_ID: Cell<TextureId> = Cell::new(1);
}

impl StubTexture {
    pub fn new(size: Size) -> StubTexture {
        let id = NEXT_STUB_ID.with(|next| {
            let id = next.get();
            next.set(id + 1);
            id
        });
        StubTexture { size, id }
    }
}

impl Texture for StubTexture {
    fn size(&self) -> Size {
        self.size
    }

    fn id(&self) -> TextureId {
        self.id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn native_matrix_maps_size_to_unit() {
        let m = TexCoordMatrix::native(Size::new(32, 64));
        assert_eq!(m.tex_x(0), 0.0);
        assert_eq!(m.tex_x(32), 1.0);
        assert_eq!(m.tex_y(64), 1.0);
    }

    #[test]
    fn quad_follows_texture_coords() {
        let tex: Rc<dyn Texture> = Rc::new(StubTexture::new(Size::new(16, 16)));
        let mut quad = SimpleTextureQuad::default();
        quad.set_texture(Some(tex));
        quad.set_coords(Point::new(100, 50));
        assert_eq!(quad.quad.box_, Rect::new(100, 50, 16, 16));
        // The anchor point still maps to texture coordinate (0, 0).
        assert_eq!(quad.quad.matrix.tex_x(100), 0.0);
        assert_eq!(quad.quad.matrix.tex_y(50), 0.0);
        assert_eq!(quad.quad.matrix.tex_x(116), 1.0);
    }
}
