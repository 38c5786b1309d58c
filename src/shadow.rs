// Copyright 2023 the Sill Authors
// SPDX-License-Identifier: Apache-2.0

//! Shadow geometry and shadow texture construction.
//!
//! Rectangular windows get a four-quadrant nine-patch built from a shared
//! blurred-square texture; shaped windows get a single quad over a texture
//! blurred from their shape rectangles.

use anyhow::{anyhow, Result};
use std::rc::Rc;

use crate::compositor::{ScreenRef, ShapeExtents};
use crate::geometry::{Point, Rect, Region, Size};
use crate::style::Color;
use crate::texture::{blur_image_surface, TexCoordMatrix, Texture, TextureQuad};

/// The blur kernel reaches beyond its radius; shadow surfaces double the
/// margin to compensate.
const SHADOW_BLUR_MARGIN_FACTOR: i32 = 2;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum QuadPos {
    TopLeft = 0,
    TopRight = 1,
    BottomLeft = 2,
    BottomRight = 3,
}

/// The four shadow quads of a rectangular window.
#[derive(Clone, Debug, Default)]
pub struct ShadowQuads {
    quads: [TextureQuad; 4],
}

impl ShadowQuads {
    pub fn get(&self, pos: QuadPos) -> &TextureQuad {
        &self.quads[pos as usize]
    }

    pub fn all(&self) -> &[TextureQuad] {
        &self.quads
    }

    pub fn all_mut(&mut self) -> &mut [TextureQuad] {
        &mut self.quads
    }

    /// The outer bounding rect of the shadow.
    pub fn bounding_rect(&self) -> Rect {
        let tl = self.get(QuadPos::TopLeft).box_;
        let tr = self.get(QuadPos::TopRight).box_;
        let bl = self.get(QuadPos::BottomLeft).box_;
        Rect::new(tl.x, tl.y, tr.x1() - tl.x, bl.y1() - tl.y)
    }

    /// Subtracts the window's own region from every quad, so no shadow is
    /// painted under the client.
    pub fn clip_to_window(&mut self, win_region: &Region) {
        for quad in &mut self.quads {
            let mut region = Region::from_rect(quad.box_);
            region.subtract_region(win_region);
            quad.region = region;
        }
    }
}

/// Computes the four-quadrant shadow for border rect `border`.
///
/// The texture matrices flip the right/bottom quads so that texture
/// coordinates (0,0), (1,0), (0,1), (1,1) land on the outer corners. When
/// the texture is larger than the window, the quads are clamped to the
/// window's center line.
pub fn generic_shadow_quads(
    texture: &dyn Texture,
    border: Rect,
    win_geo: Rect,
    offset: Point,
    radius: u32,
) -> ShadowQuads {
    let mut quads = ShadowQuads::default();
    let tex_matrix = texture.matrix();
    let tex_size = texture.size();
    let texture_offset = radius as i32 * 2;

    // Top left quad
    let tl_box = Rect::new(
        border.x + offset.x - texture_offset,
        border.y + offset.y - texture_offset,
        border.width + offset.x + texture_offset * 2 - tex_size.width,
        border.height + offset.y + texture_offset * 2 - tex_size.height,
    );
    let mut matrix = tex_matrix;
    matrix.x0 = 0.0 - matrix.tex_x(tl_box.x0());
    matrix.y0 = 0.0 - matrix.tex_y(tl_box.y0());
    quads.quads[QuadPos::TopLeft as usize] = TextureQuad::new(tl_box, matrix);

    // Top right quad
    let tr_box = Rect::new(tl_box.x1(), tl_box.y0(), tex_size.width, tl_box.height);
    let mut matrix = tex_matrix;
    matrix.xx = -1.0 / tex_size.width as f64;
    matrix.x0 = 1.0 - matrix.tex_x(tr_box.x0());
    matrix.y0 = 0.0 - matrix.tex_y(tr_box.y0());
    quads.quads[QuadPos::TopRight as usize] = TextureQuad::new(tr_box, matrix);

    // Bottom left
    let bl_box = Rect::new(tl_box.x0(), tl_box.y1(), tl_box.width, tex_size.height);
    let mut matrix = tex_matrix;
    matrix.yy = -1.0 / tex_size.height as f64;
    matrix.x0 = 0.0 - matrix.tex_x(bl_box.x0());
    matrix.y0 = 1.0 - matrix.tex_y(bl_box.y0());
    quads.quads[QuadPos::BottomLeft as usize] = TextureQuad::new(bl_box, matrix);

    // Bottom right
    let br_box = Rect::new(bl_box.x1(), tr_box.y1(), tex_size.width, tex_size.height);
    let mut matrix = tex_matrix;
    matrix.xx = -1.0 / tex_size.width as f64;
    matrix.yy = -1.0 / tex_size.height as f64;
    matrix.x0 = 1.0 - matrix.tex_x(br_box.x0());
    matrix.y0 = 1.0 - matrix.tex_y(br_box.y0());
    quads.quads[QuadPos::BottomRight as usize] = TextureQuad::new(br_box, matrix);

    // Fix the quads if the texture is actually bigger than the area.
    if tex_size.width > border.width {
        let half = win_geo.x + win_geo.width / 2;
        quads.quads[QuadPos::TopLeft as usize].box_.set_right(half);
        quads.quads[QuadPos::TopRight as usize].box_.set_left(half);
        quads.quads[QuadPos::BottomLeft as usize].box_.set_right(half);
        quads.quads[QuadPos::BottomRight as usize].box_.set_left(half);
    }

    if tex_size.height > border.height {
        let half = win_geo.y + win_geo.height / 2;
        quads.quads[QuadPos::TopLeft as usize].box_.set_bottom(half);
        quads.quads[QuadPos::TopRight as usize].box_.set_bottom(half);
        quads.quads[QuadPos::BottomLeft as usize].box_.set_top(half);
        quads.quads[QuadPos::BottomRight as usize].box_.set_top(half);
    }

    for quad in &mut quads.quads {
        quad.region = Region::from_rect(quad.box_);
    }

    quads
}

/// The single quad of a shaped shadow.
pub fn shaped_shadow_quad(
    texture: &dyn Texture,
    border: Rect,
    offset: Point,
    radius: u32,
    shape_offset: Point,
) -> TextureQuad {
    let size = texture.size();
    let box_ = Rect::new(
        border.x + offset.x - radius as i32 * 2 + shape_offset.x,
        border.y + offset.y - radius as i32 * 2 + shape_offset.y,
        size.width,
        size.height,
    );
    let mut matrix = texture.matrix();
    matrix.x0 = -matrix.tex_x(box_.x0());
    matrix.y0 = -matrix.tex_y(box_.y0());
    TextureQuad::new(box_, matrix)
}

/// Renders the shared blurred-square shadow texture for `radius`.
///
/// The texture is a `4r` × `4r` square whose bottom-right quadrant holds
/// the colored rect, blurred in place; the quad matrices mirror it into the
/// other three corners.
pub fn build_shadow_texture(
    screen: &ScreenRef,
    radius: u32,
    color: Color,
) -> Result<Rc<dyn Texture>> {
    let tex_size = radius as i32 * 4;
    if tex_size == 0 {
        return Err(anyhow!("zero shadow radius has no texture"));
    }

    let mut image = cairo::ImageSurface::create(cairo::Format::ARgb32, tex_size, tex_size)
        .map_err(|e| anyhow!("shadow scratch surface: {}", e))?;
    {
        let cr = cairo::Context::new(&image).map_err(|e| anyhow!("shadow context: {}", e))?;
        cr.rectangle(
            radius as f64 * 2.0,
            radius as f64 * 2.0,
            tex_size as f64,
            tex_size as f64,
        );
        color.set_source(&cr);
        cr.fill().ok();
    }
    blur_image_surface(&mut image, radius);

    let ctx = screen.create_texture_surface(Size::new(tex_size, tex_size), 1.0)?;
    let cr = ctx.cr();
    cr.set_source_surface(&image, 0.0, 0.0)
        .map_err(|e| anyhow!("shadow compose: {}", e))?;
    cr.paint().map_err(|e| anyhow!("shadow paint: {}", e))?;
    Ok(ctx.into_texture())
}

/// Rasterizes a shaped window's shadow: each shape rectangle is painted in
/// the shadow color and the whole surface is blurred.
pub fn build_shaped_shadow_texture(
    screen: &ScreenRef,
    radius: u32,
    color: Color,
    shape: &ShapeExtents,
) -> Result<Rc<dyn Texture>> {
    let size = shaped_shadow_size(shape, radius);
    if size.is_empty() {
        return Err(anyhow!("shaped window has empty extents"));
    }

    let margin = radius as i32 * SHADOW_BLUR_MARGIN_FACTOR;
    let mut image = cairo::ImageSurface::create(cairo::Format::ARgb32, size.width, size.height)
        .map_err(|e| anyhow!("shaped shadow surface: {}", e))?;
    {
        let cr = cairo::Context::new(&image).map_err(|e| anyhow!("shaped shadow context: {}", e))?;
        color.set_source(&cr);
        for rect in &shape.rects {
            cr.rectangle(
                (rect.x + margin - shape.bounds.x) as f64,
                (rect.y + margin - shape.bounds.y) as f64,
                rect.width as f64,
                rect.height as f64,
            );
            cr.fill().ok();
        }
    }
    blur_image_surface(&mut image, radius);

    let ctx = screen.create_texture_surface(size, 1.0)?;
    let cr = ctx.cr();
    cr.set_source_surface(&image, 0.0, 0.0)
        .map_err(|e| anyhow!("shaped shadow compose: {}", e))?;
    cr.paint().map_err(|e| anyhow!("shaped shadow paint: {}", e))?;
    Ok(ctx.into_texture())
}

/// The texture size a shaped shadow needs for `shape` at `radius`.
pub fn shaped_shadow_size(shape: &ShapeExtents, radius: u32) -> Size {
    Size::new(
        shape.bounds.width + radius as i32 * 2 * SHADOW_BLUR_MARGIN_FACTOR,
        shape.bounds.height + radius as i32 * 2 * SHADOW_BLUR_MARGIN_FACTOR,
    )
}
