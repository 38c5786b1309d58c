// Copyright 2023 the Sill Authors
// SPDX-License-Identifier: Apache-2.0

//! Contracts with the compositor host.
//!
//! The decoration core never owns the window lifecycle, the GL paint pump,
//! or the event feed; it consumes them through the traits in this module.
//! The host hands a [`Screen`] oracle to the manager and one [`HostWindow`]
//! per managed top-level; the core hands quads back through a [`PaintSink`]
//! during the draw pass.

use std::rc::Rc;

use anyhow::Result;

use crate::geometry::{Extents, Point, Rect, Region, Size};
use crate::texture::{CairoContext, Texture};

/// X window id. `0` means "no window".
pub type Xid = u32;

/// X server timestamp, in milliseconds.
pub type Timestamp = u32;

/// An X cursor handle out of the host's cursor cache.
pub type XCursor = u32;

bitflags::bitflags! {
    /// What the compositor allows the user to do with a window.
    pub struct WindowActions: u32 {
        const MOVE          = 1 << 0;
        const RESIZE        = 1 << 1;
        const CLOSE         = 1 << 2;
        const MINIMIZE      = 1 << 3;
        const MAXIMIZE_HORZ = 1 << 4;
        const MAXIMIZE_VERT = 1 << 5;
        const SHADE         = 1 << 6;
    }
}

impl WindowActions {
    pub const MAXIMIZE: WindowActions = WindowActions {
        bits: WindowActions::MAXIMIZE_HORZ.bits | WindowActions::MAXIMIZE_VERT.bits,
    };
}

bitflags::bitflags! {
    /// Current window state bits, mirroring the EWMH state.
    pub struct WindowState: u32 {
        const MAXIMIZED_HORZ = 1 << 0;
        const MAXIMIZED_VERT = 1 << 1;
        const SHADED         = 1 << 2;
        const HIDDEN         = 1 << 3;
    }
}

/// The state bits a double-click or maximize button toggles.
pub const MAXIMIZE_STATE: WindowState = WindowState {
    bits: WindowState::MAXIMIZED_HORZ.bits | WindowState::MAXIMIZED_VERT.bits,
};

bitflags::bitflags! {
    /// Motif decoration hints, as far as the decoration policy cares.
    pub struct MwmDecor: u32 {
        const ALL    = 1 << 0;
        const BORDER = 1 << 1;
        const TITLE  = 1 << 2;
    }
}

impl Default for MwmDecor {
    fn default() -> MwmDecor {
        MwmDecor::ALL
    }
}

bitflags::bitflags! {
    /// Paint pass mask bits, matching the compositor's paint pipeline.
    pub struct PaintMask: u32 {
        const SCREEN_TRANSFORMED  = 1 << 0;
        const WINDOW_TRANSFORMED  = 1 << 1;
        const WINDOW_BLEND        = 1 << 2;
        const WINDOW_TRANSLUCENT  = 1 << 3;
    }
}

bitflags::bitflags! {
    /// Which decoration elements a window receives.
    pub struct DecorElements: u32 {
        const BORDER = 1 << 0;
        const EDGE   = 1 << 1;
        const SHADOW = 1 << 2;
        const SHAPED = 1 << 3;
    }
}

/// Window kinds the decoration policy distinguishes.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum WindowType {
    Normal,
    Dialog,
    ModalDialog,
    Utility,
    Menu,
    Dock,
    Desktop,
    Unknown,
}

/// Per-window paint attributes handed down by the compositor.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PaintAttrib {
    pub opacity: u16,
    pub brightness: u16,
    pub saturation: u16,
}

pub const OPAQUE: u16 = u16::MAX;

impl Default for PaintAttrib {
    fn default() -> PaintAttrib {
        PaintAttrib {
            opacity: OPAQUE,
            brightness: OPAQUE,
            saturation: OPAQUE,
        }
    }
}

/// The compositor's screen-space transform for the current pass. The core
/// treats it as opaque and passes it through to the sink.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GlMatrix(pub [f32; 16]);

impl Default for GlMatrix {
    fn default() -> GlMatrix {
        let mut m = [0.0; 16];
        m[0] = 1.0;
        m[5] = 1.0;
        m[10] = 1.0;
        m[15] = 1.0;
        GlMatrix(m)
    }
}

/// Cursor shapes for the resize edges, named after the X cursor font.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CursorShape {
    TopSide,
    TopLeftCorner,
    TopRightCorner,
    LeftSide,
    RightSide,
    BottomSide,
    BottomLeftCorner,
    BottomRightCorner,
    LeftPtr,
}

/// `_NET_WM_MOVERESIZE` directions, with the EWMH wire values.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MoveResizeDirection {
    SizeTopLeft = 0,
    SizeTop = 1,
    SizeTopRight = 2,
    SizeRight = 3,
    SizeBottomRight = 4,
    SizeBottom = 5,
    SizeBottomLeft = 6,
    SizeLeft = 7,
    Move = 8,
    Cancel = 11,
}

/// A `_NET_WM_MOVERESIZE` request the core wants sent to the root window.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct MoveResizeRequest {
    pub window: Xid,
    pub root_x: i32,
    pub root_y: i32,
    pub direction: MoveResizeDirection,
    pub button: u8,
}

/// Shape rectangles of an X-shaped window, with the extent bounds.
#[derive(Clone, Debug, Default)]
pub struct ShapeExtents {
    pub bounds: Rect,
    pub rects: Vec<Rect>,
}

/// The screen oracle the compositor host provides.
///
/// Everything here is either a pure read or a fire-and-forget request; the
/// host is responsible for the actual X traffic (typically by delegating to
/// [`crate::texture`]'s pixmap helpers for the texture factory part).
pub trait Screen {
    fn root(&self) -> Xid;

    /// The viewport currently shown. Windows on other viewports skip their
    /// decoration paint unless the screen is transformed.
    fn viewport(&self) -> Point;

    fn active_window(&self) -> Xid;

    fn cursor_cache(&self, shape: CursorShape) -> XCursor;

    /// Sets (or with `None` clears) the cursor of an input-only frame.
    fn define_cursor(&self, frame: Xid, cursor: Option<XCursor>);

    fn has_shape(&self) -> bool;

    /// Current pointer position in root coordinates.
    fn pointer_position(&self) -> Point;

    /// Index of the monitor containing most of `rect`.
    fn monitor_geometry_in(&self, rect: Rect) -> usize;

    /// DPI scale factor of each plugged monitor, indexed like
    /// [`Screen::monitor_geometry_in`].
    fn monitor_scales(&self) -> Vec<f64>;

    fn window_name(&self, xid: Xid) -> String;

    fn string_property(&self, xid: Xid, atom: u32) -> Option<String>;

    fn cardinal_property(&self, xid: Xid, atom: u32) -> Vec<u32>;

    /// Whether the window spread (scale) mode is active; frame input is
    /// ignored while it is.
    fn is_scale_active(&self) -> bool;

    /// Emits `_NET_WM_MOVERESIZE` to the root window, after dropping any
    /// pointer/keyboard grab the press may hold.
    fn send_move_resize(&self, request: MoveResizeRequest);

    /// Asks the toolkit to pop up the window menu at `pos`.
    fn show_window_menu(&self, xid: Xid, button: u8, time: Timestamp, pos: Point);

    fn damage_region(&self, region: &Region);

    /// Creates the input-only frame child of `parent` covering `geo`,
    /// with button/motion/crossing/structure (and shape, when available)
    /// events selected, mapped, and server-grab bracketed.
    fn create_frame(&self, parent: Xid, geo: Rect) -> Result<Xid>;

    fn destroy_frame(&self, frame: Xid);

    /// Moves/resizes the frame and lowers it below the client.
    fn configure_frame(&self, frame: Xid, geo: Rect);

    /// Applies the four-rectangle bounding shape to the frame.
    fn set_frame_shape(&self, frame: Xid, rects: &[Rect]);

    /// Reads back the frame's input shape rectangles.
    fn frame_input_shape(&self, frame: Xid) -> Vec<Rect>;

    /// Queries the shape rectangles of a shaped client window; `None` when
    /// the window is not shaped or the server returned no extents.
    fn shape_extents(&self, xid: Xid) -> Option<ShapeExtents>;

    /// Replaces a CARDINAL[] property on a client window.
    fn change_cardinal_property(&self, xid: Xid, atom: u32, values: &[u32]);

    /// Allocates a pixmap-backed texture with an ARGB32 cairo context over
    /// it. `scale` is recorded for the device-pixel conversion done by the
    /// style drawing functions.
    fn create_texture_surface(&self, size: Size, scale: f64) -> Result<CairoContext>;
}

/// The per-window accessors the compositor host provides.
pub trait HostWindow {
    fn id(&self) -> Xid;

    /// The server-owned wrapper window decorations reparent into; `0` until
    /// the compositor has framed the client.
    fn frame(&self) -> Xid;

    fn is_viewable(&self) -> bool;
    fn is_mapped(&self) -> bool;
    fn shaded(&self) -> bool;
    fn override_redirect(&self) -> bool;
    fn window_type(&self) -> WindowType;

    /// Whether the window carries a non-default X shape.
    fn is_shaped(&self) -> bool {
        false
    }

    /// Whether the window has an alpha channel.
    fn alpha(&self) -> bool;

    fn state(&self) -> WindowState;
    fn actions(&self) -> WindowActions;
    fn mwm_decor(&self) -> MwmDecor;

    /// True while the compositor still holds an unmap reference; extents
    /// must not be touched then.
    fn has_unmap_reference(&self) -> bool;

    /// Client geometry as the server currently knows it.
    fn server_geometry(&self) -> Rect;

    /// Client geometry as the compositor paints it.
    fn geometry(&self) -> Rect {
        self.server_geometry()
    }

    /// Decoration extents previously applied through
    /// [`HostWindow::set_frame_extents`].
    fn border(&self) -> Extents;

    /// Input extents previously applied through
    /// [`HostWindow::set_frame_extents`].
    fn input(&self) -> Extents;

    /// Client geometry expanded by the visual border.
    fn border_geometry(&self) -> Rect {
        self.border().expand(self.server_geometry())
    }

    /// Client geometry expanded by the input border.
    fn input_geometry(&self) -> Rect {
        self.input().expand(self.server_geometry())
    }

    /// The window's shape region, in screen coordinates.
    fn region(&self) -> Region {
        Region::from_rect(self.geometry())
    }

    fn default_viewport(&self) -> Point;

    fn set_frame_extents(&self, border: Extents, input: Extents);

    /// Tells the compositor to re-merge the decoration frame region.
    fn update_frame_region(&self);

    /// Tells the compositor to re-query the window's output extents (the
    /// shadow changed size).
    fn update_output_extents(&self);

    fn damage_output_extents(&self);

    fn close(&self, time: Timestamp);
    fn minimize(&self);
    fn unminimize(&self) {}

    /// Sets the maximization state bits; `WindowState::empty()` restores.
    fn maximize(&self, state: WindowState);

    fn lower(&self);
    fn shade(&self, shaded: bool);
}

/// Receives the textured quads of a draw pass. Implemented by the host's
/// GL pump; tests use a recording sink.
pub trait PaintSink {
    fn draw_textured(
        &mut self,
        texture: &dyn Texture,
        quads: &[crate::texture::TextureQuad],
        transform: &GlMatrix,
        attrib: PaintAttrib,
        mask: PaintMask,
        clip: &Region,
    );
}

/// Shorthand used throughout the widget tree.
pub type ScreenRef = Rc<dyn Screen>;
pub type HostWindowRef = Rc<dyn HostWindow>;
