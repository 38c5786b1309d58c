// Copyright 2023 the Sill Authors
// SPDX-License-Identifier: Apache-2.0

//! X plumbing for input-only frame windows.
//!
//! The [`crate::compositor::Screen`] implementation of a real host is
//! expected to delegate its frame operations here; tests substitute their
//! own recording screens instead.

use std::rc::Rc;

use anyhow::{Context as _, Result};
use x11rb::connection::Connection;
use x11rb::protocol::shape::{self, ConnectionExt as _};
use x11rb::protocol::xproto::{
    ChangeWindowAttributesAux, ClipOrdering, ConfigureWindowAux, ConnectionExt, CreateWindowAux,
    Cursor, EventMask, Rectangle, StackMode, WindowClass,
};
use x11rb::xcb_ffi::XCBConnection;

use crate::compositor::{ShapeExtents, Xid};
use crate::geometry::Rect;

fn to_x_rects(rects: &[Rect]) -> Vec<Rectangle> {
    rects
        .iter()
        .map(|r| Rectangle {
            x: r.x as i16,
            y: r.y as i16,
            width: r.width as u16,
            height: r.height as u16,
        })
        .collect()
}

/// Creates the input-only child of `parent` covering `geo` and maps it.
///
/// The server stays grabbed for the duration: we are placing a window into
/// a hierarchy another client owns, and nobody may reparent into it midway.
pub fn create_frame_window(
    conn: &Rc<XCBConnection>,
    parent: Xid,
    geo: Rect,
    has_shape: bool,
) -> Result<Xid> {
    conn.grab_server()?;

    let result = (|| -> Result<Xid> {
        let frame = conn.generate_id()?;
        conn.create_window(
            x11rb::COPY_FROM_PARENT as u8,
            frame,
            parent,
            geo.x as i16,
            geo.y as i16,
            geo.width.max(1) as u16,
            geo.height.max(1) as u16,
            0,
            WindowClass::INPUT_ONLY,
            x11rb::COPY_FROM_PARENT,
            &CreateWindowAux::new().override_redirect(1).event_mask(
                EventMask::STRUCTURE_NOTIFY
                    | EventMask::BUTTON_PRESS
                    | EventMask::BUTTON_RELEASE
                    | EventMask::ENTER_WINDOW
                    | EventMask::LEAVE_WINDOW
                    | EventMask::POINTER_MOTION,
            ),
        )?
        .check()
        .context("create input-only frame")?;

        if has_shape {
            conn.shape_select_input(frame, true)?;
        }
        conn.map_window(frame)?;
        Ok(frame)
    })();

    log_x11!(conn.ungrab_server());
    log_x11!(conn.flush());
    result
}

pub fn destroy_frame_window(conn: &Rc<XCBConnection>, frame: Xid) {
    log_x11!(conn.destroy_window(frame));
}

/// Moves/resizes the frame and drops it below the client window.
pub fn configure_frame_window(conn: &Rc<XCBConnection>, frame: Xid, geo: Rect) {
    log_x11!(conn.configure_window(
        frame,
        &ConfigureWindowAux::new()
            .x(geo.x)
            .y(geo.y)
            .width(geo.width.max(1) as u32)
            .height(geo.height.max(1) as u32)
            .stack_mode(StackMode::BELOW),
    ));
}

/// Applies the four border rectangles as the frame's bounding shape.
pub fn set_frame_shape(conn: &Rc<XCBConnection>, frame: Xid, rects: &[Rect]) {
    log_x11!(conn.shape_rectangles(
        shape::SO::SET,
        shape::SK::BOUNDING,
        ClipOrdering::YX_BANDED,
        frame,
        0,
        0,
        &to_x_rects(rects),
    ));
}

/// Reads back the frame's effective input shape.
pub fn frame_input_shape(conn: &Rc<XCBConnection>, frame: Xid) -> Result<Vec<Rect>> {
    let reply = conn
        .shape_get_rectangles(frame, shape::SK::INPUT)?
        .reply()
        .context("get frame input shape")?;
    Ok(reply
        .rectangles
        .iter()
        .map(|r| Rect::new(r.x as i32, r.y as i32, r.width as i32, r.height as i32))
        .collect())
}

/// Queries the shape of a shaped client window: the bounding shape when
/// set, the clip shape otherwise, `None` when the server reports neither.
pub fn query_shape_extents(conn: &Rc<XCBConnection>, window: Xid) -> Result<Option<ShapeExtents>> {
    let extents = conn
        .shape_query_extents(window)?
        .reply()
        .context("query shape extents")?;

    let (bounds, kind) = if extents.bounding_shaped {
        (
            Rect::new(
                extents.bounding_shape_extents_x as i32,
                extents.bounding_shape_extents_y as i32,
                extents.bounding_shape_extents_width as i32,
                extents.bounding_shape_extents_height as i32,
            ),
            shape::SK::BOUNDING,
        )
    } else if extents.clip_shaped {
        (
            Rect::new(
                extents.clip_shape_extents_x as i32,
                extents.clip_shape_extents_y as i32,
                extents.clip_shape_extents_width as i32,
                extents.clip_shape_extents_height as i32,
            ),
            shape::SK::CLIP,
        )
    } else {
        return Ok(None);
    };

    let rects = conn
        .shape_get_rectangles(window, kind)?
        .reply()
        .context("get shape rectangles")?
        .rectangles
        .iter()
        .map(|r| Rect::new(r.x as i32, r.y as i32, r.width as i32, r.height as i32))
        .collect();

    Ok(Some(ShapeExtents { bounds, rects }))
}

/// Sets or clears the cursor of an input-only frame.
pub fn define_cursor(conn: &Rc<XCBConnection>, frame: Xid, cursor: Option<Cursor>) {
    let aux = ChangeWindowAttributesAux::new().cursor(cursor.unwrap_or(x11rb::NONE));
    log_x11!(conn.change_window_attributes(frame, &aux));
}
