// Copyright 2023 the Sill Authors
// SPDX-License-Identifier: Apache-2.0

//! EWMH wire encodings.
//!
//! Pure constructors and decoders for the client messages and properties the
//! decoration core speaks, so the byte layout can be tested without a
//! server. Sending is the host's job ([`crate::compositor::Screen`]).

use x11rb::protocol::xproto::{ClientMessageEvent, CLIENT_MESSAGE_EVENT};

use crate::compositor::{MoveResizeRequest, Timestamp, Xid};
use crate::geometry::Extents;

/// Builds a 32-bit-format client message.
pub fn client_message(window: Xid, type_: u32, data: [u32; 5]) -> ClientMessageEvent {
    ClientMessageEvent {
        response_type: CLIENT_MESSAGE_EVENT,
        format: 32,
        sequence: 0,
        window,
        type_,
        data: data.into(),
    }
}

/// Builds the `_NET_WM_MOVERESIZE` client message for the root window.
/// `l[4] = 1` marks the request as coming from a normal application.
pub fn move_resize_message(atom: u32, request: MoveResizeRequest) -> ClientMessageEvent {
    client_message(
        request.window,
        atom,
        [
            request.root_x as u32,
            request.root_y as u32,
            request.direction as u32,
            request.button as u32,
            1,
        ],
    )
}

/// `_NET_FRAME_EXTENTS` payload: CARDINAL[4] = (left, right, top, bottom).
pub fn frame_extents_property(border: Extents) -> [u32; 4] {
    [
        border.left as u32,
        border.right as u32,
        border.top as u32,
        border.bottom as u32,
    ]
}

/// Decodes `_UNITY_GTK_BORDER_RADIUS`: CARDINAL[4] = (top-left, top-right,
/// bottom-left, bottom-right) corner radii. The per-side maxima are what the
/// shadow subtraction needs.
pub fn client_border_radii(corners: &[u32]) -> Option<Extents> {
    if corners.len() < 4 {
        return None;
    }
    let (tl, tr, bl, br) = (
        corners[0] as i32,
        corners[1] as i32,
        corners[2] as i32,
        corners[3] as i32,
    );
    Some(Extents {
        top: tl.max(tr),
        left: tl.max(bl),
        right: tr.max(br),
        bottom: bl.max(br),
    })
}

/// A decoded toolkit force-quit-dialog request.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ForceQuitRequest {
    pub window: Xid,
    pub time: Timestamp,
    pub show: bool,
}

/// Decodes a `_TOOLKIT_ACTION` client message when its action atom is the
/// force-quit dialog: `l[0] = action, l[1] = time, l[2] = show`.
pub fn force_quit_request(
    event: &ClientMessageEvent,
    force_quit_atom: u32,
) -> Option<ForceQuitRequest> {
    let data = event.data.as_data32();
    if data[0] != force_quit_atom {
        return None;
    }
    Some(ForceQuitRequest {
        window: event.window,
        time: data[1],
        show: data[2] != 0,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compositor::MoveResizeDirection;

    #[test]
    fn move_resize_wire_layout() {
        let msg = move_resize_message(
            42,
            MoveResizeRequest {
                window: 0x1234,
                root_x: 10,
                root_y: 20,
                direction: MoveResizeDirection::SizeTopLeft,
                button: 1,
            },
        );
        assert_eq!(msg.format, 32);
        assert_eq!(msg.window, 0x1234);
        assert_eq!(msg.type_, 42);
        assert_eq!(msg.data.as_data32(), [10, 20, 0, 1, 1]);
    }

    #[test]
    fn move_resize_direction_values() {
        // Direction codes are fixed by EWMH.
        assert_eq!(MoveResizeDirection::SizeTop as u32, 1);
        assert_eq!(MoveResizeDirection::SizeTopLeft as u32, 0);
        assert_eq!(MoveResizeDirection::SizeBottomRight as u32, 4);
        assert_eq!(MoveResizeDirection::Move as u32, 8);
        assert_eq!(MoveResizeDirection::Cancel as u32, 11);
    }

    #[test]
    fn border_radii_maxima() {
        let e = client_border_radii(&[8, 4, 2, 6]).unwrap();
        assert_eq!(e.top, 8);
        assert_eq!(e.left, 8);
        assert_eq!(e.right, 6);
        assert_eq!(e.bottom, 6);
        assert!(client_border_radii(&[1, 2]).is_none());
    }

    #[test]
    fn force_quit_decoding() {
        let msg = client_message(7, 99, [55, 1000, 1, 0, 0]);
        assert_eq!(
            force_quit_request(&msg, 55),
            Some(ForceQuitRequest {
                window: 7,
                time: 1000,
                show: true
            })
        );
        assert_eq!(force_quit_request(&msg, 56), None);
    }
}
