// Copyright 2023 the Sill Authors
// SPDX-License-Identifier: Apache-2.0

//! The container holding a window's resize edges and its grab edge.

use std::cell::RefCell;
use std::rc::Rc;

use crate::compositor::{HostWindowRef, ScreenRef, WindowActions};
use crate::debug::DebugState;
use crate::geometry::{Extents, Rect};
use crate::timers::TimerQueue;
use crate::widget::{Edge, EdgeKind, GrabEdge, ItemCore, ItemRef, Widget};

/// Minimum clickable side length of a corner edge, in unscaled pixels.
const MIN_CORNER_EDGE: i32 = 10;

/// Up to nine children: eight resize edges plus the grab edge (always the
/// last). Windows without the resize action only get the grab edge.
pub struct EdgeBorders {
    core: ItemCore,
    items: Vec<ItemRef>,
    grab: Rc<RefCell<GrabEdge>>,
    win: HostWindowRef,
    resizable: bool,
}

impl EdgeBorders {
    pub fn new(
        screen: ScreenRef,
        win: HostWindowRef,
        timers: Rc<RefCell<TimerQueue>>,
    ) -> EdgeBorders {
        let mut items: Vec<ItemRef> = Vec::new();
        let resizable = win.actions().contains(WindowActions::RESIZE);

        if resizable {
            for kind in EdgeKind::RESIZE_KINDS {
                let edge = Rc::new(RefCell::new(Edge::new(screen.clone(), win.clone(), kind)));
                items.push(edge);
            }
        }

        let grab = Rc::new(RefCell::new(GrabEdge::new(
            screen,
            win.clone(),
            timers,
            false,
        )));
        items.push(grab.clone());

        let mut borders = EdgeBorders {
            core: ItemCore::default(),
            items,
            grab,
            win,
            resizable,
        };
        borders.relayout();
        borders
    }

    pub fn grab_edge(&self) -> &Rc<RefCell<GrabEdge>> {
        &self.grab
    }

    /// Positions this container over the window's input rect.
    pub fn set_frame(&mut self, rect: Rect) {
        self.core.set_coords(rect.x, rect.y);
        self.core.set_size(rect.width, rect.height);
        self.relayout();
    }

    fn place(&self, kind: EdgeKind, rect: Rect) {
        // The resize edges precede the grab edge in kind order.
        let index = EdgeKind::RESIZE_KINDS
            .iter()
            .position(|k| *k == kind)
            .unwrap_or(self.items.len() - 1);
        let mut edge = self.items[index].borrow_mut();
        edge.set_coords(rect.x, rect.y);
        edge.set_size(rect.width, rect.height);
    }
}

impl Widget for EdgeBorders {
    fn core(&self) -> &ItemCore {
        &self.core
    }

    fn core_mut(&mut self) -> &mut ItemCore {
        &mut self.core
    }

    fn name(&self) -> &'static str {
        "EdgeBorders"
    }

    fn is_container(&self) -> bool {
        true
    }

    fn children(&self) -> &[ItemRef] {
        &self.items
    }

    fn scale_changed(&mut self, scale: f64) {
        for item in &self.items {
            item.borrow_mut().set_scale(scale);
        }
        self.relayout();
    }

    fn relayout(&mut self) {
        let rect = self.core.geometry();
        let b = self.win.border();
        let ib = self.win.input();

        let min_corner = (MIN_CORNER_EDGE as f64 * self.core.scale).round() as i32;
        let edges = Extents::new(
            ib.left.max(min_corner),
            ib.right.max(min_corner),
            ib.top.max(min_corner),
            ib.bottom.max(min_corner),
        );

        // The grab edge sits over the title area just inside the border.
        {
            let mut grab = self.grab.borrow_mut();
            grab.set_coords(rect.x + ib.left, rect.y + ib.top - b.top);
            grab.set_size(rect.width - ib.left - ib.right, b.top);
        }

        if !self.resizable {
            return;
        }

        self.place(
            EdgeKind::Top,
            Rect::new(
                rect.x + edges.left,
                rect.y,
                rect.width - edges.left - edges.right,
                edges.top - b.top,
            ),
        );
        self.place(
            EdgeKind::TopLeft,
            Rect::new(rect.x, rect.y, edges.left, edges.top),
        );
        self.place(
            EdgeKind::TopRight,
            Rect::new(rect.x1() - edges.right, rect.y, edges.right, edges.top),
        );
        self.place(
            EdgeKind::Left,
            Rect::new(
                rect.x,
                rect.y + edges.top,
                edges.left,
                rect.height - edges.top - edges.bottom,
            ),
        );
        self.place(
            EdgeKind::Right,
            Rect::new(
                rect.x1() - edges.right,
                rect.y + edges.top,
                edges.right,
                rect.height - edges.top - edges.bottom,
            ),
        );
        self.place(
            EdgeKind::Bottom,
            Rect::new(
                rect.x + edges.left,
                rect.y1() - edges.bottom,
                rect.width - edges.left - edges.right,
                edges.bottom,
            ),
        );
        self.place(
            EdgeKind::BottomLeft,
            Rect::new(rect.x, rect.y1() - edges.bottom, edges.left, edges.bottom),
        );
        self.place(
            EdgeKind::BottomRight,
            Rect::new(
                rect.x1() - edges.right,
                rect.y1() - edges.bottom,
                edges.right,
                edges.bottom,
            ),
        );
    }

    fn debug_state(&self) -> DebugState {
        let mut state = DebugState::new(self.name())
            .with("geo", format!("{:?}", self.core.geometry()))
            .with("resizable", self.resizable);
        state.children = self
            .items
            .iter()
            .map(|item| item.borrow().debug_state())
            .collect();
        state
    }
}
