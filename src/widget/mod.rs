// Copyright 2023 the Sill Authors
// SPDX-License-Identifier: Apache-2.0

//! The retained widget tree.
//!
//! Decoration widgets form shallow trees (at most four levels, a handful of
//! items per window). A widget owns an [`ItemCore`] holding its geometry
//! and flags; containers own their children as shared handles and relayout
//! them explicitly. Instead of parent back-pointers, the content rect of
//! the top container is pushed down during relayout, which is all the
//! descendants ever need from their ancestors.

use std::cell::RefCell;
use std::rc::Rc;

use tracing::error;

use crate::compositor::{GlMatrix, PaintAttrib, PaintMask, PaintSink, Timestamp};
use crate::debug::DebugState;
use crate::geometry::{Point, Rect, Size};
use crate::texture::{SimpleTextureQuad, Texture};

mod button;
mod edge;
mod edges;
mod menu;
mod sliding;
mod title;

pub use button::WindowButton;
pub use edge::{Edge, EdgeKind, GrabEdge};
pub use edges::EdgeBorders;
pub use menu::{MenuDropdown, MenuEntry, MenuLayout};
pub use sliding::SlidingLayout;
pub use title::Title;

/// Shared handle to a widget in the tree.
pub type ItemRef = Rc<RefCell<dyn Widget>>;

/// Pointer identity for type-erased widget handles. Compares the data
/// pointer only, so handles unsized at different coercion sites still
/// match.
pub fn same_item(a: &ItemRef, b: &ItemRef) -> bool {
    std::ptr::eq(Rc::as_ptr(a) as *const u8, Rc::as_ptr(b) as *const u8)
}

/// Geometry and flags common to every widget.
#[derive(Clone, Debug)]
pub struct ItemCore {
    rect: Rect,
    natural: Size,
    min: Size,
    max: Size,
    pub visible: bool,
    pub focused: bool,
    pub sensitive: bool,
    pub mouse_owner: bool,
    pub scale: f64,
    /// Content rect of the top container, pushed down during relayout.
    pub top_rect: Option<Rect>,
}

impl Default for ItemCore {
    fn default() -> ItemCore {
        ItemCore {
            rect: Rect::ZERO,
            natural: Size::ZERO,
            min: Size::ZERO,
            max: Size::new(i32::MAX, i32::MAX),
            visible: true,
            focused: false,
            sensitive: true,
            mouse_owner: false,
            scale: 1.0,
            top_rect: None,
        }
    }
}

impl ItemCore {
    pub fn geometry(&self) -> Rect {
        self.rect
    }

    pub fn natural_size(&self) -> Size {
        self.natural
    }

    pub fn min_size(&self) -> Size {
        self.min
    }

    pub fn max_size(&self) -> Size {
        self.max
    }

    /// Sets the effective natural size. Widgets call this whenever the
    /// thing they wrap (texture, text, icon) changes size.
    pub fn set_natural(&mut self, size: Size) {
        self.natural = Size::new(size.width.max(0), size.height.max(0));
    }

    pub fn set_coords(&mut self, x: i32, y: i32) -> bool {
        if self.rect.x == x && self.rect.y == y {
            return false;
        }
        self.rect.x = x;
        self.rect.y = y;
        true
    }

    pub fn set_max_width(&mut self, value: i32) -> bool {
        let clamped = value.max(0);
        if self.max.width == clamped {
            return false;
        }
        self.max.width = clamped;
        self.min.width = self.min.width.min(self.max.width);
        if self.rect.width > self.max.width {
            self.rect.width = self.natural.width.min(self.max.width);
        }
        true
    }

    pub fn set_min_width(&mut self, value: i32) -> bool {
        let clamped = value.max(0);
        if self.min.width == clamped {
            return false;
        }
        self.min.width = clamped;
        self.max.width = self.max.width.max(self.min.width);
        if self.rect.width < self.min.width {
            self.rect.width = self.min.width;
        }
        true
    }

    pub fn set_max_height(&mut self, value: i32) -> bool {
        let clamped = value.max(0);
        if self.max.height == clamped {
            return false;
        }
        self.max.height = clamped;
        self.min.height = self.min.height.min(self.max.height);
        if self.rect.height > self.max.height {
            self.rect.height = self.natural.height.min(self.max.height);
        }
        true
    }

    pub fn set_min_height(&mut self, value: i32) -> bool {
        let clamped = value.max(0);
        if self.min.height == clamped {
            return false;
        }
        self.min.height = clamped;
        self.max.height = self.max.height.max(self.min.height);
        if self.rect.height < self.min.height {
            self.rect.height = self.min.height;
        }
        true
    }

    /// Snaps the natural size and both clamps to `width` × `height`.
    pub fn set_size(&mut self, width: i32, height: i32) -> bool {
        self.natural = Size::new(width.max(0), height.max(0));
        let mut changed = false;
        changed |= self.set_min_width(width);
        changed |= self.set_max_width(width);
        changed |= self.set_min_height(height);
        changed |= self.set_max_height(height);
        changed
    }
}

/// The widget protocol.
///
/// Default implementations make leaves cheap to write: geometry goes
/// through the core, input and paint do nothing.
pub trait Widget {
    fn core(&self) -> &ItemCore;
    fn core_mut(&mut self) -> &mut ItemCore;
    fn name(&self) -> &'static str;

    fn geometry(&self) -> Rect {
        self.core().rect
    }

    fn natural_width(&self) -> i32 {
        self.core().natural.width
    }

    fn natural_height(&self) -> i32 {
        self.core().natural.height
    }

    fn set_coords(&mut self, x: i32, y: i32) {
        self.core_mut().set_coords(x, y);
    }

    fn set_x(&mut self, x: i32) {
        let y = self.core().rect.y;
        self.set_coords(x, y);
    }

    fn set_y(&mut self, y: i32) {
        let x = self.core().rect.x;
        self.set_coords(x, y);
    }

    fn set_size(&mut self, width: i32, height: i32) {
        self.core_mut().set_size(width, height);
    }

    fn set_width(&mut self, width: i32) {
        let height = self.core().rect.height;
        self.set_size(width, height);
    }

    fn set_height(&mut self, height: i32) {
        let width = self.core().rect.width;
        self.set_size(width, height);
    }

    fn set_min_width(&mut self, value: i32) {
        self.core_mut().set_min_width(value);
    }

    fn set_max_width(&mut self, value: i32) {
        self.core_mut().set_max_width(value);
    }

    fn set_min_height(&mut self, value: i32) {
        self.core_mut().set_min_height(value);
    }

    fn set_max_height(&mut self, value: i32) {
        self.core_mut().set_max_height(value);
    }

    fn is_container(&self) -> bool {
        false
    }

    fn children(&self) -> &[ItemRef] {
        &[]
    }

    /// Recomputes child geometry. Containers override; leaves have nothing
    /// to do.
    fn relayout(&mut self) {}

    // Flags. The flag setters funnel through the core so the change hooks
    // fire exactly once per transition.

    fn set_visible(&mut self, visible: bool) {
        self.core_mut().visible = visible;
    }

    fn set_sensitive(&mut self, sensitive: bool) {
        self.core_mut().sensitive = sensitive;
    }

    fn set_focused(&mut self, focused: bool) {
        if self.core().focused != focused {
            self.core_mut().focused = focused;
            self.focused_changed(focused);
        }
    }

    fn focused_changed(&mut self, _focused: bool) {}

    fn set_scale(&mut self, scale: f64) {
        if (self.core().scale - scale).abs() > f64::EPSILON {
            self.core_mut().scale = scale;
            self.scale_changed(scale);
        }
    }

    fn scale_changed(&mut self, _scale: f64) {}

    fn set_mouse_owner(&mut self, owner: bool) {
        if self.core().mouse_owner != owner {
            self.core_mut().mouse_owner = owner;
            self.mouse_owner_changed(owner);
        }
    }

    fn mouse_owner_changed(&mut self, _owner: bool) {}

    // Input, delivered by the mixer.

    fn motion(&mut self, _p: Point, _time: Timestamp) {}
    fn button_down(&mut self, _p: Point, _button: u8, _time: Timestamp) {}
    fn button_up(&mut self, _p: Point, _button: u8, _time: Timestamp) {}

    // Paint.

    fn draw(
        &mut self,
        _sink: &mut dyn PaintSink,
        _transform: &GlMatrix,
        _attrib: PaintAttrib,
        _clip: &crate::geometry::Region,
        _mask: PaintMask,
    ) {
    }

    fn debug_state(&self) -> DebugState {
        let core = self.core();
        DebugState::new(self.name())
            .with("geo", format!("{:?}", core.rect))
            .with("visible", core.visible)
            .with("sensitive", core.sensitive)
            .with("focused", core.focused)
            .with("mouse_owner", core.mouse_owner)
            .with("scale", core.scale)
    }
}

/// Pixmap-texture backing for leaf widgets: one positioned quad that
/// follows the widget's layout rect.
#[derive(Default)]
pub struct TexturedItem {
    pub quad: SimpleTextureQuad,
}

impl TexturedItem {
    /// Installs a texture and makes it the widget's natural size.
    pub fn set_texture(&mut self, core: &mut ItemCore, texture: Option<Rc<dyn Texture>>) {
        let size = texture.as_ref().map(|t| t.size()).unwrap_or(Size::ZERO);
        self.quad.set_texture(texture);
        core.set_natural(size);
    }

    pub fn has_texture(&self) -> bool {
        self.quad.texture().is_some()
    }

    /// Emits the quad, cropped to the widget's layout rect.
    pub fn draw(
        &mut self,
        core: &ItemCore,
        sink: &mut dyn PaintSink,
        transform: &GlMatrix,
        attrib: PaintAttrib,
        clip: &crate::geometry::Region,
        mask: PaintMask,
    ) {
        if !core.visible {
            return;
        }
        let Some(texture) = self.quad.texture().cloned() else {
            return;
        };
        self.quad.set_box(core.rect);
        sink.draw_textured(
            texture.as_ref(),
            std::slice::from_ref(&self.quad.quad),
            transform,
            attrib,
            mask,
            clip,
        );
    }
}

/// The padding set of a horizontal layout.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Padding {
    pub inner: i32,
    pub left: i32,
    pub right: i32,
    pub top: i32,
    pub bottom: i32,
}

/// The horizontal relayout shared by [`Layout`] and the menu layout.
///
/// Two passes at most: the first hands every visible child its natural
/// width and the available clamps, the second walks the children in
/// reverse shrinking them by the overflow (reclaiming the inner padding
/// first) and centers them vertically. If the result still exceeds the
/// clamp the layout logs and stops rather than looping.
pub(crate) fn layout_row(core: &mut ItemCore, padding: &Padding, items: &[ItemRef]) {
    let mut pass = 0;
    let available = Size::new(
        (core.max.width - padding.left - padding.right).max(0),
        (core.max.height - padding.top - padding.bottom).max(0),
    );
    let top_rect = core.top_rect.unwrap_or_else(|| content_rect(core, padding));

    loop {
        let mut content = Size::new(padding.left.min(core.max.width), 0);

        for item in items {
            let mut item = item.borrow_mut();
            if !item.core().visible {
                continue;
            }

            if pass == 0 {
                let natural = Size::new(item.natural_width(), item.natural_height());
                item.core_mut().top_rect = Some(top_rect);
                item.set_min_width(natural.width);
                item.set_max_width(available.width);
                item.set_min_height(available.height.min(natural.height));
                item.set_max_height(available.height);
                if item.is_container() {
                    item.relayout();
                }
            }

            let item_geo = item.geometry();
            content.height = content.height.max(item_geo.height);
            item.set_x(core.rect.x + content.width);

            if item_geo.width > 0 {
                content.width += item_geo.width + padding.inner;
            }
        }

        if !items.is_empty() && content.width > padding.inner {
            content.width -= padding.inner;
        }

        let actual_right_padding = padding.right.min(core.max.width - content.width).max(0);
        let vertical_padding = padding.top + padding.bottom;

        content.width += actual_right_padding;
        content.height += vertical_padding.min(core.max.height);

        if content.width < core.min.width {
            content.width = core.min.width;
        }
        if content.height < core.min.height {
            content.height = core.min.height;
        }

        let mut exceeding_width =
            content.width - core.max.width + padding.inner + padding.right - actual_right_padding;
        let content_y = core.rect.y + padding.top;

        for item in items.iter().rev() {
            let mut item = item.borrow_mut();
            if !item.core().visible {
                continue;
            }

            let item_geo = item.geometry();

            if exceeding_width > 0 {
                exceeding_width -= padding.inner;
            }

            if exceeding_width > 0 && item_geo.width > 0 {
                let old_width = item_geo.width;
                let max_item_width = (old_width - exceeding_width).max(0);
                item.set_max_width(max_item_width);
                if item.is_container() {
                    item.relayout();
                }
                exceeding_width -= old_width - max_item_width;
            }

            let item_height = item.geometry().height;
            item.set_y(content_y + (content.height - vertical_padding - item_height) / 2);
        }

        core.rect.width = content.width;
        core.rect.height = content.height;

        if core.rect.width <= core.max.width && core.rect.height <= core.max.height {
            break;
        }
        if pass > 1 {
            error!("relayout did not settle in two passes, giving up on this subtree");
            break;
        }
        pass += 1;
    }
}

fn content_rect(core: &ItemCore, padding: &Padding) -> Rect {
    Rect::new(
        core.rect.x + padding.left,
        core.rect.y + padding.top,
        (core.rect.width - padding.left - padding.right).max(0),
        (core.rect.height - padding.top - padding.bottom).max(0),
    )
}

/// A plain horizontal layout.
#[derive(Default)]
pub struct Layout {
    core: ItemCore,
    items: Vec<ItemRef>,
    padding: Padding,
}

impl Layout {
    pub fn new() -> Layout {
        Layout::default()
    }

    pub fn padding(&self) -> Padding {
        self.padding
    }

    pub fn set_padding(&mut self, padding: Padding) {
        let clamped = Padding {
            inner: padding.inner.max(0),
            left: padding.left.max(0),
            right: padding.right.max(0),
            top: padding.top.max(0),
            bottom: padding.bottom.max(0),
        };
        if self.padding != clamped {
            self.padding = clamped;
            self.relayout();
        }
    }

    pub fn append(&mut self, item: ItemRef) {
        if self.items.iter().any(|i| same_item(i, &item)) {
            return;
        }
        self.items.push(item);
        self.relayout();
    }

    pub fn remove(&mut self, item: &ItemRef) {
        self.items.retain(|i| !same_item(i, item));
        self.relayout();
    }

    pub fn items(&self) -> &[ItemRef] {
        &self.items
    }

    /// Positions this layout and recomputes its children.
    pub fn set_frame(&mut self, rect: Rect) {
        self.core.set_coords(rect.x, rect.y);
        self.core.set_size(rect.width, rect.height);
        self.relayout();
    }
}

impl Widget for Layout {
    fn core(&self) -> &ItemCore {
        &self.core
    }

    fn core_mut(&mut self) -> &mut ItemCore {
        &mut self.core
    }

    fn name(&self) -> &'static str {
        "Layout"
    }

    fn is_container(&self) -> bool {
        true
    }

    fn children(&self) -> &[ItemRef] {
        &self.items
    }

    fn relayout(&mut self) {
        layout_row(&mut self.core, &self.padding, &self.items);
    }

    fn set_focused(&mut self, focused: bool) {
        if self.core.focused != focused {
            self.core.focused = focused;
            for item in &self.items {
                item.borrow_mut().set_focused(focused);
            }
        }
    }

    fn set_scale(&mut self, scale: f64) {
        if (self.core.scale - scale).abs() > f64::EPSILON {
            self.core.scale = scale;
            for item in &self.items {
                item.borrow_mut().set_scale(scale);
            }
            self.relayout();
        }
    }

    fn draw(
        &mut self,
        sink: &mut dyn PaintSink,
        transform: &GlMatrix,
        attrib: PaintAttrib,
        clip: &crate::geometry::Region,
        mask: PaintMask,
    ) {
        for item in &self.items {
            let mut item = item.borrow_mut();
            if item.core().visible {
                item.draw(sink, transform, attrib, clip, mask);
            }
        }
    }

    fn debug_state(&self) -> DebugState {
        let mut state = DebugState::new(self.name())
            .with("geo", format!("{:?}", self.core.rect))
            .with("visible", self.core.visible);
        state.children = self
            .items
            .iter()
            .map(|item| item.borrow().debug_state())
            .collect();
        state
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// A fixed-natural-size leaf for layout tests.
    pub(crate) struct TestItem {
        core: ItemCore,
    }

    impl TestItem {
        pub(crate) fn new(width: i32, height: i32) -> Rc<RefCell<TestItem>> {
            let mut core = ItemCore::default();
            core.set_natural(Size::new(width, height));
            Rc::new(RefCell::new(TestItem { core }))
        }
    }

    impl Widget for TestItem {
        fn core(&self) -> &ItemCore {
            &self.core
        }

        fn core_mut(&mut self) -> &mut ItemCore {
            &mut self.core
        }

        fn name(&self) -> &'static str {
            "TestItem"
        }
    }

    fn geo(item: &Rc<RefCell<TestItem>>) -> Rect {
        item.borrow().geometry()
    }

    #[test]
    fn clamps_keep_rect_within_bounds() {
        let mut core = ItemCore::default();
        core.set_natural(Size::new(100, 20));
        core.set_min_width(100);
        core.set_max_width(50);
        assert!(core.min_size().width <= core.max_size().width);
        assert!(core.geometry().width <= 50);

        // Raising min above max raises max along.
        core.set_min_width(80);
        assert_eq!(core.max_size().width, 80);
        assert_eq!(core.geometry().width, 80);
    }

    #[test]
    fn set_size_snaps_both_clamps() {
        let mut core = ItemCore::default();
        core.set_size(40, 30);
        assert_eq!(core.natural_size(), Size::new(40, 30));
        assert_eq!(core.min_size(), Size::new(40, 30));
        assert_eq!(core.max_size(), Size::new(40, 30));
        assert_eq!(core.geometry().size(), Size::new(40, 30));
    }

    #[test]
    fn layout_respects_child_clamps() {
        let mut layout = Layout::new();
        let a = TestItem::new(30, 10);
        let b = TestItem::new(40, 16);
        layout.append(a.clone());
        layout.append(b.clone());
        layout.set_frame(Rect::new(0, 0, 200, 24));

        for item in [&a, &b] {
            let item = item.borrow();
            let geo = item.geometry();
            assert!(item.core().min_size().width <= geo.width);
            assert!(geo.width <= item.core().max_size().width);
        }
        assert_eq!(geo(&a).width, 30);
        assert_eq!(geo(&b).width, 40);
        assert_eq!(geo(&b).x, 30);
    }

    #[test]
    fn layout_exact_fit_keeps_natural_widths() {
        let mut layout = Layout::new();
        layout.set_padding(Padding {
            inner: 5,
            right: 10,
            ..Padding::default()
        });
        let a = TestItem::new(30, 10);
        let b = TestItem::new(45, 10);
        layout.append(a.clone());
        layout.append(b.clone());
        // Total: 30 + 5 + 45 + 10 = 90, exactly the available width.
        layout.set_frame(Rect::new(0, 0, 90, 20));

        assert_eq!(geo(&a).width, 30);
        assert_eq!(geo(&b).width, 45);
    }

    #[test]
    fn layout_shrinks_wide_child_first() {
        let mut layout = Layout::new();
        let small = TestItem::new(20, 10);
        let wide = TestItem::new(500, 10);
        layout.append(small.clone());
        layout.append(wide.clone());
        layout.set_frame(Rect::new(0, 0, 100, 20));

        // The reverse pass shrinks the rightmost (wide) child; the small one
        // keeps its natural width.
        assert_eq!(geo(&small).width, 20);
        assert!(geo(&wide).width <= 80);
        assert!(layout.geometry().width <= 100);
    }

    #[test]
    fn relayout_is_idempotent() {
        let mut layout = Layout::new();
        layout.set_padding(Padding {
            inner: 3,
            left: 4,
            right: 5,
            top: 2,
            bottom: 1,
        });
        let a = TestItem::new(37, 11);
        let b = TestItem::new(90, 15);
        let c = TestItem::new(13, 9);
        layout.append(a.clone());
        layout.append(b.clone());
        layout.append(c.clone());
        layout.set_frame(Rect::new(7, 3, 120, 22));

        let first = [geo(&a), geo(&b), geo(&c)];
        layout.relayout();
        let second = [geo(&a), geo(&b), geo(&c)];
        assert_eq!(first, second);
    }

    #[test]
    fn invisible_children_take_no_space() {
        let mut layout = Layout::new();
        let a = TestItem::new(30, 10);
        let b = TestItem::new(40, 10);
        layout.append(a.clone());
        layout.append(b.clone());
        a.borrow_mut().set_visible(false);
        layout.set_frame(Rect::new(0, 0, 200, 20));
        assert_eq!(geo(&b).x, 0);
    }

    #[test]
    fn children_are_vertically_centered() {
        let mut layout = Layout::new();
        let short = TestItem::new(10, 10);
        let tall = TestItem::new(10, 20);
        layout.append(short.clone());
        layout.append(tall.clone());
        layout.set_frame(Rect::new(0, 0, 100, 20));

        assert_eq!(geo(&tall).y, 0);
        assert_eq!(geo(&short).y, 5);
    }
}
