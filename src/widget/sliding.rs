// Copyright 2023 the Sill Authors
// SPDX-License-Identifier: Apache-2.0

//! The title ↔ menu crossfade container.

use std::time::{Duration, Instant};

use crate::compositor::{GlMatrix, PaintAttrib, PaintMask, PaintSink};
use crate::geometry::{Region, Size};
use crate::widget::{ItemCore, ItemRef, Widget};

/// Linear crossfade state with an explicit clock, so the selection logic is
/// testable without waiting.
#[derive(Clone, Copy, Debug)]
pub struct FadeAnimator {
    anchor: f64,
    target: f64,
    started: Instant,
    duration: Duration,
}

impl FadeAnimator {
    pub fn new() -> FadeAnimator {
        FadeAnimator {
            anchor: 0.0,
            target: 0.0,
            started: Instant::now(),
            duration: Duration::ZERO,
        }
    }

    /// Starts (or reverses, from the current value) a fade toward
    /// `forward`.
    pub fn start(&mut self, forward: bool, duration: Duration, now: Instant) {
        self.anchor = self.value_at(now);
        self.target = if forward { 1.0 } else { 0.0 };
        self.started = now;
        self.duration = duration;
    }

    /// The input-item opacity in `[0, 1]` at `now`.
    pub fn value_at(&self, now: Instant) -> f64 {
        if self.duration.is_zero() {
            return self.target;
        }
        let progress =
            (now.saturating_duration_since(self.started)).as_secs_f64() / self.duration.as_secs_f64();
        self.anchor + (self.target - self.anchor) * progress.clamp(0.0, 1.0)
    }

    pub fn is_running(&self, now: Instant) -> bool {
        (self.value_at(now) - self.target).abs() > f64::EPSILON
    }
}

impl Default for FadeAnimator {
    fn default() -> FadeAnimator {
        FadeAnimator::new()
    }
}

const ROLE_INPUT: usize = 0;
const ROLE_MAIN: usize = 1;

/// Holds a main item (the title) and an input item (the menu layout) in the
/// same slot, crossfading between them as the mouse-owner flag flips.
pub struct SlidingLayout {
    core: ItemCore,
    /// `[input, main]`; the input item is hit-tested first.
    slots: [Option<ItemRef>; 2],
    children: Vec<ItemRef>,
    pub fadein: Duration,
    pub fadeout: Duration,
    /// When the menu is always shown, the input item wins unconditionally.
    pub override_main_item: bool,
    fade: FadeAnimator,
}

impl SlidingLayout {
    pub fn new() -> SlidingLayout {
        SlidingLayout {
            core: ItemCore::default(),
            slots: [None, None],
            children: Vec::new(),
            fadein: Duration::from_millis(100),
            fadeout: Duration::from_millis(120),
            override_main_item: false,
            fade: FadeAnimator::new(),
        }
    }

    pub fn set_main_item(&mut self, main: Option<ItemRef>) {
        self.set_slot(ROLE_MAIN, main);
    }

    pub fn set_input_item(&mut self, input: Option<ItemRef>) {
        self.set_slot(ROLE_INPUT, input);
    }

    pub fn main_item(&self) -> Option<&ItemRef> {
        self.slots[ROLE_MAIN].as_ref()
    }

    pub fn input_item(&self) -> Option<&ItemRef> {
        self.slots[ROLE_INPUT].as_ref()
    }

    fn set_slot(&mut self, role: usize, item: Option<ItemRef>) {
        if let Some(item) = &item {
            let mut child = item.borrow_mut();
            child.set_focused(self.core.focused);
            child.set_scale(self.core.scale);
        }
        self.slots[role] = item;
        self.children = self.slots.iter().flatten().cloned().collect();
        self.relayout();
    }

    /// Which item a non-animating draw shows.
    fn current_target(&self) -> Option<&ItemRef> {
        if self.slots[ROLE_INPUT].is_some() && (self.core.mouse_owner || self.override_main_item) {
            self.slots[ROLE_INPUT].as_ref()
        } else {
            self.slots[ROLE_MAIN].as_ref()
        }
    }

}

impl Widget for SlidingLayout {
    fn core(&self) -> &ItemCore {
        &self.core
    }

    fn core_mut(&mut self) -> &mut ItemCore {
        &mut self.core
    }

    fn name(&self) -> &'static str {
        "SlidingLayout"
    }

    fn is_container(&self) -> bool {
        true
    }

    fn children(&self) -> &[ItemRef] {
        &self.children
    }

    fn set_focused(&mut self, focused: bool) {
        if self.core.focused != focused {
            self.core.focused = focused;
            for item in self.slots.iter().flatten() {
                item.borrow_mut().set_focused(focused);
            }
        }
    }

    fn set_scale(&mut self, scale: f64) {
        if (self.core.scale - scale).abs() > f64::EPSILON {
            self.core.scale = scale;
            for item in self.slots.iter().flatten() {
                item.borrow_mut().set_scale(scale);
            }
            self.relayout();
        }
    }

    fn mouse_owner_changed(&mut self, owner: bool) {
        if self.slots[ROLE_INPUT].is_some() && !self.override_main_item {
            let duration = if owner { self.fadein } else { self.fadeout };
            self.fade.start(owner, duration, Instant::now());
        }
    }

    fn relayout(&mut self) {
        let mut contents = Size::ZERO;
        let rect = self.core.geometry();
        let max = self.core.max_size();
        let top_rect = self.core.top_rect;

        for item in self.slots.iter().flatten() {
            let mut item = item.borrow_mut();
            if !item.core().visible {
                continue;
            }
            item.core_mut().top_rect = top_rect;
            item.set_x(rect.x);
            let natural = Size::new(item.natural_width(), item.natural_height());
            item.set_min_width(natural.width);
            item.set_max_width(max.width);
            item.set_min_height(natural.height);
            item.set_max_height(max.height);
            if item.is_container() {
                item.relayout();
            }

            let geo = item.geometry();
            contents.width = contents.width.max(geo.width);
            contents.height = contents.height.max(geo.height);
        }

        for item in self.slots.iter().flatten() {
            let mut item = item.borrow_mut();
            if !item.core().visible {
                continue;
            }
            let height = item.geometry().height;
            item.set_y(rect.y + (contents.height - height) / 2);
        }

        // Content size is what the parent layout reads back.
        self.core.rect.width = contents.width;
        self.core.rect.height = contents.height;
    }

    fn draw(
        &mut self,
        sink: &mut dyn PaintSink,
        transform: &GlMatrix,
        attrib: PaintAttrib,
        clip: &Region,
        mask: PaintMask,
    ) {
        let Some(main) = self.slots[ROLE_MAIN].clone() else {
            if let Some(input) = self.slots[ROLE_INPUT].clone() {
                input.borrow_mut().draw(sink, transform, attrib, clip, mask);
            }
            return;
        };
        let Some(input) = self.slots[ROLE_INPUT].clone() else {
            main.borrow_mut().draw(sink, transform, attrib, clip, mask);
            return;
        };

        let now = Instant::now();
        if !self.override_main_item && self.fade.is_running(now) {
            let value = self.fade.value_at(now);

            let mut input_attrib = attrib;
            input_attrib.opacity = (value * u16::MAX as f64) as u16;
            input.borrow_mut().draw(sink, transform, input_attrib, clip, mask);

            let mut main_attrib = attrib;
            main_attrib.opacity = ((1.0 - value) * u16::MAX as f64) as u16;
            main.borrow_mut().draw(sink, transform, main_attrib, clip, mask);
        } else if let Some(target) = self.current_target().cloned() {
            target.borrow_mut().draw(sink, transform, attrib, clip, mask);
        }
    }

    fn debug_state(&self) -> crate::debug::DebugState {
        let mut state = crate::debug::DebugState::new(self.name())
            .with("geo", format!("{:?}", self.core.geometry()))
            .with("mouse_owner", self.core.mouse_owner)
            .with("override_main_item", self.override_main_item);
        state.children = self
            .children
            .iter()
            .map(|item| item.borrow().debug_state())
            .collect();
        state
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fade_interpolates_and_reverses() {
        let base = Instant::now();
        let mut fade = FadeAnimator::new();
        fade.start(true, Duration::from_millis(100), base);

        assert_eq!(fade.value_at(base), 0.0);
        let mid = fade.value_at(base + Duration::from_millis(50));
        assert!((mid - 0.5).abs() < 0.01);
        assert_eq!(fade.value_at(base + Duration::from_millis(200)), 1.0);
        assert!(!fade.is_running(base + Duration::from_millis(200)));

        // Reversing from the midpoint keeps the current value as anchor.
        fade.start(false, Duration::from_millis(100), base + Duration::from_millis(50));
        let value = fade.value_at(base + Duration::from_millis(100));
        assert!(value < 0.5);
        assert_eq!(fade.value_at(base + Duration::from_millis(500)), 0.0);
    }
}
