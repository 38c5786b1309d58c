// Copyright 2023 the Sill Authors
// SPDX-License-Identifier: Apache-2.0

//! Pointer event routing for one decorated window.
//!
//! The mixer owns an ordered list of top-level widgets (front items are
//! hit-tested first), tracks which widget currently owns the mouse, and
//! implements the implicit pointer grab between a button press and the
//! matching release.

use crate::geometry::Point;
use crate::widget::{same_item, ItemRef, Widget};

pub struct InputMixer {
    items: Vec<ItemRef>,
    last_mouse_owner: Option<ItemRef>,
    /// The button that started the implicit grab, while one is held.
    grab_button: Option<u8>,
    /// Whether a motion happened during a grab, so the owner has to be
    /// re-evaluated once the grab ends.
    recheck_owner: bool,
}

impl InputMixer {
    pub fn new() -> InputMixer {
        InputMixer {
            items: Vec::new(),
            last_mouse_owner: None,
            grab_button: None,
            recheck_owner: false,
        }
    }

    /// Adds an item in front of the list: painted last, hit-tested first.
    pub fn push_to_front(&mut self, item: ItemRef) {
        self.items.retain(|i| !same_item(i, &item));
        self.items.insert(0, item);
    }

    pub fn push_to_back(&mut self, item: ItemRef) {
        self.items.retain(|i| !same_item(i, &item));
        self.items.push(item);
    }

    pub fn remove(&mut self, item: &ItemRef) {
        if let Some(owner) = &self.last_mouse_owner {
            if same_item(owner, item) {
                // The grab, if any, dies with the item.
                self.unset_mouse_owner();
                self.grab_button = None;
                self.recheck_owner = false;
            }
        }
        self.items.retain(|i| !same_item(i, item));
    }

    pub fn items(&self) -> &[ItemRef] {
        &self.items
    }

    pub fn mouse_owner(&self) -> Option<&ItemRef> {
        self.last_mouse_owner.as_ref()
    }

    pub fn grabbed(&self) -> bool {
        self.grab_button.is_some()
    }

    fn matching_item(items: &[ItemRef], point: Point) -> Option<ItemRef> {
        for item in items {
            let borrowed = item.borrow();
            if !borrowed.core().visible || !borrowed.geometry().contains(point) {
                continue;
            }
            if borrowed.is_container() {
                // Clicks on gaps inside a container fall through to siblings,
                // never onto the container itself.
                if let Some(child) = Self::matching_item(borrowed.children(), point) {
                    return Some(child);
                }
            } else if borrowed.core().sensitive {
                return Some(item.clone());
            } else {
                return None;
            }
        }
        None
    }

    fn update_mouse_owner(&mut self, point: Point) {
        match Self::matching_item(&self.items, point) {
            Some(item) => {
                let same = self
                    .last_mouse_owner
                    .as_ref()
                    .map(|owner| same_item(owner, &item))
                    .unwrap_or(false);
                if !same {
                    self.unset_mouse_owner();
                    item.borrow_mut().set_mouse_owner(true);
                    self.last_mouse_owner = Some(item);
                }
            }
            None => self.unset_mouse_owner(),
        }
    }

    fn unset_mouse_owner(&mut self) {
        if let Some(owner) = self.last_mouse_owner.take() {
            owner.borrow_mut().set_mouse_owner(false);
        }
    }

    /// Re-runs the hit test at the current pointer position; used after the
    /// widget tree changed underneath the pointer.
    pub fn force_mouse_owner_check(&mut self, point: Point) {
        if self.grab_button.is_none() {
            self.update_mouse_owner(point);
        }
    }

    pub fn enter_event(&mut self, point: Point) {
        if self.grab_button.is_none() {
            self.update_mouse_owner(point);
        }
    }

    pub fn leave_event(&mut self, _point: Point) {
        if self.grab_button.is_some() {
            self.recheck_owner = true;
        } else {
            self.unset_mouse_owner();
        }
    }

    pub fn motion_event(&mut self, point: Point, time: u32) {
        if self.grab_button.is_some() {
            // Implicit grab: the press owner keeps receiving motion, even
            // outside its rect; the hit test is deferred to the release.
            self.recheck_owner = true;
        } else {
            self.update_mouse_owner(point);
        }
        if let Some(owner) = self.last_mouse_owner.clone() {
            owner.borrow_mut().motion(point, time);
        }
    }

    pub fn button_down_event(&mut self, point: Point, button: u8, time: u32) {
        if self.grab_button.is_none() {
            self.update_mouse_owner(point);
            if self.last_mouse_owner.is_some() {
                self.grab_button = Some(button);
            }
        }
        // Keep a strong reference across the call: the handler may tear the
        // widget tree down under us.
        if let Some(owner) = self.last_mouse_owner.clone() {
            owner.borrow_mut().button_down(point, button, time);
        }
    }

    pub fn button_up_event(&mut self, point: Point, button: u8, time: u32) {
        if let Some(owner) = self.last_mouse_owner.clone() {
            owner.borrow_mut().button_up(point, button, time);
        }
        if self.grab_button == Some(button) {
            self.grab_button = None;
            if self.recheck_owner {
                self.recheck_owner = false;
                self.update_mouse_owner(point);
            }
        }
    }

    /// The compositor grabbed the pointer out from under us: the owner
    /// loses the mouse with no synthetic release.
    pub fn ungrab_pointer(&mut self) {
        self.grab_button = None;
        self.recheck_owner = false;
        self.unset_mouse_owner();
    }
}

impl Default for InputMixer {
    fn default() -> InputMixer {
        InputMixer::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    use crate::geometry::Rect;
    use crate::widget::ItemCore;

    #[derive(Default)]
    struct Recorder {
        enters: usize,
        leaves: usize,
        downs: Vec<(Point, u8)>,
        ups: Vec<(Point, u8)>,
        motions: Vec<Point>,
    }

    struct Probe {
        core: ItemCore,
        log: Rc<RefCell<Recorder>>,
    }

    impl Probe {
        fn new(rect: Rect) -> (Rc<RefCell<Probe>>, Rc<RefCell<Recorder>>) {
            let log = Rc::new(RefCell::new(Recorder::default()));
            let mut core = ItemCore::default();
            core.set_coords(rect.x, rect.y);
            core.set_size(rect.width, rect.height);
            let probe = Rc::new(RefCell::new(Probe {
                core,
                log: log.clone(),
            }));
            (probe, log)
        }
    }

    impl Widget for Probe {
        fn core(&self) -> &ItemCore {
            &self.core
        }

        fn core_mut(&mut self) -> &mut ItemCore {
            &mut self.core
        }

        fn name(&self) -> &'static str {
            "Probe"
        }

        fn mouse_owner_changed(&mut self, owner: bool) {
            if owner {
                self.log.borrow_mut().enters += 1;
            } else {
                self.log.borrow_mut().leaves += 1;
            }
        }

        fn motion(&mut self, p: Point, _time: u32) {
            self.log.borrow_mut().motions.push(p);
        }

        fn button_down(&mut self, p: Point, button: u8, _time: u32) {
            self.log.borrow_mut().downs.push((p, button));
        }

        fn button_up(&mut self, p: Point, button: u8, _time: u32) {
            self.log.borrow_mut().ups.push((p, button));
        }
    }

    struct Container {
        core: ItemCore,
        children: Vec<ItemRef>,
    }

    impl Container {
        fn new(rect: Rect, children: Vec<ItemRef>) -> Rc<RefCell<Container>> {
            let mut core = ItemCore::default();
            core.set_coords(rect.x, rect.y);
            core.set_size(rect.width, rect.height);
            Rc::new(RefCell::new(Container { core, children }))
        }
    }

    impl Widget for Container {
        fn core(&self) -> &ItemCore {
            &self.core
        }

        fn core_mut(&mut self) -> &mut ItemCore {
            &mut self.core
        }

        fn name(&self) -> &'static str {
            "Container"
        }

        fn is_container(&self) -> bool {
            true
        }

        fn children(&self) -> &[ItemRef] {
            &self.children
        }
    }

    #[test]
    fn push_keeps_items_unique() {
        let (probe, _) = Probe::new(Rect::new(0, 0, 10, 10));
        let item: ItemRef = probe;
        let mut mixer = InputMixer::new();
        mixer.push_to_back(item.clone());
        mixer.push_to_front(item.clone());
        mixer.push_to_back(item.clone());
        assert_eq!(mixer.items().len(), 1);
        mixer.remove(&item);
        assert!(mixer.items().is_empty());
    }

    #[test]
    fn front_item_wins_hit_test() {
        let (back, back_log) = Probe::new(Rect::new(0, 0, 20, 20));
        let (front, front_log) = Probe::new(Rect::new(0, 0, 20, 20));
        let mut mixer = InputMixer::new();
        mixer.push_to_back(back);
        mixer.push_to_front(front);

        mixer.enter_event(Point::new(5, 5));
        assert_eq!(front_log.borrow().enters, 1);
        assert_eq!(back_log.borrow().enters, 0);
    }

    #[test]
    fn owner_transition_fires_enter_and_leave() {
        let (a, a_log) = Probe::new(Rect::new(0, 0, 10, 10));
        let (b, b_log) = Probe::new(Rect::new(10, 0, 10, 10));
        let mut mixer = InputMixer::new();
        mixer.push_to_back(a);
        mixer.push_to_back(b);

        mixer.motion_event(Point::new(5, 5), 1);
        mixer.motion_event(Point::new(15, 5), 2);
        assert_eq!(a_log.borrow().enters, 1);
        assert_eq!(a_log.borrow().leaves, 1);
        assert_eq!(b_log.borrow().enters, 1);
        mixer.leave_event(Point::new(30, 30));
        assert_eq!(b_log.borrow().leaves, 1);
    }

    #[test]
    fn grab_freezes_owner_until_matching_release() {
        let (a, a_log) = Probe::new(Rect::new(0, 0, 10, 10));
        let (b, b_log) = Probe::new(Rect::new(10, 0, 10, 10));
        let mut mixer = InputMixer::new();
        mixer.push_to_back(a);
        mixer.push_to_back(b);

        mixer.button_down_event(Point::new(5, 5), 1, 10);
        assert!(mixer.grabbed());
        // Motions outside the owner still go to the owner.
        mixer.motion_event(Point::new(15, 5), 20);
        mixer.motion_event(Point::new(50, 50), 30);
        assert_eq!(a_log.borrow().motions.len(), 2);
        assert!(b_log.borrow().motions.is_empty());
        assert_eq!(b_log.borrow().enters, 0);

        // Release of a different button keeps the grab.
        mixer.button_up_event(Point::new(50, 50), 3, 40);
        assert!(mixer.grabbed());

        // Release outside any widget is still delivered to the owner, then
        // the deferred hit test runs.
        mixer.button_up_event(Point::new(15, 5), 1, 50);
        assert!(!mixer.grabbed());
        assert_eq!(a_log.borrow().ups.len(), 2);
        assert_eq!(b_log.borrow().enters, 1);
        assert_eq!(a_log.borrow().leaves, 1);
    }

    #[test]
    fn owner_at_motion_matches_owner_at_button_down() {
        let (a, a_log) = Probe::new(Rect::new(0, 0, 10, 10));
        let (b, _) = Probe::new(Rect::new(10, 0, 10, 10));
        let mut mixer = InputMixer::new();
        mixer.push_to_back(a);
        mixer.push_to_back(b);

        mixer.enter_event(Point::new(5, 5));
        mixer.button_down_event(Point::new(5, 5), 1, 0);
        for (i, p) in [(1, Point::new(12, 3)), (2, Point::new(19, 9))] {
            mixer.motion_event(p, i);
            assert_eq!(a_log.borrow().motions.len(), i as usize);
        }
        mixer.button_up_event(Point::new(19, 9), 1, 3);
    }

    #[test]
    fn insensitive_leaf_inside_container_falls_through() {
        let (child, child_log) = Probe::new(Rect::new(0, 0, 10, 10));
        child.borrow_mut().set_sensitive(false);
        let container = Container::new(Rect::new(0, 0, 40, 10), vec![child]);
        let (below, below_log) = Probe::new(Rect::new(0, 0, 40, 10));
        let mut mixer = InputMixer::new();
        mixer.push_to_back(container);
        mixer.push_to_back(below);

        // Over the insensitive child the container yields nothing, and the
        // search continues past it instead of landing on the container.
        mixer.enter_event(Point::new(5, 5));
        assert_eq!(child_log.borrow().enters, 0);
        assert_eq!(below_log.borrow().enters, 1);

        // Same for clicks on a plain gap inside the container.
        mixer.motion_event(Point::new(20, 5), 1);
        assert_eq!(below_log.borrow().enters, 1);
        assert_eq!(below_log.borrow().leaves, 0);
    }

    #[test]
    fn top_level_insensitive_leaf_blocks_the_scan() {
        let (shield, _) = Probe::new(Rect::new(0, 0, 40, 10));
        shield.borrow_mut().set_sensitive(false);
        let (below, below_log) = Probe::new(Rect::new(0, 0, 40, 10));
        let mut mixer = InputMixer::new();
        mixer.push_to_back(shield);
        mixer.push_to_back(below);

        mixer.enter_event(Point::new(5, 5));
        assert!(mixer.mouse_owner().is_none());
        assert_eq!(below_log.borrow().enters, 0);
    }

    #[test]
    fn removing_grabbed_item_drops_grab_silently() {
        let (a, a_log) = Probe::new(Rect::new(0, 0, 10, 10));
        let item: ItemRef = a;
        let mut mixer = InputMixer::new();
        mixer.push_to_back(item.clone());
        mixer.button_down_event(Point::new(5, 5), 1, 0);
        assert!(mixer.grabbed());

        mixer.remove(&item);
        assert!(!mixer.grabbed());
        assert!(mixer.mouse_owner().is_none());
        // No synthetic release was delivered.
        assert!(a_log.borrow().ups.is_empty());
    }

    #[test]
    fn compositor_grab_cancels_without_synthetic_release() {
        let (a, a_log) = Probe::new(Rect::new(0, 0, 10, 10));
        let mut mixer = InputMixer::new();
        mixer.push_to_back(a);
        mixer.button_down_event(Point::new(5, 5), 1, 0);

        mixer.ungrab_pointer();
        assert!(!mixer.grabbed());
        assert_eq!(a_log.borrow().leaves, 1);
        assert!(a_log.borrow().ups.is_empty());
    }
}
