// Copyright 2023 the Sill Authors
// SPDX-License-Identifier: Apache-2.0

//! Integrated application-menu layout: overflow into the dropdown and the
//! title ↔ menu crossfade wiring.

use std::cell::RefCell;
use std::rc::Rc;

use crate::compositor::HostWindowRef;
use crate::geometry::Point;
use crate::style::Style;
use crate::tests::harness::{Harness, TestIndicators, TestWindow};
use crate::timers::TimerQueue;
use crate::widget::{MenuLayout, Padding, Widget};

fn menu_layout(
    harness: &Harness,
    indicators: &Rc<TestIndicators>,
    win: &Rc<TestWindow>,
) -> MenuLayout {
    let host: HostWindowRef = win.clone();
    let timers = Rc::new(RefCell::new(TimerQueue::new()));
    let mut menus = MenuLayout::new(
        harness.screen.clone(),
        host,
        indicators.clone(),
        timers,
    );
    menus.set_padding(Padding {
        inner: 5,
        ..Padding::default()
    });
    menus.setup();
    menus
}

fn entry_widths(menus: &MenuLayout) -> Vec<i32> {
    menus
        .children_geometries()
        .iter()
        .map(|(_, geo)| geo.width)
        .collect()
}

#[test]
fn entries_overflow_into_the_dropdown_and_back() {
    let indicators = TestIndicators::with_entries(&["Menu", "Menu", "Menu", "Menu"]);
    let harness = Harness::with_indicators(indicators.clone());
    let win = TestWindow::new(2);

    let mut menus = menu_layout(&harness, &indicators, &win);
    let entry_width = Style::get().menu_item_natural_size("Menu").width + 10;
    let dropdown_width = 10 + 10; // icon plus horizontal padding

    // Room for exactly two entries (plus the dropdown and the overflow
    // accounting's trailing inner padding).
    let two_fit = dropdown_width + 2 * (entry_width + 5) - 5 + 1;
    menus.core_mut().set_max_width(two_fit);
    menus.core_mut().set_max_height(28);
    menus.relayout();

    let visible = menus.children_geometries();
    assert_eq!(visible.len(), 2, "two entries stay in the strip");
    assert_eq!(entry_widths(&menus), vec![entry_width, entry_width]);

    // Growing the strip brings everything back and drops the dropdown.
    let all_fit = dropdown_width + 4 * (entry_width + 5) + 60;
    menus.core_mut().set_max_width(all_fit);
    menus.relayout();

    let visible = menus.children_geometries();
    assert_eq!(visible.len(), 4, "all entries pop back out");
    // Original order is preserved.
    let ids: Vec<&str> = visible.iter().map(|(id, _)| id.as_str()).collect();
    assert_eq!(ids, ["entry-0", "entry-1", "entry-2", "entry-3"]);
}

#[test]
fn lone_retained_entry_pops_back_when_room_returns() {
    let indicators = TestIndicators::with_entries(&["Menu", "Menu", "Menu"]);
    let harness = Harness::with_indicators(indicators.clone());
    let win = TestWindow::new(20);

    let mut menus = menu_layout(&harness, &indicators, &win);
    let entry_width = Style::get().menu_item_natural_size("Menu").width + 10;

    // Exactly one entry overflows.
    let tight = 20 + 2 * (entry_width + 5) - 5 + 1;
    menus.core_mut().set_max_width(tight);
    menus.core_mut().set_max_height(28);
    menus.relayout();
    assert_eq!(menus.children_geometries().len(), 2);

    // Growing by one entry width plus the inner padding frees the lone
    // retained entry; the dropdown itself goes away with it.
    menus.core_mut().set_max_width(tight + entry_width + 5);
    menus.relayout();
    assert_eq!(menus.children_geometries().len(), 3);
    assert!(indicators.dropdowns.borrow().is_empty());
}

#[test]
fn dropdown_opens_with_the_hidden_entries() {
    let indicators = TestIndicators::with_entries(&["Menu", "Menu", "Menu"]);
    let harness = Harness::with_indicators(indicators.clone());
    let win = TestWindow::new(3);

    let mut menus = menu_layout(&harness, &indicators, &win);
    let entry_width = Style::get().menu_item_natural_size("Menu").width + 10;
    menus.core_mut().set_max_width(20 + entry_width + 5 + 1);
    menus.core_mut().set_max_height(28);
    menus.relayout();
    assert_eq!(menus.children_geometries().len(), 1);

    // The two hidden entries open through the dropdown, in order.
    assert!(menus.activate_menu("entry-1"));
    assert_eq!(indicators.dropdowns.borrow().len(), 1);
    assert_eq!(
        indicators.dropdowns.borrow()[0],
        vec!["entry-1".to_string(), "entry-2".to_string()]
    );
}

#[test]
fn visible_entry_opens_directly() {
    let indicators = TestIndicators::with_entries(&["File", "Edit"]);
    let harness = Harness::with_indicators(indicators.clone());
    let win = TestWindow::new(4);

    let mut menus = menu_layout(&harness, &indicators, &win);
    menus.core_mut().set_max_width(1000);
    menus.core_mut().set_max_height(28);
    menus.relayout();

    assert!(menus.activate_menu("entry-1"));
    assert_eq!(*indicators.opened.borrow(), vec![("entry-1".to_string(), 0)]);
    assert!(indicators.dropdowns.borrow().is_empty());
}

#[test]
fn menu_entry_click_opens_after_the_double_click_window() {
    let indicators = TestIndicators::with_entries(&["File"]);
    let harness = Harness::with_indicators(indicators.clone());
    let win = TestWindow::new(5);
    let window = harness.add_window(&win);
    window.update_decoration_position();

    // The sliding layout carries the menu as its input item.
    let debug = window.debug_state();
    assert!(format!("{:?}", debug).contains("MenuEntry"));

    let mut menus = menu_layout(&harness, &indicators, &win);
    menus.core_mut().set_max_width(1000);
    menus.core_mut().set_max_height(28);
    menus.relayout();

    let (_, geo) = menus.children_geometries()[0].clone();
    let p = Point::new(geo.x + 2, geo.y + 2);

    let entries = menus.children();
    let entry = entries[0].clone();
    entry.borrow_mut().button_down(p, 1, 0);
    entry.borrow_mut().button_up(p, 1, 40);

    // The open is deferred past the double-click window (the window is
    // maximizable, so a second click may still mean toggle-maximize).
    assert!(indicators.opened.borrow().is_empty());
}

#[test]
fn menus_crossfade_with_the_title_on_hover() {
    let indicators = TestIndicators::with_entries(&["File", "Edit"]);
    let harness = Harness::with_indicators(indicators.clone());
    let win = TestWindow::new(6);
    let window = harness.add_window(&win);
    window.update_decoration_position();

    // Hovering the grab edge hands the strip to the menu layout: the
    // crossfade starts and the decorations are damaged.
    let damage_before = win.damage_count.get();
    let mixer = window.input_mixer().expect("mixer");
    mixer.borrow_mut().enter_event(Point::new(300, 80));
    window.after_input_event();
    assert!(win.damage_count.get() > damage_before);

    // Leaving hands it back.
    mixer.borrow_mut().leave_event(Point::new(0, 0));
    window.after_input_event();

    let debug = format!("{:?}", window.debug_state());
    assert!(debug.contains("MenuEntry"));
}

#[test]
fn always_show_menus_overrides_the_title() {
    let indicators = TestIndicators::with_entries(&["File"]);
    indicators.always_show.set(true);
    let harness = Harness::with_indicators(indicators.clone());
    let win = TestWindow::new(7);
    let window = harness.add_window(&win);
    window.update_decoration_position();

    // Geometries are published for the indicator service.
    assert!(indicators
        .synced
        .borrow()
        .iter()
        .any(|(panel, _)| panel == "WindowLIM7"));
}
