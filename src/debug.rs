// Copyright 2023 the Sill Authors
// SPDX-License-Identifier: Apache-2.0

//! Introspection for tests and debugging.
//!
//! Every decorated window, widget, and the manager can describe themselves
//! as a [`DebugState`] tree of named scalar values.

use std::collections::HashMap;

/// A description of a decoration object and its children, clonable and
/// comparable, meant for testing and debugging.
#[derive(Default, Clone, PartialEq, Eq)]
pub struct DebugState {
    /// The object's type as a human-readable string.
    pub display_name: String,
    /// A "central" value, for objects that have one (a title's text).
    pub main_value: String,
    /// Untyped values that reveal useful information about the object.
    pub other_values: HashMap<String, String>,
    /// Debug info of children.
    pub children: Vec<DebugState>,
}

impl DebugState {
    pub fn new(display_name: impl Into<String>) -> DebugState {
        DebugState {
            display_name: display_name.into(),
            ..DebugState::default()
        }
    }

    pub fn with(mut self, key: impl Into<String>, value: impl ToString) -> DebugState {
        self.add(key, value);
        self
    }

    pub fn add(&mut self, key: impl Into<String>, value: impl ToString) {
        self.other_values.insert(key.into(), value.to_string());
    }

    pub fn value(&self, key: &str) -> Option<&str> {
        self.other_values.get(key).map(|s| s.as_str())
    }
}

impl std::fmt::Debug for DebugState {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        if self.other_values.is_empty() && self.children.is_empty() && self.main_value.is_empty() {
            f.write_str(&self.display_name)
        } else {
            let mut f_struct = f.debug_struct(&self.display_name);
            if !self.main_value.is_empty() {
                f_struct.field("_main_value_", &self.main_value);
            }
            for (key, value) in self.other_values.iter() {
                f_struct.field(key, &value);
            }
            if !self.children.is_empty() {
                f_struct.field("children", &self.children);
            }
            f_struct.finish()
        }
    }
}
