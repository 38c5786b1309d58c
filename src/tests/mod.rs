// Copyright 2023 the Sill Authors
// SPDX-License-Identifier: Apache-2.0

//! Cross-module decoration tests, driven through a mock compositor host.

mod harness;

mod grab_tests;
mod manager_tests;
mod menu_tests;
