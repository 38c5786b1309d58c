// Copyright 2023 the Sill Authors
// SPDX-License-Identifier: Apache-2.0

//! Small shared utilities.

/// Logs and swallows the error of a fire-and-forget X call. Failures here
/// almost always mean the connection to the server is gone, so there is no
/// point in propagating them.
macro_rules! log_x11 {
    ($val:expr) => {
        if let Err(e) = $val {
            tracing::error!("X11 error: {}", e);
        }
    };
}
