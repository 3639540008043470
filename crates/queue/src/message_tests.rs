// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn handle_wraps_opaque_string() {
    let handle = MessageHandle::new("row-42");
    assert_eq!(handle.as_str(), "row-42");
}
