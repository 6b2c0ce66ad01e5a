// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn paint_is_a_no_op_when_colorization_is_disabled() {
    std::env::set_var("NO_COLOR", "1");
    assert_eq!(header("starting"), "starting");
    assert_eq!(error("boom"), "boom");
    std::env::remove_var("NO_COLOR");
}

#[test]
fn paint_wraps_text_in_an_ansi_256_escape_when_forced() {
    std::env::set_var("COLOR", "1");
    let painted = header("starting");
    assert!(painted.starts_with("\x1b[38;5;74m"));
    assert!(painted.ends_with(RESET));
    std::env::remove_var("COLOR");
}
