// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use serial_test::serial;

#[test]
#[serial]
fn styles_returns_plain_when_no_color() {
    std::env::set_var("NO_COLOR", "1");
    std::env::remove_var("COLOR");

    let debug = format!("{:?}", styles());
    assert_eq!(debug, format!("{:?}", Styles::plain()));
    assert_eq!(header("bbl-env"), "bbl-env");
}

#[test]
#[serial]
fn header_produces_ansi_when_color_forced() {
    std::env::set_var("COLOR", "1");
    std::env::remove_var("NO_COLOR");

    let result = header("bbl-env");
    assert!(result.starts_with("\x1b[38;5;74m"), "expected header color: {result:?}");
    assert!(result.ends_with("\x1b[0m"), "expected reset: {result:?}");
    assert!(warn("careful").contains("\x1b[38;5;214m"));

    std::env::remove_var("COLOR");
}
