// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[yare::parameterized(
    user_input = { BblError::UserInput("bad flag".into()), 1 },
    invariant  = { BblError::InvariantViolation("x".into()), 3 },
    tool       = { BblError::ExternalTool { tool: "terraform".into(), exit_code: Some(1), tail: String::new() }, 2 },
    cloud      = { BblError::CloudApi("quota".into()), 2 },
    transport  = { BblError::Transport("dial".into()), 2 },
    cancelled  = { BblError::Cancelled, 2 },
    locked     = { BblError::StateIo { kind: StateIoKind::Locked, message: "busy".into() }, 1 },
    io         = { BblError::StateIo { kind: StateIoKind::Io, message: "disk".into() }, 1 },
    corrupt    = { BblError::StateIo { kind: StateIoKind::Corrupt, message: "bad json".into() }, 3 },
)]
fn exit_codes(err: BblError, code: i32) {
    assert_eq!(err.exit_code(), code);
}

#[test]
fn external_tool_message_includes_code_and_tail() {
    let err = BblError::ExternalTool {
        tool: "bosh create-env".into(),
        exit_code: Some(1),
        tail: "Error: no such host".into(),
    };
    assert_eq!(err.to_string(), "bosh create-env failed with exit code 1:\nError: no such host");
}

#[test]
fn external_tool_message_without_code_or_tail() {
    let err = BblError::ExternalTool { tool: "terraform".into(), exit_code: None, tail: " ".into() };
    assert_eq!(err.to_string(), "terraform failed");
}

#[test]
fn invariant_message_suggests_destroy() {
    let err = BblError::InvariantViolation("director without network".into());
    assert!(err.to_string().contains("bbl destroy"));
    assert!(!err.is_cancelled());
    assert!(BblError::Cancelled.is_cancelled());
}
