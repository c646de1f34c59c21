// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![allow(clippy::panic)]
#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]

//! Black-box specs for the `bbl` binary.

#[path = "specs/prelude.rs"]
mod prelude;

#[path = "specs/cli"]
mod cli {
    mod help;
    mod queries;
}

#[path = "specs/lifecycle"]
mod lifecycle {
    mod destroy;
    mod network_only;
}
