// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Process exit codes for failed commands.
//!
//! Commands return `anyhow::Error`; `main()` looks for the [`BblError`]
//! in its chain to pick the code, so context added on the way up does not
//! change it.

use bbl_core::BblError;

/// Exit code for an invocation clap rejected.
pub const USAGE: u8 = 1;

/// Errors that carry no [`BblError`] are reported as user errors.
pub fn exit_code(err: &anyhow::Error) -> u8 {
    err.chain()
        .find_map(|cause| cause.downcast_ref::<BblError>())
        .map_or(1, |e| u8::try_from(e.exit_code()).unwrap_or(1))
}

/// One-line hint printed under the error, when there is one.
pub fn hint(err: &anyhow::Error) -> Option<&'static str> {
    match err.chain().find_map(|cause| cause.downcast_ref::<BblError>())? {
        BblError::ExternalTool { .. } => {
            Some("progress so far is saved; re-run the same command to resume")
        }
        BblError::Cancelled => Some("interrupted; re-run the same command to resume"),
        _ => None,
    }
}

#[cfg(test)]
#[path = "exit_error_tests.rs"]
mod tests;
