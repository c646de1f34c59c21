// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! bbl-storage: the on-disk state directory
//!
//! One [`StateStore`] per invocation. Opening it takes an advisory lock on
//! `bbl-lock`; the lock lives as long as the store.

mod migration;
mod store;

pub use migration::{Migration, MigrationError, MigrationRegistry, VERSION_KEY};
pub use store::{migrate, StateStore, StoreError, LOCK_FILE, STATE_DIRS, STATE_FILE};
