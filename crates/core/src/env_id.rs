// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Environment identifiers.
//!
//! Cloud resource names are length-limited, so the provisioner receives a
//! `short_env_id`: the env id itself when it fits, otherwise a prefix plus
//! the first 8 hex digits of its SHA-1.

use std::sync::LazyLock;

use chrono::{DateTime, Utc};
use rand::seq::SliceRandom;
use rand::Rng;
use regex::Regex;
use sha1::{Digest, Sha1};

use crate::BblError;

/// Longest identifier handed to the provisioner.
pub const MAX_SHORT_ENV_ID_LEN: usize = 45;

const HASH_SUFFIX_LEN: usize = 8;

static ENV_ID_PATTERN: LazyLock<Result<Regex, regex::Error>> =
    LazyLock::new(|| Regex::new(r"^[a-z](?:[-a-z0-9]*[a-z0-9])?$"));

const WORDS: &[&str] = &[
    "arbor", "basin", "canyon", "delta", "estuary", "fjord", "glacier", "harbor", "inlet", "lagoon",
    "meadow", "mesa", "prairie", "ridge", "savanna", "summit", "tundra", "valley",
];

/// Shorten `env_id` to at most [`MAX_SHORT_ENV_ID_LEN`] characters.
pub fn short_env_id(env_id: &str) -> String {
    if env_id.chars().count() <= MAX_SHORT_ENV_ID_LEN {
        return env_id.to_string();
    }
    let digest = hex::encode(Sha1::digest(env_id.as_bytes()));
    let keep = MAX_SHORT_ENV_ID_LEN - HASH_SUFFIX_LEN - 1;
    let prefix: String = env_id.chars().take(keep).collect();
    format!("{}-{}", prefix, &digest[..HASH_SUFFIX_LEN])
}

/// Reject names the clouds would refuse.
pub fn validate_env_id(env_id: &str) -> Result<(), BblError> {
    let pattern = ENV_ID_PATTERN
        .as_ref()
        .map_err(|e| BblError::InvariantViolation(format!("env id pattern: {e}")))?;
    if pattern.is_match(env_id) {
        Ok(())
    } else {
        Err(BblError::UserInput(format!(
            "invalid name {env_id:?}: names must start with a lowercase letter and contain only \
             lowercase letters, digits and hyphens"
        )))
    }
}

/// Generate an env id such as `bbl-env-fjord-2026-10-19t14-03z`.
pub fn generate_env_id<R: Rng + ?Sized>(now: DateTime<Utc>, rng: &mut R) -> String {
    let word = WORDS.choose(rng).copied().unwrap_or("env");
    format!("bbl-env-{}-{}", word, now.format("%Y-%m-%dt%H-%Mz"))
}

#[cfg(test)]
#[path = "env_id_tests.rs"]
mod tests;
