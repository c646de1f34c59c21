// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! SSH key pair for IaaSes whose templates upload a public key.

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use bbl_core::{BblError, KeyPair, Secret, State};
use ed25519_dalek::pkcs8::spki::der::pem::LineEnding;
use ed25519_dalek::pkcs8::EncodePrivateKey;
use ed25519_dalek::SigningKey;
use rand::rngs::OsRng;
use rand::RngCore;

use crate::iaas;

const KEY_TYPE: &str = "ssh-ed25519";

/// Fresh ed25519 key: PKCS#8 PEM private half, OpenSSH public half.
pub fn generate() -> Result<KeyPair, BblError> {
    let mut seed = [0u8; 32];
    OsRng.fill_bytes(&mut seed);
    let key = SigningKey::from_bytes(&seed);

    let pem = key.to_pkcs8_pem(LineEnding::LF).map_err(|e| {
        BblError::InvariantViolation(format!("failed to encode generated key pair: {e}"))
    })?;
    Ok(KeyPair {
        public_key: openssh_public_key(key.verifying_key().as_bytes()),
        private_key: Secret::new(pem.as_str()),
    })
}

/// `ssh-ed25519 <base64 wire blob>` as in `authorized_keys`.
pub fn openssh_public_key(key: &[u8; 32]) -> String {
    let mut blob = Vec::with_capacity(4 + KEY_TYPE.len() + 4 + key.len());
    for field in [KEY_TYPE.as_bytes(), key.as_slice()] {
        blob.extend_from_slice(&(field.len() as u32).to_be_bytes());
        blob.extend_from_slice(field);
    }
    format!("{KEY_TYPE} {}", STANDARD.encode(blob))
}

/// Generate a key pair if the IaaS needs one and none is stored. Returns
/// whether the state changed.
pub fn sync(state: &mut State) -> Result<bool, BblError> {
    let Some(iaas) = state.iaas else {
        return Ok(false);
    };
    if !iaas::row(iaas).needs_keypair || !state.key_pair.is_empty() {
        return Ok(false);
    }
    state.key_pair = generate()?;
    tracing::info!(%iaas, "generated key pair");
    Ok(true)
}

#[cfg(test)]
#[path = "keypair_tests.rs"]
mod tests;
