// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Forward migrations of the raw state document.
//!
//! Migrations run on `serde_json::Value` before typed decoding, so a field
//! that was renamed or retyped never has to exist in [`bbl_core::State`].
//! A rename keeps the old key for one version before it is dropped.

use serde_json::{Map, Value};
use thiserror::Error;

/// Key holding the schema version. Documents without it are version 1.
pub const VERSION_KEY: &str = "schemaVersion";

#[derive(Debug, Error)]
pub enum MigrationError {
    #[error("state schema version {0} is newer than this bbl supports ({1}); upgrade bbl")]
    TooNew(u32, u32),
    #[error("no migration path from schema version {0} to {1}")]
    NoPath(u32, u32),
    #[error("state document is not a JSON object")]
    NotAnObject,
}

/// One schema step.
pub trait Migration: Send + Sync {
    fn source_version(&self) -> u32;
    fn target_version(&self) -> u32;
    fn migrate(&self, doc: &mut Value) -> Result<(), MigrationError>;
}

pub struct MigrationRegistry {
    pub(crate) migrations: Vec<Box<dyn Migration>>,
}

impl Default for MigrationRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl MigrationRegistry {
    /// An empty registry.
    pub fn new() -> Self {
        Self { migrations: Vec::new() }
    }

    /// Every migration this build knows about.
    pub fn builtin() -> Self {
        Self { migrations: vec![Box::new(LegacyBoshToDirector), Box::new(DropLegacyKeys)] }
    }

    pub fn register(&mut self, migration: Box<dyn Migration>) {
        self.migrations.push(migration);
    }

    /// Migrate `doc` up to `target`, stamping the version key after each step.
    pub fn migrate_to(&self, mut doc: Value, target: u32) -> Result<Value, MigrationError> {
        let mut version = version_of(&doc);
        if version > target {
            return Err(MigrationError::TooNew(version, target));
        }

        while version < target {
            let step = self
                .migrations
                .iter()
                .find(|m| m.source_version() == version)
                .ok_or(MigrationError::NoPath(version, target))?;
            step.migrate(&mut doc)?;
            let next = step.target_version();
            tracing::debug!(from = version, to = next, "migrated state document");
            object_mut(&mut doc)?.insert(VERSION_KEY.into(), next.into());
            version = next;
        }

        Ok(doc)
    }
}

/// Version stored in `doc`; absent or zero means 1.
pub(crate) fn version_of(doc: &Value) -> u32 {
    doc.get(VERSION_KEY)
        .and_then(Value::as_u64)
        .filter(|v| *v > 0)
        .map(|v| u32::try_from(v).unwrap_or(u32::MAX))
        .unwrap_or(1)
}

fn object_mut(doc: &mut Value) -> Result<&mut Map<String, Value>, MigrationError> {
    doc.as_object_mut().ok_or(MigrationError::NotAnObject)
}

/// v1 kept the director under `bosh`. Copy it to `director`, keep `bosh`.
struct LegacyBoshToDirector;

impl Migration for LegacyBoshToDirector {
    fn source_version(&self) -> u32 {
        1
    }

    fn target_version(&self) -> u32 {
        2
    }

    fn migrate(&self, doc: &mut Value) -> Result<(), MigrationError> {
        let obj = object_mut(doc)?;
        let has_director = obj.get("director").is_some_and(|d| !d.is_null());
        if !has_director {
            if let Some(bosh) = obj.get("bosh").cloned() {
                obj.insert("director".into(), bosh);
            }
        }
        Ok(())
    }
}

/// Drop `bosh` and fill defaults older documents left empty.
struct DropLegacyKeys;

impl Migration for DropLegacyKeys {
    fn source_version(&self) -> u32 {
        2
    }

    fn target_version(&self) -> u32 {
        3
    }

    fn migrate(&self, doc: &mut Value) -> Result<(), MigrationError> {
        let obj = object_mut(doc)?;
        obj.remove("bosh");

        if let Some(lb) = obj.get_mut("lb").and_then(Value::as_object_mut) {
            let empty = lb.get("type").and_then(Value::as_str).is_none_or(str::is_empty);
            if empty {
                lb.insert("type".into(), "none".into());
            }
        }

        if let Some(jumpbox) = obj.get_mut("jumpbox").and_then(Value::as_object_mut) {
            let has_url = jumpbox.get("url").and_then(Value::as_str).is_some_and(|u| !u.is_empty());
            if has_url && !jumpbox.contains_key("enabled") {
                jumpbox.insert("enabled".into(), true.into());
            }
        }

        if obj.get("latestTFOutput").is_none_or(Value::is_null) {
            obj.insert("latestTFOutput".into(), Value::Object(Map::new()));
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "migration_tests.rs"]
mod tests;
