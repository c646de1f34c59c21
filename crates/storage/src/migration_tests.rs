// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use serde_json::json;

#[test]
fn test_migrate_same_version_is_noop() {
    let v1 = json!({"schemaVersion": 1, "envID": "env"});
    let registry = MigrationRegistry::new();
    let result = registry.migrate_to(v1.clone(), 1).unwrap();
    assert_eq!(result, v1);
}

#[test]
fn test_too_new_error() {
    let v99 = json!({"schemaVersion": 99});
    let registry = MigrationRegistry::builtin();
    assert!(matches!(registry.migrate_to(v99, 3), Err(MigrationError::TooNew(99, 3))));
}

#[test]
fn test_no_path_error() {
    let v1 = json!({"schemaVersion": 1});
    let registry = MigrationRegistry::new();
    assert!(matches!(registry.migrate_to(v1, 2), Err(MigrationError::NoPath(1, 2))));
}

#[yare::parameterized(
    missing = { json!({}), 1 },
    zero    = { json!({"schemaVersion": 0}), 1 },
    two     = { json!({"schemaVersion": 2}), 2 },
    string  = { json!({"schemaVersion": "3"}), 1 },
)]
fn version_detection(doc: Value, expected: u32) {
    assert_eq!(version_of(&doc), expected);
}

struct AddMarker;

impl Migration for AddMarker {
    fn source_version(&self) -> u32 {
        3
    }
    fn target_version(&self) -> u32 {
        4
    }
    fn migrate(&self, doc: &mut Value) -> Result<(), MigrationError> {
        if let Some(obj) = doc.as_object_mut() {
            obj.insert("migrated".into(), true.into());
        }
        Ok(())
    }
}

#[test]
fn test_migration_chain() {
    let mut registry = MigrationRegistry::builtin();
    registry.register(Box::new(AddMarker));

    let v1 = json!({"envID": "env", "tfState": "{}"});
    let result = registry.migrate_to(v1, 4).unwrap();

    assert_eq!(result["schemaVersion"], 4);
    assert_eq!(result["envID"], "env");
    assert_eq!(result["tfState"], "{}");
    assert_eq!(result["migrated"], true);
}

#[test]
fn v1_to_v2_copies_bosh_and_keeps_it() {
    let v1 = json!({"bosh": {"directorAddress": "https://10.0.0.6:25555", "directorPassword": "pw"}});
    let registry = MigrationRegistry::builtin();
    let v2 = registry.migrate_to(v1, 2).unwrap();

    assert_eq!(v2["schemaVersion"], 2);
    assert_eq!(v2["director"], v2["bosh"]);
    assert_eq!(v2["bosh"]["directorPassword"], "pw");
}

#[test]
fn v1_to_v2_does_not_overwrite_director() {
    let v1 = json!({"bosh": {"a": 1}, "director": {"address": "x"}});
    let v2 = MigrationRegistry::builtin().migrate_to(v1, 2).unwrap();
    assert_eq!(v2["director"]["address"], "x");
}

#[test]
fn v2_to_v3_drops_bosh_and_fills_defaults() {
    let v2 = json!({
        "schemaVersion": 2,
        "bosh": {"a": 1},
        "director": {"address": "x"},
        "lb": {"type": ""},
        "jumpbox": {"url": "1.2.3.4:22"},
    });
    let v3 = MigrationRegistry::builtin().migrate_to(v2, 3).unwrap();

    assert!(v3.get("bosh").is_none());
    assert_eq!(v3["director"]["address"], "x");
    assert_eq!(v3["lb"]["type"], "none");
    assert_eq!(v3["jumpbox"]["enabled"], true);
    assert_eq!(v3["latestTFOutput"], json!({}));
}

#[test]
fn v2_to_v3_keeps_explicit_jumpbox_flag() {
    let v2 = json!({"schemaVersion": 2, "jumpbox": {"url": "1.2.3.4:22", "enabled": false}});
    let v3 = MigrationRegistry::builtin().migrate_to(v2, 3).unwrap();
    assert_eq!(v3["jumpbox"]["enabled"], false);
}

#[test]
fn non_object_document_is_rejected() {
    let result = MigrationRegistry::builtin().migrate_to(json!([1, 2]), 3);
    assert!(matches!(result, Err(MigrationError::NotAnObject)));
}
