//! End-to-end drift tracking scenarios against the file-backed registry

use std::collections::BTreeSet;
use std::fs;
use std::path::Path;

use serde_json::Value;
use tempfile::tempdir;

use drifter::{Field, SchemaRegistry};

fn int64() -> Field {
    Field::Integer { bits: 64, signed: true, nullable: true }
}

fn int32() -> Field {
    Field::Integer { bits: 32, signed: true, nullable: true }
}

fn utf8() -> Field {
    Field::String { nullable: true }
}

fn columns(pairs: &[(&str, Field)]) -> Vec<(String, Field)> {
    pairs.iter().map(|(name, field)| (name.to_string(), field.clone())).collect()
}

fn artifact(root: &Path, source: &str) -> std::path::PathBuf {
    root.join(format!("{source}.json"))
}

#[test]
fn test_schema_evolution_scenario() {
    let dir = tempdir().unwrap();
    let registry = SchemaRegistry::open(dir.path());

    // Initial registration: everything counts as added
    let changes = registry
        .register("users", || Ok(columns(&[("id", int64()), ("name", utf8())])))
        .unwrap();
    assert_eq!(changes.added, BTreeSet::from(["id".to_owned(), "name".to_owned()]));
    assert!(changes.removed.is_empty());
    assert!(changes.changed.is_empty());
    assert_eq!(registry.history("users").unwrap().len(), 1);

    // Identical registration: no changes, no new version
    let changes = registry
        .register("users", || Ok(columns(&[("id", int64()), ("name", utf8())])))
        .unwrap();
    assert!(!changes.has_changes());
    assert_eq!(registry.history("users").unwrap().len(), 1);

    // A column appears
    let changes = registry
        .register("users", || {
            Ok(columns(&[("id", int64()), ("name", utf8()), ("age", int32())]))
        })
        .unwrap();
    assert_eq!(changes.added, BTreeSet::from(["age".to_owned()]));
    assert!(changes.removed.is_empty());
    assert!(changes.changed.is_empty());
    assert_eq!(registry.history("users").unwrap().len(), 2);

    // The column disappears again
    let changes = registry
        .register("users", || Ok(columns(&[("id", int64()), ("name", utf8())])))
        .unwrap();
    assert!(changes.added.is_empty());
    assert_eq!(changes.removed, BTreeSet::from(["age".to_owned()]));
    assert!(changes.changed.is_empty());
    assert_eq!(registry.history("users").unwrap().len(), 3);

    // A column's type flips
    let changes = registry
        .register("users", || Ok(columns(&[("id", utf8()), ("name", utf8())])))
        .unwrap();
    assert!(changes.added.is_empty());
    assert!(changes.removed.is_empty());
    assert_eq!(changes.changed.keys().collect::<Vec<_>>(), ["id"]);
    assert_eq!(registry.history("users").unwrap().len(), 4);
}

#[test]
fn test_noop_registration_leaves_artifact_untouched() {
    let dir = tempdir().unwrap();
    let registry = SchemaRegistry::open(dir.path());

    registry
        .register("users", || Ok(columns(&[("id", int64())])))
        .unwrap();
    let before = fs::read(artifact(dir.path(), "users")).unwrap();

    let changes = registry
        .register("users", || Ok(columns(&[("id", int64())])))
        .unwrap();
    assert!(!changes.has_changes());

    let after = fs::read(artifact(dir.path(), "users")).unwrap();
    assert_eq!(before, after);
}

#[test]
fn test_column_order_does_not_count_as_drift() {
    let dir = tempdir().unwrap();
    let registry = SchemaRegistry::open(dir.path());

    registry
        .register("users", || Ok(columns(&[("id", int64()), ("name", utf8())])))
        .unwrap();
    let changes = registry
        .register("users", || Ok(columns(&[("name", utf8()), ("id", int64())])))
        .unwrap();

    assert!(!changes.has_changes());
    assert_eq!(registry.history("users").unwrap().len(), 1);
}

#[test]
fn test_nested_type_change_surfaces_as_changed() {
    let dir = tempdir().unwrap();
    let registry = SchemaRegistry::open(dir.path());

    let tags = |inner: Field| Field::Sequence { inner: Box::new(inner), size: None, nullable: true };

    registry
        .register("events", || Ok(columns(&[("tags", tags(int64()))])))
        .unwrap();
    let changes = registry
        .register("events", || Ok(columns(&[("tags", tags(utf8()))])))
        .unwrap();

    assert!(changes.added.is_empty());
    assert!(changes.removed.is_empty());
    assert_eq!(changes.changed.keys().collect::<Vec<_>>(), ["tags"]);
    assert_eq!(registry.history("events").unwrap().len(), 2);
}

#[test]
fn test_empty_first_registration_writes_nothing() {
    let dir = tempdir().unwrap();
    let registry = SchemaRegistry::open(dir.path());

    let changes = registry.register("empty", || Ok(vec![])).unwrap();

    assert!(!changes.has_changes());
    assert!(!artifact(dir.path(), "empty").exists());
}

#[test]
fn test_corrupted_artifact_recovers_as_first_registration() {
    let dir = tempdir().unwrap();
    fs::write(artifact(dir.path(), "users"), "{ this is not json").unwrap();

    let registry = SchemaRegistry::open(dir.path());
    let changes = registry
        .register("users", || Ok(columns(&[("id", int64()), ("name", utf8())])))
        .unwrap();

    // Behaves exactly like an absent artifact
    assert_eq!(changes.added, BTreeSet::from(["id".to_owned(), "name".to_owned()]));
    assert!(changes.removed.is_empty());
    assert!(changes.changed.is_empty());

    // And the garbage has been replaced by a fresh one-version history
    let history = registry.history("users").unwrap();
    assert_eq!(history.len(), 1);
    assert!(history.verify());
}

#[test]
fn test_artifact_wire_format() {
    let dir = tempdir().unwrap();
    let registry = SchemaRegistry::open(dir.path());
    registry
        .register("users", || Ok(columns(&[("id", int64()), ("name", utf8())])))
        .unwrap();

    let raw = fs::read_to_string(artifact(dir.path(), "users")).unwrap();
    let document: Value = serde_json::from_str(&raw).unwrap();

    let versions = document.as_array().expect("history is a JSON array");
    assert_eq!(versions.len(), 1);

    let entry = &versions[0];
    let fields = &entry["schema"]["fields"];
    assert_eq!(
        fields["id"],
        serde_json::json!({"type": "integer", "bits": 64, "signed": true, "nullable": true})
    );
    assert_eq!(fields["name"], serde_json::json!({"type": "string", "nullable": true}));

    // Timestamp is an RFC 3339 UTC instant
    let timestamp = entry["timestamp"].as_str().unwrap();
    assert!(chrono::DateTime::parse_from_rfc3339(timestamp).is_ok());

    assert!(entry["checksum"].is_string());
}

#[test]
fn test_history_survives_registry_reopen() {
    let dir = tempdir().unwrap();
    {
        let registry = SchemaRegistry::open(dir.path());
        registry
            .register("users", || Ok(columns(&[("id", int64())])))
            .unwrap();
    }

    let reopened = SchemaRegistry::open(dir.path());
    let changes = reopened
        .register("users", || Ok(columns(&[("id", int64()), ("email", utf8())])))
        .unwrap();

    assert_eq!(changes.added, BTreeSet::from(["email".to_owned()]));
    assert_eq!(reopened.history("users").unwrap().len(), 2);
}
