//! Schema registration
//!
//! [`SchemaRegistry`] orchestrates one registration pass: obtain the current
//! columns from an adapter, compare against the latest recorded version, and
//! append to the persisted history only when something changed.

use std::path::PathBuf;

use tracing::debug;

use crate::diff::{diff, SchemaChange};
use crate::error::Result;
use crate::field::Field;
use crate::schema::{History, Schema, SchemaVersion};
use crate::store::{FileBackend, HistoryStore, StorageBackend};

/// Tracks schema evolution per source id over a storage backend
///
/// The registry holds no history in memory: every [`register`] call
/// re-reads the backing store, so sequential calls in one process observe
/// each other's writes. Concurrent registration of the same source id is a
/// caller responsibility.
///
/// [`register`]: SchemaRegistry::register
pub struct SchemaRegistry<B: StorageBackend = FileBackend> {
    store: HistoryStore<B>,
}

impl SchemaRegistry<FileBackend> {
    /// Open a file-backed registry rooted at `root`
    ///
    /// The directory is created on the first registration that persists.
    pub fn open(root: impl Into<PathBuf>) -> Self {
        Self::with_backend(FileBackend::new(root))
    }
}

impl<B: StorageBackend> SchemaRegistry<B> {
    /// Build a registry over any storage backend
    pub fn with_backend(backend: B) -> Self {
        Self { store: HistoryStore::new(backend) }
    }

    /// Register the current columns of `source_id` and report what changed
    ///
    /// `provider` is the external adapter producing one `(name, field)` pair
    /// per column in the source's native order; its errors (for instance
    /// [`crate::DriftError::UnsupportedType`]) propagate untouched and
    /// nothing is persisted. On the first-ever registration every column is
    /// reported as added. A version is appended and saved only when the
    /// report is non-empty, so a no-change registration leaves the persisted
    /// artifact byte-for-byte untouched.
    pub fn register<P>(&self, source_id: &str, provider: P) -> Result<SchemaChange>
    where
        P: FnOnce() -> Result<Vec<(String, Field)>>,
    {
        let columns = provider()?;
        let current = Schema::build(columns)?;
        let mut history = self.store.load(source_id)?;

        let changes = match history.latest() {
            None => SchemaChange::all_added(&current),
            Some(previous) => diff(&previous.schema, &current),
        };

        if changes.has_changes() {
            debug!(
                source_id,
                added = changes.added.len(),
                removed = changes.removed.len(),
                changed = changes.changed.len(),
                "schema change detected, recording new version"
            );
            history.push(SchemaVersion::new(current));
            self.store.save(source_id, &history)?;
        } else {
            debug!(source_id, "no schema change detected");
        }

        Ok(changes)
    }

    /// Load the recorded history for `source_id`
    pub fn history(&self, source_id: &str) -> Result<History> {
        self.store.load(source_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::DriftError;
    use crate::store::MemoryBackend;
    use std::collections::BTreeSet;

    fn base_columns() -> Vec<(String, Field)> {
        vec![
            ("id".to_owned(), Field::Integer { bits: 64, signed: true, nullable: true }),
            ("name".to_owned(), Field::String { nullable: true }),
        ]
    }

    #[test]
    fn test_first_registration_reports_all_added() {
        let registry = SchemaRegistry::with_backend(MemoryBackend::new());
        let changes = registry.register("users", || Ok(base_columns())).unwrap();

        assert_eq!(changes.added, BTreeSet::from(["id".to_owned(), "name".to_owned()]));
        assert!(changes.removed.is_empty());
        assert!(changes.changed.is_empty());
        assert_eq!(registry.history("users").unwrap().len(), 1);
    }

    #[test]
    fn test_empty_first_registration_persists_nothing() {
        let registry = SchemaRegistry::with_backend(MemoryBackend::new());
        let changes = registry.register("empty", || Ok(vec![])).unwrap();

        assert!(!changes.has_changes());
        assert!(registry.history("empty").unwrap().is_empty());
    }

    #[test]
    fn test_unchanged_registration_appends_nothing() {
        let registry = SchemaRegistry::with_backend(MemoryBackend::new());
        registry.register("users", || Ok(base_columns())).unwrap();
        let changes = registry.register("users", || Ok(base_columns())).unwrap();

        assert!(!changes.has_changes());
        assert_eq!(registry.history("users").unwrap().len(), 1);
    }

    #[test]
    fn test_type_flip_reports_changed() {
        let registry = SchemaRegistry::with_backend(MemoryBackend::new());
        registry.register("users", || Ok(base_columns())).unwrap();

        let changes = registry
            .register("users", || {
                Ok(vec![
                    ("id".to_owned(), Field::String { nullable: true }),
                    ("name".to_owned(), Field::String { nullable: true }),
                ])
            })
            .unwrap();

        assert!(changes.added.is_empty());
        assert!(changes.removed.is_empty());
        assert_eq!(changes.changed.keys().collect::<Vec<_>>(), ["id"]);
        assert_eq!(registry.history("users").unwrap().len(), 2);
    }

    #[test]
    fn test_adapter_error_propagates_without_persisting() {
        let registry = SchemaRegistry::with_backend(MemoryBackend::new());
        let result = registry.register("users", || {
            Err(DriftError::UnsupportedType("Object".to_owned()))
        });

        assert!(matches!(result, Err(DriftError::UnsupportedType(_))));
        assert!(registry.history("users").unwrap().is_empty());
    }

    #[test]
    fn test_duplicate_column_fails_without_persisting() {
        let registry = SchemaRegistry::with_backend(MemoryBackend::new());
        let result = registry.register("users", || {
            Ok(vec![
                ("id".to_owned(), Field::String { nullable: true }),
                ("id".to_owned(), Field::String { nullable: true }),
            ])
        });

        assert!(matches!(result, Err(DriftError::DuplicateColumn(_))));
        assert!(registry.history("users").unwrap().is_empty());
    }

    #[test]
    fn test_sources_are_independent() {
        let registry = SchemaRegistry::with_backend(MemoryBackend::new());
        registry.register("users", || Ok(base_columns())).unwrap();
        registry
            .register("orders", || {
                Ok(vec![("total".to_owned(), Field::Float { bits: 64, nullable: true })])
            })
            .unwrap();

        assert_eq!(registry.history("users").unwrap().len(), 1);
        assert_eq!(registry.history("orders").unwrap().len(), 1);
    }
}
