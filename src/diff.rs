//! Schema comparison

use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};

use crate::field::Field;
use crate::schema::Schema;

/// A column whose type changed between two snapshots
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldChange {
    pub old: Field,
    pub new: Field,
}

/// The added/removed/changed column report between two schema snapshots
///
/// The three collections are disjoint and carry set semantics; callers must
/// not rely on iteration order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SchemaChange {
    pub added: BTreeSet<String>,
    pub removed: BTreeSet<String>,
    pub changed: BTreeMap<String, FieldChange>,
}

impl SchemaChange {
    /// Whether any column was added, removed, or changed
    pub fn has_changes(&self) -> bool {
        !self.added.is_empty() || !self.removed.is_empty() || !self.changed.is_empty()
    }

    pub fn is_empty(&self) -> bool {
        !self.has_changes()
    }

    /// The first-registration report: every current column counts as added
    pub(crate) fn all_added(schema: &Schema) -> Self {
        Self {
            added: schema.column_names().map(str::to_owned).collect(),
            ..Self::default()
        }
    }
}

/// Compare two schema snapshots
///
/// `added` holds names only in `new`, `removed` names only in `old`, and
/// `changed` names present in both whose fields are not structurally equal.
/// A change anywhere in a nested type surfaces on the owning column. Column
/// ordering inside either schema never affects the result.
pub fn diff(old: &Schema, new: &Schema) -> SchemaChange {
    let mut changes = SchemaChange::default();
    for (name, field) in new.iter() {
        match old.get(name) {
            None => {
                changes.added.insert(name.to_owned());
            }
            Some(previous) if previous != field => {
                changes.changed.insert(
                    name.to_owned(),
                    FieldChange { old: previous.clone(), new: field.clone() },
                );
            }
            Some(_) => {}
        }
    }
    for (name, _) in old.iter() {
        if new.get(name).is_none() {
            changes.removed.insert(name.to_owned());
        }
    }
    changes
}
