//! Schema snapshots and their version history

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value};
use std::collections::HashSet;

use crate::checksum::Checksum;
use crate::error::{DriftError, Result};
use crate::field::Field;

/// Format tag written into every serialized schema
///
/// Readers accept unknown tags best-effort; only the field tag set itself is
/// load-bearing for compatibility.
pub const SCHEMA_FORMAT_VERSION: &str = "1.0";

/// One complete snapshot of a source's columns
///
/// Columns keep their construction order and names are unique. A schema is
/// immutable once built; registration constructs a fresh one per call.
/// Equality compares columns by name and recursive type structure only;
/// neither column order nor the format tag participates.
#[derive(Debug, Clone)]
pub struct Schema {
    version: String,
    fields: Vec<(String, Field)>,
}

impl Schema {
    /// Build a schema from ordered `(name, field)` columns
    ///
    /// Rejects duplicate column names with [`DriftError::DuplicateColumn`].
    pub fn build(columns: Vec<(String, Field)>) -> Result<Self> {
        let mut seen = HashSet::new();
        for (name, _) in &columns {
            if !seen.insert(name.as_str()) {
                return Err(DriftError::DuplicateColumn(name.clone()));
            }
        }
        Ok(Self {
            version: SCHEMA_FORMAT_VERSION.to_owned(),
            fields: columns,
        })
    }

    /// Get a column's field by name
    pub fn get(&self, name: &str) -> Option<&Field> {
        self.fields
            .iter()
            .find(|(field_name, _)| field_name == name)
            .map(|(_, field)| field)
    }

    /// Number of columns
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Iterate columns in construction order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Field)> {
        self.fields.iter().map(|(name, field)| (name.as_str(), field))
    }

    /// Column names in construction order
    pub fn column_names(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|(name, _)| name.as_str())
    }

    /// The format tag this schema was built or parsed with
    pub fn format_version(&self) -> &str {
        &self.version
    }

    /// Serialize to the JSON object form
    pub fn to_value(&self) -> Value {
        let mut fields = Map::new();
        for (name, field) in &self.fields {
            fields.insert(name.clone(), field.to_value());
        }
        let mut map = Map::new();
        map.insert("version".to_owned(), self.version.clone().into());
        map.insert("fields".to_owned(), Value::Object(fields));
        Value::Object(map)
    }

    /// Deserialize from the JSON object form
    ///
    /// An absent or unrecognized `"version"` tag is accepted as-is;
    /// [`DriftError::UnknownFieldType`] and [`DriftError::MalformedField`]
    /// propagate from nested field parsing.
    pub fn from_value(value: &Value) -> Result<Self> {
        let map = value
            .as_object()
            .ok_or_else(|| DriftError::MalformedField("schema value is not an object".to_owned()))?;
        let version = map
            .get("version")
            .and_then(Value::as_str)
            .unwrap_or(SCHEMA_FORMAT_VERSION)
            .to_owned();
        let raw_fields = map.get("fields").and_then(Value::as_object).ok_or_else(|| {
            DriftError::MalformedField("schema is missing its `fields` mapping".to_owned())
        })?;
        let fields = raw_fields
            .iter()
            .map(|(name, value)| Ok((name.clone(), Field::from_value(value)?)))
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { version, fields })
    }
}

impl PartialEq for Schema {
    fn eq(&self, other: &Self) -> bool {
        self.fields.len() == other.fields.len()
            && self.iter().all(|(name, field)| other.get(name) == Some(field))
    }
}

impl Eq for Schema {}

impl Serialize for Schema {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        self.to_value().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Schema {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = Value::deserialize(deserializer)?;
        Schema::from_value(&value).map_err(serde::de::Error::custom)
    }
}

/// One recorded schema snapshot in a source's history
///
/// Appended only, never edited. The checksum covers the serialized schema and
/// is verified when the history is loaded back.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchemaVersion {
    pub schema: Schema,
    /// When this snapshot was recorded (UTC)
    pub timestamp: DateTime<Utc>,
    /// SHA256 over the serialized schema
    pub checksum: Checksum,
}

impl SchemaVersion {
    /// Record a snapshot now
    pub fn new(schema: Schema) -> Self {
        let checksum = Checksum::from_json(&schema.to_value());
        Self {
            schema,
            timestamp: Utc::now(),
            checksum,
        }
    }

    /// Verify the checksum against the schema content
    pub fn verify_checksum(&self) -> bool {
        self.checksum.verify_json(&self.schema.to_value())
    }
}

/// The ordered version history for one source, newest last
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct History {
    versions: Vec<SchemaVersion>,
}

impl History {
    /// The most recent version, if any
    pub fn latest(&self) -> Option<&SchemaVersion> {
        self.versions.last()
    }

    /// Append a new version
    pub fn push(&mut self, version: SchemaVersion) {
        self.versions.push(version);
    }

    pub fn len(&self) -> usize {
        self.versions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.versions.is_empty()
    }

    /// Iterate versions oldest first
    pub fn iter(&self) -> impl Iterator<Item = &SchemaVersion> {
        self.versions.iter()
    }

    /// Verify every version's checksum
    pub fn verify(&self) -> bool {
        self.versions.iter().all(SchemaVersion::verify_checksum)
    }
}
