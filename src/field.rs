//! Column type model
//!
//! A [`Field`] describes one column's type: primitive, temporal, or nested
//! (sequences and structs compose recursively), always together with a
//! nullability flag. The wire form is a JSON object carrying a `"type"`
//! discriminant beside the variant's parameters, and [`Field::from_value`] /
//! [`Field::to_value`] are the single codec for it; the serde impls and the
//! persisted history all go through them.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value};

use crate::error::{DriftError, Result};

/// A single column type description
///
/// Structural equality is recursive: variant, nullability, and every
/// parameter must match. Struct fields compare by name regardless of order;
/// enum labels compare in order.
#[derive(Debug, Clone)]
pub enum Field {
    /// An always-null column
    Null { nullable: bool },
    Boolean { nullable: bool },
    /// Fixed-width integer; `bits` is one of 8, 16, 32, 64
    Integer { bits: u8, signed: bool, nullable: bool },
    /// IEEE float; `bits` is 32 or 64
    Float { bits: u8, nullable: bool },
    /// UTF-8 text
    String { nullable: bool },
    /// Opaque bytes
    Binary { nullable: bool },
    Date { nullable: bool },
    Time { nullable: bool },
    Datetime { nullable: bool },
    Duration { nullable: bool },
    Categorical { ordered: bool, nullable: bool },
    /// Closed label set; label order is significant
    Enum { variants: Vec<String>, nullable: bool },
    /// Variable-length (`size: None`) or fixed-length (`size: Some(n)`) sequence
    Sequence { inner: Box<Field>, size: Option<usize>, nullable: bool },
    /// Named sub-fields, insertion order preserved
    Struct { fields: Vec<(String, Field)>, nullable: bool },
}

impl Field {
    /// Get the wire discriminant for this field type
    pub fn type_name(&self) -> &'static str {
        match self {
            Field::Null { .. } => "null",
            Field::Boolean { .. } => "boolean",
            Field::Integer { .. } => "integer",
            Field::Float { .. } => "float",
            Field::String { .. } => "string",
            Field::Binary { .. } => "binary",
            Field::Date { .. } => "date",
            Field::Time { .. } => "time",
            Field::Datetime { .. } => "datetime",
            Field::Duration { .. } => "duration",
            Field::Categorical { .. } => "categorical",
            Field::Enum { .. } => "enum",
            Field::Sequence { .. } => "sequence",
            Field::Struct { .. } => "struct",
        }
    }

    /// Whether this column may hold nulls
    pub fn nullable(&self) -> bool {
        match self {
            Field::Null { nullable }
            | Field::Boolean { nullable }
            | Field::Integer { nullable, .. }
            | Field::Float { nullable, .. }
            | Field::String { nullable }
            | Field::Binary { nullable }
            | Field::Date { nullable }
            | Field::Time { nullable }
            | Field::Datetime { nullable }
            | Field::Duration { nullable }
            | Field::Categorical { nullable, .. }
            | Field::Enum { nullable, .. }
            | Field::Sequence { nullable, .. }
            | Field::Struct { nullable, .. } => *nullable,
        }
    }

    /// Serialize to the JSON object form
    pub fn to_value(&self) -> Value {
        let mut map = Map::new();
        map.insert("type".to_owned(), self.type_name().into());
        match self {
            Field::Null { .. }
            | Field::Boolean { .. }
            | Field::String { .. }
            | Field::Binary { .. }
            | Field::Date { .. }
            | Field::Time { .. }
            | Field::Datetime { .. }
            | Field::Duration { .. } => {}
            Field::Integer { bits, signed, .. } => {
                map.insert("bits".to_owned(), (*bits).into());
                map.insert("signed".to_owned(), (*signed).into());
            }
            Field::Float { bits, .. } => {
                map.insert("bits".to_owned(), (*bits).into());
            }
            Field::Categorical { ordered, .. } => {
                map.insert("ordered".to_owned(), (*ordered).into());
            }
            Field::Enum { variants, .. } => {
                map.insert("variants".to_owned(), variants.clone().into());
            }
            Field::Sequence { inner, size, .. } => {
                map.insert("inner".to_owned(), inner.to_value());
                let size = match size {
                    Some(n) => Value::from(*n as u64),
                    None => Value::Null,
                };
                map.insert("size".to_owned(), size);
            }
            Field::Struct { fields, .. } => {
                let mut nested = Map::new();
                for (name, field) in fields {
                    nested.insert(name.clone(), field.to_value());
                }
                map.insert("fields".to_owned(), Value::Object(nested));
            }
        }
        map.insert("nullable".to_owned(), self.nullable().into());
        Value::Object(map)
    }

    /// Deserialize from the JSON object form
    ///
    /// Fails with [`DriftError::UnknownFieldType`] when the `"type"` tag is
    /// not recognized, and [`DriftError::MalformedField`] when a required
    /// parameter is absent or of the wrong shape.
    pub fn from_value(value: &Value) -> Result<Self> {
        let map = value
            .as_object()
            .ok_or_else(|| DriftError::MalformedField("field value is not an object".to_owned()))?;
        let tag = map
            .get("type")
            .and_then(Value::as_str)
            .ok_or_else(|| DriftError::MalformedField("missing `type` discriminant".to_owned()))?;
        let nullable = require_bool(map, tag, "nullable")?;

        match tag {
            "null" => Ok(Field::Null { nullable }),
            "boolean" => Ok(Field::Boolean { nullable }),
            "integer" => Ok(Field::Integer {
                bits: require_bits(map, tag, &[8, 16, 32, 64])?,
                signed: require_bool(map, tag, "signed")?,
                nullable,
            }),
            "float" => Ok(Field::Float {
                bits: require_bits(map, tag, &[32, 64])?,
                nullable,
            }),
            "string" => Ok(Field::String { nullable }),
            "binary" => Ok(Field::Binary { nullable }),
            "date" => Ok(Field::Date { nullable }),
            "time" => Ok(Field::Time { nullable }),
            "datetime" => Ok(Field::Datetime { nullable }),
            "duration" => Ok(Field::Duration { nullable }),
            "categorical" => {
                // `ordered` may be omitted; unordered is the default
                let ordered = match map.get("ordered") {
                    None | Some(Value::Null) => false,
                    Some(value) => value.as_bool().ok_or_else(|| {
                        DriftError::MalformedField(format!("{tag} field: `ordered` is not a boolean"))
                    })?,
                };
                Ok(Field::Categorical { ordered, nullable })
            }
            "enum" => {
                let labels = map.get("variants").and_then(Value::as_array).ok_or_else(|| {
                    DriftError::MalformedField(format!("{tag} field: missing `variants` list"))
                })?;
                let variants = labels
                    .iter()
                    .map(|label| {
                        label.as_str().map(str::to_owned).ok_or_else(|| {
                            DriftError::MalformedField(format!(
                                "{tag} field: variant label is not a string"
                            ))
                        })
                    })
                    .collect::<Result<Vec<_>>>()?;
                Ok(Field::Enum { variants, nullable })
            }
            "sequence" => {
                let inner = map.get("inner").ok_or_else(|| {
                    DriftError::MalformedField(format!("{tag} field: missing `inner` type"))
                })?;
                let size = match map.get("size") {
                    None | Some(Value::Null) => None,
                    Some(value) => Some(value.as_u64().ok_or_else(|| {
                        DriftError::MalformedField(format!(
                            "{tag} field: `size` is not a non-negative integer"
                        ))
                    })? as usize),
                };
                Ok(Field::Sequence {
                    inner: Box::new(Field::from_value(inner)?),
                    size,
                    nullable,
                })
            }
            "struct" => {
                let nested = map.get("fields").and_then(Value::as_object).ok_or_else(|| {
                    DriftError::MalformedField(format!("{tag} field: missing `fields` mapping"))
                })?;
                let fields = nested
                    .iter()
                    .map(|(name, value)| Ok((name.clone(), Field::from_value(value)?)))
                    .collect::<Result<Vec<_>>>()?;
                Ok(Field::Struct { fields, nullable })
            }
            unknown => Err(DriftError::UnknownFieldType(unknown.to_owned())),
        }
    }
}

fn require_bool(map: &Map<String, Value>, tag: &str, key: &str) -> Result<bool> {
    map.get(key).and_then(Value::as_bool).ok_or_else(|| {
        DriftError::MalformedField(format!("{tag} field: missing or invalid `{key}`"))
    })
}

fn require_bits(map: &Map<String, Value>, tag: &str, allowed: &[u8]) -> Result<u8> {
    let bits = map
        .get("bits")
        .and_then(Value::as_u64)
        .ok_or_else(|| DriftError::MalformedField(format!("{tag} field: missing or invalid `bits`")))?;
    let bits = u8::try_from(bits).ok().filter(|b| allowed.contains(b)).ok_or_else(|| {
        DriftError::MalformedField(format!("{tag} field: `bits` must be one of {allowed:?}"))
    })?;
    Ok(bits)
}

impl PartialEq for Field {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Field::Null { nullable: a }, Field::Null { nullable: b })
            | (Field::Boolean { nullable: a }, Field::Boolean { nullable: b })
            | (Field::String { nullable: a }, Field::String { nullable: b })
            | (Field::Binary { nullable: a }, Field::Binary { nullable: b })
            | (Field::Date { nullable: a }, Field::Date { nullable: b })
            | (Field::Time { nullable: a }, Field::Time { nullable: b })
            | (Field::Datetime { nullable: a }, Field::Datetime { nullable: b })
            | (Field::Duration { nullable: a }, Field::Duration { nullable: b }) => a == b,
            (
                Field::Integer { bits: a_bits, signed: a_signed, nullable: a_null },
                Field::Integer { bits: b_bits, signed: b_signed, nullable: b_null },
            ) => a_bits == b_bits && a_signed == b_signed && a_null == b_null,
            (
                Field::Float { bits: a_bits, nullable: a_null },
                Field::Float { bits: b_bits, nullable: b_null },
            ) => a_bits == b_bits && a_null == b_null,
            (
                Field::Categorical { ordered: a_ord, nullable: a_null },
                Field::Categorical { ordered: b_ord, nullable: b_null },
            ) => a_ord == b_ord && a_null == b_null,
            (
                Field::Enum { variants: a_vars, nullable: a_null },
                Field::Enum { variants: b_vars, nullable: b_null },
            ) => a_vars == b_vars && a_null == b_null,
            (
                Field::Sequence { inner: a_inner, size: a_size, nullable: a_null },
                Field::Sequence { inner: b_inner, size: b_size, nullable: b_null },
            ) => a_size == b_size && a_null == b_null && a_inner == b_inner,
            (
                Field::Struct { fields: a_fields, nullable: a_null },
                Field::Struct { fields: b_fields, nullable: b_null },
            ) => {
                // Same names, equal fields; declaration order does not matter
                a_null == b_null
                    && a_fields.len() == b_fields.len()
                    && a_fields.iter().all(|(name, field)| {
                        b_fields
                            .iter()
                            .any(|(other_name, other_field)| other_name == name && other_field == field)
                    })
            }
            _ => false,
        }
    }
}

impl Eq for Field {}

impl Serialize for Field {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        self.to_value().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Field {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = Value::deserialize(deserializer)?;
        Field::from_value(&value).map_err(serde::de::Error::custom)
    }
}
