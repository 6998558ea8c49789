//! Entity records and sub-collection fields

use serde_json::{Map, Value};

/// An entity record: ordered field name → JSON value.
///
/// `serde_json` is built with `preserve_order`, so field order survives a
/// load/save round trip and reports list fields in the order they appear.
pub type Record = Map<String, Value>;

/// Field holding automation triggers bound to settings.
pub const HANDLERS_FIELD: &str = "handlers";

/// Fields whose value is a keyed list of child records with their own CRUD
/// lifecycle on the server.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum SubCollection {
    Files,
    Parameters,
    Settings,
}

impl SubCollection {
    /// All sub-collections, in apply order.
    pub const ALL: [Self; 3] = [Self::Files, Self::Parameters, Self::Settings];

    /// Top-level field name in the entity record.
    pub fn field(self) -> &'static str {
        match self {
            Self::Files => "files",
            Self::Parameters => "parameters",
            Self::Settings => "settings",
        }
    }

    /// Field that uniquely identifies an element.
    pub fn key_field(self) -> &'static str {
        match self {
            Self::Files | Self::Parameters => "name",
            Self::Settings => "key",
        }
    }

    /// Look up the sub-collection stored under a top-level field.
    pub fn from_field(field: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|c| c.field() == field)
    }

    /// Key of one element, if it has a scalar key field.
    pub fn element_key(self, element: &Record) -> Option<String> {
        element.get(self.key_field()).and_then(scalar_key)
    }

    /// Keys of every element in a sub-collection value, in list order.
    ///
    /// Elements without a usable key are skipped.
    pub fn keys(self, value: &Value) -> Vec<String> {
        match value {
            Value::Array(items) => items
                .iter()
                .filter_map(Value::as_object)
                .filter_map(|element| self.element_key(element))
                .collect(),
            _ => Vec::new(),
        }
    }
}

impl std::fmt::Display for SubCollection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.field())
    }
}

/// Render a scalar as a key string; objects, arrays and null are not keys.
pub fn scalar_key(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

/// Names of the files listed in a record's `files` field.
pub fn file_names(record: &Record) -> Vec<String> {
    record
        .get(SubCollection::Files.field())
        .map(|value| SubCollection::Files.keys(value))
        .unwrap_or_default()
}

/// Whether a record carries any handler definitions.
pub fn has_handlers(record: &Record) -> bool {
    match record.get(HANDLERS_FIELD) {
        Some(Value::Array(items)) => !items.is_empty(),
        Some(Value::Object(map)) => !map.is_empty(),
        Some(Value::Null) | None => false,
        Some(_) => true,
    }
}

/// Parse a JSON value into a record, if it is an object.
pub fn into_record(value: Value) -> Option<Record> {
    match value {
        Value::Object(map) => Some(map),
        _ => None,
    }
}
