//! Dynamic entry record

use std::collections::HashMap;

use serde::Deserialize;
use serde::Serialize;

use super::Value;
use crate::error::FieldError;

/// Field holding the unique entry key.
pub const KEY_FIELD: &str = "key";
/// Field referencing the parent node's key.
pub const PARENT_FIELD: &str = "parententry";
/// Field holding the sibling ordering key.
pub const SORT_INDEX_FIELD: &str = "sortindex";

/// A dynamic record as returned by the backend.
///
/// Records hold field values as a `HashMap<String, Value>`, allowing dynamic
/// access to any field. Typed getter methods provide safe access with proper
/// error handling.
///
/// # Example
///
/// ```
/// use hierarchy_lib::model::Record;
///
/// let record = Record::new()
///     .set("key", "n1")
///     .set("name", "Documents")
///     .set("sortindex", 2.5);
///
/// assert_eq!(record.key(), Some("n1"));
/// assert_eq!(record.get_string("name").unwrap(), Some("Documents"));
/// assert_eq!(record.sort_index(), 2.5);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Record {
    fields: HashMap<String, Value>,
}

impl Record {
    /// Creates a new empty record.
    pub fn new() -> Self {
        Self::default()
    }

    // =========================================================================
    // Tree accessors
    // =========================================================================

    /// Returns the entry key, if present and a string.
    pub fn key(&self) -> Option<&str> {
        self.fields.get(KEY_FIELD).and_then(Value::as_str)
    }

    /// Returns the parent entry key.
    ///
    /// Null and empty strings are treated as "no parent".
    pub fn parent_entry(&self) -> Option<&str> {
        self.fields
            .get(PARENT_FIELD)
            .and_then(Value::as_str)
            .filter(|s| !s.is_empty())
    }

    /// Returns the numeric sort index, `0.0` when absent or unparsable.
    pub fn sort_index(&self) -> f64 {
        self.fields
            .get(SORT_INDEX_FIELD)
            .and_then(Value::as_f64)
            .unwrap_or(0.0)
    }

    // =========================================================================
    // Raw field access
    // =========================================================================

    /// Returns a reference to the field value, if it exists.
    pub fn get(&self, field: &str) -> Option<&Value> {
        self.fields.get(field)
    }

    /// Returns `true` if the record contains the given field.
    pub fn contains(&self, field: &str) -> bool {
        self.fields.contains_key(field)
    }

    /// Returns a reference to all fields.
    pub fn fields(&self) -> &HashMap<String, Value> {
        &self.fields
    }

    /// Sets a field value (builder pattern).
    pub fn set(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.fields.insert(field.into(), value.into());
        self
    }

    /// Inserts a field value.
    pub fn insert(&mut self, field: impl Into<String>, value: impl Into<Value>) {
        self.fields.insert(field.into(), value.into());
    }

    /// Removes a field and returns its value.
    pub fn remove(&mut self, field: &str) -> Option<Value> {
        self.fields.remove(field)
    }

    // =========================================================================
    // Typed getters
    //
    // Return Err if field is missing or wrong type.
    // Return Ok(None) only if the field exists and is Value::Null.
    // =========================================================================

    /// Gets a string field value.
    pub fn get_string(&self, field: &str) -> Result<Option<&str>, FieldError> {
        match self.fields.get(field) {
            None => Err(FieldError::missing(field)),
            Some(Value::Null) => Ok(None),
            Some(Value::String(s)) => Ok(Some(s.as_str())),
            Some(other) => Err(FieldError::type_mismatch(
                field,
                "string",
                other.type_name(),
            )),
        }
    }

    /// Gets a boolean field value.
    pub fn get_bool(&self, field: &str) -> Result<Option<bool>, FieldError> {
        match self.fields.get(field) {
            None => Err(FieldError::missing(field)),
            Some(Value::Null) => Ok(None),
            Some(Value::Bool(b)) => Ok(Some(*b)),
            Some(other) => Err(FieldError::type_mismatch(field, "bool", other.type_name())),
        }
    }

    /// Gets an integer field value.
    pub fn get_int(&self, field: &str) -> Result<Option<i64>, FieldError> {
        match self.fields.get(field) {
            None => Err(FieldError::missing(field)),
            Some(Value::Null) => Ok(None),
            Some(Value::Int(n)) => Ok(Some(*n)),
            Some(other) => Err(FieldError::type_mismatch(field, "int", other.type_name())),
        }
    }

    /// Gets a numeric field value, widening integers and parsing numeric strings.
    pub fn get_number(&self, field: &str) -> Result<Option<f64>, FieldError> {
        match self.fields.get(field) {
            None => Err(FieldError::missing(field)),
            Some(Value::Null) => Ok(None),
            Some(other) => other
                .as_f64()
                .map(Some)
                .ok_or_else(|| FieldError::type_mismatch(field, "number", other.type_name())),
        }
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for Record {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            fields: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}
