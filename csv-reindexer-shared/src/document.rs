//! Documents built from data rows.

use serde::ser::{Serialize, SerializeMap, Serializer};

/// A single field value: the raw string, or the ordered parts of a
/// multi-value field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldValue {
    Scalar(String),
    Array(Vec<String>),
}

impl FieldValue {
    /// Build a value from a raw field, splitting it when `array_delimiter`
    /// is set, non-empty and present in the value.
    pub fn parse(raw: &str, array_delimiter: Option<&str>) -> Self {
        match array_delimiter {
            Some(delimiter) if !delimiter.is_empty() && raw.contains(delimiter) => {
                FieldValue::Array(raw.split(delimiter).map(str::to_string).collect())
            }
            _ => FieldValue::Scalar(raw.to_string()),
        }
    }
}

impl Serialize for FieldValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            FieldValue::Scalar(value) => serializer.serialize_str(value),
            FieldValue::Array(values) => values.serialize(serializer),
        }
    }
}

/// One data row keyed by header field name.
///
/// The id comes from the first column and is sent as the bulk `_id`; the
/// remaining columns form the body. Serializing a `Document` yields the body
/// with fields in header order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    pub id: String,
    pub fields: Vec<(String, FieldValue)>,
}

impl Document {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            fields: Vec::new(),
        }
    }

    pub fn with_field(mut self, name: impl Into<String>, value: FieldValue) -> Self {
        self.fields.push((name.into(), value));
        self
    }

    pub fn get(&self, name: &str) -> Option<&FieldValue> {
        self.fields
            .iter()
            .find(|(field, _)| field == name)
            .map(|(_, value)| value)
    }
}

impl Serialize for Document {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.fields.len()))?;
        for (name, value) in &self.fields {
            map.serialize_entry(name, value)?;
        }
        map.end()
    }
}
