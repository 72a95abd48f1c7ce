//! Query-related data models.
//!
//! This module defines the values that can be bound into a query template and
//! the shape of the rows a query returns.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::Serialize;
use serde_json::Value as JsonValue;
use std::collections::HashMap;

/// Named values for placeholder substitution, keyed by placeholder name without the colon.
pub type Bindings = HashMap<String, SqlValue>;

/// A single result row: column name to decoded value.
pub type Row = serde_json::Map<String, JsonValue>;

/// Rows returned by a query, in server order.
pub type Rows = Vec<Row>;

/// A value that can be bound to a named placeholder.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum SqlValue {
    /// NULL value
    Null,
    /// Boolean value
    Bool(bool),
    /// Signed integer value (stored as i64 for maximum range)
    Int(i64),
    /// Unsigned integer value beyond the signed range
    UInt(u64),
    /// Floating point value
    Float(f64),
    /// String value
    String(String),
    /// Binary data (base64 encoded in JSON)
    #[serde(serialize_with = "base64_bytes::serialize")]
    Bytes(Vec<u8>),
    /// Calendar date
    Date(NaiveDate),
    /// Date and time without zone; rendered as given
    DateTime(NaiveDateTime),
    /// JSON document, bound as its compact text
    Json(JsonValue),
    /// Comma-separated list; nested lists render as parenthesized groups
    List(Vec<SqlValue>),
    /// Pre-rendered SQL inserted verbatim, e.g. `NOW()`
    Raw(String),
}

impl SqlValue {
    /// Create a raw SQL fragment that is substituted without escaping.
    pub fn raw(sql: impl Into<String>) -> Self {
        Self::Raw(sql.into())
    }
}

/// Custom serialization for binary data as base64.
mod base64_bytes {
    use base64::{Engine as _, engine::general_purpose::STANDARD};
    use serde::{Serialize, Serializer};

    pub fn serialize<S>(bytes: &Vec<u8>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        STANDARD.encode(bytes).serialize(serializer)
    }
}

macro_rules! impl_from_int {
    ($($t:ty),+) => {
        $(impl From<$t> for SqlValue {
            fn from(v: $t) -> Self {
                Self::Int(i64::from(v))
            }
        })+
    };
}

impl_from_int!(i8, i16, i32, i64, u8, u16, u32);

impl From<u64> for SqlValue {
    fn from(v: u64) -> Self {
        match i64::try_from(v) {
            Ok(v) => Self::Int(v),
            Err(_) => Self::UInt(v),
        }
    }
}

impl From<bool> for SqlValue {
    fn from(v: bool) -> Self {
        Self::Bool(v)
    }
}

impl From<f32> for SqlValue {
    fn from(v: f32) -> Self {
        Self::Float(f64::from(v))
    }
}

impl From<f64> for SqlValue {
    fn from(v: f64) -> Self {
        Self::Float(v)
    }
}

impl From<&str> for SqlValue {
    fn from(v: &str) -> Self {
        Self::String(v.to_string())
    }
}

impl From<String> for SqlValue {
    fn from(v: String) -> Self {
        Self::String(v)
    }
}

impl From<&String> for SqlValue {
    fn from(v: &String) -> Self {
        Self::String(v.clone())
    }
}

impl From<&[u8]> for SqlValue {
    fn from(v: &[u8]) -> Self {
        Self::Bytes(v.to_vec())
    }
}

impl From<NaiveDate> for SqlValue {
    fn from(v: NaiveDate) -> Self {
        Self::Date(v)
    }
}

impl From<NaiveDateTime> for SqlValue {
    fn from(v: NaiveDateTime) -> Self {
        Self::DateTime(v)
    }
}

impl From<DateTime<Utc>> for SqlValue {
    fn from(v: DateTime<Utc>) -> Self {
        Self::DateTime(v.naive_utc())
    }
}

impl<T: Into<SqlValue>> From<Option<T>> for SqlValue {
    fn from(v: Option<T>) -> Self {
        v.map(Into::into).unwrap_or(Self::Null)
    }
}

impl<T: Into<SqlValue>> From<Vec<T>> for SqlValue {
    fn from(v: Vec<T>) -> Self {
        Self::List(v.into_iter().map(Into::into).collect())
    }
}

/// Scalars map to scalars and arrays to lists; objects are kept as JSON documents.
impl From<JsonValue> for SqlValue {
    fn from(v: JsonValue) -> Self {
        match v {
            JsonValue::Null => Self::Null,
            JsonValue::Bool(b) => Self::Bool(b),
            JsonValue::Number(n) => {
                if let Some(i) = n.as_i64() {
                    Self::Int(i)
                } else if let Some(u) = n.as_u64() {
                    Self::UInt(u)
                } else {
                    Self::Float(n.as_f64().unwrap_or(f64::NAN))
                }
            }
            JsonValue::String(s) => Self::String(s),
            JsonValue::Array(items) => Self::List(items.into_iter().map(Self::from).collect()),
            obj @ JsonValue::Object(_) => Self::Json(obj),
        }
    }
}
