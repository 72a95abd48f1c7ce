//! MySQL column decoding.
//!
//! Result rows are turned into JSON maps in two phases:
//! 1. `categorize_type` classifies the column's MySQL type name
//! 2. a per-category decoder extracts the value
//!
//! Rows arrive over the text protocol, so every decoder is tolerant: a value
//! that cannot be decoded as its category becomes `null` rather than failing
//! the whole result.

use serde_json::Value as JsonValue;
use sqlx::mysql::{MySqlRow, MySqlTypeInfo, MySqlValueRef};
use sqlx::{Column, Decode, Row, Type, TypeInfo};

/// Logical category for MySQL column types.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TypeCategory {
    Integer,
    Float,
    Decimal,
    Boolean,
    Text,
    Binary,
    Json,
    Temporal,
    Unknown,
}

/// Classify a MySQL type name into a logical category.
pub fn categorize_type(type_name: &str) -> TypeCategory {
    let lower = type_name.to_lowercase();

    if lower.contains("decimal") || lower.contains("numeric") {
        return TypeCategory::Decimal;
    }

    if lower.contains("int") || lower == "year" {
        return TypeCategory::Integer;
    }

    if lower == "bool" || lower == "boolean" {
        return TypeCategory::Boolean;
    }

    if lower.contains("float") || lower.contains("double") || lower == "real" {
        return TypeCategory::Float;
    }

    if lower == "json" {
        return TypeCategory::Json;
    }

    if lower == "date" || lower == "datetime" || lower == "timestamp" || lower == "time" {
        return TypeCategory::Temporal;
    }

    if lower.contains("blob") || lower.contains("binary") || lower == "bit" {
        return TypeCategory::Binary;
    }

    if lower.contains("char") || lower.contains("text") || lower == "enum" || lower == "set" {
        return TypeCategory::Text;
    }

    TypeCategory::Unknown
}

/// DECIMAL values kept as their exact textual representation.
#[derive(Debug)]
pub struct RawDecimal(pub String);

impl Type<sqlx::MySql> for RawDecimal {
    fn type_info() -> MySqlTypeInfo {
        <String as Type<sqlx::MySql>>::type_info()
    }

    fn compatible(ty: &MySqlTypeInfo) -> bool {
        let name = ty.name().to_lowercase();
        name.contains("decimal") || name.contains("numeric")
    }
}

impl<'r> Decode<'r, sqlx::MySql> for RawDecimal {
    fn decode(value: MySqlValueRef<'r>) -> Result<Self, sqlx::error::BoxDynError> {
        let s = <&str as Decode<sqlx::MySql>>::decode(value)?;
        Ok(RawDecimal(s.to_string()))
    }
}

/// Decode binary data to a JSON string.
///
/// With `decode_binary` set, valid UTF-8 is returned as text; everything else
/// is base64 encoded.
pub fn decode_binary_value(bytes: &[u8], decode_binary: bool) -> JsonValue {
    use base64::{Engine as _, engine::general_purpose::STANDARD};

    if decode_binary {
        if let Ok(s) = std::str::from_utf8(bytes) {
            return JsonValue::String(s.to_string());
        }
    }
    JsonValue::String(STANDARD.encode(bytes))
}

/// Conversion of a result row into a column name to JSON value map.
pub trait RowToJson {
    fn to_json_map(&self) -> serde_json::Map<String, JsonValue> {
        self.to_json_map_with_options(false)
    }

    fn to_json_map_with_options(&self, decode_binary: bool) -> serde_json::Map<String, JsonValue>;
}

impl RowToJson for MySqlRow {
    fn to_json_map_with_options(&self, decode_binary: bool) -> serde_json::Map<String, JsonValue> {
        self.columns()
            .iter()
            .enumerate()
            .map(|(idx, col)| {
                let type_name = col.type_info().name();
                let value = decode_column(self, idx, categorize_type(type_name), decode_binary);
                (col.name().to_string(), value)
            })
            .collect()
    }
}

fn decode_column(
    row: &MySqlRow,
    idx: usize,
    category: TypeCategory,
    decode_binary: bool,
) -> JsonValue {
    match category {
        TypeCategory::Decimal => decode_decimal(row, idx),
        TypeCategory::Integer => decode_integer(row, idx),
        TypeCategory::Boolean => decode_boolean(row, idx),
        TypeCategory::Float => decode_float(row, idx),
        TypeCategory::Binary => decode_binary_col(row, idx, decode_binary),
        TypeCategory::Json => decode_json(row, idx),
        TypeCategory::Temporal => decode_temporal(row, idx),
        TypeCategory::Text | TypeCategory::Unknown => decode_text(row, idx, decode_binary),
    }
}

fn decode_decimal(row: &MySqlRow, idx: usize) -> JsonValue {
    match row.try_get::<Option<RawDecimal>, _>(idx) {
        Ok(Some(v)) => JsonValue::String(v.0),
        Ok(None) => JsonValue::Null,
        Err(e) => {
            tracing::error!("Failed to decode DECIMAL: {:?}", e);
            JsonValue::Null
        }
    }
}

fn decode_integer(row: &MySqlRow, idx: usize) -> JsonValue {
    if let Ok(None) = row.try_get::<Option<i64>, _>(idx) {
        return JsonValue::Null;
    }
    if let Ok(Some(v)) = row.try_get::<Option<i8>, _>(idx) {
        return JsonValue::Number(v.into());
    }
    if let Ok(Some(v)) = row.try_get::<Option<i16>, _>(idx) {
        return JsonValue::Number(v.into());
    }
    if let Ok(Some(v)) = row.try_get::<Option<i32>, _>(idx) {
        return JsonValue::Number(v.into());
    }
    if let Ok(Some(v)) = row.try_get::<Option<i64>, _>(idx) {
        return JsonValue::Number(v.into());
    }
    if let Ok(Some(v)) = row.try_get::<Option<u8>, _>(idx) {
        return JsonValue::Number(v.into());
    }
    if let Ok(Some(v)) = row.try_get::<Option<u16>, _>(idx) {
        return JsonValue::Number(v.into());
    }
    if let Ok(Some(v)) = row.try_get::<Option<u32>, _>(idx) {
        return JsonValue::Number(v.into());
    }
    if let Ok(Some(v)) = row.try_get::<Option<u64>, _>(idx) {
        return JsonValue::Number(v.into());
    }
    JsonValue::Null
}

fn decode_boolean(row: &MySqlRow, idx: usize) -> JsonValue {
    row.try_get::<Option<bool>, _>(idx)
        .ok()
        .flatten()
        .map(JsonValue::Bool)
        .unwrap_or(JsonValue::Null)
}

fn decode_float(row: &MySqlRow, idx: usize) -> JsonValue {
    if let Ok(Some(v)) = row.try_get::<Option<f64>, _>(idx) {
        return float_to_json(v);
    }
    if let Ok(Some(v)) = row.try_get::<Option<f32>, _>(idx) {
        return float_to_json(f64::from(v));
    }
    JsonValue::Null
}

fn float_to_json(v: f64) -> JsonValue {
    serde_json::Number::from_f64(v)
        .map(JsonValue::Number)
        .unwrap_or_else(|| JsonValue::String(v.to_string()))
}

fn decode_binary_col(row: &MySqlRow, idx: usize, decode_binary: bool) -> JsonValue {
    row.try_get::<Option<Vec<u8>>, _>(idx)
        .ok()
        .flatten()
        .map(|v| decode_binary_value(&v, decode_binary))
        .unwrap_or(JsonValue::Null)
}

fn decode_json(row: &MySqlRow, idx: usize) -> JsonValue {
    row.try_get::<Option<JsonValue>, _>(idx)
        .ok()
        .flatten()
        .unwrap_or(JsonValue::Null)
}

/// DATETIME and TIMESTAMP as `YYYY-MM-DD HH:MM:SS[.fff]`, DATE and TIME as-is.
fn decode_temporal(row: &MySqlRow, idx: usize) -> JsonValue {
    use chrono::{NaiveDate, NaiveDateTime, NaiveTime};

    if let Ok(None) = row.try_get::<Option<NaiveDateTime>, _>(idx) {
        return JsonValue::Null;
    }
    if let Ok(Some(v)) = row.try_get::<Option<NaiveDateTime>, _>(idx) {
        return JsonValue::String(v.format("%Y-%m-%d %H:%M:%S%.f").to_string());
    }
    if let Ok(Some(v)) = row.try_get::<Option<NaiveDate>, _>(idx) {
        return JsonValue::String(v.format("%Y-%m-%d").to_string());
    }
    if let Ok(Some(v)) = row.try_get::<Option<NaiveTime>, _>(idx) {
        return JsonValue::String(v.format("%H:%M:%S%.f").to_string());
    }
    // Zero dates and out-of-range TIME values have no chrono representation
    decode_raw_text(row, idx)
}

fn decode_text(row: &MySqlRow, idx: usize, decode_binary: bool) -> JsonValue {
    if let Ok(Some(v)) = row.try_get::<Option<String>, _>(idx) {
        return JsonValue::String(v);
    }
    if let Ok(Some(v)) = row.try_get::<Option<Vec<u8>>, _>(idx) {
        return decode_binary_value(&v, decode_binary);
    }
    decode_raw_text(row, idx)
}

fn decode_raw_text(row: &MySqlRow, idx: usize) -> JsonValue {
    match row.try_get_raw(idx) {
        Ok(raw) => <&str as Decode<sqlx::MySql>>::decode(raw)
            .map(|s| JsonValue::String(s.to_string()))
            .unwrap_or(JsonValue::Null),
        Err(_) => JsonValue::Null,
    }
}
