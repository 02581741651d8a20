use bytes::BytesMut;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use tokio_postgres::types::{to_sql_checked, IsNull, ToSql, Type as PgType};
use uuid::Uuid;

/// A column value lifted out of an entity field, ready to be bound as a
/// statement parameter or rendered inline where the dialect requires it.
#[derive(Debug, Clone, PartialEq)]
pub enum SqlValue {
    Null,
    Bool(bool),
    I16(i16),
    I32(i32),
    I64(i64),
    F32(f32),
    F64(f64),
    Numeric(Decimal),
    Text(String),
    Uuid(Uuid),
    Timestamp(DateTime<Utc>),
    Bytes(Vec<u8>),
    Json(serde_json::Value),
}

impl SqlValue {
    pub fn kind_name(&self) -> &'static str {
        match self {
            SqlValue::Null => "Null",
            SqlValue::Bool(_) => "Bool",
            SqlValue::I16(_) => "I16",
            SqlValue::I32(_) => "I32",
            SqlValue::I64(_) => "I64",
            SqlValue::F32(_) => "F32",
            SqlValue::F64(_) => "F64",
            SqlValue::Numeric(_) => "Numeric",
            SqlValue::Text(_) => "Text",
            SqlValue::Uuid(_) => "Uuid",
            SqlValue::Timestamp(_) => "Timestamp",
            SqlValue::Bytes(_) => "Bytes",
            SqlValue::Json(_) => "Json",
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, SqlValue::Null)
    }

    /// Whether the value should be treated as "not assigned by the caller" for
    /// a database-generated column: NULL, a zero number, or a nil UUID. Text
    /// and the remaining kinds only count as unassigned when NULL.
    pub fn is_default(&self) -> bool {
        match self {
            SqlValue::Null => true,
            SqlValue::I16(value) => *value == 0,
            SqlValue::I32(value) => *value == 0,
            SqlValue::I64(value) => *value == 0,
            SqlValue::F32(value) => *value == 0.0,
            SqlValue::F64(value) => *value == 0.0,
            SqlValue::Numeric(value) => value.is_zero(),
            SqlValue::Uuid(value) => value.is_nil(),
            SqlValue::Bool(_)
            | SqlValue::Text(_)
            | SqlValue::Timestamp(_)
            | SqlValue::Bytes(_)
            | SqlValue::Json(_) => false,
        }
    }

    /// Renders the value as an inline SQL literal for primary key comparisons
    /// (`WHEN <pk> = <literal>` / `WHERE <pk> IN (...)`). Only value kinds
    /// that make sense as row identity render; everything else returns `None`.
    pub fn to_key_literal(&self) -> Option<String> {
        match self {
            SqlValue::I16(value) => Some(value.to_string()),
            SqlValue::I32(value) => Some(value.to_string()),
            SqlValue::I64(value) => Some(value.to_string()),
            SqlValue::Numeric(value) => Some(value.to_string()),
            SqlValue::Text(value) => Some(format!("'{}'", value.replace('\'', "''"))),
            SqlValue::Uuid(value) => Some(format!("'{}'", value)),
            SqlValue::Null
            | SqlValue::Bool(_)
            | SqlValue::F32(_)
            | SqlValue::F64(_)
            | SqlValue::Timestamp(_)
            | SqlValue::Bytes(_)
            | SqlValue::Json(_) => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            SqlValue::I16(value) => Some(i64::from(*value)),
            SqlValue::I32(value) => Some(i64::from(*value)),
            SqlValue::I64(value) => Some(*value),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            SqlValue::Text(value) => Some(value),
            _ => None,
        }
    }

    pub fn as_uuid(&self) -> Option<Uuid> {
        match self {
            SqlValue::Uuid(value) => Some(*value),
            _ => None,
        }
    }
}

impl ToSql for SqlValue {
    fn to_sql(
        &self,
        _ty: &PgType,
        out: &mut BytesMut,
    ) -> Result<IsNull, Box<dyn std::error::Error + Sync + Send>> {
        match self {
            SqlValue::Null => Ok(IsNull::Yes),
            SqlValue::Bool(value) => bool::to_sql(value, _ty, out),
            SqlValue::I16(value) => i16::to_sql(value, _ty, out),
            SqlValue::I32(value) => i32::to_sql(value, _ty, out),
            SqlValue::I64(value) => i64::to_sql(value, _ty, out),
            SqlValue::F32(value) => f32::to_sql(value, _ty, out),
            SqlValue::F64(value) => f64::to_sql(value, _ty, out),
            SqlValue::Numeric(value) => Decimal::to_sql(value, _ty, out),
            SqlValue::Text(value) => String::to_sql(value, _ty, out),
            SqlValue::Uuid(value) => Uuid::to_sql(value, _ty, out),
            SqlValue::Timestamp(value) => DateTime::<Utc>::to_sql(value, _ty, out),
            SqlValue::Bytes(value) => {
                out.extend_from_slice(value);
                Ok(IsNull::No)
            }
            SqlValue::Json(value) => serde_json::Value::to_sql(value, _ty, out),
        }
    }

    fn accepts(_ty: &PgType) -> bool {
        true // We accept all types
    }

    to_sql_checked!();
}

impl From<bool> for SqlValue {
    fn from(value: bool) -> Self {
        SqlValue::Bool(value)
    }
}

impl From<i16> for SqlValue {
    fn from(value: i16) -> Self {
        SqlValue::I16(value)
    }
}

impl From<i32> for SqlValue {
    fn from(value: i32) -> Self {
        SqlValue::I32(value)
    }
}

impl From<i64> for SqlValue {
    fn from(value: i64) -> Self {
        SqlValue::I64(value)
    }
}

impl From<f32> for SqlValue {
    fn from(value: f32) -> Self {
        SqlValue::F32(value)
    }
}

impl From<f64> for SqlValue {
    fn from(value: f64) -> Self {
        SqlValue::F64(value)
    }
}

impl From<Decimal> for SqlValue {
    fn from(value: Decimal) -> Self {
        SqlValue::Numeric(value)
    }
}

impl From<String> for SqlValue {
    fn from(value: String) -> Self {
        SqlValue::Text(value)
    }
}

impl From<&str> for SqlValue {
    fn from(value: &str) -> Self {
        SqlValue::Text(value.to_string())
    }
}

impl From<Uuid> for SqlValue {
    fn from(value: Uuid) -> Self {
        SqlValue::Uuid(value)
    }
}

impl From<DateTime<Utc>> for SqlValue {
    fn from(value: DateTime<Utc>) -> Self {
        SqlValue::Timestamp(value)
    }
}

impl From<Vec<u8>> for SqlValue {
    fn from(value: Vec<u8>) -> Self {
        SqlValue::Bytes(value)
    }
}

impl From<serde_json::Value> for SqlValue {
    fn from(value: serde_json::Value) -> Self {
        SqlValue::Json(value)
    }
}

impl<V: Into<SqlValue>> From<Option<V>> for SqlValue {
    fn from(value: Option<V>) -> Self {
        match value {
            Some(value) => value.into(),
            None => SqlValue::Null,
        }
    }
}
