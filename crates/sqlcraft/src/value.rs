//! Dialect-neutral argument and column values.
//!
//! Runtime queries carry [`Value`]s in their argument sequences; rows coming
//! back from a [`GenericClient`](crate::GenericClient) hold them too. The
//! [`FromValue`] trait maps them back into Rust types for model decoding.

use crate::error::{CraftError, CraftResult};
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;

/// A single SQL argument or column value.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Decimal(Decimal),
    Text(String),
    Bytes(Vec<u8>),
    Uuid(uuid::Uuid),
    Timestamp(DateTime<Utc>),
    Date(NaiveDate),
    Json(serde_json::Value),
}

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Short type name used in decode errors.
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "bool",
            Value::Int(_) => "int",
            Value::Float(_) => "float",
            Value::Decimal(_) => "decimal",
            Value::Text(_) => "text",
            Value::Bytes(_) => "bytes",
            Value::Uuid(_) => "uuid",
            Value::Timestamp(_) => "timestamp",
            Value::Date(_) => "date",
            Value::Json(_) => "json",
        }
    }
}

macro_rules! impl_from_int {
    ($($t:ty),*) => {
        $(
            impl From<$t> for Value {
                fn from(v: $t) -> Self {
                    Value::Int(i64::from(v))
                }
            }
        )*
    };
}

impl_from_int!(i8, i16, i32, i64, u8, u16, u32);

impl From<f32> for Value {
    fn from(v: f32) -> Self {
        Value::Float(f64::from(v))
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Float(v)
    }
}

impl From<Decimal> for Value {
    fn from(v: Decimal) -> Self {
        Value::Decimal(v)
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::Text(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Text(v.to_string())
    }
}

impl From<&String> for Value {
    fn from(v: &String) -> Self {
        Value::Text(v.clone())
    }
}

impl From<Vec<u8>> for Value {
    fn from(v: Vec<u8>) -> Self {
        Value::Bytes(v)
    }
}

impl From<uuid::Uuid> for Value {
    fn from(v: uuid::Uuid) -> Self {
        Value::Uuid(v)
    }
}

impl From<DateTime<Utc>> for Value {
    fn from(v: DateTime<Utc>) -> Self {
        Value::Timestamp(v)
    }
}

impl From<NaiveDateTime> for Value {
    fn from(v: NaiveDateTime) -> Self {
        Value::Timestamp(v.and_utc())
    }
}

impl From<NaiveDate> for Value {
    fn from(v: NaiveDate) -> Self {
        Value::Date(v)
    }
}

impl From<serde_json::Value> for Value {
    fn from(v: serde_json::Value) -> Self {
        Value::Json(v)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        match v {
            Some(v) => v.into(),
            None => Value::Null,
        }
    }
}

/// Conversion from a column [`Value`] into a Rust type.
pub trait FromValue: Sized {
    fn from_value(column: &str, value: &Value) -> CraftResult<Self>;
}

fn mismatch(column: &str, expected: &str, got: &Value) -> CraftError {
    CraftError::decode(
        column,
        format!("expected {expected}, got {}", got.type_name()),
    )
}

macro_rules! impl_from_value_int {
    ($($t:ty),*) => {
        $(
            impl FromValue for $t {
                fn from_value(column: &str, value: &Value) -> CraftResult<Self> {
                    match value {
                        Value::Int(v) => <$t>::try_from(*v).map_err(|e| CraftError::decode(column, e.to_string())),
                        other => Err(mismatch(column, stringify!($t), other)),
                    }
                }
            }
        )*
    };
}

impl_from_value_int!(i8, i16, i32, i64, u8, u16, u32, u64);

impl FromValue for f64 {
    fn from_value(column: &str, value: &Value) -> CraftResult<Self> {
        match value {
            Value::Float(v) => Ok(*v),
            Value::Int(v) => Ok(*v as f64),
            // Postgres returns NUMERIC for SUM/AVG over integer columns.
            Value::Decimal(v) => v
                .to_f64()
                .ok_or_else(|| CraftError::decode(column, format!("{v} does not fit in f64"))),
            other => Err(mismatch(column, "f64", other)),
        }
    }
}

impl FromValue for f32 {
    fn from_value(column: &str, value: &Value) -> CraftResult<Self> {
        f64::from_value(column, value).map(|v| v as f32)
    }
}

impl FromValue for Decimal {
    fn from_value(column: &str, value: &Value) -> CraftResult<Self> {
        match value {
            Value::Decimal(v) => Ok(*v),
            Value::Int(v) => Ok(Decimal::from(*v)),
            Value::Float(v) => {
                Decimal::try_from(*v).map_err(|e| CraftError::decode(column, e.to_string()))
            }
            Value::Text(v) => v
                .parse()
                .map_err(|e: rust_decimal::Error| CraftError::decode(column, e.to_string())),
            other => Err(mismatch(column, "decimal", other)),
        }
    }
}

impl FromValue for bool {
    fn from_value(column: &str, value: &Value) -> CraftResult<Self> {
        match value {
            Value::Bool(v) => Ok(*v),
            // MySQL and SQLite report booleans as integers.
            Value::Int(v) => Ok(*v != 0),
            other => Err(mismatch(column, "bool", other)),
        }
    }
}

impl FromValue for String {
    fn from_value(column: &str, value: &Value) -> CraftResult<Self> {
        match value {
            Value::Text(v) => Ok(v.clone()),
            other => Err(mismatch(column, "text", other)),
        }
    }
}

impl FromValue for Vec<u8> {
    fn from_value(column: &str, value: &Value) -> CraftResult<Self> {
        match value {
            Value::Bytes(v) => Ok(v.clone()),
            other => Err(mismatch(column, "bytes", other)),
        }
    }
}

impl FromValue for uuid::Uuid {
    fn from_value(column: &str, value: &Value) -> CraftResult<Self> {
        match value {
            Value::Uuid(v) => Ok(*v),
            Value::Text(v) => {
                uuid::Uuid::parse_str(v).map_err(|e| CraftError::decode(column, e.to_string()))
            }
            other => Err(mismatch(column, "uuid", other)),
        }
    }
}

impl FromValue for DateTime<Utc> {
    fn from_value(column: &str, value: &Value) -> CraftResult<Self> {
        match value {
            Value::Timestamp(v) => Ok(*v),
            other => Err(mismatch(column, "timestamp", other)),
        }
    }
}

impl FromValue for NaiveDateTime {
    fn from_value(column: &str, value: &Value) -> CraftResult<Self> {
        DateTime::<Utc>::from_value(column, value).map(|v| v.naive_utc())
    }
}

impl FromValue for NaiveDate {
    fn from_value(column: &str, value: &Value) -> CraftResult<Self> {
        match value {
            Value::Date(v) => Ok(*v),
            Value::Timestamp(v) => Ok(v.date_naive()),
            other => Err(mismatch(column, "date", other)),
        }
    }
}

impl FromValue for serde_json::Value {
    fn from_value(column: &str, value: &Value) -> CraftResult<Self> {
        match value {
            Value::Json(v) => Ok(v.clone()),
            Value::Text(v) => {
                serde_json::from_str(v).map_err(|e| CraftError::decode(column, e.to_string()))
            }
            other => Err(mismatch(column, "json", other)),
        }
    }
}

impl<T: FromValue> FromValue for Option<T> {
    fn from_value(column: &str, value: &Value) -> CraftResult<Self> {
        match value {
            Value::Null => Ok(None),
            other => T::from_value(column, other).map(Some),
        }
    }
}

impl FromValue for Value {
    fn from_value(_column: &str, value: &Value) -> CraftResult<Self> {
        Ok(value.clone())
    }
}

#[cfg(feature = "postgres")]
mod pg {
    use super::Value;
    use bytes::BytesMut;
    use rust_decimal::Decimal;
    use rust_decimal::prelude::ToPrimitive;
    use std::error::Error;
    use tokio_postgres::types::{IsNull, ToSql, Type, to_sql_checked};

    impl ToSql for Value {
        fn to_sql(
            &self,
            ty: &Type,
            out: &mut BytesMut,
        ) -> Result<IsNull, Box<dyn Error + Sync + Send>> {
            match self {
                Value::Null => Ok(IsNull::Yes),
                Value::Bool(v) => v.to_sql(ty, out),
                Value::Int(v) => match *ty {
                    Type::INT2 => i16::try_from(*v)?.to_sql(ty, out),
                    Type::INT4 => i32::try_from(*v)?.to_sql(ty, out),
                    Type::FLOAT8 => (*v as f64).to_sql(ty, out),
                    Type::NUMERIC => Decimal::from(*v).to_sql(ty, out),
                    _ => v.to_sql(ty, out),
                },
                Value::Float(v) => match *ty {
                    Type::FLOAT4 => (*v as f32).to_sql(ty, out),
                    Type::NUMERIC => Decimal::try_from(*v)?.to_sql(ty, out),
                    _ => v.to_sql(ty, out),
                },
                Value::Decimal(v) => match *ty {
                    Type::FLOAT8 => v.to_f64().ok_or("numeric value out of f64 range")?.to_sql(ty, out),
                    _ => v.to_sql(ty, out),
                },
                Value::Text(v) => v.to_sql(ty, out),
                Value::Bytes(v) => v.to_sql(ty, out),
                Value::Uuid(v) => v.to_sql(ty, out),
                Value::Timestamp(v) => match *ty {
                    Type::TIMESTAMP => v.naive_utc().to_sql(ty, out),
                    _ => v.to_sql(ty, out),
                },
                Value::Date(v) => v.to_sql(ty, out),
                Value::Json(v) => v.to_sql(ty, out),
            }
        }

        fn accepts(_ty: &Type) -> bool {
            true
        }

        to_sql_checked!();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn options_become_null() {
        assert_eq!(Value::from(None::<i32>), Value::Null);
        assert_eq!(Value::from(Some(3i32)), Value::Int(3));
    }

    #[test]
    fn integer_decode_checks_range() {
        assert_eq!(i32::from_value("age", &Value::Int(11)).unwrap(), 11);
        let err = u8::from_value("age", &Value::Int(300)).unwrap_err();
        assert!(matches!(err, CraftError::Decode { .. }));
    }

    #[test]
    fn decode_reports_type_mismatch() {
        let err = String::from_value("name", &Value::Int(1)).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Decode error on column 'name': expected text, got int"
        );
    }

    #[test]
    fn numeric_aggregates_decode_as_f64() {
        let avg = Value::Decimal(Decimal::new(155, 1));
        assert_eq!(f64::from_value("avg_age", &avg).unwrap(), 15.5);
        let sum: Option<f64> = FromValue::from_value("total", &Value::from(Decimal::from(42))).unwrap();
        assert_eq!(sum, Some(42.0));
        let none: Option<f64> = FromValue::from_value("total", &Value::Null).unwrap();
        assert_eq!(none, None);
    }

    #[test]
    fn decimal_decode_accepts_numeric_sources() {
        assert_eq!(
            Decimal::from_value("price", &Value::Int(7)).unwrap(),
            Decimal::from(7)
        );
        assert_eq!(
            Decimal::from_value("price", &Value::Text("12.50".into())).unwrap(),
            Decimal::new(1250, 2)
        );
        assert!(Decimal::from_value("price", &Value::Bool(true)).is_err());
    }

    #[test]
    fn nullable_decode() {
        let v: Option<String> = FromValue::from_value("name", &Value::Null).unwrap();
        assert!(v.is_none());
        let v: Option<bool> = FromValue::from_value("flag", &Value::Int(1)).unwrap();
        assert_eq!(v, Some(true));
    }
}
