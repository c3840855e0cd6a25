//! Row mapping traits and utilities

use crate::error::{CraftError, CraftResult};
use crate::value::{FromValue, Value};

/// A dialect-neutral result row: column names paired with values.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Row {
    columns: Vec<String>,
    values: Vec<Value>,
}

impl Row {
    /// Create an empty row.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a column (builder style, handy for tests and drivers).
    pub fn with(mut self, column: impl Into<String>, value: impl Into<Value>) -> Self {
        self.push(column, value);
        self
    }

    pub fn push(&mut self, column: impl Into<String>, value: impl Into<Value>) {
        self.columns.push(column.into());
        self.values.push(value.into());
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Raw value of a column, if present.
    pub fn value(&self, column: &str) -> Option<&Value> {
        self.columns
            .iter()
            .position(|c| c == column)
            .map(|idx| &self.values[idx])
    }

    /// Decode a column into `T`.
    pub fn try_get<T: FromValue>(&self, column: &str) -> CraftResult<T> {
        let value = self
            .value(column)
            .ok_or_else(|| CraftError::decode(column, "column not present in row"))?;
        T::from_value(column, value)
    }
}

/// Trait for types that can be constructed from a result [`Row`].
pub trait FromRow: Sized {
    fn from_row(row: &Row) -> CraftResult<Self>;
}

impl FromRow for Row {
    fn from_row(row: &Row) -> CraftResult<Self> {
        Ok(row.clone())
    }
}

#[cfg(feature = "postgres")]
impl TryFrom<&tokio_postgres::Row> for Row {
    type Error = CraftError;

    fn try_from(row: &tokio_postgres::Row) -> CraftResult<Self> {
        use tokio_postgres::types::Type;

        fn get<'a, T: tokio_postgres::types::FromSql<'a>>(
            row: &'a tokio_postgres::Row,
            idx: usize,
            name: &str,
        ) -> CraftResult<Option<T>> {
            row.try_get::<_, Option<T>>(idx)
                .map_err(|e| CraftError::decode(name, e.to_string()))
        }

        let mut out = Row::new();
        for (idx, col) in row.columns().iter().enumerate() {
            let name = col.name();
            let value: Value = match *col.type_() {
                Type::BOOL => get::<bool>(row, idx, name)?.into(),
                Type::INT2 => get::<i16>(row, idx, name)?.into(),
                Type::INT4 => get::<i32>(row, idx, name)?.into(),
                Type::INT8 => get::<i64>(row, idx, name)?.into(),
                Type::FLOAT4 => get::<f32>(row, idx, name)?.into(),
                Type::FLOAT8 => get::<f64>(row, idx, name)?.into(),
                Type::NUMERIC => get::<rust_decimal::Decimal>(row, idx, name)?.into(),
                Type::BYTEA => get::<Vec<u8>>(row, idx, name)?.into(),
                Type::UUID => get::<uuid::Uuid>(row, idx, name)?.into(),
                Type::TIMESTAMPTZ => get::<chrono::DateTime<chrono::Utc>>(row, idx, name)?.into(),
                Type::TIMESTAMP => get::<chrono::NaiveDateTime>(row, idx, name)?.into(),
                Type::DATE => get::<chrono::NaiveDate>(row, idx, name)?.into(),
                Type::JSON | Type::JSONB => get::<serde_json::Value>(row, idx, name)?.into(),
                Type::TEXT | Type::VARCHAR | Type::BPCHAR | Type::NAME => {
                    get::<String>(row, idx, name)?.into()
                }
                ref other => {
                    return Err(CraftError::decode(
                        name,
                        format!("unsupported postgres type {other}"),
                    ));
                }
            };
            out.push(name, value);
        }
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn try_get_by_column_name() {
        let row = Row::new().with("id", 1i64).with("name", "alice");
        assert_eq!(row.try_get::<i64>("id").unwrap(), 1);
        assert_eq!(row.try_get::<String>("name").unwrap(), "alice");
        assert_eq!(row.len(), 2);
    }

    #[test]
    fn missing_column_is_decode_error() {
        let row = Row::new().with("id", 1i64);
        let err = row.try_get::<i64>("age").unwrap_err();
        assert!(matches!(err, CraftError::Decode { ref column, .. } if column == "age"));
    }
}
