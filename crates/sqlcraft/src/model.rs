//! The model contract implemented by generated code.

use crate::error::SchemaError;
use crate::row::FromRow;
use crate::schema::{FieldDef, Schema};

/// A table-backed record type.
///
/// Generated builders implement this for each model; hand-written
/// implementations work the same way.
pub trait Model: FromRow + Send + Sync {
    /// Model name, used in errors.
    const MODEL: &'static str;
    /// Table name.
    const TABLE: &'static str;
    /// Column ordered by `first`/`last`. Defaults to `id` or the first field.
    const PRIMARY_KEY: Option<&'static str> = None;

    /// `(name, type, column)` triples, in declaration order.
    fn fields() -> Vec<FieldDef>;

    /// Resolve the model's schema.
    fn schema() -> Result<Schema, SchemaError> {
        let schema = Schema::resolve(Self::MODEL, Self::TABLE, Self::fields())?;
        match Self::PRIMARY_KEY {
            Some(pk) => schema.with_primary_key(pk),
            None => Ok(schema),
        }
    }
}
