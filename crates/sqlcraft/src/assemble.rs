//! Join and aggregate assembly.
//!
//! Resolves join/aggregate requests against the schemas involved and renders
//! the resulting fragments. Joins compose in caller order; aggregates replace
//! the projection; group-by columns are unioned across aggregates.

use crate::clause::{AggregateFunc, AggregateSpec, JoinKind, JoinSpec};
use crate::error::SchemaError;
use crate::schema::{ColumnRef, Schema};

/// Default alias for a table: its first character.
///
/// When that collides with `taken`, the first two characters are used.
pub fn default_alias(table: &str, taken: Option<&str>) -> String {
    let one: String = table.chars().take(1).collect();
    match taken {
        Some(t) if t == one => table.chars().take(2).collect(),
        _ => one,
    }
}

/// One side of a join: a schema, the alias it is known by and a column.
#[derive(Debug, Clone, Copy)]
pub struct JoinSide<'a> {
    pub schema: &'a Schema,
    pub alias: &'a str,
    pub column: &'a str,
}

impl<'a> JoinSide<'a> {
    pub fn new(schema: &'a Schema, alias: &'a str, column: &'a str) -> Self {
        Self {
            schema,
            alias,
            column,
        }
    }

    fn resolve(&self) -> Result<ColumnRef, SchemaError> {
        self.schema.qualified(self.alias, self.column)
    }
}

/// Resolve a join of `target` onto `source`.
///
/// Both columns are validated even for natural/cross joins, which then drop
/// the `ON` condition.
pub fn join(
    kind: JoinKind,
    source: JoinSide<'_>,
    target: JoinSide<'_>,
) -> Result<JoinSpec, SchemaError> {
    let on = (source.resolve()?, target.resolve()?);
    Ok(JoinSpec {
        kind,
        table: target.schema.table().to_string(),
        alias: target.alias.to_string(),
        on: kind.needs_on().then_some(on),
    })
}

/// Natural or cross join without any column condition.
pub fn join_without_condition(kind: JoinKind, target: &Schema, alias: &str) -> JoinSpec {
    JoinSpec {
        kind,
        table: target.table().to_string(),
        alias: alias.to_string(),
        on: None,
    }
}

/// Resolve `{func}({column}) AS {alias}` with optional group columns.
///
/// `qualifier` qualifies both the aggregated column and the group columns.
pub fn aggregate(
    schema: &Schema,
    qualifier: Option<&str>,
    func: AggregateFunc,
    column: &str,
    alias: &str,
    group_by: &[&str],
) -> Result<AggregateSpec, SchemaError> {
    let resolve = |c: &str| match qualifier {
        Some(q) => schema.qualified(q, c),
        None => schema.column(c),
    };

    Ok(AggregateSpec {
        func,
        column: resolve(column)?,
        alias: alias.to_string(),
        group_by: group_by
            .iter()
            .map(|c| resolve(*c))
            .collect::<Result<Vec<_>, _>>()?,
    })
}

/// Union of group columns across aggregates, first-appearance order.
pub fn group_columns(aggregates: &[AggregateSpec]) -> Vec<&ColumnRef> {
    let mut out: Vec<&ColumnRef> = Vec::new();
    for column in aggregates.iter().flat_map(|a| a.group_by.iter()) {
        if !out.contains(&column) {
            out.push(column);
        }
    }
    out
}

pub fn render_join(spec: &JoinSpec) -> String {
    let mut sql = format!("{} {} AS {}", spec.kind.as_sql(), spec.table, spec.alias);
    if let Some((source, target)) = &spec.on {
        sql.push_str(&format!(" ON {source} = {target}"));
    }
    sql
}

pub fn render_aggregate(spec: &AggregateSpec) -> String {
    format!("{}({}) AS {}", spec.func.as_sql(), spec.column, spec.alias)
}
