//! Query renderer: one printer per mode, placeholders from the dialect.
//!
//! The renderer walks the clause lists of a [`Query`] once, left to right,
//! binding each argument into a [`Bindings`] accumulator as its placeholder is
//! written. The returned argument list therefore always matches placeholder
//! order in the text (`SET` arguments before `WHERE` arguments).

use crate::assemble;
use crate::clause::{Operand, Operator, WhereClause};
use crate::dialect::{Bindings, Dialect};
use crate::error::RenderError;
use crate::query::{Mode, Query};

/// Rendered SQL text plus its arguments in placeholder order.
#[derive(Debug, Clone, PartialEq)]
pub struct Rendered<A> {
    pub sql: String,
    pub args: Vec<A>,
}

impl<A> Rendered<A> {
    pub fn into_parts(self) -> (String, Vec<A>) {
        (self.sql, self.args)
    }
}

/// Renders [`Query`] values for one dialect. Cheap to construct; build one
/// wherever it is needed.
#[derive(Debug, Clone, Copy, Default)]
pub struct Renderer {
    dialect: Dialect,
}

impl Renderer {
    pub fn new(dialect: Dialect) -> Self {
        Self { dialect }
    }

    pub fn dialect(&self) -> Dialect {
        self.dialect
    }

    pub fn render<A: Clone>(&self, query: &Query<A>) -> Result<Rendered<A>, RenderError> {
        check_clauses(query)?;

        let mut bindings = Bindings::new(self.dialect);
        let sql = match query.mode() {
            Mode::Select => render_select(query, &mut bindings),
            Mode::Update => render_update(query, &mut bindings),
            Mode::Delete => render_delete(query, &mut bindings),
            Mode::Insert => render_insert(query, &mut bindings),
        };

        Ok(Rendered {
            sql,
            args: bindings.into_args(),
        })
    }
}

/// Reject clause kinds the query mode cannot carry.
fn check_clauses<A>(query: &Query<A>) -> Result<(), RenderError> {
    let mode = query.mode();
    let not_allowed = |clause: &'static str| RenderError::ClauseNotAllowed { clause, mode };

    if mode != Mode::Select {
        if query.alias().is_some() {
            return Err(not_allowed("table alias"));
        }
        if !query.projection().is_empty() {
            return Err(not_allowed("column projection"));
        }
        if !query.joins().is_empty() {
            return Err(not_allowed("JOIN"));
        }
        if !query.aggregates().is_empty() {
            return Err(not_allowed("aggregate"));
        }
        if !query.orders().is_empty() {
            return Err(not_allowed("ORDER BY"));
        }
        if query.limit_value().is_some() {
            return Err(not_allowed("LIMIT"));
        }
        if query.offset_value().is_some() {
            return Err(not_allowed("OFFSET"));
        }
    }

    match mode {
        Mode::Select | Mode::Delete if !query.sets().is_empty() => Err(not_allowed("SET")),
        Mode::Update | Mode::Insert if query.sets().is_empty() => {
            Err(RenderError::EmptySet(query.table().to_string()))
        }
        Mode::Insert if !query.wheres().is_empty() => Err(not_allowed("WHERE")),
        _ => Ok(()),
    }
}

fn render_select<A: Clone>(query: &Query<A>, bindings: &mut Bindings<A>) -> String {
    let columns = if !query.aggregates().is_empty() {
        query
            .aggregates()
            .iter()
            .map(assemble::render_aggregate)
            .collect::<Vec<_>>()
            .join(", ")
    } else if !query.projection().is_empty() {
        query
            .projection()
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(", ")
    } else {
        "*".to_string()
    };

    let mut sql = format!("SELECT {} FROM {}", columns, query.table());
    if let Some(alias) = query.alias() {
        sql.push_str(" AS ");
        sql.push_str(alias);
    }

    for join in query.joins() {
        sql.push(' ');
        sql.push_str(&assemble::render_join(join));
    }

    push_where(&mut sql, query, bindings);

    let groups = assemble::group_columns(query.aggregates());
    if !groups.is_empty() {
        sql.push_str(" GROUP BY ");
        sql.push_str(
            &groups
                .iter()
                .map(ToString::to_string)
                .collect::<Vec<_>>()
                .join(", "),
        );
    }

    if !query.orders().is_empty() {
        sql.push_str(" ORDER BY ");
        sql.push_str(
            &query
                .orders()
                .iter()
                .map(|o| format!("{} {}", o.column, o.direction.as_sql()))
                .collect::<Vec<_>>()
                .join(", "),
        );
    }

    if let Some(limit) = query.limit_value() {
        sql.push_str(&format!(" LIMIT {limit}"));
    }
    if let Some(offset) = query.offset_value() {
        sql.push_str(&format!(" OFFSET {offset}"));
    }

    sql
}

fn render_update<A: Clone>(query: &Query<A>, bindings: &mut Bindings<A>) -> String {
    let sets = query
        .sets()
        .iter()
        .map(|s| format!("{} = {}", s.column, bindings.bind(query.set_args()[s.slot].clone())))
        .collect::<Vec<_>>()
        .join(", ");

    let mut sql = format!("UPDATE {} SET {}", query.table(), sets);
    push_where(&mut sql, query, bindings);
    sql
}

fn render_delete<A: Clone>(query: &Query<A>, bindings: &mut Bindings<A>) -> String {
    let mut sql = format!("DELETE FROM {}", query.table());
    push_where(&mut sql, query, bindings);
    sql
}

fn render_insert<A: Clone>(query: &Query<A>, bindings: &mut Bindings<A>) -> String {
    let mut columns = Vec::with_capacity(query.sets().len());
    let mut placeholders = Vec::with_capacity(query.sets().len());
    for set in query.sets() {
        columns.push(set.column.to_string());
        placeholders.push(bindings.bind(query.set_args()[set.slot].clone()));
    }
    format!(
        "INSERT INTO {} ({}) VALUES ({})",
        query.table(),
        columns.join(", "),
        placeholders.join(", ")
    )
}

fn push_where<A: Clone>(sql: &mut String, query: &Query<A>, bindings: &mut Bindings<A>) {
    if query.wheres().is_empty() {
        return;
    }
    let conditions = query
        .wheres()
        .iter()
        .map(|w| render_condition(w, query.where_args(), bindings))
        .collect::<Vec<_>>();
    sql.push_str(" WHERE ");
    sql.push_str(&conditions.join(" AND "));
}

fn render_condition<A: Clone>(
    clause: &WhereClause,
    args: &[A],
    bindings: &mut Bindings<A>,
) -> String {
    match &clause.operand {
        Operand::None => format!("{} {}", clause.column, clause.op.as_sql()),
        Operand::Slot(slot) => format!(
            "{} {} {}",
            clause.column,
            clause.op.as_sql(),
            bindings.bind(args[*slot].clone())
        ),
        Operand::Slots(range) if range.is_empty() => match clause.op {
            Operator::NotIn => "1=1".to_string(),
            _ => "1=0".to_string(),
        },
        Operand::Slots(range) => {
            let placeholders = args[range.clone()]
                .iter()
                .map(|a| bindings.bind(a.clone()))
                .collect::<Vec<_>>();
            format!(
                "{} {} ({})",
                clause.column,
                clause.op.as_sql(),
                placeholders.join(", ")
            )
        }
    }
}

#[cfg(test)]
mod tests;
