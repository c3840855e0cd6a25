//! Runtime fluent query builder.
//!
//! [`QueryBuilder`] is the per-query accumulator generated builders delegate
//! to. It starts in select mode and switches to update mode on the first
//! [`set`](QueryBuilder::set). Column errors are recorded on first failure and
//! reported by [`render`](QueryBuilder::render) or by the finisher.
//!
//! ```ignore
//! use sqlcraft::{Dialect, QueryBuilder};
//!
//! let adults: Vec<User> = QueryBuilder::<User>::new(Dialect::Postgres)
//!     .gte("age", 18)
//!     .order_by_desc("id")
//!     .limit(10)
//!     .fetch(&client)
//!     .await?;
//!
//! let touched = QueryBuilder::<User>::new(Dialect::Postgres)
//!     .set("age", 11)
//!     .gt("age", 10)
//!     .update(&client)
//!     .await?;
//! ```
//!
//! Every finisher takes the builder by value: one builder, one statement.

use crate::client::GenericClient;
use crate::clause::{Direction, Op};
use crate::dialect::Dialect;
use crate::error::{CraftError, CraftResult, SchemaError, ValidationError};
use crate::model::Model;
use crate::query::{Mode, Query};
use crate::render::{Rendered, Renderer};
use crate::row::Row;
use crate::schema::Schema;
use crate::value::Value;
use std::marker::PhantomData;

/// Fluent builder over a [`Model`]'s table.
pub struct QueryBuilder<M: Model> {
    schema: Option<Schema>,
    query: Query<Value>,
    dialect: Dialect,
    build_error: Option<SchemaError>,
    _model: PhantomData<fn() -> M>,
}

impl<M: Model> QueryBuilder<M> {
    pub fn new(dialect: Dialect) -> Self {
        let query = Query::new(Mode::Select, M::TABLE);
        match M::schema() {
            Ok(schema) => Self {
                schema: Some(schema),
                query,
                dialect,
                build_error: None,
                _model: PhantomData,
            },
            Err(e) => Self {
                schema: None,
                query,
                dialect,
                build_error: Some(e),
                _model: PhantomData,
            },
        }
    }

    pub fn dialect(&self) -> Dialect {
        self.dialect
    }

    pub fn mode(&self) -> Mode {
        self.query.mode()
    }

    /// Apply a clause change; the first error sticks and later calls are no-ops.
    fn apply(
        mut self,
        f: impl FnOnce(&mut Query<Value>, &Schema) -> Result<(), SchemaError>,
    ) -> Self {
        if self.build_error.is_some() {
            return self;
        }
        if let Some(schema) = &self.schema {
            if let Err(e) = f(&mut self.query, schema) {
                self.build_error = Some(e);
            }
        }
        self
    }

    // ==================== WHERE ====================

    /// Add `column op operand`.
    pub fn filter(self, column: &str, op: Op<Value>) -> Self {
        self.apply(|q, s| q.filter(s, column, op).map(|_| ()))
    }

    pub fn eq(self, column: &str, value: impl Into<Value>) -> Self {
        self.filter(column, Op::Eq(value.into()))
    }

    pub fn ne(self, column: &str, value: impl Into<Value>) -> Self {
        self.filter(column, Op::Ne(value.into()))
    }

    pub fn gt(self, column: &str, value: impl Into<Value>) -> Self {
        self.filter(column, Op::Gt(value.into()))
    }

    pub fn gte(self, column: &str, value: impl Into<Value>) -> Self {
        self.filter(column, Op::Gte(value.into()))
    }

    pub fn lt(self, column: &str, value: impl Into<Value>) -> Self {
        self.filter(column, Op::Lt(value.into()))
    }

    pub fn lte(self, column: &str, value: impl Into<Value>) -> Self {
        self.filter(column, Op::Lte(value.into()))
    }

    pub fn in_list<V: Into<Value>>(self, column: &str, values: impl IntoIterator<Item = V>) -> Self {
        self.filter(column, Op::in_list(values))
    }

    pub fn not_in<V: Into<Value>>(self, column: &str, values: impl IntoIterator<Item = V>) -> Self {
        self.filter(column, Op::not_in(values))
    }

    pub fn is_null(self, column: &str) -> Self {
        self.filter(column, Op::IsNull)
    }

    pub fn is_not_null(self, column: &str) -> Self {
        self.filter(column, Op::IsNotNull)
    }

    // ==================== SET ====================

    /// Assign a column; switches the builder to update mode.
    pub fn set(mut self, column: &str, value: impl Into<Value>) -> Self {
        self.query.set_mode(Mode::Update);
        let value = value.into();
        self.apply(|q, s| q.assign(s, column, value).map(|_| ()))
    }

    // ==================== SELECT ====================

    /// Project explicit columns instead of `*`.
    pub fn select<'a>(self, columns: impl IntoIterator<Item = &'a str>) -> Self {
        self.apply(|q, s| q.project(s, columns).map(|_| ()))
    }

    /// Drop any projection and select `*` again.
    pub fn select_all(mut self) -> Self {
        self.query.clear_projection();
        self
    }

    pub fn order_by(self, column: &str, direction: Direction) -> Self {
        self.apply(|q, s| q.order_by(s, column, direction).map(|_| ()))
    }

    pub fn order_by_asc(self, column: &str) -> Self {
        self.order_by(column, Direction::Asc)
    }

    pub fn order_by_desc(self, column: &str) -> Self {
        self.order_by(column, Direction::Desc)
    }

    pub fn limit(mut self, n: u64) -> Self {
        self.query.limit(n);
        self
    }

    pub fn offset(mut self, n: u64) -> Self {
        self.query.offset(n);
        self
    }

    // ==================== Build ====================

    /// Render the accumulated query for the current mode.
    pub fn render(&self) -> CraftResult<Rendered<Value>> {
        if let Some(err) = &self.build_error {
            return Err(err.clone().into());
        }
        Ok(Renderer::new(self.dialect).render(&self.query)?)
    }

    fn render_as(mut self, mode: Mode) -> CraftResult<Rendered<Value>> {
        self.query.set_mode(mode);
        let rendered = self.render()?;
        trace_statement::<M>(self.dialect, mode, &rendered);
        Ok(rendered)
    }

    fn ordered_by_primary_key(mut self, direction: Direction, finisher: &str) -> CraftResult<Self> {
        let pk = self
            .schema
            .as_ref()
            .and_then(|s| s.primary_key())
            .map(str::to_string);
        match pk {
            Some(pk) => {
                self.query.clear_order();
                self.query.limit(1);
                Ok(self.order_by(&pk, direction))
            }
            // Schema failures take precedence over the missing key.
            None if self.build_error.is_some() => Ok(self),
            None => Err(ValidationError::invalid(
                finisher,
                format!("{} has no primary key", M::MODEL),
            )
            .into()),
        }
    }

    // ==================== Finishers ====================

    /// Run as SELECT and map every row.
    pub async fn fetch(self, client: &impl GenericClient) -> CraftResult<Vec<M>> {
        let rendered = self.render_as(Mode::Select)?;
        let rows = client.query(&rendered.sql, &rendered.args).await?;
        rows.iter().map(M::from_row).collect()
    }

    /// Run as SELECT and return the raw rows, for projections that do not
    /// decode into the model.
    pub async fn fetch_rows(self, client: &impl GenericClient) -> CraftResult<Vec<Row>> {
        let rendered = self.render_as(Mode::Select)?;
        client.query(&rendered.sql, &rendered.args).await
    }

    /// First row by primary key ascending.
    pub async fn first(self, client: &impl GenericClient) -> CraftResult<M> {
        self.ordered_by_primary_key(Direction::Asc, "first")?
            .fetch_single(client)
            .await
    }

    /// Last row by primary key (descending order, limit 1).
    pub async fn last(self, client: &impl GenericClient) -> CraftResult<M> {
        self.ordered_by_primary_key(Direction::Desc, "last")?
            .fetch_single(client)
            .await
    }

    async fn fetch_single(self, client: &impl GenericClient) -> CraftResult<M> {
        let rendered = self.render_as(Mode::Select)?;
        let row = client.query_opt(&rendered.sql, &rendered.args).await?;
        match row {
            Some(row) => M::from_row(&row),
            None => Err(CraftError::not_found(format!("no {} found", M::MODEL))),
        }
    }

    /// Run as UPDATE and return the affected-row count.
    pub async fn update(self, client: &impl GenericClient) -> CraftResult<u64> {
        let rendered = self.render_as(Mode::Update)?;
        client.execute(&rendered.sql, &rendered.args).await
    }

    /// Run as DELETE and return the affected-row count.
    pub async fn delete(self, client: &impl GenericClient) -> CraftResult<u64> {
        let rendered = self.render_as(Mode::Delete)?;
        client.execute(&rendered.sql, &rendered.args).await
    }
}

#[cfg(feature = "tracing")]
fn trace_statement<M: Model>(dialect: Dialect, mode: Mode, rendered: &Rendered<Value>) {
    tracing::debug!(
        target: "sqlcraft.sql",
        model = M::MODEL,
        %dialect,
        %mode,
        arg_count = rendered.args.len(),
        sql = %rendered.sql,
    );
}

#[cfg(not(feature = "tracing"))]
fn trace_statement<M: Model>(_dialect: Dialect, _mode: Mode, _rendered: &Rendered<Value>) {}

#[cfg(test)]
mod tests;
