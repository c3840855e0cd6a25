//! The Query model: an ordered clause list plus argument sequences.

use crate::clause::{
    AggregateSpec, Direction, JoinSpec, Op, Operand, Operator, OrderSpec, SetClause, WhereClause,
};
use crate::error::{RenderError, SchemaError};
use crate::schema::{ColumnRef, Schema};
use std::fmt;
use std::str::FromStr;

/// Statement kind a [`Query`] renders as.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Mode {
    #[default]
    Select,
    Update,
    Delete,
    /// Only produced by code generation
    Insert,
}

impl Mode {
    pub fn as_str(self) -> &'static str {
        match self {
            Mode::Select => "select",
            Mode::Update => "update",
            Mode::Delete => "delete",
            Mode::Insert => "insert",
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Mode {
    type Err = RenderError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "select" => Ok(Mode::Select),
            "update" => Ok(Mode::Update),
            "delete" => Ok(Mode::Delete),
            "insert" => Ok(Mode::Insert),
            _ => Err(RenderError::UnsupportedMode(s.to_string())),
        }
    }
}

/// A structured query over one table.
///
/// `A` is the argument type: [`Value`](crate::Value) at runtime, parameter
/// expressions (`String`) when generating code.
///
/// Every column is validated against the [`Schema`] before a clause is
/// appended; a failed call leaves the query untouched.
#[derive(Debug, Clone, PartialEq)]
pub struct Query<A> {
    mode: Mode,
    table: String,
    alias: Option<String>,
    projection: Vec<ColumnRef>,
    wheres: Vec<WhereClause>,
    where_args: Vec<A>,
    sets: Vec<SetClause>,
    set_args: Vec<A>,
    joins: Vec<JoinSpec>,
    aggregates: Vec<AggregateSpec>,
    orders: Vec<OrderSpec>,
    limit: Option<u64>,
    offset: Option<u64>,
}

impl<A> Query<A> {
    pub fn new(mode: Mode, table: impl Into<String>) -> Self {
        Self {
            mode,
            table: table.into(),
            alias: None,
            projection: Vec::new(),
            wheres: Vec::new(),
            where_args: Vec::new(),
            sets: Vec::new(),
            set_args: Vec::new(),
            joins: Vec::new(),
            aggregates: Vec::new(),
            orders: Vec::new(),
            limit: None,
            offset: None,
        }
    }

    pub fn select(schema: &Schema) -> Self {
        Self::new(Mode::Select, schema.table())
    }

    pub fn update(schema: &Schema) -> Self {
        Self::new(Mode::Update, schema.table())
    }

    pub fn delete(schema: &Schema) -> Self {
        Self::new(Mode::Delete, schema.table())
    }

    pub fn insert(schema: &Schema) -> Self {
        Self::new(Mode::Insert, schema.table())
    }

    /// Alias the main table; subsequent columns are qualified with it.
    pub fn with_alias(mut self, alias: impl Into<String>) -> Self {
        self.alias = Some(alias.into());
        self
    }

    pub fn set_mode(&mut self, mode: Mode) {
        self.mode = mode;
    }

    fn resolve(&self, schema: &Schema, column: &str) -> Result<ColumnRef, SchemaError> {
        match &self.alias {
            Some(alias) => schema.qualified(alias, column),
            None => schema.column(column),
        }
    }

    /// Append `column op operand` to the where list.
    pub fn filter(
        &mut self,
        schema: &Schema,
        column: &str,
        op: Op<A>,
    ) -> Result<&mut Self, SchemaError> {
        let column = self.resolve(schema, column)?;
        let (op, args) = op.into_parts();
        if op.is_range() {
            schema.require_comparable(column.column(), op.as_sql())?;
        }

        let start = self.where_args.len();
        let operand = match op {
            Operator::IsNull | Operator::IsNotNull => Operand::None,
            Operator::In | Operator::NotIn => Operand::Slots(start..start + args.len()),
            _ => Operand::Slot(start),
        };
        self.where_args.extend(args);
        self.wheres.push(WhereClause {
            column,
            op,
            operand,
        });
        Ok(self)
    }

    /// Append `column = value` to the set list.
    pub fn assign(
        &mut self,
        schema: &Schema,
        column: &str,
        value: impl Into<A>,
    ) -> Result<&mut Self, SchemaError> {
        // SET targets are never qualified.
        let column = schema.column(column)?;
        self.set_args.push(value.into());
        self.sets.push(SetClause {
            column,
            slot: self.set_args.len() - 1,
        });
        Ok(self)
    }

    /// Replace `*` with explicit columns.
    pub fn project<'a>(
        &mut self,
        schema: &Schema,
        columns: impl IntoIterator<Item = &'a str>,
    ) -> Result<&mut Self, SchemaError> {
        let resolved = columns
            .into_iter()
            .map(|c| self.resolve(schema, c))
            .collect::<Result<Vec<_>, _>>()?;
        self.projection.extend(resolved);
        Ok(self)
    }

    pub fn order_by(
        &mut self,
        schema: &Schema,
        column: &str,
        direction: Direction,
    ) -> Result<&mut Self, SchemaError> {
        let column = self.resolve(schema, column)?;
        self.orders.push(OrderSpec { column, direction });
        Ok(self)
    }

    pub fn join(&mut self, spec: JoinSpec) -> &mut Self {
        self.joins.push(spec);
        self
    }

    pub fn aggregate(&mut self, spec: AggregateSpec) -> &mut Self {
        self.aggregates.push(spec);
        self
    }

    pub fn limit(&mut self, n: u64) -> &mut Self {
        self.limit = Some(n);
        self
    }

    pub fn offset(&mut self, n: u64) -> &mut Self {
        self.offset = Some(n);
        self
    }

    /// Back to `*`.
    pub fn clear_projection(&mut self) -> &mut Self {
        self.projection.clear();
        self
    }

    /// Drop ordering, e.g. before `first`/`last` force their own.
    pub fn clear_order(&mut self) -> &mut Self {
        self.orders.clear();
        self
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn table(&self) -> &str {
        &self.table
    }

    pub fn alias(&self) -> Option<&str> {
        self.alias.as_deref()
    }

    pub fn projection(&self) -> &[ColumnRef] {
        &self.projection
    }

    pub fn wheres(&self) -> &[WhereClause] {
        &self.wheres
    }

    pub fn where_args(&self) -> &[A] {
        &self.where_args
    }

    pub fn sets(&self) -> &[SetClause] {
        &self.sets
    }

    pub fn set_args(&self) -> &[A] {
        &self.set_args
    }

    pub fn joins(&self) -> &[JoinSpec] {
        &self.joins
    }

    pub fn aggregates(&self) -> &[AggregateSpec] {
        &self.aggregates
    }

    pub fn orders(&self) -> &[OrderSpec] {
        &self.orders
    }

    pub fn limit_value(&self) -> Option<u64> {
        self.limit
    }

    pub fn offset_value(&self) -> Option<u64> {
        self.offset
    }
}
