//! Structured query fragments: conditions, assignments, joins, aggregates
//! and ordering.
//!
//! Clauses hold resolved [`ColumnRef`]s and argument *slots* (indices into
//! the owning query's argument sequences), never SQL text. Text is produced
//! only by the renderer.

use crate::error::{RenderError, ValidationError};
use crate::schema::ColumnRef;
use std::fmt;
use std::ops::Range;
use std::str::FromStr;

/// Comparison operator of a [`WhereClause`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operator {
    Eq,
    Ne,
    Gt,
    Gte,
    Lt,
    Lte,
    In,
    NotIn,
    IsNull,
    IsNotNull,
}

impl Operator {
    pub fn as_sql(self) -> &'static str {
        match self {
            Operator::Eq => "=",
            Operator::Ne => "!=",
            Operator::Gt => ">",
            Operator::Gte => ">=",
            Operator::Lt => "<",
            Operator::Lte => "<=",
            Operator::In => "IN",
            Operator::NotIn => "NOT IN",
            Operator::IsNull => "IS NULL",
            Operator::IsNotNull => "IS NOT NULL",
        }
    }

    /// Ordering operators, only valid on comparable columns.
    pub fn is_range(self) -> bool {
        matches!(
            self,
            Operator::Gt | Operator::Gte | Operator::Lt | Operator::Lte
        )
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_sql())
    }
}

impl FromStr for Operator {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.split_whitespace().collect::<Vec<_>>().join(" ");
        match normalized.to_ascii_lowercase().as_str() {
            "=" | "==" | "eq" => Ok(Operator::Eq),
            "!=" | "<>" | "ne" => Ok(Operator::Ne),
            ">" | "gt" => Ok(Operator::Gt),
            ">=" | "gte" => Ok(Operator::Gte),
            "<" | "lt" => Ok(Operator::Lt),
            "<=" | "lte" => Ok(Operator::Lte),
            "in" => Ok(Operator::In),
            "not in" => Ok(Operator::NotIn),
            "is null" => Ok(Operator::IsNull),
            "is not null" => Ok(Operator::IsNotNull),
            _ => Err(ValidationError::UnknownKeyword {
                kind: "operator",
                value: s.to_string(),
            }),
        }
    }
}

/// Operator together with its operand(s), as handed to `Query::filter`.
///
/// ```ignore
/// query.filter(&schema, "age", Op::gt(10))?;
/// query.filter(&schema, "id", Op::in_list(vec![1, 2, 3]))?;
/// query.filter(&schema, "deleted_at", Op::is_null())?;
/// ```
#[derive(Debug, Clone, PartialEq)]
pub enum Op<A> {
    Eq(A),
    Ne(A),
    Gt(A),
    Gte(A),
    Lt(A),
    Lte(A),
    In(Vec<A>),
    NotIn(Vec<A>),
    IsNull,
    IsNotNull,
}

impl<A> Op<A> {
    pub fn eq(val: impl Into<A>) -> Self {
        Op::Eq(val.into())
    }

    pub fn ne(val: impl Into<A>) -> Self {
        Op::Ne(val.into())
    }

    pub fn gt(val: impl Into<A>) -> Self {
        Op::Gt(val.into())
    }

    pub fn gte(val: impl Into<A>) -> Self {
        Op::Gte(val.into())
    }

    pub fn lt(val: impl Into<A>) -> Self {
        Op::Lt(val.into())
    }

    pub fn lte(val: impl Into<A>) -> Self {
        Op::Lte(val.into())
    }

    pub fn in_list<V: Into<A>>(vals: impl IntoIterator<Item = V>) -> Self {
        Op::In(vals.into_iter().map(Into::into).collect())
    }

    pub fn not_in<V: Into<A>>(vals: impl IntoIterator<Item = V>) -> Self {
        Op::NotIn(vals.into_iter().map(Into::into).collect())
    }

    pub fn is_null() -> Self {
        Op::IsNull
    }

    pub fn is_not_null() -> Self {
        Op::IsNotNull
    }

    /// Build from an [`Operator`] and a single operand. List operators get a
    /// one-element list; null checks drop the operand.
    pub fn with_operator(op: Operator, val: A) -> Self {
        match op {
            Operator::Eq => Op::Eq(val),
            Operator::Ne => Op::Ne(val),
            Operator::Gt => Op::Gt(val),
            Operator::Gte => Op::Gte(val),
            Operator::Lt => Op::Lt(val),
            Operator::Lte => Op::Lte(val),
            Operator::In => Op::In(vec![val]),
            Operator::NotIn => Op::NotIn(vec![val]),
            Operator::IsNull => Op::IsNull,
            Operator::IsNotNull => Op::IsNotNull,
        }
    }

    pub fn operator(&self) -> Operator {
        match self {
            Op::Eq(_) => Operator::Eq,
            Op::Ne(_) => Operator::Ne,
            Op::Gt(_) => Operator::Gt,
            Op::Gte(_) => Operator::Gte,
            Op::Lt(_) => Operator::Lt,
            Op::Lte(_) => Operator::Lte,
            Op::In(_) => Operator::In,
            Op::NotIn(_) => Operator::NotIn,
            Op::IsNull => Operator::IsNull,
            Op::IsNotNull => Operator::IsNotNull,
        }
    }

    /// Split into the operator and the arguments it binds, in order.
    pub(crate) fn into_parts(self) -> (Operator, Vec<A>) {
        let op = self.operator();
        let args = match self {
            Op::Eq(v) | Op::Ne(v) | Op::Gt(v) | Op::Gte(v) | Op::Lt(v) | Op::Lte(v) => vec![v],
            Op::In(vs) | Op::NotIn(vs) => vs,
            Op::IsNull | Op::IsNotNull => Vec::new(),
        };
        (op, args)
    }
}

/// Argument slots bound by a where clause.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Operand {
    /// Null checks bind nothing
    None,
    /// Index into the where argument sequence
    Slot(usize),
    /// Contiguous slots for `IN`/`NOT IN`
    Slots(Range<usize>),
}

/// `column op operand`, joined with `AND` by the renderer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WhereClause {
    pub column: ColumnRef,
    pub op: Operator,
    pub operand: Operand,
}

/// `column = slot` in an UPDATE (or a column/value pair in an INSERT).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SetClause {
    pub column: ColumnRef,
    pub slot: usize,
}

/// Join flavour.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum JoinKind {
    Join,
    Inner,
    Left,
    Right,
    Full,
    LeftOuter,
    RightOuter,
    FullOuter,
    Natural,
    NaturalLeft,
    NaturalRight,
    NaturalFull,
    Cross,
}

impl JoinKind {
    /// Keyword sequence up to and including `JOIN`.
    pub fn as_sql(self) -> &'static str {
        match self {
            JoinKind::Join => "JOIN",
            JoinKind::Inner => "INNER JOIN",
            JoinKind::Left => "LEFT JOIN",
            JoinKind::Right => "RIGHT JOIN",
            JoinKind::Full => "FULL JOIN",
            JoinKind::LeftOuter => "LEFT OUTER JOIN",
            JoinKind::RightOuter => "RIGHT OUTER JOIN",
            JoinKind::FullOuter => "FULL OUTER JOIN",
            JoinKind::Natural => "NATURAL JOIN",
            JoinKind::NaturalLeft => "NATURAL LEFT JOIN",
            JoinKind::NaturalRight => "NATURAL RIGHT JOIN",
            JoinKind::NaturalFull => "NATURAL FULL JOIN",
            JoinKind::Cross => "CROSS JOIN",
        }
    }

    /// Natural and cross joins take no `ON` condition.
    pub fn needs_on(self) -> bool {
        !matches!(
            self,
            JoinKind::Natural
                | JoinKind::NaturalLeft
                | JoinKind::NaturalRight
                | JoinKind::NaturalFull
                | JoinKind::Cross
        )
    }
}

impl FromStr for JoinKind {
    type Err = ValidationError;

    /// Accepts `left`, `leftOuter`, `left outer`, `left_outer`, ... in any case.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let key: String = s
            .chars()
            .filter(|c| !matches!(c, ' ' | '_' | '-'))
            .flat_map(char::to_lowercase)
            .collect();
        let key = key.strip_suffix("join").unwrap_or(&key);
        match key {
            "" => Ok(JoinKind::Join),
            "inner" => Ok(JoinKind::Inner),
            "left" => Ok(JoinKind::Left),
            "right" => Ok(JoinKind::Right),
            "full" => Ok(JoinKind::Full),
            "leftouter" => Ok(JoinKind::LeftOuter),
            "rightouter" => Ok(JoinKind::RightOuter),
            "fullouter" => Ok(JoinKind::FullOuter),
            "natural" => Ok(JoinKind::Natural),
            "naturalleft" => Ok(JoinKind::NaturalLeft),
            "naturalright" => Ok(JoinKind::NaturalRight),
            "naturalfull" => Ok(JoinKind::NaturalFull),
            "cross" => Ok(JoinKind::Cross),
            _ => Err(ValidationError::UnknownKeyword {
                kind: "join kind",
                value: s.to_string(),
            }),
        }
    }
}

/// Resolved join: `{kind} JOIN {table} AS {alias} [ON {source} = {target}]`.
#[derive(Debug, Clone, PartialEq, Eq)]
///
/// Built only by [`assemble::join`](crate::assemble::join) and
/// [`assemble::join_without_condition`](crate::assemble::join_without_condition),
/// so both sides are always resolved against their schemas.
pub struct JoinSpec {
    pub(crate) kind: JoinKind,
    pub(crate) table: String,
    pub(crate) alias: String,
    /// `(source, target)`; `None` for natural/cross joins
    pub(crate) on: Option<(ColumnRef, ColumnRef)>,
}

impl JoinSpec {
    pub fn kind(&self) -> JoinKind {
        self.kind
    }

    pub fn table(&self) -> &str {
        &self.table
    }

    pub fn alias(&self) -> &str {
        &self.alias
    }

    pub fn on(&self) -> Option<&(ColumnRef, ColumnRef)> {
        self.on.as_ref()
    }
}

/// Aggregate function allow-list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AggregateFunc {
    Count,
    Sum,
    Avg,
    Min,
    Max,
    First,
    Last,
}

impl AggregateFunc {
    pub fn as_sql(self) -> &'static str {
        match self {
            AggregateFunc::Count => "COUNT",
            AggregateFunc::Sum => "SUM",
            AggregateFunc::Avg => "AVG",
            AggregateFunc::Min => "MIN",
            AggregateFunc::Max => "MAX",
            AggregateFunc::First => "FIRST",
            AggregateFunc::Last => "LAST",
        }
    }
}

impl FromStr for AggregateFunc {
    type Err = RenderError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "COUNT" => Ok(AggregateFunc::Count),
            "SUM" => Ok(AggregateFunc::Sum),
            "AVG" => Ok(AggregateFunc::Avg),
            "MIN" => Ok(AggregateFunc::Min),
            "MAX" => Ok(AggregateFunc::Max),
            "FIRST" => Ok(AggregateFunc::First),
            "LAST" => Ok(AggregateFunc::Last),
            _ => Err(RenderError::UnsupportedAggregate(s.to_string())),
        }
    }
}

/// `{FUNC}({column}) AS {alias}`, optionally grouped.
#[derive(Debug, Clone, PartialEq, Eq)]
///
/// Built only by [`assemble::aggregate`](crate::assemble::aggregate).
pub struct AggregateSpec {
    pub(crate) func: AggregateFunc,
    pub(crate) column: ColumnRef,
    pub(crate) alias: String,
    pub(crate) group_by: Vec<ColumnRef>,
}

impl AggregateSpec {
    pub fn func(&self) -> AggregateFunc {
        self.func
    }

    pub fn column(&self) -> &ColumnRef {
        &self.column
    }

    pub fn alias(&self) -> &str {
        &self.alias
    }

    pub fn group_by(&self) -> &[ColumnRef] {
        &self.group_by
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Direction {
    #[default]
    Asc,
    Desc,
}

impl Direction {
    pub fn as_sql(self) -> &'static str {
        match self {
            Direction::Asc => "ASC",
            Direction::Desc => "DESC",
        }
    }
}

impl FromStr for Direction {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "asc" | "ascending" => Ok(Direction::Asc),
            "desc" | "descending" => Ok(Direction::Desc),
            _ => Err(ValidationError::UnknownKeyword {
                kind: "order direction",
                value: s.to_string(),
            }),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderSpec {
    pub column: ColumnRef,
    pub direction: Direction,
}
