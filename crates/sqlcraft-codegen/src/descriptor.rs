//! Structured operation descriptors.
//!
//! Flags and manifests both parse into [`Operation`] values; the emitter only
//! ever sees this form.

use sqlcraft::{AggregateFunc, Direction, JoinKind, Operator, Schema, ValidationError};

/// One condition of a generated function: `column op ?`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Condition {
    pub column: String,
    pub op: Operator,
}

impl Condition {
    pub fn new(column: impl Into<String>, op: Operator) -> Self {
        Self {
            column: column.into(),
            op,
        }
    }

    pub fn eq(column: impl Into<String>) -> Self {
        Self::new(column, Operator::Eq)
    }

    /// Parse `column [operator]`, e.g. `age >=` or `deleted_at is null`.
    /// A bare column means equality.
    pub fn parse(text: &str) -> Result<Self, ValidationError> {
        let text = text.trim();
        let (column, op) = match text.split_once(char::is_whitespace) {
            Some((column, op)) => (column, op.parse()?),
            None => (text, Operator::Eq),
        };
        if !is_identifier(column) {
            return Err(ValidationError::invalid(
                text,
                format!("'{column}' is not a column name"),
            ));
        }
        Ok(Self::new(column, op))
    }

    /// Null checks bind no argument.
    pub fn takes_argument(&self) -> bool {
        !matches!(self.op, Operator::IsNull | Operator::IsNotNull)
    }
}

/// Read by conditions.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct GetOp {
    pub by: Vec<Condition>,
    /// Return every matching row instead of a single one. Implied when `by`
    /// is empty.
    pub many: bool,
    pub order_by: Option<(String, Direction)>,
    pub limit: Option<u64>,
    pub function_name: Option<String>,
}

impl GetOp {
    pub fn by(conditions: impl IntoIterator<Item = Condition>) -> Self {
        Self {
            by: conditions.into_iter().collect(),
            ..Default::default()
        }
    }

    pub fn returns_many(&self) -> bool {
        self.many || self.by.is_empty()
    }
}

/// Assign `fields` on rows matching `by`.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct UpdateOp {
    pub by: Vec<Condition>,
    pub fields: Vec<String>,
    pub function_name: Option<String>,
}

/// Insert one record, every field.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct InsertOp {
    pub function_name: Option<String>,
}

/// Rows of the model joined against another table.
#[derive(Debug, Clone, PartialEq)]
pub struct JoinOp {
    pub kind: JoinKind,
    pub target: Schema,
    pub source_column: String,
    pub target_column: String,
    /// Target table alias; defaults to its first letter.
    pub alias: Option<String>,
    pub limit: Option<u64>,
    pub function_name: Option<String>,
}

/// `{func}({column}) AS {alias}` with optional group columns.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AggregateRequest {
    pub func: AggregateFunc,
    pub column: String,
    pub alias: String,
    pub group_by: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct AggregateOp {
    pub aggregates: Vec<AggregateRequest>,
    pub by: Vec<Condition>,
    pub function_name: Option<String>,
}

impl AggregateOp {
    /// Grouped aggregates yield one row per group.
    pub fn is_grouped(&self) -> bool {
        self.aggregates.iter().any(|a| !a.group_by.is_empty())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Operation {
    Get(GetOp),
    Update(UpdateOp),
    Insert(InsertOp),
    Join(JoinOp),
    Aggregate(AggregateOp),
}

impl Operation {
    pub fn kind(&self) -> &'static str {
        match self {
            Operation::Get(_) => "get",
            Operation::Update(_) => "update",
            Operation::Insert(_) => "insert",
            Operation::Join(_) => "join",
            Operation::Aggregate(_) => "aggregate",
        }
    }

    pub fn function_name(&self) -> Option<&str> {
        match self {
            Operation::Get(op) => op.function_name.as_deref(),
            Operation::Update(op) => op.function_name.as_deref(),
            Operation::Insert(op) => op.function_name.as_deref(),
            Operation::Join(op) => op.function_name.as_deref(),
            Operation::Aggregate(op) => op.function_name.as_deref(),
        }
    }

    /// Shape checks that need no schema.
    pub fn validate(&self) -> Result<(), ValidationError> {
        let invalid = |message: String| ValidationError::invalid(self.kind(), message);

        if let Some(name) = self.function_name() {
            if !is_identifier(name) {
                return Err(invalid(format!("'{name}' is not a valid function name")));
            }
        }

        match self {
            Operation::Get(op) => check_conditions(&op.by).map_err(invalid),
            Operation::Update(op) => {
                if op.fields.is_empty() {
                    return Err(invalid("no fields to update".to_string()));
                }
                check_conditions(&op.by).map_err(invalid)
            }
            Operation::Insert(_) => Ok(()),
            Operation::Join(op) => match op.alias.as_deref() {
                Some(alias) if !is_identifier(alias) => {
                    Err(invalid(format!("'{alias}' is not a valid table alias")))
                }
                _ => Ok(()),
            },
            Operation::Aggregate(op) => {
                if op.aggregates.is_empty() {
                    return Err(invalid("no aggregate functions".to_string()));
                }
                let mut seen: Vec<&str> = Vec::new();
                for agg in &op.aggregates {
                    if !is_identifier(&agg.alias) {
                        return Err(invalid(format!("'{}' is not a valid alias", agg.alias)));
                    }
                    if seen.contains(&agg.alias.as_str()) {
                        return Err(invalid(format!("alias '{}' used twice", agg.alias)));
                    }
                    seen.push(&agg.alias);
                }
                check_conditions(&op.by).map_err(invalid)
            }
        }
    }
}

/// Generated functions render their SQL ahead of time, so list operators
/// (unknown arity) are left to the runtime builder.
fn check_conditions(conditions: &[Condition]) -> Result<(), String> {
    match conditions
        .iter()
        .find(|c| matches!(c.op, Operator::In | Operator::NotIn))
    {
        Some(c) => Err(format!(
            "'{} {}' needs the runtime query builder",
            c.column, c.op
        )),
        None => Ok(()),
    }
}

pub(crate) fn is_identifier(s: &str) -> bool {
    let mut chars = s.chars();
    matches!(chars.next(), Some(c) if c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}
