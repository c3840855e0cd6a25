//! Error types for sqlcraft

use crate::query::Mode;
use thiserror::Error;

/// Result type alias for sqlcraft operations
pub type CraftResult<T> = Result<T, CraftError>;

/// Problems with a model description or with a column reference against it.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SchemaError {
    /// Two fields map to the same column
    #[error("duplicate column '{column}' (fields '{first}' and '{second}')")]
    DuplicateColumn {
        column: String,
        first: String,
        second: String,
    },

    /// Two fields share a name
    #[error("duplicate field '{0}'")]
    DuplicateField(String),

    /// A field has no column name
    #[error("field '{0}' has no column mapping")]
    MissingColumnMapping(String),

    /// A field name equals the column of a different field
    #[error("name '{name}' is a field and also the column of field '{owner}'")]
    AmbiguousName { name: String, owner: String },

    /// A field's declared type could not be classified
    #[error("field '{field}' has unresolved type '{ty}'")]
    UnresolvedType { field: String, ty: String },

    /// A clause references a column the schema does not have
    #[error("unknown column '{column}' in {model}")]
    UnknownColumn { model: String, column: String },

    /// A range operator was used on an equality-only column
    #[error("column '{column}' is not comparable, '{op}' is not allowed")]
    NotComparable { column: String, op: &'static str },
}

impl SchemaError {
    pub(crate) fn unknown(model: &str, column: &str) -> Self {
        Self::UnknownColumn {
            model: model.to_string(),
            column: column.to_string(),
        }
    }
}

/// Malformed operation descriptor (flags, manifests, structured operations).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// Flag text does not follow the expected bracket syntax
    #[error("malformed {flag} flag: {message}")]
    MalformedFlag { flag: &'static str, message: String },

    /// An operation descriptor is structurally invalid
    #[error("invalid operation '{operation}': {message}")]
    InvalidOperation { operation: String, message: String },

    /// Two operations resolve to the same generated function name
    #[error("duplicate operation name '{0}'")]
    DuplicateOperation(String),

    /// Unknown enum-like keyword (operator, join kind, order direction, ...)
    #[error("unknown {kind} '{value}'")]
    UnknownKeyword { kind: &'static str, value: String },

    /// Repository manifest is unreadable or inconsistent
    #[error("invalid manifest: {0}")]
    Manifest(String),
}

impl ValidationError {
    pub fn malformed(flag: &'static str, message: impl Into<String>) -> Self {
        Self::MalformedFlag {
            flag,
            message: message.into(),
        }
    }

    pub fn invalid(operation: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidOperation {
            operation: operation.into(),
            message: message.into(),
        }
    }
}

/// Problems found while turning a query into SQL text.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RenderError {
    /// The query mode has no renderer
    #[error("unsupported query mode '{0}'")]
    UnsupportedMode(String),

    /// Aggregate function outside COUNT/SUM/AVG/MIN/MAX/FIRST/LAST
    #[error("unsupported aggregate function '{0}'")]
    UnsupportedAggregate(String),

    /// Dialect name is not one of mysql/sqlite/postgres/sqlserver
    #[error("unsupported dialect '{0}'")]
    UnsupportedDialect(String),

    /// A clause kind that the query mode does not accept
    #[error("{clause} is not allowed in {mode} queries")]
    ClauseNotAllowed { clause: &'static str, mode: Mode },

    /// UPDATE/INSERT without any assigned column
    #[error("no columns assigned for table '{0}'")]
    EmptySet(String),
}

/// Umbrella error for runtime builder and client operations.
#[derive(Debug, Error)]
pub enum CraftError {
    #[error("Schema error: {0}")]
    Schema(#[from] SchemaError),

    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error("Render error: {0}")]
    Render(#[from] RenderError),

    /// Single-row fetch returned nothing
    #[error("Not found: {0}")]
    NotFound(String),

    /// Driver error from tokio-postgres
    #[cfg(feature = "postgres")]
    #[error("Query error: {0}")]
    Query(#[from] tokio_postgres::Error),

    /// Database connection error
    #[error("Connection error: {0}")]
    Connection(String),

    /// Row decode/mapping error
    #[error("Decode error on column '{column}': {message}")]
    Decode { column: String, message: String },

    /// Other errors
    #[error("{0}")]
    Other(String),
}

impl CraftError {
    /// Create a decode error for a specific column
    pub fn decode(column: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Decode {
            column: column.into(),
            message: message.into(),
        }
    }

    /// Create a not found error
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound(message.into())
    }

    /// Check if this is a not found error
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }

    /// Check if this error was raised before anything reached the database
    pub fn is_build_error(&self) -> bool {
        matches!(self, Self::Schema(_) | Self::Validation(_) | Self::Render(_))
    }
}
