//! Dialect placeholder strategy.

use crate::error::RenderError;
use std::fmt;
use std::str::FromStr;

/// SQL dialect. Dialects differ only in placeholder syntax.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Dialect {
    #[default]
    MySql,
    Sqlite,
    Postgres,
    SqlServer,
}

impl Dialect {
    pub const ALL: [Dialect; 4] = [
        Dialect::MySql,
        Dialect::Sqlite,
        Dialect::Postgres,
        Dialect::SqlServer,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Dialect::MySql => "mysql",
            Dialect::Sqlite => "sqlite",
            Dialect::Postgres => "postgres",
            Dialect::SqlServer => "sqlserver",
        }
    }

    /// Placeholder for the argument at 1-based `position`.
    pub fn placeholder(self, position: usize) -> String {
        match self {
            Dialect::MySql | Dialect::Sqlite => "?".to_string(),
            Dialect::Postgres => format!("${position}"),
            Dialect::SqlServer => format!("@p{position}"),
        }
    }
}

impl fmt::Display for Dialect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Dialect {
    type Err = RenderError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "mysql" => Ok(Dialect::MySql),
            "sqlite" | "sqlite3" => Ok(Dialect::Sqlite),
            "postgres" | "postgresql" => Ok(Dialect::Postgres),
            "sqlserver" | "mssql" => Ok(Dialect::SqlServer),
            _ => Err(RenderError::UnsupportedDialect(s.to_string())),
        }
    }
}

/// Argument accumulator used while rendering.
///
/// Every bound argument is pushed exactly once, in text order, and gets its
/// placeholder from the dialect at that moment. Positions never need
/// renumbering afterwards.
#[derive(Debug, Clone)]
pub struct Bindings<A> {
    dialect: Dialect,
    args: Vec<A>,
}

impl<A> Bindings<A> {
    pub fn new(dialect: Dialect) -> Self {
        Self {
            dialect,
            args: Vec::new(),
        }
    }

    /// Bind an argument and return its placeholder.
    pub fn bind(&mut self, arg: A) -> String {
        self.args.push(arg);
        self.dialect.placeholder(self.args.len())
    }

    pub fn len(&self) -> usize {
        self.args.len()
    }

    pub fn is_empty(&self) -> bool {
        self.args.is_empty()
    }

    pub fn into_args(self) -> Vec<A> {
        self.args
    }
}
