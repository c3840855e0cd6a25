//! # sqlcraft
//!
//! Schema-driven SQL clause synthesis and the runtime builder that generated
//! repositories delegate to.
//!
//! ## Features
//!
//! - **Schema first**: every column in every clause is checked against a resolved [`Schema`]
//! - **No string surgery**: queries are clause lists, rendered once by a [`Renderer`]
//! - **Dialect placeholders**: `?` (MySQL/SQLite), `$n` (Postgres), `@pn` (SQL Server)
//! - **Stable argument order**: `SET` arguments always precede `WHERE` arguments
//! - **Typed errors**: [`SchemaError`], [`ValidationError`], [`RenderError`] and the runtime [`CraftError`]
//!
//! ## Rendering a query
//!
//! ```ignore
//! use sqlcraft::{Dialect, FieldDef, Op, Query, Renderer, Schema};
//!
//! let schema = Schema::resolve("User", "users", [
//!     FieldDef::new("id", "i64", "id"),
//!     FieldDef::new("age", "i32", "age"),
//! ])?;
//!
//! let mut query = Query::update(&schema);
//! query.assign(&schema, "age", 11)?;
//! query.filter(&schema, "age", Op::gt(10))?;
//!
//! let rendered = Renderer::new(Dialect::Postgres).render(&query)?;
//! assert_eq!(rendered.sql, "UPDATE users SET age = $1 WHERE age > $2");
//! ```
//!
//! ## Runtime builder
//!
//! ```ignore
//! use sqlcraft::{Dialect, QueryBuilder};
//!
//! let user: User = QueryBuilder::<User>::new(Dialect::Postgres)
//!     .eq("name", "alice")
//!     .first(&client)
//!     .await?;
//! ```

pub mod assemble;
pub mod builder;
pub mod clause;
pub mod client;
pub mod dialect;
pub mod error;
pub mod model;
pub mod query;
pub mod render;
pub mod row;
pub mod schema;
pub mod value;

pub use builder::QueryBuilder;
pub use clause::{
    AggregateFunc, AggregateSpec, Direction, JoinKind, JoinSpec, Op, Operand, Operator, OrderSpec,
    SetClause, WhereClause,
};
pub use client::GenericClient;
pub use dialect::{Bindings, Dialect};
pub use error::{CraftError, CraftResult, RenderError, SchemaError, ValidationError};
pub use model::Model;
pub use query::{Mode, Query};
pub use render::{Rendered, Renderer};
pub use row::{FromRow, Row};
pub use schema::{ColumnRef, Field, FieldDef, FieldKind, Schema};
pub use value::{FromValue, Value};
