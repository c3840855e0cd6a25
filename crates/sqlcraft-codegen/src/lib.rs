//! # sqlcraft-codegen
//!
//! Generates a repository contract, a typed query builder and tests for the
//! repository from structured operation descriptors.
//!
//! - [`descriptor`]: the [`Operation`] values the emitter consumes
//! - [`flags`]: the `[ (var1,var2), var3 ]` / `[[(id),(name,age)]]` flag syntax
//! - [`manifest`]: TOML manifests listing repositories and their operations
//! - [`emit()`]: schema + operations to Rust source
//! - [`write`]: writing generated files, or checking they are current
//!
//! All SQL is rendered at generation time by `sqlcraft`'s renderer; the
//! generated builder delegates to `sqlcraft::QueryBuilder` at runtime.

pub mod descriptor;
pub mod emit;
pub mod error;
pub mod flags;
pub mod manifest;
pub mod naming;
pub mod write;

pub use descriptor::{
    AggregateOp, AggregateRequest, Condition, GetOp, InsertOp, JoinOp, Operation, UpdateOp,
};
pub use emit::{EmitOptions, GeneratedUnit, emit};
pub use error::CodegenError;
pub use manifest::{GeneratedFile, Manifest};
