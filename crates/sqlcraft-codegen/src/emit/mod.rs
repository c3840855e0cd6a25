//! Rust source emission.
//!
//! [`emit`] validates every operation, builds a generation-time
//! `Query<String>` for each one (arguments are Rust parameter expressions),
//! renders it once with the target dialect and wraps the text into source
//! units: a repository, a typed query builder and a test suite for the
//! repository.
//!
//! ```ignore
//! use sqlcraft::{Dialect, Schema};
//! use sqlcraft_codegen::{emit, flags, EmitOptions};
//!
//! let ops = flags::parse_get_flag("[(var3,var1)]")?;
//! let unit = emit(&schema, &ops, &EmitOptions::new(Dialect::Postgres))?;
//! assert!(unit.repository.contains("fn get_by_var3_and_var1("));
//! ```

mod builder;
mod repository;
mod suite;

use crate::descriptor::{AggregateOp, Condition, GetOp, JoinOp, Operation, UpdateOp};
use crate::error::CodegenError;
use crate::naming;
use sqlcraft::assemble::{self, JoinSide};
use sqlcraft::{AggregateFunc, Dialect, Op, Query, Renderer, Schema, SchemaError, ValidationError};
use std::collections::HashSet;

/// Knobs for one emitted unit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmitOptions {
    pub dialect: Dialect,
    /// Module path the model type is imported from.
    pub model_path: String,
    /// Extra comment lines placed under the `@generated` marker.
    pub header: Option<String>,
}

impl EmitOptions {
    pub fn new(dialect: Dialect) -> Self {
        Self {
            dialect,
            model_path: "super".to_string(),
            header: None,
        }
    }

    pub fn with_model_path(mut self, path: impl Into<String>) -> Self {
        self.model_path = path.into();
        self
    }

    pub fn with_header(mut self, header: impl Into<String>) -> Self {
        self.header = Some(header.into());
        self
    }
}

impl Default for EmitOptions {
    fn default() -> Self {
        Self::new(Dialect::default())
    }
}

/// Source text of one model's generated code.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedUnit {
    pub repository: String,
    pub builder: String,
    /// Tokio tests for the repository against an in-memory client, meant
    /// to be included as a child module of the repository unit.
    pub tests: String,
}

/// Generate the repository, builder and test units for `schema`.
pub fn emit(
    schema: &Schema,
    operations: &[Operation],
    options: &EmitOptions,
) -> Result<GeneratedUnit, CodegenError> {
    for op in operations {
        op.validate()?;
    }

    let renderer = Renderer::new(options.dialect);
    let mut functions = Vec::with_capacity(operations.len());
    let mut seen = HashSet::new();
    for op in operations {
        let function = plan(schema, op, renderer)?;
        if !seen.insert(function.ident.clone()) {
            return Err(ValidationError::DuplicateOperation(function.name).into());
        }
        tracing::debug!(
            model = schema.model(),
            function = %function.ident,
            sql = %function.sql,
            "planned operation"
        );
        functions.push(function);
    }

    let unit = GeneratedUnit {
        repository: repository::emit(schema, &functions, options),
        builder: builder::emit(schema, options),
        tests: suite::emit(schema, &functions, options),
    };
    tracing::info!(
        model = schema.model(),
        dialect = %options.dialect,
        functions = functions.len(),
        "generated repository, builder and tests"
    );
    Ok(unit)
}

/// A repository function, fully resolved.
#[derive(Debug, Clone)]
pub(crate) struct Function {
    /// UpperCamel operation name, e.g. `GetByVar3AndVar1`
    pub name: String,
    pub ident: String,
    pub params: Vec<Param>,
    pub sql: String,
    /// Rust expressions, in placeholder order
    pub args: Vec<String>,
    pub output: Output,
    pub uses_model: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Param {
    pub ident: String,
    pub ty: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Output {
    One,
    Many,
    Affected,
    Aggregate {
        row: String,
        /// `(alias, rust type)`
        columns: Vec<(String, String)>,
        many: bool,
    },
}

#[derive(Debug, Default)]
struct Params(Vec<Param>);

impl Params {
    /// Add a parameter named after `name`, suffixed when already taken.
    fn add(&mut self, name: &str, ty: &str) -> String {
        let base = naming::fn_ident(name);
        let mut ident = base.clone();
        let mut n = 2;
        while self.0.iter().any(|p| p.ident == ident) {
            ident = format!("{base}_{n}");
            n += 1;
        }
        self.0.push(Param {
            ident: ident.clone(),
            ty: ty.to_string(),
        });
        ident
    }
}

fn plan(schema: &Schema, op: &Operation, renderer: Renderer) -> Result<Function, CodegenError> {
    match op {
        Operation::Get(get) => plan_get(schema, get, renderer),
        Operation::Update(update) => plan_update(schema, update, renderer),
        Operation::Insert(insert) => {
            let record = naming::fn_ident(schema.model());
            let mut query: Query<String> = Query::insert(schema);
            for field in schema.fields() {
                let expr = format!("{record}.{}.clone()", naming::field_ident(field.name()));
                query.assign(schema, field.column(), expr)?;
            }
            let rendered = renderer.render(&query)?;
            Ok(Function {
                name: name_or(&insert.function_name, naming::insert_name),
                ident: String::new(),
                params: vec![Param {
                    ident: record,
                    ty: format!("&{}", schema.model()),
                }],
                sql: rendered.sql,
                args: rendered.args,
                output: Output::Affected,
                uses_model: true,
            }
            .with_ident())
        }
        Operation::Join(join) => plan_join(schema, join, renderer),
        Operation::Aggregate(agg) => plan_aggregate(schema, agg, renderer),
    }
}

fn plan_get(schema: &Schema, op: &GetOp, renderer: Renderer) -> Result<Function, CodegenError> {
    let mut query: Query<String> = Query::select(schema);
    let mut params = Params::default();
    for condition in &op.by {
        push_condition(schema, &mut query, &mut params, condition)?;
    }
    if let Some((column, direction)) = &op.order_by {
        query.order_by(schema, column, *direction)?;
    }
    if let Some(n) = op.limit {
        query.limit(n);
    }

    let many = op.returns_many();
    let name = name_or(&op.function_name, || {
        if many {
            naming::get_many_name(schema.model(), &op.by)
        } else {
            naming::get_name(&op.by)
        }
    });
    let rendered = renderer.render(&query)?;
    Ok(Function {
        name,
        ident: String::new(),
        params: params.0,
        sql: rendered.sql,
        args: rendered.args,
        output: if many { Output::Many } else { Output::One },
        uses_model: true,
    }
    .with_ident())
}

fn plan_update(
    schema: &Schema,
    op: &UpdateOp,
    renderer: Renderer,
) -> Result<Function, CodegenError> {
    let mut query: Query<String> = Query::update(schema);
    let mut params = Params::default();
    for column in &op.fields {
        let field = schema.require(column)?;
        let ident = params.add(field.name(), field.ty());
        query.assign(schema, column, ident)?;
    }
    for condition in &op.by {
        push_condition(schema, &mut query, &mut params, condition)?;
    }

    let rendered = renderer.render(&query)?;
    Ok(Function {
        name: name_or(&op.function_name, || naming::update_name(&op.fields, &op.by)),
        ident: String::new(),
        params: params.0,
        sql: rendered.sql,
        args: rendered.args,
        output: Output::Affected,
        uses_model: false,
    }
    .with_ident())
}

fn plan_join(schema: &Schema, op: &JoinOp, renderer: Renderer) -> Result<Function, CodegenError> {
    let source_alias = assemble::default_alias(schema.table(), None);
    let target_alias = match &op.alias {
        Some(alias) => alias.clone(),
        None => assemble::default_alias(op.target.table(), Some(&source_alias)),
    };
    if target_alias == source_alias {
        return Err(ValidationError::invalid(
            "join",
            format!("alias '{target_alias}' is already used by {}", schema.table()),
        )
        .into());
    }

    let spec = if op.kind.needs_on() {
        assemble::join(
            op.kind,
            JoinSide::new(schema, &source_alias, &op.source_column),
            JoinSide::new(&op.target, &target_alias, &op.target_column),
        )?
    } else {
        assemble::join_without_condition(op.kind, &op.target, &target_alias)
    };

    let mut query: Query<String> = Query::select(schema).with_alias(source_alias.as_str());
    query.project(schema, schema.fields().iter().map(|f| f.column()))?;
    query.join(spec);
    if let Some(n) = op.limit {
        query.limit(n);
    }

    let rendered = renderer.render(&query)?;
    Ok(Function {
        name: name_or(&op.function_name, || naming::join_name(schema.model())),
        ident: String::new(),
        params: Vec::new(),
        sql: rendered.sql,
        args: rendered.args,
        output: Output::Many,
        uses_model: true,
    }
    .with_ident())
}

fn plan_aggregate(
    schema: &Schema,
    op: &AggregateOp,
    renderer: Renderer,
) -> Result<Function, CodegenError> {
    let mut query: Query<String> = Query::select(schema);
    let mut params = Params::default();
    for condition in &op.by {
        push_condition(schema, &mut query, &mut params, condition)?;
    }

    let mut columns = Vec::with_capacity(op.aggregates.len());
    for req in &op.aggregates {
        let field = schema.require(&req.column)?;
        let groups: Vec<&str> = req.group_by.iter().map(String::as_str).collect();
        query.aggregate(assemble::aggregate(
            schema,
            None,
            req.func,
            &req.column,
            &req.alias,
            &groups,
        )?);

        let ty = match req.func {
            AggregateFunc::Count => "i64".to_string(),
            AggregateFunc::Sum | AggregateFunc::Avg => "Option<f64>".to_string(),
            _ => format!("Option<{}>", inner_type(field.ty())),
        };
        columns.push((req.alias.clone(), ty));
    }

    let name = name_or(&op.function_name, || {
        naming::aggregate_name(op.aggregates.iter().map(|a| a.alias.as_str()), &op.by)
    });
    let rendered = renderer.render(&query)?;
    Ok(Function {
        output: Output::Aggregate {
            row: naming::type_ident(&format!("{name}_row")),
            columns,
            many: op.is_grouped(),
        },
        name,
        ident: String::new(),
        params: params.0,
        sql: rendered.sql,
        args: rendered.args,
        uses_model: false,
    }
    .with_ident())
}

impl Function {
    fn with_ident(mut self) -> Self {
        self.ident = naming::fn_ident(&self.name);
        self
    }
}

/// Append one condition; null checks take no parameter.
fn push_condition(
    schema: &Schema,
    query: &mut Query<String>,
    params: &mut Params,
    condition: &Condition,
) -> Result<(), SchemaError> {
    let field = schema.require(&condition.column)?;
    let arg = if condition.takes_argument() {
        params.add(field.name(), inner_type(field.ty()))
    } else {
        String::new()
    };
    query.filter(schema, &condition.column, Op::with_operator(condition.op, arg))?;
    Ok(())
}

fn name_or(explicit: &Option<String>, derive: impl FnOnce() -> String) -> String {
    explicit.clone().unwrap_or_else(derive)
}

/// `Option<T>` -> `T`; conditions compare against the inner value.
pub(crate) fn inner_type(ty: &str) -> &str {
    let ty = ty.trim();
    match ty.strip_suffix('>').and_then(|t| t.split_once('<')) {
        Some((head, inner)) if head.trim().rsplit("::").next() == Some("Option") => inner.trim(),
        _ => ty,
    }
}

/// Path of a dialect variant in emitted code.
pub(crate) fn dialect_path(dialect: Dialect) -> &'static str {
    match dialect {
        Dialect::MySql => "Dialect::MySql",
        Dialect::Sqlite => "Dialect::Sqlite",
        Dialect::Postgres => "Dialect::Postgres",
        Dialect::SqlServer => "Dialect::SqlServer",
    }
}
