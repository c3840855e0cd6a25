//! Repository manifests (TOML).
//!
//! ```toml
//! [[repository]]
//! model = "User"
//! table = "users"            # defaults to snake_case(model)
//! dialect = "postgres"       # mysql | sqlite | postgres | sqlserver
//! module = "crate::models"   # where the model type lives
//! source = "src/models/user.rs"
//! destination = "src/repository"
//! tests = true               # also write {model}_repository_tests.rs
//!
//! [[repository.fields]]
//! name = "id"
//! type = "i64"               # emitted verbatim, must resolve in the generated modules
//! column = "id"
//!
//! [[repository.operation]]
//! kind = "get"
//! by = ["name", "age >="]
//!
//! [[repository.operation]]
//! kind = "update"
//! by = ["id"]
//! fields = ["name"]
//! ```

use crate::descriptor::{
    AggregateOp, AggregateRequest, Condition, GetOp, InsertOp, JoinOp, Operation, UpdateOp,
};
use crate::emit::{self, EmitOptions};
use crate::error::CodegenError;
use crate::naming;
use serde::Deserialize;
use sqlcraft::{
    AggregateFunc, Dialect, Direction, FieldDef, JoinKind, Schema, SchemaError, ValidationError,
};
use std::collections::HashSet;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Deserialize)]
pub struct Manifest {
    #[serde(default, rename = "repository")]
    pub repositories: Vec<RepositoryConfig>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RepositoryConfig {
    pub model: String,
    pub table: Option<String>,
    #[serde(default = "default_dialect")]
    pub dialect: String,
    #[serde(default = "default_module")]
    pub module: String,
    pub source: Option<String>,
    #[serde(default = "default_destination")]
    pub destination: String,
    /// Write the generated repository tests next to the repository.
    #[serde(default)]
    pub tests: bool,
    #[serde(default)]
    pub fields: Vec<FieldConfig>,
    #[serde(default, rename = "operation")]
    pub operations: Vec<OperationConfig>,
}

fn default_dialect() -> String {
    "mysql".to_string()
}

fn default_module() -> String {
    "super".to_string()
}

fn default_destination() -> String {
    ".".to_string()
}

#[derive(Debug, Clone, Deserialize)]
pub struct FieldConfig {
    pub name: String,
    #[serde(rename = "type")]
    pub ty: String,
    pub column: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum OperationConfig {
    Get {
        #[serde(default)]
        by: Vec<String>,
        #[serde(default)]
        many: bool,
        /// `"column"` or `"column desc"`
        order_by: Option<String>,
        limit: Option<u64>,
        name: Option<String>,
    },
    Update {
        #[serde(default)]
        by: Vec<String>,
        fields: Vec<String>,
        name: Option<String>,
    },
    Insert {
        name: Option<String>,
    },
    Join {
        /// Model name of another repository in the same manifest.
        target: String,
        join_kind: Option<String>,
        on: Option<String>,
        /// Defaults to `on`.
        target_on: Option<String>,
        alias: Option<String>,
        limit: Option<u64>,
        name: Option<String>,
    },
    Aggregate {
        aggregates: Vec<AggregateConfig>,
        #[serde(default)]
        by: Vec<String>,
        name: Option<String>,
    },
}

#[derive(Debug, Clone, Deserialize)]
pub struct AggregateConfig {
    pub func: String,
    pub column: String,
    pub alias: String,
    #[serde(default)]
    pub group_by: Vec<String>,
}

/// One file produced by [`Manifest::generate`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedFile {
    pub path: PathBuf,
    pub content: String,
}

impl Manifest {
    pub fn from_toml_str(raw: &str) -> Result<Self, ValidationError> {
        toml::from_str(raw).map_err(|e| ValidationError::Manifest(e.to_string()))
    }

    /// Read, parse and validate a manifest file.
    pub fn load(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)
            .map_err(|e| anyhow::anyhow!("failed to read manifest {}: {e}", path.display()))?;
        let manifest = Self::from_toml_str(&raw)
            .map_err(|e| anyhow::anyhow!("failed to parse manifest {}: {e}", path.display()))?;
        manifest
            .validate()
            .map_err(|e| anyhow::anyhow!("{}: {e}", path.display()))?;
        Ok(manifest)
    }

    pub fn repository(&self, model: &str) -> Option<&RepositoryConfig> {
        self.repositories.iter().find(|r| r.model == model)
    }

    /// Check dialects, model names and every operation descriptor.
    pub fn validate(&self) -> Result<(), CodegenError> {
        if self.repositories.is_empty() {
            return Err(manifest_error("no [[repository]] entries"));
        }

        let mut models = HashSet::new();
        for repo in &self.repositories {
            if !crate::descriptor::is_identifier(&repo.model) {
                return Err(manifest_error(format!(
                    "'{}' is not a valid model name",
                    repo.model
                )));
            }
            if !models.insert(repo.model.as_str()) {
                return Err(manifest_error(format!(
                    "model '{}' is listed twice",
                    repo.model
                )));
            }
            repo.dialect()?;
            repo.operations(self)?;
        }
        Ok(())
    }

    /// Generate `{model}_repository.rs` and `{model}_builder.rs` for every
    /// repository, plus `{model}_repository_tests.rs` where `tests` is set.
    /// Relative destinations resolve against `base_dir`.
    pub fn generate(&self, base_dir: &Path) -> Result<Vec<GeneratedFile>, CodegenError> {
        let mut files = Vec::with_capacity(self.repositories.len() * 3);
        for repo in &self.repositories {
            let schema = repo.schema()?;
            let operations = repo.operations(self)?;
            let unit = emit::emit(&schema, &operations, &repo.emit_options()?)?;

            let dir = resolve_path(base_dir, &repo.destination);
            let stem = naming::snake(&repo.model);
            files.push(GeneratedFile {
                path: dir.join(format!("{stem}_repository.rs")),
                content: unit.repository,
            });
            files.push(GeneratedFile {
                path: dir.join(format!("{stem}_builder.rs")),
                content: unit.builder,
            });
            if repo.tests {
                files.push(GeneratedFile {
                    path: dir.join(format!("{stem}_repository_tests.rs")),
                    content: unit.tests,
                });
            }
        }
        Ok(files)
    }
}

impl RepositoryConfig {
    pub fn table_name(&self) -> String {
        self.table
            .clone()
            .unwrap_or_else(|| naming::default_table(&self.model))
    }

    pub fn dialect(&self) -> Result<Dialect, ValidationError> {
        self.dialect.parse::<Dialect>().map_err(|e| {
            ValidationError::Manifest(format!("repository '{}': {e}", self.model))
        })
    }

    pub fn schema(&self) -> Result<Schema, SchemaError> {
        let defs = self.fields.iter().map(|f| match &f.column {
            Some(column) => FieldDef::new(&f.name, &f.ty, column),
            None => FieldDef::unmapped(&f.name, &f.ty),
        });
        Schema::resolve(&self.model, self.table_name(), defs)
    }

    pub fn emit_options(&self) -> Result<EmitOptions, ValidationError> {
        let mut options = EmitOptions::new(self.dialect()?).with_model_path(&self.module);
        if let Some(source) = &self.source {
            options = options.with_header(format!("Source: {source}"));
        }
        Ok(options)
    }

    /// Convert and validate every operation; join targets are looked up in
    /// `manifest`.
    pub fn operations(&self, manifest: &Manifest) -> Result<Vec<Operation>, CodegenError> {
        self.operations
            .iter()
            .map(|op| op.to_operation(manifest))
            .collect()
    }
}

impl OperationConfig {
    pub fn to_operation(&self, manifest: &Manifest) -> Result<Operation, CodegenError> {
        let op = match self {
            OperationConfig::Get {
                by,
                many,
                order_by,
                limit,
                name,
            } => Operation::Get(GetOp {
                by: parse_conditions(by)?,
                many: *many,
                order_by: order_by.as_deref().map(parse_order).transpose()?,
                limit: *limit,
                function_name: name.clone(),
            }),
            OperationConfig::Update { by, fields, name } => Operation::Update(UpdateOp {
                by: parse_conditions(by)?,
                fields: fields.clone(),
                function_name: name.clone(),
            }),
            OperationConfig::Insert { name } => Operation::Insert(InsertOp {
                function_name: name.clone(),
            }),
            OperationConfig::Join {
                target,
                join_kind,
                on,
                target_on,
                alias,
                limit,
                name,
            } => {
                let kind: JoinKind = join_kind.as_deref().unwrap_or("join").parse()?;
                let target_repo = manifest.repository(target).ok_or_else(|| {
                    manifest_error(format!("join target '{target}' is not in this manifest"))
                })?;
                let source_column = on.clone().unwrap_or_default();
                if kind.needs_on() && source_column.is_empty() {
                    return Err(ValidationError::invalid(
                        "join",
                        format!("{} needs an 'on' column", kind.as_sql()),
                    )
                    .into());
                }
                Operation::Join(JoinOp {
                    kind,
                    target: target_repo.schema()?,
                    target_column: target_on.clone().unwrap_or_else(|| source_column.clone()),
                    source_column,
                    alias: alias.clone(),
                    limit: *limit,
                    function_name: name.clone(),
                })
            }
            OperationConfig::Aggregate {
                aggregates,
                by,
                name,
            } => Operation::Aggregate(AggregateOp {
                aggregates: aggregates
                    .iter()
                    .map(|a| {
                        Ok(AggregateRequest {
                            func: a.func.parse::<AggregateFunc>()?,
                            column: a.column.clone(),
                            alias: a.alias.clone(),
                            group_by: a.group_by.clone(),
                        })
                    })
                    .collect::<Result<_, CodegenError>>()?,
                by: parse_conditions(by)?,
                function_name: name.clone(),
            }),
        };
        op.validate()?;
        Ok(op)
    }
}

fn parse_conditions(by: &[String]) -> Result<Vec<Condition>, ValidationError> {
    by.iter().map(|c| Condition::parse(c)).collect()
}

fn parse_order(text: &str) -> Result<(String, Direction), ValidationError> {
    let mut parts = text.split_whitespace();
    let column = parts
        .next()
        .ok_or_else(|| ValidationError::invalid("get", "empty order_by"))?;
    let direction = match parts.next() {
        Some(d) => d.parse()?,
        None => Direction::Asc,
    };
    if let Some(extra) = parts.next() {
        return Err(ValidationError::invalid(
            "get",
            format!("unexpected '{extra}' in order_by"),
        ));
    }
    Ok((column.to_string(), direction))
}

fn manifest_error(message: impl Into<String>) -> CodegenError {
    ValidationError::Manifest(message.into()).into()
}

fn resolve_path(base: &Path, p: &str) -> PathBuf {
    let p = Path::new(p);
    if p.is_absolute() {
        p.to_path_buf()
    } else {
        base.join(p)
    }
}
