//! Normalized view of a model: fields, column mapping and comparability.
//!
//! A [`Schema`] is resolved once per model from `(name, type, column)`
//! triples and is read-only afterwards. Every clause constructor validates its
//! columns against it, so an unknown column can never reach the renderer.

use crate::error::SchemaError;
use std::collections::HashMap;
use std::fmt;

/// Raw field description handed over by the schema extraction step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldDef {
    pub name: String,
    pub ty: String,
    pub column: Option<String>,
}

impl FieldDef {
    pub fn new(name: impl Into<String>, ty: impl Into<String>, column: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ty: ty.into(),
            column: Some(column.into()),
        }
    }

    /// A field without a column mapping (rejected by [`Schema::resolve`]).
    pub fn unmapped(name: impl Into<String>, ty: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ty: ty.into(),
            column: None,
        }
    }
}

/// Value class of a field, derived from its declared type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FieldKind {
    Integer,
    Float,
    Decimal,
    Bool,
    Text,
    Bytes,
    Uuid,
    Timestamp,
    Date,
    Json,
}

impl FieldKind {
    /// Numeric and ordinal kinds accept range operators.
    pub fn is_comparable(self) -> bool {
        matches!(
            self,
            FieldKind::Integer
                | FieldKind::Float
                | FieldKind::Decimal
                | FieldKind::Timestamp
                | FieldKind::Date
        )
    }
}

/// A resolved model field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Field {
    name: String,
    ty: String,
    column: String,
    kind: FieldKind,
    comparable: bool,
    nullable: bool,
}

impl Field {
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Declared type as written in the model, e.g. `Option<i64>`.
    pub fn ty(&self) -> &str {
        &self.ty
    }

    pub fn column(&self) -> &str {
        &self.column
    }

    pub fn kind(&self) -> FieldKind {
        self.kind
    }

    pub fn comparable(&self) -> bool {
        self.comparable
    }

    pub fn nullable(&self) -> bool {
        self.nullable
    }
}

/// A column reference as it appears in rendered SQL.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ColumnRef {
    /// `qualifier.column`, used with table aliases and joins
    Qualified { qualifier: String, column: String },
    /// Bare column name
    Raw(String),
}

impl ColumnRef {
    pub fn raw(column: impl Into<String>) -> Self {
        ColumnRef::Raw(column.into())
    }

    /// The unqualified column name.
    pub fn column(&self) -> &str {
        match self {
            ColumnRef::Qualified { column, .. } | ColumnRef::Raw(column) => column,
        }
    }
}

impl fmt::Display for ColumnRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ColumnRef::Qualified { qualifier, column } => write!(f, "{qualifier}.{column}"),
            ColumnRef::Raw(column) => f.write_str(column),
        }
    }
}

/// Resolved model schema with bijective name/column lookups.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Schema {
    model: String,
    table: String,
    fields: Vec<Field>,
    name_to_type: HashMap<String, String>,
    column_to_name: HashMap<String, String>,
    name_to_column: HashMap<String, String>,
    primary_key: Option<String>,
}

impl Schema {
    /// Resolve a model description into a schema.
    ///
    /// Fails on duplicate fields/columns, fields without a column mapping and
    /// declared types that are not well-formed type expressions.
    pub fn resolve(
        model: impl Into<String>,
        table: impl Into<String>,
        defs: impl IntoIterator<Item = FieldDef>,
    ) -> Result<Self, SchemaError> {
        let mut schema = Schema {
            model: model.into(),
            table: table.into(),
            fields: Vec::new(),
            name_to_type: HashMap::new(),
            column_to_name: HashMap::new(),
            name_to_column: HashMap::new(),
            primary_key: None,
        };

        for def in defs {
            let column = match def.column.as_deref().map(str::trim) {
                Some(c) if !c.is_empty() => c.to_string(),
                _ => return Err(SchemaError::MissingColumnMapping(def.name)),
            };

            let (kind, nullable) =
                classify_type(&def.ty).ok_or_else(|| SchemaError::UnresolvedType {
                    field: def.name.clone(),
                    ty: def.ty.clone(),
                })?;

            if schema.name_to_column.contains_key(&def.name) {
                return Err(SchemaError::DuplicateField(def.name));
            }
            if let Some(first) = schema.column_to_name.get(&column) {
                return Err(SchemaError::DuplicateColumn {
                    column,
                    first: first.clone(),
                    second: def.name,
                });
            }

            schema.name_to_type.insert(def.name.clone(), def.ty.clone());
            schema.column_to_name.insert(column.clone(), def.name.clone());
            schema.name_to_column.insert(def.name.clone(), column.clone());
            schema.fields.push(Field {
                name: def.name,
                ty: def.ty.trim().to_string(),
                column,
                kind,
                comparable: kind.is_comparable(),
                nullable,
            });
        }

        for field in &schema.fields {
            if let Some(owner) = schema.column_to_name.get(&field.name)
                && owner != &field.name
            {
                return Err(SchemaError::AmbiguousName {
                    name: field.name.clone(),
                    owner: owner.clone(),
                });
            }
        }

        schema.primary_key = if schema.column_to_name.contains_key("id") {
            Some("id".to_string())
        } else {
            schema.fields.first().map(|f| f.column.clone())
        };

        Ok(schema)
    }

    /// Override the primary key column used by `first`/`last`.
    pub fn with_primary_key(mut self, column: &str) -> Result<Self, SchemaError> {
        let column = self.column_name(column)?.to_string();
        self.primary_key = Some(column);
        Ok(self)
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn table(&self) -> &str {
        &self.table
    }

    pub fn fields(&self) -> &[Field] {
        &self.fields
    }

    pub fn primary_key(&self) -> Option<&str> {
        self.primary_key.as_deref()
    }

    /// Declared type of a field, by field name.
    pub fn type_of(&self, name: &str) -> Option<&str> {
        self.name_to_type.get(name).map(String::as_str)
    }

    /// Field name mapped to a column.
    pub fn name_of(&self, column: &str) -> Option<&str> {
        self.column_to_name.get(column).map(String::as_str)
    }

    /// Column mapped to a field name.
    pub fn column_of(&self, name: &str) -> Option<&str> {
        self.name_to_column.get(name).map(String::as_str)
    }

    /// Look up a field by column name or field name (column names win).
    pub fn field(&self, name: &str) -> Option<&Field> {
        let column = if self.column_to_name.contains_key(name) {
            name
        } else {
            self.column_of(name)?
        };
        self.fields.iter().find(|f| f.column == column)
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.field(name).is_some()
    }

    /// Like [`Schema::field`], failing with `UnknownColumn`.
    pub fn require(&self, name: &str) -> Result<&Field, SchemaError> {
        self.field(name)
            .ok_or_else(|| SchemaError::unknown(&self.model, name))
    }

    fn column_name(&self, name: &str) -> Result<&str, SchemaError> {
        self.require(name).map(Field::column)
    }

    /// Resolve a column (or field name) into a bare column reference.
    pub fn column(&self, name: &str) -> Result<ColumnRef, SchemaError> {
        self.column_name(name).map(ColumnRef::raw)
    }

    /// Resolve a column (or field name) into a `qualifier.column` reference.
    pub fn qualified(&self, qualifier: &str, name: &str) -> Result<ColumnRef, SchemaError> {
        self.column_name(name).map(|column| ColumnRef::Qualified {
            qualifier: qualifier.to_string(),
            column: column.to_string(),
        })
    }

    /// Ensure a range operator is applied to a comparable column.
    pub fn require_comparable(&self, name: &str, op: &'static str) -> Result<(), SchemaError> {
        let field = self.require(name)?;
        if field.comparable {
            Ok(())
        } else {
            Err(SchemaError::NotComparable {
                column: field.column.clone(),
                op,
            })
        }
    }
}

/// Classify a declared Rust type. Returns `(kind, nullable)`, or `None` when
/// the text is not a well-formed type expression or has no [`Value`]
/// conversion in both directions.
///
/// [`Value`]: crate::Value
pub fn classify_type(ty: &str) -> Option<(FieldKind, bool)> {
    let ty = ty.trim();
    if !is_well_formed(ty) {
        return None;
    }

    if let Some(inner) = strip_generic(ty, "Option") {
        let (kind, _) = classify_type(inner)?;
        return Some((kind, true));
    }
    if let Some(inner) = strip_generic(ty, "Vec") {
        return (inner == "u8").then_some((FieldKind::Bytes, false));
    }
    if let Some(zone) = strip_generic(ty, "DateTime") {
        return (last_segment(zone) == "Utc").then_some((FieldKind::Timestamp, false));
    }

    let kind = match last_segment(ty) {
        "i8" | "i16" | "i32" | "i64" | "u8" | "u16" | "u32" => FieldKind::Integer,
        "f32" | "f64" => FieldKind::Float,
        "Decimal" => FieldKind::Decimal,
        "bool" => FieldKind::Bool,
        "String" => FieldKind::Text,
        "Uuid" => FieldKind::Uuid,
        "NaiveDateTime" => FieldKind::Timestamp,
        "NaiveDate" => FieldKind::Date,
        "Value" => FieldKind::Json,
        _ => return None,
    };
    Some((kind, false))
}

fn last_segment(path: &str) -> &str {
    path.rsplit("::").next().unwrap_or(path).trim()
}

/// `Wrapper<inner>` -> `inner`, also accepting a path prefix such as
/// `std::option::Option<...>`.
fn strip_generic<'a>(ty: &'a str, wrapper: &str) -> Option<&'a str> {
    let open = ty.find('<')?;
    let head = ty[..open].trim();
    let head = head.rsplit("::").next().unwrap_or(head);
    if head != wrapper || !ty.ends_with('>') {
        return None;
    }
    Some(ty[open + 1..ty.len() - 1].trim())
}

fn is_well_formed(ty: &str) -> bool {
    if ty.is_empty() {
        return false;
    }
    let first = ty.trim_start_matches('&').chars().next();
    if !matches!(first, Some(c) if c.is_ascii_alphabetic() || c == '_' || c == '[' || c == '(') {
        return false;
    }

    let mut depth: i32 = 0;
    for c in ty.chars() {
        match c {
            '<' | '[' | '(' => depth += 1,
            '>' | ']' | ')' => {
                depth -= 1;
                if depth < 0 {
                    return false;
                }
            }
            c if c.is_ascii_alphanumeric() => {}
            '_' | ':' | ',' | ' ' | '&' | '\'' | ';' => {}
            _ => return false,
        }
    }
    depth == 0
}
