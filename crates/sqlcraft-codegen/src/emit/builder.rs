use super::{EmitOptions, dialect_path, inner_type};
use crate::naming;
use sqlcraft::{Field, Schema};

pub(super) fn push_header(out: &mut String, options: &EmitOptions) {
    out.push_str("// @generated by sqlcraft-codegen. Do not edit.\n");
    if let Some(header) = &options.header {
        for line in header.lines() {
            if line.is_empty() {
                out.push_str("//\n");
            } else {
                out.push_str(&format!("// {line}\n"));
            }
        }
    }
    out.push('\n');
}

/// `impl FromRow`/`impl Model` for the model, its column constants and a typed
/// fluent builder over `sqlcraft::QueryBuilder`.
pub(super) fn emit(schema: &Schema, options: &EmitOptions) -> String {
    let model = schema.model();
    let columns = format!("{model}Columns");

    let mut out = String::new();
    push_header(&mut out, options);
    out.push_str(
        "use sqlcraft::{\n    CraftResult, Dialect, Direction, FieldDef, FromRow, GenericClient, Model, \
         QueryBuilder, Rendered,\n    Row, Value,\n};\n",
    );
    out.push_str(&format!("use {}::{model};\n\n", options.model_path));

    // FromRow
    out.push_str(&format!("impl FromRow for {model} {{\n"));
    out.push_str("    fn from_row(row: &Row) -> CraftResult<Self> {\n        Ok(Self {\n");
    for field in schema.fields() {
        out.push_str(&format!(
            "            {}: row.try_get({:?})?,\n",
            naming::field_ident(field.name()),
            field.column()
        ));
    }
    out.push_str("        })\n    }\n}\n\n");

    // Model
    out.push_str(&format!("impl Model for {model} {{\n"));
    out.push_str(&format!("    const MODEL: &'static str = {model:?};\n"));
    out.push_str(&format!("    const TABLE: &'static str = {:?};\n", schema.table()));
    if let Some(pk) = schema.primary_key() {
        out.push_str(&format!(
            "    const PRIMARY_KEY: Option<&'static str> = Some({pk:?});\n"
        ));
    }
    out.push_str("\n    fn fields() -> Vec<FieldDef> {\n        vec![\n");
    for field in schema.fields() {
        out.push_str(&format!(
            "            FieldDef::new({:?}, {:?}, {:?}),\n",
            field.name(),
            field.ty(),
            field.column()
        ));
    }
    out.push_str("        ]\n    }\n}\n\n");

    // Columns
    out.push_str(&format!("/// Column names of [`{model}`].\n"));
    out.push_str(&format!("pub struct {columns};\n\n"));
    out.push_str(&format!("impl {columns} {{\n"));
    for field in schema.fields() {
        out.push_str(&format!(
            "    pub const {}: &'static str = {:?};\n",
            naming::const_ident(field.column()),
            field.column()
        ));
    }
    out.push_str("}\n\n");

    push_query_builder(&mut out, schema, options);
    out
}

fn push_query_builder(out: &mut String, schema: &Schema, options: &EmitOptions) {
    let model = schema.model();
    let builder = format!("{model}QueryBuilder");

    out.push_str(&format!(
        "/// Fluent query builder for [`{model}`].\n\
         pub struct {builder} {{\n    inner: QueryBuilder<{model}>,\n}}\n\n"
    ));
    out.push_str(&format!(
        "impl Default for {builder} {{\n    fn default() -> Self {{\n        Self::new()\n    }}\n}}\n\n"
    ));

    out.push_str(&format!("impl {builder} {{\n"));
    out.push_str(&format!(
        "    pub fn new() -> Self {{\n        Self::with_dialect({})\n    }}\n\n",
        dialect_path(options.dialect)
    ));
    out.push_str(
        "    pub fn with_dialect(dialect: Dialect) -> Self {\n\
         \x20       Self {\n\
         \x20           inner: QueryBuilder::new(dialect),\n\
         \x20       }\n\
         \x20   }\n",
    );

    for field in schema.fields() {
        push_field_methods(out, model, field);
    }

    out.push_str(
        "\n    pub fn select_all(self) -> Self {\n\
         \x20       Self {\n\
         \x20           inner: self.inner.select_all(),\n\
         \x20       }\n\
         \x20   }\n",
    );
    out.push_str(
        "\n    pub fn limit(self, n: u64) -> Self {\n\
         \x20       Self {\n\
         \x20           inner: self.inner.limit(n),\n\
         \x20       }\n\
         \x20   }\n\
         \n    pub fn offset(self, n: u64) -> Self {\n\
         \x20       Self {\n\
         \x20           inner: self.inner.offset(n),\n\
         \x20       }\n\
         \x20   }\n\
         \n    pub fn render(&self) -> CraftResult<Rendered<Value>> {\n\
         \x20       self.inner.render()\n\
         \x20   }\n",
    );
    out.push_str(&format!(
        "\n    pub fn into_inner(self) -> QueryBuilder<{model}> {{\n        self.inner\n    }}\n"
    ));

    for (finisher, output) in [
        ("fetch", format!("Vec<{model}>")),
        ("fetch_rows", "Vec<Row>".to_string()),
        ("first", model.to_string()),
        ("last", model.to_string()),
        ("update", "u64".to_string()),
        ("delete", "u64".to_string()),
    ] {
        out.push_str(&format!(
            "\n    pub async fn {finisher}(self, client: &impl GenericClient) -> CraftResult<{output}> {{\n\
             \x20       self.inner.{finisher}(client).await\n\
             \x20   }}\n"
        ));
    }
    out.push_str("}\n");
}

fn push_field_methods(out: &mut String, model: &str, field: &Field) {
    let stem = naming::snake(field.name());
    let column = format!("{model}Columns::{}", naming::const_ident(field.column()));
    let ty = field.ty();
    let inner = inner_type(ty);

    let mut wrap = |name: String, params: String, call: String| {
        out.push_str(&format!(
            "\n    pub fn {name}(self{params}) -> Self {{\n\
             \x20       Self {{\n\
             \x20           inner: self.inner.{call},\n\
             \x20       }}\n\
             \x20   }}\n"
        ));
    };

    let mut ops = vec![("eq", "eq"), ("ne", "ne")];
    if field.comparable() {
        ops.extend([("gt", "gt"), ("gte", "gte"), ("lt", "lt"), ("lte", "lte")]);
    }
    for (suffix, method) in ops {
        wrap(
            format!("where_{stem}_{suffix}"),
            format!(", value: {inner}"),
            format!("{method}({column}, value)"),
        );
    }
    for (suffix, method) in [("in", "in_list"), ("not_in", "not_in")] {
        wrap(
            format!("where_{stem}_{suffix}"),
            format!(", values: impl IntoIterator<Item = {inner}>"),
            format!("{method}({column}, values)"),
        );
    }
    if field.nullable() {
        for method in ["is_null", "is_not_null"] {
            wrap(
                format!("where_{stem}_{method}"),
                String::new(),
                format!("{method}({column})"),
            );
        }
    }
    wrap(
        format!("set_{stem}"),
        format!(", value: {ty}"),
        format!("set({column}, value)"),
    );
    wrap(
        format!("select_{stem}"),
        String::new(),
        format!("select([{column}])"),
    );
    wrap(
        format!("order_by_{stem}"),
        ", direction: Direction".to_string(),
        format!("order_by({column}, direction)"),
    );
}
