use super::{EmitOptions, Function, Output};
use crate::naming;
use sqlcraft::Schema;

pub(super) fn emit(schema: &Schema, functions: &[Function], options: &EmitOptions) -> String {
    let model = schema.model();
    let error = format!("{model}Error");

    let mut out = String::new();
    super::builder::push_header(&mut out, options);

    let decodes = functions
        .iter()
        .any(|f| !matches!(f.output, Output::Affected));
    let mut imports = vec!["CraftError", "GenericClient"];
    if decodes {
        imports.push("FromRow");
    }
    if !functions.is_empty() {
        imports.push("Value");
    }
    imports.sort_unstable();
    out.push_str(&format!("use sqlcraft::{{{}}};\n", imports.join(", ")));
    if functions.iter().any(|f| f.uses_model) {
        out.push_str(&format!("use {}::{model};\n", options.model_path));
    }
    out.push('\n');

    push_error(&mut out, model, &error);

    for f in functions {
        if let Output::Aggregate { row, columns, .. } = &f.output {
            push_aggregate_row(&mut out, model, f, row, columns);
        }
    }

    out.push_str(&format!("/// Data access for [`{model}`].\n"));
    out.push_str(&format!("pub trait {model}Repository {{\n"));
    for (i, f) in functions.iter().enumerate() {
        if i > 0 {
            out.push('\n');
        }
        out.push_str(&format!("    /// `{}`\n", f.sql));
        out.push_str(&format!(
            "    {} -> impl std::future::Future<Output = {}> + Send;\n",
            signature(f),
            result_type(f, model, &error)
        ));
    }
    out.push_str("}\n\n");

    out.push_str(&format!(
        "/// [`{model}Repository`] over any [`GenericClient`].\n\
         pub struct Sql{model}Repository<C> {{\n    client: C,\n}}\n\n"
    ));
    out.push_str(&format!(
        "impl<C: GenericClient> Sql{model}Repository<C> {{\n\
         \x20   pub fn new(client: C) -> Self {{\n\
         \x20       Self {{ client }}\n\
         \x20   }}\n\n\
         \x20   pub fn client(&self) -> &C {{\n\
         \x20       &self.client\n\
         \x20   }}\n\n\
         \x20   pub fn into_inner(self) -> C {{\n\
         \x20       self.client\n\
         \x20   }}\n\
         }}\n\n"
    ));

    out.push_str(&format!(
        "impl<C: GenericClient> {model}Repository for Sql{model}Repository<C> {{\n"
    ));
    for (i, f) in functions.iter().enumerate() {
        if i > 0 {
            out.push('\n');
        }
        push_body(&mut out, f, model, &error);
    }
    out.push_str("}\n");

    out
}

fn push_error(out: &mut String, model: &str, error: &str) {
    out.push_str(&format!(
        "/// Error returned by [`{model}Repository`].\n\
         #[derive(Debug)]\n\
         pub enum {error} {{\n\
         \x20   /// A single-row read matched nothing.\n\
         \x20   NotFound,\n\
         \x20   Database(CraftError),\n\
         }}\n\n"
    ));
    out.push_str(&format!(
        "impl std::fmt::Display for {error} {{\n\
         \x20   fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {{\n\
         \x20       match self {{\n\
         \x20           {error}::NotFound => f.write_str(\"{model} not found\"),\n\
         \x20           {error}::Database(e) => write!(f, \"{model} repository: {{e}}\"),\n\
         \x20       }}\n\
         \x20   }}\n\
         }}\n\n"
    ));
    out.push_str(&format!(
        "impl std::error::Error for {error} {{\n\
         \x20   fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {{\n\
         \x20       match self {{\n\
         \x20           {error}::NotFound => None,\n\
         \x20           {error}::Database(e) => Some(e),\n\
         \x20       }}\n\
         \x20   }}\n\
         }}\n\n"
    ));
    out.push_str(&format!(
        "impl From<CraftError> for {error} {{\n\
         \x20   fn from(e: CraftError) -> Self {{\n\
         \x20       if e.is_not_found() {{\n\
         \x20           {error}::NotFound\n\
         \x20       }} else {{\n\
         \x20           {error}::Database(e)\n\
         \x20       }}\n\
         \x20   }}\n\
         }}\n\n"
    ));
}

fn push_aggregate_row(
    out: &mut String,
    model: &str,
    f: &Function,
    row: &str,
    columns: &[(String, String)],
) {
    out.push_str(&format!(
        "/// Row of [`{model}Repository::{}`].\n",
        f.ident
    ));
    out.push_str("#[derive(Debug, Clone, PartialEq)]\n");
    out.push_str(&format!("pub struct {row} {{\n"));
    for (alias, ty) in columns {
        out.push_str(&format!("    pub {}: {ty},\n", naming::field_ident(alias)));
    }
    out.push_str("}\n\n");

    out.push_str(&format!("impl FromRow for {row} {{\n"));
    out.push_str("    fn from_row(row: &sqlcraft::Row) -> sqlcraft::CraftResult<Self> {\n");
    out.push_str("        Ok(Self {\n");
    for (alias, _) in columns {
        out.push_str(&format!(
            "            {}: row.try_get({alias:?})?,\n",
            naming::field_ident(alias)
        ));
    }
    out.push_str("        })\n    }\n}\n\n");
}

fn signature(f: &Function) -> String {
    let params: String = f
        .params
        .iter()
        .map(|p| format!(", {}: {}", p.ident, p.ty))
        .collect();
    format!("fn {}(&self{params})", f.ident)
}

fn result_type(f: &Function, model: &str, error: &str) -> String {
    let ok = match &f.output {
        Output::One => model.to_string(),
        Output::Many => format!("Vec<{model}>"),
        Output::Affected => "u64".to_string(),
        Output::Aggregate { row, many: true, .. } => format!("Vec<{row}>"),
        Output::Aggregate { row, .. } => row.clone(),
    };
    format!("Result<{ok}, {error}>")
}

fn push_body(out: &mut String, f: &Function, model: &str, error: &str) {
    out.push_str(&format!(
        "    async {} -> {} {{\n",
        signature(f),
        result_type(f, model, error)
    ));
    let args = f
        .args
        .iter()
        .map(|a| format!("Value::from({a})"))
        .collect::<Vec<_>>()
        .join(", ");
    out.push_str(&format!(
        "        let args: [Value; {}] = [{args}];\n",
        f.args.len()
    ));

    let sql = format!("{:?}", f.sql);
    match &f.output {
        Output::Affected => {
            out.push_str(&format!(
                "        Ok(self.client.execute({sql}, &args).await?)\n"
            ));
        }
        Output::One => push_single(out, &sql, model, error),
        Output::Aggregate { row, many: false, .. } => push_single(out, &sql, row, error),
        Output::Many => push_many(out, &sql, model),
        Output::Aggregate { row, .. } => push_many(out, &sql, row),
    }
    out.push_str("    }\n");
}

fn push_single(out: &mut String, sql: &str, ty: &str, error: &str) {
    out.push_str(&format!(
        "        let row = self\n\
         \x20           .client\n\
         \x20           .query_opt({sql}, &args)\n\
         \x20           .await?\n\
         \x20           .ok_or({error}::NotFound)?;\n\
         \x20       Ok({ty}::from_row(&row)?)\n"
    ));
}

fn push_many(out: &mut String, sql: &str, ty: &str) {
    out.push_str(&format!(
        "        let rows = self.client.query({sql}, &args).await?;\n\
         \x20       Ok(rows\n\
         \x20           .iter()\n\
         \x20           .map({ty}::from_row)\n\
         \x20           .collect::<Result<Vec<_>, _>>()?)\n"
    ));
}
