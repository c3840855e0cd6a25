use super::{EmitOptions, Function, Output};
use crate::naming;
use sqlcraft::{Field, FieldKind, Schema};

const MOCK_CLIENT: &str = r#"/// Records every statement and answers with canned rows.
struct MockClient {
    rows: Vec<Row>,
    calls: Mutex<Vec<(String, usize)>>,
}

impl MockClient {
    fn returning(rows: Vec<Row>) -> Self {
        Self {
            rows,
            calls: Mutex::new(Vec::new()),
        }
    }

    fn calls(&self) -> Vec<(String, usize)> {
        self.calls.lock().unwrap().clone()
    }
}

impl GenericClient for MockClient {
    async fn query(&self, sql: &str, args: &[Value]) -> CraftResult<Vec<Row>> {
        self.calls.lock().unwrap().push((sql.to_string(), args.len()));
        Ok(self.rows.clone())
    }

    async fn execute(&self, sql: &str, args: &[Value]) -> CraftResult<u64> {
        self.calls.lock().unwrap().push((sql.to_string(), args.len()));
        Ok(1)
    }
}
"#;

/// Tokio tests running every repository function against an in-memory
/// client. The unit is a child module of the repository unit.
pub(super) fn emit(schema: &Schema, functions: &[Function], options: &EmitOptions) -> String {
    let model = schema.model();
    let sample = format!("sample_{}", naming::snake(model));

    let mut out = String::new();
    super::builder::push_header(&mut out, options);
    let takes_record = functions
        .iter()
        .any(|f| f.params.iter().any(|p| p.ty.starts_with('&')));
    out.push_str("use super::*;\n");
    if takes_record {
        out.push_str("use sqlcraft::{CraftResult, FromRow, GenericClient, Row, Value};\n");
    } else {
        out.push_str("use sqlcraft::{CraftResult, GenericClient, Row, Value};\n");
    }
    out.push_str("use std::sync::Mutex;\n\n");
    out.push_str(MOCK_CLIENT);

    if functions.iter().any(|f| f.uses_model) {
        out.push_str("\nfn sample_row() -> Row {\n    Row::new()");
        for field in schema.fields() {
            out.push_str(&format!(
                "\n        .with({:?}, {})",
                field.column(),
                sample_value(field)
            ));
        }
        out.push_str("\n}\n");
    }
    if takes_record {
        out.push_str(&format!(
            "\nfn {sample}() -> {model} {{\n    {model}::from_row(&sample_row()).unwrap()\n}}\n"
        ));
    }

    for f in functions {
        push_tests(&mut out, model, f, &sample);
    }
    out
}

/// A column value that decodes into the field's declared type.
fn sample_value(field: &Field) -> String {
    if field.nullable() {
        return "Value::Null".to_string();
    }
    match field.kind() {
        FieldKind::Integer => "Value::Int(1)".to_string(),
        FieldKind::Float => "Value::Float(1.5)".to_string(),
        FieldKind::Bool => "Value::Bool(true)".to_string(),
        FieldKind::Text => format!("Value::Text({:?}.to_string())", field.name()),
        FieldKind::Bytes => "Value::Bytes(vec![1, 2, 3])".to_string(),
        FieldKind::Decimal => "Value::Decimal(Default::default())".to_string(),
        FieldKind::Uuid => "Value::Uuid(Default::default())".to_string(),
        FieldKind::Timestamp => "Value::Timestamp(Default::default())".to_string(),
        FieldKind::Date => "Value::Date(Default::default())".to_string(),
        FieldKind::Json => "Value::Json(Default::default())".to_string(),
    }
}

fn push_tests(out: &mut String, model: &str, f: &Function, sample: &str) {
    let stem = naming::snake(&f.name);
    let args = f
        .params
        .iter()
        .map(|p| {
            if p.ty.starts_with('&') {
                format!("&{sample}()")
            } else {
                "Default::default()".to_string()
            }
        })
        .collect::<Vec<_>>()
        .join(", ");
    let call = format!("repo.{}({args}).await", f.ident);
    let expected = format!("vec![({:?}.to_string(), {})]", f.sql, f.args.len());

    let (rows, check) = match &f.output {
        Output::One => (
            "vec![sample_row()]".to_string(),
            format!("assert!({call}.is_ok());"),
        ),
        Output::Many => (
            "vec![sample_row(), sample_row()]".to_string(),
            format!("assert_eq!({call}.unwrap().len(), 2);"),
        ),
        Output::Affected => ("Vec::new()".to_string(), format!("assert_eq!({call}.unwrap(), 1);")),
        Output::Aggregate { columns, many, .. } => {
            let row: String = columns
                .iter()
                .map(|(alias, ty)| {
                    let value = if ty == "i64" { "Value::Int(3)" } else { "Value::Null" };
                    format!(".with({alias:?}, {value})")
                })
                .collect();
            let check = if *many {
                format!("assert_eq!({call}.unwrap().len(), 1);")
            } else {
                format!("assert!({call}.is_ok());")
            };
            (format!("vec![Row::new(){row}]"), check)
        }
    };

    out.push_str(&format!(
        "\n#[tokio::test]\n\
         async fn {stem}_runs_its_statement() {{\n\
         \x20   let client = MockClient::returning({rows});\n\
         \x20   let repo = Sql{model}Repository::new(&client);\n\
         \x20   {check}\n\
         \x20   assert_eq!(client.calls(), {expected});\n\
         }}\n"
    ));

    let single = matches!(f.output, Output::One | Output::Aggregate { many: false, .. });
    if single {
        out.push_str(&format!(
            "\n#[tokio::test]\n\
             async fn {stem}_reports_not_found() {{\n\
             \x20   let client = MockClient::returning(Vec::new());\n\
             \x20   let repo = Sql{model}Repository::new(&client);\n\
             \x20   assert!(matches!({call}, Err({model}Error::NotFound)));\n\
             }}\n"
        ));
    }
}
