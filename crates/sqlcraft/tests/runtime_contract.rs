use sqlcraft::assemble::{self, JoinSide};
use sqlcraft::{
    AggregateFunc, CraftError, CraftResult, Dialect, Direction, FieldDef, FromRow, GenericClient,
    JoinKind, Model, Op, Query, QueryBuilder, RenderError, Renderer, Row, Schema, SchemaError,
    Value,
};
use std::sync::Mutex;

#[derive(Debug, Clone, PartialEq)]
struct User {
    id: i64,
    name: String,
    age: i32,
}

impl FromRow for User {
    fn from_row(row: &Row) -> CraftResult<Self> {
        Ok(Self {
            id: row.try_get("id")?,
            name: row.try_get("name")?,
            age: row.try_get("age")?,
        })
    }
}

impl Model for User {
    const MODEL: &'static str = "User";
    const TABLE: &'static str = "users";

    fn fields() -> Vec<FieldDef> {
        vec![
            FieldDef::new("id", "i64", "id"),
            FieldDef::new("name", "String", "name"),
            FieldDef::new("age", "i32", "age"),
        ]
    }
}

#[derive(Default)]
struct MockClient {
    rows: Vec<Row>,
    calls: Mutex<Vec<(String, Vec<Value>)>>,
}

impl MockClient {
    fn record(&self, sql: &str, args: &[Value]) {
        self.calls
            .lock()
            .unwrap()
            .push((sql.to_string(), args.to_vec()));
    }
}

impl GenericClient for MockClient {
    async fn query(&self, sql: &str, args: &[Value]) -> CraftResult<Vec<Row>> {
        self.record(sql, args);
        Ok(self.rows.clone())
    }

    async fn execute(&self, sql: &str, args: &[Value]) -> CraftResult<u64> {
        self.record(sql, args);
        Ok(1)
    }
}

fn users() -> Schema {
    User::schema().unwrap()
}

fn placeholder_count(sql: &str, dialect: Dialect) -> usize {
    match dialect {
        Dialect::MySql | Dialect::Sqlite => sql.matches('?').count(),
        Dialect::Postgres => sql.matches('$').count(),
        Dialect::SqlServer => sql.matches("@p").count(),
    }
}

// ==================== Scenarios ====================

#[test]
fn scenario_a_select_with_equality() {
    let r = QueryBuilder::<User>::new(Dialect::MySql)
        .eq("age", 10)
        .render()
        .unwrap();
    assert_eq!(r.sql, "SELECT * FROM users WHERE age = ?");
    assert_eq!(r.args, vec![Value::Int(10)]);
}

#[test]
fn scenario_b_update_args_follow_text() {
    let r = QueryBuilder::<User>::new(Dialect::MySql)
        .set("age", 11)
        .gt("age", 10)
        .render()
        .unwrap();
    assert_eq!(r.sql, "UPDATE users SET age = ? WHERE age > ?");
    assert_eq!(r.args, vec![Value::Int(11), Value::Int(10)]);
}

#[test]
fn scenario_c_order_and_limit() {
    let r = QueryBuilder::<User>::new(Dialect::MySql)
        .eq("age", 10)
        .order_by("id", Direction::Desc)
        .limit(1)
        .render()
        .unwrap();
    assert_eq!(
        r.sql,
        "SELECT * FROM users WHERE age = ? ORDER BY id DESC LIMIT 1"
    );
}

#[test]
fn scenario_d_left_join_fragment() {
    let fields = || {
        vec![
            FieldDef::new("var1", "i64", "var1"),
            FieldDef::new("var2", "String", "var2"),
        ]
    };
    let source = Schema::resolve("JoinExample", "join_example", fields()).unwrap();
    let target = Schema::resolve("Example", "example", fields()).unwrap();

    let kind: JoinKind = "left".parse().unwrap();
    let alias = assemble::default_alias(target.table(), Some("j"));
    let spec = assemble::join(
        kind,
        JoinSide::new(&source, "j", "var1"),
        JoinSide::new(&target, &alias, "var1"),
    )
    .unwrap();

    let mut q: Query<Value> = Query::select(&source).with_alias("j");
    q.join(spec);
    let r = Renderer::new(Dialect::MySql).render(&q).unwrap();
    assert!(
        r.sql.contains("LEFT JOIN example AS e ON j.var1 = e.var1"),
        "{}",
        r.sql
    );
}

#[test]
fn scenario_e_aggregate_with_group_by() {
    let schema = Schema::resolve(
        "T",
        "t",
        [
            FieldDef::new("var1", "i64", "var1"),
            FieldDef::new("var2", "String", "var2"),
        ],
    )
    .unwrap();

    let func: AggregateFunc = "COUNT".parse().unwrap();
    let mut q: Query<Value> = Query::select(&schema);
    q.aggregate(assemble::aggregate(&schema, None, func, "var1", "cnt", &["var2"]).unwrap());
    q.filter(&schema, "var1", Op::gt(5)).unwrap();

    let r = Renderer::new(Dialect::Postgres).render(&q).unwrap();
    assert!(r.sql.starts_with("SELECT COUNT(var1) AS cnt FROM t "));
    assert!(r.sql.ends_with(" GROUP BY var2"));
    assert_eq!(
        r.sql,
        "SELECT COUNT(var1) AS cnt FROM t WHERE var1 > $1 GROUP BY var2"
    );
}

#[tokio::test]
async fn scenario_f_unknown_column_emits_nothing() {
    let client = MockClient::default();
    let err = QueryBuilder::<User>::new(Dialect::MySql)
        .eq("ghost", 1)
        .fetch(&client)
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        CraftError::Schema(SchemaError::UnknownColumn { ref column, .. }) if column == "ghost"
    ));
    assert!(client.calls.lock().unwrap().is_empty());
}

// ==================== Properties ====================

#[test]
fn rendering_is_deterministic() {
    let build = || {
        QueryBuilder::<User>::new(Dialect::Postgres)
            .set("name", "x")
            .in_list("id", [1, 2, 3])
            .lte("age", 50)
    };
    let qb = build();
    assert_eq!(qb.render().unwrap(), qb.render().unwrap());
    assert_eq!(qb.render().unwrap(), build().render().unwrap());
}

#[test]
fn placeholder_count_matches_args_for_every_dialect() {
    for dialect in Dialect::ALL {
        let select = QueryBuilder::<User>::new(dialect)
            .eq("name", "a")
            .in_list("id", [1, 2, 3])
            .is_null("age")
            .not_in("age", [7, 8])
            .render()
            .unwrap();
        assert_eq!(placeholder_count(&select.sql, dialect), select.args.len());
        assert_eq!(select.args.len(), 6);

        let update = QueryBuilder::<User>::new(dialect)
            .set("name", "b")
            .set("age", 3)
            .eq("id", 9)
            .render()
            .unwrap();
        assert_eq!(placeholder_count(&update.sql, dialect), update.args.len());
    }
}

#[test]
fn update_args_are_set_then_where_in_any_call_order() {
    let expected = vec![Value::from("n"), Value::Int(5), Value::Int(1), Value::Int(2)];

    let a = QueryBuilder::<User>::new(Dialect::MySql)
        .set("name", "n")
        .set("age", 5)
        .eq("id", 1)
        .gt("age", 2)
        .render()
        .unwrap();
    let b = QueryBuilder::<User>::new(Dialect::MySql)
        .eq("id", 1)
        .set("name", "n")
        .gt("age", 2)
        .set("age", 5)
        .render()
        .unwrap();

    assert_eq!(a.args, expected);
    assert_eq!(b.args, expected);
    assert_eq!(a.sql, b.sql);
}

#[test]
fn unknown_columns_fail_in_every_clause_kind() {
    let schema = users();
    let is_unknown = |e: SchemaError| matches!(e, SchemaError::UnknownColumn { .. });

    let mut q: Query<Value> = Query::select(&schema);
    assert!(is_unknown(q.filter(&schema, "ghost", Op::eq(1)).unwrap_err()));
    assert!(is_unknown(q.assign(&schema, "ghost", 1).unwrap_err()));
    assert!(is_unknown(q.project(&schema, ["id", "ghost"]).unwrap_err()));
    assert!(is_unknown(
        q.order_by(&schema, "ghost", Direction::Asc).unwrap_err()
    ));
    assert!(is_unknown(
        assemble::aggregate(&schema, None, AggregateFunc::Sum, "ghost", "s", &[]).unwrap_err()
    ));
    assert!(is_unknown(
        assemble::aggregate(&schema, None, AggregateFunc::Sum, "age", "s", &["ghost"])
            .unwrap_err()
    ));
    assert!(is_unknown(
        assemble::join(
            JoinKind::Inner,
            JoinSide::new(&schema, "u", "ghost"),
            JoinSide::new(&schema, "v", "id"),
        )
        .unwrap_err()
    ));

    // Nothing was appended by the failed calls.
    let r = Renderer::new(Dialect::MySql).render(&q).unwrap();
    assert_eq!(r.sql, "SELECT * FROM users");
}

#[test]
fn switching_dialect_only_changes_placeholders() {
    let normalize = |sql: &str| -> String {
        let mut out = String::new();
        let mut chars = sql.chars().peekable();
        while let Some(c) = chars.next() {
            match c {
                '$' => {
                    while chars.peek().is_some_and(|c| c.is_ascii_digit()) {
                        chars.next();
                    }
                    out.push('?');
                }
                '@' if chars.peek() == Some(&'p') => {
                    chars.next();
                    while chars.peek().is_some_and(|c| c.is_ascii_digit()) {
                        chars.next();
                    }
                    out.push('?');
                }
                c => out.push(c),
            }
        }
        out
    };

    let rendered: Vec<String> = Dialect::ALL
        .iter()
        .map(|&d| {
            QueryBuilder::<User>::new(d)
                .set("age", 1)
                .eq("id", 2)
                .ne("name", "x")
                .render()
                .unwrap()
                .sql
        })
        .collect();

    for sql in &rendered {
        assert_eq!(normalize(sql), normalize(&rendered[0]));
    }
    assert_eq!(rendered[2], "UPDATE users SET age = $1 WHERE id = $2 AND name != $3");
    assert_eq!(rendered[3], "UPDATE users SET age = @p1 WHERE id = @p2 AND name != @p3");
}

#[test]
fn unsupported_names_are_render_errors() {
    assert_eq!(
        "MEDIAN".parse::<AggregateFunc>().unwrap_err(),
        RenderError::UnsupportedAggregate("MEDIAN".to_string())
    );
    assert!(matches!(
        "db2".parse::<Dialect>().unwrap_err(),
        RenderError::UnsupportedDialect(_)
    ));
}

#[tokio::test]
async fn last_returns_single_model() {
    let client = MockClient {
        rows: vec![Row::new().with("id", 3i64).with("name", "c").with("age", 33)],
        ..Default::default()
    };
    let user = QueryBuilder::<User>::new(Dialect::Postgres)
        .gt("age", 30)
        .last(&client)
        .await
        .unwrap();
    assert_eq!(
        user,
        User {
            id: 3,
            name: "c".to_string(),
            age: 33
        }
    );

    let calls = client.calls.lock().unwrap();
    assert_eq!(
        calls[0].0,
        "SELECT * FROM users WHERE age > $1 ORDER BY id DESC LIMIT 1"
    );
}
