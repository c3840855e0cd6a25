use super::*;
use crate::assemble::{self, JoinSide};
use crate::clause::{AggregateFunc, Direction, JoinKind, Op};
use crate::schema::{FieldDef, Schema};

fn users() -> Schema {
    Schema::resolve(
        "User",
        "users",
        [
            FieldDef::new("id", "i64", "id"),
            FieldDef::new("name", "String", "name"),
            FieldDef::new("age", "i32", "age"),
        ],
    )
    .unwrap()
}

fn render(dialect: Dialect, q: &Query<i64>) -> Rendered<i64> {
    Renderer::new(dialect).render(q).unwrap()
}

#[test]
fn select_with_condition() {
    let schema = users();
    let mut q: Query<i64> = Query::select(&schema);
    q.filter(&schema, "age", Op::eq(10)).unwrap();

    let r = render(Dialect::MySql, &q);
    assert_eq!(r.sql, "SELECT * FROM users WHERE age = ?");
    assert_eq!(r.args, vec![10]);
}

#[test]
fn update_binds_set_before_where() {
    let schema = users();
    let mut q: Query<i64> = Query::update(&schema);
    // WHERE first on purpose: argument order must follow the text.
    q.filter(&schema, "age", Op::gt(10)).unwrap();
    q.assign(&schema, "age", 11).unwrap();

    let r = render(Dialect::MySql, &q);
    assert_eq!(r.sql, "UPDATE users SET age = ? WHERE age > ?");
    assert_eq!(r.args, vec![11, 10]);

    let r = render(Dialect::Postgres, &q);
    assert_eq!(r.sql, "UPDATE users SET age = $1 WHERE age > $2");
    assert_eq!(r.args, vec![11, 10]);
}

#[test]
fn order_and_limit_follow_where() {
    let schema = users();
    let mut q: Query<i64> = Query::select(&schema);
    q.filter(&schema, "age", Op::eq(10)).unwrap();
    q.order_by(&schema, "id", Direction::Desc).unwrap();
    q.limit(1);

    let r = render(Dialect::MySql, &q);
    assert_eq!(
        r.sql,
        "SELECT * FROM users WHERE age = ? ORDER BY id DESC LIMIT 1"
    );
}

#[test]
fn offset_and_projection() {
    let schema = users();
    let mut q: Query<i64> = Query::select(&schema);
    q.project(&schema, ["id", "name"]).unwrap();
    q.limit(20).offset(40);

    let r = render(Dialect::Sqlite, &q);
    assert_eq!(r.sql, "SELECT id, name FROM users LIMIT 20 OFFSET 40");
    assert!(r.args.is_empty());
}

#[test]
fn delete_with_in_list() {
    let schema = users();
    let mut q: Query<i64> = Query::delete(&schema);
    q.filter(&schema, "id", Op::in_list([1, 2, 3])).unwrap();

    let r = render(Dialect::SqlServer, &q);
    assert_eq!(r.sql, "DELETE FROM users WHERE id IN (@p1, @p2, @p3)");
    assert_eq!(r.args, vec![1, 2, 3]);
}

#[test]
fn empty_in_lists_render_constants() {
    let schema = users();
    let mut q: Query<i64> = Query::select(&schema);
    q.filter(&schema, "id", Op::in_list(Vec::<i64>::new())).unwrap();
    q.filter(&schema, "age", Op::not_in(Vec::<i64>::new())).unwrap();

    let r = render(Dialect::Postgres, &q);
    assert_eq!(r.sql, "SELECT * FROM users WHERE 1=0 AND 1=1");
    assert!(r.args.is_empty());
}

#[test]
fn null_checks_bind_nothing() {
    let schema = users();
    let mut q: Query<i64> = Query::select(&schema);
    q.filter(&schema, "name", Op::is_null()).unwrap();
    q.filter(&schema, "age", Op::gte(18)).unwrap();

    let r = render(Dialect::Postgres, &q);
    assert_eq!(r.sql, "SELECT * FROM users WHERE name IS NULL AND age >= $1");
    assert_eq!(r.args, vec![18]);
}

#[test]
fn insert_lists_columns_and_placeholders() {
    let schema = users();
    let mut q: Query<i64> = Query::insert(&schema);
    q.assign(&schema, "name", 7).unwrap();
    q.assign(&schema, "age", 30).unwrap();

    let r = render(Dialect::Postgres, &q);
    assert_eq!(r.sql, "INSERT INTO users (name, age) VALUES ($1, $2)");
    assert_eq!(r.args, vec![7, 30]);
}

#[test]
fn join_and_aggregate() {
    let source = Schema::resolve(
        "JoinExample",
        "join_example",
        [
            FieldDef::new("var1", "i64", "var1"),
            FieldDef::new("var2", "String", "var2"),
        ],
    )
    .unwrap();
    let target = Schema::resolve("Example", "example", [FieldDef::new("var1", "i64", "var1")])
        .unwrap();

    let mut q: Query<i64> = Query::select(&source).with_alias("j");
    q.join(
        assemble::join(
            JoinKind::Left,
            JoinSide::new(&source, "j", "var1"),
            JoinSide::new(&target, "e", "var1"),
        )
        .unwrap(),
    );
    q.filter(&source, "var1", Op::eq(5)).unwrap();

    let r = render(Dialect::MySql, &q);
    assert_eq!(
        r.sql,
        "SELECT * FROM join_example AS j LEFT JOIN example AS e ON j.var1 = e.var1 WHERE j.var1 = ?"
    );

    let mut q: Query<i64> = Query::select(&source);
    q.aggregate(
        assemble::aggregate(&source, None, AggregateFunc::Count, "var1", "cnt", &["var2"])
            .unwrap(),
    );
    q.filter(&source, "var1", Op::gt(0)).unwrap();

    let r = render(Dialect::MySql, &q);
    assert_eq!(
        r.sql,
        "SELECT COUNT(var1) AS cnt FROM join_example WHERE var1 > ? GROUP BY var2"
    );
}

#[test]
fn clause_legality_is_checked() {
    let schema = users();

    let mut q: Query<i64> = Query::update(&schema);
    q.assign(&schema, "age", 1).unwrap();
    q.limit(1);
    assert_eq!(
        Renderer::default().render(&q).unwrap_err(),
        RenderError::ClauseNotAllowed {
            clause: "LIMIT",
            mode: Mode::Update
        }
    );

    let q: Query<i64> = Query::update(&schema);
    assert_eq!(
        Renderer::default().render(&q).unwrap_err(),
        RenderError::EmptySet("users".to_string())
    );

    let mut q: Query<i64> = Query::select(&schema);
    q.assign(&schema, "age", 1).unwrap();
    assert!(matches!(
        Renderer::default().render(&q).unwrap_err(),
        RenderError::ClauseNotAllowed { clause: "SET", .. }
    ));
}

#[test]
fn table_alias_is_select_only() {
    let schema = users();

    let mut q: Query<i64> = Query::update(&schema).with_alias("u");
    q.assign(&schema, "age", 11).unwrap();
    q.filter(&schema, "age", Op::gt(10)).unwrap();
    assert_eq!(
        Renderer::default().render(&q).unwrap_err(),
        RenderError::ClauseNotAllowed {
            clause: "table alias",
            mode: Mode::Update
        }
    );

    let mut q: Query<i64> = Query::delete(&schema).with_alias("u");
    q.filter(&schema, "id", Op::eq(1)).unwrap();
    assert_eq!(
        Renderer::default().render(&q).unwrap_err(),
        RenderError::ClauseNotAllowed {
            clause: "table alias",
            mode: Mode::Delete
        }
    );
}

#[test]
fn rendering_is_idempotent_and_dialects_only_change_placeholders() {
    let schema = users();
    let mut q: Query<i64> = Query::update(&schema);
    q.assign(&schema, "name", 1).unwrap();
    q.assign(&schema, "age", 2).unwrap();
    q.filter(&schema, "id", Op::in_list([3, 4])).unwrap();
    q.filter(&schema, "age", Op::lt(5)).unwrap();

    let first = render(Dialect::Postgres, &q);
    assert_eq!(first, render(Dialect::Postgres, &q));

    let strip = |sql: &str| {
        sql.replace("@p", "?")
            .chars()
            .filter(|c| !c.is_ascii_digit())
            .collect::<String>()
            .replace('$', "?")
    };

    let baseline = render(Dialect::MySql, &q);
    for dialect in Dialect::ALL {
        let r = render(dialect, &q);
        assert_eq!(strip(&r.sql), strip(&baseline.sql), "{dialect}");
        assert_eq!(r.args, vec![1, 2, 3, 4, 5]);
        let count = r.sql.matches('?').count()
            + r.sql.matches('$').count()
            + r.sql.matches("@p").count();
        assert_eq!(count, r.args.len(), "{dialect}");
    }
}
