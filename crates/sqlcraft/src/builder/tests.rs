use super::*;
use crate::row::{FromRow, Row};
use crate::schema::FieldDef;
use std::sync::Mutex;

#[derive(Debug, PartialEq)]
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

struct Broken;

impl FromRow for Broken {
    fn from_row(_row: &Row) -> CraftResult<Self> {
        Ok(Broken)
    }
}

impl Model for Broken {
    const MODEL: &'static str = "Broken";
    const TABLE: &'static str = "broken";

    fn fields() -> Vec<FieldDef> {
        vec![
            FieldDef::new("a", "i64", "x"),
            FieldDef::new("b", "i64", "x"),
        ]
    }
}

/// Records every statement and answers with canned rows.
#[derive(Default)]
struct MockClient {
    rows: Vec<Row>,
    affected: u64,
    calls: Mutex<Vec<(String, Vec<Value>)>>,
}

impl MockClient {
    fn with_rows(rows: Vec<Row>) -> Self {
        Self {
            rows,
            ..Default::default()
        }
    }

    fn calls(&self) -> Vec<(String, Vec<Value>)> {
        self.calls.lock().unwrap().clone()
    }
}

impl GenericClient for MockClient {
    async fn query(&self, sql: &str, args: &[Value]) -> CraftResult<Vec<Row>> {
        self.calls
            .lock()
            .unwrap()
            .push((sql.to_string(), args.to_vec()));
        Ok(self.rows.clone())
    }

    async fn execute(&self, sql: &str, args: &[Value]) -> CraftResult<u64> {
        self.calls
            .lock()
            .unwrap()
            .push((sql.to_string(), args.to_vec()));
        Ok(self.affected)
    }
}

fn user_row(id: i64, name: &str, age: i32) -> Row {
    Row::new().with("id", id).with("name", name).with("age", age)
}

#[test]
fn starts_in_select_mode_and_switches_on_set() {
    let qb = QueryBuilder::<User>::new(Dialect::MySql).eq("age", 10);
    assert_eq!(qb.mode(), Mode::Select);

    let qb = qb.set("age", 11);
    assert_eq!(qb.mode(), Mode::Update);
}

#[test]
fn render_select() {
    let r = QueryBuilder::<User>::new(Dialect::MySql)
        .eq("age", 10)
        .render()
        .unwrap();
    assert_eq!(r.sql, "SELECT * FROM users WHERE age = ?");
    assert_eq!(r.args, vec![Value::Int(10)]);
}

#[test]
fn render_update_orders_args_set_first() {
    let r = QueryBuilder::<User>::new(Dialect::Postgres)
        .gt("age", 10)
        .set("age", 11)
        .render()
        .unwrap();
    assert_eq!(r.sql, "UPDATE users SET age = $1 WHERE age > $2");
    assert_eq!(r.args, vec![Value::Int(11), Value::Int(10)]);
}

#[test]
fn first_error_is_kept() {
    let err = QueryBuilder::<User>::new(Dialect::MySql)
        .eq("ghost", 1)
        .eq("phantom", 2)
        .render()
        .unwrap_err();
    assert!(err.is_build_error());
    assert!(matches!(
        err,
        CraftError::Schema(SchemaError::UnknownColumn { ref column, .. }) if column == "ghost"
    ));
}

#[test]
fn schema_failure_surfaces_on_render() {
    let err = QueryBuilder::<Broken>::new(Dialect::MySql)
        .render()
        .unwrap_err();
    assert!(matches!(
        err,
        CraftError::Schema(SchemaError::DuplicateColumn { .. })
    ));
}

#[tokio::test]
async fn fetch_maps_every_row() {
    let client = MockClient::with_rows(vec![user_row(1, "a", 20), user_row(2, "b", 30)]);
    let users = QueryBuilder::<User>::new(Dialect::Postgres)
        .gte("age", 18)
        .fetch(&client)
        .await
        .unwrap();

    assert_eq!(users.len(), 2);
    assert_eq!(users[1].name, "b");
    assert_eq!(
        client.calls(),
        vec![(
            "SELECT * FROM users WHERE age >= $1".to_string(),
            vec![Value::Int(18)]
        )]
    );
}

#[tokio::test]
async fn first_and_last_force_primary_key_order() {
    let client = MockClient::with_rows(vec![user_row(7, "z", 40)]);

    let user = QueryBuilder::<User>::new(Dialect::MySql)
        .order_by_asc("age")
        .eq("age", 40)
        .last(&client)
        .await
        .unwrap();
    assert_eq!(user.id, 7);

    QueryBuilder::<User>::new(Dialect::MySql)
        .first(&client)
        .await
        .unwrap();

    let calls = client.calls();
    assert_eq!(
        calls[0].0,
        "SELECT * FROM users WHERE age = ? ORDER BY id DESC LIMIT 1"
    );
    assert_eq!(calls[1].0, "SELECT * FROM users ORDER BY id ASC LIMIT 1");
}

#[tokio::test]
async fn first_on_empty_result_is_not_found() {
    let client = MockClient::default();
    let err = QueryBuilder::<User>::new(Dialect::MySql)
        .eq("age", 99)
        .first(&client)
        .await
        .unwrap_err();
    assert!(err.is_not_found());
}

#[tokio::test]
async fn update_and_delete_return_affected_rows() {
    let client = MockClient {
        affected: 3,
        ..Default::default()
    };

    let n = QueryBuilder::<User>::new(Dialect::MySql)
        .set("age", 11)
        .gt("age", 10)
        .update(&client)
        .await
        .unwrap();
    assert_eq!(n, 3);

    let n = QueryBuilder::<User>::new(Dialect::SqlServer)
        .in_list("id", [1, 2])
        .delete(&client)
        .await
        .unwrap();
    assert_eq!(n, 3);

    let calls = client.calls();
    assert_eq!(calls[0].0, "UPDATE users SET age = ? WHERE age > ?");
    assert_eq!(calls[0].1, vec![Value::Int(11), Value::Int(10)]);
    assert_eq!(calls[1].0, "DELETE FROM users WHERE id IN (@p1, @p2)");
}

#[tokio::test]
async fn build_errors_never_reach_the_client() {
    let client = MockClient::default();
    let err = QueryBuilder::<User>::new(Dialect::MySql)
        .set("ghost", 1)
        .update(&client)
        .await
        .unwrap_err();
    assert!(err.is_build_error());

    let err = QueryBuilder::<User>::new(Dialect::MySql)
        .limit(5)
        .delete(&client)
        .await
        .unwrap_err();
    assert!(matches!(err, CraftError::Render(_)));
    assert!(client.calls().is_empty());
}

#[tokio::test]
async fn projection_and_raw_rows() {
    let qb = QueryBuilder::<User>::new(Dialect::Postgres)
        .select(["name", "age"])
        .gt("age", 18);
    assert_eq!(
        qb.render().unwrap().sql,
        "SELECT name, age FROM users WHERE age > $1"
    );

    let qb = qb.select_all();
    assert_eq!(qb.render().unwrap().sql, "SELECT * FROM users WHERE age > $1");

    let client = MockClient::with_rows(vec![Row::new().with("name", "a")]);
    let rows = QueryBuilder::<User>::new(Dialect::MySql)
        .select(["name"])
        .fetch_rows(&client)
        .await
        .unwrap();
    assert_eq!(rows[0].try_get::<String>("name").unwrap(), "a");
    assert_eq!(client.calls()[0].0, "SELECT name FROM users");
}
