#![allow(dead_code)]

use rusqlite::{params, Connection, Row};
use searchbuilder::model::{Model, Scope};

#[derive(Debug, Clone, PartialEq)]
pub struct FooModel {
    pub id: i64,
    pub foo: Option<String>,
    pub bar: Option<String>,
}
impl Model for FooModel {
    const TABLE: &'static str = "foo_models";
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(FooModel { id: row.get("id")?, foo: row.get("foo")?, bar: row.get("bar")? })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SoftDeleteModel {
    pub id: i64,
    pub foo: Option<String>,
    pub deleted_at: Option<String>,
}
impl Model for SoftDeleteModel {
    const TABLE: &'static str = "soft_delete_models";
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(SoftDeleteModel { id: row.get("id")?, foo: row.get("foo")?, deleted_at: row.get("deleted_at")? })
    }
    fn global_scopes() -> Vec<Scope> {
        vec![Scope::soft_deletes()]
    }
}

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// In-memory database with both fixture tables created and empty.
pub fn connection() -> Connection {
    init_tracing();
    let conn = Connection::open_in_memory().expect("in-memory db");
    conn.execute_batch(
        "
        create table foo_models (
            id integer not null primary key,
            foo text null,
            bar text null
        );
        create table soft_delete_models (
            id integer not null primary key,
            foo text null,
            deleted_at text null
        );
        ",
    )
    .expect("schema");
    conn
}

pub fn insert_foo(conn: &Connection, id: i64, foo: &str, bar: &str) {
    conn.execute("insert into foo_models (id, foo, bar) values (?, ?, ?)", params![id, foo, bar])
        .expect("insert foo");
}

pub fn ids<M>(hits: &[searchbuilder::model::Ranked<M>], id: impl Fn(&M) -> i64) -> Vec<(i64, i64)> {
    hits.iter().map(|hit| (id(&hit.record), hit.score)).collect()
}
