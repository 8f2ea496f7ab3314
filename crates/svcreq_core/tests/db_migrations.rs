use rusqlite::Connection;
use svcreq_core::db::migrations::latest_version;
use svcreq_core::db::{open_db, open_db_in_memory, DbError};

#[test]
fn open_db_in_memory_applies_all_migrations() {
    let conn = open_db_in_memory().unwrap();

    assert_eq!(schema_version(&conn), latest_version());
    assert_table_exists(&conn, "service_requests");
    assert_index_is_unique(&conn, "idx_service_requests_owner");
}

#[test]
fn opening_same_database_twice_is_idempotent() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("requests.db");

    let conn_first = open_db(&path).unwrap();
    assert_eq!(schema_version(&conn_first), latest_version());
    drop(conn_first);

    let conn_second = open_db(&path).unwrap();
    assert_eq!(schema_version(&conn_second), latest_version());
    assert_table_exists(&conn_second, "service_requests");
}

#[test]
fn opening_database_with_newer_schema_version_returns_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("future.db");

    let conn = Connection::open(&path).unwrap();
    conn.execute_batch("PRAGMA user_version = 999;").unwrap();
    drop(conn);

    match open_db(&path).unwrap_err() {
        DbError::SchemaTooNew {
            db_version,
            latest_supported,
        } => {
            assert_eq!(db_version, 999);
            assert_eq!(latest_supported, latest_version());
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn owner_index_rejects_second_row_for_same_owner() {
    let conn = open_db_in_memory().unwrap();
    conn.execute(
        "INSERT INTO service_requests VALUES (0, 42, '', '', '', 1);",
        [],
    )
    .unwrap();

    let result = conn.execute(
        "INSERT INTO service_requests VALUES (1, 42, '', '', '', 2);",
        [],
    );
    assert!(result.is_err());
}

fn schema_version(conn: &Connection) -> u32 {
    conn.query_row("PRAGMA user_version;", [], |row| row.get(0))
        .unwrap()
}

fn assert_table_exists(conn: &Connection, table_name: &str) {
    let exists: i64 = conn
        .query_row(
            "SELECT EXISTS(
                SELECT 1
                FROM sqlite_master
                WHERE type = 'table' AND name = ?1
            );",
            [table_name],
            |row| row.get(0),
        )
        .unwrap();
    assert_eq!(exists, 1, "table {table_name} does not exist");
}

fn assert_index_is_unique(conn: &Connection, index_name: &str) {
    let unique: i64 = conn
        .query_row(
            "SELECT \"unique\" FROM pragma_index_list('service_requests') WHERE name = ?1;",
            [index_name],
            |row| row.get(0),
        )
        .unwrap();
    assert_eq!(unique, 1, "index {index_name} is not unique");
}
