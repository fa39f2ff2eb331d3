use momento_core::db::migrations::latest_version;
use momento_core::db::{open_db, open_db_in_memory, DbError};
use rusqlite::Connection;

#[test]
fn open_db_in_memory_applies_all_migrations() {
    let conn = open_db_in_memory().expect("open in-memory db");

    assert_eq!(schema_version(&conn), latest_version());
    assert_eq!(
        item_columns(&conn),
        vec!["id", "title", "content", "image", "createdDate", "modifiedDate"]
    );
}

#[test]
fn opening_same_database_twice_is_idempotent() {
    let dir = tempfile::tempdir().expect("create temp dir");
    let path = dir.path().join("momento.db");

    let first = open_db(&path).expect("open db file");
    first
        .execute(
            "INSERT INTO items (title, content) VALUES ('Kyoto', 'Temples');",
            [],
        )
        .expect("sql executes");
    drop(first);

    let second = open_db(&path).expect("open db file");
    assert_eq!(schema_version(&second), latest_version());
    let count: i64 = second
        .query_row("SELECT COUNT(*) FROM items;", [], |row| row.get(0))
        .expect("query");
    assert_eq!(count, 1);
}

#[test]
fn opening_database_with_newer_schema_version_returns_error() {
    let dir = tempfile::tempdir().expect("create temp dir");
    let path = dir.path().join("future.db");

    let conn = Connection::open(&path).expect("open raw connection");
    conn.execute_batch("PRAGMA user_version = 42;").expect("set user_version");
    drop(conn);

    let err = open_db(&path).unwrap_err();
    assert_eq!(err.code(), "schema_too_new");
    assert!(err.to_string().contains("v42"));
    match err {
        DbError::UnsupportedSchemaVersion {
            db_version,
            latest_supported,
        } => {
            assert_eq!(db_version, 42);
            assert_eq!(latest_supported, latest_version());
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn schema_rejects_modified_before_created() {
    let conn = open_db_in_memory().expect("open in-memory db");
    let result = conn.execute(
        "INSERT INTO items (title, content, createdDate, modifiedDate)
         VALUES ('Oslo', 'Fjords', 200, 100);",
        [],
    );
    assert!(result.is_err());
}

fn schema_version(conn: &Connection) -> u32 {
    conn.query_row("PRAGMA user_version;", [], |row| row.get(0))
        .expect("query")
}

fn item_columns(conn: &Connection) -> Vec<String> {
    let mut stmt = conn.prepare("PRAGMA table_info(items);").expect("prepare");
    stmt.query_map([], |row| row.get::<_, String>(1))
        .expect("query table_info")
        .collect::<Result<Vec<_>, _>>()
        .expect("read column names")
}
