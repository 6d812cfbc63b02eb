//! Dialect-specific SQL rewrites and identifier retrieval.

use crate::db::DbResult;
use rusqlite::types::Value;
use rusqlite::Connection;

/// Helpers whose SQL differs between database engines.
pub trait Dialect {
    /// Restricts `sql` to at most `limit` result rows.
    fn apply_row_limit(&self, sql: &str, limit: u64) -> String;

    /// Restricts `sql` to `limit` rows starting after `offset` rows.
    fn apply_page_window(&self, sql: &str, limit: u64, offset: u64) -> String;

    /// Most recently generated identifier for `table` on this connection.
    fn last_insert_id(
        &self,
        conn: &Connection,
        pk_field: &str,
        table: &str,
        schema: Option<&str>,
    ) -> DbResult<Value>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SqliteDialect;

impl Dialect for SqliteDialect {
    fn apply_row_limit(&self, sql: &str, limit: u64) -> String {
        format!("{sql} LIMIT {limit}")
    }

    fn apply_page_window(&self, sql: &str, limit: u64, offset: u64) -> String {
        format!("{sql} LIMIT {limit} OFFSET {offset}")
    }

    // SQLite tracks the last rowid per connection, not per table.
    fn last_insert_id(
        &self,
        conn: &Connection,
        _pk_field: &str,
        _table: &str,
        _schema: Option<&str>,
    ) -> DbResult<Value> {
        Ok(Value::Integer(conn.last_insert_rowid()))
    }
}

#[cfg(test)]
mod tests {
    use super::{Dialect, SqliteDialect};
    use rusqlite::types::Value;
    use rusqlite::Connection;

    #[test]
    fn limit_rewrites_append_clauses() {
        let sql = "SELECT * FROM users WHERE id = ?";
        assert_eq!(
            SqliteDialect.apply_row_limit(sql, 1),
            "SELECT * FROM users WHERE id = ? LIMIT 1"
        );
        assert_eq!(
            SqliteDialect.apply_page_window("SELECT * FROM users", 10, 20),
            "SELECT * FROM users LIMIT 10 OFFSET 20"
        );
    }

    #[test]
    fn last_insert_id_reads_connection_rowid() {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch(
            "CREATE TABLE items (id INTEGER PRIMARY KEY, label TEXT);
             INSERT INTO items (label) VALUES ('a');
             INSERT INTO items (label) VALUES ('b');",
        )
        .unwrap();

        let id = SqliteDialect
            .last_insert_id(&conn, "id", "items", None)
            .unwrap();
        assert_eq!(id, Value::Integer(2));
    }
}
