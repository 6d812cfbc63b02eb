//! Table metadata: field list, primary key, defaults, auto-generated fields.
//!
//! # Responsibility
//! - Describe a table in the terms SQL generation needs.
//! - Cache descriptions per (database, table, schema).
//!
//! # Invariants
//! - Every described table has exactly one primary-key field.
//! - Cached metadata is read-only; callers share it through `Rc`.

use crate::db::DbError;
use log::debug;
use rusqlite::Connection;
use std::cell::RefCell;
use std::collections::HashMap;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::rc::Rc;

pub type MetadataResult<T> = Result<T, MetadataError>;

#[derive(Debug)]
pub enum MetadataError {
    TableNotFound { table: String },
    NoPrimaryKey { table: String },
    CompositePrimaryKey { table: String, fields: Vec<String> },
    Db(DbError),
}

impl Display for MetadataError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::TableNotFound { table } => write!(f, "table `{table}` does not exist"),
            Self::NoPrimaryKey { table } => write!(f, "table `{table}` has no primary key"),
            Self::CompositePrimaryKey { table, fields } => write!(
                f,
                "table `{table}` has a composite primary key ({}); one key field is required",
                fields.join(", ")
            ),
            Self::Db(err) => write!(f, "{err}"),
        }
    }
}

impl Error for MetadataError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            _ => None,
        }
    }
}

impl From<DbError> for MetadataError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for MetadataError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// Description of one table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableMetadata {
    fields: Vec<String>,
    pk: String,
    with_default: Vec<String>,
    auto_fields: Vec<String>,
}

impl TableMetadata {
    /// `fields` defines the canonical column order for INSERT generation.
    pub fn new<S: Into<String>>(fields: impl IntoIterator<Item = S>, pk: impl Into<String>) -> Self {
        Self {
            fields: fields.into_iter().map(Into::into).collect(),
            pk: pk.into(),
            with_default: Vec::new(),
            auto_fields: Vec::new(),
        }
    }

    pub fn with_defaults<S: Into<String>>(mut self, fields: impl IntoIterator<Item = S>) -> Self {
        self.with_default.extend(fields.into_iter().map(Into::into));
        self
    }

    pub fn with_auto_fields<S: Into<String>>(mut self, fields: impl IntoIterator<Item = S>) -> Self {
        self.auto_fields.extend(fields.into_iter().map(Into::into));
        self
    }

    pub fn fields_list(&self) -> &[String] {
        &self.fields
    }

    pub fn pk(&self) -> &str {
        &self.pk
    }

    pub fn with_default(&self) -> &[String] {
        &self.with_default
    }

    pub fn auto_fields(&self) -> &[String] {
        &self.auto_fields
    }

    pub fn has_default(&self, field: &str) -> bool {
        self.with_default.iter().any(|name| name == field)
    }

    pub fn is_auto(&self, field: &str) -> bool {
        self.auto_fields.iter().any(|name| name == field)
    }
}

/// Source of table descriptions.
pub trait MetadataProvider {
    fn describe(
        &self,
        conn: &Connection,
        table: &str,
        schema: Option<&str>,
    ) -> MetadataResult<TableMetadata>;
}

/// Reads metadata through `PRAGMA table_info`.
///
/// A single `INTEGER` primary key aliases the rowid and is reported as
/// auto-generated.
#[derive(Debug, Clone, Copy, Default)]
pub struct SqliteMetadataProvider;

impl MetadataProvider for SqliteMetadataProvider {
    fn describe(
        &self,
        conn: &Connection,
        table: &str,
        schema: Option<&str>,
    ) -> MetadataResult<TableMetadata> {
        let sql = match schema {
            Some(schema) => format!("PRAGMA {schema}.table_info({table});"),
            None => format!("PRAGMA table_info({table});"),
        };

        let mut stmt = conn.prepare(&sql)?;
        let mut rows = stmt.query([])?;
        let mut fields = Vec::new();
        let mut with_default = Vec::new();
        // (pk ordinal, name, declared type)
        let mut pk_columns: Vec<(i64, String, String)> = Vec::new();

        while let Some(row) = rows.next()? {
            let name: String = row.get("name")?;
            let declared_type: String = row.get("type")?;
            let default: Option<String> = row.get("dflt_value")?;
            let pk_ordinal: i64 = row.get("pk")?;

            if default.is_some() {
                with_default.push(name.clone());
            }
            if pk_ordinal > 0 {
                pk_columns.push((pk_ordinal, name.clone(), declared_type));
            }
            fields.push(name);
        }

        if fields.is_empty() {
            return Err(MetadataError::TableNotFound {
                table: table.to_string(),
            });
        }

        pk_columns.sort_by_key(|(ordinal, _, _)| *ordinal);
        let (pk, pk_type) = match pk_columns.as_slice() {
            [] => {
                return Err(MetadataError::NoPrimaryKey {
                    table: table.to_string(),
                })
            }
            [(_, name, declared_type)] => (name.clone(), declared_type.clone()),
            many => {
                return Err(MetadataError::CompositePrimaryKey {
                    table: table.to_string(),
                    fields: many.iter().map(|(_, name, _)| name.clone()).collect(),
                })
            }
        };

        let mut auto_fields = Vec::new();
        if pk_type.eq_ignore_ascii_case("INTEGER") && !is_without_rowid(conn, table, schema)? {
            auto_fields.push(pk.clone());
        }

        Ok(TableMetadata {
            fields,
            pk,
            with_default,
            auto_fields,
        })
    }
}

/// `WITHOUT ROWID` tables have no rowid for an `INTEGER` key to alias.
fn is_without_rowid(conn: &Connection, table: &str, schema: Option<&str>) -> MetadataResult<bool> {
    let sql = match schema {
        Some(schema) => format!("PRAGMA {schema}.table_list({table});"),
        None => format!("PRAGMA table_list({table});"),
    };
    let mut stmt = conn.prepare(&sql)?;
    let mut rows = stmt.query([])?;
    match rows.next()? {
        Some(row) => Ok(row.get::<_, i64>("wr")? != 0),
        None => Ok(false),
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct MetadataKey {
    database: String,
    table: String,
    schema: Option<String>,
}

impl MetadataKey {
    fn new(database: &str, table: &str, schema: Option<&str>) -> Self {
        Self {
            database: database.to_string(),
            table: table.to_string(),
            schema: schema.map(str::to_string),
        }
    }
}

/// Per-(database, table, schema) cache in front of a [`MetadataProvider`].
pub struct MetadataCache {
    provider: Box<dyn MetadataProvider>,
    entries: RefCell<HashMap<MetadataKey, Rc<TableMetadata>>>,
}

impl MetadataCache {
    pub fn new(provider: Box<dyn MetadataProvider>) -> Self {
        Self {
            provider,
            entries: RefCell::new(HashMap::new()),
        }
    }

    /// Returns cached metadata, describing the table on first use.
    pub fn get(
        &self,
        conn: &Connection,
        database: &str,
        table: &str,
        schema: Option<&str>,
    ) -> MetadataResult<Rc<TableMetadata>> {
        let key = MetadataKey::new(database, table, schema);
        if let Some(metadata) = self.entries.borrow().get(&key) {
            return Ok(Rc::clone(metadata));
        }

        let metadata = Rc::new(self.provider.describe(conn, table, schema)?);
        debug!(
            "event=metadata_load module=metadata status=ok database={} table={} fields={} pk={}",
            database,
            table,
            metadata.fields_list().len(),
            metadata.pk()
        );
        self.entries.borrow_mut().insert(key, Rc::clone(&metadata));
        Ok(metadata)
    }

    /// Seeds the cache, bypassing the provider for this table.
    pub fn register(
        &self,
        database: &str,
        table: &str,
        schema: Option<&str>,
        metadata: TableMetadata,
    ) {
        self.entries
            .borrow_mut()
            .insert(MetadataKey::new(database, table, schema), Rc::new(metadata));
    }
}

impl Default for MetadataCache {
    fn default() -> Self {
        Self::new(Box::new(SqliteMetadataProvider))
    }
}

#[cfg(test)]
mod tests {
    use super::{MetadataCache, MetadataError, MetadataProvider, SqliteMetadataProvider, TableMetadata};
    use rusqlite::Connection;
    use std::rc::Rc;

    fn conn_with_schema() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch(
            "CREATE TABLE users (
                id INTEGER PRIMARY KEY,
                name TEXT NOT NULL,
                email TEXT,
                status TEXT NOT NULL DEFAULT 'active'
            );
            CREATE TABLE tags (
                code TEXT PRIMARY KEY,
                label TEXT
            );
            CREATE TABLE pairs (
                a INTEGER,
                b INTEGER,
                PRIMARY KEY (a, b)
            );
            CREATE TABLE loose (value TEXT);",
        )
        .unwrap();
        conn
    }

    #[test]
    fn describes_integer_primary_key_as_auto_field() {
        let conn = conn_with_schema();
        let metadata = SqliteMetadataProvider.describe(&conn, "users", None).unwrap();

        assert_eq!(metadata.fields_list(), ["id", "name", "email", "status"]);
        assert_eq!(metadata.pk(), "id");
        assert_eq!(metadata.with_default(), ["status"]);
        assert_eq!(metadata.auto_fields(), ["id"]);
    }

    #[test]
    fn integer_key_of_without_rowid_table_is_not_auto() {
        let conn = conn_with_schema();
        conn.execute_batch(
            "CREATE TABLE counters (id INTEGER PRIMARY KEY, hits INTEGER) WITHOUT ROWID;",
        )
        .unwrap();

        let metadata = SqliteMetadataProvider.describe(&conn, "counters", None).unwrap();
        assert_eq!(metadata.pk(), "id");
        assert!(!metadata.is_auto("id"));

        let rowid = SqliteMetadataProvider.describe(&conn, "users", Some("main")).unwrap();
        assert!(rowid.is_auto("id"));
    }

    #[test]
    fn text_primary_key_is_not_auto() {
        let conn = conn_with_schema();
        let metadata = SqliteMetadataProvider
            .describe(&conn, "tags", Some("main"))
            .unwrap();
        assert_eq!(metadata.pk(), "code");
        assert!(metadata.auto_fields().is_empty());
    }

    #[test]
    fn rejects_missing_tables_and_unsupported_keys() {
        let conn = conn_with_schema();
        assert!(matches!(
            SqliteMetadataProvider.describe(&conn, "nope", None),
            Err(MetadataError::TableNotFound { .. })
        ));
        assert!(matches!(
            SqliteMetadataProvider.describe(&conn, "loose", None),
            Err(MetadataError::NoPrimaryKey { .. })
        ));
        match SqliteMetadataProvider.describe(&conn, "pairs", None) {
            Err(MetadataError::CompositePrimaryKey { fields, .. }) => {
                assert_eq!(fields, vec!["a".to_string(), "b".to_string()]);
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn cache_returns_same_entry_per_key() {
        let conn = conn_with_schema();
        let cache = MetadataCache::default();

        let first = cache.get(&conn, "main_db", "users", None).unwrap();
        let second = cache.get(&conn, "main_db", "users", None).unwrap();
        assert!(Rc::ptr_eq(&first, &second));

        let other_db = cache.get(&conn, "other_db", "users", None).unwrap();
        assert!(!Rc::ptr_eq(&first, &other_db));
    }

    #[test]
    fn registered_metadata_bypasses_provider() {
        let conn = Connection::open_in_memory().unwrap();
        let cache = MetadataCache::default();
        cache.register(
            "main_db",
            "virtual_users",
            None,
            TableMetadata::new(["id", "name"], "id").with_auto_fields(["id"]),
        );

        let metadata = cache.get(&conn, "main_db", "virtual_users", None).unwrap();
        assert!(metadata.is_auto("id"));
        assert!(!metadata.has_default("name"));
    }
}
