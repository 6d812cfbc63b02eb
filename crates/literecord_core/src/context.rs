//! Explicit persistence context threaded into every record operation.
//!
//! # Responsibility
//! - Hold the resolved logical database name and its connection handle.
//! - Own the metadata cache and dialect helper used by record operations.
//!
//! # Invariants
//! - Created once at start-up and dropped at shutdown; never re-initialized
//!   implicitly.
//! - Single-threaded: the handle is shared through `Rc`.

use crate::config::AppConfig;
use crate::db::{ConnectionProvider, DbResult};
use crate::dialect::{Dialect, SqliteDialect};
use crate::metadata::{MetadataCache, MetadataProvider, MetadataResult, TableMetadata};
use crate::record::TableDescriptor;
use log::debug;
use rusqlite::Connection;
use std::cell::RefCell;
use std::rc::Rc;

pub struct RecordContext {
    database: String,
    conn: Rc<Connection>,
    metadata: MetadataCache,
    dialect: Box<dyn Dialect>,
    statement_log: RefCell<Option<Vec<String>>>,
}

impl RecordContext {
    /// Wraps an already-open handle for `database`.
    pub fn with_connection(database: impl Into<String>, conn: Rc<Connection>) -> Self {
        Self {
            database: database.into(),
            conn,
            metadata: MetadataCache::default(),
            dialect: Box::new(SqliteDialect),
            statement_log: RefCell::new(None),
        }
    }

    /// Resolves `database` through `provider`.
    pub fn new(provider: &ConnectionProvider, database: impl Into<String>) -> DbResult<Self> {
        let database = database.into();
        let conn = provider.get(&database, false)?;
        Ok(Self::with_connection(database, conn))
    }

    /// Binds the database named by `application.database`.
    pub fn from_config(config: &AppConfig) -> DbResult<Self> {
        let provider = ConnectionProvider::from_config(config);
        Self::new(&provider, config.database_name())
    }

    pub fn with_dialect(mut self, dialect: Box<dyn Dialect>) -> Self {
        self.dialect = dialect;
        self
    }

    /// Replaces the metadata source. Previously cached entries are dropped.
    pub fn with_metadata_provider(mut self, provider: Box<dyn MetadataProvider>) -> Self {
        self.metadata = MetadataCache::new(provider);
        self
    }

    pub fn database(&self) -> &str {
        &self.database
    }

    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    pub fn dialect(&self) -> &dyn Dialect {
        self.dialect.as_ref()
    }

    pub fn metadata_cache(&self) -> &MetadataCache {
        &self.metadata
    }

    /// Metadata for the table bound by `descriptor`.
    pub fn metadata(&self, descriptor: &TableDescriptor) -> MetadataResult<Rc<TableMetadata>> {
        self.metadata.get(
            &self.conn,
            &self.database,
            descriptor.table(),
            descriptor.schema(),
        )
    }

    /// Starts or stops recording the SQL text of executed statements.
    pub fn set_statement_log(&self, enabled: bool) {
        *self.statement_log.borrow_mut() = enabled.then(Vec::new);
    }

    /// Drains recorded statements. Empty when recording is off.
    pub fn take_statement_log(&self) -> Vec<String> {
        self.statement_log
            .borrow_mut()
            .as_mut()
            .map(std::mem::take)
            .unwrap_or_default()
    }

    pub(crate) fn record_statement(&self, sql: &str) {
        debug!(
            "event=sql_execute module=record database={} sql={}",
            self.database, sql
        );
        if let Some(log) = self.statement_log.borrow_mut().as_mut() {
            log.push(sql.to_string());
        }
    }
}
