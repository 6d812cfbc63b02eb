//! Minimal Active Record layer over SQLite.
//! Record types map to one table each; SQL is derived from table metadata
//! and the fields currently set on a record.

pub mod config;
pub mod context;
pub mod db;
pub mod dialect;
pub mod logging;
pub mod metadata;
pub mod paginator;
pub mod record;
pub mod sql;

pub use config::{AppConfig, ConfigError, ConfigResult, DatabaseSettings};
pub use context::RecordContext;
pub use db::{ConnectionProvider, DbError, DbResult};
pub use dialect::{Dialect, SqliteDialect};
pub use logging::{default_log_level, init_logging, logging_status, LogTarget, LoggingSettings};
pub use metadata::{
    MetadataCache, MetadataError, MetadataProvider, SqliteMetadataProvider, TableMetadata,
};
pub use paginator::Paginator;
pub use record::{
    smallcase, ActiveRecord, Cursor, Fields, HookEvent, HookFlow, LifecycleHooks, Prepared,
    RecordError, RecordResult, TableDescriptor,
};
pub use rusqlite::types::Value;
pub use sql::{QueryValues, SqlStatement};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::core_version;

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }
}
