//! SQLite connection bootstrap and per-database handle provider.
//!
//! # Responsibility
//! - Open and configure SQLite connections for record persistence.
//! - Hand out one cached handle per logical database name.
//!
//! # Invariants
//! - Returned connections have `foreign_keys=ON` and a busy timeout set.
//! - A logical database name must be declared in config before use.

use std::error::Error;
use std::fmt::{Display, Formatter};

mod open;
mod provider;

pub use open::{open_db, open_db_in_memory, DEFAULT_BUSY_TIMEOUT};
pub use provider::ConnectionProvider;

pub type DbResult<T> = Result<T, DbError>;

#[derive(Debug)]
pub enum DbError {
    Sqlite(rusqlite::Error),
    UnknownDatabase { name: String },
}

impl Display for DbError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Sqlite(err) => write!(f, "{err}"),
            Self::UnknownDatabase { name } => {
                write!(f, "database `{name}` is not declared in config")
            }
        }
    }
}

impl Error for DbError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Sqlite(err) => Some(err),
            Self::UnknownDatabase { .. } => None,
        }
    }
}

impl From<rusqlite::Error> for DbError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Sqlite(value)
    }
}
