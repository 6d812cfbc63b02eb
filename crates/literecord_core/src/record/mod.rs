//! Active Record lifecycle: field state, hooks and persistence.
//!
//! # Responsibility
//! - Bind record types to tables through [`TableDescriptor`].
//! - Translate field state into statements and run them around lifecycle
//!   hooks.
//!
//! # Invariants
//! - Driver errors surface unchanged as [`RecordError::Db`].
//! - Hook vetoes and zero-row deletes are `Ok(false)`, never errors.
//! - A missing primary key on update is an error raised before any SQL.

use crate::db::DbError;
use crate::metadata::MetadataError;
use std::error::Error;
use std::fmt::{Display, Formatter};

mod active;
pub(crate) mod cursor;
mod descriptor;
mod executor;
mod fields;
mod hooks;

pub use active::ActiveRecord;
pub use cursor::{Cursor, Prepared};
pub use descriptor::{short_type_name, smallcase, TableDescriptor};
pub use fields::{is_empty_value, Fields};
pub use hooks::{HookEvent, HookFlow, LifecycleHooks};

pub type RecordResult<T> = Result<T, RecordError>;

#[derive(Debug)]
pub enum RecordError {
    /// `update` was called without a non-empty primary key value. `label` is
    /// the descriptor's display name for the key field.
    MissingPrimaryKey {
        table: String,
        pk: String,
        label: String,
    },
    Metadata(MetadataError),
    Db(DbError),
    InvalidData(String),
    PageOutOfRange { page: u64, total_pages: u64 },
    InvalidPageSize,
}

impl Display for RecordError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MissingPrimaryKey { table, pk, label } if label != pk => {
                write!(f, "no value given for {label} (primary key `{pk}` of `{table}`)")
            }
            Self::MissingPrimaryKey { table, pk, .. } => {
                write!(f, "no value given for primary key `{pk}` of `{table}`")
            }
            Self::Metadata(err) => write!(f, "{err}"),
            Self::Db(err) => write!(f, "{err}"),
            Self::InvalidData(message) => write!(f, "invalid result data: {message}"),
            Self::PageOutOfRange { page, total_pages } => {
                write!(f, "page {page} does not exist (total pages: {total_pages})")
            }
            Self::InvalidPageSize => write!(f, "per_page must be greater than zero"),
        }
    }
}

impl Error for RecordError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Metadata(err) => Some(err),
            Self::Db(err) => Some(err),
            Self::MissingPrimaryKey { .. }
            | Self::InvalidData(_)
            | Self::PageOutOfRange { .. }
            | Self::InvalidPageSize => None,
        }
    }
}

impl From<MetadataError> for RecordError {
    fn from(value: MetadataError) -> Self {
        Self::Metadata(value)
    }
}

impl From<DbError> for RecordError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for RecordError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}
