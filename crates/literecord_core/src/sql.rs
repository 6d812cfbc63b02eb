//! SQL statement construction from table metadata and field state.
//!
//! # Responsibility
//! - Build INSERT/UPDATE/DELETE/SELECT-by-key/EXISTS text plus bound values.
//! - Bind values onto prepared statements.
//!
//! # Invariants
//! - Builders are pure: no I/O, no logging.
//! - Identifiers are interpolated verbatim; only values are bound. Table and
//!   field names come from metadata and must never carry untrusted input.

use crate::dialect::Dialect;
use crate::metadata::TableMetadata;
use crate::record::{is_empty_value, Fields, RecordError, RecordResult};
use rusqlite::types::Value;
use rusqlite::Statement;

/// Values bound to a statement.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum QueryValues {
    /// `?` placeholders, in order.
    Positional(Vec<Value>),
    /// `:name` placeholders; names carry the `:` prefix.
    Named(Vec<(String, Value)>),
    #[default]
    None,
}

impl QueryValues {
    pub fn len(&self) -> usize {
        match self {
            Self::Positional(values) => values.len(),
            Self::Named(values) => values.len(),
            Self::None => 0,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Value bound to `:name` (named) or `None`.
    pub fn named(&self, name: &str) -> Option<&Value> {
        match self {
            Self::Named(values) => values
                .iter()
                .find(|(key, _)| key == name)
                .map(|(_, value)| value),
            _ => None,
        }
    }
}

impl From<Vec<Value>> for QueryValues {
    fn from(values: Vec<Value>) -> Self {
        Self::Positional(values)
    }
}

/// A single trailing argument is a one-element positional list.
impl From<Value> for QueryValues {
    fn from(value: Value) -> Self {
        Self::Positional(vec![value])
    }
}

impl From<()> for QueryValues {
    fn from(_: ()) -> Self {
        Self::None
    }
}

impl<T: Into<QueryValues>> From<Option<T>> for QueryValues {
    fn from(values: Option<T>) -> Self {
        values.map_or(Self::None, Into::into)
    }
}

/// Normalizes variadic trailing arguments into a positional value list.
///
/// `query_values![7_i64, "Ana".to_string()]` is the same list as
/// `vec![Value::Integer(7), Value::Text("Ana".into())]`.
#[macro_export]
macro_rules! query_values {
    () => {
        $crate::sql::QueryValues::None
    };
    ($($value:expr),+ $(,)?) => {
        $crate::sql::QueryValues::Positional(vec![$($crate::Value::from($value)),+])
    };
}

/// SQL text plus the values to bind.
#[derive(Debug, Clone, PartialEq)]
pub struct SqlStatement {
    pub sql: String,
    pub values: QueryValues,
}

impl SqlStatement {
    fn new(sql: String, values: QueryValues) -> Self {
        Self { sql, values }
    }
}

/// INSERT over the metadata field list.
///
/// Set-and-non-empty fields are bound; other fields without a default that
/// are not auto-generated get a literal `NULL`; the rest are left out for the
/// database to fill.
pub fn build_insert(source: &str, metadata: &TableMetadata, fields: &Fields) -> SqlStatement {
    let snapshot = fields.snapshot(metadata.fields_list());
    let mut columns = Vec::new();
    let mut placeholders = Vec::new();
    let mut values = Vec::new();

    for field in metadata.fields_list() {
        if let Some(value) = snapshot.get(field) {
            columns.push(field.as_str());
            placeholders.push(format!(":{field}"));
            values.push((format!(":{field}"), value.clone()));
        } else if !metadata.has_default(field) && !metadata.is_auto(field) {
            columns.push(field.as_str());
            placeholders.push("NULL".to_string());
        }
    }

    if columns.is_empty() {
        return SqlStatement::new(
            format!("INSERT INTO {source} DEFAULT VALUES"),
            QueryValues::None,
        );
    }

    SqlStatement::new(
        format!(
            "INSERT INTO {source} ({}) VALUES ({})",
            columns.join(","),
            placeholders.join(",")
        ),
        QueryValues::Named(values),
    )
}

/// UPDATE keyed by the primary key.
///
/// Unset or empty fields are written as `NULL` unconditionally, defaults and
/// auto fields included.
pub fn build_update(
    source: &str,
    metadata: &TableMetadata,
    fields: &Fields,
) -> RecordResult<SqlStatement> {
    let pk = metadata.pk();
    let Some(pk_value) = fields.get(pk).filter(|value| !is_empty_value(value)) else {
        return Err(RecordError::MissingPrimaryKey {
            table: source.to_string(),
            pk: pk.to_string(),
            label: pk.to_string(),
        });
    };

    let snapshot = fields.snapshot(metadata.fields_list());
    let mut set = Vec::new();
    let mut values = Vec::new();

    for field in metadata.fields_list() {
        if field == pk {
            continue;
        }
        match snapshot.get(field) {
            Some(value) => {
                set.push(format!("{field} = :{field}"));
                values.push((format!(":{field}"), value.clone()));
            }
            None => set.push(format!("{field} = NULL")),
        }
    }
    values.push((format!(":{pk}"), pk_value.clone()));

    Ok(SqlStatement::new(
        format!("UPDATE {source} SET {} WHERE {pk} = :{pk}", set.join(", ")),
        QueryValues::Named(values),
    ))
}

pub fn build_delete(source: &str, pk: &str, key: Value) -> SqlStatement {
    SqlStatement::new(
        format!("DELETE FROM {source} WHERE {pk} = ?"),
        QueryValues::Positional(vec![key]),
    )
}

/// SELECT-by-key capped to one row through the dialect.
pub fn build_select_by_key(
    dialect: &dyn Dialect,
    source: &str,
    pk: &str,
    select_fields: &str,
    key: Value,
) -> SqlStatement {
    let sql = format!("SELECT {select_fields} FROM {source} WHERE {pk} = ?");
    SqlStatement::new(
        dialect.apply_row_limit(&sql, 1),
        QueryValues::Positional(vec![key]),
    )
}

pub fn build_exists(source: &str, pk: &str, key: Value) -> SqlStatement {
    SqlStatement::new(
        format!("SELECT COUNT(*) AS count FROM {source} WHERE {pk} = ?"),
        QueryValues::Positional(vec![key]),
    )
}

/// Binds `values` onto `stmt`, replacing any previous bindings.
///
/// The number of values must match the statement's parameter count, and a
/// name may appear only once, so every parameter is rebound on each call.
pub fn bind_values(stmt: &mut Statement<'_>, values: &QueryValues) -> rusqlite::Result<()> {
    let expected = stmt.parameter_count();
    if values.len() != expected {
        return Err(rusqlite::Error::InvalidParameterCount(values.len(), expected));
    }

    match values {
        QueryValues::Positional(values) => {
            for (index, value) in values.iter().enumerate() {
                stmt.raw_bind_parameter(index + 1, value)?;
            }
        }
        QueryValues::Named(values) => {
            for (position, (name, value)) in values.iter().enumerate() {
                if values[..position].iter().any(|(earlier, _)| earlier == name) {
                    return Err(rusqlite::Error::InvalidParameterName(name.clone()));
                }
                let index = stmt
                    .parameter_index(name)?
                    .ok_or_else(|| rusqlite::Error::InvalidParameterName(name.clone()))?;
                stmt.raw_bind_parameter(index, value)?;
            }
        }
        QueryValues::None => {}
    }
    Ok(())
}
