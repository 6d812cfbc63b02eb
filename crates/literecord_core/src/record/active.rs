//! The [`ActiveRecord`] trait: one record type, one table, one primary key.

use super::cursor::Prepared;
use super::{executor, Cursor, Fields, LifecycleHooks, RecordResult, TableDescriptor};
use crate::context::RecordContext;
use crate::paginator::Paginator;
use crate::sql::QueryValues;
use rusqlite::types::Value;

/// A record type bound to a single table.
///
/// Implementors store their state in a [`Fields`] container and provide the
/// three accessors below; every persistence operation is provided.
///
/// ```ignore
/// #[derive(Debug, Default)]
/// struct User {
///     fields: Fields,
/// }
///
/// impl ActiveRecord for User {
///     fn descriptor() -> TableDescriptor {
///         TableDescriptor::new("users")
///     }
///
///     fn from_fields(fields: Fields) -> Self {
///         Self { fields }
///     }
///
///     fn fields(&self) -> &Fields {
///         &self.fields
///     }
///
///     fn fields_mut(&mut self) -> &mut Fields {
///         &mut self.fields
///     }
/// }
///
/// let mut user = User::with_data([("name", "Ana".to_string())]);
/// user.create(&ctx, None)?;
/// ```
pub trait ActiveRecord: Sized {
    /// Table binding. Defaults to the snake-cased type name with no schema.
    fn descriptor() -> TableDescriptor {
        TableDescriptor::for_type::<Self>()
    }

    fn from_fields(fields: Fields) -> Self;

    fn fields(&self) -> &Fields;

    fn fields_mut(&mut self) -> &mut Fields;

    /// Lifecycle hook capability. `None` means no hooks are run.
    fn hooks(&mut self) -> Option<&mut dyn LifecycleHooks> {
        None
    }

    /// Builds an instance by bulk-assigning `data`.
    fn with_data<K, V>(data: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<Value>,
    {
        Self::from_fields(data.into_iter().collect())
    }

    fn field(&self, name: &str) -> Option<&Value> {
        self.fields().get(name)
    }

    fn set_field(&mut self, name: impl Into<String>, value: impl Into<Value>) {
        self.fields_mut().set(name, value);
    }

    fn is_set(&self, name: &str) -> bool {
        self.fields().is_set(name)
    }

    fn clear_field(&mut self, name: &str) -> Option<Value> {
        self.fields_mut().clear(name)
    }

    /// Inserts the record. A generated primary key is written back onto the
    /// record when the caller did not supply one.
    fn create(&mut self, ctx: &RecordContext, data: Option<Fields>) -> RecordResult<bool> {
        executor::create(self, ctx, data)
    }

    /// Updates the row identified by the record's primary key.
    ///
    /// # Errors
    /// - [`RecordError::MissingPrimaryKey`](super::RecordError::MissingPrimaryKey)
    ///   when the key is unset or empty; no SQL is issued.
    fn update(&mut self, ctx: &RecordContext, data: Option<Fields>) -> RecordResult<bool> {
        executor::update(self, ctx, data)
    }

    /// Updates when a row with the record's key exists, creates otherwise.
    fn save(&mut self, ctx: &RecordContext, data: Option<Fields>) -> RecordResult<bool> {
        executor::save(self, ctx, data)
    }

    /// Deletes by key. `false` when no row matched.
    fn delete(ctx: &RecordContext, key: impl Into<Value>) -> RecordResult<bool> {
        executor::delete::<Self>(ctx, key.into())
    }

    /// Fetches all columns of the row with `key`.
    fn get(ctx: &RecordContext, key: impl Into<Value>) -> RecordResult<Option<Self>> {
        executor::get::<Self>(ctx, key.into(), "*")
    }

    /// Fetches `select_fields` (comma separated) of the row with `key`.
    fn get_with_fields(
        ctx: &RecordContext,
        key: impl Into<Value>,
        select_fields: &str,
    ) -> RecordResult<Option<Self>> {
        executor::get::<Self>(ctx, key.into(), select_fields)
    }

    fn exists(ctx: &RecordContext, key: impl Into<Value>) -> RecordResult<bool> {
        executor::exists::<Self>(ctx, key.into())
    }

    fn prepare<'c>(ctx: &'c RecordContext, sql: &str) -> RecordResult<Prepared<'c, Self>> {
        Prepared::new(ctx, sql)
    }

    /// Runs `sql` immediately. `values` is a positional list, a single value,
    /// `()` or the output of [`query_values!`](crate::query_values).
    fn query(
        ctx: &RecordContext,
        sql: &str,
        values: impl Into<QueryValues>,
    ) -> RecordResult<Cursor<Self>> {
        Self::prepare(ctx, sql)?.execute(values)
    }

    fn paginate_query(
        ctx: &RecordContext,
        sql: &str,
        page: u64,
        per_page: u64,
        values: impl Into<QueryValues>,
    ) -> RecordResult<Paginator<Self>> {
        Paginator::new(ctx, sql, page, per_page, values.into())
    }
}
