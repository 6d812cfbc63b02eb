//! Page-window wrapper around an arbitrary SELECT.
//!
//! # Responsibility
//! - Count the rows of a query and fetch one page of them as records.
//!
//! # Invariants
//! - Pages are numbered from 1.
//! - Page 1 is always valid, even for an empty result.

use crate::context::RecordContext;
use crate::record::cursor::run_fields;
use crate::record::{ActiveRecord, RecordError, RecordResult};
use crate::sql::QueryValues;
use rusqlite::types::Value;

#[derive(Debug)]
pub struct Paginator<R> {
    items: Vec<R>,
    page: u64,
    per_page: u64,
    total_items: u64,
    total_pages: u64,
    sql: String,
    values: QueryValues,
}

impl<R: ActiveRecord> Paginator<R> {
    /// Runs `sql` windowed to `page`, plus one COUNT over it.
    ///
    /// # Errors
    /// - [`RecordError::InvalidPageSize`] when `per_page` is zero.
    /// - [`RecordError::PageOutOfRange`] for page 0 or a page past the last.
    pub fn new(
        ctx: &RecordContext,
        sql: impl Into<String>,
        page: u64,
        per_page: u64,
        values: QueryValues,
    ) -> RecordResult<Self> {
        let sql = sql.into();
        if per_page == 0 {
            return Err(RecordError::InvalidPageSize);
        }

        let count_sql = format!("SELECT COUNT(*) AS count FROM ({sql}) AS paginated_query");
        let total_items = match run_fields(ctx, &count_sql, &values)?
            .fetch()
            .and_then(|row| row.get("count").cloned())
        {
            Some(Value::Integer(count)) if count >= 0 => count as u64,
            other => {
                return Err(RecordError::InvalidData(format!(
                    "unexpected paginator count {other:?}"
                )))
            }
        };
        let total_pages = total_items.div_ceil(per_page);

        if page == 0 || (page > total_pages && page != 1) {
            return Err(RecordError::PageOutOfRange { page, total_pages });
        }

        let offset = (page - 1) * per_page;
        let window_sql = ctx.dialect().apply_page_window(&sql, per_page, offset);
        let items = run_fields(ctx, &window_sql, &values)?
            .map(R::from_fields)
            .collect();

        Ok(Self {
            items,
            page,
            per_page,
            total_items,
            total_pages,
            sql,
            values,
        })
    }
}

impl<R> Paginator<R> {
    pub fn items(&self) -> &[R] {
        &self.items
    }

    pub fn into_items(self) -> Vec<R> {
        self.items
    }

    pub fn page(&self) -> u64 {
        self.page
    }

    pub fn per_page(&self) -> u64 {
        self.per_page
    }

    pub fn total_items(&self) -> u64 {
        self.total_items
    }

    pub fn total_pages(&self) -> u64 {
        self.total_pages
    }

    pub fn prev_page(&self) -> Option<u64> {
        (self.page > 1).then(|| self.page - 1)
    }

    pub fn next_page(&self) -> Option<u64> {
        (self.page < self.total_pages).then(|| self.page + 1)
    }

    /// The unwindowed query text.
    pub fn sql(&self) -> &str {
        &self.sql
    }

    /// Values bound to both the count and the page query.
    pub fn values(&self) -> &QueryValues {
        &self.values
    }
}

impl<R> IntoIterator for Paginator<R> {
    type Item = R;
    type IntoIter = std::vec::IntoIter<R>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.into_iter()
    }
}
