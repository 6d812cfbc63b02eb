//! Prepared statements and result cursors that hydrate record instances.

use super::{ActiveRecord, Fields, RecordResult};
use crate::context::RecordContext;
use crate::sql::{bind_values, QueryValues};
use rusqlite::types::Value;
use rusqlite::Statement;
use std::collections::VecDeque;
use std::marker::PhantomData;

/// Result of an executed statement.
///
/// Rows are read eagerly when the statement runs, so the cursor does not
/// borrow the connection. For statements without result columns it only
/// carries the affected-row count.
#[derive(Debug)]
pub struct Cursor<R> {
    rows: VecDeque<R>,
    row_count: usize,
}

impl<R> Cursor<R> {
    fn rows(rows: VecDeque<R>) -> Self {
        let row_count = rows.len();
        Self { rows, row_count }
    }

    fn affected(row_count: usize) -> Self {
        Self {
            rows: VecDeque::new(),
            row_count,
        }
    }

    /// Next row, or `None` when exhausted.
    pub fn fetch(&mut self) -> Option<R> {
        self.rows.pop_front()
    }

    pub fn fetch_all(self) -> Vec<R> {
        self.rows.into()
    }

    /// Rows affected (DML) or rows returned (queries).
    pub fn row_count(&self) -> usize {
        self.row_count
    }

    pub(crate) fn map_rows<T>(self, f: impl FnMut(R) -> T) -> Cursor<T> {
        Cursor {
            rows: self.rows.into_iter().map(f).collect(),
            row_count: self.row_count,
        }
    }
}

impl<R> Iterator for Cursor<R> {
    type Item = R;

    fn next(&mut self) -> Option<R> {
        self.fetch()
    }
}

/// Statement prepared against the context's connection whose result rows
/// populate new `R` instances.
pub struct Prepared<'c, R> {
    ctx: &'c RecordContext,
    sql: String,
    stmt: Statement<'c>,
    _record: PhantomData<fn() -> R>,
}

impl<'c, R: ActiveRecord> Prepared<'c, R> {
    pub(crate) fn new(ctx: &'c RecordContext, sql: &str) -> RecordResult<Self> {
        let stmt = ctx.connection().prepare(sql)?;
        Ok(Self {
            ctx,
            sql: sql.to_string(),
            stmt,
            _record: PhantomData,
        })
    }

    pub fn sql(&self) -> &str {
        &self.sql
    }

    /// Binds `values` and runs the statement. May be called repeatedly.
    pub fn execute(&mut self, values: impl Into<QueryValues>) -> RecordResult<Cursor<R>> {
        let cursor = execute_fields(self.ctx, &mut self.stmt, &self.sql, &values.into())?;
        Ok(cursor.map_rows(R::from_fields))
    }
}

/// Runs `sql` once, returning raw field rows.
pub(crate) fn run_fields(
    ctx: &RecordContext,
    sql: &str,
    values: &QueryValues,
) -> RecordResult<Cursor<Fields>> {
    let mut stmt = ctx.connection().prepare(sql)?;
    execute_fields(ctx, &mut stmt, sql, values)
}

fn execute_fields(
    ctx: &RecordContext,
    stmt: &mut Statement<'_>,
    sql: &str,
    values: &QueryValues,
) -> RecordResult<Cursor<Fields>> {
    bind_values(stmt, values)?;
    ctx.record_statement(sql);

    if stmt.column_count() == 0 {
        return Ok(Cursor::affected(stmt.raw_execute()?));
    }

    let names: Vec<String> = stmt.column_names().into_iter().map(String::from).collect();
    let mut rows = stmt.raw_query();
    let mut records = VecDeque::new();
    while let Some(row) = rows.next()? {
        let mut fields = Fields::new();
        for (index, name) in names.iter().enumerate() {
            fields.set(name.as_str(), row.get::<_, Value>(index)?);
        }
        records.push_back(fields);
    }
    Ok(Cursor::rows(records))
}

#[cfg(test)]
mod tests {
    use super::Cursor;
    use std::collections::VecDeque;

    #[test]
    fn cursor_fetches_in_order_and_keeps_row_count() {
        let mut cursor = Cursor::rows(VecDeque::from(vec![1, 2, 3]));
        assert_eq!(cursor.fetch(), Some(1));
        assert_eq!(cursor.row_count(), 3);
        assert_eq!(cursor.fetch_all(), vec![2, 3]);
    }

    #[test]
    fn affected_cursor_has_no_rows() {
        let mut cursor: Cursor<i32> = Cursor::affected(4);
        assert_eq!(cursor.row_count(), 4);
        assert_eq!(cursor.fetch(), None);
    }

    #[test]
    fn map_rows_preserves_count() {
        let cursor = Cursor::rows(VecDeque::from(vec![1, 2])).map_rows(|n| n * 10);
        assert_eq!(cursor.row_count(), 2);
        assert_eq!(cursor.collect::<Vec<_>>(), vec![10, 20]);
    }
}
