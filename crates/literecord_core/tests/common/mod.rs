//! Shared record types and context setup for integration tests.
#![allow(dead_code)]

use literecord_core::{ActiveRecord, AppConfig, Fields, RecordContext, TableDescriptor, Value};

pub const USERS_SCHEMA: &str = "CREATE TABLE users (
    id INTEGER PRIMARY KEY,
    name TEXT,
    email TEXT
);";

/// Record bound to `users(id, name, email)`; `id` is rowid-generated.
#[derive(Debug, Default)]
pub struct User {
    fields: Fields,
}

impl ActiveRecord for User {
    fn descriptor() -> TableDescriptor {
        TableDescriptor::new("users")
    }

    fn from_fields(fields: Fields) -> Self {
        Self { fields }
    }

    fn fields(&self) -> &Fields {
        &self.fields
    }

    fn fields_mut(&mut self) -> &mut Fields {
        &mut self.fields
    }
}

/// In-memory context with `schema_sql` applied and the statement log on.
pub fn context_with(schema_sql: &str) -> RecordContext {
    let ctx = RecordContext::from_config(&AppConfig::in_memory("test")).unwrap();
    ctx.connection().execute_batch(schema_sql).unwrap();
    ctx.set_statement_log(true);
    ctx
}

pub fn text(value: &str) -> Value {
    Value::Text(value.to_string())
}

pub fn count_rows(ctx: &RecordContext, table: &str) -> i64 {
    ctx.connection()
        .query_row(&format!("SELECT COUNT(*) FROM {table};"), [], |row| {
            row.get(0)
        })
        .unwrap()
}
