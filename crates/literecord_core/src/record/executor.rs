//! Persistence executor behind the [`ActiveRecord`] operations.
//!
//! # Responsibility
//! - Sequence bulk assign, hooks, statement building and execution.
//! - Resolve generated primary keys after inserts.
//!
//! # Invariants
//! - A vetoed operation issues no SQL.
//! - The missing-primary-key check on update runs before any SQL.

use super::cursor::run_fields;
use super::hooks::{run_after, run_before};
use super::{
    is_empty_value, ActiveRecord, Cursor, Fields, HookEvent, HookFlow, RecordError, RecordResult,
};
use crate::context::RecordContext;
use crate::sql::{self, SqlStatement};
use log::{debug, error};
use rusqlite::types::Value;
use std::time::Instant;

pub(crate) fn create<R: ActiveRecord>(
    record: &mut R,
    ctx: &RecordContext,
    data: Option<Fields>,
) -> RecordResult<bool> {
    if let Some(data) = data {
        record.fields_mut().dump(data);
    }
    if run_before(record, HookEvent::Create) == HookFlow::Abort {
        return Ok(false);
    }

    let started_at = Instant::now();
    let descriptor = R::descriptor();
    let metadata = ctx.metadata(&descriptor)?;
    let pk = metadata.pk();
    let pk_given = record.fields().has_value(pk);

    let statement = sql::build_insert(&descriptor.source(), &metadata, record.fields());
    if execute(ctx, "record_create", &statement)? == 0 {
        debug!(
            "event=record_create module=record status=no_rows table={}",
            descriptor.table()
        );
        return Ok(false);
    }

    if !pk_given && metadata.is_auto(pk) {
        let id = ctx.dialect().last_insert_id(
            ctx.connection(),
            pk,
            descriptor.table(),
            descriptor.schema(),
        )?;
        record.fields_mut().set(pk, id);
    }

    run_after(record, HookEvent::Create);
    debug!(
        "event=record_create module=record status=ok table={} duration_ms={}",
        descriptor.table(),
        started_at.elapsed().as_millis()
    );
    Ok(true)
}

pub(crate) fn update<R: ActiveRecord>(
    record: &mut R,
    ctx: &RecordContext,
    data: Option<Fields>,
) -> RecordResult<bool> {
    if let Some(data) = data {
        record.fields_mut().dump(data);
    }
    if run_before(record, HookEvent::Update) == HookFlow::Abort {
        return Ok(false);
    }

    let started_at = Instant::now();
    let descriptor = R::descriptor();
    let metadata = ctx.metadata(&descriptor)?;
    let statement = sql::build_update(&descriptor.source(), &metadata, record.fields())
        .map_err(|err| match err {
            RecordError::MissingPrimaryKey { table, pk, .. } => RecordError::MissingPrimaryKey {
                label: descriptor.label(&pk).to_string(),
                table,
                pk,
            },
            other => other,
        })?;
    let affected = execute(ctx, "record_update", &statement)?;

    run_after(record, HookEvent::Update);
    debug!(
        "event=record_update module=record status=ok table={} affected={} duration_ms={}",
        descriptor.table(),
        affected,
        started_at.elapsed().as_millis()
    );
    Ok(true)
}

pub(crate) fn save<R: ActiveRecord>(
    record: &mut R,
    ctx: &RecordContext,
    data: Option<Fields>,
) -> RecordResult<bool> {
    if let Some(data) = data {
        record.fields_mut().dump(data);
    }
    if run_before(record, HookEvent::Save) == HookFlow::Abort {
        return Ok(false);
    }

    let descriptor = R::descriptor();
    let metadata = ctx.metadata(&descriptor)?;
    let key = record
        .fields()
        .get(metadata.pk())
        .filter(|value| !is_empty_value(value))
        .cloned();

    let existing = match key {
        Some(key) => exists::<R>(ctx, key)?,
        None => false,
    };
    let saved = if existing {
        update(record, ctx, None)?
    } else {
        create(record, ctx, None)?
    };
    if !saved {
        return Ok(false);
    }

    run_after(record, HookEvent::Save);
    Ok(true)
}

pub(crate) fn delete<R: ActiveRecord>(ctx: &RecordContext, key: Value) -> RecordResult<bool> {
    let descriptor = R::descriptor();
    let metadata = ctx.metadata(&descriptor)?;
    let statement = sql::build_delete(&descriptor.source(), metadata.pk(), key);
    let affected = execute(ctx, "record_delete", &statement)?;
    debug!(
        "event=record_delete module=record status=ok table={} affected={}",
        descriptor.table(),
        affected
    );
    Ok(affected > 0)
}

pub(crate) fn get<R: ActiveRecord>(
    ctx: &RecordContext,
    key: Value,
    select_fields: &str,
) -> RecordResult<Option<R>> {
    let descriptor = R::descriptor();
    let metadata = ctx.metadata(&descriptor)?;
    let statement = sql::build_select_by_key(
        ctx.dialect(),
        &descriptor.source(),
        metadata.pk(),
        select_fields,
        key,
    );
    let mut cursor = run(ctx, "record_get", &statement)?;
    Ok(cursor.fetch().map(R::from_fields))
}

pub(crate) fn exists<R: ActiveRecord>(ctx: &RecordContext, key: Value) -> RecordResult<bool> {
    let descriptor = R::descriptor();
    let metadata = ctx.metadata(&descriptor)?;
    let statement = sql::build_exists(&descriptor.source(), metadata.pk(), key);
    let row = run(ctx, "record_exists", &statement)?
        .fetch()
        .ok_or_else(|| RecordError::InvalidData("COUNT(*) returned no row".to_string()))?;

    match row.get("count") {
        Some(Value::Integer(count)) => Ok(*count > 0),
        other => Err(RecordError::InvalidData(format!(
            "unexpected count value {other:?} from `{}`",
            descriptor.table()
        ))),
    }
}

fn execute(ctx: &RecordContext, event: &str, statement: &SqlStatement) -> RecordResult<usize> {
    Ok(run(ctx, event, statement)?.row_count())
}

fn run(
    ctx: &RecordContext,
    event: &str,
    statement: &SqlStatement,
) -> RecordResult<Cursor<Fields>> {
    run_fields(ctx, &statement.sql, &statement.values).inspect_err(|err| {
        error!(
            "event={} module=record status=error database={} error={}",
            event,
            ctx.database(),
            err
        );
    })
}
