//! CLI probe for the record layer.
//!
//! # Responsibility
//! - Load an application config and bind its database.
//! - Describe a table and print its first rows as JSON lines.
//!
//! Usage: `literecord_cli [config.json] [table]`. Without a config an
//! in-memory database named `main` is used.

use literecord_core::{
    core_version, init_logging, ActiveRecord, AppConfig, Fields, RecordContext, TableDescriptor,
};
use log::{error, info};
use std::process::ExitCode;

const PREVIEW_ROWS: u64 = 20;

/// Untyped row of whatever table is being inspected.
struct Row {
    fields: Fields,
}

impl ActiveRecord for Row {
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

fn main() -> ExitCode {
    let mut args = std::env::args().skip(1);
    let config_path = args.next();
    let table = args.next();

    match run(config_path.as_deref(), table.as_deref()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(message) => {
            error!("event=cli_run module=cli status=error error={message}");
            eprintln!("error: {message}");
            ExitCode::FAILURE
        }
    }
}

fn run(config_path: Option<&str>, table: Option<&str>) -> Result<(), String> {
    let config = match config_path {
        Some(path) => AppConfig::load(path).map_err(|err| err.to_string())?,
        None => AppConfig::in_memory("main"),
    };
    init_logging(&config.logging)?;
    info!(
        "event=cli_start module=cli status=ok database={} version={}",
        config.database_name(),
        core_version()
    );

    let ctx = RecordContext::from_config(&config).map_err(|err| err.to_string())?;
    println!("literecord version={}", core_version());
    println!("database={}", ctx.database());

    let Some(table) = table else {
        return Ok(());
    };
    let table = resolve_table(&ctx, table)?;
    let table = table.as_str();
    let metadata = ctx
        .metadata(&TableDescriptor::new(table))
        .map_err(|err| err.to_string())?;
    println!("table={table}");
    println!("fields={}", metadata.fields_list().join(","));
    println!("pk={}", metadata.pk());
    println!("defaults={}", metadata.with_default().join(","));
    println!("auto={}", metadata.auto_fields().join(","));

    let page = Row::paginate_query(&ctx, &format!("SELECT * FROM {table}"), 1, PREVIEW_ROWS, ())
        .map_err(|err| err.to_string())?;
    println!("rows={}", page.total_items());
    for row in page {
        println!("{}", row.fields().to_json());
    }
    Ok(())
}

/// Looks `name` up in the schema so only declared tables reach SQL text.
fn resolve_table(ctx: &RecordContext, name: &str) -> Result<String, String> {
    let declared: i64 = ctx
        .connection()
        .query_row(
            "SELECT COUNT(*) FROM sqlite_master WHERE type IN ('table', 'view') AND name = ?1",
            [name],
            |row| row.get(0),
        )
        .map_err(|err| err.to_string())?;
    if declared == 0 {
        return Err(format!("table `{name}` does not exist"));
    }
    Ok(name.to_string())
}

#[cfg(test)]
mod tests {
    use super::resolve_table;
    use literecord_core::{AppConfig, RecordContext};

    #[test]
    fn resolve_table_accepts_only_declared_tables() {
        let ctx = RecordContext::from_config(&AppConfig::in_memory("main")).unwrap();
        ctx.connection()
            .execute_batch("CREATE TABLE users (id INTEGER PRIMARY KEY, name TEXT);")
            .unwrap();

        assert_eq!(resolve_table(&ctx, "users").unwrap(), "users");
        assert!(resolve_table(&ctx, "missing").unwrap_err().contains("does not exist"));
        assert!(resolve_table(&ctx, "users; DROP TABLE users").is_err());
    }
}
