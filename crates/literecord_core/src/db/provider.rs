//! Logical database name → live connection handle.
//!
//! Handles are cached per name until `force_new` replaces them or the
//! provider is dropped. No pooling, no locking.

use super::open::{open_db, open_db_in_memory};
use super::{DbError, DbResult};
use crate::config::{AppConfig, DatabaseSettings};
use log::debug;
use rusqlite::Connection;
use std::cell::RefCell;
use std::collections::{BTreeMap, HashMap};
use std::rc::Rc;

pub struct ConnectionProvider {
    settings: BTreeMap<String, DatabaseSettings>,
    cache: RefCell<HashMap<String, Rc<Connection>>>,
}

impl ConnectionProvider {
    pub fn new(settings: BTreeMap<String, DatabaseSettings>) -> Self {
        Self {
            settings,
            cache: RefCell::new(HashMap::new()),
        }
    }

    pub fn from_config(config: &AppConfig) -> Self {
        Self::new(config.databases.clone())
    }

    /// Returns a ready-to-use handle for `name`.
    ///
    /// `force_new` bypasses (and replaces) the cached handle. For `:memory:`
    /// databases that means a fresh, empty database.
    pub fn get(&self, name: &str, force_new: bool) -> DbResult<Rc<Connection>> {
        if !force_new {
            if let Some(conn) = self.cache.borrow().get(name) {
                return Ok(Rc::clone(conn));
            }
        }

        let settings = self
            .settings
            .get(name)
            .ok_or_else(|| DbError::UnknownDatabase {
                name: name.to_string(),
            })?;
        let conn = if settings.is_in_memory() {
            open_db_in_memory(settings.busy_timeout())?
        } else {
            open_db(&settings.path, settings.busy_timeout())?
        };
        debug!("event=db_handle module=db status=ok database={name} force_new={force_new}");

        let conn = Rc::new(conn);
        self.cache
            .borrow_mut()
            .insert(name.to_string(), Rc::clone(&conn));
        Ok(conn)
    }

    /// Drops every cached handle. Handles still held elsewhere stay open.
    pub fn close_all(&self) {
        self.cache.borrow_mut().clear();
    }
}

#[cfg(test)]
mod tests {
    use super::ConnectionProvider;
    use crate::config::AppConfig;
    use crate::db::DbError;
    use std::rc::Rc;

    #[test]
    fn get_reuses_cached_handle_unless_forced() {
        let provider = ConnectionProvider::from_config(&AppConfig::in_memory("main"));

        let first = provider.get("main", false).unwrap();
        let second = provider.get("main", false).unwrap();
        assert!(Rc::ptr_eq(&first, &second));

        let forced = provider.get("main", true).unwrap();
        assert!(!Rc::ptr_eq(&first, &forced));
        let after = provider.get("main", false).unwrap();
        assert!(Rc::ptr_eq(&forced, &after));
    }

    #[test]
    fn close_all_drops_cached_handles() {
        let provider = ConnectionProvider::from_config(&AppConfig::in_memory("main"));
        let first = provider.get("main", false).unwrap();
        first
            .execute_batch("CREATE TABLE users (id INTEGER PRIMARY KEY);")
            .unwrap();

        provider.close_all();
        let reopened = provider.get("main", false).unwrap();
        assert!(!Rc::ptr_eq(&first, &reopened));

        let tables: i64 = reopened
            .query_row("SELECT COUNT(*) FROM sqlite_master;", [], |row| row.get(0))
            .unwrap();
        assert_eq!(tables, 0);
    }

    #[test]
    fn unknown_database_is_rejected() {
        let provider = ConnectionProvider::from_config(&AppConfig::in_memory("main"));
        let err = provider.get("other", false).unwrap_err();
        assert!(matches!(err, DbError::UnknownDatabase { ref name } if name == "other"));
    }

    #[test]
    fn handles_have_foreign_keys_enabled() {
        let provider = ConnectionProvider::from_config(&AppConfig::in_memory("main"));
        let conn = provider.get("main", false).unwrap();
        let enabled: i64 = conn
            .query_row("PRAGMA foreign_keys;", [], |row| row.get(0))
            .unwrap();
        assert_eq!(enabled, 1);
    }
}
