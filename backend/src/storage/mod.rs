//! SQLite persistence for templates, published templates and their loaded
//! data, validator tables, the identity directories and the validation log.
//!
//! Functions take a `&Connection` (or `&mut Connection` when they need a
//! transaction) so a request can run all its reads on one connection. Use
//! [`Store::connect`] to obtain one; the schema is created by [`Store::open`].

pub mod directories;
pub mod logs;
pub mod published;
pub mod templates;
pub mod validators;

use crate::engine::table::TableError;
use rusqlite::Connection;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;
use time::format_description::well_known::Rfc3339;
use time::macros::format_description;
use time::{Date, OffsetDateTime};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("sqlite: {0}")]
    Sql(#[from] rusqlite::Error),
    #[error("json: {0}")]
    Json(#[from] serde_json::Error),
    #[error("{0} not found")]
    NotFound(String),
    #[error("revision mismatch (expected={expected}, actual={actual})")]
    RevisionMismatch { expected: i64, actual: i64 },
    #[error("{0}")]
    Conflict(String),
    #[error("stored data is inconsistent: {0}")]
    Corrupt(String),
}

impl From<TableError> for StoreError {
    fn from(value: TableError) -> Self {
        Self::Corrupt(value.to_string())
    }
}

#[derive(Clone, Debug)]
pub struct Store {
    path: PathBuf,
}

impl Store {
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let store = Self {
            path: path.as_ref().to_path_buf(),
        };
        store.migrate()?;
        Ok(store)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn connect(&self) -> Result<Connection, StoreError> {
        let conn = Connection::open(&self.path)?;
        conn.busy_timeout(Duration::from_secs(5))?;
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        Ok(conn)
    }

    fn migrate(&self) -> Result<(), StoreError> {
        let conn = self.connect()?;
        conn.execute_batch(
            r#"
            PRAGMA journal_mode=WAL;
            PRAGMA synchronous=NORMAL;

            CREATE TABLE IF NOT EXISTS templates (
              id TEXT PRIMARY KEY,
              name TEXT NOT NULL,
              fields_json TEXT NOT NULL,
              producers_json TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS published_templates (
              id TEXT PRIMARY KEY,
              template_id TEXT NOT NULL REFERENCES templates(id),
              template_json TEXT NOT NULL,
              period TEXT NOT NULL,
              deadline TEXT NOT NULL,
              published_date TEXT NOT NULL,
              revision INTEGER NOT NULL DEFAULT 0
            );

            CREATE TABLE IF NOT EXISTS loaded_data (
              published_id TEXT NOT NULL REFERENCES published_templates(id) ON DELETE CASCADE,
              dependency TEXT NOT NULL,
              slot INTEGER NOT NULL,
              send_by_json TEXT NOT NULL,
              loaded_date TEXT NOT NULL,
              filled_data_json TEXT NOT NULL,
              PRIMARY KEY (published_id, dependency)
            );

            CREATE TABLE IF NOT EXISTS validators (
              name TEXT PRIMARY KEY,
              columns_json TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS members (
              identification TEXT PRIMARY KEY
            );

            CREATE TABLE IF NOT EXISTS students (
              code TEXT PRIMARY KEY,
              identification TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS validation_logs (
              id INTEGER PRIMARY KEY AUTOINCREMENT,
              published_id TEXT NOT NULL,
              user_json TEXT NOT NULL,
              date TEXT NOT NULL,
              errors_json TEXT NOT NULL
            );
            CREATE INDEX IF NOT EXISTS validation_logs_published
              ON validation_logs(published_id);
            "#,
        )?;
        Ok(())
    }
}

pub(crate) fn format_timestamp(ts: OffsetDateTime) -> Result<String, StoreError> {
    ts.format(&Rfc3339)
        .map_err(|e| StoreError::Corrupt(e.to_string()))
}

pub(crate) fn parse_timestamp(text: &str) -> Result<OffsetDateTime, StoreError> {
    OffsetDateTime::parse(text, &Rfc3339).map_err(|e| StoreError::Corrupt(e.to_string()))
}

pub(crate) fn parse_day(text: &str) -> Result<Date, StoreError> {
    Date::parse(text, format_description!("[year]-[month]-[day]"))
        .map_err(|e| StoreError::Corrupt(e.to_string()))
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::Store;
    use tempfile::TempDir;

    /// A migrated store in a fresh temporary directory. Keep the `TempDir` alive.
    pub fn temp_store() -> (TempDir, Store) {
        let dir = tempfile::tempdir().unwrap();
        let store = Store::open(dir.path().join("ingesta.sqlite")).unwrap();
        (dir, store)
    }
}
