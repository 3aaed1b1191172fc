//! Task persistence.
//!
//! The service talks to storage through [`TaskStore`]; [`SqliteTaskStore`] is
//! the production backend, a single SQLite file holding the `scheduler` table.

use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use rusqlite::{Connection, OptionalExtension, Row, params};
use thiserror::Error;
use tracing::debug;

use crate::task::{SearchQuery, Task};

/// DDL for the task table. Idempotent.
pub(crate) const SCHEMA_SQL: &str = r#"
CREATE TABLE IF NOT EXISTS scheduler (
    id      INTEGER PRIMARY KEY AUTOINCREMENT,
    date    CHAR(8)      NOT NULL,
    title   VARCHAR(256) NOT NULL,
    comment TEXT         NOT NULL DEFAULT '',
    repeat  VARCHAR(128) NOT NULL DEFAULT ''
);
CREATE INDEX IF NOT EXISTS scheduler_date_idx ON scheduler(date);
"#;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("bad id")]
    BadId,

    #[error("task not found")]
    NotFound,

    #[error("bad date format")]
    BadDate,

    #[error("storage lock poisoned")]
    Poisoned,

    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
}

/// Storage operations the service needs.
///
/// Ids cross this boundary as decimal strings, the way clients send them.
pub trait TaskStore: Send + Sync {
    /// Insert a task and return its new id.
    fn add(&self, task: &Task) -> Result<i64, StoreError>;
    fn get(&self, id: &str) -> Result<Task, StoreError>;
    /// Overwrite every field of the task with `task.id`.
    fn update(&self, task: &Task) -> Result<(), StoreError>;
    fn delete(&self, id: &str) -> Result<(), StoreError>;
    /// Move a task to `date` (`YYYYMMDD`).
    fn set_date(&self, id: &str, date: &str) -> Result<(), StoreError>;
    /// Tasks matching `query`, ordered by date then id.
    fn list(&self, query: &SearchQuery, limit: usize) -> Result<Vec<Task>, StoreError>;
}

/// SQLite-backed [`TaskStore`].
///
/// Thread-safe via an internal `Mutex<Connection>`; every call holds the lock
/// for a single statement.
pub struct SqliteTaskStore {
    conn: Mutex<Connection>,
}

impl SqliteTaskStore {
    /// Open (or create) the database file and make sure the schema exists.
    pub fn open(path: &Path) -> Result<Self, StoreError> {
        debug!("opening task database at {}", path.display());
        Self::with_connection(Connection::open(path)?)
    }

    /// Private in-memory database, mostly for tests.
    pub fn open_in_memory() -> Result<Self, StoreError> {
        Self::with_connection(Connection::open_in_memory()?)
    }

    fn with_connection(conn: Connection) -> Result<Self, StoreError> {
        conn.execute_batch(SCHEMA_SQL)?;
        Ok(Self { conn: Mutex::new(conn) })
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>, StoreError> {
        self.conn.lock().map_err(|_| StoreError::Poisoned)
    }
}

impl TaskStore for SqliteTaskStore {
    fn add(&self, task: &Task) -> Result<i64, StoreError> {
        let conn = self.lock()?;
        conn.execute(
            "INSERT INTO scheduler (date, title, comment, repeat) VALUES (?1, ?2, ?3, ?4)",
            params![task.date, task.title, task.comment, task.repeat],
        )?;
        Ok(conn.last_insert_rowid())
    }

    fn get(&self, id: &str) -> Result<Task, StoreError> {
        let id = parse_id(id)?;
        let conn = self.lock()?;
        conn.query_row(
            "SELECT id, date, title, comment, repeat FROM scheduler WHERE id = ?1",
            params![id],
            row_to_task,
        )
        .optional()?
        .ok_or(StoreError::NotFound)
    }

    fn update(&self, task: &Task) -> Result<(), StoreError> {
        let id = parse_id(&task.id)?;
        let conn = self.lock()?;
        let changed = conn.execute(
            "UPDATE scheduler SET date = ?1, title = ?2, comment = ?3, repeat = ?4 WHERE id = ?5",
            params![task.date, task.title, task.comment, task.repeat, id],
        )?;
        expect_one(changed)
    }

    fn delete(&self, id: &str) -> Result<(), StoreError> {
        let id = parse_id(id)?;
        let conn = self.lock()?;
        let changed = conn.execute("DELETE FROM scheduler WHERE id = ?1", params![id])?;
        expect_one(changed)
    }

    fn set_date(&self, id: &str, date: &str) -> Result<(), StoreError> {
        let date = date.trim();
        if date.len() != 8 {
            return Err(StoreError::BadDate);
        }
        let id = parse_id(id)?;
        let conn = self.lock()?;
        let changed = conn.execute("UPDATE scheduler SET date = ?1 WHERE id = ?2", params![date, id])?;
        expect_one(changed)
    }

    fn list(&self, query: &SearchQuery, limit: usize) -> Result<Vec<Task>, StoreError> {
        const BASE: &str = "SELECT id, date, title, comment, repeat FROM scheduler";
        let limit = i64::try_from(limit).unwrap_or(i64::MAX);
        let conn = self.lock()?;

        let tasks = match query {
            SearchQuery::All => {
                let mut stmt = conn.prepare(&format!("{BASE} ORDER BY date, id LIMIT ?1"))?;
                let rows = stmt.query_map(params![limit], row_to_task)?.collect::<Result<Vec<_>, _>>()?;
                rows
            }
            SearchQuery::Date(date) => {
                let mut stmt = conn.prepare(&format!("{BASE} WHERE date = ?1 ORDER BY date, id LIMIT ?2"))?;
                let rows = stmt.query_map(params![date, limit], row_to_task)?.collect::<Result<Vec<_>, _>>()?;
                rows
            }
            SearchQuery::Text(text) => {
                let pattern = format!("%{text}%");
                let mut stmt =
                    conn.prepare(&format!("{BASE} WHERE title LIKE ?1 OR comment LIKE ?1 ORDER BY date, id LIMIT ?2"))?;
                let rows = stmt.query_map(params![pattern, limit], row_to_task)?.collect::<Result<Vec<_>, _>>()?;
                rows
            }
        };
        Ok(tasks)
    }
}

fn parse_id(raw: &str) -> Result<i64, StoreError> {
    raw.trim().parse::<i64>().ok().filter(|id| *id > 0).ok_or(StoreError::BadId)
}

fn expect_one(changed: usize) -> Result<(), StoreError> {
    if changed == 0 { Err(StoreError::NotFound) } else { Ok(()) }
}

fn row_to_task(row: &Row<'_>) -> rusqlite::Result<Task> {
    Ok(Task {
        id: row.get::<_, i64>(0)?.to_string(),
        date: row.get(1)?,
        title: row.get(2)?,
        comment: row.get(3)?,
        repeat: row.get(4)?,
    })
}
