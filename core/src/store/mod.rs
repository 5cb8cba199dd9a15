//! SQLite persistence layer for overrides and the audit trail.
//!
//! RULE: Only the store module talks to the database.
//! Everything else goes through the OverrideStore / AuditSink traits.

use crate::error::DeskResult;
use rusqlite::Connection;

mod audit;
mod overrides;

pub struct DeskStore {
    conn: Connection,
    path: Option<String>, // None for :memory:, Some(path) for file
}

impl DeskStore {
    pub fn open(path: &str) -> DeskResult<Self> {
        let conn = Connection::open_with_flags(
            path,
            rusqlite::OpenFlags::SQLITE_OPEN_READ_WRITE
                | rusqlite::OpenFlags::SQLITE_OPEN_CREATE
                | rusqlite::OpenFlags::SQLITE_OPEN_URI,
        )?;
        // WAL mode only for real files (shared-memory and :memory: ignore it).
        let _ = conn.execute_batch("PRAGMA journal_mode=WAL;");
        Ok(Self {
            conn,
            path: Some(path.to_string()),
        })
    }

    /// Open an in-memory database (used in tests).
    pub fn in_memory() -> DeskResult<Self> {
        let conn = Connection::open_in_memory()?;
        Ok(Self { conn, path: None })
    }

    /// Reopen a new connection to the same database.
    /// For in-memory databases, this returns a new in-memory database (isolated).
    pub fn reopen(&self) -> DeskResult<Self> {
        match &self.path {
            Some(p) => Self::open(p),
            None => Self::in_memory(),
        }
    }

    /// Apply all schema migrations in order.
    pub fn migrate(&self) -> DeskResult<()> {
        self.conn
            .execute_batch(include_str!("../../../migrations/001_overrides.sql"))?;
        self.conn
            .execute_batch(include_str!("../../../migrations/002_audit_log.sql"))?;
        Ok(())
    }

    /// Open and migrate in one step.
    pub fn open_migrated(path: &str) -> DeskResult<Self> {
        let store = if path == ":memory:" {
            Self::in_memory()?
        } else {
            Self::open(path)?
        };
        store.migrate()?;
        Ok(store)
    }
}

fn text_conversion_error<E>(column: usize, err: E) -> rusqlite::Error
where
    E: std::error::Error + Send + Sync + 'static,
{
    rusqlite::Error::FromSqlConversionFailure(column, rusqlite::types::Type::Text, Box::new(err))
}
