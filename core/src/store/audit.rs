use super::{text_conversion_error, DeskStore};
use crate::{
    audit::{AuditAction, AuditLogEntry, AuditSink},
    error::DeskResult,
};
use chrono::{DateTime, Utc};
use rusqlite::{params, Row};

fn entry_from_row(row: &Row<'_>) -> rusqlite::Result<AuditLogEntry> {
    let timestamp = DateTime::parse_from_rfc3339(&row.get::<_, String>(1)?)
        .map_err(|e| text_conversion_error(1, e))?
        .with_timezone(&Utc);
    let action = row
        .get::<_, String>(3)?
        .parse::<AuditAction>()
        .map_err(|e| text_conversion_error(3, e))?;
    Ok(AuditLogEntry {
        id: row.get(0)?,
        timestamp,
        customer_id: row.get(2)?,
        action,
        details: row.get(4)?,
        actor: row.get(5)?,
    })
}

impl DeskStore {
    // ── Audit log ─────────────────────────────────────────────────

    pub fn append_audit(&self, entry: &AuditLogEntry) -> DeskResult<()> {
        self.conn.execute(
            "INSERT INTO audit_log (id, timestamp, customer_id, action, details, actor)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                entry.id,
                entry.timestamp.to_rfc3339(),
                entry.customer_id,
                entry.action.as_str(),
                entry.details,
                entry.actor,
            ],
        )?;
        Ok(())
    }

    /// Entries for one customer, oldest first.
    pub fn audit_for_customer(&self, customer_id: &str) -> DeskResult<Vec<AuditLogEntry>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, timestamp, customer_id, action, details, actor
             FROM audit_log WHERE customer_id = ?1
             ORDER BY seq ASC",
        )?;
        let rows = stmt.query_map(params![customer_id], entry_from_row)?;
        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }

    /// The most recent `limit` entries, newest first.
    pub fn recent_audit(&self, limit: usize) -> DeskResult<Vec<AuditLogEntry>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, timestamp, customer_id, action, details, actor
             FROM audit_log ORDER BY seq DESC LIMIT ?1",
        )?;
        let rows = stmt.query_map(params![limit as i64], entry_from_row)?;
        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }

    pub fn audit_count(&self) -> DeskResult<i64> {
        let n = self
            .conn
            .query_row("SELECT COUNT(*) FROM audit_log", [], |row| row.get(0))?;
        Ok(n)
    }
}

impl AuditSink for DeskStore {
    fn append(&mut self, entry: &AuditLogEntry) -> DeskResult<()> {
        self.append_audit(entry)
    }
}
