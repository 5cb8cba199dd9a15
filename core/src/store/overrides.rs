use super::{text_conversion_error, DeskStore};
use crate::{
    error::DeskResult,
    overrides::{KycStatus, LoanDecision, Override, OverrideSnapshot, OverrideStore},
};
use rusqlite::{params, OptionalExtension, Row};

const OVERRIDE_COLUMNS: &str =
    "customer_id, frozen, flagged, remark, kyc_status, loan_status, card_blocked";

fn override_from_row(row: &Row<'_>) -> rusqlite::Result<(String, Override)> {
    let kyc_status = row
        .get::<_, Option<String>>(4)?
        .map(|s| s.parse::<KycStatus>().map_err(|e| text_conversion_error(4, e)))
        .transpose()?;
    let loan_status = row
        .get::<_, Option<String>>(5)?
        .map(|s| s.parse::<LoanDecision>().map_err(|e| text_conversion_error(5, e)))
        .transpose()?;
    Ok((
        row.get(0)?,
        Override {
            frozen: row.get(1)?,
            flagged: row.get(2)?,
            remark: row.get(3)?,
            kyc_status,
            loan_status,
            card_blocked: row.get(6)?,
        },
    ))
}

impl DeskStore {
    // ── Override ──────────────────────────────────────────────────

    pub fn override_count(&self) -> DeskResult<i64> {
        let n = self
            .conn
            .query_row("SELECT COUNT(*) FROM customer_override", [], |row| row.get(0))?;
        Ok(n)
    }

    pub fn clear_override(&self, customer_id: &str) -> DeskResult<()> {
        self.conn.execute(
            "DELETE FROM customer_override WHERE customer_id = ?1",
            params![customer_id],
        )?;
        Ok(())
    }
}

impl OverrideStore for DeskStore {
    fn get(&self, customer_id: &str) -> DeskResult<Option<Override>> {
        let sql = format!("SELECT {OVERRIDE_COLUMNS} FROM customer_override WHERE customer_id = ?1");
        let found = self
            .conn
            .query_row(&sql, params![customer_id], override_from_row)
            .optional()?;
        Ok(found.map(|(_, ov)| ov))
    }

    fn snapshot(&self) -> DeskResult<OverrideSnapshot> {
        let sql = format!("SELECT {OVERRIDE_COLUMNS} FROM customer_override");
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map([], override_from_row)?;
        rows.collect::<Result<OverrideSnapshot, _>>().map_err(Into::into)
    }

    /// Unset fields in `patch` leave the stored column untouched.
    fn upsert(&mut self, customer_id: &str, patch: &Override) -> DeskResult<Override> {
        self.conn.execute(
            "INSERT INTO customer_override (
                customer_id, frozen, flagged, remark, kyc_status, loan_status, card_blocked, updated_at
             ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
             ON CONFLICT(customer_id) DO UPDATE SET
                frozen       = COALESCE(excluded.frozen,       customer_override.frozen),
                flagged      = COALESCE(excluded.flagged,      customer_override.flagged),
                remark       = COALESCE(excluded.remark,       customer_override.remark),
                kyc_status   = COALESCE(excluded.kyc_status,   customer_override.kyc_status),
                loan_status  = COALESCE(excluded.loan_status,  customer_override.loan_status),
                card_blocked = COALESCE(excluded.card_blocked, customer_override.card_blocked),
                updated_at   = excluded.updated_at",
            params![
                customer_id,
                patch.frozen,
                patch.flagged,
                patch.remark,
                patch.kyc_status.map(|k| k.as_str()),
                patch.loan_status.map(|l| l.as_str()),
                patch.card_blocked,
                chrono::Utc::now().to_rfc3339(),
            ],
        )?;
        log::debug!("store: override upserted for {customer_id}");
        Ok(self.get(customer_id)?.unwrap_or_default())
    }

    fn restore(&mut self, customer_id: &str, previous: Option<&Override>) -> DeskResult<()> {
        let tx = self.conn.unchecked_transaction()?;
        tx.execute(
            "DELETE FROM customer_override WHERE customer_id = ?1",
            params![customer_id],
        )?;
        if let Some(ov) = previous {
            tx.execute(
                "INSERT INTO customer_override (
                    customer_id, frozen, flagged, remark, kyc_status, loan_status, card_blocked, updated_at
                 ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
                params![
                    customer_id,
                    ov.frozen,
                    ov.flagged,
                    ov.remark,
                    ov.kyc_status.map(|k| k.as_str()),
                    ov.loan_status.map(|l| l.as_str()),
                    ov.card_blocked,
                    chrono::Utc::now().to_rfc3339(),
                ],
            )?;
        }
        tx.commit()?;
        log::debug!("store: override restored for {customer_id}");
        Ok(())
    }
}
