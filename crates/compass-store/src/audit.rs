//! Append-only audit trail.

use rusqlite::params;
use uuid::Uuid;

use crate::database::Database;
use crate::error::Result;
use crate::models::{conversion_error, ts_at, ts_to_sql, uuid_at, AuditEntry};

const AUDIT_COLUMNS: &str =
    "id, actor_id, action, target_table, target_id, ip_address, created_at";

impl Database {
    pub fn insert_audit_entry(&self, entry: &AuditEntry) -> Result<()> {
        self.conn().execute(
            "INSERT INTO audit_logs (id, actor_id, action, target_table, target_id, ip_address, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                entry.id.to_string(),
                entry.actor_id.to_string(),
                entry.action.as_str(),
                entry.target_table,
                entry.target_id.to_string(),
                entry.ip_address,
                ts_to_sql(&entry.created_at),
            ],
        )?;
        Ok(())
    }

    /// Entries referring to one record, in write order.
    pub fn list_audit_entries_for_target(&self, table: &str, target_id: Uuid) -> Result<Vec<AuditEntry>> {
        let mut stmt = self.conn().prepare(&format!(
            "SELECT {AUDIT_COLUMNS} FROM audit_logs
             WHERE target_table = ?1 AND target_id = ?2
             ORDER BY rowid ASC"
        ))?;
        let rows = stmt.query_map(params![table, target_id.to_string()], row_to_audit)?;

        let mut entries = Vec::new();
        for row in rows {
            entries.push(row?);
        }
        Ok(entries)
    }

    /// The whole trail, in write order.
    pub fn list_audit_entries(&self) -> Result<Vec<AuditEntry>> {
        let mut stmt = self.conn().prepare(&format!(
            "SELECT {AUDIT_COLUMNS} FROM audit_logs ORDER BY rowid ASC"
        ))?;
        let rows = stmt.query_map([], row_to_audit)?;

        let mut entries = Vec::new();
        for row in rows {
            entries.push(row?);
        }
        Ok(entries)
    }
}

fn row_to_audit(row: &rusqlite::Row<'_>) -> rusqlite::Result<AuditEntry> {
    let action: String = row.get(2)?;
    Ok(AuditEntry {
        id: uuid_at(row, 0)?,
        actor_id: uuid_at(row, 1)?,
        action: action.parse().map_err(|e| conversion_error(2, e))?,
        target_table: row.get(3)?,
        target_id: uuid_at(row, 4)?,
        ip_address: row.get(5)?,
        created_at: ts_at(row, 6)?,
    })
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use compass_shared::AuditAction;

    use super::*;

    #[test]
    fn entries_are_scoped_by_target() {
        let dir = tempfile::tempdir().unwrap();
        let db = Database::open_at(&dir.path().join("a.db")).unwrap();

        let target = Uuid::new_v4();
        for (action, target_id) in [
            (AuditAction::DigestSendFailed, target),
            (AuditAction::DigestSent, Uuid::new_v4()),
        ] {
            db.insert_audit_entry(&AuditEntry {
                id: Uuid::new_v4(),
                actor_id: Uuid::new_v4(),
                action,
                target_table: "digest_logs".into(),
                target_id,
                ip_address: "0.0.0.0".into(),
                created_at: Utc::now(),
            })
            .unwrap();
        }

        let scoped = db.list_audit_entries_for_target("digest_logs", target).unwrap();
        assert_eq!(scoped.len(), 1);
        assert_eq!(scoped[0].action, AuditAction::DigestSendFailed);
        assert_eq!(db.list_audit_entries().unwrap().len(), 2);
    }
}
