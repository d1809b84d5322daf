//! Digest delivery records.  Insert-only from the pipeline's point of view.

use rusqlite::params;
use uuid::Uuid;

use crate::database::Database;
use crate::error::{Result, StoreError};
use crate::models::{conversion_error, json_at, ts_at, ts_to_sql, uuid_at, DigestRecord};

const DIGEST_COLUMNS: &str = "id, user_id, partner_id, digest_type, fields_shared, sent_at";

impl Database {
    pub fn insert_digest_record(&self, record: &DigestRecord) -> Result<()> {
        self.conn().execute(
            "INSERT INTO digest_logs (id, user_id, partner_id, digest_type, fields_shared, sent_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                record.id.to_string(),
                record.user_id.to_string(),
                record.partner_id.to_string(),
                record.digest_type.as_str(),
                serde_json::to_string(&record.fields_shared)?,
                ts_to_sql(&record.sent_at),
            ],
        )?;
        Ok(())
    }

    pub fn get_digest_record(&self, id: Uuid) -> Result<DigestRecord> {
        self.conn()
            .query_row(
                &format!("SELECT {DIGEST_COLUMNS} FROM digest_logs WHERE id = ?1"),
                params![id.to_string()],
                row_to_digest,
            )
            .map_err(|e| match e {
                rusqlite::Error::QueryReturnedNoRows => StoreError::NotFound,
                other => StoreError::Sqlite(other),
            })
    }

    /// Delivery attempts for one (user, partner) pair, oldest first.
    pub fn list_digest_records_for_pair(&self, user_id: Uuid, partner_id: Uuid) -> Result<Vec<DigestRecord>> {
        let mut stmt = self.conn().prepare(&format!(
            "SELECT {DIGEST_COLUMNS} FROM digest_logs
             WHERE user_id = ?1 AND partner_id = ?2
             ORDER BY sent_at ASC, rowid ASC"
        ))?;

        let rows = stmt.query_map(
            params![user_id.to_string(), partner_id.to_string()],
            row_to_digest,
        )?;

        let mut records = Vec::new();
        for row in rows {
            records.push(row?);
        }
        Ok(records)
    }

    pub fn count_digest_records(&self) -> Result<u64> {
        let n: i64 = self
            .conn()
            .query_row("SELECT COUNT(*) FROM digest_logs", [], |row| row.get(0))?;
        Ok(n as u64)
    }
}

fn row_to_digest(row: &rusqlite::Row<'_>) -> rusqlite::Result<DigestRecord> {
    let kind: String = row.get(3)?;
    Ok(DigestRecord {
        id: uuid_at(row, 0)?,
        user_id: uuid_at(row, 1)?,
        partner_id: uuid_at(row, 2)?,
        digest_type: kind.parse().map_err(|e| conversion_error(3, e))?,
        fields_shared: json_at(row, 4)?,
        sent_at: ts_at(row, 5)?,
    })
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use compass_shared::{DigestKind, SharedField};

    use super::*;

    #[test]
    fn insert_get_and_list() {
        let dir = tempfile::tempdir().unwrap();
        let db = Database::open_at(&dir.path().join("d.db")).unwrap();

        let record = DigestRecord {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            partner_id: Uuid::new_v4(),
            digest_type: DigestKind::Weekly,
            fields_shared: vec![SharedField::MoodTrend],
            sent_at: Utc::now(),
        };
        db.insert_digest_record(&record).unwrap();

        let fetched = db.get_digest_record(record.id).unwrap();
        assert_eq!(fetched.digest_type, DigestKind::Weekly);
        assert_eq!(fetched.fields_shared, vec![SharedField::MoodTrend]);

        let listed = db
            .list_digest_records_for_pair(record.user_id, record.partner_id)
            .unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(db.count_digest_records().unwrap(), 1);

        assert!(matches!(
            db.get_digest_record(Uuid::new_v4()),
            Err(StoreError::NotFound)
        ));
    }
}
