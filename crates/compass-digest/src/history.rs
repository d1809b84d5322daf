//! Audit review for one relationship.

use serde::Serialize;
use uuid::Uuid;

use compass_shared::constants::DIGEST_TARGET_TABLE;
use compass_store::{AuditEntry, DigestRecord};

use crate::error::Result;
use crate::pipeline::DigestPipeline;

/// A persisted attempt and the audit entries pointing at it.  An empty
/// `audit` list marks an unconfirmed attempt.
#[derive(Debug, Clone, Serialize)]
pub struct HistoryEntry {
    pub record: DigestRecord,
    pub audit: Vec<AuditEntry>,
}

impl DigestPipeline {
    /// Every digest record for the pair, oldest first.  Not consent-gated:
    /// revoked relationships keep their trail.
    pub async fn digest_history(&self, user_id: Uuid, partner_id: Uuid) -> Result<Vec<HistoryEntry>> {
        let entries: Vec<HistoryEntry> = self
            .db
            .call(move |db| {
                db.list_digest_records_for_pair(user_id, partner_id)?
                    .into_iter()
                    .map(|record| -> compass_store::Result<HistoryEntry> {
                        let audit = db.list_audit_entries_for_target(DIGEST_TARGET_TABLE, record.id)?;
                        Ok(HistoryEntry { record, audit })
                    })
                    .collect()
            })
            .await?;
        Ok(entries)
    }
}
