//! Consent relationship reads.
//!
//! New relationships and their `consent` / `shared_fields` values are written
//! by the invitation flow; the pipeline itself only reads them and bumps
//! `last_shared` after a confirmed delivery.

use chrono::{DateTime, Utc};
use rusqlite::params;
use uuid::Uuid;

use crate::database::Database;
use crate::error::{Result, StoreError};
use crate::models::{json_at, opt_ts_at, optional, ts_to_sql, uuid_at, PartnerShare};

const SHARE_COLUMNS: &str = "id, user_id, partner_id, consent, shared_fields, last_shared";

/// A consenting row whose columns did not decode.  The identifiers are kept
/// when they parse on their own.
#[derive(Debug)]
pub struct UnreadableShare {
    pub id: Option<Uuid>,
    pub user_id: Option<Uuid>,
    pub partner_id: Option<Uuid>,
    pub error: StoreError,
}

/// One enumerated relationship: decoded, or the reason it was not.
pub type ShareRow = std::result::Result<PartnerShare, UnreadableShare>;

impl Database {
    pub fn insert_partner_share(&self, share: &PartnerShare) -> Result<()> {
        self.conn().execute(
            "INSERT INTO partner_shares (id, user_id, partner_id, consent, shared_fields, last_shared)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                share.id.to_string(),
                share.user_id.to_string(),
                share.partner_id.to_string(),
                share.consent,
                serde_json::to_string(&share.shared_fields)?,
                share.last_shared.as_ref().map(ts_to_sql),
            ],
        )?;
        Ok(())
    }

    /// Relationship for the exact (user, partner) pair.
    pub fn find_partner_share(&self, user_id: Uuid, partner_id: Uuid) -> Result<Option<PartnerShare>> {
        optional(self.conn().query_row(
            &format!(
                "SELECT {SHARE_COLUMNS} FROM partner_shares
                 WHERE user_id = ?1 AND partner_id = ?2"
            ),
            params![user_id.to_string(), partner_id.to_string()],
            row_to_share,
        ))
    }

    /// Every relationship with `consent = 1`, in insertion order.
    ///
    /// A row that fails to decode is returned as an [`UnreadableShare`] in
    /// its place; only a failure of the query itself is an error.
    pub fn list_consenting_shares(&self) -> Result<Vec<ShareRow>> {
        let mut stmt = self.conn().prepare(&format!(
            "SELECT {SHARE_COLUMNS} FROM partner_shares
             WHERE consent = 1
             ORDER BY rowid ASC"
        ))?;

        let mut rows = stmt.query([])?;

        let mut shares = Vec::new();
        while let Some(row) = rows.next()? {
            shares.push(row_to_share(row).map_err(|e| UnreadableShare {
                id: uuid_at(row, 0).ok(),
                user_id: uuid_at(row, 1).ok(),
                partner_id: uuid_at(row, 2).ok(),
                error: e.into(),
            }));
        }
        Ok(shares)
    }

    /// Record a confirmed delivery time.  Returns `true` if a row was updated.
    pub fn touch_last_shared(&self, share_id: Uuid, at: DateTime<Utc>) -> Result<bool> {
        let affected = self.conn().execute(
            "UPDATE partner_shares SET last_shared = ?2 WHERE id = ?1",
            params![share_id.to_string(), ts_to_sql(&at)],
        )?;
        Ok(affected > 0)
    }
}

fn row_to_share(row: &rusqlite::Row<'_>) -> rusqlite::Result<PartnerShare> {
    Ok(PartnerShare {
        id: uuid_at(row, 0)?,
        user_id: uuid_at(row, 1)?,
        partner_id: uuid_at(row, 2)?,
        consent: row.get(3)?,
        shared_fields: json_at(row, 4)?,
        last_shared: opt_ts_at(row, 5)?,
    })
}
