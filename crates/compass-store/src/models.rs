//! Domain model structs persisted in the SQLite database.
//!
//! Every struct derives `Serialize` and `Deserialize` so it can be handed
//! directly to the HTTP layer.

use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::types::Type;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use compass_shared::{AuditAction, DigestKind, SharedField};

// ---------------------------------------------------------------------------
// User
// ---------------------------------------------------------------------------

/// An account.  The pipeline only reads `id` and `email`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct User {
    pub id: Uuid,
    /// Delivery address; partners without one cannot receive digests.
    pub email: Option<String>,
    pub role: String,
    pub partner_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// SymptomLog
// ---------------------------------------------------------------------------

/// One logging event.  Immutable once written.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SymptomLog {
    pub id: Uuid,
    pub user_id: Uuid,
    pub log_date: DateTime<Utc>,
    /// Raw mood scalar as entered; only numeric values count towards averages.
    pub mood: Option<String>,
    pub notes: Option<String>,
}

// ---------------------------------------------------------------------------
// PredictiveLog
// ---------------------------------------------------------------------------

/// A model-derived forecast snapshot.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PredictiveLog {
    pub id: Uuid,
    pub user_id: Uuid,
    pub predicted_symptoms: serde_json::Value,
    pub created_at: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// PartnerShare
// ---------------------------------------------------------------------------

/// A consent relationship authorizing `user_id` to share `shared_fields`
/// with `partner_id`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PartnerShare {
    pub id: Uuid,
    pub user_id: Uuid,
    pub partner_id: Uuid,
    pub consent: bool,
    pub shared_fields: Vec<SharedField>,
    pub last_shared: Option<DateTime<Utc>>,
}

// ---------------------------------------------------------------------------
// DigestRecord
// ---------------------------------------------------------------------------

/// One row per persisted delivery attempt.  Never mutated after insert.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DigestRecord {
    pub id: Uuid,
    pub user_id: Uuid,
    pub partner_id: Uuid,
    pub digest_type: DigestKind,
    pub fields_shared: Vec<SharedField>,
    pub sent_at: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// AuditEntry
// ---------------------------------------------------------------------------

/// Append-only audit row.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AuditEntry {
    pub id: Uuid,
    pub actor_id: Uuid,
    pub action: AuditAction,
    pub target_table: String,
    pub target_id: Uuid,
    pub ip_address: String,
    pub created_at: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// Column helpers
// ---------------------------------------------------------------------------

/// Timestamps written by this crate use UTC with microsecond precision.
/// Rows written elsewhere may use any RFC 3339 form, so range queries go
/// through `julianday` and the parsed value rather than text comparison.
pub(crate) fn ts_to_sql(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Micros, true)
}

pub(crate) fn conversion_error<E>(idx: usize, e: E) -> rusqlite::Error
where
    E: std::error::Error + Send + Sync + 'static,
{
    rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e))
}

pub(crate) fn uuid_at(row: &rusqlite::Row<'_>, idx: usize) -> rusqlite::Result<Uuid> {
    let s: String = row.get(idx)?;
    Uuid::parse_str(&s).map_err(|e| conversion_error(idx, e))
}

pub(crate) fn opt_uuid_at(row: &rusqlite::Row<'_>, idx: usize) -> rusqlite::Result<Option<Uuid>> {
    let s: Option<String> = row.get(idx)?;
    s.map(|s| Uuid::parse_str(&s))
        .transpose()
        .map_err(|e| conversion_error(idx, e))
}

pub(crate) fn ts_at(row: &rusqlite::Row<'_>, idx: usize) -> rusqlite::Result<DateTime<Utc>> {
    let s: String = row.get(idx)?;
    DateTime::parse_from_rfc3339(&s)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| conversion_error(idx, e))
}

pub(crate) fn opt_ts_at(
    row: &rusqlite::Row<'_>,
    idx: usize,
) -> rusqlite::Result<Option<DateTime<Utc>>> {
    let s: Option<String> = row.get(idx)?;
    s.map(|s| DateTime::parse_from_rfc3339(&s).map(|dt| dt.with_timezone(&Utc)))
        .transpose()
        .map_err(|e| conversion_error(idx, e))
}

pub(crate) fn json_at<T>(row: &rusqlite::Row<'_>, idx: usize) -> rusqlite::Result<T>
where
    T: serde::de::DeserializeOwned,
{
    let s: String = row.get(idx)?;
    serde_json::from_str(&s).map_err(|e| conversion_error(idx, e))
}

/// Map `QueryReturnedNoRows` to `Ok(None)`.
pub(crate) fn optional<T>(res: rusqlite::Result<T>) -> crate::Result<Option<T>> {
    match res {
        Ok(v) => Ok(Some(v)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e.into()),
    }
}
