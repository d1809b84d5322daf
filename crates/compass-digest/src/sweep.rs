//! Batch sweep over every consenting relationship.
//!
//! Each relationship gets its own persisted run.  Runs proceed concurrently
//! up to `DigestConfig::concurrency`, and results are collected in
//! enumeration order.  A failed run is captured as a [`SweepOutcome::Failed`]
//! entry; it never aborts the sweep.

use futures::stream::{self, StreamExt};
use serde::Serialize;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use uuid::Uuid;

use compass_store::{ShareRow, UnreadableShare};

use crate::error::{ErrorKind, Result};
use crate::pipeline::DigestPipeline;
use crate::recorder::Delivery;

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum SweepOutcome {
    Sent(Delivery),
    Failed {
        kind: ErrorKind,
        /// Set when a digest record was written before the failure.
        digest_id: Option<Uuid>,
        message: String,
    },
}

/// Identifiers are `None` only for a stored relationship whose id columns
/// could not be read.
#[derive(Debug, Clone, Serialize)]
pub struct SweepEntry {
    pub share_id: Option<Uuid>,
    pub user_id: Option<Uuid>,
    pub partner_id: Option<Uuid>,
    pub ok: bool,
    #[serde(flatten)]
    pub outcome: SweepOutcome,
}

#[derive(Debug, Clone, Serialize)]
pub struct SweepReport {
    pub entries: Vec<SweepEntry>,
    pub sent: usize,
    pub failed: usize,
    /// Cancellation stopped the sweep before every relationship was started.
    pub cancelled: bool,
}

impl DigestPipeline {
    /// Run a persisted digest for every relationship with consent.
    ///
    /// Fails only when the relationships cannot be enumerated.  Once `cancel`
    /// fires no further relationships are started; runs already in flight
    /// finish and are reported.
    pub async fn run_sweep(&self, cancel: &CancellationToken) -> Result<SweepReport> {
        let shares = self.db.call(|db| db.list_consenting_shares()).await?;
        let total = shares.len();
        let limit = self.config.concurrency.max(1);

        info!(relationships = total, concurrency = limit, "digest sweep started");

        let entries: Vec<SweepEntry> = stream::iter(shares)
            .take_while(|_| futures::future::ready(!cancel.is_cancelled()))
            .map(|share| self.run_one(share))
            .buffered(limit)
            .collect()
            .await;

        let sent = entries.iter().filter(|e| e.ok).count();
        let failed = entries.len() - sent;
        let cancelled = entries.len() < total;

        info!(sent, failed, cancelled, "digest sweep finished");

        Ok(SweepReport {
            entries,
            sent,
            failed,
            cancelled,
        })
    }

    async fn run_one(&self, row: ShareRow) -> SweepEntry {
        let share = match row {
            Ok(share) => share,
            Err(unreadable) => return unreadable_entry(unreadable),
        };

        let outcome = match self.send_digest(share.user_id, share.partner_id).await {
            Ok(delivery) => SweepOutcome::Sent(delivery),
            Err(e) => {
                warn!(share = %share.id, kind = ?e.kind(), error = %e, "sweep entry failed");
                SweepOutcome::Failed {
                    kind: e.kind(),
                    digest_id: e.digest_id(),
                    message: e.to_string(),
                }
            }
        };

        SweepEntry {
            share_id: Some(share.id),
            user_id: Some(share.user_id),
            partner_id: Some(share.partner_id),
            ok: matches!(outcome, SweepOutcome::Sent(_)),
            outcome,
        }
    }
}

fn unreadable_entry(row: UnreadableShare) -> SweepEntry {
    warn!(share = ?row.id, error = %row.error, "sweep skipped unreadable relationship");
    SweepEntry {
        share_id: row.id,
        user_id: row.user_id,
        partner_id: row.partner_id,
        ok: false,
        outcome: SweepOutcome::Failed {
            kind: ErrorKind::Store,
            digest_id: None,
            message: row.error.to_string(),
        },
    }
}
