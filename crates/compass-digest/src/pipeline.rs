//! On-demand digest runs.

use std::sync::Arc;

use chrono::Utc;
use serde::Serialize;
use uuid::Uuid;

use compass_store::{PartnerShare, SharedDatabase};

use crate::composer::{compose, MessageBody};
use crate::config::DigestConfig;
use crate::consent::check_consent;
use crate::error::{DigestError, Result};
use crate::recorder::{Delivery, DeliveryRecorder};
use crate::summary::{build_summary, Summary};
use crate::transport::MessageTransport;

/// What a preview returns: the data and the message that would be sent.
#[derive(Debug, Clone, Serialize)]
pub struct DigestPreview {
    pub summary: Summary,
    pub body: MessageBody,
}

#[derive(Clone)]
pub struct DigestPipeline {
    pub(crate) db: SharedDatabase,
    pub(crate) recorder: DeliveryRecorder,
    pub(crate) config: Arc<DigestConfig>,
}

impl DigestPipeline {
    pub fn new(db: SharedDatabase, transport: Arc<dyn MessageTransport>, config: DigestConfig) -> Self {
        let config = Arc::new(config);
        Self {
            recorder: DeliveryRecorder::new(db.clone(), transport, Arc::clone(&config)),
            db,
            config,
        }
    }

    pub fn config(&self) -> &DigestConfig {
        &self.config
    }

    /// Consent, aggregation and composition.  No writes.
    async fn prepare(&self, user_id: Uuid, partner_id: Uuid) -> Result<(PartnerShare, DigestPreview)> {
        let share = check_consent(&self.db, user_id, partner_id).await?;

        let now = Utc::now();
        let window_start = now
            .checked_sub_signed(self.config.window)
            .ok_or(DigestError::WindowOutOfRange {
                window_days: self.config.window.num_days(),
            })?;
        let summary = build_summary(&self.db, user_id, window_start, now).await?;
        let body = compose(&summary, &share.shared_fields);

        Ok((share, DigestPreview { summary, body }))
    }

    /// Render the digest for the pair without persisting or sending it.
    pub async fn preview_digest(&self, user_id: Uuid, partner_id: Uuid) -> Result<DigestPreview> {
        let (_, preview) = self.prepare(user_id, partner_id).await?;
        Ok(preview)
    }

    /// Render, persist, send and audit the digest for the pair.
    pub async fn send_digest(&self, user_id: Uuid, partner_id: Uuid) -> Result<Delivery> {
        let (share, preview) = self.prepare(user_id, partner_id).await?;
        self.recorder.deliver(&share, &preview.body).await
    }
}
