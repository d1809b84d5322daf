//! Delivery & audit recording.
//!
//! A persisted delivery runs these steps in order:
//! 1. resolve the partner's address (nothing is written if this fails);
//! 2. insert a [`DigestRecord`] under a fresh id;
//! 3. send through the transport, bounded by `send_timeout`;
//! 4. append exactly one [`AuditEntry`] tagged with the outcome and pointing
//!    at the record from step 2.
//!
//! A record without an audit entry means the attempt was interrupted between
//! steps 2 and 4; it is left as-is for reconciliation.

use std::sync::Arc;

use chrono::Utc;
use serde::Serialize;
use tracing::{info, warn};
use uuid::Uuid;

use compass_shared::constants::DIGEST_TARGET_TABLE;
use compass_shared::{AuditAction, DigestKind};
use compass_store::{AuditEntry, DigestRecord, PartnerShare, SharedDatabase};

use crate::composer::MessageBody;
use crate::config::DigestConfig;
use crate::error::{DigestError, Result, TransportError};
use crate::transport::{DeliveryReceipt, Envelope, MessageTransport};

/// A confirmed delivery.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Delivery {
    pub digest_id: Uuid,
    pub receipt: DeliveryReceipt,
}

#[derive(Clone)]
pub struct DeliveryRecorder {
    db: SharedDatabase,
    transport: Arc<dyn MessageTransport>,
    config: Arc<DigestConfig>,
}

impl DeliveryRecorder {
    pub fn new(db: SharedDatabase, transport: Arc<dyn MessageTransport>, config: Arc<DigestConfig>) -> Self {
        Self {
            db,
            transport,
            config,
        }
    }

    /// Deliver `body` to the partner of `share`, disclosing `share.shared_fields`.
    pub async fn deliver(&self, share: &PartnerShare, body: &MessageBody) -> Result<Delivery> {
        let to = self.resolve_partner_address(share.partner_id).await?;

        let record = DigestRecord {
            id: Uuid::new_v4(),
            user_id: share.user_id,
            partner_id: share.partner_id,
            digest_type: DigestKind::Weekly,
            fields_shared: share.shared_fields.clone(),
            sent_at: Utc::now(),
        };
        let digest_id = record.id;
        self.db
            .call(move |db| db.insert_digest_record(&record))
            .await?;

        let envelope = Envelope {
            from: self.config.from_address.clone(),
            to,
            subject: self.config.subject.clone(),
            html: body.html.clone(),
        };

        let outcome = match tokio::time::timeout(
            self.config.send_timeout,
            self.transport.send(&envelope),
        )
        .await
        {
            Ok(result) => result,
            Err(_) => Err(TransportError::Timeout(self.config.send_timeout)),
        };

        match outcome {
            Ok(receipt) => {
                self.audit(share.user_id, digest_id, AuditAction::DigestSent)
                    .await?;

                let share_id = share.id;
                let at = Utc::now();
                if let Err(e) = self
                    .db
                    .call(move |db| db.touch_last_shared(share_id, at))
                    .await
                {
                    warn!(share = %share_id, error = %e, "failed to update last_shared");
                }

                info!(
                    digest = %digest_id,
                    user = %share.user_id,
                    partner = %share.partner_id,
                    message_id = %receipt.message_id,
                    "digest sent"
                );
                Ok(Delivery { digest_id, receipt })
            }
            Err(source) => {
                warn!(
                    digest = %digest_id,
                    user = %share.user_id,
                    partner = %share.partner_id,
                    error = %source,
                    "digest delivery failed"
                );
                self.audit(share.user_id, digest_id, AuditAction::DigestSendFailed)
                    .await?;
                Err(DigestError::Transport { digest_id, source })
            }
        }
    }

    async fn resolve_partner_address(&self, partner_id: Uuid) -> Result<String> {
        let partner = self.db.call(move |db| db.find_user(partner_id)).await?;

        partner
            .and_then(|p| p.email)
            .map(|email| email.trim().to_string())
            .filter(|email| !email.is_empty())
            .ok_or(DigestError::PartnerUnresolvable(partner_id))
    }

    async fn audit(&self, actor_id: Uuid, digest_id: Uuid, action: AuditAction) -> Result<()> {
        let entry = AuditEntry {
            id: Uuid::new_v4(),
            actor_id,
            action,
            target_table: DIGEST_TARGET_TABLE.to_string(),
            target_id: digest_id,
            ip_address: self.config.audit_source_addr.clone(),
            created_at: Utc::now(),
        };
        self.db.call(move |db| db.insert_audit_entry(&entry)).await?;
        Ok(())
    }
}
