//! Fixtures shared by the pipeline tests.

use std::collections::HashSet;
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tempfile::TempDir;
use uuid::Uuid;

use compass_shared::SharedField;
use compass_store::{AuditEntry, Database, PartnerShare, SharedDatabase, SymptomLog, User};

use crate::error::TransportError;
use crate::transport::{DeliveryReceipt, Envelope, MessageTransport};

/// On-disk database in a temporary directory, removed on drop.
pub(crate) struct Fixture {
    _dir: TempDir,
    pub db: SharedDatabase,
}

impl Fixture {
    pub fn new() -> Self {
        let dir = tempfile::tempdir().unwrap();
        let db = Database::open_at(&dir.path().join("digest.db")).unwrap();
        Self {
            _dir: dir,
            db: SharedDatabase::new(db),
        }
    }

    pub async fn user(&self, email: Option<&str>) -> Uuid {
        let user = User {
            id: Uuid::new_v4(),
            email: email.map(str::to_string),
            role: "user".into(),
            partner_id: None,
            created_at: Utc::now(),
        };
        let id = user.id;
        self.db.call(move |db| db.insert_user(&user)).await.unwrap();
        id
    }

    pub async fn share(
        &self,
        user_id: Uuid,
        partner_id: Uuid,
        consent: bool,
        fields: &[SharedField],
    ) -> PartnerShare {
        let share = PartnerShare {
            id: Uuid::new_v4(),
            user_id,
            partner_id,
            consent,
            shared_fields: fields.to_vec(),
            last_shared: None,
        };
        let stored = share.clone();
        self.db
            .call(move |db| db.insert_partner_share(&stored))
            .await
            .unwrap();
        share
    }

    pub async fn log(
        &self,
        user_id: Uuid,
        at: DateTime<Utc>,
        mood: Option<&str>,
        notes: Option<&str>,
    ) {
        let log = SymptomLog {
            id: Uuid::new_v4(),
            user_id,
            log_date: at,
            mood: mood.map(str::to_string),
            notes: notes.map(str::to_string),
        };
        self.db
            .call(move |db| db.insert_symptom_log(&log))
            .await
            .unwrap();
    }

    pub async fn digest_count(&self) -> u64 {
        self.db.call(|db| db.count_digest_records()).await.unwrap()
    }

    pub async fn audit(&self) -> Vec<AuditEntry> {
        self.db.call(|db| db.list_audit_entries()).await.unwrap()
    }
}

/// Records every envelope; fails for the configured addresses.
#[derive(Default)]
pub(crate) struct RecordingTransport {
    pub sent: Mutex<Vec<Envelope>>,
    fail_for: HashSet<String>,
}

impl RecordingTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing_for(addr: &str) -> Self {
        Self {
            sent: Mutex::new(Vec::new()),
            fail_for: HashSet::from([addr.to_string()]),
        }
    }

    pub fn sent_count(&self) -> usize {
        self.sent.lock().unwrap().len()
    }
}

#[async_trait]
impl MessageTransport for RecordingTransport {
    async fn send(&self, envelope: &Envelope) -> Result<DeliveryReceipt, TransportError> {
        if self.fail_for.contains(&envelope.to) {
            return Err(TransportError::Other(format!("mailbox {} unavailable", envelope.to)));
        }
        self.sent.lock().unwrap().push(envelope.clone());
        Ok(DeliveryReceipt {
            message_id: format!("stub-{}", Uuid::new_v4()),
            recipient: envelope.to.clone(),
        })
    }
}

/// Never completes.
pub(crate) struct HangingTransport;

#[async_trait]
impl MessageTransport for HangingTransport {
    async fn send(&self, _envelope: &Envelope) -> Result<DeliveryReceipt, TransportError> {
        std::future::pending().await
    }
}
