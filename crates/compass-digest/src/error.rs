use std::time::Duration;

use serde::Serialize;
use thiserror::Error;
use uuid::Uuid;

use compass_store::StoreError;

/// Failures of the message transport collaborator.
#[derive(Error, Debug)]
pub enum TransportError {
    #[error("Relay rejected message with status {status}: {body}")]
    Rejected { status: u16, body: String },

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Send timed out after {0:?}")]
    Timeout(Duration),

    #[error("Transport error: {0}")]
    Other(String),
}

/// Errors produced by a digest run.
#[derive(Error, Debug)]
pub enum DigestError {
    /// No relationship exists for the pair, or consent is withdrawn.
    #[error("No consent for user {user_id} to share with partner {partner_id}")]
    NoConsent { user_id: Uuid, partner_id: Uuid },

    /// The partner record is missing or has no delivery address.
    #[error("Partner {0} has no deliverable address")]
    PartnerUnresolvable(Uuid),

    /// The send failed after digest record `digest_id` was written; the
    /// failure is already on the audit trail.
    #[error("Delivery of digest {digest_id} failed: {source}")]
    Transport {
        digest_id: Uuid,
        #[source]
        source: TransportError,
    },

    /// The configured window reaches outside the representable time range.
    #[error("Summary window of {window_days} days is out of range")]
    WindowOutOfRange { window_days: i64 },

    #[error("Store error: {0}")]
    Store(#[from] StoreError),
}

/// Coarse classification used in sweep reports and HTTP responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    NoConsent,
    PartnerUnresolvable,
    Transport,
    Config,
    Store,
}

impl DigestError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::NoConsent { .. } => ErrorKind::NoConsent,
            Self::PartnerUnresolvable(_) => ErrorKind::PartnerUnresolvable,
            Self::Transport { .. } => ErrorKind::Transport,
            Self::WindowOutOfRange { .. } => ErrorKind::Config,
            Self::Store(_) => ErrorKind::Store,
        }
    }

    /// Digest record written before the failure, if any.
    pub fn digest_id(&self) -> Option<Uuid> {
        match self {
            Self::Transport { digest_id, .. } => Some(*digest_id),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, DigestError>;
