//! Pipeline settings, built once by the caller and shared by every run.

use std::time::Duration;

use compass_shared::constants::{
    DEFAULT_AUDIT_SOURCE_ADDR, DEFAULT_DIGEST_SUBJECT, DEFAULT_FROM_ADDRESS,
    DEFAULT_SEND_TIMEOUT_SECS, DEFAULT_SWEEP_CONCURRENCY, DEFAULT_WINDOW_DAYS,
};

#[derive(Debug, Clone)]
pub struct DigestConfig {
    /// Length of the rolling summary window.
    pub window: chrono::Duration,

    /// Maximum relationships processed at once during a sweep.
    pub concurrency: usize,

    /// Upper bound on a single transport call.
    pub send_timeout: Duration,

    /// Sender address placed on every envelope.
    pub from_address: String,

    pub subject: String,

    /// Source-address marker recorded on audit entries.
    pub audit_source_addr: String,
}

impl Default for DigestConfig {
    fn default() -> Self {
        Self {
            window: chrono::Duration::days(DEFAULT_WINDOW_DAYS),
            concurrency: DEFAULT_SWEEP_CONCURRENCY,
            send_timeout: Duration::from_secs(DEFAULT_SEND_TIMEOUT_SECS),
            from_address: DEFAULT_FROM_ADDRESS.to_string(),
            subject: DEFAULT_DIGEST_SUBJECT.to_string(),
            audit_source_addr: DEFAULT_AUDIT_SOURCE_ADDR.to_string(),
        }
    }
}
