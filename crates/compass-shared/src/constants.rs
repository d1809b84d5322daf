/// Application name, used in digest headings.
pub const APP_NAME: &str = "HerCompass";

/// Default digest subject line.
pub const DEFAULT_DIGEST_SUBJECT: &str = "HerCompass Weekly Digest";

/// Default sender address when none is configured.
pub const DEFAULT_FROM_ADDRESS: &str = "digest@hercompass.local";

/// Rolling summary window in days.
pub const DEFAULT_WINDOW_DAYS: i64 = 7;

/// Longest accepted summary window.
pub const MAX_WINDOW_DAYS: i64 = 366;

/// Number of recent notes kept in a summary.
pub const RECENT_NOTES_LIMIT: usize = 3;

/// Table name recorded as the audit target for digest deliveries.
pub const DIGEST_TARGET_TABLE: &str = "digest_logs";

/// Source-address marker written on audit entries produced by background jobs.
pub const DEFAULT_AUDIT_SOURCE_ADDR: &str = "0.0.0.0";

/// Upper bound on concurrent relationship runs in a sweep.
pub const DEFAULT_SWEEP_CONCURRENCY: usize = 4;

/// Transport call timeout in seconds.
pub const DEFAULT_SEND_TIMEOUT_SECS: u64 = 30;

/// Sweep period in seconds (one week).
pub const DEFAULT_SWEEP_INTERVAL_SECS: u64 = 7 * 24 * 60 * 60;

/// Default HTTP API port (server)
pub const DEFAULT_HTTP_PORT: u16 = 8080;
