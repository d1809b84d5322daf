//! Server configuration loaded from environment variables.
//!
//! All settings have sensible defaults so the server can start with zero
//! configuration for local development.  Without `MAIL_RELAY_URL` digests are
//! logged instead of sent.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use compass_digest::{DigestConfig, TransportConfig};
use compass_shared::constants::{
    DEFAULT_AUDIT_SOURCE_ADDR, DEFAULT_DIGEST_SUBJECT, DEFAULT_FROM_ADDRESS, DEFAULT_HTTP_PORT,
    DEFAULT_SEND_TIMEOUT_SECS, DEFAULT_SWEEP_CONCURRENCY, DEFAULT_SWEEP_INTERVAL_SECS,
    DEFAULT_WINDOW_DAYS, MAX_WINDOW_DAYS,
};

/// Server configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Socket address for the HTTP (axum) API server.
    /// Env: `HTTP_ADDR`
    /// Default: `0.0.0.0:8080`
    pub http_addr: SocketAddr,

    /// SQLite database file.
    /// Env: `DATABASE_PATH`
    /// Default: the platform data directory.
    pub database_path: Option<PathBuf>,

    /// Admin API bearer token. Required to trigger sweeps over HTTP.
    /// Env: `ADMIN_TOKEN`
    /// Default: empty (admin API disabled).
    pub admin_token: Option<String>,

    // -- Transport --

    /// Mail relay endpoint.
    /// Env: `MAIL_RELAY_URL`
    pub mail_relay_url: Option<String>,

    /// Env: `MAIL_RELAY_TOKEN`
    pub mail_relay_token: Option<String>,

    /// Env: `MAIL_FROM`
    pub mail_from: String,

    /// Env: `DIGEST_SUBJECT`
    pub digest_subject: String,

    // -- Pipeline --

    /// Env: `DIGEST_WINDOW_DAYS` (1 to 366)
    pub window_days: i64,

    /// Env: `DIGEST_CONCURRENCY` (at least 1)
    pub concurrency: usize,

    /// Env: `DIGEST_SEND_TIMEOUT_SECS`
    pub send_timeout: Duration,

    /// Period between scheduled sweeps; `None` disables the scheduler.
    /// Env: `SWEEP_INTERVAL_SECS` (`0` disables)
    pub sweep_interval: Option<Duration>,

    /// Env: `AUDIT_SOURCE_ADDR`
    pub audit_source_addr: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            http_addr: ([0, 0, 0, 0], DEFAULT_HTTP_PORT).into(),
            database_path: None,
            admin_token: None,
            mail_relay_url: None,
            mail_relay_token: None,
            mail_from: DEFAULT_FROM_ADDRESS.to_string(),
            digest_subject: DEFAULT_DIGEST_SUBJECT.to_string(),
            window_days: DEFAULT_WINDOW_DAYS,
            concurrency: DEFAULT_SWEEP_CONCURRENCY,
            send_timeout: Duration::from_secs(DEFAULT_SEND_TIMEOUT_SECS),
            sweep_interval: Some(Duration::from_secs(DEFAULT_SWEEP_INTERVAL_SECS)),
            audit_source_addr: DEFAULT_AUDIT_SOURCE_ADDR.to_string(),
        }
    }
}

impl ServerConfig {
    /// Load configuration from environment variables, falling back to defaults.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build a configuration from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(addr) = non_empty("HTTP_ADDR") {
            if let Some(parsed) = parse_or_warn::<SocketAddr>("HTTP_ADDR", &addr) {
                config.http_addr = parsed;
            }
        }

        if let Some(path) = non_empty("DATABASE_PATH") {
            config.database_path = Some(PathBuf::from(path));
        }

        config.admin_token = non_empty("ADMIN_TOKEN");

        // -- Transport --

        config.mail_relay_url = non_empty("MAIL_RELAY_URL");
        config.mail_relay_token = non_empty("MAIL_RELAY_TOKEN");

        if let Some(from) = non_empty("MAIL_FROM") {
            config.mail_from = from;
        }

        if let Some(subject) = non_empty("DIGEST_SUBJECT") {
            config.digest_subject = subject;
        }

        // -- Pipeline --

        if let Some(val) = non_empty("DIGEST_WINDOW_DAYS") {
            match parse_or_warn::<i64>("DIGEST_WINDOW_DAYS", &val) {
                Some(days) if (1..=MAX_WINDOW_DAYS).contains(&days) => config.window_days = days,
                Some(_) => tracing::warn!(
                    value = %val,
                    max = MAX_WINDOW_DAYS,
                    "DIGEST_WINDOW_DAYS out of range, using default"
                ),
                None => {}
            }
        }

        if let Some(val) = non_empty("DIGEST_CONCURRENCY") {
            if let Some(n) = parse_or_warn::<usize>("DIGEST_CONCURRENCY", &val) {
                config.concurrency = n.max(1);
            }
        }

        if let Some(val) = non_empty("DIGEST_SEND_TIMEOUT_SECS") {
            if let Some(secs) = parse_or_warn::<u64>("DIGEST_SEND_TIMEOUT_SECS", &val) {
                config.send_timeout = Duration::from_secs(secs.max(1));
            }
        }

        if let Some(val) = non_empty("SWEEP_INTERVAL_SECS") {
            if let Some(secs) = parse_or_warn::<u64>("SWEEP_INTERVAL_SECS", &val) {
                config.sweep_interval = (secs > 0).then(|| Duration::from_secs(secs));
            }
        }

        if let Some(addr) = non_empty("AUDIT_SOURCE_ADDR") {
            config.audit_source_addr = addr;
        }

        // RUST_LOG is handled directly by tracing-subscriber's EnvFilter,
        // so we do not store it here.

        config
    }

    pub fn digest_config(&self) -> DigestConfig {
        DigestConfig {
            window: chrono::Duration::days(self.window_days.clamp(1, MAX_WINDOW_DAYS)),
            concurrency: self.concurrency,
            send_timeout: self.send_timeout,
            from_address: self.mail_from.clone(),
            subject: self.digest_subject.clone(),
            audit_source_addr: self.audit_source_addr.clone(),
        }
    }

    /// Relay settings, or `None` when digests should only be logged.
    pub fn transport_config(&self) -> Option<TransportConfig> {
        self.mail_relay_url.as_ref().map(|endpoint| TransportConfig {
            endpoint: endpoint.clone(),
            api_token: self.mail_relay_token.clone(),
            request_timeout: self.send_timeout,
        })
    }
}

fn parse_or_warn<T: std::str::FromStr>(key: &str, value: &str) -> Option<T> {
    match value.trim().parse::<T>() {
        Ok(parsed) => Some(parsed),
        Err(_) => {
            tracing::warn!(key, value = %value, "Invalid value, using default");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn from_map(pairs: &[(&str, &str)]) -> ServerConfig {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        ServerConfig::from_lookup(|key| map.get(key).cloned())
    }

    #[test]
    fn test_default_config() {
        let config = ServerConfig::default();
        assert_eq!(config.http_addr, ([0, 0, 0, 0], 8080).into());
        assert!(config.admin_token.is_none());
        assert!(config.transport_config().is_none());
        assert_eq!(config.sweep_interval, Some(Duration::from_secs(604_800)));
    }

    #[test]
    fn test_overrides() {
        let config = from_map(&[
            ("HTTP_ADDR", "127.0.0.1:9000"),
            ("ADMIN_TOKEN", "tok"),
            ("MAIL_RELAY_URL", "https://relay.example.com/send"),
            ("MAIL_RELAY_TOKEN", "relay-secret"),
            ("MAIL_FROM", "weekly@example.com"),
            ("DIGEST_CONCURRENCY", "8"),
            ("DIGEST_SEND_TIMEOUT_SECS", "5"),
            ("SWEEP_INTERVAL_SECS", "0"),
            ("DIGEST_WINDOW_DAYS", "14"),
        ]);

        assert_eq!(config.http_addr, ([127, 0, 0, 1], 9000).into());
        assert_eq!(config.admin_token.as_deref(), Some("tok"));
        assert_eq!(config.concurrency, 8);
        assert!(config.sweep_interval.is_none());

        let transport = config.transport_config().unwrap();
        assert_eq!(transport.endpoint, "https://relay.example.com/send");
        assert_eq!(transport.api_token.as_deref(), Some("relay-secret"));
        assert_eq!(transport.request_timeout, Duration::from_secs(5));

        let digest = config.digest_config();
        assert_eq!(digest.from_address, "weekly@example.com");
        assert_eq!(digest.window.num_days(), 14);
    }

    #[test]
    fn test_invalid_values_keep_defaults() {
        let config = from_map(&[
            ("HTTP_ADDR", "not-an-addr"),
            ("DIGEST_CONCURRENCY", "0"),
            ("DIGEST_WINDOW_DAYS", "-3"),
            ("SWEEP_INTERVAL_SECS", "weekly"),
            ("ADMIN_TOKEN", "   "),
        ]);

        assert_eq!(config.http_addr, ([0, 0, 0, 0], 8080).into());
        assert_eq!(config.concurrency, 1);
        assert_eq!(config.window_days, 7);
        assert!(config.sweep_interval.is_some());
        assert!(config.admin_token.is_none());
    }

    #[test]
    fn test_window_days_upper_bound() {
        let config = from_map(&[("DIGEST_WINDOW_DAYS", "1000000000")]);
        assert_eq!(config.window_days, DEFAULT_WINDOW_DAYS);

        let config = from_map(&[("DIGEST_WINDOW_DAYS", "366")]);
        assert_eq!(config.window_days, 366);

        let forced = ServerConfig {
            window_days: i64::MAX,
            ..ServerConfig::default()
        };
        assert_eq!(forced.digest_config().window.num_days(), MAX_WINDOW_DAYS);
    }
}
