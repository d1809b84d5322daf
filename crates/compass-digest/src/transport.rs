//! Outbound message transport.
//!
//! The pipeline only knows the [`MessageTransport`] trait.  Two
//! implementations ship with the crate:
//! - [`HttpRelayTransport`] posts the envelope as JSON to a mail-relay HTTP
//!   endpoint, authenticated with an optional bearer token;
//! - [`LogTransport`] is a dry run that logs the envelope and returns a
//!   synthetic receipt, used when no relay is configured.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use uuid::Uuid;

use crate::error::TransportError;

/// One outbound message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Envelope {
    pub from: String,
    pub to: String,
    pub subject: String,
    pub html: String,
}

/// Confirmation returned by the transport for an accepted message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeliveryReceipt {
    pub message_id: String,
    pub recipient: String,
}

#[async_trait]
pub trait MessageTransport: Send + Sync {
    async fn send(&self, envelope: &Envelope) -> Result<DeliveryReceipt, TransportError>;
}

// ---------------------------------------------------------------------------
// HTTP relay
// ---------------------------------------------------------------------------

/// Connection settings for [`HttpRelayTransport`].
#[derive(Debug, Clone)]
pub struct TransportConfig {
    /// Relay endpoint that accepts `POST` with a JSON envelope.
    pub endpoint: String,

    /// Bearer token sent in the `Authorization` header.
    pub api_token: Option<String>,

    /// Per-request timeout applied by the HTTP client.
    pub request_timeout: Duration,
}

#[derive(Debug, Default, Deserialize)]
struct RelayResponse {
    #[serde(default, alias = "id")]
    message_id: Option<String>,
}

pub struct HttpRelayTransport {
    client: reqwest::Client,
    config: TransportConfig,
}

impl HttpRelayTransport {
    pub fn new(config: TransportConfig) -> Result<Self, TransportError> {
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()?;
        Ok(Self { client, config })
    }
}

#[async_trait]
impl MessageTransport for HttpRelayTransport {
    async fn send(&self, envelope: &Envelope) -> Result<DeliveryReceipt, TransportError> {
        let mut request = self.client.post(&self.config.endpoint).json(envelope);
        if let Some(token) = &self.config.api_token {
            request = request.bearer_auth(token);
        }

        let response = request.send().await?;
        let status = response.status();

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(TransportError::Rejected {
                status: status.as_u16(),
                body,
            });
        }

        // Relays that answer with an empty or non-JSON body still accepted
        // the message; fall back to a locally generated id.
        let parsed: RelayResponse = response.json().await.unwrap_or_default();
        let message_id = parsed
            .message_id
            .unwrap_or_else(|| format!("relay-{}", Uuid::new_v4()));

        debug!(to = %envelope.to, message_id = %message_id, "relay accepted message");

        Ok(DeliveryReceipt {
            message_id,
            recipient: envelope.to.clone(),
        })
    }
}

// ---------------------------------------------------------------------------
// Dry run
// ---------------------------------------------------------------------------

#[derive(Debug, Default, Clone)]
pub struct LogTransport;

#[async_trait]
impl MessageTransport for LogTransport {
    async fn send(&self, envelope: &Envelope) -> Result<DeliveryReceipt, TransportError> {
        let message_id = format!("log-{}", Uuid::new_v4());
        info!(
            from = %envelope.from,
            to = %envelope.to,
            subject = %envelope.subject,
            bytes = envelope.html.len(),
            message_id = %message_id,
            "dry-run transport: message not sent"
        );
        Ok(DeliveryReceipt {
            message_id,
            recipient: envelope.to.clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    use super::*;

    fn envelope() -> Envelope {
        Envelope {
            from: "digest@hercompass.local".into(),
            to: "partner@example.com".into(),
            subject: "HerCompass Weekly Digest".into(),
            html: "<p>hi</p>".into(),
        }
    }

    /// Serve exactly one HTTP request with a canned response, returning the
    /// raw request text.
    async fn one_shot_server(response: String) -> (String, tokio::task::JoinHandle<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let handle = tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut buf = vec![0u8; 16 * 1024];
            let mut request = Vec::new();
            loop {
                let n = socket.read(&mut buf).await.unwrap();
                request.extend_from_slice(&buf[..n]);
                let text = String::from_utf8_lossy(&request);
                if let Some(head_end) = text.find("\r\n\r\n") {
                    let content_length = text[..head_end]
                        .lines()
                        .find_map(|l| {
                            let lower = l.to_ascii_lowercase();
                            lower
                                .strip_prefix("content-length:")
                                .map(|v| v.trim().parse::<usize>().unwrap())
                        })
                        .unwrap_or(0);
                    if request.len() >= head_end + 4 + content_length {
                        break;
                    }
                }
                if n == 0 {
                    break;
                }
            }
            socket.write_all(response.as_bytes()).await.unwrap();
            socket.shutdown().await.unwrap();
            String::from_utf8_lossy(&request).into_owned()
        });
        (format!("http://{addr}/send"), handle)
    }

    fn relay(endpoint: String) -> HttpRelayTransport {
        HttpRelayTransport::new(TransportConfig {
            endpoint,
            api_token: Some("secret".into()),
            request_timeout: Duration::from_secs(5),
        })
        .unwrap()
    }

    #[tokio::test]
    async fn relay_posts_envelope_with_bearer_token() {
        let body = r#"{"id":"msg-42"}"#;
        let response = format!(
            "HTTP/1.1 200 OK\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{}",
            body.len(),
            body
        );
        let (endpoint, server) = one_shot_server(response).await;

        let receipt = relay(endpoint).send(&envelope()).await.unwrap();
        assert_eq!(receipt.message_id, "msg-42");
        assert_eq!(receipt.recipient, "partner@example.com");

        let request = server.await.unwrap();
        assert!(request.starts_with("POST /send"));
        assert!(request.to_ascii_lowercase().contains("authorization: bearer secret"));
        assert!(request.contains(r#""to":"partner@example.com""#));
    }

    #[tokio::test]
    async fn relay_maps_error_status_to_rejected() {
        let (endpoint, server) = one_shot_server(
            "HTTP/1.1 503 Service Unavailable\r\ncontent-length: 4\r\nconnection: close\r\n\r\nbusy"
                .to_string(),
        )
        .await;

        let err = relay(endpoint).send(&envelope()).await.unwrap_err();
        match err {
            TransportError::Rejected { status, body } => {
                assert_eq!(status, 503);
                assert_eq!(body, "busy");
            }
            other => panic!("unexpected error: {other}"),
        }
        server.await.unwrap();
    }

    #[tokio::test]
    async fn log_transport_always_accepts() {
        let receipt = LogTransport.send(&envelope()).await.unwrap();
        assert!(receipt.message_id.starts_with("log-"));
    }
}
