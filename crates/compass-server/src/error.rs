use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;
use thiserror::Error;

use compass_digest::{DigestError, ErrorKind};

#[derive(Debug, Error)]
pub enum ServerError {
    #[error(transparent)]
    Digest(#[from] DigestError),

    #[error("Forbidden: {0}")]
    Forbidden(String),
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let (status, body) = match &self {
            ServerError::Digest(e) => {
                let status = match e.kind() {
                    ErrorKind::NoConsent => StatusCode::FORBIDDEN,
                    ErrorKind::PartnerUnresolvable => StatusCode::UNPROCESSABLE_ENTITY,
                    ErrorKind::Transport => StatusCode::BAD_GATEWAY,
                    ErrorKind::Config | ErrorKind::Store => StatusCode::INTERNAL_SERVER_ERROR,
                };
                // Store details stay in the logs.
                let message = if e.kind() == ErrorKind::Store {
                    tracing::error!(error = %e, "store failure while serving request");
                    "Internal server error".to_string()
                } else {
                    e.to_string()
                };
                (
                    status,
                    json!({
                        "error": message,
                        "kind": e.kind(),
                        "digest_id": e.digest_id(),
                    }),
                )
            }
            ServerError::Forbidden(_) => (StatusCode::FORBIDDEN, json!({ "error": self.to_string() })),
        };

        (status, axum::Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use uuid::Uuid;

    use super::*;

    #[test]
    fn status_codes_follow_error_kind() {
        let cases = [
            (
                DigestError::NoConsent {
                    user_id: Uuid::nil(),
                    partner_id: Uuid::nil(),
                },
                StatusCode::FORBIDDEN,
            ),
            (DigestError::PartnerUnresolvable(Uuid::nil()), StatusCode::UNPROCESSABLE_ENTITY),
            (
                DigestError::WindowOutOfRange { window_days: 1_000_000_000 },
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];
        for (err, status) in cases {
            assert_eq!(ServerError::from(err).into_response().status(), status);
        }
    }
}
