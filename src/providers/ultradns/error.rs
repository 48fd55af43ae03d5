use crate::providers::ultradns::types::ApiErrorBody;
use reqwest::StatusCode;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum UltraDnsError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error (status {status}{}): {message}", .code.map(|c| format!(", code {c}")).unwrap_or_default())]
    Api {
        status: u16,
        code: Option<i64>,
        message: String,
    },

    #[error("Authentication failed: {0}")]
    Authentication(String),

    #[error("Invalid endpoint {0:?}")]
    InvalidEndpoint(String),
}

/// UltraDNS error code for a record or zone that does not exist.
pub const DATA_NOT_FOUND: i64 = 70002;

impl UltraDnsError {
    pub fn from_body(status: StatusCode, body: Option<ApiErrorBody>) -> Self {
        let detail = body.as_ref().and_then(ApiErrorBody::first);
        UltraDnsError::Api {
            status: status.as_u16(),
            code: detail.and_then(|d| d.error_code),
            message: detail
                .and_then(|d| d.message())
                .map(str::to_string)
                .unwrap_or_else(|| {
                    status
                        .canonical_reason()
                        .unwrap_or("Unknown error")
                        .to_string()
                }),
        }
    }

    pub fn status(&self) -> Option<u16> {
        match self {
            UltraDnsError::Api { status, .. } => Some(*status),
            UltraDnsError::Http(err) => err.status().map(|s| s.as_u16()),
            _ => None,
        }
    }

    pub fn is_not_found(&self) -> bool {
        match self {
            UltraDnsError::Api { status, code, .. } => {
                *status == StatusCode::NOT_FOUND.as_u16() || *code == Some(DATA_NOT_FOUND)
            }
            _ => false,
        }
    }
}
