use crate::validation::ValidationError;
use axum::{Json, http::StatusCode};
use thiserror::Error;

const SNIPPET_LEN: usize = 100;

/// Failures surfaced by the REST client.
#[derive(Debug, Error)]
pub enum ClientError {
    #[error("authentication required")]
    Unauthorized,
    #[error("request to {url} failed with HTTP {status}")]
    Http { status: u16, url: String },
    #[error(
        "API returned a non-JSON response from {url}; check that API_BASE_URL is configured correctly. Response: {snippet}"
    )]
    MalformedResponse { url: String, snippet: String },
    #[error("API call to {url} failed: {message}")]
    Transport { url: String, message: String },
    #[error("request body could not be encoded: {0}")]
    Encode(#[from] serde_json::Error),
}

impl ClientError {
    pub fn malformed(url: impl Into<String>, body: &[u8]) -> Self {
        Self::MalformedResponse {
            url: url.into(),
            snippet: String::from_utf8_lossy(body).chars().take(SNIPPET_LEN).collect(),
        }
    }

    pub fn transport(url: impl Into<String>, err: &reqwest::Error) -> Self {
        Self::Transport {
            url: url.into(),
            message: err.to_string(),
        }
    }

    pub fn is_unauthorized(&self) -> bool {
        matches!(self, Self::Unauthorized)
    }

    /// User-facing text for a failed operation. Unauthorized has its own notice.
    pub fn notice(&self, operation: &str) -> Option<String> {
        match self {
            Self::Unauthorized => None,
            Self::Http { status, .. } => Some(format!("Could not {operation} (HTTP {status}).")),
            Self::MalformedResponse { url, .. } => Some(format!(
                "Could not {operation}: the API at {url} did not return JSON. Check API_BASE_URL."
            )),
            Self::Transport { url, .. } => {
                Some(format!("Could not {operation}: {url} is unreachable."))
            }
            Self::Encode(err) => Some(format!("Could not {operation}: {err}.")),
        }
    }
}

#[derive(Debug)]
pub struct AppError {
    pub status: StatusCode,
    pub message: String,
}

impl AppError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::new(StatusCode::UNAUTHORIZED, message)
    }

    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::new(StatusCode::SERVICE_UNAVAILABLE, message)
    }
}

impl From<ClientError> for AppError {
    fn from(err: ClientError) -> Self {
        let status = match err {
            ClientError::Unauthorized => StatusCode::UNAUTHORIZED,
            ClientError::Encode(_) => StatusCode::INTERNAL_SERVER_ERROR,
            _ => StatusCode::BAD_GATEWAY,
        };
        Self::new(status, err.to_string())
    }
}

impl From<ValidationError> for AppError {
    fn from(err: ValidationError) -> Self {
        Self::new(StatusCode::UNPROCESSABLE_ENTITY, err.to_string())
    }
}

impl axum::response::IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        let body = Json(serde_json::json!({ "error": self.message }));
        (self.status, body).into_response()
    }
}
