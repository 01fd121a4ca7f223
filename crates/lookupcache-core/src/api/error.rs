use thiserror::Error;

/// Failure of a single remote lookup call.
///
/// The `Display` output of the status-derived variants is the backend's own
/// message, so it can be surfaced to the user verbatim.
#[derive(Error, Debug)]
pub enum ApiError {
    #[error("{0}")]
    AccessDenied(String),

    #[error("{0}")]
    Unauthorized(String),

    #[error("{0}")]
    NotFound(String),

    /// Any other 4xx; usually a validation message from the backend
    #[error("{0}")]
    Rejected(String),

    #[error("Rate limited - please wait before retrying")]
    RateLimited,

    #[error("{0}")]
    ServerError(String),

    #[error("Request timed out")]
    Timeout,

    #[error("Network error: {0}")]
    Network(#[source] reqwest::Error),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Failed to decode response: {0}")]
    Decode(String),

    #[error("{0}")]
    Other(String),
}

/// Maximum length for error response bodies in error messages
const MAX_ERROR_BODY_LENGTH: usize = 500;

/// Body fields the backend uses for error text, in order of preference.
const MESSAGE_FIELDS: [&str; 3] = ["error", "message", "msg"];

/// Phrases that mean the bearer token is no longer accepted.
const EXPIRED_TOKEN_MARKERS: [&str; 6] = [
    "jwt exp",
    "token expired",
    "token is not valid",
    "not valid",
    "unauthorized",
    "invalid token",
];

impl ApiError {
    /// Truncate a response body to avoid logging excessive data
    fn truncate_body(body: &str) -> String {
        if body.len() <= MAX_ERROR_BODY_LENGTH {
            body.to_string()
        } else {
            let mut end = MAX_ERROR_BODY_LENGTH;
            while !body.is_char_boundary(end) {
                end -= 1;
            }
            format!("{}... (truncated, {} total bytes)", &body[..end], body.len())
        }
    }

    /// Pull the human-readable message out of an error response body.
    ///
    /// Prefers a JSON `error`/`message`/`msg` string field, then the raw body,
    /// then the canonical reason phrase of the status.
    fn extract_message(status: reqwest::StatusCode, body: &str) -> String {
        if let Ok(serde_json::Value::Object(map)) = serde_json::from_str::<serde_json::Value>(body) {
            for field in MESSAGE_FIELDS {
                if let Some(serde_json::Value::String(msg)) = map.get(field) {
                    if !msg.is_empty() {
                        return msg.clone();
                    }
                }
            }
        }

        let trimmed = body.trim();
        if !trimmed.is_empty() {
            return Self::truncate_body(trimmed);
        }

        status
            .canonical_reason()
            .map(str::to_string)
            .unwrap_or_else(|| format!("Request failed with status code {}", status.as_u16()))
    }

    pub fn from_status(status: reqwest::StatusCode, body: &str) -> Self {
        let message = Self::extract_message(status, body);
        match status.as_u16() {
            401 => ApiError::Unauthorized(message),
            403 => ApiError::AccessDenied(message),
            404 => ApiError::NotFound(message),
            429 => ApiError::RateLimited,
            400..=499 => ApiError::Rejected(message),
            500..=599 => ApiError::ServerError(message),
            _ => ApiError::InvalidResponse(format!("Status {}: {}", status, message)),
        }
    }

    /// Classify a transport-level failure from reqwest.
    pub fn from_transport(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            ApiError::Timeout
        } else if err.is_decode() {
            ApiError::Decode(err.to_string())
        } else {
            ApiError::Network(err)
        }
    }

    /// Whether this failure means the session token was rejected.
    pub fn is_session_expired(&self) -> bool {
        if matches!(self, ApiError::Unauthorized(_)) {
            return true;
        }
        let message = self.to_string().to_lowercase();
        EXPIRED_TOKEN_MARKERS
            .iter()
            .any(|marker| message.contains(marker))
    }
}
