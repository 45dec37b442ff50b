use thiserror::Error;

/// Broad category of an [`ApiError`], for callers that render by class.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// The request never produced a response (connect, timeout, body read).
    Transport,
    /// The server answered with a non-2xx status.
    Response,
    /// The payload could not be decoded.
    Parse,
    /// The input was rejected before any request was sent.
    Validation,
}

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Network error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Unauthorized - token may be expired")]
    Unauthorized,

    #[error("Access denied: {0}")]
    AccessDenied(String),

    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("Rate limited - please wait before retrying")]
    RateLimited,

    #[error("Server error: {0}")]
    ServerError(String),

    #[error("Unexpected status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Failed to parse JSON response from {url}: {source}")]
    Parse {
        url: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Cached data has an unexpected shape: {0}")]
    Decode(#[source] serde_json::Error),

    #[error("Invalid request: {0}")]
    Validation(String),

    #[error("Not signed in")]
    Unauthenticated,

    #[error("Fetch task failed: {0}")]
    Task(String),
}

/// Maximum length for error response bodies in error messages
const MAX_ERROR_BODY_LENGTH: usize = 500;

impl ApiError {
    /// Truncate a response body to avoid logging excessive data
    fn truncate_body(body: &str) -> String {
        if body.len() <= MAX_ERROR_BODY_LENGTH {
            return body.to_string();
        }
        let mut end = MAX_ERROR_BODY_LENGTH;
        while !body.is_char_boundary(end) {
            end -= 1;
        }
        format!("{}... (truncated, {} total bytes)", &body[..end], body.len())
    }

    pub fn from_status(status: reqwest::StatusCode, body: &str) -> Self {
        let truncated = Self::truncate_body(body);
        match status.as_u16() {
            401 => ApiError::Unauthorized,
            403 => ApiError::AccessDenied(truncated),
            404 => ApiError::NotFound(truncated),
            429 => ApiError::RateLimited,
            500..=599 => ApiError::ServerError(truncated),
            code => ApiError::Status {
                status: code,
                body: truncated,
            },
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            ApiError::Transport(e) if e.is_decode() => ErrorKind::Parse,
            ApiError::Transport(_) | ApiError::Task(_) => ErrorKind::Transport,
            ApiError::Unauthorized
            | ApiError::AccessDenied(_)
            | ApiError::NotFound(_)
            | ApiError::RateLimited
            | ApiError::ServerError(_)
            | ApiError::Status { .. } => ErrorKind::Response,
            ApiError::Parse { .. } | ApiError::Decode(_) => ErrorKind::Parse,
            ApiError::Validation(_) | ApiError::Unauthenticated => ErrorKind::Validation,
        }
    }

    /// True when the server was never reached, which is when the offline
    /// store may stand in for the network.
    pub fn is_transport(&self) -> bool {
        matches!(self, ApiError::Transport(e) if !e.is_decode() && !e.is_status())
    }
}
