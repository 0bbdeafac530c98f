use http::StatusCode;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum BackendError {
    #[error("request to {endpoint} failed: {source}")]
    Transport {
        endpoint: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("{endpoint} returned HTTP {status}")]
    Status { endpoint: String, status: StatusCode },

    /// The backend answered with an `{"error": ...}` body, sometimes under HTTP 200.
    #[error("{endpoint}: {message}")]
    Server { endpoint: String, message: String },

    #[error("{endpoint} returned an unexpected payload: {reason}")]
    Decode { endpoint: String, reason: String },
}

impl BackendError {
    /// Connection problems and 5xx responses are worth another attempt.
    pub fn is_retryable(&self) -> bool {
        match self {
            BackendError::Transport { source, .. } => {
                source.is_timeout() || source.is_connect() || source.is_request()
            }
            BackendError::Status { status, .. } => status.is_server_error(),
            BackendError::Server { .. } | BackendError::Decode { .. } => false,
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, BackendError::Status { status, .. } if *status == StatusCode::NOT_FOUND)
    }

    pub fn endpoint(&self) -> &str {
        match self {
            BackendError::Transport { endpoint, .. }
            | BackendError::Status { endpoint, .. }
            | BackendError::Server { endpoint, .. }
            | BackendError::Decode { endpoint, .. } => endpoint,
        }
    }
}
