use thiserror::Error;

/// Failure of a call to the accommodation backend or the verification authority.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ApiError {
    #[error("network error: {0}")]
    Network(String),

    #[error("request timed out")]
    Timeout,

    /// 401/403: the credential is no longer accepted.
    #[error("request rejected as unauthorized (status {status})")]
    AuthRejected { status: u16 },

    #[error("request rejected (status {status}): {message}")]
    Rejected { status: u16, message: String },

    #[error("unexpected response body: {0}")]
    Decode(String),
}

impl ApiError {
    /// Whether retrying the same call later may succeed.
    pub fn is_retryable(&self) -> bool {
        match self {
            ApiError::Network(_) | ApiError::Timeout => true,
            ApiError::Rejected { status, .. } => *status >= 500,
            ApiError::AuthRejected { .. } | ApiError::Decode(_) => false,
        }
    }

    pub fn is_auth_rejected(&self) -> bool {
        matches!(self, ApiError::AuthRejected { .. })
    }
}
