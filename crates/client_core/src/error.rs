use thiserror::Error;

#[derive(Debug, Error)]
pub enum PaymentsApiError {
    #[error("invalid payments service url: {0}")]
    InvalidUrl(#[from] url::ParseError),
    #[error("payments service request failed: {0}")]
    Transport(#[source] reqwest::Error),
    #[error("payments service answered {status} for {operation}")]
    Status {
        operation: &'static str,
        status: reqwest::StatusCode,
    },
    #[error("payments service returned an unreadable body: {0}")]
    Body(#[source] reqwest::Error),
}

impl PaymentsApiError {
    /// True when the service was reached and refused the call.
    pub fn is_rejection(&self) -> bool {
        matches!(self, Self::Status { .. })
    }
}

impl From<reqwest::Error> for PaymentsApiError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() || err.is_body() {
            Self::Body(err)
        } else {
            Self::Transport(err)
        }
    }
}
