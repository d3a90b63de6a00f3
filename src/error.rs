use thiserror::Error;

/// Failure kinds for remote calls. The retry wrapper keys off `retryable()`:
/// transport, status, and decode failures all get the same retry treatment,
/// while shape failures are structural rejections that skip the item at once.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("request failed: {0}")]
    Transport(String),
    #[error("unexpected status {0}")]
    Status(u16),
    #[error("bad response body: {0}")]
    Decode(String),
    #[error("missing or malformed field: {0}")]
    Shape(String),
}

impl ApiError {
    pub fn retryable(&self) -> bool {
        !matches!(self, ApiError::Shape(_))
    }

    pub fn from_reqwest(e: reqwest::Error) -> Self {
        if e.is_decode() {
            ApiError::Decode(e.to_string())
        } else {
            ApiError::Transport(e.to_string())
        }
    }
}
