use thiserror::Error;

#[derive(Error, Debug)]
pub enum BloomWatchError {
    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON parsing error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("No NDVI data available: {0}")]
    DataUnavailable(String),

    #[error("Upstream timed out: {0}")]
    UpstreamTimeout(String),

    #[error("Upstream failure: {0}")]
    UpstreamFailure(String),

    #[error("Malformed response: {0}")]
    MalformedResponse(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

impl BloomWatchError {
    /// Errors raised by an upstream collaborator rather than by the caller.
    /// These are downgraded to report notes instead of being surfaced.
    pub fn is_upstream(&self) -> bool {
        matches!(
            self,
            BloomWatchError::Http(_)
                | BloomWatchError::Json(_)
                | BloomWatchError::UpstreamTimeout(_)
                | BloomWatchError::UpstreamFailure(_)
                | BloomWatchError::MalformedResponse(_)
                | BloomWatchError::DataUnavailable(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, BloomWatchError>;
