use thiserror::Error;

/// Failure surfaced through [`FetchState::error`](super::FetchState).
///
/// Messages are captured as strings so the state stays `Clone`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FetchError {
    /// Transport failed or the request could not be built.
    #[error("Network error: {message}")]
    Network { message: String },

    /// The body arrived but did not decode as the expected JSON.
    #[error("Decode error: {message}")]
    Decode { message: String },

    /// Retry limit consumed without a successful attempt.
    #[error("Failed after {attempts} attempts")]
    Exhausted { attempts: u32 },
}

impl FetchError {
    /// True for the synthetic error that ends the retry cycle.
    pub fn is_terminal(&self) -> bool {
        matches!(self, FetchError::Exhausted { .. })
    }

    /// Stable kind string for logs.
    pub fn kind(&self) -> &'static str {
        match self {
            FetchError::Network { .. } => "network",
            FetchError::Decode { .. } => "decode",
            FetchError::Exhausted { .. } => "exhausted",
        }
    }
}

impl From<RequestError> for FetchError {
    fn from(err: RequestError) -> Self {
        FetchError::Network {
            message: err.to_string(),
        }
    }
}

impl From<serde_json::Error> for FetchError {
    fn from(err: serde_json::Error) -> Self {
        FetchError::Decode {
            message: err.to_string(),
        }
    }
}

/// Errors raised by a [`Requester`](super::Requester).
#[derive(Debug, Error)]
pub enum RequestError {
    /// The HTTP client could not be constructed.
    #[error("Failed to build HTTP client: {0}")]
    Client(#[source] reqwest::Error),

    /// Sending the request or reading the body failed.
    #[error("Request to '{url}' failed: {source}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    /// Request rejected before it reached the transport.
    #[error("Invalid request: {0}")]
    Invalid(String),
}
