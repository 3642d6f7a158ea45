use serde::{Deserialize, Serialize};

/// Classification of a failed fetch, as published in `FetchState::Error`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// The provider has no data for the requested location or city.
    NotFound,
    /// Transport-level failure, including timeouts.
    Network,
    /// The request was rejected before reaching the provider.
    InvalidInput,
    Other,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::NotFound => "not_found",
            ErrorKind::Network => "network",
            ErrorKind::InvalidInput => "invalid_input",
            ErrorKind::Other => "other",
        }
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned by a [`WeatherClient`](crate::WeatherClient).
///
/// `Display` is the bare message so it can be surfaced to the user verbatim.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FetchError {
    #[error("{0}")]
    NotFound(String),
    #[error("{0}")]
    Network(String),
    #[error("{0}")]
    InvalidInput(String),
    #[error("{0}")]
    Other(String),
}

impl FetchError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            FetchError::NotFound(_) => ErrorKind::NotFound,
            FetchError::Network(_) => ErrorKind::Network,
            FetchError::InvalidInput(_) => ErrorKind::InvalidInput,
            FetchError::Other(_) => ErrorKind::Other,
        }
    }

    pub fn message(&self) -> &str {
        match self {
            FetchError::NotFound(msg)
            | FetchError::Network(msg)
            | FetchError::InvalidInput(msg)
            | FetchError::Other(msg) => msg,
        }
    }
}
