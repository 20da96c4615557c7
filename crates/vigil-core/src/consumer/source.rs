use crate::errors::VigilError;
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::future::Future;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FetchError {
    #[error("request failed: {message}")]
    Transport { message: String },

    #[error("backend returned {code}: {message}")]
    Status { code: u16, message: String },

    #[error("could not decode response: {message}")]
    Decode { message: String },

    #[error("request timed out")]
    Timeout,
}

impl VigilError for FetchError {
    fn error_code(&self) -> &'static str {
        match self {
            FetchError::Transport { .. } => "FETCH_TRANSPORT",
            FetchError::Status { .. } => "FETCH_STATUS",
            FetchError::Decode { .. } => "FETCH_DECODE",
            FetchError::Timeout => "FETCH_TIMEOUT",
        }
    }
}

/// Where a panel's data comes from. API semantics live entirely here.
pub trait DataSource: Send + Sync + 'static {
    type Payload: Serialize + DeserializeOwned + Clone + Send + Sync + 'static;

    /// Freshest data from the authoritative backend.
    fn fetch_live(&self) -> impl Future<Output = Result<Self::Payload, FetchError>> + Send;

    /// Backend-held, possibly older data; cheaper, used while hidden.
    fn fetch_cached(&self) -> impl Future<Output = Result<Self::Payload, FetchError>> + Send;
}
