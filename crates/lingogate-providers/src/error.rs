//! Error types for provider dispatch.

use thiserror::Error;

use crate::transport::TransportError;

/// Everything that can go wrong between "we have a request" and "we have text".
#[derive(Debug, Error)]
pub enum ProviderError {
    /// The provider needs a key and none was configured or supplied.
    #[error("API key not set for {0}")]
    MissingApiKey(String),

    #[error("unsupported provider: {0}")]
    UnsupportedProvider(String),

    /// A single non-retryable failure.
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// Every attempt failed with a transient error; `last` is the final one.
    #[error("gave up after {attempts} attempts: {last}")]
    RetriesExhausted {
        attempts: u32,
        #[source]
        last: TransportError,
    },

    /// 2xx response without text at the expected path.
    #[error("malformed response from {provider}: {detail}")]
    MalformedResponse { provider: String, detail: String },
}

impl ProviderError {
    /// The underlying transport failure, looking through retry exhaustion.
    pub fn transport_cause(&self) -> Option<&TransportError> {
        match self {
            ProviderError::Transport(e) => Some(e),
            ProviderError::RetriesExhausted { last, .. } => Some(last),
            _ => None,
        }
    }
}
