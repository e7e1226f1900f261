//! Error classifier: maps a [`ProviderError`] to a user-facing category
//! and message. The translate endpoint embeds the message in its normal
//! `{output}` envelope, so every message reads as a sentence for the user.

use lingogate_core::utils::truncate_string;
use serde::{Deserialize, Serialize};

use crate::error::ProviderError;
use crate::registry;
use crate::transport::TransportError;

/// Longest provider body excerpt shown to the user.
pub const BODY_EXCERPT_CHARS: usize = 500;

/// User-facing failure category.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCategory {
    MissingApiKey,
    InvalidProvider,
    ConnectionError,
    TimeoutError,
    ProviderError,
    MalformedResponse,
    UnknownError,
}

impl ErrorCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCategory::MissingApiKey => "missing_api_key",
            ErrorCategory::InvalidProvider => "invalid_provider",
            ErrorCategory::ConnectionError => "connection_error",
            ErrorCategory::TimeoutError => "timeout_error",
            ErrorCategory::ProviderError => "provider_error",
            ErrorCategory::MalformedResponse => "malformed_response",
            ErrorCategory::UnknownError => "unknown_error",
        }
    }
}

impl std::fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A categorized failure, ready to show.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassifiedError {
    pub category: ErrorCategory,
    pub message: String,
}

impl ClassifiedError {
    fn new(category: ErrorCategory, message: impl Into<String>) -> Self {
        Self {
            category,
            message: message.into(),
        }
    }
}

/// Classify `error` raised while talking to `provider_id`.
///
/// Retry exhaustion is looked through: the category comes from the last
/// transport failure, not from the wrapper.
pub fn classify(provider_id: &str, error: &ProviderError) -> ClassifiedError {
    let display = registry::display_name(provider_id);

    match error {
        ProviderError::MissingApiKey(id) => ClassifiedError::new(
            ErrorCategory::MissingApiKey,
            format!("Error: API key not set for {id}"),
        ),
        ProviderError::UnsupportedProvider(id) => ClassifiedError::new(
            ErrorCategory::InvalidProvider,
            format!("Error: Unsupported provider '{id}'"),
        ),
        ProviderError::MalformedResponse { .. } => ClassifiedError::new(
            ErrorCategory::MalformedResponse,
            "Error: Malformed provider response.",
        ),
        ProviderError::Transport(cause) | ProviderError::RetriesExhausted { last: cause, .. } => {
            classify_transport(&display, cause)
        }
    }
}

fn classify_transport(display: &str, cause: &TransportError) -> ClassifiedError {
    match cause {
        TransportError::Connect(_) => ClassifiedError::new(
            ErrorCategory::ConnectionError,
            format!(
                "Connection to {display} failed. Please ensure the local server is running. \
                 For Ollama, try quitting the app from the system tray and restarting it."
            ),
        ),
        TransportError::Timeout(_) => ClassifiedError::new(
            ErrorCategory::TimeoutError,
            format!(
                "Connection to {display} timed out. The model might be loading, which can be \
                 slow on the first request. Please wait a moment and try again."
            ),
        ),
        TransportError::Network(_) => ClassifiedError::new(
            ErrorCategory::ConnectionError,
            format!("Error connecting to {display}. The provider might be offline or busy."),
        ),
        TransportError::Status { status, body } => ClassifiedError::new(
            ErrorCategory::ProviderError,
            format!(
                "Error from {display} (Status {status}): {}",
                truncate_string(body.trim(), BODY_EXCERPT_CHARS)
            ),
        ),
        TransportError::Decode(_) => ClassifiedError::new(
            ErrorCategory::MalformedResponse,
            "Error: Malformed provider response.",
        ),
    }
}
