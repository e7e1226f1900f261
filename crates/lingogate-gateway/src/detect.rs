//! Source-language detection.
//!
//! Detection is best-effort: the orchestrator turns any [`DetectError`]
//! into the `"unknown"` sentinel and carries on.

use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum DetectError {
    #[error("no text to detect")]
    Empty,

    #[error("language could not be identified")]
    Unidentified,
}

/// Identifies the language of a piece of text.
pub trait LanguageDetector: Send + Sync {
    /// Language code for `text`.
    fn detect(&self, text: &str) -> Result<String, DetectError>;
}

/// Trigram-based detector backed by `whatlang`. Returns ISO 639-3 codes.
#[derive(Debug, Default, Clone, Copy)]
pub struct WhatlangDetector;

impl LanguageDetector for WhatlangDetector {
    fn detect(&self, text: &str) -> Result<String, DetectError> {
        let text = text.trim();
        if text.is_empty() {
            return Err(DetectError::Empty);
        }
        whatlang::detect(text)
            .map(|info| info.lang().code().to_string())
            .ok_or(DetectError::Unidentified)
    }
}
