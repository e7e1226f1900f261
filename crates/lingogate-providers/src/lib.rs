//! LLM provider layer for Lingogate.
//!
//! # Architecture
//!
//! - [`registry`]: static specs for the five supported providers
//! - [`traits::ProviderStrategy`]: per-provider request building and response parsing
//! - [`strategies`]: one strategy per wire format, plus [`strategies::build_request`]
//! - [`transport::RetryingTransport`]: HTTP with bounded retry on network failures
//! - [`normalize`]: text extraction and `<think>` post-processing
//! - [`classify`]: maps failures to user-facing categories
//! - [`prompt`]: mode template rendering

pub mod classify;
pub mod error;
pub mod normalize;
pub mod prompt;
pub mod registry;
pub mod request;
pub mod strategies;
pub mod traits;
pub mod transport;

// Re-export main types for convenience
pub use classify::{classify, ClassifiedError, ErrorCategory};
pub use error::ProviderError;
pub use registry::{ProviderSpec, PROVIDERS};
pub use request::{ChatCall, ProviderRequest, ProviderResponse};
pub use strategies::build_request;
pub use traits::ProviderStrategy;
pub use transport::{
    HttpTransport, ReqwestTransport, RetryPolicy, RetryingTransport, Sleeper, TokioSleeper,
    TransportError,
};
