//! Lingogate gateway: translation orchestrator and HTTP API.
//!
//! This crate contains:
//! - **orchestrator**: the `translate` / `list_models` operations and config updates
//! - **detect**: source-language detection seam
//! - **server**: axum router exposing the gateway over HTTP

pub mod detect;
pub mod orchestrator;
pub mod server;

pub use detect::{DetectError, LanguageDetector, WhatlangDetector};
pub use orchestrator::{
    Gateway, GatewayError, ModeUpdate, ModelsError, PromptOverride, TranslateRequest,
    TranslationOutcome, UpdateError,
};
pub use server::{router, AppState};
