//! Lingogate core: configuration snapshot, config stores, and small helpers
//! shared by the provider layer, the gateway, and the CLI.

pub mod config;
pub mod utils;
