//! Provider-neutral request/response values passed between the builder,
//! the transport, and the normalizer.

use std::collections::BTreeMap;

use reqwest::Method;
use serde_json::Value;

/// Everything a strategy needs to build one chat/generate request.
#[derive(Clone, Debug)]
pub struct ChatCall<'a> {
    /// Configured endpoint override; `None` uses the registry default.
    pub endpoint: Option<&'a str>,
    pub model: &'a str,
    /// Text to translate (the user turn).
    pub text: &'a str,
    /// Rendered mode template (the system turn).
    pub system_prompt: &'a str,
    pub api_key: Option<&'a str>,
    pub thinking_enabled: bool,
}

/// A fully built HTTP request, consumed once by the transport.
#[derive(Clone, Debug, PartialEq)]
pub struct ProviderRequest {
    pub method: Method,
    pub url: String,
    pub headers: BTreeMap<String, String>,
    pub query: BTreeMap<String, String>,
    pub body: Option<Value>,
}

impl ProviderRequest {
    fn new(method: Method, url: impl Into<String>) -> Self {
        Self {
            method,
            url: url.into(),
            headers: BTreeMap::new(),
            query: BTreeMap::new(),
            body: None,
        }
    }

    pub fn get(url: impl Into<String>) -> Self {
        Self::new(Method::GET, url)
    }

    pub fn post(url: impl Into<String>) -> Self {
        Self::new(Method::POST, url)
    }

    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    pub fn query(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.insert(name.into(), value.into());
        self
    }

    /// Attach a JSON body and the matching content type.
    pub fn json(mut self, body: Value) -> Self {
        self.body = Some(body);
        self.header("Content-Type", "application/json")
    }

    /// The `Authorization` header, if any.
    pub fn authorization(&self) -> Option<&str> {
        self.headers.get("Authorization").map(String::as_str)
    }
}

/// A successful (2xx) provider reply, already decoded as JSON.
#[derive(Clone, Debug, PartialEq)]
pub struct ProviderResponse {
    pub status: u16,
    pub body: Value,
}

impl ProviderResponse {
    pub fn ok(body: Value) -> Self {
        Self { status: 200, body }
    }
}
