use std::time::Duration;

use anyhow::Context;
use reqwest::header::{
    HeaderMap, HeaderName, HeaderValue, ACCEPT, ACCEPT_ENCODING, AUTHORIZATION, CONTENT_TYPE,
    USER_AGENT,
};
use reqwest::{Client, ClientBuilder};

use crate::error::Result;

/// Fingerprint of the first-party CLI client; the endpoint gates behaviour on it.
const CLIENT_HEADERS: &[(&str, &str)] = &[
    ("anthropic-beta", "claude-code-20250219,interleaved-thinking-2025-05-14"),
    ("anthropic-dangerous-direct-browser-access", "true"),
    ("anthropic-version", "2023-06-01"),
    ("x-app", "cli"),
    ("x-stainless-arch", "x64"),
    ("x-stainless-helper-method", "stream"),
    ("x-stainless-lang", "js"),
    ("x-stainless-os", "Windows"),
    ("x-stainless-package-version", "0.70.0"),
    ("x-stainless-retry-count", "0"),
    ("x-stainless-runtime", "node"),
    ("x-stainless-runtime-version", "v24.3.0"),
    ("x-stainless-timeout", "600"),
];

const CLIENT_USER_AGENT: &str = "claude-cli/2.0.50 (external, cli)";

/// Wrapper around the configured HTTP client.
#[derive(Debug, Clone)]
pub struct HttpSession {
    client: Client,
}

/// Minimal data required to build an HTTP session.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    pub timeout: Duration,
}

impl SessionConfig {
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }
}

impl HttpSession {
    /// Build the single client used for every request of this process.
    pub fn new(config: &SessionConfig) -> Result<Self> {
        let client = ClientBuilder::new()
            .timeout(config.timeout)
            .pool_idle_timeout(Duration::from_secs(30))
            .build()
            .context("building HTTP client")?;

        Ok(Self { client })
    }

    /// Returns reference to the inner `reqwest::Client`.
    pub fn client(&self) -> &Client {
        &self.client
    }
}

/// Full header set for one request; only the bearer token varies.
pub fn get_headers(api_key: &str) -> Result<HeaderMap> {
    let mut headers = HeaderMap::new();
    headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
    for (name, value) in CLIENT_HEADERS {
        headers.insert(
            HeaderName::from_static(*name),
            HeaderValue::from_static(*value),
        );
    }

    let mut bearer = HeaderValue::from_str(&format!("Bearer {api_key}"))
        .context("API key contains characters not allowed in a header")?;
    bearer.set_sensitive(true);
    headers.insert(AUTHORIZATION, bearer);

    headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
    headers.insert(USER_AGENT, HeaderValue::from_static(CLIENT_USER_AGENT));
    headers.insert(ACCEPT_ENCODING, HeaderValue::from_static("identity"));
    Ok(headers)
}
