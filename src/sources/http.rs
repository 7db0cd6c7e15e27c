//! Fetch with fallback
//!
//! Every request is tried against the proxy relay first (when one is
//! configured) and then against the primary API. There is no backoff and
//! no third attempt: the last error is returned and the caller maps it to
//! the question's fallback code.

use super::errors::FetchError;
use reqwest::{Client, Method};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::time::Duration;
use tracing::{debug, warn};

const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36";

/// Where one upstream API can be reached
#[derive(Debug, Clone)]
pub struct Endpoint {
    /// Short source name used in logs and in the proxy path
    pub name: &'static str,
    pub primary: String,
    pub proxy: Option<String>,
}

impl Endpoint {
    pub fn new(name: &'static str, primary: impl Into<String>, proxy: Option<String>) -> Self {
        Self {
            name,
            primary: primary.into().trim_end_matches('/').to_string(),
            proxy: proxy.map(|p| p.trim_end_matches('/').to_string()),
        }
    }

    /// Base URLs in the order they are tried
    fn attempts(&self) -> Vec<(&'static str, &str)> {
        let mut attempts = Vec::with_capacity(2);
        if let Some(proxy) = &self.proxy {
            attempts.push(("proxy", proxy.as_str()));
        }
        attempts.push(("primary", self.primary.as_str()));
        attempts
    }
}

/// Shared HTTP client with proxy-then-primary fallback
#[derive(Clone)]
pub struct FallbackClient {
    client: Client,
}

impl FallbackClient {
    pub fn new(timeout: Duration) -> anyhow::Result<Self> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(timeout)
            .build()?;

        Ok(Self { client })
    }

    /// GET `path` and decode the JSON body
    pub async fn get_json<T: DeserializeOwned>(
        &self,
        endpoint: &Endpoint,
        path: &str,
        query: &[(&str, String)],
        headers: &[(&'static str, String)],
    ) -> Result<T, FetchError> {
        self.send(endpoint, Method::GET, path, query, headers, None).await
    }

    /// POST a JSON body to `path` and decode the JSON response
    pub async fn post_json<B, T>(&self, endpoint: &Endpoint, path: &str, body: &B) -> Result<T, FetchError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let body = serde_json::to_value(body).map_err(|e| FetchError::Decode(e.to_string()))?;
        self.send(endpoint, Method::POST, path, &[], &[], Some(&body)).await
    }

    async fn send<T: DeserializeOwned>(
        &self,
        endpoint: &Endpoint,
        method: Method,
        path: &str,
        query: &[(&str, String)],
        headers: &[(&'static str, String)],
        body: Option<&serde_json::Value>,
    ) -> Result<T, FetchError> {
        let mut last_error = None;

        for (label, base) in endpoint.attempts() {
            let url = format!("{}{}", base, path);
            debug!("[{}] {} {} via {}", endpoint.name, method, path, label);

            match self.send_once(method.clone(), &url, query, headers, body).await {
                Ok(value) => return Ok(value),
                Err(e) => {
                    if e.is_rate_limited() {
                        warn!("[{}] {} endpoint rate limited", endpoint.name, label);
                    } else {
                        warn!("[{}] {} endpoint failed: {}", endpoint.name, label, e);
                    }
                    last_error = Some(e);
                }
            }
        }

        Err(last_error.unwrap_or_else(|| FetchError::Network("no endpoint configured".to_string())))
    }

    async fn send_once<T: DeserializeOwned>(
        &self,
        method: Method,
        url: &str,
        query: &[(&str, String)],
        headers: &[(&'static str, String)],
        body: Option<&serde_json::Value>,
    ) -> Result<T, FetchError> {
        let mut request = self.client.request(method, url);
        if !query.is_empty() {
            request = request.query(query);
        }
        for (name, value) in headers {
            request = request.header(*name, value);
        }
        if let Some(body) = body {
            request = request.json(body);
        }

        let response = request.send().await.map_err(|e| FetchError::from_reqwest(&e))?;
        let status = response.status();
        let bytes = response.bytes().await.map_err(|e| FetchError::from_reqwest(&e))?;

        if !status.is_success() {
            return Err(FetchError::from_response(
                status.as_u16(),
                &String::from_utf8_lossy(&bytes),
            ));
        }

        serde_json::from_slice::<T>(&bytes).map_err(|e| FetchError::Decode(e.to_string()))
    }
}
