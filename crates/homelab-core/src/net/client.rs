//! reqwest-backed implementation of [`Fetch`].

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use tracing::debug;

use super::{Fetch, Request, Response};
use crate::error::{Error, Result};

/// HTTP request timeout in seconds.
/// Homelab services sit on the LAN, so a short timeout flips to the cache fast.
const REQUEST_TIMEOUT_SECS: u64 = 10;

/// Plain network client.
/// Clone is cheap - reqwest::Client uses Arc internally for connection pooling.
#[derive(Clone)]
pub struct HttpClient {
    client: Client,
}

impl HttpClient {
    pub fn new() -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .user_agent(concat!("homelab-hub/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self { client })
    }
}

#[async_trait]
impl Fetch for HttpClient {
    async fn fetch(&self, request: &Request) -> Result<Response> {
        let response = self
            .client
            .request(request.method.clone(), request.url.clone())
            .send()
            .await
            .map_err(|e| {
                if e.is_connect() || e.is_timeout() {
                    Error::Unreachable(e.to_string())
                } else {
                    Error::Network(e)
                }
            })?;

        let status = response.status().as_u16();
        let headers = response
            .headers()
            .iter()
            .filter_map(|(name, value)| {
                value
                    .to_str()
                    .ok()
                    .map(|v| (name.as_str().to_string(), v.to_string()))
            })
            .collect();
        let body = response.bytes().await?.to_vec();

        debug!(url = %request.url, status, bytes = body.len(), "Network response");

        Ok(Response {
            status,
            headers,
            body,
            cached_at: None,
        })
    }
}
