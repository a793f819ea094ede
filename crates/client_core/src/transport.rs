use anyhow::Context;
use async_trait::async_trait;
use reqwest::{
    header::{HeaderMap, HeaderValue, ACCEPT, CONTENT_TYPE},
    Client, Method,
};
use serde_json::Value;
use tracing::{debug, warn};

use crate::{config::ClientConfig, error::ClientError};

/// Request/response seam between the controllers and the backend API.
#[async_trait]
pub trait RemoteTransport: Send + Sync {
    async fn request(
        &self,
        method: Method,
        path: &str,
        body: Option<Value>,
    ) -> Result<Value, ClientError>;
}

/// JSON-over-HTTP client for the opportunity API. Holds no state between
/// calls apart from the cookie jar.
pub struct RemoteClient {
    http: Client,
    config: ClientConfig,
}

impl RemoteClient {
    pub fn new(config: ClientConfig) -> anyhow::Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        let http = Client::builder()
            .default_headers(headers)
            .cookie_store(true)
            .build()
            .context("failed to build http client")?;

        Ok(Self { http, config })
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }
}

#[async_trait]
impl RemoteTransport for RemoteClient {
    async fn request(
        &self,
        method: Method,
        path: &str,
        body: Option<Value>,
    ) -> Result<Value, ClientError> {
        let url = self.config.endpoint(path);
        debug!(%method, %url, "api request");

        let mut builder = self.http.request(method.clone(), url.as_str());
        if let Some(body) = &body {
            builder = builder.json(body);
        }

        let response = builder.send().await.map_err(|source| {
            warn!(%method, %url, error = %source, "api unreachable");
            ClientError::Connectivity {
                base_url: self.config.base_url().to_string(),
                source,
            }
        })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!(%method, %url, status = status.as_u16(), body = %body, "api request failed");
            return Err(ClientError::Http {
                status: status.as_u16(),
                body,
            });
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|err| ClientError::Decode(format!("failed to read response body: {err}")))?;
        if bytes.iter().all(u8::is_ascii_whitespace) {
            return Ok(Value::Null);
        }
        serde_json::from_slice(&bytes).map_err(|err| ClientError::Decode(err.to_string()))
    }
}

#[cfg(test)]
#[path = "tests/transport_tests.rs"]
mod tests;
