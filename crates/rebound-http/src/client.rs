//! HTTP client trait and the reqwest-backed implementation

use std::time::Duration;

use async_trait::async_trait;
use rebound_core::types::HttpConfig;
use tracing::debug;

use crate::error::HttpError;
use crate::request::{HttpRequest, HttpResponse, Method};

/// Minimal HTTP call surface
///
/// Implementations return every response the server produced, whatever its
/// status. Only transport failures are errors.
#[async_trait]
pub trait HttpClient: Send + Sync {
    /// Send a request and buffer the response
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, HttpError>;

    async fn get(&self, url: &str) -> Result<HttpResponse, HttpError> {
        self.send(HttpRequest::new(Method::Get, url)).await
    }

    async fn head(&self, url: &str) -> Result<HttpResponse, HttpError> {
        self.send(HttpRequest::new(Method::Head, url)).await
    }

    async fn post(&self, url: &str, body: Vec<u8>) -> Result<HttpResponse, HttpError> {
        self.send(HttpRequest::new(Method::Post, url).body(body)).await
    }

    async fn put(&self, url: &str, body: Vec<u8>) -> Result<HttpResponse, HttpError> {
        self.send(HttpRequest::new(Method::Put, url).body(body)).await
    }

    async fn patch(&self, url: &str, body: Vec<u8>) -> Result<HttpResponse, HttpError> {
        self.send(HttpRequest::new(Method::Patch, url).body(body)).await
    }

    async fn delete(&self, url: &str) -> Result<HttpResponse, HttpError> {
        self.send(HttpRequest::new(Method::Delete, url)).await
    }
}

/// [`HttpClient`] over `reqwest`
#[derive(Debug, Clone)]
pub struct ReqwestClient {
    client: reqwest::Client,
}

impl ReqwestClient {
    /// Build a client with the configured timeouts and user agent
    pub fn new(config: &HttpConfig) -> Result<Self, HttpError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .connect_timeout(Duration::from_secs(config.connect_timeout_secs))
            .user_agent(config.user_agent.clone())
            .build()
            .map_err(|e| HttpError::invalid_request(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self { client })
    }

    /// Wrap an existing `reqwest::Client`
    pub fn from_client(client: reqwest::Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl HttpClient for ReqwestClient {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, HttpError> {
        let HttpRequest {
            method,
            url,
            headers,
            body,
        } = request;

        debug!(method = %method, url = %url, "sending request");

        let mut builder = self.client.request(method.into(), url.as_str());
        for (name, value) in &headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        if let Some(body) = body {
            builder = builder.body(body);
        }

        let response = builder
            .send()
            .await
            .map_err(|e| HttpError::transport(url.clone(), e))?;

        let status = response.status().as_u16();
        let final_url = response.url().to_string();
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
        let body = response
            .bytes()
            .await
            .map_err(|e| HttpError::transport(url.clone(), e))?
            .to_vec();

        debug!(status, url = %final_url, bytes = body.len(), "received response");

        Ok(HttpResponse {
            status,
            url: final_url,
            headers,
            body,
        })
    }
}
