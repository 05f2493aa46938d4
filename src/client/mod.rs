//! SWAPI HTTP client
//!
//! One [`SwapiClient`] is built per process and cloned into every task. Clones
//! share the underlying reqwest connection pool and the in-flight request
//! limiter.

pub mod fetcher;
pub mod resolver;

use crate::{Error, Result};
use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Semaphore;

pub use resolver::display_name;

/// Configuration for the HTTP client.
#[derive(Debug, Clone)]
pub struct HttpConfig {
    /// Timeout for establishing a connection.
    pub connect_timeout: Duration,
    /// Timeout for the entire request, body included.
    pub request_timeout: Duration,
    /// Accept invalid or expired TLS certificates.
    pub accept_invalid_certs: bool,
    /// Upper bound on requests in flight at once, across all clones.
    pub max_connections: usize,
    pub user_agent: String,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            connect_timeout: Duration::from_secs(30),
            request_timeout: Duration::from_secs(300),
            // swapi.dev has shipped expired certificates; verification is opt-in.
            accept_invalid_certs: true,
            max_connections: 100,
            user_agent: concat!("swapi-sync/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

impl HttpConfig {
    /// Sets the request timeout.
    #[must_use]
    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    /// Sets the in-flight request limit.
    #[must_use]
    pub fn with_max_connections(mut self, max_connections: usize) -> Self {
        self.max_connections = max_connections;
        self
    }

    /// Turns TLS certificate verification on or off.
    #[must_use]
    pub fn with_accept_invalid_certs(mut self, accept: bool) -> Self {
        self.accept_invalid_certs = accept;
        self
    }
}

/// Status and body of a completed GET.
#[derive(Debug)]
pub struct Fetched {
    pub url: String,
    pub status: StatusCode,
    pub body: Vec<u8>,
}

impl Fetched {
    /// Decode the body as JSON, keeping the URL in the error.
    pub fn json<T: DeserializeOwned>(&self) -> Result<T> {
        serde_json::from_slice(&self.body).map_err(|source| Error::Decode {
            url: self.url.clone(),
            source,
        })
    }
}

/// Shared client for the SWAPI REST API.
#[derive(Debug, Clone)]
pub struct SwapiClient {
    http: Client,
    base_url: String,
    permits: Arc<Semaphore>,
}

impl SwapiClient {
    /// Build a client rooted at `base_url` (e.g. `https://swapi.dev/api/`).
    pub fn new(base_url: impl Into<String>, config: &HttpConfig) -> Result<Self> {
        if config.max_connections == 0 {
            return Err(Error::Config("max_connections must be at least 1".to_string()));
        }

        let http = Client::builder()
            .connect_timeout(config.connect_timeout)
            .timeout(config.request_timeout)
            .danger_accept_invalid_certs(config.accept_invalid_certs)
            .pool_max_idle_per_host(config.max_connections)
            .user_agent(config.user_agent.clone())
            .build()?;

        let mut base_url = base_url.into();
        if !base_url.ends_with('/') {
            base_url.push('/');
        }

        Ok(Self {
            http,
            base_url,
            permits: Arc::new(Semaphore::new(config.max_connections)),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Canonical URL of a person resource.
    pub fn person_url(&self, id: u32) -> String {
        format!("{}people/{}/", self.base_url, id)
    }

    /// GET a URL and read the whole body.
    ///
    /// Holds one limiter permit from send until the body is read. Any status is
    /// returned as-is; callers decide what a non-success status means.
    pub async fn get(&self, url: &str) -> Result<Fetched> {
        let _permit = self
            .permits
            .acquire()
            .await
            .map_err(|_| Error::Config("HTTP request limiter closed".to_string()))?;

        tracing::debug!("GET {}", url);
        let response = self.http.get(url).send().await?;
        let status = response.status();
        let body = response.bytes().await?.to_vec();

        Ok(Fetched {
            url: url.to_string(),
            status,
            body,
        })
    }
}
