//! Network I/O behind the middleware chain.
//!
//! # Design
//! The client only needs `send(request) -> response`. [`ReqwestTransport`]
//! wraps one long-lived `reqwest::Client` whose connection pool is shared by
//! every clone and by every [`ApiClient`](crate::ApiClient) it is handed to.
//! [`DisposableTransport`] builds a pool per call and drops it when the call
//! returns; it exists as a simpler fallback and costs a fresh connection on
//! every request.
//!
//! Non-2xx statuses are returned as responses. Only I/O failures become
//! [`TransportError`].

use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

use crate::config::TransportConfig;
use crate::error::TransportError;
use crate::http::{HttpMethod, HttpRequest, HttpResponse};

/// A boxed, sendable future.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

pub trait Transport: Send + Sync + 'static {
    fn send(&self, request: HttpRequest) -> BoxFuture<'_, Result<HttpResponse, TransportError>>;
}

/// Pooled transport backed by a shared `reqwest::Client`.
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: reqwest::Client,
}

impl ReqwestTransport {
    pub fn new(config: &TransportConfig) -> Result<Self, TransportError> {
        let client = build_client(config)?;
        Ok(Self { client })
    }

    /// Wrap an existing client, sharing its pool.
    pub fn from_client(client: reqwest::Client) -> Self {
        Self { client }
    }
}

impl Transport for ReqwestTransport {
    fn send(&self, request: HttpRequest) -> BoxFuture<'_, Result<HttpResponse, TransportError>> {
        Box::pin(execute(&self.client, request))
    }
}

/// Transport that allocates a connection pool for each call.
#[derive(Debug, Clone, Default)]
pub struct DisposableTransport {
    config: TransportConfig,
}

impl DisposableTransport {
    pub fn new(config: TransportConfig) -> Self {
        Self { config }
    }
}

impl Transport for DisposableTransport {
    fn send(&self, request: HttpRequest) -> BoxFuture<'_, Result<HttpResponse, TransportError>> {
        Box::pin(async move {
            // Dropped on every exit path, including errors and cancellation.
            let client = build_client(&self.config)?;
            execute(&client, request).await
        })
    }
}

fn build_client(config: &TransportConfig) -> Result<reqwest::Client, TransportError> {
    let mut builder = reqwest::Client::builder()
        .pool_max_idle_per_host(config.pool_max_idle_per_host)
        .pool_idle_timeout(config.pool_idle_timeout_ms.map(Duration::from_millis));
    if let Some(ms) = config.connect_timeout_ms {
        builder = builder.connect_timeout(Duration::from_millis(ms));
    }
    builder
        .build()
        .map_err(|e| TransportError::Request(format!("failed to build HTTP client: {e}")))
}

async fn execute(
    client: &reqwest::Client,
    request: HttpRequest,
) -> Result<HttpResponse, TransportError> {
    let method = match request.method {
        HttpMethod::Get => reqwest::Method::GET,
        HttpMethod::Post => reqwest::Method::POST,
        HttpMethod::Put => reqwest::Method::PUT,
        HttpMethod::Delete => reqwest::Method::DELETE,
    };

    let mut builder = client.request(method, &request.url);
    for (name, value) in &request.headers {
        builder = builder.header(name.as_str(), value.as_str());
    }
    if let Some(body) = request.body {
        builder = builder.body(body);
    }

    let response = builder.send().await?;
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
    let body = response
        .text()
        .await
        .map_err(|e| TransportError::Decode(e.to_string()))?;

    Ok(HttpResponse {
        status,
        headers,
        body,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builds_with_default_pool_settings() {
        assert!(ReqwestTransport::new(&TransportConfig::default()).is_ok());
    }

    /// A loopback URL with nothing listening.
    fn refused_url() -> String {
        // Bind then drop to obtain a free port.
        let port = {
            let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
            listener.local_addr().unwrap().port()
        };
        format!("http://127.0.0.1:{port}/users")
    }

    fn assert_refused(err: &TransportError) {
        assert!(
            matches!(err, TransportError::Connect(_) | TransportError::Request(_)),
            "{err:?}"
        );
    }

    #[tokio::test]
    async fn connection_refused_is_a_transport_error() {
        let transport = DisposableTransport::default();
        let request = HttpRequest::new(HttpMethod::Get, refused_url());
        assert_refused(&transport.send(request).await.unwrap_err());
    }

    #[tokio::test]
    async fn disposable_transport_honours_its_config() {
        let transport = DisposableTransport::new(TransportConfig {
            connect_timeout_ms: Some(500),
            pool_idle_timeout_ms: None,
            pool_max_idle_per_host: 0,
        });
        let request = HttpRequest::new(HttpMethod::Get, refused_url());
        assert_refused(&transport.send(request).await.unwrap_err());
    }

    #[tokio::test]
    async fn wrapped_client_sends_requests() {
        let transport = ReqwestTransport::from_client(reqwest::Client::new());
        let request = HttpRequest::new(HttpMethod::Get, refused_url());
        assert_refused(&transport.send(request).await.unwrap_err());
    }
}
