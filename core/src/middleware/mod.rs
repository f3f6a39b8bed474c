//! Request/response interceptors composed in front of the transport.
//!
//! # Design
//! A chain is an ordered slice of `Arc<dyn Middleware>`; index 0 is the
//! outermost layer. Each middleware receives a [`Next`] borrowing the rest of
//! the chain and the transport, and calls [`Next::run`] at most once to pass
//! the request inward. The response travels back out in reverse order.
//!
//! Middleware instances carry no per-environment state, so a client builds
//! them once and reuses them across environment switches.

pub mod auth;
pub mod logging;
pub mod selector;

use std::sync::Arc;

use crate::error::ApiError;
use crate::http::{HttpRequest, HttpResponse};
use crate::transport::{BoxFuture, Transport};

pub use auth::AuthMiddleware;
pub use logging::LoggingMiddleware;
pub use selector::{build_chain, select_types, MiddlewareType};

/// An interceptor in the call path between caller and transport.
///
/// Implementations must not swallow errors returned by `next`.
pub trait Middleware: Send + Sync + 'static {
    /// Stable name used in logs.
    fn name(&self) -> &'static str;

    fn intercept<'a>(
        &'a self,
        request: HttpRequest,
        operation_id: &'a str,
        next: Next<'a>,
    ) -> BoxFuture<'a, Result<HttpResponse, ApiError>>;
}

/// The remainder of a middleware chain, ending in the transport.
pub struct Next<'a> {
    chain: &'a [Arc<dyn Middleware>],
    transport: &'a dyn Transport,
}

impl<'a> Next<'a> {
    pub fn new(chain: &'a [Arc<dyn Middleware>], transport: &'a dyn Transport) -> Self {
        Self { chain, transport }
    }

    /// Invoke the next middleware, or the transport once the chain is spent.
    ///
    /// Consumes `self` so the rest of the chain runs at most once.
    pub async fn run(
        self,
        request: HttpRequest,
        operation_id: &'a str,
    ) -> Result<HttpResponse, ApiError> {
        match self.chain.split_first() {
            Some((head, rest)) => {
                head.intercept(request, operation_id, Next::new(rest, self.transport))
                    .await
            }
            None => Ok(self.transport.send(request).await?),
        }
    }
}

#[cfg(test)]
pub(crate) mod testing {
    //! Recording transport and marker middleware shared by unit tests.

    use parking_lot::Mutex;

    use super::*;
    use crate::error::TransportError;

    /// Returns a canned response and records every request it receives.
    #[derive(Default)]
    pub struct RecordingTransport {
        pub requests: Mutex<Vec<HttpRequest>>,
        response: Mutex<Option<HttpResponse>>,
    }

    impl RecordingTransport {
        pub fn responding(response: HttpResponse) -> Self {
            Self {
                requests: Mutex::new(Vec::new()),
                response: Mutex::new(Some(response)),
            }
        }

        pub fn last_request(&self) -> Option<HttpRequest> {
            self.requests.lock().last().cloned()
        }
    }

    impl Transport for RecordingTransport {
        fn send(
            &self,
            request: HttpRequest,
        ) -> BoxFuture<'_, Result<HttpResponse, TransportError>> {
            self.requests.lock().push(request);
            let response = self
                .response
                .lock()
                .clone()
                .unwrap_or_else(|| HttpResponse::new(200, "{}"));
            Box::pin(async move { Ok(response) })
        }
    }

    /// Appends its name to the `x-trace` request header and the response body.
    pub struct Marker(pub &'static str);

    impl Middleware for Marker {
        fn name(&self) -> &'static str {
            self.0
        }

        fn intercept<'a>(
            &'a self,
            mut request: HttpRequest,
            operation_id: &'a str,
            next: Next<'a>,
        ) -> BoxFuture<'a, Result<HttpResponse, ApiError>> {
            Box::pin(async move {
                let trace = match request.header("x-trace") {
                    Some(existing) => format!("{existing},{}", self.0),
                    None => self.0.to_string(),
                };
                request.set_header("x-trace", trace);
                let mut response = next.run(request, operation_id).await?;
                response.body.push_str(self.0);
                Ok(response)
            })
        }
    }
}
