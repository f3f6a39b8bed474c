//! Request/response logging through `tracing`.

use std::time::Instant;

use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::error::ApiError;
use crate::http::{HttpRequest, HttpResponse};
use crate::middleware::{Middleware, Next};
use crate::transport::BoxFuture;

/// Logs the request line, response status and latency of every call.
///
/// Header names and body sizes go out at `debug`. Header values are never
/// logged, so credentials added by inner layers stay out of the logs. The
/// request and response pass through unchanged.
#[derive(Debug, Clone)]
pub struct LoggingMiddleware {
    app_name: String,
    prefix: String,
}

impl LoggingMiddleware {
    pub fn new(app_name: impl Into<String>, prefix: impl Into<String>) -> Self {
        Self {
            app_name: app_name.into(),
            prefix: prefix.into(),
        }
    }

    pub fn app_name(&self) -> &str {
        &self.app_name
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }
}

impl Middleware for LoggingMiddleware {
    fn name(&self) -> &'static str {
        "logging"
    }

    fn intercept<'a>(
        &'a self,
        request: HttpRequest,
        operation_id: &'a str,
        next: Next<'a>,
    ) -> BoxFuture<'a, Result<HttpResponse, ApiError>> {
        Box::pin(async move {
            let call_id = Uuid::new_v4();
            let started = Instant::now();

            info!(
                app = %self.app_name,
                %call_id,
                operation = operation_id,
                "{} --> {} {}",
                self.prefix,
                request.method,
                request.url
            );
            debug!(
                %call_id,
                headers = ?header_names(&request.headers),
                body_bytes = request.body.as_ref().map_or(0, String::len),
                "{} request details",
                self.prefix
            );

            let result = next.run(request, operation_id).await;
            let elapsed_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);

            match &result {
                Ok(response) => {
                    info!(
                        app = %self.app_name,
                        %call_id,
                        operation = operation_id,
                        status = response.status,
                        elapsed_ms,
                        "{} <-- {}",
                        self.prefix,
                        response.status
                    );
                    debug!(
                        %call_id,
                        headers = ?header_names(&response.headers),
                        body_bytes = response.body.len(),
                        "{} response details",
                        self.prefix
                    );
                }
                Err(err) => {
                    warn!(
                        app = %self.app_name,
                        %call_id,
                        operation = operation_id,
                        elapsed_ms,
                        error = %err,
                        "{} <-- failed",
                        self.prefix
                    );
                }
            }
            result
        })
    }
}

fn header_names(headers: &[(String, String)]) -> Vec<&str> {
    headers.iter().map(|(name, _)| name.as_str()).collect()
}
