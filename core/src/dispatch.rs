//! Operation dispatch bound to one base URL, transport and middleware chain.

use std::sync::Arc;
use std::time::Duration;

use crate::error::ApiError;
use crate::http::{HttpRequest, HttpResponse};
use crate::middleware::{Middleware, Next};
use crate::operations::Operations;
use crate::transport::Transport;

/// Runs requests through a fixed middleware chain into the transport.
///
/// A dispatcher is immutable once built. Dropping the future returned by
/// [`Dispatcher::dispatch`] cancels the call.
pub struct Dispatcher {
    operations: Operations,
    transport: Arc<dyn Transport>,
    chain: Vec<Arc<dyn Middleware>>,
    timeout: Option<Duration>,
}

impl Dispatcher {
    pub fn new(
        operations: Operations,
        transport: Arc<dyn Transport>,
        chain: Vec<Arc<dyn Middleware>>,
        timeout: Option<Duration>,
    ) -> Self {
        Self {
            operations,
            transport,
            chain,
            timeout,
        }
    }

    pub fn operations(&self) -> &Operations {
        &self.operations
    }

    pub fn chain_names(&self) -> Vec<&'static str> {
        self.chain.iter().map(|m| m.name()).collect()
    }

    pub async fn dispatch(
        &self,
        operation_id: &'static str,
        request: HttpRequest,
    ) -> Result<HttpResponse, ApiError> {
        let call = Next::new(&self.chain, self.transport.as_ref()).run(request, operation_id);
        match self.timeout {
            Some(limit) => tokio::time::timeout(limit, call)
                .await
                .map_err(|_| ApiError::Timeout {
                    operation: operation_id,
                    timeout_ms: limit.as_millis(),
                })?,
            None => call.await,
        }
    }
}

impl std::fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dispatcher")
            .field("base_url", &self.operations.base_url())
            .field("chain", &self.chain_names())
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}
