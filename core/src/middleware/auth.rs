//! Bearer-token injection.

use std::sync::Arc;

use crate::error::ApiError;
use crate::http::{HttpRequest, HttpResponse};
use crate::middleware::{Middleware, Next};
use crate::state::SharedClientState;
use crate::transport::BoxFuture;

type SkipPredicate = dyn Fn(&str) -> bool + Send + Sync;

/// Adds `Authorization: Bearer <token>` to requests for non-public operations.
///
/// The token is looked up in [`SharedClientState`] on every request, so a
/// token stored after the client was built applies to the next call. With no
/// token stored the request is forwarded untouched.
pub struct AuthMiddleware {
    state: Arc<SharedClientState>,
    skip: Box<SkipPredicate>,
}

impl AuthMiddleware {
    /// Skips authorization for operations listed in
    /// [`SharedClientState::is_public_operation`].
    pub fn new(state: Arc<SharedClientState>) -> Self {
        let lookup = Arc::clone(&state);
        Self {
            state,
            skip: Box::new(move |operation_id: &str| lookup.is_public_operation(operation_id)),
        }
    }

    /// Replace the skip predicate. `true` means "send without a token".
    pub fn with_skip_predicate<F>(mut self, skip: F) -> Self
    where
        F: Fn(&str) -> bool + Send + Sync + 'static,
    {
        self.skip = Box::new(skip);
        self
    }

    fn authorize(&self, request: &mut HttpRequest, operation_id: &str) {
        if (self.skip)(operation_id) {
            return;
        }
        if let Some(token) = self.state.token() {
            request.set_header("authorization", format!("Bearer {token}"));
        }
    }
}

impl Middleware for AuthMiddleware {
    fn name(&self) -> &'static str {
        "auth"
    }

    fn intercept<'a>(
        &'a self,
        mut request: HttpRequest,
        operation_id: &'a str,
        next: Next<'a>,
    ) -> BoxFuture<'a, Result<HttpResponse, ApiError>> {
        self.authorize(&mut request, operation_id);
        Box::pin(next.run(request, operation_id))
    }
}

impl std::fmt::Debug for AuthMiddleware {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthMiddleware")
            .field("has_token", &self.state.token().is_some())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::HttpMethod;
    use crate::middleware::testing::RecordingTransport;

    async fn send_through(auth: AuthMiddleware, operation_id: &str) -> HttpRequest {
        let transport = RecordingTransport::default();
        let chain: Vec<Arc<dyn Middleware>> = vec![Arc::new(auth)];
        let request = HttpRequest::new(HttpMethod::Get, "http://localhost:8080/users");
        Next::new(&chain, &transport)
            .run(request, operation_id)
            .await
            .unwrap();
        transport.last_request().unwrap()
    }

    #[tokio::test]
    async fn injects_bearer_token() {
        let state = Arc::new(SharedClientState::new());
        state.set_token(Some("secret".to_string()));
        let sent = send_through(AuthMiddleware::new(state), "getAllUsers").await;
        assert_eq!(sent.header("authorization"), Some("Bearer secret"));
    }

    #[tokio::test]
    async fn no_token_means_no_header() {
        let state = Arc::new(SharedClientState::new());
        let sent = send_through(AuthMiddleware::new(state), "getAllUsers").await;
        assert!(sent.header("authorization").is_none());
    }

    #[tokio::test]
    async fn public_operations_bypass_auth() {
        let state = Arc::new(SharedClientState::new());
        state.set_token(Some("secret".to_string()));
        state.set_public_operation_ids(["loginUser"]);
        let sent = send_through(AuthMiddleware::new(Arc::clone(&state)), "loginUser").await;
        assert!(sent.header("authorization").is_none());

        let sent = send_through(AuthMiddleware::new(state), "getAllUsers").await;
        assert_eq!(sent.header("authorization"), Some("Bearer secret"));
    }

    #[tokio::test]
    async fn token_changes_apply_to_later_requests() {
        let state = Arc::new(SharedClientState::new());
        let transport = RecordingTransport::default();
        let chain: Vec<Arc<dyn Middleware>> = vec![Arc::new(AuthMiddleware::new(Arc::clone(&state)))];

        for token in ["first", "second"] {
            state.set_token(Some(token.to_string()));
            let request = HttpRequest::new(HttpMethod::Get, "http://localhost:8080/users");
            Next::new(&chain, &transport).run(request, "getAllUsers").await.unwrap();
            let expected = format!("Bearer {token}");
            assert_eq!(
                transport.last_request().unwrap().header("authorization"),
                Some(expected.as_str())
            );
        }
    }

    #[tokio::test]
    async fn custom_predicate_overrides_public_set() {
        let state = Arc::new(SharedClientState::new());
        state.set_token(Some("secret".to_string()));
        let auth = AuthMiddleware::new(state).with_skip_predicate(|id| id.starts_with("get"));
        let sent = send_through(auth, "getAllUsers").await;
        assert!(sent.header("authorization").is_none());
    }
}
