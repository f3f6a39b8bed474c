//! Typed async client for the demo REST API.
//!
//! # Design
//! The environment, its base URL, the selected middleware types and the
//! dispatcher built from them form one immutable binding. The client
//! holds the current binding in an `ArcSwap`: every call loads it exactly
//! once and uses only that value, and [`ApiClient::switch_environment`]
//! replaces it with a single store. A call therefore runs entirely against
//! the configuration that was current when it started, and network I/O of
//! concurrent calls is never serialized. Rebinds are serialized among
//! themselves by a mutex.
//!
//! Middleware instances are built once per client and shared by every
//! binding.

use std::sync::Arc;
use std::time::Duration;

use arc_swap::ArcSwap;
use parking_lot::Mutex;
use tracing::{debug, info};
use url::Url;

use crate::config::ClientConfig;
use crate::dispatch::Dispatcher;
use crate::environment::{Environment, EnvironmentResolver};
use crate::error::ApiError;
use crate::http::{HttpRequest, HttpResponse};
use crate::middleware::{build_chain, select_types, AuthMiddleware, LoggingMiddleware, MiddlewareType};
use crate::operations::{ids, Operations};
use crate::state::SharedClientState;
use crate::transport::{ReqwestTransport, Transport};
use crate::types::{
    AuthResponse, Cart, Comment, ListQuery, ListResponse, LoginRequest, Post, Product, Todo, User,
};

/// The configuration a call runs against.
#[derive(Debug)]
struct Binding {
    environment: Environment,
    base_url: Url,
    middleware: Vec<MiddlewareType>,
    dispatcher: Dispatcher,
}

/// A consistent view of one binding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientSnapshot {
    pub environment: Environment,
    pub base_url: Url,
    pub middleware: Vec<MiddlewareType>,
}

/// Everything needed to build a binding, fixed for the client's lifetime.
struct Wiring {
    resolver: EnvironmentResolver,
    state: Arc<SharedClientState>,
    transport: Arc<dyn Transport>,
    auth: Arc<AuthMiddleware>,
    logging: Arc<LoggingMiddleware>,
    timeout: Option<Duration>,
}

impl Wiring {
    fn bind(&self, environment: Environment) -> Result<Binding, ApiError> {
        let base_url = self.resolver.resolve(environment)?;
        let middleware = select_types(environment, self.state.is_logging_enabled());
        let chain = build_chain(&middleware, &self.auth, &self.logging);
        let dispatcher = Dispatcher::new(
            Operations::new(&base_url),
            Arc::clone(&self.transport),
            chain,
            self.timeout,
        );
        Ok(Binding {
            environment,
            base_url,
            middleware,
            dispatcher,
        })
    }
}

pub struct ApiClient {
    wiring: Wiring,
    binding: ArcSwap<Binding>,
    rebind: Mutex<()>,
}

impl ApiClient {
    /// Build a client for `config.environment`.
    ///
    /// Without `transport`, a pooled [`ReqwestTransport`] is built from
    /// `config.transport`. Pass a shared transport to reuse one pool across
    /// clients. Fails with [`ApiError::Configuration`] if the environment's
    /// URL cannot be resolved.
    pub async fn create(
        config: ClientConfig,
        state: Arc<SharedClientState>,
        transport: Option<Arc<dyn Transport>>,
    ) -> Result<Self, ApiError> {
        let resolver = EnvironmentResolver::from_config(&config);
        // Resolve before allocating a connection pool.
        resolver.resolve(config.environment)?;

        let transport: Arc<dyn Transport> = match transport {
            Some(transport) => transport,
            None => Arc::new(ReqwestTransport::new(&config.transport)?),
        };

        let wiring = Wiring {
            resolver,
            auth: Arc::new(AuthMiddleware::new(Arc::clone(&state))),
            logging: Arc::new(LoggingMiddleware::new(
                config.app_name.as_str(),
                config.log_prefix.as_str(),
            )),
            state,
            transport,
            timeout: config.timeout(),
        };
        let binding = wiring.bind(config.environment)?;
        info!(
            app = %wiring.logging.app_name(),
            environment = %binding.environment,
            base_url = %binding.base_url,
            middleware = ?binding.middleware,
            "api client ready"
        );

        Ok(Self {
            wiring,
            binding: ArcSwap::from_pointee(binding),
            rebind: Mutex::new(()),
        })
    }

    /// Point the client at `environment`.
    ///
    /// Re-reads the logging flag and rebuilds the dispatcher with the same
    /// middleware instances. Calls already in flight finish against the
    /// previous binding. On error the current binding is left untouched.
    pub fn switch_environment(&self, environment: Environment) -> Result<(), ApiError> {
        let _guard = self.rebind.lock();
        let binding = self.wiring.bind(environment)?;
        info!(
            environment = %binding.environment,
            base_url = %binding.base_url,
            middleware = ?binding.middleware,
            "switched environment"
        );
        self.binding.store(Arc::new(binding));
        Ok(())
    }

    /// Rebuild the middleware chain for the current environment, picking up
    /// a changed logging flag.
    pub fn refresh_middleware(&self) -> Result<(), ApiError> {
        let _guard = self.rebind.lock();
        let environment = self.binding.load().environment;
        let binding = self.wiring.bind(environment)?;
        debug!(middleware = ?binding.middleware, "middleware refreshed");
        self.binding.store(Arc::new(binding));
        Ok(())
    }

    pub fn snapshot(&self) -> ClientSnapshot {
        let binding = self.binding.load();
        ClientSnapshot {
            environment: binding.environment,
            base_url: binding.base_url.clone(),
            middleware: binding.middleware.clone(),
        }
    }

    pub fn environment(&self) -> Environment {
        self.binding.load().environment
    }

    pub fn state(&self) -> &Arc<SharedClientState> {
        &self.wiring.state
    }

    async fn call<T, B, P>(&self, operation_id: &'static str, build: B, parse: P) -> Result<T, ApiError>
    where
        B: FnOnce(&Operations) -> Result<HttpRequest, ApiError>,
        P: FnOnce(&Operations, HttpResponse) -> Result<T, ApiError>,
    {
        let binding = self.binding.load_full();
        let operations = binding.dispatcher.operations();
        let request = build(operations)?;
        let response = binding.dispatcher.dispatch(operation_id, request).await?;
        parse(operations, response)
    }

    // --- auth ---

    /// Exchange credentials for tokens. The token is not stored; call
    /// [`SharedClientState::set_token`] to authenticate later requests.
    pub async fn login(
        &self,
        username: &str,
        password: &str,
        expires_in_mins: Option<u32>,
    ) -> Result<AuthResponse, ApiError> {
        let credentials = LoginRequest {
            username: username.to_string(),
            password: password.to_string(),
            expires_in_mins,
        };
        self.call(
            ids::LOGIN_USER,
            |ops| ops.build_login(&credentials),
            Operations::parse_login,
        )
        .await
    }

    // --- users ---

    pub async fn get_users(&self, query: ListQuery) -> Result<ListResponse<User>, ApiError> {
        self.call(
            ids::GET_ALL_USERS,
            |ops| Ok(ops.build_get_users(query)),
            Operations::parse_get_users,
        )
        .await
    }

    pub async fn get_user(&self, id: u64) -> Result<User, ApiError> {
        self.call(
            ids::GET_USER_BY_ID,
            |ops| Ok(ops.build_get_user(id)),
            Operations::parse_get_user,
        )
        .await
    }

    pub async fn create_user(&self, user: &User) -> Result<User, ApiError> {
        self.call(
            ids::CREATE_USER,
            |ops| ops.build_create_user(user),
            Operations::parse_create_user,
        )
        .await
    }

    // --- posts ---

    pub async fn get_posts(&self, query: ListQuery) -> Result<ListResponse<Post>, ApiError> {
        self.call(
            ids::GET_ALL_POSTS,
            |ops| Ok(ops.build_get_posts(query)),
            Operations::parse_get_posts,
        )
        .await
    }

    pub async fn get_post(&self, id: u64) -> Result<Post, ApiError> {
        self.call(
            ids::GET_POST_BY_ID,
            |ops| Ok(ops.build_get_post(id)),
            Operations::parse_get_post,
        )
        .await
    }

    pub async fn create_post(&self, post: &Post) -> Result<(), ApiError> {
        self.call(
            ids::CREATE_POST,
            |ops| ops.build_create_post(post),
            Operations::parse_create_post,
        )
        .await
    }

    // --- products ---

    pub async fn get_products(&self, query: ListQuery) -> Result<ListResponse<Product>, ApiError> {
        self.call(
            ids::GET_ALL_PRODUCTS,
            |ops| Ok(ops.build_get_products(query)),
            Operations::parse_get_products,
        )
        .await
    }

    pub async fn get_product(&self, id: u64) -> Result<Product, ApiError> {
        self.call(
            ids::GET_PRODUCT_BY_ID,
            |ops| Ok(ops.build_get_product(id)),
            Operations::parse_get_product,
        )
        .await
    }

    pub async fn create_product(&self, product: &Product) -> Result<(), ApiError> {
        self.call(
            ids::CREATE_PRODUCT,
            |ops| ops.build_create_product(product),
            Operations::parse_create_product,
        )
        .await
    }

    // --- todos ---

    pub async fn get_todos(&self, limit: u32) -> Result<ListResponse<Todo>, ApiError> {
        self.call(
            ids::GET_ALL_TODOS,
            |ops| Ok(ops.build_get_todos(limit)),
            Operations::parse_get_todos,
        )
        .await
    }

    pub async fn get_todo(&self, id: u64) -> Result<Todo, ApiError> {
        self.call(
            ids::GET_TODO_BY_ID,
            |ops| Ok(ops.build_get_todo(id)),
            Operations::parse_get_todo,
        )
        .await
    }

    pub async fn create_todo(&self, todo: &Todo) -> Result<(), ApiError> {
        self.call(
            ids::CREATE_TODO,
            |ops| ops.build_create_todo(todo),
            Operations::parse_create_todo,
        )
        .await
    }

    // --- comments ---

    pub async fn get_comments(&self, limit: u32) -> Result<ListResponse<Comment>, ApiError> {
        self.call(
            ids::GET_ALL_COMMENTS,
            |ops| Ok(ops.build_get_comments(limit)),
            Operations::parse_get_comments,
        )
        .await
    }

    pub async fn get_comment(&self, id: u64) -> Result<Comment, ApiError> {
        self.call(
            ids::GET_COMMENT_BY_ID,
            |ops| Ok(ops.build_get_comment(id)),
            Operations::parse_get_comment,
        )
        .await
    }

    // --- carts ---

    pub async fn get_carts(&self, limit: u32) -> Result<ListResponse<Cart>, ApiError> {
        self.call(
            ids::GET_ALL_CARTS,
            |ops| Ok(ops.build_get_carts(limit)),
            Operations::parse_get_carts,
        )
        .await
    }

    pub async fn get_cart(&self, id: u64) -> Result<Cart, ApiError> {
        self.call(
            ids::GET_CART_BY_ID,
            |ops| Ok(ops.build_get_cart(id)),
            Operations::parse_get_cart,
        )
        .await
    }
}

impl std::fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiClient")
            .field("binding", &self.snapshot())
            .finish_non_exhaustive()
    }
}
