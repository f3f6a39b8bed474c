//! Async client core for the demo REST API (users, posts, products, todos,
//! comments, carts).
//!
//! # Overview
//! [`ApiClient`] resolves an [`Environment`] to a base URL, composes an ordered
//! middleware chain (logging outside auth) in front of a shared
//! [`Transport`], and exposes one typed method per REST operation.
//!
//! # Design
//! - Operations are split into `build_*` / `parse_*` on [`Operations`], so the
//!   request shape and status mapping are testable without I/O.
//! - [`SharedClientState`] (token, logging flag, public operations) is passed
//!   in explicitly as an `Arc`, never a global.
//! - Switching environments swaps one immutable binding atomically; in-flight
//!   calls keep the binding they started with.
//! - DTOs are defined independently from the mock-server crate; integration
//!   tests catch schema drift.

pub mod client;
pub mod config;
pub mod dispatch;
pub mod environment;
pub mod error;
pub mod http;
pub mod middleware;
pub mod operations;
pub mod state;
pub mod transport;
pub mod types;

pub use client::{ApiClient, ClientSnapshot};
pub use config::{ClientConfig, TransportConfig};
pub use environment::{Environment, EnvironmentResolver};
pub use error::{ApiError, TransportError};
pub use http::{HttpMethod, HttpRequest, HttpResponse};
pub use middleware::{AuthMiddleware, LoggingMiddleware, Middleware, MiddlewareType, Next};
pub use operations::{ids, Operations};
pub use state::SharedClientState;
pub use transport::{BoxFuture, DisposableTransport, ReqwestTransport, Transport};
pub use types::{
    Address, AuthResponse, Cart, CartProduct, Comment, CommentUser, ListQuery, ListResponse,
    LoginRequest, Post, Product, Reactions, Todo, User, DEFAULT_LIMIT,
};
