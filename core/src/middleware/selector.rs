//! Which middleware a client attaches, and in what order.
//!
//! The order is fixed by [`MiddlewareType`]'s `Ord`: logging sorts before
//! auth, so logging wraps authentication. It sees each request before the
//! token is attached and each response last.

use std::sync::Arc;

use crate::environment::Environment;
use crate::middleware::{AuthMiddleware, LoggingMiddleware, Middleware};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum MiddlewareType {
    Logging = 0,
    Auth = 1,
}

/// The middleware types for `environment`, sorted outermost first.
pub fn select_types(environment: Environment, logging_allowed: bool) -> Vec<MiddlewareType> {
    let mut types = Vec::with_capacity(2);
    if environment.requires_auth() {
        types.push(MiddlewareType::Auth);
    }
    if logging_allowed {
        types.push(MiddlewareType::Logging);
    }
    types.sort();
    types
}

/// Map each type to its pre-built instance, preserving order.
pub fn build_chain(
    types: &[MiddlewareType],
    auth: &Arc<AuthMiddleware>,
    logging: &Arc<LoggingMiddleware>,
) -> Vec<Arc<dyn Middleware>> {
    types
        .iter()
        .map(|kind| -> Arc<dyn Middleware> {
            match kind {
                MiddlewareType::Logging => Arc::clone(logging) as Arc<dyn Middleware>,
                MiddlewareType::Auth => Arc::clone(auth) as Arc<dyn Middleware>,
            }
        })
        .collect()
}
