//! Authentication and logging settings shared by every client in a process.
//!
//! # Design
//! `SharedClientState` is passed explicitly as `Arc<SharedClientState>` rather
//! than living in a global, so tests can hand each client an isolated
//! instance. Every field is guarded on its own; each operation is a single
//! atomic read or write of one field.
//!
//! The auth middleware consults the token and the public operation set on
//! every request. The logging flag is read only when a client composes its
//! middleware chain (construction, environment switch or
//! [`ApiClient::refresh_middleware`](crate::ApiClient::refresh_middleware)).

use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};

use parking_lot::RwLock;

#[derive(Debug)]
pub struct SharedClientState {
    token: RwLock<Option<String>>,
    logging_enabled: AtomicBool,
    public_operation_ids: RwLock<HashSet<String>>,
}

impl Default for SharedClientState {
    fn default() -> Self {
        Self::new()
    }
}

impl SharedClientState {
    pub fn new() -> Self {
        Self {
            token: RwLock::new(None),
            logging_enabled: AtomicBool::new(true),
            public_operation_ids: RwLock::new(HashSet::new()),
        }
    }

    /// Replace the bearer token. Returns `true` if the stored value changed.
    pub fn set_token(&self, token: Option<String>) -> bool {
        let mut current = self.token.write();
        if *current == token {
            return false;
        }
        *current = token;
        true
    }

    pub fn token(&self) -> Option<String> {
        self.token.read().clone()
    }

    pub fn set_logging_enabled(&self, enabled: bool) {
        self.logging_enabled.store(enabled, Ordering::SeqCst);
    }

    pub fn is_logging_enabled(&self) -> bool {
        self.logging_enabled.load(Ordering::SeqCst)
    }

    pub fn set_public_operation_ids<I, S>(&self, ids: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let ids: HashSet<String> = ids.into_iter().map(Into::into).collect();
        *self.public_operation_ids.write() = ids;
    }

    /// The public operation ids, sorted.
    pub fn public_operation_ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.public_operation_ids.read().iter().cloned().collect();
        ids.sort();
        ids
    }

    pub fn is_public_operation(&self, operation_id: &str) -> bool {
        self.public_operation_ids.read().contains(operation_id)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;

    #[test]
    fn logging_defaults_to_enabled() {
        let state = SharedClientState::new();
        assert!(state.is_logging_enabled());
        assert!(state.token().is_none());
        assert!(state.public_operation_ids().is_empty());
    }

    #[test]
    fn clearing_token_twice_is_idempotent() {
        let state = SharedClientState::new();
        state.set_token(Some("abc".to_string()));
        assert!(state.set_token(None));
        assert!(!state.set_token(None));
        assert!(state.token().is_none());
    }

    #[test]
    fn setting_same_token_changes_state_once() {
        let state = SharedClientState::new();
        assert!(state.set_token(Some("abc".to_string())));
        assert!(!state.set_token(Some("abc".to_string())));
        assert_eq!(state.token().as_deref(), Some("abc"));
    }

    #[test]
    fn public_operations_use_set_semantics() {
        let state = SharedClientState::new();
        state.set_public_operation_ids(["loginUser", "getAllProducts", "loginUser"]);
        assert_eq!(
            state.public_operation_ids(),
            vec!["getAllProducts".to_string(), "loginUser".to_string()]
        );
        assert!(state.is_public_operation("loginUser"));
        assert!(!state.is_public_operation("getAllUsers"));

        state.set_public_operation_ids(Vec::<String>::new());
        assert!(!state.is_public_operation("loginUser"));
    }

    #[test]
    fn concurrent_writers_leave_a_consistent_token() {
        let state = Arc::new(SharedClientState::new());
        let handles: Vec<_> = (0..8)
            .map(|i| {
                let state = Arc::clone(&state);
                std::thread::spawn(move || {
                    for _ in 0..100 {
                        state.set_token(Some(format!("token-{i}")));
                        let _ = state.token();
                        state.set_logging_enabled(i % 2 == 0);
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }
        let token = state.token().unwrap();
        assert!(token.starts_with("token-"));
    }
}
