//! The process-wide session token and the identity derived from it.
//!
//! [`SessionStore`] keeps the token in memory and mirrors every write into
//! durable storage. Reads prefer memory and fall back to storage, adopting
//! whatever they find (read-through). A token that fails to decode ends the
//! session in both places. The displayed identity is always re-derived from
//! the token, never stored on its own.

use std::sync::Arc;

use ideabox_core::claims;
use tokio::sync::watch;

use crate::storage::{KeyValueStore, TOKEN_KEY};

/// Owner of the current session token.
pub struct SessionStore {
    storage: Arc<dyn KeyValueStore>,
    token: watch::Sender<Option<String>>,
    identity: watch::Sender<Option<String>>,
}

impl SessionStore {
    /// Create the store and adopt any token persisted by a previous run.
    pub fn init(storage: Arc<dyn KeyValueStore>) -> Self {
        let store = Self {
            storage,
            token: watch::Sender::new(None),
            identity: watch::Sender::new(None),
        };
        store.get();
        store
    }

    /// Current token: memory first, then durable storage. No network access.
    pub fn get(&self) -> Option<String> {
        if let Some(token) = self.token.borrow().clone() {
            return Some(token);
        }

        let stored = self.storage.get(TOKEN_KEY)?;
        if !self.adopt(stored.clone()) {
            return None;
        }
        tracing::debug!("Adopted session token from durable storage");
        Some(stored)
    }

    /// Replace the token in memory and in durable storage.
    ///
    /// An undecodable token ends the session instead: nothing is kept and
    /// `false` is returned.
    pub fn set(&self, token: impl Into<String>) -> bool {
        let token = token.into();
        if !self.adopt(token.clone()) {
            return false;
        }
        if let Err(e) = self.storage.set(TOKEN_KEY, &token) {
            tracing::warn!(error = %e, "Failed to persist session token");
        }
        true
    }

    /// Pure decode-and-compare against the wall clock; never errors.
    pub fn is_valid(token: &str) -> bool {
        let valid = claims::is_valid(token);
        if !valid {
            tracing::debug!("Session token is malformed or expired");
        }
        valid
    }

    /// `true` iff a token is present and currently valid.
    pub fn has_valid_token(&self) -> bool {
        self.get().is_some_and(|token| Self::is_valid(&token))
    }

    /// Drop the token and identity from memory and storage. Idempotent.
    pub fn clear(&self) {
        self.token.send_replace(None);
        self.identity.send_replace(None);
        if let Err(e) = self.storage.remove(TOKEN_KEY) {
            tracing::warn!(error = %e, "Failed to remove persisted session token");
        }
    }

    /// Alias of [`clear`](Self::clear) for the logout path.
    pub fn teardown(&self) {
        self.clear();
        tracing::info!("Session cleared");
    }

    /// Display identity derived from the current token.
    pub fn identity(&self) -> Option<String> {
        self.identity.borrow().clone()
    }

    /// Observe identity changes (for a header greeting, say).
    pub fn subscribe_identity(&self) -> watch::Receiver<Option<String>> {
        self.identity.subscribe()
    }

    /// Take `token` as the session token, or clear the session if it does
    /// not decode.
    fn adopt(&self, token: String) -> bool {
        let claims = match claims::decode_claims(&token) {
            Ok(claims) => claims,
            Err(e) => {
                tracing::warn!(error = %e, "Discarding undecodable session token");
                self.clear();
                return false;
            }
        };

        let identity = claims.display_name().map(str::to_string);
        if identity.is_none() {
            tracing::warn!("Session token carries no display identity");
        }
        self.token.send_replace(Some(token));
        self.identity.send_replace(identity);
        true
    }
}
