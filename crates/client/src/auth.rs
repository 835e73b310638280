//! Exchange of a display name for a session token.
//!
//! The backend's login is a mock identity provider: it signs whatever name
//! it is given. There is no password and no refresh token; renewing a
//! session means logging in again with the stored name.

use std::sync::Arc;

use ideabox_core::claims;
use ideabox_core::input::IdentityInput;
use serde::Deserialize;

use crate::error::{ApiError, AuthError};
use crate::session::SessionStore;
use crate::storage::{KeyValueStore, StorageError, USER_KEY};
use crate::transport::{ApiRequest, HttpTransport};

/// Login endpoint, relative to the backend base URL.
pub const LOGIN_PATH: &str = "/auth/login";

#[derive(Debug, Deserialize)]
struct LoginResponse {
    #[serde(default)]
    token: Option<String>,
}

/// Obtains tokens and keeps [`SessionStore`] up to date.
///
/// Uses the raw transport, not the interceptor: a rejected login is a
/// final answer, never something to re-authenticate around.
pub struct SessionAuthenticator {
    transport: Arc<dyn HttpTransport>,
    session: Arc<SessionStore>,
    storage: Arc<dyn KeyValueStore>,
}

impl SessionAuthenticator {
    pub fn new(
        transport: Arc<dyn HttpTransport>,
        session: Arc<SessionStore>,
        storage: Arc<dyn KeyValueStore>,
    ) -> Self {
        Self {
            transport,
            session,
            storage,
        }
    }

    pub fn session(&self) -> &Arc<SessionStore> {
        &self.session
    }

    /// The display name chosen on the login form; empty when none is set.
    pub fn current_identity_input(&self) -> IdentityInput {
        IdentityInput::new(self.storage.get(USER_KEY).unwrap_or_default())
    }

    /// Persist the display name future logins will use.
    pub fn remember_identity(&self, input: &IdentityInput) -> Result<(), StorageError> {
        self.storage.set(USER_KEY, &input.name)
    }

    /// Forget the stored display name.
    pub fn forget_identity(&self) -> Result<(), StorageError> {
        self.storage.remove(USER_KEY)
    }

    /// `POST /auth/login {name}`; on success the token is stored and the
    /// displayed identity updated. Failures are returned as-is, no retry.
    pub async fn authenticate(&self, input: &IdentityInput) -> Result<String, AuthError> {
        if input.is_empty() {
            return Err(AuthError::EmptyIdentity);
        }

        tracing::info!(name = %input.name, "Authenticating");

        let request =
            ApiRequest::post(LOGIN_PATH).json(serde_json::json!({ "name": input.name }));
        let response = self
            .transport
            .execute(request)
            .await
            .map_err(ApiError::from)?
            .into_result()?;

        let token = response
            .decode::<LoginResponse>()?
            .token
            .filter(|token| !token.is_empty())
            .ok_or(AuthError::MissingToken)?;

        if !self.session.set(token.clone()) {
            return Err(AuthError::InvalidToken);
        }
        tracing::info!(identity = ?self.session.identity(), "Authenticated");
        Ok(token)
    }

    /// Best-effort decode; a malformed token simply has no identity.
    pub fn decode_identity(token: &str) -> Option<String> {
        claims::decode_identity(token)
    }

    /// Drop the session token (the display name is kept).
    pub fn logout(&self) {
        self.session.teardown();
    }
}
