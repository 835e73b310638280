//! Bearer-token injection with a single re-authenticate-and-replay cycle.
//!
//! Every outbound request is sent with the current token (when one exists).
//! A 401 triggers exactly one recovery attempt:
//!
//! ```text
//! send ──► 401? ──► identity empty? ──► redirect, original 401
//!                 └► authenticate ──► ok  ──► replay once, final outcome
//!                                   └► err ──► redirect, original 401
//! ```
//!
//! Any other status, success or failure, is returned untouched.

use std::sync::Arc;

use crate::auth::SessionAuthenticator;
use crate::error::ApiError;
use crate::navigation::Navigator;
use crate::transport::{ApiRequest, ApiResponse, HttpTransport};

/// Which leg of the protocol a send belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Attempt {
    Original,
    Replay,
}

/// Request pipeline stage owning authorization recovery.
pub struct RequestInterceptor {
    transport: Arc<dyn HttpTransport>,
    authenticator: Arc<SessionAuthenticator>,
    navigator: Arc<Navigator>,
}

impl RequestInterceptor {
    pub fn new(
        transport: Arc<dyn HttpTransport>,
        authenticator: Arc<SessionAuthenticator>,
        navigator: Arc<Navigator>,
    ) -> Self {
        Self {
            transport,
            authenticator,
            navigator,
        }
    }

    /// Send `request`, recovering from at most one authorization rejection.
    ///
    /// Success resolves to the response; every failure (including a replay
    /// that is itself rejected) resolves to an [`ApiError`].
    pub async fn send(&self, request: ApiRequest) -> Result<ApiResponse, ApiError> {
        let mut token = self.authenticator.session().get();
        let mut attempt = Attempt::Original;

        loop {
            let outgoing = match token.as_deref() {
                Some(token) => request.with_bearer(token),
                None => request.clone(),
            };

            let response = self.transport.execute(outgoing).await?;
            if !response.is_unauthorized() || attempt == Attempt::Replay {
                if attempt == Attempt::Replay {
                    tracing::debug!(
                        path = %request.path,
                        status = response.status.as_u16(),
                        "Replay settled",
                    );
                }
                return response.into_result();
            }

            let rejection = ApiError::from_response(&response);
            token = Some(self.reauthenticate(&request, rejection).await?);
            attempt = Attempt::Replay;
        }
    }

    /// Obtain a fresh token after a 401, or give up with `rejection`.
    async fn reauthenticate(
        &self,
        request: &ApiRequest,
        rejection: ApiError,
    ) -> Result<String, ApiError> {
        tracing::warn!(
            method = %request.method,
            path = %request.path,
            "Unauthorized request detected, attempting re-authentication",
        );

        let identity = self.authenticator.current_identity_input();
        if identity.is_empty() {
            tracing::error!("Re-authentication impossible: no stored identity");
            self.navigator.redirect_to_login();
            return Err(rejection);
        }

        match self.authenticator.authenticate(&identity).await {
            Ok(token) => {
                tracing::info!(path = %request.path, "Re-authenticated, replaying request");
                Ok(token)
            }
            Err(e) => {
                tracing::error!(error = %e, "Re-authentication failed");
                self.navigator.redirect_to_login();
                Err(rejection)
            }
        }
    }
}
