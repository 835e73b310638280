//! The login view: pick a display name, then head for the board.

use std::sync::Arc;

use ideabox_core::error::CoreError;
use ideabox_core::input::IdentityInput;

use crate::auth::SessionAuthenticator;
use crate::guard::{GuardDecision, RouteGuard};
use crate::navigation::Route;

pub struct LoginView {
    authenticator: Arc<SessionAuthenticator>,
    guard: Arc<RouteGuard>,
}

impl LoginView {
    pub fn new(authenticator: Arc<SessionAuthenticator>, guard: Arc<RouteGuard>) -> Self {
        Self {
            authenticator,
            guard,
        }
    }

    /// Entering the login view ends the session and forgets the name.
    pub fn enter(&self) {
        self.authenticator.logout();
        if let Err(e) = self.authenticator.forget_identity() {
            tracing::warn!(error = %e, "Failed to clear stored display name");
        }
    }

    /// Store `name` and navigate to the board; the guard does the login.
    ///
    /// Invalid names are rejected before anything is stored.
    pub async fn submit(&self, name: &str) -> Result<GuardDecision, CoreError> {
        let input = IdentityInput::parse(name)?;
        if let Err(e) = self.authenticator.remember_identity(&input) {
            tracing::warn!(error = %e, "Failed to persist display name");
        }
        Ok(self.guard.navigate(Route::IdeaBox).await)
    }
}
