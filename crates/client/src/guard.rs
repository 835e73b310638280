//! Gate in front of the protected board.

use std::sync::Arc;

use crate::auth::SessionAuthenticator;
use crate::navigation::{Navigator, Route};
use crate::session::SessionStore;

/// Outcome of a guarded navigation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GuardDecision {
    Admit,
    Deny,
}

/// Decides whether navigation into the board may proceed.
pub struct RouteGuard {
    authenticator: Arc<SessionAuthenticator>,
    navigator: Arc<Navigator>,
}

impl RouteGuard {
    pub fn new(authenticator: Arc<SessionAuthenticator>, navigator: Arc<Navigator>) -> Self {
        Self {
            authenticator,
            navigator,
        }
    }

    /// A valid token admits immediately with no network call. Otherwise the
    /// decision waits for a login with the stored display name. Denial
    /// redirects to the login view; it never errors.
    pub async fn can_activate(&self) -> GuardDecision {
        let session = self.authenticator.session();
        if let Some(token) = session.get() {
            if SessionStore::is_valid(&token) {
                return self.admit();
            }
        }

        tracing::info!("Token invalid or expired, re-authenticating");
        let identity = self.authenticator.current_identity_input();
        if identity.is_empty() {
            tracing::warn!("No stored identity to authenticate with");
            return self.deny();
        }

        match self.authenticator.authenticate(&identity).await {
            Ok(_) => self.admit(),
            Err(e) => {
                tracing::error!(error = %e, "Authentication failed");
                self.deny()
            }
        }
    }

    /// Guard-aware navigation: unprotected routes are entered directly.
    pub async fn navigate(&self, route: Route) -> GuardDecision {
        if route.is_protected() && self.can_activate().await == GuardDecision::Deny {
            return GuardDecision::Deny;
        }
        self.navigator.navigate(route);
        GuardDecision::Admit
    }

    fn admit(&self) -> GuardDecision {
        tracing::debug!(identity = ?self.authenticator.session().identity(), "Admitted");
        GuardDecision::Admit
    }

    fn deny(&self) -> GuardDecision {
        self.navigator.redirect_to_login();
        GuardDecision::Deny
    }
}
