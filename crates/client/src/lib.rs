//! IdeaBox client core.
//!
//! Session handling (token store, login, route guard, 401 recovery), the
//! reactive idea store, and the board orchestrator. [`IdeaBoxClient`] wires
//! them together over a transport and a durable key/value store so the
//! binary and the integration tests build the same object graph.

pub mod api;
pub mod auth;
pub mod config;
pub mod error;
pub mod guard;
pub mod interceptor;
pub mod login;
pub mod navigation;
pub mod orchestrator;
pub mod session;
pub mod storage;
pub mod store;
pub mod transport;

#[cfg(test)]
mod testing;

use std::sync::Arc;

use crate::api::IdeaBoxApi;
use crate::auth::SessionAuthenticator;
use crate::config::ClientConfig;
use crate::error::StartupError;
use crate::guard::RouteGuard;
use crate::interceptor::RequestInterceptor;
use crate::login::LoginView;
use crate::navigation::Navigator;
use crate::orchestrator::IdeaBoard;
use crate::session::SessionStore;
use crate::storage::{FileStorage, KeyValueStore};
use crate::store::IdeaStore;
use crate::transport::{HttpTransport, ReqwestTransport};

/// Shared, process-wide client services.
///
/// Views ([`LoginView`], [`IdeaBoard`]) are created per entry and borrow
/// these through `Arc`s.
#[derive(Clone)]
pub struct IdeaBoxClient {
    pub session: Arc<SessionStore>,
    pub navigator: Arc<Navigator>,
    pub authenticator: Arc<SessionAuthenticator>,
    pub guard: Arc<RouteGuard>,
    pub api: Arc<IdeaBoxApi>,
    pub store: Arc<IdeaStore>,
}

impl IdeaBoxClient {
    /// Build the production graph: file-backed storage and a reqwest
    /// transport pointed at `config.backend_url`.
    pub fn connect(config: &ClientConfig) -> Result<Self, StartupError> {
        let storage = Arc::new(FileStorage::open(config.storage_path.clone())?);
        let transport = Arc::new(ReqwestTransport::new(
            config.backend_url.clone(),
            config.request_timeout,
        )?);
        tracing::info!(
            backend = %config.backend_url,
            storage = %config.storage_path.display(),
            "IdeaBox client configured",
        );
        Ok(Self::assemble(transport, storage))
    }

    /// Build the graph over any transport and storage.
    pub fn assemble(transport: Arc<dyn HttpTransport>, storage: Arc<dyn KeyValueStore>) -> Self {
        let session = Arc::new(SessionStore::init(storage.clone()));
        let navigator = Arc::new(Navigator::default());
        let authenticator = Arc::new(SessionAuthenticator::new(
            transport.clone(),
            session.clone(),
            storage,
        ));
        let guard = Arc::new(RouteGuard::new(authenticator.clone(), navigator.clone()));
        let interceptor = Arc::new(RequestInterceptor::new(
            transport,
            authenticator.clone(),
            navigator.clone(),
        ));
        let api = Arc::new(IdeaBoxApi::new(interceptor));
        let store = Arc::new(IdeaStore::new(session.clone()));

        Self {
            session,
            navigator,
            authenticator,
            guard,
            api,
            store,
        }
    }

    pub fn login_view(&self) -> LoginView {
        LoginView::new(self.authenticator.clone(), self.guard.clone())
    }

    /// A fresh board view; tear it down when leaving the board.
    pub fn board(&self) -> IdeaBoard {
        IdeaBoard::new(self.api.clone(), self.store.clone())
    }
}
