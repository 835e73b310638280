//! Where the client currently is: the login view or the protected board.

use tokio::sync::watch;

/// Top-level views of the client.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Route {
    Login,
    IdeaBox,
}

impl Route {
    pub fn path(self) -> &'static str {
        match self {
            Route::Login => "/login",
            Route::IdeaBox => "/ideabox",
        }
    }

    /// Resolve a URL path; the empty path redirects to the board.
    pub fn from_path(path: &str) -> Option<Self> {
        match path.trim_end_matches('/') {
            "" | "/ideabox" => Some(Route::IdeaBox),
            "/login" => Some(Route::Login),
            _ => None,
        }
    }

    /// Only the board sits behind the route guard.
    pub fn is_protected(self) -> bool {
        matches!(self, Route::IdeaBox)
    }
}

/// Records navigation requests and lets views observe them.
pub struct Navigator {
    current: watch::Sender<Route>,
}

impl Default for Navigator {
    fn default() -> Self {
        Self::new(Route::Login)
    }
}

impl Navigator {
    pub fn new(initial: Route) -> Self {
        Self {
            current: watch::Sender::new(initial),
        }
    }

    pub fn navigate(&self, route: Route) {
        let previous = self.current.send_replace(route);
        if previous != route {
            tracing::info!(from = previous.path(), to = route.path(), "Navigated");
        }
    }

    pub fn redirect_to_login(&self) {
        self.navigate(Route::Login);
    }

    pub fn current(&self) -> Route {
        *self.current.borrow()
    }

    pub fn subscribe(&self) -> watch::Receiver<Route> {
        self.current.subscribe()
    }
}
