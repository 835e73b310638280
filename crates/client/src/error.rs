use ideabox_core::error::CoreError;
use reqwest::StatusCode;

use crate::config::ConfigError;
use crate::storage::StorageError;
use crate::transport::ApiResponse;

/// Shown when a failed response carries no message of its own.
pub const FALLBACK_MESSAGE: &str = "Something went wrong. Please try again.";

/// The request never produced a response.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// Network, DNS, TLS, or timeout failure.
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// A header could not be encoded.
    #[error("Invalid header: {0}")]
    InvalidHeader(String),
}

/// Outcome of a backend call that did not succeed.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// The backend answered with a non-2xx status.
    #[error("Backend error ({status}): {message}")]
    Status { status: StatusCode, message: String },

    #[error(transparent)]
    Transport(#[from] TransportError),

    /// A successful response whose body did not have the expected shape.
    #[error("Unexpected response body: {0}")]
    Decode(String),
}

impl ApiError {
    /// Build a [`ApiError::Status`] from a failed response, pulling the
    /// server-supplied `message` (or `error`) field out of a JSON body.
    pub fn from_response(response: &ApiResponse) -> Self {
        let message = serde_json::from_str::<serde_json::Value>(&response.body)
            .ok()
            .and_then(|body| {
                ["message", "error"]
                    .iter()
                    .find_map(|field| body.get(field)?.as_str().map(str::to_string))
            })
            .filter(|message| !message.trim().is_empty())
            .unwrap_or_else(|| FALLBACK_MESSAGE.to_string());

        ApiError::Status {
            status: response.status,
            message,
        }
    }

    pub fn status(&self) -> Option<StatusCode> {
        match self {
            ApiError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }

    pub fn is_unauthorized(&self) -> bool {
        self.status() == Some(StatusCode::UNAUTHORIZED)
    }

    /// Message suitable for the error popup.
    pub fn user_message(&self) -> String {
        match self {
            ApiError::Status { message, .. } => message.clone(),
            ApiError::Transport(_) | ApiError::Decode(_) => FALLBACK_MESSAGE.to_string(),
        }
    }
}

/// Failures of the login exchange.
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    /// No display name is stored, so there is nothing to log in with.
    #[error("No identity available to authenticate with")]
    EmptyIdentity,

    /// The login call succeeded but returned no token.
    #[error("Login response did not contain a token")]
    MissingToken,

    /// The login call returned a token that does not decode.
    #[error("Login response carried an unreadable token")]
    InvalidToken,

    #[error(transparent)]
    Api(#[from] ApiError),
}

/// Failures surfaced to the interaction layer.
#[derive(Debug, thiserror::Error)]
pub enum BoardError {
    /// Local input was rejected before any call was made.
    #[error(transparent)]
    Validation(#[from] CoreError),

    #[error(transparent)]
    Api(#[from] ApiError),

    /// The owning view was torn down; the result was discarded.
    #[error("View was torn down before the request settled")]
    Cancelled,

    /// The action needs an open idea (details, edit, delete) and none is.
    #[error("No idea is open")]
    NoActiveIdea,

    /// Bulk status change with nothing selected.
    #[error("No ideas selected")]
    EmptySelection,
}

/// The client could not be assembled.
#[derive(Debug, thiserror::Error)]
pub enum StartupError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error(transparent)]
    Transport(#[from] TransportError),
}
