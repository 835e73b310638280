//! User-supplied input, validated before any request leaves the client.

use serde::Serialize;
use validator::Validate;

use crate::error::CoreError;
use crate::idea::IdeaStatus;

/// Maximum length of a display name on the login form.
pub const MAX_NAME_LEN: u64 = 20;

/// Maximum length of an idea title.
pub const MAX_TITLE_LEN: u64 = 100;

/// Maximum length of an idea description.
pub const MAX_DESCRIPTION_LEN: u64 = 1000;

/// Maximum length of a comment.
pub const MAX_COMMENT_LEN: u64 = 500;

/// The identity the mock login exchanges for a token: just a display name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Validate)]
pub struct IdentityInput {
    #[validate(length(min = 1, max = MAX_NAME_LEN))]
    pub name: String,
}

impl IdentityInput {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into().trim().to_string(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.name.is_empty()
    }

    /// Trimmed and validated; the form refuses blank or over-long names.
    pub fn parse(name: &str) -> Result<Self, CoreError> {
        let input = Self::new(name);
        input.validate()?;
        Ok(input)
    }
}

/// Create/edit payload for an idea.
///
/// An absent description is sent as `null` so that an edit can clear it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Validate)]
pub struct IdeaDraft {
    #[validate(length(min = 1, max = MAX_TITLE_LEN))]
    pub title: String,
    #[validate(length(max = MAX_DESCRIPTION_LEN))]
    pub description: Option<String>,
}

impl IdeaDraft {
    /// Trim both fields; a blank description becomes `None`.
    pub fn new(title: &str, description: Option<&str>) -> Self {
        Self {
            title: title.trim().to_string(),
            description: description
                .map(str::trim)
                .filter(|d| !d.is_empty())
                .map(str::to_string),
        }
    }

    pub fn validated(self) -> Result<Self, CoreError> {
        self.validate()?;
        Ok(self)
    }
}

/// Body of `POST /idea/{id}/comment`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Validate)]
pub struct CommentDraft {
    #[validate(length(min = 1, max = MAX_COMMENT_LEN))]
    pub text: String,
}

impl CommentDraft {
    pub fn parse(text: &str) -> Result<Self, CoreError> {
        let draft = Self {
            text: text.trim().to_string(),
        };
        draft.validate()?;
        Ok(draft)
    }
}

/// Body of `PATCH /ideas/status`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusChange {
    pub idea_ids: Vec<String>,
    pub status: IdeaStatus,
}
