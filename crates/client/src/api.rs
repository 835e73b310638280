//! Typed wrappers for the `/ideabox` REST surface.
//!
//! Every call goes through the [`RequestInterceptor`], so callers never see
//! re-authentication; they only see the final outcome.

use std::sync::Arc;

use ideabox_core::idea::{Choice, Idea, IdeaStatus};
use ideabox_core::input::{CommentDraft, IdeaDraft, StatusChange};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::error::ApiError;
use crate::interceptor::RequestInterceptor;
use crate::transport::ApiRequest;

/// Base path of the idea endpoints.
pub const BASE_PATH: &str = "/ideabox";

/// Filters for `GET /ideas`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IdeaQuery {
    pub search: String,
    pub favourite: bool,
}

#[derive(Debug, Deserialize)]
struct IdeaList {
    ideas: Vec<Idea>,
}

/// `{message}` acknowledgement returned by deletes and bulk updates. An
/// empty success body reads as an acknowledgement with no message.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Ack {
    #[serde(default)]
    pub message: String,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ChoiceList {
    Wrapped { choices: Vec<Choice> },
    Bare(Vec<Choice>),
}

/// Client for the idea board endpoints.
pub struct IdeaBoxApi {
    interceptor: Arc<RequestInterceptor>,
}

impl IdeaBoxApi {
    pub fn new(interceptor: Arc<RequestInterceptor>) -> Self {
        Self { interceptor }
    }

    /// `GET /ideas?search=&favourite=`
    pub async fn list_ideas(&self, query: &IdeaQuery) -> Result<Vec<Idea>, ApiError> {
        let mut request = ApiRequest::get(path("/ideas"));
        if !query.search.is_empty() {
            request = request.query("search", query.search.clone());
        }
        if query.favourite {
            request = request.query("favourite", "true");
        }
        Ok(self.call::<IdeaList>(request).await?.ideas)
    }

    /// `GET /idea/{id}`
    pub async fn get_idea(&self, id: &str) -> Result<Idea, ApiError> {
        self.call(ApiRequest::get(path(&format!("/idea/{id}")))).await
    }

    /// `POST /idea`
    pub async fn create_idea(&self, draft: &IdeaDraft) -> Result<Idea, ApiError> {
        self.call(ApiRequest::post(path("/idea")).json(to_json(draft)?)).await
    }

    /// `PATCH /idea/{id}`
    pub async fn update_idea(&self, id: &str, draft: &IdeaDraft) -> Result<Idea, ApiError> {
        self.call(ApiRequest::patch(path(&format!("/idea/{id}"))).json(to_json(draft)?)).await
    }

    /// `DELETE /idea/{id}`
    pub async fn remove_idea(&self, id: &str) -> Result<Ack, ApiError> {
        self.acknowledge(ApiRequest::delete(path(&format!("/idea/{id}")))).await
    }

    /// `PATCH /idea/{id}/vote`
    pub async fn add_vote(&self, id: &str) -> Result<Idea, ApiError> {
        self.call(ApiRequest::patch(path(&format!("/idea/{id}/vote")))).await
    }

    /// `PATCH /idea/{id}/unvote`
    pub async fn remove_vote(&self, id: &str) -> Result<Idea, ApiError> {
        self.call(ApiRequest::patch(path(&format!("/idea/{id}/unvote")))).await
    }

    /// `POST /idea/{id}/comment {text}`
    pub async fn add_comment(&self, id: &str, draft: &CommentDraft) -> Result<Idea, ApiError> {
        let request = ApiRequest::post(path(&format!("/idea/{id}/comment")));
        self.call(request.json(to_json(draft)?)).await
    }

    /// `DELETE /idea/{id}/comment/{commentId}`
    pub async fn remove_comment(&self, id: &str, comment_id: &str) -> Result<Ack, ApiError> {
        let request = ApiRequest::delete(path(&format!("/idea/{id}/comment/{comment_id}")));
        self.acknowledge(request).await
    }

    /// `PATCH /ideas/status {ideaIds[], status}`
    pub async fn update_status(
        &self,
        idea_ids: Vec<String>,
        status: IdeaStatus,
    ) -> Result<Ack, ApiError> {
        let change = StatusChange { idea_ids, status };
        let request = ApiRequest::patch(path("/ideas/status")).json(to_json(&change)?);
        self.acknowledge(request).await
    }

    /// `GET /choices`; accepts both a bare array and a `{choices}` envelope.
    pub async fn list_choices(&self) -> Result<Vec<Choice>, ApiError> {
        Ok(match self.call::<ChoiceList>(ApiRequest::get(path("/choices"))).await? {
            ChoiceList::Wrapped { choices } | ChoiceList::Bare(choices) => choices,
        })
    }

    async fn call<T: DeserializeOwned>(&self, request: ApiRequest) -> Result<T, ApiError> {
        self.interceptor.send(request).await?.decode()
    }

    async fn acknowledge(&self, request: ApiRequest) -> Result<Ack, ApiError> {
        let response = self.interceptor.send(request).await?;
        if response.body.trim().is_empty() {
            return Ok(Ack::default());
        }
        response.decode()
    }
}

fn path(suffix: &str) -> String {
    format!("{BASE_PATH}{suffix}")
}

fn to_json<T: Serialize>(body: &T) -> Result<serde_json::Value, ApiError> {
    serde_json::to_value(body).map_err(|e| ApiError::Decode(e.to_string()))
}
