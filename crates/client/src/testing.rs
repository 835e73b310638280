//! Test doubles shared by the unit tests of this crate.

use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use ideabox_core::claims;
use ideabox_core::idea::{Comment, Idea, IdeaStatus, Vote};
use jsonwebtoken::{encode, EncodingKey, Header};
use reqwest::{Method, StatusCode};
use serde_json::json;

use crate::error::TransportError;
use crate::transport::{ApiRequest, ApiResponse, HttpTransport};

/// Mint an HS256 token for `name` expiring `ttl_secs` from now.
pub fn mint_token(name: &str, ttl_secs: i64) -> String {
    let now = Utc::now().timestamp();
    encode(
        &Header::default(),
        &json!({ "name": name, "sub": name, "iat": now, "exp": now + ttl_secs }),
        &EncodingKey::from_secret(b"test-secret"),
    )
    .expect("encoding should succeed")
}

// ---------------------------------------------------------------------------
// ScriptedTransport
// ---------------------------------------------------------------------------

/// Replays a fixed list of responses in order and records every request.
pub struct ScriptedTransport {
    responses: Mutex<VecDeque<ApiResponse>>,
    requests: Mutex<Vec<ApiRequest>>,
}

impl ScriptedTransport {
    pub fn queue(responses: Vec<ApiResponse>) -> Self {
        Self {
            responses: Mutex::new(responses.into()),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn requests(&self) -> Vec<ApiRequest> {
        self.requests.lock().expect("lock").clone()
    }
}

#[async_trait]
impl HttpTransport for ScriptedTransport {
    async fn execute(&self, request: ApiRequest) -> Result<ApiResponse, TransportError> {
        self.requests.lock().expect("lock").push(request);
        Ok(self
            .responses
            .lock()
            .expect("lock")
            .pop_front()
            .expect("scripted transport ran out of responses"))
    }
}

// ---------------------------------------------------------------------------
// FakeBackend
// ---------------------------------------------------------------------------

pub fn at(secs: i64) -> chrono::DateTime<Utc> {
    Utc.timestamp_opt(secs, 0).single().expect("valid timestamp")
}

/// An idea created by `alice` with one vote per entry in `voters`.
pub fn idea_fixture(id: &str, title: &str, voters: &[&str]) -> Idea {
    Idea {
        id: id.to_string(),
        title: title.to_string(),
        description: None,
        status: IdeaStatus::New,
        vote_count: voters.len() as u32,
        votes: voters
            .iter()
            .enumerate()
            .map(|(n, voter)| Vote {
                id: format!("{id}-v{n}"),
                created_by: voter.to_string(),
                created_at: at(100 + n as i64),
            })
            .collect(),
        comments: Vec::new(),
        history: None,
        created_by: "alice".to_string(),
        created_at: at(0),
        modified_by: "alice".to_string(),
        modified_at: at(0),
    }
}

#[derive(Default)]
struct FakeState {
    ideas: Vec<Idea>,
    next_id: u64,
    clock: i64,
    failures: VecDeque<ApiResponse>,
}

/// A small in-memory IdeaBox backend.
///
/// Votes are keyed by the identity in the bearer token, so uniqueness is
/// enforced server-side as the real backend does. Queued failures are
/// returned (and consumed) before any routing happens.
#[derive(Default)]
pub struct FakeBackend {
    state: Mutex<FakeState>,
    requests: Mutex<Vec<ApiRequest>>,
}

impl FakeBackend {
    pub fn with_ideas(ideas: Vec<Idea>) -> Self {
        let backend = Self::default();
        backend.state.lock().expect("lock").ideas = ideas;
        backend
    }

    /// The next request answers `status` with `message`.
    pub fn fail_next(&self, status: StatusCode, message: &str) {
        self.state
            .lock()
            .expect("lock")
            .failures
            .push_back(ApiResponse::json(status, &json!({ "message": message })));
    }

    pub fn requests(&self) -> Vec<ApiRequest> {
        self.requests.lock().expect("lock").clone()
    }

    pub fn count(&self, method: Method, path: &str) -> usize {
        self.requests()
            .iter()
            .filter(|r| r.method == method && r.path == path)
            .count()
    }

    pub fn idea(&self, id: &str) -> Option<Idea> {
        let state = self.state.lock().expect("lock");
        state.ideas.iter().find(|idea| idea.id == id).cloned()
    }

    fn route(&self, request: &ApiRequest) -> ApiResponse {
        let mut state = self.state.lock().expect("lock");
        if let Some(failure) = state.failures.pop_front() {
            return failure;
        }
        state.clock += 1;
        let now = at(1_000 + state.clock);
        let caller = request.bearer().and_then(claims::decode_identity);

        let segments: Vec<&str> = request.path.trim_start_matches('/').split('/').collect();
        let method = request.method.clone();

        match (method, segments.as_slice()) {
            (Method::POST, ["auth", "login"]) => {
                let name = request
                    .body
                    .as_ref()
                    .and_then(|b| b.get("name"))
                    .and_then(|n| n.as_str())
                    .unwrap_or_default();
                ok(json!({ "token": mint_token(name, 3600) }))
            }
            (Method::GET, ["ideabox", "choices"]) => ok(json!({
                "choices": [
                    { "_id": "c1", "field": "status", "code": "new", "displayName": "New", "isSelectable": false },
                    { "_id": "c2", "field": "status", "code": "shortlist", "displayName": "Shortlist", "isSelectable": true }
                ]
            })),
            (Method::GET, ["ideabox", "ideas"]) => {
                let param = |key: &str| {
                    request
                        .query
                        .iter()
                        .find(|(k, _)| k == key)
                        .map(|(_, v)| v.clone())
                };
                let favourite = param("favourite").as_deref() == Some("true");
                let search = param("search").unwrap_or_default().to_lowercase();
                let ideas: Vec<&Idea> = state
                    .ideas
                    .iter()
                    .filter(|idea| !favourite || caller.as_deref().is_some_and(|c| idea.has_vote_from(c)))
                    .filter(|idea| search.is_empty() || idea.title.to_lowercase().contains(&search))
                    .collect();
                ok(json!({ "ideas": ideas }))
            }
            (Method::POST, ["ideabox", "idea"]) => {
                state.next_id += 1;
                let id = format!("new-{}", state.next_id);
                let body = request.body.clone().unwrap_or_default();
                let mut idea = idea_fixture(&id, body["title"].as_str().unwrap_or_default(), &[]);
                idea.description = body["description"].as_str().map(str::to_string);
                idea.created_by = caller.unwrap_or_default();
                idea.created_at = now;
                state.ideas.push(idea.clone());
                ok(json!(idea))
            }
            (Method::PATCH, ["ideabox", "ideas", "status"]) => {
                let body = request.body.clone().unwrap_or_default();
                let status: IdeaStatus =
                    serde_json::from_value(body["status"].clone()).expect("valid status");
                let ids: Vec<String> =
                    serde_json::from_value(body["ideaIds"].clone()).expect("id list");
                for idea in state.ideas.iter_mut().filter(|i| ids.contains(&i.id)) {
                    idea.status = status;
                }
                ok(json!({ "message": "Status updated" }))
            }
            (method, ["ideabox", "idea", id, rest @ ..]) => {
                let id = id.to_string();
                let Some(index) = state.ideas.iter().position(|i| i.id == id) else {
                    return ApiResponse::json(
                        StatusCode::NOT_FOUND,
                        &json!({ "message": "Idea not found" }),
                    );
                };
                match (method, rest) {
                    (Method::GET, []) => ok(json!(state.ideas[index])),
                    (Method::PATCH, []) => {
                        let body = request.body.clone().unwrap_or_default();
                        let idea = &mut state.ideas[index];
                        if let Some(title) = body["title"].as_str() {
                            idea.title = title.to_string();
                        }
                        if let Some(description) = body.get("description") {
                            idea.description = description.as_str().map(str::to_string);
                        }
                        idea.modified_at = now;
                        ok(json!(idea))
                    }
                    (Method::DELETE, []) => {
                        state.ideas.remove(index);
                        ok(json!({ "message": "Idea removed" }))
                    }
                    (Method::PATCH, ["vote"]) => {
                        let Some(voter) = caller else {
                            return unauthorized();
                        };
                        let idea = &mut state.ideas[index];
                        if !idea.has_vote_from(&voter) {
                            idea.votes.push(Vote {
                                id: format!("{id}-v{}", idea.votes.len() + 100),
                                created_by: voter,
                                created_at: now,
                            });
                            idea.vote_count = idea.votes.len() as u32;
                        }
                        ok(json!(idea))
                    }
                    (Method::PATCH, ["unvote"]) => {
                        let Some(voter) = caller else {
                            return unauthorized();
                        };
                        let idea = &mut state.ideas[index];
                        idea.votes.retain(|v| v.created_by != voter);
                        idea.vote_count = idea.votes.len() as u32;
                        ok(json!(idea))
                    }
                    (Method::POST, ["comment"]) => {
                        let text = request
                            .body
                            .as_ref()
                            .and_then(|b| b["text"].as_str())
                            .unwrap_or_default()
                            .to_string();
                        let idea = &mut state.ideas[index];
                        idea.comments.push(Comment {
                            id: format!("{id}-c{}", idea.comments.len()),
                            text,
                            created_by: caller.unwrap_or_default(),
                            created_at: now,
                        });
                        ok(json!(idea))
                    }
                    (Method::DELETE, ["comment", comment_id]) => {
                        state.ideas[index].comments.retain(|c| c.id != *comment_id);
                        ok(json!({ "message": "Comment removed" }))
                    }
                    _ => not_found(),
                }
            }
            _ => not_found(),
        }
    }
}

fn ok(body: serde_json::Value) -> ApiResponse {
    ApiResponse::json(StatusCode::OK, &body)
}

fn unauthorized() -> ApiResponse {
    ApiResponse::json(StatusCode::UNAUTHORIZED, &json!({ "message": "Unauthorized" }))
}

fn not_found() -> ApiResponse {
    ApiResponse::json(StatusCode::NOT_FOUND, &json!({ "message": "No such route" }))
}

#[async_trait]
impl HttpTransport for FakeBackend {
    async fn execute(&self, request: ApiRequest) -> Result<ApiResponse, TransportError> {
        let response = self.route(&request);
        self.requests.lock().expect("lock").push(request);
        Ok(response)
    }
}
