//! A throwaway IdeaBox backend served over real HTTP on `127.0.0.1:0`.
//!
//! Tokens are genuine HS256 JWTs checked on every `/ideabox` route, so the
//! client's expiry handling and 401 recovery run against actual responses.
//! `reject_next(n)` forces the next `n` protected requests to answer 401.

#![allow(dead_code)]

use std::sync::atomic::{AtomicI64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::extract::{Path, Query, State};
use axum::http::header::AUTHORIZATION;
use axum::http::{HeaderMap, StatusCode};
use axum::routing::{get, patch, post};
use axum::{Json, Router};
use chrono::Utc;
use ideabox_client::config::ClientConfig;
use ideabox_client::IdeaBoxClient;
use ideabox_core::idea::{Idea, IdeaStatus, Vote};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tempfile::TempDir;

const SECRET: &[u8] = b"integration-secret";

type Reply = Result<Json<Value>, (StatusCode, Json<Value>)>;

#[derive(Debug, Serialize, Deserialize)]
struct Claims {
    name: String,
    sub: String,
    iat: i64,
    exp: i64,
}

#[derive(Debug, Deserialize)]
struct ListParams {
    search: Option<String>,
    favourite: Option<String>,
}

// ---------------------------------------------------------------------------
// Backend state
// ---------------------------------------------------------------------------

pub struct MockState {
    ideas: Mutex<Vec<Idea>>,
    calls: Mutex<Vec<String>>,
    logins: AtomicUsize,
    forced_rejections: AtomicUsize,
    token_ttl_secs: AtomicI64,
}

impl MockState {
    fn new(ideas: Vec<Idea>) -> Self {
        Self {
            ideas: Mutex::new(ideas),
            calls: Mutex::new(Vec::new()),
            logins: AtomicUsize::new(0),
            forced_rejections: AtomicUsize::new(0),
            token_ttl_secs: AtomicI64::new(3600),
        }
    }

    /// Answer the next `n` protected requests with 401.
    pub fn reject_next(&self, n: usize) {
        self.forced_rejections.store(n, Ordering::SeqCst);
    }

    /// Lifetime of tokens issued from now on (negative issues expired ones).
    pub fn set_token_ttl(&self, secs: i64) {
        self.token_ttl_secs.store(secs, Ordering::SeqCst);
    }

    pub fn logins(&self) -> usize {
        self.logins.load(Ordering::SeqCst)
    }

    /// `"METHOD /path"` of every protected request received.
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().expect("lock").clone()
    }

    pub fn count(&self, call: &str) -> usize {
        self.calls().iter().filter(|c| *c == call).count()
    }

    pub fn idea(&self, id: &str) -> Option<Idea> {
        let ideas = self.ideas.lock().expect("lock");
        ideas.iter().find(|idea| idea.id == id).cloned()
    }

    fn issue(&self, name: &str) -> String {
        let now = Utc::now().timestamp();
        let claims = Claims {
            name: name.to_string(),
            sub: name.to_string(),
            iat: now,
            exp: now + self.token_ttl_secs.load(Ordering::SeqCst),
        };
        encode(&Header::default(), &claims, &EncodingKey::from_secret(SECRET))
            .expect("token encoding should succeed")
    }

    /// Record the call and resolve the caller from the bearer token.
    fn authorize(
        &self,
        call: String,
        headers: &HeaderMap,
    ) -> Result<String, (StatusCode, Json<Value>)> {
        self.calls.lock().expect("lock").push(call);

        let forced = self
            .forced_rejections
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if forced {
            return Err(unauthorized());
        }

        let token = headers
            .get(AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.strip_prefix("Bearer "))
            .ok_or_else(unauthorized)?;
        let mut validation = Validation::default();
        validation.leeway = 0;
        decode::<Claims>(token, &DecodingKey::from_secret(SECRET), &validation)
            .map(|data| data.claims.name)
            .map_err(|_| unauthorized())
    }
}

fn unauthorized() -> (StatusCode, Json<Value>) {
    (
        StatusCode::UNAUTHORIZED,
        Json(json!({ "message": "Unauthorized" })),
    )
}

fn not_found() -> (StatusCode, Json<Value>) {
    (
        StatusCode::NOT_FOUND,
        Json(json!({ "message": "Idea not found" })),
    )
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

async fn login(State(state): State<Arc<MockState>>, Json(body): Json<Value>) -> Reply {
    state.logins.fetch_add(1, Ordering::SeqCst);
    match body["name"].as_str().map(str::trim) {
        Some(name) if !name.is_empty() => Ok(Json(json!({ "token": state.issue(name) }))),
        _ => Err((
            StatusCode::BAD_REQUEST,
            Json(json!({ "message": "Name is required" })),
        )),
    }
}

async fn list_ideas(
    State(state): State<Arc<MockState>>,
    headers: HeaderMap,
    Query(params): Query<ListParams>,
) -> Reply {
    let caller = state.authorize("GET /ideabox/ideas".into(), &headers)?;
    let favourite = params.favourite.as_deref() == Some("true");
    let search = params.search.unwrap_or_default().to_lowercase();

    let ideas = state.ideas.lock().expect("lock");
    let listed: Vec<&Idea> = ideas
        .iter()
        .filter(|idea| !favourite || idea.has_vote_from(&caller))
        .filter(|idea| search.is_empty() || idea.title.to_lowercase().contains(&search))
        .collect();
    Ok(Json(json!({ "ideas": listed })))
}

async fn get_idea(
    State(state): State<Arc<MockState>>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Reply {
    state.authorize(format!("GET /ideabox/idea/{id}"), &headers)?;
    let idea = state.idea(&id).ok_or_else(not_found)?;
    Ok(Json(json!(idea)))
}

async fn create_idea(
    State(state): State<Arc<MockState>>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Reply {
    let caller = state.authorize("POST /ideabox/idea".into(), &headers)?;
    let mut ideas = state.ideas.lock().expect("lock");
    let title = body["title"].as_str().unwrap_or_default();
    let mut idea = idea(&format!("i{}", ideas.len() + 1), title, &[]);
    idea.description = body["description"].as_str().map(str::to_string);
    idea.created_by = caller.clone();
    idea.modified_by = caller;
    ideas.push(idea.clone());
    Ok(Json(json!(idea)))
}

async fn vote(
    State(state): State<Arc<MockState>>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Reply {
    let caller = state.authorize(format!("PATCH /ideabox/idea/{id}/vote"), &headers)?;
    let mut ideas = state.ideas.lock().expect("lock");
    let idea = ideas.iter_mut().find(|idea| idea.id == id).ok_or_else(not_found)?;
    if !idea.has_vote_from(&caller) {
        idea.votes.push(Vote {
            id: format!("{id}-{caller}"),
            created_by: caller,
            created_at: Utc::now(),
        });
        idea.vote_count = idea.votes.len() as u32;
    }
    Ok(Json(json!(idea)))
}

async fn unvote(
    State(state): State<Arc<MockState>>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Reply {
    let caller = state.authorize(format!("PATCH /ideabox/idea/{id}/unvote"), &headers)?;
    let mut ideas = state.ideas.lock().expect("lock");
    let idea = ideas.iter_mut().find(|idea| idea.id == id).ok_or_else(not_found)?;
    idea.votes.retain(|vote| vote.created_by != caller);
    idea.vote_count = idea.votes.len() as u32;
    Ok(Json(json!(idea)))
}

async fn update_status(
    State(state): State<Arc<MockState>>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Reply {
    state.authorize("PATCH /ideabox/ideas/status".into(), &headers)?;
    let status: IdeaStatus = serde_json::from_value(body["status"].clone()).map_err(|_| {
        (
            StatusCode::BAD_REQUEST,
            Json(json!({ "message": "Invalid status" })),
        )
    })?;
    let ids: Vec<String> = serde_json::from_value(body["ideaIds"].clone()).unwrap_or_default();

    let mut ideas = state.ideas.lock().expect("lock");
    for idea in ideas.iter_mut().filter(|idea| ids.contains(&idea.id)) {
        idea.status = status;
    }
    Ok(Json(json!({ "message": format!("{} ideas updated", ids.len()) })))
}

async fn choices(State(state): State<Arc<MockState>>, headers: HeaderMap) -> Reply {
    state.authorize("GET /ideabox/choices".into(), &headers)?;
    Ok(Json(json!([
        { "_id": "c1", "field": "status", "code": "new", "displayName": "New", "isSelectable": false },
        { "_id": "c2", "field": "status", "code": "shortlist", "displayName": "Shortlist", "isSelectable": true },
        { "_id": "c3", "field": "status", "code": "selected", "displayName": "Selected", "isSelectable": true }
    ])))
}

// ---------------------------------------------------------------------------
// Harness
// ---------------------------------------------------------------------------

/// An idea created by `alice` with one vote per entry in `voters`.
pub fn idea(id: &str, title: &str, voters: &[&str]) -> Idea {
    let now = Utc::now();
    Idea {
        id: id.to_string(),
        title: title.to_string(),
        description: None,
        status: IdeaStatus::New,
        vote_count: voters.len() as u32,
        votes: voters
            .iter()
            .map(|voter| Vote {
                id: format!("{id}-{voter}"),
                created_by: voter.to_string(),
                created_at: now,
            })
            .collect(),
        comments: Vec::new(),
        history: None,
        created_by: "alice".to_string(),
        created_at: now,
        modified_by: "alice".to_string(),
        modified_at: now,
    }
}

/// A running mock backend plus a storage directory for clients.
pub struct TestBackend {
    pub state: Arc<MockState>,
    pub base_url: String,
    pub dir: TempDir,
}

impl TestBackend {
    pub async fn start(ideas: Vec<Idea>) -> Self {
        let state = Arc::new(MockState::new(ideas));
        let app = Router::new()
            .route("/auth/login", post(login))
            .route("/ideabox/ideas", get(list_ideas))
            .route("/ideabox/ideas/status", patch(update_status))
            .route("/ideabox/idea", post(create_idea))
            .route("/ideabox/idea/{id}", get(get_idea))
            .route("/ideabox/idea/{id}/vote", patch(vote))
            .route("/ideabox/idea/{id}/unvote", patch(unvote))
            .route("/ideabox/choices", get(choices))
            .with_state(state.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind test listener");
        let addr = listener.local_addr().expect("listener address");
        tokio::spawn(async move {
            axum::serve(listener, app).await.expect("mock backend crashed");
        });

        Self {
            state,
            base_url: format!("http://{addr}"),
            dir: TempDir::new().expect("temp dir"),
        }
    }

    pub fn config(&self) -> ClientConfig {
        ClientConfig {
            backend_url: self.base_url.clone(),
            storage_path: self.dir.path().join("storage.json"),
            request_timeout: Duration::from_secs(5),
        }
    }

    /// A client process over this backend; clients share the storage file.
    pub fn client(&self) -> IdeaBoxClient {
        IdeaBoxClient::connect(&self.config()).expect("client should start")
    }
}
