//! Stub versions of the external services the app talks to.
//!
//! A single stub server hosts the catalog token endpoint, the catalog search
//! endpoint, the chat completions endpoint and the TTS endpoint, so a test
//! only has to spawn one extra process-local server. Behavior is configured
//! up front through [`StubBehavior`] and observed afterwards through the
//! recording accessors on [`StubServer`].

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use axum::extract::{Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Deserialize;
use serde_json::{json, Value};
use tokio::net::TcpListener;
use tokio::sync::oneshot;

use super::constants::STUB_ACCESS_TOKEN;

/// A track the stub search endpoint can return.
#[derive(Clone)]
pub struct StubTrack {
    pub id: String,
    pub name: String,
    pub has_image: bool,
}

impl StubTrack {
    pub fn new(id: &str, name: &str) -> Self {
        Self {
            id: id.to_string(),
            name: name.to_string(),
            has_image: true,
        }
    }

    pub fn without_image(id: &str, name: &str) -> Self {
        Self {
            id: id.to_string(),
            name: name.to_string(),
            has_image: false,
        }
    }

    fn to_json(&self) -> Value {
        let mut item = json!({
            "id": self.id,
            "name": self.name,
            "artists": [{ "name": "Stub Artist" }],
            "external_urls": { "spotify": format!("https://open.example.com/track/{}", self.id) },
        });
        if self.has_image {
            item["album"] = json!({
                "images": [{ "url": format!("https://img.example.com/{}.jpg", self.id) }],
            });
        }
        item
    }
}

/// Configured behavior of the stub services.
pub struct StubBehavior {
    /// Completion text the chat endpoint returns.
    pub completion: String,
    /// When true the chat endpoint returns 500.
    pub chat_fails: bool,
    /// When true the token endpoint returns 400.
    pub token_fails: bool,
    /// Tracks returned for each search query. Queries not in the map return
    /// an empty result page.
    pub tracks: HashMap<String, Vec<StubTrack>>,
    /// Queries for which the search endpoint returns 500.
    pub failing_queries: HashSet<String>,
}

impl Default for StubBehavior {
    fn default() -> Self {
        Self {
            completion: super::constants::DEFAULT_COMPLETION.to_string(),
            chat_fails: false,
            token_fails: false,
            tracks: HashMap::new(),
            failing_queries: HashSet::new(),
        }
    }
}

impl StubBehavior {
    pub fn with_completion(mut self, completion: &str) -> Self {
        self.completion = completion.to_string();
        self
    }

    pub fn with_tracks(mut self, query: &str, tracks: Vec<StubTrack>) -> Self {
        self.tracks.insert(query.to_string(), tracks);
        self
    }

    pub fn with_failing_query(mut self, query: &str) -> Self {
        self.failing_queries.insert(query.to_string());
        self
    }

    pub fn with_failing_chat(mut self) -> Self {
        self.chat_fails = true;
        self
    }

    pub fn with_failing_token(mut self) -> Self {
        self.token_fails = true;
        self
    }
}

struct StubStateInner {
    behavior: StubBehavior,
    token_requests: AtomicUsize,
    search_queries: Mutex<Vec<String>>,
    tts_requests: AtomicUsize,
}

#[derive(Clone)]
struct StubState(Arc<StubStateInner>);

/// A running stub services server.
pub struct StubServer {
    pub base_url: String,
    state: StubState,
    shutdown_tx: Option<oneshot::Sender<()>>,
}

impl StubServer {
    pub async fn spawn(behavior: StubBehavior) -> Self {
        let state = StubState(Arc::new(StubStateInner {
            behavior,
            token_requests: AtomicUsize::new(0),
            search_queries: Mutex::new(Vec::new()),
            tts_requests: AtomicUsize::new(0),
        }));
        let app = Router::new()
            .route("/api/token", post(token_handler))
            .route("/search", get(search_handler))
            .route("/chat/completions", post(chat_handler))
            .route("/audio/speech", post(speech_handler))
            .with_state(state.clone());

        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind stub services listener");
        let port = listener
            .local_addr()
            .expect("Failed to read stub listener address")
            .port();
        let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();
        tokio::spawn(async move {
            axum::serve(listener, app)
                .with_graceful_shutdown(async {
                    let _ = shutdown_rx.await;
                })
                .await
                .expect("Stub services server failed");
        });

        Self {
            base_url: format!("http://127.0.0.1:{port}"),
            state,
            shutdown_tx: Some(shutdown_tx),
        }
    }

    /// How many token exchanges the catalog client performed.
    pub fn token_requests(&self) -> usize {
        self.state.0.token_requests.load(Ordering::SeqCst)
    }

    /// The search queries received, in order.
    pub fn search_queries(&self) -> Vec<String> {
        self.state
            .0
            .search_queries
            .lock()
            .expect("search queries lock poisoned")
            .clone()
    }

    /// How many speech syntheses were requested.
    pub fn tts_requests(&self) -> usize {
        self.state.0.tts_requests.load(Ordering::SeqCst)
    }
}

impl Drop for StubServer {
    fn drop(&mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
    }
}

async fn token_handler(State(state): State<StubState>, headers: HeaderMap) -> impl IntoResponse {
    let has_basic_auth = headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .map(|v| v.starts_with("Basic "))
        .unwrap_or(false);
    if !has_basic_auth {
        return (
            StatusCode::UNAUTHORIZED,
            Json(json!({ "error": "missing_credentials" })),
        );
    }
    if state.0.behavior.token_fails {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({ "error": "invalid_client" })),
        );
    }
    state.0.token_requests.fetch_add(1, Ordering::SeqCst);
    (
        StatusCode::OK,
        Json(json!({
            "access_token": STUB_ACCESS_TOKEN,
            "token_type": "Bearer",
            "expires_in": 3600,
        })),
    )
}

#[derive(Deserialize)]
struct SearchParams {
    q: String,
    #[serde(default)]
    limit: Option<usize>,
}

async fn search_handler(
    State(state): State<StubState>,
    Query(params): Query<SearchParams>,
) -> impl IntoResponse {
    state
        .0
        .search_queries
        .lock()
        .expect("search queries lock poisoned")
        .push(params.q.clone());
    if state.0.behavior.failing_queries.contains(&params.q) {
        return (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({ "error": "search unavailable" })),
        );
    }
    let limit = params.limit.unwrap_or(20);
    let items: Vec<Value> = state
        .0
        .behavior
        .tracks
        .get(&params.q)
        .map(|tracks| tracks.iter().take(limit).map(StubTrack::to_json).collect())
        .unwrap_or_default();
    (
        StatusCode::OK,
        Json(json!({ "tracks": { "items": items } })),
    )
}

async fn chat_handler(State(state): State<StubState>) -> impl IntoResponse {
    if state.0.behavior.chat_fails {
        return (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({ "error": "model unavailable" })),
        );
    }
    (
        StatusCode::OK,
        Json(json!({
            "choices": [{
                "message": {
                    "role": "assistant",
                    "content": state.0.behavior.completion,
                },
                "finish_reason": "stop",
            }],
        })),
    )
}

async fn speech_handler(State(state): State<StubState>) -> impl IntoResponse {
    state.0.tts_requests.fetch_add(1, Ordering::SeqCst);
    // A few bytes standing in for an mp3 stream.
    ([("content-type", "audio/mpeg")], vec![0xFFu8, 0xF3, 0x18, 0xC4])
}
