//! In-process stand-in for the local DraftWolf app.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::{json, Value};

#[derive(Default)]
pub struct StubState {
    pub logged_in: bool,
    pub username: Option<String>,
    /// Casing the stub uses for the auth flag, to mirror both app releases.
    pub snake_case_auth: bool,
    /// Registered project root, if any.
    pub root: Option<String>,
    pub versions: Vec<Value>,
    pub next_version: u32,
    pub find_root_hits: AtomicUsize,
}

#[derive(Clone)]
pub struct StubApp(pub Arc<Mutex<StubState>>);

pub struct StubGuard {
    pub port: u16,
    pub state: StubApp,
}

/// Spawn the stub on an ephemeral port and return its handle.
pub async fn spawn_stub() -> StubGuard {
    let state = StubApp(Arc::new(Mutex::new(StubState {
        next_version: 1,
        ..StubState::default()
    })));

    let app = Router::new()
        .route("/health", get(health))
        .route("/auth/status", get(auth_status))
        .route("/draft/find-root", post(find_root))
        .route("/draft/init", post(init))
        .route("/draft/history", post(history))
        .route("/draft/commit", post(commit))
        .route("/draft/restore", post(restore))
        .route("/draft/rename-version", post(rename_version))
        .with_state(state.clone());

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind stub listener");
    let port = listener.local_addr().expect("stub addr").port();
    tokio::spawn(async move {
        axum::serve(listener, app).await.expect("serve stub");
    });

    StubGuard { port, state }
}

impl StubGuard {
    pub fn log_in(&self, username: &str) {
        let mut state = self.state.0.lock().unwrap();
        state.logged_in = true;
        state.username = Some(username.to_string());
    }

    pub fn use_snake_case_auth(&self) {
        self.state.0.lock().unwrap().snake_case_auth = true;
    }

    pub fn find_root_hits(&self) -> usize {
        self.state.0.lock().unwrap().find_root_hits.load(Ordering::SeqCst)
    }

    pub fn version_label(&self, id: &str) -> Option<String> {
        let state = self.state.0.lock().unwrap();
        state
            .versions
            .iter()
            .find(|v| v["id"] == id)
            .and_then(|v| v["label"].as_str().map(str::to_string))
    }
}

async fn health() -> Json<Value> {
    Json(json!({"success": true}))
}

async fn auth_status(State(app): State<StubApp>) -> Json<Value> {
    let state = app.0.lock().unwrap();
    let flag_key = if state.snake_case_auth {
        "logged_in"
    } else {
        "loggedIn"
    };
    let mut body = serde_json::Map::new();
    body.insert(flag_key.to_string(), Value::Bool(state.logged_in));
    body.insert(
        "username".to_string(),
        state
            .username
            .clone()
            .map(Value::String)
            .unwrap_or(Value::Null),
    );
    Json(Value::Object(body))
}

async fn find_root(State(app): State<StubApp>, Json(body): Json<Value>) -> Json<Value> {
    let state = app.0.lock().unwrap();
    state.find_root_hits.fetch_add(1, Ordering::SeqCst);
    let path = body["path"].as_str().unwrap_or_default();
    match &state.root {
        Some(root) if path.starts_with(root.as_str()) => {
            Json(json!({"success": true, "root": root}))
        }
        _ => Json(json!({"success": false, "error": "No project root found"})),
    }
}

async fn init(State(app): State<StubApp>, Json(body): Json<Value>) -> Json<Value> {
    let mut state = app.0.lock().unwrap();
    let root = body["projectRoot"].as_str().unwrap_or_default().to_string();
    if root.is_empty() {
        return Json(json!({"success": false, "error": "projectRoot required"}));
    }
    state.root = Some(root);
    Json(json!({"success": true}))
}

async fn history(State(app): State<StubApp>, Json(body): Json<Value>) -> Json<Value> {
    let state = app.0.lock().unwrap();
    if state.root.as_deref() != body["projectRoot"].as_str() {
        return Json(json!({"success": false, "error": "Unknown project"}));
    }
    Json(Value::Array(state.versions.clone()))
}

async fn commit(State(app): State<StubApp>, Json(body): Json<Value>) -> Json<Value> {
    let mut state = app.0.lock().unwrap();
    if state.root.as_deref() != body["projectRoot"].as_str() {
        return Json(json!({"success": false, "error": "Unknown project"}));
    }
    let number = state.next_version;
    state.next_version += 1;

    let files: HashMap<String, Value> = body["files"]
        .as_array()
        .map(|entries| {
            entries
                .iter()
                .filter_map(|f| f.as_str())
                .map(|f| (f.to_string(), json!({})))
                .collect()
        })
        .unwrap_or_default();

    state.versions.push(json!({
        "id": format!("ver-{number}"),
        "versionNumber": number.to_string(),
        "label": body["label"],
        "timestamp": "2024-05-01T10:00:00Z",
        "files": files,
    }));
    Json(json!({"success": true, "versionNumber": number.to_string()}))
}

async fn restore(State(app): State<StubApp>, Json(body): Json<Value>) -> Json<Value> {
    let state = app.0.lock().unwrap();
    let id = body["versionId"].as_str().unwrap_or_default();
    if state.versions.iter().any(|v| v["id"] == id) {
        Json(json!({"success": true}))
    } else {
        Json(json!({"success": false, "error": "Version not found"}))
    }
}

// Answers with a structured JSON body on a non-2xx status for unknown ids,
// mirroring the app's behavior there.
async fn rename_version(
    State(app): State<StubApp>,
    Json(body): Json<Value>,
) -> (StatusCode, Json<Value>) {
    let mut state = app.0.lock().unwrap();
    let id = body["versionId"].as_str().unwrap_or_default().to_string();
    let new_label = body["newLabel"].clone();
    match state.versions.iter_mut().find(|v| v["id"] == id.as_str()) {
        Some(version) => {
            version["label"] = new_label;
            (StatusCode::OK, Json(json!({"success": true})))
        }
        None => (
            StatusCode::NOT_FOUND,
            Json(json!({"success": false, "error": "Version not found"})),
        ),
    }
}
