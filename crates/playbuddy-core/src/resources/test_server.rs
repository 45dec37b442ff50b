//! Loopback HTTP responder for resource tests.

use std::sync::{Arc, Mutex};

use axum::body::Bytes;
use axum::extract::State;
use axum::http::{header, Method, StatusCode, Uri};
use axum::response::IntoResponse;
use axum::Router;
use serde_json::{json, Value};
use tokio::net::TcpListener;

use crate::api::ApiClient;

#[derive(Debug, Clone)]
pub struct Recorded {
    pub method: String,
    /// Path plus query string
    pub target: String,
    pub body: Option<Value>,
}

#[derive(Debug, Clone)]
struct Route {
    method: String,
    target: String,
    status: u16,
    body: Value,
}

#[derive(Clone, Default)]
struct ServerState {
    routes: Arc<Mutex<Vec<Route>>>,
    requests: Arc<Mutex<Vec<Recorded>>>,
}

/// Answers requests from a fixed route table and records what it saw.
/// Unknown routes get a 404.
pub struct TestServer {
    base_url: String,
    state: ServerState,
}

impl TestServer {
    pub async fn start() -> Self {
        let state = ServerState::default();
        let app = Router::new().fallback(respond).with_state(state.clone());

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let base_url = format!("http://{}", listener.local_addr().unwrap());
        tokio::spawn(async move { axum::serve(listener, app).await });

        Self { base_url, state }
    }

    /// Respond to `method target` with `status` and a JSON body.
    pub fn route(&self, method: &str, target: &str, status: u16, body: Value) -> &Self {
        self.state.routes.lock().unwrap().push(Route {
            method: method.into(),
            target: target.into(),
            status,
            body,
        });
        self
    }

    pub fn api(&self) -> ApiClient {
        ApiClient::new(&self.base_url).unwrap()
    }

    pub fn requests(&self) -> Vec<Recorded> {
        self.state.requests.lock().unwrap().clone()
    }

    pub fn count(&self, method: &str, target: &str) -> usize {
        self.requests()
            .iter()
            .filter(|r| r.method == method && r.target == target)
            .count()
    }
}

async fn respond(State(state): State<ServerState>, method: Method, uri: Uri, body: Bytes) -> impl IntoResponse {
    let target = uri
        .path_and_query()
        .map(|p| p.as_str().to_string())
        .unwrap_or_else(|| uri.path().to_string());

    state.requests.lock().unwrap().push(Recorded {
        method: method.to_string(),
        target: target.clone(),
        body: serde_json::from_slice(&body).ok(),
    });

    let (status, payload) = state
        .routes
        .lock()
        .unwrap()
        .iter()
        .find(|r| r.method == method.as_str() && r.target == target)
        .map(|r| (r.status, r.body.clone()))
        .unwrap_or((404, json!({ "error": "no route" })));

    let status = StatusCode::from_u16(status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    (status, [(header::CONTENT_TYPE, "application/json")], payload.to_string())
}
