//! In-process stand-in for the SWAPI REST API, served by axum on an ephemeral port.

use axum::{
    Json, Router,
    extract::State,
    http::{StatusCode, Uri},
    response::{IntoResponse, Response},
};
use serde_json::{Value, json};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use crate::client::{HttpConfig, SwapiClient};

#[derive(Debug, Clone)]
enum Reply {
    Json(Value),
    Status(u16),
    Raw(String),
}

/// One step of a request's life on the server, in arrival order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Event {
    Started(String),
    Finished(String),
}

#[derive(Default)]
struct StubState {
    routes: Mutex<HashMap<String, Reply>>,
    latency: Mutex<Duration>,
    events: Mutex<Vec<Event>>,
    hits: AtomicUsize,
    in_flight: AtomicUsize,
    peak: AtomicUsize,
}

pub(crate) struct StubApi {
    base_url: String,
    state: Arc<StubState>,
    server: tokio::task::JoinHandle<()>,
}

impl StubApi {
    /// Bind to `127.0.0.1:0` and start serving. Unknown paths answer 404.
    pub async fn start() -> Self {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let state = Arc::new(StubState::default());

        let app = Router::new().fallback(serve).with_state(state.clone());
        let server = tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            base_url: format!("http://{}/api/", addr),
            state,
            server,
        }
    }

    /// Absolute URL for a path relative to the API root, e.g. `films/1/`.
    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    pub fn client(&self) -> SwapiClient {
        self.client_with(&HttpConfig::default())
    }

    pub fn client_with(&self, config: &HttpConfig) -> SwapiClient {
        SwapiClient::new(self.base_url.clone(), config).unwrap()
    }

    pub fn json(&self, path: &str, body: Value) {
        self.insert(path, Reply::Json(body));
    }

    pub fn status(&self, path: &str, code: u16) {
        self.insert(path, Reply::Status(code));
    }

    pub fn raw(&self, path: &str, body: &str) {
        self.insert(path, Reply::Raw(body.to_string()));
    }

    /// Hold every reply for `delay` before answering.
    pub fn latency(&self, delay: Duration) {
        *self.state.latency.lock().unwrap() = delay;
    }

    /// Serve a person with no relations at `people/<id>/`.
    pub fn person(&self, id: u32, name: &str) -> Value {
        let body = json!({
            "name": name,
            "height": "172",
            "mass": "77",
            "hair_color": "blond",
            "skin_color": "fair",
            "eye_color": "blue",
            "birth_year": "19BBY",
            "gender": "male",
            "homeworld": null,
            "films": [],
            "species": [],
            "starships": [],
            "vehicles": [],
            "url": self.url(&format!("people/{}/", id)),
        });
        self.json(&format!("people/{}/", id), body.clone());
        body
    }

    /// Total requests served so far.
    pub fn hits(&self) -> usize {
        self.state.hits.load(Ordering::SeqCst)
    }

    /// Most requests the server was handling at the same moment.
    pub fn peak_in_flight(&self) -> usize {
        self.state.peak.load(Ordering::SeqCst)
    }

    pub fn events(&self) -> Vec<Event> {
        self.state.events.lock().unwrap().clone()
    }

    fn insert(&self, path: &str, reply: Reply) {
        let key = format!("/api/{}", path.trim_start_matches('/'));
        self.state.routes.lock().unwrap().insert(key, reply);
    }
}

impl Drop for StubApi {
    fn drop(&mut self) {
        self.server.abort();
    }
}

async fn serve(State(state): State<Arc<StubState>>, uri: Uri) -> Response {
    let path = uri.path().to_string();
    state.hits.fetch_add(1, Ordering::SeqCst);
    state.events.lock().unwrap().push(Event::Started(path.clone()));
    let now = state.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
    state.peak.fetch_max(now, Ordering::SeqCst);

    let delay = *state.latency.lock().unwrap();
    if !delay.is_zero() {
        tokio::time::sleep(delay).await;
    }

    let reply = state.routes.lock().unwrap().get(&path).cloned();
    let response = match reply {
        Some(Reply::Json(body)) => Json(body).into_response(),
        Some(Reply::Status(code)) => StatusCode::from_u16(code).unwrap().into_response(),
        Some(Reply::Raw(body)) => (StatusCode::OK, body).into_response(),
        None => (StatusCode::NOT_FOUND, Json(json!({ "detail": "Not found" }))).into_response(),
    };

    state.in_flight.fetch_sub(1, Ordering::SeqCst);
    state.events.lock().unwrap().push(Event::Finished(path));
    response
}
