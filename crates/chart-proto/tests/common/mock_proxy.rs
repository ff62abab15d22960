#![allow(dead_code)]

//! Local stand-ins for the cross-origin intermediaries.
//!
//! Routes:
//!   /status/:code   -> empty body with that status (transport-level failure)
//!   /garbage        -> 200 with an HTML body (parse failure)
//!   /get?url=...    -> enveloping `{ "contents": "<feed json>" }`
//!   /raw/*target    -> transparent feed json
//!   /slow           -> transparent feed json after `SLOW_DELAY`
//!
//! Every request is recorded in `hits` in arrival order.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::Router;
use chart_proto::proxy::ProxyEndpoint;

pub const TARGET: &str = "https://charts.test/api/v2/us/music/most-played/50/albums.json";
pub const SLOW_DELAY: Duration = Duration::from_secs(3);

pub const FEED_JSON: &str = r#"{
  "feed": {
    "title": "Top Albums",
    "results": [
      {"id": "a1", "name": "First", "artistName": "One", "artworkUrl100": "https://img/a1/100x100bb.jpg",
       "genres": [{"genreId": "14", "name": "Pop"}, {"genreId": "34", "name": "Music"}], "url": "https://music/a1"},
      {"id": "a2", "name": "Second", "artistName": "Two", "artworkUrl100": "https://img/a2/100x100bb.jpg",
       "genres": [{"name": "Rock"}, {"name": "Music"}], "url": "https://music/a2"},
      {"id": "a3", "name": "Third", "artistName": "Three", "artworkUrl100": "https://img/a3/100x100bb.jpg",
       "genres": [{"name": "Pop"}, {"name": "Latin"}, {"name": "Pop"}], "url": "https://music/a3"}
    ]
  }
}"#;

#[derive(Clone, Default)]
struct MockState {
    hits: Arc<Mutex<Vec<String>>>,
    enveloped_targets: Arc<Mutex<Vec<String>>>,
}

impl MockState {
    fn record(&self, hit: impl Into<String>) {
        self.hits.lock().unwrap().push(hit.into());
    }
}

pub struct MockProxy {
    pub base: String,
    state: MockState,
}

impl MockProxy {
    pub async fn start() -> Self {
        let state = MockState::default();
        let app = Router::new()
            .route("/status/:code", get(status))
            .route("/garbage", get(garbage))
            .route("/get", get(enveloping))
            .route("/raw/*target", get(transparent))
            .route("/slow", get(slow))
            .with_state(state.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            base: format!("http://{}", addr),
            state,
        }
    }

    pub fn hits(&self) -> Vec<String> {
        self.state.hits.lock().unwrap().clone()
    }

    pub fn enveloped_targets(&self) -> Vec<String> {
        self.state.enveloped_targets.lock().unwrap().clone()
    }

    pub fn failing_status(&self, code: u16) -> ProxyEndpoint {
        ProxyEndpoint::transparent(format!("{}/status/{}?u={{url_encoded}}", self.base, code))
    }

    pub fn garbage(&self) -> ProxyEndpoint {
        ProxyEndpoint::transparent(format!("{}/garbage?u={{url_encoded}}", self.base))
    }

    /// Claims to be enveloping but serves a bare body.
    pub fn wrong_shape(&self) -> ProxyEndpoint {
        ProxyEndpoint::enveloping(format!("{}/raw/{{url}}", self.base))
    }

    pub fn enveloping(&self) -> ProxyEndpoint {
        ProxyEndpoint::enveloping(format!("{}/get?url={{url_encoded}}", self.base))
    }

    pub fn transparent(&self) -> ProxyEndpoint {
        ProxyEndpoint::transparent(format!("{}/raw/{{url}}", self.base))
    }

    pub fn slow(&self) -> ProxyEndpoint {
        ProxyEndpoint::transparent(format!("{}/slow?u={{url_encoded}}", self.base))
    }
}

/// An endpoint on a port nothing listens on.
pub async fn refused() -> ProxyEndpoint {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    ProxyEndpoint::transparent(format!("http://{}/?u={{url_encoded}}", addr))
}

pub fn test_client(timeout: Duration) -> reqwest::Client {
    reqwest::Client::builder()
        .timeout(timeout)
        .build()
        .expect("failed to build reqwest client")
}

async fn status(State(state): State<MockState>, Path(code): Path<u16>) -> StatusCode {
    state.record(format!("status/{code}"));
    StatusCode::from_u16(code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
}

async fn garbage(State(state): State<MockState>) -> impl IntoResponse {
    state.record("garbage");
    "<html><body>Too many requests</body></html>"
}

async fn enveloping(
    State(state): State<MockState>,
    Query(params): Query<HashMap<String, String>>,
) -> impl IntoResponse {
    state.record("get");
    if let Some(url) = params.get("url") {
        state.enveloped_targets.lock().unwrap().push(url.clone());
    }
    let body = serde_json::json!({
        "contents": FEED_JSON,
        "status": { "url": params.get("url"), "http_code": 200 }
    });
    axum::Json(body)
}

async fn transparent(
    State(state): State<MockState>,
    Path(target): Path<String>,
) -> impl IntoResponse {
    state.record(format!("raw/{target}"));
    ([("content-type", "application/json")], FEED_JSON)
}

async fn slow(State(state): State<MockState>) -> impl IntoResponse {
    state.record("slow");
    tokio::time::sleep(SLOW_DELAY).await;
    ([("content-type", "application/json")], FEED_JSON)
}
