use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;

use axum::{
    extract::{Query, State},
    response::Json,
    routing::get,
    Router,
};
use chart_proto::album::Album;
use chart_proto::catalog::{CatalogSnapshot, CatalogStore};
use chart_proto::view::Selection;
use serde::{Deserialize, Serialize};
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tower_http::cors::CorsLayer;
use tracing::{debug, error, info};

use crate::diagnostics::Diagnostics;

/// Artwork edge length requested for `artworkUrlLarge`.
const LARGE_ARTWORK_PX: u32 = 500;

#[derive(Clone)]
struct HttpState {
    store: Arc<CatalogStore>,
    diagnostics: Diagnostics,
}

#[derive(Debug, Deserialize)]
struct GenreQuery {
    genre: Option<String>,
}

impl GenreQuery {
    fn selection(&self) -> Selection {
        Selection::parse(self.genre.as_deref())
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct AlbumInfo {
    #[serde(flatten)]
    album: Album,
    artwork_url_large: String,
    genre_line: String,
}

impl From<Album> for AlbumInfo {
    fn from(album: Album) -> Self {
        let artwork_url_large = album.artwork_url_at(LARGE_ARTWORK_PX);
        let genre_line = album.genre_line();
        Self {
            album,
            artwork_url_large,
            genre_line,
        }
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ApiView {
    is_loading: bool,
    error: Option<String>,
    genres: Vec<String>,
    selection: Selection,
    filtered_albums: Vec<AlbumInfo>,
}

pub fn router(store: Arc<CatalogStore>, diagnostics: Diagnostics, cors_allow_any: bool) -> Router {
    let app = Router::new()
        .route("/api/state", get(get_state))
        .route("/api/genres", get(get_genres))
        .route("/api/albums", get(get_albums))
        .route("/api/view", get(get_view))
        .route("/api/diagnostics", get(get_diagnostics))
        .with_state(HttpState { store, diagnostics });

    if cors_allow_any {
        app.layer(CorsLayer::permissive())
    } else {
        app
    }
}

/// Bind the listener, then serve on a spawned task until `shutdown` fires.
/// A bind failure is returned to the caller instead of ending the task.
pub async fn start_server(
    bind_address: &str,
    port: u16,
    app: Router,
    shutdown: CancellationToken,
) -> anyhow::Result<(SocketAddr, tokio::task::JoinHandle<()>)> {
    let addr = format!("{}:{}", bind_address, port);
    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("binding HTTP API to {}", addr))?;
    let local_addr = listener.local_addr()?;

    info!("[http] API listening on http://{}", local_addr);

    let handle = tokio::spawn(async move {
        if let Err(e) = axum::serve(listener, app)
            .with_graceful_shutdown(async move { shutdown.cancelled().await })
            .await
        {
            error!("[http] Server error: {}", e);
        }
        info!("[http] API stopped");
    });
    Ok((local_addr, handle))
}

async fn get_state(State(state): State<HttpState>) -> Json<CatalogSnapshot> {
    Json(state.store.snapshot().await)
}

async fn get_genres(State(state): State<HttpState>) -> Json<Vec<String>> {
    Json(state.store.genres().await)
}

async fn get_albums(
    State(state): State<HttpState>,
    Query(query): Query<GenreQuery>,
) -> Json<Vec<AlbumInfo>> {
    let selection = query.selection();
    let albums = state.store.filtered(&selection).await;
    debug!("[http] albums selection={} -> {}", selection.as_str(), albums.len());
    Json(albums.into_iter().map(AlbumInfo::from).collect())
}

async fn get_view(
    State(state): State<HttpState>,
    Query(query): Query<GenreQuery>,
) -> Json<ApiView> {
    let view = state.store.view(query.selection()).await;
    Json(ApiView {
        is_loading: view.is_loading,
        error: view.error,
        genres: view.genres,
        selection: view.selection,
        filtered_albums: view
            .filtered_albums
            .into_iter()
            .map(AlbumInfo::from)
            .collect(),
    })
}

async fn get_diagnostics(State(state): State<HttpState>) -> Json<Vec<String>> {
    Json(state.diagnostics.recent())
}
