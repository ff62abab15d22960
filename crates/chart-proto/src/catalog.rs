//! Session-scoped catalog state.
//!
//! Transitions:
//!   Idle -> Loading -> Resolved(Live) | Resolved(Degraded)
//!
//! Resolved is terminal. The store is written at most twice (begin, resolve)
//! and only while the owning session is attached.

use std::sync::Arc;

use chrono::{DateTime, Local};
use serde::Serialize;
use tokio::sync::RwLock;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::album::Album;
use crate::fallback::substitute_catalog;
use crate::feed::FeedFetcher;
use crate::view::{derive_genres, filter_albums, Selection};

/// Shown verbatim by the presentation layer in degraded mode.
pub const DEGRADED_MESSAGE: &str = "Failed to fetch albums. Please try again later.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Resolution {
    Live,
    Degraded,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(tag = "phase", content = "resolution", rename_all = "lowercase")]
pub enum CatalogPhase {
    #[default]
    Idle,
    Loading,
    Resolved(Resolution),
}

/// Read-only view handed to consumers.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogSnapshot {
    pub albums: Vec<Album>,
    pub is_loading: bool,
    pub error: Option<String>,
    /// Bumped on every accepted mutation.
    pub rev: u64,
    pub resolved_at: Option<DateTime<Local>>,
}

/// Derived state for one selection, read under a single lock.
#[derive(Debug, Clone)]
pub struct CatalogView {
    pub is_loading: bool,
    pub error: Option<String>,
    pub genres: Vec<String>,
    pub selection: Selection,
    pub filtered_albums: Vec<Album>,
}

#[derive(Debug, Default)]
struct CatalogState {
    phase: CatalogPhase,
    albums: Vec<Album>,
    genres: Vec<String>,
    error: Option<String>,
    rev: u64,
    resolved_at: Option<DateTime<Local>>,
}

impl CatalogState {
    // Idle is pre-session and reads the same as Loading
    fn is_loading(&self) -> bool {
        matches!(self.phase, CatalogPhase::Idle | CatalogPhase::Loading)
    }
}

/// Why a write was not applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rejected {
    Detached,
    OutOfOrder(CatalogPhase),
}

pub struct CatalogStore {
    state: RwLock<CatalogState>,
    session: CancellationToken,
}

impl CatalogStore {
    pub fn new(session: CancellationToken) -> Self {
        Self {
            state: RwLock::new(CatalogState::default()),
            session,
        }
    }

    /// Mark the owning session as torn down. Later writes are discarded.
    pub fn detach(&self) {
        self.session.cancel();
    }

    pub fn is_attached(&self) -> bool {
        !self.session.is_cancelled()
    }

    pub async fn phase(&self) -> CatalogPhase {
        self.state.read().await.phase
    }

    pub async fn snapshot(&self) -> CatalogSnapshot {
        let state = self.state.read().await;
        CatalogSnapshot {
            albums: state.albums.clone(),
            is_loading: state.is_loading(),
            error: state.error.clone(),
            rev: state.rev,
            resolved_at: state.resolved_at,
        }
    }

    /// Genre index for the current albums. Empty until resolved.
    pub async fn genres(&self) -> Vec<String> {
        self.state.read().await.genres.clone()
    }

    /// Loading flag, error, genre index and filtered albums from one read.
    pub async fn view(&self, selection: Selection) -> CatalogView {
        let state = self.state.read().await;
        CatalogView {
            is_loading: state.is_loading(),
            error: state.error.clone(),
            genres: state.genres.clone(),
            filtered_albums: filter_albums(&state.albums, &selection),
            selection,
        }
    }

    pub async fn filtered(&self, selection: &Selection) -> Vec<Album> {
        filter_albums(&self.state.read().await.albums, selection)
    }

    pub async fn begin_loading(&self) -> Result<(), Rejected> {
        self.transition(CatalogPhase::Idle, |state| {
            state.phase = CatalogPhase::Loading;
            state.albums.clear();
            state.genres.clear();
            state.error = None;
        })
        .await?;
        info!("[catalog] Loading");
        Ok(())
    }

    pub async fn resolve_live(&self, albums: Vec<Album>) -> Result<(), Rejected> {
        let count = albums.len();
        self.transition(CatalogPhase::Loading, move |state| {
            state.phase = CatalogPhase::Resolved(Resolution::Live);
            state.genres = derive_genres(&albums);
            state.albums = albums;
            state.error = None;
            state.resolved_at = Some(Local::now());
        })
        .await?;
        info!("[catalog] Resolved with {} live albums", count);
        Ok(())
    }

    pub async fn resolve_degraded(&self) -> Result<(), Rejected> {
        self.transition(CatalogPhase::Loading, |state| {
            let albums = substitute_catalog();
            state.phase = CatalogPhase::Resolved(Resolution::Degraded);
            state.genres = derive_genres(&albums);
            state.albums = albums;
            state.error = Some(DEGRADED_MESSAGE.to_string());
            state.resolved_at = Some(Local::now());
        })
        .await?;
        warn!("[catalog] Resolved in degraded mode with substitute catalog");
        Ok(())
    }

    async fn transition<F>(&self, from: CatalogPhase, apply: F) -> Result<(), Rejected>
    where
        F: FnOnce(&mut CatalogState),
    {
        if !self.is_attached() {
            debug!("[catalog] Session detached, discarding write");
            return Err(Rejected::Detached);
        }
        let mut state = self.state.write().await;
        // re-check under the lock: detach may have raced the await above
        if !self.is_attached() {
            debug!("[catalog] Session detached, discarding write");
            return Err(Rejected::Detached);
        }
        if state.phase != from {
            warn!(
                "[catalog] Ignoring transition from {:?}, expected {:?}",
                state.phase, from
            );
            return Err(Rejected::OutOfOrder(state.phase));
        }
        apply(&mut *state);
        state.rev += 1;
        Ok(())
    }
}

/// Run the session's single refresh: Loading, fetch, then Resolved.
/// Returns the phase reached (or the phase at the time the store was detached).
pub async fn refresh_catalog(store: &CatalogStore, fetcher: &FeedFetcher) -> CatalogPhase {
    if let Err(rejected) = store.begin_loading().await {
        debug!("[catalog] Refresh skipped: {:?}", rejected);
        return store.phase().await;
    }

    let outcome = match fetcher.fetch_catalog().await {
        Ok(albums) => store.resolve_live(albums).await,
        Err(e) => {
            warn!("[catalog] Retrieval failed: {}", e);
            store.resolve_degraded().await
        }
    };
    if let Err(rejected) = outcome {
        debug!("[catalog] Resolution discarded: {:?}", rejected);
    }
    store.phase().await
}

/// Spawn [`refresh_catalog`] on the runtime.
pub fn spawn_refresh(
    store: Arc<CatalogStore>,
    fetcher: FeedFetcher,
) -> tokio::task::JoinHandle<CatalogPhase> {
    tokio::spawn(async move { refresh_catalog(&store, &fetcher).await })
}
