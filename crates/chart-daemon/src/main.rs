mod diagnostics;
mod http;

use std::sync::Arc;

use anyhow::Context;
use chart_proto::catalog::{spawn_refresh, CatalogStore};
use chart_proto::config::Config;
use chart_proto::feed::FeedFetcher;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use crate::diagnostics::{Diagnostics, DiagnosticsLayer};

fn init_logging(diagnostics: Diagnostics) -> anyhow::Result<std::path::PathBuf> {
    let data_dir = chart_proto::platform::data_dir();
    std::fs::create_dir_all(&data_dir)
        .with_context(|| format!("creating data dir {}", data_dir.display()))?;
    let log_path = chart_proto::platform::log_path();

    let log_file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log_path)
        .with_context(|| format!("opening log file {}", log_path.display()))?;

    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_writer(log_file)
        .with_ansi(false);

    tracing_subscriber::registry()
        .with(fmt_layer)
        .with(DiagnosticsLayer::new(diagnostics))
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                tracing_subscriber::EnvFilter::new(
                    "info,chart_daemon=debug,chart_proto=debug,hyper=warn,hyper_util=warn,reqwest=warn",
                )
            }),
        )
        .init();

    Ok(log_path)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let diagnostics = Diagnostics::default();
    let log_path = init_logging(diagnostics.clone())?;

    // Print log path to stderr so the operator can tail it immediately.
    eprintln!("chartd log: {}", log_path.display());
    info!("chartd starting, log file: {:?}", log_path);

    let config = match Config::load() {
        Ok(c) => {
            info!("Config loaded from: {:?}", Config::config_path());
            c
        }
        Err(e) => {
            warn!("Config unreadable ({}), using defaults", e);
            Config::default()
        }
    };

    // ── Session ──────────────────────────────────────────────────────────────
    // The token is the store's attachment guard and the server's shutdown
    // signal: cancelling it ends the session.
    let session = CancellationToken::new();
    let store = Arc::new(CatalogStore::new(session.clone()));

    let fetcher = FeedFetcher::from_config(&config.feed).context("building HTTP client")?;
    let refresh = spawn_refresh(store.clone(), fetcher);

    if !config.http.enabled {
        info!("HTTP API disabled, logging the catalog once resolved");
        let phase = refresh.await.context("catalog refresh task panicked")?;
        let snapshot = store.snapshot().await;
        info!(
            "Catalog {:?}: {} albums, {} genres, error={:?}",
            phase,
            snapshot.albums.len(),
            store.genres().await.len(),
            snapshot.error
        );
        return Ok(());
    }

    // ── HTTP API ─────────────────────────────────────────────────────────────
    let app = http::router(store.clone(), diagnostics, config.http.cors_allow_any);
    let (_, mut server) = http::start_server(
        &config.http.bind_address,
        config.http.port,
        app,
        session.clone(),
    )
    .await
    .context("starting HTTP API")?;

    tokio::select! {
        signal = tokio::signal::ctrl_c() => {
            signal.context("waiting for Ctrl-C")?;
            info!("Shutdown requested");
        }
        result = &mut server => {
            store.detach();
            result.context("HTTP API task panicked")?;
            anyhow::bail!("HTTP API stopped unexpectedly");
        }
    }

    // Detach first so an in-flight fetch cannot write into a dead session.
    store.detach();
    server.await.context("HTTP API task panicked")?;

    info!("chartd stopped");
    Ok(())
}
