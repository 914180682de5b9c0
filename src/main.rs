//! Cerdas Cermat Back binary entrypoint wiring the engine actor, blob storage, REST, and SSE layers.

use std::{
    env,
    net::{IpAddr, Ipv4Addr, SocketAddr},
    sync::Arc,
};

use anyhow::Context;
use axum::Router;
use tokio::net::TcpListener;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use cerdas_cermat_back::{
    config::{AppConfig, StorageKind},
    dao::snapshot_store::{FileSnapshotStore, MemorySnapshotStore, SnapshotStore},
    routes,
    services::{engine_service, storage_supervisor},
    state::{AppState, SSE_CAPACITY, SharedState, SseHub, process::ProcessState},
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    let config = Arc::new(AppConfig::load());
    let store = open_store(&config).await?;
    let process = ProcessState::new(store, config.clone());

    let (persist, _writer) = storage_supervisor::spawn(process.clone());
    let engine = process.load(config.initial_stage()).await;
    info!(stage = %engine.stage(), "scoreboard engine ready");

    let sse = SseHub::new(SSE_CAPACITY);
    let (handle, snapshots, _actor) =
        engine_service::spawn(engine, process.clone(), persist.clone(), sse.clone());
    let app_state = AppState::new(handle, snapshots, sse, process, persist.clone());

    let app = build_router(app_state);

    let port = env::var("PORT")
        .or_else(|_| env::var("SERVER_PORT"))
        .ok()
        .and_then(|value| value.parse::<u16>().ok())
        .unwrap_or(8080);
    let ip = env::var("BIND_ADDR")
        .ok()
        .and_then(|value| value.parse::<IpAddr>().ok())
        .unwrap_or(IpAddr::V4(Ipv4Addr::LOCALHOST));

    let addr = SocketAddr::new(ip, port);
    info!(%addr, "starting server");

    let listener = TcpListener::bind(addr).await.context("binding server")?;
    axum::serve(listener, app.into_make_service())
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("serving axum")?;

    if !persist.flush().await {
        warn!("pending scoreboard snapshots could not be written before exit");
    }

    Ok(())
}

/// Open the blob store selected by the configuration.
async fn open_store(config: &AppConfig) -> anyhow::Result<Arc<dyn SnapshotStore>> {
    match config.storage() {
        StorageKind::File => {
            let store = FileSnapshotStore::open(config.data_dir())
                .await
                .context("opening data directory")?;
            info!(dir = %store.dir().display(), "persisting stages to disk");
            Ok(Arc::new(store))
        }
        StorageKind::Memory => {
            warn!("memory storage selected; scores will not survive a restart");
            Ok(Arc::new(MemorySnapshotStore::new()))
        }
    }
}

/// Build the top-level router and attach cross-cutting middleware layers.
fn build_router(state: SharedState) -> Router<()> {
    routes::router(state)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}

/// Configure tracing subscribers so logs include spans by default.
fn init_tracing() {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "info,tower_http=debug".into());
    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}

/// Wait for Ctrl+C or SIGTERM and shut the server down gracefully.
async fn shutdown_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{SignalKind, signal};

        match signal(SignalKind::terminate()) {
            Ok(mut term) => {
                tokio::select! {
                    _ = tokio::signal::ctrl_c() => {},
                    _ = term.recv() => {},
                }
            }
            Err(err) => {
                warn!(error = %err, "cannot install SIGTERM handler; waiting for Ctrl+C only");
                let _ = tokio::signal::ctrl_c().await;
            }
        }
    }

    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
    }
}
