//! padel-roster binary entrypoint wiring the REST routes, identity checks and the roster store.

use std::{env, net::SocketAddr, sync::Arc};

use anyhow::Context;
use axum::Router;
use tokio::net::TcpListener;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use padel_roster::{
    auth::AuthConfig,
    config::AppConfig,
    dao::roster_store::memory::MemoryRosterStore,
    routes,
    state::{AppState, SharedState},
};

const STORE_ENV: &str = "ROSTER_STORE";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    let config = AppConfig::load();
    let auth = AuthConfig::from_env().context("loading token verification settings")?;
    let app_state = AppState::new(config, auth);

    start_roster_store(&app_state).await?;
    let app = build_router(app_state);

    let port = env::var("PORT")
        .or_else(|_| env::var("SERVER_PORT"))
        .ok()
        .and_then(|value| value.parse::<u16>().ok())
        .unwrap_or(8080);

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    info!(%addr, "starting server");

    let listener = TcpListener::bind(addr).await.context("binding server")?;
    axum::serve(listener, app.into_make_service())
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("serving axum")?;

    Ok(())
}

/// Install the backend named by `ROSTER_STORE` (`postgrest` by default, `memory` for local runs).
async fn start_roster_store(state: &SharedState) -> anyhow::Result<()> {
    let backend = env::var(STORE_ENV).unwrap_or_else(|_| "postgrest".into());

    match backend.as_str() {
        "memory" => {
            info!("using the in-memory roster store; data is lost on restart");
            state
                .install_roster_store(Arc::new(MemoryRosterStore::new()))
                .await;
            Ok(())
        }
        #[cfg(feature = "postgrest-store")]
        "postgrest" => {
            spawn_postgrest_supervisor(state.clone())?;
            Ok(())
        }
        other => anyhow::bail!("unsupported {STORE_ENV} value `{other}`"),
    }
}

#[cfg(feature = "postgrest-store")]
fn spawn_postgrest_supervisor(state: SharedState) -> anyhow::Result<()> {
    use padel_roster::{
        dao::{
            roster_store::{
                RosterStore,
                postgrest::{PostgrestConfig, PostgrestRosterStore},
            },
            storage::StorageError,
        },
        services::storage_supervisor,
    };

    let config = PostgrestConfig::from_env().context("loading PostgREST settings")?;
    info!(base_url = %config.base_url, "connecting to the PostgREST roster store");

    tokio::spawn(storage_supervisor::run(state, move || {
        let config = config.clone();
        async move {
            PostgrestRosterStore::connect(config)
                .await
                .map(|store| Arc::new(store) as Arc<dyn RosterStore>)
                .map_err(StorageError::from)
        }
    }));
    Ok(())
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

        let mut term = match signal(SignalKind::terminate()) {
            Ok(term) => term,
            Err(err) => {
                tracing::warn!(error = %err, "SIGTERM handler unavailable; waiting for Ctrl+C");
                let _ = tokio::signal::ctrl_c().await;
                return;
            }
        };
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {},
            _ = term.recv() => {},
        }
    }

    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
    }
}
