mod api;
mod middleware;
mod rpc;
mod scheduler;

use std::sync::Arc;

use tracing_subscriber::EnvFilter;

use adrelay_embed::{EmbeddingClient, EmbeddingConfig};
use adrelay_match::AdSearcher;
use adrelay_serving::{AdServer, DisplayAdQueue};

use crate::{
    api::{build_app, default_rate_limit_state, AppState},
    middleware::AuthState,
    rpc::session::InMemorySessionStore,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = Arc::new(adrelay_core::load_app_config()?);
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.log_level.clone()))?;
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    let pool_config = adrelay_db::PoolConfig::from_app_config(&config);
    let pool = adrelay_db::connect_pool(&config.database_url, pool_config).await?;
    adrelay_db::run_migrations(&pool).await?;

    let embedder = Arc::new(EmbeddingClient::new(EmbeddingConfig::from_app_config(
        &config,
    ))?);
    if embedder.is_degraded() {
        tracing::warn!("no embedding API key configured; serving with fallback vectors");
    }
    let searcher = Arc::new(AdSearcher::new(pool.clone(), Arc::clone(&embedder)));
    let display_queue = Arc::new(DisplayAdQueue::new());
    let server = Arc::new(AdServer::new(
        pool.clone(),
        Arc::clone(&searcher),
        display_queue,
    ));

    let _scheduler = scheduler::build_scheduler(pool.clone()).await?;

    let auth = AuthState::from_env(matches!(
        config.env,
        adrelay_core::Environment::Development
    ))?;
    let app = build_app(
        AppState {
            pool,
            searcher,
            server,
            sessions: Arc::new(InMemorySessionStore::new()),
        },
        auth,
        default_rate_limit_state(),
    );

    let listener = tokio::net::TcpListener::bind(config.bind_addr).await?;
    tracing::info!(addr = %config.bind_addr, "listening");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to listen for ctrl-c");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    tracing::info!("received shutdown signal, starting graceful shutdown");
}
