mod api;
mod cache;
mod middleware;
mod scheduler;

use std::sync::Arc;
use std::time::Duration;

use tracing_subscriber::EnvFilter;

use crate::api::{build_app, AppState};
use crate::cache::OfferCache;
use crate::middleware::RateLimitState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = vetor_core::load_app_config()?;
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.log_level.clone()))?;
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    let catalog = vetor_core::load_catalog(&config.catalog_path)?;
    tracing::info!(
        entries = catalog.len(),
        batch_mode = %config.batch_mode,
        auth_mode = %config.auth_mode,
        "affiliate catalog loaded"
    );

    let client = vetor_meli::MeliClient::new(&config)?;
    let service = Arc::new(vetor_meli::OfferService::new(
        client,
        catalog,
        config.meli_affiliate_id.clone(),
    ));

    let cache = OfferCache::new(Duration::from_secs(config.cache_ttl_secs));
    let _scheduler = scheduler::build_scheduler(Arc::clone(&service), cache.clone()).await?;

    let state = AppState {
        service,
        cache,
        webhook_secret: config.webhook_secret.clone().map(Arc::<str>::from),
    };
    let rate_limit = RateLimitState::new(config.rate_limit_per_min, Duration::from_secs(60));
    let app = build_app(state, rate_limit);

    let listener = tokio::net::TcpListener::bind(config.bind_addr).await?;
    tracing::info!(addr = %config.bind_addr, "vetor-server listening");
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
