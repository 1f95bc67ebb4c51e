use anyhow::{Context, Result};
use csvstats::{
    config::Config,
    server::{self, Defaults},
    store::{self, DatasetStore},
    AnalyticsEngine,
};
use std::{sync::Arc, time::Duration};
use tracing::{info, Level};
use tracing_subscriber::{fmt, EnvFilter};

#[tokio::main]
async fn main() -> Result<()> {
    // ─── 1) load config ──────────────────────────────────────────────
    let cfg = Config::load().context("failed to load config")?;

    // ─── 2) init logging ─────────────────────────────────────────────
    fmt()
        .with_env_filter(
            EnvFilter::from_default_env()
                .add_directive(cfg.log_level.parse().unwrap_or(Level::INFO.into())),
        )
        .init();
    info!("startup");
    info!("{cfg:?}");

    std::panic::set_hook(Box::new(|info| {
        eprintln!("panic: {:?}", info);
    }));

    // ─── 3) dataset store + eviction ─────────────────────────────────
    let store = Arc::new(DatasetStore::with_ttl(cfg.dataset_ttl()));
    if store.ttl().is_some() {
        tokio::spawn(store::eviction_task(
            Arc::clone(&store),
            Duration::from_secs(cfg.eviction_interval_secs),
        ));
    } else {
        info!("no dataset ttl configured; uploads stay cached until restart");
    }

    // ─── 4) serve ────────────────────────────────────────────────────
    let engine = AnalyticsEngine::new(store);
    let routes = server::routes(engine, Defaults::from(&cfg));

    info!("Server starting on port {}", cfg.port);
    info!("Health check: http://localhost:{}/health", cfg.port);
    info!("Upload endpoint: POST http://localhost:{}/upload", cfg.port);

    warp::serve(routes).run(([0, 0, 0, 0], cfg.port)).await;

    Ok(())
}
